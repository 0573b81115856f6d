//! Text rendering of normalized TheSportsDB responses.
//!
//! Payloads are read tolerantly: a missing key, `null`, or a value of the
//! wrong shape is treated as absent instead of failing the render.

use std::borrow::Cow;

use serde_json::Value;

use crate::client::{ApiError, ApiResponse};

/// Maximum characters of an error body echoed back to the host.
pub const ERROR_BODY_MAX_CHARS: usize = 800;

/// Maximum characters of pretty-printed passthrough JSON.
pub const PRETTY_MAX_CHARS: usize = 1200;

/// Appended when `pretty` truncates its output.
pub const ELLIPSIS: &str = "...";

/// Placeholder for a field the payload does not carry.
const MISSING: &str = "n/a";

/// Render an error record as a multi-line message.
pub fn format_error(err: &ApiError) -> String {
    let mut parts = vec![format!("TheSportsDB error: {}", err.kind)];
    if let Some(status) = err.status {
        parts.push(format!("Status: {}", status));
    }
    if let Some(url) = &err.url {
        parts.push(format!("URL: {}", url));
    }
    if let Some(message) = &err.message {
        parts.push(format!("Message: {}", message));
    }
    match &err.body {
        None | Some(Value::Null) => {}
        Some(Value::String(s)) => {
            parts.push(format!("Body: {}", truncate_chars(s, ERROR_BODY_MAX_CHARS)));
        }
        Some(other) => {
            let raw = serde_json::to_string(other).unwrap_or_else(|_| other.to_string());
            parts.push(format!("Body: {}", truncate_chars(&raw, ERROR_BODY_MAX_CHARS)));
        }
    }
    parts.join("\n")
}

/// Pretty-print JSON with 2-space indentation, capped at `max_chars` plus `ELLIPSIS`.
pub fn pretty(value: &Value, max_chars: usize) -> String {
    let rendered = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    if rendered.chars().count() <= max_chars {
        rendered
    } else {
        format!("{}{}", truncate_chars(&rendered, max_chars), ELLIPSIS)
    }
}

/// `pretty` for a normalized response; errors are shown as their JSON record.
pub fn pretty_response(response: &ApiResponse) -> String {
    match response {
        ApiResponse::Success(value) => pretty(value, PRETTY_MAX_CHARS),
        ApiResponse::Failure(err) => match serde_json::to_value(err) {
            Ok(value) => pretty(&value, PRETTY_MAX_CHARS),
            Err(_) => format_error(err),
        },
    }
}

/// Teams matching a name search, capped at `limit` lines.
pub fn format_teams(response: &ApiResponse, limit: usize) -> String {
    render_list(
        response,
        &["teams"],
        "No teams found.",
        |total| format!("Found {} teams (showing up to {}):", total, limit),
        limit,
        |t| {
            format!(
                "- {} | League: {} | Sport: {} | ID: {}",
                field(t, "strTeam"),
                field(t, "strLeague"),
                field(t, "strSport"),
                field(t, "idTeam")
            )
        },
    )
}

/// Rosters are short, so every player is listed.
pub fn format_players(response: &ApiResponse) -> String {
    render_list(
        response,
        &["player"],
        "No players found.",
        |total| format!("Found {} players:", total),
        usize::MAX,
        |p| {
            format!(
                "- {} | Pos: {} | Nationality: {} | ID: {}",
                field(p, "strPlayer"),
                field(p, "strPosition"),
                field(p, "strNationality"),
                field(p, "idPlayer")
            )
        },
    )
}

/// Upcoming fixtures with date and kick-off time.
pub fn format_next_events(response: &ApiResponse, limit: usize) -> String {
    render_list(
        response,
        &["events"],
        "No upcoming events.",
        |total| format!("Found {} upcoming events (showing up to {}):", total, limit),
        limit,
        |e| {
            format!(
                "- {} | {} {} | ID: {}",
                field(e, "strEvent"),
                field(e, "dateEvent"),
                field(e, "strTime"),
                field(e, "idEvent")
            )
        },
    )
}

/// Past events live under `results`; some sports answer with `events` instead.
pub fn format_last_events(response: &ApiResponse, limit: usize) -> String {
    render_list(
        response,
        &["results", "events"],
        "No past events.",
        |total| format!("Found {} past events (showing up to {}):", total, limit),
        limit,
        |e| {
            format!(
                "- {} | {} {} | ID: {} | Score: {}-{}",
                field(e, "strEvent"),
                field(e, "dateEvent"),
                field(e, "strTime"),
                field(e, "idEvent"),
                field(e, "intHomeScore"),
                field(e, "intAwayScore")
            )
        },
    )
}

/// Header with the true total, then at most `limit` item lines.
fn render_list(
    response: &ApiResponse,
    keys: &[&str],
    empty: &str,
    header: impl FnOnce(usize) -> String,
    limit: usize,
    line: impl Fn(&Value) -> String,
) -> String {
    let payload = match response {
        ApiResponse::Success(payload) => payload,
        ApiResponse::Failure(err) => return format_error(err),
    };

    let items = first_list(payload, keys);
    if items.is_empty() {
        return empty.to_string();
    }

    let mut lines = Vec::with_capacity(items.len().min(limit) + 1);
    lines.push(header(items.len()));
    lines.extend(items.iter().take(limit).map(line));
    lines.join("\n")
}

/// The first non-empty array found under `keys`, or an empty slice.
pub fn first_list<'a>(payload: &'a Value, keys: &[&str]) -> &'a [Value] {
    keys.iter()
        .filter_map(|key| payload.get(*key).and_then(Value::as_array))
        .find(|items| !items.is_empty())
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// A display string for `item[key]`; absent or `null` fields become a placeholder.
pub fn field<'a>(item: &'a Value, key: &str) -> Cow<'a, str> {
    match item.get(key) {
        None | Some(Value::Null) => Cow::Borrowed(MISSING),
        Some(Value::String(s)) => Cow::Borrowed(s.as_str()),
        Some(other) => Cow::Owned(other.to_string()),
    }
}

fn truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ErrorKind;
    use serde_json::json;

    fn ok(value: Value) -> ApiResponse {
        ApiResponse::Success(value)
    }

    #[test]
    fn test_search_teams_header_reports_total_not_limit() {
        let response = ok(json!({"teams": [
            {"strTeam": "Arsenal", "strLeague": "English Premier League", "strSport": "Soccer", "idTeam": "133604"},
            {"strTeam": "Arsenal Tula", "strLeague": "Russian Football Premier League", "strSport": "Soccer", "idTeam": "135259"}
        ]}));
        let text = format_teams(&response, 1);
        assert_eq!(
            text,
            "Found 2 teams (showing up to 1):\n\
             - Arsenal | League: English Premier League | Sport: Soccer | ID: 133604"
        );
    }

    #[test]
    fn test_list_lines_are_min_of_limit_and_count() {
        let teams: Vec<Value> = (0..7).map(|i| json!({"strTeam": format!("T{i}")})).collect();
        let response = ok(json!({ "teams": teams }));
        for limit in [0, 3, 7, 20] {
            let text = format_teams(&response, limit);
            let lines: Vec<&str> = text.lines().collect();
            assert!(lines[0].starts_with("Found 7 teams"));
            assert_eq!(lines.len() - 1, limit.min(7), "limit {limit}");
        }
    }

    #[test]
    fn test_missing_fields_render_placeholder() {
        let response = ok(json!({"teams": [{"strTeam": "Nameless FC", "strLeague": null}]}));
        let text = format_teams(&response, 10);
        assert!(text.contains("- Nameless FC | League: n/a | Sport: n/a | ID: n/a"));
    }

    #[test]
    fn test_empty_and_null_lists() {
        assert_eq!(format_teams(&ok(json!({"teams": null})), 10), "No teams found.");
        assert_eq!(format_teams(&ok(json!({})), 10), "No teams found.");
        assert_eq!(format_players(&ok(json!({"player": []}))), "No players found.");
        assert_eq!(format_next_events(&ok(json!(null)), 10), "No upcoming events.");
        assert_eq!(format_last_events(&ok(json!({"results": null})), 5), "No past events.");
        assert_eq!(format_teams(&ok(json!({"text": "maintenance"})), 10), "No teams found.");
    }

    #[test]
    fn test_players_lists_everyone() {
        let players: Vec<Value> = (0..15)
            .map(|i| json!({"strPlayer": format!("P{i}"), "strPosition": "Defender", "strNationality": "England", "idPlayer": i}))
            .collect();
        let text = format_players(&ok(json!({ "player": players })));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Found 15 players:");
        assert_eq!(lines.len(), 16);
        assert_eq!(lines[1], "- P0 | Pos: Defender | Nationality: England | ID: 0");
    }

    #[test]
    fn test_next_events_line() {
        let response = ok(json!({"events": [
            {"strEvent": "Arsenal vs Chelsea", "dateEvent": "2026-10-20", "strTime": "15:00:00", "idEvent": "2070001"}
        ]}));
        assert_eq!(
            format_next_events(&response, 10),
            "Found 1 upcoming events (showing up to 10):\n\
             - Arsenal vs Chelsea | 2026-10-20 15:00:00 | ID: 2070001"
        );
    }

    #[test]
    fn test_last_events_scores_and_fallback_key() {
        let event = json!({
            "strEvent": "Arsenal vs Chelsea", "dateEvent": "2026-10-01", "strTime": "15:00:00",
            "idEvent": "2069999", "intHomeScore": "2", "intAwayScore": "1"
        });
        let from_results = format_last_events(&ok(json!({"results": [event.clone()]})), 5);
        let from_events = format_last_events(&ok(json!({"results": [], "events": [event]})), 5);
        assert_eq!(from_results, from_events);
        assert!(from_results.ends_with("| ID: 2069999 | Score: 2-1"));
        assert!(from_results.starts_with("Found 1 past events (showing up to 5):"));
    }

    #[test]
    fn test_last_events_empty_is_exact_sentence() {
        assert_eq!(format_last_events(&ok(json!({"results": []})), 5), "No past events.");
    }

    #[test]
    fn test_list_renders_error_record() {
        let response = ApiResponse::Failure(ApiError::network("connection refused"));
        let text = format_teams(&response, 10);
        assert_eq!(text, "TheSportsDB error: Network\nMessage: connection refused");
    }

    #[test]
    fn test_format_error_http_fields() {
        let err = ApiError::http(
            429,
            "https://www.thesportsdb.com/api/v1/json/123/searchteams.php?t=x",
            json!({"message": "slow down"}),
        );
        let text = format_error(&err);
        assert_eq!(
            text,
            "TheSportsDB error: HTTP\n\
             Status: 429\n\
             URL: https://www.thesportsdb.com/api/v1/json/123/searchteams.php?t=x\n\
             Body: {\"message\":\"slow down\"}"
        );
    }

    #[test]
    fn test_format_error_body_truncated_to_800_chars() {
        let body = "é".repeat(2000);
        let err = ApiError::http(500, "https://example.com", Value::String(body));
        let text = format_error(&err);
        let body_line = text.lines().find(|l| l.starts_with("Body: ")).unwrap();
        let excerpt = body_line.trim_start_matches("Body: ");
        assert_eq!(excerpt.chars().count(), ERROR_BODY_MAX_CHARS);
        assert!(text.contains("TheSportsDB error: HTTP"));
        assert!(text.contains("Status: 500"));
    }

    #[test]
    fn test_format_error_json_body_truncated_to_800_chars() {
        let items: Vec<Value> = (0..500).map(|i| json!({"id": i})).collect();
        let err = ApiError::http(500, "https://example.com", Value::Array(items));
        let text = format_error(&err);
        let body_line = text.lines().find(|l| l.starts_with("Body: ")).unwrap();
        let excerpt = body_line.trim_start_matches("Body: ");
        assert_eq!(excerpt.chars().count(), ERROR_BODY_MAX_CHARS);
        assert!(excerpt.starts_with(r#"[{"id":0},{"id":1}"#));
    }

    #[test]
    fn test_format_error_null_body_omitted() {
        let err = ApiError::http(500, "https://example.com", Value::Null);
        assert_eq!(
            format_error(&err),
            "TheSportsDB error: HTTP\nStatus: 500\nURL: https://example.com"
        );
    }

    #[test]
    fn test_format_error_kind_always_present() {
        let err = ApiError {
            kind: ErrorKind::Http,
            status: None,
            url: None,
            message: None,
            body: None,
        };
        assert_eq!(format_error(&err), "TheSportsDB error: HTTP");
    }

    #[test]
    fn test_pretty_small_value_is_valid_json() {
        let value = json!({"leagues": [{"strLeague": "English Premier League"}]});
        let text = pretty(&value, PRETTY_MAX_CHARS);
        assert!(text.contains("\n  \"leagues\""));
        assert_eq!(serde_json::from_str::<Value>(&text).unwrap(), value);
    }

    #[test]
    fn test_pretty_truncates_with_ellipsis() {
        let leagues: Vec<Value> = (0..200)
            .map(|i| json!({"idLeague": i, "strLeague": format!("League number {i}")}))
            .collect();
        let text = pretty(&json!({ "countries": leagues }), PRETTY_MAX_CHARS);
        assert!(text.ends_with(ELLIPSIS));
        assert_eq!(text.chars().count(), PRETTY_MAX_CHARS + ELLIPSIS.len());
    }

    #[test]
    fn test_pretty_exact_limit_not_truncated() {
        let value = Value::String("x".repeat(8));
        // "\"xxxxxxxx\"" is 10 chars
        assert_eq!(pretty(&value, 10), "\"xxxxxxxx\"");
        assert_eq!(pretty(&value, 9), "\"xxxxxxxx...");
    }

    #[test]
    fn test_pretty_response_error_record() {
        let response = ApiResponse::Failure(ApiError::network("timed out"));
        let text = pretty_response(&response);
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, json!({"error": "Network", "message": "timed out"}));
    }

    #[test]
    fn test_field_scalars() {
        let item = json!({"a": "s", "b": 3, "c": true, "d": null});
        assert_eq!(field(&item, "a"), "s");
        assert_eq!(field(&item, "b"), "3");
        assert_eq!(field(&item, "c"), "true");
        assert_eq!(field(&item, "d"), MISSING);
        assert_eq!(field(&item, "zzz"), MISSING);
        assert_eq!(field(&json!("not an object"), "a"), MISSING);
    }
}
