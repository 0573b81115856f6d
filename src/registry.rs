//! SportsDbRegistry: the seven TheSportsDB tools and their dispatch.
//!
//! Holds the tool descriptors advertised to MCP clients, coerces call
//! arguments, runs the matching operation against `SportsDbClient` and
//! renders the result. Upstream failures are rendered into the result; only
//! malformed arguments and unknown tool names surface as errors.

use std::sync::Arc;

use rmcp::model::{CallToolResult, Content, Tool, ToolAnnotations};
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::client::{ApiResponse, QueryParams, SportsDbClient, query_from_json};
use crate::config::SportsDbConfig;
use crate::error::SportsDbError;
use crate::format;

/// Display cap used when a list tool is called without `limit`.
pub const DEFAULT_LIMIT: i64 = 10;

/// Endpoint used by `raw_get` when none is given.
pub const DEFAULT_RAW_ENDPOINT: &str = "searchteams.php";

pub const SEARCH_TEAMS: &str = "search_teams";
pub const LIST_PLAYERS: &str = "list_players";
pub const TEAM_NEXT: &str = "team_next";
pub const TEAM_LAST: &str = "team_last";
pub const LIST_LEAGUES: &str = "list_leagues";
pub const EVENT_FULL: &str = "event_full";
pub const RAW_GET: &str = "raw_get";

/// Everything TheSportsDB knows about one event, fetched concurrently.
///
/// Each slot is independent: one failed lookup leaves the other four intact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventBundle {
    pub event: ApiResponse,
    pub lineup: ApiResponse,
    pub timeline: ApiResponse,
    pub stats: ApiResponse,
    pub tv: ApiResponse,
}

/// Tool surface backed by a single `SportsDbClient`.
pub struct SportsDbRegistry {
    client: SportsDbClient,
    tools: Vec<Tool>,
}

impl SportsDbRegistry {
    pub fn new(client: SportsDbClient) -> Self {
        Self {
            client,
            tools: tool_definitions(),
        }
    }

    /// Validate the config and build the client behind the registry.
    pub fn from_config(config: &SportsDbConfig) -> crate::Result<Self> {
        let client = SportsDbClient::new(config)?;
        tracing::debug!(base_url = %config.base_url, "SportsDbRegistry built");
        Ok(Self::new(client))
    }

    /// Descriptors for all registered tools.
    pub fn tools(&self) -> Vec<Tool> {
        self.tools.clone()
    }

    /// Call a tool by name with raw MCP arguments.
    ///
    /// Text tools answer with one text item. JSON tools answer with the
    /// compact JSON text and, for objects, the same value as structured content.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<Map<String, Value>>,
    ) -> crate::Result<CallToolResult> {
        let args = Args::new(name, arguments.as_ref());

        let result = match name {
            SEARCH_TEAMS => {
                let team = args.required_str("name")?;
                let limit = args.limit()?;
                text_result(self.search_teams(&team, limit).await)
            }
            LIST_PLAYERS => {
                let team_id = args.required_i64("team_id")?;
                text_result(self.list_players(team_id).await)
            }
            TEAM_NEXT => {
                let team_id = args.required_i64("team_id")?;
                let limit = args.limit()?;
                text_result(self.team_next(team_id, limit).await)
            }
            TEAM_LAST => {
                let team_id = args.required_i64("team_id")?;
                let limit = args.limit()?;
                text_result(self.team_last(team_id, limit).await)
            }
            LIST_LEAGUES => {
                let country = args.required_str("country")?;
                let sport = args.required_str("sport")?;
                text_result(self.list_leagues(&country, &sport).await)
            }
            EVENT_FULL => {
                let event_id = args.required_i64("event_id")?;
                let bundle = self.event_full(event_id).await;
                json_result(serde_json::to_value(&bundle).unwrap_or_else(|e| {
                    json!({ "error": "Serialization", "message": e.to_string() })
                }))
            }
            RAW_GET => {
                let endpoint = args.optional_str("endpoint", DEFAULT_RAW_ENDPOINT)?;
                let query_json = args.optional_str("query_json", "")?;
                json_result(self.raw_get(&endpoint, &query_json).await.into_value())
            }
            other => return Err(SportsDbError::UnknownTool(other.to_string())),
        };

        Ok(result)
    }

    /// Search teams by name.
    pub async fn search_teams(&self, name: &str, limit: usize) -> String {
        let response = self
            .client
            .get("searchteams.php", &[("t".to_string(), name.to_string())])
            .await;
        format::format_teams(&response, limit)
    }

    /// Full roster of a team.
    pub async fn list_players(&self, team_id: i64) -> String {
        let response = self
            .client
            .get("lookup_all_players.php", &id_param(team_id))
            .await;
        format::format_players(&response)
    }

    /// Upcoming fixtures for a team.
    pub async fn team_next(&self, team_id: i64, limit: usize) -> String {
        let response = self.client.get("eventsnext.php", &id_param(team_id)).await;
        format::format_next_events(&response, limit)
    }

    /// Recent results for a team, with scores.
    pub async fn team_last(&self, team_id: i64, limit: usize) -> String {
        let response = self.client.get("eventslast.php", &id_param(team_id)).await;
        format::format_last_events(&response, limit)
    }

    /// Leagues for a country and sport as truncated pretty JSON.
    pub async fn list_leagues(&self, country: &str, sport: &str) -> String {
        let params = vec![
            ("c".to_string(), country.to_string()),
            ("s".to_string(), sport.to_string()),
        ];
        let response = self.client.get("search_all_leagues.php", &params).await;
        format::pretty_response(&response)
    }

    /// Fan out the five event lookups and wait for all of them.
    pub async fn event_full(&self, event_id: i64) -> EventBundle {
        let params = id_param(event_id);
        let (event, lineup, timeline, stats, tv) = tokio::join!(
            self.client.get("lookupevent.php", &params),
            self.client.get("lookuplineup.php", &params),
            self.client.get("lookuptimeline.php", &params),
            self.client.get("lookupeventstats.php", &params),
            self.client.get("lookuptv.php", &params),
        );

        let failed = [&event, &lineup, &timeline, &stats, &tv]
            .iter()
            .filter(|r| r.is_failure())
            .count();
        if failed > 0 {
            tracing::warn!(event_id, failed, "event_full completed with failed lookups");
        }

        EventBundle {
            event,
            lineup,
            timeline,
            stats,
            tv,
        }
    }

    /// GET an arbitrary endpoint. `query_json` that is not a JSON object is ignored.
    pub async fn raw_get(&self, endpoint: &str, query_json: &str) -> ApiResponse {
        let params = parse_query_json(query_json);
        self.client.get(endpoint, &params).await
    }
}

/// Parse `raw_get`'s `query_json` leniently.
///
/// Empty input, invalid JSON and non-object JSON all yield no parameters.
pub fn parse_query_json(query_json: &str) -> QueryParams {
    let trimmed = query_json.trim();
    if trimmed.is_empty() {
        return QueryParams::new();
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(object)) => query_from_json(&object),
        Ok(other) => {
            tracing::debug!(kind = json_kind(&other), "query_json is not an object, ignoring");
            QueryParams::new()
        }
        Err(e) => {
            tracing::debug!(error = %e, "query_json is not valid JSON, ignoring");
            QueryParams::new()
        }
    }
}

fn id_param(id: i64) -> QueryParams {
    vec![("id".to_string(), id.to_string())]
}

fn text_result(text: String) -> CallToolResult {
    CallToolResult {
        content: vec![Content::text(text)],
        structured_content: None,
        is_error: Some(false),
        meta: None,
    }
}

fn json_result(value: Value) -> CallToolResult {
    let text = serde_json::to_string(&value).unwrap_or_else(|_| value.to_string());
    // MCP only allows objects as structured content
    let structured_content = value.is_object().then_some(value);
    CallToolResult {
        content: vec![Content::text(text)],
        structured_content,
        is_error: Some(false),
        meta: None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Typed access to one call's arguments.
struct Args<'a> {
    tool: &'a str,
    map: Option<&'a Map<String, Value>>,
}

impl<'a> Args<'a> {
    fn new(tool: &'a str, map: Option<&'a Map<String, Value>>) -> Self {
        Self { tool, map }
    }

    /// The argument, treating an explicit `null` as absent.
    fn get(&self, key: &str) -> Option<&'a Value> {
        self.map
            .and_then(|m| m.get(key))
            .filter(|v| !v.is_null())
    }

    fn invalid(&self, message: String) -> SportsDbError {
        SportsDbError::InvalidArgument(self.tool.to_string(), message)
    }

    fn required_i64(&self, key: &str) -> crate::Result<i64> {
        let value = self
            .get(key)
            .ok_or_else(|| self.invalid(format!("missing required argument '{}'", key)))?;
        coerce_i64(value)
            .ok_or_else(|| self.invalid(format!("'{}' must be an integer, got {}", key, value)))
    }

    fn optional_i64(&self, key: &str, default: i64) -> crate::Result<i64> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => coerce_i64(value).ok_or_else(|| {
                self.invalid(format!("'{}' must be an integer, got {}", key, value))
            }),
        }
    }

    /// `limit` clamped to a display count; negatives show nothing.
    fn limit(&self) -> crate::Result<usize> {
        let limit = self.optional_i64("limit", DEFAULT_LIMIT)?;
        Ok(usize::try_from(limit).unwrap_or(0))
    }

    fn required_str(&self, key: &str) -> crate::Result<String> {
        let value = self
            .get(key)
            .ok_or_else(|| self.invalid(format!("missing required argument '{}'", key)))?;
        coerce_string(value)
            .ok_or_else(|| self.invalid(format!("'{}' must be a string, got {}", key, value)))
    }

    fn optional_str(&self, key: &str, default: &str) -> crate::Result<String> {
        match self.get(key) {
            None => Ok(default.to_string()),
            Some(value) => coerce_string(value).ok_or_else(|| {
                self.invalid(format!("'{}' must be a string, got {}", key, value))
            }),
        }
    }
}

/// Integers, integral floats and numeric strings are accepted.
fn coerce_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn read_only_annotations() -> ToolAnnotations {
    ToolAnnotations {
        title: None,
        read_only_hint: Some(true),
        destructive_hint: Some(false),
        idempotent_hint: Some(true),
        open_world_hint: Some(true),
    }
}

fn tool(name: &'static str, description: &'static str, schema: Value) -> Tool {
    let input_schema = Arc::new(schema.as_object().cloned().unwrap_or_default());
    Tool {
        name: name.into(),
        title: None,
        description: Some(description.into()),
        input_schema,
        output_schema: None,
        annotations: Some(read_only_annotations()),
        icons: None,
        meta: None,
    }
}

fn tool_definitions() -> Vec<Tool> {
    let limit = json!({
        "type": "integer",
        "description": "Maximum number of items to display",
        "default": DEFAULT_LIMIT
    });

    vec![
        tool(
            SEARCH_TEAMS,
            "Search teams by name. Returns name, league, sport and team ID for each match.",
            json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Team name or part of it, e.g. \"Arsenal\"" },
                    "limit": limit
                },
                "required": ["name"]
            }),
        ),
        tool(
            LIST_PLAYERS,
            "List the players of a team with position, nationality and player ID.",
            json!({
                "type": "object",
                "properties": {
                    "team_id": { "type": "integer", "description": "TheSportsDB team ID" }
                },
                "required": ["team_id"]
            }),
        ),
        tool(
            TEAM_NEXT,
            "Upcoming events for a team.",
            json!({
                "type": "object",
                "properties": {
                    "team_id": { "type": "integer", "description": "TheSportsDB team ID" },
                    "limit": limit
                },
                "required": ["team_id"]
            }),
        ),
        tool(
            TEAM_LAST,
            "Past events for a team, with final scores.",
            json!({
                "type": "object",
                "properties": {
                    "team_id": { "type": "integer", "description": "TheSportsDB team ID" },
                    "limit": limit
                },
                "required": ["team_id"]
            }),
        ),
        tool(
            LIST_LEAGUES,
            "Leagues for a country and sport, as pretty-printed JSON (truncated).",
            json!({
                "type": "object",
                "properties": {
                    "country": { "type": "string", "description": "Country name, e.g. \"England\"" },
                    "sport": { "type": "string", "description": "Sport name, e.g. \"Soccer\"" }
                },
                "required": ["country", "sport"]
            }),
        ),
        tool(
            EVENT_FULL,
            "Everything about one event: details, lineup, timeline, stats and TV listings.",
            json!({
                "type": "object",
                "properties": {
                    "event_id": { "type": "integer", "description": "TheSportsDB event ID" }
                },
                "required": ["event_id"]
            }),
        ),
        tool(
            RAW_GET,
            "GET any TheSportsDB v1 endpoint and return the raw JSON response.",
            json!({
                "type": "object",
                "properties": {
                    "endpoint": {
                        "type": "string",
                        "description": "Endpoint path, e.g. \"lookupteam.php\"",
                        "default": DEFAULT_RAW_ENDPOINT
                    },
                    "query_json": {
                        "type": "string",
                        "description": "Query parameters as a JSON object string, e.g. {\"id\": 133604}. Anything else is ignored.",
                        "default": ""
                    }
                }
            }),
        ),
    ]
}
