//! sportsdb-mcp: MCP server for TheSportsDB v1 API.
//! Exposes seven read-only tools (team search, rosters, fixtures, results,
//! leagues, full event details, raw GET) and renders the API's JSON as short
//! text or passthrough JSON. Upstream failures are returned as results, never
//! as protocol errors.

pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod registry;
pub mod server;

pub use client::{ApiError, ApiResponse, ErrorKind, QueryParams, SportsDbClient, query_from_json};
pub use config::SportsDbConfig;
pub use error::{Result, SportsDbError};
pub use registry::{EventBundle, SportsDbRegistry, parse_query_json};
pub use server::SportsDbMcpServer;
