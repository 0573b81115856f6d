//! SportsDbMcpServer: rmcp ServerHandler backed by SportsDbRegistry.
//!
//! The registry is immutable once built, so every session (one per stdio
//! process, or one per Streamable HTTP session) shares it through an `Arc`.

use std::sync::Arc;

use rmcp::ErrorData as McpError;
use rmcp::handler::server::ServerHandler;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, Implementation, ListToolsResult,
    PaginatedRequestParams, ServerCapabilities, ServerInfo,
};
use rmcp::service::{RequestContext, RoleServer};

use crate::error::SportsDbError;
use crate::registry::SportsDbRegistry;

/// Name reported to MCP clients during initialization.
pub const SERVER_NAME: &str = "sportsdb-v1-min";

/// MCP server exposing the TheSportsDB tools.
#[derive(Clone)]
pub struct SportsDbMcpServer {
    registry: Arc<SportsDbRegistry>,
}

impl SportsDbMcpServer {
    /// Wrap a registry so that clones of the server share it.
    pub fn new(registry: SportsDbRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }
}

/// Map a local failure to the MCP error the host should see.
fn to_mcp_error(err: SportsDbError) -> McpError {
    match err {
        SportsDbError::InvalidArgument(..) | SportsDbError::UnknownTool(_) => {
            McpError::invalid_params(err.to_string(), None)
        }
        SportsDbError::Config(_) | SportsDbError::HttpClient(_) => {
            McpError::internal_error(err.to_string(), None)
        }
    }
}

impl ServerHandler for SportsDbMcpServer {
    /// Return server metadata: name "sportsdb-v1-min", tool capabilities enabled.
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: SERVER_NAME.into(),
                version: env!("CARGO_PKG_VERSION").into(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "TheSportsDB tools: search teams, list players, upcoming and past events, \
                 leagues, full event details, and raw v1 API access."
                    .into(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(ListToolsResult {
            tools: self.registry.tools(),
            next_cursor: None,
            meta: None,
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(tool = %request.name, "tool call");
        self.registry
            .call_tool(&request.name, request.arguments)
            .await
            .map_err(|e| {
                tracing::warn!(tool = %request.name, error = %e, "tool call rejected");
                to_mcp_error(e)
            })
    }
}
