//! Error types for sportsdb-mcp.
//!
//! Upstream API failures are not errors at this level: the HTTP client
//! adapter reports them as `ApiResponse::Failure` values so every tool call
//! still produces a result. `SportsDbError` covers local failures only.

use thiserror::Error;

/// Main error type for sportsdb-mcp operations
#[derive(Error, Debug)]
pub enum SportsDbError {
    /// Invalid or unreadable configuration
    #[error("invalid config: {0}")]
    Config(String),

    /// A tool argument is missing or cannot be coerced to the declared type
    #[error("invalid argument for tool '{0}': {1}")]
    InvalidArgument(String, String),

    /// No tool registered under the requested name
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// The outbound HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Result type alias for sportsdb-mcp operations
pub type Result<T> = std::result::Result<T, SportsDbError>;
