//! Error types for the blinds dashboard

/// Errors that can occur in the blinds dashboard
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Poll failed: {0}")]
    Poll(String),

    #[error("Command failed: {0}")]
    Command(String),

    #[error("Dashboard error: {0}")]
    Dashboard(String),
}

/// Result type alias for dashboard operations
pub type Result<T> = std::result::Result<T, DashboardError>;
