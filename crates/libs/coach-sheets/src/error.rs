//! Error types for spreadsheet access and the marking workflow.

/// Failure talking to the spreadsheet service. Never retried by the gateway itself.
#[derive(thiserror::Error, Debug)]
pub enum GatewayError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("Spreadsheet service answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Spreadsheet credentials unusable: {0}")]
    Credentials(String),

    #[error(transparent)]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// The service refused the request, e.g. the range names an unknown tab.
    #[error("Spreadsheet request rejected: {0}")]
    Rejected(String),
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Missing or malformed caller input.
    #[error("{0}")]
    Validation(String),

    /// Student, group, target tab or component data could not be located.
    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// A gateway failure the marking broker treats as fatal.
    #[error("Upstream spreadsheet failure: {0}")]
    Upstream(GatewayError),
}
