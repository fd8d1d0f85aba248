//! Main Crate Error

use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;
use tracing::error;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error(transparent)]
    Models(#[from] coach_models::error::Error),

    #[error(transparent)]
    Auth(#[from] coach_auth::error::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Sheets(#[from] coach_sheets::error::Error),

    /// Malformed request payload or parameters.
    #[error("{0}")]
    BadRequest(String),

    #[error("Coach not found")]
    CoachNotFound,

    #[error("Task not found")]
    TaskNotFound,

    /* Api Errors */
    #[error("API Forbidden")]
    ApiForbidden,

    #[error("User has no valid role")]
    InvalidRole,

    #[error("Auth Token Creation")]
    AuthTokenCreation,

    #[error("Wrong Credentials")]
    WrongCredentials,

    #[error("Missing Credentials")]
    MissingCredentials,

    #[error("Context Missing")]
    CtxMissing,
}

impl Error {
    /// Status code and client-facing message. Internal failures get a generic message.
    pub fn status_and_message(&self) -> (StatusCode, String) {
        let internal = || {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                String::from("Internal server error"),
            )
        };
        match self {
            Error::WrongCredentials => (StatusCode::UNAUTHORIZED, String::from("Invalid credentials")),
            Error::MissingCredentials | Error::CtxMissing => {
                (StatusCode::UNAUTHORIZED, String::from("Missing credentials"))
            }
            Error::ApiForbidden => (StatusCode::FORBIDDEN, String::from("Access forbidden")),
            Error::InvalidRole => (StatusCode::FORBIDDEN, self.to_string()),
            Error::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            Error::CoachNotFound | Error::TaskNotFound => (StatusCode::NOT_FOUND, self.to_string()),
            Error::Sheets(err) => match err {
                coach_sheets::error::Error::Validation(message) => {
                    (StatusCode::BAD_REQUEST, message.clone())
                }
                coach_sheets::error::Error::NotFound(message) => {
                    (StatusCode::NOT_FOUND, message.clone())
                }
                coach_sheets::error::Error::Gateway(_) | coach_sheets::error::Error::Upstream(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Spreadsheet service error: {err}"),
                ),
            },
            Error::Auth(err) => match err {
                coach_auth::error::Error::InvalidToken => (
                    StatusCode::UNAUTHORIZED,
                    String::from("Invalid authentication token"),
                ),
                coach_auth::error::Error::TokenMissing => (
                    StatusCode::UNAUTHORIZED,
                    String::from("Authentication required"),
                ),
                coach_auth::error::Error::TokenExpired => (
                    StatusCode::UNAUTHORIZED,
                    String::from("Authentication token expired"),
                ),
                coach_auth::error::Error::TokenCreation(_)
                | coach_auth::error::Error::PasswordHash(_) => internal(),
            },
            Error::AuthTokenCreation | Error::IO(_) | Error::Json(_) | Error::Models(_) => {
                internal()
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        error!("Creating API error response for error: {:?}", self);
        let (status, message) = self.status_and_message();

        let body = Json(json!({
            "error": {
                "message": message,
                "status": status.as_u16()
            }
        }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coach_sheets::error::{Error as SheetsError, GatewayError};

    #[test]
    fn sheet_errors_map_to_http_status() {
        let cases = [
            (
                Error::from(SheetsError::Validation(String::from("bad"))),
                StatusCode::BAD_REQUEST,
            ),
            (
                Error::from(SheetsError::NotFound(String::from("Student not found"))),
                StatusCode::NOT_FOUND,
            ),
            (
                Error::from(SheetsError::Upstream(GatewayError::Rejected(String::from("x")))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                Error::from(SheetsError::Gateway(GatewayError::Rejected(String::from("x")))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_and_message().0, status);
        }
    }

    #[test]
    fn not_found_keeps_diagnostic_message() {
        let err = Error::from(SheetsError::NotFound(String::from(
            "Student not found in any sheet",
        )));
        assert_eq!(err.status_and_message().1, "Student not found in any sheet");
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = Error::IO(std::io::Error::other("disk on fire"));
        assert_eq!(
            err.status_and_message(),
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                String::from("Internal server error")
            )
        );
    }

    #[test]
    fn auth_failures_are_unauthorized_or_forbidden() {
        assert_eq!(
            Error::Auth(coach_auth::error::Error::TokenExpired)
                .status_and_message()
                .0,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(Error::ApiForbidden.status_and_message().0, StatusCode::FORBIDDEN);
        assert_eq!(Error::InvalidRole.status_and_message().0, StatusCode::FORBIDDEN);
    }
}
