use shared::error::{ApiError, ApiException, ErrorCode};
use thiserror::Error;

/// Fixed user-facing text for a failed sync cycle.
pub const SYNC_ERROR_MESSAGE: &str = "Could not load data. Please try again.";

#[derive(Debug, Error)]
pub enum PortalError {
    #[error("no authenticated user session")]
    NotAuthenticated,
    #[error("server rejected request with status {status}: {source}")]
    Api {
        status: u16,
        #[source]
        source: ApiException,
    },
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid server url: {0}")]
    InvalidServerUrl(#[from] url::ParseError),
}

impl PortalError {
    /// Builds the error for a non-success response. A body without its own
    /// code takes the one implied by the status, and keeps its message.
    pub(crate) fn from_status(status: u16, body: Option<ApiError>) -> Self {
        let (code, message) = match body {
            Some(ApiError { code, message }) => (code, message),
            None => (None, String::new()),
        };
        let message = if message.trim().is_empty() {
            format!("request failed with status {status}")
        } else {
            message
        };
        Self::Api {
            status,
            source: ApiException {
                code: code.unwrap_or_else(|| status_code(status)),
                message,
            },
        }
    }

    pub fn requires_reauth(&self) -> bool {
        matches!(
            self,
            Self::Api {
                source: ApiException {
                    code: ErrorCode::Unauthorized,
                    ..
                },
                ..
            }
        )
    }
}

fn status_code(status: u16) -> ErrorCode {
    match status {
        401 => ErrorCode::Unauthorized,
        403 => ErrorCode::Forbidden,
        404 => ErrorCode::NotFound,
        400 | 422 => ErrorCode::Validation,
        500..=599 => ErrorCode::Internal,
        _ => ErrorCode::Unknown,
    }
}
