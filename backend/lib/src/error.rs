use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::data::storage::BoxedStorageError;
use crate::models::TokenId;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid or expired nonce")]
    InvalidOrExpiredNonce,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Ownership lookup unavailable: {0}")]
    OwnershipLookupUnavailable(String),

    #[error("Token {0} is not owned by this address")]
    NotOwned(TokenId),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(BoxedStorageError),

    /// The backend could not be reached or answered with something unreadable
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Internal server error")]
    Internal,
}

pub type Result<T> = std::result::Result<T, Error>;

/// Machine readable error classification sent alongside every error response
///
/// Clients use it to decide between retrying the profile lookup and restarting
/// the login from a fresh nonce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    InvalidOrExpiredNonce,
    InvalidSignature,
    OwnershipLookupUnavailable,
    NotOwned,
    NotFound,
    BadRequest,
    Unauthorized,
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidOrExpiredNonce => ErrorKind::InvalidOrExpiredNonce,
            Error::InvalidSignature => ErrorKind::InvalidSignature,
            Error::OwnershipLookupUnavailable(_) => ErrorKind::OwnershipLookupUnavailable,
            Error::NotOwned(_) => ErrorKind::NotOwned,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::BadRequest(_) => ErrorKind::BadRequest,
            Error::Unauthorized(_) => ErrorKind::Unauthorized,
            Error::Config(_) | Error::Storage(_) | Error::Transport(_) | Error::Internal => {
                ErrorKind::Internal
            }
        }
    }

    /// Rebuild an error received over the wire
    ///
    /// `token` is only meaningful for [`ErrorKind::NotOwned`].
    pub fn from_kind(kind: ErrorKind, message: String, token: Option<TokenId>) -> Self {
        match kind {
            ErrorKind::InvalidOrExpiredNonce => Error::InvalidOrExpiredNonce,
            ErrorKind::InvalidSignature => Error::InvalidSignature,
            ErrorKind::OwnershipLookupUnavailable => Error::OwnershipLookupUnavailable(message),
            ErrorKind::NotOwned => Error::NotOwned(token.unwrap_or_default()),
            ErrorKind::NotFound => Error::NotFound(message),
            ErrorKind::BadRequest => Error::BadRequest(message),
            ErrorKind::Unauthorized => Error::Unauthorized(message),
            ErrorKind::Internal => Error::Internal,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::InvalidOrExpiredNonce
            | ErrorKind::InvalidSignature
            | ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::OwnershipLookupUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::NotOwned => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let kind = self.kind();

        let message = match &self {
            // details of internal failures stay in the logs
            Error::Config(_) | Error::Storage(_) | Error::Transport(_) | Error::Internal => {
                tracing::error!(error = %self, "Request failed with internal error");
                "Internal error".to_string()
            }
            other => other.to_string(),
        };

        let mut body = json!({
            "success": false,
            "error": message,
            "kind": kind,
        });

        if let Error::NotOwned(token) = &self {
            body["nftId"] = json!(token);
        }

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_kind_round_trips_for_client_visible_errors() {
        let errors = [
            Error::InvalidOrExpiredNonce,
            Error::InvalidSignature,
            Error::OwnershipLookupUnavailable("indexer down".into()),
            Error::NotOwned(7),
            Error::NotFound("profile".into()),
        ];

        for error in errors {
            let rebuilt = Error::from_kind(error.kind(), error.to_string(), Some(7));
            assert_eq!(rebuilt.kind(), error.kind());
            assert_eq!(rebuilt.status_code(), error.status_code());
        }
    }

    #[test]
    fn internal_failures_share_one_kind() {
        assert_eq!(Error::Config("bad".into()).kind(), ErrorKind::Internal);
        assert_eq!(Error::Internal.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            Error::OwnershipLookupUnavailable(String::new()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
