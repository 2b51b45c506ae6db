// ── Per-request errors ──
//
// Every failure on the request path becomes a status code and a short
// plain-text body. Nothing here aborts the worker.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tracing::warn;

use loxhook_core::{AuthError, CommandError};

use crate::logging::HTTP_ERROR_TARGET;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Request rate limit reached")]
    RateLimited,

    #[error(transparent)]
    UnknownCommand(#[from] CommandError),

    #[error("Control not found: {name}")]
    UnknownControl { name: String },

    #[error("Request without access key")]
    MissingKey,

    #[error(transparent)]
    Denied(#[from] AuthError),

    #[error("Miniserver did not answer in time: {0}")]
    GatewayTimeout(#[source] loxhook_api::Error),

    #[error("Error sending request to Miniserver: {0}")]
    BadGateway(#[source] loxhook_api::Error),
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::UnknownCommand(_) | Self::UnknownControl { .. } => StatusCode::NOT_FOUND,
            Self::MissingKey
            | Self::Denied(AuthError::UnknownCredential | AuthError::CredentialNotValidForControl { .. }) => {
                StatusCode::UNAUTHORIZED
            }
            Self::Denied(AuthError::CommandNotAllowed { .. }) => StatusCode::FORBIDDEN,
            Self::GatewayTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<loxhook_api::Error> for ProxyError {
    fn from(err: loxhook_api::Error) -> Self {
        if err.is_timeout() {
            Self::GatewayTimeout(err)
        } else {
            Self::BadGateway(err)
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        warn!(target: HTTP_ERROR_TARGET, status = status.as_u16(), "{}", self);
        let body = format!(
            "{} {}\n{}",
            status.as_u16(),
            status.canonical_reason().unwrap_or_default(),
            self
        );
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denials_split_between_401_and_403() {
        let unknown = ProxyError::from(AuthError::UnknownCredential);
        assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);

        let not_listed = ProxyError::from(AuthError::CredentialNotValidForControl {
            credential: "guest".into(),
            control: "door".into(),
        });
        assert_eq!(not_listed.status(), StatusCode::UNAUTHORIZED);

        let command = ProxyError::from(AuthError::CommandNotAllowed {
            command: "on".into(),
            control: "door".into(),
        });
        assert_eq!(command.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn downstream_timeout_is_504() {
        let err = ProxyError::from(loxhook_api::Error::Timeout { timeout_secs: 2 });
        assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
    }
}
