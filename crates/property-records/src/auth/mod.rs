//! HTTP Basic login exchanged for short-lived HS256 bearer tokens.
//!
//! The signing secret and login credentials come from [`crate::config::AuthConfig`];
//! nothing here carries a built-in secret.

mod credentials;
mod extract;
mod routes;
mod token;

pub use credentials::{bearer_token, Credentials};
pub use extract::AuthenticatedUser;
pub use routes::token_router;
pub use token::{AccessToken, Authenticator, Claims};

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Authentication failures; everything but issuing problems maps to 401.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing credentials")]
    MissingCredentials,
    #[error("malformed credentials")]
    MalformedCredentials,
    #[error("incorrect username or password")]
    InvalidCredentials,
    #[error("missing bearer token")]
    MissingToken,
    #[error("invalid or expired token")]
    InvalidToken(#[source] jsonwebtoken::errors::Error),
    #[error("token could not be issued")]
    Issue(#[source] jsonwebtoken::errors::Error),
    #[error("token lifetime of {0} minutes is out of range")]
    LifetimeOutOfRange(i64),
}

impl AuthError {
    fn challenge(&self) -> &'static str {
        match self {
            AuthError::MissingCredentials
            | AuthError::MalformedCredentials
            | AuthError::InvalidCredentials => "Basic",
            AuthError::MissingToken
            | AuthError::InvalidToken(_)
            | AuthError::Issue(_)
            | AuthError::LifetimeOutOfRange(_) => "Bearer",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match &self {
            AuthError::Issue(source) => {
                tracing::error!(error = %source, "failed to sign access token");
                let body = Json(json!({ "error": self.to_string() }));
                return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
            }
            AuthError::LifetimeOutOfRange(minutes) => {
                tracing::error!(minutes, "token expiry overflowed");
                let body = Json(json!({ "error": self.to_string() }));
                return (StatusCode::INTERNAL_SERVER_ERROR, body).into_response();
            }
            _ => {}
        }

        let body = Json(json!({ "error": self.to_string() }));
        (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, self.challenge())],
            body,
        )
            .into_response()
    }
}
