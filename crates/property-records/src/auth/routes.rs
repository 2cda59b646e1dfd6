use std::sync::Arc;

use axum::extract::State;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use tracing::{info, warn};

use super::{AuthError, Authenticator, Credentials};

/// `POST /token`: HTTP Basic credentials in, bearer token out.
pub fn token_router(authenticator: Arc<Authenticator>) -> Router {
    Router::new()
        .route("/token", post(issue_token))
        .with_state(authenticator)
}

async fn issue_token(
    State(authenticator): State<Arc<Authenticator>>,
    headers: HeaderMap,
) -> Response {
    let result = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::MissingCredentials)
        .and_then(Credentials::from_basic_header)
        .and_then(|credentials| {
            authenticator
                .login(&credentials)
                .map(|token| (credentials.username, token))
        });

    match result {
        Ok((username, token)) => {
            info!(%username, "access token issued");
            (StatusCode::OK, Json(token)).into_response()
        }
        Err(err) => {
            warn!(error = %err, "token request rejected");
            err.into_response()
        }
    }
}
