use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
    Json,
};

use crate::api::handlers::{AppState, ErrorResponse};
use crate::auth::Identity;

/// Axum extractor establishing the authenticated caller.
///
/// Reads the bearer token from the standard Authorization header and
/// validates it through the state's token verifier. Every failure collapses
/// to the same 401 body; validation detail goes to the log, never to the
/// client.
#[async_trait]
impl FromRequestParts<AppState> for Identity {
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(unauthorized)?;
        state.verifier.verify(token).await.map_err(|err| {
            log::warn!("token rejected: {}", err);
            unauthorized()
        })
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn unauthorized() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new("Missing or invalid token")),
    )
}
