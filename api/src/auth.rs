use crate::error::ApiError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::TypedHeader;
use headers::authorization::Bearer;
use headers::Authorization;

/// Requires `Authorization: Bearer <token>`. With a configured API token
/// the bearer must match it, otherwise any non-empty token passes.
pub async fn require_bearer(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(TypedHeader(auth)) = auth else {
        return Err(ApiError::Unauthorized {
            code: "missing_authorization",
            message: "Authorization Bearer token is required",
        });
    };

    let token = auth.token();
    let accepted = match state.api_token.as_deref() {
        Some(expected) => token == expected,
        None => !token.is_empty(),
    };

    if !accepted {
        return Err(ApiError::Unauthorized {
            code: "invalid_token",
            message: "Bearer token is not valid",
        });
    }

    log::info!("Authentication successful for token: {}", mask(token));
    Ok(next.run(request).await)
}

fn mask(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
