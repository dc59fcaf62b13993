//! Authentication middleware
//!
//! Admin routes accept the session token either as an
//! `Authorization: Bearer` header or as the `admin_session` cookie.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    extract::CookieJar,
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::error::AppError;
use crate::AppState;

/// Name of the admin session cookie
pub const SESSION_COOKIE: &str = "admin_session";

/// Token from the Bearer header, falling back to the session cookie
pub fn session_token(
    bearer: Option<&TypedHeader<Authorization<Bearer>>>,
    jar: &CookieJar,
) -> Option<String> {
    bearer
        .map(|TypedHeader(Authorization(b))| b.token().to_string())
        .or_else(|| jar.get(SESSION_COOKIE).map(|c| c.value().to_string()))
        .filter(|t| !t.is_empty())
}

/// Reject the request unless it carries a valid admin token.
/// Missing, malformed and expired tokens all get the same 401.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(token) = session_token(bearer.as_ref(), &jar) else {
        return AppError::Unauthorized {
            message: "Missing admin token".to_string(),
            message_fr: "Jeton administrateur manquant".to_string(),
        }
        .into_response();
    };

    if let Err(err) = state.auth_service().validate_token(&token) {
        return err.into_response();
    }

    next.run(request).await
}
