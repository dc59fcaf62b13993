//! Admin authentication handlers

use axum::{extract::State, http::StatusCode, Json};
use axum_extra::{
    extract::{
        cookie::{Cookie, CookieJar, SameSite},
        WithRejection,
    },
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::middleware::{auth::session_token, SESSION_COOKIE};
use crate::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Serialize)]
pub struct SessionStatus {
    pub authenticated: bool,
}

/// Login endpoint handler
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    WithRejection(Json(body), _): WithRejection<Json<LoginRequest>, AppError>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let issued = state.auth_service().login(&body.password)?;

    let cookie = Cookie::build((SESSION_COOKIE, issued.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(state.config.is_production());

    Ok((
        jar.add(cookie),
        Json(LoginResponse {
            success: true,
            token: issued.token,
            token_type: issued.token_type,
            expires_in: issued.expires_in,
        }),
    ))
}

/// Tell the admin panel whether its session is still valid
pub async fn session_status(
    State(state): State<AppState>,
    jar: CookieJar,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> (StatusCode, Json<SessionStatus>) {
    let authenticated = session_token(bearer.as_ref(), &jar)
        .map(|token| state.auth_service().validate_token(&token).is_ok())
        .unwrap_or(false);

    let status = if authenticated {
        StatusCode::OK
    } else {
        StatusCode::UNAUTHORIZED
    };
    (status, Json(SessionStatus { authenticated }))
}

/// Logout endpoint handler; clears the session cookie
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<SessionStatus>) {
    (
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        Json(SessionStatus {
            authenticated: false,
        }),
    )
}
