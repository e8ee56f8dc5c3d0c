use axum::{
    extract::{Request, State},
    http::Uri,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use uuid::Uuid;

use crate::{error::AppError, handlers::redirect, routes::AppState};

use super::jwt::verify_session_token;

pub const SESSION_COOKIE: &str = "gallery_session";

/// The authenticated principal, inserted into request extensions by
/// [`auth_middleware`] and handed to every service call.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub session_id: Uuid,
}

pub fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub fn clear_session_cookie(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    match authenticate(&state, &jar).await? {
        Some(auth_user) => {
            request.extensions_mut().insert(auth_user);
            Ok(next.run(request).await)
        }
        None => Ok(redirect(&login_url(request.uri()))),
    }
}

async fn authenticate(state: &AppState, jar: &CookieJar) -> Result<Option<AuthUser>, AppError> {
    let Some(token) = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) else {
        return Ok(None);
    };

    let Ok(claims) = verify_session_token(&token, &state.config.jwt_secret) else {
        return Ok(None);
    };

    let session = state
        .store
        .find_session(claims.sid)
        .await?
        .filter(|s| s.user_id == claims.sub && s.is_active(Utc::now()));

    let Some(session) = session else {
        tracing::debug!(session_id = %claims.sid, "Session expired or revoked");
        return Ok(None);
    };

    // The username may have changed since the token was issued
    let Some(user) = state.store.find_user(session.user_id).await? else {
        return Ok(None);
    };

    Ok(Some(AuthUser {
        id: user.id,
        username: user.username,
        session_id: session.id,
    }))
}

fn login_url(uri: &Uri) -> String {
    let next = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    format!("/login/?next={}", urlencoding::encode(next))
}
