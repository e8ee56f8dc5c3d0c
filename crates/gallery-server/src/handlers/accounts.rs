use axum::{
    extract::{Multipart, Query, State},
    response::{IntoResponse, Response},
    Extension, Form,
};
use axum_extra::extract::cookie::CookieJar;
use gallery_shared::api::{LoginQuery, LoginRequest, ProfileUpdateRequest, RegisterRequest};

use super::{redirect, FormData};
use crate::auth::{clear_session_cookie, session_cookie, AuthUser};
use crate::error::AppError;
use crate::flash::{self, Level};
use crate::pages::{render, Chrome, LoginPage, ProfilePage, RegisterPage};
use crate::routes::AppState;
use crate::services::accounts;

const BAD_CREDENTIALS: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

/// Only same-site absolute paths without control characters are followed
/// after login.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.contains(char::is_control) =>
        {
            path
        }
        _ => "/",
    }
}

/// GET /register/
pub async fn register_form(jar: CookieJar) -> Result<Response, AppError> {
    let (jar, messages) = flash::take(jar);

    let page = RegisterPage {
        chrome: Chrome::new(None, messages),
        errors: Vec::new(),
        username: String::new(),
        email: String::new(),
    };

    Ok((jar, render(&page)?).into_response())
}

/// POST /register/
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(req): Form<RegisterRequest>,
) -> Result<Response, AppError> {
    match accounts::register(state.store.as_ref(), &req).await {
        Ok((user, _)) => {
            tracing::info!(user_id = %user.id, username = %user.username, "User registered");
            let jar = flash::push(
                jar,
                Level::Success,
                "Your account has been created! You can now log in.",
            );
            Ok((jar, redirect("/login/")).into_response())
        }
        Err(AppError::Validation(msg)) => {
            let page = RegisterPage {
                chrome: Chrome::default(),
                errors: vec![msg],
                username: req.username,
                email: req.email,
            };
            Ok(render(&page)?.into_response())
        }
        Err(e) => Err(e),
    }
}

/// GET /login/
pub async fn login_form(jar: CookieJar) -> Result<Response, AppError> {
    let (jar, messages) = flash::take(jar);

    let page = LoginPage {
        chrome: Chrome::new(None, messages),
        errors: Vec::new(),
        username: String::new(),
    };

    Ok((jar, render(&page)?).into_response())
}

/// POST /login/
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<LoginQuery>,
    Form(req): Form<LoginRequest>,
) -> Result<Response, AppError> {
    let authenticated =
        accounts::authenticate(state.store.as_ref(), &req.username, &req.password).await?;
    let Some(user) = authenticated else {
        tracing::debug!(username = %req.username, "Login rejected");
        let page = LoginPage {
            chrome: Chrome::default(),
            errors: vec![BAD_CREDENTIALS.to_string()],
            username: req.username,
        };
        return Ok(render(&page)?.into_response());
    };

    let token = accounts::open_session(state.store.as_ref(), &state.config, &user).await?;
    tracing::info!(user_id = %user.id, "User logged in");

    let jar = jar.add(session_cookie(token));
    Ok((jar, redirect(safe_next(query.next.as_deref()))).into_response())
}

/// GET|POST /logout/
pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    accounts::close_session(state.store.as_ref(), &user).await?;
    tracing::info!(user_id = %user.id, "User logged out");

    let jar = clear_session_cookie(jar);
    let jar = flash::push(jar, Level::Success, "You have been logged out.");

    Ok((jar, redirect("/login/")).into_response())
}

/// GET /profile/
pub async fn profile_form(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    let profile = accounts::ensure_profile(state.store.as_ref(), user.id).await?;
    let account = state
        .store
        .find_user(user.id)
        .await?
        .ok_or(AppError::NotFound)?;

    let (jar, messages) = flash::take(jar);

    let page = ProfilePage {
        chrome: Chrome::new(Some(&user.username), messages),
        errors: Vec::new(),
        username: account.username,
        email: account.email,
        avatar: profile.avatar,
    };

    Ok((jar, render(&page)?).into_response())
}

/// POST /profile/
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    jar: CookieJar,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let mut form = FormData::read(multipart).await?;
    let avatar = form.take_file("avatar");
    let req = ProfileUpdateRequest {
        username: form.text("username"),
        email: form.text("email"),
    };

    match accounts::update_profile(state.store.as_ref(), &state.media, &user, &req, avatar).await {
        Ok(_) => {
            let jar = flash::push(jar, Level::Success, "Your profile has been updated!");
            Ok((jar, redirect("/profile/")).into_response())
        }
        Err(AppError::Validation(msg)) => {
            let profile = accounts::ensure_profile(state.store.as_ref(), user.id).await?;
            let page = ProfilePage {
                chrome: Chrome::new(Some(&user.username), Vec::new()),
                errors: vec![msg],
                username: req.username,
                email: req.email,
                avatar: profile.avatar,
            };
            Ok(render(&page)?.into_response())
        }
        Err(e) => Err(e),
    }
}
