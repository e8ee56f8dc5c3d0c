use std::sync::OnceLock;

use chrono::{Duration, Utc};
use gallery_shared::{
    api::{ProfileUpdateRequest, RegisterRequest},
    Profile, User,
};
use image::ImageFormat;
use regex::Regex;
use uuid::Uuid;

use super::INVALID_IMAGE;
use crate::auth::{create_session_token, hash_password, verify_password, AuthUser};
use crate::config::Config;
use crate::db::{NewUser, Session, Store};
use crate::error::AppError;
use crate::imaging::{detect_format, extension_for, fit_within_blocking, AVATAR_BOUND};
use crate::media::{MediaStore, Upload};

const MIN_PASSWORD_LEN: usize = 8;
const MAX_USERNAME_LEN: usize = 150;

fn username_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[\w.@+-]+$").expect("valid username pattern"))
}

fn validate_username(username: &str) -> Result<(), AppError> {
    if username.is_empty() {
        return Err(AppError::Validation("Username is required.".to_string()));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(AppError::Validation(format!(
            "Username must be at most {} characters.",
            MAX_USERNAME_LEN
        )));
    }
    if !username_pattern().is_match(username) {
        return Err(AppError::Validation(
            "Enter a valid username. It may contain only letters, numbers, and @/./+/-/_ characters."
                .to_string(),
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), AppError> {
    let valid = email
        .split_once('@')
        .map(|(local, domain)| {
            !local.is_empty() && !domain.is_empty() && !email.contains(char::is_whitespace)
        })
        .unwrap_or(false);

    if !valid {
        return Err(AppError::Validation("Enter a valid email address.".to_string()));
    }
    Ok(())
}

/// Creates the user and its profile.
pub async fn register(
    store: &dyn Store,
    req: &RegisterRequest,
) -> Result<(User, Profile), AppError> {
    let username = req.username.trim();
    let email = req.email.trim();

    validate_username(username)?;
    validate_email(email)?;

    if req.password1.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "This password is too short. It must contain at least {} characters.",
            MIN_PASSWORD_LEN
        )));
    }

    if req.password1 != req.password2 {
        return Err(AppError::Validation(
            "The two password fields didn't match.".to_string(),
        ));
    }

    if store.username_taken(username, None).await? {
        return Err(AppError::Validation(
            "A user with that username already exists.".to_string(),
        ));
    }

    let password_hash = hash_password(&req.password1)?;

    let user = store
        .insert_user(NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
        })
        .await?;

    let profile = ensure_profile(store, user.id).await?;

    Ok((user, profile))
}

/// Get-or-create; repairs users that somehow lost their profile.
pub async fn ensure_profile(store: &dyn Store, user_id: Uuid) -> Result<Profile, AppError> {
    let (profile, created) = store.get_or_create_profile(user_id).await?;

    if created {
        tracing::debug!(%user_id, "Created profile");
    }

    Ok(profile)
}

/// `None` for an unknown username or a wrong password.
pub async fn authenticate(
    store: &dyn Store,
    username: &str,
    password: &str,
) -> Result<Option<User>, AppError> {
    let Some((user, password_hash)) = store.find_credentials(username.trim()).await? else {
        return Ok(None);
    };

    if !verify_password(password, &password_hash)? {
        return Ok(None);
    }

    Ok(Some(user))
}

/// Persists a new session for `user` and returns the token for its cookie.
pub async fn open_session(
    store: &dyn Store,
    config: &Config,
    user: &User,
) -> Result<String, AppError> {
    let now = Utc::now();
    let session = Session {
        id: Uuid::new_v4(),
        user_id: user.id,
        created_at: now,
        expires_at: now + Duration::seconds(config.session_expires_in),
        revoked_at: None,
    };

    store.insert_session(&session).await?;

    create_session_token(
        user.id,
        &user.username,
        session.id,
        &config.jwt_secret,
        config.session_expires_in,
    )
}

pub async fn close_session(store: &dyn Store, principal: &AuthUser) -> Result<(), AppError> {
    store.revoke_session(principal.session_id).await?;
    Ok(())
}

/// Updates username/email and, when given, replaces the avatar.
///
/// A stored avatar that cannot be shrunk is kept as is: the failure is
/// logged and the update still succeeds.
pub async fn update_profile(
    store: &dyn Store,
    media: &MediaStore,
    principal: &AuthUser,
    req: &ProfileUpdateRequest,
    avatar: Option<Upload>,
) -> Result<(User, Profile), AppError> {
    let profile = ensure_profile(store, principal.id).await?;

    let username = req.username.trim();
    let email = req.email.trim();

    validate_username(username)?;
    validate_email(email)?;

    if store.username_taken(username, Some(principal.id)).await? {
        return Err(AppError::Validation(
            "A user with that username already exists.".to_string(),
        ));
    }

    let avatar: Option<(Upload, ImageFormat)> = match avatar {
        Some(upload) => {
            let format = detect_format(&upload.bytes)
                .ok_or_else(|| AppError::Validation(INVALID_IMAGE.to_string()))?;
            Some((upload, format))
        }
        None => None,
    };

    let user = store
        .update_user(principal.id, username, email)
        .await?
        .ok_or(AppError::NotFound)?;

    let Some((upload, format)) = avatar else {
        return Ok((user, profile));
    };

    let relative = media
        .save("avatars", extension_for(format), &upload.bytes)
        .await?;
    let updated = store.set_avatar(principal.id, &relative).await?;

    match fit_within_blocking(media.path_of(&relative), AVATAR_BOUND).await {
        Ok(dims) => tracing::debug!(avatar = %relative, ?dims, "Avatar stored"),
        Err(e) => tracing::warn!(avatar = %relative, "Avatar left unresized: {}", e),
    }

    if profile.has_custom_avatar() {
        media.remove(&profile.avatar).await;
    }

    tracing::info!(user_id = %principal.id, file = %upload.file_name, "Avatar updated");

    Ok((user, updated))
}
