//! One-shot user-visible messages carried across a redirect in a cookie.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::{Deserialize, Serialize};

pub const FLASH_COOKIE: &str = "gallery_messages";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Success,
    Error,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Info => "info",
            Level::Success => "success",
            Level::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub level: Level,
    pub text: String,
}

fn decode(value: &str) -> Vec<Message> {
    URL_SAFE_NO_PAD
        .decode(value)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .unwrap_or_default()
}

fn encode(messages: &[Message]) -> String {
    // Serializing plain structs cannot fail
    let json = serde_json::to_vec(messages).unwrap_or_default();
    URL_SAFE_NO_PAD.encode(json)
}

/// Queues a message for the next rendered page.
pub fn push(jar: CookieJar, level: Level, text: impl Into<String>) -> CookieJar {
    let mut messages = jar
        .get(FLASH_COOKIE)
        .map(|c| decode(c.value()))
        .unwrap_or_default();

    messages.push(Message {
        level,
        text: text.into(),
    });

    jar.add(
        Cookie::build((FLASH_COOKIE, encode(&messages)))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax),
    )
}

/// Drains queued messages, returning the jar with the cookie removed.
pub fn take(jar: CookieJar) -> (CookieJar, Vec<Message>) {
    let Some(cookie) = jar.get(FLASH_COOKIE) else {
        return (jar, Vec::new());
    };

    let messages = decode(cookie.value());
    let jar = jar.remove(Cookie::build(FLASH_COOKIE).path("/"));

    (jar, messages)
}
