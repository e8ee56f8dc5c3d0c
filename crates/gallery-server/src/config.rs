use std::env;
use std::path::PathBuf;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub session_expires_in: i64,
    pub port: u16,
    pub media_root: PathBuf,
    pub max_upload_bytes: usize,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            session_expires_in: env::var("SESSION_EXPIRES_IN")
                .unwrap_or_else(|_| "1209600".to_string()) // 2 weeks
                .parse()
                .context("SESSION_EXPIRES_IN must be a number of seconds")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("PORT must be a valid port number")?,
            media_root: env::var("MEDIA_ROOT")
                .unwrap_or_else(|_| "media".to_string())
                .into(),
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .unwrap_or_else(|_| "10485760".to_string()) // 10 MiB
                .parse()
                .context("MAX_UPLOAD_BYTES must be a number of bytes")?,
        })
    }
}
