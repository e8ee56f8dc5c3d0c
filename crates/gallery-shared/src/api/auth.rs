use serde::{Deserialize, Serialize};

// Form fields default to empty so that missing inputs surface as
// validation messages instead of extractor rejections.

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LoginQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ProfileUpdateRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
}
