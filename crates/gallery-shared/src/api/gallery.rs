use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UploadImageRequest {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct CreateCategoryRequest {
    #[serde(default)]
    pub name: String,
}

/// `?page=` accepts a 1-based number or `last`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PageQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
}
