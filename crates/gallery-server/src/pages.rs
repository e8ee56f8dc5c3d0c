//! Server-rendered pages.

use askama::Template;
use axum::response::Html;
use gallery_shared::{Category, GalleryImage};
use uuid::Uuid;

use crate::error::AppError;
use crate::flash::Message;
use crate::pagination::Page;

/// Navigation and flash messages shared by every page.
#[derive(Debug, Default)]
pub struct Chrome {
    pub nav_user: Option<String>,
    pub messages: Vec<Message>,
}

impl Chrome {
    pub fn new(nav_user: Option<&str>, messages: Vec<Message>) -> Self {
        Self {
            nav_user: nav_user.map(str::to_string),
            messages,
        }
    }
}

pub fn render<T: Template>(page: &T) -> Result<Html<String>, AppError> {
    Ok(Html(page.render()?))
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterPage {
    pub chrome: Chrome,
    pub errors: Vec<String>,
    pub username: String,
    pub email: String,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub chrome: Chrome,
    pub errors: Vec<String>,
    pub username: String,
}

#[derive(Template)]
#[template(path = "profile.html")]
pub struct ProfilePage {
    pub chrome: Chrome,
    pub errors: Vec<String>,
    pub username: String,
    pub email: String,
    pub avatar: String,
}

#[derive(Template)]
#[template(path = "image_list.html")]
pub struct ImageListPage {
    pub chrome: Chrome,
    pub heading: String,
    pub page: Page<GalleryImage>,
    pub categories: Vec<Category>,
}

#[derive(Template)]
#[template(path = "image_detail.html")]
pub struct ImageDetailPage {
    pub chrome: Chrome,
    pub image: GalleryImage,
    pub category: Option<Category>,
    pub dimensions: Option<String>,
}

#[derive(Template)]
#[template(path = "confirm_delete.html")]
pub struct ConfirmDeletePage {
    pub chrome: Chrome,
    pub image: GalleryImage,
}

#[derive(Debug)]
pub struct CategoryOption {
    pub id: Uuid,
    pub name: String,
    pub selected: bool,
}

impl CategoryOption {
    pub fn list(categories: Vec<Category>, selected: Option<Uuid>) -> Vec<Self> {
        categories
            .into_iter()
            .map(|c| Self {
                selected: Some(c.id) == selected,
                id: c.id,
                name: c.name,
            })
            .collect()
    }
}

#[derive(Template)]
#[template(path = "upload.html")]
pub struct UploadPage {
    pub chrome: Chrome,
    pub errors: Vec<String>,
    pub title: String,
    pub description: String,
    pub categories: Vec<CategoryOption>,
}

#[derive(Template)]
#[template(path = "categories.html")]
pub struct CategoriesPage {
    pub chrome: Chrome,
    pub errors: Vec<String>,
    pub name: String,
    pub categories: Vec<Category>,
}
