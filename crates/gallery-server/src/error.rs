use askama::Template;
use axum::{
    extract::multipart::MultipartError,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Page not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("Invalid upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorPage<'a> {
    status: u16,
    message: &'a str,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Unauthorized => {
                return (StatusCode::FOUND, [(header::LOCATION, "/login/")]).into_response();
            }
            AppError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Multipart(e) => (e.status(), e.body_text()),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string())
            }
            AppError::Image(e) => {
                tracing::error!("Image processing error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Image processing error".to_string())
            }
            AppError::Template(e) => {
                tracing::error!("Template error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".to_string())
            }
        };

        let page = ErrorPage {
            status: status.as_u16(),
            message: &message,
        };

        match page.render() {
            Ok(body) => (status, Html(body)).into_response(),
            Err(_) => (status, message).into_response(),
        }
    }
}
