#![allow(dead_code)]

mod memory;

use std::io::Cursor;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::Router;
use axum_test::multipart::{MultipartForm, Part};
use axum_test::{TestResponse, TestServer};
use gallery_server::{create_router, Config};
use image::{DynamicImage, ImageFormat, RgbImage};
use tempfile::TempDir;
use uuid::Uuid;

pub use memory::MemoryStore;

pub const PASSWORD: &str = "s3cret-pass";

pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub media: TempDir,
    router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_upload_limit(10 * 1024 * 1024)
    }

    pub fn with_upload_limit(max_upload_bytes: usize) -> Self {
        let media = tempfile::tempdir().expect("failed to create media root");
        let store = Arc::new(MemoryStore::new());

        let config = Config {
            database_url: String::new(),
            jwt_secret: "test-secret".to_string(),
            session_expires_in: 3600,
            port: 0,
            media_root: media.path().to_path_buf(),
            max_upload_bytes,
        };

        let router = create_router(store.clone(), config);

        Self {
            store,
            media,
            router,
        }
    }

    /// A browser-like client with its own cookie jar.
    pub fn client(&self) -> TestServer {
        TestServer::builder()
            .save_cookies()
            .build(self.router.clone())
            .expect("failed to build test server")
    }

    /// Registers and logs in `username` on a fresh client.
    pub async fn signed_in(&self, username: &str) -> TestServer {
        let client = self.client();
        register(&client, username).await;
        login(&client, username).await;
        client
    }

    pub fn media_path(&self, relative: &str) -> std::path::PathBuf {
        self.media.path().join(relative)
    }

    pub fn user_id(&self, username: &str) -> Uuid {
        self.store
            .user_named(username)
            .unwrap_or_else(|| panic!("{} not registered", username))
            .id
    }
}

pub async fn register(client: &TestServer, username: &str) -> TestResponse {
    let email = format!("{}@example.com", username);
    client
        .post("/register/")
        .form(&[
            ("username", username),
            ("email", email.as_str()),
            ("password1", PASSWORD),
            ("password2", PASSWORD),
        ])
        .await
}

pub async fn login(client: &TestServer, username: &str) -> TestResponse {
    let response = client
        .post("/login/")
        .form(&[("username", username), ("password", PASSWORD)])
        .await;
    response.assert_status(StatusCode::FOUND);
    response
}

pub fn location(response: &TestResponse) -> String {
    response
        .header("location")
        .to_str()
        .expect("location is ascii")
        .to_string()
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(RgbImage::new(width, height))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("failed to encode png");
    bytes
}

/// Carries a PNG signature so it passes format sniffing, but cannot be decoded.
pub fn corrupt_png() -> Vec<u8> {
    let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
    bytes.extend_from_slice(b"this is not really an image");
    bytes
}

pub fn image_part(bytes: Vec<u8>, file_name: &str) -> Part {
    Part::bytes(bytes)
        .file_name(file_name)
        .mime_type("image/png")
}

pub async fn upload(
    client: &TestServer,
    title: &str,
    bytes: Vec<u8>,
    category: Option<Uuid>,
) -> TestResponse {
    let mut form = MultipartForm::new()
        .add_text("title", title)
        .add_text("description", "")
        .add_part("image", image_part(bytes, "upload.png"));

    if let Some(category) = category {
        form = form.add_text("category", category.to_string());
    }

    client.post("/upload/").multipart(form).await
}
