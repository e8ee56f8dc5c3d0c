use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gallery_shared::{Category, GalleryImage, Profile, User};
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

mod postgres;

pub use postgres::PgStore;

pub type DbPool = PgPool;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub async fn create_pool(database_url: &str) -> anyhow::Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    MIGRATOR.run(&pool).await?;

    Ok(pool)
}

pub type StoreResult<T> = Result<T, sqlx::Error>;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewGalleryImage {
    pub owner_id: Uuid,
    pub category_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub image: String,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}

/// Persistence port for users, profiles, sessions, categories and images.
///
/// Image reads named `*_owned_*` are scoped to one owner; `find_image` is the
/// only unscoped lookup and exists for the delete flow, which must tell
/// "absent" apart from "owned by someone else".
#[async_trait]
pub trait Store: Send + Sync + 'static {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Returns the user together with the stored password hash.
    async fn find_credentials(&self, username: &str) -> StoreResult<Option<(User, String)>>;

    /// Whether `username` belongs to any user other than `except`.
    async fn username_taken(&self, username: &str, except: Option<Uuid>) -> StoreResult<bool>;

    async fn update_user(
        &self,
        id: Uuid,
        username: &str,
        email: &str,
    ) -> StoreResult<Option<User>>;

    /// Returns the profile and whether it was created by this call.
    async fn get_or_create_profile(&self, user_id: Uuid) -> StoreResult<(Profile, bool)>;

    async fn set_avatar(&self, user_id: Uuid, avatar: &str) -> StoreResult<Profile>;

    async fn insert_session(&self, session: &Session) -> StoreResult<()>;

    async fn find_session(&self, id: Uuid) -> StoreResult<Option<Session>>;

    async fn revoke_session(&self, id: Uuid) -> StoreResult<()>;

    async fn list_categories(&self) -> StoreResult<Vec<Category>>;

    async fn find_category(&self, id: Uuid) -> StoreResult<Option<Category>>;

    async fn insert_category(&self, name: &str) -> StoreResult<Category>;

    /// Deletes the category and detaches it from every image that used it.
    async fn delete_category(&self, id: Uuid) -> StoreResult<bool>;

    async fn insert_image(&self, image: NewGalleryImage) -> StoreResult<GalleryImage>;

    async fn set_image_dimensions(&self, id: Uuid, width: i32, height: i32) -> StoreResult<()>;

    async fn count_owned_images(
        &self,
        owner_id: Uuid,
        category_id: Option<Uuid>,
    ) -> StoreResult<i64>;

    /// Newest first.
    async fn list_owned_images(
        &self,
        owner_id: Uuid,
        category_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<GalleryImage>>;

    async fn find_owned_image(&self, owner_id: Uuid, id: Uuid) -> StoreResult<Option<GalleryImage>>;

    async fn find_image(&self, id: Uuid) -> StoreResult<Option<GalleryImage>>;

    async fn delete_image(&self, id: Uuid) -> StoreResult<bool>;
}
