use async_trait::async_trait;
use chrono::{DateTime, Utc};
use gallery_shared::{Category, GalleryImage, Profile, User};
use uuid::Uuid;

use super::{DbPool, NewGalleryImage, NewUser, Session, Store, StoreResult};

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

type UserRow = (Uuid, String, String, DateTime<Utc>, DateTime<Utc>);

fn row_to_user(row: UserRow) -> User {
    User {
        id: row.0,
        username: row.1,
        email: row.2,
        created_at: row.3,
        updated_at: row.4,
    }
}

type ProfileRow = (Uuid, String, DateTime<Utc>);

fn row_to_profile(row: ProfileRow) -> Profile {
    Profile {
        user_id: row.0,
        avatar: row.1,
        updated_at: row.2,
    }
}

type ImageRow = (
    Uuid,           // id
    Uuid,           // owner_id
    Option<Uuid>,   // category_id
    String,         // title
    Option<String>, // description
    String,         // image
    Option<i32>,    // width
    Option<i32>,    // height
    DateTime<Utc>,  // created_at
    DateTime<Utc>,  // updated_at
);

fn row_to_image(row: ImageRow) -> GalleryImage {
    GalleryImage {
        id: row.0,
        owner_id: row.1,
        category_id: row.2,
        title: row.3,
        description: row.4,
        image: row.5,
        width: row.6,
        height: row.7,
        created_at: row.8,
        updated_at: row.9,
    }
}

const IMAGE_COLUMNS: &str =
    "id, owner_id, category_id, title, description, image, width, height, created_at, updated_at";

#[async_trait]
impl Store for PgStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let row: UserRow = sqlx::query_as(
            r#"
            INSERT INTO users (id, username, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, email, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(row_to_user(row))
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, username, email, created_at, updated_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(row_to_user))
    }

    async fn find_credentials(&self, username: &str) -> StoreResult<Option<(User, String)>> {
        let row: Option<(Uuid, String, String, DateTime<Utc>, DateTime<Utc>, String)> =
            sqlx::query_as(
                r#"
                SELECT id, username, email, created_at, updated_at, password_hash
                FROM users
                WHERE username = $1
                "#,
            )
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(id, username, email, created_at, updated_at, hash)| {
            (
                row_to_user((id, username, email, created_at, updated_at)),
                hash,
            )
        }))
    }

    async fn username_taken(&self, username: &str, except: Option<Uuid>) -> StoreResult<bool> {
        let existing: Option<(Uuid,)> = sqlx::query_as(
            "SELECT id FROM users WHERE username = $1 AND ($2::uuid IS NULL OR id <> $2)",
        )
        .bind(username)
        .bind(except)
        .fetch_optional(&self.pool)
        .await?;

        Ok(existing.is_some())
    }

    async fn update_user(
        &self,
        id: Uuid,
        username: &str,
        email: &str,
    ) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            r#"
            UPDATE users
            SET username = $2, email = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING id, username, email, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(username)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(row_to_user))
    }

    async fn get_or_create_profile(&self, user_id: Uuid) -> StoreResult<(Profile, bool)> {
        let inserted: Option<ProfileRow> = sqlx::query_as(
            r#"
            INSERT INTO profiles (user_id, avatar)
            VALUES ($1, $2)
            ON CONFLICT (user_id) DO NOTHING
            RETURNING user_id, avatar, updated_at
            "#,
        )
        .bind(user_id)
        .bind(Profile::DEFAULT_AVATAR)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = inserted {
            return Ok((row_to_profile(row), true));
        }

        let row: ProfileRow =
            sqlx::query_as("SELECT user_id, avatar, updated_at FROM profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok((row_to_profile(row), false))
    }

    async fn set_avatar(&self, user_id: Uuid, avatar: &str) -> StoreResult<Profile> {
        let row: ProfileRow = sqlx::query_as(
            r#"
            UPDATE profiles SET avatar = $2, updated_at = NOW()
            WHERE user_id = $1
            RETURNING user_id, avatar, updated_at
            "#,
        )
        .bind(user_id)
        .bind(avatar)
        .fetch_one(&self.pool)
        .await?;

        Ok(row_to_profile(row))
    }

    async fn insert_session(&self, session: &Session) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, user_id, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(session.id)
        .bind(session.user_id)
        .bind(session.created_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_session(&self, id: Uuid) -> StoreResult<Option<Session>> {
        let row: Option<(Uuid, Uuid, DateTime<Utc>, DateTime<Utc>, Option<DateTime<Utc>>)> =
            sqlx::query_as(
                "SELECT id, user_id, created_at, expires_at, revoked_at \
                 FROM sessions WHERE id = $1",
            )
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(id, user_id, created_at, expires_at, revoked_at)| Session {
            id,
            user_id,
            created_at,
            expires_at,
            revoked_at,
        }))
    }

    async fn revoke_session(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query("UPDATE sessions SET revoked_at = NOW() WHERE id = $1 AND revoked_at IS NULL")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let rows: Vec<(Uuid, String)> =
            sqlx::query_as("SELECT id, name FROM categories ORDER BY name")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name)| Category { id, name })
            .collect())
    }

    async fn find_category(&self, id: Uuid) -> StoreResult<Option<Category>> {
        let row: Option<(Uuid, String)> =
            sqlx::query_as("SELECT id, name FROM categories WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(id, name)| Category { id, name }))
    }

    async fn insert_category(&self, name: &str) -> StoreResult<Category> {
        let id = Uuid::new_v4();

        sqlx::query("INSERT INTO categories (id, name) VALUES ($1, $2)")
            .bind(id)
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(Category {
            id,
            name: name.to_string(),
        })
    }

    async fn delete_category(&self, id: Uuid) -> StoreResult<bool> {
        // gallery_images.category_id is ON DELETE SET NULL
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_image(&self, image: NewGalleryImage) -> StoreResult<GalleryImage> {
        let query = format!(
            r#"
            INSERT INTO gallery_images (id, owner_id, category_id, title, description, image)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            IMAGE_COLUMNS
        );

        let row: ImageRow = sqlx::query_as(&query)
            .bind(Uuid::new_v4())
            .bind(image.owner_id)
            .bind(image.category_id)
            .bind(&image.title)
            .bind(&image.description)
            .bind(&image.image)
            .fetch_one(&self.pool)
            .await?;

        Ok(row_to_image(row))
    }

    async fn set_image_dimensions(&self, id: Uuid, width: i32, height: i32) -> StoreResult<()> {
        sqlx::query(
            "UPDATE gallery_images SET width = $2, height = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(width)
        .bind(height)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn count_owned_images(
        &self,
        owner_id: Uuid,
        category_id: Option<Uuid>,
    ) -> StoreResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM gallery_images
            WHERE owner_id = $1 AND ($2::uuid IS NULL OR category_id = $2)
            "#,
        )
        .bind(owner_id)
        .bind(category_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn list_owned_images(
        &self,
        owner_id: Uuid,
        category_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<GalleryImage>> {
        let query = format!(
            r#"
            SELECT {}
            FROM gallery_images
            WHERE owner_id = $1 AND ($2::uuid IS NULL OR category_id = $2)
            ORDER BY created_at DESC, id
            LIMIT $3 OFFSET $4
            "#,
            IMAGE_COLUMNS
        );

        let rows: Vec<ImageRow> = sqlx::query_as(&query)
            .bind(owner_id)
            .bind(category_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(row_to_image).collect())
    }

    async fn find_owned_image(
        &self,
        owner_id: Uuid,
        id: Uuid,
    ) -> StoreResult<Option<GalleryImage>> {
        let query = format!(
            "SELECT {} FROM gallery_images WHERE id = $1 AND owner_id = $2",
            IMAGE_COLUMNS
        );

        let row: Option<ImageRow> = sqlx::query_as(&query)
            .bind(id)
            .bind(owner_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(row_to_image))
    }

    async fn find_image(&self, id: Uuid) -> StoreResult<Option<GalleryImage>> {
        let query = format!("SELECT {} FROM gallery_images WHERE id = $1", IMAGE_COLUMNS);

        let row: Option<ImageRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(row_to_image))
    }

    async fn delete_image(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM gallery_images WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
