use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use gallery_server::db::{NewGalleryImage, NewUser, Session, Store, StoreResult};
use gallery_shared::{Category, GalleryImage, Profile, User};
use uuid::Uuid;

#[derive(Debug, Default)]
struct Tables {
    users: Vec<(User, String)>,
    profiles: Vec<Profile>,
    sessions: Vec<Session>,
    categories: Vec<Category>,
    // Insertion order; listings read it back to front
    images: Vec<GalleryImage>,
}

/// In-process [`Store`] with the same scoping rules as the Postgres one.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut Tables) -> R) -> R {
        let mut tables = self.tables.lock().unwrap();
        f(&mut tables)
    }

    pub fn user_named(&self, username: &str) -> Option<User> {
        self.with(|t| {
            t.users
                .iter()
                .find(|(u, _)| u.username == username)
                .map(|(u, _)| u.clone())
        })
    }

    pub fn user_count(&self) -> usize {
        self.with(|t| t.users.len())
    }

    pub fn profile_of(&self, user_id: Uuid) -> Option<Profile> {
        self.with(|t| t.profiles.iter().find(|p| p.user_id == user_id).cloned())
    }

    pub fn drop_profile(&self, user_id: Uuid) {
        self.with(|t| t.profiles.retain(|p| p.user_id != user_id));
    }

    pub fn active_sessions(&self, user_id: Uuid) -> usize {
        let now = Utc::now();
        self.with(|t| {
            t.sessions
                .iter()
                .filter(|s| s.user_id == user_id && s.is_active(now))
                .count()
        })
    }

    pub fn images(&self) -> Vec<GalleryImage> {
        self.with(|t| t.images.clone())
    }

    pub fn image_count(&self) -> usize {
        self.with(|t| t.images.len())
    }

    pub fn category_named(&self, name: &str) -> Option<Category> {
        self.with(|t| t.categories.iter().find(|c| c.name == name).cloned())
    }
}

fn owned<'a>(
    images: &'a [GalleryImage],
    owner_id: Uuid,
    category_id: Option<Uuid>,
) -> impl Iterator<Item = &'a GalleryImage> {
    images
        .iter()
        .rev()
        .filter(move |i| i.owner_id == owner_id)
        .filter(move |i| category_id.map_or(true, |c| i.category_id == Some(c)))
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            created_at: now,
            updated_at: now,
        };
        self.with(|t| t.users.push((created.clone(), user.password_hash)));
        Ok(created)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.with(|t| t.users.iter().find(|(u, _)| u.id == id).map(|(u, _)| u.clone())))
    }

    async fn find_credentials(&self, username: &str) -> StoreResult<Option<(User, String)>> {
        Ok(self.with(|t| t.users.iter().find(|(u, _)| u.username == username).cloned()))
    }

    async fn username_taken(&self, username: &str, except: Option<Uuid>) -> StoreResult<bool> {
        Ok(self.with(|t| {
            t.users
                .iter()
                .any(|(u, _)| u.username == username && Some(u.id) != except)
        }))
    }

    async fn update_user(
        &self,
        id: Uuid,
        username: &str,
        email: &str,
    ) -> StoreResult<Option<User>> {
        Ok(self.with(|t| {
            t.users.iter_mut().find(|(u, _)| u.id == id).map(|(u, _)| {
                u.username = username.to_string();
                u.email = email.to_string();
                u.updated_at = Utc::now();
                u.clone()
            })
        }))
    }

    async fn get_or_create_profile(&self, user_id: Uuid) -> StoreResult<(Profile, bool)> {
        Ok(self.with(|t| {
            if let Some(existing) = t.profiles.iter().find(|p| p.user_id == user_id) {
                return (existing.clone(), false);
            }
            let profile = Profile {
                user_id,
                avatar: Profile::DEFAULT_AVATAR.to_string(),
                updated_at: Utc::now(),
            };
            t.profiles.push(profile.clone());
            (profile, true)
        }))
    }

    async fn set_avatar(&self, user_id: Uuid, avatar: &str) -> StoreResult<Profile> {
        self.with(|t| {
            t.profiles
                .iter_mut()
                .find(|p| p.user_id == user_id)
                .map(|p| {
                    p.avatar = avatar.to_string();
                    p.updated_at = Utc::now();
                    p.clone()
                })
                .ok_or(sqlx::Error::RowNotFound)
        })
    }

    async fn insert_session(&self, session: &Session) -> StoreResult<()> {
        self.with(|t| t.sessions.push(session.clone()));
        Ok(())
    }

    async fn find_session(&self, id: Uuid) -> StoreResult<Option<Session>> {
        Ok(self.with(|t| t.sessions.iter().find(|s| s.id == id).cloned()))
    }

    async fn revoke_session(&self, id: Uuid) -> StoreResult<()> {
        self.with(|t| {
            if let Some(session) = t.sessions.iter_mut().find(|s| s.id == id) {
                session.revoked_at.get_or_insert_with(Utc::now);
            }
        });
        Ok(())
    }

    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let mut categories = self.with(|t| t.categories.clone());
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn find_category(&self, id: Uuid) -> StoreResult<Option<Category>> {
        Ok(self.with(|t| t.categories.iter().find(|c| c.id == id).cloned()))
    }

    async fn insert_category(&self, name: &str) -> StoreResult<Category> {
        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        self.with(|t| t.categories.push(category.clone()));
        Ok(category)
    }

    async fn delete_category(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.with(|t| {
            let before = t.categories.len();
            t.categories.retain(|c| c.id != id);
            for image in t.images.iter_mut().filter(|i| i.category_id == Some(id)) {
                image.category_id = None;
            }
            t.categories.len() < before
        }))
    }

    async fn insert_image(&self, image: NewGalleryImage) -> StoreResult<GalleryImage> {
        let now = Utc::now();
        let created = GalleryImage {
            id: Uuid::new_v4(),
            owner_id: image.owner_id,
            category_id: image.category_id,
            title: image.title,
            description: image.description,
            image: image.image,
            width: None,
            height: None,
            created_at: now,
            updated_at: now,
        };
        self.with(|t| t.images.push(created.clone()));
        Ok(created)
    }

    async fn set_image_dimensions(&self, id: Uuid, width: i32, height: i32) -> StoreResult<()> {
        self.with(|t| {
            if let Some(image) = t.images.iter_mut().find(|i| i.id == id) {
                image.width = Some(width);
                image.height = Some(height);
                image.updated_at = Utc::now();
            }
        });
        Ok(())
    }

    async fn count_owned_images(
        &self,
        owner_id: Uuid,
        category_id: Option<Uuid>,
    ) -> StoreResult<i64> {
        Ok(self.with(|t| owned(&t.images, owner_id, category_id).count() as i64))
    }

    async fn list_owned_images(
        &self,
        owner_id: Uuid,
        category_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> StoreResult<Vec<GalleryImage>> {
        Ok(self.with(|t| {
            owned(&t.images, owner_id, category_id)
                .skip(offset as usize)
                .take(limit as usize)
                .cloned()
                .collect()
        }))
    }

    async fn find_owned_image(
        &self,
        owner_id: Uuid,
        id: Uuid,
    ) -> StoreResult<Option<GalleryImage>> {
        Ok(self.with(|t| {
            t.images
                .iter()
                .find(|i| i.id == id && i.owner_id == owner_id)
                .cloned()
        }))
    }

    async fn find_image(&self, id: Uuid) -> StoreResult<Option<GalleryImage>> {
        Ok(self.with(|t| t.images.iter().find(|i| i.id == id).cloned()))
    }

    async fn delete_image(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.with(|t| {
            let before = t.images.len();
            t.images.retain(|i| i.id != id);
            t.images.len() < before
        }))
    }
}
