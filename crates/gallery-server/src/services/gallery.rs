use gallery_shared::{api::UploadImageRequest, GalleryImage};
use uuid::Uuid;

use super::INVALID_IMAGE;
use crate::auth::AuthUser;
use crate::db::{NewGalleryImage, Store};
use crate::error::AppError;
use crate::imaging::{detect_format, extension_for, fit_within_blocking, GALLERY_BOUND};
use crate::media::{MediaStore, Upload};
use crate::pagination::{Page, PageWindow};

pub const PAGE_SIZE: i64 = 12;
const MAX_TITLE_LEN: usize = 200;

/// Outcome of a delete request for an image that exists.
#[derive(Debug)]
pub enum Deletion {
    Allowed(GalleryImage),
    /// The image belongs to someone else.
    Refused,
}

/// Stores the file, records it for `principal`, then shrinks it in place.
///
/// A file that cannot be decoded fails the request after the record has been
/// persisted; the record is left without dimensions.
pub async fn upload(
    store: &dyn Store,
    media: &MediaStore,
    principal: &AuthUser,
    req: &UploadImageRequest,
    image: Option<Upload>,
) -> Result<GalleryImage, AppError> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Title is required.".to_string()));
    }
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(AppError::Validation(format!(
            "Title must be at most {} characters.",
            MAX_TITLE_LEN
        )));
    }

    let upload =
        image.ok_or_else(|| AppError::Validation("An image file is required.".to_string()))?;
    let format = detect_format(&upload.bytes)
        .ok_or_else(|| AppError::Validation(INVALID_IMAGE.to_string()))?;

    if let Some(category_id) = req.category_id {
        if store.find_category(category_id).await?.is_none() {
            return Err(AppError::Validation(
                "Select a valid category.".to_string(),
            ));
        }
    }

    let description = req
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    let relative = media
        .save("gallery", extension_for(format), &upload.bytes)
        .await?;

    let image = store
        .insert_image(NewGalleryImage {
            owner_id: principal.id,
            category_id: req.category_id,
            title: title.to_string(),
            description,
            image: relative,
        })
        .await?;

    tracing::info!(
        image_id = %image.id,
        owner_id = %principal.id,
        file = %upload.file_name,
        "Image uploaded"
    );

    let dims = fit_within_blocking(media.path_of(&image.image), GALLERY_BOUND).await?;
    let (width, height) = (dims.width as i32, dims.height as i32);
    store.set_image_dimensions(image.id, width, height).await?;

    Ok(GalleryImage {
        width: Some(width),
        height: Some(height),
        ..image
    })
}

/// The principal's images, newest first, optionally restricted to a category.
pub async fn list(
    store: &dyn Store,
    principal: &AuthUser,
    category_id: Option<Uuid>,
    page: Option<&str>,
) -> Result<Page<GalleryImage>, AppError> {
    let total = store.count_owned_images(principal.id, category_id).await?;
    let window = PageWindow::resolve(page, total, PAGE_SIZE)?;

    let items = store
        .list_owned_images(principal.id, category_id, window.limit, window.offset)
        .await?;

    Ok(window.into_page(items, total))
}

/// Images of other users are reported as not found.
pub async fn detail(
    store: &dyn Store,
    principal: &AuthUser,
    id: Uuid,
) -> Result<GalleryImage, AppError> {
    store
        .find_owned_image(principal.id, id)
        .await?
        .ok_or(AppError::NotFound)
}

/// Unlike [`detail`], an image of another user is found and then refused.
pub async fn authorize_delete(
    store: &dyn Store,
    principal: &AuthUser,
    id: Uuid,
) -> Result<Deletion, AppError> {
    let image = store.find_image(id).await?.ok_or(AppError::NotFound)?;

    if !image.is_owned_by(principal.id) {
        tracing::warn!(image_id = %id, user_id = %principal.id, "Refused delete of foreign image");
        return Ok(Deletion::Refused);
    }

    Ok(Deletion::Allowed(image))
}

pub async fn delete(
    store: &dyn Store,
    media: &MediaStore,
    principal: &AuthUser,
    id: Uuid,
) -> Result<Deletion, AppError> {
    let deletion = authorize_delete(store, principal, id).await?;

    if let Deletion::Allowed(image) = &deletion {
        store.delete_image(image.id).await?;
        media.remove(&image.image).await;
        tracing::info!(image_id = %image.id, owner_id = %principal.id, "Image deleted");
    }

    Ok(deletion)
}
