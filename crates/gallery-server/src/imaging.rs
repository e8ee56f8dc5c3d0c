//! Post-write downscaling of stored images.
//!
//! Files are resized in place: the stored file is overwritten with an
//! aspect-preserving thumbnail that fits within a square bound. Images that
//! already fit are left untouched and are never fully decoded.

use std::path::{Path, PathBuf};

use anyhow::Context;
use image::{ImageError, ImageFormat};

use crate::error::AppError;

/// Avatars are bounded to 300×300.
pub const AVATAR_BOUND: u32 = 300;

/// Gallery images are bounded to 1000×1000.
pub const GALLERY_BOUND: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn fits_within(&self, bound: u32) -> bool {
        self.width <= bound && self.height <= bound
    }
}

/// Sniffs the format of uploaded bytes. `None` means the bytes are not an
/// image this server can store.
pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
    let format = image::guess_format(bytes).ok()?;
    format.can_read().then_some(format)
}

/// File extension to store an upload of `format` under.
pub fn extension_for(format: ImageFormat) -> &'static str {
    format.extensions_str().first().copied().unwrap_or("img")
}

/// Shrinks the file at `path` in place so that both sides are at most
/// `bound`, returning the final dimensions.
pub fn fit_within(path: &Path, bound: u32) -> Result<Dimensions, ImageError> {
    let (width, height) = image::image_dimensions(path)?;
    let original = Dimensions { width, height };

    if original.fits_within(bound) {
        return Ok(original);
    }

    let thumbnail = image::open(path)?.thumbnail(bound, bound);
    thumbnail.save(path)?;

    tracing::debug!(
        path = %path.display(),
        from = ?(width, height),
        to = ?(thumbnail.width(), thumbnail.height()),
        "Resized image"
    );

    Ok(Dimensions {
        width: thumbnail.width(),
        height: thumbnail.height(),
    })
}

/// [`fit_within`] on the blocking pool.
pub async fn fit_within_blocking(path: PathBuf, bound: u32) -> Result<Dimensions, AppError> {
    let dimensions = tokio::task::spawn_blocking(move || fit_within(&path, bound))
        .await
        .context("Image resize task failed")??;

    Ok(dimensions)
}
