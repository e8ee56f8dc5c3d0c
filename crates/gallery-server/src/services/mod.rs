//! Request-independent operations. Every call that reads or mutates user
//! data takes the authenticated principal explicitly.

pub mod accounts;
pub mod categories;
pub mod gallery;

pub(crate) const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";
