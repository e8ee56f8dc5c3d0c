mod category;
mod image;
mod user;

pub use category::*;
pub use image::*;
pub use user::*;
