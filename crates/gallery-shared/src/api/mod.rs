mod auth;
mod gallery;

pub use auth::*;
pub use gallery::*;
