pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod flash;
pub mod handlers;
pub mod imaging;
pub mod media;
pub mod pages;
pub mod pagination;
pub mod routes;
pub mod services;

pub use config::Config;
pub use db::{DbPool, Store};
pub use error::AppError;
pub use routes::{create_router, AppState};
