use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, services::ServeDir, trace::TraceLayer};

use crate::auth::auth_middleware;
use crate::handlers::{
    accounts as account_handlers, categories as category_handlers, gallery as gallery_handlers,
};
use crate::media::MediaStore;
use crate::{Config, Store};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub media: MediaStore,
    pub config: Config,
}

pub fn create_router(store: Arc<dyn Store>, config: Config) -> Router {
    let media = MediaStore::new(config.media_root.clone());
    let body_limit = config.max_upload_bytes;
    let state = AppState {
        store,
        media: media.clone(),
        config,
    };

    // Public account routes (no middleware)
    let public_routes = Router::new()
        .route(
            "/register/",
            get(account_handlers::register_form).post(account_handlers::register),
        )
        .route(
            "/login/",
            get(account_handlers::login_form).post(account_handlers::login),
        );

    // Everything else requires a session
    let protected_routes = Router::new()
        .route("/", get(gallery_handlers::list_images))
        .route(
            "/logout/",
            get(account_handlers::logout).post(account_handlers::logout),
        )
        .route(
            "/profile/",
            get(account_handlers::profile_form).post(account_handlers::update_profile),
        )
        .route(
            "/upload/",
            get(gallery_handlers::upload_form).post(gallery_handlers::upload_image),
        )
        .route("/image/:id/", get(gallery_handlers::image_detail))
        .route(
            "/image/:id/delete/",
            get(gallery_handlers::confirm_delete).post(gallery_handlers::delete_image),
        )
        .route("/category/:id/", get(gallery_handlers::category_images))
        .route(
            "/categories/",
            get(category_handlers::list_categories).post(category_handlers::create_category),
        )
        .route("/category/:id/delete/", post(category_handlers::delete_category))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(public_routes)
        .merge(protected_routes)
        .nest_service("/media", ServeDir::new(media.root()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
