//! The HTTP API the gallery front end talks to.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};

use crate::{config::Config, database::Database, media::MediaStore};

pub mod error;
pub mod photos;
pub mod tags;

pub use error::ApiError;

/// Room for the multipart framing and tag fields around an upload.
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Shared by every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub db: Database,
    pub media: MediaStore,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Database, config: Config) -> Self {
        let config = Arc::new(config);
        Self {
            db,
            media: MediaStore::new(Arc::clone(&config)),
            config,
        }
    }
}

/// Makes the router with every endpoint attached.
pub fn build_router(state: AppState) -> Router {
    // uploads get checked against the real limit in the handler, so a
    // too-big photo gets a proper error instead of a dropped body
    let body_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD;

    Router::new()
        .route(
            "/photos",
            get(photos::list_photos).post(photos::upload_photo),
        )
        .route("/photos/search", post(photos::search_photos))
        .route("/photos/stats", get(photos::photo_stats))
        .route("/photos/optimize", get(photos::optimize_photo))
        .route(
            "/photos/:id",
            put(photos::update_photo).delete(photos::delete_photo),
        )
        .route("/media/:name", get(photos::serve_media))
        .route("/tags", get(tags::list_tags).post(tags::create_tag))
        .route("/tags/:name", delete(tags::delete_tag))
        .route(
            "/tags/:name/values",
            post(tags::add_tag_value).delete(tags::delete_tag_value),
        )
        .route("/tags/:name/values/filtered", post(tags::filtered_values))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
