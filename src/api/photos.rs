//! `/photos` handlers, plus serving the stored originals.

use axum::{
    body::Bytes,
    extract::{
        multipart::MultipartRejection,
        rejection::{JsonRejection, QueryRejection},
        Multipart, Path, Query, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    database::photos::PhotoStats,
    error::{BirdLensError, MediaError},
    media::{optimize, storage::MEDIA_URL_PREFIX, OptimizeRequest},
    models::photo::{Photo, PhotoTags},
    search::SearchCriteria,
};

use super::{ApiError, AppState};

/// The multipart field carrying the image. Every other field is a tag.
const PHOTO_FIELD: &str = "photo";

fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::bad_request(format!("`{id}` is not a valid photo id")))
}

pub async fn list_photos(State(state): State<AppState>) -> Result<Json<Vec<Photo>>, ApiError> {
    Ok(Json(state.db.list_photos().await?))
}

/// Takes a multipart upload: the `photo` file and any number of tag fields.
#[tracing::instrument(skip_all)]
pub async fn upload_photo(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<Photo>), ApiError> {
    let mut multipart = multipart?;

    let mut upload: Option<(String, Bytes)> = None;
    let mut tags = PhotoTags::new();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == PHOTO_FIELD {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await?;
            upload = Some((filename, bytes));
        } else {
            let value = field.text().await?;
            tags.insert(name, value);
        }
    }

    let (filename, bytes) = upload.ok_or(MediaError::NoPhoto)?;
    let stored = state.media.save(&filename, &bytes).await?;

    let photo = Photo::new(stored.filename, stored.url, tags, Utc::now());
    if let Err(e) = state.db.insert_photo(&photo).await {
        // don't leave an orphaned file around
        if let Err(cleanup) = state.media.remove(&photo.url).await {
            tracing::warn!("couldn't remove orphaned upload `{}`: {cleanup}", photo.url);
        }
        return Err(e.into());
    }

    tracing::info!("uploaded photo `{}`", photo.id);
    Ok((StatusCode::CREATED, Json(photo)))
}

pub async fn search_photos(
    State(state): State<AppState>,
    payload: Result<Json<SearchCriteria>, JsonRejection>,
) -> Result<Json<Vec<Photo>>, ApiError> {
    let Json(criteria) = payload?;
    Ok(Json(state.db.search_photos(&criteria).await?))
}

pub async fn photo_stats(State(state): State<AppState>) -> Result<Json<PhotoStats>, ApiError> {
    Ok(Json(state.db.photo_stats().await?))
}

/// Replaces some of a photo's tags. An empty value removes that tag.
pub async fn update_photo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<PhotoTags>, JsonRejection>,
) -> Result<Json<Photo>, ApiError> {
    let id = parse_id(&id)?;
    let Json(changes) = payload?;

    Ok(Json(state.db.update_photo_tags(&id, changes).await?))
}

pub async fn delete_photo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = parse_id(&id)?;
    let photo = state.db.delete_photo(&id).await?;

    // the record is gone either way
    match state.media.remove(&photo.url).await {
        Ok(()) => {}
        Err(MediaError::NotLocalMedia(url)) => {
            tracing::debug!("photo `{id}` pointed at `{url}`, which isn't stored here");
        }
        Err(e) => tracing::warn!("photo `{id}` was deleted, but its file wasn't: {e}"),
    }

    Ok(Json(json!({ "message": "Photo deleted successfully" })))
}

/// Resized and re-encoded bytes of a stored photo.
pub async fn optimize_photo(
    State(state): State<AppState>,
    query: Result<Query<OptimizeRequest>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(req) = query?;
    let path = state.media.resolve(&req.url)?;
    let content_type = req.format.content_type();

    let bytes = optimize::optimize(path, req).await?;

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CACHE_CONTROL, "public, max-age=86400"),
        ],
        bytes,
    ))
}

/// Sends back an original upload.
pub async fn serve_media(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let path = state.media.resolve(&format!("{MEDIA_URL_PREFIX}{name}"))?;

    let bytes = tokio::fs::read(&path).await.map_err(|_| {
        BirdLensError::from(MediaError::MediaDoesntExist {
            path: path.to_string(),
        })
    })?;

    let content_type = match path.extension().map(str::to_lowercase).as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    };

    Ok(([(header::CONTENT_TYPE, content_type)], bytes))
}
