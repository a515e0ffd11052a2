//! `/tags` handlers.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};

use crate::{
    models::tags::{ParentInfo, Tag, ValueEntry},
    tags::{codec, filter::ParentSelections, filter::TagService as _},
};

use super::{ApiError, AppState};

#[derive(Clone, Debug, serde::Deserialize)]
pub struct NewTag {
    pub name: String,
    #[serde(default)]
    pub values: Vec<ValueEntry>,
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct NewValue {
    pub value: String,
    #[serde(default)]
    pub parent_info: Option<ParentInfo>,
}

#[derive(Clone, Debug, serde::Deserialize)]
pub struct RemovedValue {
    pub value: String,
}

#[derive(Clone, Debug, Default, serde::Deserialize)]
pub struct FilterRequest {
    #[serde(default)]
    pub parent_filters: ParentSelections,
}

/// Tag names in paths may come in either form.
fn key_from_path(name: &str) -> String {
    codec::display_to_db_key(name.trim())
}

pub async fn list_tags(State(state): State<AppState>) -> Result<Json<Vec<Tag>>, ApiError> {
    Ok(Json(state.db.list_tags().await?))
}

pub async fn create_tag(
    State(state): State<AppState>,
    payload: Result<Json<NewTag>, JsonRejection>,
) -> Result<(StatusCode, Json<Tag>), ApiError> {
    let Json(new) = payload?;
    let tag = state.db.create_tag(&new.name, new.values).await?;

    Ok((StatusCode::CREATED, Json(tag)))
}

pub async fn delete_tag(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.db.delete_tag(&key_from_path(&name)).await?;
    Ok(Json(json!({ "message": "Tag deleted successfully" })))
}

pub async fn add_tag_value(
    State(state): State<AppState>,
    Path(name): Path<String>,
    payload: Result<Json<NewValue>, JsonRejection>,
) -> Result<Json<Tag>, ApiError> {
    let Json(new) = payload?;
    let tag = state
        .db
        .add_tag_value(&key_from_path(&name), &new.value, new.parent_info)
        .await?;

    Ok(Json(tag))
}

pub async fn delete_tag_value(
    State(state): State<AppState>,
    Path(name): Path<String>,
    payload: Result<Json<RemovedValue>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(removed) = payload?;
    state
        .db
        .delete_tag_value(&key_from_path(&name), &removed.value)
        .await?;

    Ok(Json(json!({ "message": "Tag value deleted successfully" })))
}

/// The values of a tag that fit the given parent selections.
pub async fn filtered_values(
    State(state): State<AppState>,
    Path(name): Path<String>,
    payload: Result<Json<FilterRequest>, JsonRejection>,
) -> Result<Json<Vec<ValueEntry>>, ApiError> {
    let Json(req) = payload?;

    // blank selections don't filter anything
    let filters: ParentSelections = req
        .parent_filters
        .into_iter()
        .filter(|(_, v)| !v.trim().is_empty())
        .collect();

    let values = state
        .db
        .filtered_values(&key_from_path(&name), &filters)
        .await?;

    Ok(Json(values))
}
