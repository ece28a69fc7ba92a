use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde_json::{Map, Value};
use tracing::info;

use super::parse_id;
use crate::db::repository;
use crate::error::AppError;
use crate::models::*;
use crate::state::AppState;

const POPULAR_LIMIT: i64 = 7;

pub(super) async fn create_class(
    State(state): State<AppState>,
    Json(req): Json<NewClassRequest>,
) -> Result<(StatusCode, Json<InsertAck>), AppError> {
    let class = repository::insert_class(&state.db, req).await?;
    info!("class {} created by {}", class.id, class.instructor_email);
    Ok((StatusCode::CREATED, Json(InsertAck::new(class.id))))
}

pub(super) async fn list_classes(State(state): State<AppState>) -> Result<Json<Vec<Class>>, AppError> {
    let classes = repository::fetch_classes_by_status_desc(&state.db).await?;
    Ok(Json(classes))
}

pub(super) async fn list_approved_classes(
    State(state): State<AppState>,
) -> Result<Json<Vec<Class>>, AppError> {
    let classes = repository::fetch_classes_with_status(&state.db, ClassStatus::Approved).await?;
    Ok(Json(classes))
}

pub(super) async fn list_popular_classes(
    State(state): State<AppState>,
) -> Result<Json<Vec<Class>>, AppError> {
    let classes = repository::fetch_popular_classes(&state.db, POPULAR_LIMIT).await?;
    Ok(Json(classes))
}

pub(super) async fn list_classes_by_instructor(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Vec<Class>>, AppError> {
    let classes = repository::fetch_classes_by_instructor(&state.db, &email).await?;
    Ok(Json(classes))
}

pub(super) async fn update_class_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<Json<UpdateAck>, AppError> {
    let id = parse_id(&id)?;
    let matched = repository::update_class_status(&state.db, &id, &req).await?;
    info!("class {} status set to {} (matched {})", id, req.status, matched);
    Ok(Json(UpdateAck::matched(matched)))
}

pub(super) async fn update_class(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(fields): Json<Map<String, Value>>,
) -> Result<Json<UpdateAck>, AppError> {
    let id = parse_id(&id)?;
    let patch = ClassPatch::from_object(fields).map_err(|e| AppError::Validation(e.to_string()))?;
    let matched = repository::merge_class(&state.db, &id, &patch).await?;
    Ok(Json(UpdateAck::matched(matched)))
}
