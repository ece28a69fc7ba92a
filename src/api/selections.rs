use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use super::parse_id;
use crate::db::repository;
use crate::error::AppError;
use crate::models::*;
use crate::state::AppState;

pub(super) async fn select_class(
    State(state): State<AppState>,
    Json(req): Json<NewSelectionRequest>,
) -> Result<(StatusCode, Json<InsertAck>), AppError> {
    let selection = repository::insert_selection(&state.db, req).await?;
    Ok((StatusCode::CREATED, Json(InsertAck::new(selection.id))))
}

pub(super) async fn list_selections(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Vec<Selection>>, AppError> {
    let selections = repository::fetch_selections_for_user(&state.db, &email).await?;
    Ok(Json(selections))
}

pub(super) async fn remove_selection(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteAck>, AppError> {
    let id = parse_id(&id)?;
    let deleted = repository::delete_selection(&state.db, &id).await?;
    Ok(Json(DeleteAck::new(deleted)))
}
