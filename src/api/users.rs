use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::db::repository;
use crate::error::AppError;
use crate::models::*;
use crate::state::AppState;

pub(super) async fn create_user(
    State(state): State<AppState>,
    Json(profile): Json<UserProfile>,
) -> Result<(StatusCode, Json<InsertAck>), AppError> {
    let email = profile
        .email
        .clone()
        .ok_or_else(|| AppError::Validation("email is required".to_string()))?;
    let user = User {
        email: email.clone(),
        display_name: profile.display_name,
        photo_url: profile.photo_url,
        role: profile.role,
        extra: profile.extra,
    };

    if !repository::insert_user(&state.db, &user).await? {
        return Err(AppError::Conflict(format!("user {} already exists", email)));
    }
    Ok((StatusCode::CREATED, Json(InsertAck::new(email))))
}

pub(super) async fn upsert_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Json(profile): Json<UserProfile>,
) -> Result<Json<UpdateAck>, AppError> {
    let key = profile.lookup_key(&email).to_string();
    let ack = repository::upsert_user(&state.db, &key, &profile).await?;
    Ok(Json(ack))
}

pub(super) async fn get_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Option<User>>, AppError> {
    let user = repository::find_user(&state.db, &email).await?;
    Ok(Json(user))
}

pub(super) async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<User>>, AppError> {
    let users = repository::fetch_users(&state.db).await?;
    Ok(Json(users))
}

pub(super) async fn list_users_by_role(
    State(state): State<AppState>,
    Path(role): Path<String>,
) -> Result<Json<Vec<User>>, AppError> {
    let filter = role.parse::<RoleFilter>().map_err(AppError::BadRequest)?;
    let users = repository::fetch_users_by_role(&state.db, filter).await?;
    Ok(Json(users))
}

pub(super) async fn delete_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<DeleteAck>, AppError> {
    let deleted = repository::delete_user(&state.db, &email).await?;
    Ok(Json(DeleteAck::new(deleted)))
}
