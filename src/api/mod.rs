mod classes;
mod payments;
mod selections;
mod users;

use axum::routing::{patch, post};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/users", get(users::list_users).post(users::create_user))
        .route("/addUser", post(users::create_user))
        .route("/users/status/{role}", get(users::list_users_by_role))
        // PUT: the body's `email`, when present, wins over the path segment.
        .route(
            "/users/{email}",
            get(users::get_user).put(users::upsert_user).delete(users::delete_user),
        )
        .route("/classes", get(classes::list_classes).post(classes::create_class))
        .route("/classes/approved", get(classes::list_approved_classes))
        .route("/classes/popular", get(classes::list_popular_classes))
        .route("/classes/status/{id}", patch(classes::update_class_status))
        .route("/classes/select", post(selections::select_class))
        // GET takes a user email, DELETE a selection id.
        .route(
            "/classes/select/{key}",
            get(selections::list_selections).delete(selections::remove_selection),
        )
        // GET takes an instructor email, PATCH a class id.
        .route(
            "/classes/{key}",
            get(classes::list_classes_by_instructor).patch(classes::update_class),
        )
        .route("/create-payment-intent", post(payments::create_payment_intent))
        .route("/process-payment", post(payments::process_payment))
        .route("/payments/{email}", get(payments::list_payments))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root() -> &'static str {
    "Camp Sunshine server is running"
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}

/// Store identifiers are UUIDs; anything else is rejected before touching the store.
fn parse_id(raw: &str) -> Result<String, AppError> {
    Uuid::parse_str(raw)
        .map(|id| id.to_string())
        .map_err(|_| AppError::BadRequest(format!("malformed id: {}", raw)))
}
