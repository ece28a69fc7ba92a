use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{info, warn};

use crate::db::repository;
use crate::error::AppError;
use crate::models::payment::to_minor_units;
use crate::models::*;
use crate::state::AppState;

/// Without a `price` (or without any body at all) nothing is requested from
/// the processor and the response carries no body.
pub(super) async fn create_payment_intent(
    State(state): State<AppState>,
    req: Option<Json<PaymentIntentRequest>>,
) -> Result<Response, AppError> {
    let Some(price) = req.and_then(|Json(req)| req.price) else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };
    if price < 0.0 {
        return Err(AppError::Validation("price must not be negative".to_string()));
    }

    let amount = to_minor_units(price)
        .ok_or_else(|| AppError::Validation(format!("price {} is out of range", price)))?;
    let authorization_token = state.payments.create_payment_intent(amount).await?;
    Ok(Json(PaymentIntentResponse { authorization_token }).into_response())
}

pub(super) async fn process_payment(
    State(state): State<AppState>,
    Json(req): Json<NewPaymentRequest>,
) -> Result<(StatusCode, Json<InsertAck>), AppError> {
    let recorded = repository::record_payment(&state.db, req).await?;
    let payment = recorded.payment;

    if recorded.class_matched {
        info!("payment {} confirmed a seat in class {}", payment.id, payment.class_id);
    } else {
        warn!(
            "payment {} recorded for unknown class {}; no seat was taken",
            payment.id, payment.class_id
        );
    }

    Ok((StatusCode::CREATED, Json(InsertAck::new(payment.id))))
}

pub(super) async fn list_payments(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<Vec<Payment>>, AppError> {
    let payments = repository::fetch_payments_for_user(&state.db, &email).await?;
    Ok(Json(payments))
}
