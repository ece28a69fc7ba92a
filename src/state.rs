use std::sync::Arc;

use sqlx::SqlitePool;

use crate::payments::PaymentGateway;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub payments: Arc<dyn PaymentGateway>,
}
