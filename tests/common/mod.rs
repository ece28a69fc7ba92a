#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use campsunshine::api::router;
use campsunshine::error::AppError;
use campsunshine::models::Class;
use campsunshine::payments::PaymentGateway;
use campsunshine::state::AppState;
use serde_json::Value;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::types::Json;
use tower::ServiceExt;
use uuid::Uuid;

/// Gateway fake that remembers every amount it was asked to authorize.
#[derive(Default)]
pub struct RecordingGateway {
    pub amounts: Mutex<Vec<i64>>,
}

impl RecordingGateway {
    pub fn calls(&self) -> Vec<i64> {
        self.amounts.lock().expect("gateway lock poisoned").clone()
    }
}

#[async_trait]
impl PaymentGateway for RecordingGateway {
    async fn create_payment_intent(&self, amount: i64) -> Result<String, AppError> {
        self.amounts.lock().expect("gateway lock poisoned").push(amount);
        Ok(format!("pi_test_{}_secret", amount))
    }
}

pub struct TestApp {
    pub router: Router,
    pub db: SqlitePool,
    pub gateway: Arc<RecordingGateway>,
}

pub async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test db");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

/// A throwaway database file shared by several pool connections, so
/// concurrent requests really run on separate connections.
pub struct FileDb {
    pub pool: SqlitePool,
    path: PathBuf,
}

impl Drop for FileDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            std::fs::remove_file(file).ok();
        }
    }
}

pub async fn setup_file_db(max_connections: u32) -> FileDb {
    let path = std::env::temp_dir().join(format!("campsunshine-test-{}.db", Uuid::new_v4()));
    let options = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(10));

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .min_connections(max_connections)
        .connect_with(options)
        .await
        .expect("Failed to create file db");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    FileDb { pool, path }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with_pool(setup_test_db().await)
}

pub fn spawn_app_with_pool(db: SqlitePool) -> TestApp {
    let gateway = Arc::new(RecordingGateway::default());
    let state = AppState {
        db: db.clone(),
        payments: gateway.clone(),
    };

    TestApp {
        router: router(state),
        db,
        gateway,
    }
}

impl TestApp {
    pub async fn find_class(&self, id: &str) -> Class {
        let Json(class) =
            sqlx::query_scalar::<_, Json<Class>>("SELECT doc FROM classes WHERE id = ?1")
                .bind(id)
                .fetch_one(&self.db)
                .await
                .expect("Class not found");
        class
    }

    pub async fn count_payments(&self) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM payments")
            .fetch_one(&self.db)
            .await
            .expect("Failed to count payments")
    }

    /// Sends one request and returns the status with the body parsed as JSON
    /// (`Value::Null` for an empty body).
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let (status, bytes) = self.send_raw(method, uri, body).await;
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, json)
    }

    pub async fn send_raw(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");

        (status, bytes.to_vec())
    }
}
