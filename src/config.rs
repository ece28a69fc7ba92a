use std::env;
use std::net::IpAddr;

use crate::error::AppError;
use crate::payments::PaymentConfig;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: IpAddr,
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    /// `None` leaves payment intents disabled.
    pub payment: Option<PaymentConfig>,
}

impl AppConfig {
    /// Loads settings from the environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let host = env::var("HOST")
            .unwrap_or_else(|_| "0.0.0.0".to_string())
            .parse::<IpAddr>()
            .map_err(|e| AppError::Config(format!("Invalid HOST: {}", e)))?;
        let port = env::var("PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()
            .map_err(|e| AppError::Config(format!("Invalid PORT: {}", e)))?;
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://campsunshine.db?mode=rwc".to_string());
        let db_max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u32>()
            .map_err(|e| AppError::Config(format!("Invalid DB_MAX_CONNECTIONS: {}", e)))?;

        Ok(Self {
            host,
            port,
            database_url,
            db_max_connections,
            payment: PaymentConfig::new_from_env()?,
        })
    }
}
