pub mod dto;

use std::env;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, warn};

use crate::error::AppError;

const DEFAULT_API_BASE: &str = "https://api.stripe.com";

#[derive(Clone, Debug)]
pub struct PaymentConfig {
    pub secret_key: String,
    pub currency: String,
    pub api_base: String,
}

impl PaymentConfig {
    /// Reads the processor settings. Returns `Ok(None)` when no secret key is set.
    pub fn new_from_env() -> Result<Option<Self>, AppError> {
        let secret_key = match env::var("STRIPE_SECRET_KEY") {
            Ok(key) if !key.trim().is_empty() => key,
            _ => return Ok(None),
        };
        let currency = env::var("PAYMENT_CURRENCY").unwrap_or_else(|_| "usd".to_string());
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(AppError::Config(format!("PAYMENT_CURRENCY is not an ISO code: {}", currency)));
        }
        let api_base = env::var("STRIPE_API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string());

        Ok(Some(Self {
            secret_key,
            currency: currency.to_lowercase(),
            api_base,
        }))
    }
}

/// Issues client-side authorization tokens for card payments.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Requests a payment intent for `amount` minor units and returns its client secret.
    async fn create_payment_intent(&self, amount: i64) -> Result<String, AppError>;
}

pub struct StripeHttpClient {
    client: Client,
    config: PaymentConfig,
}

impl StripeHttpClient {
    pub fn new(config: PaymentConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build http client: {}", e)))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl PaymentGateway for StripeHttpClient {
    async fn create_payment_intent(&self, amount: i64) -> Result<String, AppError> {
        let url = format!("{}/v1/payment_intents", self.config.api_base);
        let form = [
            ("amount", amount.to_string()),
            ("currency", self.config.currency.clone()),
            ("payment_method_types[]", "card".to_string()),
        ];

        let response = self.client
            .post(&url)
            .bearer_auth(&self.config.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::PaymentGateway(format!("request failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            let message = serde_json::from_str::<dto::ErrorResponse>(&body)
                .ok()
                .and_then(|e| {
                    let kind = e.error.kind.unwrap_or_default();
                    e.error.message.map(|m| format!("{} {}", kind, m))
                })
                .unwrap_or(body);
            return Err(AppError::PaymentGateway(format!("{}: {}", status, message)));
        }

        let intent: dto::PaymentIntent = serde_json::from_str(&body)
            .map_err(|e| AppError::PaymentGateway(format!("Failed to parse payment intent: {}", e)))?;
        info!(
            "payment intent {} created: {} {} ({})",
            intent.id,
            intent.amount,
            intent.currency,
            intent.status.as_deref().unwrap_or("unknown")
        );

        intent
            .client_secret
            .ok_or_else(|| AppError::PaymentGateway(format!("payment intent {} has no client secret", intent.id)))
    }
}

/// Stand-in used when no processor key is configured; every request is refused.
pub struct UnconfiguredPaymentGateway;

#[async_trait]
impl PaymentGateway for UnconfiguredPaymentGateway {
    async fn create_payment_intent(&self, amount: i64) -> Result<String, AppError> {
        warn!("payment intent for {} refused: no processor configured", amount);
        Err(AppError::PaymentUnavailable)
    }
}
