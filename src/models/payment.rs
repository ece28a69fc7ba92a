use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: String,
    pub class_id: String,
    pub user_email: String,
    pub amount: f64,
    #[serde(default, alias = "transactionId", skip_serializing_if = "Option::is_none")]
    pub transaction_ref: Option<String>,
    pub created_at: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPaymentRequest {
    pub class_id: String,
    pub user_email: String,
    pub amount: f64,
    #[serde(default, alias = "transactionId", skip_serializing_if = "Option::is_none")]
    pub transaction_ref: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NewPaymentRequest {
    pub fn into_payment(mut self, id: String, created_at: String) -> Payment {
        self.extra.remove("id");
        self.extra.remove("_id");
        self.extra.remove("createdAt");
        Payment {
            id,
            class_id: self.class_id,
            user_email: self.user_email,
            amount: self.amount,
            transaction_ref: self.transaction_ref,
            created_at,
            extra: self.extra,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentIntentRequest {
    #[serde(default)]
    pub price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentResponse {
    /// The processor's client secret for the intent.
    pub authorization_token: String,
}

/// Converts a major-unit price into minor units (cents). `None` when the
/// result does not fit in an `i64`.
pub fn to_minor_units(price: f64) -> Option<i64> {
    let cents = (price * 100.0).round();
    // i64::MAX as f64 rounds up to 2^63, which is already out of range.
    if cents.is_finite() && cents >= i64::MIN as f64 && cents < i64::MAX as f64 {
        Some(cents as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_minor_units() {
        assert_eq!(to_minor_units(20.0), Some(2000));
        assert_eq!(to_minor_units(19.99), Some(1999));
        assert_eq!(to_minor_units(0.0), Some(0));
    }

    #[test]
    fn test_to_minor_units_rejects_out_of_range_prices() {
        assert_eq!(to_minor_units(1e300), None);
        assert_eq!(to_minor_units(f64::INFINITY), None);
        assert_eq!(to_minor_units(f64::NAN), None);
        assert_eq!(to_minor_units(92_233_720_368_547_758.08), None);
        assert!(to_minor_units(1e15).is_some());
    }
}
