use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Moderation state of a class. Labels are stored as lowercase strings,
/// so sorting on them is lexicographic: `pending > denied > approved`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassStatus {
    #[default]
    Pending,
    Approved,
    Denied,
}

impl ClassStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClassStatus::Pending => "pending",
            ClassStatus::Approved => "approved",
            ClassStatus::Denied => "denied",
        }
    }
}

impl fmt::Display for ClassStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClassStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ClassStatus::Pending),
            "approved" => Ok(ClassStatus::Approved),
            "denied" => Ok(ClassStatus::Denied),
            other => Err(format!("unknown class status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: String,
    #[serde(alias = "email")]
    pub instructor_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor_name: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    pub seats: i64,
    #[serde(default)]
    pub enrolled: i64,
    #[serde(default)]
    pub status: ClassStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClassRequest {
    #[serde(alias = "email")]
    pub instructor_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor_name: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    pub seats: i64,
    #[serde(default)]
    pub enrolled: i64,
    #[serde(default)]
    pub status: ClassStatus,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NewClassRequest {
    pub fn into_class(mut self, id: String) -> Class {
        for key in ClassPatch::IMMUTABLE_KEYS {
            self.extra.remove(key);
        }
        Class {
            id,
            instructor_email: self.instructor_email,
            instructor_name: self.instructor_name,
            title: self.title,
            image: self.image,
            price: self.price,
            seats: self.seats,
            enrolled: self.enrolled,
            status: self.status,
            feedback: None,
            extra: self.extra,
        }
    }
}

/// Partial class update. Each key present replaces the stored top-level
/// field whole; unknown keys are written verbatim, `null` included.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassPatch {
    #[serde(default, alias = "email", skip_serializing_if = "Option::is_none")]
    pub instructor_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seats: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrolled: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ClassStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ClassPatch {
    /// Keys that name the document itself and can never be overwritten.
    pub const IMMUTABLE_KEYS: [&'static str; 2] = ["id", "_id"];

    /// Builds a patch from an arbitrary JSON object, dropping identifier keys.
    pub fn from_object(mut fields: Map<String, Value>) -> Result<Self, serde_json::Error> {
        for key in Self::IMMUTABLE_KEYS {
            fields.remove(key);
        }
        serde_json::from_value(Value::Object(fields))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: ClassStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}
