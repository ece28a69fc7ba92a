use serde::{Deserialize, Serialize};

/// Result of a single-document insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertAck {
    pub acknowledged: bool,
    pub inserted_id: String,
}

impl InsertAck {
    pub fn new(inserted_id: impl Into<String>) -> Self {
        Self {
            acknowledged: true,
            inserted_id: inserted_id.into(),
        }
    }
}

/// Result of an update or upsert. `upserted_id` is set only when the
/// update created the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAck {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_id: Option<String>,
}

impl UpdateAck {
    pub fn matched(count: u64) -> Self {
        Self {
            acknowledged: true,
            matched_count: count,
            modified_count: count,
            upserted_id: None,
        }
    }

    pub fn upserted(id: impl Into<String>) -> Self {
        Self {
            acknowledged: true,
            matched_count: 0,
            modified_count: 0,
            upserted_id: Some(id.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAck {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

impl DeleteAck {
    pub fn new(deleted_count: u64) -> Self {
        Self {
            acknowledged: true,
            deleted_count,
        }
    }
}
