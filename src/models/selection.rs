use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A student's pending pick of a class. `class_id` is not checked against
/// the classes collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub id: String,
    pub user_email: String,
    pub class_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSelectionRequest {
    pub user_email: String,
    pub class_id: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NewSelectionRequest {
    pub fn into_selection(mut self, id: String) -> Selection {
        self.extra.remove("id");
        self.extra.remove("_id");
        Selection {
            id,
            user_email: self.user_email,
            class_id: self.class_id,
            extra: self.extra,
        }
    }
}
