use cms_store::Record;
use serde::{Deserialize, Serialize};

pub const CONTACT_NAME_FIELD: &str = "contactName";
pub const PHONE_FIELD: &str = "phone";
pub const CATEGORY_IDS_FIELD: &str = "categoryIds";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: String,
    pub contact_name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub category_ids: Vec<String>,
}

impl Record for Contact {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Contact {
    pub fn has_category(&self, category_id: &str) -> bool {
        self.category_ids.iter().any(|id| id == category_id)
    }
}

/// Drops repeated ids, keeping the first occurrence of each.
pub fn dedup_ids(ids: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}
