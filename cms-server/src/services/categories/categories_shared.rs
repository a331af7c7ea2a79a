use cms_store::Record;
use serde::{Deserialize, Serialize};

pub const CATEGORY_NAME_FIELD: &str = "categoryName";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub category_name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Record for Category {
    fn id(&self) -> &str {
        &self.id
    }
}
