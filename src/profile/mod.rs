use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod store;

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub schema_version: u32,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            fields: BTreeMap::new(),
            updated_at: None,
        }
    }
}
