use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Extra;

/// A contact list with its engagement counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactList {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub active: u64,
    #[serde(default)]
    pub unsubscribed: u64,
    #[serde(default)]
    pub bounced: u64,
    #[serde(default)]
    pub complained: u64,
    #[serde(flatten)]
    pub extra: Extra,
}

/// A segment. Rule trees are kept as raw JSON; the backend owns their grammar.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parts: Vec<Value>,
    #[serde(default)]
    pub operator: String,
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(flatten)]
    pub extra: Extra,
}
