use serde::{Deserialize, Serialize};

use super::Extra;

/// A broadcast (one-off campaign) with its delivery counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Broadcast {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub sent_at: Option<String>,
    #[serde(default)]
    pub finished_at: Option<String>,
    #[serde(default)]
    pub scheduled_for: Option<String>,
    #[serde(default)]
    pub canceled: bool,
    #[serde(default)]
    pub error: Option<String>,

    // ── Counters ──
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub delivered: u64,
    #[serde(default)]
    pub send: u64,
    #[serde(default)]
    pub opened: u64,
    #[serde(default)]
    pub clicked: u64,
    #[serde(default)]
    pub unsubscribed: u64,
    #[serde(default)]
    pub complained: u64,
    #[serde(default)]
    pub bounced: u64,
    #[serde(default)]
    pub soft: u64,
    #[serde(default)]
    pub hard: u64,

    #[serde(default)]
    pub overdomaincomplaint: bool,
    #[serde(default)]
    pub overdomainbounce: bool,

    #[serde(flatten)]
    pub extra: Extra,
}

/// Display status derived from a broadcast's timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum BroadcastStatus {
    Canceled,
    Error,
    Complete,
    Scheduled,
    Initializing,
    Sending,
    Draft,
}

impl Broadcast {
    pub fn status(&self) -> BroadcastStatus {
        if self.canceled {
            BroadcastStatus::Canceled
        } else if self.error.as_deref().is_some_and(|e| !e.is_empty()) {
            BroadcastStatus::Error
        } else if self.finished_at.is_some() {
            BroadcastStatus::Complete
        } else if self.sent_at.is_some() && self.count == 0 {
            BroadcastStatus::Initializing
        } else if self.sent_at.is_some() {
            BroadcastStatus::Sending
        } else if self.scheduled_for.is_some() {
            BroadcastStatus::Scheduled
        } else {
            BroadcastStatus::Draft
        }
    }
}

/// Per-domain delivery counters (`GET /api/broadcasts/{id}/domainstats`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainStats {
    pub domain: String,
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub send: u64,
    #[serde(default)]
    pub open: u64,
    #[serde(default)]
    pub click: u64,
    #[serde(default)]
    pub unsub: u64,
    #[serde(default)]
    pub complaint: u64,
    #[serde(default)]
    pub soft: u64,
    #[serde(default)]
    pub hard: u64,
    #[serde(default)]
    pub overdomainbounce: bool,
    #[serde(default)]
    pub overdomaincomplaint: bool,
}
