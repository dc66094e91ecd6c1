use serde::{Deserialize, Serialize};

use super::Extra;

/// A customer account (`/api/companies`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub frontend: String,
    #[serde(default)]
    pub routes: Vec<String>,

    // ── Send limits ──
    #[serde(default)]
    pub minlimit: Option<u64>,
    #[serde(default)]
    pub hourlimit: Option<u64>,
    #[serde(default)]
    pub daylimit: Option<u64>,
    #[serde(default)]
    pub monthlimit: Option<u64>,

    // ── Account state ──
    #[serde(default)]
    pub inreview: bool,
    #[serde(default)]
    pub paused: bool,
    #[serde(default)]
    pub banned: bool,
    #[serde(default)]
    pub paid: bool,
    #[serde(default)]
    pub approved_at: Option<String>,

    #[serde(flatten)]
    pub extra: Extra,
}

impl Customer {
    /// Short status label used in listings.
    pub fn state_label(&self) -> &'static str {
        if self.banned {
            "banned"
        } else if self.paused {
            "paused"
        } else if self.inreview {
            "in review"
        } else if self.paid {
            "paid"
        } else {
            "active"
        }
    }
}

/// Credit balance (`GET /api/companies/{id}/credits`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerCredits {
    #[serde(default)]
    pub unlimited: i64,
    #[serde(default)]
    pub expire: i64,
}
