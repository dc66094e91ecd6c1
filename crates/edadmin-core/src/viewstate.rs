// ── Table view-state codec ──
//
// Report tables persist search, paging and sort in the `tablestate` query
// parameter as JSON, so drill-down links can return to the same view. Links
// produced before the `v` field existed carry no version and read as v1.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::location::{Location, RETURN_TO_PARAM};

pub const TABLESTATE_PARAM: &str = "tablestate";
pub const TABLESTATE_VERSION: u32 = 1;
pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewStateError {
    #[error("table state version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("malformed table state: {0}")]
    Malformed(String),
}

/// One sort column; `desc` flips the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortRule {
    pub id: String,
    #[serde(default)]
    pub desc: bool,
}

impl SortRule {
    pub fn asc(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            desc: false,
        }
    }

    pub fn desc(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            desc: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableState {
    #[serde(default = "legacy_version")]
    pub v: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub search: String,
    #[serde(default)]
    pub page: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub sorted: Vec<SortRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

fn legacy_version() -> u32 {
    1
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

impl Default for TableState {
    fn default() -> Self {
        Self {
            v: TABLESTATE_VERSION,
            search: String::new(),
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
            sorted: Vec::new(),
            start: None,
            end: None,
        }
    }
}

impl TableState {
    pub fn with_sort(mut self, sorted: Vec<SortRule>) -> Self {
        self.sorted = sorted;
        self
    }

    pub fn encode(&self) -> String {
        // Only plain strings and numbers; serialization cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn decode(raw: &str) -> Result<Self, ViewStateError> {
        let state: Self =
            serde_json::from_str(raw).map_err(|e| ViewStateError::Malformed(e.to_string()))?;
        if state.v > TABLESTATE_VERSION {
            return Err(ViewStateError::UnsupportedVersion {
                found: state.v,
                supported: TABLESTATE_VERSION,
            });
        }
        Ok(Self {
            v: TABLESTATE_VERSION,
            ..state
        })
    }

    /// The state stored in `location`, if it carries one.
    pub fn from_location(location: &Location) -> Result<Option<Self>, ViewStateError> {
        location
            .param(TABLESTATE_PARAM)
            .filter(|raw| !raw.is_empty())
            .map(Self::decode)
            .transpose()
    }

    pub fn apply_to(&self, location: Location) -> Location {
        location.with_param(TABLESTATE_PARAM, self.encode())
    }
}

/// The `returnto` link for drill-down rows: `current` with `state` embedded.
///
/// The result is meant for [`Location::with_param`] with
/// [`RETURN_TO_PARAM`]; query encoding happens there.
pub fn return_to(current: &Location, state: &TableState) -> String {
    state
        .apply_to(current.clone().without_param(RETURN_TO_PARAM))
        .to_string()
}

/// Drill-down link to `target` that returns to `current` with `state`.
pub fn drill_down(target: Location, current: &Location, state: &TableState) -> Location {
    target.with_param(RETURN_TO_PARAM, return_to(current, state))
}
