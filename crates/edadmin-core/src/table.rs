// ── Client-side table bookkeeping ──
//
// Listings come back whole; search, sort and paging happen locally on JSON
// rows, the same way the report tables work in the browser.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde_json::Value;

use crate::viewstate::{SortRule, TableState};

/// One page of rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub rows: Vec<Value>,
    /// Zero-based, clamped into range.
    pub page: usize,
    pub page_count: usize,
    /// Rows after search, before paging.
    pub total: usize,
}

/// Rows plus the view operations applied to them.
#[derive(Debug, Clone, Default)]
pub struct TableView {
    rows: Vec<Value>,
}

impl TableView {
    pub fn new(rows: Vec<Value>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Value] {
        &self.rows
    }

    /// Keep rows where any of `columns` contains `query`, ignoring case.
    pub fn search(mut self, query: &str, columns: &[&str]) -> Self {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self;
        }
        self.rows.retain(|row| {
            columns.iter().any(|col| {
                row.get(*col)
                    .map(cell_text)
                    .is_some_and(|text| text.to_lowercase().contains(&needle))
            })
        });
        self
    }

    /// Stable multi-column sort. Missing and null cells sort last in both
    /// directions.
    pub fn sort(mut self, rules: &[SortRule]) -> Self {
        if rules.is_empty() {
            return self;
        }
        self.rows.sort_by(|a, b| {
            rules
                .iter()
                .map(|rule| compare_cells(a.get(&rule.id), b.get(&rule.id), rule.desc))
                .find(|ord| *ord != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
        self
    }

    pub fn page(self, page: usize, page_size: usize) -> Page {
        let total = self.rows.len();
        let page_size = page_size.max(1);
        let page_count = total.div_ceil(page_size).max(1);
        let page = page.min(page_count - 1);
        let rows = self
            .rows
            .into_iter()
            .skip(page * page_size)
            .take(page_size)
            .collect();
        Page {
            rows,
            page,
            page_count,
            total,
        }
    }

    /// Search, sort and page according to a saved view-state.
    pub fn apply(self, state: &TableState, search_columns: &[&str]) -> Page {
        self.search(&state.search, search_columns)
            .sort(&state.sorted)
            .page(state.page, state.page_size)
    }
}

/// Text used for searching and plain rendering.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(cell_text).collect::<Vec<_>>().join(", "),
        other => other.to_string(),
    }
}

fn compare_cells(a: Option<&Value>, b: Option<&Value>, desc: bool) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    let ord = match (a, b) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Greater,
        (Some(_), None) => return Ordering::Less,
        (Some(a), Some(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => cell_text(a).to_lowercase().cmp(&cell_text(b).to_lowercase()),
        },
    };
    if desc { ord.reverse() } else { ord }
}

/// Ids of selected rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<String>,
}

impl Selection {
    /// Flip one id; returns whether it is now selected.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_owned());
            true
        }
    }

    /// Select every row's `id`.
    pub fn select_all(&mut self, rows: &[Value]) {
        self.ids
            .extend(rows.iter().filter_map(|r| r.get("id")).map(cell_text));
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

// ── Report formatting ────────────────────────────────────────────────

/// Format a fraction as a percentage with two decimals: `0.1234` → `"12.34%"`.
pub fn pct(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

/// `n / d` as a percentage; 0 when either side is zero.
pub fn ratio_pct(n: f64, d: f64) -> f64 {
    if n.abs() < f64::EPSILON || d.abs() < f64::EPSILON {
        return 0.0;
    }
    n / d * 100.0
}
