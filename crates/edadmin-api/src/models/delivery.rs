// ── Delivery configuration models ──
//
// Policies, routes, servers (sinks), warmups and domain throttles. These are
// admin-level records; the impersonation header is never sent for them.

use serde::{Deserialize, Serialize};

use super::Extra;

/// A delivery policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub domains: String,
    #[serde(default)]
    pub domaincount: u64,
    /// Unpublished edits are pending.
    #[serde(default)]
    pub dirty: bool,
    #[serde(default)]
    pub sinks: Vec<PolicySink>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Server allocation inside a policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicySink {
    #[serde(default)]
    pub sink: String,
    #[serde(default)]
    pub pct: u32,
    #[serde(default)]
    pub allips: bool,
    #[serde(flatten)]
    pub extra: Extra,
}

/// A postal route: ordered rules, each splitting traffic across policies.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Route {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub usedefault: bool,
    #[serde(default)]
    pub dirty: bool,
    #[serde(default)]
    pub rules: Vec<RouteRule>,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteRule {
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub domaingroup: String,
    #[serde(default)]
    pub splits: Vec<RouteSplit>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteSplit {
    #[serde(default)]
    pub policy: String,
    #[serde(default)]
    pub pct: u32,
}

/// An MTA server ("sink").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sink {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(flatten)]
    pub extra: Extra,
}

/// An IP warmup schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Warmup {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub sink: Option<String>,
    #[serde(default)]
    pub ips: String,
    #[serde(default)]
    pub dailylimit: u64,
    #[serde(default)]
    pub rampfactor: u32,
    #[serde(default)]
    pub dirty: bool,
    #[serde(flatten)]
    pub extra: Extra,
}

/// A per-domain send throttle on a route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DomainThrottle {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub route: String,
    #[serde(default)]
    pub domains: String,
    #[serde(default)]
    pub minlimit: Option<u64>,
    #[serde(default)]
    pub hourlimit: Option<u64>,
    #[serde(default)]
    pub daylimit: Option<u64>,
    #[serde(default)]
    pub active: bool,
    #[serde(flatten)]
    pub extra: Extra,
}
