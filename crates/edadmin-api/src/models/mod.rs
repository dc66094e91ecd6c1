// Wire models for the admin API.
//
// Every record keeps unmodeled fields in a flattened `extra` map so a
// load → edit → save cycle never drops data the client doesn't know about.

mod broadcast;
mod company;
mod contacts;
mod delivery;
mod webhook;

pub use broadcast::{Broadcast, BroadcastStatus, DomainStats};
pub use company::{Customer, CustomerCredits};
pub use contacts::{ContactList, Segment};
pub use delivery::{DomainThrottle, Policy, PolicySink, Route, RouteRule, RouteSplit, Sink, Warmup};
pub use webhook::{Webhook, WebhookEvent, WebhookTestRequest, WebhookTestResult};

/// Unmodeled fields, preserved verbatim.
pub type Extra = serde_json::Map<String, serde_json::Value>;
