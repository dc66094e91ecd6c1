use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use super::Extra;

/// Events a webhook can subscribe to.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WebhookEvent {
    FormSubmit,
    ListAdd,
    TagAdd,
    TagRemove,
    Send,
    Open,
    Click,
    Unsub,
    Complaint,
    HardBounce,
    SoftBounce,
    Bounce,
    #[default]
    OpenClick,
    UnsubComplaint,
}

impl WebhookEvent {
    pub fn description(self) -> &'static str {
        match self {
            Self::FormSubmit => "When a contact submits a subscribe form",
            Self::ListAdd => "When a contact is added to a list",
            Self::TagAdd => "When a tag is added to a contact",
            Self::TagRemove => "When a tag is removed from a contact",
            Self::Send => "When a message is sent to a contact",
            Self::Open => "When a contact opens an email",
            Self::Click => "When a contact clicks a link",
            Self::Unsub => "When a contact unsubscribes",
            Self::Complaint => "When a contact marks email as spam",
            Self::HardBounce => "When an email permanently bounces",
            Self::SoftBounce => "When an email temporarily bounces",
            Self::Bounce => "When an email bounces (hard or soft)",
            Self::OpenClick => "When a contact opens or clicks",
            Self::UnsubComplaint => "When a contact unsubs or complains",
        }
    }

    /// Sample payload sent by `webhooks test`.
    pub fn example_payload(self) -> Value {
        let name: &'static str = self.into();
        serde_json::json!({
            "type": name,
            "email": "contact@example.com",
            "timestamp": "2025-01-25T12:00:00Z",
        })
    }
}

/// A REST hook (`/api/resthooks`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Webhook {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub target_url: String,
    #[serde(default)]
    pub event: WebhookEvent,
    #[serde(flatten)]
    pub extra: Extra,
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookTestRequest {
    pub target_url: String,
    pub payload: Value,
}

/// Outcome of `POST /api/resthooks/test`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebhookTestResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub status_code: Option<u16>,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}
