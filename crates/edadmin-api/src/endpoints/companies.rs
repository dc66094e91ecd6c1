// Customer moderation endpoints
//
// These are bulk endpoints keyed by action name rather than by record:
// `POST /api/{action}companies` with the ids in the body.

use serde_json::json;
use strum::{Display, EnumString, IntoStaticStr};
use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::CustomerCredits;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum CompanyAction {
    Approve,
    Ban,
    Unban,
    Pause,
    Unpause,
}

impl CompanyAction {
    /// Whether the action takes a customer out of service.
    pub fn is_destructive(self) -> bool {
        matches!(self, Self::Ban | Self::Pause)
    }

    fn path(self) -> String {
        format!("{self}companies")
    }
}

impl ApiClient {
    /// Apply a moderation action to one or more customers.
    ///
    /// Approval takes `{"ids": [...]}`; the others take a bare id array.
    pub async fn company_action(&self, action: CompanyAction, ids: &[String]) -> Result<(), Error> {
        debug!(%action, count = ids.len(), "customer moderation");
        let body = match action {
            CompanyAction::Approve => json!({ "ids": ids }),
            _ => json!(ids),
        };
        self.post_value(&action.path(), &body).await?;
        Ok(())
    }

    /// `GET /api/companies/{id}/credits`
    pub async fn company_credits(&self, id: &str) -> Result<CustomerCredits, Error> {
        self.get(&format!("companies/{id}/credits")).await
    }
}
