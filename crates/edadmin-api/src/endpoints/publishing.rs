// Publish workflow shared by policies, routes and warmups.
//
// Edits are staged on the record (`dirty`) until published; `revert`
// discards them and `duplicate` copies the record under a new name.

use serde_json::Value;
use strum::{Display, EnumString, IntoStaticStr};
use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum PublishAction {
    Publish,
    Revert,
    Duplicate,
}

impl ApiClient {
    /// `POST /api/{collection}/{id}/{publish|revert|duplicate}`
    pub async fn publish_action(
        &self,
        collection: &str,
        id: &str,
        action: PublishAction,
    ) -> Result<Value, Error> {
        debug!(collection, id, %action, "publish workflow");
        self.action(collection, id, action.into()).await
    }
}
