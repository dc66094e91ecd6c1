// Broadcast endpoints
//
// The broadcast listing is paged by send time: `older` / `newer` carry the
// `sent_at` of the boundary row.

use serde_json::Value;
use tracing::debug;

use crate::client::ApiClient;
use crate::error::Error;
use crate::models::{Broadcast, DomainStats};

/// Listing window for [`ApiClient::list_broadcasts`].
#[derive(Debug, Clone, Default)]
pub struct BroadcastQuery {
    pub search: Option<String>,
    pub older: Option<String>,
    pub newer: Option<String>,
}

impl ApiClient {
    /// `GET /api/broadcasts?search=..&older=..`
    pub async fn list_broadcasts(&self, query: &BroadcastQuery) -> Result<Vec<Broadcast>, Error> {
        let mut params = vec![("search", query.search.clone().unwrap_or_default())];
        if let Some(ref older) = query.older {
            params.push(("older", older.clone()));
        } else if let Some(ref newer) = query.newer {
            params.push(("newer", newer.clone()));
        }
        debug!("listing broadcasts");
        self.list("broadcasts", &params).await
    }

    /// Per-domain delivery counters for one broadcast.
    ///
    /// `GET /api/broadcasts/{id}/domainstats`
    pub async fn broadcast_domain_stats(&self, id: &str) -> Result<Vec<DomainStats>, Error> {
        debug!(id, "fetching broadcast domain stats");
        self.get(&format!("broadcasts/{id}/domainstats")).await
    }

    /// Copy a broadcast into a new draft.
    ///
    /// `POST /api/broadcasts/{id}/duplicate`
    pub async fn duplicate_broadcast(&self, id: &str) -> Result<Value, Error> {
        debug!(id, "duplicating broadcast");
        self.action("broadcasts", id, "duplicate").await
    }

    /// Stop a scheduled or sending broadcast.
    ///
    /// `POST /api/broadcasts/{id}/cancel`
    pub async fn cancel_broadcast(&self, id: &str) -> Result<(), Error> {
        debug!(id, "canceling broadcast");
        self.action("broadcasts", id, "cancel").await?;
        Ok(())
    }
}
