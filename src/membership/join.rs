//! Join Protocol
//!
//! A child adopting a parent runs two steps, in order:
//! 1. **Register**: `POST /addChild` on the parent with this node's address, so the
//!    parent includes it in every future fan-out.
//! 2. **Synchronize**: `GET /display` on the parent and replace the local store with
//!    the returned snapshot, discarding whatever was there before.
//!
//! Both must succeed. A failure in step 2 leaves the node registered but stale, and
//! is reported as [`NodeError::SyncFailed`] rather than swallowed.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;

use crate::error::{NodeError, NodeResult};
use crate::node::protocol::{AddChildRequest, ENDPOINT_ADD_CHILD, ENDPOINT_DISPLAY};
use crate::storage::memory::Store;

pub const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct JoinProtocol {
    http_client: reqwest::Client,
    timeout: Duration,
}

impl Default for JoinProtocol {
    fn default() -> Self {
        Self::new(DEFAULT_JOIN_TIMEOUT)
    }
}

impl JoinProtocol {
    pub fn new(timeout: Duration) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            timeout,
        }
    }

    /// Registers `self_address` with `parent`, then pulls the parent's snapshot
    /// into `store`. Returns the number of entries now held locally.
    pub async fn run(
        &self,
        parent: &str,
        self_address: Option<&str>,
        store: &Store,
    ) -> NodeResult<usize> {
        let self_address = self_address.ok_or_else(|| NodeError::RegistrationFailed {
            parent: parent.to_string(),
            reason: "self address not set".to_string(),
        })?;

        self.register(parent, self_address)
            .await
            .map_err(|e| NodeError::RegistrationFailed {
                parent: parent.to_string(),
                reason: e.to_string(),
            })?;
        tracing::info!("Registered {} as child of {}", self_address, parent);

        let snapshot = self
            .fetch_snapshot(parent)
            .await
            .map_err(|e| NodeError::SyncFailed {
                parent: parent.to_string(),
                reason: e.to_string(),
            })?;

        let entries = snapshot.len();
        store.replace_all(snapshot).await;
        tracing::info!("Synchronized {} entries from {}", entries, parent);

        Ok(entries)
    }

    async fn register(&self, parent: &str, self_address: &str) -> Result<()> {
        let payload = AddChildRequest {
            child_node: Some(self_address.to_string()),
        };

        let response = self
            .http_client
            .post(format!("http://{}{}", parent, ENDPOINT_ADD_CHILD))
            .json(&payload)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("registration rejected ({}): {}", status, body));
        }

        Ok(())
    }

    async fn fetch_snapshot(&self, parent: &str) -> Result<HashMap<String, String>> {
        let response = self
            .http_client
            .get(format!("http://{}{}", parent, ENDPOINT_DISPLAY))
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("snapshot request failed ({}): {}", status, body));
        }

        let snapshot: HashMap<String, String> = response.json().await?;
        Ok(snapshot)
    }
}
