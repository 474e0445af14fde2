use std::collections::HashMap;
use std::sync::Arc;

use crate::config::NodeConfig;
use crate::error::{NodeError, NodeResult};
use crate::membership::join::JoinProtocol;
use crate::membership::topology::Topology;
use crate::membership::types::{Origin, Role};
use crate::node::protocol::{ENDPOINT_DELETE, ENDPOINT_PUT};
use crate::replication::fanout::{Replicator, RetryPolicy};
use crate::storage::memory::Store;

/// What the router did with a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    /// Applied to the local store (and fanned out, on a root).
    Applied,
    /// Not applied; the client must re-send the request to `location`.
    Redirect { location: String },
}

/// A node of the replication tree.
///
/// Routes every incoming request by role: a root applies writes and fans them
/// out, a child redirects client writes to its parent and applies only what
/// replication pushes down. Reads are always local.
pub struct Node {
    store: Arc<Store>,
    topology: Arc<Topology>,
    replicator: Replicator,
    join: JoinProtocol,
}

impl Node {
    pub fn new(
        store: Arc<Store>,
        topology: Arc<Topology>,
        replicator: Replicator,
        join: JoinProtocol,
    ) -> Self {
        Self {
            store,
            topology,
            replicator,
            join,
        }
    }

    pub fn from_config(config: &NodeConfig) -> Self {
        let topology = match config.role {
            Role::Root => Topology::root(config.self_address.clone(), config.children.clone()),
            Role::Child => Topology::child(config.self_address.clone(), config.parent.clone()),
        };
        let replicator = Replicator::new(config.replication_timeout)
            .with_retry(RetryPolicy::with_attempts(config.replication_attempts));

        Self::new(
            Arc::new(Store::new()),
            Arc::new(topology),
            replicator,
            JoinProtocol::new(config.join_timeout),
        )
    }

    pub fn role(&self) -> Role {
        self.topology.role()
    }

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn topology(&self) -> &Arc<Topology> {
        &self.topology
    }

    /// Client write.
    pub async fn handle_put(&self, key: String, value: String) -> NodeResult<MutationOutcome> {
        require("key", &key)?;
        require("value", &value)?;

        if !self.role().is_root() {
            let parent = self.parent_or_fail().await?;
            return Ok(MutationOutcome::Redirect {
                location: format!("http://{}{}", parent, ENDPOINT_PUT),
            });
        }

        self.store.set(key.clone(), value.clone()).await;
        tracing::info!("Stored: {} -> {}", key, value);

        let children = self.topology.children().await;
        self.replicator.fan_out_set(children, key, value);

        Ok(MutationOutcome::Applied)
    }

    /// Local read. Never forwarded, so a child may answer with stale data.
    pub async fn handle_get(&self, key: &str) -> NodeResult<Option<String>> {
        require("key", key)?;
        Ok(self.store.get(key).await)
    }

    /// Delete from a client (`Origin::Client`) or from the parent's fan-out
    /// (`Origin::Replication`).
    pub async fn handle_delete(&self, key: String, origin: Origin) -> NodeResult<MutationOutcome> {
        require("key", &key)?;

        if !self.role().is_root() {
            if origin.is_replication() {
                let removed = self.store.delete(&key).await;
                tracing::debug!("Replicated deletion of key '{}' (present: {})", key, removed);
                return Ok(MutationOutcome::Applied);
            }

            let parent = self.parent_or_fail().await?;
            let location = delete_location(&parent, &key)?;
            return Ok(MutationOutcome::Redirect { location });
        }

        self.store.delete(&key).await;
        tracing::info!("Deleted key: {}", key);

        let children = self.topology.children().await;
        self.replicator.fan_out_delete(children, key);

        Ok(MutationOutcome::Applied)
    }

    /// Write pushed down by the parent. Applied as-is, never fanned out further.
    pub async fn replicate_set(&self, key: String, value: String) -> NodeResult<()> {
        if self.role().is_root() {
            return Err(NodeError::WrongRole {
                operation: "replicate",
                role: self.role(),
            });
        }
        require("key", &key)?;

        tracing::debug!("Replicated: {} -> {}", key, value);
        self.store.set(key, value).await;
        Ok(())
    }

    /// Full copy of the local store.
    pub async fn display(&self) -> HashMap<String, String> {
        self.store.snapshot().await
    }

    /// Points this child at a new parent and runs the join protocol against it.
    ///
    /// The parent link is replaced before joining, so a failed join leaves the
    /// node pointing at the new parent (and, for a sync failure, registered
    /// with it) while still holding its previous data.
    pub async fn set_parent(&self, address: String) -> NodeResult<usize> {
        if self.role().is_root() {
            return Err(NodeError::WrongRole {
                operation: "setParent",
                role: self.role(),
            });
        }
        require("parentNode", &address)?;
        validate_address(&address)?;

        let previous = self.topology.set_parent(address.clone()).await?;
        tracing::info!(
            "Parent changed from {} to {}",
            previous.as_deref().unwrap_or("<none>"),
            address
        );

        self.join.run(&address, self.topology.self_address(), &self.store).await
    }

    /// Runs the join protocol against the currently configured parent.
    pub async fn join_parent(&self) -> NodeResult<usize> {
        let parent = self.parent_or_fail().await?;
        self.join.run(&parent, self.topology.self_address(), &self.store).await
    }

    /// Registers a child with this root. Returns the number of fan-out targets.
    pub async fn add_child(&self, address: String) -> NodeResult<usize> {
        let count = self.topology.add_child(address.clone()).await?;
        tracing::info!("Child node added: {} ({} children)", address, count);
        Ok(count)
    }

    async fn parent_or_fail(&self) -> NodeResult<String> {
        self.topology
            .parent()
            .await
            .ok_or(NodeError::NoParentConfigured)
    }
}

fn require(field: &str, value: &str) -> NodeResult<()> {
    if value.is_empty() {
        return Err(NodeError::Validation(format!("missing {}", field)));
    }
    Ok(())
}

fn validate_address(address: &str) -> NodeResult<()> {
    reqwest::Url::parse(&format!("http://{}/", address))
        .map(|_| ())
        .map_err(|e| NodeError::Validation(format!("invalid node address '{}': {}", address, e)))
}

fn delete_location(parent: &str, key: &str) -> NodeResult<String> {
    reqwest::Url::parse_with_params(
        &format!("http://{}{}", parent, ENDPOINT_DELETE),
        &[("key", key)],
    )
    .map(String::from)
    .map_err(|e| NodeError::Validation(format!("invalid parent address '{}': {}", parent, e)))
}
