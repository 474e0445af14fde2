use tokio::sync::RwLock;

use super::types::Role;
use crate::error::{NodeError, NodeResult};

/// Mutable links of a node: one edge up, any number of edges down.
#[derive(Debug, Default)]
struct Links {
    parent: Option<String>,
    children: Vec<String>,
}

/// Topology state of a single node.
///
/// `role` and `self_address` are immutable. Parent and children sit behind one
/// reader-writer lock with the same discipline as the store: shared for
/// reads, exclusive for every mutation, never held across network I/O.
#[derive(Debug)]
pub struct Topology {
    role: Role,
    self_address: Option<String>,
    links: RwLock<Links>,
}

impl Topology {
    /// A root node with an initial list of children.
    pub fn root(self_address: Option<String>, children: Vec<String>) -> Self {
        Self {
            role: Role::Root,
            self_address: normalize(self_address),
            links: RwLock::new(Links {
                parent: None,
                children: children.into_iter().filter(|c| !c.is_empty()).collect(),
            }),
        }
    }

    /// A child node. `parent` may be unset, in which case the node is orphaned
    /// and fails every write it would have to forward.
    pub fn child(self_address: Option<String>, parent: Option<String>) -> Self {
        Self {
            role: Role::Child,
            self_address: normalize(self_address),
            links: RwLock::new(Links {
                parent: normalize(parent),
                children: Vec::new(),
            }),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn self_address(&self) -> Option<&str> {
        self.self_address.as_deref()
    }

    pub async fn parent(&self) -> Option<String> {
        self.links.read().await.parent.clone()
    }

    /// Copy of the current children, in registration order.
    pub async fn children(&self) -> Vec<String> {
        self.links.read().await.children.clone()
    }

    /// Replaces the parent link and returns the previous one.
    pub async fn set_parent(&self, address: String) -> NodeResult<Option<String>> {
        if self.role.is_root() {
            return Err(NodeError::WrongRole {
                operation: "setParent",
                role: self.role,
            });
        }
        if address.is_empty() {
            return Err(NodeError::Validation("missing 'parentNode'".to_string()));
        }

        let mut links = self.links.write().await;
        Ok(links.parent.replace(address))
    }

    /// Appends a child and returns the new number of fan-out targets.
    ///
    /// Registrations are not deduplicated: a child that registers twice
    /// receives every mutation twice.
    pub async fn add_child(&self, address: String) -> NodeResult<usize> {
        if !self.role.is_root() {
            return Err(NodeError::WrongRole {
                operation: "addChild",
                role: self.role,
            });
        }
        if address.is_empty() {
            return Err(NodeError::Validation("missing 'childNode'".to_string()));
        }

        let mut links = self.links.write().await;
        links.children.push(address);
        Ok(links.children.len())
    }
}

fn normalize(address: Option<String>) -> Option<String> {
    address.filter(|a| !a.is_empty())
}
