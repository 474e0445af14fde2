//! Node Error Taxonomy
//!
//! Errors surfaced synchronously to the request that caused them. Replication
//! delivery failures are deliberately absent: they are logged inside the fan-out
//! task and never reach a caller.

use crate::membership::types::Role;

#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// Request rejected before touching the store (missing or empty field).
    #[error("invalid request: {0}")]
    Validation(String),

    /// A child was asked to forward a mutation but has no parent address.
    #[error("parent node not available")]
    NoParentConfigured,

    /// The operation is not allowed for this node's role.
    #[error("{operation} is not allowed on a {role} node")]
    WrongRole { operation: &'static str, role: Role },

    /// Join step 1: the parent could not be reached or refused the registration.
    #[error("failed to register with parent node {parent}: {reason}")]
    RegistrationFailed { parent: String, reason: String },

    /// Join step 2 failed after a successful registration. The node is now
    /// registered with `parent` but still holds its previous data.
    #[error("registered with parent node {parent} but failed to synchronize data: {reason}")]
    SyncFailed { parent: String, reason: String },
}

pub type NodeResult<T> = Result<T, NodeError>;
