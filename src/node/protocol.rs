//! Node Network Protocol
//!
//! Defines the HTTP endpoints and Data Transfer Objects (DTOs) exchanged between
//! clients and nodes, and between a root and its children (replication, join).
//!
//! Field names follow the established wire format (`parentNode`, `childNode`),
//! so existing clients and mixed clusters keep working.

use serde::{Deserialize, Serialize};

// --- API Endpoints ---

/// Public endpoint for client writes. Children answer with a redirect to their parent.
pub const ENDPOINT_PUT: &str = "/put";
/// Public endpoint for local reads (`?key=`). Never forwarded.
pub const ENDPOINT_GET: &str = "/get";
/// Public endpoint for deletes (`?key=`), also the target of replicated deletes.
pub const ENDPOINT_DELETE: &str = "/delete";
/// Endpoint a root pushes replicated writes to.
pub const ENDPOINT_REPLICATE: &str = "/replicate";
/// Full snapshot of the local store, pulled by joining children.
pub const ENDPOINT_DISPLAY: &str = "/display";
/// Re-parents a child and runs the join protocol.
pub const ENDPOINT_SET_PARENT: &str = "/setParent";
/// Registers a child with a root.
pub const ENDPOINT_ADD_CHILD: &str = "/addChild";

/// Header marking a delete as replication traffic from the parent.
pub const REPLICATION_HEADER: &str = "X-Replication";

// --- Data Transfer Objects ---

/// Client write request. Fields are optional so that a missing one is reported
/// as a validation error instead of a decoding failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct PutRequest {
    pub key: Option<String>,
    pub value: Option<String>,
}

/// Write pushed from a root to one of its children.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReplicateRequest {
    pub key: Option<String>,
    pub value: Option<String>,
    /// Identifier of the fan-out this push belongs to, for log correlation only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub op_id: Option<String>,
}

/// Query string of `/get` and `/delete`.
#[derive(Debug, Serialize, Deserialize)]
pub struct KeyQuery {
    pub key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetResponse {
    pub key: String,
    /// `None` indicates the key does not exist on this node.
    pub value: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetParentRequest {
    #[serde(rename = "parentNode")]
    pub parent_node: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddChildRequest {
    #[serde(rename = "childNode")]
    pub child_node: Option<String>,
}

/// Standard acknowledgment for every mutating endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct MutationResponse {
    pub success: bool,
    pub message: String,
}

impl MutationResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}
