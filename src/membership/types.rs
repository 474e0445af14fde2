use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a node in the replication tree.
///
/// Fixed when the node is constructed. A `Root` applies writes and fans them
/// out; a `Child` redirects client writes to its parent and only applies
/// mutations pushed down by replication.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Root,
    Child,
}

impl Role {
    pub fn is_root(self) -> bool {
        matches!(self, Role::Root)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Root => write!(f, "root"),
            Role::Child => write!(f, "child"),
        }
    }
}

/// Who asked for a mutation.
///
/// A child must bubble `Client` deletes up to the root but apply `Replication`
/// deletes locally; without this marker a replicated delete would be
/// redirected straight back to the parent that sent it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Client,
    Replication,
}

impl Origin {
    /// Maps the boolean wire marker onto an origin.
    pub fn from_replication_marker(marked: bool) -> Self {
        if marked {
            Origin::Replication
        } else {
            Origin::Client
        }
    }

    pub fn is_replication(self) -> bool {
        matches!(self, Origin::Replication)
    }
}
