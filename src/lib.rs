//! Hierarchical Replicated Key-Value Store
//!
//! A tree of nodes: one root owns the authoritative data set, any number of
//! children hold a best-effort copy kept up to date by asynchronous push
//! replication from the root.
//!
//! ## Architecture Modules
//! - **`storage`**: the local in-memory store (shared reads, exclusive writes).
//! - **`membership`**: node role, parent/children links and the join protocol
//!   (register with a parent, then pull its snapshot).
//! - **`replication`**: fire-and-forget fan-out of each root mutation to every child.
//! - **`node`**: the mutation router (apply on root, redirect on child) and its
//!   HTTP surface.
//! - **`config`**: flags, environment and self-address discovery.
//!
//! There is no election, consensus, conflict resolution or persistence: the root
//! is fixed by configuration and children may silently fall behind until their
//! next snapshot pull.

pub mod config;
pub mod error;
pub mod membership;
pub mod node;
pub mod replication;
pub mod storage;
