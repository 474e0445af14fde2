//! Membership & Topology Module
//!
//! Describes where a node sits in the replication tree and how it gets there.
//!
//! ## Core Mechanisms
//! - **Role**: fixed at construction; a `Root` owns writes, a `Child` holds a replica.
//! - **Links**: one parent address (children only) and an append-only list of
//!   children (root only), guarded by a reader-writer lock.
//! - **Join Protocol**: register with the new parent, then pull its full snapshot.

pub mod join;
pub mod topology;
pub mod types;
