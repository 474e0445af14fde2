//! Node Module
//!
//! The mutation router and its HTTP surface.
//!
//! ## Request Routing
//! - **Root**: applies writes and deletes locally, then hands them to replication fan-out.
//! - **Child**: answers client writes and deletes with a redirect to its parent, applies
//!   only replication traffic (`/replicate`, marked deletes) to its own store.
//! - **Reads**: always served from the local store, on every role.
//!
//! ## Submodules
//! - **`service`**: role-based routing over the store, topology and replicator.
//! - **`handlers`**: axum handlers translating HTTP requests into service calls.
//! - **`protocol`**: endpoints and DTOs shared by clients, roots and children.

pub mod handlers;
pub mod protocol;
pub mod service;
