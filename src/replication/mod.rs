//! Replication Fan-out Module
//!
//! Pushes every mutation applied on the root to each direct child.
//!
//! ## Semantics
//! - **Fire-and-forget**: one spawned task per child per mutation; the caller never waits.
//! - **At-most-once** by default: no retry unless a [`fanout::RetryPolicy`] asks for it.
//! - **Unordered**: no ordering across children or across rapid writes to one key.
//! - **Bounded**: every outbound request carries a timeout.

pub mod fanout;

#[cfg(test)]
mod tests;
