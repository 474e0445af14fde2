//! Local Storage Module
//!
//! In-memory string -> string store owned by every node.
//!
//! ## Core Concepts
//! - **Shared reads / exclusive writes**: a single reader-writer lock guards the map.
//! - **Wholesale replacement**: `replace_all` is only used by the join snapshot pull.
//! - **No persistence**: data lives for the lifetime of the process.

pub mod memory;

#[cfg(test)]
mod tests;
