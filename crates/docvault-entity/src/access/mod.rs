//! Access control entities: roles and per-resource access entries.

pub mod entry;
pub mod role;

pub use entry::{AccessEntry, ResourceType};
pub use role::AccessRole;
