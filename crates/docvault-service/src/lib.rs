//! # docvault-service
//!
//! Business logic services for DocVault:
//!
//! - [`tree::TreeService`] — folder/document tree maintenance with
//!   materialized paths, rename cascades, and cascading soft delete.
//! - [`access::AccessController`] — ancestor-chain permission
//!   resolution and access-grant propagation.
//! - [`version::VersionSequencer`] — per-document version-number
//!   allocation and validation.
//!
//! Multi-record mutations run through the store's `TxnCoordinator`;
//! every operation takes a [`context::RequestContext`] carrying the
//! already-authenticated caller identity.

pub mod access;
pub mod context;
pub mod tree;
pub mod version;

pub use access::AccessController;
pub use context::RequestContext;
pub use tree::{DeletedContents, FolderContents, TreeService, UpdateDocument};
pub use version::{VersionListing, VersionSequencer};
