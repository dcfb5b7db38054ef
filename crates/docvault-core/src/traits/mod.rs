//! Trait definitions for external collaborators.

pub mod blob;

pub use blob::BlobStore;
