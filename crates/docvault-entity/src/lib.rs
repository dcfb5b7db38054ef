//! # docvault-entity
//!
//! Domain entity models for DocVault: folders, documents, access
//! entries, and document versions.

pub mod access;
pub mod document;
pub mod folder;
pub mod version;
