//! Folder and document tree maintenance.

mod service;

pub use service::{DeletedContents, FolderContents, TreeService, UpdateDocument};
