//! Folder entity.

pub mod model;

pub use model::{compose_path, CreateFolder, Folder};
