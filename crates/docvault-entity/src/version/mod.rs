//! Document version entities.

pub mod model;
pub mod number;

pub use model::{CreateVersion, Version};
pub use number::VersionNumber;
