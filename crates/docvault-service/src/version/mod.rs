//! Per-document version-number allocation.

mod sequencer;

pub use sequencer::{VersionListing, VersionSequencer, PRESIGN_TTL};
