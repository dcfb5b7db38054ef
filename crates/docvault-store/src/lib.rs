//! # docvault-store
//!
//! SQLite connection management, embedded migrations, concrete
//! repository implementations, and the transaction coordinator that
//! gives multi-record mutations all-or-nothing semantics.

pub mod connection;
pub mod migration;
pub mod repositories;
pub mod txn;

pub use connection::StorePool;
pub use txn::TxnCoordinator;
