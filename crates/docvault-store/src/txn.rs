//! Transaction coordinator: scoped, all-or-nothing execution of
//! multi-record mutations.
//!
//! A unit of work receives an open transaction, runs its statements
//! against it, and hands the transaction back with its result. The
//! coordinator commits on success, rolls back on any failure, and
//! retries the whole unit a bounded number of times when the store
//! reports a transient conflict (SQLite busy/locked). Validation-type
//! failures are surfaced immediately and never retried.

use std::future::Future;
use std::time::Duration;

use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, warn};

use docvault_core::config::transaction::TransactionConfig;
use docvault_core::error::{AppError, ErrorKind};
use docvault_core::result::AppResult;

/// An open transaction handed to a unit of work.
///
/// Derefs to `SqliteConnection`, so repository methods taking
/// `&mut SqliteConnection` accept `&mut *txn`.
pub type Txn = Transaction<'static, Sqlite>;

/// Coordinates atomic multi-record mutations against the store.
#[derive(Debug, Clone)]
pub struct TxnCoordinator {
    pool: SqlitePool,
    config: TransactionConfig,
}

impl TxnCoordinator {
    /// Create a new coordinator over the given pool.
    pub fn new(pool: SqlitePool, config: TransactionConfig) -> Self {
        Self { pool, config }
    }

    /// Run a unit of work with all-or-nothing semantics.
    ///
    /// The closure is handed a fresh transaction per attempt and must
    /// return it together with the operation result, so the coordinator
    /// owns every exit path: commit on `Ok`, rollback on `Err`, release
    /// of the connection either way. Once a commit has begun there is no
    /// cancellation.
    pub async fn run<T, F, Fut>(&self, name: &str, mut op: F) -> AppResult<T>
    where
        F: FnMut(Txn) -> Fut,
        Fut: Future<Output = (Txn, AppResult<T>)>,
    {
        let mut attempt: u32 = 0;
        loop {
            let txn = self.pool.begin().await.map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
            })?;

            let (txn, result) = op(txn).await;

            let outcome = match result {
                Ok(value) => txn.commit().await.map(|_| value).map_err(|e| {
                    AppError::with_source(
                        ErrorKind::Database,
                        format!("Failed to commit '{name}'"),
                        e,
                    )
                }),
                Err(err) => {
                    if let Err(rollback_err) = txn.rollback().await {
                        debug!(operation = name, error = %rollback_err, "Rollback failed");
                    }
                    Err(err)
                }
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(err) if is_transient(&err) => {
                    if attempt >= self.config.max_retries {
                        warn!(
                            operation = name,
                            attempts = attempt + 1,
                            "Transaction retry budget exhausted"
                        );
                        return Err(AppError::transaction(format!(
                            "'{name}' aborted after {} conflicting attempts",
                            attempt + 1
                        )));
                    }
                    attempt += 1;
                    let delay = backoff_delay(self.config.backoff_ms, attempt);
                    debug!(
                        operation = name,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Transient store conflict, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

}

/// Linear backoff for the given attempt number.
fn backoff_delay(base_ms: u64, attempt: u32) -> Duration {
    Duration::from_millis(base_ms * u64::from(attempt))
}

/// Whether an error is a transient store conflict worth retrying.
///
/// SQLite reports lock contention as BUSY (5) / LOCKED (6) with the
/// extended codes 261 (busy recovery) and 517 (busy snapshot).
fn is_transient(err: &AppError) -> bool {
    if err.kind != ErrorKind::Database {
        return false;
    }
    let Some(source) = err.source.as_ref() else {
        return false;
    };
    let Some(sqlx_err) = source.downcast_ref::<sqlx::Error>() else {
        return false;
    };
    match sqlx_err {
        sqlx::Error::Database(db) => {
            matches!(db.code().as_deref(), Some("5" | "6" | "261" | "517"))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_linearly() {
        assert_eq!(backoff_delay(10, 1), Duration::from_millis(10));
        assert_eq!(backoff_delay(10, 3), Duration::from_millis(30));
    }

    #[test]
    fn test_validation_errors_are_not_transient() {
        assert!(!is_transient(&AppError::validation("bad input")));
        assert!(!is_transient(&AppError::conflict("duplicate")));
        assert!(!is_transient(&AppError::database("no source attached")));
    }
}
