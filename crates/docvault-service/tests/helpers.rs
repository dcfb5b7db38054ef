//! Shared test helpers for service integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use sqlx::SqlitePool;
use uuid::Uuid;

use docvault_core::config::transaction::TransactionConfig;
use docvault_core::result::AppResult;
use docvault_core::traits::blob::BlobStore;
use docvault_service::{AccessController, RequestContext, TreeService, VersionSequencer};
use docvault_store::repositories::{
    AccessRepository, DocumentRepository, FolderRepository, VersionRepository,
};
use docvault_store::{StorePool, TxnCoordinator};

/// In-memory blob store that records deletions and fakes presigning.
#[derive(Debug, Default)]
pub struct MockBlobStore {
    /// Keys passed to `delete`, in order.
    pub deleted: Mutex<Vec<String>>,
}

#[async_trait]
impl BlobStore for MockBlobStore {
    async fn store(&self, _data: Bytes) -> AppResult<String> {
        Ok(format!("blob-{}", Uuid::new_v4()))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.deleted.lock().expect("blob lock").push(key.to_string());
        Ok(())
    }

    async fn presign(&self, key: &str, ttl: Duration) -> AppResult<String> {
        Ok(format!(
            "https://blobs.invalid/{key}?expires={}",
            ttl.as_secs()
        ))
    }
}

/// Fully wired service stack over a private in-memory database.
pub struct TestEnv {
    pub pool: SqlitePool,
    pub tree: TreeService,
    pub access: Arc<AccessController>,
    pub versions: VersionSequencer,
    pub blobs: Arc<MockBlobStore>,
    pub folder_repo: Arc<FolderRepository>,
    pub document_repo: Arc<DocumentRepository>,
    pub access_repo: Arc<AccessRepository>,
    pub version_repo: Arc<VersionRepository>,
}

impl TestEnv {
    /// Build a fresh environment with migrations applied.
    pub async fn new() -> Self {
        let pool = StorePool::connect_in_memory()
            .await
            .expect("Failed to open in-memory store")
            .into_pool();

        let folder_repo = Arc::new(FolderRepository::new(pool.clone()));
        let document_repo = Arc::new(DocumentRepository::new(pool.clone()));
        let access_repo = Arc::new(AccessRepository::new(pool.clone()));
        let version_repo = Arc::new(VersionRepository::new(pool.clone()));
        let txn = Arc::new(TxnCoordinator::new(
            pool.clone(),
            TransactionConfig::default(),
        ));

        let access = Arc::new(AccessController::new(
            folder_repo.clone(),
            document_repo.clone(),
            access_repo.clone(),
            txn.clone(),
        ));
        let tree = TreeService::new(
            folder_repo.clone(),
            document_repo.clone(),
            access_repo.clone(),
            access.clone(),
            txn.clone(),
        );
        let blobs = Arc::new(MockBlobStore::default());
        let versions = VersionSequencer::new(version_repo.clone(), blobs.clone());

        Self {
            pool,
            tree,
            access,
            versions,
            blobs,
            folder_repo,
            document_repo,
            access_repo,
            version_repo,
        }
    }
}

/// A request context for a fresh random user.
pub fn ctx() -> RequestContext {
    RequestContext::new(Uuid::new_v4())
}
