//! Shared test helpers for store integration tests.

#![allow(dead_code)]

use sqlx::SqlitePool;
use uuid::Uuid;

use docvault_entity::folder::{compose_path, CreateFolder, Folder};
use docvault_store::repositories::FolderRepository;
use docvault_store::StorePool;

/// Open a fresh in-memory database with migrations applied.
pub async fn pool() -> SqlitePool {
    StorePool::connect_in_memory()
        .await
        .expect("Failed to open in-memory store")
        .into_pool()
}

/// Insert a folder under `parent` with the given name.
pub async fn insert_folder(
    pool: &SqlitePool,
    repo: &FolderRepository,
    parent: Option<&Folder>,
    name: &str,
    created_by: Uuid,
) -> Folder {
    let data = CreateFolder {
        parent_id: parent.map(|p| p.id),
        name: name.to_string(),
        path: compose_path(parent.map(|p| p.path.as_str()), name),
        depth: parent.map_or(0, |p| p.depth + 1),
        created_by,
    };
    let mut conn = pool.acquire().await.expect("acquire");
    repo.create(&mut conn, &data).await.expect("create folder")
}
