//! Integration tests for permission resolution and grant propagation.

mod helpers;

use docvault_core::error::ErrorKind;
use docvault_entity::access::{AccessRole, ResourceType};
use uuid::Uuid;

#[tokio::test]
async fn test_owner_satisfies_every_level() {
    let env = helpers::TestEnv::new().await;
    let alice = helpers::ctx();

    let a = env.tree.create_folder(&alice, "A", None).await.unwrap();

    for required in [AccessRole::Viewer, AccessRole::Editor, AccessRole::Owner] {
        assert!(
            env.access
                .check_access(ResourceType::Folder, a.id, alice.user_id, required)
                .await
                .unwrap(),
            "owner should satisfy {required}"
        );
    }
}

#[tokio::test]
async fn test_viewer_does_not_satisfy_editor() {
    let env = helpers::TestEnv::new().await;
    let alice = helpers::ctx();
    let bob = Uuid::new_v4();

    let a = env.tree.create_folder(&alice, "A", None).await.unwrap();
    env.access
        .grant_access(&alice, a.id, bob, AccessRole::Viewer)
        .await
        .unwrap();

    assert!(
        env.access
            .check_access(ResourceType::Folder, a.id, bob, AccessRole::Viewer)
            .await
            .unwrap()
    );
    assert!(
        !env.access
            .check_access(ResourceType::Folder, a.id, bob, AccessRole::Editor)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_nearest_ancestor_entry_wins() {
    let env = helpers::TestEnv::new().await;
    let alice = helpers::ctx();
    let bob = Uuid::new_v4();

    let a = env.tree.create_folder(&alice, "A", None).await.unwrap();
    let b = env.tree.create_folder(&alice, "B", Some(a.id)).await.unwrap();

    env.access
        .grant_access(&alice, a.id, bob, AccessRole::Editor)
        .await
        .unwrap();
    // A closer, weaker entry on B shadows the editor grant above it.
    env.access
        .grant_access(&alice, b.id, bob, AccessRole::Viewer)
        .await
        .unwrap();

    assert!(
        env.access
            .check_access(ResourceType::Folder, a.id, bob, AccessRole::Editor)
            .await
            .unwrap()
    );
    assert!(
        !env.access
            .check_access(ResourceType::Folder, b.id, bob, AccessRole::Editor)
            .await
            .unwrap()
    );
    assert!(
        env.access
            .check_access(ResourceType::Folder, b.id, bob, AccessRole::Viewer)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_access_inherited_through_chain_without_explicit_entry() {
    let env = helpers::TestEnv::new().await;
    let alice = helpers::ctx();
    let bob = Uuid::new_v4();

    let a = env.tree.create_folder(&alice, "A", None).await.unwrap();
    let b = env.tree.create_folder(&alice, "B", Some(a.id)).await.unwrap();
    let doc = env
        .tree
        .create_document(&alice, "notes", Some(b.id))
        .await
        .unwrap();

    env.access
        .grant_access(&alice, a.id, bob, AccessRole::Editor)
        .await
        .unwrap();

    // Strip the propagated bob entries from B and the document so
    // resolution has to walk the chain up to A.
    let mut conn = env.pool.acquire().await.unwrap();
    sqlx::query("DELETE FROM access_entries WHERE user_id = ? AND resource_id IN (?, ?)")
        .bind(bob)
        .bind(b.id)
        .bind(doc.id)
        .execute(&mut *conn)
        .await
        .unwrap();
    drop(conn);

    assert!(
        env.access
            .check_access(ResourceType::Folder, b.id, bob, AccessRole::Editor)
            .await
            .unwrap()
    );
    assert!(
        env.access
            .check_access(ResourceType::Document, doc.id, bob, AccessRole::Editor)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_grant_propagates_to_descendant_folders_and_documents() {
    let env = helpers::TestEnv::new().await;
    let alice = helpers::ctx();
    let bob = Uuid::new_v4();

    let a = env.tree.create_folder(&alice, "A", None).await.unwrap();
    let b = env.tree.create_folder(&alice, "B", Some(a.id)).await.unwrap();
    let doc = env
        .tree
        .create_document(&alice, "notes", Some(b.id))
        .await
        .unwrap();

    env.access
        .grant_access(&alice, a.id, bob, AccessRole::Viewer)
        .await
        .unwrap();

    let b_entries = env
        .access_repo
        .list_for_resource(ResourceType::Folder, b.id)
        .await
        .unwrap();
    assert!(b_entries
        .iter()
        .any(|e| e.user_id == bob && e.role == AccessRole::Viewer));

    let doc_entries = env
        .access_repo
        .list_for_resource(ResourceType::Document, doc.id)
        .await
        .unwrap();
    assert!(doc_entries
        .iter()
        .any(|e| e.user_id == bob && e.role == AccessRole::Viewer));
}

#[tokio::test]
async fn test_grant_propagation_overwrites_descendant_grants() {
    let env = helpers::TestEnv::new().await;
    let alice = helpers::ctx();
    let bob = Uuid::new_v4();

    let a = env.tree.create_folder(&alice, "A", None).await.unwrap();
    let b = env.tree.create_folder(&alice, "B", Some(a.id)).await.unwrap();

    // Descendant-specific grant, then a grant higher up.
    env.access
        .grant_access(&alice, b.id, bob, AccessRole::Editor)
        .await
        .unwrap();
    env.access
        .grant_access(&alice, a.id, bob, AccessRole::Viewer)
        .await
        .unwrap();

    // The overwrite discarded the descendant's editor entry.
    let b_entries = env
        .access_repo
        .list_for_resource(ResourceType::Folder, b.id)
        .await
        .unwrap();
    let bob_entry = b_entries.iter().find(|e| e.user_id == bob).unwrap();
    assert_eq!(bob_entry.role, AccessRole::Viewer);
}

#[tokio::test]
async fn test_grant_does_not_touch_deleted_descendants() {
    let env = helpers::TestEnv::new().await;
    let alice = helpers::ctx();
    let bob = Uuid::new_v4();

    let a = env.tree.create_folder(&alice, "A", None).await.unwrap();
    let b = env.tree.create_folder(&alice, "B", Some(a.id)).await.unwrap();
    env.tree.delete_folder(&alice, b.id).await.unwrap();

    env.access
        .grant_access(&alice, a.id, bob, AccessRole::Editor)
        .await
        .unwrap();

    let b_entries = env
        .access_repo
        .list_for_resource(ResourceType::Folder, b.id)
        .await
        .unwrap();
    assert!(!b_entries.iter().any(|e| e.user_id == bob));
}

#[tokio::test]
async fn test_grant_requires_owner() {
    let env = helpers::TestEnv::new().await;
    let alice = helpers::ctx();
    let bob = helpers::ctx();

    let a = env.tree.create_folder(&alice, "A", None).await.unwrap();
    env.access
        .grant_access(&alice, a.id, bob.user_id, AccessRole::Editor)
        .await
        .unwrap();

    let err = env
        .access
        .grant_access(&bob, a.id, Uuid::new_v4(), AccessRole::Viewer)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_grant_cannot_remove_last_owner() {
    let env = helpers::TestEnv::new().await;
    let alice = helpers::ctx();

    let a = env.tree.create_folder(&alice, "A", None).await.unwrap();

    let err = env
        .access
        .grant_access(&alice, a.id, alice.user_id, AccessRole::Editor)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);

    // The list is unchanged.
    let entries = env
        .access_repo
        .list_for_resource(ResourceType::Folder, a.id)
        .await
        .unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].role, AccessRole::Owner);
}

#[tokio::test]
async fn test_owner_demotion_allowed_with_second_owner() {
    let env = helpers::TestEnv::new().await;
    let alice = helpers::ctx();
    let bob = Uuid::new_v4();

    let a = env.tree.create_folder(&alice, "A", None).await.unwrap();
    env.access
        .grant_access(&alice, a.id, bob, AccessRole::Owner)
        .await
        .unwrap();
    let entries = env
        .access
        .grant_access(&alice, a.id, alice.user_id, AccessRole::Viewer)
        .await
        .unwrap();

    let alice_entry = entries.iter().find(|e| e.user_id == alice.user_id).unwrap();
    assert_eq!(alice_entry.role, AccessRole::Viewer);
    assert!(entries.iter().any(|e| e.role == AccessRole::Owner));
}

#[tokio::test]
async fn test_document_entry_falls_through_when_insufficient() {
    let env = helpers::TestEnv::new().await;
    let alice = helpers::ctx();
    let bob = Uuid::new_v4();

    let a = env.tree.create_folder(&alice, "A", None).await.unwrap();
    let doc = env
        .tree
        .create_document(&alice, "notes", Some(a.id))
        .await
        .unwrap();
    env.access
        .grant_access(&alice, a.id, bob, AccessRole::Editor)
        .await
        .unwrap();

    // Downgrade the document's own entry for bob behind the service's
    // back; the folder-level editor grant must still carry.
    let mut doc_entries = env
        .access_repo
        .list_for_resource(ResourceType::Document, doc.id)
        .await
        .unwrap();
    for entry in &mut doc_entries {
        if entry.user_id == bob {
            entry.role = AccessRole::Viewer;
        }
    }
    let mut conn = env.pool.acquire().await.unwrap();
    env.access_repo
        .replace_for_resource(&mut conn, ResourceType::Document, doc.id, &doc_entries)
        .await
        .unwrap();
    drop(conn);

    assert!(
        env.access
            .check_access(ResourceType::Document, doc.id, bob, AccessRole::Editor)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_check_access_on_missing_or_deleted_resource_is_false() {
    let env = helpers::TestEnv::new().await;
    let alice = helpers::ctx();

    assert!(
        !env.access
            .check_access(ResourceType::Folder, Uuid::new_v4(), alice.user_id, AccessRole::Viewer)
            .await
            .unwrap()
    );

    let a = env.tree.create_folder(&alice, "A", None).await.unwrap();
    env.tree.delete_folder(&alice, a.id).await.unwrap();
    assert!(
        !env.access
            .check_access(ResourceType::Folder, a.id, alice.user_id, AccessRole::Viewer)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_deleted_document_ignores_surviving_direct_entry() {
    let env = helpers::TestEnv::new().await;
    let alice = helpers::ctx();

    let a = env.tree.create_folder(&alice, "A", None).await.unwrap();
    let doc = env
        .tree
        .create_document(&alice, "notes", Some(a.id))
        .await
        .unwrap();
    env.tree.delete_document(&alice, doc.id).await.unwrap();

    // The owner entry seeded at creation is still in the table, but the
    // document is gone and must resolve like any absent resource.
    let entry = env
        .access_repo
        .find_entry(ResourceType::Document, doc.id, alice.user_id)
        .await
        .unwrap();
    assert!(entry.is_some());

    assert!(
        !env.access
            .check_access(ResourceType::Document, doc.id, alice.user_id, AccessRole::Viewer)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_corrupt_ancestry_cycle_fails_closed() {
    let env = helpers::TestEnv::new().await;
    let alice = helpers::ctx();
    let bob = Uuid::new_v4();

    let a = env.tree.create_folder(&alice, "A", None).await.unwrap();
    let b = env.tree.create_folder(&alice, "B", Some(a.id)).await.unwrap();

    // Corrupt the parent links into a cycle.
    sqlx::query("UPDATE folders SET parent_id = ? WHERE id = ?")
        .bind(b.id)
        .bind(a.id)
        .execute(&env.pool)
        .await
        .unwrap();

    // bob has no entry anywhere, so resolution must walk into the cycle.
    let err = env
        .access
        .require_access(ResourceType::Folder, b.id, bob, AccessRole::Viewer)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Internal);

    assert!(
        !env.access
            .has_access(ResourceType::Folder, b.id, bob, AccessRole::Viewer)
            .await
    );
}

#[tokio::test]
async fn test_list_access_requires_viewer() {
    let env = helpers::TestEnv::new().await;
    let alice = helpers::ctx();
    let stranger = helpers::ctx();

    let a = env.tree.create_folder(&alice, "A", None).await.unwrap();

    let entries = env.access.list_access(&alice, a.id).await.unwrap();
    assert_eq!(entries.len(), 1);

    let err = env.access.list_access(&stranger, a.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Forbidden);
}
