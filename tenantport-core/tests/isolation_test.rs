use anyhow::Result;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::json;

use tenantport::database::entities::{blobs, entropies};
use tenantport::transfer::{EntityKind, ExportKind};
use tenantport_test_utils::fixtures::WORKSPACE_BLOB;
use tenantport_test_utils::{seed_workspace, ArchiveBuilder, Harness, TempDir};

#[tokio::test]
async fn test_archived_key_owned_by_another_tenant_gets_a_new_key() -> Result<()> {
    let harness = Harness::new().await?;
    let victim = seed_workspace(&harness, "Acme", "ada@example.com").await?;
    let dir = TempDir::new()?;
    let path = dir.join("acme.zip");
    harness
        .export_to(&victim.tenant, ExportKind::WholeAccount, &path)
        .await?;

    let tampered = ArchiveBuilder::from_file(&path)?.blob(&victim.blob_key, b"EVIL BYTES");
    let tampered_path = dir.join("tampered.zip");
    tampered.write_to(&tampered_path)?;

    let (import, outcome) = harness
        .import_archive("mallory@example.com", &tampered_path)
        .await?;
    outcome?;
    assert_eq!(import.status, "completed");

    assert_eq!(
        harness.store.get(&victim.blob_key).await.as_deref(),
        Some(WORKSPACE_BLOB)
    );
    let victim_blob = blobs::Entity::find()
        .filter(blobs::Column::Key.eq(victim.blob_key.as_str()))
        .one(&harness.db)
        .await?
        .expect("victim blob row");
    assert_eq!(victim_blob.account_id, victim.tenant.id());

    let imported = blobs::Entity::find()
        .filter(blobs::Column::AccountId.eq(import.account_id.as_str()))
        .all(&harness.db)
        .await?;
    assert_eq!(imported.len(), 1);
    assert_ne!(imported[0].key, victim.blob_key);
    assert_eq!(
        harness.store.get(&imported[0].key).await.as_deref(),
        Some(&b"EVIL BYTES"[..])
    );
    Ok(())
}

#[tokio::test]
async fn test_entropy_for_another_tenants_board_is_not_merged() -> Result<()> {
    let harness = Harness::new().await?;
    let victim = seed_workspace(&harness, "Acme", "ada@example.com").await?;
    let victim_board = victim.boards[0].clone();
    let entropy_id = victim.tenant.add_entropy("Board", &victim_board, 30).await?;

    let other = harness.tenant("Globex", "mallory@example.com").await?;
    let dir = TempDir::new()?;
    let path = dir.join("globex.zip");
    harness
        .export_to(&other, ExportKind::WholeAccount, &path)
        .await?;

    let mut archive = ArchiveBuilder::from_file(&path)?;
    let source_account = archive.root_mut().id.clone();
    archive.insert(
        EntityKind::Entropies,
        "zz-evil",
        json!({
            "account_id": source_account,
            "container_type": "Board",
            "container_id": victim_board,
            "auto_postpone_period": 1,
        }),
    )?;
    let tampered_path = dir.join("tampered.zip");
    archive.write_to(&tampered_path)?;

    let (import, outcome) = harness
        .import_archive("mallory@example.com", &tampered_path)
        .await?;
    assert!(outcome.is_err());
    assert_eq!(import.status, "failed");

    let row = entropies::Entity::find_by_id(entropy_id)
        .one(&harness.db)
        .await?
        .expect("victim entropy");
    assert_eq!(row.account_id, victim.tenant.id());
    assert_eq!(row.auto_postpone_period, 30);

    let imported = entropies::Entity::find()
        .filter(entropies::Column::AccountId.eq(import.account_id.as_str()))
        .all(&harness.db)
        .await?;
    assert!(imported.is_empty());
    Ok(())
}
