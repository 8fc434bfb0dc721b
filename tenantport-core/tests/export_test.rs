use anyhow::Result;
use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde_json::Value;

use tenantport::archive::ArchiveReader;
use tenantport::collaborators::{AttachmentStore, Notice};
use tenantport::database::entities::{account_exports, boards};
use tenantport::errors::CoreErrorKind;
use tenantport::services::ExportService;
use tenantport::transfer::{EntityKind, ExportKind};
use tenantport_test_utils::{seed_workspace, Harness, TempDir};

#[tokio::test]
async fn test_single_user_export_covers_reachable_cards() -> Result<()> {
    let harness = Harness::new().await?;
    let workspace = seed_workspace(&harness, "Acme", "ada@example.com").await?;

    // Bob has no access row on the second board once it stops being open to all.
    let support = boards::Entity::find_by_id(workspace.boards[1].clone())
        .one(&harness.db)
        .await?
        .expect("support board");
    let mut support: boards::ActiveModel = support.into();
    support.all_access = Set(false);
    support.update(&harness.db).await?;

    let service = harness.context.export_service();
    let export = service
        .request(workspace.tenant.id(), &workspace.member_id, ExportKind::SingleUser)
        .await?;
    for outcome in harness.run_jobs().await {
        outcome?;
    }
    let export = service.find(&export.id).await?;
    assert_eq!(export.status, "completed");
    assert!(ExportService::accessible_to(&export, &workspace.member_id));
    assert!(!ExportService::accessible_to(&export, &workspace.tenant.owner.id));

    let dir = TempDir::new()?;
    let path = dir.join("bob.zip");
    service.download_to(&export, &path).await?;
    let mut reader = ArchiveReader::open(&path)?;

    let mut cards: Vec<String> = reader
        .entry_names()
        .filter(|name| name.ends_with(".json"))
        .map(str::to_string)
        .collect();
    cards.sort();
    assert_eq!(cards, vec!["cards/1.json", "cards/2.json", "cards/3.json"]);
    assert!(reader.contains(&format!("cards/1/{}-notes.txt", workspace.blob_key)));
    assert!(!reader.contains("data/account.json"));

    let first: Value = serde_json::from_slice(&reader.read_bytes("cards/1.json")?)?;
    assert_eq!(first["number"], 1);
    assert_eq!(first["board"], "Roadmap");
    assert_eq!(first["comments"][0]["creator"], "Bob");
    let body = first["comments"][0]["body"].as_str().unwrap_or_default();
    assert!(body.contains(&format!("gid=\"gid://tenantport/Tag/{}\"", workspace.tag_id)));
    assert!(!body.contains("sgid="));

    let notices = harness.notifier.notices().await;
    assert!(notices.contains(&Notice::ExportCompleted {
        recipient: "bob@example.com".to_string(),
        export_id: export.id.clone(),
    }));
    Ok(())
}

#[tokio::test]
async fn test_export_request_rejects_user_of_other_account() -> Result<()> {
    let harness = Harness::new().await?;
    let acme = harness.tenant("Acme", "ada@example.com").await?;
    let globex = harness.tenant("Globex", "gil@example.com").await?;

    let error = harness
        .context
        .export_service()
        .request(acme.id(), &globex.owner.id, ExportKind::WholeAccount)
        .await
        .expect_err("user outside the account");
    assert_eq!(error.kind(), CoreErrorKind::NotFound);
    assert!(harness.queue.pending().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_missing_blob_bytes_are_skipped() -> Result<()> {
    let harness = Harness::new().await?;
    let workspace = seed_workspace(&harness, "Acme", "ada@example.com").await?;
    harness.store.delete(&workspace.blob_key).await?;

    let dir = TempDir::new()?;
    let path = dir.join("acme.zip");
    let export = harness
        .export_to(&workspace.tenant, ExportKind::WholeAccount, &path)
        .await?;
    assert_eq!(export.status, "completed");

    let reader = ArchiveReader::open(&path)?;
    assert!(reader.blob_keys().is_empty());
    let blob_documents = reader
        .entry_names()
        .filter(|name| name.starts_with(&format!("data/{}/", EntityKind::Blobs.directory())))
        .count();
    assert_eq!(blob_documents, 1);
    Ok(())
}

#[tokio::test]
async fn test_failed_export_records_failure_without_file() -> Result<()> {
    let harness = Harness::new().await?;
    let workspace = seed_workspace(&harness, "Acme", "ada@example.com").await?;
    let service = harness.context.export_service();
    let export = service
        .request(workspace.tenant.id(), &workspace.tenant.owner.id, ExportKind::WholeAccount)
        .await?;

    // An unknown kind makes archive generation fail after the export is picked up.
    let mut corrupted: account_exports::ActiveModel = export.clone().into();
    corrupted.kind = Set("everything".to_string());
    corrupted.update(&harness.db).await?;

    let outcomes = harness.run_jobs().await;
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].is_err());

    let export = service.find(&export.id).await?;
    assert_eq!(export.status, "failed");
    assert!(export.file_key.is_none());
    assert!(export.completed_at.is_some());
    assert!(!harness
        .store
        .keys()
        .await
        .iter()
        .any(|key| key.starts_with("exports/")));
    assert!(!harness
        .notifier
        .notices()
        .await
        .iter()
        .any(|notice| matches!(notice, Notice::ExportCompleted { .. })));
    Ok(())
}

#[tokio::test]
async fn test_cleanup_removes_only_expired_exports() -> Result<()> {
    let harness = Harness::new().await?;
    let workspace = seed_workspace(&harness, "Acme", "ada@example.com").await?;
    let dir = TempDir::new()?;
    let stale = harness
        .export_to(&workspace.tenant, ExportKind::WholeAccount, &dir.join("stale.zip"))
        .await?;
    let fresh = harness
        .export_to(&workspace.tenant, ExportKind::WholeAccount, &dir.join("fresh.zip"))
        .await?;

    let stale_key = stale.file_key.clone().expect("stale file");
    let mut aged: account_exports::ActiveModel = stale.clone().into();
    aged.completed_at = Set(Some(Utc::now() - Duration::hours(48)));
    aged.update(&harness.db).await?;

    let service = harness.context.export_service();
    assert_eq!(service.cleanup(Utc::now()).await?, 1);

    assert_eq!(
        service.find(&stale.id).await.map(|_| ()).unwrap_err().kind(),
        CoreErrorKind::NotFound
    );
    assert!(harness.store.get(&stale_key).await.is_none());
    let fresh = service.find(&fresh.id).await?;
    let fresh_key = fresh.file_key.expect("fresh file");
    assert!(harness.store.exists(&fresh_key).await?);

    assert_eq!(service.cleanup(Utc::now()).await?, 0);
    Ok(())
}
