use std::fs::File;

use anyhow::Result;
use serde_json::{json, Value};

use tenantport::archive::ArchiveWriter;
use tenantport::collaborators::Notice;
use tenantport::errors::CoreErrorKind;
use tenantport::transfer::{EntityKind, ExportKind};
use tenantport::TransferConfig;
use tenantport_test_utils::fixtures::{counts_for, TEST_SIGNING_SECRET};
use tenantport_test_utils::{seed_workspace, ArchiveBuilder, Harness, TempDir};

async fn exported_workspace(harness: &Harness, dir: &TempDir) -> Result<ArchiveBuilder> {
    let workspace = seed_workspace(harness, "Acme", "ada@example.com").await?;
    let path = dir.join("source.zip");
    harness
        .export_to(&workspace.tenant, ExportKind::WholeAccount, &path)
        .await?;
    ArchiveBuilder::from_file(&path)
}

#[tokio::test]
async fn test_dangling_reference_leaves_target_untouched() -> Result<()> {
    let harness = Harness::new().await?;
    let dir = TempDir::new()?;
    let mut archive = exported_workspace(&harness, &dir).await?;
    let card_id = archive.ids(EntityKind::Cards)[0].clone();
    archive.set_field(EntityKind::Cards, &card_id, "board_id", json!("no-such-board"))?;
    let path = dir.join("broken.zip");
    archive.write_to(&path)?;

    let service = harness.context.import_service();
    let import = service.submit("carol@example.com", &path).await?;
    let before = counts_for(&harness.db, &import.account_id).await?;

    let outcomes = harness.run_jobs().await;
    assert_eq!(outcomes.len(), 1);
    let error = outcomes
        .into_iter()
        .next()
        .and_then(Result::err)
        .expect("import should fail");
    assert_eq!(error.kind(), CoreErrorKind::Integrity);
    assert!(error.message().contains("no-such-board"));

    let import = service.find(&import.id).await?;
    assert_eq!(import.status, "failed");
    assert_eq!(counts_for(&harness.db, &import.account_id).await?, before);
    assert_eq!(before[&EntityKind::Cards], 0);

    let failures: Vec<_> = harness
        .notifier
        .notices()
        .await
        .into_iter()
        .filter(|notice| matches!(notice, Notice::ImportFailed { .. }))
        .collect();
    assert_eq!(
        failures,
        vec![Notice::ImportFailed {
            recipient: "carol@example.com".to_string(),
            import_id: import.id.clone(),
        }]
    );
    Ok(())
}

#[tokio::test]
async fn test_missing_board_document_is_a_dangling_reference() -> Result<()> {
    let harness = Harness::new().await?;
    let dir = TempDir::new()?;
    let mut archive = exported_workspace(&harness, &dir).await?;
    let card_id = archive.ids(EntityKind::Cards)[0].clone();
    let board_id = archive
        .field(EntityKind::Cards, &card_id, "board_id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .expect("card has a board");
    archive
        .remove(EntityKind::Boards, &board_id)
        .expect("board document");
    let path = dir.join("boardless.zip");
    archive.write_to(&path)?;

    let (import, outcome) = harness.import_archive("carol@example.com", &path).await?;
    let error = outcome.expect_err("missing board should be rejected");
    assert_eq!(error.kind(), CoreErrorKind::Integrity);
    assert!(error.message().contains(&board_id));
    assert_eq!(import.status, "failed");
    Ok(())
}

#[tokio::test]
async fn test_document_from_another_account_is_rejected() -> Result<()> {
    let harness = Harness::new().await?;
    let dir = TempDir::new()?;
    let mut archive = exported_workspace(&harness, &dir).await?;
    let tag_id = archive.ids(EntityKind::Tags)[0].clone();
    archive.set_field(EntityKind::Tags, &tag_id, "account_id", json!("someone-else"))?;
    let path = dir.join("foreign.zip");
    archive.write_to(&path)?;

    let (import, outcome) = harness.import_archive("carol@example.com", &path).await?;
    let error = outcome.expect_err("foreign document should be rejected");
    assert_eq!(error.kind(), CoreErrorKind::Integrity);
    assert_eq!(import.status, "failed");
    assert_eq!(
        counts_for(&harness.db, &import.account_id).await?[&EntityKind::Tags],
        0
    );
    Ok(())
}

#[tokio::test]
async fn test_archive_without_root_document_is_refused() -> Result<()> {
    let harness = Harness::new().await?;
    let dir = TempDir::new()?;
    let path = dir.join("rootless.zip");
    let mut writer = ArchiveWriter::new(File::create(&path)?, 1024);
    writer.write_document(
        EntityKind::Tags,
        "t1",
        &json!({ "id": "t1", "account_id": "a1", "title": "bug" }),
    )?;
    writer.finish()?;

    let error = harness
        .context
        .import_service()
        .submit("carol@example.com", &path)
        .await
        .expect_err("archive without a root should be refused");
    assert_eq!(error.kind(), CoreErrorKind::Integrity);
    assert!(harness.queue.pending().await.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_unknown_polymorphic_tag_only_rejected_when_strict() -> Result<()> {
    let dir = TempDir::new()?;

    let lenient = Harness::new().await?;
    let mut archive = exported_workspace(&lenient, &dir).await?;
    let event_id = archive.ids(EntityKind::Events)[0].clone();
    archive.set_field(EntityKind::Events, &event_id, "eventable_type", json!("Gizmo"))?;
    let path = dir.join("gizmo.zip");
    archive.write_to(&path)?;

    let (import, outcome) = lenient.import_archive("carol@example.com", &path).await?;
    outcome?;
    assert_eq!(import.status, "completed");

    let strict = Harness::with_config(TransferConfig {
        signing_secret: Some(TEST_SIGNING_SECRET.to_string()),
        strict_polymorphic_references: true,
        ..TransferConfig::default()
    })
    .await?;
    let (import, outcome) = strict.import_archive("carol@example.com", &path).await?;
    let error = outcome.expect_err("strict mode should reject unknown tags");
    assert_eq!(error.kind(), CoreErrorKind::Integrity);
    assert!(error.message().contains("Gizmo"));
    assert_eq!(import.status, "failed");
    Ok(())
}
