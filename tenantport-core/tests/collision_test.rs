use anyhow::Result;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::json;

use tenantport::archive::JoinCodeDocument;
use tenantport::database::entities::users;
use tenantport::services::account_service::SYSTEM_USER_NAME;
use tenantport::transfer::{EntityKind, ExportKind};
use tenantport_test_utils::fixtures::counts_for;
use tenantport_test_utils::{seed_workspace, ArchiveBuilder, Harness, TempDir};

#[tokio::test]
async fn test_join_code_in_use_keeps_generated_code() -> Result<()> {
    let harness = Harness::new().await?;
    let workspace = seed_workspace(&harness, "Acme", "ada@example.com").await?;
    let dir = TempDir::new()?;
    let path = dir.join("acme.zip");
    harness
        .export_to(&workspace.tenant, ExportKind::WholeAccount, &path)
        .await?;

    let accounts = harness.context.account_service();
    let source_code = accounts.join_code(workspace.tenant.id()).await?;

    let (import, outcome) = harness.import_archive("carol@example.com", &path).await?;
    outcome?;
    let target_code = accounts.join_code(&import.account_id).await?;
    assert_ne!(target_code.code, source_code.code);
    assert_eq!(accounts.join_code(workspace.tenant.id()).await?, source_code);
    Ok(())
}

#[tokio::test]
async fn test_unused_join_code_is_carried_over() -> Result<()> {
    let harness = Harness::new().await?;
    let workspace = seed_workspace(&harness, "Acme", "ada@example.com").await?;
    let dir = TempDir::new()?;
    let path = dir.join("acme.zip");
    harness
        .export_to(&workspace.tenant, ExportKind::WholeAccount, &path)
        .await?;

    let mut archive = ArchiveBuilder::from_file(&path)?;
    archive.root_mut().join_code = Some(JoinCodeDocument {
        code: "QZ7K-4M2P-9XWD".to_string(),
        usage_count: 3,
        usage_limit: 25,
    });
    let moved = dir.join("moved.zip");
    archive.write_to(&moved)?;

    let (import, outcome) = harness.import_archive("carol@example.com", &moved).await?;
    outcome?;
    let code = harness
        .context
        .account_service()
        .join_code(&import.account_id)
        .await?;
    assert_eq!(code.code, "QZ7K-4M2P-9XWD");
    assert_eq!(code.usage_count, 3);
    assert_eq!(code.usage_limit, 25);
    Ok(())
}

#[tokio::test]
async fn test_unique_violation_rolls_back_everything() -> Result<()> {
    let harness = Harness::new().await?;
    let workspace = seed_workspace(&harness, "Acme", "ada@example.com").await?;
    let dir = TempDir::new()?;
    let path = dir.join("acme.zip");
    harness
        .export_to(&workspace.tenant, ExportKind::WholeAccount, &path)
        .await?;

    let mut archive = ArchiveBuilder::from_file(&path)?;
    for card_id in archive.ids(EntityKind::Cards) {
        archive.set_field(EntityKind::Cards, &card_id, "number", json!(7))?;
    }
    let duplicated = dir.join("duplicated.zip");
    archive.write_to(&duplicated)?;

    let (import, outcome) = harness.import_archive("carol@example.com", &duplicated).await?;
    assert!(outcome.is_err());
    assert_eq!(import.status, "failed");

    let counts = counts_for(&harness.db, &import.account_id).await?;
    for kind in [
        EntityKind::Tags,
        EntityKind::Boards,
        EntityKind::Columns,
        EntityKind::Cards,
        EntityKind::Comments,
        EntityKind::RichTexts,
        EntityKind::Webhooks,
    ] {
        assert_eq!(counts[&kind], 0, "{} rows survived the rollback", kind);
    }
    // Only the system user and the importing owner remain.
    assert_eq!(counts[&EntityKind::Users], 2);
    Ok(())
}

#[tokio::test]
async fn test_users_merge_on_email() -> Result<()> {
    let harness = Harness::new().await?;
    let workspace = seed_workspace(&harness, "Acme", "ada@example.com").await?;
    let dir = TempDir::new()?;
    let path = dir.join("acme.zip");
    harness
        .export_to(&workspace.tenant, ExportKind::WholeAccount, &path)
        .await?;

    let (import, outcome) = harness.import_archive("bob@example.com", &path).await?;
    outcome?;
    let owner = harness.context.import_service().owner_user(&import).await?;

    let target_users = users::Entity::find()
        .filter(users::Column::AccountId.eq(import.account_id.as_str()))
        .all(&harness.db)
        .await?;
    assert_eq!(target_users.len(), 3);
    let bobs: Vec<_> = target_users.iter().filter(|u| u.name == "Bob").collect();
    assert_eq!(bobs.len(), 1);
    assert_eq!(bobs[0].id, owner.id);
    assert_eq!(
        target_users
            .iter()
            .filter(|u| u.name == SYSTEM_USER_NAME)
            .count(),
        1
    );
    Ok(())
}
