use std::collections::BTreeSet;

use anyhow::Result;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use tenantport::archive::ArchiveReader;
use tenantport::collaborators::{AttachmentStore, Notice};
use tenantport::database::entities::{
    accounts, blobs, boards, cards, events, rich_texts, tags, webhook_deliveries,
};
use tenantport::transfer::rich_text::embedded_global_ids;
use tenantport::transfer::{EntityKind, ExportKind};
use tenantport_test_utils::fixtures::{counts_for, WORKSPACE_BLOB};
use tenantport_test_utils::{seed_workspace, ArchiveBuilder, Harness, TempDir};

async fn card_ids(harness: &Harness, account_id: &str) -> Result<BTreeSet<String>> {
    Ok(cards::Entity::find()
        .filter(cards::Column::AccountId.eq(account_id))
        .all(&harness.db)
        .await?
        .into_iter()
        .map(|card| card.id)
        .collect())
}

#[tokio::test]
async fn test_whole_account_roundtrip() -> Result<()> {
    let harness = Harness::new().await?;
    let workspace = seed_workspace(&harness, "Acme", "ada@example.com").await?;
    let dir = TempDir::new()?;
    let archive = dir.join("acme.zip");
    harness
        .export_to(&workspace.tenant, ExportKind::WholeAccount, &archive)
        .await?;

    let reader = ArchiveReader::open(&archive)?;
    let in_dir = |prefix: &str| reader.entry_names().filter(|n| n.starts_with(prefix)).count();
    assert_eq!(in_dir("data/boards/"), 2);
    assert_eq!(in_dir("data/cards/"), 5);
    assert_eq!(in_dir("data/webhooks/"), 1);
    assert!(reader.contains("data/account.json"));
    assert!(reader.contains(&format!("storage/{}", workspace.blob_key)));

    // Bytes must come from the archive, not from the source's stored copy.
    harness.store.delete(&workspace.blob_key).await?;

    let (import, outcome) = harness.import_archive("ada@example.com", &archive).await?;
    outcome?;
    assert_eq!(import.status, "completed");
    assert!(import.completed_at.is_some());

    let source_counts = workspace.tenant.counts().await?;
    let target_counts = counts_for(&harness.db, &import.account_id).await?;
    assert_eq!(source_counts, target_counts);
    assert_eq!(target_counts[&EntityKind::Boards], 2);
    assert_eq!(target_counts[&EntityKind::Cards], 5);
    assert_eq!(workspace.tenant.count(EntityKind::Cards).await?, 5);

    let target_boards: BTreeSet<String> = boards::Entity::find()
        .filter(boards::Column::AccountId.eq(import.account_id.as_str()))
        .all(&harness.db)
        .await?
        .into_iter()
        .map(|board| board.id)
        .collect();
    let target_cards = cards::Entity::find()
        .filter(cards::Column::AccountId.eq(import.account_id.as_str()))
        .all(&harness.db)
        .await?;
    for card in &target_cards {
        assert!(target_boards.contains(&card.board_id));
        assert!(!workspace.cards.contains(&card.id));
    }

    let target_events: BTreeSet<String> = events::Entity::find()
        .filter(events::Column::AccountId.eq(import.account_id.as_str()))
        .all(&harness.db)
        .await?
        .into_iter()
        .map(|event| event.id)
        .collect();
    let delivery = webhook_deliveries::Entity::find()
        .filter(webhook_deliveries::Column::AccountId.eq(import.account_id.as_str()))
        .one(&harness.db)
        .await?
        .expect("imported delivery");
    let event_id = delivery.event_id.expect("delivery keeps its event");
    assert!(target_events.contains(&event_id));
    assert_ne!(event_id, workspace.event_id);

    // The source still owns its key, so the import stores the bytes under a new one.
    let target_blob = blobs::Entity::find()
        .filter(blobs::Column::AccountId.eq(import.account_id.as_str()))
        .one(&harness.db)
        .await?
        .expect("imported blob");
    assert_ne!(target_blob.key, workspace.blob_key);
    assert_eq!(
        harness.store.get(&target_blob.key).await.as_deref(),
        Some(WORKSPACE_BLOB)
    );
    assert!(harness.store.get(&workspace.blob_key).await.is_none());

    let notices = harness.notifier.notices().await;
    assert!(notices.contains(&Notice::ImportCompleted {
        recipient: "ada@example.com".to_string(),
        import_id: import.id.clone(),
    }));
    Ok(())
}

#[tokio::test]
async fn test_archived_file_without_blob_row_is_not_stored() -> Result<()> {
    let harness = Harness::new().await?;
    let workspace = seed_workspace(&harness, "Acme", "ada@example.com").await?;
    let dir = TempDir::new()?;
    let path = dir.join("acme.zip");
    harness
        .export_to(&workspace.tenant, ExportKind::WholeAccount, &path)
        .await?;

    let archive = ArchiveBuilder::from_file(&path)?.blob("q8orphan3kz", b"stray bytes");
    let padded = dir.join("padded.zip");
    archive.write_to(&padded)?;

    let (import, outcome) = harness.import_archive("carol@example.com", &padded).await?;
    outcome?;
    assert_eq!(import.status, "completed");
    assert!(harness.store.get("q8orphan3kz").await.is_none());
    Ok(())
}

#[tokio::test]
async fn test_rich_text_is_rewritten_for_target() -> Result<()> {
    let harness = Harness::new().await?;
    let workspace = seed_workspace(&harness, "Acme", "ada@example.com").await?;
    let dir = TempDir::new()?;
    let archive = dir.join("acme.zip");
    harness
        .export_to(&workspace.tenant, ExportKind::WholeAccount, &archive)
        .await?;

    let (import, outcome) = harness.import_archive("ada@example.com", &archive).await?;
    outcome?;

    let target = accounts::Entity::find_by_id(import.account_id.clone())
        .one(&harness.db)
        .await?
        .expect("target account");
    let target_slug = target.external_account_id.to_string();
    let second_card = cards::Entity::find()
        .filter(cards::Column::AccountId.eq(target.id.as_str()))
        .filter(cards::Column::Number.eq(2))
        .one(&harness.db)
        .await?
        .expect("card 2");
    let support = boards::Entity::find()
        .filter(boards::Column::AccountId.eq(target.id.as_str()))
        .filter(boards::Column::Name.eq("Support"))
        .one(&harness.db)
        .await?
        .expect("support board");
    let tag = tags::Entity::find()
        .filter(tags::Column::AccountId.eq(target.id.as_str()))
        .one(&harness.db)
        .await?
        .expect("tag");

    let body = rich_texts::Entity::find()
        .filter(rich_texts::Column::AccountId.eq(target.id.as_str()))
        .filter(rich_texts::Column::RecordType.eq("Comment"))
        .one(&harness.db)
        .await?
        .expect("comment body")
        .body;

    assert!(body.contains(&format!("href=\"/{}/cards/{}\"", target_slug, second_card.id)));
    assert!(body.contains(&format!(
        "href=\"https://app.example.com/{}/boards/{}\"",
        target_slug, support.id
    )));
    assert!(body.contains("href=\"https://elsewhere.example/docs/cards\""));
    assert!(!body.contains(&format!("/{}/", workspace.tenant.slug())));
    assert!(!body.contains(" gid=\""));

    let embeds = embedded_global_ids(&harness.signer(), &body);
    assert_eq!(embeds.len(), 1);
    assert_eq!(embeds[0].tag, "Tag");
    assert_eq!(embeds[0].id, tag.id);
    assert_ne!(embeds[0].id, workspace.tag_id);
    Ok(())
}

#[tokio::test]
async fn test_two_imports_have_disjoint_identifiers() -> Result<()> {
    let harness = Harness::new().await?;
    let workspace = seed_workspace(&harness, "Acme", "ada@example.com").await?;
    let dir = TempDir::new()?;
    let archive = dir.join("acme.zip");
    harness
        .export_to(&workspace.tenant, ExportKind::WholeAccount, &archive)
        .await?;

    let (first, outcome) = harness.import_archive("carol@example.com", &archive).await?;
    outcome?;
    let (second, outcome) = harness.import_archive("dave@example.com", &archive).await?;
    outcome?;
    assert_ne!(first.account_id, second.account_id);

    let first_counts = counts_for(&harness.db, &first.account_id).await?;
    let second_counts = counts_for(&harness.db, &second.account_id).await?;
    assert_eq!(first_counts, second_counts);
    // The archive's owner does not match the importing identity, so it is added.
    assert_eq!(first_counts[&EntityKind::Users], 4);

    let first_cards = card_ids(&harness, &first.account_id).await?;
    let second_cards = card_ids(&harness, &second.account_id).await?;
    assert_eq!(first_cards.len(), 5);
    assert!(first_cards.is_disjoint(&second_cards));

    for account_id in [&first.account_id, &second.account_id] {
        let mut numbers: Vec<i64> = cards::Entity::find()
            .filter(cards::Column::AccountId.eq(account_id.as_str()))
            .all(&harness.db)
            .await?
            .into_iter()
            .map(|card| card.number)
            .collect();
        numbers.sort_unstable();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
    }
    Ok(())
}
