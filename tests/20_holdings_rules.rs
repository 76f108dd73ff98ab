mod common;

use anyhow::Result;

use catalog_bulk_edit::model::{ElectronicAccess, Holdings, Note, TenantRecord};
use catalog_bulk_edit::processor::implementations::HoldingsHandler;
use catalog_bulk_edit::rules::{keys, Action};
use catalog_bulk_edit::types::{UpdateActionType, UpdateOptionType};
use common::*;

fn college_holdings() -> TenantRecord<Holdings> {
    TenantRecord::new(holdings("h-1", "inst-local", false), COLLEGE)
}

fn marc_holdings() -> TenantRecord<Holdings> {
    let mut record = holdings("h-1", "inst-local", false);
    record.source_id = Some("src-marc".into());
    record.administrative_notes = vec!["Bound with".into()];
    record.notes = vec![Note::new("hnt-action", "Repaired")];
    TenantRecord::new(record, COLLEGE)
}

#[tokio::test]
async fn test_permanent_location_cannot_be_cleared() -> Result<()> {
    let catalog = catalog();
    let ctx = context(&catalog, COLLEGE);
    let original = college_holdings();
    let rules = rules(
        UpdateOptionType::PermanentLocation,
        vec![Action::new(UpdateActionType::ClearField)],
    );

    let result = process(HoldingsHandler::new()?, &original, &rules, &ctx).await;

    assert!(!result.changed);
    assert_eq!(result.updated, original.record);
    assert_eq!(result.errors[0].message, "Permanent location cannot be cleared");
    assert_eq!(result.errors[0].identifier, "ho-h-1");
    Ok(())
}

#[tokio::test]
async fn test_temporary_location_recomputes_effective_location() -> Result<()> {
    let catalog = catalog();
    let ctx = context(&catalog, COLLEGE);
    let rules = rules(UpdateOptionType::TemporaryLocation, vec![replace_with("Annex")]);

    let result = process(HoldingsHandler::new()?, &college_holdings(), &rules, &ctx).await;

    assert_eq!(result.updated.temporary_location_id.as_deref(), Some("loc-b"));
    assert_eq!(result.updated.effective_location_id.as_deref(), Some("loc-b"));

    let cleared = process(
        HoldingsHandler::new()?,
        &TenantRecord::new(result.updated, COLLEGE),
        &common::rules(
            UpdateOptionType::TemporaryLocation,
            vec![Action::new(UpdateActionType::ClearField)],
        ),
        &ctx,
    )
    .await;
    assert_eq!(cleared.updated.effective_location_id.as_deref(), Some("loc-h"));
    Ok(())
}

#[tokio::test]
async fn test_marc_holdings_notes_are_locked() -> Result<()> {
    let catalog = catalog();
    let ctx = context(&catalog, COLLEGE);
    let original = marc_holdings();
    let rules = rules(
        UpdateOptionType::HoldingsNote,
        vec![Action::new(UpdateActionType::RemoveAll).with_parameter(keys::HOLDINGS_NOTE_TYPE_ID, "hnt-action")],
    );

    let result = process(HoldingsHandler::new()?, &original, &rules, &ctx).await;

    assert!(!result.changed);
    assert_eq!(result.updated.notes, original.record.notes);
    assert!(result.errors[0].message.contains("source \"MARC\""));
    Ok(())
}

#[tokio::test]
async fn test_marc_holdings_administrative_notes_stay_editable() -> Result<()> {
    let catalog = catalog();
    let ctx = context(&catalog, COLLEGE);
    let rules = rules(
        UpdateOptionType::AdministrativeNote,
        vec![Action::new(UpdateActionType::AddToExisting).with_updated("Checked 2024")],
    );

    let result = process(HoldingsHandler::new()?, &marc_holdings(), &rules, &ctx).await;

    assert!(result.changed);
    assert_eq!(result.updated.administrative_notes, vec!["Bound with", "Checked 2024"]);

    let change_type = common::rules(
        UpdateOptionType::AdministrativeNote,
        vec![Action::new(UpdateActionType::ChangeType).with_updated("hnt-copy")],
    );
    let locked = process(HoldingsHandler::new()?, &marc_holdings(), &change_type, &ctx).await;
    assert!(!locked.changed);
    Ok(())
}

#[tokio::test]
async fn test_administrative_note_becomes_typed_note() -> Result<()> {
    let catalog = catalog();
    let ctx = context(&catalog, COLLEGE);
    let mut record = holdings("h-1", "inst-local", false);
    record.administrative_notes = vec!["Shelved with periodicals".into()];
    let record = TenantRecord::new(record, COLLEGE);

    let rules = rules(
        UpdateOptionType::AdministrativeNote,
        vec![Action::new(UpdateActionType::ChangeType).with_updated("Copy note")],
    );
    let result = process(HoldingsHandler::new()?, &record, &rules, &ctx).await;

    assert!(result.updated.administrative_notes.is_empty());
    assert_eq!(result.updated.notes, vec![Note::new("hnt-copy", "Shelved with periodicals")]);
    Ok(())
}

#[tokio::test]
async fn test_electronic_access_edits() -> Result<()> {
    let catalog = catalog();
    let ctx = context(&catalog, COLLEGE);
    let mut record = holdings("h-1", "inst-local", false);
    record.electronic_access = vec![ElectronicAccess {
        uri: "http://old.example.org/book".into(),
        link_text: Some("Full text".into()),
        relationship_id: Some("rel-resource".into()),
        ..ElectronicAccess::default()
    }];
    let record = TenantRecord::new(record, COLLEGE);

    let uri = rules(
        UpdateOptionType::ElectronicAccessUri,
        vec![Action::new(UpdateActionType::FindAndReplace)
            .with_initial("http://old.example.org")
            .with_updated("https://new.example.org")],
    );
    let result = process(HoldingsHandler::new()?, &record, &uri, &ctx).await;
    assert_eq!(result.updated.electronic_access[0].uri, "https://new.example.org/book");

    let relationship = common::rules(
        UpdateOptionType::ElectronicAccessUrlRelationship,
        vec![Action::new(UpdateActionType::FindAndReplace)
            .with_initial("Resource")
            .with_updated("Version of resource")],
    );
    let result = process(HoldingsHandler::new()?, &record, &relationship, &ctx).await;
    assert_eq!(
        result.updated.electronic_access[0].relationship_id.as_deref(),
        Some("rel-version")
    );

    let link_text = common::rules(
        UpdateOptionType::ElectronicAccessLinkText,
        vec![Action::new(UpdateActionType::FindAndRemoveThese).with_initial("Full text")],
    );
    let result = process(HoldingsHandler::new()?, &record, &link_text, &ctx).await;
    assert_eq!(result.updated.electronic_access[0].link_text, None);
    Ok(())
}

#[tokio::test]
async fn test_uri_cannot_be_cleared() -> Result<()> {
    let catalog = catalog();
    let ctx = context(&catalog, COLLEGE);
    let rules = rules(
        UpdateOptionType::ElectronicAccessUri,
        vec![Action::new(UpdateActionType::ClearField)],
    );

    let result = process(HoldingsHandler::new()?, &college_holdings(), &rules, &ctx).await;

    assert!(result.errors.iter().any(|e| e.message == "URI cannot be cleared"));
    Ok(())
}
