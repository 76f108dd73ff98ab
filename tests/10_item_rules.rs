mod common;

use anyhow::Result;
use std::sync::Arc;

use catalog_bulk_edit::model::{CirculationNote, CirculationNoteType, Item, NamedReference, Note, TenantRecord};
use catalog_bulk_edit::processor::implementations::ItemHandler;
use catalog_bulk_edit::processor::{Collaborators, ProcessingContext, Severity};
use catalog_bulk_edit::rules::{keys, Action};
use catalog_bulk_edit::services::{InMemoryCatalog, ReferenceKind};
use catalog_bulk_edit::tenant::TenantContext;
use catalog_bulk_edit::types::{UpdateActionType, UpdateOptionType};
use common::*;

fn college_item() -> TenantRecord<Item> {
    TenantRecord::new(item("i-1", "h-1"), COLLEGE)
}

#[tokio::test]
async fn test_replace_permanent_location_sets_effective_location() -> Result<()> {
    let catalog = catalog();
    let ctx = context(&catalog, COLLEGE);
    let rules = rules(UpdateOptionType::PermanentLocation, vec![replace_with("loc-b")]);

    let result = process(ItemHandler::new()?, &college_item(), &rules, &ctx).await;

    let annex = NamedReference::new("loc-b", "Annex");
    assert!(result.changed);
    assert!(result.errors.is_empty());
    assert_eq!(result.updated.permanent_location, Some(annex.clone()));
    assert_eq!(result.updated.effective_location, Some(annex.clone()));
    assert_eq!(result.preview.effective_location, Some(annex));
    Ok(())
}

#[tokio::test]
async fn test_location_accepts_reference_name() -> Result<()> {
    let catalog = catalog();
    let ctx = context(&catalog, COLLEGE);
    let rules = rules(UpdateOptionType::TemporaryLocation, vec![replace_with("Main Library")]);

    let result = process(ItemHandler::new()?, &college_item(), &rules, &ctx).await;

    assert_eq!(
        result.updated.temporary_location,
        Some(NamedReference::new("loc-a", "Main Library"))
    );
    assert_eq!(result.updated.effective_location.map(|l| l.id), Some("loc-a".to_string()));
    Ok(())
}

#[tokio::test]
async fn test_clearing_temporary_location_falls_back_to_holdings() -> Result<()> {
    let catalog = catalog();
    let ctx = context(&catalog, COLLEGE);
    let mut record = item("i-1", "h-1");
    record.temporary_location = Some(NamedReference::new("loc-a", "Main Library"));
    record.effective_location = record.temporary_location.clone();
    let record = TenantRecord::new(record, COLLEGE);

    let rules = rules(
        UpdateOptionType::TemporaryLocation,
        vec![Action::new(UpdateActionType::ClearField)],
    );
    let result = process(ItemHandler::new()?, &record, &rules, &ctx).await;

    assert!(result.changed);
    assert_eq!(result.updated.temporary_location, None);
    assert_eq!(
        result.updated.effective_location,
        Some(NamedReference::new("loc-h", "Holdings Stacks"))
    );
    Ok(())
}

#[tokio::test]
async fn test_disallowed_status_leaves_record_untouched() -> Result<()> {
    let catalog = catalog();
    let ctx = context(&catalog, COLLEGE);
    let original = college_item();
    let rules = rules(UpdateOptionType::Status, vec![replace_with("Declared lost")]);

    let result = process(ItemHandler::new()?, &original, &rules, &ctx).await;

    assert!(!result.changed);
    assert_eq!(result.updated, original.record);
    assert_eq!(result.preview, original.record);
    let rejection = result
        .errors
        .iter()
        .find(|e| e.message == "New status value is not allowed")
        .expect("status rejection reported");
    assert_eq!(rejection.severity, Severity::Warning);
    assert_eq!(rejection.identifier, "bc-i-1");
    Ok(())
}

#[tokio::test]
async fn test_allowed_status_transition() -> Result<()> {
    let catalog = catalog();
    let ctx = context(&catalog, COLLEGE);
    let rules = rules(UpdateOptionType::Status, vec![replace_with("Missing")]);

    let result = process(ItemHandler::new()?, &college_item(), &rules, &ctx).await;

    assert!(result.changed);
    assert_eq!(result.updated.status.name, "Missing");
    Ok(())
}

#[tokio::test]
async fn test_permanent_loan_type_cannot_be_cleared() -> Result<()> {
    let catalog = catalog();
    let ctx = context(&catalog, COLLEGE);
    let rules = rules(
        UpdateOptionType::PermanentLoanType,
        vec![Action::new(UpdateActionType::ClearField)],
    );

    let result = process(ItemHandler::new()?, &college_item(), &rules, &ctx).await;

    assert!(!result.changed);
    assert!(result
        .errors
        .iter()
        .any(|e| e.message == "Permanent loan type cannot be cleared"));
    assert!(result.updated.permanent_loan_type.is_some());
    Ok(())
}

#[tokio::test]
async fn test_unknown_loan_type_is_lookup_error() -> Result<()> {
    let catalog = catalog();
    let ctx = context(&catalog, COLLEGE);
    let rules = rules(UpdateOptionType::TemporaryLoanType, vec![replace_with("lt-missing")]);

    let result = process(ItemHandler::new()?, &college_item(), &rules, &ctx).await;

    assert!(!result.changed);
    assert!(result.has_errors());
    assert!(!result.is_no_change());
    Ok(())
}

#[tokio::test]
async fn test_item_note_moves_to_check_in_note() -> Result<()> {
    let catalog = catalog();
    let ctx = context(&catalog, COLLEGE);
    let mut record = item("i-1", "h-1");
    record.notes = vec![
        Note::new("nt-binding", "Rebound 1998"),
        Note::new("nt-provenance", "Gift of the estate"),
    ];
    let record = TenantRecord::new(record, COLLEGE);

    let rules = rules(
        UpdateOptionType::ItemNote,
        vec![Action::new(UpdateActionType::ChangeType)
            .with_parameter(keys::ITEM_NOTE_TYPE_ID, "nt-binding")
            .with_updated("CHECK_IN_NOTE")],
    );
    let result = process(ItemHandler::new()?, &record, &rules, &ctx).await;

    assert!(result.changed);
    assert_eq!(result.updated.notes.len(), 1);
    assert_eq!(result.updated.circulation_notes.len(), 1);
    assert_eq!(result.updated.circulation_notes[0].note_type, CirculationNoteType::CheckIn);
    assert_eq!(result.updated.circulation_notes[0].note, "Rebound 1998");
    Ok(())
}

#[tokio::test]
async fn test_duplicate_check_in_note() -> Result<()> {
    let catalog = catalog();
    let ctx = context(&catalog, COLLEGE);
    let mut record = item("i-1", "h-1");
    record.circulation_notes = vec![CirculationNote::new(CirculationNoteType::CheckIn, "Fragile")];
    let record = TenantRecord::new(record, COLLEGE);

    let rules = rules(UpdateOptionType::CheckInNote, vec![Action::new(UpdateActionType::Duplicate)]);
    let result = process(ItemHandler::new()?, &record, &rules, &ctx).await;

    let types: Vec<CirculationNoteType> = result.updated.circulation_notes.iter().map(|n| n.note_type).collect();
    assert_eq!(types, vec![CirculationNoteType::CheckIn, CirculationNoteType::CheckOut]);
    assert_eq!(record.record.circulation_notes.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_statistical_codes_added_by_name() -> Result<()> {
    let catalog = catalog();
    let ctx = context(&catalog, COLLEGE);
    let mut record = item("i-1", "h-1");
    record.statistical_code_ids = vec!["sc-books".into()];
    let record = TenantRecord::new(record, COLLEGE);

    let rules = rules(
        UpdateOptionType::StatisticalCode,
        vec![Action::new(UpdateActionType::AddToExisting).with_updated("Books, Serials")],
    );
    let result = process(ItemHandler::new()?, &record, &rules, &ctx).await;

    assert_eq!(result.updated.statistical_code_ids, vec!["sc-books", "sc-serials"]);
    Ok(())
}

#[tokio::test]
async fn test_record_in_other_tenant_resolves_there() -> Result<()> {
    let catalog = Arc::new(
        InMemoryCatalog::new()
            .with_reference(COLLEGE, ReferenceKind::Location, "loc-college", "College Stacks")
            .with_holdings(COLLEGE, holdings("h-1", "inst-local", false)),
    );
    let tenant = TenantContext::new(CENTRAL).with_affiliations(vec![common::tenant(COLLEGE)]);
    let ctx = ProcessingContext::new(tenant, Collaborators::from_catalog(catalog.clone()));
    let rules = rules(UpdateOptionType::PermanentLocation, vec![replace_with("loc-college")]);

    let result = process(ItemHandler::new()?, &college_item(), &rules, &ctx).await;

    assert!(result.changed, "errors: {:?}", result.errors);
    assert_eq!(result.updated.permanent_location.map(|l| l.name), Some("College Stacks".to_string()));
    assert_eq!(ctx.current_tenant(), &common::tenant(CENTRAL));
    Ok(())
}

#[tokio::test]
async fn test_unaffiliated_tenant_aborts_rule() -> Result<()> {
    let catalog = catalog();
    let tenant = TenantContext::new(CENTRAL).with_user("operator");
    let ctx = ProcessingContext::new(tenant, Collaborators::from_catalog(catalog.clone()));
    let rules = rules(
        UpdateOptionType::PermanentLocation,
        vec![replace_with("loc-b"), replace_with("loc-a")],
    );

    let result = process(ItemHandler::new()?, &college_item(), &rules, &ctx).await;

    assert!(!result.changed);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].severity, Severity::Error);
    assert!(result.errors[0].message.contains("does not have required affiliation"));
    Ok(())
}
