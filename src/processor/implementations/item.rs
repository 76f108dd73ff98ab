use async_trait::async_trait;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

use super::shared::{self, *};
use crate::model::{Item, ItemStatus, NamedReference};
use crate::processor::context::ProcessingContext;
use crate::processor::dispatch::{DispatchError, DispatchTable};
use crate::processor::error::RuleError;
use crate::processor::traits::{mutation, Mutation, RecordHandler};
use crate::rules::{Action, Rule};
use crate::services::{resolve_for, ReferenceKind};
use crate::types::{EntityType, UpdateActionType, UpdateOptionType};

/// Statuses an operator may move an item between; any other current status is locked
const EDITABLE_STATUSES: &[&str] = &[
    "Available",
    "Missing",
    "Withdrawn",
    "In process (non-requestable)",
    "Intellectual item",
    "Long missing",
    "Restricted",
    "Unavailable",
    "Unknown",
];

/// Allowed status transitions keyed by current status
static ALLOWED_STATUS_TRANSITIONS: Lazy<HashMap<&'static str, HashSet<&'static str>>> = Lazy::new(|| {
    EDITABLE_STATUSES
        .iter()
        .map(|from| {
            let targets = EDITABLE_STATUSES.iter().copied().filter(|to| to != from).collect();
            (*from, targets)
        })
        .collect()
});

pub fn is_status_transition_allowed(from: &str, to: &str) -> bool {
    from == to
        || ALLOWED_STATUS_TRANSITIONS
            .get(from)
            .map(|targets| targets.contains(to))
            .unwrap_or(false)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    PermanentLocation,
    TemporaryLocation,
    PermanentLoanType,
    TemporaryLoanType,
    Status,
    Suppress,
    Note,
    StatisticalCode,
    ElectronicAccess,
}

pub struct ItemHandler {
    dispatch: DispatchTable<ItemKind>,
}

impl ItemHandler {
    pub fn new() -> Result<Self, DispatchError> {
        let mut builder = DispatchTable::builder(EntityType::Item)
            .option(UpdateOptionType::PermanentLocation, REPLACE_OR_CLEAR, ItemKind::PermanentLocation)
            .option(UpdateOptionType::TemporaryLocation, REPLACE_OR_CLEAR, ItemKind::TemporaryLocation)
            .option(UpdateOptionType::PermanentLoanType, REPLACE_OR_CLEAR, ItemKind::PermanentLoanType)
            .option(UpdateOptionType::TemporaryLoanType, REPLACE_OR_CLEAR, ItemKind::TemporaryLoanType)
            .option(UpdateOptionType::Status, &[UpdateActionType::ReplaceWith], ItemKind::Status)
            .option(UpdateOptionType::SuppressFromDiscovery, FLAG_ACTIONS, ItemKind::Suppress)
            .option(UpdateOptionType::AdministrativeNote, NOTE_ACTIONS, ItemKind::Note)
            .option(UpdateOptionType::ItemNote, TYPED_NOTE_ACTIONS, ItemKind::Note)
            .option(UpdateOptionType::CheckInNote, CIRCULATION_NOTE_ACTIONS, ItemKind::Note)
            .option(UpdateOptionType::CheckOutNote, CIRCULATION_NOTE_ACTIONS, ItemKind::Note)
            .option(UpdateOptionType::StatisticalCode, STATISTICAL_CODE_ACTIONS, ItemKind::StatisticalCode)
            .option(
                UpdateOptionType::ElectronicAccessUri,
                ELECTRONIC_ACCESS_URI_ACTIONS,
                ItemKind::ElectronicAccess,
            );
        for option in ELECTRONIC_ACCESS_OPTIONS {
            builder = builder.option(*option, ELECTRONIC_ACCESS_ACTIONS, ItemKind::ElectronicAccess);
        }
        Ok(Self {
            dispatch: builder.build()?,
        })
    }

    async fn resolve_named(
        kind: ReferenceKind,
        value: &str,
        for_preview: bool,
        ctx: &ProcessingContext,
    ) -> Result<NamedReference, RuleError> {
        let reference = resolve_for(ctx.resolver(), for_preview, kind, value, ctx.current_tenant()).await?;
        Ok(NamedReference::new(reference.id, reference.name))
    }

    /// Effective location: temporary, else permanent, else the owning holdings' effective location
    async fn effective_location(
        record: &Item,
        permanent: Option<&NamedReference>,
        temporary: Option<&NamedReference>,
        for_preview: bool,
        ctx: &ProcessingContext,
    ) -> Result<Option<NamedReference>, RuleError> {
        if let Some(location) = temporary.or(permanent) {
            return Ok(Some(location.clone()));
        }
        if record.holdings_record_id.is_empty() {
            return Ok(None);
        }

        let holdings = ctx
            .fetcher()
            .holdings_by_id(&record.holdings_record_id, ctx.current_tenant())
            .await?;
        match holdings.and_then(|h| h.effective_location_id) {
            Some(location_id) => {
                tracing::debug!(
                    "Item {} falls back to holdings {} effective location",
                    record.id,
                    record.holdings_record_id
                );
                Ok(Some(
                    Self::resolve_named(ReferenceKind::Location, &location_id, for_preview, ctx).await?,
                ))
            }
            None => Ok(None),
        }
    }

    async fn location_mutation(
        kind: ItemKind,
        action: &Action,
        record: &Item,
        for_preview: bool,
        ctx: &ProcessingContext,
    ) -> Result<Mutation<Item>, RuleError> {
        let value = match action.action_type {
            UpdateActionType::ReplaceWith => Some(
                Self::resolve_named(ReferenceKind::Location, required_updated(action)?, for_preview, ctx).await?,
            ),
            _ => None,
        };

        let (permanent, temporary) = if kind == ItemKind::PermanentLocation {
            (value.clone(), record.temporary_location.clone())
        } else {
            (record.permanent_location.clone(), value.clone())
        };
        let effective =
            Self::effective_location(record, permanent.as_ref(), temporary.as_ref(), for_preview, ctx).await?;

        Ok(mutation(move |item: &mut Item| {
            if kind == ItemKind::PermanentLocation {
                item.permanent_location = value;
            } else {
                item.temporary_location = value;
            }
            item.effective_location = effective;
            Ok(())
        }))
    }
}

#[async_trait]
impl RecordHandler for ItemHandler {
    type Record = Item;
    type Kind = ItemKind;

    fn entity_type(&self) -> EntityType {
        EntityType::Item
    }

    fn dispatch(&self) -> &DispatchTable<ItemKind> {
        &self.dispatch
    }

    fn identifier(&self, record: &Item) -> String {
        record
            .barcode
            .clone()
            .or_else(|| record.hrid.clone())
            .unwrap_or_else(|| record.id.clone())
    }

    async fn validate_kind(
        &self,
        kind: ItemKind,
        option: UpdateOptionType,
        action: &Action,
        _rule: &Rule,
        record: &Item,
        ctx: &ProcessingContext,
    ) -> Result<(), RuleError> {
        match kind {
            ItemKind::PermanentLocation | ItemKind::TemporaryLocation => {
                if action.action_type == UpdateActionType::ReplaceWith {
                    let value = required_updated(action)?;
                    ctx.resolver()
                        .lookup(ReferenceKind::Location, value, ctx.current_tenant())
                        .await?;
                }
                Ok(())
            }
            ItemKind::PermanentLoanType | ItemKind::TemporaryLoanType => {
                match action.action_type {
                    UpdateActionType::ClearField if kind == ItemKind::PermanentLoanType => {
                        return Err(RuleError::validation("Permanent loan type cannot be cleared"));
                    }
                    UpdateActionType::ReplaceWith => {
                        let value = required_updated(action)?;
                        ctx.resolver()
                            .lookup(ReferenceKind::LoanType, value, ctx.current_tenant())
                            .await?;
                    }
                    _ => {}
                }
                Ok(())
            }
            ItemKind::Status => {
                let target = required_updated(action)?;
                if is_status_transition_allowed(&record.status.name, target) {
                    Ok(())
                } else {
                    Err(RuleError::validation("New status value is not allowed"))
                }
            }
            ItemKind::Suppress => validate_flag(option, action),
            ItemKind::Note => validate_note(option, action, true),
            ItemKind::StatisticalCode => validate_statistical_codes(action),
            ItemKind::ElectronicAccess => validate_electronic_access(option, action),
        }
    }

    async fn build_mutation(
        &self,
        kind: ItemKind,
        option: UpdateOptionType,
        action: &Action,
        record: &Item,
        for_preview: bool,
        ctx: &ProcessingContext,
    ) -> Result<Mutation<Item>, RuleError> {
        match kind {
            ItemKind::PermanentLocation | ItemKind::TemporaryLocation => {
                Self::location_mutation(kind, action, record, for_preview, ctx).await
            }
            ItemKind::PermanentLoanType | ItemKind::TemporaryLoanType => {
                let value = match action.action_type {
                    UpdateActionType::ReplaceWith => Some(
                        Self::resolve_named(ReferenceKind::LoanType, required_updated(action)?, for_preview, ctx)
                            .await?,
                    ),
                    _ => None,
                };
                Ok(mutation(move |item: &mut Item| {
                    if kind == ItemKind::PermanentLoanType {
                        item.permanent_loan_type = value;
                    } else {
                        item.temporary_loan_type = value;
                    }
                    Ok(())
                }))
            }
            ItemKind::Status => {
                let status = required_updated(action)?.to_string();
                Ok(mutation(move |item: &mut Item| {
                    item.status = ItemStatus::new(status);
                    Ok(())
                }))
            }
            ItemKind::Suppress => {
                let suppress = flag_value(option, action)?;
                Ok(mutation(move |item: &mut Item| {
                    item.discovery_suppress = Some(suppress);
                    Ok(())
                }))
            }
            ItemKind::Note => {
                shared::note_mutation(option, action, ReferenceKind::ItemNoteType, for_preview, ctx).await
            }
            ItemKind::StatisticalCode => shared::statistical_code_mutation(action, for_preview, ctx).await,
            ItemKind::ElectronicAccess => {
                shared::electronic_access_mutation(option, action, for_preview, ctx).await
            }
        }
    }
}
