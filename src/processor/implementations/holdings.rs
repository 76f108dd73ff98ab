use async_trait::async_trait;

use super::shared::{self, *};
use crate::model::{Holdings, TenantRecord, MARC_SOURCE};
use crate::processor::context::ProcessingContext;
use crate::processor::dispatch::{DispatchError, DispatchTable};
use crate::processor::error::RuleError;
use crate::processor::traits::{mutation, AppliedAction, Mutation, RecordHandler};
use crate::propagation::{AssociatedRecordPropagator, PropagationOutcome, PropagationRequest};
use crate::rules::{Action, Rule};
use crate::services::{resolve_for, ReferenceKind};
use crate::types::{EntityType, UpdateActionType, UpdateOptionType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldingsKind {
    PermanentLocation,
    TemporaryLocation,
    Suppress,
    Note,
    StatisticalCode,
    ElectronicAccess,
}

pub struct HoldingsHandler {
    dispatch: DispatchTable<HoldingsKind>,
}

impl HoldingsHandler {
    pub fn new() -> Result<Self, DispatchError> {
        let mut builder = DispatchTable::builder(EntityType::Holdings)
            .option(UpdateOptionType::PermanentLocation, REPLACE_OR_CLEAR, HoldingsKind::PermanentLocation)
            .option(UpdateOptionType::TemporaryLocation, REPLACE_OR_CLEAR, HoldingsKind::TemporaryLocation)
            .option(UpdateOptionType::SuppressFromDiscovery, FLAG_ACTIONS, HoldingsKind::Suppress)
            .option(UpdateOptionType::AdministrativeNote, NOTE_ACTIONS, HoldingsKind::Note)
            .option(UpdateOptionType::HoldingsNote, TYPED_NOTE_ACTIONS, HoldingsKind::Note)
            .option(UpdateOptionType::StatisticalCode, STATISTICAL_CODE_ACTIONS, HoldingsKind::StatisticalCode)
            .option(
                UpdateOptionType::ElectronicAccessUri,
                ELECTRONIC_ACCESS_URI_ACTIONS,
                HoldingsKind::ElectronicAccess,
            );
        for option in ELECTRONIC_ACCESS_OPTIONS {
            builder = builder.option(*option, ELECTRONIC_ACCESS_ACTIONS, HoldingsKind::ElectronicAccess);
        }
        Ok(Self {
            dispatch: builder.build()?,
        })
    }

    /// Holdings whose source resolves to MARC keep their note structure in the MARC record
    async fn is_marc(record: &Holdings, ctx: &ProcessingContext) -> Result<bool, RuleError> {
        match &record.source_id {
            Some(source_id) => {
                let source = ctx
                    .resolver()
                    .lookup(ReferenceKind::HoldingsSource, source_id, ctx.current_tenant())
                    .await?;
                Ok(source.name.eq_ignore_ascii_case(MARC_SOURCE))
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl RecordHandler for HoldingsHandler {
    type Record = Holdings;
    type Kind = HoldingsKind;

    fn entity_type(&self) -> EntityType {
        EntityType::Holdings
    }

    fn dispatch(&self) -> &DispatchTable<HoldingsKind> {
        &self.dispatch
    }

    fn identifier(&self, record: &Holdings) -> String {
        record.hrid.clone().unwrap_or_else(|| record.id.clone())
    }

    async fn validate_kind(
        &self,
        kind: HoldingsKind,
        option: UpdateOptionType,
        action: &Action,
        _rule: &Rule,
        record: &Holdings,
        ctx: &ProcessingContext,
    ) -> Result<(), RuleError> {
        match kind {
            HoldingsKind::PermanentLocation | HoldingsKind::TemporaryLocation => match action.action_type {
                UpdateActionType::ClearField if kind == HoldingsKind::PermanentLocation => {
                    Err(RuleError::validation("Permanent location cannot be cleared"))
                }
                UpdateActionType::ReplaceWith => {
                    let value = required_updated(action)?;
                    ctx.resolver()
                        .lookup(ReferenceKind::Location, value, ctx.current_tenant())
                        .await
                        .map(|_| ())
                }
                _ => Ok(()),
            },
            HoldingsKind::Suppress => validate_flag(option, action),
            HoldingsKind::Note => {
                let marc_owned = option == UpdateOptionType::HoldingsNote
                    || action.action_type == UpdateActionType::ChangeType;
                if marc_owned && Self::is_marc(record, ctx).await? {
                    return Err(RuleError::validation(format!(
                        "Holdings records that have source \"{}\" cannot be changed with {} {}",
                        MARC_SOURCE, option, action.action_type
                    )));
                }
                validate_note(option, action, false)
            }
            HoldingsKind::StatisticalCode => validate_statistical_codes(action),
            HoldingsKind::ElectronicAccess => validate_electronic_access(option, action),
        }
    }

    async fn build_mutation(
        &self,
        kind: HoldingsKind,
        option: UpdateOptionType,
        action: &Action,
        _record: &Holdings,
        for_preview: bool,
        ctx: &ProcessingContext,
    ) -> Result<Mutation<Holdings>, RuleError> {
        match kind {
            HoldingsKind::PermanentLocation | HoldingsKind::TemporaryLocation => {
                let location_id = match action.action_type {
                    UpdateActionType::ReplaceWith => {
                        let value = required_updated(action)?;
                        let location =
                            resolve_for(ctx.resolver(), for_preview, ReferenceKind::Location, value, ctx.current_tenant())
                                .await?;
                        Some(location.id)
                    }
                    _ => None,
                };
                Ok(mutation(move |holdings: &mut Holdings| {
                    if kind == HoldingsKind::PermanentLocation {
                        holdings.permanent_location_id = location_id;
                    } else {
                        holdings.temporary_location_id = location_id;
                    }
                    holdings.recompute_effective_location();
                    Ok(())
                }))
            }
            HoldingsKind::Suppress => {
                let suppress = flag_value(option, action)?;
                Ok(mutation(move |holdings: &mut Holdings| {
                    holdings.discovery_suppress = Some(suppress);
                    Ok(())
                }))
            }
            HoldingsKind::Note => {
                shared::note_mutation(option, action, ReferenceKind::HoldingsNoteType, for_preview, ctx).await
            }
            HoldingsKind::StatisticalCode => shared::statistical_code_mutation(action, for_preview, ctx).await,
            HoldingsKind::ElectronicAccess => {
                shared::electronic_access_mutation(option, action, for_preview, ctx).await
            }
        }
    }

    async fn propagate(
        &self,
        original: &TenantRecord<Holdings>,
        updated: &Holdings,
        applied: &[AppliedAction],
        ctx: &ProcessingContext,
    ) -> PropagationOutcome {
        let Some(request) = PropagationRequest::from_applied(applied) else {
            return PropagationOutcome::default();
        };
        let holdings = TenantRecord::new(updated.clone(), original.tenant_id.clone());
        AssociatedRecordPropagator::new(ctx, request.operation_id)
            .from_holdings(&holdings, request)
            .await
    }
}
