use async_trait::async_trait;

use super::shared::{self, *};
use crate::model::{Instance, TenantRecord};
use crate::processor::context::ProcessingContext;
use crate::processor::dispatch::{DispatchError, DispatchTable};
use crate::processor::error::RuleError;
use crate::processor::traits::{mutation, AppliedAction, Mutation, RecordHandler};
use crate::propagation::{AssociatedRecordPropagator, PropagationOutcome, PropagationRequest};
use crate::rules::{Action, Rule};
use crate::services::ReferenceKind;
use crate::types::{EntityType, UpdateActionType, UpdateOptionType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceKind {
    DiscoverySuppress,
    StaffSuppress,
    SetForDelete,
    Note,
    StatisticalCode,
}

pub struct InstanceHandler {
    dispatch: DispatchTable<InstanceKind>,
}

impl InstanceHandler {
    pub fn new() -> Result<Self, DispatchError> {
        let dispatch = DispatchTable::builder(EntityType::Instance)
            .option(UpdateOptionType::SuppressFromDiscovery, FLAG_ACTIONS, InstanceKind::DiscoverySuppress)
            .option(
                UpdateOptionType::StaffSuppress,
                &[UpdateActionType::SetToTrue, UpdateActionType::SetToFalse],
                InstanceKind::StaffSuppress,
            )
            .option(
                UpdateOptionType::SetRecordsForDelete,
                &[UpdateActionType::SetToTrue, UpdateActionType::SetToFalse],
                InstanceKind::SetForDelete,
            )
            .option(UpdateOptionType::AdministrativeNote, NOTE_ACTIONS, InstanceKind::Note)
            .option(UpdateOptionType::InstanceNote, TYPED_NOTE_ACTIONS, InstanceKind::Note)
            .option(UpdateOptionType::StatisticalCode, STATISTICAL_CODE_ACTIONS, InstanceKind::StatisticalCode)
            .build()?;
        Ok(Self { dispatch })
    }
}

/// MARC instances own their notes in the MARC record: instance notes and note type changes are locked
fn check_marc(record: &Instance, option: UpdateOptionType, action: &Action) -> Result<(), RuleError> {
    let marc_owned = option == UpdateOptionType::InstanceNote
        || (option == UpdateOptionType::AdministrativeNote && action.action_type == UpdateActionType::ChangeType);
    if marc_owned && record.is_marc() {
        return Err(RuleError::validation(format!(
            "Instance with source {} cannot be changed with {} {}",
            record.source, option, action.action_type
        )));
    }
    Ok(())
}

#[async_trait]
impl RecordHandler for InstanceHandler {
    type Record = Instance;
    type Kind = InstanceKind;

    fn entity_type(&self) -> EntityType {
        EntityType::Instance
    }

    fn dispatch(&self) -> &DispatchTable<InstanceKind> {
        &self.dispatch
    }

    fn identifier(&self, record: &Instance) -> String {
        record.hrid.clone().unwrap_or_else(|| record.id.clone())
    }

    async fn validate_kind(
        &self,
        kind: InstanceKind,
        option: UpdateOptionType,
        action: &Action,
        _rule: &Rule,
        record: &Instance,
        _ctx: &ProcessingContext,
    ) -> Result<(), RuleError> {
        match kind {
            InstanceKind::DiscoverySuppress | InstanceKind::StaffSuppress | InstanceKind::SetForDelete => {
                validate_flag(option, action)
            }
            InstanceKind::Note => {
                check_marc(record, option, action)?;
                validate_note(option, action, false)
            }
            InstanceKind::StatisticalCode => validate_statistical_codes(action),
        }
    }

    async fn build_mutation(
        &self,
        kind: InstanceKind,
        option: UpdateOptionType,
        action: &Action,
        _record: &Instance,
        for_preview: bool,
        ctx: &ProcessingContext,
    ) -> Result<Mutation<Instance>, RuleError> {
        match kind {
            InstanceKind::DiscoverySuppress => {
                let suppress = flag_value(option, action)?;
                Ok(mutation(move |instance: &mut Instance| {
                    instance.discovery_suppress = Some(suppress);
                    Ok(())
                }))
            }
            InstanceKind::StaffSuppress => {
                let suppress = flag_value(option, action)?;
                Ok(mutation(move |instance: &mut Instance| {
                    instance.staff_suppress = Some(suppress);
                    Ok(())
                }))
            }
            InstanceKind::SetForDelete => {
                let deleted = flag_value(option, action)?;
                Ok(mutation(move |instance: &mut Instance| {
                    instance.deleted = Some(deleted);
                    if deleted {
                        instance.discovery_suppress = Some(true);
                        instance.staff_suppress = Some(true);
                    }
                    Ok(())
                }))
            }
            InstanceKind::Note => {
                shared::note_mutation(option, action, ReferenceKind::InstanceNoteType, for_preview, ctx).await
            }
            InstanceKind::StatisticalCode => shared::statistical_code_mutation(action, for_preview, ctx).await,
        }
    }

    async fn propagate(
        &self,
        original: &TenantRecord<Instance>,
        updated: &Instance,
        applied: &[AppliedAction],
        ctx: &ProcessingContext,
    ) -> PropagationOutcome {
        let Some(request) = PropagationRequest::from_applied(applied) else {
            return PropagationOutcome::default();
        };
        let instance = TenantRecord::new(updated.clone(), original.tenant_id.clone());
        AssociatedRecordPropagator::new(ctx, request.operation_id)
            .from_instance(&instance, request)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marc_instance() -> Instance {
        Instance {
            id: "inst-1".into(),
            source: "CONSORTIUM-MARC".into(),
            ..Instance::default()
        }
    }

    #[test]
    fn marc_instance_notes_are_locked() {
        let action = Action::new(UpdateActionType::RemoveAll);
        let err = check_marc(&marc_instance(), UpdateOptionType::InstanceNote, &action).unwrap_err();
        assert!(matches!(err, RuleError::Validation(_)));
    }

    #[test]
    fn marc_administrative_notes_may_be_added() {
        let action = Action::new(UpdateActionType::AddToExisting).with_updated("note");
        assert!(check_marc(&marc_instance(), UpdateOptionType::AdministrativeNote, &action).is_ok());

        let change = Action::new(UpdateActionType::ChangeType).with_updated("type-1");
        assert!(check_marc(&marc_instance(), UpdateOptionType::AdministrativeNote, &change).is_err());
    }

    #[test]
    fn dispatch_table_builds() {
        let handler = InstanceHandler::new().unwrap();
        assert!(handler
            .dispatch()
            .supports(UpdateOptionType::SetRecordsForDelete, UpdateActionType::SetToTrue));
        assert!(!handler
            .dispatch()
            .supports(UpdateOptionType::PermanentLocation, UpdateActionType::ReplaceWith));
    }
}
