use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

use crate::model::TenantRecord;
use crate::processor::context::ProcessingContext;
use crate::processor::dispatch::DispatchTable;
use crate::processor::error::RuleError;
use crate::propagation::PropagationOutcome;
use crate::rules::{Action, Rule};
use crate::types::{EntityType, UpdateActionType, UpdateOptionType};

/// Mutation closure produced by an updater; applied to a clone of the record
pub type Mutation<T> = Box<dyn FnOnce(&mut T) -> Result<(), RuleError> + Send>;

pub fn mutation<T, F>(f: F) -> Mutation<T>
where
    F: FnOnce(&mut T) -> Result<(), RuleError> + Send + 'static,
{
    Box::new(f)
}

/// Mutation that never touches the record and always fails with `error`
pub fn failing<T>(error: RuleError) -> Mutation<T> {
    Box::new(move |_| Err(error))
}

/// Action that validated and applied without error
#[derive(Debug, Clone)]
pub struct AppliedAction {
    pub rule: Rule,
    pub action: Action,
}

impl AppliedAction {
    pub fn option(&self) -> UpdateOptionType {
        self.rule.option()
    }

    pub fn action_type(&self) -> UpdateActionType {
        self.action.action_type
    }
}

/// Per record type validator and mutator set.
///
/// `validate` is a pure precondition check. `updater` separates construction
/// (which may consult tenant-scoped reference data) from application of the
/// returned closure. Both look up the mutation kind in the handler's dispatch
/// table; pairs missing from the table yield a mutator failing with
/// `RuleError::UnsupportedCombination`.
#[async_trait]
pub trait RecordHandler: Send + Sync + 'static {
    type Record: Clone + PartialEq + Debug + Send + Sync + Serialize + DeserializeOwned + 'static;
    type Kind: Copy + Debug + Send + Sync + 'static;

    fn entity_type(&self) -> EntityType;

    fn dispatch(&self) -> &DispatchTable<Self::Kind>;

    /// Whether records owned by another tenant are edited under that tenant's identity
    fn supports_cross_tenant(&self) -> bool {
        true
    }

    /// Business identifier used when reporting failures
    fn identifier(&self, record: &Self::Record) -> String;

    async fn validate_kind(
        &self,
        kind: Self::Kind,
        option: UpdateOptionType,
        action: &Action,
        rule: &Rule,
        record: &Self::Record,
        ctx: &ProcessingContext,
    ) -> Result<(), RuleError>;

    async fn build_mutation(
        &self,
        kind: Self::Kind,
        option: UpdateOptionType,
        action: &Action,
        record: &Self::Record,
        for_preview: bool,
        ctx: &ProcessingContext,
    ) -> Result<Mutation<Self::Record>, RuleError>;

    async fn validate(
        &self,
        option: UpdateOptionType,
        action: &Action,
        rule: &Rule,
        record: &Self::Record,
        ctx: &ProcessingContext,
    ) -> Result<(), RuleError> {
        match self.dispatch().get(option, action.action_type) {
            Some(kind) => self.validate_kind(kind, option, action, rule, record, ctx).await,
            None => Ok(()),
        }
    }

    async fn updater(
        &self,
        option: UpdateOptionType,
        action: &Action,
        record: &Self::Record,
        for_preview: bool,
        ctx: &ProcessingContext,
    ) -> Result<Mutation<Self::Record>, RuleError> {
        match self.dispatch().get(option, action.action_type) {
            Some(kind) => {
                self.build_mutation(kind, option, action, record, for_preview, ctx)
                    .await
            }
            None => Ok(failing(RuleError::unsupported(option, action.action_type))),
        }
    }

    /// Cascade edits to dependent records after all rules ran
    async fn propagate(
        &self,
        _original: &TenantRecord<Self::Record>,
        _updated: &Self::Record,
        _applied: &[AppliedAction],
        _ctx: &ProcessingContext,
    ) -> PropagationOutcome {
        PropagationOutcome::default()
    }
}
