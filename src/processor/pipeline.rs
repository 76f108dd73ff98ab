// Rule processor: runs every rule and action against clones of one record

use serde::Serialize;
use std::time::Instant;
use uuid::Uuid;

use crate::model::TenantRecord;
use crate::processor::context::ProcessingContext;
use crate::processor::error::{ErrorEntry, RuleError, Severity};
use crate::processor::traits::{AppliedAction, RecordHandler};
use crate::rules::{Action, Rule, RuleCollection};
use crate::services::ErrorSink;
use crate::types::TenantId;

/// Outcome of processing one record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingResult<T> {
    /// Record to persist
    pub updated: T,
    /// Record as the operator sees it before committing
    pub preview: T,
    /// Record or any of its dependent records changed
    pub changed: bool,
    /// Dependent records were updated by propagation
    pub associated_changed: bool,
    pub errors: Vec<ErrorEntry>,
}

impl<T> ProcessingResult<T> {
    pub fn is_no_change(&self) -> bool {
        self.errors.iter().any(ErrorEntry::is_no_change)
    }

    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(|e| e.severity == Severity::Error)
    }

    /// Forward every entry to `sink`
    pub fn report(&self, sink: &dyn ErrorSink) {
        for entry in &self.errors {
            sink.record(entry);
        }
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> ProcessingResult<U> {
        ProcessingResult {
            updated: f(self.updated),
            preview: f(self.preview),
            changed: self.changed,
            associated_changed: self.associated_changed,
            errors: self.errors,
        }
    }
}

/// Orchestrates validation and mutation of one record type
pub struct RuleProcessor<H: RecordHandler> {
    handler: H,
}

impl<H: RecordHandler> RuleProcessor<H> {
    pub fn new(handler: H) -> Self {
        Self { handler }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Apply `rules` to a clone of `record`.
    ///
    /// Rules run top to bottom and actions in order; a failing action is reported
    /// and processing moves on. `record` itself is never modified.
    pub async fn process(
        &self,
        identifier: &str,
        record: &TenantRecord<H::Record>,
        rules: &RuleCollection,
        ctx: &ProcessingContext,
    ) -> ProcessingResult<H::Record> {
        let start = Instant::now();
        let ctx = ctx.fork();
        let original = &record.record;
        let mut updated = original.clone();
        let mut preview = original.clone();
        let mut errors = Vec::new();
        let mut applied = Vec::new();

        tracing::debug!(
            "Processing {} {} (tenant {}) with {} rules",
            self.handler.entity_type(),
            identifier,
            record.tenant_id,
            rules.len()
        );

        for rule in rules.iter() {
            for action in rule.actions() {
                if !action.applies_to_tenant(&record.tenant_id) {
                    tracing::debug!(
                        "Skipping {} {} for {}: tenant {} not targeted",
                        rule.option(),
                        action.action_type,
                        identifier,
                        record.tenant_id
                    );
                    continue;
                }

                let result = self
                    .apply_action(rule, action, &record.tenant_id, &mut updated, &mut preview, &ctx)
                    .await;

                match result {
                    Ok(()) => {
                        tracing::debug!("Applied {} {} to {}", rule.option(), action.action_type, identifier);
                        applied.push(AppliedAction {
                            rule: rule.clone(),
                            action: action.clone(),
                        });
                    }
                    Err(error) => {
                        match error.severity() {
                            Severity::Warning => tracing::warn!(
                                "{} {} rejected for {}: {}",
                                rule.option(),
                                action.action_type,
                                identifier,
                                error
                            ),
                            Severity::Error => tracing::error!(
                                "{} {} failed for {}: {}",
                                rule.option(),
                                action.action_type,
                                identifier,
                                error
                            ),
                        }
                        errors.push(ErrorEntry::from_rule_error(rule.operation_id, identifier, &error));
                        if error.aborts_rule() {
                            break;
                        }
                    }
                }
            }
        }

        let direct_change = &updated != original;
        let mut associated_changed = false;

        if ctx.propagate_associated && !applied.is_empty() {
            let outcome = self.handler.propagate(record, &updated, &applied, &ctx).await;
            associated_changed = outcome.changed;
            errors.extend(outcome.errors);
        }

        let changed = direct_change || associated_changed;
        if !changed && !errors.iter().any(|e| e.severity == Severity::Error) {
            let operation_id = rules.operation_id().unwrap_or_else(Uuid::nil);
            errors.push(ErrorEntry::no_change(operation_id, identifier));
        }

        tracing::info!(
            "Processed {} {} in {:?}: changed={}, associated_changed={}, errors={}",
            self.handler.entity_type(),
            identifier,
            start.elapsed(),
            changed,
            associated_changed,
            errors.len()
        );

        ProcessingResult {
            updated,
            preview,
            changed,
            associated_changed,
            errors,
        }
    }

    /// Run one action, switching to the record's tenant when it differs from the current one
    async fn apply_action(
        &self,
        rule: &Rule,
        action: &Action,
        owner: &TenantId,
        updated: &mut H::Record,
        preview: &mut H::Record,
        ctx: &ProcessingContext,
    ) -> Result<(), RuleError> {
        if self.handler.supports_cross_tenant() && owner != ctx.current_tenant() {
            ctx.tenant
                .with_tenant(owner, move |scoped| async move {
                    let scoped_ctx = ctx.scoped(scoped);
                    self.run_action(rule, action, updated, preview, &scoped_ctx).await
                })
                .await
        } else {
            self.run_action(rule, action, updated, preview, ctx).await
        }
    }

    /// Validate, then mutate preview and updated clones; both or neither change.
    /// Validation runs first, so a rejected action leaves the preview untouched as well.
    async fn run_action(
        &self,
        rule: &Rule,
        action: &Action,
        updated: &mut H::Record,
        preview: &mut H::Record,
        ctx: &ProcessingContext,
    ) -> Result<(), RuleError> {
        let option = rule.option();

        self.handler.validate(option, action, rule, updated, ctx).await?;

        let preview_mutation = self.handler.updater(option, action, preview, true, ctx).await?;
        let mut next_preview = preview.clone();
        preview_mutation(&mut next_preview)?;

        let update_mutation = self.handler.updater(option, action, updated, ctx.preview_only, ctx).await?;
        let mut next_updated = updated.clone();
        update_mutation(&mut next_updated)?;

        *preview = next_preview;
        *updated = next_updated;
        Ok(())
    }
}
