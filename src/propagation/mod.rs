// Associated record propagator: cascades suppression changes from instances to
// holdings and from holdings to items, across member tenants when needed

use futures::stream::{self, StreamExt};
use serde::Serialize;
use uuid::Uuid;

use crate::model::{Holdings, Instance, Item, TenantRecord};
use crate::processor::context::ProcessingContext;
use crate::processor::error::{ErrorEntry, RuleError};
use crate::processor::traits::AppliedAction;
use crate::rules::keys;
use crate::types::{TenantId, UpdateActionType, UpdateOptionType};

/// Dependent records changed by one propagation, plus per-record failures
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropagationOutcome {
    pub changed: bool,
    pub updated_holdings: Vec<TenantRecord<Holdings>>,
    pub updated_items: Vec<TenantRecord<Item>>,
    pub errors: Vec<ErrorEntry>,
}

impl PropagationOutcome {
    fn merge(&mut self, other: PropagationOutcome) {
        self.changed |= other.changed;
        self.updated_holdings.extend(other.updated_holdings);
        self.updated_items.extend(other.updated_items);
        self.errors.extend(other.errors);
    }

    fn failed(operation_id: Uuid, identifier: &str, error: &RuleError) -> Self {
        Self {
            errors: vec![ErrorEntry::from_rule_error(operation_id, identifier, error)],
            ..Self::default()
        }
    }

    fn sorted(mut self) -> Self {
        self.updated_holdings.sort_by(|a, b| a.record.id.cmp(&b.record.id));
        self.updated_items.sort_by(|a, b| a.record.id.cmp(&b.record.id));
        self
    }
}

/// Suppression change that dependent records should follow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropagationRequest {
    /// Operation of the rule that changed the flag
    pub operation_id: Uuid,
    pub suppress: bool,
    pub apply_to_holdings: bool,
    pub apply_to_items: bool,
}

impl PropagationRequest {
    /// Request derived from the last applied SUPPRESS_FROM_DISCOVERY action, if it asks for any cascade
    ///
    /// The apply-to-holdings and apply-to-items flags are read from that action's
    /// parameters, the only place a rule carries parameters.
    pub fn from_applied(applied: &[AppliedAction]) -> Option<Self> {
        let last = applied
            .iter()
            .rev()
            .find(|a| a.option() == UpdateOptionType::SuppressFromDiscovery)?;
        let suppress = match last.action_type() {
            UpdateActionType::SetToTrue => true,
            UpdateActionType::SetToFalse => false,
            _ => return None,
        };
        let request = Self {
            operation_id: last.rule.operation_id,
            suppress,
            apply_to_holdings: last.action.flag(keys::APPLY_TO_HOLDINGS),
            apply_to_items: last.action.flag(keys::APPLY_TO_ITEMS),
        };
        if request.apply_to_holdings || request.apply_to_items {
            Some(request)
        } else {
            None
        }
    }
}

fn holdings_identifier(holdings: &Holdings) -> &str {
    holdings.hrid.as_deref().unwrap_or(&holdings.id)
}

fn item_identifier(item: &Item) -> &str {
    item.barcode
        .as_deref()
        .or(item.hrid.as_deref())
        .unwrap_or(&item.id)
}

pub struct AssociatedRecordPropagator<'a> {
    ctx: &'a ProcessingContext,
    operation_id: Uuid,
}

impl<'a> AssociatedRecordPropagator<'a> {
    /// Failures are reported under `operation_id`
    pub fn new(ctx: &'a ProcessingContext, operation_id: Uuid) -> Self {
        Self { ctx, operation_id }
    }

    /// Cascade to holdings (and optionally their items) of `instance`.
    ///
    /// Shared instances fan out to every consortium tenant holding a copy; each
    /// tenant is handled in its own scope, one tenant at a time.
    pub async fn from_instance(
        &self,
        instance: &TenantRecord<Instance>,
        request: PropagationRequest,
    ) -> PropagationOutcome {
        let identifier = instance
            .record
            .hrid
            .clone()
            .unwrap_or_else(|| instance.record.id.clone());

        let tenants = match self.tenants_for(instance).await {
            Ok(tenants) => tenants,
            Err(error) => return PropagationOutcome::failed(self.operation_id, &identifier, &error),
        };

        tracing::debug!(
            "Propagating suppress={} from instance {} to tenants {:?}",
            request.suppress,
            identifier,
            tenants
        );

        let mut outcome = PropagationOutcome::default();
        for tenant in tenants {
            let instance_id = instance.record.id.as_str();
            let owner = &tenant;
            let result = self
                .in_tenant(owner, |ctx| async move {
                    let propagator = AssociatedRecordPropagator::new(&ctx, self.operation_id);
                    let holdings = ctx.fetcher().holdings_by_instance(instance_id, owner).await?;
                    Ok(propagator.update_holdings(holdings, owner, request).await)
                })
                .await;

            match result {
                Ok(tenant_outcome) => outcome.merge(tenant_outcome),
                Err(error) => {
                    tracing::warn!("Propagation to tenant {} failed for {}: {}", tenant, identifier, error);
                    outcome.merge(PropagationOutcome::failed(self.operation_id, &identifier, &error));
                }
            }
        }
        outcome.sorted()
    }

    /// Cascade to items of `holdings`
    pub async fn from_holdings(
        &self,
        holdings: &TenantRecord<Holdings>,
        request: PropagationRequest,
    ) -> PropagationOutcome {
        if !request.apply_to_items {
            return PropagationOutcome::default();
        }

        let identifier = holdings_identifier(&holdings.record).to_string();
        let tenant = &holdings.tenant_id;
        let holdings_id = holdings.record.id.as_str();
        let result = self
            .in_tenant(tenant, |ctx| async move {
                let propagator = AssociatedRecordPropagator::new(&ctx, self.operation_id);
                let items = ctx.fetcher().items_by_holdings(holdings_id, tenant).await?;
                Ok(propagator.update_items(items, tenant, request.suppress).await)
            })
            .await;

        match result {
            Ok(outcome) => outcome.sorted(),
            Err(error) => PropagationOutcome::failed(self.operation_id, &identifier, &error),
        }
    }

    async fn tenants_for(&self, instance: &TenantRecord<Instance>) -> Result<Vec<TenantId>, RuleError> {
        if !instance.record.is_shared() {
            return Ok(vec![instance.tenant_id.clone()]);
        }
        match self.ctx.fetcher().consortium(&instance.tenant_id).await? {
            Some(consortium) => {
                let tenants = self
                    .ctx
                    .fetcher()
                    .tenants_holding_instance(&instance.record.id, &consortium)
                    .await?;
                Ok(tenants)
            }
            None => Ok(vec![instance.tenant_id.clone()]),
        }
    }

    /// Run `f` bound to `tenant`, switching only when it differs from the current tenant
    async fn in_tenant<F, Fut>(&self, tenant: &TenantId, f: F) -> Result<PropagationOutcome, RuleError>
    where
        F: FnOnce(ProcessingContext) -> Fut,
        Fut: std::future::Future<Output = Result<PropagationOutcome, RuleError>>,
    {
        if tenant == self.ctx.current_tenant() {
            f(self.ctx.clone()).await
        } else {
            self.ctx
                .tenant
                .with_tenant(tenant, |scoped| f(self.ctx.scoped(scoped)))
                .await
        }
    }

    async fn update_holdings(
        &self,
        holdings: Vec<Holdings>,
        tenant: &TenantId,
        request: PropagationRequest,
    ) -> PropagationOutcome {
        let concurrency = self.ctx.propagation_concurrency.max(1);
        let outcomes: Vec<PropagationOutcome> = stream::iter(holdings)
            .map(|record| self.update_one_holdings(record, tenant, request))
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut outcome = PropagationOutcome::default();
        for one in outcomes {
            outcome.merge(one);
        }
        outcome
    }

    async fn update_one_holdings(
        &self,
        mut holdings: Holdings,
        tenant: &TenantId,
        request: PropagationRequest,
    ) -> PropagationOutcome {
        let mut outcome = PropagationOutcome::default();

        if request.apply_to_holdings && holdings.is_suppressed() != request.suppress {
            holdings.discovery_suppress = Some(request.suppress);
            match self.ctx.persistence().commit_holdings(&holdings, tenant).await {
                Ok(()) => {
                    tracing::debug!(
                        "Holdings {} suppress set to {} in {}",
                        holdings_identifier(&holdings),
                        request.suppress,
                        tenant
                    );
                    outcome.changed = true;
                    outcome
                        .updated_holdings
                        .push(TenantRecord::new(holdings.clone(), tenant.clone()));
                }
                Err(error) => {
                    let identifier = holdings_identifier(&holdings);
                    tracing::error!("Failed to update holdings {}: {}", identifier, error);
                    outcome.errors.push(ErrorEntry::from_rule_error(self.operation_id, identifier, &error));
                }
            }
        }

        if request.apply_to_items {
            match self.ctx.fetcher().items_by_holdings(&holdings.id, tenant).await {
                Ok(items) => outcome.merge(self.update_items(items, tenant, request.suppress).await),
                Err(error) => outcome.errors.push(ErrorEntry::from_rule_error(
                    self.operation_id,
                    holdings_identifier(&holdings),
                    &error,
                )),
            }
        }

        outcome
    }

    async fn update_items(&self, items: Vec<Item>, tenant: &TenantId, suppress: bool) -> PropagationOutcome {
        let mut outcome = PropagationOutcome::default();
        for mut item in items {
            if item.discovery_suppress.unwrap_or(false) == suppress {
                continue;
            }
            item.discovery_suppress = Some(suppress);
            match self.ctx.persistence().commit_item(&item, tenant).await {
                Ok(()) => {
                    tracing::debug!("Item {} suppress set to {} in {}", item_identifier(&item), suppress, tenant);
                    outcome.changed = true;
                    outcome.updated_items.push(TenantRecord::new(item, tenant.clone()));
                }
                Err(error) => {
                    let identifier = item_identifier(&item);
                    tracing::error!("Failed to update item {}: {}", identifier, error);
                    outcome.errors.push(ErrorEntry::from_rule_error(self.operation_id, identifier, &error));
                }
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Action, Rule};

    fn applied(action: Action) -> AppliedAction {
        AppliedAction {
            rule: Rule::new(Uuid::new_v4(), UpdateOptionType::SuppressFromDiscovery, vec![action.clone()]),
            action,
        }
    }

    #[test]
    fn request_requires_a_cascade_flag() {
        let plain = applied(Action::new(UpdateActionType::SetToTrue));
        assert_eq!(PropagationRequest::from_applied(&[plain]), None);

        let cascading = applied(
            Action::new(UpdateActionType::SetToFalse).with_parameter(keys::APPLY_TO_ITEMS, "true"),
        );
        let operation_id = cascading.rule.operation_id;
        assert_eq!(
            PropagationRequest::from_applied(&[cascading]),
            Some(PropagationRequest {
                operation_id,
                suppress: false,
                apply_to_holdings: false,
                apply_to_items: true,
            })
        );
    }

    #[test]
    fn last_suppression_action_wins() {
        let first = applied(Action::new(UpdateActionType::SetToTrue).with_parameter(keys::APPLY_TO_HOLDINGS, "true"));
        let second = applied(Action::new(UpdateActionType::SetToFalse).with_parameter(keys::APPLY_TO_HOLDINGS, "true"));
        let request = PropagationRequest::from_applied(&[first, second]).unwrap();
        assert!(!request.suppress);
    }
}
