use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::Instrument;

use crate::processor::error::RuleError;
use crate::types::TenantId;

/// Execution identity for one record's processing.
///
/// The acting tenant never changes. `with_tenant` hands the closure a scoped copy
/// bound to the target tenant; the caller's copy is left as it was, and the scope
/// counter shared by both is released by `TenantScope` on every exit path.
#[derive(Debug, Clone)]
pub struct TenantContext {
    acting: TenantId,
    current: TenantId,
    user_id: Option<String>,
    affiliations: Arc<HashSet<TenantId>>,
    active_scopes: Arc<AtomicUsize>,
}

impl TenantContext {
    pub fn new(acting: impl Into<TenantId>) -> Self {
        let acting = acting.into();
        let mut affiliations = HashSet::new();
        affiliations.insert(acting.clone());
        Self {
            current: acting.clone(),
            acting,
            user_id: None,
            affiliations: Arc::new(affiliations),
            active_scopes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Tenants the acting user may work in besides the acting tenant
    pub fn with_affiliations(mut self, tenants: impl IntoIterator<Item = TenantId>) -> Self {
        let mut affiliations: HashSet<TenantId> = tenants.into_iter().collect();
        affiliations.insert(self.acting.clone());
        self.affiliations = Arc::new(affiliations);
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn acting_tenant(&self) -> &TenantId {
        &self.acting
    }

    /// Tenant whose reference data applies right now
    pub fn current_tenant(&self) -> &TenantId {
        &self.current
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn is_switched(&self) -> bool {
        self.current != self.acting
    }

    pub fn is_affiliated(&self, tenant: &TenantId) -> bool {
        tenant == &self.acting || self.affiliations.contains(tenant)
    }

    pub fn active_scopes(&self) -> usize {
        self.active_scopes.load(Ordering::SeqCst)
    }

    /// Copy with its own scope counter, for processing one record independently
    pub fn fork(&self) -> Self {
        Self {
            active_scopes: Arc::new(AtomicUsize::new(0)),
            ..self.clone()
        }
    }

    /// Enter a scope bound to `tenant`. Scopes do not nest.
    pub fn enter(&self, tenant: &TenantId) -> Result<TenantScope, RuleError> {
        if !self.is_affiliated(tenant) {
            return Err(RuleError::permission(format!(
                "User {} does not have required affiliation to edit records on the tenant {}",
                self.user_id.as_deref().unwrap_or("unknown"),
                tenant
            )));
        }
        if self
            .active_scopes
            .compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(RuleError::permission(format!(
                "Cannot switch to tenant {} while another tenant scope is active",
                tenant
            )));
        }

        tracing::trace!("Entering tenant scope {} (acting tenant {})", tenant, self.acting);
        Ok(TenantScope {
            context: Self {
                current: tenant.clone(),
                ..self.clone()
            },
        })
    }

    /// Run `f` with a context bound to `tenant`, releasing the scope afterwards
    pub async fn with_tenant<F, Fut, R>(&self, tenant: &TenantId, f: F) -> Result<R, RuleError>
    where
        F: FnOnce(TenantContext) -> Fut,
        Fut: Future<Output = Result<R, RuleError>>,
    {
        let scope = self.enter(tenant)?;
        let span = tracing::debug_span!("tenant_scope", tenant = %tenant, acting_tenant = %self.acting);
        let result = f(scope.context().clone()).instrument(span).await;
        drop(scope);
        result
    }
}

/// Guard for an active tenant scope
#[derive(Debug)]
pub struct TenantScope {
    context: TenantContext,
}

impl TenantScope {
    pub fn context(&self) -> &TenantContext {
        &self.context
    }
}

impl Drop for TenantScope {
    fn drop(&mut self) {
        self.context.active_scopes.fetch_sub(1, Ordering::SeqCst);
        tracing::trace!(
            "Leaving tenant scope {} (acting tenant {})",
            self.context.current,
            self.context.acting
        );
    }
}
