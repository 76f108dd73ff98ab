use std::collections::BTreeSet;

use crate::processor::error::RuleError;
use crate::services::RecordFetcher;
use crate::tenant::TenantContext;
use crate::types::TenantId;

/// Who is running a batch and where they may work
#[derive(Debug, Clone, Default)]
pub struct ActingIdentity {
    pub tenant: Option<TenantId>,
    pub user_id: Option<String>,
    /// Explicit affiliations; derived from the batch when absent
    pub affiliations: Option<Vec<TenantId>>,
}

/// Build the tenant context for a batch.
///
/// The acting tenant falls back to `default_tenant`, then to the first record's tenant.
/// Without explicit affiliations the user is taken to be affiliated with every tenant
/// in the batch and every tenant of the acting tenant's consortium.
pub async fn batch_tenant_context<'a>(
    identity: ActingIdentity,
    default_tenant: Option<&TenantId>,
    record_tenants: impl IntoIterator<Item = &'a TenantId>,
    fetcher: &dyn RecordFetcher,
) -> Result<TenantContext, RuleError> {
    let record_tenants: BTreeSet<TenantId> = record_tenants.into_iter().cloned().collect();
    let acting = identity
        .tenant
        .or_else(|| default_tenant.cloned())
        .or_else(|| record_tenants.iter().next().cloned())
        .ok_or_else(|| RuleError::validation("An acting tenant is required"))?;

    let affiliations = match identity.affiliations {
        Some(explicit) => explicit,
        None => {
            let mut derived = record_tenants;
            if let Some(consortium) = fetcher.consortium(&acting).await? {
                derived.insert(consortium.central_tenant.clone());
                derived.extend(consortium.member_tenants.iter().cloned());
            }
            derived.into_iter().collect()
        }
    };

    let ctx = TenantContext::new(acting).with_affiliations(affiliations);
    Ok(match identity.user_id {
        Some(user) => ctx.with_user(user),
        None => ctx,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::InMemoryCatalog;
    use crate::tenant::ConsortiumInfo;

    #[tokio::test]
    async fn derives_affiliations_from_consortium() {
        let catalog = InMemoryCatalog::new().with_consortium(ConsortiumInfo::new(
            "central",
            vec![TenantId::new("college"), TenantId::new("school")],
        ));
        let records = [TenantId::new("central")];

        let ctx = batch_tenant_context(ActingIdentity::default(), None, records.iter(), &catalog)
            .await
            .unwrap();

        assert_eq!(ctx.acting_tenant(), &TenantId::new("central"));
        assert!(ctx.is_affiliated(&TenantId::new("school")));
    }

    #[tokio::test]
    async fn explicit_affiliations_are_kept() {
        let catalog = InMemoryCatalog::new();
        let identity = ActingIdentity {
            tenant: Some(TenantId::new("central")),
            user_id: Some("operator".into()),
            affiliations: Some(vec![]),
        };
        let records = [TenantId::new("college")];

        let ctx = batch_tenant_context(identity, None, records.iter(), &catalog)
            .await
            .unwrap();

        assert!(!ctx.is_affiliated(&TenantId::new("college")));
        assert_eq!(ctx.user_id(), Some("operator"));
    }

    #[tokio::test]
    async fn empty_batch_without_tenant_is_rejected() {
        let catalog = InMemoryCatalog::new();
        let result = batch_tenant_context(ActingIdentity::default(), None, std::iter::empty(), &catalog).await;
        assert!(result.is_err());
    }
}
