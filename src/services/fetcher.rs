use async_trait::async_trait;

use crate::model::{Holdings, Item};
use crate::processor::error::RuleError;
use crate::tenant::ConsortiumInfo;
use crate::types::TenantId;

/// Supplies related records and consortium membership
#[async_trait]
pub trait RecordFetcher: Send + Sync {
    async fn holdings_by_id(&self, id: &str, tenant: &TenantId) -> Result<Option<Holdings>, RuleError>;

    async fn holdings_by_instance(
        &self,
        instance_id: &str,
        tenant: &TenantId,
    ) -> Result<Vec<Holdings>, RuleError>;

    async fn items_by_holdings(&self, holdings_id: &str, tenant: &TenantId) -> Result<Vec<Item>, RuleError>;

    /// Consortium the tenant belongs to, if any
    async fn consortium(&self, tenant: &TenantId) -> Result<Option<ConsortiumInfo>, RuleError>;

    /// Member tenants holding copies of a shared instance
    async fn tenants_holding_instance(
        &self,
        instance_id: &str,
        consortium: &ConsortiumInfo,
    ) -> Result<Vec<TenantId>, RuleError>;
}
