use async_trait::async_trait;

use crate::model::{Holdings, Item};
use crate::processor::error::RuleError;
use crate::types::TenantId;

/// Stores dependent records updated by the associated record propagator
#[async_trait]
pub trait Persistence: Send + Sync {
    async fn commit_holdings(&self, holdings: &Holdings, tenant: &TenantId) -> Result<(), RuleError>;

    async fn commit_item(&self, item: &Item, tenant: &TenantId) -> Result<(), RuleError>;
}
