use serde::{Deserialize, Serialize};

use crate::types::TenantId;

/// Central tenant and member tenants of a consortium
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsortiumInfo {
    pub central_tenant: TenantId,
    #[serde(default)]
    pub member_tenants: Vec<TenantId>,
}

impl ConsortiumInfo {
    pub fn new(central_tenant: impl Into<TenantId>, member_tenants: Vec<TenantId>) -> Self {
        Self {
            central_tenant: central_tenant.into(),
            member_tenants,
        }
    }

    pub fn is_central(&self, tenant: &TenantId) -> bool {
        &self.central_tenant == tenant
    }

    pub fn is_member(&self, tenant: &TenantId) -> bool {
        self.member_tenants.contains(tenant)
    }

    pub fn contains(&self, tenant: &TenantId) -> bool {
        self.is_central(tenant) || self.is_member(tenant)
    }
}
