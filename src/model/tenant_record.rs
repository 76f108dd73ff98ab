use serde::{Deserialize, Serialize};

use crate::types::TenantId;

/// A fetched record together with the tenant it was fetched from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantRecord<T> {
    pub record: T,
    pub tenant_id: TenantId,
}

impl<T> TenantRecord<T> {
    pub fn new(record: T, tenant_id: impl Into<TenantId>) -> Self {
        Self {
            record,
            tenant_id: tenant_id.into(),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> TenantRecord<U> {
        TenantRecord {
            record: f(self.record),
            tenant_id: self.tenant_id,
        }
    }
}
