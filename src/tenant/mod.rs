// Tenant identity passed explicitly through validation and mutation

pub mod affiliation;
pub mod consortium;
pub mod context;

pub use affiliation::{batch_tenant_context, ActingIdentity};
pub use consortium::ConsortiumInfo;
pub use context::{TenantContext, TenantScope};
