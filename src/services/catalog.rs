use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::model::{Holdings, Item, TenantRecord};
use crate::processor::error::RuleError;
use crate::services::fetcher::RecordFetcher;
use crate::services::persistence::Persistence;
use crate::services::reference::{Reference, ReferenceKind, ReferenceResolver};
use crate::tenant::ConsortiumInfo;
use crate::types::TenantId;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Failed to read catalog fixture: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid JSON catalog fixture: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid YAML catalog fixture: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceEntry {
    pub tenant_id: TenantId,
    pub kind: ReferenceKind,
    pub id: String,
    pub name: String,
}

/// Serialized seed data for `InMemoryCatalog`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogFixture {
    #[serde(default)]
    pub reference_data: Vec<ReferenceEntry>,
    #[serde(default)]
    pub holdings: Vec<TenantRecord<Holdings>>,
    #[serde(default)]
    pub items: Vec<TenantRecord<Item>>,
    #[serde(default)]
    pub consortium: Option<ConsortiumInfo>,
}

impl CatalogFixture {
    /// Load from a `.json`, `.yaml` or `.yml` file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
            _ => Ok(serde_json::from_str(&content)?),
        }
    }
}

type RecordKey = (TenantId, String);

/// Catalog held in memory: reference data, holdings and items per tenant, plus
/// consortium membership. Implements every collaborator the engine consumes.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    references: DashMap<(TenantId, ReferenceKind), Vec<Reference>>,
    holdings: DashMap<RecordKey, Holdings>,
    items: DashMap<RecordKey, Item>,
    /// Keyed by central tenant
    consortia: DashMap<TenantId, ConsortiumInfo>,
    commits: AtomicUsize,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_fixture(fixture: CatalogFixture) -> Self {
        let catalog = Self::new();
        for entry in fixture.reference_data {
            catalog.insert_reference(entry.tenant_id, entry.kind, Reference::new(entry.id, entry.name));
        }
        for holdings in fixture.holdings {
            catalog.insert_holdings(holdings.tenant_id, holdings.record);
        }
        for item in fixture.items {
            catalog.insert_item(item.tenant_id, item.record);
        }
        if let Some(consortium) = fixture.consortium {
            catalog.set_consortium(consortium);
        }
        catalog
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        Ok(Self::from_fixture(CatalogFixture::from_path(path)?))
    }

    pub fn with_reference(
        self,
        tenant: impl Into<TenantId>,
        kind: ReferenceKind,
        id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        self.insert_reference(tenant.into(), kind, Reference::new(id, name));
        self
    }

    pub fn with_holdings(self, tenant: impl Into<TenantId>, holdings: Holdings) -> Self {
        self.insert_holdings(tenant.into(), holdings);
        self
    }

    pub fn with_item(self, tenant: impl Into<TenantId>, item: Item) -> Self {
        self.insert_item(tenant.into(), item);
        self
    }

    pub fn with_consortium(self, consortium: ConsortiumInfo) -> Self {
        self.set_consortium(consortium);
        self
    }

    pub fn insert_reference(&self, tenant: TenantId, kind: ReferenceKind, reference: Reference) {
        self.references.entry((tenant, kind)).or_default().push(reference);
    }

    pub fn insert_holdings(&self, tenant: TenantId, holdings: Holdings) {
        self.holdings.insert((tenant, holdings.id.clone()), holdings);
    }

    pub fn insert_item(&self, tenant: TenantId, item: Item) {
        self.items.insert((tenant, item.id.clone()), item);
    }

    pub fn set_consortium(&self, consortium: ConsortiumInfo) {
        self.consortia.insert(consortium.central_tenant.clone(), consortium);
    }

    pub fn holdings(&self, tenant: &TenantId, id: &str) -> Option<Holdings> {
        self.holdings
            .get(&(tenant.clone(), id.to_string()))
            .map(|entry| entry.value().clone())
    }

    pub fn item(&self, tenant: &TenantId, id: &str) -> Option<Item> {
        self.items
            .get(&(tenant.clone(), id.to_string()))
            .map(|entry| entry.value().clone())
    }

    /// Number of records written through `Persistence`
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    fn record_commit(&self, tenant: &TenantId, id: &str) {
        tracing::debug!("Committed {} in tenant {}", id, tenant);
        self.commits.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ReferenceResolver for InMemoryCatalog {
    async fn resolve(
        &self,
        kind: ReferenceKind,
        name_or_id: &str,
        tenant: &TenantId,
    ) -> Result<Reference, RuleError> {
        self.references
            .get(&(tenant.clone(), kind))
            .and_then(|values| {
                values
                    .iter()
                    .find(|r| r.id == name_or_id)
                    .or_else(|| values.iter().find(|r| r.name.eq_ignore_ascii_case(name_or_id)))
                    .cloned()
            })
            .ok_or_else(|| {
                RuleError::lookup(format!(
                    "{} not found by id or name: {} (tenant {})",
                    kind, name_or_id, tenant
                ))
            })
    }
}

#[async_trait]
impl RecordFetcher for InMemoryCatalog {
    async fn holdings_by_id(&self, id: &str, tenant: &TenantId) -> Result<Option<Holdings>, RuleError> {
        Ok(self.holdings(tenant, id))
    }

    async fn holdings_by_instance(
        &self,
        instance_id: &str,
        tenant: &TenantId,
    ) -> Result<Vec<Holdings>, RuleError> {
        let mut found: Vec<Holdings> = self
            .holdings
            .iter()
            .filter(|entry| &entry.key().0 == tenant && entry.value().instance_id == instance_id)
            .map(|entry| entry.value().clone())
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(found)
    }

    async fn items_by_holdings(&self, holdings_id: &str, tenant: &TenantId) -> Result<Vec<Item>, RuleError> {
        let mut found: Vec<Item> = self
            .items
            .iter()
            .filter(|entry| &entry.key().0 == tenant && entry.value().holdings_record_id == holdings_id)
            .map(|entry| entry.value().clone())
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(found)
    }

    async fn consortium(&self, tenant: &TenantId) -> Result<Option<ConsortiumInfo>, RuleError> {
        Ok(self
            .consortia
            .iter()
            .find(|entry| entry.value().contains(tenant))
            .map(|entry| entry.value().clone()))
    }

    async fn tenants_holding_instance(
        &self,
        instance_id: &str,
        consortium: &ConsortiumInfo,
    ) -> Result<Vec<TenantId>, RuleError> {
        let tenants: BTreeSet<TenantId> = self
            .holdings
            .iter()
            .filter(|entry| entry.value().instance_id == instance_id && consortium.contains(&entry.key().0))
            .map(|entry| entry.key().0.clone())
            .collect();
        Ok(tenants.into_iter().collect())
    }
}

#[async_trait]
impl Persistence for InMemoryCatalog {
    async fn commit_holdings(&self, holdings: &Holdings, tenant: &TenantId) -> Result<(), RuleError> {
        self.holdings.insert((tenant.clone(), holdings.id.clone()), holdings.clone());
        self.record_commit(tenant, &holdings.id);
        Ok(())
    }

    async fn commit_item(&self, item: &Item, tenant: &TenantId) -> Result<(), RuleError> {
        self.items.insert((tenant.clone(), item.id.clone()), item.clone());
        self.record_commit(tenant, &item.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn resolves_by_id_or_name_within_tenant() {
        let catalog = InMemoryCatalog::new()
            .with_reference("college", ReferenceKind::Location, "loc-1", "Main Library")
            .with_reference("university", ReferenceKind::Location, "loc-2", "Annex");
        let college = TenantId::new("college");

        let by_id = catalog.resolve(ReferenceKind::Location, "loc-1", &college).await.unwrap();
        let by_name = catalog.resolve(ReferenceKind::Location, "main library", &college).await.unwrap();
        assert_eq!(by_id, by_name);

        let other_tenant = catalog.resolve(ReferenceKind::Location, "loc-2", &college).await;
        assert!(matches!(other_tenant, Err(RuleError::ExternalLookup(_))));
    }

    #[tokio::test]
    async fn concurrent_commits_are_all_kept() {
        let catalog = std::sync::Arc::new(InMemoryCatalog::new());
        let college = TenantId::new("college");

        let writes = (0..16).map(|n| {
            let catalog = catalog.clone();
            let college = college.clone();
            tokio::spawn(async move {
                let item = Item {
                    id: format!("i-{}", n),
                    holdings_record_id: "h-1".into(),
                    ..Item::default()
                };
                catalog.commit_item(&item, &college).await
            })
        });
        for write in futures::future::join_all(writes).await {
            write.unwrap().unwrap();
        }

        assert_eq!(catalog.commit_count(), 16);
        assert_eq!(catalog.items_by_holdings("h-1", &college).await.unwrap().len(), 16);
    }

    #[tokio::test]
    async fn consortium_found_from_any_member() {
        let catalog = InMemoryCatalog::new()
            .with_consortium(ConsortiumInfo::new("central", vec![TenantId::new("college")]))
            .with_consortium(ConsortiumInfo::new("other-central", vec![TenantId::new("school")]));

        let found = catalog.consortium(&TenantId::new("school")).await.unwrap();
        assert_eq!(found.map(|c| c.central_tenant), Some(TenantId::new("other-central")));
        assert!(catalog.consortium(&TenantId::new("elsewhere")).await.unwrap().is_none());
    }

    #[test]
    fn loads_yaml_fixture() {
        let yaml = r#"
referenceData:
  - tenantId: college
    kind: LOAN_TYPE
    id: lt-1
    name: Can circulate
holdings:
  - tenantId: college
    record:
      id: h-1
      instanceId: inst-1
consortium:
  centralTenant: central
  memberTenants: [college]
"#;
        let fixture: CatalogFixture = serde_yaml::from_str(yaml).unwrap();
        let catalog = InMemoryCatalog::from_fixture(fixture);
        assert!(catalog.holdings(&TenantId::new("college"), "h-1").is_some());
    }
}
