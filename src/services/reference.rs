use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::processor::error::RuleError;
use crate::types::TenantId;

/// Kinds of tenant-scoped reference data the engine resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReferenceKind {
    Location,
    LoanType,
    ItemNoteType,
    HoldingsNoteType,
    InstanceNoteType,
    PatronGroup,
    StatisticalCode,
    HoldingsSource,
    UrlRelationship,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReferenceKind::Location => "Location",
            ReferenceKind::LoanType => "Loan type",
            ReferenceKind::ItemNoteType => "Item note type",
            ReferenceKind::HoldingsNoteType => "Holdings note type",
            ReferenceKind::InstanceNoteType => "Instance note type",
            ReferenceKind::PatronGroup => "Patron group",
            ReferenceKind::StatisticalCode => "Statistical code",
            ReferenceKind::HoldingsSource => "Holdings source",
            ReferenceKind::UrlRelationship => "URL relationship",
        };
        f.write_str(name)
    }
}

/// Resolved reference value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub id: String,
    pub name: String,
}

impl Reference {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Tenant-scoped reference data lookups by id or name
#[async_trait]
pub trait ReferenceResolver: Send + Sync {
    /// Resolve for the commit path; implementations may cache the result
    async fn resolve(
        &self,
        kind: ReferenceKind,
        name_or_id: &str,
        tenant: &TenantId,
    ) -> Result<Reference, RuleError>;

    /// Resolve for the preview path without populating shared caches
    async fn lookup(
        &self,
        kind: ReferenceKind,
        name_or_id: &str,
        tenant: &TenantId,
    ) -> Result<Reference, RuleError> {
        self.resolve(kind, name_or_id, tenant).await
    }
}

/// Resolve through `lookup` when previewing and `resolve` when committing
pub async fn resolve_for(
    resolver: &dyn ReferenceResolver,
    for_preview: bool,
    kind: ReferenceKind,
    name_or_id: &str,
    tenant: &TenantId,
) -> Result<Reference, RuleError> {
    if for_preview {
        resolver.lookup(kind, name_or_id, tenant).await
    } else {
        resolver.resolve(kind, name_or_id, tenant).await
    }
}

type CacheKey = (TenantId, ReferenceKind, String);

/// Resolver wrapper caching commit-path results per tenant
pub struct CachingResolver {
    inner: Arc<dyn ReferenceResolver>,
    cache: DashMap<CacheKey, Reference>,
}

impl CachingResolver {
    pub fn new(inner: Arc<dyn ReferenceResolver>) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
        }
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    fn cached(&self, key: &CacheKey) -> Option<Reference> {
        self.cache.get(key).map(|entry| entry.value().clone())
    }
}

#[async_trait]
impl ReferenceResolver for CachingResolver {
    async fn resolve(
        &self,
        kind: ReferenceKind,
        name_or_id: &str,
        tenant: &TenantId,
    ) -> Result<Reference, RuleError> {
        let key = (tenant.clone(), kind, name_or_id.to_string());
        if let Some(hit) = self.cached(&key) {
            return Ok(hit);
        }

        let resolved = self.inner.resolve(kind, name_or_id, tenant).await?;
        self.cache.insert(key, resolved.clone());
        Ok(resolved)
    }

    async fn lookup(
        &self,
        kind: ReferenceKind,
        name_or_id: &str,
        tenant: &TenantId,
    ) -> Result<Reference, RuleError> {
        let key = (tenant.clone(), kind, name_or_id.to_string());
        match self.cached(&key) {
            Some(hit) => Ok(hit),
            None => self.inner.lookup(kind, name_or_id, tenant).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingResolver {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ReferenceResolver for CountingResolver {
        async fn resolve(
            &self,
            kind: ReferenceKind,
            name_or_id: &str,
            _tenant: &TenantId,
        ) -> Result<Reference, RuleError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match (kind, name_or_id) {
                (ReferenceKind::Location, "loc-1" | "Main Library") => Ok(Reference::new("loc-1", "Main Library")),
                _ => Err(RuleError::ExternalLookup(format!("{} {} not found", kind, name_or_id))),
            }
        }
    }

    #[tokio::test]
    async fn lookup_never_fills_the_cache() {
        let inner = Arc::new(CountingResolver::default());
        let resolver = CachingResolver::new(inner.clone());
        let tenant = TenantId::new("college");

        let found = resolver.lookup(ReferenceKind::Location, "Main Library", &tenant).await.unwrap();

        assert_eq!(found.id, "loc-1");
        assert_eq!(resolver.cached_len(), 0);
    }

    #[tokio::test]
    async fn resolve_caches_per_tenant() {
        let inner = Arc::new(CountingResolver::default());
        let resolver = CachingResolver::new(inner.clone());
        let college = TenantId::new("college");

        for _ in 0..3 {
            let found = resolver.resolve(ReferenceKind::Location, "loc-1", &college).await.unwrap();
            assert_eq!(found.name, "Main Library");
        }
        assert_eq!(resolver.cached_len(), 1);
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);

        resolver.resolve(ReferenceKind::Location, "loc-1", &TenantId::new("school")).await.unwrap();
        assert_eq!(resolver.cached_len(), 2);

        let hit = resolver.lookup(ReferenceKind::Location, "loc-1", &college).await.unwrap();
        assert_eq!(hit.id, "loc-1");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn cache_survives_a_panicking_writer() {
        let resolver = Arc::new(CachingResolver::new(Arc::new(CountingResolver::default())));
        let tenant = TenantId::new("college");

        let writer = resolver.clone();
        let panicked = std::thread::spawn(move || {
            let key = (TenantId::new("college"), ReferenceKind::Location, "held".to_string());
            let _guard = writer.cache.entry(key).or_insert_with(|| Reference::new("held", "Held"));
            panic!("writer failed while holding a cache entry");
        })
        .join();
        assert!(panicked.is_err());

        resolver.resolve(ReferenceKind::Location, "loc-1", &tenant).await.unwrap();
        assert_eq!(resolver.cached_len(), 2);
    }

    #[tokio::test]
    async fn failed_resolution_is_not_cached() {
        let resolver = CachingResolver::new(Arc::new(CountingResolver::default()));
        let tenant = TenantId::new("college");

        assert!(resolver.resolve(ReferenceKind::LoanType, "missing", &tenant).await.is_err());
        assert_eq!(resolver.cached_len(), 0);
    }
}
