use std::sync::Arc;

use crate::services::{InMemoryCatalog, Persistence, RecordFetcher, ReferenceResolver};
use crate::tenant::TenantContext;
use crate::types::TenantId;

/// External collaborators shared by every record processed in a batch
#[derive(Clone)]
pub struct Collaborators {
    pub resolver: Arc<dyn ReferenceResolver>,
    pub fetcher: Arc<dyn RecordFetcher>,
    pub persistence: Arc<dyn Persistence>,
}

impl Collaborators {
    pub fn new(
        resolver: Arc<dyn ReferenceResolver>,
        fetcher: Arc<dyn RecordFetcher>,
        persistence: Arc<dyn Persistence>,
    ) -> Self {
        Self {
            resolver,
            fetcher,
            persistence,
        }
    }

    /// Use one in-memory catalog for every collaborator
    pub fn from_catalog(catalog: Arc<InMemoryCatalog>) -> Self {
        Self {
            resolver: catalog.clone(),
            fetcher: catalog.clone(),
            persistence: catalog,
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn ReferenceResolver>) -> Self {
        self.resolver = resolver;
        self
    }
}

/// Everything a validator or mutator may consult, passed explicitly with each call
#[derive(Clone)]
pub struct ProcessingContext {
    pub tenant: TenantContext,
    pub collaborators: Collaborators,
    /// Run the associated record propagator after a successful suppression change
    pub propagate_associated: bool,
    pub propagation_concurrency: usize,
    /// Nothing is committed: the updated clone resolves references like the preview does
    pub preview_only: bool,
}

impl ProcessingContext {
    pub fn new(tenant: TenantContext, collaborators: Collaborators) -> Self {
        Self {
            tenant,
            collaborators,
            propagate_associated: true,
            propagation_concurrency: 4,
            preview_only: false,
        }
    }

    /// Context following the processing config
    pub fn from_config(tenant: TenantContext, collaborators: Collaborators) -> Self {
        let processing = &crate::config::config().processing;
        Self {
            tenant,
            collaborators,
            propagate_associated: processing.propagate_associated_records,
            propagation_concurrency: processing.propagation_concurrency.max(1),
            preview_only: false,
        }
    }

    pub fn preview_only(mut self) -> Self {
        self.propagate_associated = false;
        self.preview_only = true;
        self
    }

    pub fn with_propagation(mut self, enabled: bool) -> Self {
        self.propagate_associated = enabled;
        self
    }

    /// Same collaborators bound to another tenant context
    pub fn scoped(&self, tenant: TenantContext) -> Self {
        Self {
            tenant,
            ..self.clone()
        }
    }

    /// Copy with a fresh tenant scope counter for one record
    pub fn fork(&self) -> Self {
        self.scoped(self.tenant.fork())
    }

    pub fn current_tenant(&self) -> &TenantId {
        self.tenant.current_tenant()
    }

    pub fn resolver(&self) -> &dyn ReferenceResolver {
        self.collaborators.resolver.as_ref()
    }

    pub fn fetcher(&self) -> &dyn RecordFetcher {
        self.collaborators.fetcher.as_ref()
    }

    pub fn persistence(&self) -> &dyn Persistence {
        self.collaborators.persistence.as_ref()
    }
}
