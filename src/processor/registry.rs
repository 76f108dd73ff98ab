// Type-erased processor registry and the batch driver built on it

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use uuid::Uuid;

use crate::model::TenantRecord;
use crate::processor::context::ProcessingContext;
use crate::processor::dispatch::{DispatchError, SupportedCombination};
use crate::processor::error::{ErrorEntry, Severity};
use crate::processor::implementations::{HoldingsHandler, InstanceHandler, ItemHandler, UserHandler};
use crate::processor::pipeline::{ProcessingResult, RuleProcessor};
use crate::processor::traits::RecordHandler;
use crate::rules::RuleCollection;
use crate::services::ErrorSink;
use crate::types::{EntityType, TenantId};

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("No processor registered for {0}")]
    UnknownEntity(EntityType),

    #[error("Record {identifier} is not a valid {entity}: {source}")]
    InvalidRecord {
        entity: EntityType,
        identifier: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize {entity} {identifier}: {source}")]
    Serialization {
        entity: EntityType,
        identifier: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

/// Processor for one record type, addressed with JSON records
#[async_trait]
pub trait DynProcessor: Send + Sync {
    fn entity_type(&self) -> EntityType;

    fn combinations(&self) -> Vec<SupportedCombination>;

    /// Every (option, action) pair of `rules` this processor cannot apply
    fn check_rules(&self, rules: &RuleCollection) -> Vec<SupportedCombination>;

    /// Process one JSON record; returns the identifier used for reporting with the result
    async fn process_json(
        &self,
        identifier: Option<&str>,
        record: &TenantRecord<Value>,
        rules: &RuleCollection,
        ctx: &ProcessingContext,
    ) -> Result<(String, ProcessingResult<Value>), BatchError>;
}

#[async_trait]
impl<H: RecordHandler> DynProcessor for RuleProcessor<H> {
    fn entity_type(&self) -> EntityType {
        self.handler().entity_type()
    }

    fn combinations(&self) -> Vec<SupportedCombination> {
        self.handler().dispatch().combinations()
    }

    fn check_rules(&self, rules: &RuleCollection) -> Vec<SupportedCombination> {
        self.handler().dispatch().unsupported_in(rules)
    }

    async fn process_json(
        &self,
        identifier: Option<&str>,
        record: &TenantRecord<Value>,
        rules: &RuleCollection,
        ctx: &ProcessingContext,
    ) -> Result<(String, ProcessingResult<Value>), BatchError> {
        let entity = self.entity_type();
        let typed: H::Record =
            serde_json::from_value(record.record.clone()).map_err(|source| BatchError::InvalidRecord {
                entity,
                identifier: identifier.unwrap_or("unknown").to_string(),
                source,
            })?;
        let identifier = identifier
            .map(str::to_string)
            .unwrap_or_else(|| self.handler().identifier(&typed));

        let typed = TenantRecord::new(typed, record.tenant_id.clone());
        let result = self.process(&identifier, &typed, rules, ctx).await;

        let to_value = |value: &H::Record| {
            serde_json::to_value(value).map_err(|source| BatchError::Serialization {
                entity,
                identifier: identifier.clone(),
                source,
            })
        };
        let converted = ProcessingResult {
            updated: to_value(&result.updated)?,
            preview: to_value(&result.preview)?,
            changed: result.changed,
            associated_changed: result.associated_changed,
            errors: result.errors,
        };
        Ok((identifier, converted))
    }
}

/// Maps each record type to its processor
#[derive(Clone, Default)]
pub struct ProcessorRegistry {
    processors: HashMap<EntityType, Arc<dyn DynProcessor>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with processors for instances, holdings, items and users
    pub fn standard() -> Result<Self, DispatchError> {
        let registry = Self::new()
            .register(RuleProcessor::new(InstanceHandler::new()?))
            .register(RuleProcessor::new(HoldingsHandler::new()?))
            .register(RuleProcessor::new(ItemHandler::new()?))
            .register(RuleProcessor::new(UserHandler::new()?));
        tracing::info!("Registered processors for {} record types", registry.processors.len());
        Ok(registry)
    }

    pub fn register<P: DynProcessor + 'static>(mut self, processor: P) -> Self {
        self.processors.insert(processor.entity_type(), Arc::new(processor));
        self
    }

    pub fn get(&self, entity: EntityType) -> Result<Arc<dyn DynProcessor>, BatchError> {
        self.processors
            .get(&entity)
            .cloned()
            .ok_or(BatchError::UnknownEntity(entity))
    }

    pub fn entity_types(&self) -> Vec<EntityType> {
        EntityType::ALL
            .iter()
            .copied()
            .filter(|entity| self.processors.contains_key(entity))
            .collect()
    }

    pub fn options(&self, entity: EntityType) -> Result<Vec<SupportedCombination>, BatchError> {
        Ok(self.get(entity)?.combinations())
    }

    pub fn check_rules(
        &self,
        entity: EntityType,
        rules: &RuleCollection,
    ) -> Result<Vec<SupportedCombination>, BatchError> {
        Ok(self.get(entity)?.check_rules(rules))
    }
}

/// One input record of a batch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRecord {
    /// Business identifier; derived from the record when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    pub tenant_id: TenantId,
    pub record: Value,
}

impl BatchRecord {
    pub fn new(tenant_id: impl Into<TenantId>, record: Value) -> Self {
        Self {
            identifier: None,
            tenant_id: tenant_id.into(),
            record,
        }
    }
}

/// Outcome of one batch record
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub identifier: String,
    pub tenant_id: TenantId,
    pub changed: bool,
    pub associated_changed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<Value>,
    pub errors: Vec<ErrorEntry>,
}

impl BatchItem {
    pub fn is_no_change(&self) -> bool {
        self.errors.iter().any(ErrorEntry::is_no_change)
    }

    pub fn has_errors(&self) -> bool {
        self.errors.iter().any(|e| e.severity == Severity::Error)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub entity_type: EntityType,
    pub total: usize,
    pub changed: usize,
    pub no_change: usize,
    pub failed: usize,
    pub items: Vec<BatchItem>,
}

impl BatchReport {
    pub fn errors(&self) -> impl Iterator<Item = &ErrorEntry> {
        self.items.iter().flat_map(|item| item.errors.iter())
    }

    pub fn report(&self, sink: &dyn ErrorSink) {
        for entry in self.errors() {
            sink.record(entry);
        }
    }
}

/// Drives one `process()` per record with bounded concurrency, keeping input order
#[derive(Clone)]
pub struct BulkEditService {
    registry: Arc<ProcessorRegistry>,
    max_concurrency: usize,
}

impl BulkEditService {
    pub fn new(registry: Arc<ProcessorRegistry>, max_concurrency: usize) -> Self {
        Self {
            registry,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Service with the standard registry and the configured concurrency
    pub fn from_config() -> Result<Self, DispatchError> {
        let registry = ProcessorRegistry::standard()?;
        Ok(Self::new(
            Arc::new(registry),
            crate::config::config().processing.max_concurrency,
        ))
    }

    pub fn registry(&self) -> &ProcessorRegistry {
        &self.registry
    }

    pub async fn process_batch(
        &self,
        entity: EntityType,
        records: Vec<BatchRecord>,
        rules: &RuleCollection,
        ctx: &ProcessingContext,
    ) -> Result<BatchReport, BatchError> {
        let start = Instant::now();
        let processor = self.registry.get(entity)?;
        let operation_id = rules.operation_id().unwrap_or_else(Uuid::nil);
        let total = records.len();

        tracing::info!(
            "Processing batch of {} {} records with {} rules (concurrency {})",
            total,
            entity,
            rules.len(),
            self.max_concurrency
        );

        let items: Vec<BatchItem> = stream::iter(records.into_iter().enumerate())
            .map(|(index, input)| {
                let processor = processor.clone();
                async move {
                    let identifier = input.identifier.clone();
                    let record = TenantRecord::new(input.record, input.tenant_id.clone());
                    match processor
                        .process_json(identifier.as_deref(), &record, rules, ctx)
                        .await
                    {
                        Ok((identifier, result)) => BatchItem {
                            identifier,
                            tenant_id: input.tenant_id,
                            changed: result.changed,
                            associated_changed: result.associated_changed,
                            updated: Some(result.updated),
                            preview: Some(result.preview),
                            errors: result.errors,
                        },
                        Err(error) => {
                            tracing::error!("Batch record {} rejected: {}", index, error);
                            let identifier = identifier.unwrap_or_else(|| record_identifier(&record.record, index));
                            BatchItem {
                                errors: vec![ErrorEntry::new(
                                    operation_id,
                                    identifier.clone(),
                                    error.to_string(),
                                    Severity::Error,
                                )],
                                identifier,
                                tenant_id: input.tenant_id,
                                changed: false,
                                associated_changed: false,
                                updated: None,
                                preview: None,
                            }
                        }
                    }
                }
            })
            .buffered(self.max_concurrency)
            .collect()
            .await;

        let changed = items.iter().filter(|item| item.changed).count();
        let no_change = items.iter().filter(|item| item.is_no_change()).count();
        let failed = items.iter().filter(|item| item.has_errors()).count();

        tracing::info!(
            "Processed {} {} records in {:?}: {} changed, {} unchanged, {} with errors",
            total,
            entity,
            start.elapsed(),
            changed,
            no_change,
            failed
        );

        Ok(BatchReport {
            entity_type: entity,
            total,
            changed,
            no_change,
            failed,
            items,
        })
    }
}

/// Best-effort identifier read from a JSON record
fn record_identifier(record: &Value, index: usize) -> String {
    ["barcode", "hrid", "username", "id"]
        .iter()
        .find_map(|key| record.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| format!("record #{}", index + 1))
}
