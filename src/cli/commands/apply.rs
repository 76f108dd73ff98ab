use anyhow::Context;
use clap::Args;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::utils::{load_document, output_report};
use crate::cli::OutputFormat;
use crate::config::config;
use crate::processor::{BatchRecord, BulkEditService, Collaborators, ProcessingContext};
use crate::rules::RuleCollection;
use crate::services::{CachingResolver, InMemoryCatalog, TracingErrorSink};
use crate::tenant::{batch_tenant_context, ActingIdentity};
use crate::types::{EntityType, TenantId};

#[derive(Args)]
pub struct ApplyArgs {
    #[arg(help = "Entity type (instance, holdings, item, user)")]
    pub entity: EntityType,
    #[arg(long, help = "Rules file (JSON or YAML)")]
    pub rules: PathBuf,
    #[arg(long, help = "Records file: an array of batch records or bare records (JSON or YAML)")]
    pub records: PathBuf,
    #[arg(long, help = "Catalog fixture with reference data, holdings, items and consortium")]
    pub catalog: Option<PathBuf>,
    #[arg(long, help = "Acting tenant; also the owner of bare records")]
    pub tenant: Option<String>,
    #[arg(long, help = "Acting user id")]
    pub user: Option<String>,
    #[arg(long = "affiliation", help = "Tenant the user is affiliated with (repeatable)")]
    pub affiliations: Vec<String>,
    #[arg(long, help = "Skip associated record propagation")]
    pub preview: bool,
    #[arg(long, help = "Write the updated records to this file as JSON")]
    pub output: Option<PathBuf>,
}

/// Accept `{tenantId, record}` entries, or bare records owned by `--tenant`
fn to_batch_records(entries: Vec<Value>, tenant: Option<&TenantId>) -> anyhow::Result<Vec<BatchRecord>> {
    entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            if entry.get("record").is_some() && entry.get("tenantId").is_some() {
                return serde_json::from_value(entry).with_context(|| format!("invalid batch record at {}", index));
            }
            let tenant = tenant.with_context(|| format!("record {} has no tenant and --tenant is not set", index))?;
            Ok(BatchRecord::new(tenant.clone(), entry))
        })
        .collect()
}

pub async fn handle(args: ApplyArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let rules: RuleCollection = load_document(&args.rules)?;
    let tenant = args.tenant.map(TenantId::new);
    let records = to_batch_records(load_document(&args.records)?, tenant.as_ref())?;

    let catalog = match &args.catalog {
        Some(path) => InMemoryCatalog::from_path(path)?,
        None => InMemoryCatalog::new(),
    };
    let catalog = Arc::new(catalog);
    let collaborators = Collaborators::from_catalog(catalog.clone())
        .with_resolver(Arc::new(CachingResolver::new(catalog.clone())));

    let identity = ActingIdentity {
        tenant,
        user_id: args.user,
        affiliations: if args.affiliations.is_empty() {
            None
        } else {
            Some(args.affiliations.into_iter().map(TenantId::new).collect())
        },
    };
    let central_tenant = config().consortium.central_tenant.clone().map(TenantId::new);
    let tenant_context = batch_tenant_context(
        identity,
        central_tenant.as_ref(),
        records.iter().map(|r| &r.tenant_id),
        collaborators.fetcher.as_ref(),
    )
    .await?;

    let mut ctx = ProcessingContext::from_config(tenant_context, collaborators);
    if args.preview {
        ctx = ctx.preview_only();
    }

    let service = BulkEditService::from_config()?;
    let report = service.process_batch(args.entity, records, &rules, &ctx).await?;
    report.report(&TracingErrorSink);

    if let Some(path) = &args.output {
        let updated: Vec<&Value> = report.items.iter().filter_map(|item| item.updated.as_ref()).collect();
        std::fs::write(path, serde_json::to_string_pretty(&updated)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!("Wrote {} updated records to {}", updated.len(), path.display());
    }

    output_report(&output_format, &report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_records_take_cli_tenant() {
        let tenant = TenantId::new("college");
        let records = to_batch_records(vec![json!({"id": "i1"})], Some(&tenant)).unwrap();
        assert_eq!(records[0].tenant_id, tenant);
    }

    #[test]
    fn wrapped_records_keep_their_tenant() {
        let entries = vec![json!({"tenantId": "school", "record": {"id": "i1"}})];
        let records = to_batch_records(entries, None).unwrap();
        assert_eq!(records[0].tenant_id, TenantId::new("school"));
    }

    #[test]
    fn bare_record_without_tenant_is_rejected() {
        assert!(to_batch_records(vec![json!({"id": "i1"})], None).is_err());
    }
}
