#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use uuid::Uuid;

use catalog_bulk_edit::model::{Holdings, Item, ItemStatus, NamedReference, TenantRecord};
use catalog_bulk_edit::processor::{Collaborators, ProcessingContext, ProcessingResult, RecordHandler, RuleProcessor};
use catalog_bulk_edit::rules::{Action, Rule, RuleCollection};
use catalog_bulk_edit::services::{CatalogFixture, InMemoryCatalog, ReferenceEntry, ReferenceKind};
use catalog_bulk_edit::tenant::{ConsortiumInfo, TenantContext};
use catalog_bulk_edit::types::{TenantId, UpdateActionType, UpdateOptionType};

pub const CENTRAL: &str = "central";
pub const COLLEGE: &str = "college";
pub const SCHOOL: &str = "school";

/// Reference data seeded identically into every tenant
const REFERENCES: &[(ReferenceKind, &str, &str)] = &[
    (ReferenceKind::Location, "loc-a", "Main Library"),
    (ReferenceKind::Location, "loc-b", "Annex"),
    (ReferenceKind::Location, "loc-h", "Holdings Stacks"),
    (ReferenceKind::LoanType, "lt-circ", "Can circulate"),
    (ReferenceKind::LoanType, "lt-room", "Reading room"),
    (ReferenceKind::ItemNoteType, "nt-binding", "Binding"),
    (ReferenceKind::ItemNoteType, "nt-provenance", "Provenance"),
    (ReferenceKind::HoldingsNoteType, "hnt-action", "Action note"),
    (ReferenceKind::HoldingsNoteType, "hnt-copy", "Copy note"),
    (ReferenceKind::InstanceNoteType, "int-general", "General note"),
    (ReferenceKind::InstanceNoteType, "int-x", "Local note"),
    (ReferenceKind::PatronGroup, "pg-staff", "staff"),
    (ReferenceKind::PatronGroup, "pg-grad", "graduate"),
    (ReferenceKind::StatisticalCode, "sc-books", "Books"),
    (ReferenceKind::StatisticalCode, "sc-serials", "Serials"),
    (ReferenceKind::HoldingsSource, "src-folio", "FOLIO"),
    (ReferenceKind::HoldingsSource, "src-marc", "MARC"),
    (ReferenceKind::UrlRelationship, "rel-resource", "Resource"),
    (ReferenceKind::UrlRelationship, "rel-version", "Version of resource"),
];

pub fn tenant(id: &str) -> TenantId {
    TenantId::new(id)
}

pub fn holdings(id: &str, instance_id: &str, suppressed: bool) -> Holdings {
    Holdings {
        id: id.to_string(),
        hrid: Some(format!("ho-{}", id)),
        instance_id: instance_id.to_string(),
        source_id: Some("src-folio".to_string()),
        discovery_suppress: Some(suppressed),
        permanent_location_id: Some("loc-h".to_string()),
        effective_location_id: Some("loc-h".to_string()),
        ..Holdings::default()
    }
}

pub fn item(id: &str, holdings_id: &str) -> Item {
    Item {
        id: id.to_string(),
        hrid: Some(format!("it-{}", id)),
        barcode: Some(format!("bc-{}", id)),
        holdings_record_id: holdings_id.to_string(),
        discovery_suppress: Some(false),
        status: ItemStatus::new("Available"),
        permanent_loan_type: Some(NamedReference::new("lt-circ", "Can circulate")),
        ..Item::default()
    }
}

/// Consortium fixture:
/// - `central` is the central tenant, `college` and `school` are members
/// - `inst-local` has two holdings in `college`, each with one item
/// - shared instance `inst-shared` has holdings in `college` and `school`
pub fn fixture() -> CatalogFixture {
    let mut reference_data = Vec::new();
    for owner in [CENTRAL, COLLEGE, SCHOOL] {
        for (kind, id, name) in REFERENCES {
            reference_data.push(ReferenceEntry {
                tenant_id: tenant(owner),
                kind: *kind,
                id: id.to_string(),
                name: name.to_string(),
            });
        }
    }

    CatalogFixture {
        reference_data,
        holdings: vec![
            TenantRecord::new(holdings("h-1", "inst-local", false), COLLEGE),
            TenantRecord::new(holdings("h-2", "inst-local", false), COLLEGE),
            TenantRecord::new(holdings("h-college", "inst-shared", false), COLLEGE),
            TenantRecord::new(holdings("h-school", "inst-shared", false), SCHOOL),
        ],
        items: vec![
            TenantRecord::new(item("i-1", "h-1"), COLLEGE),
            TenantRecord::new(item("i-2", "h-2"), COLLEGE),
            TenantRecord::new(item("i-college", "h-college"), COLLEGE),
            TenantRecord::new(item("i-school", "h-school"), SCHOOL),
        ],
        consortium: Some(ConsortiumInfo::new(CENTRAL, vec![tenant(COLLEGE), tenant(SCHOOL)])),
    }
}

pub fn catalog() -> Arc<InMemoryCatalog> {
    Arc::new(InMemoryCatalog::from_fixture(fixture()))
}

/// Context acting in `acting`, affiliated with every fixture tenant
pub fn context(catalog: &Arc<InMemoryCatalog>, acting: &str) -> ProcessingContext {
    let tenant = TenantContext::new(acting)
        .with_user("operator")
        .with_affiliations(vec![tenant(CENTRAL), tenant(COLLEGE), tenant(SCHOOL)]);
    ProcessingContext::new(tenant, Collaborators::from_catalog(catalog.clone()))
}

pub fn rules(option: UpdateOptionType, actions: Vec<Action>) -> RuleCollection {
    RuleCollection::single(Rule::new(Uuid::new_v4(), option, actions))
}

pub fn replace_with(value: &str) -> Action {
    Action::new(UpdateActionType::ReplaceWith).with_updated(value)
}

/// Process one record with a fresh handler
pub async fn process<H: RecordHandler>(
    handler: H,
    record: &TenantRecord<H::Record>,
    rules: &RuleCollection,
    ctx: &ProcessingContext,
) -> ProcessingResult<H::Record> {
    let processor = RuleProcessor::new(handler);
    let identifier = processor.handler().identifier(&record.record);
    processor.process(&identifier, record, rules, ctx).await
}

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let fixture_path: PathBuf = std::env::temp_dir().join(format!("bulk-edit-catalog-{}.json", port));
        std::fs::write(&fixture_path, serde_json::to_string(&fixture())?)
            .context("failed to write catalog fixture")?;

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_catalog-bulk-edit"));
        cmd.env("BULK_EDIT_PORT", port.to_string())
            .env("BULK_EDIT_CATALOG_FIXTURE", &fixture_path)
            .env("BULK_EDIT_CENTRAL_TENANT", CENTRAL)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}
