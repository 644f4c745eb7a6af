//! Demo scenarios: one engine, three walks through the decision pipeline.

use std::sync::Arc;

use warden_contracts::{
    error::WardenResult,
    policy::PolicyEngineOptions,
    request::{AccessRequest, AccessResource, ContextValue, ResourceTag, CONTEXT_TAGS},
};
use warden_core::{traits::ContextEnricher, PolicyEngine};
use warden_audit::InMemoryResultProcessor;
use warden_policy::{loader, DefaultEvaluatorFactory};

/// The demo policy snapshot: a datastore service with resource policies,
/// plus tag policies that deny reads on PII-tagged resources.
const SNAPSHOT: &str = r#"
    service_name = "datastore"
    policy_version = 1

    [service_def]
    name = "datastore"
    resource_dimensions = ["database", "table"]
    access_types = ["select", "update"]

    [[policies]]
    id = 1
    name = "sales-read"
    [policies.resources.database]
    values = ["sales"]
    [policies.resources.table]
    values = ["*"]
    [[policies.allow_items]]
    users = ["alice"]
    groups = ["analysts"]
    accesses = ["select"]

    [[policies]]
    id = 2
    name = "sales-write"
    [policies.resources.database]
    values = ["sales"]
    [policies.resources.table]
    values = ["*"]
    [[policies.allow_items]]
    groups = ["etl"]
    accesses = ["select", "update"]

    [tag_policies]
    service_name = "tagging"

    [tag_policies.service_def]
    name = "tagging"
    resource_dimensions = ["tag"]
    access_types = ["datastore:select", "datastore:update"]

    [[tag_policies.policies]]
    id = 100
    name = "pii-read-deny"
    [tag_policies.policies.resources.tag]
    values = ["PII"]
    [[tag_policies.policies.deny_items]]
    groups = ["public"]
    accesses = ["datastore:select"]

    [[tag_policies.policies]]
    id = 101
    name = "public-read-allow"
    [tag_policies.policies.resources.tag]
    values = ["PUBLIC"]
    [[tag_policies.policies.allow_items]]
    groups = ["public"]
    accesses = ["datastore:select"]
"#;

/// Attaches tags based on the table being accessed, standing in for a real
/// tag store lookup: `customers` carries PII, `catalog` is PUBLIC.
struct TableTagEnricher;

impl ContextEnricher for TableTagEnricher {
    fn name(&self) -> &str {
        "table-tag-enricher"
    }

    fn enrich(&self, request: &AccessRequest) -> WardenResult<()> {
        let tags = match request.resource.value("table") {
            Some("customers") => vec![ResourceTag::new("PII")],
            Some("catalog") => vec![ResourceTag::new("PUBLIC"), ResourceTag::new("PII")],
            _ => vec![],
        };
        request.set_context_value(CONTEXT_TAGS, ContextValue::Tags(tags));
        Ok(())
    }
}

fn build_engine() -> WardenResult<PolicyEngine> {
    let snapshot = loader::load_service_policies_str(SNAPSHOT)?;
    PolicyEngine::with_enrichers(
        &snapshot,
        &PolicyEngineOptions::default(),
        &DefaultEvaluatorFactory,
        vec![],
        vec![Arc::new(TableTagEnricher)],
    )
}

fn request(user: &str, groups: &[&str], table: &str, access_type: &str) -> AccessRequest {
    let mut req = AccessRequest::new(
        AccessResource::new()
            .with_value("database", "sales")
            .with_value("table", table),
        user,
        access_type,
    );
    req.user_groups = groups.iter().map(|s| s.to_string()).collect();
    req
}

fn print_outcome(label: &str, engine: &PolicyEngine, req: &AccessRequest) {
    engine.enrich_context(req);
    let result = engine.is_access_allowed(req, None);

    let verdict = match (result.is_access_determined, result.is_allowed) {
        (true, true) => "ALLOWED",
        (true, false) => "DENIED",
        (false, _) => "DENIED (no policy matched)",
    };
    println!(
        "  {:<44} {:<26} policy={:<9} audited={}",
        label,
        verdict,
        result
            .policy_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string()),
        result.is_audited
    );
    for event in &result.tag_audit_events {
        println!(
            "    tag audit event: tag={} allowed={} policy={:?}",
            event.tag_name, event.result.is_allowed, event.result.policy_id
        );
    }
}

/// Untagged tables: the resource stage decides everything.
pub fn run_resource_access() -> WardenResult<()> {
    println!("Scenario: resource policies");
    let engine = build_engine()?;

    print_outcome("alice selects sales.orders", &engine, &request("alice", &[], "orders", "select"));
    print_outcome(
        "dave (analysts) selects sales.orders",
        &engine,
        &request("dave", &["analysts"], "orders", "select"),
    );
    print_outcome(
        "eve (etl) updates sales.orders",
        &engine,
        &request("eve", &["etl"], "orders", "update"),
    );
    print_outcome(
        "mallory selects sales.orders",
        &engine,
        &request("mallory", &[], "orders", "select"),
    );
    println!();
    Ok(())
}

/// Tagged tables: a tag verdict wins over the resource policies, and a
/// single deny outweighs any number of allows.
pub fn run_tag_override() -> WardenResult<()> {
    println!("Scenario: tag policies override resource policies");
    let engine = build_engine()?;

    print_outcome(
        "alice selects sales.customers (PII)",
        &engine,
        &request("alice", &[], "customers", "select"),
    );
    print_outcome(
        "alice selects sales.catalog (PUBLIC + PII)",
        &engine,
        &request("alice", &[], "catalog", "select"),
    );
    print_outcome(
        "eve (etl) updates sales.customers (PII)",
        &engine,
        &request("eve", &["etl"], "customers", "update"),
    );
    println!();
    Ok(())
}

/// A batch evaluated against an in-memory audit sink.
pub fn run_audit_trail() -> WardenResult<()> {
    println!("Scenario: audit trail");
    let engine = build_engine()?;
    let sink = InMemoryResultProcessor::new();

    let requests = vec![
        request("alice", &[], "orders", "select"),
        request("alice", &[], "customers", "select"),
        request("mallory", &[], "orders", "select"),
    ];
    engine.enrich_context_all(&requests);
    engine.is_access_allowed_all(&requests, Some(&sink));

    for record in sink.records() {
        println!(
            "  audit: user={:<8} resource={:<36} allowed={:<5} policy={:?}",
            record.user, record.resource, record.is_allowed, record.policy_id
        );
    }
    println!();
    Ok(())
}
