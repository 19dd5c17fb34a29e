//! Catalog builder tests against an in-memory inspector.
//!
//! This test suite covers:
//! - Schema resolution (explicit override, current database, failure)
//! - Column order and primary-key consistency
//! - Foreign-key action merging across both metadata channels
//! - Per-table failure isolation
//! - Allow-list and view filtering
//! - Sampling with and without PII masking
//! - Credential redaction in sampled values

mod common;

use common::{FakeInspector, FakeTable, hr_inspector};
use schemagate_core::masking::{CPF_PLACEHOLDER, ELLIPSIS, EMAIL_PLACEHOLDER};
use schemagate_core::models::{ReferentialAction, SqlValue};
use schemagate_core::{CatalogOptions, GatewayError, build_catalog, render, validate_catalog};

#[tokio::test]
async fn test_catalog_uses_current_schema() {
    let inspector = hr_inspector();
    let catalog = build_catalog(&inspector, None, &CatalogOptions::new())
        .await
        .expect("catalog builds");

    assert_eq!(catalog.schema, "hr");
    let names: Vec<&str> = catalog.tables.iter().map(|t| t.name()).collect();
    assert_eq!(names, vec!["candidates", "interviews", "salaries"]);
}

#[tokio::test]
async fn test_explicit_schema_overrides_current() {
    let inspector = hr_inspector();
    let catalog = build_catalog(&inspector, Some("  payroll "), &CatalogOptions::new())
        .await
        .expect("catalog builds");
    assert_eq!(catalog.schema, "payroll");
}

#[tokio::test]
async fn test_unresolvable_schema_is_fatal() {
    let inspector = FakeInspector::new(None).table(FakeTable::new("orphans"));

    let result = build_catalog(&inspector, None, &CatalogOptions::new()).await;
    assert!(matches!(result, Err(GatewayError::SchemaResolution { .. })));

    let result = build_catalog(&inspector, Some("   "), &CatalogOptions::new()).await;
    assert!(matches!(result, Err(GatewayError::SchemaResolution { .. })));
}

#[tokio::test]
async fn test_columns_keep_declaration_order() {
    let inspector = hr_inspector();
    let catalog = build_catalog(&inspector, None, &CatalogOptions::new())
        .await
        .expect("catalog builds");

    let candidates = catalog.table("candidates").expect("candidates inspected");
    assert_eq!(candidates.column_names(), vec!["id", "name", "contact"]);

    for table in catalog.inspected() {
        let columns = table.column_names();
        assert!(
            table.primary_key.iter().all(|pk| columns.contains(pk)),
            "primary key of {} must be a subset of its columns",
            table.name
        );
    }
}

#[tokio::test]
async fn test_foreign_key_rules_fill_gaps_only() {
    let inspector = hr_inspector();
    let catalog = build_catalog(&inspector, None, &CatalogOptions::new())
        .await
        .expect("catalog builds");

    let interviews = catalog.table("interviews").expect("interviews inspected");
    let by_name = |name: &str| {
        interviews
            .foreign_keys
            .iter()
            .find(|fk| fk.name.as_deref() == Some(name))
            .cloned()
            .expect("foreign key present")
    };

    // Declared ON DELETE CASCADE survives; ON UPDATE comes from the rule channel.
    let candidate = by_name("fk_candidate");
    assert_eq!(candidate.on_delete, Some(ReferentialAction::Cascade));
    assert_eq!(candidate.on_update, Some(ReferentialAction::Restrict));

    let panel = by_name("fk_panel");
    assert_eq!(panel.on_update, Some(ReferentialAction::NoAction));
    assert_eq!(panel.on_delete, Some(ReferentialAction::SetNull));
}

#[tokio::test]
async fn test_unreadable_rule_channel_keeps_declared_actions() {
    let inspector = hr_inspector().without_rules();
    let catalog = build_catalog(&inspector, None, &CatalogOptions::new())
        .await
        .expect("catalog builds");

    let interviews = catalog.table("interviews").expect("interviews inspected");
    let candidate = &interviews.foreign_keys[0];
    assert_eq!(candidate.on_delete, Some(ReferentialAction::Cascade));
    assert_eq!(candidate.on_update, None);
    assert_eq!(interviews.foreign_keys[1].on_delete, None);
}

#[tokio::test]
async fn test_table_failure_is_isolated() {
    let inspector = hr_inspector().table(FakeTable::new("secrets").broken());
    let catalog = build_catalog(&inspector, None, &CatalogOptions::new())
        .await
        .expect("one broken table does not abort the build");

    assert_eq!(catalog.tables.len(), 4);
    assert_eq!(catalog.failed_count(), 1);

    let secrets = catalog.entry("secrets").expect("entry kept");
    assert!(secrets.as_table().is_none());
    assert!(secrets.error().is_some_and(|e| e.contains("permission denied")));

    let json: serde_json::Value =
        serde_json::from_str(&render::to_json(&catalog).expect("json")).expect("parse");
    assert_eq!(json["tables"][3], serde_json::json!({
        "name": "secrets",
        "error": "Failed to inspect table 'secrets': permission denied"
    }));
    assert!(validate_catalog(&catalog).is_ok());
}

#[tokio::test]
async fn test_allow_list_restricts_tables() {
    let inspector = hr_inspector();
    let options = CatalogOptions::new().with_allowed_tables(["candidates", "interviews", "ghosts"]);
    let catalog = build_catalog(&inspector, None, &options)
        .await
        .expect("catalog builds");

    let names: Vec<&str> = catalog.tables.iter().map(|t| t.name()).collect();
    assert_eq!(names, vec!["candidates", "interviews"]);
}

#[tokio::test]
async fn test_allow_list_ignores_case() {
    let inspector = hr_inspector();
    let options = CatalogOptions::new().with_allowed_tables(["CANDIDATES", "Salaries"]);
    let catalog = build_catalog(&inspector, None, &options)
        .await
        .expect("catalog builds");

    let names: Vec<&str> = catalog.tables.iter().map(|t| t.name()).collect();
    assert_eq!(names, vec!["candidates", "salaries"]);
}

#[tokio::test]
async fn test_views_are_opt_in() {
    let inspector = hr_inspector().view(
        FakeTable::new("open_positions")
            .column("title", "varchar(80)", false),
    );

    let without = build_catalog(&inspector, None, &CatalogOptions::new())
        .await
        .expect("catalog builds");
    assert!(without.entry("open_positions").is_none());

    let with = build_catalog(&inspector, None, &CatalogOptions::new().with_views(true))
        .await
        .expect("catalog builds");
    let view = with.table("open_positions").expect("view inspected");
    assert_eq!(view.column_names(), vec!["title"]);
    assert_eq!(with.tables.last().map(|t| t.name()), Some("open_positions"));
}

#[tokio::test]
async fn test_no_sampling_by_default() {
    let inspector = hr_inspector();
    let catalog = build_catalog(&inspector, None, &CatalogOptions::new())
        .await
        .expect("catalog builds");

    assert!(inspector.sample_calls().is_empty());
    assert!(catalog.inspected().all(|t| t.sample_rows.is_none()));

    let json = render::to_json(&catalog).expect("json");
    assert!(!json.contains("sample_rows"));
}

#[tokio::test]
async fn test_sampling_requests_all_columns() {
    let inspector = hr_inspector();
    let options = CatalogOptions::new().with_sample_rows(1);
    let catalog = build_catalog(&inspector, None, &options)
        .await
        .expect("catalog builds");

    let calls = inspector.sample_calls();
    assert_eq!(calls.len(), 3);
    assert_eq!(
        calls[0],
        (
            "hr".to_string(),
            "candidates".to_string(),
            vec!["id".to_string(), "name".to_string(), "contact".to_string()],
            1
        )
    );

    let rows = catalog
        .table("candidates")
        .and_then(|t| t.sample_rows.clone())
        .expect("sampled");
    assert_eq!(rows.len(), 1);
    // Unmasked samples are passed through untouched.
    assert_eq!(
        rows[0].get("contact").and_then(SqlValue::as_text),
        Some("contact: jane@example.com, cpf 123.456.789-01")
    );
}

#[tokio::test]
async fn test_masked_samples_hide_pii() {
    let inspector = hr_inspector();
    let options = CatalogOptions::new()
        .with_sample_rows(5)
        .with_masking(true)
        .with_max_text_len(20);
    let catalog = build_catalog(&inspector, None, &options)
        .await
        .expect("catalog builds");

    let rows = catalog
        .table("candidates")
        .and_then(|t| t.sample_rows.clone())
        .expect("sampled");
    assert_eq!(rows.len(), 2);

    let contact = rows[0]
        .get("contact")
        .and_then(SqlValue::as_text)
        .expect("text value");
    assert!(!contact.contains("jane@example.com"));
    assert!(!contact.contains("123.456.789-01"));
    assert!(contact.starts_with(&format!("contact: {}", EMAIL_PLACEHOLDER)));
    assert!(contact.ends_with(ELLIPSIS));
    assert_eq!(contact.chars().count(), 21);

    assert_eq!(rows[0].get("id"), Some(&SqlValue::Integer(1)));
    assert_eq!(rows[1].get("contact"), Some(&SqlValue::Null));

    let untruncated = build_catalog(
        &inspector,
        None,
        &CatalogOptions::new().with_sample_rows(1).with_masking(true),
    )
    .await
    .expect("catalog builds");
    let contact = untruncated
        .table("candidates")
        .and_then(|t| t.sample_rows.clone())
        .and_then(|rows| rows[0].get("contact").cloned());
    assert_eq!(
        contact,
        Some(SqlValue::Text(format!(
            "contact: {}, cpf {}",
            EMAIL_PLACEHOLDER, CPF_PLACEHOLDER
        )))
    );
}

#[tokio::test]
async fn test_sample_failure_keeps_table() {
    let inspector = FakeInspector::new(Some("hr")).table(
        FakeTable::new("audit_log")
            .column("id", "bigint(20)", false)
            .unsampleable(),
    );
    let catalog = build_catalog(&inspector, None, &CatalogOptions::new().with_sample_rows(3))
        .await
        .expect("catalog builds");

    let table = catalog.table("audit_log").expect("table not marked failed");
    assert_eq!(table.sample_rows, Some(Vec::new()));
    assert_eq!(catalog.failed_count(), 0);
}

#[tokio::test]
async fn test_structured_and_rendered_counts_agree() {
    let inspector = hr_inspector().table(FakeTable::new("secrets").broken());
    let catalog = build_catalog(&inspector, None, &CatalogOptions::new())
        .await
        .expect("catalog builds");

    let md = render::to_markdown(&catalog);
    let headings = md.lines().filter(|l| l.starts_with("## ")).count();
    let fk_lines = md.lines().filter(|l| l.contains(" → ")).count();

    assert_eq!(headings, catalog.tables.len());
    assert_eq!(fk_lines, catalog.foreign_key_count());
    assert_eq!(catalog.column_count(), 8);
    assert!(md.contains(" - `candidate_id` → `candidates`(`id`) ON UPDATE RESTRICT ON DELETE CASCADE"));
}

#[tokio::test]
async fn test_sampled_credentials_are_redacted() {
    let inspector = FakeInspector::new(Some("ops")).table(
        FakeTable::new("services")
            .column("name", "varchar(40)", false)
            .column("dsn", "text", true)
            .row(&[
                ("name", SqlValue::Text("billing".to_string())),
                ("dsn", SqlValue::Text("mysql://app:pw@db/hr".to_string())),
            ]),
    );

    let catalog = build_catalog(&inspector, None, &CatalogOptions::new().with_sample_rows(1))
        .await
        .expect("catalog builds");

    let rows = catalog
        .table("services")
        .and_then(|t| t.sample_rows.clone())
        .expect("sampled");
    assert_eq!(
        rows[0].get("dsn"),
        Some(&SqlValue::Text("mysql://[REDACTED]@db/hr".to_string()))
    );
    assert_eq!(catalog.failed_count(), 0);
    assert!(validate_catalog(&catalog).is_ok());
}
