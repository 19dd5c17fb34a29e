//! In-memory schema inspector shared by the integration suites.

#![allow(dead_code)]

use async_trait::async_trait;
use schemagate_core::models::{Column, ForeignKey, Index, ReferentialAction, Row, SqlValue};
use schemagate_core::referential::{ReferentialRule, RuleMap};
use schemagate_core::{GatewayError, Result, SchemaInspector};
use std::sync::Mutex;

/// Metadata for one fake table.
#[derive(Debug, Clone, Default)]
pub struct FakeTable {
    pub name: String,
    pub comment: String,
    pub columns: Vec<Column>,
    pub primary_key: Vec<String>,
    pub foreign_keys: Vec<ForeignKey>,
    pub indexes: Vec<Index>,
    pub rows: Vec<Row>,
    pub broken: bool,
    pub unsampleable: bool,
}

impl FakeTable {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn column(mut self, name: &str, data_type: &str, nullable: bool) -> Self {
        self.columns.push(Column {
            name: name.to_string(),
            data_type: data_type.to_string(),
            nullable,
            default: None,
            autoincrement: false,
            comment: String::new(),
        });
        self
    }

    pub fn primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn foreign_key(
        mut self,
        name: &str,
        column: &str,
        ref_table: &str,
        on_delete: Option<ReferentialAction>,
    ) -> Self {
        self.foreign_keys.push(ForeignKey {
            name: Some(name.to_string()),
            columns: vec![column.to_string()],
            ref_schema: Some("hr".to_string()),
            ref_table: ref_table.to_string(),
            ref_columns: vec!["id".to_string()],
            on_update: None,
            on_delete,
        });
        self
    }

    pub fn row(mut self, values: &[(&str, SqlValue)]) -> Self {
        self.rows.push(
            values
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        );
        self
    }

    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }

    pub fn unsampleable(mut self) -> Self {
        self.unsampleable = true;
        self
    }
}

/// Schema inspector answering from memory.
#[derive(Debug, Default)]
pub struct FakeInspector {
    pub current: Option<String>,
    pub tables: Vec<FakeTable>,
    pub views: Vec<FakeTable>,
    pub rules: Option<RuleMap>,
    pub sampled: Mutex<Vec<(String, String, Vec<String>, u32)>>,
}

impl FakeInspector {
    pub fn new(current: Option<&str>) -> Self {
        Self {
            current: current.map(str::to_string),
            rules: Some(RuleMap::new()),
            ..Self::default()
        }
    }

    pub fn table(mut self, table: FakeTable) -> Self {
        self.tables.push(table);
        self
    }

    pub fn view(mut self, view: FakeTable) -> Self {
        self.views.push(view);
        self
    }

    pub fn rule(mut self, constraint: &str, on_update: &str, on_delete: &str) -> Self {
        self.rules.get_or_insert_with(RuleMap::new).insert(
            constraint.to_string(),
            ReferentialRule::parse(Some(on_update), Some(on_delete)),
        );
        self
    }

    pub fn without_rules(mut self) -> Self {
        self.rules = None;
        self
    }

    pub fn sample_calls(&self) -> Vec<(String, String, Vec<String>, u32)> {
        self.sampled.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn find(&self, table: &str) -> Result<&FakeTable> {
        let found = self
            .tables
            .iter()
            .chain(self.views.iter())
            .find(|t| t.name == table)
            .ok_or_else(|| GatewayError::table_unreadable(table, "table does not exist"))?;
        if found.broken {
            return Err(GatewayError::table_unreadable(table, "permission denied"));
        }
        Ok(found)
    }
}

#[async_trait]
impl SchemaInspector for FakeInspector {
    async fn current_schema(&self) -> Result<Option<String>> {
        Ok(self.current.clone())
    }

    async fn table_names(&self, _schema: &str) -> Result<Vec<String>> {
        Ok(self.tables.iter().map(|t| t.name.clone()).collect())
    }

    async fn view_names(&self, _schema: &str) -> Result<Vec<String>> {
        Ok(self.views.iter().map(|t| t.name.clone()).collect())
    }

    async fn table_comment(&self, _schema: &str, table: &str) -> Result<String> {
        Ok(self.find(table)?.comment.clone())
    }

    async fn columns(&self, _schema: &str, table: &str) -> Result<Vec<Column>> {
        Ok(self.find(table)?.columns.clone())
    }

    async fn primary_key(&self, _schema: &str, table: &str) -> Result<Vec<String>> {
        Ok(self.find(table)?.primary_key.clone())
    }

    async fn foreign_keys(&self, _schema: &str, table: &str) -> Result<Vec<ForeignKey>> {
        Ok(self.find(table)?.foreign_keys.clone())
    }

    async fn indexes(&self, _schema: &str, table: &str) -> Result<Vec<Index>> {
        Ok(self.find(table)?.indexes.clone())
    }

    async fn referential_rules(&self, _schema: &str) -> Result<RuleMap> {
        self.rules
            .clone()
            .ok_or_else(|| GatewayError::configuration("REFERENTIAL_CONSTRAINTS not readable"))
    }

    async fn sample_rows(
        &self,
        schema: &str,
        table: &str,
        columns: &[String],
        limit: u32,
    ) -> Result<Vec<Row>> {
        if let Ok(mut calls) = self.sampled.lock() {
            calls.push((schema.to_string(), table.to_string(), columns.to_vec(), limit));
        }
        let found = self.find(table)?;
        if found.unsampleable {
            return Err(GatewayError::table_unreadable(table, "sample query failed"));
        }
        Ok(found.rows.iter().take(limit as usize).cloned().collect())
    }
}

/// A small HR schema: candidates, interviews referencing them, and salaries.
pub fn hr_inspector() -> FakeInspector {
    FakeInspector::new(Some("hr"))
        .table(
            FakeTable::new("candidates")
                .column("id", "int(11)", false)
                .column("name", "varchar(120)", false)
                .column("contact", "text", true)
                .primary_key(&["id"])
                .row(&[
                    ("id", SqlValue::Integer(1)),
                    ("name", SqlValue::Text("Jane".to_string())),
                    (
                        "contact",
                        SqlValue::Text("contact: jane@example.com, cpf 123.456.789-01".to_string()),
                    ),
                ])
                .row(&[
                    ("id", SqlValue::Integer(2)),
                    ("name", SqlValue::Text("Joao".to_string())),
                    ("contact", SqlValue::Null),
                ]),
        )
        .table(
            FakeTable::new("interviews")
                .column("id", "int(11)", false)
                .column("candidate_id", "int(11)", false)
                .column("panel_id", "int(11)", true)
                .primary_key(&["id"])
                .foreign_key("fk_candidate", "candidate_id", "candidates", Some(ReferentialAction::Cascade))
                .foreign_key("fk_panel", "panel_id", "panels", None),
        )
        .table(
            FakeTable::new("salaries")
                .column("candidate_id", "int(11)", false)
                .column("amount", "decimal(10,2)", false),
        )
        .rule("fk_candidate", "RESTRICT", "SET NULL")
        .rule("fk_panel", "NO ACTION", "SET NULL")
}
