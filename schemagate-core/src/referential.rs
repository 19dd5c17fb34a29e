//! Referential rule resolution for foreign keys.
//!
//! Foreign-key actions come from two places. The primary channel only knows
//! about actions written explicitly in the table definition; the
//! `REFERENTIAL_CONSTRAINTS` view knows the effective rule for every
//! constraint. Values from the primary channel always win; the rule channel
//! only fills gaps.

use crate::adapters::SchemaInspector;
use crate::models::{ForeignKey, ReferentialAction};
use std::collections::HashMap;

/// ON UPDATE / ON DELETE pair for one constraint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReferentialRule {
    pub on_update: Option<ReferentialAction>,
    pub on_delete: Option<ReferentialAction>,
}

impl ReferentialRule {
    /// Builds a rule from the text the database reports.
    pub fn parse(update_rule: Option<&str>, delete_rule: Option<&str>) -> Self {
        Self {
            on_update: update_rule.and_then(ReferentialAction::parse),
            on_delete: delete_rule.and_then(ReferentialAction::parse),
        }
    }
}

/// Constraint name to referential rule.
pub type RuleMap = HashMap<String, ReferentialRule>;

/// Loads the referential rules of a schema.
///
/// The rule channel is supplementary: if it cannot be read, a warning is
/// logged and an empty map is returned so foreign keys keep whatever the
/// primary channel reported.
pub async fn resolve(inspector: &dyn SchemaInspector, schema: &str) -> RuleMap {
    match inspector.referential_rules(schema).await {
        Ok(rules) => {
            tracing::debug!("Loaded {} referential rules for schema '{}'", rules.len(), schema);
            rules
        }
        Err(e) => {
            tracing::warn!("Referential rules unavailable for schema '{}': {}", schema, e);
            RuleMap::new()
        }
    }
}

/// Fills missing actions of one foreign key from the rule map.
///
/// Unnamed keys and keys without an entry are left untouched.
pub fn merge_rules(foreign_key: &mut ForeignKey, rules: &RuleMap) {
    let Some(rule) = foreign_key.name.as_ref().and_then(|name| rules.get(name)) else {
        return;
    };
    if foreign_key.on_update.is_none() {
        foreign_key.on_update = rule.on_update;
    }
    if foreign_key.on_delete.is_none() {
        foreign_key.on_delete = rule.on_delete;
    }
}

/// Applies [`merge_rules`] to every foreign key of a table.
pub fn apply_rules(foreign_keys: &mut [ForeignKey], rules: &RuleMap) {
    for foreign_key in foreign_keys {
        merge_rules(foreign_key, rules);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn foreign_key(name: Option<&str>) -> ForeignKey {
        ForeignKey {
            name: name.map(str::to_string),
            columns: vec!["candidate_id".to_string()],
            ref_schema: Some("hr".to_string()),
            ref_table: "candidates".to_string(),
            ref_columns: vec!["id".to_string()],
            on_update: None,
            on_delete: None,
        }
    }

    fn rules() -> RuleMap {
        let mut rules = RuleMap::new();
        rules.insert(
            "fk_interview_candidate".to_string(),
            ReferentialRule::parse(Some("CASCADE"), Some("SET NULL")),
        );
        rules
    }

    #[test]
    fn test_fills_missing_actions() {
        let mut fk = foreign_key(Some("fk_interview_candidate"));
        merge_rules(&mut fk, &rules());
        assert_eq!(fk.on_update, Some(ReferentialAction::Cascade));
        assert_eq!(fk.on_delete, Some(ReferentialAction::SetNull));
    }

    #[test]
    fn test_never_overwrites_declared_actions() {
        let mut fk = foreign_key(Some("fk_interview_candidate"));
        fk.on_delete = Some(ReferentialAction::Restrict);
        merge_rules(&mut fk, &rules());
        assert_eq!(fk.on_update, Some(ReferentialAction::Cascade));
        assert_eq!(fk.on_delete, Some(ReferentialAction::Restrict));
    }

    #[test]
    fn test_missing_entry_is_not_an_error() {
        let mut unknown = foreign_key(Some("fk_other"));
        let mut unnamed = foreign_key(None);
        apply_rules(std::slice::from_mut(&mut unknown), &rules());
        apply_rules(std::slice::from_mut(&mut unnamed), &rules());
        assert_eq!(unknown.on_update, None);
        assert_eq!(unnamed.on_delete, None);
    }

    #[test]
    fn test_rule_parse_ignores_unknown_text() {
        let rule = ReferentialRule::parse(Some("NO ACTION"), Some("whatever"));
        assert_eq!(rule.on_update, Some(ReferentialAction::NoAction));
        assert_eq!(rule.on_delete, None);
        assert_eq!(ReferentialRule::parse(None, None), ReferentialRule::default());
    }
}
