//! Declared foreign-key actions from `SHOW CREATE TABLE` output.
//!
//! The DDL only spells out `ON UPDATE` / `ON DELETE` when they were written
//! explicitly, which is exactly what the primary metadata channel should
//! report. Implicit defaults are left to the referential-rule channel.

use crate::referential::{ReferentialRule, RuleMap};
use regex::Regex;
use std::sync::OnceLock;

struct DdlPatterns {
    constraint: Regex,
    action: Regex,
}

impl DdlPatterns {
    fn instance() -> &'static Self {
        static PATTERNS: OnceLock<DdlPatterns> = OnceLock::new();
        PATTERNS.get_or_init(|| Self {
            constraint: Regex::new(
                r"(?i)CONSTRAINT\s+`((?:[^`]|``)+)`\s+FOREIGN\s+KEY\s*\([^)]*\)\s*REFERENCES\s+[^(]+\([^)]*\)((?:\s+ON\s+(?:UPDATE|DELETE)\s+(?:CASCADE|SET\s+NULL|SET\s+DEFAULT|RESTRICT|NO\s+ACTION))*)",
            )
            .expect("Invalid constraint pattern"),
            action: Regex::new(
                r"(?i)ON\s+(UPDATE|DELETE)\s+(CASCADE|SET\s+NULL|SET\s+DEFAULT|RESTRICT|NO\s+ACTION)",
            )
            .expect("Invalid action pattern"),
        })
    }
}

/// Extracts explicitly declared actions per constraint name.
///
/// Constraints without any declared action are omitted.
pub fn declared_actions(create_table: &str) -> RuleMap {
    let patterns = DdlPatterns::instance();
    let mut rules = RuleMap::new();

    for captures in patterns.constraint.captures_iter(create_table) {
        let name = captures[1].replace("``", "`");
        let mut on_update = None;
        let mut on_delete = None;

        for action in patterns.action.captures_iter(&captures[2]) {
            if action[1].eq_ignore_ascii_case("UPDATE") {
                on_update = Some(action[2].to_string());
            } else {
                on_delete = Some(action[2].to_string());
            }
        }

        let rule = ReferentialRule::parse(on_update.as_deref(), on_delete.as_deref());
        if rule != ReferentialRule::default() {
            rules.insert(name, rule);
        }
    }

    rules
}
