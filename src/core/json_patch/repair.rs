//! Best-effort repair of a known family of malformed JSON documents.
//!
//! Generated data files tend to lose the comma between specific adjacent
//! fields, and sometimes gain doubled or trailing commas. The adjacency rules
//! are data so new field pairs can be added through config. Repair is only
//! ever attempted after a strict parse has failed.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Shape of the value that precedes the missing comma.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    String,
    Number,
}

impl ValueKind {
    fn pattern(self) -> &'static str {
        match self {
            ValueKind::String => r#""(?:[^"\\\n]|\\.)*""#,
            ValueKind::Number => r"-?\d+(?:\.\d+)?(?:[eE][+-]?\d+)?",
        }
    }
}

/// `"after": <value>` followed on the next line by `"before":` needs a comma.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjacencyRule {
    pub after: String,
    pub before: String,
    #[serde(default = "default_value_kind")]
    pub value: ValueKind,
}

fn default_value_kind() -> ValueKind {
    ValueKind::String
}

impl AdjacencyRule {
    pub fn new(after: &str, before: &str, value: ValueKind) -> Self {
        Self {
            after: after.to_string(),
            before: before.to_string(),
            value,
        }
    }

    fn compile(&self) -> Result<Regex> {
        let pattern = format!(
            r#"("{}"\s*:\s*{})([ \t]*\r?\n)(\s*"{}"\s*:)"#,
            regex::escape(&self.after),
            self.value.pattern(),
            regex::escape(&self.before)
        );
        Regex::new(&pattern).map_err(|e| {
            Error::config_invalid_value(
                "propagation.repair_rules",
                Some(format!("{} → {}", self.after, self.before)),
                e.to_string(),
            )
        })
    }
}

/// Compiled repair pass.
pub struct Repairer {
    adjacency: Vec<Regex>,
    strings: Regex,
    doubled: Regex,
    trailing: Regex,
}

impl Repairer {
    pub fn new(rules: &[AdjacencyRule]) -> Result<Self> {
        let adjacency = rules
            .iter()
            .map(AdjacencyRule::compile)
            .collect::<Result<Vec<_>>>()?;

        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| Error::internal_unexpected(e.to_string()))
        };

        Ok(Self {
            adjacency,
            strings: compile(r#""(?:[^"\\\n]|\\.)*""#)?,
            doubled: compile(r",(?:\s*,)+")?,
            trailing: compile(r",(\s*[\]}])")?,
        })
    }

    /// Apply every rule once, in order. The result is not guaranteed to
    /// parse; callers must validate it.
    pub fn repair(&self, content: &str) -> String {
        let mut text = content.to_string();

        for rule in &self.adjacency {
            text = rule.replace_all(&text, "${1},${2}${3}").into_owned();
        }

        self.outside_strings(&text, |gap| {
            let gap = self.doubled.replace_all(gap, ",");
            self.trailing.replace_all(&gap, "${1}").into_owned()
        })
    }

    /// Rewrite only the text between string literals; every literal is
    /// copied through unchanged.
    fn outside_strings(&self, text: &str, rewrite: impl Fn(&str) -> String) -> String {
        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        for literal in self.strings.find_iter(text) {
            out.push_str(&rewrite(&text[last..literal.start()]));
            out.push_str(literal.as_str());
            last = literal.end();
        }
        out.push_str(&rewrite(&text[last..]));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repairer() -> Repairer {
        Repairer::new(&crate::defaults::Defaults::default().propagation.repair_rules).unwrap()
    }

    fn parses(text: &str) -> bool {
        serde_json::from_str::<serde_json::Value>(text).is_ok()
    }

    #[test]
    fn inserts_missing_commas_between_known_fields() {
        let broken = "[\n    {\n        \"aichat\": 1\n        \"id\": 7\n        \"name\": \"Mia\"\n        \"big\": \"mia_big\"\n        \"small\": \"mia_small\",\n        \"photo\": \"mia_photo\"\n        \"motto\": \"hi\"\n        \"character\": \"kind\"\n        \"introduction\": \"hello\"\n    }\n]\n";
        assert!(!parses(broken));

        let fixed = repairer().repair(broken);

        assert!(parses(&fixed), "not repaired:\n{}", fixed);
        assert!(fixed.contains("\"aichat\": 1,\n        \"id\": 7,\n"));
        assert!(fixed.contains("\"big\": \"mia_big\",\n"));
    }

    #[test]
    fn unknown_adjacency_is_left_alone() {
        let broken = "{\n  \"title\": \"a\"\n  \"subtitle\": \"b\"\n}";
        let fixed = repairer().repair(broken);
        assert_eq!(fixed, broken);
        assert!(!parses(&fixed));
    }

    #[test]
    fn collapses_doubled_and_trailing_commas() {
        let broken = "{\n  \"list\": [1, 2,],\n  \"a\": \"x\",,\n  \"b\": {\"c\": true,},\n}";
        let fixed = repairer().repair(broken);
        assert!(parses(&fixed), "not repaired:\n{}", fixed);
    }

    #[test]
    fn commas_inside_strings_survive_cleanup() {
        let fixed = repairer().repair(r#"{"label": "1,]", "note": "a,,b", "n": 2,}"#);
        assert_eq!(fixed, r#"{"label": "1,]", "note": "a,,b", "n": 2}"#);

        let value: serde_json::Value = serde_json::from_str(&fixed).unwrap();
        assert_eq!(value["label"], "1,]");
        assert_eq!(value["note"], "a,,b");
    }

    #[test]
    fn escaped_quotes_inside_values_are_respected() {
        let broken = "{\n  \"name\": \"say \\\"hi\\\"\"\n  \"big\": \"b\"\n}";
        let fixed = repairer().repair(broken);
        assert!(parses(&fixed), "not repaired:\n{}", fixed);
    }

    #[test]
    fn rules_deserialize_with_default_kind() {
        let rule: AdjacencyRule =
            serde_json::from_str(r#"{"after": "title", "before": "subtitle"}"#).unwrap();
        assert_eq!(rule.value, ValueKind::String);

        let repairer = Repairer::new(&[rule]).unwrap();
        let fixed = repairer.repair("{\n  \"title\": \"a\"\n  \"subtitle\": \"b\"\n}");
        assert!(parses(&fixed));
    }
}
