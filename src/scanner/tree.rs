//! Tagged-variant document tree shared by the structured-document parsers.
//!
//! Both tree formats (and the markup reader) decode into this one shape so a
//! single recursive visitor can classify string-valued fields and list
//! elements without any per-format reflection.

use super::core::Scanner;
use super::types::{Finding, FindingKind};

/// A decoded document node. Maps preserve document order as key/value pairs;
/// duplicate keys are allowed (the markup reader relies on this for repeated
/// sibling elements).
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Str(String),
    List(Vec<Node>),
    Map(Vec<(String, Node)>),
    /// Numbers, booleans, nulls - never credential material on their own.
    Other,
}

impl From<serde_json::Value> for Node {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => Node::Str(s),
            serde_json::Value::Array(items) => {
                Node::List(items.into_iter().map(Node::from).collect())
            }
            serde_json::Value::Object(map) => {
                Node::Map(map.into_iter().map(|(k, v)| (k, Node::from(v))).collect())
            }
            _ => Node::Other,
        }
    }
}

impl From<serde_yml::Value> for Node {
    fn from(value: serde_yml::Value) -> Self {
        match value {
            serde_yml::Value::String(s) => Node::Str(s),
            serde_yml::Value::Sequence(items) => {
                Node::List(items.into_iter().map(Node::from).collect())
            }
            serde_yml::Value::Mapping(map) => Node::Map(
                map.into_iter()
                    .filter_map(|(k, v)| scalar_key(&k).map(|k| (k, Node::from(v))))
                    .collect(),
            ),
            _ => Node::Other,
        }
    }
}

/// Mapping keys are usually strings but may be numbers or booleans; those are
/// stringified, anything else drops the entry.
fn scalar_key(key: &serde_yml::Value) -> Option<String> {
    match key {
        serde_yml::Value::String(s) => Some(s.clone()),
        serde_yml::Value::Number(n) => Some(n.to_string()),
        serde_yml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl Scanner {
    /// Recursive walk for the two structured-document formats: string map
    /// entries classify as name+value, string list elements classify as free
    /// text under the list's key, nested maps and lists recurse. Tree
    /// findings carry no line number.
    pub(crate) fn walk_document_map(
        &self,
        file: &str,
        entries: &[(String, Node)],
        variable_kind: FindingKind,
        list_kind: FindingKind,
        out: &mut Vec<Finding>,
    ) {
        for (key, value) in entries {
            match value {
                Node::Str(s) => {
                    if let Some(m) = self.classifier.classify_named_value(key, s) {
                        out.push(Finding {
                            file: file.to_string(),
                            kind: variable_kind,
                            line: 0,
                            name: key.clone(),
                            value: s.clone(),
                            credential_category: m.category,
                        });
                    }
                }
                Node::List(items) => {
                    self.walk_document_list(file, key, items, variable_kind, list_kind, out);
                }
                Node::Map(entries) => {
                    self.walk_document_map(file, entries, variable_kind, list_kind, out);
                }
                Node::Other => {}
            }
        }
    }

    pub(crate) fn walk_document_list(
        &self,
        file: &str,
        key: &str,
        items: &[Node],
        variable_kind: FindingKind,
        list_kind: FindingKind,
        out: &mut Vec<Finding>,
    ) {
        for item in items {
            match item {
                Node::Str(s) => {
                    if let Some(m) = self.classifier.classify_free_text(s) {
                        out.push(Finding {
                            file: file.to_string(),
                            kind: list_kind,
                            line: 0,
                            name: key.to_string(),
                            value: s.clone(),
                            credential_category: m.category,
                        });
                    }
                }
                Node::Map(entries) => {
                    self.walk_document_map(file, entries, variable_kind, list_kind, out);
                }
                _ => {}
            }
        }
    }
}
