//! Declarative rule-set evaluation for configuration documents.
//!
//! The rule set is a JSON Schema-style document restricted to the constraint
//! shapes the scanner actually uses: `type`, `const`, `pattern`, `required`,
//! plus `properties`/`items` traversal. Evaluation walks the rule document
//! in declaration order, so re-validating the same document against the same
//! rule set always yields the same violations in the same order.
//!
//! Keyword applicability follows JSON Schema: `required` and `properties`
//! apply only to objects, `items` only to arrays, `pattern` only to strings.
//! `type` and `const` apply to any value. String values are trimmed of
//! surrounding whitespace before pattern matching, so a padded
//! `" https://..."` URL still counts as HTTPS.

use regex::Regex;
use serde_json::Value;

/// One violated constraint.
///
/// `title` is the owning rule's title, taken verbatim from the rule
/// document (inherited from the nearest ancestor when a rule carries none);
/// `detail` is the engine's description of the violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub title: String,
    pub detail: String,
}

impl Violation {
    /// The finding text embedded in plugin reports.
    pub fn message(&self) -> String {
        format!("{}; {}", self.title, self.detail)
    }
}

/// A parsed rule set.
pub struct RuleSet {
    root: Value,
}

impl RuleSet {
    /// Parses a rule document from JSON text.
    ///
    /// # Errors
    ///
    /// Returns the underlying JSON error when the document is malformed.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let root = serde_json::from_str(text)?;
        Ok(Self { root })
    }

    /// The `version` field of the rule document, when present.
    pub fn version(&self) -> Option<&str> {
        self.root.get("version").and_then(Value::as_str)
    }

    /// Evaluates `document` against the rule set, returning one violation
    /// per failed constraint in the rule set's declared evaluation order.
    pub fn validate(&self, document: &Value) -> Vec<Violation> {
        let mut violations = Vec::new();
        check_node(&self.root, document, None, &mut violations);
        violations
    }
}

fn check_node(schema: &Value, value: &Value, inherited: Option<&str>, out: &mut Vec<Violation>) {
    let title = schema
        .get("title")
        .and_then(Value::as_str)
        .or(inherited)
        .unwrap_or("");

    if let Some(expected) = schema.get("type").and_then(Value::as_str) {
        if !type_matches(expected, value) {
            out.push(Violation {
                title: title.to_owned(),
                detail: format!("{value} is not of type '{expected}'"),
            });
        }
    }

    if let Some(expected) = schema.get("const") {
        if value != expected {
            out.push(Violation {
                title: title.to_owned(),
                detail: format!("{expected} was expected"),
            });
        }
    }

    if let (Some(pattern), Some(text)) = (
        schema.get("pattern").and_then(Value::as_str),
        value.as_str(),
    ) {
        if let Ok(re) = Regex::new(pattern) {
            if !re.is_match(text.trim()) {
                out.push(Violation {
                    title: title.to_owned(),
                    detail: format!("{value} does not match '{pattern}'"),
                });
            }
        }
    }

    if let Some(object) = value.as_object() {
        if let Some(required) = schema.get("required").and_then(Value::as_array) {
            for name in required.iter().filter_map(Value::as_str) {
                if !object.contains_key(name) {
                    out.push(Violation {
                        title: title.to_owned(),
                        detail: format!("'{name}' is a required property"),
                    });
                }
            }
        }
        if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
            for (name, subschema) in properties {
                if let Some(child) = object.get(name) {
                    check_node(subschema, child, Some(title), out);
                }
            }
        }
    }

    if let Some(items) = value.as_array() {
        if let Some(item_schema) = schema.get("items") {
            for child in items {
                check_node(item_schema, child, Some(title), out);
            }
        }
    }
}

fn type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "object" => value.is_object(),
        "array" => value.is_array(),
        "string" => value.is_string(),
        "boolean" => value.is_boolean(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "null" => value.is_null(),
        _ => false,
    }
}
