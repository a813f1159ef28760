//! The stream filter language (part of C6): nested field paths, scalar
//! equality, and `{$in: [...]}` set membership, matched against a revision
//! body via [`Value::get_path`].
use crate::error::PersDbError;
use crate::value::{Body, Value};

/// One leaf condition: either equality against a literal, or membership in
/// a set of literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Equals(Value),
    In(Vec<Value>),
}

/// A conjunction of per-path conditions. An attribute absent from the
/// candidate body never matches, regardless of the condition.
#[derive(Debug, Clone, Default)]
pub struct Selector {
    clauses: Vec<(String, Condition)>,
}

impl Selector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clause(mut self, path: impl Into<String>, condition: Condition) -> Self {
        self.clauses.push((path.into(), condition));
        self
    }

    /// Builds a selector from a JSON filter document of the shape
    /// `{"a.b": "x", "c": {"$in": [1, 2]}}`.
    pub fn from_json(filter: &serde_json::Value) -> Result<Self, PersDbError> {
        let obj = filter
            .as_object()
            .ok_or_else(|| selector_error("filter must be a JSON object"))?;
        let mut selector = Selector::new();
        for (path, spec) in obj {
            let condition = match spec {
                serde_json::Value::Object(m) if m.len() == 1 && m.contains_key("$in") => {
                    let serde_json::Value::Array(items) = &m["$in"] else {
                        return Err(selector_error("$in requires an array"));
                    };
                    Condition::In(items.iter().cloned().map(Value::from).collect())
                }
                other => Condition::Equals(Value::from(other.clone())),
            };
            selector = selector.with_clause(path.clone(), condition);
        }
        Ok(selector)
    }

    /// Whether `body` satisfies every clause.
    pub fn matches(&self, body: &Body) -> bool {
        let doc = Value::Object(body.clone());
        self.clauses.iter().all(|(path, condition)| {
            let Some(value) = doc.get_path(path) else {
                return false;
            };
            match condition {
                Condition::Equals(expected) => value == expected,
                Condition::In(set) => set.contains(value),
            }
        })
    }
}

fn selector_error(reason: impl Into<String>) -> PersDbError {
    PersDbError::SelectorError {
        reason: reason.into(),
    }
}
