//! Response shape validation
//!
//! The gateway has shipped several envelope variants per endpoint across
//! deployments. Each step owns an ordered list of [`ShapePredicate`]s,
//! newest shape first; the first predicate that matches wins. A top-level
//! `success: false` short-circuits everything and surfaces the
//! server-supplied message.

use serde_json::Value;

use crate::scenario::state::StateKey;

/// A named structural test over a parsed response body
///
/// `matches` must not mutate its input (it takes `&Value`); `extract`
/// runs only for the matching predicate and pulls identifiers out for
/// later steps.
#[derive(Clone, Copy)]
pub struct ShapePredicate {
    pub name: &'static str,
    pub matches: fn(&Value) -> bool,
    pub extract: Option<fn(&Value) -> Vec<(StateKey, String)>>,
}

impl std::fmt::Debug for ShapePredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShapePredicate")
            .field("name", &self.name)
            .field("extract", &self.extract.is_some())
            .finish()
    }
}

/// Result of validating one response body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    /// A predicate matched; extracted identifiers ride along
    Matched {
        shape: &'static str,
        extracted: Vec<(StateKey, String)>,
    },
    /// The body explicitly marked `success: false`
    ServerError { message: String },
    /// No predicate matched; `tried` lists the attempted predicate names
    NoMatch { tried: Vec<&'static str> },
}

/// Evaluate predicates in order against a response body
///
/// Idempotent: the same body and predicate list always yield the same
/// outcome.
pub fn validate(body: &Value, predicates: &[ShapePredicate]) -> Validation {
    if let Some(message) = server_error_message(body) {
        return Validation::ServerError { message };
    }

    for predicate in predicates {
        if (predicate.matches)(body) {
            let extracted = predicate
                .extract
                .map(|extract| extract(body))
                .unwrap_or_default();
            return Validation::Matched {
                shape: predicate.name,
                extracted,
            };
        }
    }

    Validation::NoMatch {
        tried: predicates.iter().map(|p| p.name).collect(),
    }
}

/// Detect the explicit error envelope: `success` equal to `false`
///
/// The server-supplied `message`/`error` field becomes the diagnostic;
/// list-valued messages are joined.
fn server_error_message(body: &Value) -> Option<String> {
    if body.get("success")?.as_bool()? {
        return None;
    }

    let raw = body
        .get("message")
        .or_else(|| body.get("error"))
        .cloned()
        .unwrap_or(Value::Null);

    let message = match raw {
        Value::String(s) => s,
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join("; "),
        Value::Null => "server reported success=false".to_string(),
        other => other.to_string(),
    };
    Some(message)
}

// Field-shape helpers shared by the per-step predicate tables.

/// `body[field]` is a string
pub fn field_is_string(body: &Value, field: &str) -> bool {
    body.get(field).map(Value::is_string).unwrap_or(false)
}

/// `body[field]` is an array
pub fn field_is_array(body: &Value, field: &str) -> bool {
    body.get(field).map(Value::is_array).unwrap_or(false)
}

/// `body[field]` is an object
pub fn field_is_object(body: &Value, field: &str) -> bool {
    body.get(field).map(Value::is_object).unwrap_or(false)
}

/// Walk a dotted path (`data.models`) through nested objects
pub fn lookup<'a>(body: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = body;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

/// String value at a dotted path
pub fn lookup_str<'a>(body: &'a Value, path: &str) -> Option<&'a str> {
    lookup(body, path).and_then(Value::as_str)
}
