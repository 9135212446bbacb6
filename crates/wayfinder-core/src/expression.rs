//! JEXL expression evaluator for transition `when` clauses, instruction
//! conditions, and the config template.
//!
//! Wraps `jexl_eval::Evaluator` with a fixed set of transforms and exposes the
//! two evaluation modes the wizard needs:
//!
//! - [`ExpressionEvaluator::condition`] for branching. A missing condition
//!   holds; a condition that fails to parse or evaluate does NOT hold. Broken
//!   conditions disable their branch or fragment instead of aborting the walk.
//! - [`ExpressionEvaluator::evaluate`] for the config template, where errors
//!   propagate to the caller.
//!
//! **Security note:** the state is always passed as the context object, never
//! interpolated into expression strings.

use serde_json::{json, Value};
use tracing::debug;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors that can occur during expression evaluation.
#[derive(Debug, thiserror::Error)]
pub enum ExpressionError {
    #[error("expression evaluation failed: {0}")]
    EvalFailed(String),

    #[error("invalid context: {0}")]
    InvalidContext(String),
}

// ---------------------------------------------------------------------------
// ExpressionEvaluator
// ---------------------------------------------------------------------------

/// JEXL expression evaluator with the wizard's transforms pre-registered.
///
/// Besides the string transforms, three array transforms cover predicates
/// over lists in state:
/// - `items|some('kind', 'usb')` -- any element whose `kind` equals `'usb'`
/// - `items|filterBy('kind', 'usb')` -- the matching elements
/// - `items|pluck('kind')` -- the `kind` of every element
pub struct ExpressionEvaluator {
    evaluator: jexl_eval::Evaluator<'static>,
}

impl ExpressionEvaluator {
    /// Create a new evaluator with all transforms registered.
    pub fn new() -> Self {
        let evaluator = jexl_eval::Evaluator::new()
            // String transforms
            .with_transform("lower", |args: &[Value]| {
                let s = args.first().and_then(|v| v.as_str()).unwrap_or("");
                Ok(json!(s.to_lowercase()))
            })
            .with_transform("upper", |args: &[Value]| {
                let s = args.first().and_then(|v| v.as_str()).unwrap_or("");
                Ok(json!(s.to_uppercase()))
            })
            .with_transform("trim", |args: &[Value]| {
                let s = args.first().and_then(|v| v.as_str()).unwrap_or("");
                Ok(json!(s.trim()))
            })
            .with_transform("split", |args: &[Value]| {
                let s = args.first().and_then(|v| v.as_str()).unwrap_or("");
                let delimiter = args.get(1).and_then(|v| v.as_str()).unwrap_or(",");
                let parts: Vec<&str> = s.split(delimiter).collect();
                Ok(json!(parts))
            })
            .with_transform("contains", |args: &[Value]| {
                let subject = args.first().cloned().unwrap_or(Value::Null);
                let needle = args.get(1).cloned().unwrap_or(Value::Null);
                let found = match (&subject, &needle) {
                    (Value::String(s), Value::String(n)) => s.contains(n.as_str()),
                    (Value::Array(items), _) => items.iter().any(|i| loosely_equal(i, &needle)),
                    _ => false,
                };
                Ok(json!(found))
            })
            .with_transform("startsWith", |args: &[Value]| {
                let subject = args.first().and_then(|v| v.as_str()).unwrap_or("");
                let prefix = args.get(1).and_then(|v| v.as_str()).unwrap_or("");
                Ok(json!(subject.starts_with(prefix)))
            })
            .with_transform("endsWith", |args: &[Value]| {
                let subject = args.first().and_then(|v| v.as_str()).unwrap_or("");
                let suffix = args.get(1).and_then(|v| v.as_str()).unwrap_or("");
                Ok(json!(subject.ends_with(suffix)))
            })
            // Boolean transforms
            .with_transform("not", |args: &[Value]| {
                let val = args.first().cloned().unwrap_or(Value::Null);
                Ok(json!(!Self::value_to_bool(&val)))
            })
            // Length transform (works on strings, arrays, and objects)
            .with_transform("length", |args: &[Value]| {
                let len = match args.first() {
                    Some(Value::String(s)) => s.chars().count(),
                    Some(Value::Array(a)) => a.len(),
                    Some(Value::Object(o)) => o.len(),
                    _ => 0,
                };
                Ok(json!(len as f64))
            })
            // Array predicates
            .with_transform("some", |args: &[Value]| {
                let items = array_arg(args);
                let key = args.get(1).and_then(|v| v.as_str()).unwrap_or("");
                let expected = args.get(2).cloned().unwrap_or(Value::Bool(true));
                let found = items
                    .iter()
                    .any(|item| item.get(key).is_some_and(|v| loosely_equal(v, &expected)));
                Ok(json!(found))
            })
            .with_transform("filterBy", |args: &[Value]| {
                let items = array_arg(args);
                let key = args.get(1).and_then(|v| v.as_str()).unwrap_or("");
                let expected = args.get(2).cloned().unwrap_or(Value::Bool(true));
                let matching: Vec<Value> = items
                    .iter()
                    .filter(|item| item.get(key).is_some_and(|v| loosely_equal(v, &expected)))
                    .cloned()
                    .collect();
                Ok(Value::Array(matching))
            })
            .with_transform("pluck", |args: &[Value]| {
                let items = array_arg(args);
                let key = args.get(1).and_then(|v| v.as_str()).unwrap_or("");
                let values: Vec<Value> = items
                    .iter()
                    .map(|item| item.get(key).cloned().unwrap_or(Value::Null))
                    .collect();
                Ok(Value::Array(values))
            });

        Self { evaluator }
    }

    /// Evaluate a branching condition against `context`.
    ///
    /// - `None` or a blank expression holds.
    /// - Parse and evaluation failures do not hold; they are logged at debug
    ///   level and never surfaced.
    /// - Results are coerced with JavaScript-like truthiness.
    pub fn condition(&self, expression: Option<&str>, context: &Value) -> bool {
        let Some(expression) = expression.map(str::trim).filter(|e| !e.is_empty()) else {
            return true;
        };

        match self.evaluate(expression, context) {
            Ok(value) => Self::value_to_bool(&value),
            Err(e) => {
                debug!(expression, error = %e, "Condition failed to evaluate, treating as false");
                false
            }
        }
    }

    /// Evaluate an expression and return the raw JSON value.
    ///
    /// The `context` must be a JSON object.
    pub fn evaluate(&self, expression: &str, context: &Value) -> Result<Value, ExpressionError> {
        if !context.is_object() {
            return Err(ExpressionError::InvalidContext(
                "context must be a JSON object".to_string(),
            ));
        }

        self.evaluator
            .eval_in_context(expression, context)
            .map_err(|e| ExpressionError::EvalFailed(e.to_string()))
    }

    /// Coerce a JSON value to boolean using JavaScript-like truthiness.
    pub fn value_to_bool(value: &Value) -> bool {
        match value {
            Value::Bool(b) => *b,
            Value::Null => false,
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Object(_) => true,
        }
    }
}

impl Default for ExpressionEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

fn array_arg(args: &[Value]) -> &[Value] {
    args.first()
        .and_then(|v| v.as_array())
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Equality that treats `5` and `5.0` as the same number.
fn loosely_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
