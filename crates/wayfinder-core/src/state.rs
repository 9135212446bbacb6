//! The accumulated answer tree.
//!
//! `State` wraps a single JSON object. Answers are written at dotted
//! [`StateKey`] paths; missing intermediate objects are created on the way.
//! A write never replaces a scalar that sits in the middle of its path: that
//! is reported as [`StateError::PathConflict`].

use serde::Serialize;
use serde_json::{Map, Value};

use wayfinder_types::error::StateError;
use wayfinder_types::flow::StateKey;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct State {
    root: Value,
}

impl State {
    /// An empty state (`{}`).
    pub fn new() -> Self {
        Self {
            root: Value::Object(Map::new()),
        }
    }

    /// Write `value` at `key`, creating intermediate objects as needed.
    ///
    /// Writing the same key again overwrites the previous value.
    pub fn set(&mut self, key: &StateKey, value: Value) -> Result<(), StateError> {
        let segments: Vec<&str> = key.segments().collect();
        let Some((last, parents)) = segments.split_last() else {
            return Ok(());
        };

        let mut node = &mut self.root;
        for segment in parents {
            let Value::Object(map) = node else {
                return Err(conflict(key, segment));
            };
            node = map
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !node.is_object() {
                return Err(conflict(key, segment));
            }
        }

        match node {
            Value::Object(map) => {
                map.insert(last.to_string(), value);
                Ok(())
            }
            _ => Err(conflict(key, last)),
        }
    }

    /// Read the value at a dotted path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(&self.root, |node, segment| node.as_object()?.get(segment))
    }

    /// The whole tree, as handed to expression evaluation.
    pub fn as_value(&self) -> &Value {
        &self.root
    }

    pub fn into_value(self) -> Value {
        self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.as_object().is_none_or(Map::is_empty)
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

fn conflict(key: &StateKey, segment: &str) -> StateError {
    StateError::PathConflict {
        key: key.to_string(),
        segment: segment.to_string(),
    }
}
