//! Named values supplied alongside the tabular input.
//!
//! Overrides are `key=value` pairs given on the command line or in the config
//! file. They take precedence over same-named input columns.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Caller-provided values that override input columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamedValues(HashMap<String, String>);

impl NamedValues {
    /// Creates an empty set of overrides.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, replacing an earlier value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Parses and inserts a `key=value` pair.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNamedValue`] if there is no `=`.
    pub fn insert_pair(&mut self, pair: &str) -> Result<()> {
        let (key, value) = parse_pair(pair)?;
        self.0.insert(key, value);
        Ok(())
    }

    /// Merges `other` into this set; values in `other` win.
    pub fn extend(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    /// Gets the value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Returns true if `key` is set.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Returns the number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no values are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Splits `key=value` at the first `=`. The value may itself contain `=`.
///
/// # Errors
///
/// Returns [`Error::InvalidNamedValue`] if there is no `=`.
pub fn parse_pair(pair: &str) -> Result<(String, String)> {
    pair.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| Error::InvalidNamedValue(pair.to_string()))
}

/// Builds a template context from one input record and the overrides.
#[must_use]
pub fn combine(record: &HashMap<String, String>, overrides: &NamedValues) -> HashMap<String, String> {
    let mut context = record.clone();
    context.extend(overrides.0.iter().map(|(k, v)| (k.clone(), v.clone())));
    context
}
