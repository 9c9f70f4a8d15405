//! Credential Pool Implementation
//!
//! This module provides the ordered, non-empty `CredentialPool` the execution
//! engine walks through, and `KeySource`, the "one key or many keys" input it
//! is normalized from.

use super::credential::Credential;
use crate::error::PoolError;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::iter;
use std::slice;

// ============================================================================
// Key Source
// ============================================================================

/// Raw credential input: a single key or an ordered list of keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeySource {
    Single(Credential),
    Many(Vec<Credential>),
}

impl From<Credential> for KeySource {
    fn from(credential: Credential) -> Self {
        Self::Single(credential)
    }
}

impl From<&str> for KeySource {
    fn from(key: &str) -> Self {
        Self::Single(key.into())
    }
}

impl From<String> for KeySource {
    fn from(key: String) -> Self {
        Self::Single(key.into())
    }
}

impl<T: Into<Credential>> From<Vec<T>> for KeySource {
    fn from(keys: Vec<T>) -> Self {
        Self::Many(keys.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Credential>, const N: usize> From<[T; N]> for KeySource {
    fn from(keys: [T; N]) -> Self {
        Self::Many(keys.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Credential> + Clone> From<&[T]> for KeySource {
    fn from(keys: &[T]) -> Self {
        Self::Many(keys.iter().cloned().map(Into::into).collect())
    }
}

impl TryFrom<&Value> for KeySource {
    type Error = PoolError;

    /// Accepts a JSON string or an array of strings; anything else is `InvalidInput`
    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(key) => Ok(Self::Single(key.as_str().into())),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::String(key) => Ok(Credential::from(key.as_str())),
                    other => Err(PoolError::InvalidInput(format!(
                        "a list containing {}",
                        json_type_name(other)
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Many),
            other => Err(PoolError::InvalidInput(json_type_name(other).to_string())),
        }
    }
}

impl TryFrom<Value> for KeySource {
    type Error = PoolError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::try_from(&value)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a map",
    }
}

// ============================================================================
// Credential Pool
// ============================================================================

/// An ordered, non-empty sequence of credentials
///
/// Insertion order is trial order. The first credential is stored apart from
/// the rest so that emptiness is unrepresentable once construction succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialPool {
    first: Credential,
    rest: Vec<Credential>,
}

/// Iterator over the credentials of a pool, in trial order
pub type Iter<'a> = iter::Chain<iter::Once<&'a Credential>, slice::Iter<'a, Credential>>;

impl CredentialPool {
    /// Normalize one key or a list of keys into a pool
    ///
    /// Fails with [`PoolError::EmptyPool`] if the list is empty. Duplicate keys
    /// are kept and tried as many times as they appear.
    pub fn normalize(input: impl Into<KeySource>) -> Result<Self, PoolError> {
        match input.into() {
            KeySource::Single(credential) => Ok(Self::single(credential)),
            KeySource::Many(credentials) => {
                let mut credentials = credentials.into_iter();
                let first = credentials.next().ok_or(PoolError::EmptyPool)?;
                Ok(Self {
                    first,
                    rest: credentials.collect(),
                })
            }
        }
    }

    /// Normalize untyped input, e.g. a value read from a config file
    pub fn from_value(value: &Value) -> Result<Self, PoolError> {
        Self::normalize(KeySource::try_from(value)?)
    }

    /// Create a pool holding exactly one credential
    pub fn single(credential: impl Into<Credential>) -> Self {
        Self {
            first: credential.into(),
            rest: Vec::new(),
        }
    }

    /// Number of credentials (always at least 1)
    pub fn len(&self) -> usize {
        1 + self.rest.len()
    }

    /// Always false: a pool cannot be empty
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The first credential to be tried
    pub fn first(&self) -> &Credential {
        &self.first
    }

    /// Get the credential at a 0-based position
    pub fn get(&self, index: usize) -> Option<&Credential> {
        match index {
            0 => Some(&self.first),
            n => self.rest.get(n - 1),
        }
    }

    /// Iterate credentials in trial order
    pub fn iter(&self) -> Iter<'_> {
        iter::once(&self.first).chain(self.rest.iter())
    }

    /// Masked form of every credential, in trial order
    pub fn masked(&self, prefix_chars: usize) -> Vec<String> {
        self.iter().map(|c| c.masked(prefix_chars)).collect()
    }
}

impl From<Credential> for CredentialPool {
    fn from(credential: Credential) -> Self {
        Self::single(credential)
    }
}

impl<'a> IntoIterator for &'a CredentialPool {
    type Item = &'a Credential;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'de> Deserialize<'de> for CredentialPool {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Tests
// ============================================================================
