//! Execution environments and job-scoped environment variables

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Attribute key holding the operating-system family tag
pub const OS_ATTRIBUTE: &str = "os";

/// Name of the implicit environment used by the local gate
pub const LOCAL_ENVIRONMENT: &str = "local";

/// Variables set by strict mode so rustc and rustdoc turn warnings into errors
pub const STRICT_MODE_VARS: [(&str, &str); 2] =
    [("RUSTFLAGS", "-D warnings"), ("RUSTDOCFLAGS", "-D warnings")];

/// Where a job runs: a name plus a key/value attribute descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Environment {
    pub name: String,
    pub attributes: BTreeMap<String, String>,
}

impl Environment {
    /// Create an environment with no attributes
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Create an environment whose name doubles as its OS family tag
    pub fn os(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(name.clone()).with_attribute(OS_ATTRIBUTE, name)
    }

    /// The implicit environment of the local gate
    pub fn local() -> Self {
        Self::new(LOCAL_ENVIRONMENT)
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A mapping of environment-variable overrides
///
/// Scopes are layered global → job → step when a step is invoked; a later
/// layer replaces any key it shares with an earlier one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnvScope(BTreeMap<String, String>);

impl EnvScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// A scope holding only the strict-mode variables
    pub fn strict() -> Self {
        STRICT_MODE_VARS.iter().copied().collect()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Return a copy of `self` with every entry of `upper` written over it
    pub fn overlay(&self, upper: &EnvScope) -> EnvScope {
        let mut merged = self.0.clone();
        merged.extend(upper.0.iter().map(|(k, v)| (k.clone(), v.clone())));
        EnvScope(merged)
    }

    /// Merge layers in order, lowest precedence first
    pub fn resolve<'a>(layers: impl IntoIterator<Item = &'a EnvScope>) -> EnvScope {
        layers
            .into_iter()
            .fold(EnvScope::new(), |acc, layer| acc.overlay(layer))
    }

    /// Whether every strict-mode variable is set to its strict value
    pub fn is_strict(&self) -> bool {
        STRICT_MODE_VARS
            .iter()
            .all(|(key, value)| self.get(key) == Some(*value))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for EnvScope {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        EnvScope(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<BTreeMap<String, String>> for EnvScope {
    fn from(map: BTreeMap<String, String>) -> Self {
        EnvScope(map)
    }
}
