//! Enumeration definitions keyed by qualified schema path.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Names and ordinals of a single enumerated leaf type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EnumDefinition {
    values: BTreeMap<String, i64>,
}

impl EnumDefinition {
    pub fn new<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        Self {
            values: values
                .into_iter()
                .map(|(name, ordinal)| (name.into(), ordinal))
                .collect(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Name registered for an ordinal.
    pub fn name_of(&self, ordinal: i64) -> Option<&str> {
        self.values
            .iter()
            .find(|(_, value)| **value == ordinal)
            .map(|(name, _)| name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// First name sharing an ordinal with another, if any.
    pub(crate) fn duplicate_ordinal(&self) -> Option<&str> {
        let mut seen = std::collections::HashSet::new();
        self.values
            .iter()
            .find(|(_, ordinal)| !seen.insert(**ordinal))
            .map(|(name, _)| name.as_str())
    }
}

/// Startup-populated lookup of enum definitions.
///
/// Keys are qualified schema paths such as `/access-profile/access-profile/type`;
/// list levels contribute their name once and carry no key selectors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnumRegistry {
    definitions: BTreeMap<String, EnumDefinition>,
}

impl EnumRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the definition for an enum leaf, replacing any previous one.
    pub fn register(&mut self, path: impl Into<String>, definition: EnumDefinition) {
        self.definitions.insert(path.into(), definition);
    }

    /// Exact-path lookup.
    pub fn get(&self, path: &str) -> Option<&EnumDefinition> {
        self.definitions.get(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl FromIterator<(String, EnumDefinition)> for EnumRegistry {
    fn from_iter<T: IntoIterator<Item = (String, EnumDefinition)>>(iter: T) -> Self {
        Self {
            definitions: iter.into_iter().collect(),
        }
    }
}
