use serde::Deserialize;

use std::fmt;

/// Identifier of a field within a line: either a column position or a name.
///
/// Keys of different styles never compare equal, so `0` and `{0}` are two distinct fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKey {
    Index(usize),
    Name(String),
}

impl FieldKey {
    pub fn name(name: impl Into<String>) -> Self {
        FieldKey::Name(name.into())
    }

    /// Column label used in generated headers: the bare name or the index.
    pub fn label(&self) -> String {
        match self {
            FieldKey::Index(i) => i.to_string(),
            FieldKey::Name(n) => n.clone(),
        }
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FieldKey::Index(i) => write!(f, "field {}", i),
            FieldKey::Name(n) => write!(f, "field \"{{{}}}\"", n),
        }
    }
}

impl From<usize> for FieldKey {
    fn from(i: usize) -> Self {
        FieldKey::Index(i)
    }
}

impl From<&str> for FieldKey {
    fn from(s: &str) -> Self {
        let s = s
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .unwrap_or(s);
        FieldKey::Name(s.to_owned())
    }
}

impl From<String> for FieldKey {
    fn from(s: String) -> Self {
        FieldKey::from(s.as_str())
    }
}

/// Field key as written in configuration files: YAML integers are positions,
/// strings (braced or not) are names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(untagged)]
pub enum RawKey {
    Index(usize),
    Name(String),
}

impl From<RawKey> for FieldKey {
    fn from(raw: RawKey) -> Self {
        match raw {
            RawKey::Index(i) => FieldKey::Index(i),
            RawKey::Name(n) => FieldKey::from(n),
        }
    }
}

/// Values extracted from one line, in first-appearance order of their keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    entries: Vec<(FieldKey, String)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Insert a value, overwriting an existing key in place.
    pub fn insert(&mut self, key: FieldKey, value: impl Into<String>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Append without checking for an existing key; callers guarantee uniqueness.
    pub(crate) fn push(&mut self, key: FieldKey, value: impl Into<String>) {
        self.entries.push((key, value.into()));
    }

    pub fn get(&self, key: &FieldKey) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &FieldKey) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &FieldKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldKey, &str)> {
        self.entries.iter().map(|(k, v)| (k, v.as_str()))
    }

    pub(crate) fn value_at_mut(&mut self, idx: usize) -> &mut String {
        &mut self.entries[idx].1
    }

    pub(crate) fn entry_at(&self, idx: usize) -> (&FieldKey, &str) {
        let (k, v) = &self.entries[idx];
        (k, v.as_str())
    }
}

impl fmt::Display for FieldMap {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.entries.is_empty() {
            return writeln!(f, "  (no fields)");
        }
        for (k, v) in &self.entries {
            writeln!(f, "  {}: {:?}", k.label(), v)?;
        }
        Ok(())
    }
}

impl<K: Into<FieldKey>, V: Into<String>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut res = FieldMap::new();
        for (k, v) in iter {
            res.insert(k.into(), v);
        }
        res
    }
}
