use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};

use std::fmt;
use std::sync::Arc;

use crate::errors::*;
use crate::fields::{FieldKey, FieldMap};

/// Per-field replacement values: `key -> (raw value -> replacement)`.
pub type SubstitutionTable = FxHashMap<FieldKey, FxHashMap<String, String>>;

/// Per-field values that cause a line to be discarded.
pub type FilterTable = FxHashMap<FieldKey, FxHashSet<String>>;

/// Condition a line must satisfy to be kept.
///
/// The built-in kinds evaluate to false when their field is absent.
#[derive(Clone)]
pub enum Predicate {
    Equals { key: FieldKey, value: String },
    OneOf { key: FieldKey, values: FxHashSet<String> },
    Matches { key: FieldKey, regex: Regex },
    Custom(Arc<dyn Fn(&FieldMap) -> bool + Send + Sync>),
}

impl Predicate {
    pub fn custom<F>(func: F) -> Self
    where
        F: Fn(&FieldMap) -> bool + Send + Sync + 'static,
    {
        Predicate::Custom(Arc::new(func))
    }

    pub fn matches(key: FieldKey, pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern).map_err(|e| Error::InvalidRegex {
            pattern: pattern.to_owned(),
            context: "building a field predicate",
            source: e,
        })?;
        Ok(Predicate::Matches { key, regex })
    }

    pub fn eval(&self, fields: &FieldMap) -> bool {
        use Predicate::*;
        match self {
            Equals { key, value } => fields.get(key) == Some(value.as_str()),
            OneOf { key, values } => fields.get(key).map_or(false, |v| values.contains(v)),
            Matches { key, regex } => fields.get(key).map_or(false, |v| regex.is_match(v)),
            Custom(func) => func(fields),
        }
    }

    /// The field the predicate reads, when known.
    pub fn key(&self) -> Option<&FieldKey> {
        use Predicate::*;
        match self {
            Equals { key, .. } | OneOf { key, .. } | Matches { key, .. } => Some(key),
            Custom(_) => None,
        }
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Predicate::*;
        match self {
            Equals { key, value } => write!(f, "{} == {:?}", key, value),
            OneOf { key, values } => write!(f, "{} in {:?}", key, values),
            Matches { key, regex } => write!(f, "{} =~ /{}/", key, regex.as_str()),
            Custom(_) => write!(f, "<custom predicate>"),
        }
    }
}

/// Cleaning and filtering applied to the fields of each line.
#[derive(Debug, Clone, Default)]
pub struct CleanConfig {
    pub replace_null: Option<String>,
    pub replace_internal_space: Option<String>,
    pub substitutions: SubstitutionTable,
    pub filters: FilterTable,
    pub predicates: Vec<Predicate>,
}

impl CleanConfig {
    /// Configuration that only strips surrounding whitespace.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace_null(mut self, replacement: impl Into<String>) -> Self {
        self.replace_null = Some(replacement.into());
        self
    }

    pub fn replace_internal_space(mut self, replacement: impl Into<String>) -> Self {
        self.replace_internal_space = Some(replacement.into());
        self
    }

    pub fn substitute(
        mut self,
        key: impl Into<FieldKey>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        self.substitutions
            .entry(key.into())
            .or_default()
            .insert(from.into(), to.into());
        self
    }

    pub fn filter_out<S: Into<String>>(
        mut self,
        key: impl Into<FieldKey>,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        self.filters
            .entry(key.into())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    pub fn require(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Clean the fields in place, returning `None` if the line is filtered out.
    ///
    /// Fields are processed in order. For each one: surrounding whitespace is stripped, an
    /// empty value gets the null replacement, spaces get the space replacement, then the filter
    /// table and the predicates may reject the line, and finally the substitution table applies.
    /// Predicates see the partially cleaned fields.
    pub fn clean(&self, mut fields: FieldMap) -> Option<FieldMap> {
        for idx in 0..fields.len() {
            {
                let value = fields.value_at_mut(idx);

                let trimmed = value.trim();
                if trimmed.len() != value.len() {
                    *value = trimmed.to_owned();
                }

                if value.is_empty() {
                    if let Some(r) = &self.replace_null {
                        *value = r.clone();
                    }
                }

                if let Some(r) = &self.replace_internal_space {
                    if value.contains(' ') {
                        *value = value.replace(' ', r);
                    }
                }
            }

            let (key, value) = fields.entry_at(idx);

            if self
                .filters
                .get(key)
                .map_or(false, |values| values.contains(value))
            {
                return None;
            }

            if !self.predicates.iter().all(|p| p.eval(&fields)) {
                return None;
            }

            let (key, value) = fields.entry_at(idx);
            if let Some(new) = self.substitutions.get(key).and_then(|s| s.get(value)) {
                let new = new.clone();
                *fields.value_at_mut(idx) = new;
            }
        }

        Some(fields)
    }
}
