//! The generic record type a query returns.

use std::collections::BTreeMap;
use std::ops::Index;

use serde::Serialize;

/// One parsed database row: a mapping from field name to string value,
/// plus the record's primary key when the response carried one.
///
/// Records are immutable once parsed. Fields are looked up by name with
/// [`Record::get`] or bracket access; the full set can be iterated with
/// [`Record::fields`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Record {
    key: Option<String>,
    fields: BTreeMap<String, String>,
}

impl Record {
    /// The record's primary key, when the response carried one.
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    /// Looks up a field value by name.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Iterates over all `(field, value)` pairs.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of fields on the record.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the record has no fields at all.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub(crate) fn set_key(&mut self, key: impl Into<String>) {
        self.key = Some(key.into());
    }

    pub(crate) fn insert(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(field.into(), value.into());
    }

    /// A record whose key attribute was absent falls back to its `key`
    /// field, the way the service reports keys on older deployments.
    pub(crate) fn finish(mut self) -> Self {
        if self.key.is_none() {
            self.key = self.fields.get("key").cloned();
        }
        self
    }
}

impl Index<&str> for Record {
    type Output = str;

    /// Bracket access to a field value. Panics if the field is absent;
    /// use [`Record::get`] for a fallible lookup.
    fn index(&self, field: &str) -> &str {
        &self.fields[field]
    }
}
