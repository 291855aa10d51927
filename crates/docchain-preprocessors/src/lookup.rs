//! Keyed lookup collaborators and the per run lookup cache.

use std::collections::HashMap;

use docchain_core::path;
use docchain_core::{value_to_string, Document, LookupTableConfig, Value};
use tracing::debug;

/// Response of a keyed lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupResponse {
    /// Requested fields of the first match
    pub fields: Document,
    /// Number of matches found for the key
    pub match_count: u64,
}

impl LookupResponse {
    pub fn not_found() -> Self {
        Self::default()
    }

    pub fn found(fields: Document, match_count: u64) -> Self {
        Self {
            fields,
            match_count,
        }
    }
}

/// Errors reported by a lookup collaborator
#[derive(Debug, Clone, thiserror::Error)]
pub enum LookupError {
    #[error("Lookup backend unavailable: {0}")]
    Unavailable(String),

    #[error("Lookup timed out: {0}")]
    Timeout(String),

    #[error("Invalid lookup response: {0}")]
    InvalidResponse(String),
}

/// External keyed lookup service (search index, REST endpoint, in-memory
/// table, ...). Calls are synchronous; timeouts are the collaborator's own
/// concern.
#[cfg_attr(test, mockall::automock)]
pub trait LookupCollaborator: Send + Sync {
    fn lookup(&self, key: &Value, requested_fields: &[String]) -> Result<LookupResponse, LookupError>;
}

/// Lookup collaborator over a static table of records.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLookup {
    key_field: String,
    records: HashMap<String, Vec<Document>>,
}

impl InMemoryLookup {
    pub fn new(key_field: impl Into<String>) -> Self {
        Self {
            key_field: key_field.into(),
            records: HashMap::new(),
        }
    }

    /// Build a table indexing `records` by the value of `key_field`.
    /// Records without a key value are ignored.
    pub fn from_records(key_field: impl Into<String>, records: Vec<Document>) -> Self {
        let mut lookup = Self::new(key_field);
        for record in records {
            lookup.insert(record);
        }
        lookup
    }

    pub fn from_config(config: &LookupTableConfig) -> Self {
        Self::from_records(config.key_field.clone(), config.records.clone())
    }

    pub fn insert(&mut self, record: Document) {
        let key = path::extract(&record, &self.key_field).and_then(|v| value_to_string(&v));
        match key {
            Some(key) => self.records.entry(key).or_default().push(record),
            None => debug!(key_field = %self.key_field, "Record without key value ignored"),
        }
    }

    pub fn len(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl LookupCollaborator for InMemoryLookup {
    fn lookup(&self, key: &Value, requested_fields: &[String]) -> Result<LookupResponse, LookupError> {
        let Some(matches) = value_to_string(key).and_then(|k| self.records.get(&k)) else {
            return Ok(LookupResponse::not_found());
        };
        let Some(first) = matches.first() else {
            return Ok(LookupResponse::not_found());
        };

        let mut fields = Document::new();
        for field in requested_fields {
            if let Some(value) = path::extract(first, field) {
                fields.insert(field.clone(), value.into_owned());
            }
        }

        Ok(LookupResponse::found(fields, matches.len() as u64))
    }
}

/// Memoized per field lookup results, scoped to one run of a stage over one
/// document.
///
/// Keys are compared by their JSON form, so `"42"` and `42` are distinct.
#[derive(Debug, Default)]
pub struct LookupCache {
    entries: HashMap<String, Vec<Value>>,
    hits: u64,
    misses: u64,
}

impl LookupCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn cache_key(key: &Value) -> String {
        key.to_string()
    }

    pub fn get(&mut self, key: &Value) -> Option<&[Value]> {
        match self.entries.get(&Self::cache_key(key)) {
            Some(values) => {
                self.hits += 1;
                Some(values.as_slice())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, key: &Value, values: Vec<Value>) {
        self.entries.insert(Self::cache_key(key), values);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
