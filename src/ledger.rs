//! Record sets keyed by a fixed identity key.
//!
//! A ledger remembers which [`KeyKind`] it was built with and always looks
//! records up through it, so the coarse last-poll ledger and the fine
//! notified ledger can't be queried with each other's keys.

use std::collections::HashMap;

use crate::quake::{KeyKind, QuakeRecord};
use crate::retention::newest_first;

#[derive(Debug, Clone)]
pub struct Ledger {
    kind: KeyKind,
    entries: Vec<QuakeRecord>,
    index: HashMap<String, usize>,
}

impl Ledger {
    pub fn new(kind: KeyKind) -> Self {
        Self {
            kind,
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Build from persisted records. A later record with an existing key
    /// replaces the earlier one in place.
    pub fn from_records<I>(kind: KeyKind, records: I) -> Self
    where
        I: IntoIterator<Item = QuakeRecord>,
    {
        let mut ledger = Self::new(kind);
        for q in records {
            ledger.insert(q);
        }
        ledger
    }

    pub fn insert(&mut self, q: QuakeRecord) {
        let key = self.kind.key_for(&q);
        match self.index.get(&key) {
            Some(&i) => self.entries[i] = q,
            None => {
                self.index.insert(key, self.entries.len());
                self.entries.push(q);
            }
        }
    }

    pub fn kind(&self) -> KeyKind {
        self.kind
    }

    /// Entry sharing `q`'s key under this ledger's key kind.
    pub fn lookup(&self, q: &QuakeRecord) -> Option<&QuakeRecord> {
        self.get(&self.kind.key_for(q))
    }

    pub fn get(&self, key: &str) -> Option<&QuakeRecord> {
        self.index.get(key).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, q: &QuakeRecord) -> bool {
        self.lookup(q).is_some()
    }

    /// Insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &QuakeRecord> {
        self.entries.iter()
    }

    /// Deterministic scan order for heuristics: newest first, ties in
    /// insertion order, unparseable timestamps last.
    pub fn newest_first(&self) -> Vec<&QuakeRecord> {
        newest_first(self.entries.iter())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_records(self) -> Vec<QuakeRecord> {
        self.entries
    }
}
