//! Decode cache - reuse rows of documents already decoded.
//!
//! Entries are keyed by file name and content, so re-uploading the same
//! file skips parsing while a renamed copy still gets its own origin column.

use md5::{Digest, Md5};
use std::collections::{HashMap, VecDeque};

use crate::error::DecodeResult;
use crate::models::Record;
use crate::transform::decoder;

/// Default number of decoded documents kept.
pub const DEFAULT_CAPACITY: usize = 64;

/// Hit and miss counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Bounded memo of decoded documents, evicting the oldest entry first.
#[derive(Debug)]
pub struct DecodeCache {
    capacity: usize,
    entries: HashMap<String, Vec<Record>>,
    /// Insertion order, oldest first
    order: VecDeque<String>,
    hits: u64,
    misses: u64,
}

impl DecodeCache {
    /// A capacity of zero disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }

    /// Cache key: MD5 over the name, a NUL separator, and the bytes.
    pub fn key(name: &str, bytes: &[u8]) -> String {
        let mut hasher = Md5::new();
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
        hasher.update(bytes);
        hex::encode(hasher.finalize())
    }

    /// Cached rows for this file, if any.
    pub fn get(&mut self, name: &str, bytes: &[u8]) -> Option<&Vec<Record>> {
        let key = Self::key(name, bytes);
        match self.entries.get(&key) {
            Some(rows) => {
                self.hits += 1;
                Some(rows)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// Store rows for this file, evicting the oldest entries beyond capacity.
    pub fn insert(&mut self, name: &str, bytes: &[u8], rows: Vec<Record>) {
        if self.capacity == 0 {
            return;
        }

        let key = Self::key(name, bytes);
        if self.entries.insert(key.clone(), rows).is_none() {
            self.order.push_back(key);
        }

        while self.entries.len() > self.capacity {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.entries.remove(&oldest);
                }
                None => break,
            }
        }
    }

    /// Decode through the cache. Failures are not cached.
    pub fn decode(&mut self, name: &str, bytes: &[u8]) -> DecodeResult<Vec<Record>> {
        if let Some(rows) = self.get(name, bytes) {
            return Ok(rows.clone());
        }

        let rows = decoder::decode(bytes, name)?;
        self.insert(name, bytes, rows.clone());
        Ok(rows)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

impl Default for DecodeCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
