//! Frontier management for the level-synchronized crawl
//!
//! Workers append newly discovered links while the coordinator waits on the
//! current generation. The coordinator only drains after every task of the
//! generation has finished, so each drain yields exactly one BFS level.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// A URL waiting to be crawled
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrontierEntry {
    /// The URL to fetch
    pub url: String,

    /// Distance from the seed (the seed is 0)
    pub depth: u32,
}

impl FrontierEntry {
    pub fn new(url: impl Into<String>, depth: u32) -> Self {
        Self {
            url: url.into(),
            depth,
        }
    }
}

/// An immutable batch of entries drained from the frontier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Generation {
    entries: Vec<FrontierEntry>,
}

impl Generation {
    /// Depth shared by the batch (that of its first entry)
    pub fn depth(&self) -> Option<u32> {
        self.entries.first().map(|e| e.depth)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[FrontierEntry] {
        &self.entries
    }
}

impl IntoIterator for Generation {
    type Item = FrontierEntry;
    type IntoIter = std::vec::IntoIter<FrontierEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Pending URLs, guarded by a single lock
#[derive(Debug, Default)]
pub struct Frontier {
    pending: Mutex<Vec<FrontierEntry>>,
}

impl Frontier {
    /// Creates a frontier holding only the seed at depth 0
    pub fn with_seed(seed: impl Into<String>) -> Self {
        Self {
            pending: Mutex::new(vec![FrontierEntry::new(seed, 0)]),
        }
    }

    /// Appends all entries under one lock acquisition
    pub fn extend<I>(&self, entries: I)
    where
        I: IntoIterator<Item = FrontierEntry>,
    {
        self.lock().extend(entries);
    }

    /// Takes everything enqueued so far as the next generation
    pub fn drain_generation(&self) -> Generation {
        Generation {
            entries: std::mem::take(&mut *self.lock()),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<FrontierEntry>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
