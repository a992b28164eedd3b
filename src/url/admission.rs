//! URL admission controller
//!
//! Owns the visited (claimed) set for one crawl and the fixed domain scope.
//! The check and the insert that make up a claim happen under one write
//! lock, so two workers can never both claim the same URL.

use crate::url::domain::domain_of;
use std::collections::HashSet;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Thread-safe admission bookkeeping for a single-domain crawl
#[derive(Debug)]
pub struct AdmissionController {
    /// Domain every admitted URL must match exactly
    domain: String,

    /// URLs already claimed (fetched or in flight)
    visited: RwLock<HashSet<String>>,
}

impl AdmissionController {
    /// Creates a controller scoped to `domain`
    ///
    /// # Example
    ///
    /// ```
    /// use tidewalk::url::AdmissionController;
    ///
    /// let admission = AdmissionController::new("example.com");
    /// assert!(admission.should_visit("https://example.com/a"));
    /// assert!(!admission.should_visit("https://other.com/a"));
    /// ```
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            visited: RwLock::new(HashSet::new()),
        }
    }

    /// The domain this controller admits
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns true if the URL's domain equals the crawl domain
    pub fn in_scope(&self, url: &str) -> bool {
        domain_of(url).is_some_and(|d| d == self.domain)
    }

    /// Returns true iff the URL is in scope and not yet claimed
    ///
    /// This is advisory: another worker may claim the URL right after this
    /// returns. Use [`try_claim`](Self::try_claim) to take ownership.
    pub fn should_visit(&self, url: &str) -> bool {
        self.in_scope(url) && !self.read().contains(url)
    }

    /// Inserts `url` into the visited set
    ///
    /// Idempotent; returns true if the URL was not already present.
    pub fn mark_visited(&self, url: &str) -> bool {
        self.write().insert(url.to_string())
    }

    /// Atomically checks admission and claims the URL
    ///
    /// Returns true for exactly one caller per URL over the crawl's lifetime.
    /// A second claim of the same URL is a no-op that returns false.
    pub fn try_claim(&self, url: &str) -> bool {
        // Scope is immutable, so it can be checked outside the lock.
        if !self.in_scope(url) {
            return false;
        }
        self.write().insert(url.to_string())
    }

    /// Applies [`should_visit`](Self::should_visit) to each candidate
    ///
    /// Does not claim anything: a URL returned here may still be claimed by
    /// another worker before this caller gets to it.
    pub fn filter_admissible<I, S>(&self, urls: I) -> HashSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let in_scope: Vec<S> = urls
            .into_iter()
            .filter(|u| self.in_scope(u.as_ref()))
            .collect();

        let visited = self.read();
        in_scope
            .into_iter()
            .filter_map(|u| {
                let u: &str = u.as_ref();
                (!visited.contains(u)).then(|| u.to_string())
            })
            .collect()
    }

    /// Returns true if the URL has been claimed
    pub fn is_visited(&self, url: &str) -> bool {
        self.read().contains(url)
    }

    /// Number of claimed URLs
    pub fn visited_count(&self) -> usize {
        self.read().len()
    }

    // A poisoned lock still guards a consistent set: inserts are the only
    // mutation and cannot be observed half-done.
    fn read(&self) -> RwLockReadGuard<'_, HashSet<String>> {
        self.visited.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashSet<String>> {
        self.visited.write().unwrap_or_else(PoisonError::into_inner)
    }
}
