//! The repository catalog and the crawl that fills it

mod builder;
mod record;

pub use builder::{Crawler, index_repositories};
pub use record::{Column, Provenance, RepositoryRecord};

use std::collections::HashSet;

/// Append-only set of records keyed by repository URL.
#[derive(Debug, Default)]
pub struct Catalog {
    records: Vec<RepositoryRecord>,
    urls: HashSet<String>,
}

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    /// Add `record` unless its URL is already present. Returns whether it was added.
    pub fn insert(&mut self, record: RepositoryRecord) -> bool {
        if !self.urls.insert(record.url.clone()) {
            return false;
        }

        self.records.push(record);
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RepositoryRecord> {
        self.records.iter()
    }

    /// Records in URL order.
    #[must_use]
    pub fn into_sorted(mut self) -> Vec<RepositoryRecord> {
        self.records.sort_by(|a, b| a.url.cmp(&b.url));
        self.records
    }
}
