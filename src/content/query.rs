//! Shared filtering contract over catalog collections.
//!
//! Every consumer filters and sorts through [`RecordQuery`] so the meaning of
//! "published" or "in this category" is decided in exactly one place.

use super::record::{PostFields, ProjectFields, Record};

/// Chainable filter/sort over one kind's records
#[derive(Debug, Clone)]
pub struct RecordQuery<'a, F> {
    items: Vec<&'a Record<F>>,
}

impl<'a, F> RecordQuery<'a, F> {
    /// Start a query over a collection, keeping scan order
    pub fn new(records: &'a [Record<F>]) -> Self {
        Self {
            items: records.iter().collect(),
        }
    }

    /// Keep records whose `is_published` is true
    pub fn published(self) -> Self {
        self.filter(|r| r.is_published)
    }

    /// Keep records matching an arbitrary predicate
    pub fn filter<P>(mut self, mut predicate: P) -> Self
    where
        P: FnMut(&Record<F>) -> bool,
    {
        self.items.retain(|r| predicate(*r));
        self
    }

    /// Newest first; ties keep scan order
    pub fn sorted_by_date_desc(mut self) -> Self {
        self.items.sort_by(|a, b| b.date.cmp(&a.date));
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.items.truncate(n);
        self
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn collect(self) -> Vec<&'a Record<F>> {
        self.items
    }
}

impl<'a> RecordQuery<'a, PostFields> {
    /// Case-insensitive, whitespace-trimmed category match
    pub fn in_category(self, category: &str) -> Self {
        let wanted = normalize_category(category);
        self.filter(|p| normalize_category(&p.fields.category) == wanted)
    }
}

impl<'a> RecordQuery<'a, ProjectFields> {
    pub fn featured(self) -> Self {
        self.filter(|p| p.fields.featured)
    }
}

/// Comparison form of a category name
pub fn normalize_category(category: &str) -> String {
    category.trim().to_lowercase()
}
