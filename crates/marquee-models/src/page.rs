use serde::{Deserialize, Serialize};
use crate::movie::Movie;

/// One page of results, as produced by a single remote call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page {
    pub page_number: u32,
    pub items: Vec<Movie>,
    pub has_next: bool,
}

impl Page {
    /// Build a page from a remote response.
    ///
    /// An empty page never has a next page, whatever the remote reports,
    /// so that paging always terminates.
    pub fn new(page_number: u32, items: Vec<Movie>, remote_has_next: bool) -> Self {
        let has_next = remote_has_next && !items.is_empty();
        Self { page_number, items, has_next }
    }

    /// Terminal page returned once a context is exhausted
    pub fn empty(page_number: u32) -> Self {
        Self { page_number, items: Vec::new(), has_next: false }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
