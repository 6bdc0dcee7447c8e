use std::ops::Range;

use super::data::PhotoLink;

/// Fetch status of one API page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageStatus {
    NotFetched,
    Fetched,
}

/// Every link fetched during this session, in remote traversal order.
///
/// Index `i` is always the photo at absolute position `i` of the remote
/// collection. The cache only grows, one API page at a time, and pages
/// must arrive in order.
#[derive(Debug, Clone)]
pub struct LinkCache {
    links: Vec<PhotoLink>,
    pages_fetched: u32,
}

impl LinkCache {
    pub fn new(page_size: usize) -> Self {
        Self {
            links: Vec::with_capacity(page_size),
            pages_fetched: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Number of API pages appended so far
    #[cfg(test)]
    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    /// The API page that has to be fetched next
    pub fn next_page(&self) -> u32 {
        self.pages_fetched + 1
    }

    pub fn page_status(&self, page: u32) -> PageStatus {
        if page >= 1 && page <= self.pages_fetched {
            PageStatus::Fetched
        } else {
            PageStatus::NotFetched
        }
    }

    /// Append the links of `page`. Returns false (and leaves the cache
    /// untouched) if the page is not the next one in order.
    pub fn append_page(&mut self, page: u32, links: Vec<PhotoLink>) -> bool {
        if page != self.next_page() {
            return false;
        }
        self.links.extend(links);
        self.pages_fetched = page;
        true
    }

    /// Links in `range`, clamped to what has been fetched
    pub fn slice(&self, range: Range<usize>) -> &[PhotoLink] {
        let end = range.end.min(self.links.len());
        let start = range.start.min(end);
        &self.links[start..end]
    }

    pub fn get(&self, index: usize) -> Option<&PhotoLink> {
        self.links.get(index)
    }
}
