use crate::records::record::Record;

/// One page of normalized records, as produced by the GraphQL client and
/// consumed immediately by the batch processor. Never persisted.
#[derive(Debug, Clone)]
pub struct PageResult {
    pub records: Vec<Record>,
    pub has_next_page: bool,
    /// Opaque token marking the end of this page, absent on an empty collection.
    pub end_cursor: Option<String>,
}

impl PageResult {
    pub fn empty() -> Self {
        PageResult {
            records: Vec::new(),
            has_next_page: false,
            end_cursor: None,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Result of a `count` probe. The source API has no cheap total-count
/// primitive for this resource family, so the count is a single capped page
/// and `is_partial` marks it as an estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountResult {
    pub count: u64,
    pub is_partial: bool,
}
