use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structured filter predicates for an import run.
///
/// The first group compiles into the source API's search mini-language and is
/// bound as the `$query` variable; the second group cannot be expressed there
/// and is applied to each fetched page by the batch processor.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ImportFilters {
    // Query-expressible predicates.
    pub status: Option<String>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub tag: Option<String>,
    pub vendor: Option<String>,
    /// Free-text search term.
    pub text: Option<String>,

    // Post-fetch predicates, applied per page after normalization.
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub inventory_min: Option<i64>,
    pub inventory_max: Option<i64>,
    /// Keep only records carrying at least one of these tags.
    #[serde(default)]
    pub require_tags: Vec<String>,
    /// Skip records that already exist in the target system.
    #[serde(default)]
    pub only_new: bool,
}

impl ImportFilters {
    pub fn has_post_filters(&self) -> bool {
        self.price_min.is_some()
            || self.price_max.is_some()
            || self.inventory_min.is_some()
            || self.inventory_max.is_some()
            || !self.require_tags.is_empty()
            || self.only_new
    }
}

/// Options payload persisted on the import session.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ImportOptions {
    #[serde(default)]
    pub filters: ImportFilters,
    /// Per-run page size override; the settings chain applies when unset.
    pub page_size: Option<u32>,
}

impl ImportOptions {
    pub fn with_filters(filters: ImportFilters) -> Self {
        ImportOptions {
            filters,
            page_size: None,
        }
    }
}
