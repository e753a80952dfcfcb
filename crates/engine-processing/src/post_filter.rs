use model::{filter::ImportFilters, records::record::Record};

/// Why a record was dropped before reaching the upsert collaborator, or
/// `None` if it survives.
///
/// Only predicates the source query language cannot express are checked here;
/// everything else was already applied server-side. Records that do not carry
/// the field a predicate needs are kept rather than guessed at.
pub fn rejection_reason(filters: &ImportFilters, record: &Record) -> Option<&'static str> {
    if filters.price_min.is_some() || filters.price_max.is_some() {
        let prices = record.variant_prices();
        if !prices.is_empty() {
            let min = filters.price_min.unwrap_or(f64::MIN);
            let max = filters.price_max.unwrap_or(f64::MAX);
            if !prices.iter().any(|p| *p >= min && *p <= max) {
                return Some("no variant price in range");
            }
        }
    }

    if filters.inventory_min.is_some() || filters.inventory_max.is_some() {
        if let Some(inventory) = record.total_inventory() {
            if filters.inventory_min.is_some_and(|min| inventory < min) {
                return Some("inventory below minimum");
            }
            if filters.inventory_max.is_some_and(|max| inventory > max) {
                return Some("inventory above maximum");
            }
        }
    }

    if !filters.require_tags.is_empty() {
        let tags = record.tags();
        let any_match = filters
            .require_tags
            .iter()
            .any(|required| tags.iter().any(|t| t.eq_ignore_ascii_case(required)));
        if !any_match {
            return Some("missing required tag");
        }
    }

    None
}
