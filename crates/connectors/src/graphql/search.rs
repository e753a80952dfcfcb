use model::filter::ImportFilters;

/// Compile the query-expressible filter predicates into the source API's
/// search mini-language (e.g. `status:active AND vendor:"Acme Co"`).
///
/// The compiled string is passed as a bound variable, but it is still an
/// injection boundary: every user-supplied value is quoted and escaped so a
/// crafted value cannot smuggle extra search clauses into the expression.
pub fn compile(filters: &ImportFilters) -> Option<String> {
    let mut clauses = Vec::new();

    if let Some(status) = &filters.status {
        clauses.push(format!("status:{}", quote(status)));
    }
    if let Some(after) = &filters.created_after {
        clauses.push(format!("created_at:>={}", quote(&after.to_rfc3339())));
    }
    if let Some(before) = &filters.created_before {
        clauses.push(format!("created_at:<={}", quote(&before.to_rfc3339())));
    }
    if let Some(tag) = &filters.tag {
        clauses.push(format!("tag:{}", quote(tag)));
    }
    if let Some(vendor) = &filters.vendor {
        clauses.push(format!("vendor:{}", quote(vendor)));
    }
    if let Some(text) = &filters.text {
        clauses.push(quote(text));
    }

    if clauses.is_empty() {
        None
    } else {
        Some(clauses.join(" AND "))
    }
}

/// Quote a user-supplied value for the search syntax, escaping backslashes
/// and double quotes so the value cannot terminate its own quoting.
fn quote(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('"');
    for ch in value.chars() {
        match ch {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            other => escaped.push(other),
        }
    }
    escaped.push('"');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn empty_filters_compile_to_none() {
        assert_eq!(compile(&ImportFilters::default()), None);
    }

    #[test]
    fn clauses_join_with_and() {
        let filters = ImportFilters {
            status: Some("active".into()),
            vendor: Some("Acme Co".into()),
            ..Default::default()
        };
        assert_eq!(
            compile(&filters).unwrap(),
            r#"status:"active" AND vendor:"Acme Co""#
        );
    }

    #[test]
    fn date_range_uses_rfc3339() {
        let filters = ImportFilters {
            created_after: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            ..Default::default()
        };
        let compiled = compile(&filters).unwrap();
        assert!(compiled.starts_with("created_at:>=\"2024-01-01T00:00:00"));
    }

    #[test]
    fn quoting_defuses_injection_attempts() {
        let filters = ImportFilters {
            tag: Some(r#"sale" OR status:"archived"#.into()),
            ..Default::default()
        };
        let compiled = compile(&filters).unwrap();
        // The embedded quote must come out escaped; no bare `" OR ` clause
        // boundary survives.
        assert_eq!(compiled, r#"tag:"sale\" OR status:\"archived""#);
        assert!(!compiled.contains(r#"sale" OR "#));
    }

    #[test]
    fn backslashes_cannot_unescape_the_closing_quote() {
        let filters = ImportFilters {
            text: Some(r"trailing\".into()),
            ..Default::default()
        };
        assert_eq!(compile(&filters).unwrap(), r#""trailing\\""#);
    }
}
