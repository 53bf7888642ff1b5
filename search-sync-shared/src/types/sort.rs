//! Sort specification parsing and per-kind sort field allow-lists.
//!
//! A sort specification arrives as a single comma-separated string such as
//! `"price:desc,name"`. Each term names a logical field and an optional
//! direction; a missing direction defaults to ascending. Logical names are
//! translated to physical index fields through a fixed per-kind allow-list
//! map. A term naming a field outside the map is dropped by the translator
//! (never passed through to the index as-is).

use serde::{Deserialize, Serialize};

use crate::types::document::DocumentKind;

/// Sort direction, normalized to the index's lowercase casing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    /// Parse a direction string case-insensitively. Anything other than
    /// "desc" sorts ascending.
    fn parse(raw: &str) -> SortDirection {
        if raw.trim().eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }
}

/// One parsed `(logical field, direction)` sort term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortTerm {
    pub field: String,
    pub direction: SortDirection,
}

/// Parse a comma-separated sort specification into ordered terms.
///
/// Empty segments are skipped; an empty or all-whitespace spec yields no
/// terms. Anything after the first `:` in a segment is treated as the
/// direction.
pub fn parse_sort_spec(spec: &str) -> Vec<SortTerm> {
    spec.split(',')
        .filter_map(|segment| {
            let segment = segment.trim();
            if segment.is_empty() {
                return None;
            }
            let (field, direction) = match segment.split_once(':') {
                Some((field, dir)) => (field.trim(), SortDirection::parse(dir)),
                None => (segment, SortDirection::Asc),
            };
            if field.is_empty() {
                return None;
            }
            Some(SortTerm {
                field: field.to_string(),
                direction,
            })
        })
        .collect()
}

/// Allow-list map from logical sort field to physical index field, per kind.
///
/// Text fields sort on their exact `keyword` sub-field; numeric and date
/// fields sort on the field itself.
pub fn sort_field_map(kind: DocumentKind) -> &'static [(&'static str, &'static str)] {
    match kind {
        DocumentKind::Product => &[
            ("name", "name.keyword"),
            ("sku", "sku"),
            ("price", "price_cents"),
            ("category", "category_name.keyword"),
            ("brand", "brand_name.keyword"),
            ("status", "status"),
            ("created_at", "created_at"),
            ("updated_at", "updated_at"),
        ],
        DocumentKind::User => &[
            ("email", "email.keyword"),
            ("first_name", "first_name.keyword"),
            ("last_name", "last_name.keyword"),
            ("role", "role"),
            ("created_at", "created_at"),
            ("updated_at", "updated_at"),
        ],
        DocumentKind::Invoice => &[
            ("status", "status"),
            ("total", "total_cents"),
            ("item_count", "item_count"),
            ("created_at", "created_at"),
            ("updated_at", "updated_at"),
        ],
    }
}

/// Translate a logical sort field through the kind's allow-list.
///
/// Returns `None` for fields outside the map; callers drop such terms.
pub fn resolve_sort_field(kind: DocumentKind, logical: &str) -> Option<&'static str> {
    sort_field_map(kind)
        .iter()
        .find(|(name, _)| *name == logical)
        .map(|(_, physical)| *physical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_sort_spec() {
        let terms = parse_sort_spec("price:desc,name");
        assert_eq!(terms.len(), 2);
        assert_eq!(terms[0].field, "price");
        assert_eq!(terms[0].direction, SortDirection::Desc);
        assert_eq!(terms[1].field, "name");
        assert_eq!(terms[1].direction, SortDirection::Asc);
    }

    #[test]
    fn test_parse_sort_spec_case_normalization() {
        let terms = parse_sort_spec("price:DESC,name:Asc");
        assert_eq!(terms[0].direction, SortDirection::Desc);
        assert_eq!(terms[1].direction, SortDirection::Asc);
    }

    #[test]
    fn test_parse_sort_spec_empty_segments() {
        assert!(parse_sort_spec("").is_empty());
        assert!(parse_sort_spec("  ,  ,").is_empty());
        assert_eq!(parse_sort_spec(",price,").len(), 1);
    }

    #[test]
    fn test_resolve_sort_field() {
        assert_eq!(
            resolve_sort_field(DocumentKind::Product, "name"),
            Some("name.keyword")
        );
        assert_eq!(
            resolve_sort_field(DocumentKind::Product, "price"),
            Some("price_cents")
        );
        assert_eq!(
            resolve_sort_field(DocumentKind::Invoice, "total"),
            Some("total_cents")
        );
        assert_eq!(resolve_sort_field(DocumentKind::User, "password"), None);
    }

    #[test]
    fn test_every_mapped_field_is_unique() {
        for kind in DocumentKind::ALL {
            let map = sort_field_map(kind);
            for (i, (name, _)) in map.iter().enumerate() {
                assert!(
                    !map[i + 1..].iter().any(|(other, _)| other == name),
                    "duplicate logical field {name} for kind {kind}"
                );
            }
        }
    }
}
