//! OpenSearch index settings and per-kind field mappings.
//!
//! Each document kind gets its own index, created once with an explicit
//! mapping: text fields are analyzed and carry an exact `keyword` sub-field
//! used for sorting and exact filtering; numeric fields are `long`; dates
//! are `date`; enumerated fields (status, role, sku) are plain `keyword`.

use serde_json::{json, Value};

use search_sync_shared::DocumentKind;

/// Analyzed text field with an exact `keyword` sub-field.
fn text_with_keyword() -> Value {
    json!({
        "type": "text",
        "fields": {
            "keyword": {
                "type": "keyword"
            }
        }
    })
}

/// Get the index settings and mappings for one document kind.
pub fn index_settings(kind: DocumentKind) -> Value {
    let properties = match kind {
        DocumentKind::Product => json!({
            "id": { "type": "keyword" },
            "name": text_with_keyword(),
            "description": { "type": "text" },
            "sku": { "type": "keyword" },
            "category_name": text_with_keyword(),
            "brand_name": text_with_keyword(),
            "price_cents": { "type": "long" },
            "status": { "type": "keyword" },
            "created_at": { "type": "date" },
            "updated_at": { "type": "date" }
        }),
        DocumentKind::User => json!({
            "id": { "type": "keyword" },
            "email": text_with_keyword(),
            "first_name": text_with_keyword(),
            "last_name": text_with_keyword(),
            "role": { "type": "keyword" },
            "created_at": { "type": "date" },
            "updated_at": { "type": "date" }
        }),
        DocumentKind::Invoice => json!({
            "id": { "type": "keyword" },
            "user_id": { "type": "keyword" },
            "status": { "type": "keyword" },
            "total_cents": { "type": "long" },
            "item_count": { "type": "integer" },
            "created_at": { "type": "date" },
            "updated_at": { "type": "date" }
        }),
    };

    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 1
        },
        "mappings": {
            "properties": properties
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_mapping_structure() {
        let settings = index_settings(DocumentKind::Product);

        assert!(settings["settings"]["number_of_shards"].is_number());
        let props = &settings["mappings"]["properties"];

        assert_eq!(props["id"]["type"], "keyword");
        assert_eq!(props["name"]["type"], "text");
        assert_eq!(props["name"]["fields"]["keyword"]["type"], "keyword");
        assert_eq!(props["price_cents"]["type"], "long");
        assert_eq!(props["created_at"]["type"], "date");
    }

    #[test]
    fn test_every_kind_maps_id_and_timestamps() {
        for kind in DocumentKind::ALL {
            let props = index_settings(kind)["mappings"]["properties"].clone();
            assert_eq!(props["id"]["type"], "keyword", "kind {kind}");
            assert_eq!(props["created_at"]["type"], "date", "kind {kind}");
            assert_eq!(props["updated_at"]["type"], "date", "kind {kind}");
        }
    }

    #[test]
    fn test_invoice_mapping_has_revenue_field() {
        let props = index_settings(DocumentKind::Invoice)["mappings"]["properties"].clone();
        assert_eq!(props["total_cents"]["type"], "long");
        assert_eq!(props["status"]["type"], "keyword");
    }
}
