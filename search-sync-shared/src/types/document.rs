//! Indexed document types for the search-sync pipeline.
//!
//! One flat, denormalized document shape per entity kind. Each document is
//! keyed in the index by the string form of its source primary key; that `id`
//! never changes across the document's lifetime.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The three document kinds the pipeline hard-codes.
///
/// Each kind maps to exactly one search index and one owning service. The
/// owning service publishes change envelopes on the channels named by
/// [`DocumentKind::channel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Product,
    User,
    Invoice,
}

impl DocumentKind {
    /// All kinds, in bootstrap order.
    pub const ALL: [DocumentKind; 3] =
        [DocumentKind::Product, DocumentKind::User, DocumentKind::Invoice];

    /// The name of the search index holding documents of this kind.
    pub fn index_name(&self) -> &'static str {
        match self {
            DocumentKind::Product => "products",
            DocumentKind::User => "users",
            DocumentKind::Invoice => "invoices",
        }
    }

    /// The service that owns the relational system-of-record for this kind.
    pub fn owning_service(&self) -> &'static str {
        match self {
            DocumentKind::Product => "catalog",
            DocumentKind::User => "accounts",
            DocumentKind::Invoice => "billing",
        }
    }

    /// The singular entity name used in channel names.
    pub fn entity_name(&self) -> &'static str {
        match self {
            DocumentKind::Product => "product",
            DocumentKind::User => "user",
            DocumentKind::Invoice => "invoice",
        }
    }

    /// The broadcast channel name for one (kind, operation) pair,
    /// e.g. `"catalog.created-product"`.
    pub fn channel(&self, op: crate::types::envelope::ChangeOp) -> String {
        format!("{}.{}-{}", self.owning_service(), op.as_str(), self.entity_name())
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.entity_name())
    }
}

/// Denormalized product document.
///
/// `category_name` and `brand_name` are inlined from their lookup tables at
/// write time, so the read path never joins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductDocument {
    /// String form of the source primary key. Stable for the document's lifetime.
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub sku: String,
    pub category_name: String,
    pub brand_name: String,
    /// Unit price in minor currency units.
    pub price_cents: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Denormalized user document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserDocument {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Denormalized invoice document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceDocument {
    pub id: String,
    pub user_id: String,
    pub status: String,
    /// Invoice total in minor currency units.
    pub total_cents: i64,
    pub item_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::envelope::ChangeOp;

    #[test]
    fn test_index_names() {
        assert_eq!(DocumentKind::Product.index_name(), "products");
        assert_eq!(DocumentKind::User.index_name(), "users");
        assert_eq!(DocumentKind::Invoice.index_name(), "invoices");
    }

    #[test]
    fn test_channel_names() {
        assert_eq!(
            DocumentKind::Product.channel(ChangeOp::Created),
            "catalog.created-product"
        );
        assert_eq!(
            DocumentKind::User.channel(ChangeOp::Updated),
            "accounts.updated-user"
        );
        assert_eq!(
            DocumentKind::Invoice.channel(ChangeOp::Deleted),
            "billing.deleted-invoice"
        );
    }

    #[test]
    fn test_product_serialization_round_trip() {
        let doc = ProductDocument {
            id: "42".to_string(),
            name: "Trail Shoe".to_string(),
            description: None,
            sku: "SHOE-42".to_string(),
            category_name: "Footwear".to_string(),
            brand_name: "Acme".to_string(),
            price_cents: 10000,
            status: "active".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_string(&doc).unwrap();
        let parsed: ProductDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(doc, parsed);
        // Absent description is omitted from the wire form entirely.
        assert!(!json.contains("description"));
    }
}
