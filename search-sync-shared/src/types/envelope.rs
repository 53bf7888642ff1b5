//! Change envelope wire format.
//!
//! The entity kind and operation are implicit in the broadcast channel name,
//! so the wire payload is just UTF-8 text: the full denormalized document as
//! JSON for create/update, or the bare document id for delete. The indexer
//! therefore never re-queries the owning service for a change it receives.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::document::{DocumentKind, InvoiceDocument, ProductDocument, UserDocument};

/// The operation a change envelope describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeOp {
    Created,
    Updated,
    Deleted,
}

impl ChangeOp {
    /// All operations, in the order loops are spawned.
    pub const ALL: [ChangeOp; 3] = [ChangeOp::Created, ChangeOp::Updated, ChangeOp::Deleted];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeOp::Created => "created",
            ChangeOp::Updated => "updated",
            ChangeOp::Deleted => "deleted",
        }
    }
}

impl std::fmt::Display for ChangeOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from encoding or decoding change envelopes.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// Payload could not be serialized or deserialized.
    #[error("Envelope codec error for {kind}: {message}")]
    Codec { kind: DocumentKind, message: String },

    /// Delete payload carried an empty id.
    #[error("Delete envelope for {0} carried an empty document id")]
    EmptyId(DocumentKind),
}

/// One decoded change notification.
///
/// For `Created`/`Updated` the payload holds the full document as a JSON
/// value; for `Deleted` only the identifier is carried.
#[derive(Debug, Clone)]
pub struct ChangeEnvelope {
    pub op: ChangeOp,
    pub document_id: String,
    pub payload: Option<serde_json::Value>,
}

impl ChangeEnvelope {
    /// Encode a full document for a create/update channel.
    pub fn encode_upsert<T: Serialize>(document: &T, kind: DocumentKind) -> Result<String, EnvelopeError> {
        serde_json::to_string(document).map_err(|e| EnvelopeError::Codec {
            kind,
            message: e.to_string(),
        })
    }

    /// Encode a bare identifier for a delete channel.
    pub fn encode_delete(id: &str) -> String {
        id.to_string()
    }

    /// Decode a create/update payload received on a channel of the given kind.
    ///
    /// The payload is validated against the kind's typed document shape, then
    /// handed back as `(stable id, document value)` ready for an upsert.
    pub fn decode_upsert(
        kind: DocumentKind,
        op: ChangeOp,
        payload: &str,
    ) -> Result<ChangeEnvelope, EnvelopeError> {
        let codec = |e: serde_json::Error| EnvelopeError::Codec {
            kind,
            message: e.to_string(),
        };

        let (id, value) = match kind {
            DocumentKind::Product => {
                let doc: ProductDocument = serde_json::from_str(payload).map_err(codec)?;
                (doc.id.clone(), serde_json::to_value(doc).map_err(codec)?)
            }
            DocumentKind::User => {
                let doc: UserDocument = serde_json::from_str(payload).map_err(codec)?;
                (doc.id.clone(), serde_json::to_value(doc).map_err(codec)?)
            }
            DocumentKind::Invoice => {
                let doc: InvoiceDocument = serde_json::from_str(payload).map_err(codec)?;
                (doc.id.clone(), serde_json::to_value(doc).map_err(codec)?)
            }
        };

        Ok(ChangeEnvelope {
            op,
            document_id: id,
            payload: Some(value),
        })
    }

    /// Decode a delete payload: the bare stable id.
    pub fn decode_delete(kind: DocumentKind, payload: &str) -> Result<ChangeEnvelope, EnvelopeError> {
        let id = payload.trim();
        if id.is_empty() {
            return Err(EnvelopeError::EmptyId(kind));
        }
        Ok(ChangeEnvelope {
            op: ChangeOp::Deleted,
            document_id: id.to_string(),
            payload: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_product() -> ProductDocument {
        ProductDocument {
            id: "7".to_string(),
            name: "Shoe".to_string(),
            description: Some("Running shoe".to_string()),
            sku: "SHOE-7".to_string(),
            category_name: "Footwear".to_string(),
            brand_name: "Acme".to_string(),
            price_cents: 10000,
            status: "active".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_upsert_round_trip() {
        let doc = sample_product();
        let wire = ChangeEnvelope::encode_upsert(&doc, DocumentKind::Product).unwrap();
        let envelope =
            ChangeEnvelope::decode_upsert(DocumentKind::Product, ChangeOp::Created, &wire).unwrap();

        assert_eq!(envelope.op, ChangeOp::Created);
        assert_eq!(envelope.document_id, "7");
        let payload = envelope.payload.unwrap();
        assert_eq!(payload["price_cents"], 10000);
        assert_eq!(payload["name"], "Shoe");
    }

    #[test]
    fn test_decode_upsert_rejects_wrong_shape() {
        let result = ChangeEnvelope::decode_upsert(
            DocumentKind::Product,
            ChangeOp::Updated,
            r#"{"id":"7"}"#,
        );
        assert!(matches!(result, Err(EnvelopeError::Codec { .. })));
    }

    #[test]
    fn test_decode_delete_bare_id() {
        let envelope = ChangeEnvelope::decode_delete(DocumentKind::Product, "7").unwrap();
        assert_eq!(envelope.document_id, "7");
        assert_eq!(envelope.op, ChangeOp::Deleted);
        assert!(envelope.payload.is_none());
    }

    #[test]
    fn test_decode_delete_empty_id_is_error() {
        let result = ChangeEnvelope::decode_delete(DocumentKind::User, "  ");
        assert!(matches!(result, Err(EnvelopeError::EmptyId(_))));
    }
}
