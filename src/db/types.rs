//! Item record types shared by all adapters.

use serde::{Deserialize, Serialize};

/// Identifier assigned by the backing store.
///
/// Relational engines assign monotonically increasing integers; the document
/// engine assigns ObjectIds, rendered as hex strings. A generated project is
/// baked with exactly one engine, so ids are homogeneous in practice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Int(i64),
    Str(String),
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

/// The one user-visible record a generated backend stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Store-assigned identifier, unique within the items table/collection.
    pub id: ItemId,
    /// Required, non-empty.
    pub name: String,
    /// Optional free text; serialized as JSON null when absent.
    pub description: Option<String>,
}

/// Payload for creating an item. Validation (non-empty name) happens at the
/// route layer before this is constructed.
#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: String,
    pub description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_id_serializes_untagged() {
        let int = serde_json::to_value(ItemId::Int(7)).unwrap();
        assert_eq!(int, serde_json::json!(7));

        let s = serde_json::to_value(ItemId::Str("68a1".into())).unwrap();
        assert_eq!(s, serde_json::json!("68a1"));
    }

    #[test]
    fn test_item_serializes_null_description() {
        let item = Item {
            id: ItemId::Int(1),
            name: "Widget".into(),
            description: None,
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"id": 1, "name": "Widget", "description": null})
        );
    }
}
