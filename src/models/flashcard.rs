use serde::{Deserialize, Serialize};

/// A single flashcard in the `flashcard` collection.
///
/// `card_uid` is the store-issued key of the record. `category` is a
/// caller-supplied reference; nothing checks that it points at an
/// existing category record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlashCard {
    #[serde(rename = "cardUID")]
    pub card_uid: String,
    #[serde(rename = "userUID")]
    pub user_uid: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
}

impl FlashCard {
    pub fn new(
        card_uid: impl Into<String>,
        user_uid: impl Into<String>,
        category: impl Into<String>,
        term: impl Into<String>,
        definition: impl Into<String>,
    ) -> Self {
        Self {
            card_uid: card_uid.into(),
            user_uid: user_uid.into(),
            category: category.into(),
            term: Some(term.into()),
            definition: Some(definition.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_flashcard() {
        let card = FlashCard::new("c1", "u1", "Biology", "Mitosis", "Cell division");
        assert_eq!(card.card_uid, "c1");
        assert_eq!(card.user_uid, "u1");
        assert_eq!(card.term.as_deref(), Some("Mitosis"));
        assert_eq!(card.definition.as_deref(), Some("Cell division"));
    }

    #[test]
    fn test_wire_field_names() {
        let card = FlashCard::new("c1", "u1", "Biology", "Mitosis", "Cell division");
        let json = serde_json::to_value(&card).unwrap();
        assert!(json.get("cardUID").is_some());
        assert!(json.get("userUID").is_some());
        assert_eq!(json["category"], "Biology");
    }

    #[test]
    fn test_deserialize_without_term_or_definition() {
        let card: FlashCard =
            serde_json::from_str(r#"{"cardUID":"c1","userUID":"u1","category":"Math"}"#).unwrap();
        assert!(card.term.is_none());
        assert!(card.definition.is_none());
    }
}
