use serde::{Deserialize, Serialize};

/// A study category in the `category` collection.
///
/// Counters are plain values, never incremented by the data layer on
/// `update`: callers supply the new counts with full-record semantics.
/// `CategoryRepository::increment_counter` is the atomic alternative.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    #[serde(rename = "userUID")]
    pub user_uid: String,
    /// Associated flashcard key. Opaque to this layer and may dangle.
    #[serde(rename = "cardUID")]
    pub card_uid: String,
    #[serde(rename = "categoryUID")]
    pub category_uid: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "numOfCards", default)]
    pub num_of_cards: u32,
    #[serde(rename = "numCorrect", default)]
    pub num_correct: u32,
    #[serde(rename = "numWrong", default)]
    pub num_wrong: u32,
    /// Keys of the flashcards filed under this category.
    #[serde(rename = "flashCard", skip_serializing_if = "Option::is_none")]
    pub flash_card: Option<Vec<String>>,
}

impl Category {
    /// Creates a category with zeroed counters and an empty card list.
    pub fn new(
        category_uid: impl Into<String>,
        user_uid: impl Into<String>,
        card_uid: impl Into<String>,
        name: impl Into<String>,
        description: Option<String>,
    ) -> Self {
        Self {
            user_uid: user_uid.into(),
            card_uid: card_uid.into(),
            category_uid: category_uid.into(),
            name: name.into(),
            description,
            num_of_cards: 0,
            num_correct: 0,
            num_wrong: 0,
            flash_card: Some(Vec::new()),
        }
    }
}
