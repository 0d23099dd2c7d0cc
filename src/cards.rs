//! Flashcard repository.
//!
//! CRUD over `FlashCard` records in the `flashcard` collection of the
//! document store. Every operation runs one remote call, notifies the
//! registered observer with the outcome and returns it to the caller.

use std::sync::Arc;

use thiserror::Error;

use crate::models::FlashCard;
use crate::observer::ObserverSlot;
use crate::store::{DocumentStore, StoreError};

const CARDS_PATH: &str = "flashcard";

/// Errors reported by the flashcard repository.
#[derive(Error, Debug)]
pub enum CardError {
    #[error("failed to create flashcard: {0}")]
    CreateFailed(#[source] StoreError),

    #[error("failed to read flashcards: {0}")]
    ReadFailed(#[source] StoreError),

    /// One record in a listing could not be parsed. Never fatal to the
    /// batch; reported per record.
    #[error("failed to parse flashcard {key}: {source}")]
    ParseFailed {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to update flashcard: {0}")]
    UpdateFailed(#[source] StoreError),

    #[error("failed to delete flashcard: {0}")]
    DeleteFailed(#[source] StoreError),
}

/// Observer for flashcard repository outcomes.
///
/// All methods have empty default bodies so an observer implements
/// only what it cares about.
pub trait CardObserver: Send + Sync {
    fn card_created(&self, _card: &FlashCard) {}
    fn card_create_failed(&self, _error: &CardError) {}
    fn card_read_failed(&self, _error: &CardError) {}
    fn card_parse_failed(&self, _error: &CardError) {}
    fn card_updated(&self, _card: &FlashCard) {}
    fn card_update_failed(&self, _error: &CardError) {}
    fn card_deleted(&self, _card_uid: &str) {}
    fn card_delete_failed(&self, _error: &CardError) {}
}

/// CRUD repository for `FlashCard` records.
pub struct CardRepository<S: DocumentStore> {
    store: Arc<S>,
    observer: ObserverSlot<dyn CardObserver>,
}

impl<S: DocumentStore> CardRepository<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            observer: ObserverSlot::new(),
        }
    }

    /// Registers the single observer, replacing any previous one.
    pub fn register_observer(&self, observer: &Arc<dyn CardObserver>) {
        self.observer.register(observer);
    }

    pub fn clear_observer(&self) {
        self.observer.clear();
    }

    /// Creates a flashcard under a store-generated key.
    ///
    /// The generated key becomes the record's `cardUID` and the path it
    /// is written at, in a single store operation.
    pub async fn create(
        &self,
        user_uid: &str,
        category: &str,
        term: &str,
        definition: &str,
    ) -> Result<FlashCard, CardError> {
        let created = self
            .store
            .create_with_key(CARDS_PATH, |card_uid| {
                FlashCard::new(card_uid, user_uid, category, term, definition)
            })
            .await;

        match created {
            Ok(card) => {
                tracing::info!(card_uid = %card.card_uid, "flashcard created");
                self.observer.notify("card_created", |o| o.card_created(&card));
                Ok(card)
            }
            Err(e) => {
                let error = CardError::CreateFailed(e);
                self.observer
                    .notify("card_create_failed", |o| o.card_create_failed(&error));
                Err(error)
            }
        }
    }

    /// Lists all flashcards owned by `user_uid`.
    ///
    /// Fetches the entire collection in one shot and filters client
    /// side, so cost grows with the total number of cards in the store,
    /// not the user's. A record that fails to parse is skipped and
    /// reported individually; it never fails the batch. Order is not
    /// guaranteed.
    pub async fn list_by_user(&self, user_uid: &str) -> Result<Vec<FlashCard>, CardError> {
        let children = match self.store.read_children_once(CARDS_PATH).await {
            Ok(children) => children,
            Err(e) => {
                let error = CardError::ReadFailed(e);
                self.observer
                    .notify("card_read_failed", |o| o.card_read_failed(&error));
                return Err(error);
            }
        };

        let mut cards = Vec::new();
        for (child_key, doc) in children {
            match serde_json::from_value::<FlashCard>(doc) {
                Ok(card) => cards.push(card),
                Err(source) => {
                    let error = CardError::ParseFailed {
                        key: child_key,
                        source,
                    };
                    tracing::warn!(%error, "skipping unparseable flashcard");
                    self.observer
                        .notify("card_parse_failed", |o| o.card_parse_failed(&error));
                }
            }
        }

        cards.retain(|card| card.user_uid == user_uid);
        Ok(cards)
    }

    /// Replaces the card's fields with `updated`, pinning `cardUID` and
    /// `userUID` to the given identifiers.
    ///
    /// Whether updating a nonexistent key succeeds is store-defined;
    /// this layer reports the transport result as-is.
    pub async fn update(
        &self,
        card_uid: &str,
        user_uid: &str,
        updated: &FlashCard,
    ) -> Result<FlashCard, CardError> {
        let card = FlashCard {
            card_uid: card_uid.to_string(),
            user_uid: user_uid.to_string(),
            category: updated.category.clone(),
            term: updated.term.clone(),
            definition: updated.definition.clone(),
        };

        let written = serde_json::to_value(&card)
            .map_err(StoreError::from)
            .map(|doc| (card, doc));
        let result = match written {
            Ok((card, doc)) => self
                .store
                .update_fields(&format!("{CARDS_PATH}/{card_uid}"), &doc)
                .await
                .map(|()| card),
            Err(e) => Err(e),
        };

        match result {
            Ok(card) => {
                tracing::info!(card_uid, "flashcard updated");
                self.observer.notify("card_updated", |o| o.card_updated(&card));
                Ok(card)
            }
            Err(e) => {
                let error = CardError::UpdateFailed(e);
                self.observer
                    .notify("card_update_failed", |o| o.card_update_failed(&error));
                Err(error)
            }
        }
    }

    /// Removes the card at `card_uid`.
    pub async fn delete(&self, card_uid: &str) -> Result<(), CardError> {
        match self.store.remove(&format!("{CARDS_PATH}/{card_uid}")).await {
            Ok(()) => {
                tracing::info!(card_uid, "flashcard deleted");
                self.observer.notify("card_deleted", |o| o.card_deleted(card_uid));
                Ok(())
            }
            Err(e) => {
                let error = CardError::DeleteFailed(e);
                self.observer
                    .notify("card_delete_failed", |o| o.card_delete_failed(&error));
                Err(error)
            }
        }
    }
}
