//! Category repository.
//!
//! CRUD over `Category` records in the `category` collection. Same
//! shape as the flashcard repository, plus an atomic counter primitive:
//! `update` keeps full-record semantics (the caller supplies the new
//! counter values, last write wins), while `increment_counter` bumps a
//! single counter atomically at the store.

use std::sync::Arc;

use thiserror::Error;

use crate::models::Category;
use crate::observer::ObserverSlot;
use crate::store::{DocumentStore, StoreError};

const CATEGORIES_PATH: &str = "category";

/// Errors reported by the category repository.
#[derive(Error, Debug)]
pub enum CategoryError {
    #[error("failed to create category: {0}")]
    CreateFailed(#[source] StoreError),

    #[error("failed to read categories: {0}")]
    ReadFailed(#[source] StoreError),

    /// One record in a listing could not be parsed. Never fatal to the
    /// batch; reported per record.
    #[error("failed to parse category {key}: {source}")]
    ParseFailed {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to update category: {0}")]
    UpdateFailed(#[source] StoreError),

    #[error("failed to delete category: {0}")]
    DeleteFailed(#[source] StoreError),
}

/// One of a category's study counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Cards,
    Correct,
    Wrong,
}

impl Counter {
    fn field(self) -> &'static str {
        match self {
            Counter::Cards => "numOfCards",
            Counter::Correct => "numCorrect",
            Counter::Wrong => "numWrong",
        }
    }
}

/// Observer for category repository outcomes.
pub trait CategoryObserver: Send + Sync {
    fn category_created(&self, _category: &Category) {}
    fn category_create_failed(&self, _error: &CategoryError) {}
    fn category_read_failed(&self, _error: &CategoryError) {}
    fn category_parse_failed(&self, _error: &CategoryError) {}
    fn category_updated(&self, _category: &Category) {}
    fn category_update_failed(&self, _error: &CategoryError) {}
    fn category_deleted(&self, _category_uid: &str) {}
    fn category_delete_failed(&self, _error: &CategoryError) {}
}

/// CRUD repository for `Category` records.
pub struct CategoryRepository<S: DocumentStore> {
    store: Arc<S>,
    observer: ObserverSlot<dyn CategoryObserver>,
}

impl<S: DocumentStore> CategoryRepository<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            observer: ObserverSlot::new(),
        }
    }

    /// Registers the single observer, replacing any previous one.
    pub fn register_observer(&self, observer: &Arc<dyn CategoryObserver>) {
        self.observer.register(observer);
    }

    pub fn clear_observer(&self) {
        self.observer.clear();
    }

    /// Creates a category under a store-generated key with zeroed
    /// counters and an empty card list.
    pub async fn create(
        &self,
        user_uid: &str,
        card_uid: &str,
        name: &str,
        description: Option<String>,
    ) -> Result<Category, CategoryError> {
        let created = self
            .store
            .create_with_key(CATEGORIES_PATH, |category_uid| {
                Category::new(category_uid, user_uid, card_uid, name, description)
            })
            .await;

        match created {
            Ok(category) => {
                tracing::info!(category_uid = %category.category_uid, "category created");
                self.observer
                    .notify("category_created", |o| o.category_created(&category));
                Ok(category)
            }
            Err(e) => {
                let error = CategoryError::CreateFailed(e);
                self.observer
                    .notify("category_create_failed", |o| o.category_create_failed(&error));
                Err(error)
            }
        }
    }

    /// Lists all categories owned by `user_uid`.
    ///
    /// One-shot fetch of the whole collection, client-side filter,
    /// per-record parse-failure tolerance. Same cost profile as
    /// `CardRepository::list_by_user`.
    pub async fn list_by_user(&self, user_uid: &str) -> Result<Vec<Category>, CategoryError> {
        let children = match self.store.read_children_once(CATEGORIES_PATH).await {
            Ok(children) => children,
            Err(e) => {
                let error = CategoryError::ReadFailed(e);
                self.observer
                    .notify("category_read_failed", |o| o.category_read_failed(&error));
                return Err(error);
            }
        };

        let mut categories = Vec::new();
        for (child_key, doc) in children {
            match serde_json::from_value::<Category>(doc) {
                Ok(category) => categories.push(category),
                Err(source) => {
                    let error = CategoryError::ParseFailed {
                        key: child_key,
                        source,
                    };
                    tracing::warn!(%error, "skipping unparseable category");
                    self.observer
                        .notify("category_parse_failed", |o| o.category_parse_failed(&error));
                }
            }
        }

        categories.retain(|category| category.user_uid == user_uid);
        Ok(categories)
    }

    /// Replaces the category's fields with `updated`, pinning the three
    /// identifiers to the given arguments.
    ///
    /// Counters are written exactly as supplied; two racing updates are
    /// last-write-wins at the store. Use `increment_counter` when only
    /// a counter needs to change.
    pub async fn update(
        &self,
        category_uid: &str,
        user_uid: &str,
        card_uid: &str,
        updated: &Category,
    ) -> Result<Category, CategoryError> {
        let category = Category {
            user_uid: user_uid.to_string(),
            card_uid: card_uid.to_string(),
            category_uid: category_uid.to_string(),
            name: updated.name.clone(),
            description: updated.description.clone(),
            num_of_cards: updated.num_of_cards,
            num_correct: updated.num_correct,
            num_wrong: updated.num_wrong,
            flash_card: updated.flash_card.clone(),
        };

        let written = serde_json::to_value(&category)
            .map_err(StoreError::from)
            .map(|doc| (category, doc));
        let result = match written {
            Ok((category, doc)) => self
                .store
                .update_fields(&format!("{CATEGORIES_PATH}/{category_uid}"), &doc)
                .await
                .map(|()| category),
            Err(e) => Err(e),
        };

        match result {
            Ok(category) => {
                tracing::info!(category_uid, "category updated");
                self.observer
                    .notify("category_updated", |o| o.category_updated(&category));
                Ok(category)
            }
            Err(e) => {
                let error = CategoryError::UpdateFailed(e);
                self.observer
                    .notify("category_update_failed", |o| o.category_update_failed(&error));
                Err(error)
            }
        }
    }

    /// Removes the category at `category_uid`.
    ///
    /// Flashcards referencing it are left alone: no cascade, no orphan
    /// cleanup.
    pub async fn delete(&self, category_uid: &str) -> Result<(), CategoryError> {
        match self
            .store
            .remove(&format!("{CATEGORIES_PATH}/{category_uid}"))
            .await
        {
            Ok(()) => {
                tracing::info!(category_uid, "category deleted");
                self.observer
                    .notify("category_deleted", |o| o.category_deleted(category_uid));
                Ok(())
            }
            Err(e) => {
                let error = CategoryError::DeleteFailed(e);
                self.observer
                    .notify("category_delete_failed", |o| o.category_delete_failed(&error));
                Err(error)
            }
        }
    }

    /// Atomically adds `delta` to one of the category's counters at the
    /// store, without read-modify-write of the rest of the record.
    pub async fn increment_counter(
        &self,
        category_uid: &str,
        counter: Counter,
        delta: i64,
    ) -> Result<(), CategoryError> {
        self.store
            .increment_field(
                &format!("{CATEGORIES_PATH}/{category_uid}"),
                counter.field(),
                delta,
            )
            .await
            .map_err(CategoryError::UpdateFailed)
    }
}
