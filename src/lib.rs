//! Flashdeck Data Access Library
//!
//! Account management and CRUD repositories for a flashcard study app.
//! Records live in a remote keyed JSON document store; authentication is
//! handled by an external identity provider. Every operation is an
//! asynchronous remote call that reports through a registered observer
//! and returns a typed result.

pub mod accounts;
pub mod auth;
pub mod cards;
pub mod categories;
pub mod config;
pub mod models;
pub mod observer;
pub mod store;

pub use accounts::{AccountError, AccountObserver, AccountService};
pub use auth::{AuthError, IdentityProvider, RestIdentity, Session};
pub use cards::{CardError, CardObserver, CardRepository};
pub use categories::{CategoryError, CategoryObserver, CategoryRepository, Counter};
pub use config::{Config, ConfigError};
pub use models::{Category, FlashCard, UserProfile};
pub use observer::ObserverSlot;
pub use store::{DocumentStore, MemoryStore, RestStore, StoreError};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
