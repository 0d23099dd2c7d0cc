//! Identity provider boundary.
//!
//! Authentication is delegated to an external provider that issues
//! sessions and drives the verification / password-reset email flows.
//! [`IdentityProvider`] is the contract this layer depends on;
//! [`RestIdentity`] implements it against an HTTP provider.

mod rest;

pub use rest::RestIdentity;

use thiserror::Error;

/// An authenticated (or freshly registered) provider session.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Provider-issued user identifier.
    pub uid: String,
    pub email: String,
    /// Whether the user has confirmed their email address.
    pub email_verified: bool,
}

/// Errors reported by the identity provider.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Transport-level failure (connection, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider rejected the request (bad credentials, duplicate
    /// email, malformed address, ...).
    #[error("provider rejected request: {0}")]
    Rejected(String),

    /// An operation that needs an active session was called without one.
    #[error("no active session")]
    NoSession,
}

/// External authentication service.
#[allow(async_fn_in_trait)]
pub trait IdentityProvider: Send + Sync {
    /// Registers a new identity. The returned session is unverified.
    async fn create_user(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Authenticates with email and password.
    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    /// Terminates the current session.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Asks the provider to email a verification link for `session`.
    async fn send_verification_email(&self, session: &Session) -> Result<(), AuthError>;

    /// Asks the provider to email a password-reset link.
    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError>;
}
