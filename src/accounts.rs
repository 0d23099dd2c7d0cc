//! Account service.
//!
//! Bridges the identity provider and the `users` collection of the
//! document store: registers accounts, signs sessions in and out,
//! drives verification and password-reset emails, and mirrors a
//! `UserProfile` record for every created account.
//!
//! One instance is constructed at process start and shared by
//! reference; there is no hidden global.

use std::sync::Arc;

use serde_json::json;
use thiserror::Error;

use crate::auth::{AuthError, IdentityProvider, Session};
use crate::models::UserProfile;
use crate::observer::ObserverSlot;
use crate::store::{DocumentStore, StoreError};

const USERS_PATH: &str = "users";

/// Errors reported by the account service.
#[derive(Error, Debug)]
pub enum AccountError {
    #[error("account creation failed: {0}")]
    CreationFailed(#[source] AuthError),

    /// The account exists but the verification email could not be
    /// sent. Account creation is not rolled back.
    #[error("verification email could not be sent: {0}")]
    EmailVerificationFailed(#[source] AuthError),

    #[error("sign-in failed: {0}")]
    SignInFailed(#[source] AuthError),

    /// The credentials were valid but the email address has not been
    /// verified yet. The session is terminated.
    #[error("email address is not verified")]
    EmailVerificationRequired,

    #[error("sign-out failed: {0}")]
    SignOutFailed(#[source] AuthError),

    #[error("password reset failed: {0}")]
    PasswordResetFailed(#[source] AuthError),

    #[error("failed to write user profile: {0}")]
    ProfileWriteFailed(#[source] StoreError),

    #[error("failed to read user profile: {0}")]
    ReadFailed(#[source] StoreError),

    #[error("failed to parse user profile {user_uid}: {source}")]
    ParseFailed {
        user_uid: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no profile stored for user {0}")]
    ProfileNotFound(String),
}

/// Observer for account service outcomes.
pub trait AccountObserver: Send + Sync {
    fn account_created(&self, _profile: &UserProfile) {}
    fn account_create_failed(&self, _error: &AccountError) {}
    fn signed_in(&self, _session: &Session) {}
    fn sign_in_failed(&self, _error: &AccountError) {}
    fn signed_out(&self) {}
    fn sign_out_failed(&self, _error: &AccountError) {}
    fn verification_email_sent(&self, _email: &str) {}
    fn verification_email_failed(&self, _error: &AccountError) {}
    fn password_reset_sent(&self, _email: &str) {}
    fn password_reset_failed(&self, _error: &AccountError) {}
}

/// Account management over an identity provider and the `users`
/// collection.
pub struct AccountService<P: IdentityProvider, S: DocumentStore> {
    provider: Arc<P>,
    store: Arc<S>,
    observer: ObserverSlot<dyn AccountObserver>,
}

impl<P: IdentityProvider, S: DocumentStore> AccountService<P, S> {
    pub fn new(provider: Arc<P>, store: Arc<S>) -> Self {
        Self {
            provider,
            store,
            observer: ObserverSlot::new(),
        }
    }

    /// Registers the single observer, replacing any previous one.
    pub fn register_observer(&self, observer: &Arc<dyn AccountObserver>) {
        self.observer.register(observer);
    }

    pub fn clear_observer(&self) {
        self.observer.clear();
    }

    /// Registers an account with the provider, requests a verification
    /// email and mirrors a `UserProfile` into the store.
    ///
    /// The profile is keyed by the provider-issued UID, which is also
    /// stored in the record's `userUID` field, so later lookups by
    /// session UID resolve.
    ///
    /// A failed verification email does not roll anything back: the
    /// profile is still written and the error is reported afterwards.
    /// The username-collision check is best effort only; two racing
    /// registrations of the same name both succeed.
    pub async fn create_account(
        &self,
        email: &str,
        password: &str,
        user_name: &str,
    ) -> Result<UserProfile, AccountError> {
        let session = match self.provider.create_user(email, password).await {
            Ok(session) => session,
            Err(e) => {
                let error = AccountError::CreationFailed(e);
                self.observer
                    .notify("account_create_failed", |o| o.account_create_failed(&error));
                return Err(error);
            }
        };

        self.warn_on_username_collision(user_name).await;

        let email_error = match self.provider.send_verification_email(&session).await {
            Ok(()) => {
                self.observer
                    .notify("verification_email_sent", |o| o.verification_email_sent(email));
                None
            }
            Err(e) => {
                let error = AccountError::EmailVerificationFailed(e);
                tracing::warn!(%error, email, "verification email not sent");
                self.observer
                    .notify("verification_email_failed", |o| {
                        o.verification_email_failed(&error)
                    });
                Some(error)
            }
        };

        let profile = UserProfile::new(&session.uid, user_name);
        let written = serde_json::to_value(&profile)
            .map_err(StoreError::from)
            .map(|doc| (profile, doc));
        let profile = match written {
            Ok((profile, doc)) => {
                let path = format!("{USERS_PATH}/{}", session.uid);
                match self.store.write(&path, &doc).await {
                    Ok(()) => profile,
                    Err(e) => {
                        let error = AccountError::ProfileWriteFailed(e);
                        self.observer
                            .notify("account_create_failed", |o| o.account_create_failed(&error));
                        return Err(error);
                    }
                }
            }
            Err(e) => {
                let error = AccountError::ProfileWriteFailed(e);
                self.observer
                    .notify("account_create_failed", |o| o.account_create_failed(&error));
                return Err(error);
            }
        };

        tracing::info!(user_uid = %profile.user_uid, "account created");
        self.observer
            .notify("account_created", |o| o.account_created(&profile));

        match email_error {
            Some(error) => Err(error),
            None => Ok(profile),
        }
    }

    /// Best-effort duplicate-username scan. Ignores failures and never
    /// blocks creation; a name taken between this check and the write
    /// goes unnoticed.
    async fn warn_on_username_collision(&self, user_name: &str) {
        match self.store.read_children_once(USERS_PATH).await {
            Ok(children) => {
                let taken = children.values().any(|doc| {
                    doc.get("userName").and_then(|v| v.as_str()) == Some(user_name)
                });
                if taken {
                    tracing::warn!(user_name, "username is already taken");
                }
            }
            Err(e) => tracing::debug!(error = %e, "username collision check skipped"),
        }
    }

    /// Authenticates with the provider.
    ///
    /// An unverified session is terminated immediately and never
    /// produces a signed-in notification. On success the observer
    /// receives the provider session, not the stored profile.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AccountError> {
        let session = match self.provider.sign_in(email, password).await {
            Ok(session) => session,
            Err(e) => {
                let error = AccountError::SignInFailed(e);
                self.observer.notify("sign_in_failed", |o| o.sign_in_failed(&error));
                return Err(error);
            }
        };

        if !session.email_verified {
            let error = AccountError::EmailVerificationRequired;
            self.observer.notify("sign_in_failed", |o| o.sign_in_failed(&error));
            if let Err(e) = self.logout().await {
                tracing::warn!(error = %e, "could not terminate unverified session");
            }
            return Err(error);
        }

        tracing::info!(uid = %session.uid, "signed in");
        self.observer.notify("signed_in", |o| o.signed_in(&session));
        Ok(session)
    }

    /// Terminates the provider session.
    pub async fn logout(&self) -> Result<(), AccountError> {
        match self.provider.sign_out().await {
            Ok(()) => {
                self.observer.notify("signed_out", |o| o.signed_out());
                Ok(())
            }
            Err(e) => {
                let error = AccountError::SignOutFailed(e);
                self.observer
                    .notify("sign_out_failed", |o| o.sign_out_failed(&error));
                Err(error)
            }
        }
    }

    /// Requests a password-reset email for `email`.
    pub async fn forgot_password(&self, email: &str) -> Result<(), AccountError> {
        match self.provider.send_password_reset(email).await {
            Ok(()) => {
                self.observer
                    .notify("password_reset_sent", |o| o.password_reset_sent(email));
                Ok(())
            }
            Err(e) => {
                let error = AccountError::PasswordResetFailed(e);
                self.observer
                    .notify("password_reset_failed", |o| o.password_reset_failed(&error));
                Err(error)
            }
        }
    }

    /// Resolves a user's display name from their profile record.
    ///
    /// A missing profile and an unparseable profile are both reported
    /// to the caller, not just logged.
    pub async fn resolve_user_name(&self, user_uid: &str) -> Result<String, AccountError> {
        let doc = self
            .store
            .read_once(&format!("{USERS_PATH}/{user_uid}"))
            .await
            .map_err(AccountError::ReadFailed)?
            .ok_or_else(|| AccountError::ProfileNotFound(user_uid.to_string()))?;

        let profile: UserProfile =
            serde_json::from_value(doc).map_err(|source| AccountError::ParseFailed {
                user_uid: user_uid.to_string(),
                source,
            })?;
        Ok(profile.user_name)
    }

    /// Overwrites the profile's `userName` field without reading or
    /// merging the rest of the record.
    pub async fn rename_user(&self, user_uid: &str, new_name: &str) -> Result<(), AccountError> {
        self.store
            .update_fields(
                &format!("{USERS_PATH}/{user_uid}"),
                &json!({ "userName": new_name }),
            )
            .await
            .map_err(AccountError::ProfileWriteFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Configurable in-memory identity provider.
    #[derive(Default)]
    struct MockProvider {
        verified: bool,
        reject_create: bool,
        reject_sign_in: bool,
        reject_sign_out: bool,
        reject_verification_email: bool,
        reject_password_reset: bool,
        sign_outs: AtomicUsize,
    }

    impl MockProvider {
        fn session(email: &str, verified: bool) -> Session {
            Session {
                uid: format!("uid-{email}"),
                email: email.to_string(),
                email_verified: verified,
            }
        }
    }

    impl IdentityProvider for MockProvider {
        async fn create_user(&self, email: &str, _password: &str) -> Result<Session, AuthError> {
            if self.reject_create {
                return Err(AuthError::Rejected("EMAIL_EXISTS".into()));
            }
            Ok(Self::session(email, false))
        }

        async fn sign_in(&self, email: &str, _password: &str) -> Result<Session, AuthError> {
            if self.reject_sign_in {
                return Err(AuthError::Rejected("INVALID_PASSWORD".into()));
            }
            Ok(Self::session(email, self.verified))
        }

        async fn sign_out(&self) -> Result<(), AuthError> {
            if self.reject_sign_out {
                return Err(AuthError::NoSession);
            }
            self.sign_outs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn send_verification_email(&self, _session: &Session) -> Result<(), AuthError> {
            if self.reject_verification_email {
                return Err(AuthError::Rejected("TOO_MANY_ATTEMPTS".into()));
            }
            Ok(())
        }

        async fn send_password_reset(&self, _email: &str) -> Result<(), AuthError> {
            if self.reject_password_reset {
                return Err(AuthError::Rejected("EMAIL_NOT_FOUND".into()));
            }
            Ok(())
        }
    }

    #[derive(Debug, PartialEq)]
    enum Event {
        AccountCreated(String),
        CreateFailed,
        SignedIn(String),
        SignInFailed,
        SignedOut,
        VerificationSent(String),
        VerificationFailed,
        ResetSent(String),
        ResetFailed,
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<Event>>,
    }

    impl AccountObserver for Recorder {
        fn account_created(&self, profile: &UserProfile) {
            self.events
                .lock()
                .unwrap()
                .push(Event::AccountCreated(profile.user_uid.clone()));
        }
        fn account_create_failed(&self, _error: &AccountError) {
            self.events.lock().unwrap().push(Event::CreateFailed);
        }
        fn signed_in(&self, session: &Session) {
            self.events
                .lock()
                .unwrap()
                .push(Event::SignedIn(session.uid.clone()));
        }
        fn sign_in_failed(&self, _error: &AccountError) {
            self.events.lock().unwrap().push(Event::SignInFailed);
        }
        fn signed_out(&self) {
            self.events.lock().unwrap().push(Event::SignedOut);
        }
        fn verification_email_sent(&self, email: &str) {
            self.events
                .lock()
                .unwrap()
                .push(Event::VerificationSent(email.to_string()));
        }
        fn verification_email_failed(&self, _error: &AccountError) {
            self.events.lock().unwrap().push(Event::VerificationFailed);
        }
        fn password_reset_sent(&self, email: &str) {
            self.events
                .lock()
                .unwrap()
                .push(Event::ResetSent(email.to_string()));
        }
        fn password_reset_failed(&self, _error: &AccountError) {
            self.events.lock().unwrap().push(Event::ResetFailed);
        }
    }

    struct TestContext {
        provider: Arc<MockProvider>,
        store: Arc<MemoryStore>,
        service: AccountService<MockProvider, MemoryStore>,
        recorder: Arc<Recorder>,
    }

    fn setup_with(provider: MockProvider) -> TestContext {
        let provider = Arc::new(provider);
        let store = Arc::new(MemoryStore::new());
        let service = AccountService::new(provider.clone(), store.clone());
        let recorder = Arc::new(Recorder::default());
        let observer: Arc<dyn AccountObserver> = recorder.clone();
        service.register_observer(&observer);
        TestContext {
            provider,
            store,
            service,
            recorder,
        }
    }

    fn setup() -> TestContext {
        setup_with(MockProvider::default())
    }

    #[tokio::test]
    async fn test_create_account_mirrors_profile_under_provider_uid() {
        let ctx = setup();

        let profile = ctx
            .service
            .create_account("alice@example.com", "hunter2", "alice")
            .await
            .unwrap();

        assert_eq!(profile.user_uid, "uid-alice@example.com");
        assert_eq!(profile.user_name, "alice");

        // path key and record field use the same identifier
        let stored = ctx
            .store
            .read_once("users/uid-alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored["userUID"], "uid-alice@example.com");

        let events = ctx.recorder.events.lock().unwrap();
        assert!(events.contains(&Event::VerificationSent("alice@example.com".into())));
        assert!(events.contains(&Event::AccountCreated("uid-alice@example.com".into())));
    }

    #[tokio::test]
    async fn test_create_account_provider_rejection() {
        let ctx = setup_with(MockProvider {
            reject_create: true,
            ..Default::default()
        });

        let err = ctx
            .service
            .create_account("alice@example.com", "hunter2", "alice")
            .await
            .unwrap_err();

        assert!(matches!(err, AccountError::CreationFailed(_)));
        assert!(ctx.store.is_empty());
        assert_eq!(
            *ctx.recorder.events.lock().unwrap(),
            vec![Event::CreateFailed]
        );
    }

    #[tokio::test]
    async fn test_verification_email_failure_does_not_roll_back() {
        let ctx = setup_with(MockProvider {
            reject_verification_email: true,
            ..Default::default()
        });

        let err = ctx
            .service
            .create_account("bob@example.com", "hunter2", "bob")
            .await
            .unwrap_err();

        assert!(matches!(err, AccountError::EmailVerificationFailed(_)));
        // profile was written anyway
        assert!(ctx
            .store
            .read_once("users/uid-bob@example.com")
            .await
            .unwrap()
            .is_some());

        let events = ctx.recorder.events.lock().unwrap();
        assert!(events.contains(&Event::VerificationFailed));
        assert!(events.contains(&Event::AccountCreated("uid-bob@example.com".into())));
    }

    #[tokio::test]
    async fn test_duplicate_username_does_not_block_creation() {
        let ctx = setup();
        ctx.service
            .create_account("first@example.com", "pw", "shared-name")
            .await
            .unwrap();

        // known race: the collision is logged, never enforced
        let profile = ctx
            .service
            .create_account("second@example.com", "pw", "shared-name")
            .await
            .unwrap();
        assert_eq!(profile.user_name, "shared-name");
    }

    #[tokio::test]
    async fn test_login_verified() {
        let ctx = setup_with(MockProvider {
            verified: true,
            ..Default::default()
        });

        let session = ctx
            .service
            .login("alice@example.com", "hunter2")
            .await
            .unwrap();
        assert!(session.email_verified);
        assert_eq!(
            *ctx.recorder.events.lock().unwrap(),
            vec![Event::SignedIn("uid-alice@example.com".into())]
        );
    }

    #[tokio::test]
    async fn test_login_unverified_terminates_session() {
        let ctx = setup_with(MockProvider {
            verified: false,
            ..Default::default()
        });

        let err = ctx
            .service
            .login("alice@example.com", "hunter2")
            .await
            .unwrap_err();

        assert!(matches!(err, AccountError::EmailVerificationRequired));
        assert_eq!(ctx.provider.sign_outs.load(Ordering::SeqCst), 1);

        // never a signed-in notification for an unverified session
        let events = ctx.recorder.events.lock().unwrap();
        assert!(!events.iter().any(|e| matches!(e, Event::SignedIn(_))));
        assert!(events.contains(&Event::SignInFailed));
    }

    #[tokio::test]
    async fn test_login_bad_credentials() {
        let ctx = setup_with(MockProvider {
            reject_sign_in: true,
            ..Default::default()
        });

        let err = ctx.service.login("alice@example.com", "wrong").await.unwrap_err();
        assert!(matches!(err, AccountError::SignInFailed(_)));
    }

    #[tokio::test]
    async fn test_logout() {
        let ctx = setup();
        ctx.service.logout().await.unwrap();
        assert_eq!(
            *ctx.recorder.events.lock().unwrap(),
            vec![Event::SignedOut]
        );

        let failing = setup_with(MockProvider {
            reject_sign_out: true,
            ..Default::default()
        });
        let err = failing.service.logout().await.unwrap_err();
        assert!(matches!(err, AccountError::SignOutFailed(_)));
    }

    #[tokio::test]
    async fn test_forgot_password() {
        let ctx = setup();
        ctx.service.forgot_password("alice@example.com").await.unwrap();
        assert_eq!(
            *ctx.recorder.events.lock().unwrap(),
            vec![Event::ResetSent("alice@example.com".into())]
        );

        let failing = setup_with(MockProvider {
            reject_password_reset: true,
            ..Default::default()
        });
        let err = failing
            .service
            .forgot_password("nobody@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AccountError::PasswordResetFailed(_)));
    }

    #[tokio::test]
    async fn test_resolve_user_name() {
        let ctx = setup();
        ctx.service
            .create_account("alice@example.com", "pw", "alice")
            .await
            .unwrap();

        let name = ctx
            .service
            .resolve_user_name("uid-alice@example.com")
            .await
            .unwrap();
        assert_eq!(name, "alice");
    }

    #[tokio::test]
    async fn test_resolve_user_name_missing_profile() {
        let ctx = setup();
        let err = ctx.service.resolve_user_name("uid-ghost").await.unwrap_err();
        assert!(matches!(err, AccountError::ProfileNotFound(uid) if uid == "uid-ghost"));
    }

    #[tokio::test]
    async fn test_resolve_user_name_surfaces_parse_failure() {
        let ctx = setup();
        ctx.store
            .write("users/uid-bad", &serde_json::json!({"userName": 17}))
            .await
            .unwrap();

        let err = ctx.service.resolve_user_name("uid-bad").await.unwrap_err();
        assert!(matches!(err, AccountError::ParseFailed { .. }));
    }

    #[tokio::test]
    async fn test_rename_user_touches_only_the_name() {
        let ctx = setup();
        ctx.service
            .create_account("alice@example.com", "pw", "alice")
            .await
            .unwrap();
        ctx.store
            .update_fields(
                "users/uid-alice@example.com",
                &serde_json::json!({"categories": ["cat1", "cat2"]}),
            )
            .await
            .unwrap();

        ctx.service
            .rename_user("uid-alice@example.com", "alicia")
            .await
            .unwrap();

        let doc = ctx
            .store
            .read_once("users/uid-alice@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc["userName"], "alicia");
        assert_eq!(doc["categories"], serde_json::json!(["cat1", "cat2"]));

        let name = ctx
            .service
            .resolve_user_name("uid-alice@example.com")
            .await
            .unwrap();
        assert_eq!(name, "alicia");
    }
}
