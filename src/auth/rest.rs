//! REST client for the identity provider.
//!
//! Speaks the provider's account API: `accounts:signUp`,
//! `accounts:signInWithPassword`, `accounts:lookup` and
//! `accounts:sendOobCode` under a common base URL, keyed by API key.
//! The provider has no server-side sign-out; the session lives in the
//! ID token this client holds, so signing out drops the token.

use std::sync::RwLock;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{AuthError, IdentityProvider, Session};

const DEFAULT_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Token material for the active session.
#[derive(Debug, Clone)]
struct SessionTokens {
    uid: String,
    id_token: String,
}

/// HTTP adapter for the identity provider.
#[derive(Debug)]
pub struct RestIdentity {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    tokens: RwLock<Option<SessionTokens>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignUpResponse {
    local_id: String,
    id_token: String,
    email: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    email: String,
    #[serde(default)]
    email_verified: bool,
}

impl RestIdentity {
    /// Creates a provider client using the default base URL.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    /// Creates a provider client against a custom base URL (self-hosted
    /// provider or emulator).
    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            tokens: RwLock::new(None),
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/accounts:{}?key={}", self.base_url, action, self.api_key)
    }

    async fn post<T: DeserializeOwned>(&self, action: &str, body: &Value) -> Result<T, AuthError> {
        let response = self
            .http
            .post(self.endpoint(action))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Rejected(rejection_message(
                status.as_u16(),
                &body,
            )));
        }
        Ok(response.json().await?)
    }

    fn store_tokens(&self, uid: &str, id_token: &str) {
        let mut tokens = self.tokens.write().unwrap();
        *tokens = Some(SessionTokens {
            uid: uid.to_string(),
            id_token: id_token.to_string(),
        });
    }

    fn current_id_token(&self) -> Option<String> {
        let tokens = self.tokens.read().unwrap();
        tokens.as_ref().map(|t| t.id_token.clone())
    }

    /// UID of the active session, if any.
    pub fn current_uid(&self) -> Option<String> {
        let tokens = self.tokens.read().unwrap();
        tokens.as_ref().map(|t| t.uid.clone())
    }
}

impl IdentityProvider for RestIdentity {
    async fn create_user(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let signed_up: SignUpResponse = self
            .post(
                "signUp",
                &json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;

        self.store_tokens(&signed_up.local_id, &signed_up.id_token);
        Ok(Session {
            uid: signed_up.local_id,
            email: signed_up.email,
            email_verified: false,
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let signed_in: SignUpResponse = self
            .post(
                "signInWithPassword",
                &json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;

        // sign-in doesn't report verification state, look it up
        let lookup: LookupResponse = self
            .post("lookup", &json!({ "idToken": signed_in.id_token }))
            .await?;
        let user = lookup
            .users
            .into_iter()
            .find(|u| u.local_id == signed_in.local_id)
            .ok_or(AuthError::NoSession)?;

        self.store_tokens(&user.local_id, &signed_in.id_token);
        Ok(Session {
            uid: user.local_id,
            email: user.email,
            email_verified: user.email_verified,
        })
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let mut tokens = self.tokens.write().unwrap();
        match tokens.take() {
            Some(_) => Ok(()),
            None => Err(AuthError::NoSession),
        }
    }

    async fn send_verification_email(&self, _session: &Session) -> Result<(), AuthError> {
        let id_token = self.current_id_token().ok_or(AuthError::NoSession)?;
        let _: Value = self
            .post(
                "sendOobCode",
                &json!({ "requestType": "VERIFY_EMAIL", "idToken": id_token }),
            )
            .await?;
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let _: Value = self
            .post(
                "sendOobCode",
                &json!({ "requestType": "PASSWORD_RESET", "email": email }),
            )
            .await?;
        Ok(())
    }
}

/// Extracts the provider's error message from a failure body, falling
/// back to the HTTP status when the body isn't the expected shape.
fn rejection_message(status: u16, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")?
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("status {status}"))
}
