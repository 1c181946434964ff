//! Identity provider contract and its Firebase adapter.
//!
//! The session only needs the narrow contract in [`IdentityProvider`]; the
//! concrete [`FirebaseAuth`] adapter speaks the Identity Toolkit REST API
//! and classifies its error codes into reasons the UI can phrase for the
//! user. Account-lifecycle hooks (seeding and deleting the user document)
//! run server-side and are not invoked from here.

use std::sync::RwLock;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::domain::UserId;
use crate::remote::firestore::TokenSource;

/// Default Identity Toolkit REST endpoint.
pub const DEFAULT_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Classified authentication failure. The `Display` form is the
/// human-readable message shown to the user.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Wrong password, or the credential is otherwise rejected.
    #[error("invalid email or password")]
    InvalidCredential,
    /// No account exists for the email.
    #[error("no account exists for that email")]
    UserNotFound,
    /// Sign-up with an email that already has an account.
    #[error("an account with that email already exists")]
    EmailInUse,
    /// Sign-up password rejected as too weak.
    #[error("password is too weak")]
    WeakPassword,
    /// Malformed or missing email address.
    #[error("that email address is not valid")]
    InvalidEmail,
    /// The account exists but has been disabled.
    #[error("this account has been disabled")]
    UserDisabled,
    /// Transport-level failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// Anything the provider reports that has no dedicated mapping.
    #[error("authentication failed: {0}")]
    Other(String),
}

impl AuthError {
    /// Maps an Identity Toolkit error code to a classified reason. Codes
    /// may carry a trailing explanation (`"WEAK_PASSWORD : Password should
    /// be at least 6 characters"`), which is stripped.
    pub fn classify(code: &str) -> Self {
        let code = code
            .split([' ', ':'])
            .find(|part| !part.is_empty())
            .unwrap_or(code);
        match code {
            "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => AuthError::InvalidCredential,
            "EMAIL_NOT_FOUND" => AuthError::UserNotFound,
            "EMAIL_EXISTS" => AuthError::EmailInUse,
            "WEAK_PASSWORD" => AuthError::WeakPassword,
            "INVALID_EMAIL" | "MISSING_EMAIL" => AuthError::InvalidEmail,
            "USER_DISABLED" => AuthError::UserDisabled,
            other => AuthError::Other(other.to_string()),
        }
    }
}

/// The identity/auth collaborator contract.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// The signed-in identity, if any.
    fn current_identity(&self) -> Option<UserId>;

    /// Signs in with email and password, returning the identity.
    async fn sign_in(&self, email: &str, password: &str) -> Result<UserId, AuthError>;

    /// Creates an account and signs it in. The external lifecycle hook
    /// seeds the new identity's document with an empty list.
    async fn sign_up(&self, email: &str, password: &str) -> Result<UserId, AuthError>;

    /// Discards the local session.
    fn sign_out(&self);

    /// Sends a password-reset email.
    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError>;
}

#[derive(Debug, Clone)]
struct AuthSession {
    uid: UserId,
    id_token: String,
}

/// Firebase Identity Toolkit adapter.
pub struct FirebaseAuth {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    session: RwLock<Option<AuthSession>>,
}

impl FirebaseAuth {
    /// Creates an adapter using the given web API key.
    pub fn new(http: reqwest::Client, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            session: RwLock::new(None),
        }
    }

    /// Overrides the API endpoint, e.g. for the auth emulator.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{}/accounts:{action}?key={}", self.base_url, self.api_key)
    }

    async fn credential_call(
        &self,
        action: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let response = self
            .http
            .post(self.endpoint(action))
            .json(&json!({
                "email": email,
                "password": password,
                "returnSecureToken": true,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(classify_response(response.json().await.unwrap_or_default()));
        }

        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct TokenResponse {
            local_id: String,
            id_token: String,
        }
        let body: TokenResponse = response.json().await?;
        Ok(AuthSession {
            uid: UserId::from(body.local_id),
            id_token: body.id_token,
        })
    }

    fn store_session(&self, session: AuthSession) -> UserId {
        let uid = session.uid.clone();
        *self
            .session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(session);
        uid
    }
}

fn classify_response(body: Value) -> AuthError {
    let code = body
        .pointer("/error/message")
        .and_then(Value::as_str)
        .unwrap_or("unrecognized provider response");
    AuthError::classify(code)
}

#[async_trait]
impl IdentityProvider for FirebaseAuth {
    fn current_identity(&self) -> Option<UserId> {
        self.session
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .map(|s| s.uid.clone())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<UserId, AuthError> {
        let session = self
            .credential_call("signInWithPassword", email, password)
            .await?;
        Ok(self.store_session(session))
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<UserId, AuthError> {
        let session = self.credential_call("signUp", email, password).await?;
        Ok(self.store_session(session))
    }

    fn sign_out(&self) {
        *self
            .session
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let response = self
            .http
            .post(self.endpoint("sendOobCode"))
            .json(&json!({
                "requestType": "PASSWORD_RESET",
                "email": email,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(classify_response(response.json().await.unwrap_or_default()));
        }
        Ok(())
    }
}

impl TokenSource for FirebaseAuth {
    fn id_token(&self) -> Option<String> {
        self.session
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .map(|s| s.id_token.clone())
    }
}
