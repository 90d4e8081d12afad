//! Fakes shared by the auth and guard tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::Notify;

use super::{
    AuthError, AuthGrant, Authenticator, CompanyProfile, CredentialStore, Credentials,
    IdentityKind, Profile, ResolveError, StoredCredential, UserProfile, UserRole,
};

pub(crate) fn seeker() -> UserProfile {
    UserProfile {
        id: "u-seeker".to_string(),
        name: "Sam Seeker".to_string(),
        email: "sam@example.test".to_string(),
        role: UserRole::JobSeeker,
    }
}

pub(crate) fn admin() -> UserProfile {
    UserProfile {
        id: "u-admin".to_string(),
        name: "Ada Admin".to_string(),
        email: "admin@example.test".to_string(),
        role: UserRole::Admin,
    }
}

pub(crate) fn acme() -> CompanyProfile {
    CompanyProfile {
        id: "c-acme".to_string(),
        name: "Acme".to_string(),
        email: "hr@acme.test".to_string(),
        industry: Some("Manufacturing".to_string()),
        website: None,
    }
}

struct Account<P> {
    password: String,
    grant: AuthGrant<P>,
}

/// Scripted authenticator. Logins and resolutions can be held back behind a
/// `Notify` to control which of several in-flight calls finishes first.
pub(crate) struct FakeAuthenticator<P> {
    accounts: HashMap<String, Account<P>>,
    tokens: HashMap<String, Result<P, ResolveError>>,
    resolve_gate: Option<Arc<Notify>>,
    login_gates: HashMap<String, Arc<Notify>>,
    registered: Mutex<Vec<String>>,
}

impl<P: Profile> FakeAuthenticator<P> {
    pub(crate) fn new() -> Self {
        Self {
            accounts: HashMap::new(),
            tokens: HashMap::new(),
            resolve_gate: None,
            login_gates: HashMap::new(),
            registered: Mutex::new(Vec::new()),
        }
    }

    /// An account that can log in; its token also resolves to `profile`
    pub(crate) fn with_account(
        mut self,
        email: &str,
        password: &str,
        token: &str,
        profile: P,
    ) -> Self {
        self.tokens.insert(token.to_string(), Ok(profile.clone()));
        self.accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                grant: AuthGrant {
                    token: token.to_string(),
                    profile,
                },
            },
        );
        self
    }

    pub(crate) fn with_token(mut self, token: &str, outcome: Result<P, ResolveError>) -> Self {
        self.tokens.insert(token.to_string(), outcome);
        self
    }

    /// Hold every `resolve_profile` call until `gate` is notified
    pub(crate) fn gate_resolve(mut self, gate: Arc<Notify>) -> Self {
        self.resolve_gate = Some(gate);
        self
    }

    /// Hold logins for `email` until `gate` is notified
    pub(crate) fn gate_login(mut self, email: &str, gate: Arc<Notify>) -> Self {
        self.login_gates.insert(email.to_string(), gate);
        self
    }

    pub(crate) fn registered(&self) -> Vec<String> {
        self.registered.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl<P: Profile> Authenticator<P> for FakeAuthenticator<P> {
    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthGrant<P>, AuthError> {
        if let Some(gate) = self.login_gates.get(&credentials.email) {
            gate.notified().await;
        }
        match self.accounts.get(&credentials.email) {
            Some(account) if account.password == credentials.password => Ok(account.grant.clone()),
            _ => Err(AuthError::Rejected),
        }
    }

    async fn register(&self, fields: &P::Signup) -> Result<(), AuthError> {
        let value = serde_json::to_value(fields)
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;
        let email = value
            .get("email")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        if self.accounts.contains_key(&email) {
            return Err(AuthError::Refused("email already registered".to_string()));
        }
        if let Ok(mut registered) = self.registered.lock() {
            registered.push(email);
        }
        Ok(())
    }

    async fn resolve_profile(&self, token: &str) -> Result<P, ResolveError> {
        if let Some(gate) = &self.resolve_gate {
            gate.notified().await;
        }
        self.tokens
            .get(token)
            .cloned()
            .unwrap_or_else(|| Err(ResolveError::Invalid("unknown token".to_string())))
    }
}

/// A credential store whose every operation fails.
pub(crate) struct FailingStore;

impl CredentialStore for FailingStore {
    fn get(&self, _kind: IdentityKind) -> Result<Option<StoredCredential>> {
        Err(anyhow!("keychain locked"))
    }

    fn set(&self, _kind: IdentityKind, _credential: &StoredCredential) -> Result<()> {
        Err(anyhow!("keychain locked"))
    }

    fn clear(&self, _kind: IdentityKind) -> Result<()> {
        Err(anyhow!("keychain locked"))
    }
}
