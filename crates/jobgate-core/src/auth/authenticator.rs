use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{AuthError, Profile, ResolveError};

/// Email/password pair submitted on a login form.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

// Keep passwords out of logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A successful authentication exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthGrant<P> {
    pub token: String,
    pub profile: P,
}

/// The external collaborator that talks to the identity backend.
///
/// Timeouts and retries belong to implementations of this trait; the
/// session controller never imposes its own.
#[async_trait]
pub trait Authenticator<P: Profile>: Send + Sync {
    /// Exchange credentials for a token and the profile it belongs to
    async fn authenticate(&self, credentials: &Credentials) -> Result<AuthGrant<P>, AuthError>;

    /// Create a new identity. Does not sign it in.
    async fn register(&self, fields: &P::Signup) -> Result<(), AuthError>;

    /// Resolve a previously issued token back into its profile
    async fn resolve_profile(&self, token: &str) -> Result<P, ResolveError>;
}
