//! Authentication module for managing the two identity kinds' sessions.
//!
//! This module provides:
//! - `IdentityKind`, `UserProfile`, `CompanyProfile`: who can be signed in
//! - `CredentialStore`: persisted token slots (memory, file, OS keyring)
//! - `Authenticator`: the collaborator that exchanges credentials for tokens
//! - `SessionController`: one identity kind's session lifecycle
//!
//! One controller is instantiated per identity kind. The two never share
//! state; a login or logout for one kind leaves the other untouched.

pub mod authenticator;
pub mod credentials;
pub mod error;
pub mod kind;
pub mod profile;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use authenticator::{AuthGrant, Authenticator, Credentials};
pub use credentials::{
    CredentialStore, FileCredentialStore, KeyringCredentialStore, MemoryCredentialStore,
    StoredCredential,
};
pub use error::{AuthError, ResolveError};
pub use kind::IdentityKind;
pub use profile::{CompanyProfile, CompanySignup, Profile, UserProfile, UserRole, UserSignup};
pub use session::{active_identity, Session, SessionController};
