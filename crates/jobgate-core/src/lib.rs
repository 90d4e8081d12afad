//! Core library for jobgate.
//!
//! A job-board client signs people in under two independent identity kinds:
//! individuals (job seekers and admins) and companies. This crate owns the
//! part of the client that decides who is signed in and which routes they
//! may reach:
//!
//! - `auth`: identity kinds, profiles, credential storage and the generic
//!   `SessionController` that rehydrates, logs in, signs up and logs out.
//! - `api`: the HTTP authentication client used by the controllers.
//! - `guard`: the authorization and role guards plus the route table.
//! - `config`: persisted client configuration.

pub mod api;
pub mod auth;
pub mod config;
pub mod guard;

pub use api::{ApiClient, ApiError};
pub use auth::{
    active_identity, AuthError, AuthGrant, Authenticator, CompanyProfile, CompanySignup,
    CredentialStore, Credentials, FileCredentialStore, IdentityKind, KeyringCredentialStore,
    MemoryCredentialStore, Profile, ResolveError, Session, SessionController, StoredCredential,
    UserProfile, UserRole, UserSignup,
};
pub use config::{Config, CredentialBackend};
pub use guard::{
    authorize, authorize_role, AccessRequirement, AuthType, Decision, Redirects, RoleRequirement,
    RouteGuard, RouteRole, RouteTable,
};
