use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{
    AuthError, Authenticator, CompanyProfile, CredentialStore, Credentials, IdentityKind, Profile,
    StoredCredential, UserProfile, UserRole,
};

/// Snapshot of one identity kind's authentication state.
///
/// This is what guards and pages read. It is a plain value: cloning it
/// never observes later changes to the controller it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Session<P> {
    token: Option<String>,
    profile: Option<P>,
    loading: bool,
}

impl<P: Profile> Session<P> {
    /// Startup state: nothing known yet, rehydration pending
    pub fn loading() -> Self {
        Self {
            token: None,
            profile: None,
            loading: true,
        }
    }

    pub fn signed_out() -> Self {
        Self {
            token: None,
            profile: None,
            loading: false,
        }
    }

    pub fn signed_in(token: impl Into<String>, profile: P) -> Self {
        Self {
            token: Some(token.into()),
            profile: Some(profile),
            loading: false,
        }
    }

    /// Same session with the loading flag replaced
    pub fn with_loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }

    pub fn kind(&self) -> IdentityKind {
        P::KIND
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// The profile, only once it has been resolved alongside a token
    pub fn profile(&self) -> Option<&P> {
        if self.is_authenticated() {
            self.profile.as_ref()
        } else {
            None
        }
    }

    /// True iff both a token and its resolved profile are present
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.profile.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }
}

impl Session<UserProfile> {
    /// Role of the signed-in user, if any
    pub fn role(&self) -> Option<UserRole> {
        self.profile().map(|p| p.role)
    }

    pub fn has_role(&self, role: UserRole) -> bool {
        self.role() == Some(role)
    }
}

/// Which identity the navigation chrome should present.
///
/// The company wins when both are signed in. Route guards do not use this;
/// they always look at both sessions explicitly.
pub fn active_identity(
    user: &Session<UserProfile>,
    company: &Session<CompanyProfile>,
) -> Option<IdentityKind> {
    if company.is_authenticated() {
        Some(IdentityKind::Company)
    } else if user.is_authenticated() {
        Some(IdentityKind::User)
    } else {
        None
    }
}

// ============================================================================
// Controller
// ============================================================================

#[derive(Debug)]
struct State<P> {
    token: Option<String>,
    profile: Option<P>,
    /// Set once the first rehydration has finished, whatever its outcome
    rehydrated: bool,
    /// Number of in-flight rehydrate/login/signup calls
    pending: usize,
    /// Bumped by every write to token/profile; a rehydration started under
    /// an older generation must not apply its result
    generation: u64,
}

impl<P: Profile> State<P> {
    fn snapshot(&self) -> Session<P> {
        Session {
            token: self.token.clone(),
            profile: self.profile.clone(),
            loading: !self.rehydrated || self.pending > 0,
        }
    }

    fn reset(&mut self) {
        self.token = None;
        self.profile = None;
        self.generation += 1;
    }
}

struct Inner<P: Profile> {
    store: Arc<dyn CredentialStore>,
    authenticator: Arc<dyn Authenticator<P>>,
    state: Mutex<State<P>>,
    tx: watch::Sender<Session<P>>,
}

impl<P: Profile> Inner<P> {
    fn lock(&self) -> MutexGuard<'_, State<P>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &State<P>) {
        self.tx.send_replace(state.snapshot());
    }

    /// Empty this kind's slot. A failure here is logged; memory is cleared
    /// by the caller regardless.
    fn clear_slot(&self) {
        if let Err(e) = self.store.clear(P::KIND) {
            warn!(kind = %P::KIND, error = %e, "Failed to clear credential slot");
        }
    }
}

/// Marks one operation as in flight for as long as it lives.
///
/// Dropping it (normally, or because the operation's future was dropped)
/// always releases the loading flag.
struct PendingOperation<'a, P: Profile> {
    inner: &'a Inner<P>,
    rehydration: bool,
}

impl<'a, P: Profile> PendingOperation<'a, P> {
    fn begin(inner: &'a Inner<P>, rehydration: bool) -> (Self, u64) {
        let mut state = inner.lock();
        state.pending += 1;
        let generation = state.generation;
        inner.publish(&state);
        (Self { inner, rehydration }, generation)
    }
}

impl<P: Profile> Drop for PendingOperation<'_, P> {
    fn drop(&mut self) {
        let mut state = self.inner.lock();
        state.pending = state.pending.saturating_sub(1);
        if self.rehydration {
            state.rehydrated = true;
        }
        self.inner.publish(&state);
    }
}

/// Owns one identity kind's session end to end.
///
/// Instantiate once per kind (`SessionController<UserProfile>` and
/// `SessionController<CompanyProfile>`). Clone is cheap; clones share the
/// same session.
pub struct SessionController<P: Profile> {
    inner: Arc<Inner<P>>,
}

impl<P: Profile> Clone for SessionController<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: Profile> SessionController<P> {
    /// Create a controller in the loading state. `rehydrate` must be called
    /// once before it will ever report not-loading.
    pub fn new(store: Arc<dyn CredentialStore>, authenticator: Arc<dyn Authenticator<P>>) -> Self {
        let state = State {
            token: None,
            profile: None,
            rehydrated: false,
            pending: 0,
            generation: 0,
        };
        let (tx, _rx) = watch::channel(state.snapshot());
        Self {
            inner: Arc::new(Inner {
                store,
                authenticator,
                state: Mutex::new(state),
                tx,
            }),
        }
    }

    pub fn kind(&self) -> IdentityKind {
        P::KIND
    }

    /// Current snapshot
    pub fn snapshot(&self) -> Session<P> {
        self.inner.lock().snapshot()
    }

    /// Receive every snapshot published from now on
    pub fn subscribe(&self) -> watch::Receiver<Session<P>> {
        self.inner.tx.subscribe()
    }

    /// Bearer token for collaborators, only while authenticated
    pub fn bearer_token(&self) -> Option<String> {
        let session = self.snapshot();
        if session.is_authenticated() {
            session.token
        } else {
            None
        }
    }

    /// Wait until no rehydrate/login/signup is in flight
    pub async fn wait_until_ready(&self) -> Session<P> {
        let mut rx = self.subscribe();
        let ready = rx.wait_for(|s| !s.is_loading()).await.map(|s| s.clone());
        match ready {
            Ok(session) => session,
            // The sender lives as long as `self`, so this is unreachable in practice
            Err(_) => self.snapshot(),
        }
    }

    /// Rebuild the session from the credential store.
    ///
    /// Resolution failures of any kind (expired, invalid, network) clear
    /// the slot and leave the session signed out. Always ends not-loading.
    /// Returns whether the session ended up authenticated.
    pub async fn rehydrate(&self) -> bool {
        let inner = &*self.inner;
        let (_pending, generation) = PendingOperation::begin(inner, true);

        let stored = match inner.store.get(P::KIND) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(kind = %P::KIND, error = %e, "Unreadable credential slot, clearing");
                inner.clear_slot();
                None
            }
        };

        let Some(stored) = stored else {
            debug!(kind = %P::KIND, "No stored credential");
            return false;
        };

        let resolved = inner.authenticator.resolve_profile(&stored.token).await;

        let mut state = inner.lock();
        if state.generation != generation {
            debug!(kind = %P::KIND, "Discarding stale rehydration result");
            return state.token.is_some() && state.profile.is_some();
        }

        match resolved {
            Ok(profile) => {
                let refreshed = StoredCredential::new(stored.token.clone(), &profile);
                if let Err(e) = inner.store.set(P::KIND, &refreshed) {
                    warn!(kind = %P::KIND, error = %e, "Failed to refresh profile snapshot");
                }
                info!(kind = %P::KIND, id = %profile.id(), "Session restored");
                state.token = Some(stored.token);
                state.profile = Some(profile);
                state.generation += 1;
                inner.publish(&state);
                true
            }
            Err(e) => {
                warn!(kind = %P::KIND, error = %e, "Stored credential rejected, signing out");
                inner.clear_slot();
                state.reset();
                inner.publish(&state);
                false
            }
        }
    }

    /// Authenticate and, on success, replace this kind's session.
    ///
    /// On failure the previous session and slot are left exactly as they
    /// were and the error is returned for the caller to display.
    pub async fn login(&self, credentials: &Credentials) -> Result<P, AuthError> {
        let inner = &*self.inner;
        let (_pending, _) = PendingOperation::begin(inner, false);
        info!(kind = %P::KIND, email = %credentials.email, "Logging in");

        let grant = inner
            .authenticator
            .authenticate(credentials)
            .await
            .inspect_err(|e| warn!(kind = %P::KIND, error = %e, "Login failed"))?;

        let mut state = inner.lock();
        // Store first: a failed write must not leave memory ahead of the slot
        inner
            .store
            .set(P::KIND, &StoredCredential::new(grant.token.clone(), &grant.profile))
            .map_err(AuthError::Storage)?;

        state.token = Some(grant.token);
        state.profile = Some(grant.profile.clone());
        state.generation += 1;
        inner.publish(&state);
        info!(kind = %P::KIND, id = %grant.profile.id(), "Login successful");
        Ok(grant.profile)
    }

    /// Create a new identity of this kind. The session is not signed in;
    /// the caller is expected to send the user to the login form.
    pub async fn signup(&self, fields: &P::Signup) -> Result<(), AuthError> {
        let inner = &*self.inner;
        let (_pending, _) = PendingOperation::begin(inner, false);
        info!(kind = %P::KIND, "Signing up");

        inner
            .authenticator
            .register(fields)
            .await
            .inspect_err(|e| warn!(kind = %P::KIND, error = %e, "Signup failed"))?;

        info!(kind = %P::KIND, "Signup successful");
        Ok(())
    }

    /// Sign out immediately. Idempotent; never touches the other kind.
    pub fn logout(&self) {
        let inner = &*self.inner;
        let mut state = inner.lock();
        let was_authenticated = state.token.is_some();
        inner.clear_slot();
        state.reset();
        inner.publish(&state);
        if was_authenticated {
            info!(kind = %P::KIND, "Logged out");
        }
    }
}
