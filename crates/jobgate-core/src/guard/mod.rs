//! Route authorization.
//!
//! Guards are pure functions from a route's declared requirement and the
//! current session snapshots to a `Decision`. They never mutate sessions
//! and never look anything up globally; callers pass the snapshots in.
//!
//! - `access`: the dual-identity authorization guard (`authType` + `requiredRole`)
//! - `role`: the stricter user-only role guard
//! - `routes`: path patterns mapped to guard declarations

pub mod access;
pub mod decision;
pub mod role;
pub mod routes;

pub use access::{authorize, explain, AccessRequirement, AuthType, RouteRole};
pub use decision::{Decision, RedirectTarget, Redirects};
pub use role::{authorize_role, RoleRequirement};
pub use routes::{RouteDeclaration, RouteGuard, RouteTable};

#[cfg(test)]
mod tests {
    //! Guards driven by live session controllers whose rehydrations finish
    //! at different times.

    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::Notify;
    use tokio::time::timeout;

    use super::*;
    use crate::auth::testing::{acme, admin, seeker, FakeAuthenticator};
    use crate::auth::{
        CompanyProfile, CredentialStore, Credentials, IdentityKind, MemoryCredentialStore,
        ResolveError, SessionController, StoredCredential, UserProfile,
    };

    struct Controllers {
        user: SessionController<UserProfile>,
        company: SessionController<CompanyProfile>,
    }

    impl Controllers {
        fn decide(&self, req: AccessRequirement) -> Decision {
            authorize(
                &req,
                &self.user.snapshot(),
                &self.company.snapshot(),
                &Redirects::default(),
            )
        }
    }

    fn store_with(slots: &[(IdentityKind, &str)]) -> Arc<MemoryCredentialStore> {
        let store = MemoryCredentialStore::new();
        for (kind, token) in slots {
            store.set(*kind, &StoredCredential::token_only(*token)).unwrap();
        }
        Arc::new(store)
    }

    #[tokio::test]
    async fn test_staggered_rehydration_waits_for_slower_session() {
        let user_gate = Arc::new(Notify::new());
        let company_gate = Arc::new(Notify::new());
        let store = store_with(&[(IdentityKind::User, "u"), (IdentityKind::Company, "c")]);
        let c = Controllers {
            user: SessionController::new(
                store.clone(),
                Arc::new(
                    FakeAuthenticator::new()
                        .with_token("u", Ok(seeker()))
                        .gate_resolve(user_gate.clone()),
                ),
            ),
            company: SessionController::new(
                store.clone(),
                Arc::new(
                    FakeAuthenticator::new()
                        .with_token("c", Ok(acme()))
                        .gate_resolve(company_gate.clone()),
                ),
            ),
        };

        let user = c.user.clone();
        let company = c.company.clone();
        let user_task = tokio::spawn(async move { user.rehydrate().await });
        let company_task = tokio::spawn(async move { company.rehydrate().await });
        tokio::task::yield_now().await;

        // Both still resolving, one about to succeed
        assert_eq!(c.decide(AccessRequirement::default()), Decision::Wait);

        company_gate.notify_one();
        company_task.await.unwrap();
        assert!(c.company.snapshot().is_authenticated());
        // Company is in, but an any-route still waits on the user session
        assert_eq!(c.decide(AccessRequirement::default()), Decision::Wait);
        assert_eq!(
            c.decide(AccessRequirement::new(AuthType::Any).with_role(RouteRole::Seeker)),
            Decision::Wait
        );

        user_gate.notify_one();
        user_task.await.unwrap();
        assert!(c.decide(AccessRequirement::default()).is_render());
        assert!(c
            .decide(AccessRequirement::new(AuthType::Any).with_role(RouteRole::Seeker))
            .is_render());
    }

    #[tokio::test]
    async fn test_expired_user_token_never_redirects_early() {
        let gate = Arc::new(Notify::new());
        let store = store_with(&[(IdentityKind::User, "stale")]);
        let c = Controllers {
            user: SessionController::new(
                store.clone(),
                Arc::new(
                    FakeAuthenticator::new()
                        .with_token("stale", Err(ResolveError::Expired))
                        .gate_resolve(gate.clone()),
                ),
            ),
            company: SessionController::new(
                store.clone(),
                Arc::new(FakeAuthenticator::<CompanyProfile>::new()),
            ),
        };
        c.company.rehydrate().await;

        let user = c.user.clone();
        let task = tokio::spawn(async move { user.rehydrate().await });
        tokio::task::yield_now().await;
        assert_eq!(c.decide(AccessRequirement::new(AuthType::User)), Decision::Wait);

        gate.notify_one();
        assert!(!task.await.unwrap());

        let session = timeout(Duration::from_secs(2), c.user.wait_until_ready())
            .await
            .unwrap();
        assert!(!session.is_authenticated());
        assert!(!store.has_token(IdentityKind::User));
        assert_eq!(
            c.decide(AccessRequirement::new(AuthType::User)),
            Decision::Redirect("/login".to_string())
        );
    }

    #[tokio::test]
    async fn test_company_login_renders_while_user_still_rehydrating() {
        let user_gate = Arc::new(Notify::new());
        let store = store_with(&[(IdentityKind::User, "stale-user")]);
        let c = Controllers {
            user: SessionController::new(
                store.clone(),
                Arc::new(
                    FakeAuthenticator::new()
                        .with_token("stale-user", Err(ResolveError::Expired))
                        .gate_resolve(user_gate.clone()),
                ),
            ),
            company: SessionController::new(
                store.clone(),
                Arc::new(FakeAuthenticator::new().with_account("hr@acme.test", "pw", "c", acme())),
            ),
        };

        let user = c.user.clone();
        let user_task = tokio::spawn(async move { user.rehydrate().await });
        c.company.rehydrate().await;
        c.company
            .login(&Credentials::new("hr@acme.test", "pw"))
            .await
            .unwrap();
        tokio::task::yield_now().await;

        assert!(c.user.snapshot().is_loading());
        assert!(c.decide(AccessRequirement::new(AuthType::Company)).is_render());
        assert!(c
            .decide(AccessRequirement::new(AuthType::Company).with_role(RouteRole::Company))
            .is_render());
        // Routes that consult the user session still wait
        assert_eq!(c.decide(AccessRequirement::default()), Decision::Wait);

        user_gate.notify_one();
        user_task.await.unwrap();
        assert!(!c.user.snapshot().is_loading());
        assert!(c.company.snapshot().is_authenticated());
        assert!(store.has_token(IdentityKind::Company));
    }

    #[tokio::test]
    async fn test_seeker_with_company_session_cannot_reach_recruiter_route() {
        let store = Arc::new(MemoryCredentialStore::new());
        let c = Controllers {
            user: SessionController::new(
                store.clone(),
                Arc::new(
                    FakeAuthenticator::new().with_account("sam@example.test", "pw", "u", seeker()),
                ),
            ),
            company: SessionController::new(
                store.clone(),
                Arc::new(FakeAuthenticator::new().with_account("hr@acme.test", "pw", "c", acme())),
            ),
        };
        c.user.rehydrate().await;
        c.company.rehydrate().await;
        c.user.login(&Credentials::new("sam@example.test", "pw")).await.unwrap();
        c.company.login(&Credentials::new("hr@acme.test", "pw")).await.unwrap();

        assert_eq!(
            c.decide(AccessRequirement::new(AuthType::Any).with_role(RouteRole::Recruiter)),
            Decision::Redirect("/unauthorized".to_string())
        );
    }

    #[tokio::test]
    async fn test_logout_of_one_kind_keeps_other_routes_open() {
        let store = Arc::new(MemoryCredentialStore::new());
        let c = Controllers {
            user: SessionController::new(
                store.clone(),
                Arc::new(
                    FakeAuthenticator::new().with_account("admin@example.test", "pw", "a", admin()),
                ),
            ),
            company: SessionController::new(
                store.clone(),
                Arc::new(FakeAuthenticator::new().with_account("hr@acme.test", "pw", "c", acme())),
            ),
        };
        c.user.rehydrate().await;
        c.company.rehydrate().await;
        c.user.login(&Credentials::new("admin@example.test", "pw")).await.unwrap();
        c.company.login(&Credentials::new("hr@acme.test", "pw")).await.unwrap();

        c.company.logout();
        assert!(c
            .decide(AccessRequirement::new(AuthType::User).with_role(RouteRole::Recruiter))
            .is_render());
        assert_eq!(
            c.decide(AccessRequirement::new(AuthType::Company)),
            Decision::Redirect("/company/login".to_string())
        );
    }
}
