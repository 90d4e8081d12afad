//! Stricter role guard for user-only subtrees (e.g. the admin dashboard).
//!
//! Only the user session is consulted, so a signed-in company can never
//! satisfy it.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::{Session, UserProfile, UserRole};

use super::{Decision, RedirectTarget, Redirects};

fn default_fallback_path() -> String {
    "/".to_string()
}

/// Requirement for a role-guarded route.
///
/// `required_role` and `allowed_roles` are independent filters; when both
/// are set both must pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct RoleRequirement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_role: Option<UserRole>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_roles: Option<Vec<UserRole>>,
    /// Where a signed-in user without the right role is sent
    #[serde(default = "default_fallback_path")]
    pub fallback_path: String,
}

impl Default for RoleRequirement {
    fn default() -> Self {
        Self {
            required_role: None,
            allowed_roles: None,
            fallback_path: default_fallback_path(),
        }
    }
}

impl RoleRequirement {
    pub fn require(role: UserRole) -> Self {
        Self {
            required_role: Some(role),
            ..Self::default()
        }
    }

    pub fn allow(roles: impl IntoIterator<Item = UserRole>) -> Self {
        Self {
            allowed_roles: Some(roles.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn with_fallback(mut self, path: impl Into<String>) -> Self {
        self.fallback_path = path.into();
        self
    }

    fn admits(&self, role: UserRole) -> bool {
        let required_ok = self.required_role.map_or(true, |required| required == role);
        let allowed_ok = self
            .allowed_roles
            .as_ref()
            .map_or(true, |allowed| allowed.contains(&role));
        required_ok && allowed_ok
    }
}

/// Decide whether a role-guarded route may render for `user`.
pub fn authorize_role(
    user: &Session<UserProfile>,
    requirement: &RoleRequirement,
    redirects: &Redirects,
) -> Decision {
    let decision = if user.is_loading() {
        Decision::Wait
    } else {
        match user.role() {
            None => redirects.redirect(RedirectTarget::UserLogin),
            Some(role) if requirement.admits(role) => Decision::Render,
            Some(_) => Decision::Redirect(requirement.fallback_path.clone()),
        }
    };
    debug!(?requirement, ?decision, "Role authorization decided");
    decision
}
