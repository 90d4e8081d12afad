//! Route table: path patterns mapped to guard declarations.
//!
//! This is the route-boundary adapter. It holds no logic of its own beyond
//! finding the declaration for a path and handing both sessions to the
//! matching guard.

use serde::{Deserialize, Serialize};

use crate::auth::{CompanyProfile, Session, UserProfile, UserRole};

use super::{
    authorize, authorize_role, AccessRequirement, AuthType, Decision, Redirects, RoleRequirement,
    RouteRole,
};

/// How a route is protected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RouteGuard {
    Public,
    Access(AccessRequirement),
    Role(RoleRequirement),
}

/// One protected (or explicitly public) path pattern.
///
/// Patterns are matched segment by segment: `:name` matches any single
/// segment and a trailing `*` matches the rest of the path, including
/// nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct RouteDeclaration {
    pub path: String,
    pub guard: RouteGuard,
}

impl RouteDeclaration {
    pub fn new(path: impl Into<String>, guard: RouteGuard) -> Self {
        Self {
            path: path.into(),
            guard,
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        let mut pattern = segments(&self.path);
        let mut actual = segments(path);

        loop {
            match (pattern.next(), actual.next()) {
                (Some("*"), _) => return true,
                (Some(p), Some(a)) if p.starts_with(':') || p == a => continue,
                (None, None) => return true,
                _ => return false,
            }
        }
    }
}

/// Split a path into non-empty segments, ignoring query string and fragment
fn segments(path: &str) -> impl Iterator<Item = &str> {
    let end = path.find(|c: char| c == '?' || c == '#').unwrap_or(path.len());
    path[..end].split('/').filter(|s| !s.is_empty())
}

/// Ordered list of route declarations. The first match wins; unmatched
/// paths are public.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteTable {
    routes: Vec<RouteDeclaration>,
}

impl RouteTable {
    pub fn new(routes: Vec<RouteDeclaration>) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &[RouteDeclaration] {
        &self.routes
    }

    pub fn find(&self, path: &str) -> Option<&RouteDeclaration> {
        self.routes.iter().find(|route| route.matches(path))
    }

    /// Guard decision for navigating to `path`
    pub fn decide(
        &self,
        path: &str,
        user: &Session<UserProfile>,
        company: &Session<CompanyProfile>,
        redirects: &Redirects,
    ) -> Decision {
        match self.find(path).map(|route| &route.guard) {
            None | Some(RouteGuard::Public) => Decision::Render,
            Some(RouteGuard::Access(requirement)) => {
                authorize(requirement, user, company, redirects)
            }
            Some(RouteGuard::Role(requirement)) => authorize_role(user, requirement, redirects),
        }
    }

    /// The job board's routes
    pub fn job_board() -> Self {
        use RouteGuard::{Access, Public, Role};

        let access = |auth_type| Access(AccessRequirement::new(auth_type));
        let access_role =
            |auth_type, role| Access(AccessRequirement::new(auth_type).with_role(role));

        Self::new(vec![
            RouteDeclaration::new("/", Public),
            RouteDeclaration::new("/login", Public),
            RouteDeclaration::new("/signup", Public),
            RouteDeclaration::new("/company/login", Public),
            RouteDeclaration::new("/company/signup", Public),
            RouteDeclaration::new("/unauthorized", Public),
            RouteDeclaration::new("/jobs/new", access_role(AuthType::Company, RouteRole::Company)),
            RouteDeclaration::new(
                "/jobs/:id/edit",
                access_role(AuthType::Company, RouteRole::Company),
            ),
            RouteDeclaration::new("/jobs/*", Public),
            RouteDeclaration::new("/company/*", access_role(AuthType::Company, RouteRole::Company)),
            RouteDeclaration::new("/dashboard", access(AuthType::Any)),
            RouteDeclaration::new("/messages/*", access(AuthType::Any)),
            RouteDeclaration::new("/schedule/*", access(AuthType::Any)),
            RouteDeclaration::new("/profile", access(AuthType::User)),
            RouteDeclaration::new("/resume/*", access_role(AuthType::User, RouteRole::Seeker)),
            RouteDeclaration::new(
                "/applications/*",
                access_role(AuthType::User, RouteRole::Seeker),
            ),
            RouteDeclaration::new("/recruiter/*", access_role(AuthType::Any, RouteRole::Recruiter)),
            RouteDeclaration::new(
                "/admin/*",
                Role(RoleRequirement::require(UserRole::Admin).with_fallback("/dashboard")),
            ),
        ])
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::job_board()
    }
}
