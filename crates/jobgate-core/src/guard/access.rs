//! Dual-identity authorization guard.
//!
//! The guard is an ordered rule table: the first rule whose condition holds
//! decides. Loading comes first, then identity-kind checks, then role
//! checks, so a role check never runs against an identity that never
//! authenticated.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::{CompanyProfile, Session, UserProfile, UserRole};

use super::{Decision, RedirectTarget, Redirects};

/// Which identity kind a route needs signed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    User,
    Company,
    #[default]
    Any,
}

/// Fine-grained role a route may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "lowercase")]
pub enum RouteRole {
    Seeker,
    /// Served by the user role `ADMIN`; there is no separate recruiter role
    Recruiter,
    Company,
}

impl RouteRole {
    /// The user role this route role is satisfied by, if it is a user role.
    /// This is the only place the route/user role names are related.
    pub fn user_role(&self) -> Option<UserRole> {
        match self {
            RouteRole::Seeker => Some(UserRole::JobSeeker),
            RouteRole::Recruiter => Some(UserRole::Admin),
            RouteRole::Company => None,
        }
    }
}

/// A route's declared requirement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(default)]
pub struct AccessRequirement {
    pub auth_type: AuthType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_role: Option<RouteRole>,
}

impl AccessRequirement {
    pub fn new(auth_type: AuthType) -> Self {
        Self {
            auth_type,
            required_role: None,
        }
    }

    pub fn with_role(mut self, role: RouteRole) -> Self {
        self.required_role = Some(role);
        self
    }

    /// Whether the user session can change this requirement's outcome
    fn depends_on_user(&self) -> bool {
        matches!(self.auth_type, AuthType::User | AuthType::Any)
            || matches!(self.required_role, Some(RouteRole::Seeker | RouteRole::Recruiter))
    }

    /// Whether the company session can change this requirement's outcome
    fn depends_on_company(&self) -> bool {
        matches!(self.auth_type, AuthType::Company | AuthType::Any)
            || matches!(self.required_role, Some(RouteRole::Company))
    }
}

// ============================================================================
// Rule table
// ============================================================================

/// Both session snapshots, as read at evaluation time.
struct Sessions<'a> {
    user: &'a Session<UserProfile>,
    company: &'a Session<CompanyProfile>,
}

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Wait,
    Redirect(RedirectTarget),
    Render,
}

struct Rule {
    name: &'static str,
    applies: fn(&AccessRequirement, &Sessions<'_>) -> bool,
    outcome: Outcome,
}

static RULES: [Rule; 8] = [
    Rule {
        name: "session-loading",
        applies: relevant_session_loading,
        outcome: Outcome::Wait,
    },
    Rule {
        name: "user-required",
        applies: user_required_but_missing,
        outcome: Outcome::Redirect(RedirectTarget::UserLogin),
    },
    Rule {
        name: "company-required",
        applies: company_required_but_missing,
        outcome: Outcome::Redirect(RedirectTarget::CompanyLogin),
    },
    Rule {
        name: "any-identity-required",
        applies: no_identity_for_any,
        outcome: Outcome::Redirect(RedirectTarget::UserLogin),
    },
    Rule {
        name: "seeker-role",
        applies: lacks_seeker_role,
        outcome: Outcome::Redirect(RedirectTarget::Unauthorized),
    },
    Rule {
        name: "recruiter-role",
        applies: lacks_recruiter_role,
        outcome: Outcome::Redirect(RedirectTarget::Unauthorized),
    },
    Rule {
        name: "company-role",
        applies: lacks_company_role,
        outcome: Outcome::Redirect(RedirectTarget::Unauthorized),
    },
    Rule {
        name: "allow",
        applies: always,
        outcome: Outcome::Render,
    },
];

// A session that cannot affect the outcome is not waited on: a company-only
// route renders as soon as the company session is known.
fn relevant_session_loading(req: &AccessRequirement, s: &Sessions<'_>) -> bool {
    (req.depends_on_user() && s.user.is_loading())
        || (req.depends_on_company() && s.company.is_loading())
}

fn user_required_but_missing(req: &AccessRequirement, s: &Sessions<'_>) -> bool {
    req.auth_type == AuthType::User && !s.user.is_authenticated()
}

fn company_required_but_missing(req: &AccessRequirement, s: &Sessions<'_>) -> bool {
    req.auth_type == AuthType::Company && !s.company.is_authenticated()
}

fn no_identity_for_any(req: &AccessRequirement, s: &Sessions<'_>) -> bool {
    req.auth_type == AuthType::Any && !s.user.is_authenticated() && !s.company.is_authenticated()
}

fn lacks_user_role(req: &AccessRequirement, route_role: RouteRole, s: &Sessions<'_>) -> bool {
    if req.required_role != Some(route_role) {
        return false;
    }
    match route_role.user_role() {
        Some(role) => !s.user.has_role(role),
        None => false,
    }
}

fn lacks_seeker_role(req: &AccessRequirement, s: &Sessions<'_>) -> bool {
    lacks_user_role(req, RouteRole::Seeker, s)
}

fn lacks_recruiter_role(req: &AccessRequirement, s: &Sessions<'_>) -> bool {
    lacks_user_role(req, RouteRole::Recruiter, s)
}

fn lacks_company_role(req: &AccessRequirement, s: &Sessions<'_>) -> bool {
    req.required_role == Some(RouteRole::Company) && !s.company.is_authenticated()
}

fn always(_req: &AccessRequirement, _s: &Sessions<'_>) -> bool {
    true
}

/// Evaluate the rule table and report which rule decided.
pub fn explain(
    requirement: &AccessRequirement,
    user: &Session<UserProfile>,
    company: &Session<CompanyProfile>,
    redirects: &Redirects,
) -> (&'static str, Decision) {
    let sessions = Sessions { user, company };
    // The last rule always applies, so the fallback is never taken
    let rule = RULES
        .iter()
        .find(|rule| (rule.applies)(requirement, &sessions))
        .unwrap_or(&RULES[RULES.len() - 1]);

    let decision = match rule.outcome {
        Outcome::Wait => Decision::Wait,
        Outcome::Redirect(target) => redirects.redirect(target),
        Outcome::Render => Decision::Render,
    };
    (rule.name, decision)
}

/// Decide whether a route with `requirement` may render.
pub fn authorize(
    requirement: &AccessRequirement,
    user: &Session<UserProfile>,
    company: &Session<CompanyProfile>,
    redirects: &Redirects,
) -> Decision {
    let (rule, decision) = explain(requirement, user, company, redirects);
    debug!(rule, ?requirement, ?decision, "Authorization decided");
    decision
}
