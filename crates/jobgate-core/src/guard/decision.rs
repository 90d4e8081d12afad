use serde::{Deserialize, Serialize};

/// What a route boundary should do right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(tag = "action", content = "path", rename_all = "lowercase")]
pub enum Decision {
    /// Proceed to the page
    Render,
    /// Navigate to the path, replacing the current history entry so the
    /// back button does not return to the guarded route
    Redirect(String),
    /// Show a neutral loading indicator; a session is still resolving
    Wait,
}

impl Decision {
    pub fn is_render(&self) -> bool {
        matches!(self, Decision::Render)
    }

    pub fn is_wait(&self) -> bool {
        matches!(self, Decision::Wait)
    }

    pub fn redirect_path(&self) -> Option<&str> {
        match self {
            Decision::Redirect(path) => Some(path),
            _ => None,
        }
    }
}

/// Symbolic redirect destinations, resolved to paths through `Redirects`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectTarget {
    UserLogin,
    CompanyLogin,
    Unauthorized,
}

/// Paths the guards redirect to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Redirects {
    pub user_login: String,
    pub company_login: String,
    pub unauthorized: String,
}

impl Default for Redirects {
    fn default() -> Self {
        Self {
            user_login: "/login".to_string(),
            company_login: "/company/login".to_string(),
            unauthorized: "/unauthorized".to_string(),
        }
    }
}

impl Redirects {
    pub fn path(&self, target: RedirectTarget) -> &str {
        match target {
            RedirectTarget::UserLogin => &self.user_login,
            RedirectTarget::CompanyLogin => &self.company_login,
            RedirectTarget::Unauthorized => &self.unauthorized,
        }
    }

    pub fn redirect(&self, target: RedirectTarget) -> Decision {
        Decision::Redirect(self.path(target).to_string())
    }
}
