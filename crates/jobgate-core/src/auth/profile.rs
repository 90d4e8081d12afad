use std::fmt::Debug;

use serde::{de::DeserializeOwned, Deserialize, Serialize};

use super::IdentityKind;

/// Profile shape of one identity kind.
///
/// A `SessionController` is generic over this trait so the user and company
/// sessions share one implementation of rehydrate/login/logout.
pub trait Profile:
    Debug + Clone + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// Which identity kind (and credential slot) this profile belongs to
    const KIND: IdentityKind;

    /// Fields sent to the backend when creating a new identity of this kind
    type Signup: Debug + Serialize + Send + Sync;

    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn email(&self) -> &str;
}

/// Sub-classification within the user identity kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    JobSeeker,
    Admin,
}

impl UserRole {
    /// Lenient parse of a role name as written in config files or CLI args
    pub fn parse(s: &str) -> Option<Self> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-' && *c != ' ')
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "jobseeker" | "seeker" => Some(UserRole::JobSeeker),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            UserRole::JobSeeker => "Job Seeker",
            UserRole::Admin => "Admin",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

impl Profile for UserProfile {
    const KIND: IdentityKind = IdentityKind::User;
    type Signup = UserSignup;

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn email(&self) -> &str {
        &self.email
    }
}

/// A company is implicitly its own single role, so it carries none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl Profile for CompanyProfile {
    const KIND: IdentityKind = IdentityKind::Company;
    type Signup = CompanySignup;

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn email(&self) -> &str {
        &self.email
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserSignup {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompanySignup {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}
