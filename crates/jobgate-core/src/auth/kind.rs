use std::fmt;

use serde::{Deserialize, Serialize};

/// The two independent account types the client authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityKind {
    User,
    Company,
}

impl IdentityKind {
    pub const ALL: [IdentityKind; 2] = [IdentityKind::User, IdentityKind::Company];

    /// Name of this kind's credential store slot
    pub fn slot_name(&self) -> &'static str {
        match self {
            IdentityKind::User => "user",
            IdentityKind::Company => "company",
        }
    }

    /// Path prefix of this kind's authentication endpoints
    pub fn auth_path(&self) -> &'static str {
        match self {
            IdentityKind::User => "/auth",
            IdentityKind::Company => "/company/auth",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            IdentityKind::User => "User",
            IdentityKind::Company => "Company",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "user" | "seeker" | "admin" => Some(IdentityKind::User),
            "company" | "org" | "organization" => Some(IdentityKind::Company),
            _ => None,
        }
    }
}

impl fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slot_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!(IdentityKind::parse("user"), Some(IdentityKind::User));
        assert_eq!(IdentityKind::parse(" Company "), Some(IdentityKind::Company));
        assert_eq!(IdentityKind::parse("org"), Some(IdentityKind::Company));
        assert_eq!(IdentityKind::parse("recruiter"), None);
        assert_eq!(IdentityKind::parse(""), None);
    }

    #[test]
    fn test_slots_are_distinct() {
        assert_ne!(IdentityKind::User.slot_name(), IdentityKind::Company.slot_name());
        assert_ne!(IdentityKind::User.auth_path(), IdentityKind::Company.auth_path());
    }
}
