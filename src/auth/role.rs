use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Membership role within an organization. Ordered `Member < Editor < Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Member,
    Editor,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Editor => "EDITOR",
            Role::Member => "MEMBER",
        }
    }

    /// Swedish label shown in the dashboard
    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Administratör",
            Role::Editor => "Redaktör",
            Role::Member => "Medlem",
        }
    }

    pub fn satisfies(&self, required: Role) -> bool {
        *self >= required
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "EDITOR" => Ok(Role::Editor),
            "MEMBER" => Ok(Role::Member),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

/// Role check on raw role strings as stored in `user_organizations.role`.
/// An unparseable role on either side never grants anything.
pub fn has_permission(user_role: &str, required_role: &str) -> bool {
    match (user_role.parse::<Role>(), required_role.parse::<Role>()) {
        (Ok(user), Ok(required)) => user.satisfies(required),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_has_every_permission() {
        assert!(has_permission("ADMIN", "ADMIN"));
        assert!(has_permission("ADMIN", "EDITOR"));
        assert!(has_permission("ADMIN", "MEMBER"));
    }

    #[test]
    fn editor_implies_member_only() {
        assert!(!has_permission("EDITOR", "ADMIN"));
        assert!(has_permission("EDITOR", "EDITOR"));
        assert!(has_permission("EDITOR", "MEMBER"));
    }

    #[test]
    fn member_implies_nothing_further() {
        assert!(!has_permission("MEMBER", "ADMIN"));
        assert!(!has_permission("MEMBER", "EDITOR"));
        assert!(has_permission("MEMBER", "MEMBER"));
    }

    #[test]
    fn unknown_roles_never_match() {
        assert!(!has_permission("OWNER", "MEMBER"));
        assert!(!has_permission("", "MEMBER"));
        assert!(!has_permission("ADMIN", "SUPERUSER"));
    }

    #[test]
    fn parsing_ignores_case_and_whitespace() {
        assert_eq!(" editor ".parse::<Role>(), Ok(Role::Editor));
        assert_eq!("Admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!(Role::Member.to_string(), "MEMBER");
    }

    #[test]
    fn serde_uses_uppercase_names() {
        assert_eq!(serde_json::to_string(&Role::Editor).unwrap(), "\"EDITOR\"");
        let role: Role = serde_json::from_str("\"ADMIN\"").unwrap();
        assert_eq!(role, Role::Admin);
    }
}
