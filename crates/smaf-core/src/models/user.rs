//! Console user accounts.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Permission level of a console account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Analyst,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Analyst => "analyst",
            Role::Viewer => "viewer",
        }
    }

    /// Human readable label, as shown in the account header.
    pub fn display_name(&self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Analyst => "Analyst",
            Role::Viewer => "Viewer",
        }
    }

    /// Parse a role name, ignoring case and surrounding whitespace.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "analyst" => Some(Role::Analyst),
            "viewer" => Some(Role::Viewer),
            _ => None,
        }
    }

    /// Whether this role may approve or reject pending transactions.
    pub fn can_review(&self) -> bool {
        matches!(self, Role::Admin | Role::Analyst)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An authenticated console account as returned by `/auth/me` and `/auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    pub role: Role,
}

impl User {
    /// Name for display, falling back to the email address.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse(" Analyst "), Some(Role::Analyst));
        assert_eq!(Role::parse("VIEWER"), Some(Role::Viewer));
        assert_eq!(Role::parse("root"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn test_role_can_review() {
        assert!(Role::Admin.can_review());
        assert!(Role::Analyst.can_review());
        assert!(!Role::Viewer.can_review());
    }

    #[test]
    fn test_parse_user_without_name() {
        let json = r#"{"id":1,"email":"a@b.com","role":"admin"}"#;
        let user: User = serde_json::from_str(json).expect("Failed to parse user JSON");
        assert_eq!(user.id, 1);
        assert_eq!(user.role, Role::Admin);
        assert_eq!(user.name, None);
        assert_eq!(user.display_name(), "a@b.com");
    }

    #[test]
    fn test_user_display_name_prefers_name() {
        let user = User {
            id: 7,
            name: Some("Laura Gómez".to_string()),
            email: "laura@smaf.co".to_string(),
            role: Role::Analyst,
        };
        assert_eq!(user.display_name(), "Laura Gómez");
    }
}
