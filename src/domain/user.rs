use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::domain::ResourceId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Instructor,
    #[default]
    User,
    #[serde(other)]
    Unknown,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Instructor => "instructor",
            UserRole::User => "user",
            UserRole::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct User {
    pub id: ResourceId,
    pub email: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub role: UserRole,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

fn default_true() -> bool {
    true
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    pub fn can_author_courses(&self) -> bool {
        matches!(self.role, UserRole::Admin | UserRole::Instructor)
    }

    /// Name shown in headers and author bylines.
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .or(self.username.as_deref())
            .unwrap_or(&self.email)
    }
}

fn assignable_role(role: &UserRole) -> Result<(), ValidationError> {
    match role {
        UserRole::Admin | UserRole::User => Ok(()),
        _ => Err(ValidationError::new("role must be either 'admin' or 'user'")),
    }
}

/// Registration and admin-created account payload.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct NewUser {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub username: String,
    #[validate(length(min = 1))]
    pub full_name: String,
    #[validate(length(min = 6))]
    pub password: String,
    #[validate(custom(function = "assignable_role"))]
    pub role: UserRole,
}

impl NewUser {
    pub fn new(
        email: impl Into<String>,
        username: impl Into<String>,
        full_name: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            username: username.into(),
            full_name: full_name.into(),
            password: password.into(),
            role: UserRole::User,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Validate)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(email)]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 6))]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "assignable_role"))]
    pub role: Option<UserRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

/// Filters for the admin user list.
#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    pub skip: Option<u32>,
    pub limit: Option<u32>,
    pub role: Option<UserRole>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

impl UserQuery {
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(skip) = self.skip {
            pairs.push(("skip".to_string(), skip.to_string()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(role) = self.role {
            pairs.push(("role".to_string(), role.as_str().to_string()));
        }
        if let Some(is_active) = self.is_active {
            pairs.push(("is_active".to_string(), is_active.to_string()));
        }
        if let Some(search) = self.search.as_deref().filter(|s| !s.trim().is_empty()) {
            pairs.push(("search".to_string(), search.trim().to_string()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_deserializes_with_missing_optional_fields() {
        let user: User = serde_json::from_str(r#"{"id": 1, "email": "a@b.com"}"#).unwrap();

        assert_eq!(user.id, ResourceId::Number(1));
        assert_eq!(user.role, UserRole::User);
        assert!(user.is_active);
        assert_eq!(user.display_name(), "a@b.com");
    }

    #[test]
    fn test_unknown_role_is_tolerated() {
        let user: User =
            serde_json::from_str(r#"{"id": 1, "email": "a@b.com", "role": "moderator"}"#).unwrap();
        assert_eq!(user.role, UserRole::Unknown);
        assert!(!user.can_author_courses());
    }

    #[test]
    fn test_display_name_prefers_full_name() {
        let user: User = serde_json::from_str(
            r#"{"id": 2, "email": "a@b.com", "username": "ab", "full_name": "Ada B"}"#,
        )
        .unwrap();
        assert_eq!(user.display_name(), "Ada B");
    }

    #[test]
    fn test_new_user_validation() {
        let valid = NewUser::new("ada@example.com", "ada", "Ada", "secret1");
        assert!(valid.validate().is_ok());

        let short_password = NewUser::new("ada@example.com", "ada", "Ada", "123");
        assert!(short_password.validate().is_err());

        let bad_email = NewUser::new("not-an-email", "ada", "Ada", "secret1");
        assert!(bad_email.validate().is_err());

        let mut instructor = NewUser::new("ada@example.com", "ada", "Ada", "secret1");
        instructor.role = UserRole::Instructor;
        assert!(instructor.validate().is_err());
    }

    #[test]
    fn test_user_update_skips_unset_fields() {
        let update = UserUpdate {
            is_active: Some(false),
            ..Default::default()
        };
        assert!(update.validate().is_ok());
        assert_eq!(serde_json::to_string(&update).unwrap(), r#"{"is_active":false}"#);
    }

    #[test]
    fn test_user_query_pairs() {
        let query = UserQuery {
            limit: Some(50),
            role: Some(UserRole::Admin),
            search: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(
            query.to_pairs(),
            vec![
                ("limit".to_string(), "50".to_string()),
                ("role".to_string(), "admin".to_string()),
            ]
        );
    }
}
