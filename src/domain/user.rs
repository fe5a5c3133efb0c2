//! User entity and registration input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::role::RoleSet;

/// Registered account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// User together with the effective role set
#[derive(Debug, Clone, Serialize)]
pub struct UserWithRoles {
    #[serde(flatten)]
    pub user: User,
    pub roles: RoleSet,
}

/// Registration input
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterUser {
    #[validate(length(min = 3, max = 80, message = "Username must be between 3 and 80 characters"))]
    pub username: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

impl RegisterUser {
    /// Trimmed copy; email is lower-cased so uniqueness is case-insensitive.
    pub fn normalized(self) -> Self {
        Self {
            username: self.username.trim().to_string(),
            email: self.email.trim().to_ascii_lowercase(),
            password: self.password,
        }
    }
}

/// Profile attached one-to-one to a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: Uuid,
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_file_id: Option<Uuid>,
    pub updated_at: DateTime<Utc>,
}

/// Profile update; `None` leaves a field untouched
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProfile {
    #[validate(length(max = 255, message = "Full name is too long"))]
    pub full_name: Option<String>,
    #[validate(length(max = 4000, message = "Bio is too long"))]
    pub bio: Option<String>,
    /// `Some(None)` clears the avatar
    pub avatar_file_id: Option<Option<Uuid>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(username: &str, email: &str, password: &str) -> RegisterUser {
        RegisterUser {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_register_validation() {
        assert!(input("alice", "alice@example.com", "secret1").validate().is_ok());
        assert!(input("al", "alice@example.com", "secret1").validate().is_err());
        assert!(input("alice", "not-an-email", "secret1").validate().is_err());
        assert!(input("alice", "alice@example.com", "short").validate().is_err());
    }

    #[test]
    fn test_normalized_lowercases_email() {
        let normalized = input(" alice ", " Alice@Example.COM ", "secret1").normalized();
        assert_eq!(normalized.username, "alice");
        assert_eq!(normalized.email, "alice@example.com");
    }
}
