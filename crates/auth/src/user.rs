//! User accounts.
//!
//! Registration input is validated here; hashing and persistence are driven
//! by the API service layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use carkeeper_core::{DomainError, DomainResult, UserId};

use crate::Role;

pub const NAME_MAX_LEN: usize = 100;
pub const PASSWORD_MIN_LEN: usize = 6;

/// Stored user account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Raw registration request.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub password: String,
}

impl RegisterUser {
    /// Validate and normalize. Email is trimmed and lowercased; a blank phone
    /// becomes `None`.
    pub fn validate(self) -> DomainResult<RegisterUser> {
        let first_name = validate_name("first_name", &self.first_name)?;
        let last_name = validate_name("last_name", &self.last_name)?;

        let email = self.email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(DomainError::validation("email must be a valid address"));
        }

        if self.password.chars().count() < PASSWORD_MIN_LEN {
            return Err(DomainError::validation(format!(
                "password must be at least {PASSWORD_MIN_LEN} characters"
            )));
        }

        let phone = self
            .phone
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        Ok(RegisterUser {
            first_name,
            last_name,
            email,
            phone,
            password: self.password,
        })
    }
}

fn validate_name(field: &str, value: &str) -> DomainResult<String> {
    let value = value.trim();
    let len = value.chars().count();
    if len == 0 || len > NAME_MAX_LEN {
        return Err(DomainError::validation(format!(
            "{field} must be between 1 and {NAME_MAX_LEN} characters"
        )));
    }
    Ok(value.to_string())
}

/// A validated user ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
    pub role: Role,
}

impl NewUser {
    /// Self-registration always yields a customer.
    pub fn customer(input: RegisterUser, password_hash: String) -> Self {
        Self {
            id: UserId::new(),
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            phone: input.phone,
            password_hash,
            role: Role::Customer,
        }
    }
}

/// Public view of a user; never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserResponse {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub full_name: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            role: user.role,
            full_name: user.full_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> RegisterUser {
        RegisterUser {
            first_name: " Ada ".to_string(),
            last_name: "Lovelace".to_string(),
            email: " Ada@Example.COM ".to_string(),
            phone: Some("   ".to_string()),
            password: "secret1".to_string(),
        }
    }

    #[test]
    fn validate_normalizes_fields() {
        let v = input().validate().unwrap();
        assert_eq!(v.first_name, "Ada");
        assert_eq!(v.email, "ada@example.com");
        assert_eq!(v.phone, None);
    }

    #[test]
    fn rejects_bad_email_short_password_and_long_names() {
        let mut bad = input();
        bad.email = "nobody".to_string();
        assert!(matches!(bad.validate(), Err(DomainError::Validation(msg)) if msg.contains("email")));

        let mut bad = input();
        bad.password = "12345".to_string();
        assert!(matches!(bad.validate(), Err(DomainError::Validation(msg)) if msg.contains("password")));

        let mut bad = input();
        bad.last_name = "x".repeat(NAME_MAX_LEN + 1);
        assert!(matches!(bad.validate(), Err(DomainError::Validation(msg)) if msg.contains("last_name")));
    }

    #[test]
    fn registration_is_always_a_customer() {
        let user = NewUser::customer(input().validate().unwrap(), "hash".to_string());
        assert_eq!(user.role, Role::Customer);
    }

    #[test]
    fn response_has_full_name_and_no_hash() {
        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            email: "ada@example.com".into(),
            phone: None,
            password_hash: "hash".into(),
            role: Role::Admin,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(UserResponse::from(&user)).unwrap();
        assert_eq!(json["full_name"], "Ada Lovelace");
        assert_eq!(json["role"], "admin");
        assert!(json.get("password_hash").is_none());
    }
}
