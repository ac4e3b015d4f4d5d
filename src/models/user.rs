//! User model, bearer claims and access checks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::error::AppError;

use super::enums::Role;

/// Registered user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct User {
    /// Identity provider subject
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub age: Option<i16>,
    pub is_active: bool,
    pub is_professional: bool,
    pub qualifications: Option<String>,
    pub role_assigned_at: Option<DateTime<Utc>>,
    /// "system" for automatic assignment, otherwise the admin's id
    pub role_assigned_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(AppError::Authorization("Administrator privileges required".to_string()))
        }
    }

    /// The counsellor themselves or an admin
    pub fn require_counsellor_access(&self, counsellor_id: &str) -> Result<(), AppError> {
        if self.is_admin() || (self.role == Role::Counsellor && self.id == counsellor_id) {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Only the counsellor or an administrator may access this resource".to_string(),
            ))
        }
    }
}

/// Registration request for the authenticated subject
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterUser {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 2, max = 100, message = "Display name must be 2 to 100 characters"))]
    pub display_name: String,
    /// Requested role; only youth or counsellor are honoured
    pub role: Option<Role>,
    #[validate(range(min = 13, max = 120, message = "Age must be between 13 and 120"))]
    pub age: Option<i16>,
    #[serde(default)]
    pub is_professional: bool,
    #[validate(length(max = 1000))]
    pub qualifications: Option<String>,
}

/// Fields written when a user record is created
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub age: Option<i16>,
    pub is_professional: bool,
    pub qualifications: Option<String>,
}

/// User search query (admin)
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct UserQuery {
    /// Matches display name or email
    pub search: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Options for deleting a user (admin)
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct DeleteUserQuery {
    /// Delete even when the user has upcoming appointments
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRole {
    pub role: Role,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateActive {
    pub is_active: bool,
}

/// JWT claims issued by the identity provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl UserClaims {
    /// Create a new JWT token
    #[cfg(test)]
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse and verify a JWT token
    pub fn from_token(token: &str, secret: &str, leeway: u64) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let mut validation = Validation::default();
        validation.leeway = leeway;
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &validation,
        )?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: &str, role: Role) -> User {
        let now = Utc::now();
        User {
            id: id.to_string(),
            email: format!("{}@example.com", id),
            display_name: "Sam Rivera".to_string(),
            role,
            age: None,
            is_active: true,
            is_professional: false,
            qualifications: None,
            role_assigned_at: Some(now),
            role_assigned_by: Some("system".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_counsellor_access() {
        assert!(user("c1", Role::Counsellor).require_counsellor_access("c1").is_ok());
        assert!(user("c2", Role::Counsellor).require_counsellor_access("c1").is_err());
        assert!(user("y1", Role::Youth).require_counsellor_access("y1").is_err());
        assert!(user("a1", Role::Admin).require_counsellor_access("c1").is_ok());
    }

    #[test]
    fn test_token_round_trip() {
        let now = Utc::now().timestamp();
        let claims = UserClaims {
            sub: "uid-42".to_string(),
            email: Some("sam@example.com".to_string()),
            exp: now + 3600,
            iat: now,
        };
        let token = claims.create_token("secret").unwrap();
        let parsed = UserClaims::from_token(&token, "secret", 0).unwrap();
        assert_eq!(parsed.sub, "uid-42");
        assert!(UserClaims::from_token(&token, "other-secret", 0).is_err());
    }

    #[test]
    fn test_register_validation() {
        let request = RegisterUser {
            email: "not-an-email".to_string(),
            display_name: "S".to_string(),
            role: None,
            age: Some(9),
            is_professional: false,
            qualifications: None,
        };
        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("display_name"));
        assert!(fields.contains_key("age"));
    }
}
