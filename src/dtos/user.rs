use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::middleware::auth::{ROLE_MANAGER, ROLE_SELLER};

#[derive(Deserialize)]
pub struct RegisterUserRequest {
    pub username: String,
    pub password: String,
    pub role: String,
}

impl RegisterUserRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.role != ROLE_MANAGER && self.role != ROLE_SELLER {
            return Err(AppError::validation("Invalid role"));
        }
        if self.username.trim().is_empty() {
            return Err(AppError::validation("Username required"));
        }
        if self.password.len() < 6 {
            return Err(AppError::validation("Password too short"));
        }
        Ok(())
    }
}

#[derive(Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<crate::models::user::User> for UserResponse {
    fn from(user: crate::models::user::User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in_seconds: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(username: &str, password: &str, role: &str) -> RegisterUserRequest {
        RegisterUserRequest {
            username: username.into(),
            password: password.into(),
            role: role.into(),
        }
    }

    #[test]
    fn accepts_known_roles() {
        assert!(req("ana", "secret1", "manager").validate().is_ok());
        assert!(req("bia", "secret1", "seller").validate().is_ok());
    }

    #[test]
    fn rejects_bad_input() {
        assert!(req("ana", "secret1", "driver").validate().is_err());
        assert!(req(" ", "secret1", "seller").validate().is_err());
        assert!(req("ana", "12345", "seller").validate().is_err());
    }
}
