use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Public view of a user. The password hash never leaves the database layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Returned by register and login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: UserResponse,
}

// Database record including the credential hash
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserRecord {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserRecord> for UserResponse {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
            email: record.email,
            created_at: record.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_conversion_drops_hash() {
        let record = UserRecord {
            id: 1,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$2b$12$hash".to_string(),
            created_at: Utc::now(),
        };

        let response = UserResponse::from(record);
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("hash"));
        assert!(json.contains("alice@example.com"));
    }
}
