use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account role. Closed enumeration: authorization decisions match on this,
/// never on raw strings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    User,
    Manager,
}

impl Role {
    /// Whether this role may moderate any ticket (status, assignment, delete).
    pub fn can_moderate(self) -> bool {
        matches!(self, Role::Manager)
    }
}

/// JWT payload carried on every authenticated request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,    // user ID
    pub email: String,
    pub role: Role,
    pub iat: usize,   // issued at (unix timestamp)
    pub exp: usize,   // expires at (unix timestamp)
    pub iss: String,
    pub aud: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Manager).unwrap(), "\"manager\"");
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
    }

    #[test]
    fn only_manager_can_moderate() {
        assert!(Role::Manager.can_moderate());
        assert!(!Role::User.can_moderate());
    }
}
