use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity record for the signed-in account.
///
/// Produced only by identity-service responses; the client never
/// constructs one locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub organization: Option<String>,
    pub role: String,
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Display name for the navigation chrome.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.email
        } else {
            &self.name
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user_json() -> &'static str {
        r#"{
            "id": "2f1b0a8e-5a4e-4d2a-9a37-6f8f6f0f2a11",
            "email": "ana@example.com",
            "name": "Ana",
            "organization": "Example Lab",
            "role": "user",
            "created_at": "2026-01-15T09:30:00Z"
        }"#
    }

    #[test]
    fn test_user_deserializes_from_service_shape() {
        let user: User = serde_json::from_str(sample_user_json())
            .expect("Failed to parse user test JSON");
        assert_eq!(user.email, "ana@example.com");
        assert_eq!(user.name, "Ana");
        assert_eq!(user.organization.as_deref(), Some("Example Lab"));
        assert_eq!(user.role, "user");
        assert!(!user.is_admin());
    }

    #[test]
    fn test_user_organization_is_optional() {
        let json = r#"{
            "id": "u1",
            "email": "solo@example.com",
            "name": "Solo",
            "organization": null,
            "role": "admin",
            "created_at": "2026-01-15T09:30:00Z"
        }"#;
        let user: User = serde_json::from_str(json).expect("Failed to parse user");
        assert!(user.organization.is_none());
        assert!(user.is_admin());
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let mut user: User = serde_json::from_str(sample_user_json()).unwrap();
        assert_eq!(user.display_name(), "Ana");
        user.name.clear();
        assert_eq!(user.display_name(), "ana@example.com");
    }
}
