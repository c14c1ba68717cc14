use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;

use super::UnknownVariant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "VARCHAR", rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Student,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Student => "student",
        }
    }
}

impl FromStr for UserRole {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "student" => Ok(UserRole::Student),
            other => Err(UnknownVariant {
                kind: "user role",
                value: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub role: UserRole,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub facebook_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct ContactDetails {
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub facebook_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: UserRole,
    pub contact: ContactDetails,
}

const GUEST_EMAIL_DOMAIN: &str = "@guest.local";

/// Synthetic account email for anonymous takers, keyed by the name they typed.
pub fn guest_email(student_name: &str) -> String {
    format!(
        "guest_{}{}",
        student_name.trim().to_lowercase().replace(' ', "_"),
        GUEST_EMAIL_DOMAIN
    )
}

/// Guest addresses belong to anonymous submissions and cannot be claimed by sign-up.
pub fn is_guest_email(email: &str) -> bool {
    email.trim().to_lowercase().ends_with(GUEST_EMAIL_DOMAIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guest_email_is_slugged() {
        assert_eq!(guest_email("Ada Lovelace"), "guest_ada_lovelace@guest.local");
        assert_eq!(guest_email("  BOB  "), "guest_bob@guest.local");
        assert!(is_guest_email("Guest_Bob@GUEST.local"));
        assert!(!is_guest_email("bob@example.com"));
    }

    #[test]
    fn role_round_trips_through_text() {
        assert_eq!("student".parse::<UserRole>().unwrap(), UserRole::Student);
        assert!("moderator".parse::<UserRole>().is_err());
    }
}
