//! User records as exposed by the API.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserStatus {
    Unconfirmed,
    Active,
    Disabled,
}

impl UserStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            UserStatus::Unconfirmed => "Unconfirmed",
            UserStatus::Active => "Active",
            UserStatus::Disabled => "Disabled",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown user status '{0}'")]
pub struct UnknownStatus(String);

impl FromStr for UserStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Unconfirmed" => Ok(UserStatus::Unconfirmed),
            "Active" => Ok(UserStatus::Active),
            "Disabled" => Ok(UserStatus::Disabled),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Public view of a user. Password hashes and stored tokens never leave the
/// store through this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub status: UserStatus,
    pub avatar: Option<String>,
    pub last_login_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Row shape of the `users` table columns selected for [`User`].
#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub status: String,
    pub avatar: Option<String>,
    pub last_login_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = UnknownStatus;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: row.id,
            email: row.email,
            first_name: row.first_name,
            last_name: row.last_name,
            status: row.status.parse()?,
            avatar: row.avatar,
            last_login_time: row.last_login_time,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub status: UserStatus,
}

/// Response of the status endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub id: i64,
    pub previous: UserStatus,
    pub status: UserStatus,
}

#[derive(Debug, Serialize)]
pub struct AvatarResponse {
    pub key: String,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!("Active".parse::<UserStatus>().unwrap(), UserStatus::Active);
        assert!("active".parse::<UserStatus>().is_err());
    }

    #[test]
    fn test_user_serializes_camel_case() {
        let user = User {
            id: 1,
            email: "a@b.test".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            status: UserStatus::Active,
            avatar: None,
            last_login_time: None,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["firstName"], "Ada");
        assert_eq!(json["status"], "Active");
        assert!(json.get("lastLoginTime").is_some());
        assert!(json.get("passwordHash").is_none());
    }
}
