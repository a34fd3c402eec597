use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::modules::roles::model::RoleId;
use crate::modules::users::model::User;

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 1))]
    pub password: String,
}

/// Body of `POST /auth/setpassword`.
#[derive(Debug, Deserialize, Validate)]
pub struct SetPasswordRequest {
    #[serde(rename = "oldPassword")]
    #[validate(length(min = 1))]
    pub old_password: String,
    #[serde(rename = "newPassword")]
    #[validate(length(min = 8, max = 128, message = "Passwords must be at least 8 characters long"))]
    pub new_password: String,
    #[serde(rename = "newPasswordConfirmation")]
    pub new_password_confirmation: String,
}

/// Why a login attempt was refused. Carried as the `details` of the
/// resulting `NotAuthorized` error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFailure {
    MissingCredentials,
    InvalidUser,
    NotVerified,
    InvalidPassword,
}

impl LoginFailure {
    pub const ALL: [LoginFailure; 4] = [
        LoginFailure::MissingCredentials,
        LoginFailure::InvalidUser,
        LoginFailure::NotVerified,
        LoginFailure::InvalidPassword,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            LoginFailure::MissingCredentials => "MissingCredentials",
            LoginFailure::InvalidUser => "InvalidUser",
            LoginFailure::NotVerified => "NotVerified",
            LoginFailure::InvalidPassword => "InvalidPassword",
        }
    }

    pub fn friendly(self) -> &'static str {
        match self {
            LoginFailure::MissingCredentials => "Please enter your email address and password.",
            LoginFailure::InvalidUser | LoginFailure::InvalidPassword => {
                "The email address or password you entered is incorrect."
            }
            LoginFailure::NotVerified => {
                "Your account has not been approved yet. Please contact an administrator."
            }
        }
    }

    pub fn from_details(details: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|failure| failure.as_str() == details)
    }
}

/// Login and refresh response: the user merged with the token fields.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    #[serde(flatten)]
    pub user: User,
    pub token: String,
    /// Unix timestamp (seconds) at which the token expires.
    pub token_expiration: i64,
    /// Token lifetime in seconds.
    pub token_duration: i64,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: User,
    pub roles: Vec<RoleId>,
}
