use crate::env_opt;

/// Administrator account created or refreshed at startup.
#[derive(Clone, Debug)]
pub struct AdminConfig {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

impl AdminConfig {
    /// Returns `None` unless both `ADMIN_EMAIL` and `ADMIN_PASSWORD` are set.
    pub fn from_env() -> Option<Self> {
        let email = env_opt("ADMIN_EMAIL")?;
        let password = env_opt("ADMIN_PASSWORD")?;

        Some(Self {
            email,
            first_name: env_opt("ADMIN_FIRST_NAME").unwrap_or_else(|| "Admin".to_string()),
            last_name: env_opt("ADMIN_LAST_NAME").unwrap_or_else(|| "User".to_string()),
            password,
        })
    }
}
