//! Persistence seams consumed by the services.
//!
//! [`postgres::PgStore`] is the production implementation. The in-memory
//! [`memory::MemoryStore`] backs unit and integration tests.

use async_trait::async_trait;

use fren_core::AppError;

use crate::modules::roles::model::RoleId;
use crate::modules::users::model::{NewUser, User, UserStatus};

#[cfg(any(test, feature = "test-utils"))]
pub mod memory;
pub mod postgres;

/// Guard evaluated against the stored (encrypted) active token while the user
/// row is locked. Returning an error aborts the replacement.
pub type TokenCheck<'a> = dyn Fn(Option<&str>) -> Result<(), AppError> + Send + Sync + 'a;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Users ordered by id. `limit: None` returns every row after `offset`.
    async fn list(&self, offset: i64, limit: Option<i64>) -> Result<Vec<User>, AppError>;

    /// Fails with `AlreadyExists("email")` when the email is taken.
    async fn create(&self, user: NewUser) -> Result<User, AppError>;

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), AppError>;

    async fn password_hash(&self, id: i64) -> Result<String, AppError>;

    async fn status(&self, id: i64) -> Result<UserStatus, AppError>;

    /// Writes `status` under the row lock and returns the previous value.
    async fn set_status(&self, id: i64, status: UserStatus) -> Result<UserStatus, AppError>;

    async fn touch_last_login(&self, id: i64) -> Result<(), AppError>;

    /// Replaces the avatar key and returns the previous one.
    async fn set_avatar(&self, id: i64, key: &str) -> Result<Option<String>, AppError>;

    /// The encrypted active token, if any.
    async fn active_token(&self, id: i64) -> Result<Option<String>, AppError>;

    /// Unconditionally stores (or clears, with `None`) the encrypted active token.
    async fn set_active_token(&self, id: i64, token: Option<&str>) -> Result<(), AppError>;

    /// Runs `check` against the stored token and writes `token` only if it
    /// passes, atomically with respect to other replacements for the user.
    async fn replace_active_token(
        &self,
        id: i64,
        check: &TokenCheck<'_>,
        token: &str,
    ) -> Result<(), AppError>;
}

#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Upserts every catalog role with its description.
    async fn sync_catalog(&self) -> Result<(), AppError>;

    async fn grant(&self, user_id: i64, role: RoleId) -> Result<bool, AppError>;

    /// Every role granted to the user.
    async fn grants(&self, user_id: i64) -> Result<Vec<RoleId>, AppError>;

    /// Idempotent. Fails with `NotFound("user")` for an unknown user.
    async fn insert_grant(&self, user_id: i64, role: RoleId) -> Result<(), AppError>;

    async fn delete_grant(&self, user_id: i64, role: RoleId) -> Result<(), AppError>;

    /// Replaces the user's grants with the full catalog.
    async fn grant_all(&self, user_id: i64) -> Result<(), AppError>;
}
