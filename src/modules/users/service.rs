use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use fren_config::AdminConfig;
use fren_core::{AppError, FileStorage, Pagination, hash_password, verify_password};

use super::model::{AvatarResponse, NewUser, StatusChange, User, UserStatus};
use crate::middleware::multipart::UploadedFile;
use crate::modules::roles::service::RoleService;
use crate::store::UserRepository;

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    roles: RoleService,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>, roles: RoleService) -> Self {
        Self { users, roles }
    }

    pub async fn get(&self, user_id: i64) -> Result<User, AppError> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("user"))
    }

    pub async fn list(&self, pagination: &Pagination) -> Result<Vec<User>, AppError> {
        self.users.list(pagination.offset, pagination.limit).await
    }

    /// Moves an approved account between `Active` and `Disabled`. Accounts
    /// still awaiting confirmation cannot be changed here.
    #[instrument(skip(self))]
    pub async fn change_status(
        &self,
        admin_id: i64,
        user_id: i64,
        status: UserStatus,
    ) -> Result<StatusChange, AppError> {
        if self.users.status(user_id).await? == UserStatus::Unconfirmed {
            return Err(AppError::not_authorized("status"));
        }

        let previous = self.users.set_status(user_id, status).await?;
        tracing::info!(
            admin_id,
            user_id,
            previous = %previous,
            status = %status,
            "User status changed"
        );

        Ok(StatusChange {
            id: user_id,
            previous,
            status,
        })
    }

    #[instrument(skip(self, password))]
    pub async fn create(
        &self,
        email: &str,
        first_name: &str,
        last_name: &str,
        password: &str,
        status: UserStatus,
    ) -> Result<User, AppError> {
        let password_hash = hash_password(password)?;
        self.users
            .create(NewUser {
                email: email.trim().to_string(),
                first_name: first_name.trim().to_string(),
                last_name: last_name.trim().to_string(),
                password_hash,
                status,
            })
            .await
    }

    /// Replaces the user's password after checking the current one. Storing
    /// the new hash clears the active token, so the caller must log in again.
    #[instrument(skip(self, old_password, new_password))]
    pub async fn change_password(
        &self,
        user_id: i64,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let current = self.users.password_hash(user_id).await?;
        if !verify_password(old_password, &current)? {
            return Err(AppError::invalid_parameter("oldPassword"));
        }

        let password_hash = hash_password(new_password)?;
        self.users.update_password(user_id, &password_hash).await?;
        tracing::info!(user_id, "Password changed");
        Ok(())
    }

    /// Creates the configured administrator, or refreshes its password, then
    /// activates it and grants every catalog role.
    #[instrument(skip(self, config), fields(email = %config.email))]
    pub async fn bootstrap_admin(&self, config: &AdminConfig) -> Result<User, AppError> {
        let user = match self.users.find_by_email(&config.email).await? {
            Some(existing) => {
                let password_hash = hash_password(&config.password)?;
                self.users.update_password(existing.id, &password_hash).await?;
                existing
            }
            None => {
                self.create(
                    &config.email,
                    &config.first_name,
                    &config.last_name,
                    &config.password,
                    UserStatus::Active,
                )
                .await?
            }
        };

        self.users.set_status(user.id, UserStatus::Active).await?;
        self.roles.enable_all(user.id).await?;

        tracing::info!(user_id = user.id, "Administrator account ready");
        self.get(user.id).await
    }

    /// Stores an uploaded avatar and removes the one it replaces.
    #[instrument(skip(self, file, storage), fields(size = file.data.len()))]
    pub async fn set_avatar(
        &self,
        user_id: i64,
        file: &UploadedFile,
        storage: &dyn FileStorage,
    ) -> Result<AvatarResponse, AppError> {
        let extension = match file.mime_type.as_str() {
            "image/png" => "png",
            "image/gif" => "gif",
            _ => "jpg",
        };
        let key = format!("avatars/{user_id}-{}.{extension}", Uuid::new_v4().simple());

        storage.save(&key, &file.data).await?;
        let previous = match self.users.set_avatar(user_id, &key).await {
            Ok(previous) => previous,
            Err(err) => {
                let _ = storage.delete(&key).await;
                return Err(err);
            }
        };

        if let Some(previous) = previous {
            if let Err(e) = storage.delete(&previous).await {
                tracing::warn!(error = %e, key = %previous, "Failed to delete replaced avatar");
            }
        }

        Ok(AvatarResponse {
            url: storage.url(&key)?,
            key,
        })
    }
}
