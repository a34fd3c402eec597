//! PostgreSQL implementation of the repositories.

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;

use fren_core::AppError;

use super::{RoleRepository, TokenCheck, UserRepository};
use crate::modules::roles::model::RoleId;
use crate::modules::users::model::{NewUser, User, UserRow, UserStatus};

const USER_COLUMNS: &str =
    "id, email, first_name, last_name, status, avatar, last_login_time, created_at";

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

fn into_user(row: UserRow) -> Result<User, AppError> {
    User::try_from(row).map_err(AppError::database)
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user")
        .map_err(AppError::database)?;

        row.map(into_user).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user by email")
        .map_err(AppError::database)?;

        row.map(into_user).transpose()
    }

    async fn list(&self, offset: i64, limit: Option<i64>) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY id OFFSET $1 LIMIT $2"
        ))
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list users")
        .map_err(AppError::database)?;

        rows.into_iter().map(into_user).collect()
    }

    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (email, first_name, last_name, password_hash, status) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        ))
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.password_hash)
        .bind(user.status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::already_exists("email")
            } else {
                AppError::database(anyhow::Error::new(e).context("Failed to insert user"))
            }
        })?;

        into_user(row)
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, jwt = NULL, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await
        .context("Failed to update password")
        .map_err(AppError::database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("user"));
        }
        Ok(())
    }

    async fn password_hash(&self, id: i64) -> Result<String, AppError> {
        sqlx::query_scalar::<_, String>("SELECT password_hash FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch password hash")
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found("user"))
    }

    async fn status(&self, id: i64) -> Result<UserStatus, AppError> {
        let status = sqlx::query_scalar::<_, String>("SELECT status FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch user status")
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found("user"))?;

        status.parse().map_err(AppError::database)
    }

    async fn set_status(&self, id: i64, status: UserStatus) -> Result<UserStatus, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(AppError::database)?;

        let previous: UserStatus =
            sqlx::query_scalar::<_, String>("SELECT status FROM users WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .context("Failed to lock user")
                .map_err(AppError::database)?
                .ok_or_else(|| AppError::not_found("user"))?
                .parse()
                .map_err(AppError::database)?;

        if previous != status {
            sqlx::query("UPDATE users SET status = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(status.as_str())
                .execute(&mut *tx)
                .await
                .context("Failed to update user status")
                .map_err(AppError::database)?;
        }

        tx.commit()
            .await
            .context("Failed to commit status change")
            .map_err(AppError::database)?;

        Ok(previous)
    }

    async fn touch_last_login(&self, id: i64) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET last_login_time = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to update last login time")
            .map_err(AppError::database)?;
        Ok(())
    }

    async fn set_avatar(&self, id: i64, key: &str) -> Result<Option<String>, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(AppError::database)?;

        let previous =
            sqlx::query_scalar::<_, Option<String>>("SELECT avatar FROM users WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .context("Failed to lock user")
                .map_err(AppError::database)?
                .ok_or_else(|| AppError::not_found("user"))?;

        sqlx::query("UPDATE users SET avatar = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(key)
            .execute(&mut *tx)
            .await
            .context("Failed to update avatar")
            .map_err(AppError::database)?;

        tx.commit()
            .await
            .context("Failed to commit avatar change")
            .map_err(AppError::database)?;

        Ok(previous)
    }

    async fn active_token(&self, id: i64) -> Result<Option<String>, AppError> {
        sqlx::query_scalar::<_, Option<String>>("SELECT jwt FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch active token")
            .map_err(AppError::database)?
            .ok_or_else(|| AppError::not_found("user"))
    }

    async fn set_active_token(&self, id: i64, token: Option<&str>) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET jwt = $2 WHERE id = $1")
            .bind(id)
            .bind(token)
            .execute(&self.pool)
            .await
            .context("Failed to store active token")
            .map_err(AppError::database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("user"));
        }
        Ok(())
    }

    async fn replace_active_token(
        &self,
        id: i64,
        check: &TokenCheck<'_>,
        token: &str,
    ) -> Result<(), AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(AppError::database)?;

        let stored =
            sqlx::query_scalar::<_, Option<String>>("SELECT jwt FROM users WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .context("Failed to lock user")
                .map_err(AppError::database)?
                .ok_or_else(|| AppError::not_found("user"))?;

        // dropping `tx` on a failed check rolls back and releases the lock
        check(stored.as_deref())?;

        sqlx::query("UPDATE users SET jwt = $2 WHERE id = $1")
            .bind(id)
            .bind(token)
            .execute(&mut *tx)
            .await
            .context("Failed to replace active token")
            .map_err(AppError::database)?;

        tx.commit()
            .await
            .context("Failed to commit token replacement")
            .map_err(AppError::database)?;

        Ok(())
    }
}

#[async_trait]
impl RoleRepository for PgStore {
    async fn sync_catalog(&self) -> Result<(), AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(AppError::database)?;

        for role in RoleId::ALL {
            sqlx::query(
                "INSERT INTO roles (role_id, description) VALUES ($1, $2) \
                 ON CONFLICT (role_id) DO UPDATE SET description = EXCLUDED.description",
            )
            .bind(role.as_str())
            .bind(role.description())
            .execute(&mut *tx)
            .await
            .context("Failed to upsert role")
            .map_err(AppError::database)?;
        }

        tx.commit()
            .await
            .context("Failed to commit role catalog")
            .map_err(AppError::database)?;
        Ok(())
    }

    async fn grant(&self, user_id: i64, role: RoleId) -> Result<bool, AppError> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM user_roles WHERE user_id = $1 AND role_id = $2)",
        )
        .bind(user_id)
        .bind(role.as_str())
        .fetch_one(&self.pool)
        .await
        .context("Failed to fetch role grant")
        .map_err(AppError::database)
    }

    async fn grants(&self, user_id: i64) -> Result<Vec<RoleId>, AppError> {
        let ids = sqlx::query_scalar::<_, String>(
            "SELECT role_id FROM user_roles WHERE user_id = $1 ORDER BY role_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch role grants")
        .map_err(AppError::database)?;

        Ok(ids
            .iter()
            .filter_map(|id| match id.parse::<RoleId>() {
                Ok(role) => Some(role),
                Err(_) => {
                    tracing::warn!(role_id = %id, user_id, "Ignoring grant for unknown role");
                    None
                }
            })
            .collect())
    }

    async fn insert_grant(&self, user_id: i64, role: RoleId) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2) \
             ON CONFLICT (user_id, role_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(role.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::not_found("user")
            } else {
                AppError::database(anyhow::Error::new(e).context("Failed to insert role grant"))
            }
        })?;
        Ok(())
    }

    async fn delete_grant(&self, user_id: i64, role: RoleId) -> Result<(), AppError> {
        sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role_id = $2")
            .bind(user_id)
            .bind(role.as_str())
            .execute(&self.pool)
            .await
            .context("Failed to delete role grant")
            .map_err(AppError::database)?;
        Ok(())
    }

    async fn grant_all(&self, user_id: i64) -> Result<(), AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")
            .map_err(AppError::database)?;

        sqlx::query("DELETE FROM user_roles WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .context("Failed to clear role grants")
            .map_err(AppError::database)?;

        for role in RoleId::ALL {
            sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2)")
                .bind(user_id)
                .bind(role.as_str())
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    if is_foreign_key_violation(&e) {
                        AppError::not_found("user")
                    } else {
                        AppError::database(anyhow::Error::new(e).context("Failed to grant role"))
                    }
                })?;
        }

        tx.commit()
            .await
            .context("Failed to commit role grants")
            .map_err(AppError::database)?;
        Ok(())
    }
}
