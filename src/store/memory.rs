//! In-memory repositories for tests.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use fren_core::AppError;

use super::{RoleRepository, TokenCheck, UserRepository};
use crate::modules::roles::model::RoleId;
use crate::modules::users::model::{NewUser, User, UserStatus};

#[derive(Debug)]
struct StoredUser {
    user: User,
    password_hash: String,
    jwt: Option<String>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: i64,
    users: BTreeMap<i64, StoredUser>,
    grants: BTreeSet<(i64, RoleId)>,
    catalog: BTreeMap<RoleId, &'static str>,
}

impl Inner {
    fn user_mut(&mut self, id: i64) -> Result<&mut StoredUser, AppError> {
        self.users.get_mut(&id).ok_or_else(|| AppError::not_found("user"))
    }

    fn user(&self, id: i64) -> Result<&StoredUser, AppError> {
        self.users.get(&id).ok_or_else(|| AppError::not_found("user"))
    }
}

/// Single-mutex store; every operation is atomic with respect to the others.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of catalog rows, for asserting startup sync.
    pub async fn catalog_len(&self) -> usize {
        self.inner.lock().await.catalog.len()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner.users.get(&id).map(|stored| stored.user.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .users
            .values()
            .find(|stored| stored.user.email.eq_ignore_ascii_case(email))
            .map(|stored| stored.user.clone()))
    }

    async fn list(&self, offset: i64, limit: Option<i64>) -> Result<Vec<User>, AppError> {
        let inner = self.inner.lock().await;
        let skip = usize::try_from(offset).unwrap_or(0);
        let take = limit
            .and_then(|limit| usize::try_from(limit).ok())
            .unwrap_or(usize::MAX);
        Ok(inner
            .users
            .values()
            .skip(skip)
            .take(take)
            .map(|stored| stored.user.clone())
            .collect())
    }

    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let mut inner = self.inner.lock().await;
        if inner
            .users
            .values()
            .any(|stored| stored.user.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(AppError::already_exists("email"));
        }

        inner.next_id += 1;
        let created = User {
            id: inner.next_id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            status: user.status,
            avatar: None,
            last_login_time: None,
            created_at: Utc::now(),
        };
        inner.users.insert(
            created.id,
            StoredUser {
                user: created.clone(),
                password_hash: user.password_hash,
                jwt: None,
            },
        );
        Ok(created)
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), AppError> {
        let mut inner = self.inner.lock().await;
        let stored = inner.user_mut(id)?;
        stored.password_hash = password_hash.to_string();
        stored.jwt = None;
        Ok(())
    }

    async fn password_hash(&self, id: i64) -> Result<String, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner.user(id)?.password_hash.clone())
    }

    async fn status(&self, id: i64) -> Result<UserStatus, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner.user(id)?.user.status)
    }

    async fn set_status(&self, id: i64, status: UserStatus) -> Result<UserStatus, AppError> {
        let mut inner = self.inner.lock().await;
        let stored = inner.user_mut(id)?;
        Ok(std::mem::replace(&mut stored.user.status, status))
    }

    async fn touch_last_login(&self, id: i64) -> Result<(), AppError> {
        let mut inner = self.inner.lock().await;
        inner.user_mut(id)?.user.last_login_time = Some(Utc::now());
        Ok(())
    }

    async fn set_avatar(&self, id: i64, key: &str) -> Result<Option<String>, AppError> {
        let mut inner = self.inner.lock().await;
        let stored = inner.user_mut(id)?;
        Ok(stored.user.avatar.replace(key.to_string()))
    }

    async fn active_token(&self, id: i64) -> Result<Option<String>, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner.user(id)?.jwt.clone())
    }

    async fn set_active_token(&self, id: i64, token: Option<&str>) -> Result<(), AppError> {
        let mut inner = self.inner.lock().await;
        inner.user_mut(id)?.jwt = token.map(str::to_string);
        Ok(())
    }

    async fn replace_active_token(
        &self,
        id: i64,
        check: &TokenCheck<'_>,
        token: &str,
    ) -> Result<(), AppError> {
        let mut inner = self.inner.lock().await;
        let stored = inner.user_mut(id)?;
        check(stored.jwt.as_deref())?;
        stored.jwt = Some(token.to_string());
        Ok(())
    }
}

#[async_trait]
impl RoleRepository for MemoryStore {
    async fn sync_catalog(&self) -> Result<(), AppError> {
        let mut inner = self.inner.lock().await;
        for role in RoleId::ALL {
            inner.catalog.insert(role, role.description());
        }
        Ok(())
    }

    async fn grant(&self, user_id: i64, role: RoleId) -> Result<bool, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner.grants.contains(&(user_id, role)))
    }

    async fn grants(&self, user_id: i64) -> Result<Vec<RoleId>, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .grants
            .iter()
            .filter(|(id, _)| *id == user_id)
            .map(|(_, role)| *role)
            .collect())
    }

    async fn insert_grant(&self, user_id: i64, role: RoleId) -> Result<(), AppError> {
        let mut inner = self.inner.lock().await;
        inner.user(user_id)?;
        inner.grants.insert((user_id, role));
        Ok(())
    }

    async fn delete_grant(&self, user_id: i64, role: RoleId) -> Result<(), AppError> {
        let mut inner = self.inner.lock().await;
        inner.grants.remove(&(user_id, role));
        Ok(())
    }

    async fn grant_all(&self, user_id: i64) -> Result<(), AppError> {
        let mut inner = self.inner.lock().await;
        inner.user(user_id)?;
        for role in RoleId::ALL {
            inner.grants.insert((user_id, role));
        }
        Ok(())
    }
}
