use std::sync::Arc;

use tracing::instrument;

use fren_core::AppError;

use super::model::{RoleGrant, RoleId};
use crate::store::RoleRepository;

/// Per-user role grants over the fixed catalog.
#[derive(Clone)]
pub struct RoleService {
    roles: Arc<dyn RoleRepository>,
}

impl RoleService {
    pub fn new(roles: Arc<dyn RoleRepository>) -> Self {
        Self { roles }
    }

    /// Mirrors the catalog into storage. Safe to run on every start.
    #[instrument(skip(self))]
    pub async fn sync_catalog(&self) -> Result<(), AppError> {
        self.roles.sync_catalog().await?;
        tracing::info!(roles = RoleId::ALL.len(), "Role catalog synchronized");
        Ok(())
    }

    pub async fn get(&self, user_id: i64, role: RoleId) -> Result<RoleGrant, AppError> {
        let value = self.roles.grant(user_id, role).await?;
        Ok(RoleGrant::new(role, value))
    }

    /// One entry per catalog role, in catalog order.
    pub async fn get_all(&self, user_id: i64) -> Result<Vec<RoleGrant>, AppError> {
        let granted = self.roles.grants(user_id).await?;
        Ok(RoleId::ALL
            .into_iter()
            .map(|role| RoleGrant::new(role, granted.contains(&role)))
            .collect())
    }

    pub async fn granted(&self, user_id: i64) -> Result<Vec<RoleId>, AppError> {
        let granted = self.roles.grants(user_id).await?;
        Ok(RoleId::ALL
            .into_iter()
            .filter(|role| granted.contains(role))
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn enable(&self, user_id: i64, role: RoleId) -> Result<(), AppError> {
        self.roles.insert_grant(user_id, role).await
    }

    #[instrument(skip(self))]
    pub async fn disable(&self, user_id: i64, role: RoleId) -> Result<(), AppError> {
        self.roles.delete_grant(user_id, role).await
    }

    #[instrument(skip(self))]
    pub async fn enable_all(&self, user_id: i64) -> Result<(), AppError> {
        self.roles.grant_all(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::users::model::{NewUser, UserStatus};
    use crate::store::UserRepository;
    use crate::store::memory::MemoryStore;

    async fn setup() -> (RoleService, Arc<MemoryStore>, i64) {
        let store = Arc::new(MemoryStore::new());
        let user = store
            .create(NewUser {
                email: "roles@test.com".to_string(),
                first_name: "Role".to_string(),
                last_name: "Tester".to_string(),
                password_hash: "hash".to_string(),
                status: UserStatus::Active,
            })
            .await
            .unwrap();
        (RoleService::new(store.clone()), store, user.id)
    }

    #[tokio::test]
    async fn test_get_all_lists_whole_catalog() {
        let (roles, _, user_id) = setup().await;
        roles.enable(user_id, RoleId::UserView).await.unwrap();

        let grants = roles.get_all(user_id).await.unwrap();
        assert_eq!(grants.len(), RoleId::ALL.len());
        for grant in grants {
            assert_eq!(grant.value, grant.id == RoleId::UserView);
        }
    }

    #[tokio::test]
    async fn test_enable_is_idempotent() {
        let (roles, _, user_id) = setup().await;
        roles.enable(user_id, RoleId::UserEdit).await.unwrap();
        roles.enable(user_id, RoleId::UserEdit).await.unwrap();
        assert_eq!(roles.granted(user_id).await.unwrap(), vec![RoleId::UserEdit]);
    }

    #[tokio::test]
    async fn test_disable_removes_grant() {
        let (roles, _, user_id) = setup().await;
        roles.enable(user_id, RoleId::UserEdit).await.unwrap();
        roles.disable(user_id, RoleId::UserEdit).await.unwrap();
        assert!(!roles.get(user_id, RoleId::UserEdit).await.unwrap().value);
        // disabling an absent grant is fine
        roles.disable(user_id, RoleId::UserEdit).await.unwrap();
    }

    #[tokio::test]
    async fn test_enable_all_and_catalog_sync() {
        let (roles, store, user_id) = setup().await;
        roles.sync_catalog().await.unwrap();
        roles.sync_catalog().await.unwrap();
        assert_eq!(store.catalog_len().await, RoleId::ALL.len());

        roles.enable_all(user_id).await.unwrap();
        assert_eq!(roles.granted(user_id).await.unwrap(), RoleId::ALL.to_vec());
    }
}
