use std::sync::Arc;

use anyhow::Context;

use fren_config::{
    AdminConfig, CorsConfig, CryptoConfig, JwtConfig, ServerConfig, UploadConfig,
};
use fren_core::{FileStorage, LocalFileStorage};
use fren_db::{init_db_pool, run_migrations};

use crate::modules::auth::TokenService;
use crate::modules::roles::RoleService;
use crate::modules::users::UserService;
use crate::store::postgres::PgStore;
use crate::store::{RoleRepository, UserRepository};

/// Everything read from the environment at startup.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub jwt: JwtConfig,
    pub crypto: CryptoConfig,
    pub cors: CorsConfig,
    pub server: ServerConfig,
    pub upload: UploadConfig,
    pub admin: Option<AdminConfig>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            jwt: JwtConfig::from_env(),
            crypto: CryptoConfig::from_env(),
            cors: CorsConfig::from_env(),
            server: ServerConfig::from_env(),
            upload: UploadConfig::from_env(),
            admin: AdminConfig::from_env(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub user_repo: Arc<dyn UserRepository>,
    pub tokens: TokenService,
    pub roles: RoleService,
    pub users: UserService,
    pub storage: Arc<dyn FileStorage>,
    pub server_config: ServerConfig,
    pub upload_config: UploadConfig,
    pub cors_config: CorsConfig,
    pub admin_config: Option<AdminConfig>,
}

impl AppState {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        role_repo: Arc<dyn RoleRepository>,
        storage: Arc<dyn FileStorage>,
        config: AppConfig,
    ) -> Self {
        let roles = RoleService::new(role_repo);
        Self {
            tokens: TokenService::new(user_repo.clone(), config.jwt, &config.crypto),
            users: UserService::new(user_repo.clone(), roles.clone()),
            roles,
            user_repo,
            storage,
            server_config: config.server,
            upload_config: config.upload,
            cors_config: config.cors,
            admin_config: config.admin,
        }
    }

    /// Mirrors the role catalog and, when configured, provisions the
    /// administrator account.
    pub async fn bootstrap(&self) -> anyhow::Result<()> {
        self.roles
            .sync_catalog()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to synchronize role catalog: {e}"))?;

        if let Some(admin) = &self.admin_config {
            self.users
                .bootstrap_admin(admin)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to provision administrator: {e}"))?;
        }
        Ok(())
    }
}

pub fn local_storage(config: &UploadConfig) -> Arc<dyn FileStorage> {
    Arc::new(LocalFileStorage::new(
        config.storage_dir.clone(),
        config.base_url.clone(),
        config.max_file_size,
    ))
}

/// Connects to PostgreSQL, applies migrations and wires the services.
pub async fn init_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
    let pool = init_db_pool(&database_url)
        .await
        .context("Failed to connect to database")?;
    run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;

    let store = Arc::new(PgStore::new(pool));
    let storage = local_storage(&config.upload);
    Ok(AppState::new(store.clone(), store, storage, config))
}
