use std::path::PathBuf;

use crate::{env_opt, env_or};

#[derive(Clone, Debug)]
pub struct UploadConfig {
    pub storage_dir: PathBuf,
    pub base_url: String,
    pub max_file_size: usize,
    /// Largest width or height accepted for avatar images, in pixels.
    pub avatar_max_dimension: u32,
}

impl UploadConfig {
    pub fn from_env() -> Self {
        Self {
            storage_dir: env_opt("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("storage/uploads")),
            base_url: env_opt("UPLOAD_BASE_URL")
                .unwrap_or_else(|| "http://localhost:3000/files".to_string()),
            max_file_size: env_or("UPLOAD_MAX_FILE_SIZE", 5 * 1024 * 1024),
            avatar_max_dimension: env_or("AVATAR_MAX_DIMENSION", 512),
        }
    }
}
