//! # Fren Core
//!
//! Foundational types shared by every Fren portal crate:
//!
//! - [`errors`]: the closed error taxonomy and its HTTP rendering
//! - [`pagination`]: page/limit parsing for list endpoints
//! - [`password`]: bcrypt hashing and verification
//! - [`file_storage`]: storage backends for uploaded files

pub mod errors;
pub mod file_storage;
pub mod pagination;
pub mod password;

pub use errors::{AppError, ErrorKind, FriendlyDetails, INTERNAL_ERROR_MESSAGE};
pub use file_storage::{FileStorage, LocalFileStorage, StorageError};
pub use pagination::{Pagination, PaginationParams};
pub use password::{hash_password, verify_password};
