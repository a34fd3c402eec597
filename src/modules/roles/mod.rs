//! Fixed role catalog and per-user grants.

pub mod controller;
pub mod model;
pub mod router;
pub mod service;

pub use router::roles_routes;
pub use service::RoleService;
