//! Login, logout, token refresh and the session endpoint.

pub mod controller;
pub mod model;
pub mod router;
pub mod service;

pub use router::auth_routes;
pub use service::{AuthService, TokenService};
