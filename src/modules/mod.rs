pub mod auth;
pub mod roles;
pub mod users;

pub use self::auth::model::LoginRequest;
pub use self::users::model::User;

use crate::routing::RouteDescriptor;

/// Every endpoint of the API, relative to its version prefix.
pub fn routes() -> Vec<RouteDescriptor> {
    let mut routes = auth::auth_routes();
    routes.extend(users::users_routes());
    routes.extend(roles::roles_routes());
    routes
}
