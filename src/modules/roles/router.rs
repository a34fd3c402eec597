use crate::middleware::params::UserIdParam;
use crate::routing::RouteDescriptor;

use super::controller::{disable_user_role, enable_user_role, get_user_role, get_user_roles};
use super::model::RoleId;

pub fn roles_routes() -> Vec<RouteDescriptor> {
    vec![
        RouteDescriptor::get("/users/{userId}/roles")
            .accept(RoleId::UserView)
            .stage(UserIdParam)
            .handler(get_user_roles),
        RouteDescriptor::get("/users/{userId}/roles/{roleId}")
            .accept(RoleId::UserView)
            .stage(UserIdParam)
            .handler(get_user_role),
        RouteDescriptor::put("/users/{userId}/roles/{roleId}")
            .accept(RoleId::UserEdit)
            .stage(UserIdParam)
            .handler(enable_user_role),
        RouteDescriptor::delete("/users/{userId}/roles/{roleId}")
            .accept(RoleId::UserEdit)
            .stage(UserIdParam)
            .handler(disable_user_role),
    ]
}
