use crate::middleware::multipart::{DimensionLimit, MultipartOptions};
use crate::middleware::params::UserIdParam;
use crate::modules::roles::model::RoleId;
use crate::routing::RouteDescriptor;

use super::controller::{
    approve_user, current_user, disable_user, get_user, list_users, upload_avatar,
};

const AVATAR_TYPES: &[&str] = &["image/png", "image/jpeg", "image/gif"];

pub fn users_routes() -> Vec<RouteDescriptor> {
    vec![
        RouteDescriptor::get("/users")
            .paginated()
            .accept(RoleId::UserView)
            .handler(list_users),
        RouteDescriptor::get("/users/current").handler(current_user),
        RouteDescriptor::put("/users/current/avatar")
            .multipart(
                MultipartOptions::files(1)
                    .mime_types(AVATAR_TYPES)
                    .max_image_dimension(DimensionLimit::AvatarSetting),
            )
            .handler(upload_avatar),
        RouteDescriptor::get("/users/{userId}")
            .accept(RoleId::UserView)
            .stage(UserIdParam)
            .handler(get_user),
        RouteDescriptor::post("/users/{userId}/approve")
            .accept(RoleId::UserEdit)
            .stage(UserIdParam)
            .handler(approve_user),
        RouteDescriptor::post("/users/{userId}/disable")
            .accept(RoleId::UserEdit)
            .stage(UserIdParam)
            .handler(disable_user),
    ]
}
