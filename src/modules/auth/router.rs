use crate::routing::RouteDescriptor;

use super::controller::{
    check_credentials, login, login_failed, logout, refresh, session, set_password,
};

pub fn auth_routes() -> Vec<RouteDescriptor> {
    vec![
        RouteDescriptor::post("/auth/login")
            .public()
            .handler(check_credentials)
            .handler(login)
            .on_error(login_failed),
        RouteDescriptor::get("/auth/logout").handler(logout),
        RouteDescriptor::get("/auth/token").handler(refresh),
        RouteDescriptor::post("/auth/setpassword").handler(set_password),
        RouteDescriptor::get("/session").handler(session),
    ]
}
