mod common;

use axum::http::{Method, StatusCode};
use common::{empty_request, spawn_app};
use fren::modules::roles::model::RoleId;
use fren::modules::users::model::UserStatus;

#[tokio::test]
async fn test_list_user_roles() {
    let app = spawn_app().await;
    let admin = app.create_user(UserStatus::Active, &[RoleId::UserView]).await;
    let member = app.create_user(UserStatus::Active, &[RoleId::PlanEdit]).await;
    let token = app.login(&admin.email).await;

    let (status, body) = app
        .get(&format!("/api/v1/users/{}/roles", member.id), Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);

    let grants = body.as_array().unwrap();
    assert_eq!(grants.len(), RoleId::ALL.len());
    for grant in grants {
        let expected = grant["id"] == "PlanEdit";
        assert_eq!(grant["value"], expected, "{grant}");
        assert!(grant["description"].is_string());
    }
}

#[tokio::test]
async fn test_get_single_role() {
    let app = spawn_app().await;
    let admin = app.create_user(UserStatus::Active, &[RoleId::UserView]).await;
    let token = app.login(&admin.email).await;

    let (status, body) = app
        .get("/api/v1/users/current/roles/UserView", Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "UserView");
    assert_eq!(body["value"], true);

    let (status, body) = app
        .get("/api/v1/users/current/roles/Superuser", Some(&token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidParameter");
    assert_eq!(body["details"], "roleId");
}

#[tokio::test]
async fn test_enable_and_disable_role() {
    let app = spawn_app().await;
    let admin = app.create_user(UserStatus::Active, &[RoleId::UserEdit]).await;
    let member = app.create_user(UserStatus::Active, &[]).await;
    let token = app.login(&admin.email).await;
    let uri = format!("/api/v1/users/{}/roles/DatasetLock", member.id);

    let (status, body) = app
        .send(empty_request(Method::PUT, &uri, Some(&token)))
        .await;
    assert_eq!(status, StatusCode::OK);
    let enabled = body
        .as_array()
        .unwrap()
        .iter()
        .find(|grant| grant["id"] == "DatasetLock")
        .unwrap();
    assert_eq!(enabled["value"], true);
    assert_eq!(
        app.state.roles.granted(member.id).await.unwrap(),
        vec![RoleId::DatasetLock]
    );

    // enabling twice is harmless
    let (status, _) = app
        .send(empty_request(Method::PUT, &uri, Some(&token)))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .send(empty_request(Method::DELETE, &uri, Some(&token)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.state.roles.granted(member.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_grant_changes_need_user_edit() {
    let app = spawn_app().await;
    let viewer = app.create_user(UserStatus::Active, &[RoleId::UserView]).await;
    let token = app.login(&viewer.email).await;
    let uri = format!("/api/v1/users/{}/roles/UserEdit", viewer.id);

    let (status, body) = app
        .send(empty_request(Method::PUT, &uri, Some(&token)))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["details"], "UserEdit");
}

#[tokio::test]
async fn test_grant_for_unknown_user() {
    let app = spawn_app().await;
    let admin = app.create_user(UserStatus::Active, &[RoleId::UserEdit]).await;
    let token = app.login(&admin.email).await;

    let (status, body) = app
        .send(empty_request(
            Method::PUT,
            "/api/v1/users/4242/roles/UserView",
            Some(&token),
        ))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["details"], "user");
}

#[tokio::test]
async fn test_catalog_synced_at_startup() {
    let app = spawn_app().await;
    assert_eq!(app.store.catalog_len().await, RoleId::ALL.len());
}
