mod common;

use axum::http::{Method, StatusCode};
use common::{Part, empty_request, json_request, multipart_request, png, spawn_app};
use fren::modules::roles::model::RoleId;
use fren::modules::users::model::UserStatus;
use fren::store::UserRepository;
use serde_json::json;

#[tokio::test]
async fn test_list_requires_user_view() {
    let app = spawn_app().await;
    let user = app.create_user(UserStatus::Active, &[RoleId::ReportView]).await;
    let token = app.login(&user.email).await;

    let (status, body) = app.get("/api/v1/users", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "NotAuthorized");
    assert_eq!(body["details"], "UserView");
}

#[tokio::test]
async fn test_list_paginates() {
    let app = spawn_app().await;
    let viewer = app.create_user(UserStatus::Active, &[RoleId::UserView]).await;
    for _ in 0..4 {
        app.create_user(UserStatus::Unconfirmed, &[]).await;
    }
    let token = app.login(&viewer.email).await;

    let (status, body) = app.get("/api/v1/users", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 5);

    let (status, body) = app.get("/api/v1/users?page=2&limit=2", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    let page = body.as_array().unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0]["id"], viewer.id + 2);

    let (status, body) = app.get("/api/v1/users?page=0&limit=0", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_list_rejects_non_numeric_page() {
    let app = spawn_app().await;
    let viewer = app.create_user(UserStatus::Active, &[RoleId::UserView]).await;
    let token = app.login(&viewer.email).await;

    let (status, body) = app.get("/api/v1/users?page=two", Some(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "InvalidParameter");
    assert_eq!(body["details"], "page");
}

#[tokio::test]
async fn test_get_user_by_id() {
    let app = spawn_app().await;
    let viewer = app.create_user(UserStatus::Active, &[RoleId::UserView]).await;
    let other = app.create_user(UserStatus::Unconfirmed, &[]).await;
    let token = app.login(&viewer.email).await;

    let (status, body) = app
        .get(&format!("/api/v1/users/{}", other.id), Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], other.email);
    assert_eq!(body["status"], "Unconfirmed");

    let (status, body) = app.get("/api/v1/users/current", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], viewer.id);

    let (status, body) = app.get("/api/v1/users/abc", Some(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"], "userId");

    let (status, body) = app.get("/api/v1/users/9999", Some(&token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["details"], "user");
}

#[tokio::test]
async fn test_role_check_runs_before_path_parsing() {
    let app = spawn_app().await;
    let user = app.create_user(UserStatus::Active, &[]).await;
    let token = app.login(&user.email).await;

    let (status, body) = app.get("/api/v1/users/abc", Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["details"], "UserView");
}

#[tokio::test]
async fn test_approve_and_disable() {
    let app = spawn_app().await;
    let admin = app.create_user(UserStatus::Active, &[RoleId::UserEdit]).await;
    let member = app.create_user(UserStatus::Active, &[]).await;
    let token = app.login(&admin.email).await;

    let uri = format!("/api/v1/users/{}/disable", member.id);
    let (status, body) = app
        .send(empty_request(Method::POST, &uri, Some(&token)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["previous"], "Active");
    assert_eq!(body["status"], "Disabled");
    assert_eq!(
        app.store.status(member.id).await.unwrap(),
        UserStatus::Disabled
    );

    let uri = format!("/api/v1/users/{}/approve", member.id);
    let (status, body) = app
        .send(empty_request(Method::POST, &uri, Some(&token)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "Active");
}

#[tokio::test]
async fn test_status_change_refuses_unconfirmed() {
    let app = spawn_app().await;
    let admin = app.create_user(UserStatus::Active, &[RoleId::UserEdit]).await;
    let pending = app.create_user(UserStatus::Unconfirmed, &[]).await;
    let token = app.login(&admin.email).await;

    let uri = format!("/api/v1/users/{}/approve", pending.id);
    let (status, body) = app
        .send(empty_request(Method::POST, &uri, Some(&token)))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["details"], "status");
}

#[tokio::test]
async fn test_avatar_upload() {
    let app = spawn_app().await;
    let user = app.create_user(UserStatus::Active, &[]).await;
    let token = app.login(&user.email).await;
    let image = png(50, 50);

    let (status, body) = app
        .send(multipart_request(
            Method::PUT,
            "/api/v1/users/current/avatar",
            Some(&token),
            &[Part {
                name: "avatar",
                file_name: Some("me.png"),
                content_type: Some("image/png"),
                data: &image,
            }],
        ))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let key = body["key"].as_str().unwrap();
    assert!(key.starts_with(&format!("avatars/{}-", user.id)));
    assert!(key.ends_with(".png"));
    assert_eq!(body["url"], format!("http://localhost/files/{key}"));
    assert!(app.storage_dir.join(key).exists());

    let (_, current) = app.get("/api/v1/users/current", Some(&token)).await;
    assert_eq!(current["avatar"], key);
}

#[tokio::test]
async fn test_avatar_validation_failures() {
    let app = spawn_app().await;
    let user = app.create_user(UserStatus::Active, &[]).await;
    let token = app.login(&user.email).await;
    let wide = png(200, 50);
    let small = png(10, 10);

    let cases: Vec<(Vec<Part<'_>>, &str)> = vec![
        (
            vec![Part {
                name: "avatar",
                file_name: Some("wide.png"),
                content_type: Some("image/png"),
                data: &wide,
            }],
            "avatar: maximum image size exceeded",
        ),
        (
            vec![Part {
                name: "avatar",
                file_name: Some("notes.png"),
                content_type: Some("image/png"),
                data: b"plain text pretending to be an image",
            }],
            "avatar: image corrupt",
        ),
        (
            vec![Part {
                name: "avatar",
                file_name: Some("cv.pdf"),
                content_type: Some("application/pdf"),
                data: b"%PDF-1.4",
            }],
            "avatar: unsupported mime type 'application/pdf'",
        ),
        (
            vec![
                Part {
                    name: "avatar",
                    file_name: Some("a.png"),
                    content_type: Some("image/png"),
                    data: &small,
                },
                Part {
                    name: "avatar",
                    file_name: Some("b.png"),
                    content_type: Some("image/png"),
                    data: &small,
                },
            ],
            "avatar: maximum number of 1 file(s) exceeded",
        ),
    ];

    for (parts, details) in cases {
        let (status, body) = app
            .send(multipart_request(
                Method::PUT,
                "/api/v1/users/current/avatar",
                Some(&token),
                &parts,
            ))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{details}");
        assert_eq!(body["error"], "InvalidParameter");
        assert_eq!(body["details"], details);
    }

    let stored = app.store.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.avatar, None);
}

#[tokio::test]
async fn test_avatar_requires_multipart() {
    let app = spawn_app().await;
    let user = app.create_user(UserStatus::Active, &[]).await;
    let token = app.login(&user.email).await;

    let (status, body) = app
        .send(json_request(
            Method::PUT,
            "/api/v1/users/current/avatar",
            Some(&token),
            json!({ "avatar": "inline" }),
        ))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "MissingParameter");
    assert_eq!(body["details"], "avatar");
}
