//! HTTP-level tests: JSON → request → handler → store → response → JSON.

use std::sync::Arc;

use axum::http::StatusCode;
use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use serde_json::{Value, json};
use tempfile::TempDir;

use endpage_api::media::MediaStore;
use endpage_api::{AppStateInner, router};
use endpage_store::{PageStore, UserStore};

async fn make_server(dir: &TempDir) -> TestServer {
    let users = UserStore::open(dir.path().join("users.csv")).await.unwrap();
    let pages = PageStore::open(dir.path().join("pages.csv")).await.unwrap();
    let media = MediaStore::new(dir.path().join("uploads")).await.unwrap();

    let state = Arc::new(AppStateInner {
        users,
        pages,
        media,
        jwt_secret: "test-secret".to_string(),
        max_upload_bytes: 1024 * 1024,
    });
    TestServer::try_new(router(state)).unwrap()
}

async fn register(server: &TestServer, username: &str, password: &str) -> Value {
    let response = server
        .post("/api/register")
        .json(&json!({ "username": username, "password": password }))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()
}

async fn login(server: &TestServer, username: &str, password: &str) -> String {
    let response = server
        .post("/api/login")
        .json(&json!({ "username": username, "password": password }))
        .await;
    response.assert_status(StatusCode::OK);
    response.json::<Value>()["token"].as_str().unwrap().to_string()
}

fn page_body(message: &str) -> Value {
    json!({
        "creatorName": "alice",
        "reasonOfLeaving": "burnout",
        "themeName": "sunset",
        "creatorMessage": message,
    })
}

#[tokio::test]
async fn test_hello() {
    let dir = TempDir::new().unwrap();
    let server = make_server(&dir).await;

    let response = server.get("/api").await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.text(), "Hello World");
}

#[tokio::test]
async fn test_register_validates_and_rejects_duplicates() {
    let dir = TempDir::new().unwrap();
    let server = make_server(&dir).await;

    let response = server
        .post("/api/register")
        .json(&json!({ "username": "", "password": "pw1" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let created = register(&server, "alice", "pw1").await;
    assert_eq!(created["username"], "alice");
    assert!(created["id"].as_str().is_some());

    // second attempt conflicts, first account unaffected
    let response = server
        .post("/api/register")
        .json(&json!({ "username": "alice", "password": "pw2" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    login(&server, "alice", "pw1").await;
}

#[tokio::test]
async fn test_login_does_not_leak_account_existence() {
    let dir = TempDir::new().unwrap();
    let server = make_server(&dir).await;
    register(&server, "alice", "pw1").await;

    let wrong_password = server
        .post("/api/login")
        .json(&json!({ "username": "alice", "password": "nope" }))
        .await;
    let unknown_user = server
        .post("/api/login")
        .json(&json!({ "username": "nobody", "password": "nope" }))
        .await;

    wrong_password.assert_status(StatusCode::UNAUTHORIZED);
    unknown_user.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(
        wrong_password.json::<Value>(),
        unknown_user.json::<Value>()
    );
}

#[tokio::test]
async fn test_page_lifecycle() {
    let dir = TempDir::new().unwrap();
    let server = make_server(&dir).await;

    let alice_id = register(&server, "alice", "pw1").await["id"]
        .as_str()
        .unwrap()
        .to_string();
    let alice = login(&server, "alice", "pw1").await;

    // creation requires a token
    let response = server.post("/api/pages").json(&page_body("bye")).await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    // and the four mandatory fields
    let response = server
        .post("/api/pages")
        .authorization_bearer(&alice)
        .json(&json!({ "creatorName": "alice", "reasonOfLeaving": "burnout", "themeName": "sunset", "creatorMessage": "" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .post("/api/pages")
        .authorization_bearer(&alice)
        .json(&json!({
            "creatorName": "alice",
            "reasonOfLeaving": "burnout",
            "themeName": "sunset",
            "creatorMessage": "so long",
            "customTheme": { "bgColor": "#111", "textColor": "#eee", "accentColor": "#f50" },
            "images": ["/uploads/1-a.png"],
        }))
        .await;
    response.assert_status(StatusCode::CREATED);
    let created = response.json::<Value>();
    let page_id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["likes"], 0);
    assert_eq!(created["images"], json!(["/uploads/1-a.png"]));
    assert_eq!(created["customTheme"]["bgColor"], "#111");
    // creator id comes from the token, never from the body
    assert_eq!(created["creatorId"].as_str().unwrap(), alice_id);

    let fetched = server.get(&format!("/api/pages/{page_id}")).await;
    fetched.assert_status(StatusCode::OK);
    let fetched = fetched.json::<Value>();
    assert_eq!(fetched["creatorMessage"], "so long");
    assert_eq!(fetched["creatorId"], created["creatorId"]);

    // update and delete are creator-only
    register(&server, "bob", "pw2").await;
    let bob = login(&server, "bob", "pw2").await;

    let response = server
        .put(&format!("/api/pages/{page_id}"))
        .authorization_bearer(&bob)
        .json(&json!({ "creatorMessage": "hijacked" }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = server
        .delete(&format!("/api/pages/{page_id}"))
        .authorization_bearer(&bob)
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    // the page survived both attempts
    server
        .get(&format!("/api/pages/{page_id}"))
        .await
        .assert_status(StatusCode::OK);

    let response = server
        .put(&format!("/api/pages/{page_id}"))
        .authorization_bearer(&alice)
        .json(&json!({ "creatorMessage": "final words" }))
        .await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.json::<Value>()["creatorMessage"], "final words");

    let response = server
        .delete(&format!("/api/pages/{page_id}"))
        .authorization_bearer(&alice)
        .await;
    response.assert_status(StatusCode::NO_CONTENT);

    server
        .get(&format!("/api/pages/{page_id}"))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_like_unlike_flow() {
    let dir = TempDir::new().unwrap();
    let server = make_server(&dir).await;

    register(&server, "alice", "pw1").await;
    let alice = login(&server, "alice", "pw1").await;
    register(&server, "bob", "pw2").await;
    let bob = login(&server, "bob", "pw2").await;

    let response = server
        .post("/api/pages")
        .authorization_bearer(&alice)
        .json(&page_body("like me"))
        .await;
    response.assert_status(StatusCode::CREATED);
    let page_id = response.json::<Value>()["id"].as_str().unwrap().to_string();

    let response = server
        .post(&format!("/api/pages/{page_id}/like"))
        .authorization_bearer(&bob)
        .await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.json::<Value>()["likes"], 1);

    // a second like from the same user is a conflict, not a duplicate
    let response = server
        .post(&format!("/api/pages/{page_id}/like"))
        .authorization_bearer(&bob)
        .await;
    response.assert_status(StatusCode::CONFLICT);

    let response = server.get(&format!("/api/pages/{page_id}")).await;
    assert_eq!(response.json::<Value>()["likes"], 1);

    let response = server
        .post(&format!("/api/pages/{page_id}/unlike"))
        .authorization_bearer(&bob)
        .await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.json::<Value>()["likes"], 0);

    let response = server
        .post(&format!("/api/pages/{page_id}/unlike"))
        .authorization_bearer(&bob)
        .await;
    response.assert_status(StatusCode::CONFLICT);

    // unknown page is a plain 404
    let response = server
        .post(&format!("/api/pages/{}/like", uuid::Uuid::new_v4()))
        .authorization_bearer(&bob)
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_top_liked() {
    let dir = TempDir::new().unwrap();
    let server = make_server(&dir).await;

    register(&server, "alice", "pw1").await;
    let alice = login(&server, "alice", "pw1").await;
    register(&server, "bob", "pw2").await;
    let bob = login(&server, "bob", "pw2").await;

    let mut page_ids = Vec::new();
    for message in ["zero", "one", "two"] {
        let response = server
            .post("/api/pages")
            .authorization_bearer(&alice)
            .json(&page_body(message))
            .await;
        response.assert_status(StatusCode::CREATED);
        page_ids.push(response.json::<Value>()["id"].as_str().unwrap().to_string());
    }

    // page_ids[1] gets one like, page_ids[2] gets two
    for (page, tokens) in [
        (&page_ids[1], vec![&bob]),
        (&page_ids[2], vec![&alice, &bob]),
    ] {
        for token in tokens {
            server
                .post(&format!("/api/pages/{page}/like"))
                .authorization_bearer(token.as_str())
                .await
                .assert_status(StatusCode::OK);
        }
    }

    let response = server.get("/api/pages/top-liked/2").await;
    response.assert_status(StatusCode::OK);
    let top = response.json::<Value>();
    let top = top.as_array().unwrap();
    assert_eq!(top.len(), 2);
    assert_eq!(top[0]["id"].as_str().unwrap(), page_ids[2]);
    assert_eq!(top[1]["id"].as_str().unwrap(), page_ids[1]);

    server
        .get("/api/pages/top-liked/0")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
    server
        .get("/api/pages/top-liked/abc")
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_user_management() {
    let dir = TempDir::new().unwrap();
    let server = make_server(&dir).await;

    let alice = register(&server, "alice", "pw1").await;
    let alice_id = alice["id"].as_str().unwrap().to_string();
    let alice_token = login(&server, "alice", "pw1").await;
    let bob = register(&server, "bob", "pw2").await;
    let bob_id = bob["id"].as_str().unwrap().to_string();
    let bob_token = login(&server, "bob", "pw2").await;

    // the whole surface requires a token
    server.get("/api/users").await.assert_status(StatusCode::UNAUTHORIZED);

    let response = server
        .get("/api/users")
        .authorization_bearer(&alice_token)
        .await;
    response.assert_status(StatusCode::OK);
    let users = response.json::<Value>();
    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 2);
    for user in users {
        assert!(user.get("password").is_none());
    }

    let response = server
        .get(&format!("/api/users/{alice_id}"))
        .authorization_bearer(&bob_token)
        .await;
    response.assert_status(StatusCode::OK);
    assert_eq!(response.json::<Value>()["username"], "alice");

    // accounts are self-service only
    let response = server
        .put(&format!("/api/users/{alice_id}"))
        .authorization_bearer(&bob_token)
        .json(&json!({ "password": "owned" }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = server
        .delete(&format!("/api/users/{alice_id}"))
        .authorization_bearer(&bob_token)
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    // renaming onto a taken username conflicts
    let response = server
        .put(&format!("/api/users/{alice_id}"))
        .authorization_bearer(&alice_token)
        .json(&json!({ "username": "bob" }))
        .await;
    response.assert_status(StatusCode::CONFLICT);

    // password change takes effect on the next login
    let response = server
        .put(&format!("/api/users/{alice_id}"))
        .authorization_bearer(&alice_token)
        .json(&json!({ "password": "pw-new" }))
        .await;
    response.assert_status(StatusCode::OK);

    server
        .post("/api/login")
        .json(&json!({ "username": "alice", "password": "pw1" }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    login(&server, "alice", "pw-new").await;

    let response = server
        .delete(&format!("/api/users/{bob_id}"))
        .authorization_bearer(&bob_token)
        .await;
    response.assert_status(StatusCode::NO_CONTENT);

    let response = server
        .get(&format!("/api/users/{bob_id}"))
        .authorization_bearer(&alice_token)
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_gate() {
    let dir = TempDir::new().unwrap();
    let server = make_server(&dir).await;

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(b"fake png bytes".to_vec()).file_name("holiday pic.png"),
    );
    let response = server.post("/api/upload").multipart(form).await;
    response.assert_status(StatusCode::OK);
    let url = response.json::<Value>()["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/uploads/"));
    assert!(url.ends_with("-holiday-pic.png"));

    // stored under the upload dir, reachable via the returned path
    let on_disk = dir
        .path()
        .join("uploads")
        .join(url.strip_prefix("/uploads/").unwrap());
    assert_eq!(std::fs::read(on_disk).unwrap(), b"fake png bytes");

    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(b"MZ".to_vec()).file_name("payload.exe"),
    );
    server
        .post("/api/upload")
        .multipart(form)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    // over the configured 1 MiB cap
    let form = MultipartForm::new().add_part(
        "file",
        Part::bytes(vec![0u8; 1_500_000]).file_name("huge.png"),
    );
    server
        .post("/api/upload")
        .multipart(form)
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let form = MultipartForm::new().add_part("not_a_file", Part::text("hello"));
    server
        .post("/api/upload")
        .multipart(form)
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_expired_or_garbage_tokens_rejected() {
    let dir = TempDir::new().unwrap();
    let server = make_server(&dir).await;

    let response = server
        .post("/api/pages")
        .authorization_bearer("garbage-token")
        .json(&page_body("bye"))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);

    let response = server
        .post("/api/pages")
        .add_header(
            axum::http::header::AUTHORIZATION,
            axum::http::HeaderValue::from_static("NotBearer xyz"),
        )
        .json(&page_body("bye"))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}
