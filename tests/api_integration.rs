use axum::http::{header, HeaderValue, StatusCode};
use axum_test::TestServer;
use notesaver::{create_app, db, AppState, Config};
use serde_json::{json, Value};
use tempfile::TempDir;

fn setup_test_server() -> (TestServer, TempDir) {
    setup_test_server_with(|_| {})
}

fn setup_test_server_with(customize: impl FnOnce(&mut Config)) -> (TestServer, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    let mut config = Config {
        db_path: db_path.to_str().unwrap().to_string(),
        bcrypt_cost: 4,
        ..Config::default()
    };
    customize(&mut config);

    let conn = db::establish_connection(&config.db_path).unwrap();
    let app = create_app(AppState::new(config, conn));

    let server = TestServer::new(app).unwrap();
    (server, temp_dir)
}

fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {token}")).unwrap()
}

async fn register(server: &TestServer, username: &str) -> String {
    let response = server
        .post("/api/auth/register")
        .json(&json!({ "username": username, "password": "password123" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: Value = response.json();
    body["token"].as_str().unwrap().to_string()
}

async fn create(server: &TestServer, token: &str, body: Value) -> Value {
    let response = server
        .post("/api/pastes")
        .add_header(header::AUTHORIZATION, bearer(token))
        .json(&body)
        .await;
    assert_eq!(response.status_code(), StatusCode::CREATED);
    let body: Value = response.json();
    body["paste"].clone()
}

#[tokio::test]
async fn test_health_check() {
    let (server, _temp) = setup_test_server();

    let response = server.get("/api/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["status"], "OK");
}

#[tokio::test]
async fn test_register_login_and_me() {
    let (server, _temp) = setup_test_server();
    let token = register(&server, "alice").await;

    let me = server
        .get("/api/auth/me")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    assert_eq!(me.status_code(), StatusCode::OK);
    let me: Value = me.json();
    assert_eq!(me["user"]["username"], "alice");
    assert!(me["user"].get("password_hash").is_none());

    let login = server
        .post("/api/auth/login")
        .json(&json!({ "username": "alice", "password": "password123" }))
        .await;
    assert_eq!(login.status_code(), StatusCode::OK);
    let login: Value = login.json();
    assert_eq!(login["success"], true);
    assert_eq!(login["user"]["id"], me["user"]["id"]);

    let duplicate = server
        .post("/api/auth/register")
        .json(&json!({ "username": "alice", "password": "password123" }))
        .await;
    assert_eq!(duplicate.status_code(), StatusCode::BAD_REQUEST);

    let wrong = server
        .post("/api/auth/login")
        .json(&json!({ "username": "alice", "password": "nope-nope" }))
        .await;
    assert_eq!(wrong.status_code(), StatusCode::UNAUTHORIZED);
    let wrong: Value = wrong.json();
    assert_eq!(wrong["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_paste_lifecycle() {
    let (server, _temp) = setup_test_server();
    let token = register(&server, "alice").await;

    let paste = create(
        &server,
        &token,
        json!({ "title": "Hello", "content": "World" }),
    )
    .await;
    assert_eq!(paste["isPublic"], false);
    let paste_id = paste["id"].as_str().unwrap();

    let list = server
        .get("/api/pastes")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    assert_eq!(list.status_code(), StatusCode::OK);
    let list: Value = list.json();
    assert_eq!(list["count"], 1);
    assert_eq!(list["pastes"][0]["id"], paste_id);

    let update = server
        .put(&format!("/api/pastes/{paste_id}"))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "title": "Hello 2", "content": "World 2", "isPublic": true }))
        .await;
    assert_eq!(update.status_code(), StatusCode::OK);
    let updated: Value = update.json();
    assert_eq!(updated["paste"]["title"], "Hello 2");
    assert_eq!(updated["paste"]["isPublic"], true);
    assert_ne!(updated["paste"]["updatedAt"], updated["paste"]["createdAt"]);

    let delete = server
        .delete(&format!("/api/pastes/{paste_id}"))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    assert_eq!(delete.status_code(), StatusCode::OK);
    let ack: Value = delete.json();
    assert_eq!(ack["message"], "Paste deleted successfully");

    let get_deleted = server
        .get(&format!("/api/pastes/{paste_id}"))
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await;
    assert_eq!(get_deleted.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_private_paste_visible_after_publishing() {
    let (server, _temp) = setup_test_server();
    let alice = register(&server, "alice").await;
    let bob = register(&server, "bob").await;

    let paste = create(
        &server,
        &alice,
        json!({ "title": "Hello", "content": "World" }),
    )
    .await;
    let path = format!("/api/pastes/{}", paste["id"].as_str().unwrap());

    let denied = server
        .get(&path)
        .add_header(header::AUTHORIZATION, bearer(&bob))
        .await;
    assert_eq!(denied.status_code(), StatusCode::UNAUTHORIZED);
    let denied: Value = denied.json();
    assert_eq!(denied["message"], "Not authorized to access this paste");

    let publish = server
        .put(&path)
        .add_header(header::AUTHORIZATION, bearer(&alice))
        .json(&json!({ "title": "Hello", "content": "World", "isPublic": true }))
        .await;
    assert_eq!(publish.status_code(), StatusCode::OK);

    let allowed = server
        .get(&path)
        .add_header(header::AUTHORIZATION, bearer(&bob))
        .await;
    assert_eq!(allowed.status_code(), StatusCode::OK);
    let body: Value = allowed.json();
    assert_eq!(body["paste"]["title"], "Hello");
    assert_eq!(body["paste"]["content"], "World");
    assert_eq!(body["paste"]["isPublic"], true);
}

#[tokio::test]
async fn test_non_owner_cannot_modify() {
    let (server, _temp) = setup_test_server();
    let alice = register(&server, "alice").await;
    let bob = register(&server, "bob").await;

    let paste = create(
        &server,
        &alice,
        json!({ "title": "mine", "content": "text", "isPublic": true }),
    )
    .await;
    let path = format!("/api/pastes/{}", paste["id"].as_str().unwrap());

    let update = server
        .put(&path)
        .add_header(header::AUTHORIZATION, bearer(&bob))
        .json(&json!({ "title": "stolen", "content": "text", "isPublic": false }))
        .await;
    assert_eq!(update.status_code(), StatusCode::UNAUTHORIZED);

    let delete = server
        .delete(&path)
        .add_header(header::AUTHORIZATION, bearer(&bob))
        .await;
    assert_eq!(delete.status_code(), StatusCode::UNAUTHORIZED);

    let unchanged: Value = server
        .get(&path)
        .add_header(header::AUTHORIZATION, bearer(&alice))
        .await
        .json();
    assert_eq!(unchanged["paste"], paste);
}

#[tokio::test]
async fn test_paste_routes_require_token() {
    let (server, _temp) = setup_test_server();
    let some_id = "00000000-0000-0000-0000-000000000000";

    let responses = [
        server.get("/api/pastes").await,
        server.post("/api/pastes").json(&json!({ "title": "t", "content": "c" })).await,
        server.get(&format!("/api/pastes/{some_id}")).await,
        server
            .put(&format!("/api/pastes/{some_id}"))
            .json(&json!({ "title": "t", "content": "c", "isPublic": true }))
            .await,
        server.delete(&format!("/api/pastes/{some_id}")).await,
        server.get("/api/pastes/public/all").await,
        server
            .get("/api/pastes")
            .add_header(header::AUTHORIZATION, bearer("not-a-real-token"))
            .await,
    ];

    for response in responses {
        assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
    }
}

#[tokio::test]
async fn test_validation_errors() {
    let (server, _temp) = setup_test_server();
    let token = register(&server, "alice").await;

    let empty = server
        .post("/api/pastes")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "title": "", "content": "" }))
        .await;
    assert_eq!(empty.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = empty.json();
    let fields: Vec<_> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(fields, ["title", "content"]);

    let malformed = server
        .post("/api/pastes")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .text("{not json")
        .await;
    assert_eq!(malformed.status_code(), StatusCode::BAD_REQUEST);

    let list: Value = server
        .get("/api/pastes")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .await
        .json();
    assert_eq!(list["count"], 0);
}

#[tokio::test]
async fn test_public_feed() {
    let (server, _temp) = setup_test_server();
    let alice = register(&server, "alice").await;
    let bob = register(&server, "bob").await;

    create(&server, &alice, json!({ "title": "shared", "content": "c", "isPublic": true })).await;
    create(&server, &alice, json!({ "title": "hidden", "content": "c" })).await;
    create(&server, &bob, json!({ "title": "bobs", "content": "c", "isPublic": true })).await;

    let response = server
        .get("/api/pastes/public/all")
        .add_header(header::AUTHORIZATION, bearer(&bob))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["count"], 2);
    assert_eq!(body["pastes"][0]["title"], "bobs");
    assert_eq!(body["pastes"][0]["owner"], json!({ "username": "bob" }));
    assert_eq!(body["pastes"][1]["owner"]["username"], "alice");
}

#[tokio::test]
async fn test_body_limit_follows_max_paste_size() {
    const MAX: usize = 3 * 1024 * 1024;
    let (server, _temp) = setup_test_server_with(|config| config.max_paste_size = MAX);
    let token = register(&server, "alice").await;

    // Larger than axum's 2 MB default, still within the configured maximum.
    let large = create(
        &server,
        &token,
        json!({ "title": "large", "content": "x".repeat(MAX - 1024) }),
    )
    .await;
    assert_eq!(large["content"].as_str().unwrap().len(), MAX - 1024);

    let oversized = server
        .post("/api/pastes")
        .add_header(header::AUTHORIZATION, bearer(&token))
        .json(&json!({ "title": "too big", "content": "x".repeat(MAX + 1) }))
        .await;
    assert_eq!(oversized.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = oversized.json();
    assert_eq!(body["errors"][0]["field"], "content");
}
