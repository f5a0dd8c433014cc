use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};

use warden_api::Config;
use warden_api::app::{AppState, build_state, router};
use warden_auth::{MatchingMode, Method, Permission, Role};

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    state: Arc<AppState>,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        Self::spawn_with(MatchingMode::Accumulated).await
    }

    async fn spawn_with(matching: MatchingMode) -> Self {
        let config = Config {
            jwt_secret: JWT_SECRET.to_string(),
            bcrypt_cost: 4,
            matching,
            ..Config::default()
        };

        // Same router as prod, in-memory stores, bound to an ephemeral port.
        let state = Arc::new(build_state(&config).await.expect("failed to build state"));
        let app = router(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            state,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Seed a role straight into the store, as an operator would.
    async fn seed_role(&self, name: &'static str, permissions: &[&str]) -> Role {
        let role = Role::new(
            name,
            permissions.iter().map(|p| Permission::from(p.to_string())).collect(),
        );
        self.state.roles.create(role).await.expect("failed to seed role")
    }

    async fn register(&self, body: Value) -> reqwest::Response {
        self.client
            .post(self.url("/auth/register"))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/auth/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .unwrap()
    }

    async fn token_for(&self, email: &str, password: &str) -> String {
        let res = self.login(email, password).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    /// Register an `admin` holding every permission and return its token.
    async fn admin_token(&self) -> String {
        let all: Vec<String> = ["users", "roles", "posts"]
            .iter()
            .flat_map(|m| {
                ["read", "write", "update", "delete"]
                    .iter()
                    .map(move |s| format!("{m}_{s}"))
            })
            .collect();
        let all: Vec<&str> = all.iter().map(String::as_str).collect();
        self.seed_role("admin", &all).await;

        let res = self
            .register(json!({
                "username": "admin",
                "email": "admin@x.com",
                "password": "admin-pw",
                "roles": ["admin"],
            }))
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        self.token_for("admin@x.com", "admin-pw").await
    }

    async fn get(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(secret: &str, sub: &str, issued_at: chrono::DateTime<Utc>, ttl: ChronoDuration) -> String {
    let claims = json!({
        "sub": sub,
        "username": "someone",
        "email": "someone@x.com",
        "iat": issued_at.timestamp(),
        "exp": (issued_at + ttl).timestamp(),
    });

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn().await;
    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn().await;

    for path in ["/users", "/roles", "/posts"] {
        let res = srv.client.get(srv.url(path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{path}");
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], "unauthenticated");
    }

    let res = srv
        .client
        .get(srv.url("/posts"))
        .header("Authorization", "Basic abc")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_login_then_grant_role_permission() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;

    let res = srv
        .register(json!({ "username": "alice", "email": "a@x.com", "password": "secret123" }))
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await.unwrap();
    assert!(created.get("password_digest").is_none());
    assert!(created.get("password").is_none());

    let roles = created["roles"].as_array().unwrap();
    assert_eq!(roles.len(), 1);
    let user_role_id = roles[0].as_str().unwrap().to_string();

    let res = srv.login("a@x.com", "secret123").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["user"]["email"], "a@x.com");
    assert!(body["user"].get("password_digest").is_none());
    let token = body["token"].as_str().unwrap().to_string();

    // `user` is seeded with no permissions.
    let res = srv.get("/posts", &token).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "forbidden");

    let res = srv
        .client
        .put(srv.url(&format!("/roles/{user_role_id}")))
        .bearer_auth(&admin)
        .json(&json!({ "permissions": ["posts_read"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv.get("/posts", &token).await;
    assert_eq!(res.status(), StatusCode::OK);
    let posts: Value = res.json().await.unwrap();
    assert!(posts.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn accumulated_matching_lets_a_registered_permission_cover_another_module() {
    let srv = TestServer::spawn_with(MatchingMode::Accumulated).await;
    srv.seed_role("reader", &["posts_read"]).await;

    let res = srv
        .register(json!({
            "username": "rita",
            "email": "r@x.com",
            "password": "pw",
            "roles": ["reader"],
        }))
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let token = srv.token_for("r@x.com", "pw").await;

    // Nothing registered under GET yet besides what this request adds.
    assert_eq!(srv.get("/users", &token).await.status(), StatusCode::FORBIDDEN);

    // `posts_read` is now registered under GET and held by the caller.
    assert_eq!(srv.get("/posts", &token).await.status(), StatusCode::OK);
    assert_eq!(srv.get("/users", &token).await.status(), StatusCode::OK);

    // Other methods keep their own entries.
    let res = srv
        .client
        .delete(srv.url("/posts/0190a0a0-0000-7000-8000-000000000000"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn strict_matching_checks_only_the_computed_permission() {
    let srv = TestServer::spawn_with(MatchingMode::Strict).await;
    srv.seed_role("reader", &["posts_read"]).await;

    srv.register(json!({
        "username": "rita",
        "email": "r@x.com",
        "password": "pw",
        "roles": ["reader"],
    }))
    .await;
    let token = srv.token_for("r@x.com", "pw").await;

    assert_eq!(srv.get("/posts", &token).await.status(), StatusCode::OK);
    assert_eq!(srv.get("/users", &token).await.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unrouted_paths_are_not_found_and_never_reach_the_requirement_table() {
    let srv = TestServer::spawn_with(MatchingMode::Accumulated).await;
    srv.seed_role("reporter", &["reports_read"]).await;

    srv.register(json!({
        "username": "rex",
        "email": "rex@x.com",
        "password": "pw",
        "roles": ["reporter"],
    }))
    .await;
    let token = srv.token_for("rex@x.com", "pw").await;

    assert_eq!(srv.get("/users", &token).await.status(), StatusCode::FORBIDDEN);

    // No `/reports` route: `reports_read` must not become a GET requirement.
    let res = srv.get("/reports", &token).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "not_found");

    for junk in ["/nope", "/junk0", "/junk1/deeper"] {
        assert_eq!(srv.get(junk, &token).await.status(), StatusCode::NOT_FOUND, "{junk}");
    }

    assert_eq!(srv.get("/users", &token).await.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        srv.state.permissions.table().registered(Method::Get),
        vec![Permission::new("users_read")]
    );

    // Authentication still comes first.
    let res = srv.client.get(srv.url("/nope")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn routed_item_paths_register_their_module() {
    let srv = TestServer::spawn_with(MatchingMode::Strict).await;
    let admin = srv.admin_token().await;

    let missing = "0190a0a0-0000-7000-8000-000000000000";
    let res = srv.get(&format!("/posts/{missing}"), &admin).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    assert_eq!(
        srv.state.permissions.table().registered(Method::Get),
        vec![Permission::new("posts_read")]
    );
}

#[tokio::test]
async fn unknown_user_record_is_not_found() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;
    let missing = "0190a0a0-0000-7000-8000-000000000000";

    let res = srv.get(&format!("/users/{missing}"), &admin).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "not_found");

    let res = srv
        .client
        .delete(srv.url(&format!("/users/{missing}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = srv
        .client
        .put(srv.url(&format!("/users/{missing}")))
        .bearer_auth(&admin)
        .json(&json!({ "username": "nobody" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn login_failures_do_not_reveal_which_part_was_wrong() {
    let srv = TestServer::spawn().await;
    srv.register(json!({ "username": "bob", "email": "b@x.com", "password": "right" }))
        .await;

    let unknown = srv.login("nobody@x.com", "right").await;
    let wrong = srv.login("b@x.com", "wrong").await;

    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let unknown: Value = unknown.json().await.unwrap();
    let wrong: Value = wrong.json().await.unwrap();
    assert_eq!(unknown, wrong);
}

#[tokio::test]
async fn registration_conflicts_and_unknown_roles() {
    let srv = TestServer::spawn().await;

    let first = srv
        .register(json!({ "username": "carol", "email": "c@x.com", "password": "pw" }))
        .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let dup = srv
        .register(json!({ "username": "carol2", "email": "c@x.com", "password": "pw" }))
        .await;
    assert_eq!(dup.status(), StatusCode::CONFLICT);
    let body: Value = dup.json().await.unwrap();
    assert_eq!(body["error"], "email_in_use");

    let ghost = srv
        .register(json!({
            "username": "dan",
            "email": "d@x.com",
            "password": "pw",
            "roles": ["ghost"],
        }))
        .await;
    assert_eq!(ghost.status(), StatusCode::NOT_FOUND);
    let body: Value = ghost.json().await.unwrap();
    assert_eq!(body["error"], "no_matching_roles");
}

#[tokio::test]
async fn registration_keeps_only_existing_roles() {
    let srv = TestServer::spawn().await;
    let admin = srv.seed_role("admin", &[]).await;

    let res = srv
        .register(json!({
            "username": "erin",
            "email": "e@x.com",
            "password": "pw",
            "roles": ["admin", "ghost"],
        }))
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await.unwrap();
    assert_eq!(created["roles"], json!([admin.id.to_string()]));
}

#[tokio::test]
async fn registration_cannot_self_grant_direct_permissions() {
    let srv = TestServer::spawn().await;

    let res = srv
        .register(json!({
            "username": "mallory",
            "email": "m@x.com",
            "password": "pw",
            "permissions": ["users_delete"],
        }))
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await.unwrap();
    assert_eq!(created["permissions"], json!([]));
}

#[tokio::test]
async fn bad_tokens_are_rejected() {
    let srv = TestServer::spawn().await;
    srv.register(json!({ "username": "fay", "email": "f@x.com", "password": "pw" }))
        .await;
    let res = srv.login("f@x.com", "pw").await;
    let body: Value = res.json().await.unwrap();
    let user_id = body["user"]["id"].as_str().unwrap().to_string();

    let expired = mint_jwt(
        JWT_SECRET,
        &user_id,
        Utc::now() - ChronoDuration::hours(2),
        ChronoDuration::hours(1),
    );
    assert_eq!(srv.get("/posts", &expired).await.status(), StatusCode::UNAUTHORIZED);

    let foreign = mint_jwt("other-secret", &user_id, Utc::now(), ChronoDuration::hours(1));
    assert_eq!(srv.get("/posts", &foreign).await.status(), StatusCode::UNAUTHORIZED);

    let valid = mint_jwt(JWT_SECRET, &user_id, Utc::now(), ChronoDuration::hours(1));
    // Authenticated, but `user` grants nothing.
    assert_eq!(srv.get("/posts", &valid).await.status(), StatusCode::FORBIDDEN);

    let (signed, signature) = valid.rsplit_once('.').unwrap();
    let swapped = if signature.starts_with('A') { 'B' } else { 'A' };
    let tampered = format!("{signed}.{swapped}{}", &signature[1..]);
    assert_eq!(srv.get("/posts", &tampered).await.status(), StatusCode::UNAUTHORIZED);

    assert_eq!(srv.get("/posts", "not-a-jwt").await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_for_deleted_identity_is_a_bad_request() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;

    let res = srv
        .register(json!({ "username": "gus", "email": "g@x.com", "password": "pw" }))
        .await;
    let created: Value = res.json().await.unwrap();
    let id = created["id"].as_str().unwrap().to_string();
    let token = srv.token_for("g@x.com", "pw").await;

    let res = srv
        .client
        .delete(srv.url(&format!("/users/{id}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = srv.get("/posts", &token).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(!body.to_string().contains(&id));
}

#[tokio::test]
async fn unsupported_methods_are_forbidden() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;

    let res = srv
        .client
        .patch(srv.url("/posts"))
        .bearer_auth(&admin)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn post_lifecycle_create_update_delete() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;

    let res = srv
        .client
        .post(srv.url("/posts"))
        .bearer_auth(&admin)
        .json(&json!({ "title": "Hello", "body": "first" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = res.json().await.unwrap();
    let id = created["id"].as_str().unwrap().to_string();

    let me: Value = srv.login("admin@x.com", "admin-pw").await.json().await.unwrap();
    assert_eq!(created["author_id"], me["user"]["id"]);

    let res = srv
        .client
        .put(srv.url(&format!("/posts/{id}")))
        .bearer_auth(&admin)
        .json(&json!({ "body": "edited" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["title"], "Hello");
    assert_eq!(updated["body"], "edited");

    let res = srv
        .client
        .post(srv.url("/posts"))
        .bearer_auth(&admin)
        .json(&json!({ "title": "  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = srv
        .client
        .delete(srv.url(&format!("/posts/{id}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    assert_eq!(
        srv.get(&format!("/posts/{id}"), &admin).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn role_admin_and_user_updates() {
    let srv = TestServer::spawn().await;
    let admin = srv.admin_token().await;

    let res = srv
        .client
        .post(srv.url("/roles"))
        .bearer_auth(&admin)
        .json(&json!({ "name": "editor", "permissions": ["posts_update"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let editor: Value = res.json().await.unwrap();

    let res = srv
        .client
        .post(srv.url("/roles"))
        .bearer_auth(&admin)
        .json(&json!({ "name": "editor" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let roles: Value = srv.get("/roles", &admin).await.json().await.unwrap();
    let names: Vec<&str> = roles
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|r| r["name"].as_str())
        .collect();
    assert!(names.contains(&"editor"));
    assert!(names.contains(&"user"));

    let res = srv
        .register(json!({ "username": "hal", "email": "h@x.com", "password": "pw" }))
        .await;
    let hal: Value = res.json().await.unwrap();
    let hal_id = hal["id"].as_str().unwrap().to_string();

    let res = srv
        .client
        .put(srv.url(&format!("/users/{hal_id}")))
        .bearer_auth(&admin)
        .json(&json!({ "roles": [editor["id"]], "password": "new-pw" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: Value = res.json().await.unwrap();
    assert_eq!(updated["roles"], json!([editor["id"]]));

    assert_eq!(srv.login("h@x.com", "pw").await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(srv.login("h@x.com", "new-pw").await.status(), StatusCode::OK);

    let res = srv.get("/users/not-a-uuid", &admin).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
