use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::util::ServiceExt;
use tower_http::cors::CorsLayer;

use skillswap::{
    AppState, app,
    identity::MemoryIdentity,
    store::{DocumentStore, MemoryStore},
};

/// One browser: remembers the session cookie between requests.
struct Visitor {
    app: Router,
    cookie: Option<String>,
}

impl Visitor {
    fn new(app: &Router) -> Self {
        Self { app: app.clone(), cookie: None }
    }

    async fn send(&mut self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(cookie) = &self.cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_owned());
        }

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn get(&mut self, uri: &str) -> (StatusCode, Value) {
        self.send("GET", uri, None).await
    }

    async fn post(&mut self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, Some(body)).await
    }

    async fn register(&mut self, name: &str, email: &str) -> String {
        let (status, me) = self
            .post("/auth/register", json!({"name": name, "email": email, "password": "secret1"}))
            .await;
        assert_eq!(status, StatusCode::OK, "{me}");
        me["uid"].as_str().unwrap().to_owned()
    }
}

fn test_app() -> (Router, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let state = AppState {
        store: store.clone() as Arc<dyn DocumentStore>,
        identity: Arc::new(MemoryIdentity::new()),
    };
    (app(state, time::Duration::minutes(5), CorsLayer::permissive()), store)
}

#[tokio::test]
async fn signed_out_visitors_get_401() {
    let (app, _) = test_app();
    let mut visitor = Visitor::new(&app);

    let (status, body) = visitor.get("/posts").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"].is_string());

    let (status, _) = visitor.post("/posts", json!({"content": "hi"})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_post_like_and_read_the_feed() {
    let (app, _) = test_app();
    let mut ann = Visitor::new(&app);
    let uid = ann.register("Ann", "ann@example.com").await;

    let (status, me) = ann.get("/auth/me").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me, json!({"uid": uid, "email": "ann@example.com", "displayName": "Ann"}));

    let (status, created) = ann.post("/posts", json!({"content": "  hello swap  "})).await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_owned();

    let (_, like) = ann.post(&format!("/posts/{id}/like"), json!({})).await;
    assert_eq!(like, json!({"liked": true}));

    let (status, feed) = ann.get("/posts").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(feed[0]["id"], json!(id));
    assert_eq!(feed[0]["content"], json!("hello swap"));
    assert_eq!(feed[0]["likeCount"], json!(1));
    assert_eq!(feed[0]["liked"], json!(true));
    assert_eq!(feed[0]["canDelete"], json!(true));

    let (_, like) = ann.post(&format!("/posts/{id}/like"), json!({})).await;
    assert_eq!(like, json!({"liked": false}));
}

#[tokio::test]
async fn blank_post_is_a_400() {
    let (app, _) = test_app();
    let mut ann = Visitor::new(&app);
    ann.register("Ann", "ann@example.com").await;

    let (status, body) = ann.post("/posts", json!({"content": "   "})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "Post cannot be empty"}));
}

#[tokio::test]
async fn other_peoples_posts_cannot_be_deleted() {
    let (app, _) = test_app();
    let mut ann = Visitor::new(&app);
    let mut bob = Visitor::new(&app);
    ann.register("Ann", "ann@example.com").await;
    bob.register("Bob", "bob@example.com").await;

    let (_, created) = ann.post("/posts", json!({"content": "mine"})).await;
    let id = created["id"].as_str().unwrap().to_owned();

    let (status, _) = bob.send("DELETE", &format!("/posts/{id}"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ann.send("DELETE", &format!("/posts/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, feed) = bob.get("/posts").await;
    assert_eq!(feed, json!([]));
}

#[tokio::test]
async fn unreachable_store_is_a_503_without_details() {
    let (app, store) = test_app();
    let mut ann = Visitor::new(&app);
    ann.register("Ann", "ann@example.com").await;

    store.set_offline(true);
    let (status, body) = ann.get("/posts").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert!(!body["error"].as_str().unwrap().contains("memory store"));
}

#[tokio::test]
async fn learners_find_mentors() {
    let (app, _) = test_app();
    let mut ann = Visitor::new(&app);
    let ann_uid = ann.register("Ann", "ann@example.com").await;
    let (status, _) = ann.post("/profile/skills", json!({"name": "Rust", "level": 4})).await;
    assert_eq!(status, StatusCode::CREATED);
    ann.post("/profile/bio", json!({"bio": "Systems programmer"})).await;

    let mut bob = Visitor::new(&app);
    bob.register("Bob", "bob@example.com").await;

    let (status, found) = bob.get("/match?skill=%20rust&level=3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found[0]["uid"], json!(ann_uid));
    assert_eq!(found[0]["name"], json!("Ann"));
    assert_eq!(found[0]["score"], json!(76));
    assert_eq!(found[0]["offered"], json!({"name": "Rust", "level": 4}));

    let (status, _) = bob.get("/match?skill=rust&level=9").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unreadable_match_query_is_a_json_400() {
    let (app, _) = test_app();
    let mut bob = Visitor::new(&app);
    bob.register("Bob", "bob@example.com").await;

    let (status, body) = bob.get("/match?skill=rust&level=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn booking_shows_up_on_both_boards() {
    let (app, _) = test_app();
    let mut ann = Visitor::new(&app);
    let ann_uid = ann.register("Ann", "ann@example.com").await;
    let mut bob = Visitor::new(&app);
    bob.register("Bob", "bob@example.com").await;

    let (status, _) = bob
        .post(
            "/sessions",
            json!({"title": "Rust ownership", "startTime": 1, "durationMinutes": 45, "host": ann_uid, "hostName": "Ann"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, ann_board) = ann.get("/sessions").await;
    assert_eq!(ann_board["mine"][0]["title"], json!("Rust ownership"));
    let (_, bob_board) = bob.get("/sessions").await;
    assert_eq!(bob_board["mine"], json!([]));
    assert_eq!(bob_board["upcoming"][0]["hostName"], json!("Ann"));
}

#[tokio::test]
async fn theme_toggles_and_resets_on_logout() {
    let (app, _) = test_app();
    let mut ann = Visitor::new(&app);
    ann.register("Ann", "ann@example.com").await;

    assert_eq!(ann.get("/theme").await.1, json!({"theme": "light"}));
    assert_eq!(ann.post("/theme/toggle", json!({})).await.1, json!({"theme": "dark"}));
    assert_eq!(ann.get("/theme").await.1, json!({"theme": "dark"}));

    let (status, _) = ann.post("/auth/logout", json!({})).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(ann.get("/auth/me").await.0, StatusCode::UNAUTHORIZED);
    assert_eq!(ann.get("/theme").await.1, json!({"theme": "light"}));
}

#[tokio::test]
async fn feedback_round_trip() {
    let (app, _) = test_app();
    let mut ann = Visitor::new(&app);
    let uid = ann.register("Ann", "ann@example.com").await;

    let (status, _) = ann.post("/feedback", json!({"comment": "Loved it", "rating": 7})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = ann.post("/feedback", json!({"comment": "Loved it", "rating": 5})).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, listed) = ann.get("/feedback").await;
    assert_eq!(listed[0]["user"], json!(uid));
    assert_eq!(listed[0]["rating"], json!(5));
}
