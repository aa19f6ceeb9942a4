//! Common test utilities and helpers.
//!
//! Every test app gets its own in-memory database and a wiremock server
//! standing in for the OpenAI chat and embeddings endpoints.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use jsonwebtoken::{encode, EncodingKey, Header};
use larder::config::Config;
use larder::db::{self, CreateRecipe, User};
use larder::middleware::Identity;
use larder::models::{Recipe, RecipeDraft};
use larder::AppState;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const JWT_SECRET: &str = "integration-secret";
pub const ISSUER: &str = "https://auth.larder.test";
pub const DIMENSION: usize = 4;

/// A fully wired application backed by mocks.
pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    pub server: MockServer,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let server = MockServer::start().await;
        let uri = server.uri();

        let config = Config::from_lookup(|key| {
            let value = match key {
                "DATABASE_PATH" => ":memory:",
                "AUTH_JWT_SECRET" => JWT_SECRET,
                "AUTH_ISSUER" => ISSUER,
                "OPENAI_API_KEY" => "test-key",
                "OPENAI_BASE_URL" => uri.as_str(),
                "EMBEDDING_DIMENSION" => "4",
                _ => return None,
            };
            Some(value.to_string())
        });

        let state = AppState::new(&config).await.expect("Failed to build state");
        let router = larder::app(state.clone());

        Self {
            state,
            router,
            server,
        }
    }

    /// Send a request through the full router.
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Router failed")
    }

    /// Store a user for `sub` and return it.
    pub async fn user(&self, sub: &str) -> User {
        self.state
            .users
            .store_user(Some(&identity(sub)))
            .await
            .expect("Failed to store user")
    }

    /// Insert a recipe directly, bypassing extraction.
    pub async fn insert_recipe(&self, owner: &User, title: &str, embedding: [f32; 4]) -> Recipe {
        db::create_recipe(
            &self.state.db,
            CreateRecipe {
                id: uuid::Uuid::new_v4().to_string(),
                slug: format!("{}-test01", title.to_lowercase().replace(' ', "-")),
                source: format!("https://recipes.test/{}", title.to_lowercase().replace(' ', "-")),
                user_id: owner.id.clone(),
                draft: draft(title),
                embedding: embedding.to_vec(),
            },
        )
        .await
        .expect("Failed to insert recipe")
    }
}

/// The identity a token minted by [`token_for`] resolves to.
pub fn identity(sub: &str) -> Identity {
    Identity {
        token_identifier: format!("{}|{}", ISSUER, sub),
        name: Some(format!("Cook {}", sub)),
        email: None,
    }
}

/// Mint a bearer token for `sub`, valid for an hour.
pub fn token_for(sub: &str) -> String {
    sign(json!({
        "sub": sub,
        "iss": ISSUER,
        "name": format!("Cook {}", sub),
        "exp": chrono::Utc::now().timestamp() + 3600,
    }))
}

/// Mint an already expired bearer token for `sub`.
pub fn expired_token_for(sub: &str) -> String {
    sign(json!({
        "sub": sub,
        "iss": ISSUER,
        "exp": chrono::Utc::now().timestamp() - 3600,
    }))
}

fn sign(claims: Value) -> String {
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("Failed to sign token")
}

/// A complete recipe draft titled `title`.
pub fn draft(title: &str) -> RecipeDraft {
    RecipeDraft {
        title: title.to_string(),
        description: format!("A lovely {}", title.to_lowercase()),
        cuisine: "Home".to_string(),
        cook_time: "20 minutes".to_string(),
        ingredients: vec!["flour".to_string(), "water".to_string()],
        method: vec!["Mix".to_string(), "Cook".to_string()],
        nutritional_info: "300 kcal".to_string(),
        prep_time: "10 minutes".to_string(),
        tags: vec!["easy".to_string()],
    }
}

/// Extraction reply JSON for a recipe titled `title`.
pub fn extraction_json(title: &str) -> String {
    serde_json::to_string(&draft(title)).expect("Failed to encode draft")
}

/// OpenAI chat completion body with `content` as the reply.
pub fn chat_completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

/// Answer chat requests whose body contains `fragment` with `reply`.
pub async fn mock_chat(server: &MockServer, fragment: &str, reply: &str, times: u64) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains(fragment))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion(reply)))
        .expect(times)
        .mount(server)
        .await;
}

/// Answer embedding requests whose body contains `fragment` with `vector`.
pub async fn mock_embedding(server: &MockServer, fragment: &str, vector: &[f32]) {
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(body_string_contains(fragment))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "object": "list",
            "data": [{ "object": "embedding", "index": 0, "embedding": vector }]
        })))
        .mount(server)
        .await;
}

/// Fail the test if any embedding request is made.
pub async fn forbid_embeddings(server: &MockServer) {
    Mock::given(path("/embeddings"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(server)
        .await;
}

/// Fail the test if any chat request is made.
pub async fn forbid_chat(server: &MockServer) {
    Mock::given(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(server)
        .await;
}

/// Extract JSON body from response
pub async fn extract_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

fn builder(http_method: &str, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let builder = Request::builder().method(http_method).uri(uri);
    match token {
        Some(token) => builder.header("Authorization", format!("Bearer {}", token)),
        None => builder,
    }
}

/// Create a GET request
pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    builder("GET", uri, token).body(Body::empty()).unwrap()
}

/// Create a POST request with JSON body
pub fn post_json(uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    builder("POST", uri, token)
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Create a DELETE request
pub fn delete_request(uri: &str, token: Option<&str>) -> Request<Body> {
    builder("DELETE", uri, token).body(Body::empty()).unwrap()
}
