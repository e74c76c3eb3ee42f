use std::sync::Arc;

use barista_auth::testing::{PRIMARY, ROTATED, TestKey, claims_with, key_set, test_config};
use barista_auth::{PermissionGate, TokenVerifier};
use barista_infra::{DrinkStore, InMemoryDrinkStore, reset_and_seed};
use chrono::Utc;
use jsonwebtoken::{Algorithm, Header};
use reqwest::StatusCode;
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const JWKS_PATH: &str = "/.well-known/jwks.json";

const ALL_PERMISSIONS: [&str; 4] = [
    "get:drinks-detail",
    "post:drinks",
    "patch:drinks",
    "delete:drinks",
];

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Real router on an ephemeral port, verifying against `jwks`, with the
    /// catalog seeded.
    async fn spawn(jwks: &MockServer) -> Self {
        let config = test_config(&format!("{}{}", jwks.uri(), JWKS_PATH));
        let gate = Arc::new(PermissionGate::new(Arc::new(TokenVerifier::from_config(
            &config,
        ))));

        let store: Arc<dyn DrinkStore> = Arc::new(InMemoryDrinkStore::new());
        reset_and_seed(store.as_ref()).await.unwrap();

        let app = barista_api::build_app(gate, store);
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
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, route: &str) -> String {
        format!("{}{}", self.base_url, route)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn jwks_serving(keys: &[&TestKey]) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(key_set(keys)))
        .mount(&server)
        .await;
    server
}

fn token_with(permissions: &[&str]) -> String {
    PRIMARY.sign(&claims_with(permissions))
}

async fn json_body(res: reqwest::Response) -> Value {
    res.json().await.unwrap()
}

fn assert_auth_error(body: &Value, status: StatusCode, kind: &str) {
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], status.as_u16());
    assert_eq!(body["message"], kind);
    assert!(body["description"].is_string());
}

#[tokio::test]
async fn health_is_public() {
    let jwks = jwks_serving(&[&PRIMARY]).await;
    let srv = TestServer::spawn(&jwks).await;

    let res = srv.client.get(srv.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn public_menu_hides_ingredient_names() {
    let jwks = jwks_serving(&[&PRIMARY]).await;
    let srv = TestServer::spawn(&jwks).await;

    let res = srv.client.get(srv.url("/drinks")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = json_body(res).await;
    assert_eq!(
        body,
        json!({
            "success": true,
            "drinks": [{"id": 1, "title": "water", "recipe": [{"color": "blue", "parts": 1}]}]
        })
    );
}

#[tokio::test]
async fn detail_requires_a_bearer_token() {
    let jwks = jwks_serving(&[&PRIMARY]).await;
    let srv = TestServer::spawn(&jwks).await;

    let res = srv.client.get(srv.url("/drinks-detail")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_auth_error(&json_body(res).await, StatusCode::UNAUTHORIZED, "missing_header");

    let res = srv
        .client
        .get(srv.url("/drinks-detail"))
        .header("Authorization", "Token abc")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_auth_error(&json_body(res).await, StatusCode::UNAUTHORIZED, "invalid_header");
}

#[tokio::test]
async fn detail_with_permission_returns_the_long_view() {
    let jwks = jwks_serving(&[&PRIMARY]).await;
    let srv = TestServer::spawn(&jwks).await;

    let res = srv
        .client
        .get(srv.url("/drinks-detail"))
        .bearer_auth(token_with(&["get:drinks-detail"]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = json_body(res).await;
    assert_eq!(body["success"], true);
    assert_eq!(
        body["drinks"][0]["recipe"],
        json!([{"name": "water", "color": "blue", "parts": 1}])
    );
}

#[tokio::test]
async fn missing_permission_is_forbidden_and_nothing_is_written() {
    let jwks = jwks_serving(&[&PRIMARY]).await;
    let srv = TestServer::spawn(&jwks).await;

    let res = srv
        .client
        .post(srv.url("/drinks"))
        .bearer_auth(token_with(&["get:drinks-detail"]))
        .json(&json!({"title": "latte", "recipe": [{"name": "milk", "color": "white", "parts": 3}]}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_auth_error(&json_body(res).await, StatusCode::FORBIDDEN, "forbidden");

    let menu = json_body(srv.client.get(srv.url("/drinks")).send().await.unwrap()).await;
    assert_eq!(menu["drinks"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn token_without_permissions_claim_is_a_bad_request() {
    let jwks = jwks_serving(&[&PRIMARY]).await;
    let srv = TestServer::spawn(&jwks).await;

    let mut claims = claims_with(&[]);
    claims.as_object_mut().unwrap().remove("permissions");

    let res = srv
        .client
        .get(srv.url("/drinks-detail"))
        .bearer_auth(PRIMARY.sign(&claims))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_auth_error(&json_body(res).await, StatusCode::BAD_REQUEST, "invalid_claims");
}

#[tokio::test]
async fn expired_and_tampered_tokens_are_rejected() {
    let jwks = jwks_serving(&[&PRIMARY]).await;
    let srv = TestServer::spawn(&jwks).await;

    let mut claims = claims_with(&ALL_PERMISSIONS);
    let past = Utc::now().timestamp() - 3600;
    claims["iat"] = json!(past - 600);
    claims["exp"] = json!(past);

    let res = srv
        .client
        .get(srv.url("/drinks-detail"))
        .bearer_auth(PRIMARY.sign(&claims))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_auth_error(&json_body(res).await, StatusCode::UNAUTHORIZED, "invalid_token");

    // Signed by a key the issuer never published under this key id.
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(PRIMARY.kid.to_string());
    let forged = ROTATED.sign_with_header(&header, &claims_with(&ALL_PERMISSIONS));

    let res = srv
        .client
        .get(srv.url("/drinks-detail"))
        .bearer_auth(forged)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_auth_error(&json_body(res).await, StatusCode::UNAUTHORIZED, "invalid_header");
}

#[tokio::test]
async fn drink_lifecycle_create_update_delete() {
    let jwks = jwks_serving(&[&PRIMARY]).await;
    let srv = TestServer::spawn(&jwks).await;
    let token = token_with(&ALL_PERMISSIONS);

    // Create (single ingredient object is accepted)
    let res = srv
        .client
        .post(srv.url("/drinks"))
        .bearer_auth(&token)
        .json(&json!({"title": "matcha", "recipe": {"name": "matcha", "color": "green", "parts": 1}}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let created = json_body(res).await;
    assert_eq!(created["success"], true);
    let id = created["drinks"][0]["id"].as_i64().unwrap();
    assert_eq!(created["drinks"][0]["title"], "matcha");

    // Update (title only)
    let res = srv
        .client
        .patch(srv.url(&format!("/drinks/{id}")))
        .bearer_auth(&token)
        .json(&json!({"title": "iced matcha"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated = json_body(res).await;
    assert_eq!(updated["drinks"][0]["title"], "iced matcha");
    assert_eq!(updated["drinks"][0]["recipe"][0]["color"], "green");

    // Delete
    let res = srv
        .client
        .delete(srv.url(&format!("/drinks/{id}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(json_body(res).await, json!({"success": true, "delete": id}));

    let menu = json_body(srv.client.get(srv.url("/drinks")).send().await.unwrap()).await;
    let titles: Vec<&str> = menu["drinks"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|d| d["title"].as_str())
        .collect();
    assert_eq!(titles, ["water"]);
}

#[tokio::test]
async fn patch_accepts_a_recipe_sent_as_a_json_string() {
    let jwks = jwks_serving(&[&PRIMARY]).await;
    let srv = TestServer::spawn(&jwks).await;
    let token = token_with(&ALL_PERMISSIONS);

    let encoded = json!([{"name": "ice", "color": "white", "parts": 2}]).to_string();
    let res = srv
        .client
        .patch(srv.url("/drinks/1"))
        .bearer_auth(&token)
        .json(&json!({"recipe": encoded}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let body = json_body(res).await;
    assert_eq!(body["drinks"][0]["title"], "water");
    assert_eq!(
        body["drinks"][0]["recipe"],
        json!([{"name": "ice", "color": "white", "parts": 2}])
    );
}

#[tokio::test]
async fn bad_payloads_are_unprocessable_and_duplicates_conflict() {
    let jwks = jwks_serving(&[&PRIMARY]).await;
    let srv = TestServer::spawn(&jwks).await;
    let token = token_with(&ALL_PERMISSIONS);

    let cases = [
        json!({"title": "latte"}),
        json!({"title": "  ", "recipe": [{"name": "milk", "color": "white", "parts": 1}]}),
        json!({"title": "latte", "recipe": []}),
        json!({"title": "latte", "recipe": [{"name": "milk", "color": "white", "parts": 0}]}),
    ];
    for body in cases {
        let res = srv
            .client
            .post(srv.url("/drinks"))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY, "body: {body}");
        assert_eq!(json_body(res).await["message"], "unprocessable");
    }

    let res = srv
        .client
        .post(srv.url("/drinks"))
        .bearer_auth(&token)
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = srv
        .client
        .post(srv.url("/drinks"))
        .bearer_auth(&token)
        .json(&json!({"title": "water", "recipe": [{"name": "water", "color": "blue", "parts": 1}]}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    assert_eq!(
        json_body(res).await,
        json!({"success": false, "error": 409, "message": "conflict"})
    );
}

#[tokio::test]
async fn unknown_drinks_and_routes_are_not_found() {
    let jwks = jwks_serving(&[&PRIMARY]).await;
    let srv = TestServer::spawn(&jwks).await;
    let token = token_with(&ALL_PERMISSIONS);

    for route in ["/drinks/999", "/drinks/abc"] {
        let res = srv
            .client
            .patch(srv.url(route))
            .bearer_auth(&token)
            .json(&json!({"title": "ghost"}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "PATCH {route}");

        let res = srv
            .client
            .delete(srv.url(route))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND, "DELETE {route}");
    }

    let res = srv.client.get(srv.url("/coffee")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        json_body(res).await,
        json!({"success": false, "error": 404, "message": "resource not found"})
    );
}

#[tokio::test]
async fn authorization_runs_before_the_id_is_looked_at() {
    let jwks = jwks_serving(&[&PRIMARY]).await;
    let srv = TestServer::spawn(&jwks).await;

    let res = srv.client.delete(srv.url("/drinks/abc")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn empty_catalog_lists_are_not_found() {
    let jwks = jwks_serving(&[&PRIMARY]).await;
    let srv = TestServer::spawn(&jwks).await;
    let token = token_with(&ALL_PERMISSIONS);

    let res = srv
        .client
        .delete(srv.url("/drinks/1"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = srv.client.get(srv.url("/drinks")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = srv
        .client
        .get(srv.url("/drinks-detail"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rotated_signing_key_is_picked_up_with_one_refetch() {
    let jwks = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(key_set(&[&PRIMARY])))
        .up_to_n_times(1)
        .expect(1)
        .mount(&jwks)
        .await;
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(key_set(&[&PRIMARY, &ROTATED])))
        .expect(1)
        .mount(&jwks)
        .await;
    let srv = TestServer::spawn(&jwks).await;

    let res = srv
        .client
        .get(srv.url("/drinks-detail"))
        .bearer_auth(token_with(&["get:drinks-detail"]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let rotated = ROTATED.sign(&claims_with(&["get:drinks-detail"]));
    for _ in 0..2 {
        let res = srv
            .client
            .get(srv.url("/drinks-detail"))
            .bearer_auth(&rotated)
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn unreachable_key_set_is_a_server_error() {
    let jwks = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(JWKS_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&jwks)
        .await;
    let srv = TestServer::spawn(&jwks).await;

    let res = srv
        .client
        .get(srv.url("/drinks-detail"))
        .bearer_auth(token_with(&["get:drinks-detail"]))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_auth_error(
        &json_body(res).await,
        StatusCode::INTERNAL_SERVER_ERROR,
        "key_fetch_failed",
    );
}

#[tokio::test]
async fn cors_preflight_allows_any_origin() {
    let jwks = jwks_serving(&[&PRIMARY]).await;
    let srv = TestServer::spawn(&jwks).await;

    let res = srv
        .client
        .request(reqwest::Method::OPTIONS, srv.url("/drinks"))
        .header("Origin", "https://menu.example")
        .header("Access-Control-Request-Method", "PATCH")
        .header("Access-Control-Request-Headers", "authorization,content-type")
        .send()
        .await
        .unwrap();

    assert!(res.status().is_success());
    assert_eq!(
        res.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}
