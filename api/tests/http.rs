//! HTTP behaviour of the API client against a mock server

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use serde::{Deserialize, Serialize};
use serde_json::json;
use storefront_api::{ApiClient, ApiConfig, ApiError, HttpObjectStorage};
use storefront_core::request::{ServerMessage, rejection_message};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug, Deserialize, PartialEq)]
struct Item {
    id: String,
    quantity: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ItemBody<'a> {
    product_id: &'a str,
    quantity: u32,
}

fn client(server: &MockServer) -> ApiClient {
    ApiClient::new(&ApiConfig::new(server.uri())).unwrap()
}

#[tokio::test]
async fn get_unwraps_data_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{ "id": "a", "quantity": 2 }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let items: Vec<Item> = client(&server).get("/items").await.unwrap();
    assert_eq!(
        items,
        vec![Item {
            id: "a".to_string(),
            quantity: 2
        }]
    );
}

#[tokio::test]
async fn post_sends_camel_case_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cart/add/item"))
        .and(body_json(json!({ "productId": "p1", "quantity": 3 })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "data": { "id": "p1", "quantity": 3 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let item: Item = client(&server)
        .post(
            "/cart/add/item",
            &ItemBody {
                product_id: "p1",
                quantity: 3,
            },
        )
        .await
        .unwrap();
    assert_eq!(item.quantity, 3);
}

#[tokio::test]
async fn error_body_message_is_kept() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/cart/update/item"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({ "message": "Only 2 left in stock" })),
        )
        .mount(&server)
        .await;

    let error = client(&server)
        .put::<_, Item>("/cart/update/item", &json!({ "productId": "p1", "quantity": 9 }))
        .await
        .unwrap_err();

    assert_eq!(error.status(), Some(400));
    assert_eq!(error.server_message(), Some("Only 2 left in stock"));
}

#[tokio::test]
async fn unauthorized_without_message_uses_fallback() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/profile"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Unauthorized"))
        .mount(&server)
        .await;

    let error = client(&server)
        .get::<serde_json::Value>("/user/profile")
        .await
        .unwrap_err();

    assert!(matches!(error, ApiError::Unauthorized { message: None }));
    assert_eq!(rejection_message(&error, "Please sign in"), "Please sign in");
}

#[tokio::test]
async fn unexpected_body_is_a_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .mount(&server)
        .await;

    let error = client(&server).get::<Vec<Item>>("/items").await.unwrap_err();
    assert!(matches!(error, ApiError::ResponseParseFailed(_)));
}

#[tokio::test]
async fn unreachable_server_is_a_request_failure() {
    // A port nothing listens on once the listener is closed
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let client = ApiClient::new(&ApiConfig::new(format!("http://127.0.0.1:{port}"))).unwrap();
    let error = client.get::<Vec<Item>>("/items").await.unwrap_err();

    assert!(matches!(error, ApiError::RequestFailed(_)));
    assert_eq!(error.server_message(), None);
}

#[tokio::test]
async fn session_cookie_is_sent_back() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/profile"))
        .and(header("cookie", "session=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": "second" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user/profile"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "session=abc123; Path=/")
                .set_body_json(json!({ "data": "first" })),
        )
        .mount(&server)
        .await;

    let client = client(&server);
    let first: String = client.get("/user/profile").await.unwrap();
    let second: String = client.get("/user/profile").await.unwrap();

    assert_eq!(first, "first");
    assert_eq!(second, "second");
}

#[tokio::test]
async fn delete_unit_ignores_body() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/user/address/delete/a1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "Deleted" })))
        .expect(1)
        .mount(&server)
        .await;

    client(&server)
        .delete_unit("/user/address/delete/a1")
        .await
        .unwrap();
}

#[tokio::test]
async fn storage_upload_returns_public_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/o"))
        .and(query_param("name", "avatars/u1/me.png"))
        .and(header("content-type", "image/png"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "avatars/u1/me.png",
            "downloadTokens": "tok-1"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let storage =
        HttpObjectStorage::new(&ApiConfig::default().with_storage_url(server.uri())).unwrap();
    let url = storage
        .upload("avatars/u1/me.png", vec![1, 2, 3], "image/png")
        .await
        .unwrap();

    assert_eq!(
        url,
        format!("{}/o/avatars%2Fu1%2Fme.png?alt=media&token=tok-1", server.uri())
    );
}
