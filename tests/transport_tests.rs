//! Integration tests for the authenticated transport.
//!
//! Tests cover:
//! - bearer credential attachment
//! - a single refresh shared by concurrent 401s
//! - at most one replay per request
//! - refresh failure clearing credentials and failing every waiter
//! - error classification (response, network, unauthorized)

mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use storefront_client::clients::{AuthFailure, HttpError, HttpMethod, HttpRequest};
use storefront_client::storage::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
use storefront_client::{ApiBaseUrl, CredentialStore, StorefrontConfig, Transport};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{api_path, count_requests, memory, signed_in, transport};

fn get(path: &str) -> HttpRequest {
    HttpRequest::builder(HttpMethod::Get, path).build().unwrap()
}

#[tokio::test]
async fn test_request_attaches_bearer_credential() {
    let server = MockServer::start().await;
    let store = memory();
    signed_in(&store, "access-1", "refresh-1");

    Mock::given(method("GET"))
        .and(path(api_path("v1/cart-items/")))
        .and(header("Authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let response = transport(&server, &store)
        .request(get("v1/cart-items/"))
        .await
        .unwrap();

    assert_eq!(response.code, 200);
    assert_eq!(response.body, json!([]));
}

#[tokio::test]
async fn test_concurrent_401s_share_a_single_refresh() {
    let server = MockServer::start().await;
    let store = memory();
    signed_in(&store, "stale", "refresh-1");

    Mock::given(method("GET"))
        .and(path(api_path("v1/cart-items/")))
        .and(header("Authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "expired"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path("v1/cart-items/")))
        .and(header("Authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(5)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(api_path("token/refresh/")))
        .and(body_json(json!({"refresh": "refresh-1"})))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access": "fresh"}))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport(&server, &store);
    let handles: Vec<_> = (0..5)
        .map(|_| {
            let transport = Arc::clone(&transport);
            tokio::spawn(async move { transport.request(get("v1/cart-items/")).await })
        })
        .collect();

    for handle in handles {
        let response = handle.await.unwrap().unwrap();
        assert_eq!(response.code, 200);
    }

    assert!(!transport.is_refreshing());
    assert_eq!(count_requests(&server, "POST", "token/refresh/").await, 1);

    let pair = transport.credentials().get().unwrap();
    assert_eq!(pair.access, "fresh");
    assert_eq!(pair.refresh, "refresh-1");
    assert_eq!(
        store.get(ACCESS_TOKEN_KEY).unwrap().as_deref(),
        Some("\"fresh\"")
    );
}

#[tokio::test]
async fn test_queued_requests_replay_once_after_the_refresh() {
    let server = MockServer::start().await;
    let store = memory();
    signed_in(&store, "stale", "refresh-1");

    Mock::given(method("GET"))
        .and(path(api_path("v1/products/")))
        .and(header("Authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(4)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path("v1/products/")))
        .and(header("Authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(4)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(api_path("token/refresh/")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access": "fresh"}))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport(&server, &store);
    let handles: Vec<_> = (0..4)
        .map(|marker| {
            let transport = Arc::clone(&transport);
            let request = HttpRequest::builder(HttpMethod::Get, "v1/products/")
                .query_param("marker", marker.to_string())
                .build()
                .unwrap();
            tokio::spawn(async move { transport.request(request).await })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap().code, 200);
    }

    let requests = server.received_requests().await.unwrap();
    let refresh_at = requests
        .iter()
        .position(|request| request.url.path() == api_path("token/refresh/"))
        .unwrap();

    // The second request carrying each marker is its replay.
    for marker in ["0", "1", "2", "3"] {
        let seen: Vec<usize> = requests
            .iter()
            .enumerate()
            .filter(|(_, request)| {
                request
                    .url
                    .query_pairs()
                    .any(|(key, value)| key == "marker" && value == marker)
            })
            .map(|(index, _)| index)
            .collect();
        assert_eq!(seen.len(), 2, "marker {marker}");
        assert!(seen[1] > refresh_at, "marker {marker} replayed before the refresh");
    }
}

#[tokio::test]
async fn test_request_is_replayed_at_most_once() {
    let server = MockServer::start().await;
    let store = memory();
    signed_in(&store, "stale", "refresh-1");

    Mock::given(method("GET"))
        .and(path(api_path("v1/cart-items/")))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(api_path("token/refresh/")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access": "fresh", "refresh": "refresh-2"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport(&server, &store);
    let result = transport.request(get("v1/cart-items/")).await;

    assert!(matches!(
        result,
        Err(HttpError::Unauthorized(AuthFailure::RetryExhausted))
    ));
    // The refresh itself succeeded, so the rotated pair is kept.
    assert_eq!(transport.credentials().refresh_token().as_deref(), Some("refresh-2"));
}

#[tokio::test]
async fn test_401_without_refresh_credential_propagates() {
    let server = MockServer::start().await;
    let store = memory();

    Mock::given(method("GET"))
        .and(path(api_path("v1/cart-items/")))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(api_path("token/refresh/")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = transport(&server, &store)
        .request(get("v1/cart-items/"))
        .await;

    assert!(matches!(
        result,
        Err(HttpError::Unauthorized(AuthFailure::NoRefreshCredential))
    ));
}

#[tokio::test]
async fn test_refresh_failure_clears_credentials_and_fails_waiters() {
    let server = MockServer::start().await;
    let store = memory();
    signed_in(&store, "stale", "revoked");

    Mock::given(method("GET"))
        .and(path(api_path("v1/cart-items/")))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(api_path("token/refresh/")))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"detail": "Token is invalid or expired"}))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let transport = transport(&server, &store);
    let (first, second, third) = tokio::join!(
        transport.request(get("v1/cart-items/")),
        transport.request(get("v1/cart-items/")),
        transport.request(get("v1/cart-items/")),
    );

    for result in [first, second, third] {
        assert!(matches!(
            result,
            Err(HttpError::Unauthorized(AuthFailure::RefreshRejected {
                status: Some(401)
            }))
        ));
    }

    assert!(!transport.is_authenticated());
    assert!(store.get(ACCESS_TOKEN_KEY).unwrap().is_none());
    assert!(store.get(REFRESH_TOKEN_KEY).unwrap().is_none());
}

#[tokio::test]
async fn test_unauthenticated_request_does_not_refresh() {
    let server = MockServer::start().await;
    let store = memory();
    signed_in(&store, "access-1", "refresh-1");

    Mock::given(method("POST"))
        .and(path(api_path("token/")))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"detail": "No active account"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(api_path("token/refresh/")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let request = HttpRequest::builder(HttpMethod::Post, "token/")
        .body(json!({"username": "ana", "password": "wrong"}))
        .unauthenticated()
        .build()
        .unwrap();
    let result = transport(&server, &store).request(request).await;

    match result {
        Err(HttpError::Response(err)) => {
            assert_eq!(err.code, 401);
            assert!(err.message.contains("No active account"));
        }
        other => panic!("expected a response error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_client_error_is_surfaced_as_is() {
    let server = MockServer::start().await;
    let store = memory();
    signed_in(&store, "access-1", "refresh-1");

    Mock::given(method("POST"))
        .and(path(api_path("v1/cart-items/")))
        .respond_with(
            ResponseTemplate::new(400)
                .insert_header("x-request-id", "req-42")
                .set_body_json(json!({"quantity": ["Ensure this value is greater than or equal to 1."]})),
        )
        .mount(&server)
        .await;

    let request = HttpRequest::builder(HttpMethod::Post, "v1/cart-items/")
        .body(json!({"product_id": 1, "quantity": 0}))
        .build()
        .unwrap();
    let err = transport(&server, &store).request(request).await.unwrap_err();

    assert_eq!(err.status(), Some(400));
    match err {
        HttpError::Response(err) => {
            assert!(err.is_client_error());
            assert!(err.message.contains("greater than or equal to 1"));
            assert_eq!(err.error_reference.as_deref(), Some("req-42"));
        }
        other => panic!("expected a response error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_backend_is_a_network_error() {
    let config = StorefrontConfig::builder()
        .api_base_url(ApiBaseUrl::new("http://127.0.0.1:1/api/").unwrap())
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap();
    let transport = Transport::new(&config, CredentialStore::load(memory()).unwrap()).unwrap();

    let result = transport.request(get("v1/products/")).await;
    assert!(matches!(result, Err(HttpError::Network(_))));
}

#[tokio::test]
async fn test_explicit_refresh_without_credentials_fails() {
    let server = MockServer::start().await;
    let result = transport(&server, &memory()).refresh().await;
    assert!(matches!(
        result,
        Err(HttpError::Unauthorized(AuthFailure::NoRefreshCredential))
    ));
}

#[tokio::test]
async fn test_listing_accepts_paginated_envelope() {
    let server = MockServer::start().await;
    let store = memory();

    Mock::given(method("GET"))
        .and(path(api_path("v1/categories/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 1,
            "next": null,
            "previous": null,
            "results": [{"id": 1, "name": "Toys", "img": null}]
        })))
        .mount(&server)
        .await;

    let response = transport(&server, &store)
        .request(get("v1/categories/"))
        .await
        .unwrap();
    let page = response.listing::<serde_json::Value>().unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.count, Some(1));
}
