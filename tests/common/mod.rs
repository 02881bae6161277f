//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::{json, Value};
use storefront_client::auth::{CredentialPair, CredentialStore};
use storefront_client::storage::{save_json, LOCAL_CART_KEY};
use storefront_client::{
    ApiBaseUrl, CartLine, KeyValueStore, MemoryStore, Product, StorefrontConfig, Transport,
};
use wiremock::MockServer;

/// Prefix every mock path is mounted under.
pub const API: &str = "/api";

pub fn api_path(path: &str) -> String {
    format!("{API}/{path}")
}

pub fn config(server: &MockServer) -> StorefrontConfig {
    StorefrontConfig::builder()
        .api_base_url(ApiBaseUrl::new(format!("{}{API}/", server.uri())).unwrap())
        .build()
        .unwrap()
}

pub fn memory() -> Arc<dyn KeyValueStore> {
    Arc::new(MemoryStore::new())
}

pub fn signed_in(store: &Arc<dyn KeyValueStore>, access: &str, refresh: &str) {
    CredentialStore::load(Arc::clone(store))
        .unwrap()
        .set(CredentialPair::new(access, refresh))
        .unwrap();
}

pub fn transport(server: &MockServer, store: &Arc<dyn KeyValueStore>) -> Arc<Transport> {
    let credentials = CredentialStore::load(Arc::clone(store)).unwrap();
    Arc::new(Transport::new(&config(server), credentials).unwrap())
}

pub fn product_json(id: u64, price: &str) -> Value {
    json!({
        "id": id,
        "name": format!("product-{id}"),
        "img": null,
        "description": "",
        "price": price,
        "stock": 10,
        "category": 1
    })
}

pub fn product(id: u64, price: i64) -> Product {
    Product::new(id, format!("product-{id}"), Decimal::from(price))
}

pub fn line_json(id: u64, product_id: u64, price: &str, quantity: u32) -> Value {
    json!({
        "id": id,
        "product": product_json(product_id, price),
        "quantity": quantity
    })
}

/// Persists local cart lines directly, as a previous process would have.
pub fn seed_local_cart(store: &Arc<dyn KeyValueStore>, lines: &[(u64, i64, u32)]) {
    let lines: Vec<CartLine> = lines
        .iter()
        .enumerate()
        .map(|(index, &(id, price, quantity))| CartLine {
            id: storefront_client::cart::LineId(index as u64 + 1),
            product: product(id, price),
            quantity,
        })
        .collect();
    save_json(store.as_ref(), LOCAL_CART_KEY, &lines).unwrap();
}

/// Method and path of every request the server saw, in arrival order.
pub async fn request_log(server: &MockServer) -> Vec<(String, String)> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .map(|request| (request.method.to_string(), request.url.path().to_string()))
        .collect()
}

pub async fn count_requests(server: &MockServer, method: &str, path: &str) -> usize {
    request_log(server)
        .await
        .iter()
        .filter(|(m, p)| m == method && p == &api_path(path))
        .count()
}
