//! Backend cart endpoints.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;

use crate::cart::line::{CartLine, LineId};
use crate::catalog::ProductId;
use crate::clients::{HttpError, HttpMethod, HttpRequest, Transport};

/// Path of the cart collection.
pub const CARTS_PATH: &str = "v1/carts/";
/// Path of the cart line collection.
pub const CART_ITEMS_PATH: &str = "v1/cart-items/";

/// The signed-in user's backend cart.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RemoteCart {
    /// Backend cart id.
    pub id: u64,
    /// Lines, when the backend embeds them.
    #[serde(default)]
    pub items: Vec<CartLine>,
}

#[derive(Clone, Debug)]
pub(crate) struct CartApi {
    transport: Arc<Transport>,
}

impl CartApi {
    pub(crate) const fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    /// Returns the user's cart, creating it when the user has none.
    pub(crate) async fn ensure_cart(&self) -> Result<RemoteCart, HttpError> {
        let request = HttpRequest::builder(HttpMethod::Get, CARTS_PATH).build()?;
        let page = self.transport.request(request).await?.listing::<RemoteCart>()?;

        if let Some(cart) = page.items.into_iter().next() {
            return Ok(cart);
        }

        tracing::debug!("No backend cart yet, creating one");
        let request = HttpRequest::builder(HttpMethod::Post, CARTS_PATH)
            .body(json!({}))
            .build()?;
        self.transport.request_json(request).await
    }

    pub(crate) async fn list_lines(&self) -> Result<Vec<CartLine>, HttpError> {
        let request = HttpRequest::builder(HttpMethod::Get, CART_ITEMS_PATH).build()?;
        let page = self.transport.request(request).await?.listing::<CartLine>()?;
        Ok(page.items)
    }

    pub(crate) async fn add_line(&self, product: ProductId, quantity: u32) -> Result<(), HttpError> {
        let request = HttpRequest::builder(HttpMethod::Post, CART_ITEMS_PATH)
            .body(json!({ "product_id": product, "quantity": quantity }))
            .build()?;
        self.transport.request(request).await?;
        Ok(())
    }

    pub(crate) async fn update_line(&self, line: LineId, quantity: u32) -> Result<(), HttpError> {
        let request = HttpRequest::builder(HttpMethod::Patch, format!("{CART_ITEMS_PATH}{line}/"))
            .body(json!({ "quantity": quantity }))
            .build()?;
        self.transport.request(request).await?;
        Ok(())
    }

    pub(crate) async fn remove_line(&self, line: LineId) -> Result<(), HttpError> {
        let request =
            HttpRequest::builder(HttpMethod::Delete, format!("{CART_ITEMS_PATH}{line}/")).build()?;
        self.transport.request(request).await?;
        Ok(())
    }
}
