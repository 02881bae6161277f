//! Read-only access to the product catalog.
//!
//! # Example
//!
//! ```rust,ignore
//! use storefront_client::catalog::{Catalog, ProductQuery};
//!
//! let catalog = Catalog::new(Arc::clone(&transport));
//! let page = catalog
//!     .list_products(&ProductQuery::new().search("bear").page(2))
//!     .await?;
//!
//! for product in page.items {
//!     println!("{} - {}", product.name, product.price);
//! }
//! ```

mod types;

pub use types::{Category, CategoryRef, Product, ProductId};

use std::sync::Arc;

use crate::clients::{HttpError, HttpMethod, HttpRequest, Page, Transport};

/// Path of the category listing.
pub const CATEGORIES_PATH: &str = "v1/categories/";
/// Path of the product listing.
pub const PRODUCTS_PATH: &str = "v1/products/";

/// Filters for [`Catalog::list_products`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProductQuery {
    /// Free-text search term.
    pub search: Option<String>,
    /// 1-based page number.
    pub page: Option<u32>,
}

impl ProductQuery {
    /// Creates an empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the search term.
    #[must_use]
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Sets the page number.
    #[must_use]
    pub const fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }
}

/// Catalog endpoints.
#[derive(Clone, Debug)]
pub struct Catalog {
    transport: Arc<Transport>,
}

impl Catalog {
    /// Creates a catalog client on top of a shared transport.
    #[must_use]
    pub const fn new(transport: Arc<Transport>) -> Self {
        Self { transport }
    }

    /// Lists all categories.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if the request fails or the body is not a list.
    pub async fn list_categories(&self) -> Result<Vec<Category>, HttpError> {
        let request = HttpRequest::builder(HttpMethod::Get, CATEGORIES_PATH).build()?;
        let page = self.transport.request(request).await?.listing::<Category>()?;
        Ok(page.items)
    }

    /// Lists products matching `query`.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if the request fails or the body is not a list.
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Page<Product>, HttpError> {
        let mut builder = HttpRequest::builder(HttpMethod::Get, PRODUCTS_PATH);
        if let Some(search) = &query.search {
            builder = builder.query_param("search", search.clone());
        }
        if let Some(page) = query.page {
            builder = builder.query_param("page", page.to_string());
        }

        self.transport.request(builder.build()?).await?.listing()
    }

    /// Fetches one product.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError::Response`] with code 404 for an unknown id.
    pub async fn get_product(&self, id: ProductId) -> Result<Product, HttpError> {
        let request =
            HttpRequest::builder(HttpMethod::Get, format!("{PRODUCTS_PATH}{id}/")).build()?;
        self.transport.request_json(request).await
    }
}
