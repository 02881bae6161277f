//! Catalog resource types.
//!
//! The backend is loose about two product fields: `price` arrives as a
//! decimal string (sometimes a bare number) and `category` is either a
//! category id or an embedded category object. Both are normalized here,
//! once, when a [`Product`] is deserialized.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Backend product identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(pub u64);

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ProductId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A product category.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Backend category id.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Image URL.
    #[serde(default, rename = "img")]
    pub image: Option<String>,
    /// Long description.
    #[serde(default)]
    pub description: Option<String>,
}

/// The category a product belongs to.
///
/// `name` is `None` when the backend only sent the category id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    /// Backend category id.
    pub id: u64,
    /// Display name, when known.
    #[serde(default)]
    pub name: Option<String>,
}

/// A catalog product.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ProductPayload")]
pub struct Product {
    /// Backend product id.
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Long description.
    pub description: String,
    /// Unit price.
    pub price: Decimal,
    /// Units in stock.
    pub stock: u32,
    /// Image URL.
    #[serde(rename = "img")]
    pub image: Option<String>,
    /// Category, when assigned.
    pub category: Option<CategoryRef>,
}

impl Product {
    /// Creates a product with the given id, name and price.
    ///
    /// Remaining fields are empty; set them directly as needed.
    #[must_use]
    pub fn new(id: u64, name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: ProductId(id),
            name: name.into(),
            description: String::new(),
            price,
            stock: 0,
            image: None,
            category: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PriceField {
    Text(String),
    Number(serde_json::Number),
}

impl PriceField {
    fn parse(self) -> Result<Decimal, String> {
        let raw = match self {
            Self::Text(text) => text,
            Self::Number(number) => number.to_string(),
        };
        Decimal::from_str(raw.trim()).map_err(|err| format!("invalid price '{raw}': {err}"))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CategoryField {
    Id(u64),
    Embedded(CategoryRef),
}

impl From<CategoryField> for CategoryRef {
    fn from(field: CategoryField) -> Self {
        match field {
            CategoryField::Id(id) => Self { id, name: None },
            CategoryField::Embedded(category) => category,
        }
    }
}

#[derive(Deserialize)]
struct ProductPayload {
    id: ProductId,
    name: String,
    #[serde(default)]
    description: Option<String>,
    price: PriceField,
    #[serde(default)]
    stock: u32,
    #[serde(default)]
    img: Option<String>,
    #[serde(default)]
    category: Option<CategoryField>,
}

impl TryFrom<ProductPayload> for Product {
    type Error = String;

    fn try_from(payload: ProductPayload) -> Result<Self, Self::Error> {
        Ok(Self {
            id: payload.id,
            name: payload.name,
            description: payload.description.unwrap_or_default(),
            price: payload.price.parse()?,
            stock: payload.stock,
            image: payload.img,
            category: payload.category.map(CategoryRef::from),
        })
    }
}
