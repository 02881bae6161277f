//! Cart line and snapshot types.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::catalog::{Product, ProductId};

/// Identifier of a cart line.
///
/// Remote lines carry the backend id; local lines carry a client-generated
/// id derived from the wall clock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LineId(pub u64);

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One product in the cart.
///
/// The same shape is used for backend cart items and for lines persisted
/// in local storage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    /// Line identifier.
    pub id: LineId,
    /// The product, as it was when the line was loaded.
    pub product: Product,
    /// Number of units, always greater than zero.
    pub quantity: u32,
}

impl CartLine {
    /// Returns `price * quantity` for this line.
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }
}

/// Which storage domain is authoritative for the cart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CartMode {
    /// Lines live in client-side storage (signed out).
    Local,
    /// Lines live on the backend (signed in).
    Remote,
}

impl fmt::Display for CartMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Remote => write!(f, "remote"),
        }
    }
}

/// Read-only view of the cart published to observers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CartSnapshot {
    /// The authoritative storage domain when the snapshot was taken.
    pub mode: CartMode,
    /// Lines in display order.
    pub lines: Vec<CartLine>,
}

impl CartSnapshot {
    /// Sum of `price * quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        total(&self.lines)
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn count(&self) -> u64 {
        count(&self.lines)
    }
}

pub(crate) fn total(lines: &[CartLine]) -> Decimal {
    lines.iter().map(CartLine::subtotal).sum()
}

pub(crate) fn count(lines: &[CartLine]) -> u64 {
    lines.iter().map(|line| u64::from(line.quantity)).sum()
}

pub(crate) fn position(lines: &[CartLine], product: ProductId) -> Option<usize> {
    lines.iter().position(|line| line.product.id == product)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(id: u64, price: Decimal, quantity: u32) -> CartLine {
        CartLine {
            id: LineId(id),
            product: Product::new(id, format!("product-{id}"), price),
            quantity,
        }
    }

    #[test]
    fn test_total_and_count() {
        let lines = vec![
            line(1, Decimal::from(10), 2),
            line(2, Decimal::from(5), 1),
        ];
        assert_eq!(total(&lines), Decimal::from(25));
        assert_eq!(count(&lines), 3);
    }

    #[test]
    fn test_empty_cart_totals() {
        assert_eq!(total(&[]), Decimal::ZERO);
        assert_eq!(count(&[]), 0);
    }

    #[test]
    fn test_subtotal_keeps_cents() {
        let line = line(1, Decimal::new(1999, 2), 3);
        assert_eq!(line.subtotal(), Decimal::new(5997, 2));
    }

    #[test]
    fn test_backend_cart_item_decodes() {
        let line: CartLine = serde_json::from_value(serde_json::json!({
            "id": 41,
            "product": {"id": 3, "name": "Bear", "price": "20.00", "category": 1},
            "quantity": 2
        }))
        .unwrap();

        assert_eq!(line.id, LineId(41));
        assert_eq!(line.subtotal(), Decimal::from(40));
    }
}
