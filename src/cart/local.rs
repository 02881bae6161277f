//! Local cart operations.
//!
//! These functions only touch the line vector; the engine persists the
//! result under [`LOCAL_CART_KEY`] after each change.

use chrono::Utc;

use crate::cart::line::{position, CartLine, LineId};
use crate::catalog::{Product, ProductId};
use crate::storage::{load_json, save_json, KeyValueStore, StorageError, LOCAL_CART_KEY};

/// Reads the persisted local lines. A missing key is an empty cart.
pub(crate) fn load(store: &dyn KeyValueStore) -> Result<Vec<CartLine>, StorageError> {
    Ok(load_json(store, LOCAL_CART_KEY)?.unwrap_or_default())
}

/// Persists the full local line set.
pub(crate) fn persist(store: &dyn KeyValueStore, lines: &[CartLine]) -> Result<(), StorageError> {
    save_json(store, LOCAL_CART_KEY, lines)
}

/// Merges `quantity` units of `product` into the cart.
pub(crate) fn add(lines: &mut Vec<CartLine>, product: Product, quantity: u32) {
    if let Some(index) = position(lines, product.id) {
        let line = &mut lines[index];
        line.quantity = line.quantity.saturating_add(quantity);
        return;
    }

    let id = next_id(lines);
    lines.push(CartLine {
        id,
        product,
        quantity,
    });
}

/// Sets the quantity of an existing line. Returns `false` if absent.
pub(crate) fn set_quantity(lines: &mut [CartLine], product: ProductId, quantity: u32) -> bool {
    match position(lines, product) {
        Some(index) => {
            lines[index].quantity = quantity;
            true
        }
        None => false,
    }
}

/// Drops the line for `product`. Returns `false` if absent.
pub(crate) fn remove(lines: &mut Vec<CartLine>, product: ProductId) -> bool {
    let before = lines.len();
    lines.retain(|line| line.product.id != product);
    lines.len() != before
}

// Millisecond timestamp, bumped past existing ids so two adds in the same
// millisecond still get distinct lines.
fn next_id(lines: &[CartLine]) -> LineId {
    let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
    let after_last = lines
        .iter()
        .map(|line| line.id.0.saturating_add(1))
        .max()
        .unwrap_or_default();
    LineId(now.max(after_last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use rust_decimal::Decimal;

    fn product(id: u64) -> Product {
        Product::new(id, format!("product-{id}"), Decimal::from(10))
    }

    #[test]
    fn test_add_merges_quantity_for_same_product() {
        let mut lines = Vec::new();
        add(&mut lines, product(1), 2);
        add(&mut lines, product(1), 3);

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].quantity, 5);
    }

    #[test]
    fn test_add_generates_distinct_ids() {
        let mut lines = Vec::new();
        add(&mut lines, product(1), 1);
        add(&mut lines, product(2), 1);
        add(&mut lines, product(3), 1);

        assert!(lines[0].id < lines[1].id);
        assert!(lines[1].id < lines[2].id);
    }

    #[test]
    fn test_set_quantity_and_remove() {
        let mut lines = Vec::new();
        add(&mut lines, product(1), 1);

        assert!(set_quantity(&mut lines, ProductId(1), 7));
        assert_eq!(lines[0].quantity, 7);
        assert!(!set_quantity(&mut lines, ProductId(2), 7));

        assert!(remove(&mut lines, ProductId(1)));
        assert!(!remove(&mut lines, ProductId(1)));
        assert!(lines.is_empty());
    }

    #[test]
    fn test_persist_then_load() {
        let store = MemoryStore::new();
        assert!(load(&store).unwrap().is_empty());

        let mut lines = Vec::new();
        add(&mut lines, product(4), 2);
        persist(&store, &lines).unwrap();

        assert_eq!(load(&store).unwrap(), lines);
    }
}
