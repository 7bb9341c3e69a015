//! Pure cart transitions.

use soil2spoon_core::{Price, ProductId};

use crate::types::{CartItem, CartLineInput};

/// A change to the cart's line items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartAction {
    /// Add `item.quantity` units (at least 1) of `item.product_id`, merging
    /// with an existing line for the same product.
    Add(CartItem),
    /// Set a line's quantity. Negative values clamp to zero; zero removes.
    UpdateQuantity { product_id: ProductId, quantity: i64 },
    /// Drop a line.
    Remove(ProductId),
    /// Drop every line.
    Clear,
    /// Replace everything with the authoritative server cart.
    SetFromServer(Vec<CartItem>),
}

/// Apply `action` to `items`.
///
/// Afterwards every line has `quantity >= 1` and product IDs are unique.
pub fn reduce(items: &mut Vec<CartItem>, action: CartAction) {
    match action {
        CartAction::Add(mut item) => {
            let quantity = item.quantity.max(1);
            if let Some(existing) = items.iter_mut().find(|i| i.product_id == item.product_id) {
                existing.quantity = existing.quantity.saturating_add(quantity);
            } else {
                item.quantity = quantity;
                items.push(item);
            }
        }
        CartAction::UpdateQuantity {
            product_id,
            quantity,
        } => {
            let quantity = u32::try_from(quantity.max(0)).unwrap_or(u32::MAX);
            if let Some(existing) = items.iter_mut().find(|i| i.product_id == product_id) {
                existing.quantity = quantity;
            }
            items.retain(|i| i.quantity > 0);
        }
        CartAction::Remove(product_id) => items.retain(|i| i.product_id != product_id),
        CartAction::Clear => items.clear(),
        CartAction::SetFromServer(server) => {
            items.clear();
            for item in server.into_iter().filter(|i| i.quantity > 0) {
                if let Some(existing) = items.iter_mut().find(|i| i.product_id == item.product_id)
                {
                    existing.quantity = existing.quantity.saturating_add(item.quantity);
                } else {
                    items.push(item);
                }
            }
        }
    }
}

/// The cart's line items with derived totals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Line items in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    #[must_use]
    pub fn get(&self, product_id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|i| i.product_id == product_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of `price × quantity`.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Total number of units.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, i| acc.saturating_add(i.quantity))
    }

    /// The cart as a `PUT /api/cart` body.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLineInput> {
        self.items.iter().map(CartLineInput::from).collect()
    }

    pub fn apply(&mut self, action: CartAction) {
        reduce(&mut self.items, action);
    }
}
