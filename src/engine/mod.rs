//! Shopping cart engine.
//!
//! Owns the ordered list of line items, keyed by `(metal, weight_grams)`,
//! recomputes totals from whatever price feed snapshot the caller hands in,
//! and writes the cart through to its injected store after every mutation.
//!
//! Persistence is best effort: the in-memory cart is authoritative for the
//! session, and a failed save is logged, never rolled back. Totals always
//! come from the current feed, so a cart's displayed value moves with the
//! market even while its contents stand still.

use tracing::{debug, info, warn};

use crate::feed::PriceFeed;
use crate::model::{LineItem, Metal};
use crate::money::Money;
use crate::store::CartStore;

mod error;
pub use error::CartError;

/// Notification emitted after a successful [`CartEngine::add_item`], for a
/// presentation layer to acknowledge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemAdded {
    pub metal: Metal,
    pub weight_grams: u32,
}

/// The cart engine: line items plus the store they persist through.
pub struct CartEngine<S> {
    items: Vec<LineItem>,
    store: S,
}

/// Public API
impl<S: CartStore> CartEngine<S> {
    /// Restore the cart from the store. Fails soft: a missing snapshot means
    /// an empty cart, and a snapshot that cannot be read or parsed logs a
    /// warning and also starts empty. Restored entries with a zero quantity
    /// are dropped; a line item never carries quantity 0.
    pub fn load(store: S) -> Self {
        let mut items = match store.load() {
            Ok(Some(items)) => items,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "could not restore cart snapshot, starting empty");
                Vec::new()
            }
        };
        let before = items.len();
        items.retain(|item| item.quantity > 0);
        if items.len() < before {
            warn!(
                dropped = before - items.len(),
                "dropped restored line items with zero quantity"
            );
        }
        Self { items, store }
    }

    /// Add one unit of `(metal, weight_grams)` to the cart.
    ///
    /// An existing line item has its quantity bumped; otherwise a new item is
    /// appended with quantity 1 and the current USD per-gram price captured
    /// for reference. Rejects a zero weight without touching the cart.
    pub fn add_item(
        &mut self,
        feed: &PriceFeed,
        metal: Metal,
        weight_grams: u32,
    ) -> Result<ItemAdded, CartError> {
        if weight_grams == 0 {
            return Err(CartError::InvalidWeight { weight_grams });
        }

        match self.find_mut(metal, weight_grams) {
            Some(item) => {
                item.quantity += 1;
                let quantity = item.quantity;
                info!(metal = %metal, weight_grams, quantity, "cart item quantity bumped");
            }
            None => {
                self.items.push(LineItem {
                    metal,
                    weight_grams,
                    quantity: 1,
                    price_per_gram_at_add_time: feed.price_per_gram_usd(metal),
                });
                info!(metal = %metal, weight_grams, "cart item added");
            }
        }

        self.persist();
        Ok(ItemAdded {
            metal,
            weight_grams,
        })
    }

    /// Set the quantity of an existing line item. Quantity 0 removes the
    /// item; a key with no matching item is a silent no-op and nothing is
    /// persisted. No upper clamp.
    pub fn set_quantity(&mut self, metal: Metal, weight_grams: u32, quantity: u32) {
        if quantity == 0 {
            self.remove_item(metal, weight_grams);
            return;
        }

        match self.find_mut(metal, weight_grams) {
            Some(item) => {
                item.quantity = quantity;
                info!(metal = %metal, weight_grams, quantity, "cart item quantity set");
                self.persist();
            }
            None => {
                debug!(metal = %metal, weight_grams, "set_quantity on absent item ignored");
            }
        }
    }

    /// Remove the matching line item if present, then persist either way.
    pub fn remove_item(&mut self, metal: Metal, weight_grams: u32) {
        let before = self.items.len();
        self.items.retain(|item| item.key() != (metal, weight_grams));
        if self.items.len() < before {
            info!(metal = %metal, weight_grams, "cart item removed");
        } else {
            debug!(metal = %metal, weight_grams, "remove of absent item ignored");
        }
        self.persist();
    }

    /// Empty the cart. Unconditional; any confirmation dialog belongs to the
    /// presentation layer.
    pub fn clear(&mut self) {
        self.items.clear();
        info!("cart cleared");
        self.persist();
    }

    /// Current line items, in insertion order.
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    /// The line item with the given key, if any.
    pub fn find(&self, metal: Metal, weight_grams: u32) -> Option<&LineItem> {
        self.items
            .iter()
            .find(|item| item.key() == (metal, weight_grams))
    }

    /// Total units across all line items; the cart indicator renders when
    /// this is greater than zero.
    pub fn badge_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Live total for one line item, priced from the given feed snapshot.
    /// The captured add-time price plays no part here.
    pub fn line_total(&self, feed: &PriceFeed, item: &LineItem) -> Money {
        Money::from_float(
            feed.display_price_per_gram(item.metal)
                * item.weight_grams as f64
                * item.quantity as f64,
        )
    }

    /// Live total for the whole cart; zero when empty.
    pub fn cart_total(&self, feed: &PriceFeed) -> Money {
        let mut total = Money::default();
        for item in &self.items {
            total += self.line_total(feed, item);
        }
        total
    }
}

/// Private API
impl<S: CartStore> CartEngine<S> {
    fn find_mut(&mut self, metal: Metal, weight_grams: u32) -> Option<&mut LineItem> {
        self.items
            .iter_mut()
            .find(|item| item.key() == (metal, weight_grams))
    }

    /// Write-through save. In-memory state stays authoritative when the
    /// store misbehaves.
    fn persist(&self) {
        if let Err(e) = self.store.save(&self.items) {
            warn!(error = %e, "could not persist cart snapshot, keeping in-memory state");
        }
    }
}
