//! In-memory shopping cart store.
//!
//! The cart is an explicit store object owned by [`crate::state::AppState`]:
//! a controlled mutation API over a [`tokio::sync::watch`] channel, so every
//! subscriber observes complete snapshots only. The cart is deliberately not
//! persisted; a session's selection does not survive a restart.

use tokio::sync::watch;
use tracing::debug;
use url::Url;

use botilleria_core::{Price, ProductId};

/// Maximum quantity per cart line.
pub const MAX_QUANTITY: u32 = 10;

/// A product line in the cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartItem {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub image: Url,
    /// Always within `1..=MAX_QUANTITY`.
    pub quantity: u32,
}

/// Input for [`CartStore::add_item`]. Quantity always starts at 1; repeated
/// adds of the same id increment the existing line.
#[derive(Debug, Clone)]
pub struct NewCartItem {
    pub id: ProductId,
    pub name: String,
    pub price: Price,
    pub image: Url,
}

/// Immutable snapshot of the cart contents.
///
/// `total` and `count` are always derived from the items; they are never
/// stored separately and so can never diverge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CartState {
    items: Vec<CartItem>,
}

impl CartState {
    /// The cart lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Sum of `price * quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items
            .iter()
            .map(|item| item.price.line_total(item.quantity))
            .sum()
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn find_mut(&mut self, id: &ProductId) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|item| &item.id == id)
    }
}

/// Reactive cart store.
///
/// Mutations are synchronous and atomic with respect to subscribers: the
/// watch channel publishes the new snapshot only after the mutation closure
/// completes. Operations on absent ids or out-of-range quantities are
/// clamped or ignored, never errors.
#[derive(Debug)]
pub struct CartStore {
    tx: watch::Sender<CartState>,
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CartStore {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(CartState::default());
        Self { tx }
    }

    /// Subscribe to cart snapshots. The receiver immediately holds the
    /// current state and is notified after every effective mutation.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<CartState> {
        self.tx.subscribe()
    }

    /// The current cart snapshot.
    #[must_use]
    pub fn snapshot(&self) -> CartState {
        self.tx.borrow().clone()
    }

    /// Derived total of the current snapshot.
    #[must_use]
    pub fn total(&self) -> Price {
        self.tx.borrow().total()
    }

    /// Derived item count of the current snapshot.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.tx.borrow().count()
    }

    /// Add one unit of a product.
    ///
    /// An existing line's quantity is incremented up to [`MAX_QUANTITY`];
    /// adds beyond the cap succeed but leave the quantity unchanged. A new
    /// product is appended with quantity 1, preserving insertion order.
    pub fn add_item(&self, item: NewCartItem) {
        self.tx.send_if_modified(|state| {
            if let Some(line) = state.find_mut(&item.id) {
                if line.quantity >= MAX_QUANTITY {
                    debug!(id = %item.id, "cart line already at max quantity");
                    return false;
                }
                line.quantity += 1;
            } else {
                state.items.push(CartItem {
                    id: item.id,
                    name: item.name,
                    price: item.price,
                    image: item.image,
                    quantity: 1,
                });
            }
            true
        });
    }

    /// Remove a line entirely. Silent no-op if the id is not in the cart.
    pub fn remove_item(&self, id: &ProductId) {
        self.tx.send_if_modified(|state| {
            let before = state.items.len();
            state.items.retain(|item| &item.id != id);
            state.items.len() != before
        });
    }

    /// Set a line's quantity, clamped to `1..=MAX_QUANTITY`.
    ///
    /// A quantity of 0 floors to 1; it does not remove the line. Removal is
    /// only ever explicit via [`Self::remove_item`]. No-op if the id is
    /// absent.
    pub fn update_quantity(&self, id: &ProductId, quantity: u32) {
        let quantity = quantity.clamp(1, MAX_QUANTITY);
        self.tx.send_if_modified(|state| match state.find_mut(id) {
            Some(line) if line.quantity != quantity => {
                line.quantity = quantity;
                true
            }
            _ => false,
        });
    }

    /// Empty the cart.
    pub fn clear(&self) {
        self.tx.send_if_modified(|state| {
            if state.items.is_empty() {
                return false;
            }
            state.items.clear();
            true
        });
    }
}
