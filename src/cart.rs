// The guest's trip basket: heterogeneous line items held in memory and mirrored
// to the state store on every mutation. Prices are EUR-equivalent base amounts;
// display conversion happens in the currency module.

use crate::storage::{StateStore, CART_KEY};
use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ItemKind {
    Rental,
    Tour,
    Transfer,
    Product,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: String,
    pub kind: ItemKind,
    pub title: String,
    // EUR-equivalent base price
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_in: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_out: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guests: Option<u32>,
}

impl CartItem {
    pub fn new(id: impl Into<String>, kind: ItemKind, title: impl Into<String>, price: f64) -> Self {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            price,
            check_in: None,
            check_out: None,
            guests: None,
        }
    }

    pub fn with_dates(mut self, check_in: NaiveDate, check_out: NaiveDate) -> Self {
        self.check_in = Some(check_in);
        self.check_out = Some(check_out);
        self
    }

    pub fn with_guests(mut self, guests: u32) -> Self {
        self.guests = Some(guests);
        self
    }
}

pub struct CartStore {
    items: RwLock<Vec<CartItem>>,
    store: Arc<dyn StateStore>,
}

impl CartStore {
    // Load the persisted cart once at startup, falling back to an empty basket
    // when the stored value is missing or unparseable
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        let items = match store.get(CART_KEY) {
            Some(raw) => match serde_json::from_str::<Vec<CartItem>>(&raw) {
                Ok(items) => items,
                Err(e) => {
                    warn!("Persisted cart unreadable, starting empty: {}", e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        Self {
            items: RwLock::new(items),
            store,
        }
    }

    // Add an item to the basket. Returns false (and leaves the cart unchanged)
    // when an item with the same id is already present.
    pub fn add(&self, item: CartItem) -> bool {
        let mut items = self.items.write();
        if items.iter().any(|existing| existing.id == item.id) {
            debug!("Item {} already in cart, ignoring add", item.id);
            return false;
        }
        debug!("Adding {} ({:?}) to cart", item.id, item.kind);
        items.push(item);
        self.persist(&items);
        true
    }

    // Remove the item with the given id. Unknown ids are a no-op.
    pub fn remove(&self, id: &str) -> bool {
        let mut items = self.items.write();
        let before = items.len();
        items.retain(|item| item.id != id);
        if items.len() == before {
            return false;
        }
        debug!("Removed {} from cart", id);
        self.persist(&items);
        true
    }

    pub fn clear(&self) {
        let mut items = self.items.write();
        items.clear();
        self.persist(&items);
    }

    // Sum of item prices in the base currency
    pub fn total(&self) -> f64 {
        self.items.read().iter().map(|item| item.price).sum()
    }

    pub fn items(&self) -> Vec<CartItem> {
        self.items.read().clone()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    fn persist(&self, items: &[CartItem]) {
        match serde_json::to_string(items) {
            Ok(json) => self.store.set(CART_KEY, &json),
            Err(e) => error!("Failed to serialize cart: {}", e),
        }
    }
}
