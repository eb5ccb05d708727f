use crate::utils::error::Result;
use serde::{Deserialize, Serialize};

/// A product and its quantity in the cart. Field names match the stored JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: String,
    pub title: String,
    pub image_url: String,
    pub price: f64,
    pub quantity: u32,
}

/// Product description handed to `add_to_cart`, before it has a quantity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub id: String,
    pub title: String,
    pub image_url: String,
    pub price: f64,
}

impl NewProduct {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        image_url: impl Into<String>,
        price: f64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            image_url: image_url.into(),
            price,
        }
    }

    fn into_line_item(self) -> LineItem {
        LineItem {
            id: self.id,
            title: self.title,
            image_url: self.image_url,
            price: self.price,
            quantity: 1,
        }
    }
}

/// Ordered cart contents.
///
/// Holds at most one item per id and never an item with zero quantity. Every
/// mutation below keeps both properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartCollection {
    items: Vec<LineItem>,
}

impl CartCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection from restored items, dropping zero quantities and
    /// folding duplicate ids into their first occurrence.
    ///
    /// Returns the collection and whether anything had to be changed.
    pub fn normalized(items: Vec<LineItem>) -> (Self, bool) {
        let mut changed = false;
        let mut merged: Vec<LineItem> = Vec::with_capacity(items.len());

        for item in items {
            if item.quantity == 0 {
                changed = true;
                continue;
            }
            match merged.iter_mut().find(|existing| existing.id == item.id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(item.quantity);
                    changed = true;
                }
                None => merged.push(item),
            }
        }

        (Self { items: merged }, changed)
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<LineItem> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&LineItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Number of units across all line items.
    pub fn total_quantity(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of `price * quantity` across all line items.
    pub fn subtotal(&self) -> f64 {
        self.items
            .iter()
            .map(|item| item.price * f64::from(item.quantity))
            .sum()
    }

    /// Bumps the quantity of an existing item or appends a new one with
    /// quantity 1. Fields of an existing item are left untouched.
    pub fn add(&mut self, product: NewProduct) {
        match self.items.iter_mut().find(|item| item.id == product.id) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(1),
            None => self.items.push(product.into_line_item()),
        }
    }

    /// Returns whether an item with `id` was found.
    pub fn increment(&mut self, id: &str) -> bool {
        match self.items.iter_mut().find(|item| item.id == id) {
            Some(item) => {
                item.quantity = item.quantity.saturating_add(1);
                true
            }
            None => false,
        }
    }

    /// Decrements the matching item and prunes every item left at zero.
    ///
    /// Returns whether an item with `id` was found.
    pub fn decrement(&mut self, id: &str) -> bool {
        let mut found = false;
        for item in self.items.iter_mut().filter(|item| item.id == id) {
            found = true;
            if item.quantity > 0 {
                item.quantity -= 1;
            }
        }
        self.items.retain(|item| item.quantity > 0);
        found
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses a stored cart; malformed input yields `CartError::SerializationError`.
    pub fn from_json(raw: &str) -> Result<Vec<LineItem>> {
        Ok(serde_json::from_str(raw)?)
    }
}
