//! Shopping cart aggregate.
//!
//! The cart is a list of line items mutated through [`CartCommand`] values
//! processed by a pure transition function. Every mutation schedules a
//! debounced write of the full item list to durable storage; the stored
//! blob is structurally validated on load and discarded wholesale when
//! corrupt.

mod persistence;
mod storage;

pub use persistence::{DEBOUNCE_DELAY, DebouncedWriter};
pub use storage::{CartStorage, FileCartStorage, MemoryCartStorage, StorageError, decode_items};

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use movase_core::BookId;

/// A book as presented by the catalog, without cart-specific state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    /// Unit price in BRL. Must be non-negative.
    pub price: Decimal,
    /// Primary cover image reference.
    pub image_url: String,
}

/// A line item in the cart: a book plus its quantity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CartItem {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub price: Decimal,
    pub image_url: String,
    /// Always > 0; items whose quantity reaches 0 are removed.
    pub quantity: u32,
}

impl CartItem {
    fn from_book(book: Book) -> Self {
        Self {
            id: book.id,
            title: book.title,
            author: book.author,
            price: book.price,
            image_url: book.image_url,
            quantity: 1,
        }
    }
}

/// Commands accepted by the cart transition function.
#[derive(Debug, Clone)]
pub enum CartCommand {
    /// Merge the book into the cart: increment quantity when the id is
    /// already present, insert with quantity 1 otherwise.
    AddItem(Book),
    /// Remove the item with the given id. No-op when absent.
    RemoveItem(BookId),
    /// Set the quantity to `max(0, quantity)`; 0 removes the item.
    UpdateQuantity { id: BookId, quantity: i64 },
    /// Empty the cart.
    Clear,
}

/// The cart aggregate: an owned item collection with derived totals.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Create a cart from already-validated items.
    #[must_use]
    pub const fn from_items(items: Vec<CartItem>) -> Self {
        Self { items }
    }

    /// The current line items.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// True when the cart holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of `price * quantity` over all items.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items
            .iter()
            .map(|item| item.price * Decimal::from(item.quantity))
            .sum()
    }

    /// Sum of quantities over all items.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Apply a command to the item collection.
    pub fn apply(&mut self, command: CartCommand) {
        match command {
            CartCommand::AddItem(book) => {
                if let Some(existing) = self.items.iter_mut().find(|item| item.id == book.id) {
                    existing.quantity += 1;
                } else {
                    self.items.push(CartItem::from_book(book));
                }
            }
            CartCommand::RemoveItem(id) => {
                self.items.retain(|item| item.id != id);
            }
            CartCommand::UpdateQuantity { id, quantity } => {
                let quantity = u32::try_from(quantity.max(0)).unwrap_or(u32::MAX);
                if let Some(existing) = self.items.iter_mut().find(|item| item.id == id) {
                    existing.quantity = quantity;
                }
                self.items.retain(|item| item.quantity > 0);
            }
            CartCommand::Clear => {
                self.items.clear();
            }
        }
    }
}

/// The cart service: the aggregate plus its debounced persistence.
///
/// Constructor-injected wherever a cart is needed; callers dispatch
/// commands and read the derived totals. Call [`CartService::flush`] on
/// teardown to persist any pending write deterministically.
pub struct CartService {
    cart: Cart,
    writer: DebouncedWriter,
}

impl CartService {
    /// Load the cart from storage.
    ///
    /// A missing blob is a valid empty cart. A blob that fails structural
    /// validation is discarded and storage is reset, rather than risking a
    /// partially corrupt cart.
    #[must_use]
    pub fn load(storage: Arc<dyn CartStorage>) -> Self {
        let items = match storage.load() {
            Ok(Some(payload)) => decode_items(&payload).unwrap_or_else(|| {
                tracing::warn!("stored cart is invalid or corrupt, starting empty");
                if let Err(e) = storage.reset() {
                    tracing::error!("failed to reset corrupt cart storage: {e}");
                }
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::error!("failed to load cart from storage: {e}");
                if let Err(e) = storage.reset() {
                    tracing::error!("failed to reset unreadable cart storage: {e}");
                }
                Vec::new()
            }
        };

        Self {
            cart: Cart::from_items(items),
            writer: DebouncedWriter::new(storage, DEBOUNCE_DELAY),
        }
    }

    /// The underlying aggregate.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Apply a command and schedule a debounced write of the new state.
    pub fn dispatch(&mut self, command: CartCommand) {
        self.cart.apply(command);
        self.writer.schedule(self.cart.items().to_vec());
    }

    /// Persist any pending write immediately.
    pub async fn flush(&self) {
        self.writer.flush().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn book(id: i64, price: &str) -> Book {
        Book {
            id: BookId::new(id),
            title: format!("Book {id}"),
            author: "Author".to_string(),
            price: price.parse().unwrap(),
            image_url: format!("/covers/{id}.jpg"),
        }
    }

    #[test]
    fn test_add_item_twice_merges() {
        let mut cart = Cart::new();
        cart.apply(CartCommand::AddItem(book(1, "35.00")));
        cart.apply(CartCommand::AddItem(book(1, "35.00")));

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_add_different_items() {
        let mut cart = Cart::new();
        cart.apply(CartCommand::AddItem(book(1, "35.00")));
        cart.apply(CartCommand::AddItem(book(2, "19.90")));

        assert_eq!(cart.items().len(), 2);
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_remove_item() {
        let mut cart = Cart::new();
        cart.apply(CartCommand::AddItem(book(1, "35.00")));
        cart.apply(CartCommand::RemoveItem(BookId::new(1)));

        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut cart = Cart::new();
        cart.apply(CartCommand::AddItem(book(1, "35.00")));
        cart.apply(CartCommand::RemoveItem(BookId::new(99)));

        assert_eq!(cart.items().len(), 1);
    }

    #[test]
    fn test_update_quantity() {
        let mut cart = Cart::new();
        cart.apply(CartCommand::AddItem(book(1, "35.00")));
        cart.apply(CartCommand::UpdateQuantity {
            id: BookId::new(1),
            quantity: 5,
        });

        assert_eq!(cart.item_count(), 5);
    }

    #[test]
    fn test_update_quantity_to_zero_removes() {
        let mut cart = Cart::new();
        cart.apply(CartCommand::AddItem(book(1, "35.00")));
        cart.apply(CartCommand::UpdateQuantity {
            id: BookId::new(1),
            quantity: 0,
        });

        assert!(cart.is_empty());
    }

    #[test]
    fn test_update_quantity_negative_clamps_to_zero() {
        let mut cart = Cart::new();
        cart.apply(CartCommand::AddItem(book(1, "35.00")));
        cart.apply(CartCommand::UpdateQuantity {
            id: BookId::new(1),
            quantity: -3,
        });

        assert!(cart.is_empty());
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        cart.apply(CartCommand::AddItem(book(1, "35.00")));
        cart.apply(CartCommand::AddItem(book(2, "19.90")));
        cart.apply(CartCommand::Clear);

        assert!(cart.is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);
    }

    #[test]
    fn test_total() {
        let mut cart = Cart::new();
        cart.apply(CartCommand::AddItem(book(1, "35.00")));
        cart.apply(CartCommand::AddItem(book(1, "35.00")));
        cart.apply(CartCommand::AddItem(book(2, "19.90")));

        assert_eq!(cart.total(), dec("89.90"));
    }

    #[test]
    fn test_no_item_with_zero_quantity_survives() {
        let mut cart = Cart::new();
        cart.apply(CartCommand::AddItem(book(1, "10.00")));
        cart.apply(CartCommand::AddItem(book(2, "10.00")));
        cart.apply(CartCommand::UpdateQuantity {
            id: BookId::new(1),
            quantity: 0,
        });
        cart.apply(CartCommand::UpdateQuantity {
            id: BookId::new(2),
            quantity: 3,
        });

        assert!(cart.items().iter().all(|item| item.quantity > 0));
        assert_eq!(cart.item_count(), 3);
    }
}
