//! Saved order domain logic.
//!
//! An order is an immutable, timestamped snapshot of a tally. This service
//! names and stores new orders, lists history with its aggregates, and hands
//! out copies of stored boards for re-editing.
//!
//! ## Business Rules
//!
//! - A blank name is replaced by the next free `"Order N"`
//! - History is listed newest first
//! - Boards loaded for editing get fresh ids; the stored order never changes

use anyhow::Result;
use chrono::Utc;
use log::{debug, info};
use std::sync::Arc;

use crate::storage::{Connection, OrderStorage};
use shared::{BoardEntry, OrderSummary, SavedOrder};

const GENERATED_NAME_PREFIX: &str = "Order ";

pub struct OrderService<C: Connection> {
    order_repository: C::OrderRepository,
}

impl<C: Connection> OrderService<C> {
    pub fn new(connection: Arc<C>) -> Self {
        let order_repository = connection.create_order_repository();
        Self { order_repository }
    }

    /// Store the given boards as a new order and return its id
    pub async fn save_order(&self, order_name: Option<&str>, boards: &[BoardEntry]) -> Result<String> {
        let order_name = match order_name.map(str::trim).filter(|name| !name.is_empty()) {
            Some(name) => name.to_string(),
            None => self.next_order_name().await?,
        };

        let order = SavedOrder {
            id: BoardEntry::generate_id(),
            order_name: Some(order_name),
            timestamp: Utc::now(),
            boards: boards.to_vec(),
        };

        self.order_repository.insert_order(&order).await?;
        info!("Saved order '{}' with {} boards", order.display_name(), order.boards.len());
        Ok(order.id)
    }

    /// Name suggested for the next order: one past the highest `"Order N"` in history
    ///
    /// Reads only the order names, so an order whose boards cannot be loaded
    /// still holds on to its number.
    pub async fn next_order_name(&self) -> Result<String> {
        let names = self.order_repository.list_order_names().await?;
        Ok(next_generated_name(names.iter().filter_map(|name| name.as_deref())))
    }

    pub async fn list_orders(&self) -> Result<Vec<OrderSummary>> {
        let orders = self.order_repository.list_orders().await?;
        debug!("Listing {} saved orders", orders.len());
        Ok(orders.into_iter().map(OrderSummary::from).collect())
    }

    pub async fn get_order(&self, order_id: &str) -> Result<Option<SavedOrder>> {
        self.order_repository.get_order(order_id).await
    }

    /// Delete an order. Deleting an unknown id is a no-op returning false.
    pub async fn delete_order(&self, order_id: &str) -> Result<bool> {
        self.order_repository.delete_order(order_id).await
    }

    pub async fn delete_all_orders(&self) -> Result<u32> {
        self.order_repository.delete_all_orders().await
    }

    /// Copy of an order's boards, each with a new id, ready to become the live tally
    pub async fn load_order_for_editing(&self, order_id: &str) -> Result<Option<Vec<BoardEntry>>> {
        let order = match self.order_repository.get_order(order_id).await? {
            Some(order) => order,
            None => return Ok(None),
        };

        info!("Loading order '{}' for editing", order.display_name());
        Ok(Some(order.boards.iter().map(BoardEntry::with_new_id).collect()))
    }
}

fn next_generated_name<'a>(names: impl Iterator<Item = &'a str>) -> String {
    // A number with no successor cannot be continued and is skipped
    let next = names
        .filter_map(|name| name.strip_prefix(GENERATED_NAME_PREFIX))
        .filter_map(|number| number.parse::<u32>().ok())
        .filter_map(|number| number.checked_add(1))
        .max()
        .unwrap_or(1);
    format!("{}{}", GENERATED_NAME_PREFIX, next)
}
