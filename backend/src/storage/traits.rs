//! # Storage Traits
//!
//! This module defines the storage abstraction traits that allow different
//! storage backends to be used interchangeably in the domain layer.

use anyhow::Result;
use async_trait::async_trait;
use shared::{BoardEntry, SavedOrder};

/// Trait defining the interface for the work-in-progress slot
///
/// The slot holds at most one snapshot of the live tally. It exists purely so
/// that an interrupted session can be resumed.
#[async_trait]
pub trait WorkInProgressStorage: Send + Sync {
    /// Overwrite the slot with the given boards
    async fn save_work_in_progress(&self, boards: &[BoardEntry]) -> Result<()>;

    /// Load the slot. `None` when no snapshot exists or it cannot be decoded
    async fn load_work_in_progress(&self) -> Result<Option<Vec<BoardEntry>>>;

    /// Remove the slot entirely
    async fn clear_work_in_progress(&self) -> Result<()>;
}

/// Trait defining the interface for saved order storage operations
#[async_trait]
pub trait OrderStorage: Send + Sync {
    /// Store a new order ahead of all existing ones
    async fn insert_order(&self, order: &SavedOrder) -> Result<()>;

    /// List all orders, newest first
    async fn list_orders(&self) -> Result<Vec<SavedOrder>>;

    /// Names of all indexed orders, newest first, without loading their boards
    async fn list_order_names(&self) -> Result<Vec<Option<String>>>;

    /// Retrieve a specific order by ID
    async fn get_order(&self, order_id: &str) -> Result<Option<SavedOrder>>;

    /// Delete an order and the boards it owns
    /// Returns true if the order was found and deleted, false otherwise
    async fn delete_order(&self, order_id: &str) -> Result<bool>;

    /// Delete every order and every board record
    /// Returns the number of orders deleted
    async fn delete_all_orders(&self) -> Result<u32>;
}

/// Trait defining the interface for storage connections
///
/// This trait abstracts away the specific connection type and provides
/// factory methods for creating repositories.
pub trait Connection: Send + Sync + Clone {
    type WorkInProgressRepository: WorkInProgressStorage + 'static;
    type OrderRepository: OrderStorage;

    fn create_work_in_progress_repository(&self) -> Self::WorkInProgressRepository;

    fn create_order_repository(&self) -> Self::OrderRepository;
}
