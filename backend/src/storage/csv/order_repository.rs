//! # CSV Order Repository
//!
//! This module stores saved orders as a YAML index plus one CSV board table
//! per order.
//!
//! ## File Structure
//!
//! ```text
//! data/
//! ├── work_in_progress.csv
//! ├── saved_orders.yaml        ← order index, newest first
//! ├── saved_orders.yaml.corrupt ← last index that could not be decoded
//! └── orders/
//!     └── {order_id}.csv       ← boards owned by that order
//! ```
//!
//! ## Features
//!
//! - Newest-first ordering kept by the index itself
//! - Atomic file writes with temp files
//! - Deleting an order also deletes its board table, so no board record
//!   outlives the order that owns it
//! - Reads treat an undecodable index as empty history. Writes first move it
//!   aside and remove board tables that no index entry refers to.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use super::board_table::{read_boards, write_boards};
use super::connection::CsvConnection;
use crate::storage::OrderStorage;
use shared::SavedOrder;

/// YAML record structure for one entry of the order index
#[derive(Debug, Clone, Serialize, Deserialize)]
struct OrderIndexRecord {
    id: String,
    order_name: Option<String>,
    /// RFC 3339
    timestamp: String,
    board_count: usize,
}

impl From<&SavedOrder> for OrderIndexRecord {
    fn from(order: &SavedOrder) -> Self {
        OrderIndexRecord {
            id: order.id.clone(),
            order_name: order.order_name.clone(),
            timestamp: order.timestamp.to_rfc3339(),
            board_count: order.boards.len(),
        }
    }
}

/// CSV-based saved order repository
#[derive(Clone)]
pub struct OrderRepository {
    connection: CsvConnection,
    /// Serialises read-modify-write cycles on the index
    index_lock: Arc<Mutex<()>>,
}

impl OrderRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self {
            connection,
            index_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Raw index contents, `None` when no index has been written yet
    fn read_index_contents(&self) -> Result<Option<String>> {
        match fs::read_to_string(self.connection.orders_index_path()) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn parse_index(content: &str) -> Result<Vec<OrderIndexRecord>, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_yaml::from_str(content)
    }

    /// Index for read paths: anything unreadable degrades to empty history
    fn read_index(&self) -> Vec<OrderIndexRecord> {
        let index_path = self.connection.orders_index_path();
        let content = match self.read_index_contents() {
            Ok(Some(content)) => content,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Failed to read order index {:?}: {}. Treating history as empty.", index_path, e);
                return Vec::new();
            }
        };

        match Self::parse_index(&content) {
            Ok(records) => records,
            Err(e) => {
                warn!("Failed to parse order index {:?}: {}. Treating history as empty.", index_path, e);
                Vec::new()
            }
        }
    }

    /// Index for write paths.
    ///
    /// An unreadable file is an error. An undecodable one is moved to the
    /// backup path and replaced by empty history.
    fn read_index_for_update(&self) -> Result<Vec<OrderIndexRecord>> {
        let content = match self.read_index_contents()? {
            Some(content) => content,
            None => return Ok(Vec::new()),
        };

        match Self::parse_index(&content) {
            Ok(records) => Ok(records),
            Err(e) => {
                let backup_path = self.connection.orders_index_backup_path();
                fs::rename(self.connection.orders_index_path(), &backup_path)?;
                warn!(
                    "Order index could not be parsed: {}. Moved it to {:?} and starting a new history.",
                    e, backup_path
                );
                Ok(Vec::new())
            }
        }
    }

    fn write_index(&self, records: &[OrderIndexRecord]) -> Result<()> {
        let yaml_content = serde_yaml::to_string(records)?;
        self.connection
            .write_atomically(&self.connection.orders_index_path(), yaml_content.as_bytes())
    }

    /// Delete every board table whose order is not in `records`
    fn prune_orphaned_boards(&self, records: &[OrderIndexRecord]) -> Result<usize> {
        let orders_dir = self.connection.orders_directory();
        let entries = match fs::read_dir(&orders_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let indexed: HashSet<&str> = records.iter().map(|r| r.id.as_str()).collect();
        let mut removed = 0;
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("csv") {
                continue;
            }
            let is_orphan = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map_or(false, |id| !indexed.contains(id));
            if is_orphan {
                fs::remove_file(&path)?;
                debug!("Removed board table without an order: {:?}", path);
                removed += 1;
            }
        }

        if removed > 0 {
            info!("Removed {} board tables that no order refers to", removed);
        }
        Ok(removed)
    }

    fn boards_path(&self, order_id: &str) -> Result<PathBuf> {
        self.connection
            .order_boards_path(order_id)
            .ok_or_else(|| anyhow::anyhow!("Order id '{}' cannot be used as a file name", order_id))
    }

    /// Resolve an index record into a full order, `None` if its data is unreadable
    fn load_order(&self, record: &OrderIndexRecord) -> Option<SavedOrder> {
        let timestamp = match DateTime::parse_from_rfc3339(&record.timestamp) {
            Ok(ts) => ts.with_timezone(&Utc),
            Err(e) => {
                warn!("Order '{}' has an invalid timestamp: {}. Skipping.", record.id, e);
                return None;
            }
        };

        let path = match self.connection.order_boards_path(&record.id) {
            Some(path) => path,
            None => {
                warn!("Order '{}' has an unusable id. Skipping.", record.id);
                return None;
            }
        };

        match read_boards(&path) {
            Ok(boards) => Some(SavedOrder {
                id: record.id.clone(),
                order_name: record.order_name.clone(),
                timestamp,
                boards,
            }),
            Err(e) => {
                warn!("Failed to load boards for order '{}': {}. Skipping.", record.id, e);
                None
            }
        }
    }
}

#[async_trait]
impl OrderStorage for OrderRepository {
    async fn insert_order(&self, order: &SavedOrder) -> Result<()> {
        let _guard = self.index_lock.lock().await;

        let mut records = self.read_index_for_update()?;
        self.prune_orphaned_boards(&records)?;

        // Boards first: an index entry must never point at a missing table
        let boards_path = self.boards_path(&order.id)?;
        write_boards(&self.connection, &boards_path, &order.boards)?;

        records.retain(|r| r.id != order.id);
        records.insert(0, OrderIndexRecord::from(order));
        self.write_index(&records)?;

        info!(
            "Stored order '{}' ({}) with {} boards",
            order.display_name(),
            order.id,
            order.boards.len()
        );
        Ok(())
    }

    async fn list_orders(&self) -> Result<Vec<SavedOrder>> {
        let records = self.read_index();
        let orders: Vec<SavedOrder> = records.iter().filter_map(|r| self.load_order(r)).collect();

        debug!("Listed {} of {} indexed orders", orders.len(), records.len());
        Ok(orders)
    }

    async fn list_order_names(&self) -> Result<Vec<Option<String>>> {
        Ok(self.read_index().into_iter().map(|r| r.order_name).collect())
    }

    async fn get_order(&self, order_id: &str) -> Result<Option<SavedOrder>> {
        let order = self
            .read_index()
            .iter()
            .find(|r| r.id == order_id)
            .and_then(|r| self.load_order(r));

        if order.is_none() {
            debug!("Order '{}' not found", order_id);
        }
        Ok(order)
    }

    async fn delete_order(&self, order_id: &str) -> Result<bool> {
        let _guard = self.index_lock.lock().await;

        let mut records = self.read_index_for_update()?;
        let before = records.len();
        records.retain(|r| r.id != order_id);
        let found = records.len() != before;

        if found {
            self.write_index(&records)?;
            info!("Deleted order '{}'", order_id);
        } else {
            debug!("No order found to delete for ID '{}'", order_id);
        }

        // Removes the deleted order's table along with any other orphan
        self.prune_orphaned_boards(&records)?;
        Ok(found)
    }

    async fn delete_all_orders(&self) -> Result<u32> {
        let _guard = self.index_lock.lock().await;

        let deleted = self.read_index().len() as u32;
        self.write_index(&[])?;

        let orders_dir = self.connection.orders_directory();
        if orders_dir.exists() {
            fs::remove_dir_all(&orders_dir)?;
        }

        info!("Deleted all {} orders", deleted);
        Ok(deleted)
    }
}
