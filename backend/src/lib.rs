//! # Board Foot Backend
//!
//! Contains all non-UI logic of the board foot calculator: board measurement
//! and pricing, the live tally, saved orders, and text reports.
//!
//! ## Architecture
//!
//! ```text
//! UI Layer (any frontend)
//!     ↓
//! AppState (application flows)
//!     ↓
//! Domain Layer (tally, orders, export)
//!     ↓
//! Storage Layer (CSV and YAML files)
//! ```
//!
//! The UI owns an [`AppState`], edits the board draft through
//! [`TallyService::draft_mut`] and calls the plain command methods. Nothing in
//! here blocks on the work-in-progress mirror.

pub mod config;
pub mod domain;
pub mod logging;
pub mod storage;

use anyhow::Result;
use log::info;
use std::sync::Arc;

use crate::config::BackendConfig;
use crate::domain::{ExportService, OrderService, TallyService};
use crate::storage::csv::CsvConnection;
use crate::storage::Connection;

/// Main application state that holds all services
pub struct AppState {
    pub tally: TallyService,
    pub order_service: OrderService<CsvConnection>,
    pub export_service: ExportService,
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &BackendConfig) -> Result<AppState> {
    logging::init_logging(&config.log_filter);

    info!("Setting up storage in {}", config.data_directory.display());
    let connection = Arc::new(CsvConnection::new(&config.data_directory)?);

    info!("Setting up domain model");
    let tally = TallyService::restore(Arc::new(connection.create_work_in_progress_repository())).await;
    let order_service = OrderService::new(connection);
    let export_service = ExportService::new();

    Ok(AppState {
        tally,
        order_service,
        export_service,
    })
}

impl AppState {
    /// Save the live tally as an order, then clear the tally.
    ///
    /// Returns the new order id, or `None` when the tally is empty. If saving
    /// fails the tally is left as it was.
    pub async fn save_current_tally(&mut self, order_name: Option<&str>) -> Result<Option<String>> {
        if self.tally.boards().is_empty() {
            info!("Nothing to save: the tally is empty");
            return Ok(None);
        }

        let order_id = self.order_service.save_order(order_name, self.tally.boards()).await?;
        self.tally.clear_all();
        Ok(Some(order_id))
    }

    /// Make a saved order's boards the live tally. Returns false for an unknown order.
    pub async fn edit_order(&mut self, order_id: &str) -> Result<bool> {
        match self.order_service.load_order_for_editing(order_id).await? {
            Some(boards) => {
                self.tally.replace_boards(boards);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Report for the live tally, headed with the draft's measurement unit
    pub fn export_tally(&self) -> String {
        self.export_service
            .export_tally(self.tally.boards(), self.tally.draft().unit)
    }

    pub async fn export_order(&self, order_id: &str) -> Result<Option<String>> {
        let order = self.order_service.get_order(order_id).await?;
        Ok(order.map(|order| self.export_service.export_order(&order)))
    }
}
