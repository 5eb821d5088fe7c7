//! # Domain Module
//!
//! Contains the business logic of the board foot tally.
//!
//! The domain layer works only with the shared models and the storage traits,
//! so it is independent of any UI and of the concrete storage backend.
//!
//! ## Module Organization
//!
//! - **board_form**: Parsing and validation of raw board input, presets
//! - **tally_service**: The live tally and its work-in-progress mirror
//! - **order_service**: Saving, listing, deleting and re-editing orders
//! - **export_service**: Plain-text reports and writing them to disk
//!
//! ## Business Rules
//!
//! - Every required dimension and the quantity must be strictly positive
//! - Imperial thickness is entered in quarters (4/4 = 1 inch)
//! - Linear boards are priced per length and contribute no board feet
//! - The tally is mirrored to storage after every change, in order
//! - Saved orders are snapshots and never change after saving

pub mod board_form;
pub mod export_service;
pub mod models;
pub mod order_service;
pub mod tally_service;

pub use board_form::BoardFormService;
pub use export_service::{ExportService, ReportHeader};
pub use order_service::OrderService;
pub use tally_service::TallyService;
