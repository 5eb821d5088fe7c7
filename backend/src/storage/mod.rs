//! # Storage Module
//!
//! Handles all data persistence for the board foot tally.
//!
//! The domain layer only sees the traits in [`traits`]; the concrete backend
//! lives in [`csv`] and can be swapped without touching domain logic.
//!
//! ## Key Responsibilities
//!
//! - **Work in progress**: a single overwrite-only snapshot of the live tally
//! - **Saved orders**: newest-first history of immutable orders
//! - **Atomic writes**: every file is replaced via temp file + rename
//! - **Tolerant reads**: unreadable data is logged and treated as absent

pub mod csv;
pub mod traits;

pub use traits::{Connection, OrderStorage, WorkInProgressStorage};
