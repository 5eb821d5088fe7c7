//! # CSV Storage Backend
//!
//! File-based storage: board tables as CSV, the order index as YAML, all
//! inside one data directory managed by [`CsvConnection`].

pub mod board_table;
pub mod connection;
pub mod order_repository;
pub mod work_in_progress_repository;

#[cfg(test)]
pub mod test_utils;

pub use connection::CsvConnection;
pub use order_repository::OrderRepository;
pub use work_in_progress_repository::WorkInProgressRepository;
