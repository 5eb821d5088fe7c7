//! # CSV Work-in-Progress Repository
//!
//! Mirrors the live tally to `{data_directory}/work_in_progress.csv` so an
//! interrupted session can pick up where it left off. The file is replaced
//! wholesale on every save and removed when the tally is cleared.

use anyhow::Result;
use async_trait::async_trait;
use log::{debug, warn};
use std::fs;

use super::board_table::{read_boards, write_boards};
use super::connection::CsvConnection;
use crate::storage::WorkInProgressStorage;
use shared::BoardEntry;

#[derive(Clone)]
pub struct WorkInProgressRepository {
    connection: CsvConnection,
}

impl WorkInProgressRepository {
    pub fn new(connection: CsvConnection) -> Self {
        Self { connection }
    }
}

#[async_trait]
impl WorkInProgressStorage for WorkInProgressRepository {
    async fn save_work_in_progress(&self, boards: &[BoardEntry]) -> Result<()> {
        let path = self.connection.work_in_progress_path();
        write_boards(&self.connection, &path, boards)?;
        debug!("Saved {} work-in-progress boards to {:?}", boards.len(), path);
        Ok(())
    }

    async fn load_work_in_progress(&self) -> Result<Option<Vec<BoardEntry>>> {
        let path = self.connection.work_in_progress_path();
        if !path.exists() {
            debug!("No work in progress found at {:?}", path);
            return Ok(None);
        }

        match read_boards(&path) {
            Ok(boards) => {
                debug!("Loaded {} work-in-progress boards", boards.len());
                Ok(Some(boards))
            }
            Err(e) => {
                warn!("Ignoring unreadable work in progress at {:?}: {}", path, e);
                Ok(None)
            }
        }
    }

    async fn clear_work_in_progress(&self) -> Result<()> {
        let path = self.connection.work_in_progress_path();
        if path.exists() {
            fs::remove_file(&path)?;
            debug!("Cleared work in progress at {:?}", path);
        }
        Ok(())
    }
}
