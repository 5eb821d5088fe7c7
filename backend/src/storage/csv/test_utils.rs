/// Test utilities module for automatic cleanup and consistent test infrastructure
///
/// This module provides RAII-based cleanup that guarantees test data is removed
/// even if tests panic or fail.
use anyhow::Result;
use std::path::PathBuf;
use tempfile::TempDir;

use super::connection::CsvConnection;
use shared::{BoardEntry, LengthUnit, MeasurementUnit, PricingType};

/// RAII Test Environment that automatically cleans up on drop
pub struct TestEnvironment {
    /// The temporary directory - kept alive to prevent auto-cleanup until drop
    _temp_dir: TempDir,
    pub connection: CsvConnection,
    /// Base directory path for manual inspection if needed
    pub base_path: PathBuf,
}

impl TestEnvironment {
    pub async fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let base_path = temp_dir.path().to_path_buf();
        let connection = CsvConnection::new(&base_path)?;

        Ok(TestEnvironment {
            _temp_dir: temp_dir,
            connection,
            base_path,
        })
    }

    /// Create a new test environment with a custom prefix for debugging
    pub async fn new_with_prefix(prefix: &str) -> Result<Self> {
        let temp_dir = TempDir::with_prefix(prefix)?;
        let base_path = temp_dir.path().to_path_buf();
        let connection = CsvConnection::new(&base_path)?;

        Ok(TestEnvironment {
            _temp_dir: temp_dir,
            connection,
            base_path,
        })
    }
}

impl Drop for TestEnvironment {
    fn drop(&mut self) {
        if std::env::var("BOARD_FOOT_DEBUG_TESTS").is_ok() {
            println!("Cleaning up test environment: {:?}", self.base_path);
        }
    }
}

/// Mixed-unit boards covering every pricing and unit combination
pub fn sample_boards() -> Vec<BoardEntry> {
    vec![
        BoardEntry {
            id: BoardEntry::generate_id(),
            thickness: Some(4.0),
            width: Some(6.0),
            length: 8.0,
            quantity: 1,
            unit: MeasurementUnit::Imperial,
            length_unit: Some(LengthUnit::Feet),
            price: Some(5.0),
            pricing_type: PricingType::PerBoardFoot,
            wood_species: Some("Oak (Red)".to_string()),
        },
        BoardEntry {
            id: BoardEntry::generate_id(),
            thickness: Some(8.0),
            width: Some(5.5),
            length: 30.0,
            quantity: 3,
            unit: MeasurementUnit::Imperial,
            length_unit: Some(LengthUnit::Inches),
            price: None,
            pricing_type: PricingType::PerBoardFoot,
            wood_species: None,
        },
        BoardEntry {
            id: BoardEntry::generate_id(),
            thickness: Some(5.0),
            width: Some(20.0),
            length: 200.0,
            quantity: 1,
            unit: MeasurementUnit::Metric,
            length_unit: None,
            price: Some(12.75),
            pricing_type: PricingType::PerBoardFoot,
            wood_species: Some("Wenge".to_string()),
        },
        BoardEntry {
            id: BoardEntry::generate_id(),
            thickness: None,
            width: None,
            length: 10.0,
            quantity: 3,
            unit: MeasurementUnit::Imperial,
            length_unit: Some(LengthUnit::Feet),
            price: Some(2.5),
            pricing_type: PricingType::Linear,
            wood_species: Some("Pine".to_string()),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_environment_cleans_up_on_drop() {
        let base_path = {
            let env = TestEnvironment::new_with_prefix("board_foot_test_").await.unwrap();
            assert!(env.base_path.exists());
            env.base_path.clone()
        };
        assert!(!base_path.exists());
    }
}
