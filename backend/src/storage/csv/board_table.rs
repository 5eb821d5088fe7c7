//! # Board Tables
//!
//! Board entries are stored as CSV tables, one row per entry, both for the
//! work-in-progress slot and for each saved order.
//!
//! ## CSV Format
//!
//! ```csv
//! id,thickness,width,length,quantity,unit,length_unit,price,pricing_type,wood_species
//! 6f1c...,4.0,6.0,8.0,1,imperial,feet,5.25,per_board_foot,Cherry
//! 9a0e...,,,240.0,2,metric,,,linear,
//! ```

use anyhow::Result;
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::connection::CsvConnection;
use shared::{BoardEntry, LengthUnit, MeasurementUnit, PricingType};

pub const BOARD_TABLE_HEADER: [&str; 10] = [
    "id",
    "thickness",
    "width",
    "length",
    "quantity",
    "unit",
    "length_unit",
    "price",
    "pricing_type",
    "wood_species",
];

/// CSV record structure for board entries
#[derive(Debug, Clone, Serialize, Deserialize)]
struct BoardRecord {
    id: String,
    thickness: Option<f64>,
    width: Option<f64>,
    length: f64,
    quantity: u32,
    unit: String,
    length_unit: Option<String>,
    price: Option<f64>,
    pricing_type: String,
    wood_species: Option<String>,
}

impl From<&BoardEntry> for BoardRecord {
    fn from(board: &BoardEntry) -> Self {
        BoardRecord {
            id: board.id.clone(),
            thickness: board.thickness,
            width: board.width,
            length: board.length,
            quantity: board.quantity,
            unit: board.unit.to_string(),
            length_unit: board.length_unit.map(|u| u.to_string()),
            price: board.price,
            pricing_type: board.pricing_type.to_string(),
            wood_species: board.wood_species.clone(),
        }
    }
}

impl TryFrom<BoardRecord> for BoardEntry {
    type Error = anyhow::Error;

    fn try_from(record: BoardRecord) -> Result<Self> {
        let unit = MeasurementUnit::from_string(&record.unit).map_err(|e| anyhow::anyhow!(e))?;
        let pricing_type =
            PricingType::from_string(&record.pricing_type).map_err(|e| anyhow::anyhow!(e))?;
        let length_unit = match record.length_unit.as_deref() {
            None | Some("") => None,
            Some(value) => Some(LengthUnit::from_string(value).map_err(|e| anyhow::anyhow!(e))?),
        };
        if record.id.is_empty() {
            return Err(anyhow::anyhow!("Board record is missing an id"));
        }

        Ok(BoardEntry {
            id: record.id,
            thickness: record.thickness,
            width: record.width,
            length: record.length,
            quantity: record.quantity,
            unit,
            length_unit,
            price: record.price,
            pricing_type,
            wood_species: record.wood_species.filter(|s| !s.is_empty()),
        })
    }
}

/// Read every board from a table, failing on the first undecodable row
pub fn read_boards(path: &Path) -> Result<Vec<BoardEntry>> {
    let file = File::open(path)?;
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(BufReader::new(file));

    let mut boards = Vec::new();
    for result in csv_reader.deserialize::<BoardRecord>() {
        let record = result?;
        boards.push(BoardEntry::try_from(record)?);
    }
    Ok(boards)
}

/// Replace a table with the given boards. The header is always written so an
/// empty table still reads back as an empty list.
pub fn write_boards(connection: &CsvConnection, path: &Path, boards: &[BoardEntry]) -> Result<()> {
    let mut csv_writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    csv_writer.write_record(BOARD_TABLE_HEADER)?;
    for board in boards {
        csv_writer.serialize(BoardRecord::from(board))?;
    }

    let contents = csv_writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush board table: {}", e))?;
    connection.write_atomically(path, &contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_boards() -> Vec<BoardEntry> {
        vec![
            BoardEntry {
                id: BoardEntry::generate_id(),
                thickness: Some(4.0),
                width: Some(6.25),
                length: 8.0,
                quantity: 1,
                unit: MeasurementUnit::Imperial,
                length_unit: Some(LengthUnit::Feet),
                price: Some(5.25),
                pricing_type: PricingType::PerBoardFoot,
                wood_species: Some("Walnut (Black), figured".to_string()),
            },
            BoardEntry {
                id: BoardEntry::generate_id(),
                thickness: None,
                width: None,
                length: 240.0,
                quantity: 2,
                unit: MeasurementUnit::Metric,
                length_unit: None,
                price: None,
                pricing_type: PricingType::Linear,
                wood_species: None,
            },
        ]
    }

    #[test]
    fn test_write_then_read_preserves_boards() {
        let temp_dir = TempDir::new().unwrap();
        let connection = CsvConnection::new(temp_dir.path()).unwrap();
        let path = temp_dir.path().join("boards.csv");
        let boards = sample_boards();

        write_boards(&connection, &path, &boards).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with(
            "id,thickness,width,length,quantity,unit,length_unit,price,pricing_type,wood_species\n"
        ));
        assert_eq!(read_boards(&path).unwrap(), boards);
    }

    #[test]
    fn test_empty_table_reads_as_empty_list() {
        let temp_dir = TempDir::new().unwrap();
        let connection = CsvConnection::new(temp_dir.path()).unwrap();
        let path = temp_dir.path().join("boards.csv");

        write_boards(&connection, &path, &[]).unwrap();

        assert!(read_boards(&path).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_unit_fails_to_decode() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("boards.csv");
        std::fs::write(
            &path,
            "id,thickness,width,length,quantity,unit,length_unit,price,pricing_type,wood_species\n\
             abc,4,6,8,1,cubits,feet,,per_board_foot,\n",
        )
        .unwrap();

        assert!(read_boards(&path).is_err());
    }
}
