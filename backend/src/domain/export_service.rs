//! Export service domain logic.
//!
//! Renders a live tally or a saved order as a plain-text report meant for
//! sharing or printing, and writes reports to disk. The report layout is a
//! compatibility surface: users paste it into emails and spreadsheets, so
//! line order and labels must stay exactly as they are.

use anyhow::Result;
use chrono::{DateTime, Local, TimeZone};
use log::{error, info};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::fs;
use std::path::PathBuf;

use shared::{BoardEntry, MeasurementUnit, PricingType, SavedOrder};

pub const REPORT_DATE_FORMAT: &str = "%b %d, %Y %H:%M";
const SEPARATOR_WIDTH: usize = 50;
const MISC_SPECIES: &str = "Misc";

/// Title block printed above the boards
#[derive(Debug, Clone, PartialEq)]
pub struct ReportHeader {
    pub title: String,
    pub subtitle: Option<String>,
}

impl ReportHeader {
    pub fn new(title: impl Into<String>, subtitle: Option<String>) -> Self {
        Self {
            title: title.into(),
            subtitle,
        }
    }

    /// Header for the live tally, stamped with `now`
    pub fn for_tally<Tz: TimeZone>(now: &DateTime<Tz>, unit: MeasurementUnit) -> Self
    where
        Tz::Offset: Display,
    {
        Self::new(
            format!("Board Foot Calculator - {}", format_report_date(now)),
            Some(format!("Unit: {}", unit.display_name())),
        )
    }

    /// Header for a saved order, stamped with its save time in local time
    pub fn for_order(order: &SavedOrder) -> Self {
        Self::new(
            order.display_name(),
            Some(format!(
                "Saved: {}",
                format_report_date(&order.timestamp.with_timezone(&Local))
            )),
        )
    }
}

pub fn format_report_date<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    date.format(REPORT_DATE_FORMAT).to_string()
}

/// Export service that renders and writes board reports
#[derive(Clone)]
pub struct ExportService {}

impl ExportService {
    pub fn new() -> Self {
        Self {}
    }

    /// Render boards under the given header
    pub fn render(&self, boards: &[BoardEntry], header: &ReportHeader) -> String {
        let separator = "-".repeat(SEPARATOR_WIDTH);

        let mut output = String::new();
        output.push_str(&format!("{}\n", header.title));
        if let Some(subtitle) = &header.subtitle {
            output.push_str(&format!("{}\n", subtitle));
        }
        output.push_str(&format!("{}\n\n", separator));

        for (index, board) in boards.iter().enumerate() {
            output.push_str(&format!("Board {}:\n", index + 1));
            if let Some(species) = &board.wood_species {
                output.push_str(&format!("  Species: {}\n", species));
            }
            output.push_str(&format!("  Dimensions: {}\n", board.display_string_without_species()));
            if board.pricing_type == PricingType::PerBoardFoot {
                output.push_str(&format!("  Board Feet: {:.2} bf\n", board.board_feet()));
            }
            if let Some(price) = board.price {
                output.push_str(&format!(
                    "  Pricing: {} @ ${:.2}\n",
                    board.pricing_type.display_name(),
                    price
                ));
                output.push_str(&format!("  Cost: ${:.2}\n", board.cost()));
            }
            output.push('\n');
        }

        output.push_str(&format!("{}\n", separator));

        if shared::total_board_feet(boards) > 0.0 {
            let breakdown = species_breakdown(boards);
            if !breakdown.is_empty() {
                output.push_str("BOARD FEET BY SPECIES:\n");
                for (species, (board_feet, cost)) in &breakdown {
                    output.push_str(&format!("  {}: {:.2} bf - ${:.2}\n", species, board_feet, cost));
                }
                output.push('\n');
            }
        }

        let total_cost = shared::total_cost(boards);
        if total_cost > 0.0 {
            output.push_str(&format!("TOTAL COST: ${:.2}\n", total_cost));
        }

        output
    }

    /// Report for the live tally as of now
    pub fn export_tally(&self, boards: &[BoardEntry], unit: MeasurementUnit) -> String {
        self.render(boards, &ReportHeader::for_tally(&Local::now(), unit))
    }

    pub fn export_order(&self, order: &SavedOrder) -> String {
        self.render(&order.boards, &ReportHeader::for_order(order))
    }

    /// Write a report as `{file_stem}.txt` into `custom_path`, or the
    /// Documents folder when no path is given. Returns the written file.
    pub fn export_to_path(&self, report: &str, file_stem: &str, custom_path: Option<&str>) -> Result<PathBuf> {
        info!("📁 EXPORT: Exporting report - custom_path: {:?}", custom_path);

        let export_dir = match custom_path {
            Some(custom_path) if !custom_path.trim().is_empty() => PathBuf::from(self.sanitize_path(custom_path)),
            _ => dirs::document_dir().or_else(dirs::home_dir).ok_or_else(|| {
                error!("❌ EXPORT: Could not determine default export directory");
                anyhow::anyhow!("Failed to determine export directory")
            })?,
        };

        if let Err(e) = fs::create_dir_all(&export_dir) {
            error!("❌ EXPORT: Failed to create export directory {:?}: {}", export_dir, e);
            return Err(anyhow::anyhow!("Failed to create export directory: {}", e));
        }

        let file_path = export_dir.join(report_file_name(file_stem));
        if let Err(e) = fs::write(&file_path, report) {
            error!("❌ EXPORT: Failed to write export file to {:?}: {}", file_path, e);
            return Err(anyhow::anyhow!("Failed to write export file: {}", e));
        }

        info!("✅ EXPORT: Report exported to: {}", file_path.display());
        Ok(file_path)
    }

    /// Basic path sanitization to handle common user input issues
    fn sanitize_path(&self, path: &str) -> String {
        let mut cleaned = path.trim().to_string();

        // Remove surrounding quotes (single or double)
        if cleaned.len() >= 2
            && ((cleaned.starts_with('"') && cleaned.ends_with('"'))
                || (cleaned.starts_with('\'') && cleaned.ends_with('\'')))
        {
            cleaned = cleaned[1..cleaned.len() - 1].trim().to_string();
        }

        // Escaped spaces from pasted shell paths
        cleaned = cleaned.replace("\\ ", " ");

        while cleaned.len() > 1 && (cleaned.ends_with('/') || cleaned.ends_with('\\')) {
            cleaned.pop();
        }

        if cleaned.starts_with('~') {
            if let Some(home) = dirs::home_dir() {
                if cleaned == "~" {
                    cleaned = home.to_string_lossy().to_string();
                } else if cleaned.starts_with("~/") || cleaned.starts_with("~\\") {
                    cleaned = home.join(&cleaned[2..]).to_string_lossy().to_string();
                }
            }
        }

        cleaned
    }
}

impl Default for ExportService {
    fn default() -> Self {
        Self::new()
    }
}

/// Board feet and cost per species, per-board-foot entries only, sorted by name
fn species_breakdown(boards: &[BoardEntry]) -> BTreeMap<&str, (f64, f64)> {
    let mut breakdown: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for board in boards {
        let board_feet = board.board_feet();
        if board.pricing_type != PricingType::PerBoardFoot || board_feet <= 0.0 {
            continue;
        }

        let species = board.wood_species.as_deref().unwrap_or(MISC_SPECIES);
        let totals = breakdown.entry(species).or_insert((0.0, 0.0));
        totals.0 += board_feet;
        totals.1 += board.cost();
    }
    breakdown
}

fn report_file_name(file_stem: &str) -> String {
    let stem: String = file_stem
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect::<String>()
        .to_lowercase();
    let stem = if stem.is_empty() { "board_foot_report".to_string() } else { stem };
    format!("{}.txt", stem)
}
