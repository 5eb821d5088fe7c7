use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Volume of one board foot in cubic centimetres (1" × 12" × 12").
pub const CUBIC_CM_PER_BOARD_FOOT: f64 = 2359.737;

/// Measurement system a board was entered in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MeasurementUnit {
    /// Thickness in quarters, width in inches, length in feet or inches
    #[default]
    Imperial,
    /// Thickness, width and length in centimetres
    Metric,
}

impl MeasurementUnit {
    pub fn display_name(&self) -> &'static str {
        match self {
            MeasurementUnit::Imperial => "Imperial",
            MeasurementUnit::Metric => "Metric",
        }
    }

    pub fn from_string(value: &str) -> Result<Self, String> {
        match value {
            "imperial" => Ok(MeasurementUnit::Imperial),
            "metric" => Ok(MeasurementUnit::Metric),
            other => Err(format!("Unknown measurement unit: {}", other)),
        }
    }
}

impl fmt::Display for MeasurementUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasurementUnit::Imperial => write!(f, "imperial"),
            MeasurementUnit::Metric => write!(f, "metric"),
        }
    }
}

/// Length unit, only meaningful for imperial boards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LengthUnit {
    #[default]
    Feet,
    Inches,
}

impl LengthUnit {
    pub fn display_name(&self) -> &'static str {
        match self {
            LengthUnit::Feet => "ft",
            LengthUnit::Inches => "in",
        }
    }

    /// Symbol appended to a length in display strings
    pub fn symbol(&self) -> &'static str {
        match self {
            LengthUnit::Feet => "'",
            LengthUnit::Inches => "\"",
        }
    }

    pub fn from_string(value: &str) -> Result<Self, String> {
        match value {
            "feet" => Ok(LengthUnit::Feet),
            "inches" => Ok(LengthUnit::Inches),
            other => Err(format!("Unknown length unit: {}", other)),
        }
    }
}

impl fmt::Display for LengthUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LengthUnit::Feet => write!(f, "feet"),
            LengthUnit::Inches => write!(f, "inches"),
        }
    }
}

/// How a board is priced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PricingType {
    /// Price applies to each board foot; thickness and width are required
    #[default]
    PerBoardFoot,
    /// Price applies to each unit of length; thickness and width are ignored
    Linear,
}

impl PricingType {
    pub fn display_name(&self) -> &'static str {
        match self {
            PricingType::PerBoardFoot => "Per Board Foot",
            PricingType::Linear => "Linear",
        }
    }

    pub fn from_string(value: &str) -> Result<Self, String> {
        match value {
            "per_board_foot" => Ok(PricingType::PerBoardFoot),
            "linear" => Ok(PricingType::Linear),
            other => Err(format!("Unknown pricing type: {}", other)),
        }
    }
}

impl fmt::Display for PricingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PricingType::PerBoardFoot => write!(f, "per_board_foot"),
            PricingType::Linear => write!(f, "linear"),
        }
    }
}

/// A single line of a tally: one or more identical boards
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardEntry {
    /// UUID assigned when the entry is created
    pub id: String,
    /// Quarters (imperial) or centimetres (metric); absent for linear pricing
    pub thickness: Option<f64>,
    /// Inches (imperial) or centimetres (metric); absent for linear pricing
    pub width: Option<f64>,
    /// Feet or inches (imperial, see `length_unit`) or centimetres (metric)
    pub length: f64,
    pub quantity: u32,
    pub unit: MeasurementUnit,
    /// Only set for imperial boards
    pub length_unit: Option<LengthUnit>,
    /// Per board foot or per linear unit, depending on `pricing_type`
    pub price: Option<f64>,
    pub pricing_type: PricingType,
    pub wood_species: Option<String>,
}

impl BoardEntry {
    pub fn generate_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Copy of this entry under a freshly generated id
    pub fn with_new_id(&self) -> Self {
        Self {
            id: Self::generate_id(),
            ..self.clone()
        }
    }

    /// Board feet for the whole line (all boards of `quantity`).
    ///
    /// Linear boards and boards missing thickness or width contribute 0.
    pub fn board_feet(&self) -> f64 {
        if self.pricing_type == PricingType::Linear {
            return 0.0;
        }

        let (thickness, width) = match (self.thickness, self.width) {
            (Some(t), Some(w)) => (t, w),
            _ => return 0.0,
        };
        let quantity = f64::from(self.quantity);

        match self.unit {
            MeasurementUnit::Imperial => {
                let thickness_inches = thickness / 4.0;
                let length_feet = if self.length_unit == Some(LengthUnit::Inches) {
                    self.length / 12.0
                } else {
                    self.length
                };
                (thickness_inches * width * length_feet / 12.0) * quantity
            }
            MeasurementUnit::Metric => {
                (thickness * width * self.length / CUBIC_CM_PER_BOARD_FOOT) * quantity
            }
        }
    }

    /// Cost of the whole line, 0 when no price was entered
    pub fn cost(&self) -> f64 {
        let price = match self.price {
            Some(p) => p,
            None => return 0.0,
        };

        match self.pricing_type {
            PricingType::PerBoardFoot => self.board_feet() * price,
            PricingType::Linear => self.length * price * f64::from(self.quantity),
        }
    }

    pub fn display_string(&self) -> String {
        let dimensions = self.display_string_without_species();
        if dimensions.is_empty() {
            return dimensions;
        }
        match &self.wood_species {
            Some(species) => format!("{} - {}", dimensions, species),
            None => dimensions,
        }
    }

    /// Dimensions only, as used in exported reports.
    ///
    /// Empty when a per-board-foot entry is missing thickness or width.
    pub fn display_string_without_species(&self) -> String {
        let quantity_str = if self.quantity > 1 {
            format!("{} × ", self.quantity)
        } else {
            String::new()
        };
        let length = format_measurement(self.length);
        let length_symbol = self.length_unit.unwrap_or(LengthUnit::Feet).symbol();

        if self.pricing_type == PricingType::Linear {
            return match self.unit {
                MeasurementUnit::Imperial => format!("{}{}{}", quantity_str, length, length_symbol),
                MeasurementUnit::Metric => format!("{}{}cm", quantity_str, length),
            };
        }

        let (thickness, width) = match (self.thickness, self.width) {
            (Some(t), Some(w)) => (t, w),
            _ => return String::new(),
        };

        match self.unit {
            MeasurementUnit::Imperial => format!(
                "{}{}/4\" × {}\" × {}{}",
                quantity_str,
                thickness.trunc() as i64,
                format_measurement(width),
                length,
                length_symbol
            ),
            MeasurementUnit::Metric => format!(
                "{}{}cm × {}cm × {}cm",
                quantity_str,
                format_measurement(thickness),
                format_measurement(width),
                length
            ),
        }
    }
}

/// Render a dimension the way users typed it: whole numbers keep one decimal
/// place (`8.0`), everything else uses the shortest exact representation.
pub fn format_measurement(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

pub fn total_board_feet(boards: &[BoardEntry]) -> f64 {
    boards.iter().map(BoardEntry::board_feet).sum()
}

pub fn total_cost(boards: &[BoardEntry]) -> f64 {
    boards.iter().map(BoardEntry::cost).sum()
}

/// Immutable snapshot of a tally saved under a name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedOrder {
    pub id: String,
    pub order_name: Option<String>,
    /// When the order was saved
    pub timestamp: DateTime<Utc>,
    pub boards: Vec<BoardEntry>,
}

impl SavedOrder {
    /// Name shown in listings and report headers
    pub fn display_name(&self) -> &str {
        self.order_name.as_deref().unwrap_or("Order")
    }

    pub fn total_board_feet(&self) -> f64 {
        total_board_feet(&self.boards)
    }

    pub fn total_cost(&self) -> f64 {
        total_cost(&self.boards)
    }

    /// Most frequent species among the order's boards.
    ///
    /// Equal counts go to the species seen first.
    pub fn primary_wood_species(&self) -> Option<String> {
        let mut counts: Vec<(&str, usize)> = Vec::new();
        for species in self.boards.iter().filter_map(|b| b.wood_species.as_deref()) {
            match counts.iter_mut().find(|(seen, _)| *seen == species) {
                Some((_, count)) => *count += 1,
                None => counts.push((species, 1)),
            }
        }

        let mut best: Option<(&str, usize)> = None;
        for (species, count) in counts {
            if best.map_or(true, |(_, best_count)| count > best_count) {
                best = Some((species, count));
            }
        }
        best.map(|(species, _)| species.to_string())
    }
}

/// Saved order together with the aggregates shown in the history list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub order: SavedOrder,
    pub total_board_feet: f64,
    pub total_cost: f64,
    pub primary_wood_species: Option<String>,
}

impl From<SavedOrder> for OrderSummary {
    fn from(order: SavedOrder) -> Self {
        Self {
            total_board_feet: order.total_board_feet(),
            total_cost: order.total_cost(),
            primary_wood_species: order.primary_wood_species(),
            order,
        }
    }
}

/// Raw board input as typed by the user, before validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardDraft {
    pub thickness: String,
    pub width: String,
    pub length: String,
    pub quantity: String,
    pub price: String,
    pub wood_species: String,
    pub unit: MeasurementUnit,
    /// Used only when `unit` is imperial
    pub length_unit: LengthUnit,
    pub pricing_type: PricingType,
}

impl Default for BoardDraft {
    fn default() -> Self {
        Self {
            thickness: String::new(),
            width: String::new(),
            length: String::new(),
            quantity: "1".to_string(),
            price: String::new(),
            wood_species: String::new(),
            unit: MeasurementUnit::Imperial,
            length_unit: LengthUnit::Feet,
            pricing_type: PricingType::PerBoardFoot,
        }
    }
}

impl BoardDraft {
    /// Draft pre-filled from an existing entry, for editing it
    pub fn from_entry(entry: &BoardEntry) -> Self {
        Self {
            thickness: entry.thickness.map(format_measurement).unwrap_or_default(),
            width: entry.width.map(format_measurement).unwrap_or_default(),
            length: format_measurement(entry.length),
            quantity: entry.quantity.to_string(),
            price: entry.price.map(format_measurement).unwrap_or_default(),
            wood_species: entry.wood_species.clone().unwrap_or_default(),
            unit: entry.unit,
            length_unit: entry.length_unit.unwrap_or(LengthUnit::Feet),
            pricing_type: entry.pricing_type,
        }
    }
}

/// Aggregates of the live tally, published after every change
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct TallySummary {
    pub board_count: usize,
    pub total_board_feet: f64,
    pub total_cost: f64,
}

impl TallySummary {
    pub fn from_boards(boards: &[BoardEntry]) -> Self {
        Self {
            board_count: boards.len(),
            total_board_feet: total_board_feet(boards),
            total_cost: total_cost(boards),
        }
    }
}

/// Species offered as suggestions when entering a board
pub struct WoodSpecies;

impl WoodSpecies {
    pub const COMMON_HARDWOODS: [&'static str; 21] = [
        "Ash",
        "Black Limba",
        "Bloodwood",
        "Cherry",
        "Douglas Fir",
        "Hickory",
        "Maple",
        "Maple (Ambrosia)",
        "Maple (Birdseye)",
        "Maple (Curly)",
        "Oak (Red)",
        "Oak (White)",
        "Padauk",
        "Pine",
        "Poplar",
        "Purple Heart",
        "Tigerwood",
        "Walnut (Black)",
        "Walnut (Peruvian)",
        "Wenge",
        "Zebrawood",
    ];
}

/// Common nominal lumber size with its actual dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LumberPreset {
    pub name: &'static str,
    /// Inches for imperial presets, centimetres for metric ones
    pub thickness: f64,
    pub width: f64,
}

impl LumberPreset {
    const fn new(name: &'static str, thickness: f64, width: f64) -> Self {
        Self { name, thickness, width }
    }

    pub const IMPERIAL: [LumberPreset; 14] = [
        LumberPreset::new("1×2", 0.75, 1.5),
        LumberPreset::new("1×3", 0.75, 2.5),
        LumberPreset::new("1×4", 0.75, 3.5),
        LumberPreset::new("1×6", 0.75, 5.5),
        LumberPreset::new("1×8", 0.75, 7.25),
        LumberPreset::new("1×10", 0.75, 9.25),
        LumberPreset::new("1×12", 0.75, 11.25),
        LumberPreset::new("2×4", 1.5, 3.5),
        LumberPreset::new("2×6", 1.5, 5.5),
        LumberPreset::new("2×8", 1.5, 7.25),
        LumberPreset::new("2×10", 1.5, 9.25),
        LumberPreset::new("2×12", 1.5, 11.25),
        LumberPreset::new("4×4", 3.5, 3.5),
        LumberPreset::new("6×6", 5.5, 5.5),
    ];

    pub const METRIC: [LumberPreset; 10] = [
        LumberPreset::new("2×5", 2.0, 5.0),
        LumberPreset::new("2×10", 2.0, 10.0),
        LumberPreset::new("2×15", 2.0, 15.0),
        LumberPreset::new("3×10", 3.0, 10.0),
        LumberPreset::new("3×15", 3.0, 15.0),
        LumberPreset::new("4×10", 4.0, 10.0),
        LumberPreset::new("4×15", 4.0, 15.0),
        LumberPreset::new("5×10", 5.0, 10.0),
        LumberPreset::new("5×15", 5.0, 15.0),
        LumberPreset::new("5×20", 5.0, 20.0),
    ];

    pub fn presets_for(unit: MeasurementUnit) -> &'static [LumberPreset] {
        match unit {
            MeasurementUnit::Imperial => &Self::IMPERIAL,
            MeasurementUnit::Metric => &Self::METRIC,
        }
    }
}
