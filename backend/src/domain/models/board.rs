use std::fmt;

/// Draft field a validation error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardField {
    Thickness,
    Width,
    Length,
    Quantity,
}

impl fmt::Display for BoardField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardField::Thickness => write!(f, "Thickness"),
            BoardField::Width => write!(f, "Width"),
            BoardField::Length => write!(f, "Length"),
            BoardField::Quantity => write!(f, "Quantity"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BoardValidationError {
    #[error("{0} is required")]
    Missing(BoardField),
    #[error("{0} must be a number, got '{1}'")]
    NotANumber(BoardField, String),
    #[error("{0} must be greater than 0")]
    NotPositive(BoardField),
}

impl BoardValidationError {
    pub fn field(&self) -> BoardField {
        match self {
            BoardValidationError::Missing(field)
            | BoardValidationError::NotANumber(field, _)
            | BoardValidationError::NotPositive(field) => *field,
        }
    }
}

/// Numeric values parsed out of a valid draft
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedBoard {
    pub thickness: Option<f64>,
    pub width: Option<f64>,
    pub length: f64,
    pub quantity: u32,
    pub price: Option<f64>,
    pub wood_species: Option<String>,
}

/// Outcome of validating a board draft
#[derive(Debug, Clone, PartialEq)]
pub struct BoardFormValidation {
    pub is_valid: bool,
    pub errors: Vec<BoardValidationError>,
    /// Present only when `is_valid`
    pub parsed: Option<ParsedBoard>,
}
