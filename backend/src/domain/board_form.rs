//! Board input domain logic.
//!
//! This module turns the raw strings of a [`BoardDraft`] into validated
//! [`BoardEntry`] values. The UI only gates its buttons on [`BoardFormService::can_add`];
//! parsing, defaulting and draft resets all live here.

use log::debug;
use shared::{BoardDraft, BoardEntry, LumberPreset, MeasurementUnit, PricingType};

use crate::domain::models::{BoardField, BoardFormValidation, BoardValidationError, ParsedBoard};

/// Service that validates board drafts and builds entries from them
#[derive(Clone, Default)]
pub struct BoardFormService;

impl BoardFormService {
    pub fn new() -> Self {
        Self
    }

    /// Validate a draft against the rules for its pricing type.
    ///
    /// Linear boards need a length and quantity; per-board-foot boards also
    /// need thickness and width. Every required value must be strictly positive.
    pub fn validate(&self, draft: &BoardDraft) -> BoardFormValidation {
        let mut errors = Vec::new();

        let (thickness, width) = match draft.pricing_type {
            PricingType::Linear => (None, None),
            PricingType::PerBoardFoot => (
                Self::collect(&mut errors, self.parse_dimension(BoardField::Thickness, &draft.thickness)),
                Self::collect(&mut errors, self.parse_dimension(BoardField::Width, &draft.width)),
            ),
        };
        let length = Self::collect(&mut errors, self.parse_dimension(BoardField::Length, &draft.length));
        let quantity = Self::collect(&mut errors, self.parse_quantity(&draft.quantity));

        let parsed = match (length, quantity) {
            (Some(length), Some(quantity)) if errors.is_empty() => Some(ParsedBoard {
                thickness,
                width,
                length,
                quantity,
                price: self.parse_price(&draft.price),
                wood_species: self.clean_species(&draft.wood_species),
            }),
            _ => None,
        };

        BoardFormValidation {
            is_valid: errors.is_empty(),
            errors,
            parsed,
        }
    }

    pub fn can_add(&self, draft: &BoardDraft) -> bool {
        self.validate(draft).is_valid
    }

    /// Build a new entry with a fresh id, `None` if the draft is invalid
    pub fn build_entry(&self, draft: &BoardDraft) -> Option<BoardEntry> {
        let parsed = self.validate(draft).parsed?;
        Some(Self::assemble(BoardEntry::generate_id(), draft.unit, draft, parsed))
    }

    /// Build the replacement for `existing` from an edit draft.
    ///
    /// The id and measurement unit of the original entry are kept; everything
    /// else comes from the draft.
    pub fn rebuild_entry(&self, existing: &BoardEntry, draft: &BoardDraft) -> Option<BoardEntry> {
        let parsed = self.validate(draft).parsed?;
        Some(Self::assemble(existing.id.clone(), existing.unit, draft, parsed))
    }

    fn assemble(id: String, unit: MeasurementUnit, draft: &BoardDraft, parsed: ParsedBoard) -> BoardEntry {
        BoardEntry {
            id,
            thickness: parsed.thickness,
            width: parsed.width,
            length: parsed.length,
            quantity: parsed.quantity,
            unit,
            length_unit: match unit {
                MeasurementUnit::Imperial => Some(draft.length_unit),
                MeasurementUnit::Metric => None,
            },
            price: parsed.price,
            pricing_type: draft.pricing_type,
            wood_species: parsed.wood_species,
        }
    }

    fn collect<T>(errors: &mut Vec<BoardValidationError>, result: Result<T, BoardValidationError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                errors.push(e);
                None
            }
        }
    }

    /// Parse a strictly positive, finite decimal
    pub fn parse_dimension(&self, field: BoardField, input: &str) -> Result<f64, BoardValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(BoardValidationError::Missing(field));
        }

        let value = trimmed
            .parse::<f64>()
            .map_err(|_| BoardValidationError::NotANumber(field, trimmed.to_string()))?;
        if !value.is_finite() {
            return Err(BoardValidationError::NotANumber(field, trimmed.to_string()));
        }
        if value <= 0.0 {
            return Err(BoardValidationError::NotPositive(field));
        }
        Ok(value)
    }

    /// Parse a strictly positive whole quantity
    pub fn parse_quantity(&self, input: &str) -> Result<u32, BoardValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(BoardValidationError::Missing(BoardField::Quantity));
        }

        let value = trimmed
            .parse::<i64>()
            .map_err(|_| BoardValidationError::NotANumber(BoardField::Quantity, trimmed.to_string()))?;
        if value <= 0 {
            return Err(BoardValidationError::NotPositive(BoardField::Quantity));
        }
        u32::try_from(value)
            .map_err(|_| BoardValidationError::NotANumber(BoardField::Quantity, trimmed.to_string()))
    }

    /// Price is optional: blank, unparseable, negative or non-finite input means no price
    pub fn parse_price(&self, input: &str) -> Option<f64> {
        let trimmed = input.trim().trim_start_matches('$').trim();
        if trimmed.is_empty() {
            return None;
        }

        match trimmed.parse::<f64>() {
            Ok(price) if price.is_finite() && price >= 0.0 => Some(price),
            _ => {
                debug!("Ignoring unusable price input '{}'", input);
                None
            }
        }
    }

    fn clean_species(&self, input: &str) -> Option<String> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    /// Fill thickness and width from a preset.
    ///
    /// Imperial presets list actual inches; the draft takes imperial
    /// thickness in quarters, so it is multiplied by four.
    pub fn apply_preset(&self, draft: &mut BoardDraft, preset: &LumberPreset) {
        let thickness = match draft.unit {
            MeasurementUnit::Imperial => preset.thickness * 4.0,
            MeasurementUnit::Metric => preset.thickness,
        };
        draft.thickness = thickness.to_string();
        draft.width = preset.width.to_string();
    }

    /// Reset the dimension fields after a board was added.
    /// Price and species stay so several boards of one species go in quickly.
    pub fn reset_after_add(&self, draft: &mut BoardDraft) {
        draft.thickness.clear();
        draft.width.clear();
        draft.length.clear();
        draft.quantity = "1".to_string();
    }

    /// Reset every input field, keeping the selected units and pricing type
    pub fn reset_all(&self, draft: &mut BoardDraft) {
        self.reset_after_add(draft);
        draft.price.clear();
        draft.wood_species.clear();
    }
}
