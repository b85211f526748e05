//! In-progress collection state: per-box counts, shade eggs and date
//!
//! Counts are stored sparsely. An absent box is "not entered"; an explicit
//! zero is kept as `Some(0)` so the form can show it, though zeros are never
//! sent to the backend.

use chrono::{Local, NaiveDate};
use std::collections::BTreeMap;

use crate::errors::{SharedError, SharedResult};
use crate::layout::FarmLayout;
use crate::submission::{SubmissionPayload, build_submission};
use crate::types::{BoxAddress, EggCount};
use crate::validator::{BoxWrite, InputValidator, parse_box_count};

/// Collection session bound to the farm layout
#[derive(Debug, Clone)]
pub struct GridModel {
    layout: FarmLayout,
    date: NaiveDate,
    shade_eggs: Option<u32>,
    cells: BTreeMap<BoxAddress, EggCount>,
    validator: InputValidator,
}

impl GridModel {
    pub fn new(layout: FarmLayout, date: NaiveDate) -> Self {
        Self {
            layout,
            date,
            shade_eggs: None,
            cells: BTreeMap::new(),
            validator: InputValidator::new(),
        }
    }

    /// Collection session dated with the current local date
    pub fn for_today(layout: FarmLayout) -> Self {
        Self::new(layout, Local::now().date_naive())
    }

    pub fn layout(&self) -> &FarmLayout {
        &self.layout
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn set_date(&mut self, date: NaiveDate) {
        self.date = date;
    }

    /// Write raw input to a box.
    ///
    /// The value is parsed and validated before anything is stored: counts
    /// above four are rejected and flagged, unparseable or negative input
    /// clears the box.
    pub fn set_count(&mut self, address: BoxAddress, raw: &str) -> SharedResult<BoxWrite> {
        if !self.layout.contains(&address) {
            return Err(SharedError::UnknownBox {
                address: address.to_string(),
            });
        }

        let outcome = self.validator.check(address, parse_box_count(raw));
        match outcome {
            BoxWrite::Store(count) => {
                self.cells.insert(address, count);
            }
            BoxWrite::Clear => {
                self.cells.remove(&address);
            }
            BoxWrite::Reject => {}
        }
        Ok(outcome)
    }

    pub fn get_count(&self, address: &BoxAddress) -> Option<EggCount> {
        self.cells.get(address).copied()
    }

    /// Set the shade-egg field; empty, negative or non-numeric input unsets it
    pub fn set_shade_eggs(&mut self, raw: &str) -> Option<u32> {
        self.shade_eggs = parse_box_count(raw).and_then(|value| u32::try_from(value).ok());
        self.shade_eggs
    }

    pub fn shade_eggs(&self) -> Option<u32> {
        self.shade_eggs
    }

    pub fn cell_values(&self) -> &BTreeMap<BoxAddress, EggCount> {
        &self.cells
    }

    pub fn field_error(&self, address: &BoxAddress) -> Option<&str> {
        self.validator.error_for(address)
    }

    pub fn field_errors(&self) -> &BTreeMap<BoxAddress, String> {
        self.validator.errors()
    }

    /// True when no box has been entered and there are no shade eggs
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() && self.shade_eggs.unwrap_or(0) == 0
    }

    /// Eggs entered in boxes, excluding shade eggs
    pub fn box_total(&self) -> u32 {
        self.cells.values().map(|&count| u32::from(count)).sum()
    }

    /// Clear counts, field errors and shade eggs. The date is kept.
    pub fn reset(&mut self) {
        self.cells.clear();
        self.validator.clear();
        self.shade_eggs = None;
    }

    pub fn build_submission(&self) -> SharedResult<SubmissionPayload> {
        build_submission(&self.layout, &self.cells, self.shade_eggs, self.date)
    }
}
