//! Well-name cross-reference table
//!
//! Reports name wells differently from the simulation model. Each row of the
//! cross-reference ties a model name to a report name, a field (reservoir)
//! and the pad the well is drilled from.

use std::path::Path;

use tracing::info;

use super::RawTable;
use crate::config::CompilerConfig;
use crate::error::Result;

/// One cross-reference row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WellRef {
    pub model_name: String,
    pub report_name: String,
    pub field: String,
    /// `None` when the pad cell is empty
    pub pad: Option<String>,
}

/// Cross-reference rows in file order.
#[derive(Debug, Clone, Default)]
pub struct WellTable {
    rows: Vec<WellRef>,
}

impl WellTable {
    pub fn load(config: &CompilerConfig, input_dir: &Path) -> Result<Self> {
        let raw = RawTable::load(&config.sources.well_table, input_dir)?;
        let table = Self::from_raw(&raw, config)?;
        info!(wells = table.rows.len(), "Loaded well cross-reference");
        Ok(table)
    }

    pub fn from_raw(raw: &RawTable, config: &CompilerConfig) -> Result<Self> {
        let cols = &config.columns.well_table;
        let model = raw.column(&cols.model_name)?;
        let report = raw.column(&cols.report_name)?;
        let field = raw.column(&cols.field)?;
        let pad = raw.column(&cols.pad)?;

        let rows = raw
            .rows()
            .iter()
            .map(|row| WellRef {
                model_name: raw.cell(row, &model).to_string(),
                report_name: raw.cell(row, &report).to_string(),
                field: raw.cell(row, &field).to_string(),
                pad: Some(raw.cell(row, &pad))
                    .filter(|p| !p.is_empty())
                    .map(str::to_string),
            })
            .collect();
        Ok(Self { rows })
    }

    pub fn from_rows(rows: Vec<WellRef>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[WellRef] {
        &self.rows
    }

    /// Rows assigned to `field`, in file order.
    pub fn field_rows<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a WellRef> + 'a {
        self.rows.iter().filter(move |r| r.field == field)
    }

    /// Whether any row maps model name `well` into `field`.
    pub fn model_in_field(&self, well: &str, field: &str) -> bool {
        self.field_rows(field).any(|r| r.model_name == well)
    }

    /// Distinct model names of `field`, first occurrence order.
    pub fn field_models<'a>(&'a self, field: &str) -> Vec<&'a str> {
        let mut models: Vec<&str> = Vec::new();
        for r in self.rows.iter().filter(|r| r.field == field) {
            if !models.contains(&r.model_name.as_str()) {
                models.push(&r.model_name);
            }
        }
        models
    }
}
