//! Historical schedule compilation
//!
//! Loads the production, perforation and manual-operation tables of one
//! field, normalizes them into a [`Timeline`] and walks it month by month
//! into the `HIST.SCH` keyword stream.
//!
//! The output file is created only after every input has been read and the
//! cross-reference check has passed, so a rejected run leaves no file
//! behind.

pub mod normalizer;
pub mod walker;

pub use normalizer::{check_references, Normalizer, PerforationSet};
pub use walker::{TimelineWalker, WalkState, WalkSummary};

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::info;

use crate::config::CompilerConfig;
use crate::error::{CompileError, Result};
use crate::ingest::{RawTable, WellTable};
use crate::keywords::{EmitStats, KeywordWriter};
use crate::types::{ManualOpFact, PerforationFact, Period, PeriodRange, ProductionFact};

// ============================================================================
// Timeline
// ============================================================================

/// A fact that belongs to one period.
pub trait Dated {
    fn period(&self) -> Period;
}

impl Dated for ProductionFact {
    fn period(&self) -> Period {
        self.period
    }
}

impl Dated for PerforationFact {
    fn period(&self) -> Period {
        self.period
    }
}

impl Dated for ManualOpFact {
    fn period(&self) -> Period {
        self.period
    }
}

/// Facts in their original order, indexed by period.
#[derive(Debug, Clone)]
pub struct PeriodIndex<T> {
    facts: Vec<T>,
    by_period: BTreeMap<Period, Vec<usize>>,
}

impl<T: Dated> PeriodIndex<T> {
    pub fn new(facts: Vec<T>) -> Self {
        let mut by_period: BTreeMap<Period, Vec<usize>> = BTreeMap::new();
        for (i, fact) in facts.iter().enumerate() {
            by_period.entry(fact.period()).or_default().push(i);
        }
        Self { facts, by_period }
    }

    /// Facts of `period`, in original order.
    pub fn in_period(&self, period: Period) -> impl Iterator<Item = &T> + '_ {
        self.by_period
            .get(&period)
            .into_iter()
            .flatten()
            .map(move |&i| &self.facts[i])
    }

    /// Facts strictly before `period`, in original order.
    pub fn before(&self, period: Period) -> impl Iterator<Item = &T> + '_ {
        self.facts.iter().filter(move |f| f.period() < period)
    }
}

/// Every normalized fact of one field, ready to walk.
#[derive(Debug, Clone)]
pub struct Timeline {
    production: PeriodIndex<ProductionFact>,
    perforations: PeriodIndex<PerforationFact>,
    manual_ops: PeriodIndex<ManualOpFact>,
}

impl Timeline {
    pub fn new(
        production: Vec<ProductionFact>,
        perforations: Vec<PerforationFact>,
        manual_ops: Vec<ManualOpFact>,
    ) -> Self {
        Self {
            production: PeriodIndex::new(production),
            perforations: PeriodIndex::new(perforations),
            manual_ops: PeriodIndex::new(manual_ops),
        }
    }

    /// Load and normalize the tables of `field` from `input_dir`.
    ///
    /// Fails with [`CompileError::Reference`] when more field wells lack
    /// perforation records than the config tolerates.
    pub fn load(config: &CompilerConfig, input_dir: &Path, field: &str) -> Result<Self> {
        let wells = WellTable::load(config, input_dir)?;
        let normalizer = Normalizer::new(config, &wells, field);

        let production_table = RawTable::load_all(&config.sources.production, input_dir)?;
        let production = normalizer.production(&production_table)?;

        let mut perforation_table = RawTable::load_all(&config.sources.perforation, input_dir)?;
        let perforations = normalizer.perforations(&mut perforation_table)?;
        check_references(&perforations.unmatched, config.schedule.max_unmatched_wells)?;

        let manual_table = RawTable::load_all(&config.sources.manual_ops, input_dir)?;
        let manual_ops = normalizer.manual_ops(&manual_table)?;

        Ok(Self::new(production, perforations.facts, manual_ops))
    }

    pub const fn production(&self) -> &PeriodIndex<ProductionFact> {
        &self.production
    }

    pub const fn perforations(&self) -> &PeriodIndex<PerforationFact> {
        &self.perforations
    }

    pub const fn manual_ops(&self) -> &PeriodIndex<ManualOpFact> {
        &self.manual_ops
    }
}

// ============================================================================
// Compilation entry point
// ============================================================================

/// What to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleRequest {
    /// Simulation start; the first month start on or after it is the initial period
    pub start: NaiveDate,
    /// Last date covered, inclusive
    pub end: NaiveDate,
    pub field: String,
}

/// Outcome of a successful compilation.
#[derive(Debug, Clone)]
pub struct ScheduleSummary {
    pub output: PathBuf,
    pub walk: WalkSummary,
    pub stats: EmitStats,
}

/// Compile the historical schedule of `request.field` into
/// `output_dir/<output.schedule_file>`.
pub fn compile_schedule(
    config: &CompilerConfig,
    input_dir: &Path,
    output_dir: &Path,
    request: &ScheduleRequest,
) -> Result<ScheduleSummary> {
    if request.end < request.start {
        return Err(CompileError::InvalidRange {
            start: request.start,
            end: request.end,
        });
    }

    let timeline = Timeline::load(config, input_dir, &request.field)?;

    let output = output_dir.join(&config.output.schedule_file);
    let file = File::create(&output).map_err(|e| CompileError::io(&output, e))?;
    let mut writer = KeywordWriter::new(BufWriter::new(file));

    let mut walker = TimelineWalker::new(&timeline, config);
    let walk = walker
        .walk(PeriodRange::new(request.start, request.end), &mut writer)
        .map_err(|e| CompileError::io(&output, e))?;
    let (_, stats) = writer.finish().map_err(|e| CompileError::io(&output, e))?;

    info!(
        output = %output.display(),
        field = %request.field,
        periods = walk.periods,
        records = stats.records,
        "Historical schedule written"
    );

    Ok(ScheduleSummary {
        output,
        walk,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(y: i32, m: u32) -> Period {
        Period::containing(NaiveDate::from_ymd_opt(y, m, 1).expect("valid date"))
    }

    fn op(p: Period, keyword: &str) -> ManualOpFact {
        ManualOpFact {
            well: None,
            period: p,
            keyword: keyword.to_string(),
            args: String::new(),
        }
    }

    #[test]
    fn test_period_index_keeps_original_order() {
        let index = PeriodIndex::new(vec![
            op(period(2020, 3), "A"),
            op(period(2020, 1), "B"),
            op(period(2020, 3), "C"),
            op(period(2019, 12), "D"),
        ]);
        let march: Vec<&str> = index
            .in_period(period(2020, 3))
            .map(|o| o.keyword.as_str())
            .collect();
        assert_eq!(march, vec!["A", "C"]);
        let before: Vec<&str> = index
            .before(period(2020, 3))
            .map(|o| o.keyword.as_str())
            .collect();
        assert_eq!(before, vec!["B", "D"]);
        assert_eq!(index.in_period(period(2020, 2)).count(), 0);
    }

    #[test]
    fn test_inverted_range_is_rejected_before_reading_input() {
        let request = ScheduleRequest {
            start: NaiveDate::from_ymd_opt(2021, 1, 1).expect("valid date"),
            end: NaiveDate::from_ymd_opt(2020, 1, 1).expect("valid date"),
            field: "North".to_string(),
        };
        let missing = Path::new("/nonexistent/input");
        let err = compile_schedule(&CompilerConfig::default(), missing, missing, &request)
            .expect_err("end before start");
        assert!(matches!(err, CompileError::InvalidRange { .. }));
    }
}
