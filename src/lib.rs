//! hist-schedule: Historical Schedule Compiler
//!
//! Turns monthly well production, perforation, manual-operation and
//! trajectory history into the SCHEDULE keyword stream of a reservoir
//! simulator (tNavigator / ECLIPSE syntax).
//!
//! ## Architecture
//!
//! - **Ingest**: delimited tables in mixed code pages, well-name cross-reference
//! - **Normalizer**: raw rows to per-well monthly facts of one field
//! - **Walker**: month-by-month state machine emitting records in schedule order
//! - **Keywords**: typed records and their fixed positional text encoding
//! - **Welltrack**: `WELSPECS` + `WELLTRACK` pairs from survey stations

pub mod config;
pub mod error;
pub mod ingest;
pub mod keywords;
pub mod schedule;
pub mod types;
pub mod welltrack;

// Re-export configuration
pub use config::{CompilerConfig, ConfigError};

// Re-export errors
pub use error::{CompileError, Result};

// Re-export commonly used types
pub use types::{
    ManualOpFact, PerforationFact, Period, PeriodRange, ProductionFact, ProductionTrigger,
    TrajectoryPoint,
};

// Re-export keyword model
pub use keywords::{EmitStats, KeywordWriter, Record};

// Re-export entry points
pub use schedule::{compile_schedule, ScheduleRequest, ScheduleSummary, Timeline};
pub use welltrack::{compile_welltracks, WelltrackSummary};
