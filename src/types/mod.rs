//! Shared data structures for the historical schedule compiler
//!
//! - Period / PeriodRange: the monthly timeline
//! - ProductionFact, PerforationFact, ManualOpFact: per-period well facts
//! - TrajectoryPoint: static well survey stations

mod facts;
mod period;

pub use facts::*;
pub use period::*;
