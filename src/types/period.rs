//! Monthly periods - the atomic timestep of the historical schedule

use chrono::{Datelike, Days, Months, NaiveDate};
use std::fmt;

/// One calendar month, identified by its first day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    start: NaiveDate,
}

impl Period {
    /// The period containing `date` (date floored to the first of its month).
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            start: date - Days::new(u64::from(date.day0())),
        }
    }

    /// First day of the month.
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Calendar days in this month.
    pub fn days(&self) -> u32 {
        // December of chrono's last year has no successor
        self.next()
            .and_then(|next| next.start.pred_opt())
            .map_or(31, |last| last.day())
    }

    /// The following month, `None` past chrono's representable range.
    pub fn next(&self) -> Option<Self> {
        self.start
            .checked_add_months(Months::new(1))
            .map(|start| Self { start })
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start.format("%Y-%m"))
    }
}

/// Month-start sequence from `start` to `end`, both inclusive.
///
/// Only month starts falling inside the range are yielded: a `start` in the
/// middle of a month begins the sequence at the following month. The first
/// yielded period is the initial period of a schedule.
#[derive(Debug, Clone)]
pub struct PeriodRange {
    next: Option<Period>,
    end: NaiveDate,
}

impl PeriodRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        let floored = Period::containing(start);
        let first = if floored.start() < start {
            floored.next()
        } else {
            Some(floored)
        };
        Self { next: first, end }
    }
}

impl Iterator for PeriodRange {
    type Item = Period;

    fn next(&mut self) -> Option<Period> {
        let current = self.next?;
        if current.start() > self.end {
            self.next = None;
            return None;
        }
        self.next = current.next();
        Some(current)
    }
}
