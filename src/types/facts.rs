//! Normalized per-well facts feeding the timeline walker.
//!
//! Every fact is built once by the normalizer and only read afterwards.

use serde::{Deserialize, Serialize};

use super::Period;

/// Decides which production facts assert a `WCONHIST` production control.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductionTrigger {
    /// Only a positive oil rate.
    #[default]
    OilOnly,
    /// Any of oil, water or gas rate above zero.
    AnyPhase,
}

/// Monthly production / injection history of one well.
///
/// Rates are per calendar day on production: reported volume divided by
/// `days_on_production`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionFact {
    pub well: String,
    pub period: Period,
    pub oil_rate: f64,
    pub water_rate: f64,
    pub gas_rate: f64,
    pub injection_rate: f64,
    pub days_on_production: f64,
    pub month_length: u32,
    /// Bottom-hole pressure, absent when not reported
    pub bhp: Option<f64>,
    /// Tubing-head pressure, absent when not reported
    pub thp: Option<f64>,
}

impl ProductionFact {
    pub fn is_injecting(&self) -> bool {
        self.injection_rate > 0.0
    }

    pub fn is_producing(&self, trigger: ProductionTrigger) -> bool {
        match trigger {
            ProductionTrigger::OilOnly => self.oil_rate > 0.0,
            ProductionTrigger::AnyPhase => {
                self.oil_rate > 0.0 || self.water_rate > 0.0 || self.gas_rate > 0.0
            }
        }
    }

    /// Fraction of the month the well was on production, in `(0, 1]`.
    pub fn efficiency_factor(&self) -> f64 {
        if self.month_length == 0 {
            return 1.0;
        }
        (self.days_on_production / f64::from(self.month_length)).min(1.0)
    }
}

/// A perforated (or squeezed) measured-depth interval.
#[derive(Debug, Clone, PartialEq)]
pub struct PerforationFact {
    /// Model well name
    pub well: String,
    pub period: Period,
    /// Interval start MD
    pub md_top: f64,
    /// Interval end MD
    pub md_bottom: f64,
    pub open: bool,
}

/// A manual operator command copied verbatim into the schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualOpFact {
    /// `None` for field-wide commands
    pub well: Option<String>,
    pub period: Period,
    pub keyword: String,
    pub args: String,
}

/// One surveyed trajectory station.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryPoint {
    pub x: f64,
    pub y: f64,
    pub md: f64,
    pub z: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn fact(oil: f64, water: f64, gas: f64, days: f64) -> ProductionFact {
        let period = Period::containing(NaiveDate::from_ymd_opt(2021, 4, 1).expect("valid date"));
        ProductionFact {
            well: "W-1".to_string(),
            period,
            oil_rate: oil,
            water_rate: water,
            gas_rate: gas,
            injection_rate: 0.0,
            days_on_production: days,
            month_length: period.days(),
            bhp: None,
            thp: None,
        }
    }

    #[test]
    fn test_water_only_well_triggers_any_phase_but_not_oil_only() {
        let f = fact(0.0, 12.0, 0.0, 30.0);
        assert!(f.is_producing(ProductionTrigger::AnyPhase));
        assert!(!f.is_producing(ProductionTrigger::OilOnly));
    }

    #[test]
    fn test_efficiency_factor_is_uptime_fraction() {
        let f = fact(5.0, 0.0, 2.5, 20.0);
        assert!((f.efficiency_factor() - 20.0 / 30.0).abs() < 1e-12);
    }

    #[test]
    fn test_efficiency_factor_never_exceeds_one() {
        let f = fact(5.0, 0.0, 0.0, 31.0);
        assert_eq!(f.efficiency_factor(), 1.0);
    }

    #[test]
    fn test_default_trigger_requires_oil() {
        let f = fact(0.0, 12.0, 3.0, 30.0);
        assert_eq!(ProductionTrigger::default(), ProductionTrigger::OilOnly);
        assert!(!f.is_producing(ProductionTrigger::default()));
    }

    #[test]
    fn test_trigger_deserializes_snake_case() {
        #[derive(Deserialize)]
        struct Holder {
            trigger: ProductionTrigger,
        }
        let h: Holder = toml::from_str("trigger = \"any_phase\"").expect("should parse");
        assert_eq!(h.trigger, ProductionTrigger::AnyPhase);
    }
}
