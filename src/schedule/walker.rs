//! Timeline walker: the per-period scheduling state machine.
//!
//! The first period of a run is special. The simulation start date already
//! stands for it, so it gets no `DATES` and no resets, but it carries every
//! completion that happened before the run started. From the second period
//! on, each period opens with its `DATES` record followed by three wildcard
//! resets that shut all wells, so nothing carries over from the previous
//! month unless it is asserted again.
//!
//! Record order within a period:
//!
//! 1. pre-start completions (initial period only)
//! 2. `DATES` + `WCONHIST`/`WCONINJH`/`WEFAC` resets (steady periods only)
//! 3. completions of the period
//! 4. per production fact: `WCONINJH`, `WCONHIST`, `WEFAC`
//! 5. manual operations, verbatim

use std::io::{self, Write};

use tracing::{debug, info};

use super::Timeline;
use crate::config::{CompilerConfig, CompletionConfig};
use crate::keywords::{
    CompletionInterval, DateStamp, EfficiencyFactor, InjectedFluid, InjectionControl,
    InjectionMode, KeywordWriter, Numeric, ProductionControl, ProductionMode, Record, Status,
    WellTarget,
};
use crate::types::{ManualOpFact, PerforationFact, Period, ProductionFact, ProductionTrigger};

/// Walker position: before or after the first emitted period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkState {
    Initial,
    Steady,
}

/// Periods walked and the date span they covered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    pub periods: usize,
    pub first: Option<Period>,
    pub last: Option<Period>,
}

/// Walks a [`Timeline`] period by period, producing records in schedule order.
pub struct TimelineWalker<'a> {
    timeline: &'a Timeline,
    completion: &'a CompletionConfig,
    trigger: ProductionTrigger,
    state: WalkState,
}

impl<'a> TimelineWalker<'a> {
    pub const fn new(timeline: &'a Timeline, config: &'a CompilerConfig) -> Self {
        Self {
            timeline,
            completion: &config.completion,
            trigger: config.schedule.production_trigger,
            state: WalkState::Initial,
        }
    }

    pub const fn state(&self) -> WalkState {
        self.state
    }

    /// Records of `period` for the current state. Does not advance the walker.
    pub fn records_for_period(&self, period: Period) -> Vec<Record> {
        let mut records = Vec::new();

        match self.state {
            WalkState::Initial => {
                records.extend(
                    self.timeline
                        .perforations()
                        .before(period)
                        .map(|f| self.completion_record(f)),
                );
            }
            WalkState::Steady => {
                records.push(Record::Dates(DateStamp::on(period.start())));
                records.push(Record::Production(ProductionControl::reset()));
                records.push(Record::Injection(InjectionControl::reset()));
                records.push(Record::Efficiency(EfficiencyFactor::reset()));
            }
        }

        records.extend(
            self.timeline
                .perforations()
                .in_period(period)
                .map(|f| self.completion_record(f)),
        );

        for fact in self.timeline.production().in_period(period) {
            self.production_records(fact, &mut records);
        }

        records.extend(self.timeline.manual_ops().in_period(period).map(verbatim));

        records
    }

    /// Records of `period`, then move to the steady state.
    pub fn step(&mut self, period: Period) -> Vec<Record> {
        let records = self.records_for_period(period);
        self.state = WalkState::Steady;
        records
    }

    /// Walk `periods` in order, writing every record to `writer`.
    pub fn walk<W: Write>(
        &mut self,
        periods: impl IntoIterator<Item = Period>,
        writer: &mut KeywordWriter<W>,
    ) -> io::Result<WalkSummary> {
        let mut summary = WalkSummary::default();

        for period in periods {
            let records = self.step(period);
            writer.emit_all(&records)?;
            debug!(period = %period, records = records.len(), "Compiled period");

            summary.periods += 1;
            if summary.first.is_none() {
                summary.first = Some(period);
            }
            summary.last = Some(period);
        }

        info!(
            periods = summary.periods,
            stats = %writer.stats(),
            "Timeline walk complete"
        );
        Ok(summary)
    }

    fn completion_record(&self, fact: &PerforationFact) -> Record {
        let c = self.completion;
        Record::Completion(CompletionInterval {
            md_top: Some(fact.md_top),
            md_bottom: Some(fact.md_bottom),
            depth_type: Some(c.depth_type),
            status: Some(if fact.open { Status::Open } else { Status::Shut }),
            diameter: Some(c.well_diameter),
            skin: Some(c.skin),
            multiplier: Some(c.connection_factor_multiplier),
            ..CompletionInterval::new(fact.well.as_str())
        })
    }

    fn production_records(&self, fact: &ProductionFact, records: &mut Vec<Record>) {
        let bhp = fact.bhp.filter(|p| *p > 0.0);
        let thp = fact.thp.filter(|p| *p > 0.0);
        let mut on_stream = false;

        if fact.is_injecting() {
            on_stream = true;
            records.push(Record::Injection(InjectionControl {
                well: WellTarget::named(fact.well.as_str()),
                fluid: InjectedFluid::Water,
                status: Status::Open,
                rate: Some(fact.injection_rate),
                bhp,
                thp,
                mode: Some(InjectionMode::Rate),
                ..InjectionControl::reset()
            }));
        }

        if fact.is_producing(self.trigger) {
            on_stream = true;
            records.push(Record::Production(ProductionControl {
                well: WellTarget::named(fact.well.as_str()),
                status: Status::Open,
                mode: ProductionMode::Lrat,
                oil_rate: Some(fact.oil_rate),
                water_rate: Some(fact.water_rate),
                gas_rate: Some(fact.gas_rate),
                thp,
                bhp,
                ..ProductionControl::reset()
            }));
        }

        if on_stream {
            records.push(Record::Efficiency(EfficiencyFactor {
                well: WellTarget::named(fact.well.as_str()),
                factor: Numeric::Real(fact.efficiency_factor()),
                network: None,
            }));
        }
    }
}

fn verbatim(op: &ManualOpFact) -> Record {
    Record::Verbatim {
        keyword: op.keyword.clone(),
        args: op.args.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keywords::{ToToken, WILDCARD};
    use crate::types::PeriodRange;
    use chrono::NaiveDate;

    fn period(y: i32, m: u32) -> Period {
        Period::containing(NaiveDate::from_ymd_opt(y, m, 1).expect("valid date"))
    }

    fn production(well: &str, p: Period, oil: f64, water: f64, inj: f64, days: f64) -> ProductionFact {
        ProductionFact {
            well: well.to_string(),
            period: p,
            oil_rate: oil,
            water_rate: water,
            gas_rate: 0.0,
            injection_rate: inj,
            days_on_production: days,
            month_length: p.days(),
            bhp: Some(0.0),
            thp: None,
        }
    }

    fn perforation(well: &str, p: Period) -> PerforationFact {
        PerforationFact {
            well: well.to_string(),
            period: p,
            md_top: 2400.0,
            md_bottom: 2410.0,
            open: true,
        }
    }

    fn keywords(records: &[Record]) -> Vec<&str> {
        records.iter().map(Record::keyword).collect()
    }

    fn timeline() -> Timeline {
        Timeline::new(
            vec![
                production("P1", period(2020, 1), 5.0, 1.0, 0.0, 31.0),
                production("I1", period(2020, 2), 0.0, 0.0, 100.0, 14.5),
                production("P1", period(2020, 2), 4.0, 1.0, 0.0, 29.0),
            ],
            vec![
                perforation("P1", period(2019, 6)),
                perforation("I1", period(2018, 2)),
                perforation("I1", period(2020, 2)),
            ],
            vec![ManualOpFact {
                well: None,
                period: period(2020, 2),
                keyword: "WELOPEN".to_string(),
                args: "'P1' SHUT /".to_string(),
            }],
        )
    }

    #[test]
    fn test_initial_period_has_no_dates_or_resets() {
        let timeline = timeline();
        let config = CompilerConfig::default();
        let mut walker = TimelineWalker::new(&timeline, &config);
        let records = walker.step(period(2020, 1));
        assert_eq!(
            keywords(&records),
            vec!["COMPDATMD", "COMPDATMD", "WCONHIST", "WEFAC"]
        );
        assert!(records.iter().all(|r| !r.is_reset()));
        assert_eq!(walker.state(), WalkState::Steady);
    }

    #[test]
    fn test_pre_start_completions_keep_table_order() {
        let timeline = timeline();
        let config = CompilerConfig::default();
        let walker = TimelineWalker::new(&timeline, &config);
        let records = walker.records_for_period(period(2020, 1));
        let wells: Vec<String> = records
            .iter()
            .filter_map(|r| match r {
                Record::Completion(c) => Some(c.well.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(wells, vec!["P1", "I1"]);
    }

    #[test]
    fn test_steady_period_order() {
        let timeline = timeline();
        let config = CompilerConfig::default();
        let mut walker = TimelineWalker::new(&timeline, &config);
        walker.step(period(2020, 1));
        let records = walker.step(period(2020, 2));
        assert_eq!(
            keywords(&records),
            vec![
                "DATES", "WCONHIST", "WCONINJH", "WEFAC", "COMPDATMD", "WCONINJH", "WEFAC",
                "WCONHIST", "WEFAC", "WELOPEN"
            ]
        );
        assert_eq!(records[1..4].iter().filter(|r| r.is_reset()).count(), 3);
        assert!(records[4..].iter().all(|r| !r.is_reset()));
    }

    #[test]
    fn test_pre_start_completions_emitted_once() {
        let timeline = timeline();
        let config = CompilerConfig::default();
        let mut walker = TimelineWalker::new(&timeline, &config);
        let mut completions = 0;
        for p in PeriodRange::new(period(2020, 1).start(), period(2020, 3).start()) {
            completions += walker
                .step(p)
                .iter()
                .filter(|r| r.keyword() == "COMPDATMD")
                .count();
        }
        assert_eq!(completions, 3);
    }

    #[test]
    fn test_injection_record_wildcards_non_positive_pressure() {
        let timeline = timeline();
        let config = CompilerConfig::default();
        let mut walker = TimelineWalker::new(&timeline, &config);
        walker.step(period(2020, 1));
        let records = walker.step(period(2020, 2));
        let Record::Injection(inj) = &records[5] else {
            panic!("expected WCONINJH, got {}", records[5].keyword());
        };
        assert_eq!(inj.well, WellTarget::named("I1"));
        assert_eq!(inj.status, Status::Open);
        assert_eq!(inj.rate, Some(100.0));
        assert_eq!(inj.bhp.to_token(), WILDCARD);
        assert_eq!(inj.mode, Some(InjectionMode::Rate));
        let Record::Efficiency(eff) = &records[6] else {
            panic!("expected WEFAC");
        };
        assert_eq!(eff.factor, Numeric::Real(0.5));
    }

    #[test]
    fn test_default_trigger_skips_water_only_producer() {
        let timeline = Timeline::new(
            vec![production("W1", period(2020, 1), 0.0, 8.0, 0.0, 31.0)],
            Vec::new(),
            Vec::new(),
        );
        let mut config = CompilerConfig::default();
        let oil_only = TimelineWalker::new(&timeline, &config).records_for_period(period(2020, 1));
        assert!(oil_only.is_empty());

        config.schedule.production_trigger = ProductionTrigger::AnyPhase;
        let any_phase = TimelineWalker::new(&timeline, &config).records_for_period(period(2020, 1));
        assert_eq!(keywords(&any_phase), vec!["WCONHIST", "WEFAC"]);
    }

    #[test]
    fn test_walk_writes_and_summarizes() {
        let timeline = timeline();
        let config = CompilerConfig::default();
        let mut walker = TimelineWalker::new(&timeline, &config);
        let mut writer = KeywordWriter::new(Vec::new());
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).expect("valid date");
        let end = NaiveDate::from_ymd_opt(2020, 3, 1).expect("valid date");
        let summary = walker
            .walk(PeriodRange::new(start, end), &mut writer)
            .expect("in-memory walk");
        assert_eq!(summary.periods, 3);
        assert_eq!(summary.first, Some(period(2020, 1)));
        assert_eq!(summary.last, Some(period(2020, 3)));
        let (_, stats) = writer.finish().expect("in-memory flush");
        assert_eq!(stats.count("DATES"), 2);
        assert_eq!(stats.count("WELOPEN"), 1);
    }
}
