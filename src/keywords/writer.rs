//! Keyword emitter: renders records to SCHEDULE text and appends them to a
//! single owned sink.
//!
//! Layout of a table keyword:
//!
//! ```text
//! WCONHIST
//! P-1 OPEN LRAT 5.0 0.0 2.5 * * * * * * /
//! /
//!
//! ```
//!
//! `WELLTRACK` writes one `X Y Z MD` line per station and a single closing
//! slash; verbatim records write their argument text as given.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{self, Write};

use chrono::{Datelike, Timelike};

use super::{
    CompletionInterval, DateStamp, EfficiencyFactor, InjectionControl, ProductionControl, Record,
    TableKeyword, ToToken, WellSpec, WellTrack, MONTH_CODES,
};

/// Per-keyword record counts of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmitStats {
    pub records: usize,
    pub by_keyword: BTreeMap<String, usize>,
}

impl EmitStats {
    pub fn count(&self, keyword: &str) -> usize {
        self.by_keyword.get(keyword).copied().unwrap_or(0)
    }
}

impl fmt::Display for EmitStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} records", self.records)?;
        for (keyword, count) in &self.by_keyword {
            write!(f, ", {keyword}={count}")?;
        }
        Ok(())
    }
}

/// Exclusive writer of one schedule artifact.
///
/// Records are written in call order; nothing is reordered or buffered
/// beyond what the sink itself does.
pub struct KeywordWriter<W: Write> {
    sink: W,
    stats: EmitStats,
}

impl<W: Write> KeywordWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            stats: EmitStats::default(),
        }
    }

    pub fn emit(&mut self, record: &Record) -> io::Result<()> {
        self.sink.write_all(record.to_string().as_bytes())?;
        self.stats.records += 1;
        *self
            .stats
            .by_keyword
            .entry(record.keyword().to_string())
            .or_insert(0) += 1;
        Ok(())
    }

    pub fn emit_all<'r>(&mut self, records: impl IntoIterator<Item = &'r Record>) -> io::Result<()> {
        for record in records {
            self.emit(record)?;
        }
        Ok(())
    }

    pub const fn stats(&self) -> &EmitStats {
        &self.stats
    }

    /// Flush the sink and hand it back with the run's counts.
    pub fn finish(mut self) -> io::Result<(W, EmitStats)> {
        self.sink.flush()?;
        Ok((self.sink, self.stats))
    }
}

// ============================================================================
// Rendering
// ============================================================================

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WellSpec(r) => write_table::<WellSpec>(f, r),
            Self::Production(r) => write_table::<ProductionControl>(f, r),
            Self::Injection(r) => write_table::<InjectionControl>(f, r),
            Self::Efficiency(r) => write_table::<EfficiencyFactor>(f, r),
            Self::Completion(r) => write_table::<CompletionInterval>(f, r),
            Self::Dates(r) => write_dates(f, r),
            Self::WellTrack(r) => write_track(f, r),
            Self::Verbatim { keyword, args } => write!(f, "{keyword}\n{args}\n/\n\n"),
        }
    }
}

fn write_table<K: TableKeyword>(f: &mut fmt::Formatter<'_>, record: &K) -> fmt::Result {
    let mut line = String::new();
    for token in record.tokens() {
        line.push_str(&token);
        line.push(' ');
    }
    write!(f, "{}\n{line}/\n/\n\n", K::NAME)
}

fn write_dates(f: &mut fmt::Formatter<'_>, stamp: &DateStamp) -> fmt::Result {
    let month = MONTH_CODES[stamp.date.month0() as usize];
    write!(
        f,
        "{}\n{:02} {month} {} ",
        DateStamp::NAME,
        stamp.date.day(),
        stamp.date.year()
    )?;
    if let Some(time) = stamp.time {
        write!(
            f,
            "{:02}:{:02}:{:02} ",
            time.hour(),
            time.minute(),
            time.second()
        )?;
    }
    f.write_str("/\n/\n\n")
}

fn write_track(f: &mut fmt::Formatter<'_>, track: &WellTrack) -> fmt::Result {
    writeln!(f, "{} {}", WellTrack::NAME, track.well)?;
    for p in &track.points {
        writeln!(
            f,
            "{} {} {} {} ",
            p.x.to_token(),
            p.y.to_token(),
            p.z.to_token(),
            p.md.to_token()
        )?;
    }
    write!(f, "/\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keywords::{Numeric, ProductionMode, Status, WellTarget, WILDCARD};
    use crate::types::TrajectoryPoint;
    use chrono::{NaiveDate, NaiveTime};

    fn render(record: &Record) -> String {
        let mut writer = KeywordWriter::new(Vec::new());
        writer.emit(record).expect("in-memory write");
        let (bytes, _) = writer.finish().expect("in-memory flush");
        String::from_utf8(bytes).expect("utf-8 output")
    }

    #[test]
    fn test_production_control_layout() {
        let record = Record::Production(ProductionControl {
            well: WellTarget::named("P-1"),
            status: Status::Open,
            mode: ProductionMode::Lrat,
            oil_rate: Some(5.0),
            water_rate: Some(0.0),
            gas_rate: Some(2.5),
            ..ProductionControl::reset()
        });
        assert_eq!(
            render(&record),
            "WCONHIST\nP-1 OPEN LRAT 5.0 0.0 2.5 * * * * * * /\n/\n\n"
        );
    }

    #[test]
    fn test_reset_layouts() {
        assert_eq!(
            render(&Record::Production(ProductionControl::reset())),
            "WCONHIST\n* SHUT LRAT * * * * * * * * * /\n/\n\n"
        );
        assert_eq!(
            render(&Record::Injection(InjectionControl::reset())),
            "WCONINJH\n* WATER SHUT * * * * * * * * RATE /\n/\n\n"
        );
        assert_eq!(
            render(&Record::Efficiency(EfficiencyFactor::reset())),
            "WEFAC\n* 1 * /\n/\n\n"
        );
    }

    #[test]
    fn test_dates_layout_with_and_without_time() {
        let date = NaiveDate::from_ymd_opt(2019, 7, 1).expect("valid date");
        assert_eq!(
            render(&Record::Dates(DateStamp::on(date))),
            "DATES\n01 JLY 2019 /\n/\n\n"
        );
        let stamp = DateStamp {
            date,
            time: NaiveTime::from_hms_opt(6, 5, 0),
        };
        assert_eq!(
            render(&Record::Dates(stamp)),
            "DATES\n01 JLY 2019 06:05:00 /\n/\n\n"
        );
    }

    #[test]
    fn test_welltrack_layout_is_x_y_z_md() {
        let record = Record::WellTrack(WellTrack {
            well: "P-1".to_string(),
            points: vec![
                TrajectoryPoint { x: 0.0, y: 0.0, md: 0.0, z: 0.0 },
                TrajectoryPoint { x: 10.0, y: 10.0, md: 50.0, z: 45.0 },
            ],
        });
        assert_eq!(
            render(&record),
            "WELLTRACK P-1\n0.0 0.0 0.0 0.0 \n10.0 10.0 45.0 50.0 \n/\n\n"
        );
    }

    #[test]
    fn test_verbatim_is_written_unmodified() {
        let record = Record::Verbatim {
            keyword: "WELOPEN".to_string(),
            args: "'P-1' SHUT / -- no escaping".to_string(),
        };
        assert_eq!(render(&record), "WELOPEN\n'P-1' SHUT / -- no escaping\n/\n\n");
    }

    #[test]
    fn test_completion_layout() {
        let record = Record::Completion(CompletionInterval {
            md_top: Some(2510.0),
            md_bottom: Some(2516.5),
            depth_type: Some(crate::keywords::DepthType::Md),
            status: Some(Status::Open),
            diameter: Some(Numeric::Real(0.16)),
            skin: Some(Numeric::Int(0)),
            multiplier: Some(Numeric::Int(1)),
            ..CompletionInterval::new("P-1")
        });
        assert_eq!(
            render(&record),
            "COMPDATMD\nP-1 * 2510.0 2516.5 MD OPEN * * 0.16 * 0 * 1 * /\n/\n\n"
        );
    }

    #[test]
    fn test_all_unset_items_render_as_wildcards() {
        let text = render(&Record::Completion(CompletionInterval::new("P-1")));
        let item_line = text.lines().nth(1).expect("item line");
        let items: Vec<&str> = item_line.split_whitespace().collect();
        assert_eq!(items.last(), Some(&"/"));
        assert!(items[1..items.len() - 1].iter().all(|t| *t == WILDCARD));
    }

    #[test]
    fn test_stats_count_by_keyword_in_order() {
        let mut writer = KeywordWriter::new(Vec::new());
        writer
            .emit_all(&[
                Record::Production(ProductionControl::reset()),
                Record::Injection(InjectionControl::reset()),
                Record::Efficiency(EfficiencyFactor::reset()),
                Record::Efficiency(EfficiencyFactor::reset()),
            ])
            .expect("in-memory write");
        let (bytes, stats) = writer.finish().expect("in-memory flush");
        assert_eq!(stats.records, 4);
        assert_eq!(stats.count("WEFAC"), 2);
        assert_eq!(stats.count("DATES"), 0);
        let text = String::from_utf8(bytes).expect("utf-8 output");
        assert!(text.find("WCONHIST").expect("present") < text.find("WCONINJH").expect("present"));
    }
}
