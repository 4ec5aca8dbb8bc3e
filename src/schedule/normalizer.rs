//! Timeline normalizer: raw report rows to per-well monthly facts.
//!
//! Every date is floored to the first of its month. Wells are resolved
//! through the cross-reference table and restricted to one field; facts
//! carry model well names.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::config::CompilerConfig;
use crate::error::{CompileError, Result};
use crate::ingest::{Column, RawRow, RawTable, WellTable};
use crate::types::{ManualOpFact, PerforationFact, Period, ProductionFact};

/// Perforation facts plus the field wells that had none.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerforationSet {
    pub facts: Vec<PerforationFact>,
    /// Model names of cross-reference rows without a perforation record
    pub unmatched: Vec<String>,
}

/// Normalizes the raw tables of one field.
pub struct Normalizer<'a> {
    config: &'a CompilerConfig,
    wells: &'a WellTable,
    field: &'a str,
}

impl<'a> Normalizer<'a> {
    pub const fn new(config: &'a CompilerConfig, wells: &'a WellTable, field: &'a str) -> Self {
        Self {
            config,
            wells,
            field,
        }
    }

    fn date_format(&self) -> &str {
        &self.config.schedule.date_format
    }

    // ========================================================================
    // Production
    // ========================================================================

    /// Monthly production facts of the field, in table row order.
    ///
    /// Dates and numbers are parsed for every row, so a malformed cell fails
    /// the run even when its well belongs to another field.
    pub fn production(&self, table: &RawTable) -> Result<Vec<ProductionFact>> {
        let cols = &self.config.columns.production;
        let well_col = table.column(&cols.well)?;
        let date_col = table.column(&cols.date)?;
        let oil_col = table.column(&cols.oil)?;
        let water_col = table.column(&cols.water)?;
        let gas_col = table.column(&cols.gas)?;
        let inj_col = table.column(&cols.injection)?;
        let days_col = table.column(&cols.days)?;
        let bhp_col = table.column(&cols.bhp)?;
        let thp_col = table.column(&cols.thp)?;

        let mut facts = Vec::new();
        let mut other_field = 0usize;
        let mut skipped = 0usize;

        for row in table.rows() {
            let well = table.cell(row, &well_col);
            let date = table.date(row, &date_col, self.date_format())?;
            let oil = self.volume(table, row, &oil_col, well)?;
            let water = self.volume(table, row, &water_col, well)?;
            let gas = self.volume(table, row, &gas_col, well)?;
            let injection = self.volume(table, row, &inj_col, well)?;
            let days = table.number(row, &days_col)?.unwrap_or(0.0);
            let bhp = table.number(row, &bhp_col)?;
            let thp = table.number(row, &thp_col)?;

            if !self.wells.model_in_field(well, self.field) {
                other_field += 1;
                continue;
            }

            let Some(date) = date else {
                warn!(
                    well,
                    file = table.source_of(row),
                    line = row.line,
                    "Production row without a date skipped"
                );
                skipped += 1;
                continue;
            };

            if days <= 0.0 {
                if oil + water + gas + injection > 0.0 {
                    warn!(
                        well,
                        date = %date,
                        days,
                        "Production row reports volumes without days on production, skipped"
                    );
                }
                skipped += 1;
                continue;
            }

            let period = Period::containing(date);
            facts.push(ProductionFact {
                well: well.to_string(),
                period,
                oil_rate: oil / days,
                water_rate: water / days,
                gas_rate: gas / days,
                injection_rate: injection / days,
                days_on_production: days,
                month_length: period.days(),
                bhp,
                thp,
            });
        }

        info!(
            field = self.field,
            facts = facts.len(),
            other_field,
            skipped,
            "Normalized production history"
        );
        Ok(facts)
    }

    /// Volume cell: empty counts as zero, negative is clamped to zero.
    fn volume(&self, table: &RawTable, row: &RawRow, column: &Column, well: &str) -> Result<f64> {
        let value = table.number(row, column)?.unwrap_or(0.0);
        if value < 0.0 {
            warn!(
                well,
                column = %column.name,
                value,
                file = table.source_of(row),
                line = row.line,
                "Negative volume clamped to zero"
            );
            return Ok(0.0);
        }
        Ok(value)
    }

    // ========================================================================
    // Perforations
    // ========================================================================

    /// Perforation facts of the field.
    ///
    /// Exact duplicate rows are dropped first. Facts follow cross-reference
    /// order, then table order within a well; each cross-reference row of the
    /// field without any perforation row is reported in `unmatched`.
    pub fn perforations(&self, table: &mut RawTable) -> Result<PerforationSet> {
        let removed = table.dedup_rows();
        if removed > 0 {
            info!(removed, "Dropped duplicate perforation rows");
        }
        let table = &*table;

        let cols = &self.config.columns.perforation;
        let well_col = table.column(&cols.well)?;
        let date_col = table.column(&cols.date)?;
        let type_col = table.column(&cols.completion_type)?;
        let top_col = table.column(&cols.md_top)?;
        let bottom_col = table.column(&cols.md_bottom)?;

        let mut by_report_name: HashMap<&str, Vec<&RawRow>> = HashMap::new();
        for row in table.rows() {
            by_report_name
                .entry(table.cell(row, &well_col))
                .or_default()
                .push(row);
        }

        let completion = &self.config.completion;
        let mut set = PerforationSet::default();

        for well_ref in self.wells.field_rows(self.field) {
            let Some(rows) = by_report_name.get(well_ref.report_name.as_str()) else {
                set.unmatched.push(well_ref.model_name.clone());
                continue;
            };

            for row in rows {
                let Some(date) = table.date(row, &date_col, self.date_format())? else {
                    warn!(
                        well = %well_ref.model_name,
                        file = table.source_of(row),
                        line = row.line,
                        "Perforation row without a date skipped"
                    );
                    continue;
                };
                let md_top = Self::depth(table, row, &top_col)?;
                let md_bottom = Self::depth(table, row, &bottom_col)?;
                let kind = table.cell(row, &type_col);
                let open = kind.is_empty() || kind.contains(completion.open_marker.as_str());

                set.facts.push(PerforationFact {
                    well: well_ref.model_name.clone(),
                    period: Period::containing(date),
                    md_top,
                    md_bottom,
                    open,
                });
            }
        }

        info!(
            field = self.field,
            facts = set.facts.len(),
            unmatched = set.unmatched.len(),
            "Normalized perforation history"
        );
        Ok(set)
    }

    fn depth(table: &RawTable, row: &RawRow, column: &Column) -> Result<f64> {
        table
            .number(row, column)?
            .ok_or_else(|| table.format_error(row, column, "", "measured depth is empty"))
    }

    // ========================================================================
    // Manual operations
    // ========================================================================

    /// Manual operator commands of the field, in table row order.
    pub fn manual_ops(&self, table: &RawTable) -> Result<Vec<ManualOpFact>> {
        let cols = &self.config.columns.manual_ops;
        let date_col = table.column(&cols.date)?;
        let keyword_col = table.column(&cols.keyword)?;
        let args_col = table.column(&cols.args)?;
        let field_col = table.column(&cols.field)?;
        let well_col = cols
            .well
            .as_deref()
            .map(|name| table.column(name))
            .transpose()?;

        let mut ops = Vec::new();
        for row in table.rows() {
            let date = table.date(row, &date_col, self.date_format())?;
            if table.cell(row, &field_col) != self.field {
                continue;
            }
            let Some(date) = date else {
                warn!(
                    file = table.source_of(row),
                    line = row.line,
                    "Manual operation without a date skipped"
                );
                continue;
            };

            let keyword = table.cell(row, &keyword_col);
            if keyword.is_empty() {
                return Err(table.format_error(row, &keyword_col, keyword, "keyword is empty"));
            }

            let well = well_col
                .as_ref()
                .map(|col| table.cell(row, col))
                .filter(|w| !w.is_empty())
                .map(str::to_string);
            if let Some(well) = well.as_deref() {
                if !self.wells.model_in_field(well, self.field) {
                    warn!(
                        file = table.source_of(row),
                        line = row.line,
                        well,
                        field = self.field,
                        "Manual operation for a well outside the field skipped"
                    );
                    continue;
                }
            }

            ops.push(ManualOpFact {
                well,
                period: Period::containing(date),
                keyword: keyword.to_string(),
                args: table.raw_cell(row, &args_col).to_string(),
            });
        }

        debug!(field = self.field, ops = ops.len(), "Normalized manual operations");
        Ok(ops)
    }
}

/// Fail when more field wells lack perforations than `limit` tolerates.
pub fn check_references(unmatched: &[String], limit: usize) -> Result<()> {
    if unmatched.len() > limit {
        return Err(CompileError::Reference {
            wells: unmatched.to_vec(),
            limit,
        });
    }
    if !unmatched.is_empty() {
        warn!(
            wells = %unmatched.join(", "),
            limit,
            "Wells without perforation records tolerated"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TableFile;
    use crate::ingest::WellRef;
    use chrono::NaiveDate;

    fn table(text: &str, delimiter: &str) -> RawTable {
        let file = TableFile::new("mem.csv", "utf-8", delimiter);
        RawTable::from_bytes(text.as_bytes(), &file).expect("table should parse")
    }

    fn wells() -> WellTable {
        let row = |model: &str, report: &str, field: &str| WellRef {
            model_name: model.to_string(),
            report_name: report.to_string(),
            field: field.to_string(),
            pad: None,
        };
        WellTable::from_rows(vec![
            row("P1", "101", "North"),
            row("P2", "102", "North"),
            row("S1", "201", "South"),
        ])
    }

    fn period(y: i32, m: u32) -> Period {
        Period::containing(NaiveDate::from_ymd_opt(y, m, 1).expect("valid date"))
    }

    const PROD_HEADER: &str = "*WELL,DATE,OIL,WATER,GAS,WINJ,DAYS,BHP,THP\n";

    #[test]
    fn test_production_rates_are_volume_per_day() {
        let t = table(
            &format!("{PROD_HEADER}P1,01.04.2021,100,0,50,0,20,,\n"),
            ",",
        );
        let config = CompilerConfig::default();
        let wells = wells();
        let facts = Normalizer::new(&config, &wells, "North")
            .production(&t)
            .expect("production should normalize");
        assert_eq!(facts.len(), 1);
        let f = &facts[0];
        assert_eq!(f.period, period(2021, 4));
        assert_eq!(f.month_length, 30);
        assert_eq!((f.oil_rate, f.water_rate, f.gas_rate), (5.0, 0.0, 2.5));
        assert_eq!(f.bhp, None);
    }

    #[test]
    fn test_production_filters_field_and_floors_dates() {
        let t = table(
            &format!(
                "{PROD_HEADER}S1,01.04.2021,100,0,0,0,30,,\n\
                 P2,17.02.2020,10,5,0,0,10,120,15\n\
                 GHOST,01.04.2021,1,0,0,0,30,,\n"
            ),
            ",",
        );
        let config = CompilerConfig::default();
        let wells = wells();
        let facts = Normalizer::new(&config, &wells, "North")
            .production(&t)
            .expect("production should normalize");
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].well, "P2");
        assert_eq!(facts[0].period, period(2020, 2));
        assert_eq!(facts[0].month_length, 29);
        assert_eq!(facts[0].bhp, Some(120.0));
    }

    #[test]
    fn test_production_skips_zero_days_and_clamps_negative_volume() {
        let t = table(
            &format!(
                "{PROD_HEADER}P1,01.04.2021,100,0,0,0,0,,\n\
                 P1,01.05.2021,-31,62,0,0,31,,\n"
            ),
            ",",
        );
        let config = CompilerConfig::default();
        let wells = wells();
        let facts = Normalizer::new(&config, &wells, "North")
            .production(&t)
            .expect("production should normalize");
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].oil_rate, 0.0);
        assert_eq!(facts[0].water_rate, 2.0);
    }

    #[test]
    fn test_production_bad_date_is_format_error() {
        let t = table(&format!("{PROD_HEADER}S1,2021-04-01,1,0,0,0,30,,\n"), ",");
        let config = CompilerConfig::default();
        let wells = wells();
        let err = Normalizer::new(&config, &wells, "North")
            .production(&t)
            .expect_err("ISO date does not match %d.%m.%Y");
        assert!(matches!(err, CompileError::Format { line: 2, .. }));
    }

    const PERF_HEADER: &str = "Скважина;Дата;Тип перфорации;\
        Глубина начала интервала перфорации(md), м;\
        Глубина конца интервала перфорации(md), м\n";

    #[test]
    fn test_perforations_status_dedup_and_order() {
        let mut t = table(
            &format!(
                "{PERF_HEADER}102;15.03.2020;ПЕРФ;2500;2510\n\
                 101;20.01.2020;;2400;2405\n\
                 101;03.06.2020;Цементный мост;2400;2405\n\
                 102;15.03.2020;ПЕРФ;2500;2510\n\
                 201;01.01.2020;ПЕРФ;1000;1001\n"
            ),
            ";",
        );
        let config = CompilerConfig::default();
        let wells = wells();
        let set = Normalizer::new(&config, &wells, "North")
            .perforations(&mut t)
            .expect("perforations should normalize");
        assert!(set.unmatched.is_empty());
        let summary: Vec<(&str, Period, bool)> = set
            .facts
            .iter()
            .map(|f| (f.well.as_str(), f.period, f.open))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("P1", period(2020, 1), true),
                ("P1", period(2020, 6), false),
                ("P2", period(2020, 3), true),
            ]
        );
        assert_eq!(set.facts[0].md_top, 2400.0);
        assert_eq!(set.facts[0].md_bottom, 2405.0);
    }

    #[test]
    fn test_perforations_report_unmatched_wells() {
        let mut t = table(&format!("{PERF_HEADER}101;20.01.2020;;2400;2405\n"), ";");
        let config = CompilerConfig::default();
        let wells = wells();
        let set = Normalizer::new(&config, &wells, "North")
            .perforations(&mut t)
            .expect("perforations should normalize");
        assert_eq!(set.unmatched, vec!["P2".to_string()]);
    }

    #[test]
    fn test_reference_check_limit() {
        let one = vec!["P2".to_string()];
        let two = vec!["P2".to_string(), "P3".to_string()];
        assert!(check_references(&one, 1).is_ok());
        let err = check_references(&two, 1).expect_err("two unmatched exceed limit");
        assert!(matches!(err, CompileError::Reference { ref wells, limit: 1 } if wells.len() == 2));
        assert!(check_references(&one, 0).is_err());
    }

    #[test]
    fn test_manual_ops_keep_args_verbatim() {
        let t = table(
            "Дата,Ключевое слово,Аргумент,Месторождение\n\
             05.07.2020,WELOPEN,\"'P1' SHUT  / \",North\n\
             05.07.2020,WELOPEN,'S1' SHUT /,South\n",
            ",",
        );
        let config = CompilerConfig::default();
        let wells = wells();
        let ops = Normalizer::new(&config, &wells, "North")
            .manual_ops(&t)
            .expect("manual ops should normalize");
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].period, period(2020, 7));
        assert_eq!(ops[0].keyword, "WELOPEN");
        assert_eq!(ops[0].args, "'P1' SHUT  / ");
        assert_eq!(ops[0].well, None);
    }

    #[test]
    fn test_manual_ops_scoped_to_field_wells() {
        let t = table(
            "Дата,Ключевое слово,Аргумент,Месторождение,Скважина\n\
             05.07.2020,WELOPEN,'P1' SHUT /,North,P1\n\
             05.07.2020,WELOPEN,'S1' SHUT /,North,S1\n\
             06.07.2020,GRUPTREE,'G1' 'FIELD' /,North,\n",
            ",",
        );
        let mut config = CompilerConfig::default();
        config.columns.manual_ops.well = Some("Скважина".to_string());
        let wells = wells();
        let ops = Normalizer::new(&config, &wells, "North")
            .manual_ops(&t)
            .expect("manual ops should normalize");
        let scoped: Vec<(Option<&str>, &str)> = ops
            .iter()
            .map(|o| (o.well.as_deref(), o.keyword.as_str()))
            .collect();
        assert_eq!(scoped, vec![(Some("P1"), "WELOPEN"), (None, "GRUPTREE")]);
    }
}
