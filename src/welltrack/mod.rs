//! Trajectory compiler
//!
//! Writes a `WELSPECS` + `WELLTRACK` pair for every well of a field, in
//! cross-reference order. Survey stations come from one or more trajectory
//! exports; a station repeated under the same well and measured depth (the
//! same well present in two exports) is kept once.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::CompilerConfig;
use crate::error::{CompileError, Result};
use crate::ingest::{Column, RawRow, RawTable, WellTable};
use crate::keywords::{EmitStats, KeywordWriter, Record, WellSpec, WellTrack};
use crate::types::TrajectoryPoint;

/// Minimum number of stations of a usable well path.
pub const MIN_TRACK_POINTS: usize = 2;

/// Outcome of a successful trajectory compilation.
#[derive(Debug, Clone)]
pub struct WelltrackSummary {
    pub output: PathBuf,
    pub wells: usize,
    pub stats: EmitStats,
}

/// Well paths of `field`, one `(WELSPECS, WELLTRACK)` pair per model well.
///
/// Fails with [`CompileError::Integrity`] on the first well with fewer than
/// [`MIN_TRACK_POINTS`] stations.
pub fn collect_tracks(
    config: &CompilerConfig,
    wells: &WellTable,
    trajectories: &RawTable,
    field: &str,
) -> Result<Vec<(WellSpec, WellTrack)>> {
    let cols = &config.columns.trajectory;
    let well_col = trajectories.column(&cols.well)?;
    let x_col = trajectories.column(&cols.x)?;
    let y_col = trajectories.column(&cols.y)?;
    let md_col = trajectories.column(&cols.md)?;
    let z_col = trajectories.column(&cols.z)?;

    let mut by_report_name: HashMap<&str, Vec<&RawRow>> = HashMap::new();
    for row in trajectories.rows() {
        by_report_name
            .entry(trajectories.cell(row, &well_col))
            .or_default()
            .push(row);
    }

    let number = |row: &RawRow, col: &Column| -> Result<f64> {
        trajectories
            .number(row, col)?
            .ok_or_else(|| trajectories.format_error(row, col, "", "coordinate is empty"))
    };

    let mut tracks = Vec::new();
    for model_name in wells.field_models(field) {
        let refs: Vec<_> = wells
            .field_rows(field)
            .filter(|r| r.model_name == model_name)
            .collect();
        let pad = refs.first().and_then(|r| r.pad.clone());

        let mut points = Vec::new();
        let mut report_names: Vec<&str> = Vec::new();
        for r in &refs {
            if report_names.contains(&r.report_name.as_str()) {
                continue;
            }
            report_names.push(&r.report_name);

            let mut seen_md: HashSet<u64> = HashSet::new();
            for &row in by_report_name.get(r.report_name.as_str()).into_iter().flatten() {
                let md = number(row, &md_col)?;
                if !seen_md.insert(md.to_bits()) {
                    continue;
                }
                points.push(TrajectoryPoint {
                    x: number(row, &x_col)?,
                    y: number(row, &y_col)?,
                    md,
                    z: number(row, &z_col)?,
                });
            }
        }

        if points.len() < MIN_TRACK_POINTS {
            return Err(CompileError::Integrity {
                well: model_name.to_string(),
                points: points.len(),
            });
        }

        debug!(well = model_name, points = points.len(), "Collected well path");
        tracks.push((
            WellSpec::new(model_name, pad),
            WellTrack {
                well: model_name.to_string(),
                points,
            },
        ));
    }
    Ok(tracks)
}

/// Compile the well paths of `field` into `output_dir/<output.welltrack_file>`.
///
/// Every well is checked before the output file is created.
pub fn compile_welltracks(
    config: &CompilerConfig,
    input_dir: &Path,
    output_dir: &Path,
    field: &str,
) -> Result<WelltrackSummary> {
    let wells = WellTable::load(config, input_dir)?;
    let trajectories = RawTable::load_all(&config.sources.trajectory, input_dir)?;
    let tracks = collect_tracks(config, &wells, &trajectories, field)?;

    let output = output_dir.join(&config.output.welltrack_file);
    let file = File::create(&output).map_err(|e| CompileError::io(&output, e))?;
    let mut writer = KeywordWriter::new(BufWriter::new(file));

    for (spec, track) in tracks.iter().cloned() {
        writer
            .emit_all(&[Record::WellSpec(spec), Record::WellTrack(track)])
            .map_err(|e| CompileError::io(&output, e))?;
    }
    let (_, stats) = writer.finish().map_err(|e| CompileError::io(&output, e))?;

    info!(
        output = %output.display(),
        field,
        wells = tracks.len(),
        "Well paths written"
    );

    Ok(WelltrackSummary {
        output,
        wells: tracks.len(),
        stats,
    })
}
