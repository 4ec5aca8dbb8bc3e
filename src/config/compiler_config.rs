//! Compiler Configuration - source files, column names and keyword defaults
//!
//! Every file name, column header, encoding and completion default used by
//! the compiler is a field here. Each struct implements `Default` with the
//! values of the legacy input package, so a run without a config file reads
//! the standard directory layout unchanged.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::keywords::{DepthType, Numeric};
use crate::types::ProductionTrigger;

/// Environment variable naming a config file.
pub const CONFIG_ENV_VAR: &str = "HIST_SCHEDULE_CONFIG";

/// Config file picked up from the working directory.
pub const LOCAL_CONFIG_FILE: &str = "hist_schedule.toml";

// ============================================================================
// Config Provenance
// ============================================================================

/// Tracks which configuration keys were explicitly present in the user's TOML file.
#[derive(Debug, Clone, Default)]
pub struct ConfigProvenance {
    /// Source file, `None` when running on built-in defaults
    pub path: Option<PathBuf>,
    /// Dotted key paths explicitly present in the user's TOML file
    pub explicit_keys: HashSet<String>,
}

impl ConfigProvenance {
    pub fn is_user_set(&self, dotted_key: &str) -> bool {
        self.explicit_keys.contains(dotted_key)
    }
}

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration of a compilation run.
///
/// Load with `CompilerConfig::load(None)` which searches:
/// 1. `$HIST_SCHEDULE_CONFIG`
/// 2. `./hist_schedule.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Input tables, relative to the input directory
    #[serde(default)]
    pub sources: SourcesConfig,

    /// Column headers of every input table
    #[serde(default)]
    pub columns: ColumnsConfig,

    /// Fixed `COMPDATMD` items and perforation classification
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Timeline walking rules
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Output artifact names
    #[serde(default)]
    pub output: OutputConfig,
}

impl CompilerConfig {
    /// Load configuration.
    ///
    /// An explicit path must load; otherwise the standard search order
    /// applies and unreadable candidates fall back with a warning:
    /// 1. `$HIST_SCHEDULE_CONFIG`
    /// 2. `./hist_schedule.toml`
    /// 3. Built-in defaults
    pub fn load(explicit: Option<&Path>) -> Result<(Self, ConfigProvenance), ConfigError> {
        if let Some(path) = explicit {
            let loaded = Self::load_from_file_with_provenance(path)?;
            info!(path = %path.display(), "Loaded compiler config");
            return Ok(loaded);
        }

        // 1. Check env var
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file_with_provenance(&p) {
                    Ok(loaded) => {
                        info!(path = %p.display(), "Loaded compiler config from {CONFIG_ENV_VAR}");
                        return Ok(loaded);
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {CONFIG_ENV_VAR}, falling back");
                    }
                }
            } else {
                warn!(path = %path, "{CONFIG_ENV_VAR} points to non-existent file, falling back");
            }
        }

        // 2. Check ./hist_schedule.toml
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file_with_provenance(&local) {
                Ok(loaded) => {
                    info!("Loaded compiler config from ./{LOCAL_CONFIG_FILE}");
                    return Ok(loaded);
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{LOCAL_CONFIG_FILE}, using defaults");
                }
            }
        }

        // 3. Defaults
        info!("No {LOCAL_CONFIG_FILE} found - using built-in defaults");
        Ok((Self::default(), ConfigProvenance::default()))
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let (config, _provenance) = Self::load_from_file_with_provenance(path)?;
        Ok(config)
    }

    /// Load from a specific TOML file path, also returning provenance.
    pub fn load_from_file_with_provenance(
        path: &Path,
    ) -> Result<(Self, ConfigProvenance), ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let (config, mut provenance) = Self::from_toml_str(&contents)
            .map_err(|e| match e {
                ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
                other => other,
            })?;
        provenance.path = Some(path.to_path_buf());
        Ok((config, provenance))
    }

    /// Parse and validate TOML text.
    pub fn from_toml_str(contents: &str) -> Result<(Self, ConfigProvenance), ConfigError> {
        // Two-pass: check for unknown keys first (warnings only)
        for w in &super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let provenance = ConfigProvenance {
            path: None,
            explicit_keys: super::validation::walk_toml_keys(
                &contents
                    .parse::<toml::Value>()
                    .unwrap_or(toml::Value::Table(toml::map::Map::default())),
                "",
            )
            .into_iter()
            .collect(),
        };

        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok((config, provenance))
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate file specs, column names and completion defaults.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let s = &self.sources;
        for (kind, files) in [
            ("production", &s.production),
            ("perforation", &s.perforation),
            ("manual_ops", &s.manual_ops),
            ("trajectory", &s.trajectory),
        ] {
            if files.is_empty() {
                errors.push(format!("sources.{kind} must list at least one file"));
            }
            for file in files {
                file.check(&format!("sources.{kind}"), &mut errors);
            }
        }
        s.well_table.check("sources.well_table", &mut errors);

        let c = &self.columns;
        Self::check_columns(
            "columns.production",
            &[
                &c.production.well,
                &c.production.date,
                &c.production.oil,
                &c.production.water,
                &c.production.gas,
                &c.production.injection,
                &c.production.days,
                &c.production.bhp,
                &c.production.thp,
            ],
            &mut errors,
        );
        Self::check_columns(
            "columns.perforation",
            &[
                &c.perforation.well,
                &c.perforation.date,
                &c.perforation.completion_type,
                &c.perforation.md_top,
                &c.perforation.md_bottom,
            ],
            &mut errors,
        );
        Self::check_columns(
            "columns.manual_ops",
            &[
                &c.manual_ops.date,
                &c.manual_ops.keyword,
                &c.manual_ops.args,
                &c.manual_ops.field,
            ],
            &mut errors,
        );
        Self::check_columns(
            "columns.trajectory",
            &[
                &c.trajectory.well,
                &c.trajectory.x,
                &c.trajectory.y,
                &c.trajectory.md,
                &c.trajectory.z,
            ],
            &mut errors,
        );
        Self::check_columns(
            "columns.well_table",
            &[
                &c.well_table.model_name,
                &c.well_table.report_name,
                &c.well_table.field,
                &c.well_table.pad,
            ],
            &mut errors,
        );

        if self.schedule.date_format.trim().is_empty() {
            errors.push("schedule.date_format must not be empty".to_string());
        }
        if self.output.schedule_file.trim().is_empty() {
            errors.push("output.schedule_file must not be empty".to_string());
        }
        if self.output.welltrack_file.trim().is_empty() {
            errors.push("output.welltrack_file must not be empty".to_string());
        }

        // Physical range validation
        let (range_errors, range_warnings) = super::validation::validate_physical_ranges(self);
        errors.extend(range_errors);
        for w in &range_warnings {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_columns(section: &str, names: &[&String], errors: &mut Vec<String>) {
        if names.iter().any(|n| n.trim().is_empty()) {
            errors.push(format!("{section}: column names must not be empty"));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Sources
// ============================================================================

/// One delimited input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableFile {
    /// Path relative to the input directory (absolute paths are kept)
    pub path: String,

    /// WHATWG encoding label, e.g. "utf-8" or "windows-1251"
    #[serde(default = "default_encoding")]
    pub encoding: String,

    /// Single-character field delimiter, "\t" for tab-separated files
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
}

fn default_encoding() -> String {
    "utf-8".to_string()
}
fn default_delimiter() -> String {
    ",".to_string()
}

impl TableFile {
    pub fn new(path: &str, encoding: &str, delimiter: &str) -> Self {
        Self {
            path: path.to_string(),
            encoding: encoding.to_string(),
            delimiter: delimiter.to_string(),
        }
    }

    /// Delimiter as a single byte, `None` when not one ASCII character.
    pub fn delimiter_byte(&self) -> Option<u8> {
        match self.delimiter.as_bytes() {
            [b] if b.is_ascii() => Some(*b),
            _ => None,
        }
    }

    pub fn resolve(&self, input_dir: &Path) -> PathBuf {
        input_dir.join(&self.path)
    }

    fn check(&self, section: &str, errors: &mut Vec<String>) {
        if self.path.trim().is_empty() {
            errors.push(format!("{section}: file path must not be empty"));
        }
        if self.delimiter_byte().is_none() {
            errors.push(format!(
                "{section}: delimiter '{}' of {} must be a single ASCII character",
                self.delimiter.escape_debug(),
                self.path
            ));
        }
        if encoding_rs::Encoding::for_label(self.encoding.as_bytes()).is_none() {
            errors.push(format!(
                "{section}: unknown encoding '{}' for {}",
                self.encoding, self.path
            ));
        }
    }
}

/// Input tables of a compilation, concatenated in listed order per kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_production_files")]
    pub production: Vec<TableFile>,

    #[serde(default = "default_perforation_files")]
    pub perforation: Vec<TableFile>,

    #[serde(default = "default_manual_ops_files")]
    pub manual_ops: Vec<TableFile>,

    #[serde(default = "default_trajectory_files")]
    pub trajectory: Vec<TableFile>,

    /// Cross-reference of model well names, report names, fields and pads
    #[serde(default = "default_well_table_file")]
    pub well_table: TableFile,
}

fn default_production_files() -> Vec<TableFile> {
    vec![
        TableFile::new("production_kmb.csv", "windows-1251", ","),
        TableFile::new("production_tk.csv", "windows-1251", ","),
    ]
}
fn default_perforation_files() -> Vec<TableFile> {
    vec![
        TableFile::new("perf_kmb_all.csv", "windows-1251", ";"),
        TableFile::new("perf_tk_all.csv", "windows-1251", ";"),
    ]
}
fn default_manual_ops_files() -> Vec<TableFile> {
    vec![TableFile::new("man_ops.csv", "windows-1251", ",")]
}
fn default_trajectory_files() -> Vec<TableFile> {
    vec![
        TableFile::new("traj_kmb_all.csv", "utf-8", ";"),
        TableFile::new("traj_tk_all.csv", "utf-8", "\t"),
    ]
}
fn default_well_table_file() -> TableFile {
    TableFile::new("well_table.csv", "windows-1251", ",")
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            production: default_production_files(),
            perforation: default_perforation_files(),
            manual_ops: default_manual_ops_files(),
            trajectory: default_trajectory_files(),
            well_table: default_well_table_file(),
        }
    }
}

// ============================================================================
// Columns
// ============================================================================

/// Column headers of every input table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnsConfig {
    #[serde(default)]
    pub production: ProductionColumns,

    #[serde(default)]
    pub perforation: PerforationColumns,

    #[serde(default)]
    pub manual_ops: ManualOpsColumns,

    #[serde(default)]
    pub trajectory: TrajectoryColumns,

    #[serde(default)]
    pub well_table: WellTableColumns,
}

/// Monthly production report. Volumes are per month, `days` is time on production.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductionColumns {
    /// Model well name
    pub well: String,
    pub date: String,
    pub oil: String,
    pub water: String,
    pub gas: String,
    pub injection: String,
    pub days: String,
    pub bhp: String,
    pub thp: String,
}

impl Default for ProductionColumns {
    fn default() -> Self {
        Self {
            well: "*WELL".to_string(),
            date: "DATE".to_string(),
            oil: "OIL".to_string(),
            water: "WATER".to_string(),
            gas: "GAS".to_string(),
            injection: "WINJ".to_string(),
            days: "DAYS".to_string(),
            bhp: "BHP".to_string(),
            thp: "THP".to_string(),
        }
    }
}

/// Perforation / squeeze history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerforationColumns {
    /// Report well name
    pub well: String,
    pub date: String,
    /// Free-text completion type; blank or containing the open marker means open
    pub completion_type: String,
    pub md_top: String,
    pub md_bottom: String,
}

impl Default for PerforationColumns {
    fn default() -> Self {
        Self {
            well: "Скважина".to_string(),
            date: "Дата".to_string(),
            completion_type: "Тип перфорации".to_string(),
            md_top: "Глубина начала интервала перфорации(md), м".to_string(),
            md_bottom: "Глубина конца интервала перфорации(md), м".to_string(),
        }
    }
}

/// Manual operator commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ManualOpsColumns {
    pub date: String,
    pub keyword: String,
    pub args: String,
    /// Field the command belongs to
    pub field: String,
    /// Optional well the command is scoped to
    pub well: Option<String>,
}

impl Default for ManualOpsColumns {
    fn default() -> Self {
        Self {
            date: "Дата".to_string(),
            keyword: "Ключевое слово".to_string(),
            args: "Аргумент".to_string(),
            field: "Месторождение".to_string(),
            well: None,
        }
    }
}

/// Well survey stations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrajectoryColumns {
    /// Report well name
    pub well: String,
    pub x: String,
    pub y: String,
    pub md: String,
    pub z: String,
}

impl Default for TrajectoryColumns {
    fn default() -> Self {
        Self {
            well: "Скважина".to_string(),
            x: "Координата X".to_string(),
            y: "Координата Y".to_string(),
            md: "MD".to_string(),
            z: "Z".to_string(),
        }
    }
}

/// Well-name cross-reference table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WellTableColumns {
    /// Name used in the simulation model
    pub model_name: String,
    /// Name used in the production / perforation reports
    pub report_name: String,
    /// Field (reservoir) assignment
    pub field: String,
    /// Pad / group in the model
    pub pad: String,
}

impl Default for WellTableColumns {
    fn default() -> Self {
        Self {
            model_name: "Название в модели".to_string(),
            report_name: "Скважина в МЭР".to_string(),
            field: "Привязка к залежи".to_string(),
            pad: "КП в модели".to_string(),
        }
    }
}

// ============================================================================
// Completion
// ============================================================================

/// Fixed `COMPDATMD` items and the open/shut classification marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Wellbore diameter (m)
    pub well_diameter: Numeric,
    pub skin: Numeric,
    pub connection_factor_multiplier: Numeric,
    pub depth_type: DepthType,
    /// Substring of the completion type marking an open interval
    pub open_marker: String,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            well_diameter: Numeric::Real(0.16),
            skin: Numeric::Int(0),
            connection_factor_multiplier: Numeric::Int(1),
            depth_type: DepthType::Md,
            open_marker: "ПЕРФ".to_string(),
        }
    }
}

// ============================================================================
// Schedule
// ============================================================================

/// Timeline walking rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Which facts assert a `WCONHIST`
    pub production_trigger: ProductionTrigger,

    /// Field wells tolerated without perforation records.
    ///
    /// The legacy tool accepted exactly one (an unassigned sentinel row).
    pub max_unmatched_wells: usize,

    /// chrono format of date cells in production, perforation and manual-ops tables
    pub date_format: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            production_trigger: ProductionTrigger::OilOnly,
            max_unmatched_wells: 1,
            date_format: "%d.%m.%Y".to_string(),
        }
    }
}

// ============================================================================
// Output
// ============================================================================

/// Output artifact names, relative to the output directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub schedule_file: String,
    pub welltrack_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            schedule_file: "HIST.SCH".to_string(),
            welltrack_file: "WELLTRACK.INC".to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
