//! Config validation: unknown-key detection with Levenshtein suggestions
//! and value range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

use chrono::format::{Item, StrftimeItems};

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for `CompilerConfig`.
///
/// Maintained by hand to match the struct hierarchy in `compiler_config.rs`.
/// Entries of a file list share the list's path (`sources.production.path`).
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [sources]
        "sources",
        "sources.production",
        "sources.production.path",
        "sources.production.encoding",
        "sources.production.delimiter",
        "sources.perforation",
        "sources.perforation.path",
        "sources.perforation.encoding",
        "sources.perforation.delimiter",
        "sources.manual_ops",
        "sources.manual_ops.path",
        "sources.manual_ops.encoding",
        "sources.manual_ops.delimiter",
        "sources.trajectory",
        "sources.trajectory.path",
        "sources.trajectory.encoding",
        "sources.trajectory.delimiter",
        "sources.well_table",
        "sources.well_table.path",
        "sources.well_table.encoding",
        "sources.well_table.delimiter",
        // [columns]
        "columns",
        "columns.production",
        "columns.production.well",
        "columns.production.date",
        "columns.production.oil",
        "columns.production.water",
        "columns.production.gas",
        "columns.production.injection",
        "columns.production.days",
        "columns.production.bhp",
        "columns.production.thp",
        "columns.perforation",
        "columns.perforation.well",
        "columns.perforation.date",
        "columns.perforation.completion_type",
        "columns.perforation.md_top",
        "columns.perforation.md_bottom",
        "columns.manual_ops",
        "columns.manual_ops.date",
        "columns.manual_ops.keyword",
        "columns.manual_ops.args",
        "columns.manual_ops.field",
        "columns.manual_ops.well",
        "columns.trajectory",
        "columns.trajectory.well",
        "columns.trajectory.x",
        "columns.trajectory.y",
        "columns.trajectory.md",
        "columns.trajectory.z",
        "columns.well_table",
        "columns.well_table.model_name",
        "columns.well_table.report_name",
        "columns.well_table.field",
        "columns.well_table.pad",
        // [completion]
        "completion",
        "completion.well_diameter",
        "completion.skin",
        "completion.connection_factor_multiplier",
        "completion.depth_type",
        "completion.open_marker",
        // [schedule]
        "schedule",
        "schedule.production_trigger",
        "schedule.max_unmatched_wells",
        "schedule.date_format",
        // [output]
        "output",
        "output.schedule_file",
        "output.welltrack_file",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`. Tables inside arrays are walked under the
/// array's own path.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            } else if let Some(items) = v.as_array() {
                for item in items.iter().filter(|i| i.is_table()) {
                    for nested in walk_toml_keys(item, &path) {
                        if !keys.contains(&nested) {
                            keys.push(nested);
                        }
                    }
                }
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let b_len = b_chars.len();
    if a.is_empty() {
        return b_len;
    }
    if b_len == 0 {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;
    for &k in known {
        let dist = levenshtein(unknown, k);
        if dist <= 3 {
            match best {
                Some((bk, best_dist)) if dist > best_dist || (dist == best_dist && k >= bk) => {}
                _ => best = Some((k, dist)),
            }
        }
    }
    best.map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys, it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new(); // parse errors are handled by serde later
    };

    let known = known_config_keys();
    let found = walk_toml_keys(&value, "");
    let mut warnings = Vec::new();

    for key in &found {
        if !known.contains(key.as_str()) {
            let suggestion = suggest_correction(key, &known);
            let message = format!("Unknown config key '{key}'");
            warnings.push(ValidationWarning {
                field: key.clone(),
                message,
                suggestion,
            });
        }
    }

    warnings
}

// ============================================================================
// Range Validation
// ============================================================================

/// Validate value ranges on a parsed `CompilerConfig`.
///
/// Returns (errors, warnings): errors are values that cannot produce a
/// usable schedule; warnings are suspicious but not fatal.
pub fn validate_physical_ranges(
    config: &super::CompilerConfig,
) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let c = &config.completion;

    let diameter = c.well_diameter.as_f64();
    if diameter <= 0.0 {
        errors.push(format!(
            "completion.well_diameter = {diameter} must be > 0"
        ));
    } else if diameter > 1.0 {
        // Diameters are in metres; anything over a metre is probably inches or mm
        warnings.push(ValidationWarning {
            field: "completion.well_diameter".to_string(),
            message: format!(
                "completion.well_diameter = {diameter} is outside typical range (0-1 m)"
            ),
            suggestion: None,
        });
    }

    let multiplier = c.connection_factor_multiplier.as_f64();
    if multiplier <= 0.0 {
        errors.push(format!(
            "completion.connection_factor_multiplier = {multiplier} must be > 0"
        ));
    }

    // An empty marker matches every completion type
    if c.open_marker.is_empty() {
        errors.push("completion.open_marker must not be empty".to_string());
    }

    let date_format = &config.schedule.date_format;
    if StrftimeItems::new(date_format).any(|item| matches!(item, Item::Error)) {
        errors.push(format!(
            "schedule.date_format = '{date_format}' is not a valid chrono format"
        ));
    } else if !date_format.contains("%Y") && !date_format.contains("%y") {
        warnings.push(ValidationWarning {
            field: "schedule.date_format".to_string(),
            message: format!("schedule.date_format = '{date_format}' has no year field"),
            suggestion: None,
        });
    }

    if config.schedule.max_unmatched_wells > 10 {
        warnings.push(ValidationWarning {
            field: "schedule.max_unmatched_wells".to_string(),
            message: format!(
                "schedule.max_unmatched_wells = {} tolerates many wells without perforations",
                config.schedule.max_unmatched_wells
            ),
            suggestion: None,
        });
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================
