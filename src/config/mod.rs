//! Compiler Configuration Module
//!
//! File names, column headers, encodings and keyword defaults for a
//! compilation run, loaded from TOML.
//!
//! ## Loading Order
//!
//! 1. Explicit `--config` path (errors are fatal)
//! 2. `HIST_SCHEDULE_CONFIG` environment variable (path to TOML file)
//! 3. `hist_schedule.toml` in the current working directory
//! 4. Built-in defaults (the legacy input package layout)
//!
//! ## Usage
//!
//! The loaded config is passed by reference into every stage:
//!
//! ```ignore
//! let (config, _provenance) = CompilerConfig::load(cli.config.as_deref())?;
//! let summary = schedule::compile_schedule(&config, &input_dir, &output_dir, &request)?;
//! ```

mod compiler_config;
pub mod validation;

pub use compiler_config::*;
