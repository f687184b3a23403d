//! Post-processor configuration
//!
//! `Configuration` is built once before an export and never changes during
//! it. `PostArgs` is the command-line surface that produces one.

use crate::units::{Formatter, UnitSystem};
use clap::Args;
use std::path::PathBuf;
use thiserror::Error;

pub mod macros;

pub use macros::{MacroTable, MacroTemplate};

/// Commands only meaningful to a controller with canned cycles
pub const DRILL_CYCLE_MODAL_COMMANDS: [&str; 3] = ["G80", "G98", "G99"];

pub const MAX_PRECISION: usize = 10;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("precision {0} out of range (0-10)")]
    Precision(usize),

    #[error("line number step must be positive")]
    LineStep,

    #[error("dwell scale {0} must be a positive number")]
    DwellScale(f64),

    #[error("cannot read macro file {path}: {source}")]
    MacroFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed macro table: {0}")]
    MacroParse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub units: UnitSystem,
    /// Fractional digits; imperial output always uses 4
    pub precision: usize,
    pub output_header: bool,
    pub output_comments: bool,
    pub line_numbers: bool,
    pub line_number_start: u32,
    pub line_number_step: u32,
    /// Drop a command name equal to the previous one
    pub modal: bool,
    /// Drop parameter words whose value did not change
    pub suppress_duplicates: bool,
    /// Expand G81/G82/G83 into G0/G1 moves
    pub translate_drill_cycles: bool,
    pub preamble: String,
    pub postamble: String,
    pub pre_operation: String,
    pub post_operation: String,
    /// Commands written out as `;suppcommands(...)`
    pub suppressed_commands: Vec<String>,
    pub macros: MacroTable,
    /// Factor applied to G82 `P` when written as a `G4 S` dwell
    pub dwell_scale: f64,
    pub exporter: String,
    pub postprocessor: String,
}

impl Configuration {
    pub const DEFAULT_PRECISION: usize = 3;
    pub const DEFAULT_LINE_NUMBER_START: u32 = 100;
    pub const DEFAULT_LINE_NUMBER_STEP: u32 = 10;
    pub const DEFAULT_PREAMBLE: &'static str = "G90\nG17";
    pub const DEFAULT_POSTAMBLE: &'static str =
        "M400\nG4 S4\nM42 M1 P19 S1\nM42 M1 P20 S1\nG0 X0 Y0\nM400";
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            units: UnitSystem::Metric,
            precision: Self::DEFAULT_PRECISION,
            output_header: true,
            output_comments: true,
            line_numbers: false,
            line_number_start: Self::DEFAULT_LINE_NUMBER_START,
            line_number_step: Self::DEFAULT_LINE_NUMBER_STEP,
            modal: false,
            suppress_duplicates: true,
            translate_drill_cycles: true,
            preamble: Self::DEFAULT_PREAMBLE.to_string(),
            postamble: Self::DEFAULT_POSTAMBLE.to_string(),
            pre_operation: String::new(),
            post_operation: String::new(),
            suppressed_commands: Vec::new(),
            macros: MacroTable::marlin(),
            dwell_scale: 1.0,
            exporter: env!("CARGO_PKG_NAME").to_string(),
            postprocessor: "marlin_post".to_string(),
        }
    }
}

impl Configuration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_units(mut self, units: UnitSystem) -> Self {
        self.units = units;
        self
    }

    pub fn with_precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_header(mut self, enabled: bool) -> Self {
        self.output_header = enabled;
        self
    }

    pub fn with_comments(mut self, enabled: bool) -> Self {
        self.output_comments = enabled;
        self
    }

    pub fn with_line_numbers(mut self, start: u32, step: u32) -> Self {
        self.line_numbers = true;
        self.line_number_start = start;
        self.line_number_step = step;
        self
    }

    pub fn with_modal(mut self, enabled: bool) -> Self {
        self.modal = enabled;
        self
    }

    pub fn with_duplicate_suppression(mut self, enabled: bool) -> Self {
        self.suppress_duplicates = enabled;
        self
    }

    pub fn with_drill_translation(mut self, enabled: bool) -> Self {
        self.translate_drill_cycles = enabled;
        self
    }

    pub fn with_preamble(mut self, text: impl Into<String>) -> Self {
        self.preamble = text.into();
        self
    }

    pub fn with_postamble(mut self, text: impl Into<String>) -> Self {
        self.postamble = text.into();
        self
    }

    pub fn with_macros(mut self, macros: MacroTable) -> Self {
        self.macros = macros;
        self
    }

    pub fn with_dwell_scale(mut self, scale: f64) -> Self {
        self.dwell_scale = scale;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.precision > MAX_PRECISION {
            return Err(ConfigError::Precision(self.precision));
        }
        if self.line_number_step == 0 {
            return Err(ConfigError::LineStep);
        }
        if !(self.dwell_scale.is_finite() && self.dwell_scale > 0.0) {
            return Err(ConfigError::DwellScale(self.dwell_scale));
        }
        Ok(())
    }

    pub fn formatter(&self) -> Formatter {
        Formatter::new(self.units, self.precision)
    }

    /// Configured suppressions, plus the cycle modal commands when cycles are expanded
    pub fn effective_suppressed(&self) -> Vec<String> {
        let mut commands: Vec<String> = self
            .suppressed_commands
            .iter()
            .map(|c| c.trim().to_ascii_uppercase())
            .filter(|c| !c.is_empty())
            .collect();
        if self.translate_drill_cycles {
            commands.extend(DRILL_CYCLE_MODAL_COMMANDS.iter().map(|c| c.to_string()));
        }
        commands.sort();
        commands.dedup();
        commands
    }
}

/// Command-line options of the post-processor
#[derive(Args, Debug, Clone)]
pub struct PostArgs {
    /// Suppress header output
    #[arg(long)]
    pub no_header: bool,

    /// Suppress comment output
    #[arg(long)]
    pub no_comments: bool,

    /// Prefix with line numbers
    #[arg(long)]
    pub line_numbers: bool,

    /// First line number (incremented before use)
    #[arg(long, default_value_t = Configuration::DEFAULT_LINE_NUMBER_START)]
    pub line_start: u32,

    /// Line number increment
    #[arg(long, default_value_t = Configuration::DEFAULT_LINE_NUMBER_STEP)]
    pub line_step: u32,

    /// Number of digits of precision
    #[arg(long, default_value_t = Configuration::DEFAULT_PRECISION)]
    pub precision: usize,

    /// Translate drill cycles G81, G82, G83 into G0/G1 movements (default)
    #[arg(long, overrides_with = "no_translate_drill")]
    pub translate_drill: bool,

    /// Do not translate drill cycles G81, G82, G83
    #[arg(long)]
    pub no_translate_drill: bool,

    /// Commands issued before the first operation
    #[arg(long)]
    pub preamble: Option<String>,

    /// Commands issued after the last operation
    #[arg(long)]
    pub postamble: Option<String>,

    /// Output US imperial units (G20)
    #[arg(long)]
    pub inches: bool,

    /// Omit a G-command name equal to the previous one
    #[arg(long)]
    pub modal: bool,

    /// Omit axis words whose value did not change (default)
    #[arg(long, overrides_with = "output_doubles")]
    pub axis_modal: bool,

    /// Repeat axis words even when unchanged
    #[arg(long)]
    pub output_doubles: bool,

    /// Comment out these commands instead of sending them
    #[arg(long = "suppress", value_name = "COMMAND")]
    pub suppress: Vec<String>,

    /// JSON file of macro templates, merged over the built-in ones
    #[arg(long, value_name = "FILE")]
    pub macros: Option<PathBuf>,

    /// Factor from G82 P to G4 S seconds
    #[arg(long, default_value_t = 1.0)]
    pub dwell_scale: f64,
}

impl TryFrom<PostArgs> for Configuration {
    type Error = ConfigError;

    fn try_from(args: PostArgs) -> Result<Self, Self::Error> {
        let mut config = Configuration {
            output_header: !args.no_header,
            output_comments: !args.no_comments,
            line_numbers: args.line_numbers,
            line_number_start: args.line_start,
            line_number_step: args.line_step,
            precision: args.precision,
            translate_drill_cycles: args.translate_drill || !args.no_translate_drill,
            modal: args.modal,
            suppress_duplicates: !args.output_doubles,
            suppressed_commands: args.suppress,
            dwell_scale: args.dwell_scale,
            ..Configuration::default()
        };

        // Shells hand over "\n" literally
        if let Some(preamble) = args.preamble {
            config.preamble = preamble.replace("\\n", "\n");
        }
        if let Some(postamble) = args.postamble {
            config.postamble = postamble.replace("\\n", "\n");
        }
        if args.inches {
            config.units = UnitSystem::Imperial;
        }
        if let Some(path) = args.macros {
            config.macros.merge(MacroTable::from_file(path)?);
        }

        config.validate()?;
        Ok(config)
    }
}
