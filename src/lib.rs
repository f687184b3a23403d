//! marlin-post: CAM toolpaths to Marlin G-code
//!
//! A toolpath tree (compound operations, paths, commands) is rendered in a
//! single pass into a G-code program for Marlin-based routers. Drill cycles
//! are expanded into plain moves since Marlin has none, and tool change and
//! spindle start are replaced by configurable macros.
//!
//! ```no_run
//! use marlin_post::{config::Configuration, toolpath::document::ToolpathDocument};
//!
//! let nodes = ToolpathDocument::from_file("job.json")?.into_nodes()?;
//! let program = marlin_post::export(&nodes, Configuration::default())?;
//! marlin_post::write_output("job.gcode", &program)?;
//! # Ok::<(), marlin_post::ExportError>(())
//! ```

pub mod codegen;
pub mod config;
pub mod lexer;
pub mod parser;
pub mod post;
pub mod toolpath;
pub mod units;

use config::{ConfigError, Configuration};
use post::{MarlinPost, PostProcessor};
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use toolpath::document::DocumentError;
use toolpath::ToolpathNode;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output path meaning standard output
pub const STDOUT_PATH: &str = "-";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error("cannot write output: {0}")]
    Io(#[from] std::io::Error),
}

/// Initialize logging with the default configuration
///
/// Log lines go to stderr so a program written to stdout stays clean.
/// `RUST_LOG` is honoured.
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Render a toolpath into a Marlin program
pub fn export(nodes: &[ToolpathNode], config: Configuration) -> Result<String, ExportError> {
    let post = MarlinPost::new(config)?;
    Ok(post.export(nodes))
}

/// Write the finished program to a file, or to stdout for `-`
pub fn write_output(path: impl AsRef<Path>, program: &str) -> Result<(), ExportError> {
    let path = path.as_ref();
    if path == Path::new(STDOUT_PATH) {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(program.as_bytes())?;
        stdout.flush()?;
    } else {
        std::fs::write(path, program)?;
    }
    Ok(())
}
