use anyhow::{bail, Context};
use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::Parser;
use marlin_post::config::{Configuration, PostArgs};
use marlin_post::parser::ParseError;
use marlin_post::toolpath::document::{DocumentError, ToolpathDocument};
use std::path::PathBuf;
use tracing::info;

/// Post-process a CAM toolpath into Marlin G-code
#[derive(Parser, Debug)]
#[command(name = "marlin-post", version, about)]
struct Cli {
    /// Toolpath document (JSON)
    input: PathBuf,

    /// Output file, `-` for stdout
    #[arg(short, long, default_value = marlin_post::STDOUT_PATH)]
    output: PathBuf,

    #[command(flatten)]
    post: PostArgs,
}

fn report_parse_error(label: &str, text: &str, error: &ParseError) -> std::io::Result<()> {
    let id = format!("path '{}'", label);
    let span = error.span();

    Report::build(ReportKind::Error, id.clone(), span.start)
        .with_message(error.to_string())
        .with_label(
            Label::new((id.clone(), span))
                .with_message(error.to_string())
                .with_color(Color::Red),
        )
        .finish()
        .eprint((id, Source::from(text)))
}

fn main() -> anyhow::Result<()> {
    marlin_post::init_logging()?;
    let cli = Cli::parse();

    let config = Configuration::try_from(cli.post).context("invalid options")?;

    let document = ToolpathDocument::from_file(&cli.input)
        .with_context(|| format!("cannot load {}", cli.input.display()))?;

    let nodes = match document.into_nodes() {
        Ok(nodes) => nodes,
        Err(DocumentError::Command {
            label,
            text,
            source,
        }) => {
            report_parse_error(&label, &text, &source)?;
            bail!("path '{}' holds commands that cannot be parsed", label);
        }
        Err(e) => return Err(e.into()),
    };

    let program = marlin_post::export(&nodes, config)?;
    marlin_post::write_output(&cli.output, &program)?;

    if cli.output.as_os_str() != marlin_post::STDOUT_PATH {
        info!(path = %cli.output.display(), "wrote program");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use marlin_post::units::UnitSystem;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_cli_arguments() {
        let cli = Cli::try_parse_from([
            "marlin-post",
            "job.json",
            "-o",
            "job.gcode",
            "--inches",
            "--line-numbers",
        ])
        .expect("valid arguments");

        assert_eq!(cli.input, PathBuf::from("job.json"));
        assert_eq!(cli.output, PathBuf::from("job.gcode"));

        let config = Configuration::try_from(cli.post).expect("valid configuration");
        assert_eq!(config.units, UnitSystem::Imperial);
        assert!(config.line_numbers);
    }

    #[test]
    fn test_output_defaults_to_stdout() {
        let cli = Cli::try_parse_from(["marlin-post", "job.json"]).expect("valid arguments");
        assert_eq!(cli.output, PathBuf::from("-"));
    }
}
