//! goder command line
//!
//! Rewrites one Go source file so that it no longer depends on generics or
//! on external packages, for judges that only accept a single file.

mod output;
mod settings;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use goder_compiler::{Mode, Transformer};
use output::{MessageFormat, Reporter};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "goder")]
#[command(about = "Inline external packages and specialize generics in a Go file", long_about = None)]
#[command(version)]
struct Cli {
    /// Go source file
    file: PathBuf,

    /// Which transformations to run
    #[arg(long, value_enum, default_value_t = ModeArg::Both)]
    mode: ModeArg,

    /// Overwrite the input file
    #[arg(short, long, conflicts_with = "output")]
    write: bool,

    /// Write the result to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file (default: goder.toml next to or above the input)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Module cache to read external packages from
    #[arg(long)]
    mod_cache: Option<PathBuf>,

    /// When to color diagnostics
    #[arg(long, value_enum, default_value_t = ColorArg::Auto)]
    color: ColorArg,

    /// How to print diagnostics
    #[arg(long, value_enum, default_value_t = MessageFormat::Human)]
    message_format: MessageFormat,

    /// More logging (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Generics,
    Inline,
    Both,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Generics => Mode::Generics,
            ModeArg::Inline => Mode::Inline,
            ModeArg::Both => Mode::Both,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorArg {
    Auto,
    Always,
    Never,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let color = output::resolve_color_choice(match cli.color {
        ColorArg::Auto => None,
        ColorArg::Always => Some("always"),
        ColorArg::Never => Some("never"),
    });
    let mut reporter = Reporter::new(color, cli.message_format);

    match run(&cli, &mut reporter) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            reporter.fatal(&err);
            ExitCode::FAILURE
        }
    }
}

/// Log events go to stderr. `GODER_LOG` overrides the `-v` level.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "error",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_env("GODER_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli, reporter: &mut Reporter) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(&cli.file)
        .map_err(goder_compiler::TransformError::from)
        .with_context(|| format!("failed to read {}", cli.file.display()))?;
    reporter.add_source(&cli.file, &source);

    let mode = Mode::from(cli.mode);
    let settings = settings::load(&cli.file, cli.config.as_deref(), cli.mod_cache.as_deref(), mode)?;
    let mut transformer = Transformer::new(settings.config);
    if let Some(locator) = settings.locator {
        transformer = transformer.with_locator(locator);
    }

    let output = transformer.transform(&source, mode)?;
    for warning in &output.diagnostics {
        reporter.warning(warning);
    }

    let target = if cli.write {
        Some(cli.file.as_path())
    } else {
        cli.output.as_deref()
    };
    match target {
        Some(path) => write_atomically(path, &output.source),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(output.source.as_bytes())?;
            stdout.flush()?;
            Ok(())
        }
    }
}

/// Replace `path` only once the whole output has been written next to it.
fn write_atomically(path: &Path, contents: &str) -> anyhow::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create a temporary file in {}", dir.display()))?;
    file.write_all(contents.as_bytes())?;
    file.persist(path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    tracing::info!(path = %path.display(), "wrote output");
    Ok(())
}
