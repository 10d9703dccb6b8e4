//! Command-line interface for `spraykit`.
//!
//! This binary is the caller layer around [`spraykit_core`]: it reads the
//! uploaded archive from disk, enforces an input size limit, maps flags onto
//! conversion options, and writes results atomically so a failed request
//! never leaves a partial file behind.
//!
//! # Available Commands
//!
//! - `convert` - Add a rate or volume field and re-package the shapefile
//! - `volumes` - Print per-feature area, acreage and spray volume
//! - `targets` - Export point features as a spot-spray target list
//! - `info` - Display dataset information and metadata
//! - `formats` - List the input and output formats and their status

mod display;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use tempfile::NamedTempFile;
use tracing::{Level, debug, info};
use tracing_log::LogTracer;
use tracing_subscriber::FmtSubscriber;

use spraykit_core::formats::get_formats;
use spraykit_core::{
    ConversionOptions, RateMode, SprayError, TargetOptions, convert, export_targets, inspect,
    volumes,
};

/// Default cap on the size of an uploaded archive (64 MiB).
const DEFAULT_MAX_INPUT_BYTES: u64 = 64 * 1024 * 1024;

#[derive(Parser)]
#[command(
    name = "spraykit",
    version,
    about = "Prepare drone-survey shapefiles for spray-drone flight planning",
    long_about = "spraykit converts zipped shapefiles from crop-imaging surveys into archives\n\
                  a spray drone's flight planner can load, optionally writing a per-acre\n\
                  application rate or per-polygon spray volume into every feature."
)]
/// Command-line arguments and options for the `spraykit` CLI.
struct Cli {
    /// Enable verbose (INFO level) logging output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug (DEBUG level) logging output with detailed diagnostics.
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// How the rate field is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    /// Write the rate itself on every feature.
    Uniform,
    /// Write each polygon's area-derived volume and produce a report.
    PerArea,
    /// Re-package without touching attributes.
    Passthrough,
}

impl From<ModeArg> for RateMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Uniform => RateMode::Uniform,
            ModeArg::PerArea => RateMode::PerArea,
            ModeArg::Passthrough => RateMode::Passthrough,
        }
    }
}

/// Available subcommands for the `spraykit` CLI.
#[derive(Subcommand)]
enum Commands {
    /// Converts a zipped survey shapefile into a flight-planner archive.
    Convert {
        /// Path to the uploaded .zip archive.
        #[arg(short, long, value_name = "ARCHIVE")]
        input: PathBuf,

        /// Path for the output .zip archive.
        #[arg(short, long, value_name = "ARCHIVE")]
        output: PathBuf,

        /// Application rate in gallons per acre.
        #[arg(short, long, default_value_t = 1.0)]
        rate: f64,

        /// How the rate field is filled.
        #[arg(short, long, value_enum, default_value_t = ModeArg::Uniform)]
        mode: ModeArg,

        /// Attribute field to write ("Rate" for uniform, "Volume" for per-area).
        #[arg(short, long, value_name = "NAME")]
        field: Option<String>,

        /// Base name for every output component.
        #[arg(long, value_name = "BASE")]
        rename: Option<String>,

        /// Also write the volume report to this path.
        #[arg(long, value_name = "PATH")]
        report_out: Option<PathBuf>,

        /// Leave the volume report out of the output archive.
        #[arg(long)]
        no_embed_report: bool,

        /// Smallest accepted rate.
        #[arg(long, default_value_t = 0.1)]
        min_rate: f64,

        /// Largest accepted rate.
        #[arg(long, default_value_t = 20.0)]
        max_rate: f64,

        /// Refuse archives larger than this many bytes.
        #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_INPUT_BYTES)]
        max_input_bytes: u64,
    },

    /// Prints the area, acreage and spray volume of every feature.
    Volumes {
        /// Path to the uploaded .zip archive.
        #[arg(short, long, value_name = "ARCHIVE")]
        input: PathBuf,

        /// Application rate in gallons per acre.
        #[arg(short, long, default_value_t = 1.0)]
        rate: f64,

        /// Refuse archives larger than this many bytes.
        #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_INPUT_BYTES)]
        max_input_bytes: u64,
    },

    /// Exports point features as a spot-spray target CSV.
    Targets {
        /// Path to the uploaded .zip archive of a point shapefile.
        #[arg(short, long, value_name = "ARCHIVE")]
        input: PathBuf,

        /// Path for the target CSV.
        #[arg(short, long, value_name = "CSV")]
        output: PathBuf,

        /// Spray radius in metres.
        #[arg(long, default_value_t = 1.0)]
        radius: f64,

        /// Liquid per target in litres.
        #[arg(long, default_value_t = 0.5)]
        amount: f64,

        /// Refuse archives larger than this many bytes.
        #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_INPUT_BYTES)]
        max_input_bytes: u64,
    },

    /// Displays information about the shapefile inside an archive.
    Info {
        /// Path to the uploaded .zip archive.
        #[arg(value_name = "ARCHIVE")]
        input: PathBuf,

        /// Refuse archives larger than this many bytes.
        #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_MAX_INPUT_BYTES)]
        max_input_bytes: u64,
    },

    /// Lists the formats spraykit reads and writes.
    Formats,
}

/// Entry point for the `spraykit` command-line interface.
///
/// # Errors
///
/// Returns an error if command execution fails or if the logging system cannot be initialized.
fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    // Bridge logs from the `log` crate to the `tracing` ecosystem.
    LogTracer::init()?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Convert {
            input,
            output,
            rate,
            mode,
            field,
            rename,
            report_out,
            no_embed_report,
            min_rate,
            max_rate,
            max_input_bytes,
        } => {
            let mut options = ConversionOptions::new()
                .with_rate(rate)
                .with_rate_bounds(min_rate, max_rate)
                .with_mode(mode.into())
                .with_embed_report(!no_embed_report);
            if let Some(field) = field {
                options = options.with_field_name(field);
            }
            if let Some(rename) = rename {
                options = options.with_output_base_name(rename);
            }
            info!("Converting {} to {}", input.display(), output.display());
            handle_convert(
                &input,
                &output,
                report_out.as_deref(),
                &options,
                max_input_bytes,
            )?;
        },
        Commands::Volumes {
            input,
            rate,
            max_input_bytes,
        } => {
            handle_volumes(&input, rate, max_input_bytes)?;
        },
        Commands::Targets {
            input,
            output,
            radius,
            amount,
            max_input_bytes,
        } => {
            let options = TargetOptions::new().with_radius(radius).with_amount(amount);
            handle_targets(&input, &output, &options, max_input_bytes)?;
        },
        Commands::Info {
            input,
            max_input_bytes,
        } => {
            info!("Displaying info for {}", input.display());
            handle_info(&input, max_input_bytes)?;
        },
        Commands::Formats => {
            display::display_formats(&get_formats());
        },
    }

    Ok(())
}

fn handle_convert(
    input: &Path,
    output: &Path,
    report_out: Option<&Path>,
    options: &ConversionOptions,
    max_input_bytes: u64,
) -> Result<()> {
    debug!("Conversion options: {options:?}");
    let archive = read_input(input, max_input_bytes)?;
    let result = convert(&archive, options).map_err(describe)?;

    // Stage every output before moving any of them into place.
    let staged_report = match report_out {
        Some(path) => {
            let report = result.report.as_ref().ok_or_else(|| {
                anyhow!("No volume report was produced; use --mode per-area to compute volumes.")
            })?;
            Some((path, stage(path, &report.data)?))
        },
        None => None,
    };
    let staged_archive = stage(output, &result.archive)?;

    commit(staged_archive, output)?;
    if let Some((path, tmp)) = staged_report {
        if let Err(e) = commit(tmp, path) {
            let _ = fs::remove_file(output);
            return Err(e);
        }
        info!("Report written to {}", path.display());
    }

    println!("{}", display::summary_line(&result.summary));
    if result.summary.mode == RateMode::PerArea {
        println!(
            "Total area: {:.2} m², total volume: {:.2}",
            result.summary.total_area_m2, result.summary.total_volume
        );
    }
    info!("Conversion complete.");
    Ok(())
}

fn handle_volumes(input: &Path, rate: f64, max_input_bytes: u64) -> Result<()> {
    let archive = read_input(input, max_input_bytes)?;
    let rows = volumes(&archive, rate).map_err(describe)?;
    display::display_volumes(&rows, rate);
    Ok(())
}

fn handle_targets(
    input: &Path,
    output: &Path,
    options: &TargetOptions,
    max_input_bytes: u64,
) -> Result<()> {
    let archive = read_input(input, max_input_bytes)?;
    let csv = export_targets(&archive, options).map_err(describe)?;
    write_atomic(output, &csv)?;
    println!("Spot targets written to {}", output.display());
    Ok(())
}

fn handle_info(input: &Path, max_input_bytes: u64) -> Result<()> {
    let archive = read_input(input, max_input_bytes)?;
    let info = inspect(&archive).map_err(describe)?;
    display::display_dataset_info(&info);
    Ok(())
}

/// Read an uploaded archive, refusing anything larger than `max_bytes`.
fn read_input(path: &Path, max_bytes: u64) -> Result<Vec<u8>> {
    let metadata = fs::metadata(path)
        .with_context(|| format!("Failed to read input '{}'", path.display()))?;
    if metadata.len() > max_bytes {
        return Err(anyhow!(
            "Input '{}' is {} bytes, above the {max_bytes} byte limit (see --max-input-bytes).",
            path.display(),
            metadata.len()
        ));
    }
    fs::read(path).with_context(|| format!("Failed to read input '{}'", path.display()))
}

/// Write `data` next to `path` and move it into place once complete.
fn write_atomic(path: &Path, data: &[u8]) -> Result<()> {
    commit(stage(path, data)?, path)
}

/// Write `data` to a temporary file in the directory of `path`.
///
/// The file is removed on drop unless it is passed to [`commit`].
fn stage(path: &Path, data: &[u8]) -> Result<NamedTempFile> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut tmp = NamedTempFile::new_in(&parent)
        .with_context(|| format!("Failed to create a temporary file in '{}'", parent.display()))?;
    tmp.write_all(data)
        .with_context(|| format!("Failed to write '{}'", path.display()))?;
    tmp.flush()
        .with_context(|| format!("Failed to write '{}'", path.display()))?;
    debug!("Staged {} bytes for {}", data.len(), path.display());
    Ok(tmp)
}

/// Move a staged file over `path`.
fn commit(tmp: NamedTempFile, path: &Path) -> Result<()> {
    tmp.persist(path)
        .map_err(|e| anyhow!("Failed to replace '{}': {}", path.display(), e.error))?;
    debug!("Wrote {}", path.display());
    Ok(())
}

/// Turn a pipeline error into the message shown to the user.
fn describe(err: SprayError) -> anyhow::Error {
    match err.recovery_suggestion() {
        Some(suggestion) => anyhow!("{}\nHint: {suggestion}", err.user_message()),
        None => anyhow!("{}", err.user_message()),
    }
}
