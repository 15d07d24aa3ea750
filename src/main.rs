//! limitwatch: check telemetry records against operating-context limits
//!
//! Exit status:
//!
//! - 0: success; for `check`, every sample stayed in limits
//! - 1: the run failed (unreadable input, invalid layout, I/O error)
//! - 2: command-line usage error
//! - 3: `check` saw a caution level sample, but no action level one
//! - 4: `check` saw an action level sample

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use limitwatch::limits::write_limits_file;
use limitwatch::{
    load_limits_file, search_file, LimitList, LoadOptions, OrderedTime, RecordLayout,
    RecordRange, Severity, TimeWindow,
};

const EXIT_CAUTION: u8 = 3;
const EXIT_ACTION: u8 = 4;

#[derive(Parser)]
#[command(name = "limitwatch")]
#[command(about = "Check telemetry records against operating-context limits")]
#[command(version)]
struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct WindowArgs {
    /// Ignore records before this time (YYYY-MM-DDTHH:MM:SS[.mmm] or epoch ms)
    #[arg(long)]
    start: Option<OrderedTime>,

    /// Ignore records after this time
    #[arg(long)]
    end: Option<OrderedTime>,
}

impl WindowArgs {
    fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start, self.end)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Run every record in the window through the limit checkers
    Check {
        /// JSON record layout
        #[arg(short, long)]
        layout: PathBuf,

        /// Limits definition file
        #[arg(long)]
        limits: PathBuf,

        /// Telemetry record file
        #[arg(short, long)]
        telemetry: PathBuf,

        #[command(flatten)]
        window: WindowArgs,

        /// Append the alarm log to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Keep parameters whose limits are disabled
        #[arg(long)]
        keep_disabled: bool,
    },

    /// Find the records of a telemetry file inside a time window
    Search {
        /// JSON record layout
        #[arg(short, long)]
        layout: PathBuf,

        /// Telemetry record file
        #[arg(short, long)]
        telemetry: PathBuf,

        #[command(flatten)]
        window: WindowArgs,
    },

    /// Load a limits file and report unusable entries
    Limits {
        /// JSON record layout
        #[arg(short, long)]
        layout: PathBuf,

        /// Limits definition file
        #[arg(long)]
        limits: PathBuf,

        /// Write the normalized limits to this file
        #[arg(short, long)]
        write: Option<PathBuf>,

        /// Keep parameters whose limits are disabled
        #[arg(long)]
        keep_disabled: bool,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "limitwatch=debug"
    } else {
        "limitwatch=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn find_records(
    layout: &RecordLayout,
    telemetry: &Path,
    window: TimeWindow,
) -> Result<Option<RecordRange>> {
    search_file(
        telemetry,
        layout.header_size(),
        layout.record_size(),
        |record| layout.record_time(record),
        window,
    )
    .with_context(|| format!("Failed to search {}", telemetry.display()))
}

fn open_sink(output: Option<&Path>) -> Result<BufWriter<Box<dyn Write>>> {
    let sink: Box<dyn Write> = match output {
        Some(path) => Box::new(
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open alarm log {}", path.display()))?,
        ),
        None => Box::new(io::stdout()),
    };
    Ok(BufWriter::new(sink))
}

fn run_check(
    layout: &Path,
    limits: &Path,
    telemetry: &Path,
    window: TimeWindow,
    output: Option<&Path>,
    keep_disabled: bool,
) -> Result<Severity> {
    let layout = RecordLayout::from_file(layout)?;
    let loaded = load_limits_file(
        limits,
        &layout,
        layout.schema(),
        LoadOptions { keep_disabled },
    )?;
    let mut list = LimitList::with_checkers(layout.schema().clone(), loaded.checkers)?;

    let Some(range) = find_records(&layout, telemetry, window)? else {
        info!("No records of {} fall in the window", telemetry.display());
        return Ok(Severity::Ok);
    };
    let count = range.record_count(layout.record_size() as u64);
    info!(
        "Checking {} records from {} to {}",
        count, range.first_time, range.last_time
    );

    let file = File::open(telemetry)
        .with_context(|| format!("Failed to open {}", telemetry.display()))?;
    let mut reader = BufReader::new(file);
    reader
        .seek(SeekFrom::Start(range.first_offset))
        .with_context(|| format!("Failed to seek in {}", telemetry.display()))?;

    let mut sink = open_sink(output)?;
    let mut record = vec![0u8; layout.record_size()];
    for index in 0..count {
        reader.read_exact(&mut record).with_context(|| {
            format!("Failed to read record {} of {}", index, telemetry.display())
        })?;
        list.check_record(&layout, &record[..], &mut sink)
            .context("Failed to write alarm log")?;
    }
    list.final_report(&mut sink)
        .context("Failed to write alarm log")?;
    sink.flush().context("Failed to write alarm log")?;

    let stats = list.stats();
    info!(
        "{} samples checked, {} absent, {} reports, worst status {:?}",
        stats.samples,
        stats.absent,
        stats.reports,
        list.worst()
    );
    Ok(list.worst())
}

fn run_search(layout: &Path, telemetry: &Path, window: TimeWindow) -> Result<()> {
    let layout = RecordLayout::from_file(layout)?;
    match find_records(&layout, telemetry, window)? {
        Some(range) => {
            println!(
                "first record: offset {} time {}",
                range.first_offset, range.first_time
            );
            println!(
                "last record: offset {} time {}",
                range.last_offset, range.last_time
            );
            println!(
                "records: {}",
                range.record_count(layout.record_size() as u64)
            );
        }
        None => println!("no intersection"),
    }
    Ok(())
}

fn run_limits(
    layout: &Path,
    limits: &Path,
    write: Option<&Path>,
    keep_disabled: bool,
) -> Result<()> {
    let layout = RecordLayout::from_file(layout)?;
    let loaded = load_limits_file(
        limits,
        &layout,
        layout.schema(),
        LoadOptions { keep_disabled },
    )?;

    for entry in &loaded.skipped {
        println!("line {}: {}: {}", entry.line, entry.reason, entry.text);
    }
    for checker in &loaded.checkers {
        println!(
            "{} ({}): {} contexts{}",
            checker.param().name,
            checker.param().unit,
            checker.defined_slots().count(),
            if checker.is_enabled() { "" } else { ", disabled" }
        );
    }

    if let Some(path) = write {
        write_limits_file(path, &loaded.checkers)?;
        info!("Wrote {} parameters to {}", loaded.checkers.len(), path.display());
    }
    Ok(())
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Check {
            layout,
            limits,
            telemetry,
            window,
            output,
            keep_disabled,
        } => {
            let worst = run_check(
                &layout,
                &limits,
                &telemetry,
                window.window(),
                output.as_deref(),
                keep_disabled,
            )?;
            Ok(match worst {
                Severity::Ok => ExitCode::SUCCESS,
                Severity::Caution => ExitCode::from(EXIT_CAUTION),
                Severity::Action => ExitCode::from(EXIT_ACTION),
            })
        }
        Commands::Search {
            layout,
            telemetry,
            window,
        } => {
            run_search(&layout, &telemetry, window.window())?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Limits {
            layout,
            limits,
            write,
            keep_disabled,
        } => {
            run_limits(&layout, &limits, write.as_deref(), keep_disabled)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
