use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use inventory_io::{open_workbook, OpenedWorkbook};
use inventory_model::InventoryConfig;
use inventory_reconcile::{
    InputError, ReconcileError, RosterImport, ScanMode, ScanOutcome, ScanRecord, ScanSession,
    SessionReport,
};
use serde::Serialize;

use crate::exports::write_scan_exports;
use crate::prompt::Prompter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(
    name = "inventory",
    about = "Reconcile the asset inventory sheet against barcode scans and the HR roster."
)]
pub struct Args {
    #[command(subcommand)]
    command: Command,

    /// Inventory workbook (.csv, .xlsx or .xlsm; .xlsb/.xls/.ods are read-only).
    /// Asked for on stdin when omitted.
    #[arg(long, global = true, value_name = "PATH")]
    inventory: Option<PathBuf>,

    /// Where to save the reconciled sheet (.csv, .xlsx or .xlsm). Defaults to
    /// the inventory itself, or a sibling `.xlsx` for read-only formats.
    #[arg(long, global = true, value_name = "PATH")]
    output: Option<PathBuf>,

    /// JSON file overriding the column layout and other settings.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Report format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Date stamped on scanned rows (YYYY-MM-DD). Defaults to today.
    #[arg(long, global = true)]
    date: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Command {
    /// Stamp scanned items as seen.
    ScanIn(ScanArgs),
    /// Stamp scanned items and mark them out at a location.
    ScanOut {
        #[command(flatten)]
        scan: ScanArgs,

        /// Location to apply; asked for on stdin when omitted.
        #[arg(long)]
        location: Option<String>,
    },
    /// Renumber the inventory against the HR roster export.
    ImportHr {
        /// Roster workbook. Asked for on stdin when omitted.
        #[arg(long, value_name = "PATH")]
        roster: Option<PathBuf>,
    },
}

#[derive(clap::Args)]
struct ScanArgs {
    /// Treat end of input like `done` instead of abandoning the session.
    #[arg(long)]
    finish_on_eof: bool,

    /// Write `not_scanned.csv` and `new_items.csv` into this directory.
    #[arg(long, value_name = "DIR")]
    export_dir: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct JsonOutput<'a> {
    saved_to: &'a Path,
    exports: &'a [PathBuf],
    report: &'a SessionReport,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), io::stderr());
    run_with_args(args, &mut prompter)
}

pub fn run_with_args<R: BufRead, W: Write>(
    args: Args,
    prompter: &mut Prompter<R, W>,
) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let today = args
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let inventory_path = match args.inventory {
        Some(path) => path,
        None => ask_path(prompter, "Inventory workbook")?,
    };
    let mut store = OpenedWorkbook::open(&inventory_path)
        .map_err(ReconcileError::from)
        .with_context(|| format!("failed to open inventory {}", inventory_path.display()))?;
    if let Some(output) = args.output {
        store = store.with_save_path(output);
    }
    if store.save_path() != inventory_path.as_path() {
        prompter.say(format!(
            "Changes will be saved to {}",
            store.save_path().display()
        ))?;
    }

    let (report, exports) = match args.command {
        Command::ScanIn(scan) => run_scan(
            &mut store,
            &config,
            ScanMode::ScanIn,
            today,
            None,
            &scan,
            prompter,
        )?,
        Command::ScanOut { scan, location } => run_scan(
            &mut store,
            &config,
            ScanMode::ScanOut,
            today,
            location,
            &scan,
            prompter,
        )?,
        Command::ImportHr { roster } => {
            let roster = match roster {
                Some(path) => path,
                None => ask_path(prompter, "HR roster workbook")?,
            };
            (run_import(&mut store, &config, today, &roster)?, Vec::new())
        }
    };

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    match args.format {
        OutputFormat::Text => {
            write!(handle, "{report}")?;
            writeln!(handle, "Saved to {}", store.save_path().display())?;
            for path in &exports {
                writeln!(handle, "Exported {}", path.display())?;
            }
        }
        OutputFormat::Json => {
            let output = JsonOutput {
                saved_to: store.save_path(),
                exports: &exports,
                report: &report,
            };
            serde_json::to_writer(&mut handle, &output)?;
            handle.write_all(b"\n")?;
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<InventoryConfig> {
    let Some(path) = path else {
        return Ok(InventoryConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = serde_json::from_str(&text)
        .with_context(|| format!("invalid config {}", path.display()))?;
    log::debug!("loaded config from {}", path.display());
    Ok(config)
}

/// Ask for a file path; a blank answer or end of input cancels the run.
fn ask_path<R: BufRead, W: Write>(prompter: &mut Prompter<R, W>, what: &str) -> Result<PathBuf> {
    let answer = prompter.ask(&format!("{what} path"))?;
    match answer.as_deref().map(str::trim) {
        Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
        _ => Err(ReconcileError::from(InputError::Cancelled))
            .with_context(|| format!("no {what} selected")),
    }
}

fn run_scan<R: BufRead, W: Write>(
    store: &mut OpenedWorkbook,
    config: &InventoryConfig,
    mode: ScanMode,
    today: NaiveDate,
    location: Option<String>,
    args: &ScanArgs,
    prompter: &mut Prompter<R, W>,
) -> Result<(SessionReport, Vec<PathBuf>)> {
    let mut session = ScanSession::begin(store, config, mode, today)?;

    if mode == ScanMode::ScanOut {
        let known = session.known_locations();
        if !known.is_empty() {
            prompter.say(format!("Known locations: {}", known.join(", ")))?;
        }
        let mut pending = location;
        loop {
            let raw = match pending.take() {
                Some(raw) => raw,
                None => match prompter.ask("Location")? {
                    Some(raw) => raw,
                    None => {
                        session.abandon();
                        return Err(ReconcileError::from(InputError::Cancelled))
                            .context("no location entered; nothing was saved");
                    }
                },
            };
            match session.set_location(&raw).map(str::to_string) {
                Ok(location) => {
                    prompter.say(format!("Scanning out to {location}"))?;
                    break;
                }
                Err(ReconcileError::LocationRequired) => {
                    prompter.say("A location is required to scan items out.")?;
                }
                Err(err) => {
                    session.abandon();
                    return Err(err.into());
                }
            }
        }
    }

    let mut new_items: Vec<ScanRecord> = Vec::new();
    loop {
        let Some(code) = prompter.ask("Scan (or 'done')")? else {
            if args.finish_on_eof {
                break;
            }
            session.abandon();
            anyhow::bail!("input ended before 'done'; nothing was saved");
        };

        match session.submit_event(&code) {
            Ok(ScanOutcome::FinishRequested) => break,
            Ok(ScanOutcome::Ignored) => {}
            Ok(outcome) => {
                prompter.say(&outcome)?;
                if let ScanOutcome::New(record) = outcome {
                    new_items.push(record);
                }
            }
            Err(err) => {
                session.abandon();
                return Err(err.into());
            }
        }
    }

    let report = session.finish()?;
    let exports = match &args.export_dir {
        Some(dir) => write_scan_exports(dir, &report.not_scanned, &new_items)?,
        None => Vec::new(),
    };
    Ok((report, exports))
}

fn run_import(
    store: &mut OpenedWorkbook,
    config: &InventoryConfig,
    today: NaiveDate,
    roster_path: &Path,
) -> Result<SessionReport> {
    let roster = open_workbook(roster_path)
        .map_err(ReconcileError::from)
        .with_context(|| format!("failed to open roster {}", roster_path.display()))?;
    let roster_sheet = roster
        .first_sheet()
        .with_context(|| format!("roster {} has no sheets", roster_path.display()))?;

    let mut import = RosterImport::begin(store, config, today);
    if let Err(err) = import.import_sheet(roster_sheet) {
        import.abandon();
        return Err(err.into());
    }
    Ok(import.finish()?)
}
