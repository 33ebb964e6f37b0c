//! Habit CLI - Command-line interface for the habit tracker core
//!
//! Commands:
//! - add / list / show / delete: Manage habits in the local database
//! - calendar: Lay out the contribution calendar for a period history
//! - stats: Compute streaks for a period history
//! - codec: Encode or decode stored habit type strings
//! - doctor: Diagnose database and locale configuration

use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use habit_core::calendar::DEFAULT_CELL_WIDTH;
use habit_core::config::{DB_PATH_ENV, LOCALE_ENV};
use habit_core::form::{HabitKind, RenewalUnit};
use habit_core::{
    CalendarHeaderAggregator, CalendarLayout, CellStatus, Habit, HabitDraft, HabitProgress,
    HabitRepository, HabitStats, HabitType, HabitTypeCodec, MonthRunKey, PeriodData,
    SqliteRowStore, TrackerConfig, TrackerError, TRACKER_VERSION,
};

/// Environment variable holding the log filter
const LOG_ENV: &str = "HABIT_LOG";

/// Habit - Track recurring habits and their contribution calendar
#[derive(Parser)]
#[command(name = "habit")]
#[command(version = TRACKER_VERSION)]
#[command(about = "Track recurring habits and their contribution calendar", long_about = None)]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, env = DB_PATH_ENV)]
    db: Option<PathBuf>,

    /// Locale for month labels (e.g. "en_US", "de_DE")
    #[arg(long, global = true, env = LOCALE_ENV)]
    locale: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new habit
    Add {
        /// Habit name
        #[arg(long)]
        name: String,

        /// Habit kind
        #[arg(long, value_enum, default_value = "boolean")]
        kind: KindArg,

        /// Renewal period
        #[arg(long, default_value = "24")]
        renewal: String,

        /// Unit the renewal period is given in
        #[arg(long, value_enum, default_value = "hours")]
        renewal_unit: RenewalUnitArg,

        /// Target value (numeric habits)
        #[arg(long, default_value = "")]
        target: String,

        /// Measurement unit (numeric habits)
        #[arg(long, default_value = "")]
        unit: String,

        /// Text shown before the current value
        #[arg(long, default_value = "")]
        prefix: String,

        /// Text shown after the unit
        #[arg(long, default_value = "")]
        suffix: String,
    },

    /// List stored habits, newest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Skip rows that fail to decode instead of failing
        #[arg(long)]
        skip_corrupt: bool,
    },

    /// Show one habit
    Show {
        /// Habit id
        id: i64,

        /// Also show progress after this many hours of the current period
        #[arg(long)]
        elapsed_hours: Option<u32>,

        /// Value logged so far in the current period (numeric habits)
        #[arg(long)]
        value: Option<f64>,

        /// Mark the current period as completed
        #[arg(long)]
        completed: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a habit
    Delete {
        /// Habit id
        id: i64,
    },

    /// Lay out the contribution calendar for a period history
    Calendar {
        #[command(flatten)]
        history: HistoryArgs,

        /// Renewal period in hours (defaults to the stored habit's, or 24)
        #[arg(long)]
        renewal_hours: Option<u32>,

        /// Start a new month run whenever the year changes
        #[arg(long)]
        year_month_runs: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compute streak statistics for a period history
    Stats {
        #[command(flatten)]
        history: HistoryArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Encode or decode stored habit type strings
    Codec {
        #[command(subcommand)]
        action: CodecAction,
    },

    /// Diagnose database and locale configuration
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(clap::Args)]
struct HistoryArgs {
    /// Period history as a JSON array (use - for stdin)
    #[arg(short, long)]
    input: PathBuf,

    /// Take the habit type from a stored habit
    #[arg(long, conflicts_with = "habit_type")]
    habit: Option<i64>,

    /// Encoded habit type (e.g. "NUMERIC|km|5.0||")
    #[arg(long = "type")]
    habit_type: Option<String>,
}

#[derive(Subcommand)]
enum CodecAction {
    /// Encode habit type JSON into its stored form
    Encode {
        /// Habit type JSON (e.g. '{"kind":"numeric","unit":"km","target":5}')
        json: String,
    },
    /// Decode a stored habit type into JSON
    Decode {
        /// Stored habit type string
        encoded: String,
    },
}

#[derive(Clone, ValueEnum)]
enum KindArg {
    /// Done or not done
    Boolean,
    /// Measured against a target
    Numeric,
}

#[derive(Clone, ValueEnum)]
enum RenewalUnitArg {
    Hours,
    Days,
}

impl From<KindArg> for HabitKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Boolean => HabitKind::Boolean,
            KindArg::Numeric => HabitKind::Numeric,
        }
    }
}

impl From<RenewalUnitArg> for RenewalUnit {
    fn from(unit: RenewalUnitArg) -> Self {
        match unit {
            RenewalUnitArg::Hours => RenewalUnit::Hours,
            RenewalUnitArg::Days => RenewalUnit::Days,
        }
    }
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run(cli: Cli) -> Result<(), HabitCliError> {
    let Cli {
        db,
        locale,
        command,
    } = cli;

    if let Commands::Codec { action } = command {
        return cmd_codec(action);
    }

    let config = TrackerConfig::resolve(db, locale.as_deref())?;

    match command {
        Commands::Add {
            name,
            kind,
            renewal,
            renewal_unit,
            target,
            unit,
            prefix,
            suffix,
        } => {
            let draft = HabitDraft {
                name,
                kind: kind.into(),
                renewal_period: renewal,
                renewal_unit: renewal_unit.into(),
                target_value: target,
                unit,
                prefix,
                suffix,
            };
            cmd_add(&config, draft)
        }

        Commands::List { json, skip_corrupt } => cmd_list(&config, json, skip_corrupt),

        Commands::Show {
            id,
            elapsed_hours,
            value,
            completed,
            json,
        } => cmd_show(&config, id, elapsed_hours, value, completed, json),

        Commands::Delete { id } => cmd_delete(&config, id),

        Commands::Calendar {
            history,
            renewal_hours,
            year_month_runs,
            json,
        } => {
            let config = if year_month_runs {
                config.with_month_run_key(MonthRunKey::YearMonth)
            } else {
                config
            };
            cmd_calendar(&config, &history, renewal_hours, json)
        }

        Commands::Stats { history, json } => cmd_stats(&config, &history, json),

        Commands::Doctor { json } => cmd_doctor(&config, json),

        Commands::Codec { action } => cmd_codec(action),
    }
}

fn open_repository(config: &TrackerConfig) -> Result<HabitRepository<SqliteRowStore>, HabitCliError> {
    Ok(HabitRepository::open(&config.db_path)?)
}

fn cmd_add(config: &TrackerConfig, draft: HabitDraft) -> Result<(), HabitCliError> {
    let habit = draft.into_habit(Local::now().naive_local())?;
    let mut repo = open_repository(config)?;
    let id = repo.insert_habit(&habit)?;
    println!("{}", id);
    Ok(())
}

fn cmd_list(config: &TrackerConfig, json: bool, skip_corrupt: bool) -> Result<(), HabitCliError> {
    let repo = open_repository(config)?;

    if skip_corrupt {
        let listing = repo.get_all_habits_lenient()?;
        if json {
            println!("{}", serde_json::to_string_pretty(&listing)?);
        } else {
            print_habits(&listing.habits);
            for row in &listing.corrupt {
                println!("  [CORRUPT] #{}: {}", row.id, row.reason);
            }
        }
        return Ok(());
    }

    let habits = repo.get_all_habits()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&habits)?);
    } else {
        print_habits(&habits);
    }
    Ok(())
}

fn print_habits(habits: &[Habit]) {
    for habit in habits {
        println!(
            "  #{} {} [{}] every {}h",
            habit.id, habit.name, habit.habit_type, habit.renewal_hours
        );
    }
}

fn cmd_show(
    config: &TrackerConfig,
    id: i64,
    elapsed_hours: Option<u32>,
    value: Option<f64>,
    completed: bool,
    json: bool,
) -> Result<(), HabitCliError> {
    let repo = open_repository(config)?;
    let habit = repo
        .get_habit_by_id(id)?
        .ok_or(HabitCliError::Tracker(TrackerError::NotFound(id)))?;
    let progress = elapsed_hours.map(|elapsed| HabitProgress::for_period(&habit, value, completed, elapsed));

    if json {
        let output = serde_json::json!({
            "habit": habit,
            "progress": progress,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Habit #{}", habit.id);
    println!("  Name:     {}", habit.name);
    println!("  Type:     {}", habit.habit_type);
    println!("  Renewal:  every {}h", habit.renewal_hours);
    println!("  Created:  {}", habit.created_at);
    println!("  Updated:  {}", habit.updated_at);

    if let Some(progress) = progress {
        println!("\nCurrent period:");
        println!("  Completed: {}", progress.is_completed);
        println!(
            "  Remaining: {}h ({:?})",
            progress.remaining_hours, progress.urgency
        );
        if let Some(summary) = &progress.summary {
            println!("  {}", summary);
        }
    }
    Ok(())
}

fn cmd_delete(config: &TrackerConfig, id: i64) -> Result<(), HabitCliError> {
    let mut repo = open_repository(config)?;
    if !repo.delete_habit(id)? {
        return Err(TrackerError::NotFound(id).into());
    }
    Ok(())
}

/// Period history plus the habit type and stored renewal it is judged against
fn load_history(
    config: &TrackerConfig,
    history: &HistoryArgs,
) -> Result<(Vec<PeriodData>, HabitType, Option<u32>), HabitCliError> {
    let periods: Vec<PeriodData> = serde_json::from_str(&read_input(&history.input)?)?;

    match (&history.habit_type, history.habit) {
        (Some(encoded), _) => Ok((periods, decode_type_arg(encoded)?, None)),
        (None, Some(id)) => {
            let repo = open_repository(config)?;
            let habit = repo
                .get_habit_by_id(id)?
                .ok_or(HabitCliError::Tracker(TrackerError::NotFound(id)))?;
            Ok((periods, habit.habit_type, Some(habit.renewal_hours)))
        }
        (None, None) => Err(HabitCliError::MissingHabitType),
    }
}

/// Decode a habit type typed on the command line
fn decode_type_arg(encoded: &str) -> Result<HabitType, HabitCliError> {
    HabitTypeCodec::decode(encoded).map_err(HabitCliError::Encoding)
}

fn read_input(input: &Path) -> Result<String, HabitCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

fn cmd_calendar(
    config: &TrackerConfig,
    history: &HistoryArgs,
    renewal_hours: Option<u32>,
    json: bool,
) -> Result<(), HabitCliError> {
    let (periods, habit_type, stored_renewal) = load_history(config, history)?;
    let renewal_hours = renewal_hours.or(stored_renewal).unwrap_or(24);

    let aggregator = CalendarHeaderAggregator::from_config(config);
    let layout = CalendarLayout::build(&periods, &habit_type, renewal_hours, &aggregator);

    if json {
        println!("{}", serde_json::to_string_pretty(&layout)?);
        return Ok(());
    }

    let year_widths = layout.year_widths(DEFAULT_CELL_WIDTH);
    for (run, width) in layout.headers.years.iter().zip(&year_widths) {
        println!("  {:<8} {:>3} days  {:>5}px", run.label, run.day_count, width);
    }
    println!();
    let month_widths = layout.month_widths(DEFAULT_CELL_WIDTH);
    for (run, width) in layout.headers.months.iter().zip(&month_widths) {
        println!("  {:<8} {:>3} days  {:>5}px", run.label, run.day_count, width);
    }
    println!();

    for day in &layout.days {
        let cells: String = day
            .cells
            .iter()
            .map(|cell| match cell {
                CellStatus::Complete => '#',
                CellStatus::Partial => '+',
                CellStatus::Empty => '.',
            })
            .chain(std::iter::repeat(' ').take(day.empty_slots))
            .collect();
        println!("  {}  {:>2}  {}", day.date, day.day_of_month, cells);
    }

    println!("\n  . {}   # {}", layout.empty_label, layout.complete_label);
    Ok(())
}

fn cmd_stats(config: &TrackerConfig, history: &HistoryArgs, json: bool) -> Result<(), HabitCliError> {
    let (periods, habit_type, _) = load_history(config, history)?;
    let stats = HabitStats::from_periods(&periods, &habit_type);

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Current streak: {}", stats.current_streak);
        println!("Best streak:    {}", stats.best_streak);
        println!(
            "Achieved:       {}/{} ({:.1}%)",
            stats.achieved_periods, stats.total_periods, stats.success_rate
        );
        println!("Active days:    {}", stats.active_days);
    }
    Ok(())
}

fn cmd_codec(action: CodecAction) -> Result<(), HabitCliError> {
    match action {
        CodecAction::Encode { json } => {
            let habit_type: HabitType = serde_json::from_str(&json)?;
            habit_type.validate()?;
            println!("{}", HabitTypeCodec::encode(&habit_type));
        }
        CodecAction::Decode { encoded } => {
            let habit_type = decode_type_arg(&encoded)?;
            println!("{}", serde_json::to_string(&habit_type)?);
        }
    }
    Ok(())
}

fn cmd_doctor(config: &TrackerConfig, json: bool) -> Result<(), HabitCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "version".to_string(),
        status: CheckStatus::Ok,
        message: format!("habit-core version {}", TRACKER_VERSION),
    });

    checks.push(DoctorCheck {
        name: "locale".to_string(),
        status: CheckStatus::Ok,
        message: format!("Month labels use {:?}", config.locale),
    });

    // Check the database opens and every row decodes
    match HabitRepository::open(&config.db_path) {
        Ok(repo) => match repo.get_all_habits_lenient() {
            Ok(listing) if listing.corrupt.is_empty() => checks.push(DoctorCheck {
                name: "database".to_string(),
                status: CheckStatus::Ok,
                message: format!(
                    "{} ({} habits)",
                    config.db_path.display(),
                    listing.habits.len()
                ),
            }),
            Ok(listing) => checks.push(DoctorCheck {
                name: "database".to_string(),
                status: CheckStatus::Warning,
                message: format!(
                    "{} corrupt rows: {}",
                    listing.corrupt.len(),
                    listing
                        .corrupt
                        .iter()
                        .map(|row| row.id.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            }),
            Err(e) => checks.push(DoctorCheck {
                name: "database".to_string(),
                status: CheckStatus::Error,
                message: format!("Cannot read habits: {}", e),
            }),
        },
        Err(e) => checks.push(DoctorCheck {
            name: "database".to_string(),
            status: CheckStatus::Error,
            message: format!("Cannot open {}: {}", config.db_path.display(), e),
        }),
    }

    // Check stdin is available (for --input -)
    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (--input - ready)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        version: TRACKER_VERSION.to_string(),
        db_path: config.db_path.display().to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Habit Doctor Report");
        println!("===================");
        println!("Version:  {}", report.version);
        println!("Database: {}", report.db_path);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report.checks.iter().any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(HabitCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Error types

#[derive(Debug)]
enum HabitCliError {
    Io(io::Error),
    Tracker(TrackerError),
    /// Encoded habit type given as an argument
    Encoding(TrackerError),
    Json(serde_json::Error),
    MissingHabitType,
    DoctorFailed,
}

impl From<io::Error> for HabitCliError {
    fn from(e: io::Error) -> Self {
        HabitCliError::Io(e)
    }
}

impl From<TrackerError> for HabitCliError {
    fn from(e: TrackerError) -> Self {
        HabitCliError::Tracker(e)
    }
}

impl From<serde_json::Error> for HabitCliError {
    fn from(e: serde_json::Error) -> Self {
        HabitCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<HabitCliError> for CliError {
    fn from(e: HabitCliError) -> Self {
        match e {
            HabitCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            HabitCliError::Tracker(e) => tracker_error(e),
            HabitCliError::Encoding(e) => CliError {
                code: "INVALID_ENCODING".to_string(),
                message: e.to_string(),
                hint: Some(
                    "Expected BOOLEAN or NUMERIC|<unit>|<target>|<prefix>|<suffix>".to_string(),
                ),
            },
            HabitCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            HabitCliError::MissingHabitType => CliError {
                code: "MISSING_HABIT_TYPE".to_string(),
                message: "No habit type given".to_string(),
                hint: Some("Pass --habit <id> or --type <encoded>".to_string()),
            },
            HabitCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

fn tracker_error(e: TrackerError) -> CliError {
    let (code, hint) = match &e {
        TrackerError::InvalidEncoding { .. } | TrackerError::DateParse(_) => (
            "CORRUPT_ROW",
            "Run 'habit list --skip-corrupt' to find affected rows",
        ),
        TrackerError::InvalidHabit(_) => ("INVALID_HABIT", "Check the habit fields and retry"),
        TrackerError::NotFound(_) => ("NOT_FOUND", "Run 'habit list' to see habit ids"),
        TrackerError::Storage(_) => ("STORAGE_ERROR", "Run 'habit doctor' to check the database"),
        TrackerError::Io(_) => ("IO_ERROR", "Check file paths and permissions"),
        TrackerError::Json(_) => ("JSON_ERROR", "Check JSON syntax"),
        TrackerError::UnknownLocale(_) => (
            "UNKNOWN_LOCALE",
            "Use a locale name such as en_US or de_DE",
        ),
    };

    CliError {
        code: code.to_string(),
        message: e.to_string(),
        hint: Some(hint.to_string()),
    }
}

// Report types

#[derive(serde::Serialize)]
struct DoctorReport {
    version: String,
    db_path: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_encoding_error_is_not_corrupt_row() {
        let err = decode_type_arg("NUMERIC|km").unwrap_err();
        let cli_error = CliError::from(err);
        assert_eq!(cli_error.code, "INVALID_ENCODING");
        assert!(cli_error.message.contains("NUMERIC|km"));
        assert!(!cli_error.hint.unwrap().contains("--skip-corrupt"));
    }

    #[test]
    fn test_stored_encoding_error_is_corrupt_row() {
        let err = HabitCliError::from(HabitTypeCodec::decode("WEIRD").unwrap_err());
        let cli_error = CliError::from(err);
        assert_eq!(cli_error.code, "CORRUPT_ROW");
        assert!(cli_error.hint.unwrap().contains("--skip-corrupt"));
    }

    #[test]
    fn test_decode_type_arg() {
        assert_eq!(decode_type_arg("BOOLEAN").unwrap(), HabitType::Boolean);
        assert_eq!(
            decode_type_arg("NUMERIC|km|5.0||").unwrap(),
            HabitType::numeric("km", 5.0)
        );
    }
}
