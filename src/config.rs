//! Runtime configuration
//!
//! Settings are resolved in order: explicit values, then environment
//! variables, then defaults.

use chrono::Locale;
use std::env;
use std::path::PathBuf;
use tracing::debug;

use crate::error::TrackerError;

/// Environment variable overriding the database path
pub const DB_PATH_ENV: &str = "HABIT_TRACKER_DB";

/// Environment variable overriding the calendar locale
pub const LOCALE_ENV: &str = "HABIT_TRACKER_LOCALE";

/// POSIX locale variables, highest priority first
const SYSTEM_LOCALE_ENVS: [&str; 3] = ["LC_ALL", "LC_TIME", "LANG"];

/// Directory name under the platform data directory
const DATA_DIR_NAME: &str = "habit-tracker";

/// Database file name
const DB_FILE_NAME: &str = "habits.db";

/// Locale used when nothing else resolves
pub const FALLBACK_LOCALE: Locale = Locale::en_US;

/// How month header runs are keyed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MonthRunKey {
    /// Abbreviated month name only; the same month in two adjacent years
    /// merges into one run
    #[default]
    Label,
    /// Year and month; a new year always starts a new month run
    YearMonth,
}

/// Resolved tracker configuration
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// SQLite database file
    pub db_path: PathBuf,
    /// Locale for month labels
    pub locale: Locale,
    /// Month header keying
    pub month_run_key: MonthRunKey,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            locale: FALLBACK_LOCALE,
            month_run_key: MonthRunKey::default(),
        }
    }
}

impl TrackerConfig {
    /// Resolve configuration from optional explicit values and the environment
    pub fn resolve(
        db_path: Option<PathBuf>,
        locale: Option<&str>,
    ) -> Result<Self, TrackerError> {
        let db_path = db_path
            .or_else(|| env::var_os(DB_PATH_ENV).map(PathBuf::from))
            .unwrap_or_else(default_db_path);

        let locale = match locale {
            Some(name) => parse_locale(name)?,
            None => match env::var(LOCALE_ENV) {
                Ok(name) if !name.trim().is_empty() => parse_locale(&name)?,
                _ => system_locale(),
            },
        };

        debug!(db_path = %db_path.display(), ?locale, "resolved tracker config");

        Ok(Self {
            db_path,
            locale,
            month_run_key: MonthRunKey::default(),
        })
    }

    pub fn with_month_run_key(mut self, key: MonthRunKey) -> Self {
        self.month_run_key = key;
        self
    }
}

/// Default database location under the platform data directory
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATA_DIR_NAME)
        .join(DB_FILE_NAME)
}

/// Parse a locale name such as `de_DE`, `de-DE` or `de_DE.UTF-8@euro`
pub fn parse_locale(name: &str) -> Result<Locale, TrackerError> {
    let normalized = normalize_locale_name(name);
    match normalized.as_str() {
        "C" | "POSIX" => Ok(Locale::POSIX),
        other => Locale::try_from(other)
            .map_err(|_| TrackerError::UnknownLocale(name.to_string())),
    }
}

/// Runtime default locale from the POSIX environment, falling back to `en_US`
pub fn system_locale() -> Locale {
    for var in SYSTEM_LOCALE_ENVS {
        let Ok(value) = env::var(var) else {
            continue;
        };
        if value.trim().is_empty() {
            continue;
        }
        match parse_locale(&value) {
            Ok(locale) => return locale,
            Err(_) => {
                debug!(var, value = %value, "ignoring unrecognized system locale");
            }
        }
    }
    FALLBACK_LOCALE
}

/// Strip encoding and modifier suffixes and use `_` as the region separator
fn normalize_locale_name(name: &str) -> String {
    let base = name.trim();
    let base = base.split('@').next().unwrap_or(base);
    let base = base.split('.').next().unwrap_or(base);
    base.replace('-', "_")
}
