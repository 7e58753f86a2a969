//! Typed configuration loaded from environment variables.
//!
//! Every setting is required. Values are parsed straight into [`Config`], so
//! nothing downstream ever sees an unvalidated string.
//!
//! | Variable                           | Type   |
//! |------------------------------------|--------|
//! | `DB_HOST`                          | string |
//! | `DB_NAME`                          | string |
//! | `REPLACE_POWERBI_PARAMS`           | bool   |
//! | `REPLACE_METABASE_PARAMS`          | bool   |
//! | `POWERBI_PARAMS_USE_CONCATENATION` | bool   |
//! | `REMOVE_METABASE_OPTIONAL_CLAUSES` | bool   |
//! | `STRIP_METABASE_OPTIONAL_CLAUSES`  | bool   |
//! | `INLINE_POWERBI_QUERY`             | bool   |
//! | `USE_SPACES`                       | bool   |
//! | `TAB_SIZE`                         | number |
//! | `VERBOSITY`                        | number |

use crate::error::{PowerbaseError, PowerbaseResult};
use crate::logger::{Logger, MAX_VERBOSITY};

/// Largest accepted `TAB_SIZE`.
pub const MAX_TAB_SIZE: usize = u16::MAX as usize;

/// Validated settings consulted by the encoders.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Host literal emitted in the PowerBI `Database(...)` call.
    pub db_host: String,
    /// Database literal emitted in the PowerBI `Database(...)` call.
    pub db_name: String,
    /// Rewrite `@name` into `{{name}}` when converting to Metabase.
    pub replace_powerbi_params: bool,
    /// Rewrite `{{name}}` into `@name` when converting to PowerBI.
    pub replace_metabase_params: bool,
    /// Reserved. Validated, but no pass branches on it yet.
    pub powerbi_params_use_concatenation: bool,
    /// Delete `[[ ... ]]` clauses entirely.
    pub remove_metabase_optional_clauses: bool,
    /// Unwrap `[[ ... ]]` clauses, keeping their body.
    pub strip_metabase_optional_clauses: bool,
    /// Turn line breaks into `#(lf)` / `#(cr)` markers.
    pub inline_powerbi_query: bool,
    /// Indent with `tab_size` spaces instead of a tab.
    pub use_spaces: bool,
    pub tab_size: usize,
    /// Console verbosity, 0 through 3.
    pub verbosity: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_host: "localhost".to_string(),
            db_name: "postgres".to_string(),
            replace_powerbi_params: true,
            replace_metabase_params: true,
            powerbi_params_use_concatenation: false,
            remove_metabase_optional_clauses: false,
            strip_metabase_optional_clauses: true,
            inline_powerbi_query: true,
            use_spaces: false,
            tab_size: 4,
            verbosity: MAX_VERBOSITY,
        }
    }
}

impl Config {
    /// Load and audit the configuration from the process environment.
    pub fn from_env(log: &mut Logger) -> PowerbaseResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), log)
    }

    /// Load and audit the configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F, log: &mut Logger) -> PowerbaseResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // The audit itself reports at the requested verbosity.
        log.set_verbosity(early_verbosity(&lookup));
        log.info("Loading config...");
        let config = log.nested(|log| {
            log.info("Performing audit...");
            Self::parse(&lookup, log)
        })?;
        log.success("Config audit complete");
        Ok(config)
    }

    fn parse<F>(lookup: &F, log: &mut Logger) -> PowerbaseResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self {
            db_host: string(lookup, "DB_HOST")?,
            db_name: string(lookup, "DB_NAME")?,
            replace_powerbi_params: boolean(lookup, "REPLACE_POWERBI_PARAMS")?,
            replace_metabase_params: boolean(lookup, "REPLACE_METABASE_PARAMS")?,
            powerbi_params_use_concatenation: boolean(lookup, "POWERBI_PARAMS_USE_CONCATENATION")?,
            remove_metabase_optional_clauses: boolean(lookup, "REMOVE_METABASE_OPTIONAL_CLAUSES")?,
            strip_metabase_optional_clauses: boolean(lookup, "STRIP_METABASE_OPTIONAL_CLAUSES")?,
            inline_powerbi_query: boolean(lookup, "INLINE_POWERBI_QUERY")?,
            use_spaces: boolean(lookup, "USE_SPACES")?,
            tab_size: 0,
            verbosity: MAX_VERBOSITY,
        };

        let tab_size = number(lookup, "TAB_SIZE")?;
        if tab_size < 0.0 {
            return Err(PowerbaseError::NegativeTabSize(tab_size));
        }
        if tab_size > MAX_TAB_SIZE as f64 {
            return Err(PowerbaseError::TabSizeTooLarge {
                max: MAX_TAB_SIZE,
                found: tab_size,
            });
        }
        config.tab_size = tab_size.trunc() as usize;

        let verbosity = number(lookup, "VERBOSITY")?;
        config.verbosity = if let Some(level) = verbosity_level(verbosity) {
            level
        } else {
            log.warn(format!(
                "Setting \"VERBOSITY\" must be a number 0-3, found {}",
                verbosity
            ));
            log.info("Defaulting VERBOSITY to 3...");
            MAX_VERBOSITY
        };

        if config.remove_metabase_optional_clauses && config.strip_metabase_optional_clauses {
            log.warn("Settings conflict:");
            log.nested(|log| {
                log.warn("Both REMOVE_METABASE_OPTIONAL_CLAUSES and STRIP_METABASE_OPTIONAL_CLAUSES are set to true!");
                log.warn("STRIP_METABASE_OPTIONAL_CLAUSES will be ignored.");
            });
            config.strip_metabase_optional_clauses = false;
        }

        Ok(config)
    }

    /// One level of indentation in generated PowerBI queries.
    pub fn indent(&self) -> String {
        if self.use_spaces {
            " ".repeat(self.tab_size)
        } else {
            "\t".to_string()
        }
    }
}

/// Levels compare with `>`, so rounding up keeps 2.5 as chatty as 3.
fn verbosity_level(raw: f64) -> Option<u8> {
    (0.0..=f64::from(MAX_VERBOSITY))
        .contains(&raw)
        .then(|| raw.ceil() as u8)
}

/// `VERBOSITY` read leniently, before anything is validated.
fn early_verbosity<F>(lookup: &F) -> u8
where
    F: Fn(&str) -> Option<String>,
{
    number(lookup, "VERBOSITY")
        .ok()
        .and_then(verbosity_level)
        .unwrap_or(MAX_VERBOSITY)
}

fn string<F>(lookup: &F, key: &'static str) -> PowerbaseResult<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).ok_or(PowerbaseError::MissingSetting(key))
}

fn boolean<F>(lookup: &F, key: &'static str) -> PowerbaseResult<bool>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = string(lookup, key)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        found => Err(PowerbaseError::InvalidBool {
            key,
            found: found.to_string(),
        }),
    }
}

fn number<F>(lookup: &F, key: &'static str) -> PowerbaseResult<f64>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = string(lookup, key)?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| PowerbaseError::InvalidNumber {
            key,
            found: trimmed.to_string(),
        })
}
