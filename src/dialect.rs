//! Dialect detection.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::Config;
use crate::error::{PowerbaseError, PowerbaseResult};
use crate::transpiler::Encoder;
use crate::transpiler::metabase::MetabaseEncoder;
use crate::transpiler::powerbi::PowerBiEncoder;

static SQL_KEYWORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)select|from").unwrap());
static INLINE_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)#\((?:lf|cr)\)").unwrap());
static NATIVE_QUERY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)NativeQuery\(").unwrap());
static METABASE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{|\}\}|\[\[|\]\]").unwrap());

/// Supported query dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// PowerBI M, `Value.NativeQuery(...)` wrapping an inlined SQL string.
    PowerBi,
    /// Metabase native SQL with `{{param}}` and `[[ optional ]]` syntax.
    Metabase,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dialect::PowerBi => write!(f, "PowerBI"),
            Dialect::Metabase => write!(f, "Metabase"),
        }
    }
}

impl Dialect {
    /// Classify `sql` as exactly one dialect.
    ///
    /// Fails when the text has no SQL keyword at all, or when the marker
    /// sets of both dialects (or neither) are present.
    pub fn detect(sql: &str) -> PowerbaseResult<Self> {
        if !SQL_KEYWORD.is_match(sql) {
            return Err(PowerbaseError::no_sql(sql));
        }

        let is_powerbi = INLINE_MARKER.is_match(sql) && NATIVE_QUERY.is_match(sql);
        let is_metabase = METABASE_MARKER.is_match(sql);

        match (is_powerbi, is_metabase) {
            (true, false) => Ok(Dialect::PowerBi),
            (false, true) => Ok(Dialect::Metabase),
            (true, true) => Err(PowerbaseError::Ambiguous(
                "query carries both PowerBI and Metabase markers",
            )),
            (false, false) => Err(PowerbaseError::Ambiguous(
                "query carries neither PowerBI nor Metabase markers",
            )),
        }
    }

    /// The dialect a query written in `self` gets converted into.
    pub fn target(self) -> Self {
        match self {
            Dialect::PowerBi => Dialect::Metabase,
            Dialect::Metabase => Dialect::PowerBi,
        }
    }

    /// The encoder that produces queries in this dialect.
    pub fn encoder(self, config: &Config) -> Box<dyn Encoder + '_> {
        match self {
            Dialect::PowerBi => Box::new(PowerBiEncoder::new(config)),
            Dialect::Metabase => Box::new(MetabaseEncoder::new(config)),
        }
    }
}
