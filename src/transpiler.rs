//! Query transpiler.
//!
//! Detects the dialect of an incoming query and hands it to the encoder for
//! the opposite dialect. Conversion always flips direction; a query is never
//! reformatted in place.

pub mod metabase;
pub mod powerbi;

use crate::config::Config;
use crate::dialect::Dialect;
use crate::error::PowerbaseResult;
use crate::logger::Logger;

/// Rewrites a query into one target dialect.
pub trait Encoder {
    /// The dialect this encoder emits.
    fn target(&self) -> Dialect;

    /// Convert `sql` into the target dialect.
    fn transpile(&self, sql: &str, log: &mut Logger) -> String;
}

/// Parameter names in order of first appearance, without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    names: Vec<String>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `name`. Returns false if it was already present.
    pub fn insert(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        self.names.push(name.to_string());
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Detects a query's dialect and converts it to the other one.
pub struct Transpiler<'a> {
    config: &'a Config,
}

impl<'a> Transpiler<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Detect the source dialect of `sql`.
    pub fn detect(&self, sql: &str, log: &mut Logger) -> PowerbaseResult<Dialect> {
        let dialect = Dialect::detect(sql)?;
        log.info("SQL statement detected");
        log.success(format!("Detected encoding: {}", dialect));
        Ok(dialect)
    }

    /// Convert `sql` into the dialect it is not written in.
    pub fn convert(&self, sql: &str, log: &mut Logger) -> PowerbaseResult<String> {
        let source = self.detect(sql, log)?;
        let encoder = source.target().encoder(self.config);
        Ok(encoder.transpile(sql, log))
    }
}
