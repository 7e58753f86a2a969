//! PowerBI M to Metabase native SQL.
//!
//! Optional clauses are not reconstructed. Once `[[ ... ]]` has been stripped
//! or removed on the way to PowerBI there is nothing left to re-wrap.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::Encoder;
use crate::config::Config;
use crate::dialect::Dialect;
use crate::logger::Logger;

// g1 = query body
static QUERY_STRING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)\.Database\((?:["'][^"']*){4}\s*"(.*)"[^\[]"#).unwrap()
});
// g1 = param name, g2 = cast; g3 = concatenated param name, g4 = cast.
// The `"&`/`&"` around a concatenated name are consumed so only `'{{name}}'` remains.
static PARAM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@(\w+)(::\w+)?|'"\s*&\s*(\w+)\s*&\s*"'(::\w+)?"#).unwrap()
});
static LINE_FEED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)#\(lf\)").unwrap());
static CARRIAGE_RETURN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)#\(cr\)").unwrap());
static TAB: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)#\(tab\)").unwrap());

/// One step of the PowerBI to Metabase pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetabasePass {
    UnescapeQuotes,
    ReplaceParams,
    RestoreWhitespace,
}

impl MetabasePass {
    pub fn apply(self, query: String, log: &mut Logger) -> String {
        match self {
            MetabasePass::UnescapeQuotes => unescape_quotes(&query),
            MetabasePass::ReplaceParams => log.nested(|log| replace_params(&query, log)),
            MetabasePass::RestoreWhitespace => restore_whitespace(&query),
        }
    }
}

/// Converts queries into Metabase native SQL.
pub struct MetabaseEncoder<'a> {
    config: &'a Config,
}

impl<'a> MetabaseEncoder<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// The passes to run over a body. Quotes are only unescaped when the
    /// body came out of an M string literal.
    pub fn passes(&self, extracted: bool) -> Vec<MetabasePass> {
        let mut passes = Vec::with_capacity(3);
        if extracted {
            passes.push(MetabasePass::UnescapeQuotes);
        }
        if self.config.replace_powerbi_params {
            passes.push(MetabasePass::ReplaceParams);
        }
        passes.push(MetabasePass::RestoreWhitespace);
        passes
    }
}

impl Encoder for MetabaseEncoder<'_> {
    fn target(&self) -> Dialect {
        Dialect::Metabase
    }

    fn transpile(&self, sql: &str, log: &mut Logger) -> String {
        log.info("Converting query to Metabase...");

        let (body, extracted) = match extract_body(sql) {
            Some(body) => (body, true),
            None => {
                log.warn("No Database(...) wrapper found, converting the input as a bare query");
                (sql, false)
            }
        };

        let out = self
            .passes(extracted)
            .into_iter()
            .fold(body.to_string(), |query, pass| pass.apply(query, log));

        log.info("Metabase query assembled!");
        out
    }
}

/// Pull the SQL string literal out of a `Value.NativeQuery(Database(...), "...")` call.
pub fn extract_body(sql: &str) -> Option<&str> {
    QUERY_STRING
        .captures(sql)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Collapse M's doubled quotes back into single ones.
pub fn unescape_quotes(sql: &str) -> String {
    sql.replace("\"\"", "\"")
}

/// Rewrite `@name` and `'" & name & "'` parameters as Metabase `{{name}}`.
/// A `::type` cast directly after the parameter is kept.
pub fn replace_params(sql: &str, log: &mut Logger) -> String {
    log.info("Attempting to replace PowerBI parameters...");
    PARAM
        .replace_all(sql, |caps: &Captures| {
            if let Some(name) = caps.get(1) {
                let cast = caps.get(2).map_or("", |m| m.as_str());
                format!("{{{{{}}}}}{}", name.as_str(), cast)
            } else {
                let cast = caps.get(4).map_or("", |m| m.as_str());
                format!("'{{{{{}}}}}'{}", &caps[3], cast)
            }
        })
        .into_owned()
}

/// Turn `#(lf)`, `#(cr)` and `#(tab)` markers back into real characters.
pub fn restore_whitespace(sql: &str) -> String {
    let sql = LINE_FEED.replace_all(sql, "\n");
    let sql = CARRIAGE_RETURN.replace_all(&sql, "\r");
    TAB.replace_all(&sql, "\t").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const WRAPPED: &str = "let\n\tid = id, /* fill in type */\n\tSource = Value.NativeQuery(\n\t\tPostgreSQL.Database(\"db.local\", \"sales\"),\n\t\t\"select \"\"name\"\"#(lf)from t#(lf)where id = @id\",\n\t\t[\n\t\t\tid = id\n\t\t],\n\t\t[EnableFolding = true]\n\t)\nin\n\tSource";

    #[test]
    fn test_extract_body() {
        assert_eq!(
            extract_body(WRAPPED),
            Some("select \"\"name\"\"#(lf)from t#(lf)where id = @id")
        );
        assert_eq!(extract_body("select @id from t"), None);
    }

    #[test]
    fn test_extract_body_accepts_single_quoted_arguments() {
        let m = "Value.NativeQuery(PostgreSQL.Database('h', 'd'), \"select 1\", null)";
        assert_eq!(extract_body(m), Some("select 1"));
    }

    #[test]
    fn test_replace_params_keeps_cast() {
        let mut log = Logger::captured();
        assert_eq!(
            replace_params("select * from t where col = @id::int", &mut log),
            "select * from t where col = {{id}}::int"
        );
        assert_eq!(
            replace_params("where a = @a and b = @b_2", &mut log),
            "where a = {{a}} and b = {{b_2}}"
        );
    }

    #[test]
    fn test_replace_concatenated_params() {
        let mut log = Logger::captured();
        assert_eq!(
            replace_params(r#"where day = '"&day&"'::date"#, &mut log),
            "where day = '{{day}}'::date"
        );
        assert_eq!(
            replace_params(r#"where name = '" & name & "'"#, &mut log),
            "where name = '{{name}}'"
        );
    }

    #[test]
    fn test_restore_whitespace_is_case_insensitive() {
        assert_eq!(
            restore_whitespace("a#(lf)b#(LF)c#(Cr)#(lf)d#(tab)e"),
            "a\nb\nc\r\nd\te"
        );
    }

    #[test]
    fn test_transpile_wrapped_query() {
        let config = Config::default();
        let mut log = Logger::captured();
        let out = MetabaseEncoder::new(&config).transpile(WRAPPED, &mut log);
        assert_eq!(out, "select \"name\"\nfrom t\nwhere id = {{id}}");
    }

    #[test]
    fn test_transpile_without_param_replacement() {
        let config = Config {
            replace_powerbi_params: false,
            ..Config::default()
        };
        let mut log = Logger::captured();
        let out = MetabaseEncoder::new(&config).transpile(WRAPPED, &mut log);
        assert_eq!(out, "select \"name\"\nfrom t\nwhere id = @id");
    }

    #[test]
    fn test_bare_body_falls_back_with_warning() {
        let config = Config::default();
        let mut log = Logger::captured();
        let out = MetabaseEncoder::new(&config)
            .transpile("select \"\"x\"\"#(lf)from t where id = @id", &mut log);
        assert_eq!(out, "select \"\"x\"\"\nfrom t where id = {{id}}");
        assert!(log.lines().iter().any(|l| l.starts_with("[?] No Database(...) wrapper")));
    }

    #[test]
    fn test_passes() {
        let config = Config::default();
        let encoder = MetabaseEncoder::new(&config);
        assert_eq!(
            encoder.passes(true),
            [
                MetabasePass::UnescapeQuotes,
                MetabasePass::ReplaceParams,
                MetabasePass::RestoreWhitespace,
            ]
        );
        assert_eq!(
            encoder.passes(false),
            [MetabasePass::ReplaceParams, MetabasePass::RestoreWhitespace]
        );
    }
}
