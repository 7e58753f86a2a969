//! Metabase / native SQL to PowerBI M.
//!
//! The query body is pushed through an ordered list of [`PowerPass`]es and
//! then wrapped in a `Value.NativeQuery` call:
//!
//! ```text
//! let
//!     id = id, /* fill in type */
//!     Source = Value.NativeQuery(
//!         PostgreSQL.Database("host", "db"),
//!         "select * from t where id = @id",
//!         [
//!             id = id
//!         ],
//!         [EnableFolding = true]
//!     )
//! in
//!     Source
//! ```

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::{Encoder, ParameterSet};
use crate::config::Config;
use crate::dialect::Dialect;
use crate::logger::Logger;

static OPTIONAL_CLAUSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[\s*?\[(.*?)\]\s*?\]").unwrap());
static PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\s*?\{\s*(.*?)\s*\}\s*\}").unwrap());

/// One step of the Metabase to PowerBI pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerPass {
    EscapeQuotes,
    RemoveOptionalClauses,
    StripOptionalClauses,
    ReplaceParams,
    Inline,
    ExpandTabs(usize),
}

impl PowerPass {
    pub fn apply(self, query: String, params: &mut ParameterSet, log: &mut Logger) -> String {
        match self {
            PowerPass::EscapeQuotes => escape_quotes(&query),
            PowerPass::RemoveOptionalClauses => log.nested(|log| remove_optional_clauses(&query, log)),
            PowerPass::StripOptionalClauses => log.nested(|log| strip_optional_clauses(&query, log)),
            PowerPass::ReplaceParams => log.nested(|log| replace_params(&query, params, log)),
            PowerPass::Inline => inline_whitespace(&query),
            PowerPass::ExpandTabs(width) => expand_tabs(&query, width),
        }
    }
}

/// Converts queries into PowerBI M.
pub struct PowerBiEncoder<'a> {
    config: &'a Config,
}

impl<'a> PowerBiEncoder<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// The passes enabled by the current config, in execution order.
    pub fn passes(&self) -> Vec<PowerPass> {
        let cfg = self.config;
        let mut passes = vec![PowerPass::EscapeQuotes];

        if cfg.remove_metabase_optional_clauses {
            passes.push(PowerPass::RemoveOptionalClauses);
        } else if cfg.strip_metabase_optional_clauses {
            passes.push(PowerPass::StripOptionalClauses);
        }

        if cfg.replace_metabase_params {
            passes.push(PowerPass::ReplaceParams);
        }

        if cfg.inline_powerbi_query {
            passes.push(PowerPass::Inline);
        }

        if cfg.use_spaces {
            passes.push(PowerPass::ExpandTabs(cfg.tab_size));
        }

        passes
    }

    /// Wrap a finished body in the `let ... in Source` block.
    pub fn assemble(&self, body: &str, params: &ParameterSet, log: &mut Logger) -> String {
        log.info("Assembling PowerBI query...");
        let cfg = self.config;
        let tab = cfg.indent();
        let tab2 = tab.repeat(2);
        let tab3 = tab.repeat(3);

        let header = params
            .iter()
            .map(|p| format!("{}{} = {}, /* fill in type */", tab, p, p))
            .collect::<Vec<_>>()
            .join("\n");

        let footer = if !params.is_empty() || !cfg.replace_metabase_params {
            let entries = params
                .iter()
                .map(|p| format!("{}{} = {}", tab3, p, p))
                .collect::<Vec<_>>()
                .join(",\n");
            format!("{tab2}[\n{entries}\n{tab2}],")
        } else {
            format!("{tab2}null,")
        };

        let mut out = String::from("let\n");
        out.push_str(&header);
        out.push('\n');
        out.push_str(&format!("{tab}Source = Value.NativeQuery(\n"));
        out.push_str(&format!(
            "{tab2}PostgreSQL.Database(\"{}\", \"{}\"),\n",
            cfg.db_host, cfg.db_name
        ));
        out.push_str(&format!("{tab2}\"{body}\",\n"));
        out.push_str(&footer);
        out.push('\n');
        out.push_str(&format!("{tab2}[EnableFolding = true]\n"));
        out.push_str(&format!("{tab})\n"));
        out.push_str("in\n");
        out.push_str(&format!("{tab}Source"));

        log.info("PowerBI query assembled!");
        out
    }
}

impl Encoder for PowerBiEncoder<'_> {
    fn target(&self) -> Dialect {
        Dialect::PowerBi
    }

    fn transpile(&self, sql: &str, log: &mut Logger) -> String {
        log.info("Converting query to PowerBI...");
        let mut params = ParameterSet::new();
        let body = self
            .passes()
            .into_iter()
            .fold(sql.to_string(), |query, pass| pass.apply(query, &mut params, log));
        log.nested(|log| self.assemble(&body, &params, log))
    }
}

/// Double every lone `"`. Runs of two or more quotes are already escaped.
pub fn escape_quotes(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '"' {
            out.push(c);
            continue;
        }
        let mut run = 1;
        while chars.next_if_eq(&'"').is_some() {
            run += 1;
        }
        let width = if run == 1 { 2 } else { run };
        out.extend(std::iter::repeat_n('"', width));
    }

    out
}

/// Delete every `[[ ... ]]` clause, brackets included.
pub fn remove_optional_clauses(sql: &str, log: &mut Logger) -> String {
    log.info("Attempting to remove Metabase Optional Clauses...");
    log.warn("This may break queries chaining optional clauses with metabase SQL");
    log.nested(|log| {
        OPTIONAL_CLAUSE
            .replace_all(sql, |caps: &Captures| {
                let preview: String = caps[0].chars().take(10).collect();
                log.info(format!("Removed Metabase Optional Clause: {}...", preview));
                String::new()
            })
            .into_owned()
    })
}

/// Replace every `[[ ... ]]` clause with its body.
pub fn strip_optional_clauses(sql: &str, log: &mut Logger) -> String {
    log.info("Attempting to strip Metabase Optional Clauses...");
    log.nested(|log| {
        OPTIONAL_CLAUSE
            .replace_all(sql, |caps: &Captures| {
                log.info(format!("Stripped Metabase Optional Clause: [[{}]]", &caps[1]));
                caps[1].to_string()
            })
            .into_owned()
    })
}

/// Rewrite `{{name}}` as `@name`, recording each name in `params`.
pub fn replace_params(sql: &str, params: &mut ParameterSet, log: &mut Logger) -> String {
    log.info("Attempting to replace Metabase parameters...");
    log.warn("Ensure parameters are properly implemented in PowerBI");
    PARAM
        .replace_all(sql, |caps: &Captures| {
            params.insert(&caps[1]);
            format!("@{}", &caps[1])
        })
        .into_owned()
}

/// Swap real line breaks for PowerBI's `#(lf)` / `#(cr)` markers.
pub fn inline_whitespace(sql: &str) -> String {
    sql.replace('\n', "#(lf)").replace('\r', "#(cr)")
}

pub fn expand_tabs(sql: &str, width: usize) -> String {
    if !sql.contains('\t') {
        return sql.to_string();
    }
    sql.replace('\t', &" ".repeat(width))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn config() -> Config {
        Config {
            db_host: "db.local".to_string(),
            db_name: "sales".to_string(),
            remove_metabase_optional_clauses: false,
            strip_metabase_optional_clauses: false,
            ..Config::default()
        }
    }

    #[test]
    fn test_escape_quotes() {
        assert_eq!(escape_quotes(r#"select "id" from t"#), r#"select ""id"" from t"#);
        assert_eq!(escape_quotes(r#"a "" b"#), r#"a "" b"#);
        assert_eq!(escape_quotes(r#"a """ b"#), r#"a """ b"#);
        assert_eq!(escape_quotes("no quotes"), "no quotes");
    }

    #[test]
    fn test_escape_quotes_is_idempotent() {
        let once = escape_quotes(r#"select "a", '"' from "t""#);
        assert_eq!(once, r#"select ""a"", '""' from ""t"""#);
        assert_eq!(escape_quotes(&once), once);
    }

    #[test]
    fn test_remove_optional_clauses() {
        let mut log = Logger::captured();
        let out = remove_optional_clauses("select * from t where [[ x = 1 ]]", &mut log);
        assert_eq!(out, "select * from t where ");
        assert!(
            log.lines()
                .contains(&"----[i] Removed Metabase Optional Clause: [[ x = 1 ]...".to_string())
        );
    }

    #[test]
    fn test_strip_optional_clauses() {
        let mut log = Logger::captured();
        let out = strip_optional_clauses("select * from t where [[ x = 1 ]]", &mut log);
        assert_eq!(out, "select * from t where  x = 1 ");
    }

    #[test]
    fn test_optional_clauses_span_lines_and_are_lazy() {
        let mut log = Logger::captured();
        let sql = "select *\nfrom t\nwhere 1=1\n[[and a = 1\n]]\n[[and b = 2]]";
        assert_eq!(
            strip_optional_clauses(sql, &mut log),
            "select *\nfrom t\nwhere 1=1\nand a = 1\n\nand b = 2"
        );
        assert_eq!(
            remove_optional_clauses(sql, &mut log),
            "select *\nfrom t\nwhere 1=1\n\n"
        );
    }

    #[test]
    fn test_spaced_brackets_are_clauses() {
        let mut log = Logger::captured();
        assert_eq!(strip_optional_clauses("a [ [b] ] c", &mut log), "a b c");
    }

    #[test]
    fn test_replace_params_records_first_seen_order() {
        let mut log = Logger::captured();
        let mut params = ParameterSet::new();
        let out = replace_params("{{b}} and {{a}} or {{b}}", &mut params, &mut log);
        assert_eq!(out, "@b and @a or @b");
        assert_eq!(params.iter().collect::<Vec<_>>(), ["b", "a"]);
    }

    #[test]
    fn test_replace_params_trims_names() {
        let mut log = Logger::captured();
        let mut params = ParameterSet::new();
        let out = replace_params("where id = {{ id }}", &mut params, &mut log);
        assert_eq!(out, "where id = @id");
        assert!(params.contains("id"));
    }

    #[test]
    fn test_inline_whitespace() {
        assert_eq!(inline_whitespace("a\r\nb\nc"), "a#(cr)#(lf)b#(lf)c");
    }

    #[test]
    fn test_expand_tabs() {
        assert_eq!(expand_tabs("a\tb", 2), "a  b");
        assert_eq!(expand_tabs("a\tb", 0), "ab");
        assert_eq!(expand_tabs("ab", 8), "ab");
    }

    #[test]
    fn test_passes_follow_config() {
        let mut cfg = config();
        cfg.inline_powerbi_query = false;
        cfg.replace_metabase_params = false;
        assert_eq!(PowerBiEncoder::new(&cfg).passes(), [PowerPass::EscapeQuotes]);

        let cfg = Config {
            remove_metabase_optional_clauses: true,
            strip_metabase_optional_clauses: true,
            use_spaces: true,
            tab_size: 2,
            ..config()
        };
        assert_eq!(
            PowerBiEncoder::new(&cfg).passes(),
            [
                PowerPass::EscapeQuotes,
                PowerPass::RemoveOptionalClauses,
                PowerPass::ReplaceParams,
                PowerPass::Inline,
                PowerPass::ExpandTabs(2),
            ]
        );
    }

    #[test]
    fn test_transpile_with_params_and_spaces() {
        let cfg = Config {
            use_spaces: true,
            tab_size: 2,
            strip_metabase_optional_clauses: true,
            ..config()
        };
        let mut log = Logger::captured();
        let out = PowerBiEncoder::new(&cfg).transpile(
            "select * from t where id = {{id}}\n[[and name = {{name}}]]",
            &mut log,
        );
        let expected = [
            "let",
            "  id = id, /* fill in type */",
            "  name = name, /* fill in type */",
            "  Source = Value.NativeQuery(",
            "    PostgreSQL.Database(\"db.local\", \"sales\"),",
            "    \"select * from t where id = @id#(lf)and name = @name\",",
            "    [",
            "      id = id,",
            "      name = name",
            "    ],",
            "    [EnableFolding = true]",
            "  )",
            "in",
            "  Source",
        ]
        .join("\n");
        assert_eq!(out, expected);
    }

    #[test]
    fn test_transpile_without_params_emits_null() {
        let mut log = Logger::captured();
        let out = PowerBiEncoder::new(&config()).transpile("select \"a\"\tfrom t", &mut log);
        let expected = "let\n\n\tSource = Value.NativeQuery(\n\t\tPostgreSQL.Database(\"db.local\", \"sales\"),\n\t\t\"select \"\"a\"\"\tfrom t\",\n\t\tnull,\n\t\t[EnableFolding = true]\n\t)\nin\n\tSource";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_transpile_with_replacement_disabled_emits_empty_list() {
        let cfg = Config {
            replace_metabase_params: false,
            ..config()
        };
        let mut log = Logger::captured();
        let out = PowerBiEncoder::new(&cfg).transpile("select {{id}}", &mut log);
        assert!(out.contains("\"select {{id}}\",\n\t\t[\n\n\t\t],\n"));
    }
}
