//! # powerbase
//!
//! Flips a SQL query between PowerBI's M wrapper syntax and Metabase's
//! native-SQL syntax.
//!
//! ## Quick Example
//!
//! ```rust
//! use powerbase::prelude::*;
//!
//! let config = Config::default();
//! let mut log = Logger::captured();
//!
//! let query = "select *\nfrom users\nwhere id = {{id}}";
//!
//! let m = powerbase::convert(query, &config, &mut log)?;
//! assert!(m.contains("\"select *#(lf)from users#(lf)where id = @id\""));
//!
//! let sql = powerbase::convert(&m, &config, &mut log)?;
//! assert_eq!(sql, query);
//! # Ok::<(), powerbase::error::PowerbaseError>(())
//! ```
//!
//! ## Syntax
//!
//! | Concept          | Metabase        | PowerBI M                   |
//! |------------------|-----------------|-----------------------------|
//! | Parameter        | `{{name}}`      | `@name`                     |
//! | Optional clause  | `[[ ... ]]`     | (stripped or removed)       |
//! | Line break       | newline         | `#(lf)` / `#(cr)`           |
//! | Wrapper          | none            | `Value.NativeQuery(...)`    |

pub mod clipboard;
pub mod config;
pub mod dialect;
pub mod error;
pub mod logger;
pub mod transpiler;

pub mod prelude {
    pub use crate::clipboard::{Clipboard, MemoryClipboard, SystemClipboard};
    pub use crate::config::Config;
    pub use crate::dialect::Dialect;
    pub use crate::error::*;
    pub use crate::logger::Logger;
    pub use crate::transpiler::{Encoder, ParameterSet, Transpiler};
}

use clipboard::Clipboard;
use config::Config;
use error::PowerbaseResult;
use logger::Logger;

/// Detect the dialect of `sql` and convert it to the other one.
pub fn convert(sql: &str, config: &Config, log: &mut Logger) -> PowerbaseResult<String> {
    transpiler::Transpiler::new(config).convert(sql, log)
}

/// Convert whatever is on `clipboard` and put the result back.
///
/// Nothing is written when reading or conversion fails.
pub fn transpile_clipboard<C: Clipboard + ?Sized>(
    clipboard: &mut C,
    config: &Config,
    log: &mut Logger,
) -> PowerbaseResult<String> {
    log.info("Reading clipboard...");
    let input = clipboard.read()?;
    let output = convert(&input, config, log)?;
    clipboard.write(&output)?;
    Ok(output)
}
