//! Console logging context.
//!
//! A [`Logger`] is passed explicitly into anything that reports progress.
//! Lines are filtered by verbosity and indented by the current nesting depth:
//!
//! ```text
//! [i] Converting query to PowerBI...
//! ----[i] Attempting to strip Metabase Optional Clauses...
//! --------[i] Stripped Metabase Optional Clause: [[ and x = 1 ]]
//! [✓] Transpiled query copied to clipboard!
//! ```

use colored::*;

const INDENT_SIZE: usize = 4;

/// Highest verbosity; every level is printed.
pub const MAX_VERBOSITY: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Info,
    Success,
    Warn,
    Error,
}

impl Level {
    /// Verbosity must exceed this for the level to print.
    fn threshold(self) -> u8 {
        match self {
            Level::Info => 2,
            Level::Success | Level::Warn => 1,
            Level::Error => 0,
        }
    }

    fn marker(self) -> &'static str {
        match self {
            Level::Info => "[i]",
            Level::Success => "[✓]",
            Level::Warn => "[?]",
            Level::Error => "[!]",
        }
    }
}

#[derive(Debug)]
enum Sink {
    Console,
    Captured(Vec<String>),
}

/// Verbosity-filtered, indented status output.
#[derive(Debug)]
pub struct Logger {
    verbosity: u8,
    depth: usize,
    sink: Sink,
}

impl Default for Logger {
    fn default() -> Self {
        Self::console()
    }
}

impl Logger {
    /// A logger printing to stdout/stderr at full verbosity.
    pub fn console() -> Self {
        Self {
            verbosity: MAX_VERBOSITY,
            depth: 0,
            sink: Sink::Console,
        }
    }

    /// A logger that keeps plain, uncoloured lines in memory.
    pub fn captured() -> Self {
        Self {
            verbosity: MAX_VERBOSITY,
            depth: 0,
            sink: Sink::Captured(Vec::new()),
        }
    }

    /// Lines recorded by a captured logger. Always empty for the console.
    pub fn lines(&self) -> &[String] {
        match &self.sink {
            Sink::Captured(lines) => lines,
            Sink::Console => &[],
        }
    }

    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }

    pub fn set_verbosity(&mut self, verbosity: u8) {
        self.verbosity = verbosity.min(MAX_VERBOSITY);
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn push(&mut self) {
        self.depth += INDENT_SIZE;
    }

    pub fn pop(&mut self) {
        self.depth = self.depth.saturating_sub(INDENT_SIZE);
    }

    pub fn reset(&mut self) {
        self.depth = 0;
    }

    /// Run `f` one nesting level deeper.
    pub fn nested<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.push();
        let out = f(self);
        self.pop();
        out
    }

    pub fn info(&mut self, msg: impl AsRef<str>) {
        self.emit(Level::Info, msg.as_ref());
    }

    pub fn success(&mut self, msg: impl AsRef<str>) {
        self.emit(Level::Success, msg.as_ref());
    }

    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.emit(Level::Warn, msg.as_ref());
    }

    pub fn err(&mut self, msg: impl AsRef<str>) {
        self.emit(Level::Error, msg.as_ref());
    }

    /// Report an unrecoverable error. Always printed, whatever the verbosity.
    pub fn fatal(&mut self, msg: impl std::fmt::Display) {
        self.verbosity = MAX_VERBOSITY;
        self.err(format!("Fatal Error: {}", msg));
        self.err("Aborting...");
    }

    fn emit(&mut self, level: Level, msg: &str) {
        if self.verbosity <= level.threshold() {
            return;
        }

        let pad = "-".repeat(self.depth);
        let text = format!("{} {}", level.marker(), msg);

        match &mut self.sink {
            Sink::Captured(lines) => lines.push(format!("{}{}", pad, text)),
            Sink::Console => {
                let styled = match level {
                    Level::Info => text.dimmed(),
                    Level::Success => text.green().bold(),
                    Level::Warn => text.truecolor(255, 165, 0),
                    Level::Error => text.red().bold(),
                };
                if level == Level::Error {
                    eprintln!("{}{}", pad.dimmed(), styled);
                } else {
                    println!("{}{}", pad.dimmed(), styled);
                }
            }
        }
    }
}
