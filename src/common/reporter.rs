//! Sinks for human-readable progress text.
//!
//! A reporter never fails the pipeline:
//! every implementation swallows its own output errors.
use colored::Colorize;

use std::io::Write;


/// A fire-and-forget sink for progress text.
pub trait Reporter: Send + Sync {
    /// Report the given text.
    fn report(&self, text: &str);
}


/// Prints the text to the standard output,
/// prefixed by a colored tag naming the reporting node.
#[derive(Debug, Clone)]
pub struct ConsoleReporter {
    tag: String,
}


impl ConsoleReporter {
    /// Construct a new instance of `ConsoleReporter`.
    pub fn new<S: ToString>(tag: S) -> Self {
        Self { tag: tag.to_string() }
    }
}


impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new("forest")
    }
}


impl Reporter for ConsoleReporter {
    fn report(&self, text: &str) {
        let tag = format!("[{}]", self.tag).bold().green();
        let mut stdout = std::io::stdout().lock();
        let _ = writeln!(stdout, "{tag} {text}");
    }
}


/// Forwards the text to the `log` facade at the `info` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;


impl Reporter for LogReporter {
    fn report(&self, text: &str) {
        log::info!("{text}");
    }
}


/// Drops every text.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentReporter;


impl Reporter for SilentReporter {
    fn report(&self, _text: &str) {}
}
