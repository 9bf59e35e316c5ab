// src/utils/logger.rs

use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};
use std::io::{self, Write};

static LOGGER: TerminalLogger = TerminalLogger;

struct TerminalLogger;

/// Installs the terminal logger. Call once, before any work starts.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
  log::set_logger(&LOGGER).map(|()| log::set_max_level(level))
}

/// -q / default / -v / -vv
pub fn level_from_verbosity(quiet: bool, verbose: u8) -> LevelFilter {
  if quiet {
    return LevelFilter::Error;
  }
  match verbose {
    0 => LevelFilter::Info,
    1 => LevelFilter::Debug,
    _ => LevelFilter::Trace,
  }
}

fn format_line(record: &Record) -> String {
  let icon = match record.level() {
    Level::Error => "🔴", // Red Circle
    Level::Warn => "🟠",  // Orange Circle
    Level::Info => "🔵",  // Blue Circle
    Level::Debug => "⚪", // White/Gray Circle
    Level::Trace => "▫️", // Small dot
  };

  // Format: "🔴  File not found"
  format!("{}  {}", icon, record.args())
}

impl log::Log for TerminalLogger {
  fn enabled(&self, metadata: &Metadata) -> bool {
    metadata.level() <= log::max_level()
  }

  fn log(&self, record: &Record) {
    if self.enabled(record.metadata()) {
      let line = format_line(record);
      // stdout stays clean for report output
      let mut err = io::stderr().lock();
      let _ = writeln!(err, "{}", line);
    }
  }

  fn flush(&self) {
    let _ = io::stderr().flush();
  }
}
