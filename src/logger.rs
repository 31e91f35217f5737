use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
  Info,
  Warn,
  Error,
}

impl fmt::Display for Level {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Level::Info => "INFO",
      Level::Warn => "WARN",
      Level::Error => "ERROR",
    };
    f.write_str(name)
  }
}

pub struct Logger {
  file: Option<Mutex<std::fs::File>>,
}

impl Logger {
  pub fn new(path: &Path) -> anyhow::Result<Self> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(Self {
      file: Some(Mutex::new(file)),
    })
  }

  pub fn discard() -> Self {
    Self { file: None }
  }

  pub fn log(&self, level: Level, message: &str) {
    let Some(file) = self.file.as_ref() else {
      return;
    };
    let line = format_line(level, message);
    if let Ok(mut file) = file.lock() {
      let _ = file.write_all(line.as_bytes());
    }
  }

  pub fn info(&self, message: &str) {
    self.log(Level::Info, message);
  }

  pub fn warn(&self, message: &str) {
    self.log(Level::Warn, message);
  }

  pub fn error(&self, message: &str) {
    self.log(Level::Error, message);
  }
}

fn format_line(level: Level, message: &str) -> String {
  let ts = Utc::now().to_rfc3339();
  format!("[{ts}] {level}: {message}\n")
}
