use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single command line, stamped when it was ingested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
  pub text: String,
  pub timestamp: DateTime<Utc>,
}

impl Command {
  /// Create a command stamped with the current time
  pub fn new(text: impl Into<String>) -> Self {
    Self::at(text, Utc::now())
  }

  pub fn at(text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
    Self {
      text: text.into(),
      timestamp,
    }
  }
}

/// Texts of a batch, in order. Mostly useful for logging and assertions.
pub fn texts(commands: &[Command]) -> Vec<&str> {
  commands.iter().map(|c| c.text.as_str()).collect()
}
