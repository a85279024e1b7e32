//! Block marker tracking.
//!
//! A block is an explicit `open ... close` region in the command stream. While
//! a block is open, size-based flushing is suspended and the whole block is
//! flushed as one batch when the outermost block closes.

use crate::config::MarkerConfig;

/// What a command line means to the batch engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
  /// Open marker. `outermost` is set on the 0 -> 1 depth transition.
  Open { outermost: bool },
  /// Close marker. `outermost` is set on the 1 -> 0 depth transition; a close
  /// at depth 0 reports `false` and changes nothing.
  Close { outermost: bool },
  /// Ordinary command
  Passthrough,
}

impl Signal {
  /// True if this signal starts or ends a hold on the engine
  pub fn is_outermost(&self) -> bool {
    matches!(
      self,
      Signal::Open { outermost: true } | Signal::Close { outermost: true }
    )
  }
}

/// Nesting depth of block markers seen so far
#[derive(Debug, Clone)]
pub struct BlockTracker {
  markers: MarkerConfig,
  depth: usize,
}

impl BlockTracker {
  pub fn new(markers: MarkerConfig) -> Self {
    Self { markers, depth: 0 }
  }

  /// Classify a command line, updating depth on exact marker matches.
  pub fn observe(&mut self, text: &str) -> Signal {
    if text == self.markers.open {
      self.depth += 1;
      Signal::Open {
        outermost: self.depth == 1,
      }
    } else if text == self.markers.close {
      match self.depth {
        0 => Signal::Close { outermost: false },
        _ => {
          self.depth -= 1;
          Signal::Close {
            outermost: self.depth == 0,
          }
        }
      }
    } else {
      Signal::Passthrough
    }
  }

  pub fn depth(&self) -> usize {
    self.depth
  }

  pub fn is_holding(&self) -> bool {
    self.depth > 0
  }
}

impl Default for BlockTracker {
  fn default() -> Self {
    Self::new(MarkerConfig::default())
  }
}
