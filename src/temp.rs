//! Fresh operand names for intermediate results.

use log::debug;

pub const TEMP_PREFIX: &str = "t";

/// Monotonic counter handing out `t1`, `t2`, ... Owned by one environment,
/// never reset, so every name it issues during a run is unique.
///
/// The environment draws a name only once a node has passed its type and
/// division checks, so a node that fails consumes no number.
#[derive(Debug, Clone)]
pub struct TempNames {
  prefix: &'static str,
  issued: u64,
}

impl TempNames {
  pub fn new() -> Self {
    Self::with_prefix(TEMP_PREFIX)
  }

  pub fn with_prefix(prefix: &'static str) -> Self {
    Self { prefix, issued: 0 }
  }

  /// Bump the counter and name the new temporary after it.
  pub fn fresh(&mut self) -> String {
    self.issued += 1;
    let name = format!("{}{}", self.prefix, self.issued);
    debug!("new temporary {name}");
    name
  }

  /// How many names have been handed out so far.
  pub fn issued(&self) -> u64 {
    self.issued
  }
}

impl Default for TempNames {
  fn default() -> Self {
    Self::new()
  }
}

/// Endless stream of fresh names.
impl Iterator for TempNames {
  type Item = String;

  fn next(&mut self) -> Option<String> {
    Some(self.fresh())
  }
}
