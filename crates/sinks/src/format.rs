use bulk_core::Command;

/// Render a batch as `<prefix>cmd1, cmd2, ...`
pub fn format_batch(prefix: &str, commands: &[Command]) -> String {
  let mut out = String::from(prefix);
  for (i, command) in commands.iter().enumerate() {
    if i > 0 {
      out.push_str(", ");
    }
    out.push_str(&command.text);
  }
  out
}
