//! Reading a command log: one serialized command per line, as JSON.

use anyhow::Context;
use inkpad_core::commands::Command;

/// Parse every line of the file, in parallel. Lines that fail to parse are logged and skipped.
pub fn read_commands(path: &std::path::Path) -> anyhow::Result<Vec<Command>> {
    use rayon::iter::{IntoParallelIterator, ParallelIterator};
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let lines: Vec<(usize, &str)> = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .collect();
    // Indexed, so order is kept.
    let parsed: Vec<_> = lines
        .into_par_iter()
        .map(|(number, line)| (number, Command::from_json(line)))
        .collect();

    let mut commands = Vec::with_capacity(parsed.len());
    for (number, command) in parsed {
        match command {
            Ok(command) => commands.push(command),
            Err(e) => log::warn!("{}:{}: skipping: {e}", path.display(), number + 1),
        }
    }
    Ok(commands)
}
