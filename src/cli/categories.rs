//! CLI command for listing question categories.

use crate::models::CATEGORY_LABELS;
use std::io::{self, Write};

/// Writes the category label table.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_categories<W: Write>(writer: &mut W) -> io::Result<()> {
    writeln!(writer, "{:<10}LABEL", "CATEGORY")?;
    for (id, label) in CATEGORY_LABELS {
        writeln!(writer, "{id:<10}{label}")?;
    }
    Ok(())
}

/// Executes the categories command.
///
/// # Errors
///
/// Returns an error if output fails.
pub fn cmd_categories() -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_categories(&mut handle)
}
