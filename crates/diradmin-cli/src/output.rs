// Output formatting for the console

use anyhow::Result;
use serde::Serialize;

use diradmin_core::utils::truncate_string;

/// Pretty JSON for `--json`
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a simple key-value pair for text output
pub fn print_field(label: &str, value: &str) {
    println!("{:<14} {}", format!("{}:", label), value);
}

/// Print a table header
pub fn print_table_header(columns: &[(&str, usize)]) {
    let header: String = columns
        .iter()
        .map(|(name, width)| format!("{:<width$}", name, width = width))
        .collect::<Vec<_>>()
        .join("  ");
    println!("{}", header);
}

/// Print a table row, truncating cells on character boundaries
pub fn print_table_row(values: &[(&str, usize)]) {
    let row: String = values
        .iter()
        .map(|(val, width)| {
            format!("{:<width$}", truncate_string(val, *width), width = width)
        })
        .collect::<Vec<_>>()
        .join("  ");
    println!("{}", row.trim_end());
}
