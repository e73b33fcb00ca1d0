use colored::Colorize;
use serde::Serialize;
use std::fmt::Display;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

pub fn print_table(headers: &[&str], rows: Vec<Vec<String>>) {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let header_row: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
        .collect();
    println!("{}", header_row.join("  ").trim_end().bold());

    let sep: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    println!("{}", sep.join("  "));

    for row in &rows {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let w = widths.get(i).copied().unwrap_or(0);
                format!("{:width$}", cell, width = w)
            })
            .collect();
        println!("{}", cells.join("  ").trim_end());
    }
}

// ---------------------------------------------------------------------------
// Status lines
// ---------------------------------------------------------------------------

pub fn section(title: impl Display) {
    let title = title.to_string();
    println!();
    println!("{}", title.bold().cyan());
    println!("{}", "=".repeat(title.chars().count()).cyan());
}

pub fn step(msg: impl Display) {
    println!("{} {}", "→".blue(), msg);
}

pub fn success(msg: impl Display) {
    println!("{} {}", "✓".green(), msg);
}

pub fn fail(msg: impl Display) {
    println!("{} {}", "✗".red(), msg);
}

pub fn warning(msg: impl Display) {
    println!("{} {}", "!".yellow().bold(), msg.to_string().yellow());
}

pub fn info(msg: impl Display) {
    println!("{} {}", "•".cyan(), msg);
}

pub fn hint(msg: impl Display) {
    println!("  {}", msg.to_string().dimmed());
}

pub fn separator() {
    println!("{}", "─".repeat(48).dimmed());
}
