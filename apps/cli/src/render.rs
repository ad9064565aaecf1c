//! # Result Rendering
//!
//! Turns a [`ResultSet`] into terminal text under a `--- <title> ---`
//! banner. Tables use the bordered psql layout:
//!
//! ```text
//! --- Books List ---
//! +---------+-------+---------+----------+-------+
//! | book_id | title | author  | category | stock |
//! |---------+-------+---------+----------+-------|
//! |       1 | Dune  | Herbert | SciFi    |     1 |
//! +---------+-------+---------+----------+-------+
//! ```
//!
//! A column whose non-empty cells all parse as numbers is right-aligned.

use std::io::{self, Write};

use shelf_core::ResultSet;

/// Message printed for [`ResultSet::Empty`].
pub const NO_RESULTS: &str = "No results.";

/// Writes the banner and the result.
pub fn render<W: Write>(out: &mut W, title: &str, result: &ResultSet) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "--- {} ---", title)?;
    match result {
        ResultSet::Records { headers, rows } => write!(out, "{}", table(headers, rows)),
        ResultSet::Values(values) => {
            for value in values {
                writeln!(out, "{}", value)?;
            }
            Ok(())
        }
        ResultSet::Scalar(value) => writeln!(out, "{}", value),
        ResultSet::Empty => writeln!(out, "{}", NO_RESULTS),
    }
}

/// Formats a bordered table. Every line ends with a newline.
pub fn table(headers: &[String], rows: &[Vec<String>]) -> String {
    let columns = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().take(columns).enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let numeric: Vec<bool> = (0..columns)
        .map(|i| {
            let mut cells = rows
                .iter()
                .filter_map(|row| row.get(i))
                .filter(|cell| !cell.is_empty())
                .peekable();
            cells.peek().is_some() && cells.all(|cell| is_number(cell))
        })
        .collect();

    let rule = |left: char, joint: char, right: char| {
        let inner: Vec<String> = widths.iter().map(|w| "-".repeat(w + 2)).collect();
        format!("{}{}{}\n", left, inner.join(&joint.to_string()), right)
    };

    let line = |cells: &[String]| {
        let padded: Vec<String> = (0..columns)
            .map(|i| {
                let cell = cells.get(i).map(String::as_str).unwrap_or("");
                pad(cell, widths[i], numeric[i])
            })
            .collect();
        format!("| {} |\n", padded.join(" | "))
    };

    let mut out = String::new();
    out.push_str(&rule('+', '+', '+'));
    out.push_str(&line(headers));
    out.push_str(&rule('|', '+', '|'));
    for row in rows {
        out.push_str(&line(row));
    }
    out.push_str(&rule('+', '+', '+'));
    out
}

fn pad(cell: &str, width: usize, right: bool) -> String {
    let fill = " ".repeat(width.saturating_sub(cell.chars().count()));
    if right {
        format!("{}{}", fill, cell)
    } else {
        format!("{}{}", cell, fill)
    }
}

fn is_number(cell: &str) -> bool {
    cell.chars().all(|c| c.is_ascii_digit() || c == '-' || c == '.') && cell.parse::<f64>().is_ok()
}
