use unicode_width::UnicodeWidthStr;

use crate::models::LoginRecord;

pub const HEADERS: [&str; 6] = ["No", "Name", "IP/Hostname", "User", "Comment", "Port"];
pub const COLUMN_SEPARATOR: char = '|';
const JUNCTION: char = '+';
const RULE: char = '-';

/// Rows above the first record: the header and its rule.
pub const HEADER_LINES: usize = 2;

/// Render the records as a left-aligned, borderless table.
///
/// The `No` column holds each record's 1-based position in `records`; that
/// number is what the selector reads back from a chosen line.
pub fn render(records: &[LoginRecord]) -> String {
    let rows: Vec<[String; 6]> = records
        .iter()
        .enumerate()
        .map(|(i, r)| {
            [
                (i + 1).to_string(),
                r.name.clone(),
                r.address.clone(),
                r.user.clone(),
                r.comment.clone(),
                r.port.clone(),
            ]
        })
        .collect();

    let mut widths = HEADERS.map(|h| h.width());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.width());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &HEADERS, &widths);

    let rule: Vec<String> = widths
        .iter()
        .map(|w| RULE.to_string().repeat(w + 2))
        .collect();
    out.push_str(&rule.join(&JUNCTION.to_string()));
    out.push('\n');

    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row<S: AsRef<str>>(out: &mut String, cells: &[S], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let cell = cell.as_ref();
            format!(" {}{} ", cell, " ".repeat(width - cell.width()))
        })
        .collect();
    out.push_str(line.join(&COLUMN_SEPARATOR.to_string()).trim_end());
    out.push('\n');
}

/// Read the `No` column back out of a rendered row.
pub fn parse_index(line: &str) -> Option<usize> {
    line.split(COLUMN_SEPARATOR).next()?.trim().parse().ok()
}
