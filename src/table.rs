use std::fmt::Write as _;

/// Column alignment for [`render_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// Renders an elastic plain-text table: header, dashed separator, rows.
/// Cells are padded to the widest value in their column (measured in chars)
/// and separated by two spaces. Line breaks and tabs inside cells become
/// spaces.
pub fn render_table(headers: &[String], rows: &[Vec<String>]) -> String {
    render_aligned(headers, rows, &[])
}

/// Like [`render_table`], with per-column alignment. Columns without an
/// entry in `align` are left-aligned.
pub fn render_aligned(headers: &[String], rows: &[Vec<String>], align: &[Align]) -> String {
    let headers = headers.iter().map(|h| flatten(h)).collect::<Vec<_>>();
    let rows = rows
        .iter()
        .map(|row| row.iter().take(headers.len()).map(|c| flatten(c)).collect::<Vec<_>>())
        .collect::<Vec<_>>();

    let mut widths = headers.iter().map(|h| width(h).max(3)).collect::<Vec<_>>();
    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(width(cell));
        }
    }

    let separator = widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>();
    let mut output = String::new();
    for line in std::iter::once(&headers)
        .chain(std::iter::once(&separator))
        .chain(rows.iter())
    {
        let _ = writeln!(output, "{}", format_line(line, &widths, align));
    }
    output
}

pub fn print_table(headers: &[String], rows: &[Vec<String>]) {
    print!("{}", render_table(headers, rows));
}

fn format_line(cells: &[String], widths: &[usize], align: &[Align]) -> String {
    let mut parts = Vec::with_capacity(widths.len());
    for (idx, width_for) in widths.iter().enumerate() {
        let cell = cells.get(idx).map(String::as_str).unwrap_or("");
        let padding = " ".repeat(width_for.saturating_sub(width(cell)));
        match align.get(idx).copied().unwrap_or(Align::Left) {
            Align::Left => parts.push(format!("{cell}{padding}")),
            Align::Right => parts.push(format!("{padding}{cell}")),
        }
    }
    parts.join("  ").trim_end().to_string()
}

fn width(value: &str) -> usize {
    value.chars().count()
}

fn flatten(value: &str) -> String {
    value.replace(['\n', '\r', '\t'], " ")
}
