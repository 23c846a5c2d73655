//! Column-aligned text tables

/// Render rows as a column-aligned table with headers.
///
/// Columns are separated by two spaces; trailing padding is trimmed.
pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let num_cols = headers.len();
    let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(num_cols) {
            widths[i] = widths[i].max(cell.len());
        }
    }

    let header_cells: Vec<String> = headers.iter().map(|h| h.to_string()).collect();
    std::iter::once(&header_cells)
        .chain(rows.iter())
        .map(|row| {
            let line: Vec<String> = row
                .iter()
                .enumerate()
                .map(|(i, cell)| {
                    let w = widths.get(i).copied().unwrap_or(0);
                    format!("{:<width$}", cell, width = w)
                })
                .collect();
            line.join("  ").trim_end().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_only_when_empty() {
        assert_eq!(render_table(&["HOST", "NAMESPACE"], &[]), "HOST  NAMESPACE");
    }

    #[test]
    fn aligns_columns() {
        let rows = vec![
            vec!["reviews.bookinfo".to_string(), "bookinfo".to_string()],
            vec!["a.b".to_string(), "b".to_string()],
        ];
        let table = render_table(&["HOST", "NAMESPACE"], &rows);
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines[0], "HOST              NAMESPACE");
        assert_eq!(lines[1], "reviews.bookinfo  bookinfo");
        assert_eq!(lines[2], "a.b               b");
    }
}
