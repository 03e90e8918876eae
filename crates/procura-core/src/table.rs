//! Table matrix reconstruction.
//!
//! HTML tables carry `rowspan`/`colspan`, so the n-th `<td>` of a row is not
//! necessarily in column n. [`TableMatrix`] expands a table into a grid where
//! every logical cell holds the text of the physical cell covering it, so each
//! grid row can be read on its own as if nothing were merged.
//!
//! ```text
//! <tr><th rowspan=2>供应商</th><td>A</td></tr>      供应商 | A
//! <tr><td>B</td></tr>                          ->   供应商 | B
//! ```

use crate::text::{element_text, normalize_whitespace};
use scraper::ElementRef;

/// Upper bound for a single `rowspan`/`colspan` value.
pub const MAX_SPAN: usize = 1000;

/// Upper bound for the number of grid positions of one table.
pub const MAX_GRID_AREA: usize = 250_000;

/// Direct child rows of a table, looking through `thead`/`tbody`/`tfoot` but
/// not into nested tables.
pub fn direct_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    let mut rows = Vec::new();

    for child in table.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => {
                rows.extend(
                    child
                        .children()
                        .filter_map(ElementRef::wrap)
                        .filter(|inner| inner.value().name() == "tr"),
                );
            }
            _ => {}
        }
    }

    rows
}

/// Every `tr` below a table in document order, nested tables included.
///
/// Extraction reads rows this way: a key/value table nested in a layout cell
/// still contributes its own rows.
pub fn all_rows(table: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    table
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|element| element.value().name() == "tr")
        .collect()
}

/// Direct `td`/`th` children of a row.
pub fn direct_cells(row: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| matches!(cell.value().name(), "td" | "th"))
        .collect()
}

/// Parse a span attribute: leading digits, anything missing, unparsable or
/// zero is 1, capped at [`MAX_SPAN`].
fn parse_span(value: Option<&str>) -> usize {
    let Some(value) = value else {
        return 1;
    };
    let digits: String = value.trim().chars().take_while(char::is_ascii_digit).collect();
    match digits.parse::<usize>() {
        Ok(0) | Err(_) => 1,
        Ok(span) => span.min(MAX_SPAN),
    }
}

/// One physical cell before placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCell {
    pub text: String,
    pub rowspan: usize,
    pub colspan: usize,
}

impl RawCell {
    /// A 1×1 cell.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            rowspan: 1,
            colspan: 1,
        }
    }

    /// A cell with explicit spans (clamped to `1..=MAX_SPAN`).
    pub fn spanning(text: impl Into<String>, rowspan: usize, colspan: usize) -> Self {
        Self {
            text: text.into(),
            rowspan: rowspan.clamp(1, MAX_SPAN),
            colspan: colspan.clamp(1, MAX_SPAN),
        }
    }

    /// Read a `td`/`th` element: whitespace-normalized text plus spans.
    pub fn from_element(cell: ElementRef<'_>) -> Self {
        let attrs = cell.value();
        Self {
            text: normalize_whitespace(&element_text(cell, " ")),
            rowspan: parse_span(attrs.attr("rowspan")),
            colspan: parse_span(attrs.attr("colspan")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PlacedCell {
    text: String,
    source_row: usize,
}

/// A table expanded into a grid of logical cells.
///
/// Each physical cell is stored once; grid positions hold an index into
/// that list, so a wide span costs one index per position, never a copy of
/// the text.
#[derive(Debug, Clone, Default)]
pub struct TableMatrix {
    cells: Vec<PlacedCell>,
    grid: Vec<Vec<Option<usize>>>,
}

impl TableMatrix {
    /// Place physical rows of cells into a grid.
    ///
    /// Rows are filled top to bottom, cells left to right. A cell lands in the
    /// first column of its row not already taken by a vertical span from
    /// above and covers `rowspan × colspan` grid positions, growing the grid
    /// as needed.
    ///
    /// The grid never holds more than [`MAX_GRID_AREA`] positions. A cell
    /// whose spans would cross that limit is placed as 1×1, and once not even
    /// that fits, the remaining cells are dropped.
    pub fn build<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = RawCell>,
    {
        let mut cells: Vec<PlacedCell> = Vec::new();
        let mut grid: Vec<Vec<Option<usize>>> = Vec::new();
        let mut area = 0;

        'rows: for (row_idx, row_cells) in rows.into_iter().enumerate() {
            if grid.len() <= row_idx {
                grid.resize_with(row_idx + 1, Vec::new);
            }

            let mut col = 0;
            for cell in row_cells {
                while grid[row_idx].get(col).is_some_and(Option::is_some) {
                    col += 1;
                }

                let (mut rowspan, mut colspan) = (cell.rowspan, cell.colspan);
                if area + added_area(&grid, row_idx, col, rowspan, colspan) > MAX_GRID_AREA {
                    if area + added_area(&grid, row_idx, col, 1, 1) > MAX_GRID_AREA {
                        log::warn!(
                            "table grid reached {MAX_GRID_AREA} positions at row {row_idx}; remaining cells dropped"
                        );
                        break 'rows;
                    }
                    log::debug!("span {rowspan}x{colspan} at ({row_idx}, {col}) placed as 1x1");
                    rowspan = 1;
                    colspan = 1;
                }

                let index = cells.len();
                cells.push(PlacedCell {
                    text: cell.text,
                    source_row: row_idx,
                });

                let last_row = row_idx + rowspan;
                if grid.len() < last_row {
                    grid.resize_with(last_row, Vec::new);
                }
                for target in &mut grid[row_idx..last_row] {
                    if target.len() < col + colspan {
                        area += col + colspan - target.len();
                        target.resize(col + colspan, None);
                    }
                    for slot in &mut target[col..col + colspan] {
                        *slot = Some(index);
                    }
                }

                col += colspan;
            }
        }

        Self { cells, grid }
    }

    /// Expand a `table` element.
    pub fn from_table(table: ElementRef<'_>) -> Self {
        Self::build(
            all_rows(table)
                .into_iter()
                .map(|row| direct_cells(row).into_iter().map(RawCell::from_element)),
        )
    }

    /// Number of grid rows (physical rows plus any rows created by spans).
    pub fn rows(&self) -> usize {
        self.grid.len()
    }

    /// Width of the widest grid row.
    pub fn cols(&self) -> usize {
        self.grid.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Filled width of `row`: one past the rightmost position any cell reached.
    pub fn span_width(&self, row: usize) -> usize {
        self.grid.get(row).map_or(0, Vec::len)
    }

    /// Number of grid positions, filled or not.
    pub fn area(&self) -> usize {
        self.grid.iter().map(Vec::len).sum()
    }

    /// Text at `(row, col)`; empty for positions no cell covers.
    pub fn text(&self, row: usize, col: usize) -> &str {
        self.cell(row, col).map_or("", |cell| cell.text.as_str())
    }

    /// Physical row that supplied the value at `(row, col)`.
    pub fn source_row(&self, row: usize, col: usize) -> Option<usize> {
        self.cell(row, col).map(|cell| cell.source_row)
    }

    /// Cells of `row` up to its [`span_width`](Self::span_width), gaps as `""`.
    pub fn row_texts(&self, row: usize) -> Vec<&str> {
        (0..self.span_width(row)).map(|col| self.text(row, col)).collect()
    }

    fn cell(&self, row: usize, col: usize) -> Option<&PlacedCell> {
        let index = (*self.grid.get(row)?.get(col)?)?;
        self.cells.get(index)
    }
}

/// Positions a `rowspan × colspan` cell at `(row, col)` would add to `grid`.
fn added_area(
    grid: &[Vec<Option<usize>>],
    row: usize,
    col: usize,
    rowspan: usize,
    colspan: usize,
) -> usize {
    (row..row + rowspan)
        .map(|r| (col + colspan).saturating_sub(grid.get(r).map_or(0, Vec::len)))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn table_of(html: &str) -> TableMatrix {
        let document = Html::parse_document(html);
        let selector = Selector::parse("table").unwrap();
        let table = document.select(&selector).next().unwrap();
        TableMatrix::from_table(table)
    }

    #[test]
    fn test_plain_grid() {
        let matrix = TableMatrix::build(vec![
            vec![RawCell::new("a"), RawCell::new("b")],
            vec![RawCell::new("c"), RawCell::new("d")],
        ]);
        assert_eq!(matrix.rows(), 2);
        assert_eq!(matrix.cols(), 2);
        assert_eq!(matrix.row_texts(1), vec!["c", "d"]);
    }

    #[test]
    fn test_rowspan_colspan_block_is_replicated() {
        let matrix = TableMatrix::build(vec![
            vec![RawCell::spanning("X", 2, 2), RawCell::new("a")],
            vec![RawCell::new("b")],
        ]);
        for (row, col) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
            assert_eq!(matrix.text(row, col), "X");
            assert_eq!(matrix.source_row(row, col), Some(0));
        }
        assert_eq!(matrix.text(0, 2), "a");
        assert_eq!(matrix.text(1, 2), "b");
        assert_eq!(matrix.source_row(1, 2), Some(1));
    }

    #[test]
    fn test_rowspan_past_last_row_grows_grid() {
        let matrix = TableMatrix::build(vec![vec![RawCell::spanning("X", 3, 1)]]);
        assert_eq!(matrix.rows(), 3);
        assert_eq!(matrix.text(2, 0), "X");
        assert_eq!(matrix.source_row(2, 0), Some(0));
    }

    #[test]
    fn test_missing_positions_read_as_empty() {
        let matrix = TableMatrix::build(vec![
            vec![RawCell::new("a"), RawCell::new("b"), RawCell::new("c")],
            vec![RawCell::new("d")],
        ]);
        assert_eq!(matrix.span_width(1), 1);
        assert_eq!(matrix.text(1, 2), "");
        assert_eq!(matrix.source_row(1, 2), None);
        assert_eq!(matrix.text(9, 9), "");
    }

    #[test]
    fn test_oversized_spans_are_placed_as_single_cells() {
        let text = "某".repeat(200);
        let matrix = TableMatrix::build(vec![vec![
            RawCell::spanning(text.clone(), MAX_SPAN, MAX_SPAN),
            RawCell::spanning(text.clone(), MAX_SPAN, MAX_SPAN),
        ]]);
        assert_eq!(matrix.rows(), 1);
        assert_eq!(matrix.cols(), 2);
        assert_eq!(matrix.text(0, 0), text);
        assert_eq!(matrix.text(0, 1), text);
    }

    #[test]
    fn test_spans_within_budget_are_kept() {
        let matrix = TableMatrix::build(vec![vec![
            RawCell::spanning("X", 400, 400),
            RawCell::spanning("Y", 400, 400),
        ]]);
        assert_eq!(matrix.rows(), 400);
        assert_eq!(matrix.text(399, 399), "X");
        assert_eq!(matrix.text(0, 400), "Y");
        assert_eq!(matrix.text(1, 400), "");
        assert!(matrix.area() <= MAX_GRID_AREA);
    }

    #[test]
    fn test_grid_area_is_capped() {
        let rows = (0..300).map(|_| (0..1000).map(|_| RawCell::new("a")));
        let matrix = TableMatrix::build(rows);
        assert_eq!(matrix.area(), MAX_GRID_AREA);
        assert_eq!(matrix.text(249, 999), "a");
        assert_eq!(matrix.text(250, 0), "");
    }

    #[test]
    fn test_parse_span() {
        assert_eq!(parse_span(None), 1);
        assert_eq!(parse_span(Some("2")), 2);
        assert_eq!(parse_span(Some(" 3 ")), 3);
        assert_eq!(parse_span(Some("4px")), 4);
        assert_eq!(parse_span(Some("0")), 1);
        assert_eq!(parse_span(Some("abc")), 1);
        assert_eq!(parse_span(Some("99999999")), MAX_SPAN);
    }

    #[test]
    fn test_from_table_with_sections_and_spans() {
        let matrix = table_of(
            "<table><thead><tr><th>排名</th><th>供应商名称</th></tr></thead>\
             <tbody><tr><td rowspan=\"2\">1</td><td>甲 公司</td></tr>\
             <tr><td>乙公司</td></tr></tbody></table>",
        );
        assert_eq!(matrix.rows(), 3);
        assert_eq!(matrix.row_texts(0), vec!["排名", "供应商名称"]);
        assert_eq!(matrix.row_texts(1), vec!["1", "甲 公司"]);
        assert_eq!(matrix.row_texts(2), vec!["1", "乙公司"]);
    }

    #[test]
    fn test_direct_rows_skip_nested_tables() {
        let document = Html::parse_document(
            "<table><tr><td><table><tr><td>inner</td></tr></table></td></tr>\
             <tr><td>outer</td></tr></table>",
        );
        let selector = Selector::parse("table").unwrap();
        let outer = document.select(&selector).next().unwrap();
        assert_eq!(direct_rows(outer).len(), 2);
        assert_eq!(all_rows(outer).len(), 3);
        assert_eq!(direct_cells(direct_rows(outer)[1]).len(), 1);
    }
}
