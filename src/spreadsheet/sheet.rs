use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::SpreadsheetError;
use crate::table::Value;

/// Rows in a worksheet (Excel 2007 and later)
pub(crate) const MAX_ROWS: usize = 1_048_576;
/// Columns in a worksheet, `A` to `XFD`
pub(crate) const MAX_COLS: usize = 16_384;
/// Largest used range `records` will materialise
pub(crate) const MAX_USED_CELLS: usize = 16_777_216;

/// Cells of one worksheet, kept sparse until materialised with [`Sheet::records`].
#[derive(Debug)]
pub(crate) struct Sheet {
    /// Source file name
    pub(crate) file_name: String,
    /// Sheet name
    pub(crate) name: String,
    /// Non-empty cells, in row-major order after `finish`
    pub(crate) cells: Vec<Cell>,
    /// Used range, determined from the cells
    pub(crate) row_lower_bound: Option<usize>,
    pub(crate) row_upper_bound: Option<usize>,
    pub(crate) col_lower_bound: Option<usize>,
    pub(crate) col_upper_bound: Option<usize>,
}

impl Sheet {
    pub(super) fn new(file_name: &str, name: &str) -> Self {
        Self {
            file_name: file_name.to_owned(),
            name: name.to_owned(),
            cells: Vec::new(),
            row_lower_bound: None,
            row_upper_bound: None,
            col_lower_bound: None,
            col_upper_bound: None,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Fails when `(row, col)` lies outside the worksheet grid.
    pub(super) fn check_position(&self, row: usize, col: usize) -> Result<(), SpreadsheetError> {
        if row < MAX_ROWS && col < MAX_COLS {
            return Ok(());
        }
        Err(SpreadsheetError::CellValueError(
            self.file_name.to_owned(),
            self.name.to_owned(),
            format!("row {}, column {}", row.saturating_add(1), col.saturating_add(1)),
            format!("position outside the {MAX_ROWS} x {MAX_COLS} worksheet grid"),
        ))
    }

    /// Fails when `count` more cells would exceed the cell budget.
    pub(super) fn reserve(&self, count: usize) -> Result<(), SpreadsheetError> {
        if self.cells.len().saturating_add(count) > MAX_USED_CELLS {
            return Err(self.too_large());
        }
        Ok(())
    }

    /// Adds a cell and widens the used range to include it.
    pub(super) fn push(&mut self, cell: Cell) -> Result<(), SpreadsheetError> {
        self.check_position(cell.row, cell.col)?;
        self.reserve(1)?;
        let widen_lower = |bound: Option<usize>, index: usize| Some(bound.map_or(index, |bound| bound.min(index)));
        let widen_upper = |bound: Option<usize>, index: usize| Some(bound.map_or(index, |bound| bound.max(index)));
        self.row_lower_bound = widen_lower(self.row_lower_bound, cell.row);
        self.row_upper_bound = widen_upper(self.row_upper_bound, cell.row);
        self.col_lower_bound = widen_lower(self.col_lower_bound, cell.col);
        self.col_upper_bound = widen_upper(self.col_upper_bound, cell.col);
        self.cells.push(cell);
        Ok(())
    }

    fn too_large(&self) -> SpreadsheetError {
        let (rows, cols) = self.dimensions();
        SpreadsheetError::SheetTooLargeError(self.file_name.to_owned(), self.name.to_owned(), rows, cols)
    }

    /// Sorts cells into row-major order; a later duplicate of a position wins.
    pub(super) fn finish(&mut self) {
        self.cells.sort_by_key(|cell| (cell.row, cell.col));
        let mut deduplicated = Vec::<Cell>::with_capacity(self.cells.len());
        for cell in self.cells.drain(..) {
            match deduplicated.last_mut() {
                Some(last) if last.row == cell.row && last.col == cell.col => *last = cell,
                _ => deduplicated.push(cell),
            }
        }
        self.cells = deduplicated;
    }

    /// Number of rows and columns in the used range.
    pub(crate) fn dimensions(&self) -> (usize, usize) {
        match (self.row_lower_bound, self.row_upper_bound, self.col_lower_bound, self.col_upper_bound) {
            (Some(row_lower), Some(row_upper), Some(col_lower), Some(col_upper)) => {
                (row_upper - row_lower + 1, col_upper - col_lower + 1)
            }
            _ => (0, 0),
        }
    }

    /// Materialises the used range as dense rows of values.
    /// Cells are expected in row-major order (see `finish`).
    pub(crate) fn records(&self) -> Result<Vec<Vec<Option<Value>>>, SpreadsheetError> {
        let (rows, cols) = self.dimensions();
        if rows.saturating_mul(cols) > MAX_USED_CELLS {
            return Err(self.too_large());
        }
        let row_lower = self.row_lower_bound.unwrap_or_default();
        let col_lower = self.col_lower_bound.unwrap_or_default();
        let mut records = vec![vec![None; cols]; rows];
        for cell in &self.cells {
            let value = cell.to_value().map_err(|message| {
                SpreadsheetError::CellValueError(
                    self.file_name.to_owned(),
                    self.name.to_owned(),
                    cell.reference(),
                    message,
                )
            })?;
            records[cell.row - row_lower][cell.col - col_lower] = value;
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use crate::spreadsheet::cell::Cell;
    use crate::spreadsheet::cell::CellType;
    use crate::spreadsheet::sheet::Sheet;
    use crate::spreadsheet::sheet::MAX_COLS;
    use crate::spreadsheet::sheet::MAX_ROWS;
    use crate::spreadsheet::SpreadsheetError;
    use crate::table::Value;

    fn push(sheet: &mut Sheet, row: usize, col: usize, value: &str) {
        sheet.push(Cell {
            row,
            col,
            kind: CellType::Text,
            value: value.to_owned(),
        })
        .unwrap();
    }

    #[test]
    fn sheet_initial() {
        let sheet = Sheet::new("book.xlsx", "Sheet1");

        assert!(sheet.is_empty());
        assert_eq!(sheet.dimensions(), (0, 0));
        assert_eq!(sheet.records().unwrap().len(), 0);
    }

    #[test]
    fn sheet_bounds_follow_cells() {
        let mut sheet = Sheet::new("book.xlsx", "Sheet1");
        push(&mut sheet, 1, 3, "b");
        push(&mut sheet, 3, 1, "c");
        push(&mut sheet, 1, 1, "a");
        sheet.finish();

        assert_eq!(sheet.row_lower_bound, Some(1));
        assert_eq!(sheet.row_upper_bound, Some(3));
        assert_eq!(sheet.col_lower_bound, Some(1));
        assert_eq!(sheet.col_upper_bound, Some(3));
        assert_eq!(sheet.dimensions(), (3, 3));

        let records = sheet.records().unwrap();
        let text = |value: &str| Some(Value::Text(value.to_owned()));
        assert_eq!(records[0], vec![text("a"), None, text("b")]);
        assert_eq!(records[1], vec![None, None, None]);
        assert_eq!(records[2], vec![text("c"), None, None]);
    }

    #[test]
    fn later_duplicate_wins() {
        let mut sheet = Sheet::new("book.xlsx", "Sheet1");
        push(&mut sheet, 0, 0, "old");
        push(&mut sheet, 0, 0, "new");
        sheet.finish();

        assert_eq!(sheet.cells.len(), 1);
        assert_eq!(sheet.cells[0].value, "new");
    }

    #[test]
    fn invalid_value_reports_position() {
        let mut sheet = Sheet::new("book.xlsx", "Data");
        sheet.push(Cell { row: 4, col: 1, kind: CellType::Number, value: "n/a".to_owned() }).unwrap();
        sheet.finish();

        let error = sheet.records().unwrap_err().to_string();
        assert!(error.contains("B5"), "{error}");
        assert!(error.contains("Data"), "{error}");
    }

    #[test]
    fn positions_outside_the_grid_are_rejected() {
        let mut sheet = Sheet::new("book.xlsx", "Data");
        let cell = |row, col| Cell { row, col, kind: CellType::Text, value: "x".to_owned() };

        assert!(sheet.push(cell(MAX_ROWS - 1, MAX_COLS - 1)).is_ok());
        let error = sheet.push(cell(3_999_999_999, 0)).unwrap_err();
        assert!(matches!(error, SpreadsheetError::CellValueError(..)), "{error}");
        assert!(error.to_string().contains("row 4000000000"), "{error}");
        assert!(matches!(sheet.push(cell(0, MAX_COLS)), Err(SpreadsheetError::CellValueError(..))));
        assert_eq!(sheet.cells.len(), 1);
    }

    #[test]
    fn oversized_used_range_is_rejected() {
        let mut sheet = Sheet::new("book.xlsx", "Data");
        push(&mut sheet, 0, 0, "top left");
        push(&mut sheet, MAX_ROWS - 1, MAX_COLS - 1, "bottom right");
        sheet.finish();

        assert_eq!(sheet.dimensions(), (MAX_ROWS, MAX_COLS));
        let error = sheet.records().unwrap_err();
        assert!(matches!(error, SpreadsheetError::SheetTooLargeError(..)), "{error}");
    }
}
