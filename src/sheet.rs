//! Cell addressing and merged-cell-safe access to a template worksheet.
//!
//! All coordinates are 1-based `(row, col)`, as in the spreadsheet UI. Reads go
//! through [`TemplateSheet::text`] / [`TemplateSheet::number`]; writes go through
//! the `write_*` methods, which redirect any target inside a merged region to the
//! region's top-left cell.

use umya_spreadsheet::{Cell, Worksheet};

/// Rows and columns scanned when searching for labels.
pub const SCAN_WINDOW: u32 = 200;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellPos {
    pub row: u32,
    pub col: u32,
}

impl CellPos {
    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    pub fn to_a1(self) -> String {
        to_a1(self.col, self.row)
    }
}

pub fn column_number_to_name(mut column: u32) -> String {
    // 1 -> A, 26 -> Z, 27 -> AA ...
    let mut name = String::new();
    while column > 0 {
        let rem = ((column - 1) % 26) as u8;
        name.insert(0, (b'A' + rem) as char);
        column = (column - 1) / 26;
    }
    name
}

pub fn to_a1(col_1based: u32, row_1based: u32) -> String {
    format!("{}{}", column_number_to_name(col_1based), row_1based)
}

/// Parses `B7` or `$B$7`.
pub fn parse_a1(addr: &str) -> Option<CellPos> {
    let addr = addr.trim().replace('$', "");
    let split = addr.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = addr.split_at(split);
    if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let col = letters
        .chars()
        .try_fold(0u32, |acc, c| {
            let digit = c.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
            acc.checked_mul(26)?.checked_add(digit)
        })?;
    let row = digits.parse::<u32>().ok().filter(|&r| r > 0)?;
    Some(CellPos::new(row, col))
}

/// Inclusive rectangle of a merged region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MergedRegion {
    pub top_left: CellPos,
    pub bottom_right: CellPos,
}

impl MergedRegion {
    /// Parses `A1:C3`; a single address yields a 1x1 region.
    pub fn parse(range: &str) -> Option<Self> {
        let (start, end) = match range.split_once(':') {
            Some((start, end)) => (parse_a1(start)?, parse_a1(end)?),
            None => {
                let pos = parse_a1(range)?;
                (pos, pos)
            }
        };
        Some(Self {
            top_left: CellPos::new(start.row.min(end.row), start.col.min(end.col)),
            bottom_right: CellPos::new(start.row.max(end.row), start.col.max(end.col)),
        })
    }

    pub fn contains(&self, pos: CellPos) -> bool {
        (self.top_left.row..=self.bottom_right.row).contains(&pos.row)
            && (self.top_left.col..=self.bottom_right.col).contains(&pos.col)
    }
}

/// Case-insensitive, whitespace-trimmed label comparison.
pub fn normalize_label(text: &str) -> String {
    text.trim().to_lowercase()
}

pub struct TemplateSheet<'a> {
    ws: &'a mut Worksheet,
    merged: Vec<MergedRegion>,
    window: u32,
}

impl<'a> TemplateSheet<'a> {
    pub fn new(ws: &'a mut Worksheet) -> Self {
        Self::with_window(ws, SCAN_WINDOW)
    }

    pub fn with_window(ws: &'a mut Worksheet, window: u32) -> Self {
        let merged = ws
            .get_merge_cells()
            .iter()
            .filter_map(|range| MergedRegion::parse(&range.get_range()))
            .collect();
        Self { ws, merged, window }
    }

    pub fn max_row(&self) -> u32 {
        self.ws.get_highest_column_and_row().1
    }

    pub fn max_col(&self) -> u32 {
        self.ws.get_highest_column_and_row().0
    }

    /// Last row and column covered by a label scan.
    pub fn scan_bounds(&self) -> (u32, u32) {
        let (max_col, max_row) = self.ws.get_highest_column_and_row();
        (max_row.min(self.window), max_col.min(self.window))
    }

    fn cell(&self, pos: CellPos) -> Option<&Cell> {
        self.ws.get_cell(pos.to_a1().as_str())
    }

    /// String content of a non-numeric, non-empty cell.
    pub fn text(&self, pos: CellPos) -> Option<String> {
        let cell = self.cell(pos)?;
        if cell.get_value_number().is_some() {
            return None;
        }
        let value = cell.get_value();
        if value.is_empty() {
            None
        } else {
            Some(value.into_owned())
        }
    }

    pub fn number(&self, pos: CellPos) -> Option<f64> {
        self.cell(pos)?.get_value_number()
    }

    /// Whatever the cell displays, trimmed; empty for missing cells.
    pub fn display(&self, pos: CellPos) -> String {
        self.cell(pos)
            .map(|c| c.get_value().trim().to_string())
            .unwrap_or_default()
    }

    pub fn is_blank(&self, pos: CellPos) -> bool {
        self.display(pos).is_empty()
    }

    pub fn region_of(&self, pos: CellPos) -> Option<&MergedRegion> {
        self.merged.iter().find(|m| m.contains(pos))
    }

    /// The cell that actually holds the value for `pos`.
    pub fn resolve(&self, pos: CellPos) -> CellPos {
        self.region_of(pos).map_or(pos, |m| m.top_left)
    }

    /// First cell to the right of `pos`, stepping past `pos`'s own merged region.
    pub fn right_of(&self, pos: CellPos) -> CellPos {
        let last_col = self.region_of(pos).map_or(pos.col, |m| m.bottom_right.col);
        CellPos::new(pos.row, last_col + 1)
    }

    fn target_mut(&mut self, pos: CellPos) -> &mut Cell {
        let target = self.resolve(pos);
        self.ws.get_cell_mut(target.to_a1().as_str())
    }

    pub fn write_number(&mut self, pos: CellPos, value: f64) {
        self.target_mut(pos).set_value_number(value);
    }

    pub fn write_text(&mut self, pos: CellPos, value: &str) {
        self.target_mut(pos).set_value_string(value);
    }

    /// Blanks an existing cell; missing cells stay missing.
    pub fn clear(&mut self, pos: CellPos) {
        let addr = self.resolve(pos).to_a1();
        if self.ws.get_cell(addr.as_str()).is_some() {
            self.ws.get_cell_mut(addr.as_str()).set_blank();
        }
    }
}
