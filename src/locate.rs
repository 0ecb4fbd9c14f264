//! Anchor lookups over a [`TemplateSheet`].
//!
//! Every scan runs row-major (top to bottom, then left to right) so the first
//! match is reproducible, and only string cells can match a label.

use tracing::debug;

use crate::sheet::{CellPos, TemplateSheet, normalize_label};

fn find_by<F>(sheet: &TemplateSheet<'_>, matches: F) -> Option<CellPos>
where
    F: Fn(&str) -> bool,
{
    let (rows, cols) = sheet.scan_bounds();
    for row in 1..=rows {
        for col in 1..=cols {
            let pos = CellPos::new(row, col);
            if let Some(text) = sheet.text(pos) {
                if matches(&normalize_label(&text)) {
                    return Some(pos);
                }
            }
        }
    }
    None
}

/// First cell whose text equals `label`, ignoring case and surrounding whitespace.
pub fn find_exact(sheet: &TemplateSheet<'_>, label: &str) -> Option<CellPos> {
    let wanted = normalize_label(label);
    find_by(sheet, |text| text == wanted)
}

/// First cell whose text starts with `label`; section headers may carry trailing notes.
pub fn find_prefix(sheet: &TemplateSheet<'_>, label: &str) -> Option<CellPos> {
    let wanted = normalize_label(label);
    find_by(sheet, |text| text.starts_with(&wanted))
}

/// Header row of the week grid and the column holding week 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WeekGrid {
    pub header: CellPos,
    pub first_week_col: u32,
}

impl WeekGrid {
    /// Column of a 1-based week.
    pub fn week_col(&self, week: usize) -> u32 {
        self.first_week_col + week as u32 - 1
    }
}

fn is_week_one(sheet: &TemplateSheet<'_>, pos: CellPos) -> bool {
    sheet.number(pos) == Some(1.0) || sheet.text(pos).is_some_and(|t| t.trim() == "1")
}

/// Finds the `header` cell, then looks up to `search_cols` columns to its right
/// for the numeral 1. Falls back to the column right after the header.
pub fn find_week_grid(sheet: &TemplateSheet<'_>, header: &str, search_cols: u32) -> Option<WeekGrid> {
    let header = find_exact(sheet, header)?;
    let last_col = (header.col + search_cols - 1).min(sheet.max_col());

    let first_week_col = ((header.col + 1)..=last_col)
        .find(|&col| is_week_one(sheet, CellPos::new(header.row, col)))
        .unwrap_or_else(|| {
            debug!(header = %header.to_a1(), "no week 1 column; assuming the next column");
            header.col + 1
        });

    Some(WeekGrid {
        header,
        first_week_col,
    })
}

/// Bounds for [`find_person_row`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PersonSearch {
    pub max_row: u32,
    pub leading_cols: u32,
}

/// First row at or after `start_row` whose leading columns hold `person`.
pub fn find_person_row(
    sheet: &TemplateSheet<'_>,
    person: &str,
    start_row: u32,
    search: PersonSearch,
) -> Option<u32> {
    let wanted = normalize_label(person);
    let last_row = search.max_row.min(sheet.max_row());
    let last_col = search.leading_cols.min(sheet.max_col());

    (start_row.max(1)..=last_row).find(|&row| {
        (1..=last_col).any(|col| {
            sheet
                .text(CellPos::new(row, col))
                .is_some_and(|t| normalize_label(&t) == wanted)
        })
    })
}

/// Non-empty string cells across `weeks` columns of the grid in `row`.
pub fn count_assigned_weeks(sheet: &TemplateSheet<'_>, row: u32, grid: &WeekGrid, weeks: usize) -> usize {
    (1..=weeks)
        .filter(|&week| {
            sheet
                .text(CellPos::new(row, grid.week_col(week)))
                .is_some_and(|t| !t.trim().is_empty())
        })
        .count()
}
