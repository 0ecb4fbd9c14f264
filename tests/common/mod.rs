//! A small planning template with every section the filler knows about.
//!
//! ```text
//! row  1  Est. Proj. Duration (A1:B1 merged)
//! row  2  Est. Avg. Developers
//! row  3  Est. PersonMonths
//! row  5  Effort Distribution (Option A)
//! row  6  Types of Effort | % | PM | months | days
//! row 17  Cost Estimation
//! row 18  Name | Rate | Weeks | Months | Hours | Total
//! rows 19-22  Axel, Bernd, Zoe, Christine
//! row 24  Total Project Costs
//! row 27  Week | Role | 1 .. 40   (week 1 in column C)
//! rows 28-31  Axel, Bernd, Christine, Zoe
//! ```
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use ameise_tools::sheet::to_a1;
use calamine::{Data, Reader, open_workbook_auto};
use umya_spreadsheet::{Spreadsheet, Worksheet};

pub const GRID_HEADER_ROW: u32 = 27;
pub const FIRST_WEEK_COL: u32 = 3;
pub const TOTAL_ROW: u32 = 24;

pub fn put(ws: &mut Worksheet, addr: &str, text: &str) {
    ws.get_cell_mut(addr).set_value_string(text);
}

pub fn text(ws: &Worksheet, addr: &str) -> String {
    ws.get_cell(addr)
        .map(|c| c.get_value().into_owned())
        .unwrap_or_default()
}

pub fn number(ws: &Worksheet, addr: &str) -> Option<f64> {
    ws.get_cell(addr).and_then(|c| c.get_value_number())
}

pub fn build_template() -> Spreadsheet {
    let mut book = umya_spreadsheet::new_file();
    let ws = book.get_active_sheet_mut();

    put(ws, "A1", "Est. Proj. Duration");
    ws.add_merge_cells("A1:B1");
    put(ws, "A2", "Est. Avg. Developers");
    put(ws, "A3", "Est. PersonMonths");

    put(ws, "A5", "Effort Distribution (Option A)");
    for (addr, label) in [
        ("A6", "Types of Effort"),
        ("B6", "%"),
        ("C6", "PM"),
        ("D6", "months"),
        ("E6", "days"),
    ] {
        put(ws, addr, label);
    }

    put(ws, "A17", "Cost Estimation");
    for (addr, label) in [
        ("A18", "Name"),
        ("B18", "Rate"),
        ("C18", "Weeks"),
        ("D18", "Months"),
        ("E18", "Hours"),
        ("F18", "Total"),
    ] {
        put(ws, addr, label);
    }
    for (row, name) in [(19, "Axel"), (20, "Bernd"), (21, "Zoe"), (22, "Christine")] {
        put(ws, &format!("A{row}"), name);
    }
    put(ws, &format!("A{TOTAL_ROW}"), "Total Project Costs");

    put(ws, &format!("A{GRID_HEADER_ROW}"), "Week");
    put(ws, &format!("B{GRID_HEADER_ROW}"), "Role");
    for week in 1..=40u32 {
        let addr = to_a1(FIRST_WEEK_COL + week - 1, GRID_HEADER_ROW);
        ws.get_cell_mut(addr.as_str()).set_value_number(week);
    }
    for (row, name) in [(28, "Axel"), (29, "Bernd"), (30, "Christine"), (31, "Zoe")] {
        put(ws, &format!("A{row}"), name);
    }

    book
}

pub fn schedule_csv(rows: &[&str]) -> String {
    let weeks: Vec<String> = (1..=40).map(|w| format!("W{w}")).collect();
    let mut csv = format!("Person,{}\n", weeks.join(","));
    for row in rows {
        csv.push_str(row);
        csv.push('\n');
    }
    csv
}

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

pub fn save_template(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    umya_spreadsheet::writer::xlsx::write(&build_template(), &path).unwrap();
    path
}

/// Reads one sheet back with calamine; positions are 0-based absolute.
pub fn read_sheet(path: &Path, sheet: Option<&str>) -> calamine::Range<Data> {
    let mut workbook = open_workbook_auto(path).unwrap();
    let name = match sheet {
        Some(name) => name.to_string(),
        None => workbook.sheet_names()[0].clone(),
    };
    workbook.worksheet_range(&name).unwrap()
}

pub fn datatype_to_string(cell: Option<&Data>) -> String {
    match cell {
        None | Some(Data::Empty) => String::new(),
        Some(Data::String(s)) => s.clone(),
        Some(Data::Float(n)) => {
            if n.fract() == 0.0 {
                format!("{:.0}", n)
            } else {
                n.to_string()
            }
        }
        Some(Data::Int(n)) => n.to_string(),
        Some(other) => format!("{other:?}"),
    }
}

/// Displayed value at a 1-based row and column.
pub fn cell_at(range: &calamine::Range<Data>, row: u32, col: u32) -> String {
    datatype_to_string(range.get_value((row - 1, col - 1)))
}
