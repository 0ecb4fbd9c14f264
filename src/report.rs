//! Standalone planning report: a fresh workbook with a colored schedule grid,
//! the cost estimation annotated with the budget cap, and the Option A metrics.

use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use csv::ReaderBuilder;
use tracing::{info, warn};
use umya_spreadsheet::structs::{
    ConditionalFormatValues, ConditionalFormatting, ConditionalFormattingOperatorValues,
    ConditionalFormattingRule, Formula, HorizontalAlignmentValues, Pane, PaneStateValues,
    PaneValues, PatternValues, SheetView, VerticalAlignmentValues,
};
use umya_spreadsheet::{Style, Worksheet};

use crate::config::{PlanConfig, round_to};
use crate::schedule::{Schedule, WEEKS, load_schedule};
use crate::sheet::{column_number_to_name, to_a1};

pub const SCHEDULE_SHEET: &str = "Schedule";
pub const COST_SHEET: &str = "Cost Estimation";
pub const OPTION_SHEET: &str = "OptionA";

const MAX_COLUMN_WIDTH: f64 = 28.0;
const MONEY_FORMAT: &str = "#,##0.00";
const OVER_BUDGET_RGB: &str = "FFC7CE";

/// Fill color (RRGGBB) per activity code.
const ACTIVITY_COLORS: &[(&str, &str)] = &[
    ("CD", "F4A460"),  // code
    ("MD", "9ACD32"),  // module design
    ("MN", "40E0D0"),  // manuals
    ("SD", "98FB98"),  // system design
    ("SP", "F4A1A1"),  // specification
    ("C", "ADD8E6"),   // correcting
    ("R", "87CEFA"),   // review
    ("TA", "E6A8D7"),  // acceptance test
    ("TM", "DEB887"),  // module test
    ("TI", "87CEEB"),  // integration test
    ("TS", "D8BFD8"),  // system test
    ("RSP", "87CEFA"),
    ("RSD", "87CEFA"),
    ("RMD", "87CEFA"),
    ("RTM", "87CEFA"),
    ("RTI", "87CEFA"),
    ("RTS", "87CEFA"),
    ("CSP", "ADD8E6"),
    ("CSD", "ADD8E6"),
    ("CMD", "ADD8E6"),
];

/// Color for a week token, keyed by its first `+`-separated code.
pub fn token_color(token: &str) -> Option<&'static str> {
    let code = token.split('+').next()?.trim();
    ACTIVITY_COLORS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, rgb)| *rgb)
}

fn solid_fill_style(rgb: &str) -> Style {
    // Lowercase ARGB keeps umya from mapping the color onto an indexed palette entry.
    let argb = format!("ff{}", rgb.to_ascii_lowercase());
    let mut style = Style::default();
    style
        .get_fill_mut()
        .get_pattern_fill_mut()
        .set_pattern_type(PatternValues::Solid);
    style
        .get_fill_mut()
        .get_pattern_fill_mut()
        .get_foreground_color_mut()
        .set_argb(argb.as_str());
    style
        .get_fill_mut()
        .get_pattern_fill_mut()
        .get_background_color_mut()
        .set_argb(argb.as_str());
    style
}

fn center(style: &mut Style) {
    style
        .get_alignment_mut()
        .set_horizontal(HorizontalAlignmentValues::Center);
    style
        .get_alignment_mut()
        .set_vertical(VerticalAlignmentValues::Center);
}

fn bold_header(ws: &mut Worksheet, columns: usize) {
    for col in 1..=columns {
        let style = ws.get_cell_mut(to_a1(col as u32, 1).as_str()).get_style_mut();
        style.get_font_mut().set_bold(true);
        center(style);
    }
}

/// Column widths from the longest value, capped at [`MAX_COLUMN_WIDTH`].
fn autosize(ws: &mut Worksheet, rows: &[Vec<String>]) {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    for col in 0..columns {
        let longest = rows
            .iter()
            .filter_map(|r| r.get(col))
            .map(|v| v.chars().count())
            .max()
            .unwrap_or(0);
        let width = ((longest + 2) as f64).min(MAX_COLUMN_WIDTH);
        let name = column_number_to_name(col as u32 + 1);
        ws.get_column_dimension_mut(&name).set_width(width);
    }
}

/// Writes `rows` from A1; with `numeric`, values that parse as numbers become numbers.
fn write_rows(ws: &mut Worksheet, rows: &[Vec<String>], numeric: bool) {
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            if value.is_empty() {
                continue;
            }
            let cell = ws.get_cell_mut(to_a1(c as u32 + 1, r as u32 + 1).as_str());
            match value.trim().parse::<f64>() {
                Ok(number) if numeric && r > 0 => {
                    cell.set_value_number(number);
                }
                _ => {
                    cell.set_value_string(value.as_str());
                }
            }
        }
    }
}

/// Keeps the header row and the person column in view; `B2` is the first scrolling cell.
fn freeze_header(ws: &mut Worksheet) {
    let mut pane = Pane::default();
    pane.set_horizontal_split(1.0)
        .set_vertical_split(1.0)
        .set_active_pane(PaneValues::BottomRight)
        .set_state(PaneStateValues::Frozen);
    pane.get_top_left_cell_mut().set_coordinate("B2");

    let views = ws.get_sheet_views_mut().get_sheet_view_list_mut();
    if views.is_empty() {
        views.push(SheetView::default());
    }
    if let Some(view) = views.first_mut() {
        view.set_pane(pane);
    }
}

/// Red fill on `E{total_row}` whenever it exceeds `E{cap_row}`; Excel re-evaluates it on edit.
fn over_cap_rule(total_row: u32, cap_row: u32) -> ConditionalFormatting {
    let mut formula = Formula::default();
    formula.set_address_str(format!("E{cap_row}"));

    let mut rule = ConditionalFormattingRule::default();
    rule.set_type(ConditionalFormatValues::CellIs)
        .set_operator(ConditionalFormattingOperatorValues::GreaterThan)
        .set_priority(1)
        .set_style(solid_fill_style(OVER_BUDGET_RGB))
        .set_formula(formula);

    let mut formatting = ConditionalFormatting::default();
    formatting
        .get_sequence_of_references_mut()
        .set_sqref(format!("E{total_row}"));
    formatting.add_conditional_collection(rule);
    formatting
}

fn schedule_rows(schedule: &Schedule) -> Vec<Vec<String>> {
    let mut header = vec!["Person".to_string()];
    header.extend((1..=WEEKS).map(|w| format!("W{w}")));

    let mut rows = vec![header];
    for entry in schedule.entries() {
        let mut row = vec![entry.person.clone()];
        row.extend(entry.weeks().map(str::to_string));
        rows.push(row);
    }
    rows
}

pub fn build_schedule_sheet(ws: &mut Worksheet, schedule: &Schedule) {
    let rows = schedule_rows(schedule);
    write_rows(ws, &rows, false);
    bold_header(ws, rows[0].len());

    for (r, row) in rows.iter().enumerate().skip(1) {
        for (c, token) in row.iter().enumerate().skip(1) {
            if token.is_empty() {
                continue;
            }
            let mut style = token_color(token).map(solid_fill_style).unwrap_or_default();
            center(&mut style);
            ws.get_cell_mut(to_a1(c as u32 + 1, r as u32 + 1).as_str())
                .set_style(style);
        }
    }
    autosize(ws, &rows);
    freeze_header(ws);
}

/// Rows added under the cost table's TOTAL line.
#[derive(Clone, Debug, PartialEq)]
pub struct BudgetRows {
    pub total_row: u32,
    pub cap_row: u32,
    pub slack_row: u32,
    pub total: Option<f64>,
    pub over_budget: bool,
}

/// Copies the cost CSV and, below its TOTAL row, adds the budget cap and the
/// slack formula. The total cell carries a conditional red fill for totals above the cap.
pub fn build_cost_sheet(ws: &mut Worksheet, rows: &[Vec<String>], budget_cap: f64) -> Option<BudgetRows> {
    write_rows(ws, rows, true);
    bold_header(ws, rows.first().map_or(0, Vec::len));
    autosize(ws, rows);

    let total_idx = rows
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, row)| row.first().is_some_and(|v| v.trim().eq_ignore_ascii_case("TOTAL")))
        .map(|(idx, _)| idx)?;

    let total_row = total_idx as u32 + 1;
    let cap_row = total_row + 1;
    let slack_row = total_row + 2;
    let total = rows[total_idx]
        .get(4)
        .and_then(|v| v.trim().parse::<f64>().ok());

    ws.get_cell_mut(to_a1(1, cap_row).as_str())
        .set_value_string("BUDGET_CAP (auto)");
    let cap_cell = ws.get_cell_mut(to_a1(5, cap_row).as_str());
    cap_cell.set_value_number(budget_cap);
    cap_cell
        .get_style_mut()
        .get_number_format_mut()
        .set_format_code(MONEY_FORMAT);

    ws.get_cell_mut(to_a1(1, slack_row).as_str())
        .set_value_string("BUDGET_SLACK (auto)");
    let slack_cell = ws.get_cell_mut(to_a1(5, slack_row).as_str());
    slack_cell.set_formula(format!("E{cap_row}-E{total_row}"));
    slack_cell
        .get_style_mut()
        .get_number_format_mut()
        .set_format_code(MONEY_FORMAT);

    ws.get_cell_mut(to_a1(5, total_row).as_str())
        .get_style_mut()
        .get_number_format_mut()
        .set_format_code(MONEY_FORMAT);
    ws.add_conditional_formatting_collection(over_cap_rule(total_row, cap_row));
    let over_budget = total.is_some_and(|t| t > budget_cap);

    Some(BudgetRows {
        total_row,
        cap_row,
        slack_row,
        total,
        over_budget,
    })
}

fn option_rows(config: &PlanConfig) -> Vec<Vec<String>> {
    let num = |v: f64| v.to_string();
    let mut rows = vec![
        vec!["Metric".to_string(), "Value".to_string()],
        vec!["Person-Months (PM)".to_string(), num(round_to(config.person_months, 2))],
        vec!["Duration (months)".to_string(), num(round_to(config.duration_months, 2))],
        vec!["Duration (days)".to_string(), num(round_to(config.duration_days(), 2))],
        vec!["Avg Developers".to_string(), num(config.avg_developers())],
        vec![],
        ["Category", "Percent", "PM", "Months", "Days"]
            .map(str::to_string)
            .to_vec(),
    ];

    let effort = config.effort_rows();
    for line in &effort {
        rows.push(vec![
            line.category.name().to_string(),
            num(line.fraction),
            num(line.person_months),
            num(line.months),
            num(line.days),
        ]);
    }
    let shares: f64 = effort.iter().map(|l| l.fraction).sum();
    rows.push(vec![
        "TOTAL".to_string(),
        num(round_to(shares, 2)),
        num(round_to(config.person_months, 2)),
        num(round_to(config.duration_months, 2)),
        num(round_to(config.duration_days(), 2)),
    ]);
    rows
}

pub fn build_option_sheet(ws: &mut Worksheet, config: &PlanConfig) {
    let rows = option_rows(config);
    write_rows(ws, &rows, true);
    bold_header(ws, 2);
    for col in 1..=5u32 {
        ws.get_cell_mut(to_a1(col, 7).as_str())
            .get_style_mut()
            .get_font_mut()
            .set_bold(true);
    }
    autosize(ws, &rows);
}

/// Raw CSV records, header included, ragged rows kept as they are.
pub fn read_csv_rows(path: &Path) -> Result<Vec<Vec<String>>> {
    let file = File::open(path).with_context(|| format!("cannot open CSV: {}", path.display()))?;
    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_reader(file);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("malformed CSV: {}", path.display()))?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    if rows.is_empty() {
        return Err(anyhow!("CSV is empty: {}", path.display()));
    }
    Ok(rows)
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReportSummary {
    pub people: usize,
    pub budget: Option<BudgetRows>,
}

pub fn build_report(
    schedule: &Schedule,
    cost_rows: &[Vec<String>],
    config: &PlanConfig,
    output: &Path,
) -> Result<ReportSummary> {
    let mut book = umya_spreadsheet::new_file_empty_worksheet();

    let ws = book
        .new_sheet(SCHEDULE_SHEET)
        .map_err(|e| anyhow!("cannot add sheet {SCHEDULE_SHEET}: {e}"))?;
    build_schedule_sheet(ws, schedule);

    let ws = book
        .new_sheet(COST_SHEET)
        .map_err(|e| anyhow!("cannot add sheet {COST_SHEET}: {e}"))?;
    let budget = build_cost_sheet(ws, cost_rows, config.budget_cap);
    if budget.is_none() {
        warn!("No TOTAL row in cost estimation; budget rows not added");
    }

    let ws = book
        .new_sheet(OPTION_SHEET)
        .map_err(|e| anyhow!("cannot add sheet {OPTION_SHEET}: {e}"))?;
    build_option_sheet(ws, config);

    umya_spreadsheet::writer::xlsx::write(&book, output)
        .with_context(|| format!("cannot save workbook: {}", output.display()))?;

    Ok(ReportSummary {
        people: schedule.len(),
        budget,
    })
}

#[derive(Debug, Parser)]
#[command(name = "ameise-report", version, about = "Build the standalone AMEISE planning workbook")]
struct ReportArgs {
    /// Project root that relative paths are resolved against
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Schedule grid CSV (Person,W1..W40)
    #[arg(long, default_value = "data/AMEISE-Schedule-v2-grid.csv")]
    schedule: PathBuf,

    /// Cost estimation CSV with a TOTAL row
    #[arg(long, default_value = "data/Cost-Estimation-v2.csv")]
    costs: PathBuf,

    /// Output workbook
    #[arg(short, long, default_value = "AMEISE-Plan.xlsx")]
    output: PathBuf,

    /// Budget cap in EUR [default: from config, 225000]
    #[arg(long, env = "BUDGET_CAP")]
    budget_cap: Option<f64>,

    /// TOML file overriding project metrics, effort shares and hourly rates
    #[arg(long)]
    config: Option<PathBuf>,
}

pub fn run(args: impl IntoIterator<Item = OsString>) -> Result<()> {
    let args = ReportArgs::parse_from(args);

    let mut config = PlanConfig::load(args.config.as_deref())?;
    if let Some(cap) = args.budget_cap {
        config.budget_cap = cap;
    }

    let schedule_path = args.root.join(&args.schedule);
    let schedule = load_schedule(&schedule_path)
        .with_context(|| format!("cannot load schedule: {}", schedule_path.display()))?;
    let cost_rows = read_csv_rows(&args.root.join(&args.costs))?;
    let output = args.root.join(&args.output);

    let summary = build_report(&schedule, &cost_rows, &config, &output)?;
    if let Some(budget) = summary.budget.as_ref().filter(|b| b.over_budget) {
        warn!(
            "Total project costs {:.2} exceed the budget cap {:.2}",
            budget.total.unwrap_or_default(),
            config.budget_cap
        );
    }
    info!("Wrote {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_color_uses_first_code() {
        assert_eq!(token_color("CD"), Some("F4A460"));
        assert_eq!(token_color("R+MN"), Some("87CEFA"));
        assert_eq!(token_color(" RTM + C"), Some("87CEFA"));
        assert_eq!(token_color("XX"), None);
        assert_eq!(token_color(""), None);
    }

    #[test]
    fn option_rows_carry_effort_totals() {
        let rows = option_rows(&PlanConfig::default());
        let design = rows.iter().find(|r| r.first().map(String::as_str) == Some("Design")).unwrap();
        assert_eq!(design[2], "7.1172");
        assert_eq!(design[3], "2.3409");

        let total = rows.last().unwrap();
        assert_eq!(total[0], "TOTAL");
        assert_eq!(total[1], "1");
        assert_eq!(total[4], "263.57");
    }

    #[test]
    fn cost_sheet_without_total_adds_nothing() {
        let mut book = umya_spreadsheet::new_file();
        let ws = book.get_active_sheet_mut();
        let rows = vec![
            vec!["Name".to_string(), "Rate".to_string()],
            vec!["Axel".to_string(), "40".to_string()],
        ];
        assert_eq!(build_cost_sheet(ws, &rows, 1000.0), None);
        assert_eq!(ws.get_cell("B2").and_then(|c| c.get_value_number()), Some(40.0));
    }

    #[test]
    fn cost_sheet_flags_totals_over_the_cap() {
        let mut book = umya_spreadsheet::new_file();
        let ws = book.get_active_sheet_mut();
        let rows: Vec<Vec<String>> = [
            vec!["Name", "Rate", "Weeks", "Hours", "Total"],
            vec!["Axel", "40", "1", "40", "1600"],
            vec!["TOTAL", "", "", "", "1600"],
        ]
        .into_iter()
        .map(|r| r.into_iter().map(str::to_string).collect())
        .collect();

        let budget = build_cost_sheet(ws, &rows, 1000.0).unwrap();
        assert_eq!(budget.total_row, 3);
        assert_eq!(budget.cap_row, 4);
        assert_eq!(budget.slack_row, 5);
        assert_eq!(budget.total, Some(1600.0));
        assert!(budget.over_budget);
        assert_eq!(ws.get_cell("E5").unwrap().get_formula(), "E4-E3");
        assert_eq!(ws.get_cell("E4").and_then(|c| c.get_value_number()), Some(1000.0));

        let rules = ws.get_conditional_formatting_collection();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].get_sequence_of_references().get_sqref(), "E3");
        let rule = &rules[0].get_conditional_collection()[0];
        assert_eq!(rule.get_type(), &ConditionalFormatValues::CellIs);
        assert_eq!(rule.get_operator(), &ConditionalFormattingOperatorValues::GreaterThan);
        assert_eq!(rule.get_formula().unwrap().get_address_str(), "E4");
        assert!(rule.get_style().is_some());
    }

    #[test]
    fn schedule_sheet_freezes_header_and_person_column() {
        let mut book = umya_spreadsheet::new_file();
        let ws = book.get_active_sheet_mut();
        build_schedule_sheet(ws, &Schedule::default());

        let pane = ws.get_sheets_views().get_sheet_view_list()[0].get_pane().unwrap();
        assert_eq!(pane.get_top_left_cell().get_coordinate(), "B2");
        assert!(matches!(pane.get_state(), PaneStateValues::Frozen));
    }
}
