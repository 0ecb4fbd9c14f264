//! Fills the planning template: headline metrics, effort distribution, schedule
//! grid and cost estimation.
//!
//! A section whose anchor cannot be found is skipped with a warning; the other
//! sections are still filled and the workbook is still saved.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};
use umya_spreadsheet::Worksheet;

use crate::config::{PlanConfig, round_to};
use crate::layout::{CostLayout, EffortLayout, GridLayout, Metric, TemplateLayout};
use crate::locate::{count_assigned_weeks, find_person_row, find_prefix, find_week_grid};
use crate::schedule::{Schedule, WEEKS, load_schedule};
use crate::sheet::{CellPos, TemplateSheet, normalize_label};
use crate::template::{DEFAULT_TEMPLATE, filled_output_path, resolve_template};

/// People written to (or missing from) the week grid.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScheduleFill {
    pub written: Vec<String>,
    pub missing: Vec<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CostLine {
    pub person: String,
    pub row: u32,
    pub rate: f64,
    pub weeks: usize,
    pub months: f64,
    pub hours: f64,
    pub total: f64,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CostSummary {
    pub lines: Vec<CostLine>,
    pub grand_total: f64,
    /// Row the grand total went to; `None` when the total label was not found.
    pub total_row: Option<u32>,
}

impl CostSummary {
    pub fn line(&self, person: &str) -> Option<&CostLine> {
        self.lines.iter().find(|l| l.person == person)
    }
}

/// What a fill pass managed to write. `None`/`false` marks a skipped section.
#[derive(Clone, Debug, PartialEq)]
pub struct FillReport {
    pub metrics_written: usize,
    pub effort: bool,
    pub schedule: Option<ScheduleFill>,
    pub cost: Option<CostSummary>,
}

fn metric_value(config: &PlanConfig, metric: Metric) -> f64 {
    match metric {
        Metric::DurationMonths => round_to(config.duration_months, 2),
        Metric::AvgDevelopers => config.avg_developers(),
        Metric::PersonMonths => round_to(config.person_months, 2),
    }
}

/// Writes `value` in the first cell right of the label starting with `label`.
pub fn set_right_of_label(sheet: &mut TemplateSheet<'_>, label: &str, value: f64) -> bool {
    let Some(pos) = find_prefix(sheet, label) else {
        warn!("Label not found (starts with): {label}");
        return false;
    };
    let target = sheet.right_of(pos);
    sheet.write_number(target, value);
    true
}

pub fn fill_metrics(sheet: &mut TemplateSheet<'_>, config: &PlanConfig, layout: &TemplateLayout) -> usize {
    let mut written = 0;
    for slot in &layout.metrics {
        if set_right_of_label(sheet, slot.label, metric_value(config, slot.metric)) {
            written += 1;
        }
    }
    written
}

/// Row holding the effort column labels and the column of each label.
struct EffortColumns {
    header_row: u32,
    cols: [u32; 5],
}

/// Looks for each column label in the expected header row, then one row above
/// and one row below it, within `header_width` columns from the anchor.
fn effort_columns(sheet: &TemplateSheet<'_>, anchor: CellPos, layout: &EffortLayout) -> Option<EffortColumns> {
    let expected = anchor.row + layout.header_offset;
    let rows: Vec<u32> = [Some(expected), expected.checked_sub(1), Some(expected + 1)]
        .into_iter()
        .flatten()
        .filter(|&r| r > 0)
        .collect();
    let cols = anchor.col..anchor.col + layout.header_width;

    let mut found = EffortColumns {
        header_row: expected,
        cols: [0; 5],
    };
    for (slot, label) in layout.columns.iter().enumerate() {
        let wanted = normalize_label(label);
        let hit = rows.iter().find_map(|&row| {
            cols.clone()
                .find(|&col| {
                    sheet
                        .text(CellPos::new(row, col))
                        .is_some_and(|t| normalize_label(&t) == wanted)
                })
                .map(|col| CellPos::new(row, col))
        });
        let Some(hit) = hit else {
            debug!("effort column label {label:?} not found near {}", anchor.to_a1());
            return None;
        };
        found.cols[slot] = hit.col;
        found.header_row = if slot == 0 { hit.row } else { found.header_row.max(hit.row) };
    }
    Some(found)
}

pub fn fill_effort_table(sheet: &mut TemplateSheet<'_>, config: &PlanConfig, layout: &EffortLayout) -> bool {
    let Some(anchor) = find_prefix(sheet, layout.section) else {
        warn!("'{}' header not found; skipping table fill", layout.section);
        return false;
    };
    let Some(columns) = effort_columns(sheet, anchor, layout) else {
        warn!(
            "'{}' column labels {:?} not all found; skipping table fill",
            layout.section, layout.columns
        );
        return false;
    };
    let [name_col, pct_col, pm_col, months_col, days_col] = columns.cols;

    let mut row = columns.header_row + 1;
    for line in config.effort_rows() {
        sheet.write_text(CellPos::new(row, name_col), line.category.name());
        sheet.write_number(CellPos::new(row, pct_col), line.percent);
        sheet.write_number(CellPos::new(row, pm_col), line.person_months);
        sheet.write_number(CellPos::new(row, months_col), line.months);
        sheet.write_number(CellPos::new(row, days_col), line.days);
        row += 1;
    }

    sheet.write_text(CellPos::new(row, name_col), layout.total_label);
    sheet.write_number(CellPos::new(row, pm_col), round_to(config.person_months, 2));
    sheet.write_number(CellPos::new(row, months_col), round_to(config.duration_months, 2));
    sheet.write_number(CellPos::new(row, days_col), round_to(config.duration_days(), 0));
    true
}

pub fn fill_schedule_grid(
    sheet: &mut TemplateSheet<'_>,
    schedule: &Schedule,
    layout: &GridLayout,
) -> Option<ScheduleFill> {
    let Some(grid) = find_week_grid(sheet, layout.header, layout.week_one_search) else {
        warn!("Week grid not detected; skipping schedule write");
        return None;
    };

    let start_row = grid.header.row + 1;
    let mut fill = ScheduleFill::default();
    for entry in schedule.entries() {
        let Some(row) = find_person_row(sheet, &entry.person, start_row, layout.person_search) else {
            info!("Person row not found in template, skipping: {}", entry.person);
            fill.missing.push(entry.person.clone());
            continue;
        };
        for (idx, token) in entry.weeks().enumerate() {
            let pos = CellPos::new(row, grid.week_col(idx + 1));
            if token.is_empty() {
                sheet.clear(pos);
            } else {
                sheet.write_text(pos, token);
            }
        }
        fill.written.push(entry.person.clone());
    }
    Some(fill)
}

pub fn fill_cost_table(
    sheet: &mut TemplateSheet<'_>,
    config: &PlanConfig,
    layout: &TemplateLayout,
) -> Option<CostSummary> {
    let cost: &CostLayout = &layout.cost;
    let Some(anchor) = find_prefix(sheet, cost.section) else {
        warn!("'{}' section not found; skipping", cost.section);
        return None;
    };
    let Some(grid) = find_week_grid(sheet, layout.grid.header, layout.grid.week_one_search) else {
        warn!("Week grid not detected; skipping '{}'", cost.section);
        return None;
    };

    let name_col = anchor.col;
    let at = |row: u32, offset: u32| CellPos::new(row, name_col + offset);
    let total_label = normalize_label(cost.total_label);
    let max_row = sheet.max_row();

    let mut summary = CostSummary::default();
    let mut row = anchor.row + cost.first_row_offset;
    while row <= max_row {
        let name = sheet.display(at(row, 0));
        if name.is_empty() || normalize_label(&name).starts_with(&total_label) {
            break;
        }
        let Some(rate) = config.rate(&name) else {
            debug!(row, "no rate for {name:?}; leaving row untouched");
            row += 1;
            continue;
        };

        let weeks = find_person_row(sheet, &name, grid.header.row + 1, layout.grid.person_search)
            .map_or(0, |person_row| count_assigned_weeks(sheet, person_row, &grid, WEEKS));
        let hours = weeks as f64 * config.hours_per_week;
        let months = round_to(weeks as f64 * config.days_per_week / config.days_per_month, 2);
        let total = round_to(hours * rate, 2);

        sheet.write_number(at(row, cost.rate_col), rate);
        sheet.write_number(at(row, cost.weeks_col), weeks as f64);
        sheet.write_number(at(row, cost.months_col), months);
        sheet.write_number(at(row, cost.hours_col), hours);
        sheet.write_number(at(row, cost.total_col), total);

        summary.grand_total += total;
        summary.lines.push(CostLine {
            person: name,
            row,
            rate,
            weeks,
            months,
            hours,
            total,
        });
        row += 1;
    }
    summary.grand_total = round_to(summary.grand_total, 2);

    summary.total_row = (row..row + cost.total_search_rows).find(|&r| {
        sheet
            .text(at(r, 0))
            .is_some_and(|t| normalize_label(&t).starts_with(&total_label))
    });
    match summary.total_row {
        Some(total_row) => sheet.write_number(at(total_row, cost.total_col), summary.grand_total),
        None => warn!("'{}' row not found; grand total not written", cost.total_label),
    }
    Some(summary)
}

/// Runs every section against `ws` in template order.
pub fn fill_worksheet(
    ws: &mut Worksheet,
    schedule: &Schedule,
    config: &PlanConfig,
    layout: &TemplateLayout,
) -> FillReport {
    let mut sheet = TemplateSheet::new(ws);
    let metrics_written = fill_metrics(&mut sheet, config, layout);
    let effort = fill_effort_table(&mut sheet, config, &layout.effort);
    let grid = fill_schedule_grid(&mut sheet, schedule, &layout.grid);
    let cost = fill_cost_table(&mut sheet, config, layout);
    FillReport {
        metrics_written,
        effort,
        schedule: grid,
        cost,
    }
}

/// Fills the active sheet of `template` and saves the result to `output`.
pub fn fill_template_file(
    template: &Path,
    schedule: &Schedule,
    config: &PlanConfig,
    layout: &TemplateLayout,
    output: &Path,
) -> Result<FillReport> {
    let mut book = umya_spreadsheet::reader::xlsx::read(template)
        .with_context(|| format!("cannot open template: {}", template.display()))?;

    let report = fill_worksheet(book.get_active_sheet_mut(), schedule, config, layout);

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("cannot create output directory: {}", parent.display()))?;
    }
    umya_spreadsheet::writer::xlsx::write(&book, output)
        .with_context(|| format!("cannot save workbook: {}", output.display()))?;

    Ok(report)
}

#[derive(Debug, Parser)]
#[command(name = "ameise-fill", version, about = "Fill the AMEISE planning template from the schedule CSV")]
struct FillArgs {
    /// Project root that relative paths are resolved against
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Template workbook; auto-discovered under <root>/template when missing
    #[arg(long, env = "TEMPLATE_PATH", default_value = DEFAULT_TEMPLATE)]
    template: PathBuf,

    /// Schedule grid CSV (Person,W1..W40)
    #[arg(long, default_value = "data/AMEISE-Schedule-v2-grid.csv")]
    schedule: PathBuf,

    /// Output workbook [default: <template-dir>/<template-stem>_filled.xlsx]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML file overriding project metrics, effort shares and hourly rates
    #[arg(long)]
    config: Option<PathBuf>,
}

pub fn run(args: impl IntoIterator<Item = OsString>) -> Result<()> {
    let args = FillArgs::parse_from(args);

    let template = resolve_template(&args.root, &args.template)?;
    let config = PlanConfig::load(args.config.as_deref())?;

    let schedule_path = args.root.join(&args.schedule);
    let schedule = load_schedule(&schedule_path)
        .with_context(|| format!("cannot load schedule: {}", schedule_path.display()))?;
    info!("Loaded {} people from {}", schedule.len(), schedule_path.display());

    let output = match args.output {
        Some(out) => args.root.join(out),
        None => filled_output_path(&template),
    };
    let report = fill_template_file(&template, &schedule, &config, &TemplateLayout::AMEISE, &output)?;

    if let Some(cost) = &report.cost {
        info!("Total project costs: {:.2} EUR", cost.grand_total);
    }
    info!("Saved filled workbook to {}", output.display());
    Ok(())
}
