//! Where the filler expects things in the planning template.
//!
//! The filler never hard-codes a label or an offset; it reads them from a
//! [`TemplateLayout`]. [`TemplateLayout::AMEISE`] describes the AMEISE planning
//! template (v1.95).

use crate::locate::PersonSearch;

/// Values written to the right of a metric label.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Metric {
    DurationMonths,
    AvgDevelopers,
    PersonMonths,
}

#[derive(Clone, Copy, Debug)]
pub struct MetricSlot {
    /// Prefix of the label cell.
    pub label: &'static str,
    pub metric: Metric,
}

#[derive(Clone, Copy, Debug)]
pub struct EffortLayout {
    /// Prefix of the section anchor.
    pub section: &'static str,
    /// Column labels in order: category, %, PM, months, days.
    pub columns: [&'static str; 5],
    /// Row offset from the anchor where the column labels are expected.
    pub header_offset: u32,
    /// Column labels are looked up from the anchor column up to this many columns right.
    pub header_width: u32,
    pub total_label: &'static str,
}

#[derive(Clone, Copy, Debug)]
pub struct GridLayout {
    /// Exact text of the week header cell.
    pub header: &'static str,
    /// Columns right of the header searched for week 1.
    pub week_one_search: u32,
    pub person_search: PersonSearch,
}

/// Cost table columns, as offsets from the section anchor's column.
#[derive(Clone, Copy, Debug)]
pub struct CostLayout {
    /// Prefix of the section anchor.
    pub section: &'static str,
    /// Rows between the anchor and the first person row.
    pub first_row_offset: u32,
    pub rate_col: u32,
    pub weeks_col: u32,
    pub months_col: u32,
    pub hours_col: u32,
    pub total_col: u32,
    /// Prefix of the grand total row's leading cell.
    pub total_label: &'static str,
    /// Rows after the table searched for the total label.
    pub total_search_rows: u32,
}

#[derive(Clone, Copy, Debug)]
pub struct TemplateLayout {
    pub metrics: [MetricSlot; 3],
    pub effort: EffortLayout,
    pub grid: GridLayout,
    pub cost: CostLayout,
}

impl TemplateLayout {
    pub const AMEISE: TemplateLayout = TemplateLayout {
        metrics: [
            MetricSlot {
                label: "Est. Proj. Duration",
                metric: Metric::DurationMonths,
            },
            MetricSlot {
                label: "Est. Avg. Developers",
                metric: Metric::AvgDevelopers,
            },
            MetricSlot {
                label: "Est. PersonMonths",
                metric: Metric::PersonMonths,
            },
        ],
        effort: EffortLayout {
            section: "Effort Distribution",
            columns: ["Types of Effort", "%", "PM", "months", "days"],
            header_offset: 1,
            header_width: 20,
            total_label: "Total Effort",
        },
        grid: GridLayout {
            header: "Week",
            week_one_search: 80,
            person_search: PersonSearch {
                max_row: 220,
                leading_cols: 8,
            },
        },
        cost: CostLayout {
            section: "Cost Estimation",
            first_row_offset: 2,
            rate_col: 1,
            weeks_col: 2,
            months_col: 3,
            hours_col: 4,
            total_col: 5,
            total_label: "Total Project Costs",
            total_search_rows: 12,
        },
    };
}

impl Default for TemplateLayout {
    fn default() -> Self {
        Self::AMEISE
    }
}
