//! Fill the AMEISE planning template from the week-grid schedule CSV, or build
//! the standalone planning report workbook.

pub mod config;
pub mod console;
pub mod fill;
pub mod layout;
pub mod locate;
pub mod report;
pub mod schedule;
pub mod sheet;
pub mod template;
