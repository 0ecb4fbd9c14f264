//! Project metrics shared by the template filler and the report builder.
//!
//! Everything the scripts used to keep as process-wide constants lives in [`PlanConfig`],
//! which callers build once (defaults or a TOML override file) and pass down by reference.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config file {path}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EffortCategory {
    Management,
    Specification,
    Design,
    Coding,
    Testing,
    Reviews,
    Manuals,
}

impl EffortCategory {
    pub const ALL: [EffortCategory; 7] = [
        EffortCategory::Management,
        EffortCategory::Specification,
        EffortCategory::Design,
        EffortCategory::Coding,
        EffortCategory::Testing,
        EffortCategory::Reviews,
        EffortCategory::Manuals,
    ];

    pub fn name(self) -> &'static str {
        match self {
            EffortCategory::Management => "Management",
            EffortCategory::Specification => "Specification",
            EffortCategory::Design => "Design",
            EffortCategory::Coding => "Coding",
            EffortCategory::Testing => "Testing",
            EffortCategory::Reviews => "Reviews",
            EffortCategory::Manuals => "Manuals",
        }
    }
}

/// Fraction of total effort per category.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct EffortShares {
    pub management: f64,
    pub specification: f64,
    pub design: f64,
    pub coding: f64,
    pub testing: f64,
    pub reviews: f64,
    pub manuals: f64,
}

impl Default for EffortShares {
    fn default() -> Self {
        Self {
            management: 0.07,
            specification: 0.10,
            design: 0.27,
            coding: 0.26,
            testing: 0.18,
            reviews: 0.03,
            manuals: 0.09,
        }
    }
}

impl EffortShares {
    pub fn fraction(&self, category: EffortCategory) -> f64 {
        match category {
            EffortCategory::Management => self.management,
            EffortCategory::Specification => self.specification,
            EffortCategory::Design => self.design,
            EffortCategory::Coding => self.coding,
            EffortCategory::Testing => self.testing,
            EffortCategory::Reviews => self.reviews,
            EffortCategory::Manuals => self.manuals,
        }
    }
}

/// One line of the effort distribution, already rounded for display.
#[derive(Clone, Debug, PartialEq)]
pub struct EffortRow {
    pub category: EffortCategory,
    pub fraction: f64,
    /// Percentage, 2 decimals.
    pub percent: f64,
    /// Person-months, 4 decimals.
    pub person_months: f64,
    /// Calendar months, 4 decimals.
    pub months: f64,
    /// Calendar days, 2 decimals.
    pub days: f64,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PlanConfig {
    pub person_months: f64,
    pub duration_months: f64,
    pub days_per_month: f64,
    pub days_per_week: f64,
    pub hours_per_week: f64,
    pub budget_cap: f64,
    pub effort: EffortShares,
    /// Hourly rate in EUR per person.
    pub rates: HashMap<String, f64>,
}

impl Default for PlanConfig {
    fn default() -> Self {
        let rates = [
            ("Axel", 40.0),
            ("Bernd", 40.0),
            ("Christine", 45.0),
            ("Diana", 40.0),
            ("Richard", 50.0),
            ("Stefanie", 40.0),
            ("Thomas", 45.0),
        ]
        .into_iter()
        .map(|(name, rate)| (name.to_string(), rate))
        .collect();

        Self {
            person_months: 26.36,
            duration_months: 8.67,
            days_per_month: 30.4,
            days_per_week: 7.0,
            hours_per_week: 40.0,
            budget_cap: 225_000.0,
            effort: EffortShares::default(),
            rates,
        }
    }
}

impl PlanConfig {
    /// Defaults overlaid with whatever `path` sets.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// `None` keeps the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_toml_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn avg_developers(&self) -> f64 {
        round_to(self.person_months / self.duration_months, 2)
    }

    pub fn duration_days(&self) -> f64 {
        self.duration_months * self.days_per_month
    }

    pub fn rate(&self, person: &str) -> Option<f64> {
        self.rates.get(person).copied()
    }

    pub fn effort_rows(&self) -> Vec<EffortRow> {
        EffortCategory::ALL
            .iter()
            .map(|&category| {
                let fraction = self.effort.fraction(category);
                let months = self.duration_months * fraction;
                EffortRow {
                    category,
                    fraction,
                    percent: round_to(fraction * 100.0, 2),
                    person_months: round_to(self.person_months * fraction, 4),
                    months: round_to(months, 4),
                    days: round_to(months * self.days_per_month, 2),
                }
            })
            .collect()
    }
}
