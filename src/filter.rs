// 🔍 Filters
// The five user selections and the cascade that applies them.

use crate::error::SelectionError;
use crate::join::JoinedRecord;
use crate::market::TRAILING_WINDOW_END;
use crate::metrics::Metric;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Sentinel that disables the state filter
pub const ALL_STATES: &str = "All States";

pub const PROPERTY_TYPES: [&str; 6] = [
    "All Residential",
    "Single Family Residential",
    "Townhouse",
    "Condo/Co-op",
    "Single Units Only",
    "Multi-Family (2-4 Unit)",
];

pub const MIN_HOMES_SOLD_FLOOR: u32 = 1;
pub const MIN_HOMES_SOLD_CEILING: u32 = 500;
pub const DEFAULT_MIN_HOMES_SOLD: u32 = 10;

// ============================================================================
// STATE FILTER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateFilter {
    All,
    Code(String),
}

impl StateFilter {
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value == ALL_STATES {
            StateFilter::All
        } else {
            StateFilter::Code(value.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            StateFilter::All => ALL_STATES,
            StateFilter::Code(code) => code,
        }
    }

    pub fn matches(&self, state_code: &str) -> bool {
        match self {
            StateFilter::All => true,
            StateFilter::Code(code) => code == state_code,
        }
    }
}

// ============================================================================
// SELECTION
// ============================================================================

/// One immutable snapshot of the filter form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterSelection {
    pub period: NaiveDate,
    pub property_type: String,
    pub metric: Metric,
    pub state: StateFilter,
    pub min_homes_sold: u32,
}

/// Raw form fields as submitted; blank or absent fields take the defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterForm {
    pub period: Option<String>,
    pub property_type: Option<String>,
    pub metric: Option<String>,
    pub state: Option<String>,
    pub min_homes_sold: Option<u32>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl FilterSelection {
    /// Validate a submitted form against the available options.
    pub fn from_form(form: &FilterForm, options: &FilterOptions) -> Result<Self, SelectionError> {
        let mut selection = options.default_selection();

        if let Some(period) = non_blank(&form.period) {
            let parsed = NaiveDate::parse_from_str(period, "%Y-%m-%d")
                .map_err(|_| SelectionError::InvalidPeriod(period.to_string()))?;
            // only months present in the data can be selected
            if !options.periods.is_empty() && !options.periods.contains(&parsed) {
                return Err(SelectionError::InvalidPeriod(period.to_string()));
            }
            selection.period = parsed;
        }

        if let Some(property_type) = non_blank(&form.property_type) {
            if !PROPERTY_TYPES.contains(&property_type) {
                return Err(SelectionError::UnknownPropertyType(property_type.to_string()));
            }
            selection.property_type = property_type.to_string();
        }

        if let Some(metric) = non_blank(&form.metric) {
            selection.metric = Metric::from_label(metric)
                .ok_or_else(|| SelectionError::UnknownMetric(metric.to_string()))?;
        }

        if let Some(state) = non_blank(&form.state) {
            selection.state = StateFilter::parse(state);
        }

        if let Some(min) = form.min_homes_sold {
            if !(MIN_HOMES_SOLD_FLOOR..=MIN_HOMES_SOLD_CEILING).contains(&min) {
                return Err(SelectionError::ThresholdOutOfRange {
                    value: min,
                    min: MIN_HOMES_SOLD_FLOOR,
                    max: MIN_HOMES_SOLD_CEILING,
                });
            }
            selection.min_homes_sold = min;
        }

        Ok(selection)
    }

    /// Form fields that reproduce this selection
    pub fn to_form_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("period", self.period.format("%Y-%m-%d").to_string()),
            ("property_type", self.property_type.clone()),
            ("metric", self.metric.label().to_string()),
            ("state", self.state.label().to_string()),
            ("min_homes_sold", self.min_homes_sold.to_string()),
        ]
    }

    pub fn matches(&self, record: &JoinedRecord) -> bool {
        record.period_begin == self.period
            && record.property_type == self.property_type
            && record
                .metrics
                .get(Metric::HomesSold)
                .is_some_and(|sold| sold >= f64::from(self.min_homes_sold))
            && self.state.matches(&record.state_code)
    }
}

/// Snapshot month, property type, homes-sold threshold, then state.
pub fn apply_filters<'a>(
    records: &'a [JoinedRecord],
    selection: &FilterSelection,
) -> Vec<&'a JoinedRecord> {
    records.iter().filter(|r| selection.matches(r)).collect()
}

// ============================================================================
// OPTIONS
// ============================================================================

/// Choices offered by the form, derived from the joined table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOptions {
    /// Newest first
    pub periods: Vec<NaiveDate>,
    pub property_types: Vec<&'static str>,
    pub metrics: Vec<&'static str>,
    /// "All States" followed by codes in ascending order
    pub states: Vec<String>,
    pub min_homes_sold: u32,
    pub max_homes_sold: u32,
    pub default_homes_sold: u32,
}

impl FilterOptions {
    pub fn from_records(records: &[JoinedRecord]) -> Self {
        let periods: BTreeSet<NaiveDate> = records.iter().map(|r| r.period_begin).collect();
        let codes: BTreeSet<&str> = records.iter().map(|r| r.state_code.as_str()).collect();

        let mut states = vec![ALL_STATES.to_string()];
        states.extend(codes.into_iter().map(str::to_string));

        FilterOptions {
            periods: periods.into_iter().rev().collect(),
            property_types: PROPERTY_TYPES.to_vec(),
            metrics: Metric::ALL.iter().map(|m| m.label()).collect(),
            states,
            min_homes_sold: MIN_HOMES_SOLD_FLOOR,
            max_homes_sold: MIN_HOMES_SOLD_CEILING,
            default_homes_sold: DEFAULT_MIN_HOMES_SOLD,
        }
    }

    /// Most recent month, all residential, median price, all states, 10 sold.
    pub fn default_selection(&self) -> FilterSelection {
        FilterSelection {
            period: self.periods.first().copied().unwrap_or(TRAILING_WINDOW_END),
            property_type: PROPERTY_TYPES[0].to_string(),
            metric: Metric::default(),
            state: StateFilter::All,
            min_homes_sold: self.default_homes_sold,
        }
    }
}
