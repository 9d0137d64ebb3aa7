// 🏘️ Market Records
// One row of the county market tracker: a (county, property type, month) slice.

use crate::error::LoadError;
use crate::loader::{open_gzip, require_columns, tsv_reader};
use crate::metrics::MetricValues;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Columns the tracker export must carry; extra columns are ignored.
pub const REQUIRED_COLUMNS: [&str; 14] = [
    "period_begin",
    "period_end",
    "region",
    "parent_metro_region",
    "state_code",
    "property_type",
    "median_sale_price",
    "median_sale_price_yoy",
    "homes_sold",
    "homes_sold_yoy",
    "new_listings",
    "new_listings_yoy",
    "median_dom",
    "avg_sale_to_list",
];

/// First month of the trailing window (inclusive)
pub const TRAILING_WINDOW_START: NaiveDate = match NaiveDate::from_ymd_opt(2020, 10, 1) {
    Some(date) => date,
    None => panic!("invalid window start"),
};

/// Last month of the trailing window (inclusive)
pub const TRAILING_WINDOW_END: NaiveDate = match NaiveDate::from_ymd_opt(2021, 10, 1) {
    Some(date) => date,
    None => panic!("invalid window end"),
};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MarketRecord {
    pub period_begin: NaiveDate,
    pub period_end: NaiveDate,

    /// "<County> County, <ST>", the join key against the FIPS table
    pub region: String,
    pub parent_metro_region: String,
    pub state_code: String,
    pub property_type: String,

    #[serde(deserialize_with = "csv::invalid_option")]
    pub median_sale_price: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub median_sale_price_yoy: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub homes_sold: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub homes_sold_yoy: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub new_listings: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub new_listings_yoy: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub median_dom: Option<f64>,
    #[serde(deserialize_with = "csv::invalid_option")]
    pub avg_sale_to_list: Option<f64>,
}

impl MarketRecord {
    pub fn metrics(&self) -> MetricValues {
        MetricValues {
            median_sale_price: self.median_sale_price,
            median_sale_price_yoy: self.median_sale_price_yoy,
            homes_sold: self.homes_sold,
            homes_sold_yoy: self.homes_sold_yoy,
            new_listings: self.new_listings,
            new_listings_yoy: self.new_listings_yoy,
            median_dom: self.median_dom,
            avg_sale_to_list: self.avg_sale_to_list,
        }
    }

    pub fn in_trailing_window(&self) -> bool {
        (TRAILING_WINDOW_START..=TRAILING_WINDOW_END).contains(&self.period_begin)
    }
}

/// Keep only the rows whose `period_begin` falls inside the trailing window.
pub fn trailing_window(records: &[MarketRecord]) -> Vec<&MarketRecord> {
    records.iter().filter(|r| r.in_trailing_window()).collect()
}

/// Read the gzip-compressed, tab-separated tracker export.
pub fn read_market_tsv(path: &Path) -> Result<Vec<MarketRecord>, LoadError> {
    let mut rdr = tsv_reader(open_gzip(path)?);
    require_columns(path, &mut rdr, &REQUIRED_COLUMNS, true)?;

    let mut records = Vec::new();
    for result in rdr.deserialize() {
        let record: MarketRecord = result.map_err(|e| LoadError::from_csv(path, e, true))?;
        records.push(record);
    }

    info!(path = %path.display(), rows = records.len(), "loaded market tracker");
    Ok(records)
}
