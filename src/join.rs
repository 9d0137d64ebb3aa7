// 🔗 Joiner
// Market rows → county codes → boundaries, as an explicit hash join.
//
// Null handling:
// - market region with no reference row: kept with no county code
// - no county code, or a code with no boundary: dropped (counted)
// - boundary with no market row: orphaned (counted)
// Every JoinedRecord therefore has both a geometry and a period_begin.

use crate::boundaries::BoundarySet;
use crate::counties::CountyReference;
use crate::market::MarketRecord;
use crate::metrics::{Metric, MetricValues};
use chrono::NaiveDate;
use geojson::Geometry;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

/// A market row after the left join against the county reference.
#[derive(Debug, Clone)]
pub struct KeyedMarketRecord<'a> {
    pub record: &'a MarketRecord,
    pub county_fips: Option<String>,
}

/// One displayable county-month row.
#[derive(Debug, Clone, Serialize)]
pub struct JoinedRecord {
    pub period_begin: NaiveDate,
    pub period_end: NaiveDate,
    pub region: String,
    pub parent_metro_region: String,
    pub state_code: String,
    pub property_type: String,
    #[serde(flatten)]
    pub metrics: MetricValues,
    pub county_fips: String,
    #[serde(skip)]
    pub geometry: Arc<Geometry>,
}

impl JoinedRecord {
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        self.metrics.get(metric)
    }
}

/// Row counts from one join, for logs and the summary screen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JoinReport {
    pub market_rows: usize,
    pub windowed_rows: usize,
    /// Windowed rows whose region had no county reference match
    pub unmatched_regions: usize,
    /// Rows dropped for lack of a boundary (includes unmatched regions)
    pub without_geometry: usize,
    /// Boundaries that no market row referenced
    pub orphaned_boundaries: usize,
    pub joined_rows: usize,
}

/// Left join on `region == Name + " County, " + State`.
///
/// Exact string equality; a region with several reference rows yields one
/// keyed row per match.
pub fn key_by_county<'a>(
    market: &[&'a MarketRecord],
    counties: &[CountyReference],
) -> Vec<KeyedMarketRecord<'a>> {
    let mut by_region: HashMap<String, Vec<&CountyReference>> = HashMap::new();
    for county in counties {
        by_region.entry(county.region()).or_default().push(county);
    }

    let mut keyed = Vec::with_capacity(market.len());
    for &record in market {
        match by_region.get(&record.region) {
            Some(matches) => {
                for county in matches {
                    keyed.push(KeyedMarketRecord {
                        record,
                        county_fips: county.county_fips(),
                    });
                }
            }
            None => keyed.push(KeyedMarketRecord {
                record,
                county_fips: None,
            }),
        }
    }
    keyed
}

/// Attach boundaries by county code and drop rows that cannot be drawn.
pub fn attach_boundaries(
    keyed: &[KeyedMarketRecord<'_>],
    boundaries: &BoundarySet,
) -> (Vec<JoinedRecord>, JoinReport) {
    let index = boundaries.index();
    let mut report = JoinReport::default();
    let mut referenced: HashSet<&str> = HashSet::new();
    let mut joined = Vec::new();

    for row in keyed {
        let matches = row
            .county_fips
            .as_deref()
            .and_then(|code| index.get_key_value(code));

        let Some((code, shapes)) = matches else {
            report.without_geometry += 1;
            continue;
        };

        referenced.insert(*code);
        for shape in shapes {
            joined.push(JoinedRecord {
                period_begin: row.record.period_begin,
                period_end: row.record.period_end,
                region: row.record.region.clone(),
                parent_metro_region: row.record.parent_metro_region.clone(),
                state_code: row.record.state_code.clone(),
                property_type: row.record.property_type.clone(),
                metrics: row.record.metrics(),
                county_fips: shape.county_fips.clone(),
                geometry: Arc::clone(&shape.geometry),
            });
        }
    }

    report.orphaned_boundaries = boundaries
        .boundaries
        .iter()
        .filter(|b| !referenced.contains(b.county_fips.as_str()))
        .count();
    report.joined_rows = joined.len();
    (joined, report)
}

/// Full join pipeline: trailing window, reference join, boundary join.
pub fn join_all(
    market: &[MarketRecord],
    counties: &[CountyReference],
    boundaries: &BoundarySet,
) -> (Vec<JoinedRecord>, JoinReport) {
    let windowed = crate::market::trailing_window(market);
    let keyed = key_by_county(&windowed, counties);
    let unmatched_regions = keyed.iter().filter(|k| k.county_fips.is_none()).count();

    let (joined, mut report) = attach_boundaries(&keyed, boundaries);
    report.market_rows = market.len();
    report.windowed_rows = windowed.len();
    report.unmatched_regions = unmatched_regions;

    if report.without_geometry > 0 {
        warn!(
            dropped = report.without_geometry,
            unmatched_regions = report.unmatched_regions,
            "dropped market rows with no county boundary"
        );
    }
    info!(
        market_rows = report.market_rows,
        windowed_rows = report.windowed_rows,
        joined_rows = report.joined_rows,
        orphaned_boundaries = report.orphaned_boundaries,
        "joined market data with county boundaries"
    );

    (joined, report)
}
