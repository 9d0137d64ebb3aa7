// 🗺️ Choropleth Layers
// Turns filtered rows into what the map draws: per-county fills, hover
// tooltips, and the fixed base-map settings.

use crate::join::JoinedRecord;
use crate::metrics::Metric;
use crate::scale::{localize_number, ColorScale, NO_DATA_FILL};
use geojson::{Feature, FeatureCollection};
use serde::Serialize;
use serde_json::{json, Map as JsonMap, Value as JsonValue};
use std::collections::BTreeMap;

// ============================================================================
// MAP SETTINGS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerStyle {
    pub color: &'static str,
    pub fill_color: &'static str,
    pub weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill_opacity: Option<f64>,
}

/// Everything about the map that does not depend on the selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapSettings {
    /// [lat, lon], roughly the continental-US centroid
    pub center: [f64; 2],
    pub zoom: u8,
    pub tile_url: &'static str,
    pub tile_attribution: &'static str,
    pub tile_layer_name: &'static str,
    pub choropleth_style: LayerStyle,
    pub no_data_fill: &'static str,
    pub tooltip_style: LayerStyle,
    pub highlight_style: LayerStyle,
    pub tooltip_css: &'static str,
    pub tooltip_max_width: u32,
}

impl Default for MapSettings {
    fn default() -> Self {
        MapSettings {
            center: [40.0, -96.0],
            zoom: 4,
            tile_url: "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png",
            tile_attribution: "&copy; OpenStreetMap contributors &copy; CARTO",
            tile_layer_name: "Light Map",
            choropleth_style: LayerStyle {
                color: "black",
                fill_color: NO_DATA_FILL,
                weight: 1.0,
                opacity: Some(0.2),
                fill_opacity: Some(0.7),
            },
            no_data_fill: NO_DATA_FILL,
            tooltip_style: LayerStyle {
                color: "black",
                fill_color: "transparent",
                weight: 0.5,
                opacity: None,
                fill_opacity: None,
            },
            highlight_style: LayerStyle {
                color: "black",
                fill_color: "grey",
                weight: 3.0,
                opacity: None,
                fill_opacity: None,
            },
            tooltip_css: "background-color: #F0EFEF; border: 2px solid black; border-radius: 3px; box-shadow: 3px;",
            tooltip_max_width: 800,
        }
    }
}

// ============================================================================
// CHOROPLETH
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChoroplethLayer {
    pub metric: Metric,
    pub metric_label: &'static str,
    /// `None` when the filtered set has no values for the metric
    pub scale: Option<ColorScale>,
    /// County code → fill; counties not listed use the no-data fill
    pub fills: BTreeMap<String, &'static str>,
}

impl ChoroplethLayer {
    pub fn build(rows: &[&JoinedRecord], metric: Metric) -> Self {
        let scale = ColorScale::from_values(rows.iter().filter_map(|r| r.metric(metric)));

        let mut fills = BTreeMap::new();
        if let Some(scale) = &scale {
            // later rows for the same county replace earlier ones
            for row in rows {
                fills.insert(row.county_fips.clone(), scale.color(row.metric(metric)));
            }
        }

        ChoroplethLayer {
            metric,
            metric_label: metric.label(),
            scale,
            fills,
        }
    }

    pub fn has_data(&self) -> bool {
        self.scale.is_some()
    }

    pub fn fill_for(&self, county_fips: &str) -> &'static str {
        self.fills.get(county_fips).copied().unwrap_or(NO_DATA_FILL)
    }
}

// ============================================================================
// TOOLTIPS
// ============================================================================

/// Tooltip lines in display order: (field, alias)
pub const TOOLTIP_FIELDS: [(&str, &str); 13] = [
    ("period_begin", "Period Begin:"),
    ("period_end", "Period End:"),
    ("region", "County:"),
    ("parent_metro_region", "Metro Area:"),
    ("state_code", "State:"),
    ("Median Sales Price", "Median Sales Price:"),
    ("Median Sales Price (YoY)", "Median Sales Price (YoY):"),
    ("Homes Sold", "Homes Sold:"),
    ("Homes Sold (YoY)", "Homes Sold (YoY):"),
    ("New Listings", "New Listings:"),
    ("New Listings (YoY)", "New Listings (YoY):"),
    ("Median Days-on-Market", "Median Days-on-Market:"),
    ("Avg Sales-to-Listing Price Ratio", "Avg Sales-to-Listing Price Ratio:"),
];

/// Placeholder for a missing metric value
pub const MISSING_VALUE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TooltipRow {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TooltipEntry {
    pub county_fips: String,
    pub rows: Vec<TooltipRow>,
}

fn field_value(record: &JoinedRecord, field: &str) -> String {
    match field {
        "period_begin" => record.period_begin.format("%Y-%m-%d").to_string(),
        "period_end" => record.period_end.format("%Y-%m-%d").to_string(),
        "region" => record.region.clone(),
        "parent_metro_region" => record.parent_metro_region.clone(),
        "state_code" => record.state_code.clone(),
        label => Metric::from_label(label)
            .and_then(|m| record.metric(m))
            .map(localize_number)
            .unwrap_or_else(|| MISSING_VALUE.to_string()),
    }
}

pub fn tooltip_rows(record: &JoinedRecord) -> Vec<TooltipRow> {
    TOOLTIP_FIELDS
        .iter()
        .map(|&(field, alias)| TooltipRow {
            label: alias,
            value: field_value(record, field),
        })
        .collect()
}

/// One hover target per filtered row.
pub fn tooltip_layer(rows: &[&JoinedRecord]) -> Vec<TooltipEntry> {
    rows.iter()
        .map(|r| TooltipEntry {
            county_fips: r.county_fips.clone(),
            rows: tooltip_rows(r),
        })
        .collect()
}

// ============================================================================
// EXPORT
// ============================================================================

/// Filtered rows as GeoJSON, each feature carrying its fill and tooltip.
pub fn to_feature_collection(rows: &[&JoinedRecord], layer: &ChoroplethLayer) -> FeatureCollection {
    let features = rows
        .iter()
        .map(|row| {
            let mut properties = JsonMap::new();
            properties.insert("county_fips".to_string(), json!(row.county_fips));
            properties.insert(
                "metric_value".to_string(),
                row.metric(layer.metric).map_or(JsonValue::Null, |v| json!(v)),
            );
            properties.insert("fill".to_string(), json!(layer.fill_for(&row.county_fips)));
            for tooltip in tooltip_rows(row) {
                properties.insert(
                    tooltip.label.trim_end_matches(':').to_string(),
                    json!(tooltip.value),
                );
            }

            Feature {
                bbox: None,
                geometry: Some(row.geometry.as_ref().clone()),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    let mut foreign = JsonMap::new();
    foreign.insert("metric".to_string(), json!(layer.metric_label));
    foreign.insert(
        "breaks".to_string(),
        layer.scale.as_ref().map_or(JsonValue::Null, |s| json!(s.breaks)),
    );

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(foreign),
    }
}
