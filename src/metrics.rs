// 📊 Housing Metrics
// The eight numeric columns of the market tracker and their display labels.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    MedianSalePrice,
    MedianSalePriceYoy,
    HomesSold,
    HomesSoldYoy,
    NewListings,
    NewListingsYoy,
    MedianDaysOnMarket,
    AvgSaleToList,
}

impl Metric {
    /// Selector order shown to users
    pub const ALL: [Metric; 8] = [
        Metric::MedianSalePrice,
        Metric::MedianSalePriceYoy,
        Metric::HomesSold,
        Metric::HomesSoldYoy,
        Metric::NewListings,
        Metric::NewListingsYoy,
        Metric::MedianDaysOnMarket,
        Metric::AvgSaleToList,
    ];

    /// Column name in the market tracker export
    pub fn source_column(&self) -> &'static str {
        match self {
            Metric::MedianSalePrice => "median_sale_price",
            Metric::MedianSalePriceYoy => "median_sale_price_yoy",
            Metric::HomesSold => "homes_sold",
            Metric::HomesSoldYoy => "homes_sold_yoy",
            Metric::NewListings => "new_listings",
            Metric::NewListingsYoy => "new_listings_yoy",
            Metric::MedianDaysOnMarket => "median_dom",
            Metric::AvgSaleToList => "avg_sale_to_list",
        }
    }

    /// Human-readable label used everywhere the metric is displayed
    pub fn label(&self) -> &'static str {
        match self {
            Metric::MedianSalePrice => "Median Sales Price",
            Metric::MedianSalePriceYoy => "Median Sales Price (YoY)",
            Metric::HomesSold => "Homes Sold",
            Metric::HomesSoldYoy => "Homes Sold (YoY)",
            Metric::NewListings => "New Listings",
            Metric::NewListingsYoy => "New Listings (YoY)",
            Metric::MedianDaysOnMarket => "Median Days-on-Market",
            Metric::AvgSaleToList => "Avg Sales-to-Listing Price Ratio",
        }
    }

    pub fn from_label(label: &str) -> Option<Metric> {
        Metric::ALL.into_iter().find(|m| m.label() == label)
    }

    pub fn from_source_column(column: &str) -> Option<Metric> {
        Metric::ALL.into_iter().find(|m| m.source_column() == column)
    }

    /// Cycle through the selector order (used by the terminal view)
    pub fn next(&self) -> Metric {
        let idx = Metric::ALL.iter().position(|m| m == self).unwrap_or(0);
        Metric::ALL[(idx + 1) % Metric::ALL.len()]
    }
}

impl Default for Metric {
    fn default() -> Self {
        Metric::MedianSalePrice
    }
}

impl std::fmt::Display for Metric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Display name for any joined-table column.
///
/// Only the eight metric columns are renamed; everything else passes through.
pub fn display_column(column: &str) -> &str {
    match Metric::from_source_column(column) {
        Some(metric) => metric.label(),
        None => column,
    }
}

/// One value per metric, `None` where the export had no number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricValues {
    #[serde(rename = "Median Sales Price")]
    pub median_sale_price: Option<f64>,
    #[serde(rename = "Median Sales Price (YoY)")]
    pub median_sale_price_yoy: Option<f64>,
    #[serde(rename = "Homes Sold")]
    pub homes_sold: Option<f64>,
    #[serde(rename = "Homes Sold (YoY)")]
    pub homes_sold_yoy: Option<f64>,
    #[serde(rename = "New Listings")]
    pub new_listings: Option<f64>,
    #[serde(rename = "New Listings (YoY)")]
    pub new_listings_yoy: Option<f64>,
    #[serde(rename = "Median Days-on-Market")]
    pub median_dom: Option<f64>,
    #[serde(rename = "Avg Sales-to-Listing Price Ratio")]
    pub avg_sale_to_list: Option<f64>,
}

impl MetricValues {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        let value = match metric {
            Metric::MedianSalePrice => self.median_sale_price,
            Metric::MedianSalePriceYoy => self.median_sale_price_yoy,
            Metric::HomesSold => self.homes_sold,
            Metric::HomesSoldYoy => self.homes_sold_yoy,
            Metric::NewListings => self.new_listings,
            Metric::NewListingsYoy => self.new_listings_yoy,
            Metric::MedianDaysOnMarket => self.median_dom,
            Metric::AvgSaleToList => self.avg_sale_to_list,
        };
        value.filter(|v| !v.is_nan())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rename_table_is_exact() {
        let expected = [
            ("median_sale_price", "Median Sales Price"),
            ("median_sale_price_yoy", "Median Sales Price (YoY)"),
            ("homes_sold", "Homes Sold"),
            ("homes_sold_yoy", "Homes Sold (YoY)"),
            ("new_listings", "New Listings"),
            ("new_listings_yoy", "New Listings (YoY)"),
            ("median_dom", "Median Days-on-Market"),
            ("avg_sale_to_list", "Avg Sales-to-Listing Price Ratio"),
        ];

        for (source, label) in expected {
            assert_eq!(display_column(source), label);
        }
        assert_eq!(Metric::ALL.len(), expected.len());
    }

    #[test]
    fn test_other_columns_are_not_renamed() {
        for column in [
            "period_begin",
            "period_end",
            "region",
            "parent_metro_region",
            "state_code",
            "property_type",
            "county_fips",
            "inventory",
        ] {
            assert_eq!(display_column(column), column);
        }
    }

    #[test]
    fn test_label_round_trip() {
        for metric in Metric::ALL {
            assert_eq!(Metric::from_label(metric.label()), Some(metric));
            assert_eq!(Metric::from_source_column(metric.source_column()), Some(metric));
        }
        assert_eq!(Metric::from_label("median_sale_price"), None);
    }

    #[test]
    fn test_serialized_values_use_display_labels() {
        let values = MetricValues {
            homes_sold: Some(50.0),
            ..Default::default()
        };
        let json = serde_json::to_value(values).unwrap();

        assert_eq!(json["Homes Sold"], serde_json::json!(50.0));
        assert!(json.get("homes_sold").is_none());
        assert_eq!(json.as_object().unwrap().len(), 8);
    }

    #[test]
    fn test_nan_reads_as_missing() {
        let values = MetricValues {
            median_dom: Some(f64::NAN),
            ..Default::default()
        };
        assert_eq!(values.get(Metric::MedianDaysOnMarket), None);
    }

    #[test]
    fn test_next_cycles() {
        assert_eq!(Metric::AvgSaleToList.next(), Metric::MedianSalePrice);
        assert_eq!(Metric::MedianSalePrice.next(), Metric::MedianSalePriceYoy);
    }
}
