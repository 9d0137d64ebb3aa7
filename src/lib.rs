// County Market Map - Core Library
// Exposes all modules for use in CLI, web server, and tests

pub mod error;
pub mod config;
pub mod metrics;     // Metric catalogue + display labels
pub mod loader;      // File readers + load-once cache
pub mod market;      // Market tracker table
pub mod counties;    // County name → FIPS reference
pub mod boundaries;  // County polygons
pub mod join;        // Market ⋈ counties ⋈ boundaries
pub mod filter;      // Sidebar selection
pub mod scale;       // Quantile breaks + YlGn colors
pub mod choropleth;  // Fills, tooltips, GeoJSON export
pub mod dashboard;

#[cfg(feature = "server")]
pub mod page;
#[cfg(feature = "server")]
pub mod server;

// Re-export commonly used types
pub use error::{LoadError, SelectionError};
pub use config::DashboardConfig;
pub use metrics::{Metric, MetricValues};
pub use loader::{DataLoader, LoadCache};
pub use market::{read_market_tsv, trailing_window, MarketRecord};
pub use counties::{normalize_fips, read_county_tsv, region_key, CountyReference};
pub use boundaries::{read_boundaries, BoundarySet, CountyBoundary};
pub use join::{join_all, JoinReport, JoinedRecord};
pub use filter::{apply_filters, FilterForm, FilterOptions, FilterSelection, StateFilter};
pub use scale::{localize_number, quantile_breaks, ColorScale};
pub use choropleth::{to_feature_collection, ChoroplethLayer, MapSettings, TooltipEntry};
pub use dashboard::{Dashboard, DashboardView};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
