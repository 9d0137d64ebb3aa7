// 🧭 County Boundaries
// Polygon features keyed by `coty_code`, loaded once and shared by reference.

use crate::counties::normalize_fips;
use crate::error::LoadError;
use crate::loader::open_plain;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Feature property holding the 5-character county code
pub const COUNTY_CODE_PROPERTY: &str = "coty_code";

#[derive(Debug, Clone)]
pub struct CountyBoundary {
    pub county_fips: String,
    pub geometry: Arc<Geometry>,
}

#[derive(Debug, Clone, Default)]
pub struct BoundarySet {
    pub boundaries: Vec<CountyBoundary>,

    /// Features that had a county code but no geometry
    pub without_geometry: usize,

    /// Features with no usable county code
    pub without_code: usize,
}

impl BoundarySet {
    pub fn from_features(features: Vec<Feature>) -> Self {
        let mut set = BoundarySet::default();

        for feature in features {
            let code = match feature.property(COUNTY_CODE_PROPERTY).and_then(county_code) {
                Some(code) => code,
                None => {
                    set.without_code += 1;
                    continue;
                }
            };
            match feature.geometry {
                Some(geometry) => set.boundaries.push(CountyBoundary {
                    county_fips: code,
                    geometry: Arc::new(geometry),
                }),
                None => set.without_geometry += 1,
            }
        }

        set
    }

    pub fn len(&self) -> usize {
        self.boundaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boundaries.is_empty()
    }

    /// County code → every boundary carrying it
    pub fn index(&self) -> HashMap<&str, Vec<&CountyBoundary>> {
        let mut index: HashMap<&str, Vec<&CountyBoundary>> = HashMap::new();
        for boundary in &self.boundaries {
            index
                .entry(boundary.county_fips.as_str())
                .or_default()
                .push(boundary);
        }
        index
    }

    /// Base layer for the map: geometry plus the county code only
    pub fn to_feature_collection(&self) -> FeatureCollection {
        let features = self
            .boundaries
            .iter()
            .map(|b| {
                let mut feature = Feature {
                    bbox: None,
                    geometry: Some(b.geometry.as_ref().clone()),
                    id: None,
                    properties: None,
                    foreign_members: None,
                };
                feature.set_property(COUNTY_CODE_PROPERTY, b.county_fips.clone());
                feature
            })
            .collect();

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }
}

/// Accepts `"01001"`, `1001`, or a single-element array of either.
fn county_code(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        JsonValue::Number(n) => normalize_fips(&n.to_string()),
        JsonValue::Array(items) if items.len() == 1 => county_code(&items[0]),
        _ => None,
    }
}

pub fn read_boundaries(path: &Path) -> Result<BoundarySet, LoadError> {
    let mut raw = String::new();
    open_plain(path)?
        .read_to_string(&mut raw)
        .map_err(|source| LoadError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

    let geojson: GeoJson = raw.parse().map_err(|e| LoadError::MalformedGeoJson {
        path: path.to_path_buf(),
        source: Box::new(e),
    })?;
    let collection = FeatureCollection::try_from(geojson).map_err(|_| {
        LoadError::NotFeatureCollection {
            path: path.to_path_buf(),
        }
    })?;

    let set = BoundarySet::from_features(collection.features);
    if set.without_code > 0 || set.without_geometry > 0 {
        warn!(
            path = %path.display(),
            without_code = set.without_code,
            without_geometry = set.without_geometry,
            "skipped unusable boundary features"
        );
    }
    info!(path = %path.display(), counties = set.len(), "loaded county boundaries");
    Ok(set)
}
