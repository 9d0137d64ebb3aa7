// 🗺️ County Reference
// Name/State/FIPS rows used to turn a market `region` into a county code.

use crate::error::LoadError;
use crate::loader::{open_plain, require_columns, tsv_reader};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

pub const REQUIRED_COLUMNS: [&str; 3] = ["Name", "State", "FIPS"];

/// Separator between county name and state in the market `region` column
pub const REGION_SEPARATOR: &str = " County, ";

/// Width of a county FIPS key
pub const FIPS_WIDTH: usize = 5;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CountyReference {
    #[serde(rename = "Name")]
    pub name: String,

    #[serde(rename = "State")]
    pub state: String,

    /// Raw FIPS as written in the file ("1001", "1001.0", "01001", or blank)
    #[serde(rename = "FIPS")]
    pub fips: Option<String>,
}

impl CountyReference {
    /// Join key against `MarketRecord::region`
    pub fn region(&self) -> String {
        region_key(&self.name, &self.state)
    }

    /// Normalized 5-character county code, if the row has one
    pub fn county_fips(&self) -> Option<String> {
        self.fips.as_deref().and_then(normalize_fips)
    }
}

/// `"Wake"`, `"NC"` → `"Wake County, NC"`
pub fn region_key(name: &str, state: &str) -> String {
    format!("{}{}{}", name, REGION_SEPARATOR, state)
}

/// Normalize a FIPS value to a zero-padded 5-character key.
///
/// Strips the `.0` left behind when the code went through a float column.
/// Blank input has no key. Applying it to its own output is a no-op.
pub fn normalize_fips(raw: &str) -> Option<String> {
    let mut code = raw.trim();
    while let Some(stripped) = code.strip_suffix(".0") {
        code = stripped;
    }
    if code.is_empty() {
        return None;
    }
    Some(format!("{:0>width$}", code, width = FIPS_WIDTH))
}

pub fn read_county_tsv(path: &Path) -> Result<Vec<CountyReference>, LoadError> {
    let mut rdr = tsv_reader(open_plain(path)?);
    require_columns(path, &mut rdr, &REQUIRED_COLUMNS, false)?;

    let mut counties = Vec::new();
    for result in rdr.deserialize() {
        let county: CountyReference = result.map_err(|e| LoadError::from_csv(path, e, false))?;
        counties.push(county);
    }

    info!(path = %path.display(), rows = counties.len(), "loaded county reference");
    Ok(counties)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn county(name: &str, state: &str, fips: Option<&str>) -> CountyReference {
        CountyReference {
            name: name.to_string(),
            state: state.to_string(),
            fips: fips.map(|f| f.to_string()),
        }
    }

    #[test]
    fn test_region_key() {
        assert_eq!(region_key("Wake", "NC"), "Wake County, NC");
        assert_eq!(county("Los Angeles", "CA", None).region(), "Los Angeles County, CA");
    }

    #[test]
    fn test_normalize_fips_variants() {
        assert_eq!(normalize_fips("1001"), Some("01001".to_string()));
        assert_eq!(normalize_fips("1001.0"), Some("01001".to_string()));
        assert_eq!(normalize_fips("01001"), Some("01001".to_string()));
        assert_eq!(normalize_fips("37183"), Some("37183".to_string()));
        assert_eq!(normalize_fips(" 37183.0 "), Some("37183".to_string()));
        assert_eq!(normalize_fips(""), None);
        assert_eq!(normalize_fips(".0"), None);
    }

    #[test]
    fn test_normalize_fips_is_idempotent() {
        for raw in ["1", "1001", "1001.0", "01001", "37183", "6037.0", "1.0.0"] {
            let once = normalize_fips(raw).unwrap();
            assert_eq!(normalize_fips(&once), Some(once.clone()));
            assert_eq!(once.len(), FIPS_WIDTH, "{} -> {}", raw, once);
            assert!(!once.ends_with(".0"));
        }
    }

    #[test]
    fn test_read_county_tsv() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Name\tState\tFIPS").unwrap();
        writeln!(file, "Wake\tNC\t37183").unwrap();
        writeln!(file, "Autauga\tAL\t1001.0").unwrap();
        writeln!(file, "Nowhere\tZZ\t").unwrap();

        let counties = read_county_tsv(file.path()).unwrap();

        assert_eq!(counties.len(), 3);
        assert_eq!(counties[0].region(), "Wake County, NC");
        assert_eq!(counties[0].county_fips(), Some("37183".to_string()));
        assert_eq!(counties[1].county_fips(), Some("01001".to_string()));
        assert_eq!(counties[2].county_fips(), None);
    }

    #[test]
    fn test_county_tsv_requires_fips_column() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Name\tState").unwrap();

        let err = read_county_tsv(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn { column: "FIPS", .. }));
    }
}
