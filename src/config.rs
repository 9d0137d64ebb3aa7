// ⚙️ Configuration
// Where the static inputs live and where the server listens.
//
// Precedence: defaults < JSON file named by MARKET_MAP_CONFIG < env overrides.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const ENV_CONFIG_FILE: &str = "MARKET_MAP_CONFIG";
pub const ENV_DATA_DIR: &str = "MARKET_MAP_DATA_DIR";
pub const ENV_BIND: &str = "MARKET_MAP_BIND";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Directory the four file names below are resolved against
    pub data_dir: PathBuf,

    /// Gzip-compressed, tab-separated market tracker export
    pub market_file: String,

    /// Tab-separated `Name, State, FIPS` reference table
    pub county_file: String,

    /// County boundaries keyed by `coty_code`
    pub boundary_file: String,

    pub logo_file: String,

    pub bind_addr: String,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        DashboardConfig {
            data_dir: PathBuf::from("data"),
            market_file: "county_market_tracker.tsv000.gz".to_string(),
            county_file: "county_fips.csv".to_string(),
            boundary_file: "georef-united-states-of-america-county.geojson".to_string(),
            logo_file: "logo.png".to_string(),
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl DashboardConfig {
    /// Build the effective configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        let mut config = match std::env::var_os(ENV_CONFIG_FILE) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        config.apply_overrides(
            std::env::var(ENV_DATA_DIR).ok(),
            std::env::var(ENV_BIND).ok(),
        );
        Ok(config)
    }

    /// Read a JSON config file; omitted keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    pub fn apply_overrides(&mut self, data_dir: Option<String>, bind_addr: Option<String>) {
        if let Some(dir) = data_dir.filter(|d| !d.trim().is_empty()) {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(addr) = bind_addr.filter(|a| !a.trim().is_empty()) {
            self.bind_addr = addr;
        }
    }

    pub fn market_path(&self) -> PathBuf {
        self.data_dir.join(&self.market_file)
    }

    pub fn county_path(&self) -> PathBuf {
        self.data_dir.join(&self.county_file)
    }

    pub fn boundary_path(&self) -> PathBuf {
        self.data_dir.join(&self.boundary_file)
    }

    pub fn logo_path(&self) -> PathBuf {
        self.data_dir.join(&self.logo_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_paths_use_original_file_names() {
        let config = DashboardConfig::default();
        assert_eq!(
            config.market_path(),
            PathBuf::from("data/county_market_tracker.tsv000.gz")
        );
        assert_eq!(config.county_path(), PathBuf::from("data/county_fips.csv"));
        assert_eq!(
            config.boundary_path(),
            PathBuf::from("data/georef-united-states-of-america-county.geojson")
        );
        assert_eq!(config.logo_path(), PathBuf::from("data/logo.png"));
    }

    #[test]
    fn test_partial_config_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"data_dir": "/srv/redfin", "bind_addr": "127.0.0.1:8080"}}"#).unwrap();

        let config = DashboardConfig::from_file(file.path()).unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/srv/redfin"));
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.county_file, "county_fips.csv");
    }

    #[test]
    fn test_overrides_ignore_blank_values() {
        let mut config = DashboardConfig::default();
        config.apply_overrides(Some("  ".to_string()), Some("127.0.0.1:9000".to_string()));

        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.bind_addr, "127.0.0.1:9000");
    }

    #[test]
    fn test_invalid_config_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        assert!(DashboardConfig::from_file(file.path()).is_err());
    }
}
