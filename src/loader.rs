// 📂 Data Loader
// Reads the static inputs and memoizes them per path.
//
// The inputs are refreshed by hand between deployments, so a loaded file is
// never re-read for the lifetime of the process.

use crate::boundaries::{read_boundaries, BoundarySet};
use crate::counties::{read_county_tsv, CountyReference};
use crate::error::LoadError;
use crate::market::{read_market_tsv, MarketRecord};
use flate2::read::MultiGzDecoder;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

// ============================================================================
// FILE HELPERS
// ============================================================================

pub(crate) fn open_plain(path: &Path) -> Result<BufReader<File>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(BufReader::new(file))
}

/// Reads every member of a (possibly concatenated) gzip stream.
pub(crate) fn open_gzip(path: &Path) -> Result<MultiGzDecoder<BufReader<File>>, LoadError> {
    Ok(MultiGzDecoder::new(open_plain(path)?))
}

/// Tab-separated reader with `"` quoting and a header row.
pub(crate) fn tsv_reader<R: Read>(source: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quote(b'"')
        .has_headers(true)
        .from_reader(source)
}

/// Fail with `MissingColumn` unless every name in `required` is in the header.
pub(crate) fn require_columns<R: Read>(
    path: &Path,
    rdr: &mut csv::Reader<R>,
    required: &[&'static str],
    compressed: bool,
) -> Result<(), LoadError> {
    let headers = rdr
        .headers()
        .map_err(|e| LoadError::from_csv(path, e, compressed))?;

    for column in required {
        if !headers.iter().any(|h| h.trim() == *column) {
            return Err(LoadError::MissingColumn {
                path: path.to_path_buf(),
                column,
            });
        }
    }
    Ok(())
}

pub fn read_bytes(path: &Path) -> Result<Vec<u8>, LoadError> {
    let mut bytes = Vec::new();
    open_plain(path)?
        .read_to_end(&mut bytes)
        .map_err(|source| LoadError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(bytes)
}

// ============================================================================
// LOAD CACHE
// ============================================================================

/// Path-keyed memo of loaded files.
///
/// Populated on first access and never invalidated. Failed loads are not
/// stored, so a later call retries the read.
pub struct LoadCache<T> {
    entries: RwLock<HashMap<PathBuf, Arc<T>>>,
}

impl<T> LoadCache<T> {
    pub fn new() -> Self {
        LoadCache {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get_or_load<F>(&self, path: &Path, load: F) -> Result<Arc<T>, LoadError>
    where
        F: FnOnce(&Path) -> Result<T, LoadError>,
    {
        if let Some(hit) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
        {
            debug!(path = %path.display(), "load cache hit");
            return Ok(Arc::clone(hit));
        }

        let loaded = Arc::new(load(path)?);

        // Two callers may race on a cold path; the first insert wins.
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let entry = entries
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::clone(&loaded));
        Ok(Arc::clone(entry))
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for LoadCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// DATA LOADER
// ============================================================================

/// One cache per input kind.
#[derive(Default)]
pub struct DataLoader {
    market: LoadCache<Vec<MarketRecord>>,
    counties: LoadCache<Vec<CountyReference>>,
    boundaries: LoadCache<BoundarySet>,
    files: LoadCache<Vec<u8>>,
}

impl DataLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn market(&self, path: &Path) -> Result<Arc<Vec<MarketRecord>>, LoadError> {
        self.market.get_or_load(path, read_market_tsv)
    }

    pub fn counties(&self, path: &Path) -> Result<Arc<Vec<CountyReference>>, LoadError> {
        self.counties.get_or_load(path, read_county_tsv)
    }

    pub fn boundaries(&self, path: &Path) -> Result<Arc<BoundarySet>, LoadError> {
        self.boundaries.get_or_load(path, read_boundaries)
    }

    /// Raw bytes of the logo image
    pub fn logo(&self, path: &Path) -> Result<Arc<Vec<u8>>, LoadError> {
        self.files.get_or_load(path, read_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io::Write;

    #[test]
    fn test_cache_loads_once_per_path() {
        let cache: LoadCache<String> = LoadCache::new();
        let calls = Cell::new(0);
        let load = |p: &Path| {
            calls.set(calls.get() + 1);
            Ok(p.display().to_string())
        };

        let first = cache.get_or_load(Path::new("a.tsv"), load).unwrap();
        let second = cache.get_or_load(Path::new("a.tsv"), load).unwrap();
        let other = cache.get_or_load(Path::new("b.tsv"), load).unwrap();

        assert_eq!(calls.get(), 2);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*other, "b.tsv");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_cache_does_not_store_failures() {
        let cache: LoadCache<String> = LoadCache::new();

        let err = cache.get_or_load(Path::new("missing"), |p| read_bytes(p).map(|_| String::new()));
        assert!(err.is_err());
        assert!(cache.is_empty());

        let ok = cache.get_or_load(Path::new("missing"), |_| Ok("recovered".to_string()));
        assert_eq!(*ok.unwrap(), "recovered");
    }

    #[test]
    fn test_loader_returns_cached_result_after_file_changes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "first").unwrap();

        let loader = DataLoader::new();
        let before = loader.logo(file.path()).unwrap();

        file.as_file_mut().set_len(0).unwrap();
        let after = loader.logo(file.path()).unwrap();

        assert_eq!(before.as_slice(), b"first");
        assert!(Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn test_require_columns_reports_first_missing() {
        let data = "Name\tState\n";
        let mut rdr = tsv_reader(data.as_bytes());
        let err = require_columns(Path::new("fips.tsv"), &mut rdr, &["Name", "State", "FIPS"], false)
            .unwrap_err();

        assert!(matches!(err, LoadError::MissingColumn { column: "FIPS", .. }));
    }
}
