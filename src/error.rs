// ⚠️ Error Types
// Load failures are fatal for the whole dashboard, selection failures only
// reject one request.

use std::path::PathBuf;
use thiserror::Error;

/// Failure while reading one of the static input files.
#[derive(Debug, Error)]
pub enum LoadError {
    /// File missing or not readable
    #[error("cannot read {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Gzip stream is corrupt or truncated
    #[error("cannot decompress {path}: {source}")]
    Decompress {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Header row lacks a column we depend on
    #[error("{path} is missing required column `{column}`")]
    MissingColumn { path: PathBuf, column: &'static str },

    /// A row could not be parsed into a typed record
    #[error("malformed table {path}: {source}")]
    MalformedTable {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed GeoJSON {path}: {source}")]
    MalformedGeoJson {
        path: PathBuf,
        #[source]
        source: Box<geojson::Error>,
    },

    #[error("{path} is not a GeoJSON FeatureCollection")]
    NotFeatureCollection { path: PathBuf },
}

impl LoadError {
    /// Classify a csv error raised while streaming `path`.
    ///
    /// I/O failures under a csv reader come from the underlying stream, which
    /// for `.gz` inputs means the decoder rejected the bytes.
    pub fn from_csv(path: &std::path::Path, err: csv::Error, compressed: bool) -> Self {
        if compressed {
            if let csv::ErrorKind::Io(io) = err.kind() {
                return LoadError::Decompress {
                    path: path.to_path_buf(),
                    source: std::io::Error::new(io.kind(), io.to_string()),
                };
            }
        }
        LoadError::MalformedTable {
            path: path.to_path_buf(),
            source: err,
        }
    }
}

/// A filter selection that cannot be applied.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("unknown metric `{0}`")]
    UnknownMetric(String),

    #[error("unknown property type `{0}`")]
    UnknownPropertyType(String),

    #[error("snapshot month `{0}` is not a YYYY-MM-DD month in the data")]
    InvalidPeriod(String),

    #[error("minimum homes sold must be between {min} and {max}, got {value}")]
    ThresholdOutOfRange { value: u32, min: u32, max: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_error_messages() {
        let err = SelectionError::ThresholdOutOfRange {
            value: 900,
            min: 1,
            max: 500,
        };
        assert_eq!(
            err.to_string(),
            "minimum homes sold must be between 1 and 500, got 900"
        );

        let err = SelectionError::UnknownMetric("Price".to_string());
        assert_eq!(err.to_string(), "unknown metric `Price`");
    }

    #[test]
    fn test_missing_column_message_names_path() {
        let err = LoadError::MissingColumn {
            path: PathBuf::from("data/market.tsv.gz"),
            column: "homes_sold",
        };
        let msg = err.to_string();
        assert!(msg.contains("data/market.tsv.gz"));
        assert!(msg.contains("homes_sold"));
    }
}
