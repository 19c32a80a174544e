//! # Asset Seed Catalog
//!
//! Lot numbers and asset names read once at startup from a flat seed file,
//! one `id;name` pair per line.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

const DELIMITER: char = ';';

/// Errors raised while loading the seed catalog. All are fatal at startup.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Cannot read asset seed file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed asset line {line}: {content:?}")]
    MalformedLine { line: usize, content: String },

    #[error("Duplicate lot number {lot} on line {line}")]
    DuplicateLot { line: usize, lot: String },
}

/// In-memory asset catalog, keeping seed file order.
#[derive(Debug, Clone, Default)]
pub struct AssetCatalog {
    names: HashMap<String, String>,
    lot_numbers: Vec<String>,
}

impl AssetCatalog {
    /// Read the catalog from a seed file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let io_error = |source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = std::fs::File::open(path).map_err(io_error)?;
        let catalog = Self::parse(std::io::BufReader::new(file)).map_err(|e| match e {
            ParseFailure::Io(source) => io_error(source),
            ParseFailure::Catalog(e) => e,
        })?;
        debug!(path = %path.display(), assets = catalog.len(), "Asset catalog loaded");
        Ok(catalog)
    }

    /// Parse `id;name` lines. Every line must carry the delimiter.
    pub fn parse(reader: impl BufRead) -> Result<Self, ParseFailure> {
        let mut catalog = Self::default();
        for (index, line) in reader.lines().enumerate() {
            let line = line.map_err(ParseFailure::Io)?;
            let number = index + 1;
            let (lot, name) = line.split_once(DELIMITER).ok_or_else(|| {
                CatalogError::MalformedLine {
                    line: number,
                    content: line.clone(),
                }
            })?;
            let lot = lot.trim();
            if lot.is_empty() {
                return Err(CatalogError::MalformedLine {
                    line: number,
                    content: line.clone(),
                }
                .into());
            }
            if catalog.names.contains_key(lot) {
                return Err(CatalogError::DuplicateLot {
                    line: number,
                    lot: lot.to_string(),
                }
                .into());
            }
            catalog.names.insert(lot.to_string(), name.trim().to_string());
            catalog.lot_numbers.push(lot.to_string());
        }
        Ok(catalog)
    }

    pub fn name(&self, lot: &str) -> Option<&str> {
        self.names.get(lot).map(String::as_str)
    }

    pub fn contains(&self, lot: &str) -> bool {
        self.names.contains_key(lot)
    }

    /// Lot numbers in seed file order.
    pub fn lot_numbers(&self) -> &[String] {
        &self.lot_numbers
    }

    pub fn len(&self) -> usize {
        self.lot_numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lot_numbers.is_empty()
    }
}

/// Parse failure: a reader error or a catalog content error.
#[derive(Debug, Error)]
pub enum ParseFailure {
    #[error("Read error: {0}")]
    Io(std::io::Error),

    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
