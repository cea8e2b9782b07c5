//! CSV price provider for offline runs.
//!
//! Reads `<dir>/<SYMBOL>.csv` with a header row and columns
//! `date,close[,adj_close]`. Empty cells are missing prices. Rows outside
//! the requested window are dropped.

use super::provider::{pick_price, DataError, DataProvider, DataSource, FetchResult};
use crate::domain::DailyObservation;
use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: NaiveDate,
    close: Option<f64>,
    #[serde(default)]
    adj_close: Option<f64>,
}

/// Provider backed by a directory of per-symbol CSV files.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }

    fn read_file(path: &Path) -> Result<Vec<CsvRow>, DataError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(|e| DataError::Csv(format!("{}: {e}", path.display())))?;

        reader
            .deserialize()
            .collect::<Result<Vec<CsvRow>, _>>()
            .map_err(|e| DataError::Csv(format!("{}: {e}", path.display())))
    }
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv_import"
    }

    fn fetch(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<FetchResult, DataError> {
        let path = self.path_for(symbol);
        if !path.exists() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }

        let observations = Self::read_file(&path)?
            .into_iter()
            .filter(|row| row.date >= start && row.date <= end)
            .map(|row| DailyObservation {
                date: row.date,
                price: pick_price(row.close, row.adj_close),
            })
            .collect();

        Ok(FetchResult {
            symbol: symbol.to_string(),
            observations,
            source: DataSource::CsvImport,
        })
    }
}
