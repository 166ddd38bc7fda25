use crate::error::Error;
use crate::timespec;

use chrono::{Datelike, NaiveDate};
use glob::Pattern;
use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// MCD43 product families carrying the BRDF kernel parameters (A1) and the
/// matching quality/ancillary layers (A2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Product {
    A1,
    A2,
}

impl Product {
    fn file_pattern(&self, year: i32, tile: &str) -> String {
        format!("MCD43{}.A{}*.{}.*.hdf", self, year, tile)
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Product::A1 => write!(f, "A1"),
            Product::A2 => write!(f, "A2"),
        }
    }
}

/// Parses the acquisition date embedded in an MCD43 granule filename,
/// i.e. the `A{YYYY}{DDD}` token in `MCD43A1.A2016001.h20v11.006.*.hdf`.
fn granule_date(file_name: &str) -> Option<NaiveDate> {
    let token = file_name.split('.').nth(1)?.strip_prefix('A')?;
    timespec::parse_date_token(token)
}

/// Builds the date -> granule path index for one product family by scanning
/// `dir` recursively for the start year and the end year (when different).
/// An empty index is a hard failure, never a silent empty mapping.
pub fn find_granules(
    dir: &Path,
    tile: &str,
    product: Product,
    start: NaiveDate,
    end: Option<NaiveDate>,
) -> Result<HashMap<NaiveDate, PathBuf>, Error> {
    let mut years = vec![start.year()];
    if let Some(end) = end
        && end.year() != start.year()
    {
        years.push(end.year());
    }

    let mut candidates: HashSet<PathBuf> = HashSet::new();

    for year in years {
        let pattern = Pattern::new(&product.file_pattern(year, tile))?;

        for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_file()
                && let Some(file_name) = entry.path().file_name()
                && pattern.matches(&file_name.to_string_lossy())
            {
                candidates.insert(entry.path().to_path_buf());
            }
        }
    }

    let mut granules = HashMap::new();

    for path in candidates {
        let Some(file_name) = path.file_name().map(|n| n.to_string_lossy().into_owned())
        else {
            continue;
        };

        let Some(date) = granule_date(&file_name) else {
            warn!("skipping {}: unparseable acquisition date", file_name);
            continue;
        };

        if date >= start && end.is_none_or(|end| date <= end) {
            granules.insert(date, path);
        }
    }

    if granules.is_empty() {
        return Err(Error::NoGranules {
            product,
            dir: dir.to_path_buf(),
        });
    }

    debug!(
        "indexed {} MCD43{} granules under {}",
        granules.len(),
        product,
        dir.display()
    );

    Ok(granules)
}
