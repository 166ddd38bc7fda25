use crate::config::SessionConfig;
use crate::descriptors::{self, Band, Descriptors};
use crate::error::Error;
use crate::granules::{self, Product};
use crate::readers::{GdalReader, SubdatasetReader};
use crate::roi::Roi;
use crate::timespec::TimeSpec;

use chrono::NaiveDate;
use log::debug;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Indexes the MCD43A1/A2 granule pairs of one tile over a time range and
/// serves per-date, per-band descriptor queries. Both indexes are built once
/// at construction and are read-only afterwards.
pub struct BrdfSession {
    tile: String,
    start: NaiveDate,
    end: Option<NaiveDate>,
    a1_granules: HashMap<NaiveDate, PathBuf>,
    a2_granules: HashMap<NaiveDate, PathBuf>,
    band_transfer: Option<HashMap<u8, Band>>,
    roi: Option<Roi>,
    reader: Box<dyn SubdatasetReader>,
}

impl BrdfSession {
    /// Builds a session reading granules through GDAL. `mcd43a2_dir`
    /// defaults to `mcd43a1_dir`; a missing `end` leaves the range
    /// open-ended towards the latest granule found.
    pub fn new(
        tile: &str,
        mcd43a1_dir: impl AsRef<Path>,
        start: impl Into<TimeSpec>,
        end: Option<TimeSpec>,
        mcd43a2_dir: Option<&Path>,
        roi: Option<Roi>,
    ) -> Result<Self, Error> {
        Self::with_reader(
            tile,
            mcd43a1_dir,
            start,
            end,
            mcd43a2_dir,
            roi,
            Box::new(GdalReader),
        )
    }

    /// Like [`BrdfSession::new`] with an injected sub-dataset reader.
    pub fn with_reader(
        tile: &str,
        mcd43a1_dir: impl AsRef<Path>,
        start: impl Into<TimeSpec>,
        end: Option<TimeSpec>,
        mcd43a2_dir: Option<&Path>,
        roi: Option<Roi>,
        reader: Box<dyn SubdatasetReader>,
    ) -> Result<Self, Error> {
        let a1_dir = mcd43a1_dir.as_ref();
        if !a1_dir.exists() {
            return Err(Error::DirectoryNotFound(a1_dir.to_path_buf()));
        }

        let a2_dir = match mcd43a2_dir {
            Some(dir) if !dir.exists() => {
                return Err(Error::DirectoryNotFound(dir.to_path_buf()));
            }
            Some(dir) => dir,
            None => a1_dir,
        };

        let start = start.into().resolve()?;
        let end = end.map(|t| t.resolve()).transpose()?;

        let a1_granules = granules::find_granules(a1_dir, tile, Product::A1, start, end)?;
        let a2_granules = granules::find_granules(a2_dir, tile, Product::A2, start, end)?;

        // Every A1 date needs an A2 twin and vice versa
        let mut unpaired: Vec<NaiveDate> = a1_granules
            .keys()
            .filter(|date| !a2_granules.contains_key(date))
            .chain(
                a2_granules
                    .keys()
                    .filter(|date| !a1_granules.contains_key(date)),
            )
            .copied()
            .collect();

        if !unpaired.is_empty() {
            unpaired.sort();
            return Err(Error::DateMismatch(unpaired));
        }

        debug!(
            "session over tile {}: {} granule pairs",
            tile,
            a1_granules.len()
        );

        Ok(BrdfSession {
            tile: tile.to_string(),
            start,
            end,
            a1_granules,
            a2_granules,
            band_transfer: None,
            roi,
            reader,
        })
    }

    pub fn from_config(config: &SessionConfig) -> Result<Self, Error> {
        Self::new(
            &config.tile,
            &config.mcd43a1_dir,
            config.start_date,
            config.end_date.map(TimeSpec::from),
            config.mcd43a2_dir.as_deref(),
            config.roi,
        )
    }

    /// Remaps numbered band requests onto other (possibly named) bands
    /// before sub-dataset names are built.
    pub fn set_band_transfer(&mut self, transfer: HashMap<u8, Band>) {
        self.band_transfer = Some(transfer);
    }

    pub fn tile(&self) -> &str {
        &self.tile
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> Option<NaiveDate> {
        self.end
    }

    pub fn roi(&self) -> Option<&Roi> {
        self.roi.as_ref()
    }

    /// Indexed acquisition dates, sorted ascending.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.a1_granules.keys().copied().collect();
        dates.sort();
        dates
    }

    /// Extracts the descriptors for one band and date. A date with no
    /// indexed granule is a routine missing acquisition and yields
    /// `Ok(None)`, not an error.
    pub fn get_descriptors(
        &self,
        band: impl Into<Band>,
        date: impl Into<TimeSpec>,
    ) -> Result<Option<Descriptors>, Error> {
        let date = date.into().resolve()?;

        let Some(a1_granule) = self.a1_granules.get(&date) else {
            return Ok(None);
        };

        // The construction-time invariant guarantees the A2 twin
        let a2_granule = &self.a2_granules[&date];

        let result = descriptors::extract_descriptors(
            self.reader.as_ref(),
            &band.into(),
            a1_granule,
            a2_granule,
            self.band_transfer.as_ref(),
            self.roi.as_ref(),
        )?;

        Ok(Some(result))
    }
}
