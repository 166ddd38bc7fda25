use crate::error::Error;
use crate::roi::Roi;
use crate::timespec;

use chrono::NaiveDate;
use serde::Deserialize;
use serde::Deserializer;
use serde::de::Error as _;

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Construction-time configuration for a [`crate::BrdfSession`], usually
/// loaded from a JSON file.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub tile: String,
    pub mcd43a1_dir: PathBuf,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub mcd43a2_dir: Option<PathBuf>,
    pub roi: Option<Roi>,
}

// Deserializes through a helper so the dates and the ROI rectangle are
// validated up front, before any directory is scanned.
impl<'de> Deserialize<'de> for SessionConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ConfigHelper {
            tile: String,
            mcd43a1_dir: PathBuf,
            start_date: String,
            end_date: Option<String>,
            mcd43a2_dir: Option<PathBuf>,
            roi: Option<[isize; 4]>,
        }

        let helper = ConfigHelper::deserialize(deserializer)?;

        let start_date = timespec::parse_date_token(&helper.start_date)
            .ok_or_else(|| D::Error::custom(format!("Invalid start_date: {}", helper.start_date)))?;

        let end_date = helper
            .end_date
            .as_deref()
            .map(|text| {
                timespec::parse_date_token(text)
                    .ok_or_else(|| D::Error::custom(format!("Invalid end_date: {}", text)))
            })
            .transpose()?;

        if let Some(end_date) = end_date
            && end_date < start_date
        {
            return Err(D::Error::custom("end_date cannot be earlier than start_date"));
        }

        let roi = helper
            .roi
            .map(Roi::try_from)
            .transpose()
            .map_err(D::Error::custom)?;

        Ok(SessionConfig {
            tile: helper.tile,
            mcd43a1_dir: helper.mcd43a1_dir,
            start_date,
            end_date,
            mcd43a2_dir: helper.mcd43a2_dir,
            roi,
        })
    }
}

impl SessionConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<SessionConfig, Error> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let config: SessionConfig = serde_json::from_reader(reader).map_err(Error::from)?;

        Ok(config)
    }
}
