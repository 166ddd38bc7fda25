use crate::roi::Roi;

use std::fmt;

/// Read one named sub-dataset of a granule, clipped to `window` when given.
/// Implementations are passed the full composite GDAL identifier, e.g.
/// `HDF4_EOS:EOS_GRID:"/data/MCD43A1...hdf":MOD_Grid_BRDF:Snow_BRDF_Albedo`.
pub trait SubdatasetReader {
    fn read_subdataset(&self, name: &str, window: Option<&Roi>) -> Result<Data, ReadError>;
}

#[derive(Debug)]
pub enum ReadError {
    UnreadableSource(String),
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadError::UnreadableSource(msg) => write!(f, "unreadable source: {}", msg),
        }
    }
}

impl std::error::Error for ReadError {}

/// Decoded raster planes of one sub-dataset, band-major
/// (`bands * width * height` elements). Kernel-parameter sub-datasets carry
/// three planes (isotropic, volumetric, geometric); the quality and snow
/// layers carry one.
#[derive(Debug, Clone)]
pub struct Data {
    pub width: usize,
    pub height: usize,
    pub bands: usize,
    pub buffer: Vec<f32>,
}

impl Data {
    pub fn pixels(&self) -> usize {
        self.width * self.height
    }
}

impl fmt::Display for Data {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let min_value = self
            .buffer
            .iter()
            .filter(|&&x| !x.is_nan())
            .min_by(|a, b| a.partial_cmp(b).unwrap())
            .unwrap_or(&f32::NAN);

        let max_value = self
            .buffer
            .iter()
            .filter(|&&x| !x.is_nan())
            .max_by(|a, b| a.partial_cmp(b).unwrap())
            .unwrap_or(&f32::NAN);

        write!(
            f,
            "Width: {}, Height: {}, Bands: {}, Min value: {}, Max value: {}",
            self.width, self.height, self.bands, min_value, max_value,
        )
    }
}
