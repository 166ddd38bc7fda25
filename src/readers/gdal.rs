use super::{Data, ReadError, SubdatasetReader};
use crate::roi::Roi;

use gdal::Dataset;

/// Reads HDF4-EOS sub-datasets through GDAL. All raster planes of the
/// sub-dataset are decoded to `f32` in one call.
pub struct GdalReader;

impl SubdatasetReader for GdalReader {
    fn read_subdataset(&self, name: &str, window: Option<&Roi>) -> Result<Data, ReadError> {
        let dataset = Dataset::open(name)
            .map_err(|e| ReadError::UnreadableSource(format!("{}: {}", name, e)))?;

        let (full_width, full_height) = dataset.raster_size();
        let (offset, (width, height)) = match window {
            Some(roi) => (roi.offset(), roi.size()),
            None => ((0, 0), (full_width, full_height)),
        };

        let bands = dataset.raster_count();
        let mut buffer = Vec::with_capacity(bands * width * height);

        for index in 1..=bands {
            let band = dataset
                .rasterband(index)
                .map_err(|e| ReadError::UnreadableSource(format!("{}: {}", name, e)))?;

            let plane = band
                .read_as::<f32>(offset, (width, height), (width, height), None)
                .map_err(|e| ReadError::UnreadableSource(format!("{}: {}", name, e)))?;

            buffer.extend_from_slice(plane.data());
        }

        Ok(Data {
            width,
            height,
            bands,
            buffer,
        })
    }
}
