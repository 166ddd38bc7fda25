//! Masking and scaling pipeline turning raw MCD43A1/A2 sub-datasets into
//! BRDF kernel weights with a per-pixel validity mask.

use crate::error::Error;
use crate::readers::{Data, SubdatasetReader};
use crate::roi::Roi;

use log::{debug, warn};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Fill value marking a missing kernel weight in the raw integer data.
pub const KERNEL_FILL: f32 = 32767.0;
/// Divisor taking raw integer kernel values to physical kernel weights.
pub const KERNEL_SCALE: f32 = 1000.0;
/// Raw snow flag value meaning the retrieval was snow free.
pub const SNOW_FREE: f32 = 0.0;
/// Raw quality values at or below this decode as "good or best".
pub const QA_GOOD_MAX: f32 = 1.0;
/// Land/water type codes counted as land.
pub const LAND_CODES: [f32; 4] = [1.0, 3.0, 4.0, 5.0];

/// A band is addressed either by MODIS band number or, for products whose
/// layers are named rather than numbered, by name. The variant picks the
/// sub-dataset name template.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Band {
    Numbered(u8),
    Named(String),
}

impl Band {
    fn kernel_subdataset(&self) -> String {
        match self {
            Band::Numbered(n) => format!("BRDF_Albedo_Parameters_Band{}", n),
            Band::Named(name) => format!("BRDF_Albedo_Parameters_{}", name),
        }
    }

    /// Numbered bands have a per-band quality layer; named bands fall back
    /// to the mandatory-quality layer, which lives in the A1 product.
    fn quality_subdataset(&self) -> String {
        match self {
            Band::Numbered(n) => format!("BRDF_Albedo_Band_Quality_Band{}", n),
            Band::Named(name) => format!("BRDF_Albedo_Band_Mandatory_Quality_{}", name),
        }
    }
}

impl From<u8> for Band {
    fn from(band_no: u8) -> Band {
        Band::Numbered(band_no)
    }
}

impl From<&str> for Band {
    fn from(name: &str) -> Band {
        Band::Named(name.to_string())
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Band::Numbered(n) => write!(f, "Band{}", n),
            Band::Named(name) => write!(f, "{}", name),
        }
    }
}

/// Kernel weights, validity mask and quality values for one date/band.
#[derive(Debug, Clone)]
pub struct Descriptors {
    /// Scaled kernel weights; the fill value decodes to NaN.
    pub kernels: Data,
    /// Per-pixel validity: snow free AND good-or-best quality.
    pub mask: Vec<bool>,
    /// Raw (unscaled) quality values, NaN outside the mask.
    pub qa_value: Vec<f32>,
    /// Land restriction (codes 1, 3, 4, 5), computed but not folded into
    /// the mask. Combining it with `mask` changes numerical results.
    pub land: Vec<bool>,
}

fn subdataset_name(granule: &Path, subdataset: &str) -> String {
    format!(
        "HDF4_EOS:EOS_GRID:\"{}\":MOD_Grid_BRDF:{}",
        granule.display(),
        subdataset
    )
}

pub fn scale_kernels(raw: &[f32]) -> Vec<f32> {
    raw.iter()
        .map(|&v| if v == KERNEL_FILL { f32::NAN } else { v / KERNEL_SCALE })
        .collect()
}

/// True where the albedo retrieval was snow free.
pub fn decode_snow(raw: &[f32]) -> Vec<bool> {
    raw.iter().map(|&v| v == SNOW_FREE).collect()
}

/// True where the quality flag is good or best.
pub fn decode_quality(raw: &[f32]) -> Vec<bool> {
    raw.iter().map(|&v| v <= QA_GOOD_MAX).collect()
}

/// True where the land/water type is one of the land codes.
pub fn decode_land(raw: &[f32]) -> Vec<bool> {
    raw.iter().map(|v| LAND_CODES.contains(v)).collect()
}

/// The flag sub-datasets must be single-plane and congruent with the kernel
/// window; anything else would silently truncate the mask composition.
fn require_plane(subdataset: &str, data: &Data, pixels: usize) -> Result<(), Error> {
    if data.bands != 1 || data.pixels() != pixels {
        return Err(Error::DimensionMismatch(format!(
            "{}: expected 1 plane of {} pixels, got {} plane(s) of {}",
            subdataset,
            pixels,
            data.bands,
            data.pixels()
        )));
    }

    Ok(())
}

/// Reads the four sub-datasets of a matched A1/A2 granule pair and combines
/// them into scaled kernels, a validity mask and masked quality values.
/// A failed read aborts the whole call; nothing is retried.
pub fn extract_descriptors(
    reader: &dyn SubdatasetReader,
    band: &Band,
    a1_granule: &Path,
    a2_granule: &Path,
    band_transfer: Option<&HashMap<u8, Band>>,
    roi: Option<&Roi>,
) -> Result<Descriptors, Error> {
    let band = match (band, band_transfer) {
        (Band::Numbered(n), Some(transfer)) => match transfer.get(n) {
            Some(mapped) => mapped.clone(),
            None => {
                warn!("band {} missing from the transfer map, using it unmapped", n);
                band.clone()
            }
        },
        _ => band.clone(),
    };

    let kernels_raw = reader.read_subdataset(
        &subdataset_name(a1_granule, &band.kernel_subdataset()),
        roi,
    )?;
    let snow_raw = reader.read_subdataset(&subdataset_name(a2_granule, "Snow_BRDF_Albedo"), roi)?;
    let land_raw = reader.read_subdataset(
        &subdataset_name(a2_granule, "BRDF_Albedo_LandWaterType"),
        roi,
    )?;

    // The mandatory-quality fallback is an A1 layer, everything else a
    // per-band A2 layer.
    let quality_granule = match &band {
        Band::Numbered(_) => a2_granule,
        Band::Named(_) => a1_granule,
    };
    let qa_raw = reader.read_subdataset(
        &subdataset_name(quality_granule, &band.quality_subdataset()),
        roi,
    )?;

    let pixels = kernels_raw.pixels();
    require_plane("Snow_BRDF_Albedo", &snow_raw, pixels)?;
    require_plane("BRDF_Albedo_LandWaterType", &land_raw, pixels)?;
    require_plane(&band.quality_subdataset(), &qa_raw, pixels)?;

    let kernels = Data {
        buffer: scale_kernels(&kernels_raw.buffer),
        ..kernels_raw
    };

    let snow_free = decode_snow(&snow_raw.buffer);
    let land = decode_land(&land_raw.buffer);
    let qa_good = decode_quality(&qa_raw.buffer);

    // Validity is snow + quality; the land restriction stays available but
    // unapplied.
    let mask: Vec<bool> = snow_free
        .iter()
        .zip(&qa_good)
        .map(|(&snow, &good)| snow && good)
        .collect();

    let qa_value: Vec<f32> = qa_raw
        .buffer
        .iter()
        .zip(&mask)
        .map(|(&value, &valid)| if valid { value } else { f32::NAN })
        .collect();

    debug!("extracted {} kernels: {}", band, kernels);

    Ok(Descriptors {
        kernels,
        mask,
        qa_value,
        land,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readers::ReadError;
    use std::path::PathBuf;

    /// Serves canned rasters keyed by the full composite sub-dataset name.
    struct CannedReader {
        rasters: HashMap<String, Data>,
    }

    impl SubdatasetReader for CannedReader {
        fn read_subdataset(&self, name: &str, _window: Option<&Roi>) -> Result<Data, ReadError> {
            self.rasters
                .get(name)
                .cloned()
                .ok_or_else(|| ReadError::UnreadableSource(name.to_string()))
        }
    }

    fn plane(bands: usize, values: Vec<f32>) -> Data {
        Data {
            width: 2,
            height: 2,
            bands,
            buffer: values,
        }
    }

    #[test]
    fn test_kernel_scaling_and_fill() {
        let scaled = scale_kernels(&[32767.0, 500.0, 0.0, -100.0]);

        assert!(scaled[0].is_nan());
        assert_eq!(scaled[1], 0.5);
        assert_eq!(scaled[2], 0.0);
        assert_eq!(scaled[3], -0.1);
    }

    #[test]
    fn test_snow_decoding() {
        assert_eq!(
            decode_snow(&[0.0, 1.0, 255.0]),
            vec![true, false, false]
        );
    }

    #[test]
    fn test_quality_decoding() {
        assert_eq!(
            decode_quality(&[0.0, 1.0, 2.0, 3.0]),
            vec![true, true, false, false]
        );
    }

    #[test]
    fn test_land_decoding() {
        assert_eq!(
            decode_land(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
            vec![false, true, false, true, true, true, false]
        );
    }

    #[test]
    fn test_subdataset_name_templates() {
        let granule = Path::new("/data/MCD43A1.A2016001.h20v11.006.x.hdf");

        assert_eq!(
            subdataset_name(granule, &Band::Numbered(2).kernel_subdataset()),
            "HDF4_EOS:EOS_GRID:\"/data/MCD43A1.A2016001.h20v11.006.x.hdf\":MOD_Grid_BRDF:BRDF_Albedo_Parameters_Band2"
        );
        assert_eq!(
            Band::Named("vis".to_string()).kernel_subdataset(),
            "BRDF_Albedo_Parameters_vis"
        );
        assert_eq!(
            Band::Numbered(2).quality_subdataset(),
            "BRDF_Albedo_Band_Quality_Band2"
        );
        assert_eq!(
            Band::Named("vis".to_string()).quality_subdataset(),
            "BRDF_Albedo_Band_Mandatory_Quality_vis"
        );
    }

    #[test]
    fn test_extract_masks_and_scales() {
        let a1 = PathBuf::from("/data/MCD43A1.A2016001.h20v11.006.x.hdf");
        let a2 = PathBuf::from("/data/MCD43A2.A2016001.h20v11.006.x.hdf");

        let mut rasters = HashMap::new();
        rasters.insert(
            subdataset_name(&a1, "BRDF_Albedo_Parameters_Band1"),
            // One kernel plane per pixel keeps the fixture small
            plane(1, vec![500.0, 32767.0, 250.0, 1000.0]),
        );
        rasters.insert(
            subdataset_name(&a2, "Snow_BRDF_Albedo"),
            plane(1, vec![0.0, 0.0, 1.0, 0.0]),
        );
        rasters.insert(
            subdataset_name(&a2, "BRDF_Albedo_LandWaterType"),
            plane(1, vec![1.0, 0.0, 3.0, 5.0]),
        );
        rasters.insert(
            subdataset_name(&a2, "BRDF_Albedo_Band_Quality_Band1"),
            plane(1, vec![1.0, 2.0, 0.0, 1.0]),
        );

        let reader = CannedReader { rasters };
        let descriptors =
            extract_descriptors(&reader, &Band::Numbered(1), &a1, &a2, None, None).unwrap();

        assert_eq!(descriptors.kernels.buffer[0], 0.5);
        assert!(descriptors.kernels.buffer[1].is_nan());
        assert_eq!(descriptors.kernels.buffer[2], 0.25);
        assert_eq!(descriptors.kernels.buffer[3], 1.0);

        // Pixel 1 fails quality, pixel 2 fails snow
        assert_eq!(descriptors.mask, vec![true, false, false, true]);

        assert_eq!(descriptors.qa_value[0], 1.0);
        assert!(descriptors.qa_value[1].is_nan());
        assert!(descriptors.qa_value[2].is_nan());
        assert_eq!(descriptors.qa_value[3], 1.0);

        // Land is computed but must not shape the mask (pixel 1 is water)
        assert_eq!(descriptors.land, vec![true, false, true, true]);
    }

    #[test]
    fn test_band_transfer_switches_to_named_templates() {
        let a1 = PathBuf::from("/data/MCD43A1.A2016001.h20v11.006.x.hdf");
        let a2 = PathBuf::from("/data/MCD43A2.A2016001.h20v11.006.x.hdf");

        let mut rasters = HashMap::new();
        rasters.insert(
            subdataset_name(&a1, "BRDF_Albedo_Parameters_vis"),
            plane(1, vec![500.0]),
        );
        rasters.insert(
            subdataset_name(&a2, "Snow_BRDF_Albedo"),
            plane(1, vec![0.0]),
        );
        rasters.insert(
            subdataset_name(&a2, "BRDF_Albedo_LandWaterType"),
            plane(1, vec![1.0]),
        );
        // The mandatory-quality layer is addressed in the A1 granule
        rasters.insert(
            subdataset_name(&a1, "BRDF_Albedo_Band_Mandatory_Quality_vis"),
            plane(1, vec![0.0]),
        );

        let transfer = HashMap::from([(1u8, Band::from("vis"))]);
        let reader = CannedReader { rasters };
        let descriptors = extract_descriptors(
            &reader,
            &Band::Numbered(1),
            &a1,
            &a2,
            Some(&transfer),
            None,
        )
        .unwrap();

        assert_eq!(descriptors.kernels.buffer, vec![0.5]);
        assert_eq!(descriptors.mask, vec![true]);
    }

    #[test]
    fn test_band_transfer_miss_uses_the_numbered_templates() {
        let a1 = PathBuf::from("/data/MCD43A1.A2016001.h20v11.006.x.hdf");
        let a2 = PathBuf::from("/data/MCD43A2.A2016001.h20v11.006.x.hdf");

        let mut rasters = HashMap::new();
        rasters.insert(
            subdataset_name(&a1, "BRDF_Albedo_Parameters_Band1"),
            plane(1, vec![500.0]),
        );
        rasters.insert(
            subdataset_name(&a2, "Snow_BRDF_Albedo"),
            plane(1, vec![0.0]),
        );
        rasters.insert(
            subdataset_name(&a2, "BRDF_Albedo_LandWaterType"),
            plane(1, vec![1.0]),
        );
        rasters.insert(
            subdataset_name(&a2, "BRDF_Albedo_Band_Quality_Band1"),
            plane(1, vec![0.0]),
        );

        // The map only covers band 2; a band 1 request stays numbered
        let transfer = HashMap::from([(2u8, Band::from("vis"))]);
        let reader = CannedReader { rasters };
        let descriptors = extract_descriptors(
            &reader,
            &Band::Numbered(1),
            &a1,
            &a2,
            Some(&transfer),
            None,
        )
        .unwrap();

        assert_eq!(descriptors.kernels.buffer, vec![0.5]);
    }

    #[test]
    fn test_multi_plane_snow_raster_is_a_dimension_error() {
        let a1 = PathBuf::from("/data/MCD43A1.A2016001.h20v11.006.x.hdf");
        let a2 = PathBuf::from("/data/MCD43A2.A2016001.h20v11.006.x.hdf");

        let mut rasters = HashMap::new();
        rasters.insert(
            subdataset_name(&a1, "BRDF_Albedo_Parameters_Band1"),
            plane(3, vec![500.0; 12]),
        );
        // A 3-plane snow raster must not be reduced to its first plane
        rasters.insert(
            subdataset_name(&a2, "Snow_BRDF_Albedo"),
            plane(3, vec![0.0; 12]),
        );
        rasters.insert(
            subdataset_name(&a2, "BRDF_Albedo_LandWaterType"),
            plane(1, vec![1.0; 4]),
        );
        rasters.insert(
            subdataset_name(&a2, "BRDF_Albedo_Band_Quality_Band1"),
            plane(1, vec![1.0; 4]),
        );

        let reader = CannedReader { rasters };
        let result = extract_descriptors(&reader, &Band::Numbered(1), &a1, &a2, None, None);

        assert!(matches!(result, Err(Error::DimensionMismatch(_))));
    }

    #[test]
    fn test_pixel_count_mismatch_is_a_dimension_error() {
        let a1 = PathBuf::from("/data/MCD43A1.A2016001.h20v11.006.x.hdf");
        let a2 = PathBuf::from("/data/MCD43A2.A2016001.h20v11.006.x.hdf");

        let mut rasters = HashMap::new();
        rasters.insert(
            subdataset_name(&a1, "BRDF_Albedo_Parameters_Band1"),
            plane(1, vec![500.0; 4]),
        );
        rasters.insert(
            subdataset_name(&a2, "Snow_BRDF_Albedo"),
            plane(1, vec![0.0; 4]),
        );
        rasters.insert(
            subdataset_name(&a2, "BRDF_Albedo_LandWaterType"),
            plane(1, vec![1.0; 4]),
        );
        // Quality raster shaped 3x3 against a 2x2 kernel window
        rasters.insert(
            subdataset_name(&a2, "BRDF_Albedo_Band_Quality_Band1"),
            Data {
                width: 3,
                height: 3,
                bands: 1,
                buffer: vec![1.0; 9],
            },
        );

        let reader = CannedReader { rasters };
        let result = extract_descriptors(&reader, &Band::Numbered(1), &a1, &a2, None, None);

        assert!(matches!(result, Err(Error::DimensionMismatch(_))));
    }

    #[test]
    fn test_unreadable_subdataset_aborts_extraction() {
        let a1 = PathBuf::from("/data/MCD43A1.A2016001.h20v11.006.x.hdf");
        let a2 = PathBuf::from("/data/MCD43A2.A2016001.h20v11.006.x.hdf");

        let reader = CannedReader {
            rasters: HashMap::new(),
        };
        let result = extract_descriptors(&reader, &Band::Numbered(1), &a1, &a2, None, None);

        assert!(matches!(result, Err(Error::Read(_))));
    }
}
