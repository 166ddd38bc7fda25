pub mod gdal;
pub mod types;

pub use gdal::GdalReader;
pub use types::{Data, ReadError, SubdatasetReader};
