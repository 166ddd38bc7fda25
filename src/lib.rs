//! Retrieve BRDF shape descriptors from MCD43A1 and MCD43A2 MODIS products.
//!
//! The descriptors are the per-band weights of the linear kernel model
//! fitted to the observations. [`BrdfSession`] indexes the granule pairs of
//! one tile over a time range; each [`BrdfSession::get_descriptors`] call
//! reads the kernel, snow, land/water and quality sub-datasets of one date,
//! scales the kernels and combines the flags into a validity mask.

pub mod config;
pub mod descriptors;
pub mod error;
pub mod granules;
pub mod readers;
pub mod roi;
pub mod session;
pub mod timespec;

pub use config::SessionConfig;
pub use descriptors::{Band, Descriptors, extract_descriptors};
pub use error::Error;
pub use granules::{Product, find_granules};
pub use readers::{Data, GdalReader, ReadError, SubdatasetReader};
pub use roi::Roi;
pub use session::BrdfSession;
pub use timespec::TimeSpec;
