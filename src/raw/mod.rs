/// RAW image decoding module
///
/// This module handles:
/// - Loading sensor data and metadata from RAW files (loader.rs)
/// - Developing sensor data into an sRGB raster (develop.rs)

pub mod develop;
pub mod loader;

use std::path::Path;

use image::RgbImage;

use crate::error::ConvertError;

/// Turns a RAW file into an RGB raster
pub trait RawDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> Result<RgbImage, ConvertError>;
}

/// The production decoder: rawloader for the sensor data, our own
/// develop pipeline for the rest
#[derive(Debug, Default, Clone, Copy)]
pub struct RawloaderDecoder;

impl RawDecoder for RawloaderDecoder {
    fn decode(&self, path: &Path) -> Result<RgbImage, ConvertError> {
        let frame = loader::load_raw(path)?;
        develop::develop(&frame)
    }
}
