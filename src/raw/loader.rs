/// RAW sensor data loader
///
/// Loads the actual sensor data from a RAW file (not the embedded JPEG)
/// together with the metadata the develop step needs.

use std::path::Path;

use crate::error::ConvertError;

/// Repeating color filter tile, colors as rawloader numbers them
/// (0 = red, 1 = green, 2 = blue, 3 = emerald/second green)
#[derive(Debug, Clone, PartialEq)]
pub struct CfaTile {
    pub width: usize,
    pub height: usize,
    pub colors: Vec<usize>,
}

impl CfaTile {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.colors.len() != self.width * self.height
    }

    /// Color at a sensor site; emerald is folded into green
    #[inline]
    pub fn color_at(&self, row: usize, col: usize) -> usize {
        match self.colors[(row % self.height) * self.width + (col % self.width)] {
            3 => 1,
            c => c.min(2),
        }
    }
}

/// How the stored pixels must be turned to display upright
/// (EXIF orientation 1-8)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Normal,
    HorizontalFlip,
    Rotate180,
    VerticalFlip,
    Transpose,
    /// Rotate 90° clockwise
    Rotate90,
    Transverse,
    /// Rotate 90° counter-clockwise
    Rotate270,
}

impl From<rawloader::Orientation> for Orientation {
    fn from(orientation: rawloader::Orientation) -> Self {
        match orientation {
            rawloader::Orientation::HorizontalFlip => Orientation::HorizontalFlip,
            rawloader::Orientation::Rotate180 => Orientation::Rotate180,
            rawloader::Orientation::VerticalFlip => Orientation::VerticalFlip,
            rawloader::Orientation::Transpose => Orientation::Transpose,
            rawloader::Orientation::Rotate90 => Orientation::Rotate90,
            rawloader::Orientation::Transverse => Orientation::Transverse,
            rawloader::Orientation::Rotate270 => Orientation::Rotate270,
            _ => Orientation::Normal,
        }
    }
}

/// Decoded RAW frame, owned and detached from the file it came from
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub width: usize,
    pub height: usize,
    /// Components per pixel: 1 for mosaiced sensors, 3 for linear DNG
    pub cpp: usize,
    pub data: Vec<u16>,
    pub black_levels: [u16; 4],
    pub white_levels: [u16; 4],
    /// As-shot white balance [R, G, B, E]; NaN when the file has none
    pub wb_coeffs: [f32; 4],
    pub xyz_to_cam: [[f32; 3]; 3],
    pub cfa: CfaTile,
    /// Margins to drop: top, right, bottom, left
    pub crops: [usize; 4],
    pub orientation: Orientation,
}

/// Load raw sensor data from a RAW file
///
/// The decoder opens and releases the file inside this call, so a
/// failing file never leaks a handle into the next one.
pub fn load_raw(path: &Path) -> Result<RawFrame, ConvertError> {
    if !path.exists() {
        return Err(ConvertError::Decode(format!("file not found: {}", path.display())));
    }

    let decoder = rawloader::RawLoader::new();
    let raw_image = decoder
        .decode_file(path)
        .map_err(|e| ConvertError::Decode(format!("{:?}", e)))?;

    let (data, black_levels, white_levels) = match raw_image.data {
        rawloader::RawImageData::Integer(values) => {
            (values, raw_image.blacklevels, raw_image.whitelevels)
        }
        rawloader::RawImageData::Float(values) => {
            // Convert f32 (0.0-1.0) to u16 (0-65535)
            let values = values
                .iter()
                .map(|&v| (v * 65535.0).clamp(0.0, 65535.0) as u16)
                .collect();
            (values, [0; 4], [u16::MAX; 4])
        }
    };

    let (cfa_width, cfa_height) = (raw_image.cfa.width, raw_image.cfa.height);
    let mut colors = Vec::with_capacity(cfa_width * cfa_height);
    for row in 0..cfa_height {
        for col in 0..cfa_width {
            colors.push(raw_image.cfa.color_at(row, col));
        }
    }
    let cfa = CfaTile { width: cfa_width, height: cfa_height, colors };

    let xyz = raw_image.xyz_to_cam;
    let frame = RawFrame {
        width: raw_image.width,
        height: raw_image.height,
        cpp: raw_image.cpp,
        data,
        black_levels,
        white_levels,
        wb_coeffs: raw_image.wb_coeffs,
        xyz_to_cam: [xyz[0], xyz[1], xyz[2]],
        cfa,
        crops: raw_image.crops,
        orientation: raw_image.orientation.into(),
    };

    tracing::debug!(
        "📷 Loaded RAW data: {}x{} cpp={} cfa={}x{} {:?} from {}",
        frame.width,
        frame.height,
        frame.cpp,
        frame.cfa.width,
        frame.cfa.height,
        frame.orientation,
        path.display()
    );

    Ok(frame)
}
