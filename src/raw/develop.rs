/// Develop a decoded RAW frame into an 8-bit sRGB raster
///
/// Pipeline, in order:
/// 1. Black/white level normalisation (per CFA color)
/// 2. White balance, normalised so green = 1.0
/// 3. Demosaic (or passthrough for 3-component linear data)
/// 4. Camera RGB → linear sRGB
/// 5. Crop to the active area
/// 6. sRGB transfer curve and clamp
/// 7. Rotate/flip upright

use image::{imageops, RgbImage};

use super::loader::{Orientation, RawFrame};
use crate::color;
use crate::error::ConvertError;

pub fn develop(frame: &RawFrame) -> Result<RgbImage, ConvertError> {
    let (width, height) = (frame.width, frame.height);
    if width == 0 || height == 0 {
        return Err(ConvertError::UnsupportedLayout("empty image".to_string()));
    }
    if frame.data.len() < width * height * frame.cpp {
        return Err(ConvertError::UnsupportedLayout(format!(
            "expected {} samples, found {}",
            width * height * frame.cpp,
            frame.data.len()
        )));
    }

    let monochrome = frame.cpp == 1 && frame.cfa.is_empty();
    let wb = white_balance(frame.wb_coeffs);
    let linear = match frame.cpp {
        // No color filter: a monochrome sensor, shown as grey
        1 if monochrome => frame.data[..width * height]
            .iter()
            .map(|&v| [normalize(frame, v, 0); 3])
            .collect(),
        1 => demosaic(frame, wb),
        3 => frame
            .data
            .chunks_exact(3)
            .take(width * height)
            .map(|px| {
                [
                    normalize(frame, px[0], 0) * wb[0],
                    normalize(frame, px[1], 1) * wb[1],
                    normalize(frame, px[2], 2) * wb[2],
                ]
            })
            .collect(),
        cpp => {
            return Err(ConvertError::UnsupportedLayout(format!(
                "{} components per pixel",
                cpp
            )))
        }
    };

    let matrix = if monochrome {
        color::IDENTITY
    } else {
        color::camera_to_srgb(frame.xyz_to_cam)
    };
    let (top, left, out_width, out_height) = active_area(frame);

    let mut out = RgbImage::new(out_width as u32, out_height as u32);
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let src = linear[(y as usize + top) * width + x as usize + left];
        let rgb = color::apply(&matrix, src);
        pixel.0 = [
            color::encode_srgb(rgb[0]),
            color::encode_srgb(rgb[1]),
            color::encode_srgb(rgb[2]),
        ];
    }

    Ok(orient(out, frame.orientation))
}

fn orient(img: RgbImage, orientation: Orientation) -> RgbImage {
    match orientation {
        Orientation::Normal => img,
        Orientation::HorizontalFlip => imageops::flip_horizontal(&img),
        Orientation::Rotate180 => imageops::rotate180(&img),
        Orientation::VerticalFlip => imageops::flip_vertical(&img),
        Orientation::Transpose => imageops::flip_horizontal(&imageops::rotate90(&img)),
        Orientation::Rotate90 => imageops::rotate90(&img),
        Orientation::Transverse => imageops::flip_horizontal(&imageops::rotate270(&img)),
        Orientation::Rotate270 => imageops::rotate270(&img),
    }
}

/// Normalise the as-shot multipliers to green; missing or broken
/// coefficients fall back to neutral
fn white_balance(coeffs: [f32; 4]) -> [f32; 3] {
    let valid = |v: f32| v.is_finite() && v > 0.0;
    if !(valid(coeffs[0]) && valid(coeffs[1]) && valid(coeffs[2])) {
        tracing::debug!("⚠️  No white balance data found, using neutral");
        return [1.0, 1.0, 1.0];
    }
    [coeffs[0] / coeffs[1], 1.0, coeffs[2] / coeffs[1]]
}

#[inline]
fn normalize(frame: &RawFrame, value: u16, color: usize) -> f32 {
    let black = frame.black_levels[color] as f32;
    let white = frame.white_levels[color] as f32;
    let range = (white - black).max(1.0);
    ((value as f32 - black) / range).max(0.0)
}

/// Average the same-color sites of the 3x3 neighbourhood for every
/// channel. Works for any CFA tile whose 3x3 windows hold all three
/// colors (Bayer and X-Trans both do).
fn demosaic(frame: &RawFrame, wb: [f32; 3]) -> Vec<[f32; 3]> {
    let (width, height) = (frame.width, frame.height);

    let plane: Vec<f32> = frame.data[..width * height]
        .iter()
        .enumerate()
        .map(|(i, &v)| {
            let c = frame.cfa.color_at(i / width, i % width);
            normalize(frame, v, c) * wb[c]
        })
        .collect();

    let mut out = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            let mut sum = [0.0f32; 3];
            let mut count = [0u32; 3];
            for r in row.saturating_sub(1)..=(row + 1).min(height - 1) {
                for c in col.saturating_sub(1)..=(col + 1).min(width - 1) {
                    let color = frame.cfa.color_at(r, c);
                    sum[color] += plane[r * width + c];
                    count[color] += 1;
                }
            }
            let own = frame.cfa.color_at(row, col);
            let mut px = [0.0f32; 3];
            for ch in 0..3 {
                px[ch] = if ch == own {
                    plane[row * width + col]
                } else if count[ch] > 0 {
                    sum[ch] / count[ch] as f32
                } else {
                    0.0
                };
            }
            out.push(px);
        }
    }
    out
}

/// Returns (top, left, width, height) of the area left after cropping;
/// crops that would leave nothing are ignored
fn active_area(frame: &RawFrame) -> (usize, usize, usize, usize) {
    let [top, right, bottom, left] = frame.crops;
    if top + bottom >= frame.height || left + right >= frame.width {
        return (0, 0, frame.width, frame.height);
    }
    (
        top,
        left,
        frame.width - left - right,
        frame.height - top - bottom,
    )
}
