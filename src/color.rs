/// Color space conversion utilities
///
/// Converts camera RGB (sensor-native) into linear sRGB using the
/// XYZ-to-camera matrix carried in the RAW metadata, then applies the
/// sRGB transfer curve for 8-bit output.

use cgmath::{Matrix3, SquareMatrix, Vector3};

/// sRGB (linear, D65) to CIE XYZ
/// Source: IEC 61966-2-1:1999 (sRGB standard)
const SRGB_TO_XYZ: [[f32; 3]; 3] = [
    [0.4124, 0.3576, 0.1805],
    [0.2126, 0.7152, 0.0722],
    [0.0193, 0.1192, 0.9505],
];

pub const IDENTITY: [[f32; 3]; 3] = [
    [1.0, 0.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
];

/// Calculate the camera-to-sRGB color conversion matrix
///
/// # Algorithm
/// 1. cam_rgb = xyz_to_cam × SRGB_TO_XYZ
/// 2. Normalize each row of cam_rgb to sum to 1.0, so a white-balanced
///    neutral stays neutral
/// 3. Invert to get rgb_cam
///
/// Returns the identity matrix when the file carries no matrix or the
/// product is singular.
pub fn camera_to_srgb(xyz_to_cam: [[f32; 3]; 3]) -> [[f32; 3]; 3] {
    if xyz_to_cam.iter().flatten().all(|&v| v == 0.0) {
        return IDENTITY;
    }

    let cam_rgb = from_rows(xyz_to_cam) * from_rows(SRGB_TO_XYZ);

    // cgmath indexes [col][row]
    let mut rows = [[0.0f32; 3]; 3];
    for (r, row) in rows.iter_mut().enumerate() {
        let sum: f32 = (0..3).map(|c| cam_rgb[c][r]).sum();
        if !sum.is_finite() || sum.abs() < 1e-6 {
            return IDENTITY;
        }
        for (c, value) in row.iter_mut().enumerate() {
            *value = cam_rgb[c][r] / sum;
        }
    }

    match from_rows(rows).invert() {
        Some(inverse) => to_rows(inverse),
        None => {
            tracing::warn!("camera color matrix is singular, using identity");
            IDENTITY
        }
    }
}

/// Multiply a row-major 3x3 matrix with an RGB triple
#[inline]
pub fn apply(matrix: &[[f32; 3]; 3], rgb: [f32; 3]) -> [f32; 3] {
    let v = from_rows(*matrix) * Vector3::new(rgb[0], rgb[1], rgb[2]);
    [v.x, v.y, v.z]
}

/// Linear light to sRGB-encoded 8-bit value
#[inline]
pub fn encode_srgb(linear: f32) -> u8 {
    let v = if linear.is_nan() { 0.0 } else { linear.clamp(0.0, 1.0) };
    let encoded = if v <= 0.003_130_8 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    };
    (encoded * 255.0 + 0.5) as u8
}

fn from_rows(m: [[f32; 3]; 3]) -> Matrix3<f32> {
    Matrix3::new(
        m[0][0], m[1][0], m[2][0],
        m[0][1], m[1][1], m[2][1],
        m[0][2], m[1][2], m[2][2],
    )
}

fn to_rows(m: Matrix3<f32>) -> [[f32; 3]; 3] {
    [
        [m[0][0], m[1][0], m[2][0]],
        [m[0][1], m[1][1], m[2][1]],
        [m[0][2], m[1][2], m[2][2]],
    ]
}
