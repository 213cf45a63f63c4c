//! Physical ⇄ pixel length conversion.

use crate::layout::LayoutError;

const CM_PER_INCH: f64 = 2.54;

/// `round(cm / 2.54 * dpi)`.
pub fn to_pixels(length_cm: f64, dpi: f64) -> Result<u32, LayoutError> {
    check_dpi(dpi)?;
    if !length_cm.is_finite() || length_cm < 0.0 {
        return Err(LayoutError::InvalidArgument(format!(
            "length must be a non-negative number of centimeters, got {length_cm}"
        )));
    }
    let pixels = (length_cm / CM_PER_INCH * dpi).round();
    if pixels > f64::from(u32::MAX) {
        return Err(LayoutError::InvalidArgument(format!(
            "{length_cm}cm at {dpi}dpi exceeds the pixel range"
        )));
    }
    Ok(pixels as u32)
}

/// `px * 2.54 / dpi`, unrounded.
#[cfg(test)]
pub fn to_centimeters(pixels: f64, dpi: f64) -> Result<f64, LayoutError> {
    check_dpi(dpi)?;
    Ok(pixels * CM_PER_INCH / dpi)
}

fn check_dpi(dpi: f64) -> Result<(), LayoutError> {
    if dpi.is_finite() && dpi > 0.0 {
        Ok(())
    } else {
        Err(LayoutError::InvalidArgument(format!(
            "dpi must be a positive number, got {dpi}"
        )))
    }
}
