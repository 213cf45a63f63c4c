//! Generation inputs: the technical specification of the target surface, the
//! placement hint and optional text overrides.
//!
//! Both `AdSpecification` and `LayoutPlacement` are validated while they are
//! deserialized, so values coming from the extraction service or the UI never
//! reach the layout engine with missing or out-of-range fields.

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// AdSpecification
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColorMode {
    Cmyk,
    Rgb,
}

/// Physical description of the surface an artboard is generated for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawAdSpecification")]
pub struct AdSpecification {
    /// Display name of the surface or format (e.g. "BLB"). Empty when unknown.
    pub name: String,
    pub total_width_cm: f64,
    pub total_height_cm: f64,
    pub text_zone_width_cm: Option<f64>,
    pub text_zone_height_cm: Option<f64>,
    pub has_frame: bool,
    /// Pixels per inch.
    pub dpi: f64,
    pub color_mode: Option<ColorMode>,
    pub output_format: Option<String>,
    pub notes: Option<String>,
}

/// Wire shape of [`AdSpecification`]; every field may be missing or null.
#[derive(Debug, Deserialize)]
struct RawAdSpecification {
    name: Option<String>,
    total_width_cm: Option<f64>,
    total_height_cm: Option<f64>,
    text_zone_width_cm: Option<f64>,
    text_zone_height_cm: Option<f64>,
    has_frame: Option<bool>,
    dpi: Option<f64>,
    color_mode: Option<ColorMode>,
    output_format: Option<String>,
    notes: Option<String>,
}

impl TryFrom<RawAdSpecification> for AdSpecification {
    type Error = String;

    fn try_from(raw: RawAdSpecification) -> Result<Self, Self::Error> {
        Ok(AdSpecification {
            name: raw.name.unwrap_or_default().trim().to_string(),
            total_width_cm: require_positive("total_width_cm", raw.total_width_cm)?,
            total_height_cm: require_positive("total_height_cm", raw.total_height_cm)?,
            text_zone_width_cm: raw.text_zone_width_cm,
            text_zone_height_cm: raw.text_zone_height_cm,
            has_frame: raw.has_frame.unwrap_or(false),
            dpi: require_positive("dpi", raw.dpi)?,
            color_mode: raw.color_mode,
            output_format: raw.output_format,
            notes: raw.notes,
        })
    }
}

fn require_positive(field: &str, value: Option<f64>) -> Result<f64, String> {
    match value {
        None => Err(format!("{field} is required")),
        Some(v) if v.is_finite() && v > 0.0 => Ok(v),
        Some(v) => Err(format!("{field} must be a positive number, got {v}")),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LayoutPlacement
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoZone {
    Left,
    Right,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextZone {
    Left,
    Right,
    None,
}

/// Placement hint for the photo and text regions, as estimated from a master screenshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawLayoutPlacement")]
pub struct LayoutPlacement {
    pub photo_zone: PhotoZone,
    pub text_zone: TextZone,
    /// Horizontal focal point of the photo, 0–1.
    pub photo_x: f64,
    /// Vertical focal point of the photo, 0–1.
    pub photo_y: f64,
    /// 1.0 = the photo exactly covers its zone.
    pub photo_scale: f64,
    /// Fraction of the total width occupied by the photo.
    pub split_ratio: f64,
}

#[derive(Debug, Deserialize)]
struct RawLayoutPlacement {
    photo_zone: Option<PhotoZone>,
    text_zone: Option<TextZone>,
    photo_x: Option<f64>,
    photo_y: Option<f64>,
    photo_scale: Option<f64>,
    split_ratio: Option<f64>,
}

impl TryFrom<RawLayoutPlacement> for LayoutPlacement {
    type Error = String;

    fn try_from(raw: RawLayoutPlacement) -> Result<Self, Self::Error> {
        let photo_scale = raw.photo_scale.ok_or("photo_scale is required")?;
        if !(photo_scale.is_finite() && photo_scale >= 1.0) {
            return Err(format!("photo_scale must be >= 1, got {photo_scale}"));
        }
        Ok(LayoutPlacement {
            photo_zone: raw.photo_zone.ok_or("photo_zone is required")?,
            text_zone: raw.text_zone.ok_or("text_zone is required")?,
            photo_x: require_unit("photo_x", raw.photo_x)?,
            photo_y: require_unit("photo_y", raw.photo_y)?,
            photo_scale,
            split_ratio: require_unit("split_ratio", raw.split_ratio)?,
        })
    }
}

fn require_unit(field: &str, value: Option<f64>) -> Result<f64, String> {
    match value {
        None => Err(format!("{field} is required")),
        Some(v) if (0.0..=1.0).contains(&v) => Ok(v),
        Some(v) => Err(format!("{field} must be within 0..1, got {v}")),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Text overrides
// ────────────────────────────────────────────────────────────────────────────

/// Replacement copy for the text slots. `None` keeps the master's text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextOverrides {
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub subline: Option<String>,
    #[serde(default)]
    pub disclaimer: Option<String>,
}
