//! Layout Engine — rebuilds the master at the size a technical specification asks for.
//!
//! # Geometry
//! A single factor, `target_height_px / master_height`, scales every slot's size
//! and its offset from the master frame origin. The output therefore keeps the
//! master's aspect ratio; only the target height is honored exactly.
//!
//! # Child order (back to front)
//! photo, text-bg, bottom-bar, logo, headline, subline, disclaimer, go-logo,
//! then the optional border. `text-zone` is snapshotted by the reader but not
//! emitted: its visible parts are the text-bg rectangle and the text slots.

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info};

use crate::document::model::{Node, Paint, Point, Rgb, ScaleMode, ShapeStyle, Size, StrokeAlign};
use crate::document::{FontLoader, ImageStore};
use crate::layout::master::{FillSlot, MasterTemplate, Slot, SlotGeometry, SubtreeSlot};
use crate::layout::text::inject_text;
use crate::layout::units::to_pixels;
use crate::layout::LayoutError;
use crate::models::ad::{AdSpecification, LayoutPlacement, PhotoZone, TextOverrides, TextZone};

pub const BORDER_NAME: &str = "frame";
pub const BORDER_WEIGHT: f64 = 2.0;

/// Photo/text zone arithmetic derived from the master and the placement hint.
///
/// Informational: slot geometry is taken from the master alone, the plan is
/// reported alongside the artboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZonePlan {
    /// Fraction of the master's width not covered by the text background.
    pub split_ratio: f64,
    pub photo_width: f64,
    pub text_width: f64,
    pub photo_zone_x: f64,
    pub text_zone_x: f64,
    pub bottom_bar_height: f64,
    pub hint: LayoutPlacement,
}

impl ZonePlan {
    fn compute(
        master: &MasterTemplate,
        placement: &LayoutPlacement,
        target_width: u32,
        uniform_scale: f64,
    ) -> Self {
        let frame_width = master.frame_size.width;
        let text_bg_width = master.text_background.geometry.size.width;
        let split_ratio = (frame_width - text_bg_width) / frame_width;

        let total = f64::from(target_width);
        let photo_width = (total * split_ratio).round();
        let text_width = total - photo_width;

        ZonePlan {
            split_ratio,
            photo_width,
            text_width,
            photo_zone_x: match placement.photo_zone {
                PhotoZone::Right => text_width,
                PhotoZone::Left | PhotoZone::Full => 0.0,
            },
            text_zone_x: match placement.text_zone {
                TextZone::Left => 0.0,
                TextZone::Right | TextZone::None => photo_width,
            },
            bottom_bar_height: (master.bottom_bar.geometry.size.height * uniform_scale).round(),
            hint: placement.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GeneratedArtboard {
    pub frame: Node,
    pub uniform_scale: f64,
    pub zones: ZonePlan,
}

/// Host services the engine needs while building an artboard.
pub struct LayoutContext<'a> {
    pub images: &'a dyn ImageStore,
    pub fonts: &'a dyn FontLoader,
}

/// Builds a new artboard from `master` sized to `spec`.
pub async fn generate_artboard(
    master: &MasterTemplate,
    spec: &AdSpecification,
    placement: &LayoutPlacement,
    overrides: &TextOverrides,
    ctx: &LayoutContext<'_>,
) -> Result<GeneratedArtboard, LayoutError> {
    let target_width = to_pixels(spec.total_width_cm, spec.dpi)?;
    let target_height = to_pixels(spec.total_height_cm, spec.dpi)?;

    let frame_size = master.frame_size;
    if !(frame_size.height.is_finite() && frame_size.height > 0.0) {
        return Err(LayoutError::InvalidMaster(format!(
            "master height must be positive, got {}",
            frame_size.height
        )));
    }
    if !(frame_size.width.is_finite() && frame_size.width > 0.0) {
        return Err(LayoutError::InvalidMaster(format!(
            "master width must be positive, got {}",
            frame_size.width
        )));
    }
    let uniform_scale = f64::from(target_height) / frame_size.height;

    let zones = ZonePlan::compute(master, placement, target_width, uniform_scale);
    debug!(
        "Master {}x{}, target {}x{}, scale {:.4}, zones {:?}",
        frame_size.width, frame_size.height, target_width, target_height, uniform_scale, zones
    );

    let name = if spec.name.is_empty() {
        format!("Ad_{}", chrono::Utc::now().timestamp_millis())
    } else {
        spec.name.clone()
    };
    let mut frame = Node::frame(
        name,
        Size::new(f64::from(target_width), f64::from(target_height)),
        vec![Paint::solid(Rgb::WHITE)],
    );
    let mut children: Vec<Node> = Vec::with_capacity(9);
    let place =
        |geometry: &SlotGeometry| Placement::scaled(master.frame_origin, geometry, uniform_scale);

    // Photo: a fresh rectangle bound to a newly registered copy of the image.
    let photo_hash = ctx
        .images
        .register(Bytes::clone(&master.photo.image_bytes))
        .await;
    let photo = place(&master.photo.geometry);
    children.push(Node::rectangle(
        Slot::Photo.layer_name(),
        photo.position,
        photo.size,
        ShapeStyle::filled(vec![Paint::Image {
            image_hash: photo_hash,
            scale_mode: ScaleMode::Fill,
            image_transform: None,
        }]),
    ));

    for (slot, source) in [
        (Slot::TextBackground, &master.text_background),
        (Slot::BottomBar, &master.bottom_bar),
    ] {
        children.push(fill_rectangle(slot, source, place(&source.geometry)));
    }

    let subtrees: [(Slot, &SubtreeSlot, Option<&String>); 5] = [
        (Slot::Logo, &master.logo, None),
        (Slot::Headline, &master.headline, overrides.headline.as_ref()),
        (Slot::Subline, &master.subline, overrides.subline.as_ref()),
        (Slot::Disclaimer, &master.disclaimer, overrides.disclaimer.as_ref()),
        (Slot::SecondaryLogo, &master.secondary_logo, None),
    ];
    for (slot, source, text) in subtrees {
        let mut clone = source.node.duplicate();
        clone.name = slot.layer_name().to_string();
        clone.rescale(uniform_scale);
        clone.set_position(place(&source.geometry).position);
        if let Some(value) = text {
            inject_text(&mut clone, value, ctx.fonts).await?;
        }
        children.push(clone);
    }

    if spec.has_frame {
        children.push(border(frame.size()));
    }

    if let Some(slots) = frame.children_mut() {
        slots.extend(children);
    }

    info!(
        "Generated artboard '{}' {}x{} (scale {:.4})",
        frame.name, target_width, target_height, uniform_scale
    );

    Ok(GeneratedArtboard {
        frame,
        uniform_scale,
        zones,
    })
}

/// Position and size of a slot copy inside the new artboard.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Placement {
    position: Point,
    size: Size,
}

impl Placement {
    fn scaled(frame_origin: Point, geometry: &SlotGeometry, scale: f64) -> Self {
        Self {
            position: geometry.position.relative_to(frame_origin).scaled(scale),
            size: geometry.size.scaled(scale),
        }
    }
}

fn fill_rectangle(slot: Slot, source: &FillSlot, placement: Placement) -> Node {
    // The fill list is owned by the snapshot; cloning it yields independent paints.
    Node::rectangle(
        slot.layer_name(),
        placement.position,
        placement.size,
        ShapeStyle::filled(source.fills.clone()),
    )
}

fn border(size: Size) -> Node {
    Node::rectangle(
        BORDER_NAME,
        Point::ORIGIN,
        size,
        ShapeStyle {
            fills: Vec::new(),
            strokes: vec![Paint::solid(Rgb::BLACK)],
            stroke_weight: BORDER_WEIGHT,
            stroke_align: StrokeAlign::Inside,
            corner_radius: 0.0,
        },
    )
}
