//! Master Reader — validates a selected `master` frame and snapshots its nine slots.
//!
//! The snapshot owns everything it needs: image bytes are fetched, fill lists and
//! subtrees are copied. Edits made to the document afterwards never leak into a
//! snapshot that has already been taken.

use bytes::Bytes;
use serde::Serialize;
use tracing::{debug, info};

use crate::document::model::{Node, NodeType, Paint, Point, Size, Transform2D};
use crate::document::search::{find_by_name, find_image_fill, first_text, Found};
use crate::document::ImageStore;
use crate::layout::LayoutError;

pub const MASTER_NAME: &str = "master";

/// The nine named roles a master must contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Slot {
    Photo,
    Logo,
    Headline,
    Subline,
    Disclaimer,
    SecondaryLogo,
    TextZone,
    TextBackground,
    BottomBar,
}

impl Slot {
    /// Lookup order after `photo`. The first missing one is reported.
    pub const REMAINING: [Slot; 8] = [
        Slot::Logo,
        Slot::Headline,
        Slot::Subline,
        Slot::Disclaimer,
        Slot::SecondaryLogo,
        Slot::TextZone,
        Slot::TextBackground,
        Slot::BottomBar,
    ];

    /// Exact layer name the slot is found by.
    pub const fn layer_name(self) -> &'static str {
        match self {
            Slot::Photo => "photo",
            Slot::Logo => "logo",
            Slot::Headline => "headline",
            Slot::Subline => "subline",
            Slot::Disclaimer => "disclaimer",
            Slot::SecondaryLogo => "go-logo",
            Slot::TextZone => "text-zone",
            Slot::TextBackground => "text-bg",
            Slot::BottomBar => "bottom-bar",
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.layer_name())
    }
}

/// Absolute placement of a slot inside the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotGeometry {
    pub position: Point,
    pub size: Size,
}

impl SlotGeometry {
    fn of(found: &Found<'_, Node>) -> Self {
        Self {
            position: found.absolute,
            size: found.node.size(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageSlot {
    pub geometry: SlotGeometry,
    pub image_bytes: Bytes,
    pub image_transform: Option<Transform2D>,
}

#[derive(Debug, Clone)]
pub struct FillSlot {
    pub geometry: SlotGeometry,
    pub fills: Vec<Paint>,
}

#[derive(Debug, Clone)]
pub struct SubtreeSlot {
    pub geometry: SlotGeometry,
    pub node: Node,
}

impl SubtreeSlot {
    pub fn text(&self) -> String {
        first_text(&self.node)
    }
}

#[derive(Debug, Clone)]
pub struct MasterTemplate {
    pub name: String,
    /// Absolute origin of the master frame; slot offsets are measured from here.
    pub frame_origin: Point,
    pub frame_size: Size,
    pub photo: ImageSlot,
    pub text_background: FillSlot,
    pub bottom_bar: FillSlot,
    pub logo: SubtreeSlot,
    pub headline: SubtreeSlot,
    pub subline: SubtreeSlot,
    pub disclaimer: SubtreeSlot,
    pub secondary_logo: SubtreeSlot,
    pub text_zone: SubtreeSlot,
}

/// Reads the master from the current selection.
pub async fn read_master(
    selection: Option<Found<'_, Node>>,
    images: &dyn ImageStore,
) -> Result<MasterTemplate, LayoutError> {
    let frame = match selection {
        Some(found) if found.node.node_type() == NodeType::Frame && found.node.name == MASTER_NAME => {
            found
        }
        _ => return Err(LayoutError::NotAMaster),
    };
    let root = frame.node;
    let origin = frame.absolute;

    let photo = find_by_name(root, origin, Slot::Photo.layer_name())
        .ok_or(LayoutError::MissingSlot(Slot::Photo))?;
    let image = find_image_fill(photo.node, photo.absolute).ok_or(LayoutError::MissingImage)?;
    let image_bytes = images
        .fetch(&image.image_hash)
        .await
        .map_err(LayoutError::ImageFetch)?;
    debug!(
        "Master photo image {} ({} bytes)",
        image.image_hash,
        image_bytes.len()
    );

    // Look every slot up before deciding, then report the first gap in lookup order.
    let located = Slot::REMAINING.map(|slot| find_by_name(root, origin, slot.layer_name()));
    let first_missing = Slot::REMAINING
        .iter()
        .zip(&located)
        .find_map(|(slot, found)| found.is_none().then_some(*slot));
    let [Some(logo), Some(headline), Some(subline), Some(disclaimer), Some(secondary_logo), Some(text_zone), Some(text_background), Some(bottom_bar)] =
        located
    else {
        return Err(LayoutError::MissingSlot(first_missing.unwrap_or(Slot::Logo)));
    };

    info!(
        "Master read: {}x{} at ({}, {})",
        root.width, root.height, origin.x, origin.y
    );

    Ok(MasterTemplate {
        name: root.name.clone(),
        frame_origin: origin,
        frame_size: root.size(),
        photo: ImageSlot {
            geometry: SlotGeometry::of(&photo),
            image_bytes,
            image_transform: image.image_transform,
        },
        text_background: fill(text_background),
        bottom_bar: fill(bottom_bar),
        logo: subtree(logo),
        headline: subtree(headline),
        subline: subtree(subline),
        disclaimer: subtree(disclaimer),
        secondary_logo: subtree(secondary_logo),
        text_zone: subtree(text_zone),
    })
}

fn subtree(found: Found<'_, Node>) -> SubtreeSlot {
    SubtreeSlot {
        geometry: SlotGeometry::of(&found),
        node: found.node.clone(),
    }
}

fn fill(found: Found<'_, Node>) -> FillSlot {
    FillSlot {
        geometry: SlotGeometry::of(&found),
        fills: found.node.fills().map(<[Paint]>::to_vec).unwrap_or_default(),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! A complete 1000×2000 master used across the layout tests.

    use crate::document::model::{
        FontName, ImageHash, NodeKind, Rgb, ScaleMode, ShapeStyle, TextContent, TextRun,
    };
    use crate::document::{Document, MemoryImageStore};

    use super::*;

    pub const PHOTO_BYTES: &[u8] = b"\x89PNG master photo";

    pub fn text_leaf(name: &str, chars: &str, fonts: &[(&str, usize)]) -> Node {
        let mut start = 0;
        let runs = fonts
            .iter()
            .map(|(family, len)| {
                let run = TextRun {
                    start,
                    end: start + len,
                    font: FontName::new(*family, "Regular"),
                    font_size: 40.0,
                };
                start += len;
                run
            })
            .collect();
        Node::new(
            name,
            Point::new(0.0, 0.0),
            Size::new(300.0, 50.0),
            NodeKind::Text(TextContent {
                characters: chars.to_string(),
                runs,
                fills: vec![Paint::solid(Rgb::WHITE)],
            }),
        )
    }

    pub fn group(name: &str, x: f64, y: f64, w: f64, h: f64, children: Vec<Node>) -> Node {
        Node::new(name, Point::new(x, y), Size::new(w, h), NodeKind::Group { children })
    }

    fn rect(name: &str, x: f64, y: f64, w: f64, h: f64, fills: Vec<Paint>) -> Node {
        Node::rectangle(name, Point::new(x, y), Size::new(w, h), ShapeStyle::filled(fills))
    }

    pub fn photo_slot(hash: &ImageHash) -> Node {
        Node::new(
            "photo",
            Point::new(0.0, 0.0),
            Size::new(600.0, 1800.0),
            NodeKind::Component {
                style: ShapeStyle::default(),
                children: vec![rect(
                    "image",
                    0.0,
                    0.0,
                    600.0,
                    1800.0,
                    vec![Paint::Image {
                        image_hash: hash.clone(),
                        scale_mode: ScaleMode::Fill,
                        image_transform: Some([[1.0, 0.0, 0.0], [0.0, 1.0, 0.1]]),
                    }],
                )],
            },
        )
    }

    /// Slots of the reference master, in page order, without `photo`.
    pub fn other_slots() -> Vec<Node> {
        let blue = Paint::solid(Rgb { r: 0.0, g: 0.2, b: 0.8 });
        vec![
            rect("text-bg", 600.0, 0.0, 400.0, 1800.0, vec![blue]),
            rect("bottom-bar", 0.0, 1800.0, 1000.0, 200.0, vec![Paint::solid(Rgb::WHITE)]),
            group("logo", 650.0, 50.0, 120.0, 60.0, vec![rect("mark", 10.0, 10.0, 100.0, 40.0, vec![])]),
            group(
                "text-zone",
                620.0,
                300.0,
                360.0,
                900.0,
                vec![
                    group("headline", 10.0, 0.0, 340.0, 200.0, vec![text_leaf("h", "Summer sale", &[("Inter", 6), ("Roboto", 5)])]),
                    group("subline", 10.0, 250.0, 340.0, 100.0, vec![text_leaf("s", "Up to 50%", &[("Inter", 9)])]),
                ],
            ),
            group("disclaimer", 620.0, 1700.0, 360.0, 60.0, vec![text_leaf("d", "Terms apply", &[("Inter", 11)])]),
            group("go-logo", 850.0, 1850.0, 100.0, 100.0, vec![rect("mark", 0.0, 0.0, 100.0, 100.0, vec![])]),
        ]
    }

    pub fn master_frame(hash: &ImageHash, origin: Point) -> Node {
        let mut frame = Node::frame("master", Size::new(1000.0, 2000.0), vec![Paint::solid(Rgb::WHITE)]);
        frame.set_position(origin);
        frame.append_child(photo_slot(hash));
        for slot in other_slots() {
            frame.append_child(slot);
        }
        frame
    }

    pub async fn master_document(origin: Point) -> (Document, MemoryImageStore) {
        let images = MemoryImageStore::new();
        let hash = images.register(Bytes::from_static(PHOTO_BYTES)).await;
        let frame = master_frame(&hash, origin);
        let mut document = Document::default();
        let id = document.append(frame);
        document.select(vec![id]);
        (document, images)
    }

    pub async fn master_template(origin: Point) -> (MasterTemplate, MemoryImageStore) {
        let (document, images) = master_document(origin).await;
        let master = read_master(document.selected(), &images).await.unwrap();
        (master, images)
    }
}
