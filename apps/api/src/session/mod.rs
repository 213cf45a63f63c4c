//! Session Controller — owns the working document and the active master snapshot.
//!
//! # Lifecycle
//! `READ_MASTER` replaces the snapshot, `GENERATE` requires one, `CLOSE` drops
//! both the snapshot and the document. Commands are serialized by the caller:
//! the session sits behind a mutex that is only ever `try_lock`ed, so a second
//! command arriving while one is in flight is refused rather than queued.

pub mod handlers;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::document::model::{NodeId, Point};
use crate::document::search::find_image_fill;
use crate::document::{Document, ImageStore};
use crate::errors::AppError;
use crate::layout::{generate_artboard, read_master, LayoutContext, MasterTemplate, ZonePlan};
use crate::models::ad::{AdSpecification, LayoutPlacement, TextOverrides};

// ────────────────────────────────────────────────────────────────────────────
// Command protocol
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Command {
    ReadMaster,
    Generate {
        specs: AdSpecification,
        layout: LayoutPlacement,
        #[serde(default)]
        text: Option<TextOverrides>,
    },
    ReadTtImage,
    Close,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MasterSummary {
    pub headline_text: String,
    pub subline_text: String,
    pub disclaimer_text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandResponse {
    MasterLoaded { data: MasterSummary },
    Generated { name: String, zones: ZonePlan },
    TtImageData { image_bytes: String },
    Closed,
}

// ────────────────────────────────────────────────────────────────────────────
// Session
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct Session {
    document: Document,
    master: Option<MasterTemplate>,
    /// Horizontal distance between the master and a generated artboard.
    artboard_gap: f64,
}

impl Session {
    pub fn new(artboard_gap: f64) -> Self {
        Self {
            artboard_gap,
            ..Self::default()
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    #[cfg(test)]
    pub fn has_master(&self) -> bool {
        self.master.is_some()
    }

    /// Replaces the working document. An already-read master stays usable.
    pub fn load_document(&mut self, document: Document) {
        info!(
            "Loaded document with {} top-level node(s), {} selected",
            document.nodes.len(),
            document.selection.len()
        );
        self.document = document;
    }

    pub fn select(&mut self, ids: Vec<NodeId>) -> Result<(), AppError> {
        if let Some(missing) = ids.iter().find(|id| self.document.get(**id).is_none()) {
            return Err(AppError::NotFound(format!("Node {missing} does not exist")));
        }
        self.document.select(ids);
        Ok(())
    }

    pub async fn read_master(&mut self, images: &dyn ImageStore) -> Result<MasterSummary, AppError> {
        let master = read_master(self.document.selected(), images).await?;
        debug!(
            "Master '{}': text-zone at {:?}, photo transform {:?}",
            master.name, master.text_zone.geometry.position, master.photo.image_transform
        );
        let summary = MasterSummary {
            headline_text: master.headline.text(),
            subline_text: master.subline.text(),
            disclaimer_text: master.disclaimer.text(),
        };
        self.master = Some(master);
        Ok(summary)
    }

    /// Generates an artboard, places it to the right of the master and selects it.
    pub async fn generate(
        &mut self,
        specs: &AdSpecification,
        layout: &LayoutPlacement,
        text: &TextOverrides,
        ctx: &LayoutContext<'_>,
    ) -> Result<(String, ZonePlan), AppError> {
        let master = self
            .master
            .as_ref()
            .ok_or_else(|| AppError::Validation("Load the master first".to_string()))?;

        let artboard = generate_artboard(master, specs, layout, text, ctx).await?;
        let mut frame = artboard.frame;
        frame.set_position(Point::new(
            master.frame_origin.x + master.frame_size.width + self.artboard_gap,
            master.frame_origin.y,
        ));
        let name = frame.name.clone();

        let id = self.document.append(frame);
        self.document.select(vec![id]);
        info!(
            "Placed artboard '{name}' ({id}) from '{}' at scale {:.4}",
            master.name, artboard.uniform_scale
        );
        Ok((name, artboard.zones))
    }

    /// Bytes of the first image fill inside the current selection.
    pub async fn read_selected_image(&self, images: &dyn ImageStore) -> Result<Vec<u8>, AppError> {
        let selected = self.document.selected().ok_or_else(|| {
            AppError::Validation("Select the specification image first".to_string())
        })?;
        let image = find_image_fill(selected.node, selected.absolute).ok_or_else(|| {
            AppError::Validation("The selected layer contains no image".to_string())
        })?;
        debug!("Reading image {} from '{}'", image.image_hash, image.found.node.name);
        let bytes = images.fetch(&image.image_hash).await.map_err(|e| {
            warn!("Selected image could not be resolved: {e}");
            AppError::NotFound(e.to_string())
        })?;
        Ok(bytes.to_vec())
    }

    /// Drops the master, the document and every image registered for it.
    pub async fn close(&mut self, images: &dyn ImageStore) {
        self.document = Document::default();
        self.master = None;
        let dropped = images.clear().await;
        info!("Session closed ({dropped} image(s) released)");
    }

    /// Runs one protocol command against the session.
    pub async fn execute(
        &mut self,
        command: Command,
        ctx: &LayoutContext<'_>,
    ) -> Result<CommandResponse, AppError> {
        match command {
            Command::ReadMaster => {
                let data = self.read_master(ctx.images).await?;
                Ok(CommandResponse::MasterLoaded { data })
            }
            Command::Generate {
                specs,
                layout,
                text,
            } => {
                let text = text.unwrap_or_default();
                let (name, zones) = self.generate(&specs, &layout, &text, ctx).await?;
                Ok(CommandResponse::Generated { name, zones })
            }
            Command::ReadTtImage => {
                let bytes = self.read_selected_image(ctx.images).await?;
                Ok(CommandResponse::TtImageData {
                    image_bytes: STANDARD.encode(bytes),
                })
            }
            Command::Close => {
                self.close(ctx.images).await;
                Ok(CommandResponse::Closed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use serde_json::json;

    use super::*;
    use crate::document::model::{ImageHash, Node, Paint, ScaleMode, ShapeStyle, Size};
    use crate::document::images::hash_image;
    use crate::document::search::first_text;
    use crate::document::{FontLibrary, MemoryImageStore};
    use crate::layout::master::fixtures::{master_document, PHOTO_BYTES};
    use crate::layout::LayoutError;

    fn generate_command(text: Option<serde_json::Value>) -> Command {
        let mut value = json!({
            "type": "GENERATE",
            "specs": {"name": "BLB", "total_width_cm": 150, "total_height_cm": 300, "dpi": 150},
            "layout": {"photo_zone": "left", "text_zone": "right", "photo_x": 0.5,
                       "photo_y": 0.5, "photo_scale": 1.0, "split_ratio": 0.6}
        });
        if let Some(text) = text {
            value["text"] = text;
        }
        serde_json::from_value(value).unwrap()
    }

    async fn session_with_master(origin: Point) -> (Session, MemoryImageStore) {
        let (document, images) = master_document(origin).await;
        let mut session = Session::new(100.0);
        session.load_document(document);
        (session, images)
    }

    #[test]
    fn test_command_tags_follow_protocol_names() {
        let command: Command = serde_json::from_value(json!({"type": "READ_TT_IMAGE"})).unwrap();
        assert!(matches!(command, Command::ReadTtImage));

        let response = serde_json::to_value(CommandResponse::TtImageData {
            image_bytes: "AAE=".to_string(),
        })
        .unwrap();
        assert_eq!(response, json!({"type": "TT_IMAGE_DATA", "image_bytes": "AAE="}));
        assert_eq!(
            serde_json::to_value(CommandResponse::Closed).unwrap(),
            json!({"type": "CLOSED"})
        );
    }

    #[test]
    fn test_generate_command_validates_payload() {
        let result = serde_json::from_value::<Command>(json!({
            "type": "GENERATE",
            "specs": {"total_width_cm": 150, "total_height_cm": 300, "dpi": -1},
            "layout": {"photo_zone": "left", "text_zone": "right", "photo_x": 0.5,
                       "photo_y": 0.5, "photo_scale": 1.0, "split_ratio": 0.6}
        }));
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_generate_before_read_master_is_refused() {
        let (mut session, images) = session_with_master(Point::ORIGIN).await;
        let fonts = FontLibrary::default();
        let ctx = LayoutContext { images: &images, fonts: &fonts };

        let err = session.execute(generate_command(None), &ctx).await.unwrap_err();

        assert!(matches!(&err, AppError::Validation(msg) if msg == "Load the master first"));
        assert_eq!(session.document().nodes.len(), 1);
    }

    #[tokio::test]
    async fn test_read_master_reports_slot_texts() {
        let (mut session, images) = session_with_master(Point::ORIGIN).await;
        let fonts = FontLibrary::default();
        let ctx = LayoutContext { images: &images, fonts: &fonts };

        let response = session.execute(Command::ReadMaster, &ctx).await.unwrap();

        let CommandResponse::MasterLoaded { data } = response else {
            panic!("expected MASTER_LOADED");
        };
        assert_eq!(
            data,
            MasterSummary {
                headline_text: "Summer sale".to_string(),
                subline_text: "Up to 50%".to_string(),
                disclaimer_text: "Terms apply".to_string(),
            }
        );
        assert!(session.has_master());
    }

    #[tokio::test]
    async fn test_read_master_ignores_selection_beyond_the_first_entry() {
        let (mut document, images) = master_document(Point::ORIGIN).await;
        let mut selection = vec![NodeId::new()];
        selection.extend(document.selection.iter().copied());
        document.selection = selection;
        let mut session = Session::new(100.0);
        session.load_document(document);
        let fonts = FontLibrary::default();
        let ctx = LayoutContext { images: &images, fonts: &fonts };

        let err = session.execute(Command::ReadMaster, &ctx).await.unwrap_err();

        assert!(matches!(err, AppError::Layout(LayoutError::NotAMaster)));
        assert!(!session.has_master());
    }

    #[tokio::test]
    async fn test_generate_places_artboard_right_of_master_and_selects_it() {
        let (mut session, images) = session_with_master(Point::new(300.0, 40.0)).await;
        let fonts = FontLibrary::default();
        let ctx = LayoutContext { images: &images, fonts: &fonts };
        session.execute(Command::ReadMaster, &ctx).await.unwrap();

        let response = session.execute(generate_command(None), &ctx).await.unwrap();

        let CommandResponse::Generated { name, zones } = response else {
            panic!("expected GENERATED");
        };
        assert_eq!(name, "BLB");
        assert!((zones.split_ratio - 0.6).abs() < 1e-9);

        let document = session.document();
        assert_eq!(document.nodes.len(), 2);
        let selected = document.selected().unwrap();
        assert_eq!(selected.node.name, "BLB");
        assert_eq!(selected.node.position(), Point::new(300.0 + 1000.0 + 100.0, 40.0));
        assert_eq!(selected.node.size(), Size::new(8858.0, 17717.0));
    }

    #[tokio::test]
    async fn test_generate_applies_text_overrides() {
        let (mut session, images) = session_with_master(Point::ORIGIN).await;
        let fonts = FontLibrary::from_specs(["Inter", "Roboto:Regular"]);
        let ctx = LayoutContext { images: &images, fonts: &fonts };
        session.execute(Command::ReadMaster, &ctx).await.unwrap();

        let command = generate_command(Some(json!({"headline": "Winter deals"})));
        session.execute(command, &ctx).await.unwrap();

        let artboard = session.document().selected().unwrap().node;
        let headline = artboard
            .children()
            .unwrap()
            .iter()
            .find(|node| node.name == "headline")
            .unwrap();
        assert_eq!(first_text(headline), "Winter deals");
    }

    #[tokio::test]
    async fn test_master_survives_document_edits() {
        let (mut session, images) = session_with_master(Point::ORIGIN).await;
        let fonts = FontLibrary::default();
        let ctx = LayoutContext { images: &images, fonts: &fonts };
        session.execute(Command::ReadMaster, &ctx).await.unwrap();

        session.load_document(Document::default());
        let response = session.execute(generate_command(None), &ctx).await.unwrap();

        assert!(matches!(response, CommandResponse::Generated { .. }));
        assert_eq!(session.document().nodes.len(), 1);
    }

    #[tokio::test]
    async fn test_read_tt_image_returns_base64_bytes() {
        let images = MemoryImageStore::new();
        let hash = images.register(Bytes::from_static(PHOTO_BYTES)).await;
        let sheet = Node::rectangle(
            "tt",
            Point::ORIGIN,
            Size::new(100.0, 100.0),
            ShapeStyle::filled(vec![Paint::Image {
                image_hash: hash,
                scale_mode: ScaleMode::Fit,
                image_transform: None,
            }]),
        );
        let mut document = Document::default();
        let id = document.append(sheet);
        document.select(vec![id]);
        let mut session = Session::new(100.0);
        session.load_document(document);
        let fonts = FontLibrary::default();
        let ctx = LayoutContext { images: &images, fonts: &fonts };

        let response = session.execute(Command::ReadTtImage, &ctx).await.unwrap();

        let CommandResponse::TtImageData { image_bytes } = response else {
            panic!("expected TT_IMAGE_DATA");
        };
        assert_eq!(STANDARD.decode(image_bytes).unwrap(), PHOTO_BYTES);
    }

    #[tokio::test]
    async fn test_read_tt_image_errors() {
        let images = MemoryImageStore::new();
        let mut session = Session::new(100.0);

        let err = session.read_selected_image(&images).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let blank = Node::rectangle("blank", Point::ORIGIN, Size::new(1.0, 1.0), ShapeStyle::default());
        let orphan = Node::rectangle(
            "orphan",
            Point::ORIGIN,
            Size::new(1.0, 1.0),
            ShapeStyle::filled(vec![Paint::Image {
                image_hash: ImageHash("unknown".to_string()),
                scale_mode: ScaleMode::Fill,
                image_transform: None,
            }]),
        );
        let mut document = Document::default();
        let blank_id = document.append(blank);
        let orphan_id = document.append(orphan);
        session.load_document(document);

        session.select(vec![blank_id]).unwrap();
        let err = session.read_selected_image(&images).await.unwrap_err();
        assert!(matches!(&err, AppError::Validation(msg) if msg.contains("no image")));

        session.select(vec![orphan_id]).unwrap();
        let err = session.read_selected_image(&images).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_select_rejects_unknown_ids() {
        let mut session = Session::new(100.0);
        let err = session.select(vec![NodeId::new()]).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_close_drops_master_document_and_images() {
        let (mut session, images) = session_with_master(Point::ORIGIN).await;
        let fonts = FontLibrary::default();
        let ctx = LayoutContext { images: &images, fonts: &fonts };
        session.execute(Command::ReadMaster, &ctx).await.unwrap();

        let response = session.execute(Command::Close, &ctx).await.unwrap();

        assert!(matches!(response, CommandResponse::Closed));
        assert!(!session.has_master());
        assert!(session.document().nodes.is_empty());
        assert!(images.fetch(&hash_image(PHOTO_BYTES)).await.is_err());
    }
}
