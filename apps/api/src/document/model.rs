//! Scene node model — the in-memory stand-in for the host editor's document tree.
//!
//! Positions are relative to the parent node. Top-level nodes of a [`Document`]
//! carry page coordinates, so their `x`/`y` are absolute.
//!
//! [`Document`]: crate::document::Document

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ────────────────────────────────────────────────────────────────────────────
// Geometry primitives
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, other: Point) -> Point {
        Point::new(self.x + other.x, self.y + other.y)
    }

    pub fn relative_to(self, origin: Point) -> Point {
        Point::new(self.x - origin.x, self.y - origin.y)
    }

    pub fn scaled(self, factor: f64) -> Point {
        Point::new(self.x * factor, self.y * factor)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn scaled(self, factor: f64) -> Size {
        Size::new(self.width * factor, self.height * factor)
    }
}

/// 2×3 affine matrix, row-major: `[[a, c, tx], [b, d, ty]]`.
pub type Transform2D = [[f64; 3]; 2];

// ────────────────────────────────────────────────────────────────────────────
// Paints
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb { r: 1.0, g: 1.0, b: 1.0 };
    pub const BLACK: Rgb = Rgb { r: 0.0, g: 0.0, b: 0.0 };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub position: f64,
    pub color: Rgb,
    #[serde(default = "full_opacity")]
    pub opacity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScaleMode {
    /// Cover the node, cropping whatever overflows.
    #[default]
    Fill,
    Fit,
    Crop,
    Tile,
}

/// Content-addressed handle of an image registered in the image store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageHash(pub String);

impl std::fmt::Display for ImageHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Paint {
    Solid {
        color: Rgb,
        #[serde(default = "full_opacity")]
        opacity: f64,
    },
    GradientLinear {
        stops: Vec<ColorStop>,
        #[serde(default = "identity_transform")]
        transform: Transform2D,
    },
    Image {
        image_hash: ImageHash,
        #[serde(default)]
        scale_mode: ScaleMode,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image_transform: Option<Transform2D>,
    },
}

impl Paint {
    pub fn solid(color: Rgb) -> Self {
        Paint::Solid {
            color,
            opacity: 1.0,
        }
    }
}

fn full_opacity() -> f64 {
    1.0
}

fn identity_transform() -> Transform2D {
    [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrokeAlign {
    Inside,
    #[default]
    Center,
    Outside,
}

/// Stroke and corner attributes shared by shape-like nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapeStyle {
    #[serde(default)]
    pub fills: Vec<Paint>,
    #[serde(default)]
    pub strokes: Vec<Paint>,
    #[serde(default)]
    pub stroke_weight: f64,
    #[serde(default)]
    pub stroke_align: StrokeAlign,
    #[serde(default)]
    pub corner_radius: f64,
}

impl ShapeStyle {
    pub fn filled(fills: Vec<Paint>) -> Self {
        Self {
            fills,
            ..Self::default()
        }
    }

    fn rescale(&mut self, factor: f64) {
        self.stroke_weight *= factor;
        self.corner_radius *= factor;
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Text
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FontName {
    pub family: String,
    pub style: String,
}

impl FontName {
    pub fn new(family: impl Into<String>, style: impl Into<String>) -> Self {
        Self {
            family: family.into(),
            style: style.into(),
        }
    }
}

impl std::fmt::Display for FontName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.family, self.style)
    }
}

/// A styled character range `[start, end)` of a text node, in `char` offsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub start: usize,
    pub end: usize,
    pub font: FontName,
    pub font_size: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub characters: String,
    #[serde(default)]
    pub runs: Vec<TextRun>,
    #[serde(default)]
    pub fills: Vec<Paint>,
}

impl TextContent {
    /// Distinct fonts used across the whole character range, in order of first use.
    pub fn distinct_fonts(&self) -> Vec<FontName> {
        let mut fonts: Vec<FontName> = Vec::new();
        for run in &self.runs {
            if !fonts.contains(&run.font) {
                fonts.push(run.font.clone());
            }
        }
        fonts
    }

    /// Replaces the characters; existing runs collapse into one run carrying the
    /// first run's font and size.
    pub fn replace_characters(&mut self, value: &str) {
        let len = value.chars().count();
        let first = self.runs.first().cloned();
        self.characters = value.to_string();
        self.runs = match first {
            Some(run) => vec![TextRun {
                start: 0,
                end: len,
                ..run
            }],
            None => Vec::new(),
        };
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Nodes
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub Uuid);

impl NodeId {
    pub fn new() -> Self {
        NodeId(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Discriminant of [`NodeKind`], used where only the node type matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Frame,
    Group,
    Component,
    Instance,
    Rectangle,
    Ellipse,
    Vector,
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    Frame {
        #[serde(flatten)]
        style: ShapeStyle,
        #[serde(default)]
        children: Vec<Node>,
    },
    Group {
        #[serde(default)]
        children: Vec<Node>,
    },
    Component {
        #[serde(flatten)]
        style: ShapeStyle,
        #[serde(default)]
        children: Vec<Node>,
    },
    Instance {
        #[serde(flatten)]
        style: ShapeStyle,
        #[serde(default)]
        children: Vec<Node>,
    },
    Rectangle {
        #[serde(flatten)]
        style: ShapeStyle,
    },
    Ellipse {
        #[serde(flatten)]
        style: ShapeStyle,
    },
    Vector {
        #[serde(flatten)]
        style: ShapeStyle,
    },
    Text(TextContent),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub id: NodeId,
    pub name: String,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl Node {
    pub fn new(name: impl Into<String>, position: Point, size: Size, kind: NodeKind) -> Self {
        Self {
            id: NodeId::new(),
            name: name.into(),
            x: position.x,
            y: position.y,
            width: size.width,
            height: size.height,
            kind,
        }
    }

    pub fn frame(name: impl Into<String>, size: Size, fills: Vec<Paint>) -> Self {
        Self::new(
            name,
            Point::ORIGIN,
            size,
            NodeKind::Frame {
                style: ShapeStyle::filled(fills),
                children: Vec::new(),
            },
        )
    }

    pub fn rectangle(name: impl Into<String>, position: Point, size: Size, style: ShapeStyle) -> Self {
        Self::new(name, position, size, NodeKind::Rectangle { style })
    }

    pub fn node_type(&self) -> NodeType {
        match &self.kind {
            NodeKind::Frame { .. } => NodeType::Frame,
            NodeKind::Group { .. } => NodeType::Group,
            NodeKind::Component { .. } => NodeType::Component,
            NodeKind::Instance { .. } => NodeType::Instance,
            NodeKind::Rectangle { .. } => NodeType::Rectangle,
            NodeKind::Ellipse { .. } => NodeType::Ellipse,
            NodeKind::Vector { .. } => NodeType::Vector,
            NodeKind::Text(_) => NodeType::Text,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn set_position(&mut self, position: Point) {
        self.x = position.x;
        self.y = position.y;
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Child list, `None` for leaf node types.
    pub fn children(&self) -> Option<&[Node]> {
        match &self.kind {
            NodeKind::Frame { children, .. }
            | NodeKind::Group { children }
            | NodeKind::Component { children, .. }
            | NodeKind::Instance { children, .. } => Some(children),
            NodeKind::Rectangle { .. }
            | NodeKind::Ellipse { .. }
            | NodeKind::Vector { .. }
            | NodeKind::Text(_) => None,
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Node>> {
        match &mut self.kind {
            NodeKind::Frame { children, .. }
            | NodeKind::Group { children }
            | NodeKind::Component { children, .. }
            | NodeKind::Instance { children, .. } => Some(children),
            NodeKind::Rectangle { .. }
            | NodeKind::Ellipse { .. }
            | NodeKind::Vector { .. }
            | NodeKind::Text(_) => None,
        }
    }

    /// Fill list, `None` for node types that cannot carry fills (groups).
    pub fn fills(&self) -> Option<&[Paint]> {
        match &self.kind {
            NodeKind::Frame { style, .. }
            | NodeKind::Component { style, .. }
            | NodeKind::Instance { style, .. }
            | NodeKind::Rectangle { style }
            | NodeKind::Ellipse { style }
            | NodeKind::Vector { style } => Some(&style.fills),
            NodeKind::Text(text) => Some(&text.fills),
            NodeKind::Group { .. } => None,
        }
    }

    #[cfg(test)]
    pub fn style(&self) -> Option<&ShapeStyle> {
        match &self.kind {
            NodeKind::Frame { style, .. }
            | NodeKind::Component { style, .. }
            | NodeKind::Instance { style, .. }
            | NodeKind::Rectangle { style }
            | NodeKind::Ellipse { style }
            | NodeKind::Vector { style } => Some(style),
            NodeKind::Group { .. } | NodeKind::Text(_) => None,
        }
    }

    pub fn text(&self) -> Option<&TextContent> {
        match &self.kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn text_mut(&mut self) -> Option<&mut TextContent> {
        match &mut self.kind {
            NodeKind::Text(text) => Some(text),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn append_child(&mut self, child: Node) -> bool {
        match self.children_mut() {
            Some(children) => {
                children.push(child);
                true
            }
            None => false,
        }
    }

    /// Deep copy of the subtree with fresh ids on every node.
    pub fn duplicate(&self) -> Node {
        let mut copy = self.clone();
        let mut stack: Vec<&mut Node> = vec![&mut copy];
        while let Some(node) = stack.pop() {
            node.id = NodeId::new();
            if let Some(children) = node.children_mut() {
                stack.extend(children.iter_mut());
            }
        }
        copy
    }

    /// Uniformly scales the subtree by `factor`.
    ///
    /// The node keeps its own position; its size, every descendant's position and
    /// size, stroke weights, corner radii and font sizes are multiplied.
    pub fn rescale(&mut self, factor: f64) {
        self.width *= factor;
        self.height *= factor;
        let mut stack: Vec<&mut Node> = Vec::new();
        rescale_attributes(&mut self.kind, factor);
        if let Some(children) = self.children_mut() {
            stack.extend(children.iter_mut());
        }
        while let Some(node) = stack.pop() {
            node.x *= factor;
            node.y *= factor;
            node.width *= factor;
            node.height *= factor;
            rescale_attributes(&mut node.kind, factor);
            if let Some(children) = node.children_mut() {
                stack.extend(children.iter_mut());
            }
        }
    }
}

fn rescale_attributes(kind: &mut NodeKind, factor: f64) {
    match kind {
        NodeKind::Frame { style, .. }
        | NodeKind::Component { style, .. }
        | NodeKind::Instance { style, .. }
        | NodeKind::Rectangle { style }
        | NodeKind::Ellipse { style }
        | NodeKind::Vector { style } => style.rescale(factor),
        NodeKind::Text(text) => {
            for run in &mut text.runs {
                run.font_size *= factor;
            }
        }
        NodeKind::Group { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_node(name: &str, chars: &str, runs: Vec<TextRun>) -> Node {
        Node::new(
            name,
            Point::new(5.0, 10.0),
            Size::new(100.0, 20.0),
            NodeKind::Text(TextContent {
                characters: chars.to_string(),
                runs,
                fills: vec![],
            }),
        )
    }

    fn run(start: usize, end: usize, family: &str, size: f64) -> TextRun {
        TextRun {
            start,
            end,
            font: FontName::new(family, "Regular"),
            font_size: size,
        }
    }

    #[test]
    fn test_node_deserializes_from_tagged_json() {
        let json = r#"{
            "name": "logo",
            "type": "GROUP",
            "x": 10, "y": 20, "width": 50, "height": 30,
            "children": [
                {"name": "mark", "type": "RECTANGLE", "width": 50, "height": 30,
                 "fills": [{"type": "SOLID", "color": {"r": 1, "g": 0, "b": 0}}]}
            ]
        }"#;
        let node: Node = serde_json::from_str(json).unwrap();
        assert_eq!(node.node_type(), NodeType::Group);
        let children = node.children().unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].node_type(), NodeType::Rectangle);
        assert_eq!(
            children[0].fills().unwrap(),
            &[Paint::solid(Rgb { r: 1.0, g: 0.0, b: 0.0 })]
        );
    }

    #[test]
    fn test_rescale_keeps_own_position_and_scales_descendants() {
        let child = Node::rectangle(
            "bar",
            Point::new(10.0, 4.0),
            Size::new(20.0, 8.0),
            ShapeStyle {
                stroke_weight: 1.5,
                corner_radius: 2.0,
                ..ShapeStyle::default()
            },
        );
        let label = text_node("label", "Hi", vec![run(0, 2, "Inter", 12.0)]);
        let mut group = Node::new(
            "logo",
            Point::new(100.0, 200.0),
            Size::new(40.0, 30.0),
            NodeKind::Group {
                children: vec![child, label],
            },
        );

        group.rescale(2.0);

        assert_eq!(group.position(), Point::new(100.0, 200.0));
        assert_eq!(group.size(), Size::new(80.0, 60.0));
        let children = group.children().unwrap();
        assert_eq!(children[0].position(), Point::new(20.0, 8.0));
        assert_eq!(children[0].size(), Size::new(40.0, 16.0));
        let style = children[0].style().unwrap();
        assert_eq!(style.stroke_weight, 3.0);
        assert_eq!(style.corner_radius, 4.0);
        assert_eq!(children[1].position(), Point::new(10.0, 20.0));
        assert_eq!(children[1].text().unwrap().runs[0].font_size, 24.0);
    }

    #[test]
    fn test_duplicate_assigns_fresh_ids() {
        let leaf = text_node("t", "a", vec![]);
        let leaf_id = leaf.id;
        let group = Node::new(
            "g",
            Point::ORIGIN,
            Size::new(1.0, 1.0),
            NodeKind::Group {
                children: vec![leaf],
            },
        );
        let copy = group.duplicate();
        assert_ne!(copy.id, group.id);
        assert_ne!(copy.children().unwrap()[0].id, leaf_id);
        assert_eq!(copy.children().unwrap()[0].name, "t");
    }

    #[test]
    fn test_distinct_fonts_in_first_use_order() {
        let content = TextContent {
            characters: "Big sale now".to_string(),
            runs: vec![
                run(0, 3, "Inter", 12.0),
                run(3, 8, "Roboto", 12.0),
                run(8, 12, "Inter", 12.0),
            ],
            fills: vec![],
        };
        let fonts = content.distinct_fonts();
        assert_eq!(
            fonts,
            vec![FontName::new("Inter", "Regular"), FontName::new("Roboto", "Regular")]
        );
    }

    #[test]
    fn test_replace_characters_collapses_runs() {
        let mut content = TextContent {
            characters: "ab".to_string(),
            runs: vec![run(0, 1, "Inter", 14.0), run(1, 2, "Roboto", 10.0)],
            fills: vec![],
        };
        content.replace_characters("Привет");
        assert_eq!(content.characters, "Привет");
        assert_eq!(content.runs, vec![run(0, 6, "Inter", 14.0)]);
    }
}
