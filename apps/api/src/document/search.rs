//! Tree search — iterative pre-order, first-match traversal over scene nodes.
//!
//! Traversal visits a node before its children and children left-to-right as
//! stored. The first node satisfying the predicate wins; nothing after it is
//! visited. Every match carries the node's absolute position and its index
//! path from the root, so callers can re-resolve it mutably with
//! [`node_at_path_mut`].

use crate::document::model::{
    ImageHash, Node, NodeType, Paint, Point, TextContent, Transform2D,
};

/// Read-only capabilities the search utilities need from a tree node.
pub trait SceneNode: Sized {
    fn node_type(&self) -> NodeType;
    fn name(&self) -> &str;
    /// Position relative to the parent.
    fn position(&self) -> Point;
    fn children(&self) -> Option<&[Self]>;
    fn fills(&self) -> Option<&[Paint]>;
    fn text(&self) -> Option<&TextContent>;
}

impl SceneNode for Node {
    fn node_type(&self) -> NodeType {
        Node::node_type(self)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn position(&self) -> Point {
        Node::position(self)
    }

    fn children(&self) -> Option<&[Self]> {
        Node::children(self)
    }

    fn fills(&self) -> Option<&[Paint]> {
        Node::fills(self)
    }

    fn text(&self) -> Option<&TextContent> {
        Node::text(self)
    }
}

/// A search hit.
#[derive(Debug)]
pub struct Found<'a, N> {
    pub node: &'a N,
    /// Absolute position of the matched node.
    pub absolute: Point,
    /// Child indices leading from the search root to the match (empty for the root).
    pub path: Vec<usize>,
}

/// First image-filled rectangle of a subtree.
#[derive(Debug)]
pub struct ImageFillMatch<'a, N> {
    pub found: Found<'a, N>,
    pub image_hash: ImageHash,
    pub image_transform: Option<Transform2D>,
}

/// Generic pre-order search. `root_absolute` is the absolute position of `root`.
pub fn find<'a, N, P>(root: &'a N, root_absolute: Point, mut predicate: P) -> Option<Found<'a, N>>
where
    N: SceneNode,
    P: FnMut(&N) -> bool,
{
    let mut stack: Vec<(&'a N, Point, Vec<usize>)> = vec![(root, root_absolute, Vec::new())];

    while let Some((node, absolute, path)) = stack.pop() {
        if predicate(node) {
            return Some(Found {
                node,
                absolute,
                path,
            });
        }
        if let Some(children) = node.children() {
            // Reverse push so the leftmost child is popped first.
            for (index, child) in children.iter().enumerate().rev() {
                let mut child_path = path.clone();
                child_path.push(index);
                stack.push((child, absolute.offset(child.position()), child_path));
            }
        }
    }

    None
}

/// First node whose name equals `name` exactly (case-sensitive).
pub fn find_by_name<'a, N: SceneNode>(
    root: &'a N,
    root_absolute: Point,
    name: &str,
) -> Option<Found<'a, N>> {
    find(root, root_absolute, |node| node.name() == name)
}

/// First text-bearing leaf.
pub fn find_text_leaf<'a, N: SceneNode>(root: &'a N, root_absolute: Point) -> Option<Found<'a, N>> {
    find(root, root_absolute, |node| node.text().is_some())
}

/// First rectangle carrying an image paint, with that paint's hash and transform.
pub fn find_image_fill<'a, N: SceneNode>(
    root: &'a N,
    root_absolute: Point,
) -> Option<ImageFillMatch<'a, N>> {
    let found = find(root, root_absolute, |node| {
        node.node_type() == NodeType::Rectangle && first_image_paint(node).is_some()
    })?;
    let (image_hash, image_transform) = first_image_paint(found.node)?;
    Some(ImageFillMatch {
        found,
        image_hash,
        image_transform,
    })
}

fn first_image_paint<N: SceneNode>(node: &N) -> Option<(ImageHash, Option<Transform2D>)> {
    node.fills()?.iter().find_map(|paint| match paint {
        Paint::Image {
            image_hash,
            image_transform,
            ..
        } => Some((image_hash.clone(), *image_transform)),
        Paint::Solid { .. } | Paint::GradientLinear { .. } => None,
    })
}

/// Text content of the first text leaf, or an empty string.
pub fn first_text<N: SceneNode>(root: &N) -> String {
    find_text_leaf(root, Point::ORIGIN)
        .and_then(|found| found.node.text())
        .map(|text| text.characters.clone())
        .unwrap_or_default()
}

/// Resolves an index path produced by [`find`] for mutation.
pub fn node_at_path_mut<'a>(root: &'a mut Node, path: &[usize]) -> Option<&'a mut Node> {
    let mut current = root;
    for &index in path {
        current = current.children_mut()?.get_mut(index)?;
    }
    Some(current)
}
