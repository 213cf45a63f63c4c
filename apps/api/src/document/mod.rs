// Host document boundary: scene tree, tree search, image store, font library.
// The layout engine only talks to the host through these types.

pub mod fonts;
pub mod images;
pub mod model;
pub mod search;

use serde::{Deserialize, Serialize};

pub use fonts::{FontError, FontLibrary, FontLoader};
pub use images::{ImageStore, ImageStoreError, MemoryImageStore};
use model::{Node, NodeId};

use crate::document::search::{find, Found};

/// A page of top-level nodes plus the current selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub selection: Vec<NodeId>,
}

impl Document {
    /// Looks a node up anywhere in the page by id.
    pub fn get(&self, id: NodeId) -> Option<Found<'_, Node>> {
        self.nodes
            .iter()
            .find_map(|root| find(root, root.position(), |node| node.id == id))
    }

    /// The first entry of the selection, if it still exists in the page.
    /// Later entries are never consulted.
    pub fn selected(&self) -> Option<Found<'_, Node>> {
        self.selection.first().and_then(|id| self.get(*id))
    }

    pub fn append(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.nodes.push(node);
        id
    }

    pub fn select(&mut self, ids: Vec<NodeId>) {
        self.selection = ids;
    }
}
