//! Text Injector — swaps the copy of a cloned slot once its fonts are loaded.

use futures::future::join_all;
use tracing::debug;

use crate::document::model::{Node, Point};
use crate::document::search::{find_text_leaf, node_at_path_mut};
use crate::document::FontLoader;
use crate::layout::LayoutError;

/// Replaces the characters of the first text leaf under `subtree` with `value`.
///
/// Returns `Ok(false)` when the subtree has no text leaf. Every distinct font of
/// the leaf is loaded first; the loads run concurrently and all of them settle
/// before anything is decided. If any font fails, the text is left untouched.
pub async fn inject_text(
    subtree: &mut Node,
    value: &str,
    fonts: &dyn FontLoader,
) -> Result<bool, LayoutError> {
    let Some(found) = find_text_leaf(&*subtree, Point::ORIGIN) else {
        return Ok(false);
    };
    let required = found
        .node
        .text()
        .map(|text| text.distinct_fonts())
        .unwrap_or_default();
    let path = found.path;

    let results = join_all(required.iter().map(|font| fonts.load(font))).await;
    if let Some(err) = results.into_iter().find_map(Result::err) {
        return Err(LayoutError::FontLoad(err));
    }
    debug!("Loaded {} font(s) for '{}'", required.len(), subtree.name);

    let text = node_at_path_mut(subtree, &path)
        .and_then(Node::text_mut)
        .ok_or(LayoutError::InvalidMaster("text leaf vanished during injection".to_string()))?;
    text.replace_characters(value);
    Ok(true)
}
