//! Font resolution. Text content may only change once every font it uses is loaded.

use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::document::model::FontName;

#[derive(Debug, Error)]
pub enum FontError {
    #[error("Font '{0}' is not available")]
    Unavailable(FontName),
}

#[async_trait]
pub trait FontLoader: Send + Sync {
    async fn load(&self, font: &FontName) -> Result<(), FontError>;
}

/// The set of fonts installed for this service, configured as `Family:Style` entries.
#[derive(Debug, Clone, Default)]
pub struct FontLibrary {
    available: HashSet<FontName>,
}

impl FontLibrary {
    pub fn new(fonts: impl IntoIterator<Item = FontName>) -> Self {
        Self {
            available: fonts.into_iter().collect(),
        }
    }

    /// Parses entries like `Inter:Bold`. A bare family means its `Regular` style.
    pub fn from_specs<'a>(specs: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(specs.into_iter().filter_map(parse_font_spec))
    }

    pub fn len(&self) -> usize {
        self.available.len()
    }

    pub fn is_empty(&self) -> bool {
        self.available.is_empty()
    }
}

fn parse_font_spec(spec: &str) -> Option<FontName> {
    let spec = spec.trim();
    if spec.is_empty() {
        return None;
    }
    match spec.split_once(':') {
        Some((family, style)) => Some(FontName::new(family.trim(), style.trim())),
        None => Some(FontName::new(spec, "Regular")),
    }
}

#[async_trait]
impl FontLoader for FontLibrary {
    async fn load(&self, font: &FontName) -> Result<(), FontError> {
        if self.available.contains(font) {
            debug!("Font loaded: {font}");
            Ok(())
        } else {
            Err(FontError::Unavailable(font.clone()))
        }
    }
}
