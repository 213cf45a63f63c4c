use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::Config;
use crate::document::{FontLibrary, MemoryImageStore};
use crate::session::Session;
use crate::vision_client::VisionClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The one editing session. Only ever `try_lock`ed.
    pub session: Arc<Mutex<Session>>,
    pub images: Arc<MemoryImageStore>,
    pub fonts: Arc<FontLibrary>,
    pub vision: VisionClient,
    pub config: Config,
}

impl AppState {
    pub fn new(config: Config, vision: VisionClient) -> Self {
        let fonts = FontLibrary::from_specs(config.available_fonts.iter().map(String::as_str));
        Self {
            session: Arc::new(Mutex::new(Session::new(config.artboard_gap))),
            images: Arc::new(MemoryImageStore::new()),
            fonts: Arc::new(fonts),
            vision,
            config,
        }
    }
}
