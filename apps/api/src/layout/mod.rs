// Layout reconstruction: master snapshot → proportionally rebuilt artboard.
// Pure geometry plus two suspension points (image fetch, font loading);
// everything else is synchronous and total.

pub mod engine;
pub mod master;
pub mod text;
pub mod units;

use thiserror::Error;

use crate::document::{FontError, ImageStoreError};

pub use engine::{generate_artboard, LayoutContext, ZonePlan};
pub use master::{read_master, MasterTemplate, Slot};

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Select the \"master\" frame first")]
    NotAMaster,

    #[error("Layer \"{0}\" was not found in the master")]
    MissingSlot(Slot),

    #[error("No image was found inside \"photo\"")]
    MissingImage,

    #[error("Could not read the master image: {0}")]
    ImageFetch(#[source] ImageStoreError),

    #[error("Could not load fonts: {0}")]
    FontLoad(#[source] FontError),

    #[error("Invalid master: {0}")]
    InvalidMaster(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
