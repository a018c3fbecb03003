//! Framesmith Core - bitmap transform pipeline
//!
//! This crate provides the editing core for Framesmith: loading a bitmap,
//! previewing a rotation, baking crops and resizes into a working raster,
//! and exporting the result as an encoded blob.
//!
//! # Pipeline
//!
//! ```text
//! bytes --load--> SourceImage --> working raster --render--> preview
//!                                      ^    |
//!                                      |    +--crop / resize--> new working raster
//!                                      +--reset
//! working raster + rotation --export--> ExportBlob --> Uploader
//! ```
//!
//! Rotation is a preview transform: it is recomputed from the working
//! raster on every render and only becomes permanent when a crop, resize
//! or export bakes it in.

pub mod collab;
pub mod config;
pub mod decode;
pub mod encode;
pub mod pipeline;
pub mod raster;
pub mod session;
pub mod state;
pub mod transform;

#[cfg(feature = "tokio")]
pub mod background;

pub use collab::{
    hydrate, publish, CollaboratorError, Dimensions, HydrateError, ImageRecord, MetadataSource,
    PublishError, SourceFetcher, Uploader,
};
pub use config::EditorConfig;
pub use decode::{DecodeError, SourceImage};
pub use encode::{ExportBlob, ExportError, ExportFormat};
pub use raster::Raster;
pub use session::{EditorSession, LoadOutcome, LoadTicket};
pub use state::{normalize_angle, ResizeTarget, TransformState};
pub use transform::{apply_crop, apply_rotation, CropRegion, InterpolationFilter};

#[cfg(feature = "tokio")]
pub use background::{decode_in_background, PendingLoad};
