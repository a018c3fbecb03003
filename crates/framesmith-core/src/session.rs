//! Editor session: one loaded image, its working raster and pending edits.
//!
//! The session wires the loader, [`TransformState`], the render pipeline and
//! the export encoder together. Mutators are total and synchronous; each
//! one re-renders the preview before returning.
//!
//! # Loads
//!
//! Loads are two-phase so decoding can happen elsewhere:
//!
//! ```ignore
//! let ticket = session.begin_load();
//! let result = decode::load(&bytes, max_size, filter); // anywhere, any time
//! session.finish_load(ticket, result)?;
//! ```
//!
//! Tickets carry an increasing generation. A result is only applied if no
//! newer ticket has already settled, successfully or not (last load wins);
//! older results arriving late are discarded as [`LoadOutcome::Stale`].
//! While any ticket is outstanding the session is busy and ignores edits.
//! A ticket whose decode will never be finished must be given back with
//! [`EditorSession::abandon_load`].
//!
//! # Exports
//!
//! Export borrows the session immutably, so it cannot be edited while an
//! export (or an export future) is alive.

use std::collections::BTreeSet;

use crate::config::EditorConfig;
use crate::decode::{self, DecodeError, SourceImage};
use crate::encode::{self, ExportBlob, ExportError};
use crate::pipeline;
use crate::raster::Raster;
use crate::state::{ResizeTarget, TransformState};
use crate::transform::CropRegion;

/// Handle for one outstanding load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What happened to a finished load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The image replaced the session's source.
    Applied,
    /// A newer load had already settled; the result was dropped.
    Stale,
}

/// Everything that exists only while an image is loaded.
#[derive(Debug, Clone)]
struct Loaded {
    source: SourceImage,
    working: Raster,
    state: TransformState,
    preview: Raster,
    preview_rotation: f64,
}

impl Loaded {
    fn new(source: SourceImage, aspect_lock: bool) -> Self {
        let working = source.raster().clone();
        let (width, height) = working.dimensions();
        Self {
            source,
            preview: working.clone(),
            working,
            state: TransformState::new(width, height, aspect_lock),
            preview_rotation: 0.0,
        }
    }

    /// Re-run the preview stage if its inputs changed.
    fn refresh(&mut self, config: &EditorConfig) {
        if self.preview_rotation == self.state.rotation()
            && self.preview.dimensions() == self.working.dimensions()
        {
            return;
        }
        self.preview = pipeline::render(&self.working, &self.state, config);
        self.preview_rotation = self.state.rotation();
    }

    /// Replace the working raster with the output of a destructive stage.
    fn replace_working(&mut self, raster: Raster, config: &EditorConfig) {
        let (width, height) = raster.dimensions();
        self.working = raster;
        self.state.rebase(width, height);
        self.preview = self.working.clone();
        self.preview_rotation = 0.0;
        self.refresh(config);
    }
}

/// An editing session over at most one image.
#[derive(Debug, Clone)]
pub struct EditorSession {
    config: EditorConfig,
    aspect_lock: bool,
    loaded: Option<Loaded>,
    issued_generation: u64,
    /// Newest generation that finished or was abandoned.
    settled_generation: u64,
    outstanding: BTreeSet<u64>,
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl EditorSession {
    /// Create an empty session.
    pub fn new(config: EditorConfig) -> Self {
        Self {
            aspect_lock: config.maintain_aspect_ratio,
            config,
            loaded: None,
            issued_generation: 0,
            settled_generation: 0,
            outstanding: BTreeSet::new(),
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Loading
    // ------------------------------------------------------------------

    /// Decode `bytes` and, on success, replace the current image.
    ///
    /// On failure the session is left exactly as it was.
    pub fn load(&mut self, bytes: &[u8]) -> Result<(), DecodeError> {
        let ticket = self.begin_load();
        let result = decode::load(bytes, self.config.max_image_size, self.config.resize_filter);
        self.finish_load(ticket, result).map(|_| ())
    }

    /// Install an already decoded source image.
    pub fn load_source(&mut self, source: SourceImage) {
        let ticket = self.begin_load();
        // A fresh ticket is always the newest, so this cannot be stale
        let _ = self.finish_load(ticket, Ok(source));
    }

    /// Start a load. The session is busy until this ticket is finished
    /// or abandoned.
    pub fn begin_load(&mut self) -> LoadTicket {
        self.issued_generation += 1;
        self.outstanding.insert(self.issued_generation);
        log::debug!("load {} started", self.issued_generation);
        LoadTicket {
            generation: self.issued_generation,
        }
    }

    /// Finish a load started with [`begin_load`](Self::begin_load).
    ///
    /// Results for tickets older than the newest settled load are discarded,
    /// whether they succeeded or failed. A failed current load is returned
    /// as an error and leaves the session unchanged.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<SourceImage, DecodeError>,
    ) -> Result<LoadOutcome, DecodeError> {
        if !self.settle(ticket) {
            log::warn!(
                "discarding stale load {} (load {} already settled)",
                ticket.generation,
                self.settled_generation
            );
            return Ok(LoadOutcome::Stale);
        }

        let source = result.inspect_err(|e| {
            log::warn!("load {} failed: {}", ticket.generation, e);
        })?;

        let (width, height) = source.dimensions();
        if source.was_downscaled() {
            log::info!(
                "load {} applied: {}x{} (capped from {}x{})",
                ticket.generation,
                width,
                height,
                source.intrinsic_width,
                source.intrinsic_height
            );
        } else {
            log::info!("load {} applied: {}x{}", ticket.generation, width, height);
        }

        self.loaded = Some(Loaded::new(source, self.aspect_lock));
        Ok(LoadOutcome::Applied)
    }

    /// Give up on a load that will never be finished.
    ///
    /// Counts as a failed load: the current image is kept and older loads
    /// still in flight become stale.
    pub fn abandon_load(&mut self, ticket: LoadTicket) {
        if self.settle(ticket) {
            log::debug!("load {} abandoned", ticket.generation);
        }
    }

    /// Whether any issued load is still outstanding.
    pub fn is_busy(&self) -> bool {
        !self.outstanding.is_empty()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn source(&self) -> Option<&SourceImage> {
        self.loaded.as_ref().map(|l| &l.source)
    }

    /// The current working raster, without the pending rotation.
    pub fn working(&self) -> Option<&Raster> {
        self.loaded.as_ref().map(|l| &l.working)
    }

    /// The working raster as currently rendered, rotation included.
    pub fn preview(&self) -> Option<&Raster> {
        self.loaded.as_ref().map(|l| &l.preview)
    }

    pub fn state(&self) -> Option<&TransformState> {
        self.loaded.as_ref().map(|l| &l.state)
    }

    /// Dimensions of the working raster, (0, 0) when nothing is loaded.
    pub fn dimensions(&self) -> (u32, u32) {
        self.working().map_or((0, 0), Raster::dimensions)
    }

    pub fn rotation(&self) -> f64 {
        self.state().map_or(0.0, TransformState::rotation)
    }

    pub fn crop(&self) -> CropRegion {
        self.state().map_or_else(CropRegion::default, TransformState::crop)
    }

    pub fn resize_target(&self) -> ResizeTarget {
        self.state().map_or(
            ResizeTarget {
                width: 0,
                height: 0,
                aspect_lock: self.aspect_lock,
            },
            TransformState::resize_target,
        )
    }

    pub fn aspect_lock(&self) -> bool {
        self.aspect_lock
    }

    // ------------------------------------------------------------------
    // Mutators
    // ------------------------------------------------------------------

    pub fn set_rotation(&mut self, angle: f64) {
        self.edit("set_rotation", |state| state.set_rotation(angle));
    }

    pub fn set_crop_origin(&mut self, x: i64, y: i64) {
        self.edit("set_crop_origin", |state| state.set_crop_origin(x, y));
    }

    pub fn set_crop_size(&mut self, width: i64, height: i64) {
        self.edit("set_crop_size", |state| state.set_crop_size(width, height));
    }

    pub fn set_crop_region(&mut self, x: i64, y: i64, width: i64, height: i64) {
        self.edit("set_crop_region", |state| {
            state.set_crop_region(x, y, width, height)
        });
    }

    pub fn set_resize_target(&mut self, width: Option<u32>, height: Option<u32>) {
        self.edit("set_resize_target", |state| {
            state.set_resize_target(width, height)
        });
    }

    /// Toggle aspect lock. The flag survives loading another image.
    pub fn set_aspect_lock(&mut self, aspect_lock: bool) {
        if self.ignore_while_busy("set_aspect_lock") {
            return;
        }
        self.aspect_lock = aspect_lock;
        if let Some(loaded) = &mut self.loaded {
            loaded.state.set_aspect_lock(aspect_lock);
        }
    }

    /// Reset the crop region to the full working raster.
    pub fn reset_crop(&mut self) {
        self.edit("reset_crop", TransformState::reset_crop);
    }

    /// Crop the rendered raster to the crop region, baking in rotation.
    ///
    /// Returns whether the working raster was replaced. An empty crop
    /// region is ignored.
    pub fn apply_crop(&mut self) -> bool {
        self.bake("apply_crop", pipeline::bake_crop)
    }

    /// Resample the rendered raster to the resize target, baking in
    /// rotation. Returns whether the working raster was replaced.
    pub fn apply_resize(&mut self) -> bool {
        self.bake("apply_resize", pipeline::bake_resize)
    }

    /// Discard every edit: working raster back to the source image,
    /// rotation 0, crop and resize target covering the full extent.
    pub fn reset(&mut self) {
        if self.ignore_while_busy("reset") {
            return;
        }
        let config = &self.config;
        if let Some(loaded) = &mut self.loaded {
            let source = loaded.source.raster().clone();
            loaded.replace_working(source, config);
            log::debug!("reset to {:?}", loaded.working.dimensions());
        }
    }

    // ------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------

    /// The raster export would encode: the working raster with the
    /// pending rotation baked in.
    pub fn export_raster(&self) -> Result<Raster, ExportError> {
        let loaded = self.loaded.as_ref().ok_or(ExportError::NoImage)?;
        Ok(pipeline::render(&loaded.working, &loaded.state, &self.config))
    }

    /// Encode the current image in the configured export format.
    pub fn export(&self) -> Result<ExportBlob, ExportError> {
        let raster = self.export_raster()?;
        let blob = encode::encode(&raster, self.config.export_format)?;
        log::info!(
            "exported {}x{} {} ({} bytes)",
            blob.width,
            blob.height,
            blob.mime_type(),
            blob.len()
        );
        Ok(blob)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Mark `ticket` as settled. Returns false if it was already settled
    /// or a newer ticket settled first.
    fn settle(&mut self, ticket: LoadTicket) -> bool {
        let was_outstanding = self.outstanding.remove(&ticket.generation);
        let current = was_outstanding && ticket.generation > self.settled_generation;
        self.settled_generation = self.settled_generation.max(ticket.generation);
        current
    }

    fn ignore_while_busy(&self, op: &str) -> bool {
        if self.is_busy() {
            log::warn!("ignoring {} while a load is outstanding", op);
            return true;
        }
        false
    }

    fn edit(&mut self, op: &str, f: impl FnOnce(&mut TransformState)) {
        if self.ignore_while_busy(op) {
            return;
        }
        let config = &self.config;
        if let Some(loaded) = &mut self.loaded {
            f(&mut loaded.state);
            loaded.refresh(config);
        }
    }

    fn bake(
        &mut self,
        op: &str,
        stage: fn(
            &Raster,
            &TransformState,
            &EditorConfig,
        ) -> Result<Raster, pipeline::PipelineError>,
    ) -> bool {
        if self.ignore_while_busy(op) {
            return false;
        }
        let config = &self.config;
        let Some(loaded) = &mut self.loaded else {
            return false;
        };

        match stage(&loaded.working, &loaded.state, config) {
            Ok(raster) => {
                log::debug!(
                    "{}: {:?} -> {:?}",
                    op,
                    loaded.working.dimensions(),
                    raster.dimensions()
                );
                loaded.replace_working(raster, config);
                true
            }
            Err(e) => {
                log::warn!("{} skipped: {}", op, e);
                false
            }
        }
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::raster::test_support::position_raster;
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Edit {
        Rotate(f64),
        Crop(i64, i64, i64, i64),
        Resize(u32, u32),
    }

    fn edit_strategy() -> impl Strategy<Value = Edit> {
        prop_oneof![
            (-720.0f64..720.0).prop_map(Edit::Rotate),
            (-10i64..60, -10i64..60, -10i64..60, -10i64..60)
                .prop_map(|(x, y, w, h)| Edit::Crop(x, y, w, h)),
            (1u32..40, 1u32..40).prop_map(|(w, h)| Edit::Resize(w, h)),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Property: reset restores the source after any edit sequence.
        #[test]
        fn prop_reset_restores_source(
            (width, height) in (1u32..=40, 1u32..=40),
            edits in prop::collection::vec(edit_strategy(), 0..6),
        ) {
            let source = position_raster(width, height);
            let mut session = EditorSession::default();
            session.load_source(SourceImage::from_raster(source.clone()));
            session.set_aspect_lock(false);

            for edit in edits {
                match edit {
                    Edit::Rotate(angle) => session.set_rotation(angle),
                    Edit::Crop(x, y, w, h) => {
                        session.set_crop_region(x, y, w, h);
                        session.apply_crop();
                    }
                    Edit::Resize(w, h) => {
                        session.set_resize_target(Some(w), Some(h));
                        session.apply_resize();
                    }
                }
                let (w, h) = session.dimensions();
                prop_assert!(w >= 1 && h >= 1);
                prop_assert!(session.crop().fits_within(w, h));
            }

            session.reset();
            prop_assert_eq!(session.working(), Some(&source));
            prop_assert_eq!(session.rotation(), 0.0);
        }
    }
}
