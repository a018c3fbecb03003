//! WASM bindings for the editor session.
//!
//! One `JsEditorSession` backs one editor view. Every setter applies the
//! clamping rules synchronously and re-renders the preview, so the view can
//! read the clamped values straight back and redraw.
//!
//! # Example
//!
//! ```typescript
//! const session = new JsEditorSession({ maxImageSize: 1000 });
//! session.load(new Uint8Array(await file.arrayBuffer()));
//!
//! session.set_rotation(45);
//! session.set_crop_region(100, 100, 400, 300);
//! session.apply_crop();
//!
//! session.set_resize_target(200, undefined);
//! session.apply_resize();
//!
//! const blob = new Blob([session.export()], { type: session.export_mime_type() });
//! ```

use framesmith_core::{EditorConfig, EditorSession};
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::types::JsRaster;

/// Snapshot of the editable values, for binding to form inputs.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct StateSnapshot {
    loaded: bool,
    width: u32,
    height: u32,
    rotation: f64,
    crop_x: u32,
    crop_y: u32,
    crop_width: u32,
    crop_height: u32,
    resize_width: u32,
    resize_height: u32,
    maintain_aspect_ratio: bool,
}

/// Convert any displayable error into a JavaScript `Error`.
fn js_error(e: impl std::fmt::Display) -> JsValue {
    js_sys::Error::new(&e.to_string()).into()
}

/// Convert a JavaScript number into a pixel coordinate.
///
/// Fractions are truncated toward zero, the way canvas dimensions are.
/// NaN becomes 0.
fn to_coordinate(value: f64) -> i64 {
    if value.is_nan() {
        return 0;
    }
    value.trunc().clamp(i64::MIN as f64, i64::MAX as f64) as i64
}

/// An editing session exposed to JavaScript.
#[wasm_bindgen]
pub struct JsEditorSession {
    inner: EditorSession,
}

#[wasm_bindgen]
impl JsEditorSession {
    /// Create a session. `config` may be `undefined` or a partial
    /// `EditorConfig` object; missing fields take their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<JsEditorSession, JsValue> {
        let config = if config.is_undefined() || config.is_null() {
            EditorConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(js_error)?
        };
        Ok(Self::from_config(config))
    }

    /// Decode file bytes and replace the current image.
    ///
    /// On error the current image and edits are kept.
    pub fn load(&mut self, bytes: &[u8]) -> Result<(), JsValue> {
        self.inner.load(bytes).map_err(js_error)
    }

    /// Whether an image is loaded
    #[wasm_bindgen(getter)]
    pub fn loaded(&self) -> bool {
        self.inner.is_loaded()
    }

    /// Working raster width
    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.inner.dimensions().0
    }

    /// Working raster height
    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.inner.dimensions().1
    }

    /// Rotation in degrees, in [0, 360)
    #[wasm_bindgen(getter)]
    pub fn rotation(&self) -> f64 {
        self.inner.rotation()
    }

    pub fn set_rotation(&mut self, angle: f64) {
        self.inner.set_rotation(angle);
    }

    pub fn set_crop_origin(&mut self, x: f64, y: f64) {
        self.inner.set_crop_origin(to_coordinate(x), to_coordinate(y));
    }

    pub fn set_crop_size(&mut self, width: f64, height: f64) {
        self.inner
            .set_crop_size(to_coordinate(width), to_coordinate(height));
    }

    pub fn set_crop_region(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.inner.set_crop_region(
            to_coordinate(x),
            to_coordinate(y),
            to_coordinate(width),
            to_coordinate(height),
        );
    }

    /// Set the resize target; pass `undefined` for a dimension to derive it
    /// (aspect lock on) or keep it (aspect lock off).
    pub fn set_resize_target(&mut self, width: Option<u32>, height: Option<u32>) {
        self.inner.set_resize_target(width, height);
    }

    pub fn set_aspect_lock(&mut self, aspect_lock: bool) {
        self.inner.set_aspect_lock(aspect_lock);
    }

    /// Crop to the crop region. Returns false if nothing changed.
    pub fn apply_crop(&mut self) -> bool {
        self.inner.apply_crop()
    }

    /// Resize to the resize target. Returns false if nothing changed.
    pub fn apply_resize(&mut self) -> bool {
        self.inner.apply_resize()
    }

    pub fn reset(&mut self) {
        self.inner.reset();
    }

    pub fn reset_crop(&mut self) {
        self.inner.reset_crop();
    }

    /// The rendered view (rotation applied), or `undefined` when empty.
    pub fn preview(&self) -> Option<JsRaster> {
        self.inner.preview().map(JsRaster::from_raster)
    }

    /// All editable values as a plain object.
    pub fn state(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.snapshot()).map_err(js_error)
    }

    /// Encode the current image (rotation baked in).
    pub fn export(&self) -> Result<Vec<u8>, JsValue> {
        self.inner
            .export()
            .map(|blob| blob.bytes)
            .map_err(js_error)
    }

    /// MIME type of the bytes `export` produces.
    pub fn export_mime_type(&self) -> String {
        self.inner.config().export_format.mime_type().to_string()
    }
}

impl JsEditorSession {
    pub(crate) fn from_config(config: EditorConfig) -> Self {
        Self {
            inner: EditorSession::new(config),
        }
    }

    fn snapshot(&self) -> StateSnapshot {
        let (width, height) = self.inner.dimensions();
        let crop = self.inner.crop();
        let resize = self.inner.resize_target();
        StateSnapshot {
            loaded: self.inner.is_loaded(),
            width,
            height,
            rotation: self.inner.rotation(),
            crop_x: crop.x,
            crop_y: crop.y,
            crop_width: crop.width,
            crop_height: crop.height,
            resize_width: resize.width,
            resize_height: resize.height,
            maintain_aspect_ratio: self.inner.aspect_lock(),
        }
    }
}
