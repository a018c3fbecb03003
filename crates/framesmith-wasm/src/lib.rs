//! Framesmith WASM - WebAssembly bindings for Framesmith
//!
//! This crate exposes the framesmith-core editing session to
//! JavaScript/TypeScript applications.
//!
//! # Module Structure
//!
//! - `session` - The editing session (load, rotate, crop, resize, export)
//! - `types` - WASM-compatible wrapper types for raster data
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsEditorSession } from '@framesmith/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const session = new JsEditorSession(undefined);
//! session.load(new Uint8Array(await file.arrayBuffer()));
//! console.log(`Loaded ${session.width}x${session.height}`);
//! ```

use wasm_bindgen::prelude::*;

mod session;
mod types;

// Re-export public types
pub use session::JsEditorSession;
pub use types::JsRaster;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    log::debug!("framesmith-wasm {} initialized", version());
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
