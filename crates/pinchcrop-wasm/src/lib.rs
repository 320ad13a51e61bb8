//! Pinchcrop WASM - WebAssembly bindings for the pinchcrop cropper
//!
//! This crate wires pinchcrop-core to the browser: a `<canvas>` drawing
//! surface, a DOM host that loads images, recognizes touch gestures and
//! listens for window resizes, and the exported `Cropper` class. Logs go to
//! the browser console.
//!
//! # Module Structure
//!
//! - `canvas` - 2D-context implementation of the core `Surface` trait
//! - `host` - DOM implementation of the core `Host` trait, touch listeners
//! - `dispatch` - Deferred JS callbacks, run outside the cropper borrow
//! - `cropper` - The exported `Cropper` class and `touchCentroid`
//!
//! # Usage
//!
//! ```typescript
//! import init, { Cropper } from '@pinchcrop/wasm';
//!
//! // instantiate the module before creating croppers
//! await init();
//!
//! const cropper = new Cropper(container, 'photo.jpg', { circle: true });
//! cropper.onReady(() => document.body.append(cropper.crop(2)));
//! ```

use tracing_subscriber::layer::SubscriberExt;
use wasm_bindgen::prelude::*;

mod canvas;
mod cropper;
mod dispatch;
mod host;

pub use canvas::CanvasSurface;
pub use cropper::{touch_centroid, JsCropper};
pub use host::WebHost;

/// Runs once when the module is instantiated: routes panics and `tracing`
/// events to the browser console.
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();

    let layer = tracing_wasm::WASMLayer::new(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(tracing::Level::INFO)
            .set_report_logs_in_timings(false)
            .build(),
    );
    let subscriber = tracing_subscriber::registry().with(layer);
    if let Err(error) = tracing::subscriber::set_global_default(subscriber) {
        // another crate in this module installed one first
        web_sys::console::warn_1(&error.to_string().into());
    }
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "pinchcrop loaded");
}

/// Package version, for bug reports.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
