//! The exported `Cropper` class.
//!
//! # Example
//!
//! ```typescript
//! import init, { Cropper, touchCentroid } from '@pinchcrop/wasm';
//!
//! await init();
//! const cropper = new Cropper(container, 'photo.jpg', { aspectRatio: 1 }, (ready) => {
//!   console.log(ready.getCropRectangle());
//!   document.body.append(ready.crop(512, 'width'));
//! });
//!
//! // touch pinch and pan work out of the box; other recognizers can drive
//! // the view directly
//! recognizer.on('pinch', (e) => cropper.pinch(e.scale, e.center.x, e.center.y));
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use js_sys::Function;
use pinchcrop_core::{
    centroid, CropMode, Cropper, CropperConfig, CropperError, GestureEvent, GestureResponse,
    InstanceRegistry, Point, ReadyCallback,
};
use wasm_bindgen::prelude::*;
use web_sys::{HtmlCanvasElement, HtmlElement};

use crate::dispatch::Dispatcher;
use crate::host::{SharedCropper, WebHost};

/// Marks a container so a second cropper on it can find the first.
const CONTAINER_KEY_ATTRIBUTE: &str = "data-pinchcrop-key";

thread_local! {
    static REGISTRY: RefCell<InstanceRegistry<String, SharedCropper>> =
        RefCell::new(InstanceRegistry::new());
    static NEXT_CONTAINER_KEY: Cell<u64> = const { Cell::new(1) };
}

/// Interactive cropper bound to one container element.
///
/// Creating a cropper on a container that already has one destroys the
/// previous instance.
#[wasm_bindgen(js_name = Cropper)]
pub struct JsCropper {
    inner: SharedCropper,
    dispatcher: Dispatcher,
    key: String,
    instance_id: u64,
}

#[wasm_bindgen(js_class = Cropper)]
impl JsCropper {
    /// Create a cropper and start loading `src`.
    ///
    /// `options` is a plain object with camelCase keys (`aspectRatio`,
    /// `containRatio`, `circle`, `modalOpacity`, `borderColor`,
    /// `borderWidth`, `borderOrigin`, `responsive`, `restore`, `width`,
    /// `height`). `onReady` runs before any callback registered later and,
    /// like every ready callback, receives the cropper as its argument.
    ///
    /// # Errors
    ///
    /// Throws if the options are invalid or the page has no document.
    #[wasm_bindgen(constructor)]
    pub fn new(
        container: HtmlElement,
        src: String,
        options: JsValue,
        on_ready: Option<Function>,
    ) -> Result<JsCropper, JsValue> {
        let config: CropperConfig = if options.is_undefined() || options.is_null() {
            CropperConfig::default()
        } else {
            serde_wasm_bindgen::from_value(options)?
        };

        let key = container_key(&container);
        let dispatcher = Dispatcher::new();
        let host = WebHost::new(container, dispatcher.clone()).map_err(to_js)?;
        let cropper = Cropper::new(host, config).map_err(to_js)?;
        let instance_id = cropper.instance_id();

        let inner = Rc::new(RefCell::new(cropper));
        inner.borrow_mut().host_mut().bind(&inner);

        let displaced = REGISTRY.with(|registry| {
            registry
                .borrow_mut()
                .claim(key.clone(), instance_id, Rc::clone(&inner))
        });
        drop(displaced);

        let cropper = JsCropper {
            inner,
            dispatcher,
            key,
            instance_id,
        };
        let callback = on_ready.map(|f| cropper.ready_callback(f));
        cropper
            .inner
            .borrow_mut()
            .set_source(src, callback)
            .map_err(to_js)?;
        Ok(cropper)
    }

    /// Swap the image. `callback` runs once the new image is shown.
    #[wasm_bindgen(js_name = setSource)]
    pub fn set_source(&self, src: String, callback: Option<Function>) -> Result<(), JsValue> {
        let callback = callback.map(|f| self.ready_callback(f));
        self.with_cropper(|cropper| cropper.set_source(src, callback).map(|_| ()))
    }

    /// Run `callback` once ready, or right away if already ready.
    #[wasm_bindgen(js_name = onReady)]
    pub fn on_ready(&self, callback: Function) -> Result<(), JsValue> {
        let callback = self.ready_callback(callback);
        self.with_cropper(|cropper| {
            cropper.on_ready(callback);
            Ok(())
        })
    }

    /// Run `callback(message)` whenever the current image fails to load.
    #[wasm_bindgen(js_name = onLoadError)]
    pub fn on_load_error(&self, callback: Function) -> Result<(), JsValue> {
        let listener = self.dispatcher.load_error_listener(callback);
        self.with_cropper(|cropper| {
            cropper.on_load_error(listener);
            Ok(())
        })
    }

    /// Re-measure the container. With `reset`, recenter the image.
    pub fn resize(&self, reset: Option<bool>) -> Result<(), JsValue> {
        self.with_cropper(|cropper| cropper.resize(reset.unwrap_or(false)))
    }

    /// `{ x, y, width, height }` of the crop region in natural image pixels.
    #[wasm_bindgen(js_name = getCropRectangle)]
    pub fn get_crop_rectangle(&self) -> Result<JsValue, JsValue> {
        let rect = self.with_cropper(|cropper| cropper.get_crop_rectangle())?;
        Ok(serde_wasm_bindgen::to_value(&rect)?)
    }

    /// Render the crop region into a new canvas.
    ///
    /// `mode` is `ratio` (default), `naturalRatio`, `width` or `height`;
    /// `value` defaults to 1.
    pub fn crop(&self, value: Option<f64>, mode: Option<String>) -> Result<HtmlCanvasElement, JsValue> {
        let mode = parse_mode(mode.as_deref()).map_err(to_js)?;
        let value = crop_value(value);
        let surface = self.with_cropper(|cropper| cropper.crop(value, mode))?;
        Ok(surface.into_canvas())
    }

    #[wasm_bindgen(getter, js_name = isReady)]
    pub fn is_ready(&self) -> bool {
        self.inner
            .try_borrow()
            .map(|cropper| cropper.is_ready())
            .unwrap_or(false)
    }

    /// Remove the canvas and every listener. Further calls throw.
    pub fn destroy(&self) {
        match self.inner.try_borrow_mut() {
            Ok(mut cropper) => cropper.destroy(),
            Err(_) => tracing::warn!(instance_id = self.instance_id, "destroy while busy"),
        }
        let released = REGISTRY.with(|registry| {
            registry
                .borrow_mut()
                .release(&self.key, self.instance_id)
        });
        drop(released);
    }

    /// A multi-touch gesture began around `(x, y)` in container pixels.
    #[wasm_bindgen(js_name = gestureStart)]
    pub fn gesture_start(&self, x: f64, y: f64) -> bool {
        self.gesture(GestureEvent::Start {
            centroid: Point::new(x, y),
        })
    }

    /// Pinch progress; `scale` is relative to the gesture start. Returns
    /// whether the browser default should be prevented.
    pub fn pinch(&self, scale: f64, x: f64, y: f64) -> bool {
        self.gesture(GestureEvent::Pinch {
            scale,
            centroid: Point::new(x, y),
        })
    }

    /// Drag by `(dx, dy)` container pixels. Returns whether the browser
    /// default should be prevented.
    pub fn pan(&self, dx: f64, dy: f64) -> bool {
        self.gesture(GestureEvent::Pan { dx, dy })
    }

    #[wasm_bindgen(js_name = gestureEnd)]
    pub fn gesture_end(&self) -> bool {
        self.gesture(GestureEvent::End)
    }
}

impl JsCropper {
    /// Ready callback that receives this cropper. Holds the instance weakly
    /// so a queued callback does not keep a destroyed cropper alive.
    fn ready_callback(&self, callback: Function) -> ReadyCallback<WebHost> {
        let inner = Rc::downgrade(&self.inner);
        let dispatcher = self.dispatcher.clone();
        let key = self.key.clone();
        let instance_id = self.instance_id;
        self.dispatcher.ready_callback(callback, move || match inner.upgrade() {
            Some(inner) => JsValue::from(JsCropper {
                inner,
                dispatcher,
                key,
                instance_id,
            }),
            None => JsValue::UNDEFINED,
        })
    }

    fn with_cropper<T>(
        &self,
        f: impl FnOnce(&mut Cropper<WebHost>) -> Result<T, CropperError>,
    ) -> Result<T, JsValue> {
        let result = match self.inner.try_borrow_mut() {
            Ok(mut cropper) => f(&mut *cropper),
            Err(_) => Err(CropperError::Platform("cropper is busy".to_string())),
        };
        self.dispatcher.flush();
        result.map_err(to_js)
    }

    fn gesture(&self, event: GestureEvent) -> bool {
        let response = match self.inner.try_borrow_mut() {
            Ok(mut cropper) => cropper.handle_gesture(event),
            Err(_) => GestureResponse::default(),
        };
        self.dispatcher.flush();
        response.prevent_default
    }
}

/// Center of gravity of `[{ x, y }, ...]` touch points, or `null` when empty.
#[wasm_bindgen(js_name = touchCentroid)]
pub fn touch_centroid(points: JsValue) -> Result<JsValue, JsValue> {
    let points: Vec<Point> = serde_wasm_bindgen::from_value(points)?;
    Ok(serde_wasm_bindgen::to_value(&centroid(&points))?)
}

fn to_js(error: CropperError) -> JsValue {
    JsValue::from_str(&error.to_string())
}

fn container_key(container: &HtmlElement) -> String {
    if let Some(key) = container.get_attribute(CONTAINER_KEY_ATTRIBUTE) {
        return key;
    }
    let key = next_container_key();
    if let Err(error) = container.set_attribute(CONTAINER_KEY_ATTRIBUTE, &key) {
        tracing::warn!(?error, "failed to tag container");
    }
    key
}

fn next_container_key() -> String {
    NEXT_CONTAINER_KEY.with(|next| {
        let key = next.get();
        next.set(key + 1);
        format!("pinchcrop-{key}")
    })
}

fn parse_mode(mode: Option<&str>) -> Result<CropMode, CropperError> {
    mode.map_or(Ok(CropMode::default()), str::parse)
}

fn crop_value(value: Option<f64>) -> f64 {
    value.unwrap_or(1.0)
}
