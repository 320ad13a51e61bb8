//! Deferred JavaScript callbacks.
//!
//! JS callbacks may call straight back into the cropper, so they never run
//! while the cropper is borrowed. Core callbacks only queue calls here; the
//! binding flushes the queue once the borrow is released.

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Function;
use pinchcrop_core::{Host, LoadErrorListener, ReadyCallback};
use wasm_bindgen::JsValue;

struct Deferred {
    callback: Function,
    argument: Option<JsValue>,
}

/// Shared queue of JS calls waiting for the cropper borrow to end.
#[derive(Clone, Default)]
pub struct Dispatcher {
    queue: Rc<RefCell<Vec<Deferred>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn defer(&self, callback: Function, argument: Option<JsValue>) {
        self.queue.borrow_mut().push(Deferred { callback, argument });
    }

    /// Wrap a JS ready callback for the core's ready queue. It is called
    /// with whatever `instance` returns once the cropper is ready.
    pub fn ready_callback<H: Host>(
        &self,
        callback: Function,
        instance: impl FnOnce() -> JsValue + 'static,
    ) -> ReadyCallback<H> {
        let dispatcher = self.clone();
        Box::new(move |_| dispatcher.defer(callback, Some(instance())))
    }

    /// Wrap a JS error listener; it receives the error message.
    pub fn load_error_listener(&self, callback: Function) -> LoadErrorListener {
        let dispatcher = self.clone();
        Box::new(move |error| {
            dispatcher.defer(callback.clone(), Some(JsValue::from_str(&error.to_string())))
        })
    }

    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Run queued calls in order, including any queued while flushing.
    pub fn flush(&self) {
        loop {
            let batch = std::mem::take(&mut *self.queue.borrow_mut());
            if batch.is_empty() {
                return;
            }
            for call in batch {
                let result = match &call.argument {
                    Some(argument) => call.callback.call1(&JsValue::NULL, argument),
                    None => call.callback.call0(&JsValue::NULL),
                };
                if let Err(error) = result {
                    tracing::warn!(?error, "cropper callback threw");
                }
            }
        }
    }
}
