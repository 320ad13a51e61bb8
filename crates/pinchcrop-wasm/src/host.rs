//! DOM-backed host: container measurement, canvas mounting, image loading,
//! touch gestures and window resize subscription.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use gloo::events::{EventListener, EventListenerOptions, EventListenerPhase};
use pinchcrop_core::{
    ContainerFrame, Cropper, CropperError, GestureEvent, GestureResponse, Host, ImageAsset,
    LoadError, LoadRequest, Point, Size, TouchTracker,
};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys::{Document, Event, HtmlElement, HtmlImageElement, TouchEvent, TouchList, Window};

use crate::canvas::CanvasSurface;
use crate::dispatch::Dispatcher;

pub type SharedCropper = Rc<RefCell<Cropper<WebHost>>>;

/// Handlers for one in-flight image load.
struct ImageLoad {
    image: HtmlImageElement,
    _onload: Closure<dyn FnMut()>,
    _onerror: Closure<dyn FnMut()>,
}

impl ImageLoad {
    fn detach(&self) {
        self.image.set_onload(None);
        self.image.set_onerror(None);
    }
}

pub struct WebHost {
    window: Window,
    document: Document,
    container: HtmlElement,
    dispatcher: Dispatcher,
    cropper: Weak<RefCell<Cropper<WebHost>>>,
    current_load: Option<ImageLoad>,
    // kept one load longer: its handler may still be on the stack
    retired_load: Option<ImageLoad>,
    onresize: Option<EventListener>,
    gesture_target: Option<HtmlElement>,
    gesture_listeners: Vec<EventListener>,
}

impl WebHost {
    pub fn new(container: HtmlElement, dispatcher: Dispatcher) -> Result<Self, CropperError> {
        let window = web_sys::window()
            .ok_or_else(|| CropperError::Platform("no global window".to_string()))?;
        let document = window
            .document()
            .ok_or_else(|| CropperError::Platform("window has no document".to_string()))?;
        Ok(Self {
            window,
            document,
            container,
            dispatcher,
            cropper: Weak::new(),
            current_load: None,
            retired_load: None,
            onresize: None,
            gesture_target: None,
            gesture_listeners: Vec::new(),
        })
    }

    /// Point DOM callbacks at the cropper that owns this host.
    pub fn bind(&mut self, cropper: &SharedCropper) {
        self.cropper = Rc::downgrade(cropper);
    }

    pub fn container(&self) -> &HtmlElement {
        &self.container
    }

    /// Stop listening to the current load without dropping its handlers.
    fn retire_load(&mut self) {
        if let Some(load) = self.current_load.take() {
            load.detach();
            self.retired_load = Some(load);
        }
    }
}

impl Drop for WebHost {
    fn drop(&mut self) {
        if let Some(load) = &self.current_load {
            load.detach();
        }
    }
}

impl Host for WebHost {
    type Surface = CanvasSurface;

    fn container_frame(&self) -> ContainerFrame {
        Size::new(
            self.container.client_width() as f64,
            self.container.client_height() as f64,
        )
    }

    fn create_surface(&mut self, width: u32, height: u32) -> Result<CanvasSurface, CropperError> {
        CanvasSurface::create(&self.document, width, height)
    }

    fn mount(&mut self, surface: &CanvasSurface) {
        let canvas = surface.canvas();
        let style = canvas.style();
        for (property, value) in [("position", "absolute"), ("left", "0"), ("top", "0")] {
            if let Err(error) = style.set_property(property, value) {
                tracing::warn!(property, ?error, "failed to style canvas");
            }
        }
        if let Err(error) = self.container.append_child(canvas) {
            tracing::warn!(?error, "failed to mount canvas");
        }
    }

    fn unmount(&mut self, surface: &CanvasSurface) {
        surface.canvas().remove();
        self.retire_load();
    }

    fn load_image(&mut self, request: LoadRequest) {
        self.retire_load();

        let image = match HtmlImageElement::new() {
            Ok(image) => image,
            Err(error) => {
                tracing::warn!(?error, "failed to create image element");
                return;
            }
        };
        if request.cross_origin {
            image.set_cross_origin(Some("anonymous"));
        }

        let ticket = request.ticket;
        let onload = {
            let cropper = self.cropper.clone();
            let dispatcher = self.dispatcher.clone();
            let image = image.clone();
            Closure::wrap(Box::new(move || {
                let asset = ImageAsset::new(image.natural_width(), image.natural_height(), image.clone());
                dispatch_event(&cropper, &dispatcher, |c| c.on_image_loaded(ticket, asset));
            }) as Box<dyn FnMut()>)
        };
        let onerror = {
            let cropper = self.cropper.clone();
            let dispatcher = self.dispatcher.clone();
            let src = request.src.clone();
            Closure::wrap(Box::new(move || {
                let error = LoadError::Failed {
                    src: src.clone(),
                    reason: "image element reported an error".to_string(),
                };
                dispatch_event(&cropper, &dispatcher, |c| {
                    c.on_image_failed(ticket, error);
                    Ok(())
                });
            }) as Box<dyn FnMut()>)
        };

        image.set_onload(Some(onload.as_ref().unchecked_ref()));
        image.set_onerror(Some(onerror.as_ref().unchecked_ref()));
        image.set_src(&request.src);

        self.current_load = Some(ImageLoad {
            image,
            _onload: onload,
            _onerror: onerror,
        });
    }

    fn attach_gestures(&mut self, surface: &CanvasSurface) {
        let canvas: HtmlElement = surface.canvas().clone().unchecked_into();
        if let Err(error) = canvas.style().set_property("touch-action", "none") {
            tracing::warn!(?error, "failed to disable touch scrolling");
        }

        let tracker = Rc::new(RefCell::new(TouchTracker::new()));
        self.gesture_listeners = TouchPhase::ALL
            .into_iter()
            .map(|phase| {
                let cropper = self.cropper.clone();
                let dispatcher = self.dispatcher.clone();
                let tracker = Rc::clone(&tracker);
                let target = canvas.clone();
                EventListener::new_with_options(
                    &canvas,
                    phase.event_type(),
                    EventListenerOptions {
                        phase: EventListenerPhase::Bubble,
                        passive: false,
                    },
                    move |event: &Event| {
                        let Some(event) = event.dyn_ref::<TouchEvent>() else {
                            return;
                        };
                        let touches = touch_points(&target, &event.touches());
                        let gesture = phase.track(&mut tracker.borrow_mut(), &touches);
                        let Some(gesture) = gesture else {
                            return;
                        };
                        if dispatch_gesture(&cropper, &dispatcher, gesture).prevent_default {
                            event.prevent_default();
                        }
                    },
                )
            })
            .collect();
        self.gesture_target = Some(canvas);
    }

    fn detach_gestures(&mut self) {
        self.gesture_listeners.clear();
        if let Some(target) = self.gesture_target.take() {
            if let Err(error) = target.style().remove_property("touch-action") {
                tracing::warn!(?error, "failed to restore touch scrolling");
            }
        }
    }

    fn subscribe_resize(&mut self) {
        if self.onresize.is_some() {
            return;
        }
        let cropper = self.cropper.clone();
        let dispatcher = self.dispatcher.clone();
        self.onresize = Some(EventListener::new(&self.window, "resize", move |_| {
            dispatch_event(&cropper, &dispatcher, Cropper::<WebHost>::handle_container_resize);
        }));
    }

    fn unsubscribe_resize(&mut self) {
        self.onresize = None;
    }
}

/// The touch events the built-in recognizer listens to.
#[derive(Debug, Clone, Copy)]
enum TouchPhase {
    Start,
    Move,
    End,
    Cancel,
}

impl TouchPhase {
    const ALL: [TouchPhase; 4] = [
        TouchPhase::Start,
        TouchPhase::Move,
        TouchPhase::End,
        TouchPhase::Cancel,
    ];

    fn event_type(self) -> &'static str {
        match self {
            TouchPhase::Start => "touchstart",
            TouchPhase::Move => "touchmove",
            TouchPhase::End => "touchend",
            TouchPhase::Cancel => "touchcancel",
        }
    }

    fn track(self, tracker: &mut TouchTracker, touches: &[Point]) -> Option<GestureEvent> {
        match self {
            TouchPhase::Start => tracker.touches_started(touches),
            TouchPhase::Move => tracker.touches_moved(touches),
            TouchPhase::End | TouchPhase::Cancel => tracker.touches_ended(touches),
        }
    }
}

/// Touch positions relative to `target`'s top-left corner.
fn touch_points(target: &HtmlElement, touches: &TouchList) -> Vec<Point> {
    let rect = target.get_bounding_client_rect();
    (0..touches.length())
        .filter_map(|i| touches.item(i))
        .map(|touch| {
            Point::new(
                f64::from(touch.client_x()) - rect.left(),
                f64::from(touch.client_y()) - rect.top(),
            )
        })
        .collect()
}

/// Feed one gesture to the cropper, then flush JS callbacks outside the borrow.
fn dispatch_gesture(
    cropper: &Weak<RefCell<Cropper<WebHost>>>,
    dispatcher: &Dispatcher,
    gesture: GestureEvent,
) -> GestureResponse {
    let Some(cropper) = cropper.upgrade() else {
        return GestureResponse::default();
    };
    let response = match cropper.try_borrow_mut() {
        Ok(mut cropper) => cropper.handle_gesture(gesture),
        Err(_) => GestureResponse::default(),
    };
    dispatcher.flush();
    response
}

/// Run `event` against the cropper, then flush JS callbacks outside the borrow.
fn dispatch_event<F>(cropper: &Weak<RefCell<Cropper<WebHost>>>, dispatcher: &Dispatcher, event: F)
where
    F: FnOnce(&mut Cropper<WebHost>) -> Result<(), CropperError>,
{
    let Some(cropper) = cropper.upgrade() else {
        return;
    };
    let result = match cropper.try_borrow_mut() {
        Ok(mut cropper) => event(&mut *cropper),
        Err(_) => Err(CropperError::Platform("cropper is busy".to_string())),
    };
    if let Err(error) = result {
        tracing::warn!(%error, "cropper event failed");
    }
    dispatcher.flush();
}
