//! Lifecycle controller: creation, image-load sequencing, readiness, resize
//! and teardown.
//!
//! A [`Cropper`] drives a [`Host`], which supplies everything
//! platform-specific: the container size, drawing surfaces, image loading,
//! gesture wiring and resize notifications. Hosts report asynchronous
//! results back through [`Cropper::on_image_loaded`],
//! [`Cropper::on_image_failed`], [`Cropper::handle_gesture`] and
//! [`Cropper::handle_container_resize`].
//!
//! # Load Sequencing
//!
//! Every load is tagged with a [`LoadTicket`]. Only the most recent ticket is
//! honored; completions for older tickets are dropped, so swapping the
//! source mid-load can never paint a stale image.

mod ready;
mod registry;

pub use ready::ReadyQueue;
pub use registry::{InstanceRegistry, Teardown};

use std::sync::atomic::{AtomicU64, Ordering};

use crate::config::CropperConfig;
use crate::error::{CropperError, LoadError};
use crate::geometry::{ContainerFrame, CropBox, CropRect, Size, ViewState, Viewport};
use crate::gesture::{GestureEvent, GestureInterpreter, GestureResponse};
use crate::output::{output_size, CropMode};
use crate::render::{self, CompositeMode, MaskStyle, Rect, Surface};

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// A loaded image: natural pixel size plus the host's bitmap handle.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAsset<I> {
    width: u32,
    height: u32,
    bitmap: I,
}

impl<I> ImageAsset<I> {
    pub fn new(width: u32, height: u32, bitmap: I) -> Self {
        Self {
            width,
            height,
            bitmap,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bitmap(&self) -> &I {
        &self.bitmap
    }

    pub fn into_bitmap(self) -> I {
        self.bitmap
    }

    pub fn size(&self) -> Size {
        Size::new(self.width as f64, self.height as f64)
    }
}

/// Identifies one image load; later tickets compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LoadTicket(u64);

impl LoadTicket {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// What the host is asked to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub src: String,
    /// Request anonymous cross-origin loading so the result stays readable.
    pub cross_origin: bool,
    pub ticket: LoadTicket,
}

impl LoadRequest {
    fn new(src: String, ticket: LoadTicket) -> Self {
        let cross_origin = src
            .get(..4)
            .is_some_and(|scheme| scheme.eq_ignore_ascii_case("http"));
        Self {
            src,
            cross_origin,
            ticket,
        }
    }
}

/// Platform services a cropper depends on.
pub trait Host {
    type Surface: Surface;

    /// Current container size.
    fn container_frame(&self) -> ContainerFrame;

    fn create_surface(&mut self, width: u32, height: u32) -> Result<Self::Surface, CropperError>;

    /// Attach the live surface to the container.
    fn mount(&mut self, surface: &Self::Surface);
    fn unmount(&mut self, surface: &Self::Surface);

    /// Start loading an image; completion is reported with the request's ticket.
    fn load_image(&mut self, request: LoadRequest);

    /// Start delivering gesture events for `surface`.
    fn attach_gestures(&mut self, surface: &Self::Surface);
    fn detach_gestures(&mut self);

    /// Start delivering container resize notifications.
    fn subscribe_resize(&mut self);
    fn unsubscribe_resize(&mut self);
}

/// Bitmap type drawn by a host's surfaces.
pub type HostImage<H> = <<H as Host>::Surface as Surface>::Image;

/// Runs once the cropper is ready.
pub type ReadyCallback<H> = Box<dyn FnOnce(&mut Cropper<H>)>;

/// Runs whenever the current image fails to load.
pub type LoadErrorListener = Box<dyn FnMut(&LoadError)>;

/// One interactive cropper bound to one container.
pub struct Cropper<H: Host> {
    host: H,
    instance_id: u64,
    config: CropperConfig,
    style: MaskStyle,
    frame: ContainerFrame,
    crop_box: CropBox,
    surface: Option<H::Surface>,
    image: Option<ImageAsset<HostImage<H>>>,
    viewport: Option<Viewport>,
    gestures: GestureInterpreter,
    gestures_attached: bool,
    resize_subscribed: bool,
    ready: ReadyQueue<ReadyCallback<H>>,
    load_error_listeners: Vec<LoadErrorListener>,
    src: Option<String>,
    last_ticket: u64,
    pending: Option<LoadTicket>,
    destroyed: bool,
}

impl<H: Host> Cropper<H> {
    /// Validate `config` against the host's container; no load is started.
    ///
    /// # Errors
    ///
    /// `CropperError::Configuration` for any invalid option, including a
    /// circle requested for a non-square crop box.
    pub fn new(host: H, config: CropperConfig) -> Result<Self, CropperError> {
        config.validate()?;
        let frame = host.container_frame();
        let crop_box = CropBox::compute(frame, &config)?;
        let instance_id = NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(instance_id, ?frame, ?crop_box, "cropper created");

        Ok(Self {
            host,
            instance_id,
            style: MaskStyle::from(&config),
            config,
            frame,
            crop_box,
            surface: None,
            image: None,
            viewport: None,
            gestures: GestureInterpreter::new(),
            gestures_attached: false,
            resize_subscribed: false,
            ready: ReadyQueue::new(),
            load_error_listeners: Vec::new(),
            src: None,
            last_ticket: 0,
            pending: None,
            destroyed: false,
        })
    }

    /// Validate and immediately start loading `src`.
    pub fn create(host: H, src: impl Into<String>, config: CropperConfig) -> Result<Self, CropperError> {
        let mut cropper = Self::new(host, config)?;
        cropper.set_source(src, None)?;
        Ok(cropper)
    }

    pub fn instance_id(&self) -> u64 {
        self.instance_id
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &CropperConfig {
        &self.config
    }

    pub fn src(&self) -> Option<&str> {
        self.src.as_deref()
    }

    pub fn crop_box(&self) -> &CropBox {
        &self.crop_box
    }

    pub fn surface(&self) -> Option<&H::Surface> {
        self.surface.as_ref()
    }

    pub fn image(&self) -> Option<&ImageAsset<HostImage<H>>> {
        self.image.as_ref()
    }

    pub fn viewport(&self) -> Option<&Viewport> {
        self.viewport.as_ref()
    }

    /// Current view once an image has been shown.
    pub fn view(&self) -> Option<ViewState> {
        self.viewport.as_ref().map(Viewport::view)
    }

    pub fn is_ready(&self) -> bool {
        !self.destroyed && self.ready.is_resolved()
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Ticket of the load still in flight, if any.
    pub fn pending_load(&self) -> Option<LoadTicket> {
        self.pending
    }

    /// Swap the image. Readiness resets; `callback` runs once the new image
    /// is shown, ahead of anything registered later.
    pub fn set_source(
        &mut self,
        src: impl Into<String>,
        callback: Option<ReadyCallback<H>>,
    ) -> Result<LoadTicket, CropperError> {
        if self.destroyed {
            return Err(CropperError::Destroyed);
        }

        self.detach_gestures();
        self.gestures = GestureInterpreter::new();
        self.ready.reset();
        if let Some(callback) = callback {
            // queue was just reset, so this always waits
            let _ = self.ready.push(callback);
        }

        self.last_ticket += 1;
        let ticket = LoadTicket(self.last_ticket);
        self.pending = Some(ticket);

        let request = LoadRequest::new(src.into(), ticket);
        tracing::debug!(
            instance_id = self.instance_id,
            src = %request.src,
            cross_origin = request.cross_origin,
            ticket = ticket.0,
            "loading image"
        );
        self.src = Some(request.src.clone());
        self.host.load_image(request);
        Ok(ticket)
    }

    /// The host finished loading `ticket`.
    ///
    /// Stale tickets are ignored. Otherwise the image is shown centered at
    /// the cover scale, gestures and resize notifications are wired up, and
    /// waiting ready callbacks run in registration order.
    pub fn on_image_loaded(
        &mut self,
        ticket: LoadTicket,
        asset: ImageAsset<HostImage<H>>,
    ) -> Result<(), CropperError> {
        if self.destroyed || self.pending != Some(ticket) {
            tracing::warn!(ticket = ticket.0, "ignoring stale image load");
            return Ok(());
        }
        if asset.width() == 0 || asset.height() == 0 {
            self.on_image_failed(ticket, LoadError::Decode("image has no pixels".to_string()));
            return Ok(());
        }
        let frame = self.host.container_frame();
        let crop_box = match CropBox::compute(frame, &self.config) {
            Ok(crop_box) => crop_box,
            Err(error) => return Err(self.fail_setup(ticket, error.into())),
        };
        self.frame = frame;
        self.crop_box = crop_box;
        if let Err(error) = self.prepare_surface() {
            return Err(self.fail_setup(ticket, error));
        }
        self.pending = None;

        self.viewport = Some(Viewport::new(crop_box, asset.size()));
        self.image = Some(asset);
        self.repaint();

        if let Some(surface) = &self.surface {
            self.host.attach_gestures(surface);
            self.gestures_attached = true;
        }
        if self.config.responsive && !self.resize_subscribed {
            self.host.subscribe_resize();
            self.resize_subscribed = true;
        }

        tracing::debug!(
            instance_id = self.instance_id,
            ticket = ticket.0,
            view = ?self.view(),
            "cropper ready"
        );
        for callback in self.ready.resolve() {
            callback(self);
        }
        Ok(())
    }

    /// The host failed to load `ticket`; load-error listeners are notified.
    pub fn on_image_failed(&mut self, ticket: LoadTicket, error: LoadError) {
        if self.destroyed || self.pending != Some(ticket) {
            tracing::warn!(ticket = ticket.0, "ignoring stale image failure");
            return;
        }
        self.pending = None;
        tracing::warn!(instance_id = self.instance_id, %error, "image load failed");
        for listener in &mut self.load_error_listeners {
            listener(&error);
        }
    }

    /// Report a loaded image that could not be shown, returning `error`.
    fn fail_setup(&mut self, ticket: LoadTicket, error: CropperError) -> CropperError {
        self.on_image_failed(ticket, LoadError::Setup(error.to_string()));
        error
    }

    /// Run `callback` now if ready, otherwise once ready.
    pub fn on_ready(&mut self, callback: ReadyCallback<H>) {
        if self.destroyed {
            return;
        }
        if let Some(callback) = self.ready.push(callback) {
            callback(self);
        }
    }

    pub fn on_load_error(&mut self, listener: LoadErrorListener) {
        if !self.destroyed {
            self.load_error_listeners.push(listener);
        }
    }

    /// Recompute geometry for the current container size.
    ///
    /// Unless `reset`, a ready cropper keeps its crop region and zoom ratio;
    /// otherwise the image is recentered at the cover scale.
    pub fn resize(&mut self, reset: bool) -> Result<(), CropperError> {
        if self.destroyed {
            return Err(CropperError::Destroyed);
        }

        let frame = self.host.container_frame();
        let crop_box = CropBox::compute(frame, &self.config)?;
        self.frame = frame;
        self.crop_box = crop_box;
        if let Some(surface) = &mut self.surface {
            let (width, height) = surface_size(frame);
            if (surface.width(), surface.height()) != (width, height) {
                surface.set_size(width, height);
            }
        }

        let preserve = !reset && self.is_ready();
        if let Some(viewport) = &self.viewport {
            self.viewport = Some(viewport.refit(crop_box, preserve));
        }
        tracing::debug!(instance_id = self.instance_id, ?frame, reset, "resized");
        self.repaint();
        Ok(())
    }

    /// Container resize notification from the host.
    pub fn handle_container_resize(&mut self) -> Result<(), CropperError> {
        self.resize(!self.config.restore)
    }

    /// Visible crop region in natural image pixels.
    pub fn get_crop_rectangle(&self) -> Result<CropRect, CropperError> {
        self.ready_viewport().map(Viewport::crop_rect)
    }

    /// Rasterize the crop region into a new surface. The view is untouched.
    ///
    /// # Errors
    ///
    /// `NotReady` before the first image is shown, `Destroyed` after
    /// teardown, `InvalidOutputSize` for a bad `value`, and any host failure
    /// creating the surface.
    pub fn crop(&mut self, value: f64, mode: CropMode) -> Result<H::Surface, CropperError> {
        let viewport = self.ready_viewport()?;
        let rect = viewport.crop_rect();
        let (width, height) = output_size(mode, value, viewport.crop_box(), &rect)?;

        let mut output = self.host.create_surface(width, height)?;
        let image = self.image.as_ref().ok_or(CropperError::NotReady)?;
        output.draw_image(
            image.bitmap(),
            Rect::from(rect),
            Rect::new(0.0, 0.0, width as f64, height as f64),
            CompositeMode::Replace,
        );
        tracing::debug!(instance_id = self.instance_id, %mode, value, width, height, "cropped");
        Ok(output)
    }

    /// Feed one gesture event; returns whether the platform default should
    /// be cancelled.
    pub fn handle_gesture(&mut self, event: GestureEvent) -> GestureResponse {
        if !self.is_ready() || !self.gestures_attached {
            return GestureResponse::default();
        }
        let Some(viewport) = self.viewport.as_mut() else {
            return GestureResponse::default();
        };
        let response = self.gestures.handle(viewport, event);
        if response.repaint {
            self.repaint();
        }
        response
    }

    /// Release every platform resource. Idempotent.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;

        self.detach_gestures();
        self.gestures = GestureInterpreter::new();
        if self.resize_subscribed {
            self.host.unsubscribe_resize();
            self.resize_subscribed = false;
        }
        if let Some(surface) = self.surface.take() {
            self.host.unmount(&surface);
        }
        self.ready.clear();
        self.load_error_listeners.clear();
        self.pending = None;
        self.viewport = None;
        self.image = None;

        tracing::debug!(instance_id = self.instance_id, "cropper destroyed");
    }

    fn ready_viewport(&self) -> Result<&Viewport, CropperError> {
        if self.destroyed {
            return Err(CropperError::Destroyed);
        }
        if !self.ready.is_resolved() {
            return Err(CropperError::NotReady);
        }
        self.viewport.as_ref().ok_or(CropperError::NotReady)
    }

    fn prepare_surface(&mut self) -> Result<(), CropperError> {
        let (width, height) = surface_size(self.frame);
        if let Some(surface) = self.surface.as_mut() {
            if (surface.width(), surface.height()) != (width, height) {
                surface.set_size(width, height);
            }
            return Ok(());
        }

        let surface = self.host.create_surface(width, height)?;
        self.host.mount(&surface);
        self.surface = Some(surface);
        Ok(())
    }

    fn detach_gestures(&mut self) {
        if self.gestures_attached {
            self.host.detach_gestures();
            self.gestures_attached = false;
        }
    }

    fn repaint(&mut self) {
        let (Some(surface), Some(viewport), Some(image)) =
            (self.surface.as_mut(), self.viewport.as_ref(), self.image.as_ref())
        else {
            return;
        };
        render::paint(
            surface,
            self.frame,
            viewport.crop_box(),
            &self.style,
            image.bitmap(),
            (image.width(), image.height()),
            &viewport.view(),
        );
    }
}

impl<H: Host> Drop for Cropper<H> {
    fn drop(&mut self) {
        self.destroy();
    }
}

fn surface_size(frame: ContainerFrame) -> (u32, u32) {
    (frame.width.round() as u32, frame.height.round() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::config::BorderOrigin;
    use crate::error::ConfigError;
    use crate::geometry::Point;
    use crate::testing::{gradient, HeadlessHost};

    const EPSILON: f64 = 1e-9;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < EPSILON
    }

    fn loaded(width: f64, height: f64, config: CropperConfig) -> Cropper<HeadlessHost> {
        let mut cropper =
            Cropper::create(HeadlessHost::new(width, height), "photo.png", config).unwrap();
        let ticket = cropper.pending_load().unwrap();
        cropper.on_image_loaded(ticket, gradient(1000, 500)).unwrap();
        cropper
    }

    #[test]
    fn test_contain_ratio_above_one_rejected() {
        let mut config = CropperConfig::default();
        config.contain_ratio = 1.5;
        let result = Cropper::new(HeadlessHost::new(300.0, 300.0), config);
        assert!(matches!(
            result,
            Err(CropperError::Configuration(ConfigError::ContainRatioTooLarge(_)))
        ));
    }

    #[test]
    fn test_circle_non_square_rejected() {
        let mut config = CropperConfig::default();
        config.circle = true;
        config.width = Some(200.0);
        config.height = Some(100.0);
        let result = Cropper::new(HeadlessHost::new(300.0, 300.0), config);
        assert!(matches!(
            result,
            Err(CropperError::Configuration(ConfigError::CircleRequiresSquare { .. }))
        ));
    }

    #[test]
    fn test_create_requests_load() {
        let cropper = Cropper::create(
            HeadlessHost::new(300.0, 300.0),
            "HTTPS://example.com/a.jpg",
            CropperConfig::default(),
        )
        .unwrap();
        let requests = &cropper.host().requests;
        assert_eq!(requests.len(), 1);
        assert!(requests[0].cross_origin);
        assert!(!cropper.is_ready());

        let local = Cropper::create(
            HeadlessHost::new(300.0, 300.0),
            "blob:abc",
            CropperConfig::default(),
        )
        .unwrap();
        assert!(!local.host().requests[0].cross_origin);
    }

    #[test]
    fn test_ready_wires_everything_up() {
        let cropper = loaded(300.0, 300.0, CropperConfig::default());
        assert!(cropper.is_ready());

        let host = cropper.host();
        assert_eq!(host.mounted, 1);
        assert!(host.gestures_attached);
        assert_eq!(host.resize_subscriptions, 1);

        let view = cropper.view().unwrap();
        assert!(approx_eq(view.scale, 0.552));
        assert!(approx_eq(view.offset_x, -126.0));
        assert!(approx_eq(view.offset_y, 12.0));
        let crop = cropper.crop_box();
        assert!(approx_eq(crop.width, 276.0));
        assert!(approx_eq(crop.origin_x, 12.0));
    }

    #[test]
    fn test_not_responsive_skips_resize_subscription() {
        let mut config = CropperConfig::default();
        config.responsive = false;
        let cropper = loaded(300.0, 300.0, config);
        assert_eq!(cropper.host().resize_subscriptions, 0);
    }

    #[test]
    fn test_ready_callbacks_run_in_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut cropper = Cropper::new(HeadlessHost::new(300.0, 300.0), CropperConfig::default())
            .unwrap();

        let first = Rc::clone(&order);
        let ticket = cropper
            .set_source(
                "photo.png",
                Some(Box::new(move |_| first.borrow_mut().push("config"))),
            )
            .unwrap();
        let second = Rc::clone(&order);
        cropper.on_ready(Box::new(move |_| second.borrow_mut().push("a")));
        let third = Rc::clone(&order);
        cropper.on_ready(Box::new(move |_| third.borrow_mut().push("b")));
        assert!(order.borrow().is_empty());

        cropper.on_image_loaded(ticket, gradient(1000, 500)).unwrap();
        assert_eq!(*order.borrow(), vec!["config", "a", "b"]);

        // registered after ready: runs immediately
        let late = Rc::clone(&order);
        cropper.on_ready(Box::new(move |c| {
            assert!(c.is_ready());
            late.borrow_mut().push("late");
        }));
        assert_eq!(order.borrow().len(), 4);
    }

    #[test]
    fn test_stale_load_ignored() {
        let mut cropper = Cropper::new(HeadlessHost::new(300.0, 300.0), CropperConfig::default())
            .unwrap();
        let old = cropper.set_source("a.png", None).unwrap();
        let new = cropper.set_source("b.png", None).unwrap();
        assert!(new > old);

        cropper.on_image_loaded(old, gradient(10, 10)).unwrap();
        assert!(!cropper.is_ready());

        cropper.on_image_loaded(new, gradient(1000, 500)).unwrap();
        assert!(cropper.is_ready());
        assert_eq!(cropper.image().unwrap().width(), 1000);

        // the late completion of the first load changes nothing
        cropper.on_image_loaded(old, gradient(10, 10)).unwrap();
        assert_eq!(cropper.image().unwrap().width(), 1000);
    }

    #[test]
    fn test_set_source_resets_ready_and_gestures() {
        let mut cropper = loaded(300.0, 300.0, CropperConfig::default());
        let ticket = cropper.set_source("next.png", None).unwrap();
        assert!(!cropper.is_ready());
        assert!(!cropper.host().gestures_attached);
        assert!(matches!(cropper.crop(1.0, CropMode::Ratio), Err(CropperError::NotReady)));

        cropper.on_image_loaded(ticket, gradient(400, 400)).unwrap();
        assert!(cropper.is_ready());
        // one surface, one subscription across swaps
        assert_eq!(cropper.host().mounted, 1);
        assert_eq!(cropper.host().resize_subscriptions, 1);
    }

    #[test]
    fn test_load_failure_notifies_listeners() {
        let errors = Rc::new(RefCell::new(Vec::new()));
        let mut cropper = Cropper::new(HeadlessHost::new(300.0, 300.0), CropperConfig::default())
            .unwrap();
        let sink = Rc::clone(&errors);
        cropper.on_load_error(Box::new(move |e| sink.borrow_mut().push(e.clone())));

        let ticket = cropper.set_source("missing.png", None).unwrap();
        cropper.on_image_failed(
            ticket,
            LoadError::Failed {
                src: "missing.png".to_string(),
                reason: "404".to_string(),
            },
        );
        assert_eq!(errors.borrow().len(), 1);
        assert!(!cropper.is_ready());
        assert!(cropper.pending_load().is_none());

        // a repeated report for the same ticket is stale
        cropper.on_image_failed(ticket, LoadError::Decode("late".to_string()));
        assert_eq!(errors.borrow().len(), 1);
    }

    #[test]
    fn test_empty_image_reported_as_failure() {
        let errors = Rc::new(RefCell::new(0));
        let mut cropper = Cropper::new(HeadlessHost::new(300.0, 300.0), CropperConfig::default())
            .unwrap();
        let sink = Rc::clone(&errors);
        cropper.on_load_error(Box::new(move |_| *sink.borrow_mut() += 1));
        let ticket = cropper.set_source("empty.png", None).unwrap();
        cropper.on_image_loaded(ticket, gradient(0, 0)).unwrap();
        assert_eq!(*errors.borrow(), 1);
        assert!(!cropper.is_ready());
    }

    #[test]
    fn test_setup_failure_reported_to_listeners() {
        let errors = Rc::new(RefCell::new(Vec::new()));
        let mut cropper = Cropper::new(HeadlessHost::new(300.0, 300.0), CropperConfig::default())
            .unwrap();
        let sink = Rc::clone(&errors);
        cropper.on_load_error(Box::new(move |e| sink.borrow_mut().push(e.clone())));
        let ticket = cropper.set_source("photo.png", None).unwrap();

        // container collapsed while the image was loading
        cropper.host_mut().frame = Size::new(0.0, 0.0);
        let result = cropper.on_image_loaded(ticket, gradient(1000, 500));
        assert!(matches!(result, Err(CropperError::Configuration(_))));

        assert!(matches!(errors.borrow().as_slice(), [LoadError::Setup(_)]));
        assert!(!cropper.is_ready());
        assert!(cropper.pending_load().is_none());
        assert_eq!(cropper.host().mounted, 0);
    }

    #[test]
    fn test_crop_before_ready_fails() {
        let mut cropper = Cropper::create(
            HeadlessHost::new(300.0, 300.0),
            "photo.png",
            CropperConfig::default(),
        )
        .unwrap();
        assert!(matches!(cropper.crop(1.0, CropMode::Ratio), Err(CropperError::NotReady)));
        assert!(matches!(cropper.get_crop_rectangle(), Err(CropperError::NotReady)));
    }

    #[test]
    fn test_crop_rectangle_after_ready() {
        let cropper = loaded(300.0, 300.0, CropperConfig::default());
        let rect = cropper.get_crop_rectangle().unwrap();
        assert!(approx_eq(rect.x, 250.0));
        assert!(approx_eq(rect.y, 0.0));
        assert!(approx_eq(rect.width, 500.0));
        assert!(approx_eq(rect.height, 500.0));
    }

    #[test]
    fn test_crop_output_keeps_crop_box_aspect() {
        let mut config = CropperConfig::default();
        config.aspect_ratio = 16.0 / 9.0;
        let mut cropper = loaded(400.0, 300.0, config);

        let crop = *cropper.crop_box();
        let output = cropper.crop(1.0, CropMode::Ratio).unwrap();
        let expected = crop.width / crop.height;
        let actual = output.width() as f64 / output.height() as f64;
        assert!((actual - expected).abs() < 0.02);

        let output = cropper.crop(1.0, CropMode::NaturalRatio).unwrap();
        let actual = output.width() as f64 / output.height() as f64;
        assert!((actual - expected).abs() < 0.02);
    }

    #[test]
    fn test_crop_samples_visible_region_without_moving_view() {
        let mut cropper = loaded(300.0, 300.0, CropperConfig::default());
        let before = cropper.view();
        let output = cropper.crop(1.0, CropMode::NaturalRatio).unwrap();
        assert_eq!((output.width(), output.height()), (500, 500));
        assert_eq!(cropper.view(), before);

        // gradient red channel encodes x; the crop starts at x = 250
        let left = output.pixel(0, 0).unwrap();
        let expected = crate::testing::gradient_red(250, 1000);
        assert!((left.0[0] as i32 - expected as i32).abs() <= 1);
        assert_eq!(left.0[3], 255);
    }

    #[test]
    fn test_crop_rejects_oversized_output() {
        let mut cropper = loaded(300.0, 300.0, CropperConfig::default());
        assert!(matches!(
            cropper.crop(1e12, CropMode::Width),
            Err(CropperError::InvalidOutputSize(_))
        ));
        // nothing was mounted or drawn for the rejected crop
        assert!(cropper.is_ready());
        assert!(cropper.crop(1.0, CropMode::Ratio).is_ok());
    }

    #[test]
    fn test_crop_rejects_bad_value() {
        let mut cropper = loaded(300.0, 300.0, CropperConfig::default());
        assert!(matches!(
            cropper.crop(0.0, CropMode::Width),
            Err(CropperError::InvalidOutputSize(_))
        ));
    }

    #[test]
    fn test_resize_without_change_is_idempotent() {
        let mut cropper = loaded(300.0, 300.0, CropperConfig::default());
        cropper.handle_gesture(GestureEvent::Start {
            centroid: Point::new(100.0, 120.0),
        });
        cropper.handle_gesture(GestureEvent::Pinch {
            scale: 1.7,
            centroid: Point::new(100.0, 120.0),
        });
        let before = cropper.view();

        cropper.resize(false).unwrap();
        let once = cropper.view();
        cropper.resize(false).unwrap();
        assert_eq!(once, before);
        assert_eq!(cropper.view(), once);
    }

    #[test]
    fn test_resize_reset_recenters_at_new_min_scale() {
        let mut cropper = loaded(300.0, 300.0, CropperConfig::default());
        cropper.handle_gesture(GestureEvent::Pan { dx: 40.0, dy: 0.0 });

        cropper.host_mut().frame = Size::new(200.0, 200.0);
        cropper.resize(true).unwrap();

        let crop = *cropper.crop_box();
        assert!(approx_eq(crop.width, 184.0));
        assert!(approx_eq(crop.origin_x, 8.0));
        let view = cropper.view().unwrap();
        assert!(approx_eq(view.scale, 184.0 / 500.0));
        assert!(approx_eq(view.offset_x, 8.0 - (1000.0 * view.scale - 184.0) / 2.0));
        assert!(approx_eq(view.offset_y, 8.0));
        assert_eq!(cropper.surface().unwrap().width(), 200);
    }

    #[test]
    fn test_resize_preserve_keeps_crop_region() {
        let mut cropper = loaded(300.0, 300.0, CropperConfig::default());
        cropper.handle_gesture(GestureEvent::Pinch {
            scale: 2.0,
            centroid: Point::new(150.0, 150.0),
        });
        let rect = cropper.get_crop_rectangle().unwrap();
        let ratio = cropper.viewport().unwrap().zoom_ratio();

        cropper.host_mut().frame = Size::new(500.0, 300.0);
        cropper.resize(false).unwrap();

        let next = cropper.get_crop_rectangle().unwrap();
        assert!((next.x - rect.x).abs() < 1e-6);
        assert!((next.y - rect.y).abs() < 1e-6);
        assert!((cropper.viewport().unwrap().zoom_ratio() - ratio).abs() < 1e-9);
    }

    #[test]
    fn test_container_resize_honors_restore() {
        let mut config = CropperConfig::default();
        config.restore = false;
        let mut cropper = loaded(300.0, 300.0, config);
        cropper.handle_gesture(GestureEvent::Pan { dx: 40.0, dy: 0.0 });
        cropper.handle_container_resize().unwrap();
        assert!(approx_eq(cropper.view().unwrap().offset_x, -126.0));
    }

    #[test]
    fn test_gestures_ignored_before_ready() {
        let mut cropper = Cropper::create(
            HeadlessHost::new(300.0, 300.0),
            "photo.png",
            CropperConfig::default(),
        )
        .unwrap();
        let response = cropper.handle_gesture(GestureEvent::Pan { dx: 5.0, dy: 5.0 });
        assert_eq!(response, GestureResponse::default());
    }

    #[test]
    fn test_pan_repaints_surface() {
        let mut cropper = loaded(300.0, 300.0, CropperConfig::default());
        let before = cropper.surface().unwrap().pixels().clone();
        let response = cropper.handle_gesture(GestureEvent::Pan { dx: 50.0, dy: 0.0 });
        assert!(response.prevent_default);
        assert_ne!(cropper.surface().unwrap().pixels(), &before);
    }

    #[test]
    fn test_destroy_releases_everything() {
        let mut cropper = loaded(300.0, 300.0, CropperConfig::default());
        cropper.destroy();

        let host = cropper.host();
        assert_eq!(host.mounted, 0);
        assert!(!host.gestures_attached);
        assert_eq!(host.resize_subscriptions, 0);
        assert!(!cropper.is_ready());
        assert!(matches!(cropper.crop(1.0, CropMode::Ratio), Err(CropperError::Destroyed)));
        assert!(matches!(cropper.resize(false), Err(CropperError::Destroyed)));
        assert!(matches!(
            cropper.set_source("x.png", None),
            Err(CropperError::Destroyed)
        ));

        // idempotent
        cropper.destroy();
    }

    #[test]
    fn test_destroy_mid_gesture_drops_anchor() {
        let mut cropper = loaded(300.0, 300.0, CropperConfig::default());
        cropper.handle_gesture(GestureEvent::Start {
            centroid: Point::new(10.0, 10.0),
        });
        cropper.destroy();
        let response = cropper.handle_gesture(GestureEvent::Pinch {
            scale: 2.0,
            centroid: Point::new(10.0, 10.0),
        });
        assert_eq!(response, GestureResponse::default());
    }

    #[test]
    fn test_registry_replaces_instance_on_same_container() {
        let mut registry = InstanceRegistry::new();
        let first = Rc::new(RefCell::new(loaded(300.0, 300.0, CropperConfig::default())));
        let first_id = first.borrow().instance_id();
        registry.claim("container", first_id, Rc::clone(&first));

        let second = Rc::new(RefCell::new(loaded(300.0, 300.0, CropperConfig::default())));
        let second_id = second.borrow().instance_id();
        assert_ne!(first_id, second_id);
        registry.claim("container", second_id, Rc::clone(&second));

        assert!(first.borrow().is_destroyed());
        assert!(second.borrow().is_ready());
        assert!(registry.release(&"container", first_id).is_none());
        assert_eq!(registry.instance_id(&"container"), Some(second_id));
    }

    #[test]
    fn test_border_only_painted_outside_with_origin_out() {
        let mut config = CropperConfig::default();
        config.border_width = 2.0;
        config.border_origin = BorderOrigin::Out;
        config.modal_opacity = 1.0;
        let cropper = loaded(300.0, 300.0, config);
        let surface = cropper.surface().unwrap();
        // inside the nominal box the image is fully visible
        assert_eq!(surface.pixel(150, 150).unwrap().0[3], 255);
        // far outside the box the overlay is opaque black over the image
        let outside = surface.pixel(2, 2).unwrap();
        assert_eq!(&outside.0[..3], &[0, 0, 0]);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::geometry::Point;
    use crate::testing::{gradient, HeadlessHost};
    use proptest::prelude::*;

    #[derive(Debug, Clone)]
    enum Op {
        Pan(f64, f64),
        Pinch(f64, f64, f64),
        End,
        Resize(f64, f64, bool),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (-300.0f64..300.0, -300.0f64..300.0).prop_map(|(dx, dy)| Op::Pan(dx, dy)),
            (0.1f64..4.0, 0.0f64..120.0, 0.0f64..120.0).prop_map(|(s, x, y)| Op::Pinch(s, x, y)),
            Just(Op::End),
            (40.0f64..120.0, 40.0f64..120.0, any::<bool>())
                .prop_map(|(w, h, reset)| Op::Resize(w, h, reset)),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// Property: a ready cropper keeps its view valid through any event sequence.
        #[test]
        fn prop_ready_view_stays_valid(
            (img_w, img_h) in (8u32..64, 8u32..64),
            ops in prop::collection::vec(op_strategy(), 1..12),
        ) {
            let mut cropper = Cropper::create(
                HeadlessHost::new(100.0, 100.0),
                "photo.png",
                CropperConfig::default(),
            ).unwrap();
            let ticket = cropper.pending_load().unwrap();
            cropper.on_image_loaded(ticket, gradient(img_w, img_h)).unwrap();

            for op in ops {
                match op {
                    Op::Pan(dx, dy) => { cropper.handle_gesture(GestureEvent::Pan { dx, dy }); }
                    Op::Pinch(scale, x, y) => {
                        cropper.handle_gesture(GestureEvent::Pinch { scale, centroid: Point::new(x, y) });
                    }
                    Op::End => { cropper.handle_gesture(GestureEvent::End); }
                    Op::Resize(w, h, reset) => {
                        cropper.host_mut().frame = Size::new(w, h);
                        cropper.resize(reset).unwrap();
                    }
                }
                let viewport = cropper.viewport().unwrap();
                prop_assert!(viewport.scale() >= viewport.min_scale());
                prop_assert!(viewport.is_valid(1e-6));
            }
        }
    }
}
