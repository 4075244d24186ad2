//! The mounted widget and the host environment it is embedded in.
//!
//! A [`Host`] stands for the container the backdrop lives in: it reports the
//! content box, creates the GPU backend, schedules frames and hands out event
//! subscriptions. [`FloatingLines`] drives one render session inside it from
//! mount to unmount.

use lineconfig::RenderConfiguration;
use tracing::{debug, error, info, trace, warn};
use winit::dpi::{LogicalSize, PhysicalSize};

use crate::animation::AnimationLoop;
use crate::pointer::PointerEvent;
use crate::resize::{ResizeCoordinator, ResizeMode};
use crate::runtime::{BoxedTimeSource, SystemTimeSource};
use crate::session::{RenderBackend, RenderSession, SessionError};

/// Token for a scheduled next-frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest(pub u64);

/// Handle for a registered event source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerChannel {
    Move,
    Leave,
}

pub trait Host {
    type Backend: RenderBackend;

    /// Container size in CSS (logical) pixels.
    fn content_box(&self) -> LogicalSize<f64>;
    fn device_pixel_ratio(&self) -> f64;
    fn create_backend(&mut self, size: PhysicalSize<u32>) -> Result<Self::Backend, SessionError>;
    fn request_frame(&mut self) -> FrameRequest;
    /// Must tolerate requests that already fired.
    fn cancel_frame(&mut self, request: FrameRequest);
    /// `None` when the host cannot report size changes.
    fn observe_resize(&mut self) -> Option<Subscription>;
    fn subscribe_pointer(&mut self, channel: PointerChannel) -> Subscription;
    /// Must tolerate unknown or already released handles.
    fn unsubscribe(&mut self, subscription: Subscription);
    /// Compositing mode for the layer holding the surface. The value is
    /// passed through as configured; hosts without compositing ignore it.
    fn set_blend_mode(&mut self, _mode: &str) {}
}

/// The wave-lines backdrop mounted in a host container.
pub struct FloatingLines<H: Host> {
    host: H,
    session: Option<RenderSession<H::Backend>>,
    animation: Option<AnimationLoop>,
    resize: ResizeCoordinator,
    resize_subscription: Option<Subscription>,
    pointer_subscriptions: Vec<Subscription>,
    pending_frame: Option<FrameRequest>,
    blend_mode: Option<String>,
    config: RenderConfiguration,
    mounted: bool,
}

impl<H: Host> FloatingLines<H> {
    /// Mounts with the system clock. Never fails: without a GPU the widget
    /// stays inert.
    pub fn mount(host: H, config: RenderConfiguration) -> Self {
        Self::mount_with_clock(host, config, Box::new(SystemTimeSource::new()))
    }

    pub fn mount_with_clock(
        mut host: H,
        config: RenderConfiguration,
        clock: BoxedTimeSource,
    ) -> Self {
        let css = host.content_box();
        let pixel_ratio = host.device_pixel_ratio();
        let initial = ResizeCoordinator::new(css, pixel_ratio, ResizeMode::Observed);
        if !initial.is_renderable() {
            debug!(
                width = css.width,
                height = css.height,
                "container has no layout yet; output deferred"
            );
        }

        let session = match RenderSession::initialize(
            initial.surface_size(),
            initial.resolution(),
            &config,
            |size| host.create_backend(size),
        ) {
            Ok(session) => session,
            Err(err) => {
                warn!(error = %err, "wave lines unavailable; staying inert");
                return Self {
                    host,
                    session: None,
                    animation: None,
                    resize: initial,
                    resize_subscription: None,
                    pointer_subscriptions: Vec::new(),
                    pending_frame: None,
                    blend_mode: None,
                    config,
                    mounted: false,
                };
            }
        };

        let resize_subscription = host.observe_resize();
        let mode = if resize_subscription.is_some() {
            ResizeMode::Observed
        } else {
            warn!("resize observation unavailable; using the size computed at mount");
            ResizeMode::SingleShot
        };
        let resize = ResizeCoordinator::new(css, pixel_ratio, mode);

        let animation = AnimationLoop::new(clock, session.resolved());
        let interactive = session.resolved().interactive;

        let mut widget = Self {
            host,
            session: Some(session),
            animation: Some(animation),
            resize,
            resize_subscription,
            pointer_subscriptions: Vec::new(),
            pending_frame: None,
            blend_mode: None,
            config,
            mounted: true,
        };
        widget.sync_blend_mode();
        widget.sync_pointer_subscriptions(interactive);
        widget.pending_frame = Some(widget.host.request_frame());
        info!(
            width = css.width,
            height = css.height,
            pixel_ratio = widget.resize.pixel_ratio(),
            interactive,
            "wave lines mounted"
        );
        widget
    }

    /// Applies a new snapshot to the running session.
    pub fn apply(&mut self, config: RenderConfiguration) {
        self.config = config;
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let resolved = session.apply(&self.config);
        let interactive = resolved.interactive;
        if let Some(animation) = self.animation.as_mut() {
            animation.configure(resolved);
        }
        self.sync_blend_mode();
        self.sync_pointer_subscriptions(interactive);
    }

    /// Re-reads the content box after the host reported a change.
    pub fn handle_resize(&mut self) {
        if self.resize_subscription.is_none() {
            return;
        }
        let css = self.host.content_box();
        let pixel_ratio = self.host.device_pixel_ratio();
        if self.resize.observe(css, pixel_ratio).is_some() {
            if let Some(session) = self.session.as_mut() {
                session.resize(self.resize.surface_size(), self.resize.resolution());
            }
        }
    }

    /// Delivers pointer input; dropped when no listeners are registered.
    pub fn handle_pointer(&mut self, event: PointerEvent) {
        if self.pointer_subscriptions.is_empty() {
            trace!(?event, "pointer event without listeners");
            return;
        }
        if let Some(animation) = self.animation.as_mut() {
            animation.pointer_event(event, self.resize.css_size(), self.resize.pixel_ratio());
        }
    }

    /// Runs the frame scheduled under `request` and schedules the next one.
    pub fn frame(&mut self, request: FrameRequest) {
        if self.pending_frame != Some(request) {
            trace!(?request, "ignoring stale frame request");
            return;
        }
        self.pending_frame = None;

        let (Some(session), Some(animation)) = (self.session.as_mut(), self.animation.as_mut())
        else {
            return;
        };

        if self.resize.is_renderable() {
            if let Err(err) = animation.tick(session) {
                if err.is_recoverable() {
                    debug!(error = %err, "skipped frame");
                } else {
                    error!(error = %err, "frame failed; tearing down wave lines");
                    self.unmount();
                    return;
                }
            }
        }

        self.pending_frame = Some(self.host.request_frame());
    }

    /// Tears everything down in a fixed order. Safe to call repeatedly.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.mounted = false;

        if let Some(request) = self.pending_frame.take() {
            self.host.cancel_frame(request);
        }
        if let Some(subscription) = self.resize_subscription.take() {
            self.host.unsubscribe(subscription);
        }
        for subscription in self.pointer_subscriptions.drain(..) {
            self.host.unsubscribe(subscription);
        }
        if let Some(mut session) = self.session.take() {
            session.dispose();
        }
        self.animation = None;
        info!("wave lines unmounted");
    }

    fn sync_blend_mode(&mut self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let mode = &session.resolved().mix_blend_mode;
        if self.blend_mode.as_ref() != Some(mode) {
            self.host.set_blend_mode(mode);
            self.blend_mode = Some(mode.clone());
        }
    }

    fn sync_pointer_subscriptions(&mut self, interactive: bool) {
        if interactive && self.pointer_subscriptions.is_empty() {
            self.pointer_subscriptions = vec![
                self.host.subscribe_pointer(PointerChannel::Move),
                self.host.subscribe_pointer(PointerChannel::Leave),
            ];
            debug!("pointer listeners registered");
        } else if !interactive && !self.pointer_subscriptions.is_empty() {
            for subscription in self.pointer_subscriptions.drain(..) {
                self.host.unsubscribe(subscription);
            }
            debug!("pointer listeners removed");
        }
    }

    /// True while a session is alive.
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn pending_frame(&self) -> Option<FrameRequest> {
        self.pending_frame
    }

    pub fn resize_mode(&self) -> ResizeMode {
        self.resize.mode()
    }

    pub fn backing_size(&self) -> PhysicalSize<u32> {
        self.resize.backing_size()
    }

    pub fn pointer_subscription_count(&self) -> usize {
        self.pointer_subscriptions.len()
    }

    /// Compositing mode last handed to the host.
    pub fn blend_mode(&self) -> Option<&str> {
        self.blend_mode.as_deref()
    }

    pub fn config(&self) -> &RenderConfiguration {
        &self.config
    }

    pub fn session(&self) -> Option<&RenderSession<H::Backend>> {
        self.session.as_ref()
    }

    pub fn animation(&self) -> Option<&AnimationLoop> {
        self.animation.as_ref()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

impl<H: Host> Drop for FloatingLines<H> {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use lineconfig::{BandValue, WaveKind};
    use winit::dpi::LogicalPosition;

    use super::*;
    use crate::field::shade_traced;
    use crate::runtime::SteppedTimeSource;
    use crate::session::testing::{RecordingBackend, SharedLedger};
    use crate::session::FrameError;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        RequestFrame(FrameRequest),
        CancelFrame(FrameRequest),
        ObserveResize,
        Subscribe(PointerChannel),
        Unsubscribe(Subscription),
    }

    struct TestHost {
        css: LogicalSize<f64>,
        pixel_ratio: f64,
        resize_supported: bool,
        gpu_available: bool,
        ledger: SharedLedger,
        next_id: u64,
        live: HashSet<Subscription>,
        resize_handle: Option<Subscription>,
        calls: Vec<Call>,
        blend_modes: Vec<String>,
    }

    impl TestHost {
        fn new(width: f64, height: f64) -> Self {
            Self {
                css: LogicalSize::new(width, height),
                pixel_ratio: 1.0,
                resize_supported: true,
                gpu_available: true,
                ledger: SharedLedger::default(),
                next_id: 0,
                live: HashSet::new(),
                resize_handle: None,
                calls: Vec::new(),
                blend_modes: Vec::new(),
            }
        }

        fn next(&mut self) -> u64 {
            self.next_id += 1;
            self.next_id
        }

        fn pointer_listeners(&self) -> usize {
            self.live
                .iter()
                .filter(|handle| Some(**handle) != self.resize_handle)
                .count()
        }
    }

    impl Host for TestHost {
        type Backend = RecordingBackend;

        fn content_box(&self) -> LogicalSize<f64> {
            self.css
        }

        fn device_pixel_ratio(&self) -> f64 {
            self.pixel_ratio
        }

        fn create_backend(
            &mut self,
            _size: PhysicalSize<u32>,
        ) -> Result<RecordingBackend, SessionError> {
            if self.gpu_available {
                Ok(RecordingBackend::new(&self.ledger))
            } else {
                Err(SessionError::resource("no adapter"))
            }
        }

        fn request_frame(&mut self) -> FrameRequest {
            let request = FrameRequest(self.next());
            self.calls.push(Call::RequestFrame(request));
            request
        }

        fn cancel_frame(&mut self, request: FrameRequest) {
            self.calls.push(Call::CancelFrame(request));
        }

        fn observe_resize(&mut self) -> Option<Subscription> {
            if !self.resize_supported {
                return None;
            }
            let handle = Subscription(self.next());
            self.calls.push(Call::ObserveResize);
            self.live.insert(handle);
            self.resize_handle = Some(handle);
            Some(handle)
        }

        fn subscribe_pointer(&mut self, channel: PointerChannel) -> Subscription {
            let handle = Subscription(self.next());
            self.calls.push(Call::Subscribe(channel));
            self.live.insert(handle);
            handle
        }

        fn unsubscribe(&mut self, subscription: Subscription) {
            self.calls.push(Call::Unsubscribe(subscription));
            self.live.remove(&subscription);
        }

        fn set_blend_mode(&mut self, mode: &str) {
            self.blend_modes.push(mode.to_string());
        }
    }

    fn mount(host: TestHost, config: RenderConfiguration) -> FloatingLines<TestHost> {
        FloatingLines::mount_with_clock(host, config, Box::new(SteppedTimeSource::new(0.016)))
    }

    fn run_frame(widget: &mut FloatingLines<TestHost>) {
        let request = widget.pending_frame().expect("a frame is scheduled");
        widget.frame(request);
    }

    #[test]
    fn mount_then_unmount_before_first_frame() {
        let host = TestHost::new(640.0, 480.0);
        let ledger = host.ledger.clone();
        let mut widget = mount(host, RenderConfiguration::default());
        assert_eq!(ledger.borrow().live, 1);

        widget.unmount();

        assert_eq!(ledger.borrow().live, 0);
        assert!(ledger.borrow().draws.is_empty());
        let host = widget.host();
        assert!(host.live.is_empty());
        let teardown: Vec<&Call> = host
            .calls
            .iter()
            .skip_while(|call| !matches!(call, Call::CancelFrame(_)))
            .collect();
        assert!(matches!(teardown[0], Call::CancelFrame(FrameRequest(4))));
        assert!(matches!(teardown[1], Call::Unsubscribe(Subscription(1))));
        assert!(matches!(teardown[2], Call::Unsubscribe(Subscription(2))));
        assert!(matches!(teardown[3], Call::Unsubscribe(Subscription(3))));
        assert_eq!(teardown.len(), 4);
    }

    #[test]
    fn unmount_is_idempotent_and_runs_on_drop() {
        let host = TestHost::new(100.0, 100.0);
        let ledger = host.ledger.clone();
        let mut widget = mount(host, RenderConfiguration::default());
        widget.unmount();
        let calls = widget.host().calls.len();
        widget.unmount();
        assert_eq!(widget.host().calls.len(), calls);
        drop(widget);
        assert_eq!(ledger.borrow().live, 0);

        let host = TestHost::new(100.0, 100.0);
        let ledger = host.ledger.clone();
        drop(mount(host, RenderConfiguration::default()));
        assert_eq!(ledger.borrow().live, 0);
    }

    #[test]
    fn non_interactive_middle_band_end_to_end() {
        let host = TestHost::new(320.0, 240.0);
        let ledger = host.ledger.clone();
        let config = RenderConfiguration {
            enabled_waves: Some(vec![WaveKind::Middle]),
            line_count: Some(BandValue::Scalar(3)),
            interactive: Some(false),
            ..RenderConfiguration::default()
        };
        let mut widget = mount(host, config);
        assert_eq!(widget.pointer_subscription_count(), 0);
        assert_eq!(widget.host().pointer_listeners(), 0);
        assert!(!widget
            .host()
            .calls
            .iter()
            .any(|call| matches!(call, Call::Subscribe(_))));

        widget.handle_pointer(PointerEvent::Moved(LogicalPosition::new(10.0, 10.0)));
        run_frame(&mut widget);

        let uniforms = ledger.borrow().draws[0];
        let mut trace = Vec::new();
        shade_traced(&uniforms, [100.0, 120.0], &mut trace);
        assert_eq!(trace.len(), 3);
        assert!(trace
            .iter()
            .all(|line| line.band == WaveKind::Middle && line.weight == 1.0 && line.bend == 0.0));
    }

    #[test]
    fn toggling_interactive_registers_and_releases_listeners() {
        let host = TestHost::new(320.0, 240.0);
        let mut widget = mount(host, RenderConfiguration::default());
        assert_eq!(widget.host().pointer_listeners(), 2);

        widget.apply(RenderConfiguration {
            interactive: Some(false),
            ..RenderConfiguration::default()
        });
        assert_eq!(widget.host().pointer_listeners(), 0);
        assert_eq!(widget.pointer_subscription_count(), 0);

        widget.apply(RenderConfiguration::default());
        widget.apply(RenderConfiguration::default());
        assert_eq!(widget.host().pointer_listeners(), 2);
    }

    #[test]
    fn missing_gpu_leaves_widget_inert() {
        let mut host = TestHost::new(320.0, 240.0);
        host.gpu_available = false;
        let mut widget = mount(host, RenderConfiguration::default());
        assert!(!widget.is_active());
        assert_eq!(widget.pending_frame(), None);

        widget.apply(RenderConfiguration::default());
        widget.handle_resize();
        widget.handle_pointer(PointerEvent::Left);
        widget.frame(FrameRequest(1));
        widget.unmount();
        assert!(widget.host().calls.is_empty());
    }

    #[test]
    fn zero_sized_container_defers_output() {
        let host = TestHost::new(0.0, 0.0);
        let ledger = host.ledger.clone();
        let mut widget = mount(host, RenderConfiguration::default());
        run_frame(&mut widget);
        run_frame(&mut widget);
        assert!(ledger.borrow().draws.is_empty());

        widget.host_mut().css = LogicalSize::new(200.0, 100.0);
        widget.handle_resize();
        run_frame(&mut widget);
        assert_eq!(ledger.borrow().draws.len(), 1);
        assert_eq!(
            ledger.borrow().draws[0].resolution,
            [200.0, 100.0, 1.0, 0.0]
        );
    }

    #[test]
    fn resize_uses_clamped_backing_store() {
        let mut host = TestHost::new(800.0, 600.0);
        host.pixel_ratio = 1.0;
        let ledger = host.ledger.clone();
        let mut widget = mount(host, RenderConfiguration::default());
        widget.host_mut().pixel_ratio = 3.0;
        widget.handle_resize();
        assert_eq!(widget.backing_size(), PhysicalSize::new(1600, 1200));
        assert_eq!(
            ledger.borrow().configured,
            vec![PhysicalSize::new(1600, 1200)]
        );
        assert_eq!(ledger.borrow().created, 1);
        run_frame(&mut widget);
        assert_eq!(
            ledger.borrow().draws[0].resolution,
            [1600.0, 1200.0, 1.0, 0.0]
        );
    }

    #[test]
    fn unsupported_resize_observation_is_single_shot() {
        let mut host = TestHost::new(300.0, 200.0);
        host.resize_supported = false;
        let ledger = host.ledger.clone();
        let mut widget = mount(host, RenderConfiguration::default());
        assert!(widget.is_active());
        assert_eq!(widget.resize_mode(), ResizeMode::SingleShot);

        widget.host_mut().css = LogicalSize::new(900.0, 900.0);
        widget.handle_resize();
        assert_eq!(widget.backing_size(), PhysicalSize::new(300, 200));
        assert!(ledger.borrow().configured.is_empty());
    }

    #[test]
    fn stale_frame_requests_are_ignored() {
        let host = TestHost::new(100.0, 100.0);
        let ledger = host.ledger.clone();
        let mut widget = mount(host, RenderConfiguration::default());
        widget.frame(FrameRequest(999));
        assert!(ledger.borrow().draws.is_empty());
        run_frame(&mut widget);
        assert_eq!(ledger.borrow().draws.len(), 1);
    }

    #[test]
    fn pointer_input_reaches_the_uniforms() {
        let host = TestHost::new(100.0, 100.0);
        let ledger = host.ledger.clone();
        let mut widget = mount(
            host,
            RenderConfiguration {
                mouse_damping: Some(1.0),
                ..RenderConfiguration::default()
            },
        );
        widget.handle_pointer(PointerEvent::Moved(LogicalPosition::new(25.0, 10.0)));
        run_frame(&mut widget);
        assert_eq!(ledger.borrow().draws[0].pointer, [25.0, 90.0, 1.0, 0.0]);
    }

    #[test]
    fn fatal_frame_error_tears_down() {
        let host = TestHost::new(100.0, 100.0);
        let ledger = host.ledger.clone();
        let mut widget = mount(host, RenderConfiguration::default());
        if let Some(session) = widget.session.as_mut() {
            if let Some(backend) = session.backend_mut() {
                backend.fail_next(FrameError::OutOfMemory);
            }
        }
        run_frame(&mut widget);
        assert!(!widget.is_active());
        assert_eq!(ledger.borrow().live, 0);
        assert!(widget.host().live.is_empty());
    }

    #[test]
    fn blend_mode_is_forwarded_on_mount_and_change() {
        let mut widget = mount(TestHost::new(320.0, 200.0), RenderConfiguration::default());
        assert_eq!(widget.host().blend_modes, vec!["screen".to_string()]);
        assert_eq!(widget.blend_mode(), Some("screen"));

        widget.apply(RenderConfiguration::default());
        assert_eq!(widget.host().blend_modes.len(), 1);

        widget.apply(RenderConfiguration {
            mix_blend_mode: Some("multiply".into()),
            ..RenderConfiguration::default()
        });
        assert_eq!(
            widget.host().blend_modes,
            vec!["screen".to_string(), "multiply".to_string()]
        );
        assert_eq!(widget.blend_mode(), Some("multiply"));
    }

    #[test]
    fn inert_widget_forwards_no_blend_mode() {
        let mut host = TestHost::new(320.0, 200.0);
        host.gpu_available = false;
        let widget = mount(host, RenderConfiguration::default());
        assert!(widget.host().blend_modes.is_empty());
        assert_eq!(widget.blend_mode(), None);
    }
}
