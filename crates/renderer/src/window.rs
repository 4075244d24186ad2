use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::{anyhow, Result};
use crossbeam_channel::{bounded, Sender};
use lineconfig::RenderConfiguration;
use tracing::{debug, info, warn};
use winit::dpi::{LogicalPosition, LogicalSize, PhysicalPosition, PhysicalSize};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy};
use winit::window::{Window, WindowBuilder};

use crate::gpu::WgpuBackend;
use crate::host::{FloatingLines, FrameRequest, Host, PointerChannel, Subscription};
use crate::pointer::PointerEvent;
use crate::resize::clamp_pixel_ratio;
use crate::session::SessionError;

/// How the preview window is opened.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewOptions {
    pub title: String,
    /// Inner size in logical pixels.
    pub size: LogicalSize<u32>,
    /// Overrides the monitor scale factor as device pixel ratio.
    pub device_pixel_ratio: Option<f64>,
    pub config: RenderConfiguration,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            title: "Wavelines Preview".to_string(),
            size: LogicalSize::new(1280, 720),
            device_pixel_ratio: None,
            config: RenderConfiguration::default(),
        }
    }
}

#[derive(Debug, Clone)]
enum PreviewCommand {
    Apply(Box<RenderConfiguration>),
    Shutdown,
}

/// Handle to a preview window running on its own thread.
pub struct PreviewRuntime {
    proxy: EventLoopProxy<PreviewCommand>,
    join_handle: Option<JoinHandle<Result<()>>>,
}

impl PreviewRuntime {
    pub fn spawn(options: PreviewOptions) -> Result<Self> {
        let (ready_tx, ready_rx) = bounded(1);
        let handle = thread::Builder::new()
            .name("wavelines-window".into())
            .spawn(move || run_window_thread(options, ready_tx))
            .map_err(|err| anyhow!("failed to spawn window thread: {err}"))?;

        let proxy = ready_rx
            .recv()
            .map_err(|err| anyhow!("window thread failed to initialise: {err}"))??;

        Ok(Self {
            proxy,
            join_handle: Some(handle),
        })
    }

    /// Sends a configuration snapshot to the running widget.
    pub fn apply(&self, config: RenderConfiguration) -> Result<()> {
        self.proxy
            .send_event(PreviewCommand::Apply(Box::new(config)))
            .map_err(|err| anyhow!("preview window is gone: {err}"))
    }

    /// True once the window was closed or the event loop failed.
    pub fn is_finished(&self) -> bool {
        self.join_handle
            .as_ref()
            .is_none_or(JoinHandle::is_finished)
    }

    pub fn shutdown(mut self) -> Result<()> {
        if let Some(handle) = self.join_handle.take() {
            let _ = self.proxy.send_event(PreviewCommand::Shutdown);
            handle
                .join()
                .map_err(|err| anyhow!("window thread panicked: {err:?}"))??;
        }
        Ok(())
    }
}

impl Drop for PreviewRuntime {
    fn drop(&mut self) {
        if let Some(handle) = self.join_handle.take() {
            let _ = self.proxy.send_event(PreviewCommand::Shutdown);
            let _ = handle.join();
        }
    }
}

/// [`Host`] backed by a `winit` window.
struct WindowHost {
    window: Arc<Window>,
    pixel_ratio_override: Option<f64>,
    next_id: u64,
    pending_frame: Option<FrameRequest>,
    resize_subscription: Option<Subscription>,
    pointer_listeners: HashMap<Subscription, PointerChannel>,
}

impl WindowHost {
    fn new(window: Arc<Window>, pixel_ratio_override: Option<f64>) -> Self {
        Self {
            window,
            pixel_ratio_override,
            next_id: 0,
            pending_frame: None,
            resize_subscription: None,
            pointer_listeners: HashMap::new(),
        }
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn take_frame(&mut self) -> Option<FrameRequest> {
        self.pending_frame.take()
    }

    fn listens(&self, channel: PointerChannel) -> bool {
        self.pointer_listeners
            .values()
            .any(|listener| *listener == channel)
    }

    fn observes_resize(&self) -> bool {
        self.resize_subscription.is_some()
    }

    fn local_position(&self, position: PhysicalPosition<f64>) -> LogicalPosition<f64> {
        position.to_logical(self.window.scale_factor())
    }
}

impl Host for WindowHost {
    type Backend = WgpuBackend;

    fn content_box(&self) -> LogicalSize<f64> {
        self.window
            .inner_size()
            .to_logical(self.window.scale_factor())
    }

    fn device_pixel_ratio(&self) -> f64 {
        self.pixel_ratio_override
            .unwrap_or_else(|| self.window.scale_factor())
    }

    fn create_backend(&mut self, size: PhysicalSize<u32>) -> Result<WgpuBackend, SessionError> {
        WgpuBackend::create(self.window.clone(), size)
    }

    fn request_frame(&mut self) -> FrameRequest {
        let request = FrameRequest(self.next_id());
        self.pending_frame = Some(request);
        self.window.request_redraw();
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        if self.pending_frame == Some(request) {
            self.pending_frame = None;
        }
    }

    fn observe_resize(&mut self) -> Option<Subscription> {
        let subscription = Subscription(self.next_id());
        self.resize_subscription = Some(subscription);
        Some(subscription)
    }

    fn subscribe_pointer(&mut self, channel: PointerChannel) -> Subscription {
        let subscription = Subscription(self.next_id());
        self.pointer_listeners.insert(subscription, channel);
        subscription
    }

    fn unsubscribe(&mut self, subscription: Subscription) {
        if self.resize_subscription == Some(subscription) {
            self.resize_subscription = None;
        }
        self.pointer_listeners.remove(&subscription);
    }

    fn set_blend_mode(&mut self, mode: &str) {
        debug!(mode, "preview window composites opaquely; blend mode not applied");
    }
}

fn run_window_thread(
    options: PreviewOptions,
    ready_tx: Sender<Result<EventLoopProxy<PreviewCommand>, anyhow::Error>>,
) -> Result<()> {
    let mut builder = EventLoopBuilder::<PreviewCommand>::with_user_event();
    #[cfg(any(target_os = "linux", target_os = "android"))]
    {
        use winit::platform::wayland::EventLoopBuilderExtWayland;
        EventLoopBuilderExtWayland::with_any_thread(&mut builder, true);
    }

    #[cfg(any(
        target_os = "freebsd",
        target_os = "openbsd",
        target_os = "netbsd",
        target_os = "dragonfly"
    ))]
    {
        use winit::platform::x11::EventLoopBuilderExtX11;
        EventLoopBuilderExtX11::with_any_thread(&mut builder, true);
    }

    let event_loop = match builder.build() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            let message = format!("failed to create event loop: {err}");
            let _ = ready_tx.send(Err(anyhow!(message.clone())));
            return Err(anyhow!(message));
        }
    };
    let proxy = event_loop.create_proxy();

    let window = match WindowBuilder::new()
        .with_title(options.title.as_str())
        .with_inner_size(options.size)
        .build(&event_loop)
    {
        Ok(window) => Arc::new(window),
        Err(err) => {
            let message = format!("failed to create preview window: {err}");
            let _ = ready_tx.send(Err(anyhow!(message.clone())));
            return Err(anyhow!(message));
        }
    };

    if let Some(ratio) = options.device_pixel_ratio {
        let clamped = clamp_pixel_ratio(ratio);
        if clamped != ratio {
            warn!(
                requested = ratio,
                used = clamped,
                "device pixel ratio clamped"
            );
        }
    }

    let window_id = window.id();
    let host = WindowHost::new(window, options.device_pixel_ratio);
    let mut widget = FloatingLines::mount(host, options.config);
    if !widget.is_active() {
        warn!("preview window opened without a renderer");
    }

    let _ = ready_tx.send(Ok(proxy));

    let run_result = event_loop.run(move |event, elwt| {
        elwt.set_control_flow(ControlFlow::Wait);
        match event {
            Event::UserEvent(PreviewCommand::Apply(config)) => {
                debug!("applying configuration snapshot");
                widget.apply(*config);
            }
            Event::UserEvent(PreviewCommand::Shutdown) => elwt.exit(),
            Event::WindowEvent {
                window_id: id,
                event,
            } if id == window_id => match event {
                WindowEvent::CloseRequested | WindowEvent::Destroyed => elwt.exit(),
                WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. }
                    if widget.host().observes_resize() =>
                {
                    widget.handle_resize();
                }
                WindowEvent::CursorMoved { position, .. }
                    if widget.host().listens(PointerChannel::Move) =>
                {
                    let local = widget.host().local_position(position);
                    widget.handle_pointer(PointerEvent::Moved(local));
                }
                WindowEvent::CursorLeft { .. } if widget.host().listens(PointerChannel::Leave) => {
                    widget.handle_pointer(PointerEvent::Left);
                }
                WindowEvent::RedrawRequested => {
                    if let Some(request) = widget.host_mut().take_frame() {
                        widget.frame(request);
                    }
                }
                _ => {}
            },
            Event::LoopExiting => widget.unmount(),
            _ => {}
        }
    });

    info!("preview window closed");
    run_result.map_err(|err| anyhow!("window event loop error: {err}"))
}
