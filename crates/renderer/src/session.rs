use lineconfig::{RenderConfiguration, ResolvedConfiguration};
use tracing::{debug, info};
use winit::dpi::PhysicalSize;

use crate::bridge::ConfigurationBridge;
use crate::uniforms::WaveUniforms;

/// Initialization failure. Never escalated past the widget.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("GPU context unavailable: {reason}")]
    Resource { reason: String },
}

impl SessionError {
    pub fn resource(reason: impl Into<String>) -> Self {
        Self::Resource {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// The surface was lost or went stale; it has been reconfigured.
    #[error("surface lost; reconfigured")]
    SurfaceLost,
    #[error("timed out acquiring the next frame")]
    Timeout,
    #[error("GPU out of memory")]
    OutOfMemory,
    #[error("frame failed: {0}")]
    Other(String),
}

impl FrameError {
    /// Whether the session can keep drawing after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::SurfaceLost | Self::Timeout)
    }
}

/// Something that can put the wave field on screen.
///
/// Implementations own their GPU resources and release them on drop; the
/// session drops its backend exactly once.
pub trait RenderBackend {
    /// Resizes the backing store. Must not rebuild the program.
    fn configure(&mut self, size: PhysicalSize<u32>);
    /// Draws one frame with the given uniform values.
    fn draw(&mut self, uniforms: &WaveUniforms) -> Result<(), FrameError>;
}

pub struct RenderSession<B: RenderBackend> {
    backend: Option<B>,
    uniforms: WaveUniforms,
    bridge: ConfigurationBridge,
    surface: PhysicalSize<u32>,
    frames: u64,
}

impl<B: RenderBackend> RenderSession<B> {
    /// Creates the backend sized to `surface` and applies the first snapshot.
    pub fn initialize<F>(
        surface: PhysicalSize<u32>,
        resolution: [f32; 4],
        config: &RenderConfiguration,
        create: F,
    ) -> Result<Self, SessionError>
    where
        F: FnOnce(PhysicalSize<u32>) -> Result<B, SessionError>,
    {
        let backend = create(surface)?;
        let mut uniforms = WaveUniforms::default();
        uniforms.set_resolution(resolution);
        let mut bridge = ConfigurationBridge::new();
        bridge.apply(config, &mut uniforms);
        info!(
            width = surface.width,
            height = surface.height,
            "render session initialized"
        );
        Ok(Self {
            backend: Some(backend),
            uniforms,
            bridge,
            surface,
            frames: 0,
        })
    }

    pub fn apply(&mut self, config: &RenderConfiguration) -> &ResolvedConfiguration {
        self.bridge.apply(config, &mut self.uniforms)
    }

    /// Resizes the backing store and resolution uniform in place.
    pub fn resize(&mut self, surface: PhysicalSize<u32>, resolution: [f32; 4]) {
        self.uniforms.set_resolution(resolution);
        if surface == self.surface {
            return;
        }
        self.surface = surface;
        if let Some(backend) = self.backend.as_mut() {
            backend.configure(surface);
            debug!(
                width = surface.width,
                height = surface.height,
                "reconfigured backing store"
            );
        }
    }

    /// Draws with the current uniforms; a disposed session draws nothing.
    pub fn render_frame(&mut self) -> Result<(), FrameError> {
        let Some(backend) = self.backend.as_mut() else {
            return Ok(());
        };
        backend.draw(&self.uniforms)?;
        self.frames += 1;
        Ok(())
    }

    /// Releases every GPU resource. Safe to call any number of times.
    pub fn dispose(&mut self) {
        if let Some(backend) = self.backend.take() {
            drop(backend);
            info!(frames = self.frames, "render session disposed");
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.backend.is_none()
    }

    pub fn uniforms(&self) -> &WaveUniforms {
        &self.uniforms
    }

    pub fn uniforms_mut(&mut self) -> &mut WaveUniforms {
        &mut self.uniforms
    }

    pub fn resolved(&self) -> &ResolvedConfiguration {
        self.bridge.resolved()
    }

    pub fn surface_size(&self) -> PhysicalSize<u32> {
        self.surface
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames
    }

    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn backend_mut(&mut self) -> Option<&mut B> {
        self.backend.as_mut()
    }
}

impl<B: RenderBackend> Drop for RenderSession<B> {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    /// Counters shared between a test and the backends it creates.
    #[derive(Debug, Default)]
    pub(crate) struct BackendLedger {
        pub live: usize,
        pub created: usize,
        pub draws: Vec<WaveUniforms>,
        pub configured: Vec<PhysicalSize<u32>>,
    }

    pub(crate) type SharedLedger = Rc<RefCell<BackendLedger>>;

    /// Backend that records what it was asked to do.
    pub(crate) struct RecordingBackend {
        ledger: SharedLedger,
        fail_next: Option<FrameError>,
    }

    impl RecordingBackend {
        pub(crate) fn new(ledger: &SharedLedger) -> Self {
            {
                let mut ledger = ledger.borrow_mut();
                ledger.live += 1;
                ledger.created += 1;
            }
            Self {
                ledger: Rc::clone(ledger),
                fail_next: None,
            }
        }

        pub(crate) fn fail_next(&mut self, error: FrameError) {
            self.fail_next = Some(error);
        }
    }

    impl RenderBackend for RecordingBackend {
        fn configure(&mut self, size: PhysicalSize<u32>) {
            self.ledger.borrow_mut().configured.push(size);
        }

        fn draw(&mut self, uniforms: &WaveUniforms) -> Result<(), FrameError> {
            if let Some(error) = self.fail_next.take() {
                return Err(error);
            }
            self.ledger.borrow_mut().draws.push(*uniforms);
            Ok(())
        }
    }

    impl Drop for RecordingBackend {
        fn drop(&mut self) {
            self.ledger.borrow_mut().live -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use lineconfig::{BandValue, WaveKind};

    use super::testing::{RecordingBackend, SharedLedger};
    use super::*;

    const SIZE: PhysicalSize<u32> = PhysicalSize::new(320, 200);

    fn session(ledger: &SharedLedger) -> RenderSession<RecordingBackend> {
        RenderSession::initialize(
            SIZE,
            [320.0, 200.0, 1.0, 0.0],
            &RenderConfiguration::default(),
            |_| Ok(RecordingBackend::new(ledger)),
        )
        .expect("recording backend never fails")
    }

    #[test]
    fn apply_never_recreates_the_backend() {
        let ledger = SharedLedger::default();
        let mut session = session(&ledger);
        for count in 1..20 {
            session.apply(&RenderConfiguration {
                line_count: Some(BandValue::Scalar(count)),
                ..RenderConfiguration::default()
            });
        }
        assert_eq!(ledger.borrow().created, 1);
        assert_eq!(session.uniforms().band_line_count(WaveKind::Top), 19);
    }

    #[test]
    fn configuration_is_visible_to_the_next_draw() {
        let ledger = SharedLedger::default();
        let mut session = session(&ledger);
        session.apply(&RenderConfiguration {
            animation_speed: Some(4.0),
            ..RenderConfiguration::default()
        });
        session.render_frame().unwrap();
        assert_eq!(ledger.borrow().draws[0].animation_speed(), 4.0);
    }

    #[test]
    fn resize_reconfigures_only_on_change() {
        let ledger = SharedLedger::default();
        let mut session = session(&ledger);
        session.resize(SIZE, [320.0, 200.0, 1.0, 0.0]);
        session.resize(PhysicalSize::new(640, 400), [640.0, 400.0, 1.0, 0.0]);
        assert_eq!(
            ledger.borrow().configured,
            vec![PhysicalSize::new(640, 400)]
        );
        assert_eq!(session.uniforms().resolution, [640.0, 400.0, 1.0, 0.0]);
        assert_eq!(ledger.borrow().created, 1);
    }

    #[test]
    fn dispose_is_idempotent_and_releases_resources() {
        let ledger = SharedLedger::default();
        let mut session = session(&ledger);
        assert_eq!(ledger.borrow().live, 1);
        session.dispose();
        session.dispose();
        assert!(session.is_disposed());
        assert_eq!(ledger.borrow().live, 0);
        assert_eq!(session.render_frame(), Ok(()));
        drop(session);
        assert_eq!(ledger.borrow().live, 0);
    }

    #[test]
    fn failed_initialization_is_reported() {
        let result = RenderSession::<RecordingBackend>::initialize(
            SIZE,
            [320.0, 200.0, 1.0, 0.0],
            &RenderConfiguration::default(),
            |_| Err(SessionError::resource("no adapter")),
        );
        assert!(matches!(result, Err(SessionError::Resource { .. })));
    }

    #[test]
    fn frame_errors_propagate_without_counting() {
        let ledger = SharedLedger::default();
        let mut session = session(&ledger);
        if let Some(backend) = session.backend_mut() {
            backend.fail_next(FrameError::Timeout);
        }
        assert_eq!(session.render_frame(), Err(FrameError::Timeout));
        assert_eq!(session.frames_drawn(), 0);
        session.render_frame().unwrap();
        assert_eq!(session.frames_drawn(), 1);
    }
}
