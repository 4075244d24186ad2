//! Renderer crate for Wavelines, an animated wave-line backdrop.
//!
//! The crate renders three bands of procedurally animated lines with a single
//! full-screen `wgpu` draw and reacts to pointer position and container size.
//! The overall flow is:
//!
//! ```text
//!   host (window / page)
//!          │ mount(config)                 apply(config)
//!          ▼                                    │
//!   FloatingLines ──▶ RenderSession ◀── ConfigurationBridge ──▶ WaveUniforms
//!          │                ▲
//!          │ frame()        │ draw
//!          ▼                │
//!   AnimationLoop ── clock ─┴─ DampingEngine(pointer, parallax)
//! ```
//!
//! `RenderSession` is the only owner of GPU resources; configuration updates,
//! resizes and pointer input only rewrite the uniform block. The `field`
//! module evaluates the same block on the CPU for still exports and tests.

pub mod animation;
pub mod bridge;
pub mod color;
pub mod damping;
pub mod field;
pub mod gpu;
pub mod host;
pub mod parallax;
pub mod pointer;
pub mod resize;
pub mod runtime;
pub mod session;
pub mod snapshot;
pub mod uniforms;
pub mod window;

pub use animation::AnimationLoop;
pub use bridge::ConfigurationBridge;
pub use color::{parse_color, GradientTable, MAX_GRADIENT_STOPS};
pub use damping::{Damped, DampingEngine};
pub use gpu::WgpuBackend;
pub use host::{FloatingLines, FrameRequest, Host, PointerChannel, Subscription};
pub use parallax::ParallaxTracker;
pub use pointer::{PointerEvent, PointerInputTracker, PointerPhase};
pub use resize::{ResizeCoordinator, ResizeMode};
pub use runtime::{BoxedTimeSource, SteppedTimeSource, SystemTimeSource, TimeSample, TimeSource};
pub use session::{FrameError, RenderBackend, RenderSession, SessionError};
pub use snapshot::render_still;
pub use uniforms::WaveUniforms;
pub use window::{PreviewOptions, PreviewRuntime};

pub use lineconfig::{RenderConfiguration, ResolvedConfiguration, WaveKind};
pub use winit::dpi;
