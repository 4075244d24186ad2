use lineconfig::ResolvedConfiguration;
use winit::dpi::LogicalSize;

use crate::damping::DampingEngine;
use crate::parallax::ParallaxTracker;
use crate::pointer::{PointerEvent, PointerInputTracker};
use crate::runtime::{BoxedTimeSource, TimeSample};
use crate::session::{FrameError, RenderBackend, RenderSession};

/// Advances the clock, converges tracked state and issues the draw.
///
/// One `tick` is one frame. Configuration applied between ticks is picked up
/// by the next tick since both run on the render thread.
pub struct AnimationLoop {
    clock: BoxedTimeSource,
    damping: DampingEngine,
    pointer: PointerInputTracker,
    parallax: ParallaxTracker,
    interactive: bool,
    parallax_enabled: bool,
}

impl AnimationLoop {
    pub fn new(clock: BoxedTimeSource, resolved: &ResolvedConfiguration) -> Self {
        let mut animation = Self {
            clock,
            damping: DampingEngine::default(),
            pointer: PointerInputTracker::new(),
            parallax: ParallaxTracker::new(resolved.parallax_strength),
            interactive: resolved.interactive,
            parallax_enabled: resolved.parallax,
        };
        animation.configure(resolved);
        animation
    }

    /// Picks up damping, strength and feature toggles from a new snapshot.
    pub fn configure(&mut self, resolved: &ResolvedConfiguration) {
        self.damping.set_factor(resolved.mouse_damping);
        self.parallax.set_strength(resolved.parallax_strength);
        self.interactive = resolved.interactive;
        self.parallax_enabled = resolved.parallax;
    }

    /// Routes raw pointer input to both trackers.
    pub fn pointer_event(
        &mut self,
        event: PointerEvent,
        surface: LogicalSize<f64>,
        pixel_ratio: f64,
    ) {
        match event {
            PointerEvent::Moved(local) => {
                self.pointer.pointer_moved(local, surface, pixel_ratio);
                if self.parallax_enabled {
                    self.parallax.pointer_moved(local, surface);
                }
            }
            PointerEvent::Left => self.pointer.pointer_left(),
        }
    }

    /// Runs one frame: clock, damping, uniform push, draw.
    pub fn tick<B: RenderBackend>(
        &mut self,
        session: &mut RenderSession<B>,
    ) -> Result<TimeSample, FrameError> {
        let sample = self.clock.sample();

        if self.interactive {
            self.pointer.advance(&self.damping);
        }
        if self.parallax_enabled {
            self.parallax.advance(&self.damping);
        }

        let uniforms = session.uniforms_mut();
        uniforms.set_time(sample.seconds);
        if self.interactive {
            uniforms.set_pointer(self.pointer.position(), self.pointer.influence());
        }
        if self.parallax_enabled {
            uniforms.set_parallax_offset(self.parallax.offset());
        }

        session.render_frame()?;
        tracing::trace!(
            frame = sample.frame_index,
            seconds = sample.seconds,
            "wave frame drawn"
        );
        Ok(sample)
    }

    pub fn pointer(&self) -> &PointerInputTracker {
        &self.pointer
    }

    pub fn parallax(&self) -> &ParallaxTracker {
        &self.parallax
    }

    pub fn damping(&self) -> &DampingEngine {
        &self.damping
    }
}
