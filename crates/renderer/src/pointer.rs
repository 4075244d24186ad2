use winit::dpi::{LogicalPosition, LogicalSize};

use crate::damping::{Damped, DampingEngine};

/// Pointer position used before the first move event; far outside any surface.
pub const OFFSCREEN_POINTER: [f32; 2] = [-1000.0, -1000.0];

/// Raw pointer input, in CSS pixels relative to the surface's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Moved(LogicalPosition<f64>),
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    /// No pointer over the surface.
    Idle,
    /// Pointer over the surface; the target position follows it.
    Active,
}

/// Tracks the bend target and how strongly the pointer currently applies.
///
/// Positions live in backing-store pixels with the Y axis pointing up.
#[derive(Debug, Clone)]
pub struct PointerInputTracker {
    phase: PointerPhase,
    position: Damped<[f32; 2]>,
    influence: Damped<f32>,
}

impl Default for PointerInputTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl PointerInputTracker {
    pub fn new() -> Self {
        Self {
            phase: PointerPhase::Idle,
            position: Damped::new(OFFSCREEN_POINTER),
            influence: Damped::new(0.0),
        }
    }

    pub fn phase(&self) -> PointerPhase {
        self.phase
    }

    pub fn pointer_moved(
        &mut self,
        local: LogicalPosition<f64>,
        surface: LogicalSize<f64>,
        pixel_ratio: f64,
    ) {
        let x = local.x * pixel_ratio;
        let y = (surface.height - local.y) * pixel_ratio;
        self.position.set_target([x as f32, y as f32]);
        self.influence.set_target(1.0);
        self.phase = PointerPhase::Active;
    }

    /// Fades the bend out; the target position stays where it was.
    pub fn pointer_left(&mut self) {
        self.influence.set_target(0.0);
        self.phase = PointerPhase::Idle;
    }

    pub fn advance(&mut self, engine: &DampingEngine) {
        engine.step(&mut self.position);
        engine.step(&mut self.influence);
    }

    pub fn target_position(&self) -> [f32; 2] {
        self.position.target()
    }

    pub fn position(&self) -> [f32; 2] {
        self.position.current()
    }

    pub fn target_influence(&self) -> f32 {
        self.influence.target()
    }

    pub fn influence(&self) -> f32 {
        self.influence.current()
    }
}
