use winit::dpi::{LogicalPosition, LogicalSize};

use crate::damping::{Damped, DampingEngine};

#[derive(Debug, Clone)]
pub struct ParallaxTracker {
    offset: Damped<[f32; 2]>,
    strength: f32,
}

impl ParallaxTracker {
    pub fn new(strength: f32) -> Self {
        Self {
            offset: Damped::new([0.0, 0.0]),
            strength,
        }
    }

    pub fn strength(&self) -> f32 {
        self.strength
    }

    /// Takes effect on the next pointer move.
    pub fn set_strength(&mut self, strength: f32) {
        self.strength = strength;
    }

    pub fn pointer_moved(&mut self, local: LogicalPosition<f64>, surface: LogicalSize<f64>) {
        if surface.width <= 0.0 || surface.height <= 0.0 {
            return;
        }
        let center_x = surface.width / 2.0;
        let center_y = surface.height / 2.0;
        let offset_x = (local.x - center_x) / surface.width;
        let offset_y = -(local.y - center_y) / surface.height;
        self.offset.set_target([
            offset_x as f32 * self.strength,
            offset_y as f32 * self.strength,
        ]);
    }

    pub fn advance(&mut self, engine: &DampingEngine) {
        engine.step(&mut self.offset);
    }

    pub fn target_offset(&self) -> [f32; 2] {
        self.offset.target()
    }

    pub fn offset(&self) -> [f32; 2] {
        self.offset.current()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SURFACE: LogicalSize<f64> = LogicalSize::new(800.0, 400.0);

    #[test]
    fn offset_is_relative_to_center_and_scaled() {
        let mut tracker = ParallaxTracker::new(0.2);
        tracker.pointer_moved(LogicalPosition::new(600.0, 100.0), SURFACE);
        let target = tracker.target_offset();
        assert!((target[0] - 0.05).abs() < 1e-6);
        assert!((target[1] - 0.05).abs() < 1e-6);
        assert_eq!(tracker.offset(), [0.0, 0.0]);
    }

    #[test]
    fn center_produces_no_offset() {
        let mut tracker = ParallaxTracker::new(1.0);
        tracker.pointer_moved(LogicalPosition::new(400.0, 200.0), SURFACE);
        assert_eq!(tracker.target_offset(), [0.0, 0.0]);
    }

    #[test]
    fn damping_moves_current_toward_target() {
        let engine = DampingEngine::new(0.5);
        let mut tracker = ParallaxTracker::new(1.0);
        tracker.pointer_moved(LogicalPosition::new(800.0, 400.0), SURFACE);
        tracker.advance(&engine);
        let offset = tracker.offset();
        assert!((offset[0] - 0.25).abs() < 1e-6);
        assert!((offset[1] + 0.25).abs() < 1e-6);
    }

    #[test]
    fn empty_surface_is_ignored() {
        let mut tracker = ParallaxTracker::new(1.0);
        tracker.pointer_moved(LogicalPosition::new(5.0, 5.0), LogicalSize::new(0.0, 0.0));
        assert_eq!(tracker.target_offset(), [0.0, 0.0]);
    }
}
