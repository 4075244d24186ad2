use winit::dpi::{LogicalSize, PhysicalSize};

/// Highest device pixel ratio the backing store is allowed to use.
pub const MAX_PIXEL_RATIO: f64 = 2.0;

/// Clamps a device pixel ratio into `[1, MAX_PIXEL_RATIO]`.
pub fn clamp_pixel_ratio(ratio: f64) -> f64 {
    if !ratio.is_finite() || ratio < 1.0 {
        1.0
    } else {
        ratio.min(MAX_PIXEL_RATIO)
    }
}

/// Backing-store pixels for a CSS-sized box at the given device pixel ratio.
pub fn backing_store_size(css: LogicalSize<f64>, device_pixel_ratio: f64) -> PhysicalSize<u32> {
    let ratio = clamp_pixel_ratio(device_pixel_ratio);
    let scale = |value: f64| {
        if value.is_finite() && value > 0.0 {
            (value * ratio).floor() as u32
        } else {
            0
        }
    };
    PhysicalSize::new(scale(css.width), scale(css.height))
}

/// How container size changes reach the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeMode {
    /// The host reports every content-box change.
    Observed,
    /// No observation primitive; the size computed at mount is final.
    SingleShot,
}

#[derive(Debug, Clone)]
pub struct ResizeCoordinator {
    mode: ResizeMode,
    pixel_ratio: f64,
    css: LogicalSize<f64>,
    backing: PhysicalSize<u32>,
}

impl ResizeCoordinator {
    pub fn new(css: LogicalSize<f64>, device_pixel_ratio: f64, mode: ResizeMode) -> Self {
        Self {
            mode,
            pixel_ratio: clamp_pixel_ratio(device_pixel_ratio),
            css,
            backing: backing_store_size(css, device_pixel_ratio),
        }
    }

    pub fn mode(&self) -> ResizeMode {
        self.mode
    }

    /// Records a new content box; returns the backing size when it changed.
    pub fn observe(
        &mut self,
        css: LogicalSize<f64>,
        device_pixel_ratio: f64,
    ) -> Option<PhysicalSize<u32>> {
        if self.mode == ResizeMode::SingleShot {
            tracing::trace!("resize ignored; sizing is single-shot");
            return None;
        }

        self.css = css;
        self.pixel_ratio = clamp_pixel_ratio(device_pixel_ratio);
        let backing = backing_store_size(css, device_pixel_ratio);
        if backing == self.backing {
            return None;
        }
        self.backing = backing;
        Some(backing)
    }

    pub fn css_size(&self) -> LogicalSize<f64> {
        self.css
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.pixel_ratio
    }

    /// Backing store as computed; may be zero-sized before layout settles.
    pub fn backing_size(&self) -> PhysicalSize<u32> {
        self.backing
    }

    /// Backing store suitable for surface configuration (never zero).
    pub fn surface_size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(self.backing.width.max(1), self.backing.height.max(1))
    }

    /// False until the container reports a non-empty box.
    pub fn is_renderable(&self) -> bool {
        self.backing.width > 0 && self.backing.height > 0
    }

    /// Value for the resolution uniform, in backing-store pixels.
    pub fn resolution(&self) -> [f32; 4] {
        let size = self.surface_size();
        [size.width as f32, size.height as f32, 1.0, 0.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_ratio_is_clamped() {
        assert_eq!(clamp_pixel_ratio(3.0), 2.0);
        assert_eq!(clamp_pixel_ratio(1.5), 1.5);
        assert_eq!(clamp_pixel_ratio(0.5), 1.0);
        assert_eq!(clamp_pixel_ratio(f64::NAN), 1.0);
    }

    #[test]
    fn backing_store_uses_clamped_ratio() {
        let size = backing_store_size(LogicalSize::new(800.0, 600.0), 3.0);
        assert_eq!(size, PhysicalSize::new(1600, 1200));
        let size = backing_store_size(LogicalSize::new(333.3, 100.0), 1.5);
        assert_eq!(size, PhysicalSize::new(499, 150));
    }

    #[test]
    fn observe_reports_only_changes() {
        let mut coordinator =
            ResizeCoordinator::new(LogicalSize::new(400.0, 300.0), 1.0, ResizeMode::Observed);
        assert_eq!(
            coordinator.observe(LogicalSize::new(400.0, 300.0), 1.0),
            None
        );
        assert_eq!(
            coordinator.observe(LogicalSize::new(400.0, 300.0), 2.0),
            Some(PhysicalSize::new(800, 600))
        );
        assert_eq!(coordinator.resolution(), [800.0, 600.0, 1.0, 0.0]);
    }

    #[test]
    fn zero_box_is_not_renderable_until_resized() {
        let mut coordinator =
            ResizeCoordinator::new(LogicalSize::new(0.0, 0.0), 2.0, ResizeMode::Observed);
        assert!(!coordinator.is_renderable());
        assert_eq!(coordinator.surface_size(), PhysicalSize::new(1, 1));
        coordinator.observe(LogicalSize::new(10.0, 20.0), 2.0);
        assert!(coordinator.is_renderable());
        assert_eq!(coordinator.backing_size(), PhysicalSize::new(20, 40));
    }

    #[test]
    fn single_shot_ignores_later_changes() {
        let mut coordinator =
            ResizeCoordinator::new(LogicalSize::new(640.0, 480.0), 1.0, ResizeMode::SingleShot);
        assert_eq!(
            coordinator.observe(LogicalSize::new(1024.0, 768.0), 1.0),
            None
        );
        assert_eq!(coordinator.backing_size(), PhysicalSize::new(640, 480));
    }
}
