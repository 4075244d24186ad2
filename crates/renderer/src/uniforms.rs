use bytemuck::{Pod, Zeroable};
use lineconfig::{ResolvedConfiguration, WaveKind};

use crate::color::MAX_GRADIENT_STOPS;
use crate::pointer::OFFSCREEN_POINTER;

/// The std140 block shared by the fragment shader and the CPU field.
///
/// Every member is a `vec4`/`ivec4` (or an array of them) so the Rust layout
/// matches std140 without explicit padding. Per-band arrays are indexed by
/// [`WaveKind::index`].
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct WaveUniforms {
    /// Backing-store width, height, 1, unused.
    pub resolution: [f32; 4],
    /// Elapsed seconds, animation speed.
    pub timing: [f32; 4],
    /// Damped pointer x, y (backing pixels, Y up), damped influence.
    pub pointer: [f32; 4],
    /// Bend radius, bend strength.
    pub bend: [f32; 4],
    /// Damped parallax offset x, y, parallax strength.
    pub parallax: [f32; 4],
    /// Interactive, parallax, gradient stop count.
    pub flags: [i32; 4],
    pub band_enabled: [i32; 4],
    pub band_line_count: [i32; 4],
    pub band_line_distance: [f32; 4],
    /// x, y, rotate per band.
    pub band_position: [[f32; 4]; 3],
    pub gradient: [[f32; 4]; MAX_GRADIENT_STOPS],
}

const FLAG_INTERACTIVE: usize = 0;
const FLAG_PARALLAX: usize = 1;
const FLAG_GRADIENT_COUNT: usize = 2;

impl Default for WaveUniforms {
    fn default() -> Self {
        let mut uniforms = Self::zeroed();
        uniforms.resolution = [1.0, 1.0, 1.0, 0.0];
        uniforms.pointer = [OFFSCREEN_POINTER[0], OFFSCREEN_POINTER[1], 0.0, 0.0];
        uniforms.gradient = [[1.0, 1.0, 1.0, 0.0]; MAX_GRADIENT_STOPS];
        uniforms.apply_resolved(&ResolvedConfiguration::default());
        uniforms
    }
}

impl WaveUniforms {
    /// Writes every configuration-derived member except the gradient.
    pub fn apply_resolved(&mut self, resolved: &ResolvedConfiguration) {
        self.timing[1] = resolved.animation_speed;
        self.bend[0] = resolved.bend_radius;
        self.bend[1] = resolved.bend_strength;
        self.parallax[2] = resolved.parallax_strength;
        self.flags[FLAG_INTERACTIVE] = resolved.interactive as i32;
        self.flags[FLAG_PARALLAX] = resolved.parallax as i32;

        for kind in WaveKind::ALL {
            let band = resolved.band(kind);
            let slot = kind.index();
            self.band_enabled[slot] = band.enabled as i32;
            self.band_line_count[slot] = band.line_count.min(i32::MAX as u32) as i32;
            self.band_line_distance[slot] = band.line_distance;
            self.band_position[slot] = [
                band.position.x,
                band.position.y,
                band.position.rotate,
                0.0,
            ];
        }
    }

    pub fn set_gradient(&mut self, stops: [[f32; 4]; MAX_GRADIENT_STOPS], count: i32) {
        self.gradient = stops;
        self.flags[FLAG_GRADIENT_COUNT] = count;
    }

    pub fn set_resolution(&mut self, resolution: [f32; 4]) {
        self.resolution = resolution;
    }

    pub fn set_time(&mut self, seconds: f32) {
        self.timing[0] = seconds;
    }

    pub fn set_pointer(&mut self, position: [f32; 2], influence: f32) {
        self.pointer[0] = position[0];
        self.pointer[1] = position[1];
        self.pointer[2] = influence;
    }

    pub fn set_parallax_offset(&mut self, offset: [f32; 2]) {
        self.parallax[0] = offset[0];
        self.parallax[1] = offset[1];
    }

    pub fn elapsed(&self) -> f32 {
        self.timing[0]
    }

    pub fn animation_speed(&self) -> f32 {
        self.timing[1]
    }

    pub fn interactive(&self) -> bool {
        self.flags[FLAG_INTERACTIVE] != 0
    }

    pub fn parallax_enabled(&self) -> bool {
        self.flags[FLAG_PARALLAX] != 0
    }

    pub fn gradient_count(&self) -> usize {
        self.flags[FLAG_GRADIENT_COUNT].clamp(0, MAX_GRADIENT_STOPS as i32) as usize
    }

    pub fn band_enabled(&self, kind: WaveKind) -> bool {
        self.band_enabled[kind.index()] != 0
    }

    pub fn band_line_count(&self, kind: WaveKind) -> u32 {
        self.band_line_count[kind.index()].max(0) as u32
    }

    pub fn band_line_distance(&self, kind: WaveKind) -> f32 {
        self.band_line_distance[kind.index()]
    }

    /// `[x, y, rotate]` for the band.
    pub fn band_position(&self, kind: WaveKind) -> [f32; 3] {
        let [x, y, rotate, _] = self.band_position[kind.index()];
        [x, y, rotate]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lineconfig::{BandValue, RenderConfiguration};

    #[test]
    fn block_matches_std140_size() {
        assert_eq!(std::mem::size_of::<WaveUniforms>(), 320);
        assert_eq!(std::mem::size_of::<WaveUniforms>() % 16, 0);
    }

    #[test]
    fn defaults_reflect_resolved_defaults() {
        let uniforms = WaveUniforms::default();
        assert!(uniforms.interactive());
        assert!(uniforms.parallax_enabled());
        assert_eq!(uniforms.gradient_count(), 0);
        assert_eq!(uniforms.animation_speed(), 1.0);
        assert_eq!(uniforms.pointer[2], 0.0);
        for kind in WaveKind::ALL {
            assert!(uniforms.band_enabled(kind));
            assert_eq!(uniforms.band_line_count(kind), 6);
        }
        assert_eq!(uniforms.band_position(WaveKind::Top), [10.0, 0.5, -0.4]);
    }

    #[test]
    fn apply_writes_per_band_slots() {
        let config = RenderConfiguration {
            enabled_waves: Some(vec![WaveKind::Bottom]),
            line_count: Some(BandValue::Scalar(4)),
            interactive: Some(false),
            ..RenderConfiguration::default()
        };
        let mut uniforms = WaveUniforms::default();
        uniforms.apply_resolved(&ResolvedConfiguration::resolve(&config));
        assert!(!uniforms.interactive());
        assert_eq!(uniforms.band_line_count(WaveKind::Bottom), 4);
        assert_eq!(uniforms.band_line_count(WaveKind::Top), 0);
        assert!(!uniforms.band_enabled(WaveKind::Middle));
        assert_eq!(uniforms.band_enabled[WaveKind::Bottom.index()], 1);
    }
}
