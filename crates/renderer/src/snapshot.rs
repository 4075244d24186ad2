use image::{Rgb, RgbImage};
use lineconfig::RenderConfiguration;
use winit::dpi::{LogicalPosition, LogicalSize, PhysicalSize};

use crate::bridge::ConfigurationBridge;
use crate::damping::DampingEngine;
use crate::field;
use crate::parallax::ParallaxTracker;
use crate::pointer::PointerInputTracker;
use crate::uniforms::WaveUniforms;

/// Renders one frame at `time` seconds into an image of `size` pixels.
///
/// A `pointer` (pixels from the top-left corner) is treated as having rested
/// there long enough for damping to settle. It only has an effect where the
/// configuration enables interaction or parallax.
pub fn render_still(
    config: &RenderConfiguration,
    size: PhysicalSize<u32>,
    time: f32,
    pointer: Option<LogicalPosition<f64>>,
) -> RgbImage {
    let uniforms = still_uniforms(config, size, time, pointer);
    let height = size.height as f32;

    let started = std::time::Instant::now();
    let image = RgbImage::from_fn(size.width, size.height, |x, y| {
        let frag = [x as f32 + 0.5, height - (y as f32 + 0.5)];
        let color = field::shade(&uniforms, frag);
        Rgb(color.map(to_channel))
    });
    tracing::debug!(
        width = size.width,
        height = size.height,
        time,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "rendered still frame"
    );
    image
}

/// The uniform block a still frame is shaded with.
pub fn still_uniforms(
    config: &RenderConfiguration,
    size: PhysicalSize<u32>,
    time: f32,
    pointer: Option<LogicalPosition<f64>>,
) -> WaveUniforms {
    let mut uniforms = WaveUniforms::default();
    let resolved = ConfigurationBridge::new().apply(config, &mut uniforms).clone();
    uniforms.set_resolution([
        size.width.max(1) as f32,
        size.height.max(1) as f32,
        1.0,
        0.0,
    ]);
    uniforms.set_time(time);

    if let Some(position) = pointer {
        let surface = LogicalSize::new(size.width as f64, size.height as f64);
        let settled = DampingEngine::new(1.0);
        if resolved.interactive {
            let mut tracker = PointerInputTracker::new();
            tracker.pointer_moved(position, surface, 1.0);
            tracker.advance(&settled);
            uniforms.set_pointer(tracker.position(), tracker.influence());
        }
        if resolved.parallax {
            let mut tracker = ParallaxTracker::new(resolved.parallax_strength);
            tracker.pointer_moved(position, surface);
            tracker.advance(&settled);
            uniforms.set_parallax_offset(tracker.offset());
        }
    }

    uniforms
}

fn to_channel(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}
