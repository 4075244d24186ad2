//! CPU evaluation of the wave-line field.
//!
//! Mirrors the fragment shader in `gpu::shader` line for line and reads the
//! same [`WaveUniforms`] block. It backs still-frame export and lets the
//! accumulation order and per-band weighting be checked without a GPU.

use lineconfig::WaveKind;

use crate::color::{mix, sample_stops, Rgb};
use crate::uniforms::WaveUniforms;

/// Bands are accumulated in this order.
pub const BAND_ORDER: [WaveKind; 3] = [WaveKind::Bottom, WaveKind::Middle, WaveKind::Top];

const PINK: Rgb = [233.0 / 255.0, 71.0 / 255.0, 245.0 / 255.0];
const BLUE: Rgb = [47.0 / 255.0, 75.0 / 255.0, 162.0 / 255.0];
const BLACK: Rgb = [0.0, 0.0, 0.0];

/// Fixed contribution weight of each band.
pub fn band_weight(kind: WaveKind) -> f32 {
    match kind {
        WaveKind::Bottom => 0.2,
        WaveKind::Middle => 1.0,
        WaveKind::Top => 0.1,
    }
}

fn band_phase(kind: WaveKind, index: f32) -> f32 {
    match kind {
        WaveKind::Bottom => 1.5 + 0.2 * index,
        WaveKind::Middle => 2.0 + 0.15 * index,
        WaveKind::Top => 1.0 + 0.2 * index,
    }
}

/// One line's share of a shaded pixel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineContribution {
    pub band: WaveKind,
    pub index: u32,
    pub weight: f32,
    /// Coordinate the wave was sampled at, after whirl, mirror and offset.
    pub sample: [f32; 2],
    /// Vertical displacement added by the pointer bend.
    pub bend: f32,
    pub intensity: f32,
    pub color: Rgb,
}

/// Maps a fragment coordinate (bottom-left origin) into scene space.
pub fn scene_uv(frag: [f32; 2], resolution: [f32; 2]) -> [f32; 2] {
    let height = resolution[1].max(f32::MIN_POSITIVE);
    [
        (2.0 * frag[0] - resolution[0]) / height,
        -(2.0 * frag[1] - resolution[1]) / height,
    ]
}

/// Shades one pixel.
pub fn shade(uniforms: &WaveUniforms, frag: [f32; 2]) -> Rgb {
    evaluate(uniforms, frag, None)
}

/// Shades one pixel and records every line contribution in order.
pub fn shade_traced(
    uniforms: &WaveUniforms,
    frag: [f32; 2],
    trace: &mut Vec<LineContribution>,
) -> Rgb {
    evaluate(uniforms, frag, Some(trace))
}

fn evaluate(
    uniforms: &WaveUniforms,
    frag: [f32; 2],
    mut trace: Option<&mut Vec<LineContribution>>,
) -> Rgb {
    let resolution = [uniforms.resolution[0], uniforms.resolution[1]];
    let mut base = scene_uv(frag, resolution);
    if uniforms.parallax_enabled() {
        base[0] += uniforms.parallax[0];
        base[1] += uniforms.parallax[1];
    }

    let interactive = uniforms.interactive();
    let mouse = if interactive {
        scene_uv([uniforms.pointer[0], uniforms.pointer[1]], resolution)
    } else {
        [0.0, 0.0]
    };

    let stops: Vec<Rgb> = uniforms.gradient[..uniforms.gradient_count()]
        .iter()
        .map(|stop| [stop[0], stop[1], stop[2]])
        .collect();
    let fallback = if stops.is_empty() {
        background_color(base)
    } else {
        BLACK
    };

    let time = uniforms.elapsed() * uniforms.animation_speed();
    let angle_scale = (length(base) + 1.0).ln();
    let mut color = BLACK;

    for kind in BAND_ORDER {
        if !uniforms.band_enabled(kind) {
            continue;
        }
        let count = uniforms.band_line_count(kind);
        let distance = uniforms.band_line_distance(kind);
        let [offset_x, offset_y, rotate] = uniforms.band_position(kind);
        let weight = band_weight(kind);

        let mut rotated = rotate_uv(base, rotate * angle_scale);
        if kind == WaveKind::Top {
            rotated[0] = -rotated[0];
        }

        for index in 0..count {
            let fi = index as f32;
            let t = fi / (count.saturating_sub(1) as f32).max(1.0);
            let line_color = match sample_stops(&stops, t) {
                Some(stop) => scale(stop, 0.5),
                None => fallback,
            };

            let sample = [rotated[0] + distance * fi + offset_x, rotated[1] + offset_y];
            let bend = if interactive {
                bend_offset(uniforms, base, mouse)
            } else {
                0.0
            };
            let intensity = wave(sample, band_phase(kind, fi), time, bend);

            let share = intensity * weight;
            color = [
                color[0] + line_color[0] * share,
                color[1] + line_color[1] * share,
                color[2] + line_color[2] * share,
            ];

            if let Some(trace) = trace.as_deref_mut() {
                trace.push(LineContribution {
                    band: kind,
                    index,
                    weight,
                    sample,
                    bend,
                    intensity,
                    color: line_color,
                });
            }
        }
    }

    color
}

fn wave(uv: [f32; 2], offset: f32, time: f32, bend: f32) -> f32 {
    let amplitude = (offset + time * 0.2).sin() * 0.3;
    let y = (uv[0] + offset + time * 0.1).sin() * amplitude + bend;
    let m = uv[1] - y;
    0.0175 / (m.abs() + 0.01).max(1e-3) + 0.01
}

fn bend_offset(uniforms: &WaveUniforms, screen: [f32; 2], mouse: [f32; 2]) -> f32 {
    let d = [screen[0] - mouse[0], screen[1] - mouse[1]];
    let falloff = (-(d[0] * d[0] + d[1] * d[1]) * uniforms.bend[0]).exp();
    (mouse[1] - screen[1]) * falloff * uniforms.bend[1] * uniforms.pointer[2]
}

fn background_color(uv: [f32; 2]) -> Rgb {
    let y = (uv[0] - 0.2).sin() * 0.3 - 0.1;
    let m = uv[1] - y;
    let blue = mix(BLUE, BLACK, smoothstep(0.0, 1.0, m.abs()));
    let pink = mix(PINK, BLACK, smoothstep(0.0, 1.0, (m - 0.8).abs()));
    scale(
        [blue[0] + pink[0], blue[1] + pink[1], blue[2] + pink[2]],
        0.5,
    )
}

/// Row-vector times the shader's `mat2(c, s, -s, c)`.
fn rotate_uv(v: [f32; 2], angle: f32) -> [f32; 2] {
    let (s, c) = angle.sin_cos();
    [v[0] * c + v[1] * s, -v[0] * s + v[1] * c]
}

fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

fn length(v: [f32; 2]) -> f32 {
    (v[0] * v[0] + v[1] * v[1]).sqrt()
}

fn scale(color: Rgb, factor: f32) -> Rgb {
    color.map(|channel| channel * factor)
}
