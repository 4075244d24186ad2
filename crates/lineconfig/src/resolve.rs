use serde::Serialize;

use crate::{BandValue, RenderConfiguration, WaveKind, WavePosition};

/// Lines per enabled band when nothing else is known.
pub const DEFAULT_LINE_COUNT: u32 = 6;
/// Spacing between lines before scaling.
pub const DEFAULT_LINE_DISTANCE: f32 = 5.0;
/// Raw distances are stored multiplied by this factor.
pub const LINE_DISTANCE_SCALE: f32 = 0.01;

const LIST_FALLBACK_DISTANCE: f32 = 0.1;
const DISABLED_LINE_DISTANCE: f32 = 1.0;

const DEFAULT_ANIMATION_SPEED: f32 = 1.0;
const DEFAULT_BEND_RADIUS: f32 = 5.0;
const DEFAULT_BEND_STRENGTH: f32 = -0.5;
const DEFAULT_MOUSE_DAMPING: f32 = 0.05;
const DEFAULT_PARALLAX_STRENGTH: f32 = 0.2;
const DEFAULT_BLEND_MODE: &str = "screen";

/// Fully resolved state of one band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandSettings {
    pub enabled: bool,
    pub line_count: u32,
    /// Already multiplied by [`LINE_DISTANCE_SCALE`].
    pub line_distance: f32,
    pub position: WavePosition,
}

/// A configuration snapshot with every default applied.
///
/// `bands` is indexed by [`WaveKind::index`]; nothing scalar-or-list
/// survives past this point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedConfiguration {
    pub lines_gradient: Vec<String>,
    pub bands: [BandSettings; 3],
    pub animation_speed: f32,
    pub interactive: bool,
    pub bend_radius: f32,
    pub bend_strength: f32,
    pub mouse_damping: f32,
    pub parallax: bool,
    pub parallax_strength: f32,
    pub mix_blend_mode: String,
}

impl Default for ResolvedConfiguration {
    fn default() -> Self {
        Self::resolve(&RenderConfiguration::default())
    }
}

impl ResolvedConfiguration {
    pub fn resolve(config: &RenderConfiguration) -> Self {
        let enabled: Vec<WaveKind> = config
            .enabled_waves
            .clone()
            .unwrap_or_else(|| WaveKind::ALL.to_vec());

        let bands = WaveKind::ALL.map(|kind| {
            let slot = enabled.iter().position(|candidate| *candidate == kind);
            let position = config
                .position_override(kind)
                .map(|value| value.resolve(kind.default_position()))
                .unwrap_or_else(|| kind.default_position());
            BandSettings {
                enabled: slot.is_some(),
                line_count: resolve_line_count(config.line_count.as_ref(), slot),
                line_distance: resolve_line_distance(config.line_distance.as_ref(), slot)
                    * LINE_DISTANCE_SCALE,
                position,
            }
        });

        Self {
            lines_gradient: config.lines_gradient.clone().unwrap_or_default(),
            bands,
            animation_speed: config.animation_speed.unwrap_or(DEFAULT_ANIMATION_SPEED),
            interactive: config.interactive.unwrap_or(true),
            bend_radius: config.bend_radius.unwrap_or(DEFAULT_BEND_RADIUS),
            bend_strength: config.bend_strength.unwrap_or(DEFAULT_BEND_STRENGTH),
            mouse_damping: sanitize_damping(config.mouse_damping),
            parallax: config.parallax.unwrap_or(true),
            parallax_strength: config
                .parallax_strength
                .unwrap_or(DEFAULT_PARALLAX_STRENGTH),
            mix_blend_mode: config
                .mix_blend_mode
                .clone()
                .unwrap_or_else(|| DEFAULT_BLEND_MODE.to_string()),
        }
    }

    pub fn band(&self, kind: WaveKind) -> &BandSettings {
        &self.bands[kind.index()]
    }

    /// Bands that contribute lines, in declaration order.
    pub fn enabled_bands(&self) -> impl Iterator<Item = (WaveKind, &BandSettings)> + '_ {
        WaveKind::ALL
            .into_iter()
            .map(|kind| (kind, self.band(kind)))
            .filter(|(_, band)| band.enabled)
    }
}

fn resolve_line_count(value: Option<&BandValue<u32>>, slot: Option<usize>) -> u32 {
    let Some(slot) = slot else {
        return 0;
    };
    match value {
        None => DEFAULT_LINE_COUNT,
        Some(BandValue::Scalar(count)) => *count,
        Some(BandValue::PerBand(counts)) => counts.get(slot).copied().unwrap_or(DEFAULT_LINE_COUNT),
    }
}

fn resolve_line_distance(value: Option<&BandValue<f32>>, slot: Option<usize>) -> f32 {
    let Some(slot) = slot else {
        return DISABLED_LINE_DISTANCE;
    };
    match value {
        None => DEFAULT_LINE_DISTANCE,
        Some(BandValue::Scalar(distance)) => *distance,
        Some(BandValue::PerBand(distances)) => distances
            .get(slot)
            .copied()
            .unwrap_or(LIST_FALLBACK_DISTANCE),
    }
}

/// Clamps a requested damping factor into `(0, 1]`.
fn sanitize_damping(value: Option<f32>) -> f32 {
    match value {
        Some(factor) if factor.is_nan() || factor <= 0.0 => DEFAULT_MOUSE_DAMPING,
        Some(factor) => factor.min(1.0),
        None => DEFAULT_MOUSE_DAMPING,
    }
}
