//! Declarative configuration surface for the wave-lines backdrop.
//!
//! A host supplies [`RenderConfiguration`] snapshots in which every field is
//! optional. [`ResolvedConfiguration::resolve`] turns a snapshot into the
//! fully-defaulted, fixed-size per-band form consumed by the renderer. Files
//! on disk wrap the snapshot in a [`ConfigDocument`] together with preview
//! window settings.

mod resolve;

use std::fmt;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

pub use resolve::{BandSettings, ResolvedConfiguration, DEFAULT_LINE_COUNT, LINE_DISTANCE_SCALE};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to parse configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// The three independently configurable families of lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaveKind {
    Top,
    Middle,
    Bottom,
}

impl WaveKind {
    pub const ALL: [WaveKind; 3] = [WaveKind::Top, WaveKind::Middle, WaveKind::Bottom];

    /// Slot of the band inside fixed per-band arrays.
    pub fn index(self) -> usize {
        match self {
            WaveKind::Top => 0,
            WaveKind::Middle => 1,
            WaveKind::Bottom => 2,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            WaveKind::Top => "top",
            WaveKind::Middle => "middle",
            WaveKind::Bottom => "bottom",
        }
    }

    /// Offset and whirl factor used when the host does not override them.
    pub fn default_position(self) -> WavePosition {
        match self {
            WaveKind::Top => WavePosition::new(10.0, 0.5, -0.4),
            WaveKind::Middle => WavePosition::new(5.0, 0.0, 0.2),
            WaveKind::Bottom => WavePosition::new(2.0, -0.7, 0.4),
        }
    }
}

impl fmt::Display for WaveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-band offset (`x`, `y`) and whirl factor (`rotate`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WavePosition {
    pub x: f32,
    pub y: f32,
    pub rotate: f32,
}

impl WavePosition {
    pub const fn new(x: f32, y: f32, rotate: f32) -> Self {
        Self { x, y, rotate }
    }
}

/// Host-side position override; absent components keep the band default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PositionOverride {
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
    #[serde(default)]
    pub rotate: Option<f32>,
}

impl PositionOverride {
    pub fn resolve(&self, fallback: WavePosition) -> WavePosition {
        WavePosition {
            x: self.x.unwrap_or(fallback.x),
            y: self.y.unwrap_or(fallback.y),
            rotate: self.rotate.unwrap_or(fallback.rotate),
        }
    }
}

impl From<WavePosition> for PositionOverride {
    fn from(value: WavePosition) -> Self {
        Self {
            x: Some(value.x),
            y: Some(value.y),
            rotate: Some(value.rotate),
        }
    }
}

/// A value given either once for every band or as a list ordered like
/// `enabled_waves`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BandValue<T> {
    Scalar(T),
    PerBand(Vec<T>),
}

/// Snapshot of every externally controllable parameter.
///
/// Keys are snake_case; the camelCase spellings used by page hosts are
/// accepted as aliases.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfiguration {
    #[serde(alias = "linesGradient", skip_serializing_if = "Option::is_none")]
    pub lines_gradient: Option<Vec<String>>,
    #[serde(alias = "enabledWaves", skip_serializing_if = "Option::is_none")]
    pub enabled_waves: Option<Vec<WaveKind>>,
    #[serde(alias = "lineCount", skip_serializing_if = "Option::is_none")]
    pub line_count: Option<BandValue<u32>>,
    #[serde(alias = "lineDistance", skip_serializing_if = "Option::is_none")]
    pub line_distance: Option<BandValue<f32>>,
    #[serde(alias = "topWavePosition", skip_serializing_if = "Option::is_none")]
    pub top_wave_position: Option<PositionOverride>,
    #[serde(alias = "middleWavePosition", skip_serializing_if = "Option::is_none")]
    pub middle_wave_position: Option<PositionOverride>,
    #[serde(alias = "bottomWavePosition", skip_serializing_if = "Option::is_none")]
    pub bottom_wave_position: Option<PositionOverride>,
    #[serde(alias = "animationSpeed", skip_serializing_if = "Option::is_none")]
    pub animation_speed: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interactive: Option<bool>,
    #[serde(alias = "bendRadius", skip_serializing_if = "Option::is_none")]
    pub bend_radius: Option<f32>,
    #[serde(alias = "bendStrength", skip_serializing_if = "Option::is_none")]
    pub bend_strength: Option<f32>,
    #[serde(alias = "mouseDamping", skip_serializing_if = "Option::is_none")]
    pub mouse_damping: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallax: Option<bool>,
    #[serde(alias = "parallaxStrength", skip_serializing_if = "Option::is_none")]
    pub parallax_strength: Option<f32>,
    #[serde(alias = "mixBlendMode", skip_serializing_if = "Option::is_none")]
    pub mix_blend_mode: Option<String>,
}

impl RenderConfiguration {
    /// Parses a host property object.
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn position_override(&self, kind: WaveKind) -> Option<&PositionOverride> {
        match kind {
            WaveKind::Top => self.top_wave_position.as_ref(),
            WaveKind::Middle => self.middle_wave_position.as_ref(),
            WaveKind::Bottom => self.bottom_wave_position.as_ref(),
        }
    }
}

/// Window settings for the desktop preview host.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PreviewSettings {
    pub width: u32,
    pub height: u32,
    pub title: String,
    /// Overrides the platform scale factor when set.
    pub device_pixel_ratio: Option<f64>,
    #[serde(deserialize_with = "deserialize_duration")]
    pub reload_interval: Duration,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "Wavelines Preview".to_string(),
            device_pixel_ratio: None,
            reload_interval: default_reload_interval(),
        }
    }
}

fn default_reload_interval() -> Duration {
    Duration::from_millis(500)
}

/// On-disk configuration file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConfigDocument {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub lines: RenderConfiguration,
    #[serde(default)]
    pub preview: PreviewSettings,
}

impl Default for ConfigDocument {
    fn default() -> Self {
        Self {
            version: default_version(),
            lines: RenderConfiguration::default(),
            preview: PreviewSettings::default(),
        }
    }
}

fn default_version() -> u32 {
    1
}

impl ConfigDocument {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: ConfigDocument = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let raw: ConfigDocument = serde_json::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn resolved(&self) -> ResolvedConfiguration {
        ResolvedConfiguration::resolve(&self.lines)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        if self.preview.width == 0 || self.preview.height == 0 {
            return Err(ConfigError::Invalid(
                "preview width and height must be greater than zero".into(),
            ));
        }

        if self.preview.reload_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "preview.reload_interval must be greater than zero".into(),
            ));
        }

        if let Some(ratio) = self.preview.device_pixel_ratio {
            if !ratio.is_finite() || ratio <= 0.0 {
                return Err(ConfigError::Invalid(
                    "preview.device_pixel_ratio must be a positive number".into(),
                ));
            }
        }

        if let Some(waves) = &self.lines.enabled_waves {
            for (index, kind) in waves.iter().enumerate() {
                if waves[..index].contains(kind) {
                    return Err(ConfigError::Invalid(format!(
                        "enabled_waves lists '{kind}' more than once"
                    )));
                }
            }
        }

        Ok(())
    }
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Duration;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of milliseconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Duration::from_millis(v))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_millis(v as u64))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v.is_nan() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Duration::from_secs_f64(v / 1000.0))
        }
    }

    deserializer.deserialize_any(Visitor)
}
