/// Normalized RGB triple.
pub type Rgb = [f32; 3];

/// Upper bound on gradient stops the uniform block can hold.
pub const MAX_GRADIENT_STOPS: usize = 8;

const WHITE: Rgb = [1.0, 1.0, 1.0];

/// Largest `t` used for segment lookup; `t = 1` lands on the last stop.
const T_CEILING: f32 = 0.9999;

/// Parses `#rgb`, `rgb`, `#rrggbb` or `rrggbb` into a normalized triple.
///
/// Anything else, including invalid hex digits, resolves to white.
pub fn parse_color(stop: &str) -> Rgb {
    let trimmed = stop.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);

    let channels = match digits.len() {
        3 => {
            let mut out = [0u8; 3];
            for (slot, ch) in out.iter_mut().zip(digits.chars()) {
                let Some(value) = ch.to_digit(16) else {
                    return WHITE;
                };
                *slot = (value * 17) as u8;
            }
            out
        }
        6 => {
            let mut out = [0u8; 3];
            for (index, slot) in out.iter_mut().enumerate() {
                let Some(pair) = digits.get(index * 2..index * 2 + 2) else {
                    return WHITE;
                };
                let Ok(value) = u8::from_str_radix(pair, 16) else {
                    return WHITE;
                };
                *slot = value;
            }
            out
        }
        _ => return WHITE,
    };

    channels.map(|channel| channel as f32 / 255.0)
}

/// Ordered color stops used to tint lines across a band.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GradientTable {
    stops: Vec<Rgb>,
}

impl GradientTable {
    /// Builds a table from the first [`MAX_GRADIENT_STOPS`] color strings.
    pub fn build<S: AsRef<str>>(stops: &[S]) -> Self {
        if stops.len() > MAX_GRADIENT_STOPS {
            tracing::debug!(
                requested = stops.len(),
                kept = MAX_GRADIENT_STOPS,
                "truncating line gradient"
            );
        }
        Self {
            stops: stops
                .iter()
                .take(MAX_GRADIENT_STOPS)
                .map(|stop| parse_color(stop.as_ref()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    pub fn stops(&self) -> &[Rgb] {
        &self.stops
    }

    /// Color at `t` in `[0, 1]`, or `None` when no stops are configured.
    pub fn sample(&self, t: f32) -> Option<Rgb> {
        sample_stops(&self.stops, t)
    }

    /// Packs the stops into the uniform layout (`vec4` per stop).
    pub fn to_uniform(&self) -> ([[f32; 4]; MAX_GRADIENT_STOPS], i32) {
        let mut packed = [[1.0, 1.0, 1.0, 0.0]; MAX_GRADIENT_STOPS];
        for (slot, stop) in packed.iter_mut().zip(&self.stops) {
            *slot = [stop[0], stop[1], stop[2], 0.0];
        }
        (packed, self.stops.len() as i32)
    }
}

/// Shared interpolation used by the table and by the uniform-driven field.
pub(crate) fn sample_stops(stops: &[Rgb], t: f32) -> Option<Rgb> {
    match stops {
        [] => None,
        [single] => Some(*single),
        _ => {
            let clamped = if t.is_nan() {
                0.0
            } else {
                t.clamp(0.0, T_CEILING)
            };
            let scaled = clamped * (stops.len() - 1) as f32;
            let index = scaled.floor() as usize;
            let fraction = scaled - scaled.floor();
            let next = (index + 1).min(stops.len() - 1);
            Some(mix(stops[index], stops[next], fraction))
        }
    }
}

pub(crate) fn mix(a: Rgb, b: Rgb, t: f32) -> Rgb {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}
