//! Exponential convergence of rendered values toward raw targets.
//!
//! Every tracked pair advances once per frame through
//! `current += (target - current) * factor`, so bursty pointer sampling never
//! reaches the shader directly.

/// Values that can be blended linearly.
pub trait Lerp: Copy {
    fn lerp(self, target: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(self, target: Self, t: f32) -> Self {
        self + (target - self) * t
    }
}

impl Lerp for [f32; 2] {
    fn lerp(self, target: Self, t: f32) -> Self {
        [self[0].lerp(target[0], t), self[1].lerp(target[1], t)]
    }
}

/// A raw target and the smoothed value actually rendered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Damped<T> {
    target: T,
    current: T,
}

impl<T: Lerp> Damped<T> {
    /// Starts with `current == target`; the only time the pair is snapped.
    pub fn new(value: T) -> Self {
        Self {
            target: value,
            current: value,
        }
    }

    pub fn target(&self) -> T {
        self.target
    }

    pub fn current(&self) -> T {
        self.current
    }

    pub fn set_target(&mut self, target: T) {
        self.target = target;
    }
}

/// Applies the damping recurrence with one shared factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DampingEngine {
    factor: f32,
}

impl DampingEngine {
    pub const DEFAULT_FACTOR: f32 = 0.05;

    /// Builds an engine; factors outside `(0, 1]` fall back or clamp.
    pub fn new(factor: f32) -> Self {
        let factor = if factor.is_nan() || factor <= 0.0 {
            Self::DEFAULT_FACTOR
        } else {
            factor.min(1.0)
        };
        Self { factor }
    }

    pub fn factor(&self) -> f32 {
        self.factor
    }

    pub fn set_factor(&mut self, factor: f32) {
        *self = Self::new(factor);
    }

    /// Advances one pair by a single frame.
    pub fn step<T: Lerp>(&self, pair: &mut Damped<T>) {
        pair.current = pair.current.lerp(pair.target, self.factor);
    }
}

impl Default for DampingEngine {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FACTOR)
    }
}
