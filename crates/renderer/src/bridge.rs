use lineconfig::{RenderConfiguration, ResolvedConfiguration};
use tracing::{debug, warn};

use crate::color::GradientTable;
use crate::uniforms::WaveUniforms;

/// Turns possibly-partial snapshots into uniform values in place.
///
/// Holds only CPU-side state; GPU resources are never touched here, so
/// `apply` can run on every host update.
#[derive(Debug, Clone, Default)]
pub struct ConfigurationBridge {
    resolved: ResolvedConfiguration,
    gradient: GradientTable,
    applied: u64,
}

impl ConfigurationBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(
        &mut self,
        config: &RenderConfiguration,
        uniforms: &mut WaveUniforms,
    ) -> &ResolvedConfiguration {
        let resolved = ResolvedConfiguration::resolve(config);

        if let Some(requested) = config.mouse_damping {
            if requested != resolved.mouse_damping {
                warn!(
                    requested,
                    used = resolved.mouse_damping,
                    "mouse damping outside (0, 1]; sanitized"
                );
            }
        }

        if resolved.lines_gradient != self.resolved.lines_gradient || self.applied == 0 {
            self.gradient = GradientTable::build(&resolved.lines_gradient);
        }
        let (stops, count) = self.gradient.to_uniform();
        uniforms.set_gradient(stops, count);
        uniforms.apply_resolved(&resolved);

        self.applied += 1;
        debug!(
            snapshot = self.applied,
            bands = resolved.enabled_bands().count(),
            gradient_stops = count,
            interactive = resolved.interactive,
            parallax = resolved.parallax,
            "applied configuration"
        );

        self.resolved = resolved;
        &self.resolved
    }

    pub fn resolved(&self) -> &ResolvedConfiguration {
        &self.resolved
    }

    pub fn gradient(&self) -> &GradientTable {
        &self.gradient
    }

    /// Number of snapshots applied so far.
    pub fn applied(&self) -> u64 {
        self.applied
    }
}
