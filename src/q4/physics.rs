use crate::global_variables::*;

/// Unit direction of the transporting flow; the magnitude is applied per step.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VelocityField {
    /// Constant direction at `angle` radians from the +x axis.
    Uniform { angle: Float },
    /// Flow drawn towards the nearest domain corner.
    CornerSuction,
}

impl Default for VelocityField {
    fn default() -> Self {
        VelocityField::Uniform { angle: 0.0 }
    }
}

impl VelocityField {
    pub fn direction(&self, position: [Float; 2], extents: [Float; 2]) -> [Float; 2] {
        match *self {
            VelocityField::Uniform { angle } => [angle.cos(), angle.sin()],
            VelocityField::CornerSuction => {
                let [x, y] = position;
                let [lx, ly] = extents;
                let cx = if x <= 0.5 * lx { 0.0 } else { lx };
                let cy = if y <= 0.5 * ly { 0.0 } else { ly };
                let (dx, dy) = (cx - x, cy - y);
                let norm = (dx * dx + dy * dy).sqrt();
                if norm <= GEOMETRY_TOLERANCE {
                    [0.0, 0.0]
                } else {
                    [dx / norm, dy / norm]
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeatureFlags {
    pub diffusion: bool,
    pub advection: bool,
    pub turbulence: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            diffusion: true,
            advection: true,
            turbulence: true,
        }
    }
}

impl FeatureFlags {
    pub fn none() -> Self {
        Self {
            diffusion: false,
            advection: false,
            turbulence: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsConfig {
    pub diffusivity: Float,
    pub turbulent_diffusivity: Float,
    pub advection_velocity: Float,
    pub velocity_field: VelocityField,
    pub injected_concentration: Float,
    pub ambient_concentration: Float,
    pub initial_concentration: Float,
    pub injection_duration: Float,
    pub decay_time: Float,
    pub decay_cutoff: Float,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            diffusivity: DIFFUSIVITY,
            turbulent_diffusivity: TURBULENT_DIFFUSIVITY,
            advection_velocity: ADVECTION_VELOCITY,
            velocity_field: VelocityField::default(),
            injected_concentration: INJECTED_CONCENTRATION,
            ambient_concentration: AMBIENT_CONCENTRATION,
            initial_concentration: AMBIENT_CONCENTRATION,
            injection_duration: INJECTION_DURATION,
            decay_time: DECAY_TIME,
            decay_cutoff: DECAY_CUTOFF,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Injecting,
    Relaxing,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Injecting => "injecting",
            Phase::Relaxing => "relaxing",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coefficients {
    pub phase: Phase,
    pub diffusivity: Float,
    pub turbulent_diffusivity: Float,
    pub advection_velocity: Float,
}

impl Coefficients {
    pub fn at(physics: &PhysicsConfig, flags: &FeatureFlags, time: Float) -> Self {
        let jet = time < physics.injection_duration;
        let phase = if jet {
            Phase::Injecting
        } else {
            Phase::Relaxing
        };
        let diffusivity = if flags.diffusion {
            physics.diffusivity
        } else {
            0.0
        };
        let turbulent_diffusivity = match (flags.turbulence, jet) {
            (false, _) => 0.0,
            (true, true) => physics.turbulent_diffusivity,
            (true, false) => {
                let elapsed = time - physics.injection_duration;
                let fraction = (-elapsed / physics.decay_time).exp();
                if fraction < physics.decay_cutoff {
                    0.0
                } else {
                    physics.turbulent_diffusivity * fraction
                }
            }
        };
        let advection_velocity = if flags.advection && jet {
            physics.advection_velocity
        } else {
            0.0
        };
        Self {
            phase,
            diffusivity,
            turbulent_diffusivity,
            advection_velocity,
        }
    }

    pub fn jet(&self) -> bool {
        self.phase == Phase::Injecting
    }

    pub fn effective_diffusivity(&self) -> Float {
        self.diffusivity + self.turbulent_diffusivity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn turbulence_decays_then_clips_to_zero() {
        let physics = PhysicsConfig {
            turbulent_diffusivity: 0.02,
            injection_duration: 10.0,
            decay_time: 5.0,
            decay_cutoff: 0.01,
            ..PhysicsConfig::default()
        };
        let flags = FeatureFlags::default();
        let during = Coefficients::at(&physics, &flags, 9.0);
        assert!(during.jet());
        assert_eq!(during.turbulent_diffusivity, 0.02);
        let after = Coefficients::at(&physics, &flags, 15.0);
        assert_eq!(after.phase, Phase::Relaxing);
        assert_relative_eq!(after.turbulent_diffusivity, 0.02 * (-1.0 as Float).exp());
        assert_eq!(after.advection_velocity, 0.0);
        // exp(-5) < 0.01
        let late = Coefficients::at(&physics, &flags, 35.0);
        assert_eq!(late.turbulent_diffusivity, 0.0);
    }

    #[test]
    fn disabled_features_contribute_nothing() {
        let physics = PhysicsConfig::default();
        let coefficients = Coefficients::at(&physics, &FeatureFlags::none(), 0.0);
        assert_eq!(coefficients.effective_diffusivity(), 0.0);
        assert_eq!(coefficients.advection_velocity, 0.0);
    }

    #[test]
    fn corner_suction_points_at_nearest_corner() {
        let field = VelocityField::CornerSuction;
        let [vx, vy] = field.direction([3.75, 0.75], [4.0, 1.0]);
        assert_relative_eq!(vx, 1.0 / 2.0_f64.sqrt());
        assert_relative_eq!(vy, 1.0 / 2.0_f64.sqrt());
        assert_eq!(field.direction([4.0, 1.0], [4.0, 1.0]), [0.0, 0.0]);
    }
}
