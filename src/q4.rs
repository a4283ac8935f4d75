pub mod assembly;
pub mod banded;
pub mod bc;
pub mod convergence;
pub mod element;
pub mod io;
pub mod mesh;
pub mod physics;
pub mod post;
pub mod solver;
pub mod sparse;

pub use bc::{BoundaryPolicy, InletSlot};
pub use mesh::{Mesh, StretchAxis, Stretching};
pub use physics::{Coefficients, FeatureFlags, Phase, PhysicsConfig, VelocityField};
pub use solver::{simulate, FieldState, RunOutput, Solver, StepObserver, StepReport};

use crate::error::FemError;
use crate::global_variables::*;
use crate::io::WriteDataMode;
use colored::*;
use std::time::Instant;

#[derive(Clone, Debug, PartialEq)]
pub struct DomainConfig {
    pub lx: Float,
    pub ly: Float,
    pub nx: usize,
    pub ny: usize,
    pub stretching: Option<Stretching>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TimeConfig {
    pub delta_t: Float,
    pub total_time: Float,
    pub max_steps: Option<usize>,
}

impl TimeConfig {
    /// Number of steps needed to reach `total_time`, capped by `max_steps`.
    pub fn number_of_steps(&self) -> usize {
        let ratio = self.total_time / self.delta_t;
        let steps = (ratio - 1e-9 * ratio.max(1.0)).ceil().max(0.0) as usize;
        match self.max_steps {
            Some(max) => steps.min(max),
            None => steps,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MassTreatment {
    Consistent,
    Lumped,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdvectionScheme {
    Galerkin,
    Upwind,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SchemeConfig {
    /// 1 for Backward Euler, 0.5 for Crank-Nicolson.
    pub theta: Float,
    pub mass: MassTreatment,
    pub advection: AdvectionScheme,
}

impl Default for SchemeConfig {
    fn default() -> Self {
        Self {
            theta: THETA,
            mass: MassTreatment::Consistent,
            advection: AdvectionScheme::Galerkin,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BoundaryConfig {
    pub policy: BoundaryPolicy,
    pub inlet: InletSlot,
    pub tolerance: Float,
}

/// Everything a run needs. A run is a pure function of this value.
#[derive(Clone, Debug, PartialEq)]
pub struct CaseConfig {
    pub domain: DomainConfig,
    pub time: TimeConfig,
    pub physics: PhysicsConfig,
    pub flags: FeatureFlags,
    pub boundary: BoundaryConfig,
    pub scheme: SchemeConfig,
    pub probe: Option<[Float; 2]>,
}

impl Default for CaseConfig {
    fn default() -> Self {
        Self {
            domain: DomainConfig {
                lx: LX,
                ly: LY,
                nx: NX,
                ny: NY,
                stretching: None,
            },
            time: TimeConfig {
                delta_t: DELTA_T,
                total_time: TOTAL_TIME,
                max_steps: None,
            },
            physics: PhysicsConfig::default(),
            flags: FeatureFlags::default(),
            boundary: BoundaryConfig {
                policy: BoundaryPolicy::Inlet,
                inlet: InletSlot::default(),
                tolerance: GEOMETRY_TOLERANCE,
            },
            scheme: SchemeConfig::default(),
            probe: None,
        }
    }
}

impl CaseConfig {
    /// Rejects parameters that cannot produce a run. Boundary conflicts that
    /// depend on the mesh are caught when the node sets are classified.
    pub fn validate(&self) -> Result<(), FemError> {
        let positive = |name: &str, value: Float| {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(FemError::config(format!("{name} must be positive, got {value}")))
            }
        };
        let non_negative = |name: &str, value: Float| {
            if value >= 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(FemError::config(format!(
                    "{name} must be non-negative, got {value}"
                )))
            }
        };
        positive("time step", self.time.delta_t)?;
        positive("total time", self.time.total_time)?;
        positive("lx", self.domain.lx)?;
        positive("ly", self.domain.ly)?;
        if self.domain.nx == 0 || self.domain.ny == 0 {
            return Err(FemError::config("element counts must be positive"));
        }
        if self.time.max_steps == Some(0) {
            return Err(FemError::config("max steps must be positive"));
        }
        if !(0.0..=1.0).contains(&self.scheme.theta) {
            return Err(FemError::config(format!(
                "theta must lie in [0, 1], got {}",
                self.scheme.theta
            )));
        }
        let physics = &self.physics;
        non_negative("diffusivity", physics.diffusivity)?;
        non_negative("turbulent diffusivity", physics.turbulent_diffusivity)?;
        non_negative("advection velocity", physics.advection_velocity)?;
        non_negative("injection duration", physics.injection_duration)?;
        positive("decay time", physics.decay_time)?;
        if !(physics.decay_cutoff > 0.0 && physics.decay_cutoff < 1.0) {
            return Err(FemError::config(format!(
                "decay cutoff must lie in (0, 1), got {}",
                physics.decay_cutoff
            )));
        }
        for (name, value) in [
            ("injected concentration", physics.injected_concentration),
            ("ambient concentration", physics.ambient_concentration),
            ("initial concentration", physics.initial_concentration),
        ] {
            if !value.is_finite() {
                return Err(FemError::config(format!("{name} must be finite")));
            }
        }
        positive("boundary tolerance", self.boundary.tolerance)?;
        let slot = &self.boundary.inlet;
        if !(slot.y_min <= slot.y_max) {
            return Err(FemError::config(format!(
                "inlet slot is empty: {}..{}",
                slot.y_min, slot.y_max
            )));
        }
        if let BoundaryPolicy::FixedNode { value, .. } = self.boundary.policy {
            if !value.is_finite() {
                return Err(FemError::config("fixed node value must be finite"));
            }
        }
        if let Some([x, y]) = self.probe {
            if !(x.is_finite() && y.is_finite()) {
                return Err(FemError::config(format!(
                    "probe point must be finite, got ({x}, {y})"
                )));
            }
        }
        Ok(())
    }

    pub fn refined(&self, factor: usize) -> Self {
        let mut config = self.clone();
        config.domain.nx *= factor;
        config.domain.ny *= factor;
        config
    }
}

#[derive(Clone)]
pub struct Simulation {
    pub case_name: String,
    pub simulation_time: Instant,
    pub print_frequency: usize,
    pub write_data_mode: WriteDataMode,
}

impl Simulation {
    pub fn new() -> Self {
        Self {
            case_name: String::from(CASE_NAME),
            simulation_time: Instant::now(),
            print_frequency: 10,
            write_data_mode: WriteDataMode::Frequency(10),
        }
    }

    pub fn case_prefix(&self) -> String {
        self.case_name.replace(' ', "_").to_lowercase()
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new()
    }
}

pub fn run() -> Result<(), FemError> {
    let (mut simulation, config) = io::build_case()?;
    let mut solver = Solver::new(&config)?;
    println!(
        "Mesh: {} x {} elements, {} nodes, {} constrained nodes.\n",
        config.domain.nx.to_string().yellow().bold(),
        config.domain.ny.to_string().yellow().bold(),
        solver.mesh().number_of_nodes().to_string().yellow().bold(),
        solver.boundary_sets().inlet.len()
            + solver.boundary_sets().exhaust.len()
            + solver.boundary_sets().fixed.len(),
    );
    io::write_coordinates(solver.mesh())?;
    io::write_case_parameters(solver.mesh())?;

    let state = solver.run(&mut [&mut simulation])?;

    simulation.write_data_from_step(state.step, &state.concentration)?;
    simulation.write_vtk_from_step(solver.mesh(), state.step, &state.concentration)?;
    let mass = solver.diagnostics().domain_mass(&state.concentration);
    println!(
        "\n{} {} steps, t = {:.3} s, domain mass = {:.8e}, elapsed {:.2} s.",
        "Finished:".green().bold(),
        state.step,
        state.time,
        mass,
        simulation.simulation_time.elapsed().as_secs_f64()
    );
    Ok(())
}

pub fn run_convergence(levels: usize) -> Result<(), FemError> {
    let (simulation, config) = io::build_case()?;
    let study = convergence::ConvergenceStudy::new(config, levels)?;
    println!(
        "Running the convergence study over {} levels.\n",
        levels.to_string().yellow().bold()
    );
    let report = study.run()?;
    report.print();
    report.write(&simulation)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_count_reaches_total_time() {
        let time = TimeConfig {
            delta_t: 1.0,
            total_time: 240.0,
            max_steps: None,
        };
        assert_eq!(time.number_of_steps(), 240);
        let time = TimeConfig {
            delta_t: 0.1,
            total_time: 1.0,
            max_steps: None,
        };
        assert_eq!(time.number_of_steps(), 10);
        let time = TimeConfig {
            delta_t: 0.3,
            total_time: 1.0,
            max_steps: Some(2),
        };
        assert_eq!(time.number_of_steps(), 2);
    }

    #[test]
    fn validation_rejects_bad_time_parameters() {
        let mut config = CaseConfig::default();
        config.time.delta_t = 0.0;
        assert!(matches!(config.validate(), Err(FemError::Configuration(_))));
        let mut config = CaseConfig::default();
        config.time.total_time = -5.0;
        assert!(matches!(config.validate(), Err(FemError::Configuration(_))));
        let mut config = CaseConfig::default();
        config.scheme.theta = 1.5;
        assert!(config.validate().is_err());
        assert!(CaseConfig::default().validate().is_ok());
    }

    #[test]
    fn validation_rejects_non_finite_probe_point() {
        let mut config = CaseConfig::default();
        config.probe = Some([Float::NAN, 0.5]);
        assert!(matches!(config.validate(), Err(FemError::Configuration(_))));
        config.probe = Some([1.0, Float::INFINITY]);
        assert!(matches!(
            simulate(&config),
            Err(FemError::Configuration(_))
        ));
        config.probe = Some([1.0, 0.5]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn refinement_scales_element_counts() {
        let config = CaseConfig::default().refined(4);
        assert_eq!((config.domain.nx, config.domain.ny), (40, 20));
    }
}
