use super::assembly::GlobalMatrices;
use super::banded::BandedLu;
use super::bc::{BoundarySets, Constraints};
use super::mesh::Mesh;
use super::post::Diagnostics;
use super::sparse::CsrMatrix;
use super::{AdvectionScheme, CaseConfig, Coefficients, MassTreatment, Phase};
use crate::error::FemError;
use crate::global_variables::*;

#[derive(Clone, Debug, PartialEq)]
pub struct FieldState {
    pub step: usize,
    pub time: Float,
    pub concentration: Vec<Float>,
}

#[derive(Clone, Copy, Debug)]
pub struct StepReport<'a> {
    pub step: usize,
    pub time: Float,
    pub coefficients: Coefficients,
    pub field: &'a [Float],
    pub mass: Float,
    pub probe: Option<Float>,
    pub mesh: &'a Mesh,
    pub diagnostics: &'a Diagnostics,
}

impl StepReport<'_> {
    pub fn phase(&self) -> Phase {
        self.coefficients.phase
    }
}

pub trait StepObserver {
    fn observe(&mut self, report: &StepReport<'_>) -> Result<(), FemError>;
}

/// Scales and constrained node set that fully determine the step matrix.
#[derive(Clone, Debug, PartialEq)]
struct StepKey {
    diffusivity: Float,
    advection_velocity: Float,
    constrained: Vec<usize>,
}

#[derive(Debug)]
pub struct Solver {
    config: CaseConfig,
    mesh: Mesh,
    matrices: GlobalMatrices,
    boundary: BoundarySets,
    diagnostics: Diagnostics,
    factors: Option<(StepKey, BandedLu)>,
}

impl Solver {
    pub fn new(config: &CaseConfig) -> Result<Self, FemError> {
        config.validate()?;
        let domain = &config.domain;
        let mesh = Mesh::structured(
            domain.lx,
            domain.ly,
            domain.nx,
            domain.ny,
            domain.stretching,
        )?;
        let boundary = BoundarySets::classify(
            &mesh,
            &config.boundary.policy,
            &config.boundary.inlet,
            config.boundary.tolerance,
        )?;
        let matrices = GlobalMatrices::assemble(&mesh, &config.physics.velocity_field)?;
        let diagnostics = Diagnostics::new(&mesh, matrices.lumped_area.clone(), config.probe);
        Ok(Self {
            config: config.clone(),
            mesh,
            matrices,
            boundary,
            diagnostics,
            factors: None,
        })
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn matrices(&self) -> &GlobalMatrices {
        &self.matrices
    }

    pub fn boundary_sets(&self) -> &BoundarySets {
        &self.boundary
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn config(&self) -> &CaseConfig {
        &self.config
    }

    pub fn number_of_steps(&self) -> usize {
        self.config.time.number_of_steps()
    }

    pub fn initial_state(&self) -> FieldState {
        FieldState {
            step: 0,
            time: 0.0,
            concentration: vec![
                self.config.physics.initial_concentration;
                self.mesh.number_of_nodes()
            ],
        }
    }

    pub fn coefficients(&self, time: Float) -> Coefficients {
        Coefficients::at(&self.config.physics, &self.config.flags, time)
    }

    pub fn constraints(&self, coefficients: &Coefficients) -> Constraints {
        self.boundary.constraints(
            coefficients.jet(),
            self.config.physics.injected_concentration,
            self.config.physics.ambient_concentration,
        )
    }

    /// Advances `state` by one time step.
    ///
    /// Coefficients and boundary values are evaluated at the start time of
    /// the step. The step matrix is
    /// `M/dt + theta * L` and the right-hand side `(M/dt - (1 - theta) * L) u`
    /// with `L = D_eff * K + U * A`.
    pub fn step(&mut self, state: FieldState) -> Result<FieldState, FemError> {
        if state.concentration.len() != self.mesh.number_of_nodes() {
            return Err(FemError::config(format!(
                "field has {} values but the mesh has {} nodes",
                state.concentration.len(),
                self.mesh.number_of_nodes()
            )));
        }
        let coefficients = self.coefficients(state.time);
        let constraints = self.constraints(&coefficients);
        let (lhs, mut rhs) = self.assemble_step(&coefficients, &constraints, &state.concentration);

        let key = StepKey {
            diffusivity: coefficients.effective_diffusivity(),
            advection_velocity: coefficients.advection_velocity,
            constrained: constraints.nodes.iter().map(|&(node, _)| node).collect(),
        };
        let reuse = matches!(&self.factors, Some((cached, _)) if *cached == key);
        if !reuse {
            let lu = BandedLu::factorize(&lhs, state.step + 1)?;
            self.factors = Some((key, lu));
        }
        if let Some((_, lu)) = &self.factors {
            lu.solve(&mut rhs);
        }

        let step = state.step + 1;
        Ok(FieldState {
            step,
            time: step as Float * self.config.time.delta_t,
            concentration: rhs,
        })
    }

    fn assemble_step(
        &self,
        coefficients: &Coefficients,
        constraints: &Constraints,
        field: &[Float],
    ) -> (CsrMatrix, Vec<Float>) {
        let matrices = &self.matrices;
        let dt = self.config.time.delta_t;
        let theta = self.config.scheme.theta;
        let mut transport = CsrMatrix::combination(
            &matrices.pattern,
            &[
                (coefficients.effective_diffusivity(), &matrices.diffusion),
                (coefficients.advection_velocity, &matrices.advection),
            ],
        );
        if self.config.scheme.advection == AdvectionScheme::Upwind {
            transport.upwind();
        }
        let mass = match self.config.scheme.mass {
            MassTreatment::Consistent => &matrices.mass,
            MassTreatment::Lumped => &matrices.lumped_mass,
        };

        let n = field.len();
        let mut rhs = vec![0.0; n];
        let mut explicit = vec![0.0; n];
        mass.mul_vec(field, &mut rhs);
        transport.mul_vec(field, &mut explicit);
        rhs.iter_mut()
            .zip(explicit.iter())
            .for_each(|(r, &e)| *r = *r / dt - (1.0 - theta) * e);

        let mut lhs = CsrMatrix::combination(
            &matrices.pattern,
            &[(1.0 / dt, mass), (theta, &transport)],
        );
        lhs.apply_dirichlet(&mut rhs, constraints);
        (lhs, rhs)
    }

    pub fn report<'a>(&'a self, state: &'a FieldState) -> StepReport<'a> {
        StepReport {
            step: state.step,
            time: state.time,
            coefficients: self.coefficients(state.time),
            field: &state.concentration,
            mass: self.diagnostics.domain_mass(&state.concentration),
            probe: self.diagnostics.probe(&state.concentration),
            mesh: &self.mesh,
            diagnostics: &self.diagnostics,
        }
    }

    /// Marches from the initial state to the end time, handing every
    /// completed step to the observers. Returns the final state.
    pub fn run(
        &mut self,
        observers: &mut [&mut dyn StepObserver],
    ) -> Result<FieldState, FemError> {
        let mut state = self.initial_state();
        for observer in observers.iter_mut() {
            observer.observe(&self.report(&state))?;
        }
        for _ in 0..self.number_of_steps() {
            state = self.step(state)?;
            let report = self.report(&state);
            for observer in observers.iter_mut() {
                observer.observe(&report)?;
            }
        }
        Ok(state)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RunOutput {
    pub nx: usize,
    pub ny: usize,
    pub coordinates: Vec<[Float; 2]>,
    pub lumped_area: Vec<Float>,
    pub times: Vec<Float>,
    pub mass: Vec<Float>,
    pub probe: Vec<Float>,
    pub phases: Vec<Phase>,
    pub final_field: Vec<Float>,
}

#[derive(Default)]
struct History {
    times: Vec<Float>,
    mass: Vec<Float>,
    probe: Vec<Float>,
    phases: Vec<Phase>,
}

impl StepObserver for History {
    fn observe(&mut self, report: &StepReport<'_>) -> Result<(), FemError> {
        self.times.push(report.time);
        self.mass.push(report.mass);
        if let Some(value) = report.probe {
            self.probe.push(value);
        }
        self.phases.push(report.phase());
        Ok(())
    }
}

/// Runs a case from scratch with no state shared with other runs.
pub fn simulate(config: &CaseConfig) -> Result<RunOutput, FemError> {
    let mut solver = Solver::new(config)?;
    let mut history = History::default();
    let state = solver.run(&mut [&mut history])?;
    Ok(RunOutput {
        nx: solver.mesh.nx,
        ny: solver.mesh.ny,
        coordinates: solver.mesh.coordinates(),
        lumped_area: solver.diagnostics.lumped_area.clone(),
        times: history.times,
        mass: history.mass,
        probe: history.probe,
        phases: history.phases,
        final_field: state.concentration,
    })
}
