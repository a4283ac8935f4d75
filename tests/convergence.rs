use pm_fem::q4::convergence::ConvergenceStudy;
use pm_fem::q4::{
    AdvectionScheme, BoundaryPolicy, CaseConfig, FeatureFlags, FieldState, MassTreatment, Solver,
};
use pm_fem::Float;
use std::f64::consts::PI;

fn smooth_case() -> CaseConfig {
    let mut config = CaseConfig::default();
    config.domain.lx = 1.0;
    config.domain.ly = 1.0;
    config.domain.nx = 4;
    config.domain.ny = 4;
    config.time.delta_t = 0.05;
    config.time.total_time = 1.0;
    config.physics.diffusivity = 0.01;
    config.physics.advection_velocity = 0.05;
    config.physics.injection_duration = 10.0;
    config.flags = FeatureFlags {
        diffusion: true,
        advection: true,
        turbulence: false,
    };
    config.boundary.inlet.y_min = 0.25;
    config.boundary.inlet.y_max = 0.75;
    config.scheme.theta = 1.0;
    config.scheme.mass = MassTreatment::Consistent;
    config.scheme.advection = AdvectionScheme::Galerkin;
    config
}

#[test]
fn error_decreases_under_refinement() {
    let study = ConvergenceStudy::new(smooth_case(), 4).unwrap();
    let report = study.run().unwrap();
    assert_eq!(report.levels.len(), 3);
    assert_eq!(report.orders.len(), 2);
    assert_eq!((report.levels[0].nx, report.levels[0].ny), (4, 4));
    assert_eq!((report.levels[2].nx, report.levels[2].ny), (16, 16));
    assert!(report
        .levels
        .windows(2)
        .all(|pair| pair[1].error < pair[0].error));
    for order in &report.orders {
        assert!(*order > 0.5, "observed order {order}");
    }
}

fn diffusing_cosine(theta: Float, delta_t: Float) -> Vec<Float> {
    let mut config = CaseConfig::default();
    config.domain.lx = 1.0;
    config.domain.ly = 1.0;
    config.domain.nx = 4;
    config.domain.ny = 4;
    config.time.delta_t = delta_t;
    config.time.total_time = 2.0;
    config.physics.diffusivity = 0.01;
    config.flags = FeatureFlags {
        diffusion: true,
        advection: false,
        turbulence: false,
    };
    config.boundary.policy = BoundaryPolicy::Passive;
    config.scheme.theta = theta;
    let mut solver = Solver::new(&config).unwrap();
    let mut state = FieldState {
        step: 0,
        time: 0.0,
        concentration: solver
            .mesh()
            .coordinates()
            .iter()
            .map(|&[x, y]| (PI * x).cos() * (PI * y).cos())
            .collect(),
    };
    for _ in 0..solver.number_of_steps() {
        state = solver.step(state).unwrap();
    }
    assert_eq!(state.step, (2.0 / delta_t).round() as usize);
    state.concentration
}

fn max_difference(a: &[Float], b: &[Float]) -> Float {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, Float::max)
}

#[test]
fn crank_nicolson_halving_the_step_quarters_the_error() {
    let reference = diffusing_cosine(0.5, 1e-3);
    let error = |theta: Float, delta_t: Float| {
        max_difference(&diffusing_cosine(theta, delta_t), &reference)
    };
    let crank_nicolson = [error(0.5, 0.2), error(0.5, 0.1)];
    let backward_euler = [error(1.0, 0.2), error(1.0, 0.1)];

    assert!(crank_nicolson[0] < 0.05 * backward_euler[0]);
    assert!(crank_nicolson[1] < 0.05 * backward_euler[1]);
    let ratio = crank_nicolson[0] / crank_nicolson[1];
    assert!(ratio > 3.5 && ratio < 4.5, "Crank-Nicolson ratio {ratio}");
    let ratio = backward_euler[0] / backward_euler[1];
    assert!(ratio > 1.7 && ratio < 2.3, "Backward Euler ratio {ratio}");
}
