use approx::assert_relative_eq;
use pm_fem::q4::{
    simulate, AdvectionScheme, BoundaryPolicy, CaseConfig, FeatureFlags, MassTreatment, Solver,
    StepObserver, StepReport,
};
use pm_fem::{FemError, Float};
use rayon::ThreadPoolBuilder;

/// Records the value of a few nodes and the extreme values after each step.
struct NodeHistory {
    nodes: Vec<usize>,
    values: Vec<Vec<Float>>,
    minimum: Float,
    maximum: Float,
}

impl NodeHistory {
    fn new(nodes: &[usize]) -> Self {
        Self {
            nodes: nodes.to_vec(),
            values: vec![Vec::new(); nodes.len()],
            minimum: Float::INFINITY,
            maximum: Float::NEG_INFINITY,
        }
    }
}

impl StepObserver for NodeHistory {
    fn observe(&mut self, report: &StepReport<'_>) -> Result<(), FemError> {
        for (node, values) in self.nodes.iter().zip(self.values.iter_mut()) {
            values.push(report.field[*node]);
        }
        for &value in report.field {
            self.minimum = self.minimum.min(value);
            self.maximum = self.maximum.max(value);
        }
        Ok(())
    }
}

fn continuous_jet() -> CaseConfig {
    let mut config = CaseConfig::default();
    config.physics.injection_duration = 240.0;
    config.flags.turbulence = false;
    config.scheme.theta = 1.0;
    config.scheme.mass = MassTreatment::Lumped;
    config.scheme.advection = AdvectionScheme::Upwind;
    config
}

#[test]
fn upwind_lumped_backward_euler_jet_fills_the_room_monotonically() {
    let config = continuous_jet();
    let mut solver = Solver::new(&config).unwrap();
    assert_eq!(solver.boundary_sets().inlet, vec![22, 33]);
    let mut history = NodeHistory::new(&[23, 34]);
    let state = solver.run(&mut [&mut history]).unwrap();

    assert_eq!(state.step, 240);
    assert_relative_eq!(state.time, 240.0);
    assert!(history.minimum >= -1e-12, "minimum {}", history.minimum);
    assert!(history.maximum <= 1.0 + 1e-12, "maximum {}", history.maximum);
    for values in &history.values {
        assert_eq!(values.len(), 241);
        assert!(values.windows(2).all(|w| w[1] >= w[0] - 1e-12));
        let last = values[values.len() - 1];
        assert!(last > 0.9 && last <= 1.0 + 1e-12, "final value {last}");
    }
    assert_eq!(state.concentration[22], 1.0);
    assert_eq!(state.concentration[33], 1.0);
}

#[test]
fn mass_grows_while_the_jet_is_on() {
    let output = simulate(&continuous_jet()).unwrap();
    assert_eq!(output.times.len(), 241);
    assert_eq!(output.mass[0], 0.0);
    assert!(output.mass.windows(2).all(|w| w[1] >= w[0] - 1e-12));
    assert!(output.mass[240] > 0.0);
    assert!(output.mass[240] <= 4.0 + 1e-10);
}

#[test]
fn disabled_physics_leaves_a_uniform_field_unchanged() {
    let mut config = CaseConfig::default();
    config.flags = FeatureFlags::none();
    config.boundary.policy = BoundaryPolicy::Passive;
    config.physics.initial_concentration = 0.37;
    config.time.total_time = 20.0;
    let output = simulate(&config).unwrap();
    for &value in &output.final_field {
        assert_relative_eq!(value, 0.37, max_relative = 1e-12);
    }
    assert_relative_eq!(output.mass[20], 0.37 * 4.0, max_relative = 1e-12);
}

#[test]
fn transport_preserves_a_uniform_field_without_constraints() {
    let mut config = CaseConfig::default();
    config.boundary.policy = BoundaryPolicy::Passive;
    config.physics.initial_concentration = 0.2;
    config.time.total_time = 90.0;
    config.scheme.theta = 0.5;
    let output = simulate(&config).unwrap();
    for &value in &output.final_field {
        assert_relative_eq!(value, 0.2, max_relative = 1e-10);
    }
}

#[test]
fn fixed_node_is_held_exactly() {
    let mut config = CaseConfig::default();
    config.boundary.policy = BoundaryPolicy::FixedNode {
        node: 30,
        value: 2.5,
    };
    config.time.total_time = 30.0;
    let mut solver = Solver::new(&config).unwrap();
    let mut history = NodeHistory::new(&[30, 31]);
    solver.run(&mut [&mut history]).unwrap();
    assert_eq!(history.values[0][0], 0.0);
    assert!(history.values[0][1..].iter().all(|&value| value == 2.5));
    assert!(history.values[1][30] > 0.0);
}

#[test]
fn runs_are_bit_identical_across_thread_counts() {
    let mut config = CaseConfig::default();
    config.domain.nx = 40;
    config.domain.ny = 20;
    config.time.total_time = 90.0;
    let first = simulate(&config).unwrap();
    let second = simulate(&config).unwrap();
    assert_eq!(first, second);
    let single = ThreadPoolBuilder::new().num_threads(1).build().unwrap();
    let several = ThreadPoolBuilder::new().num_threads(4).build().unwrap();
    let one = single.install(|| simulate(&config)).unwrap();
    let four = several.install(|| simulate(&config)).unwrap();
    assert_eq!(one, four);
    assert_eq!(one, first);
}

#[test]
fn invalid_cases_are_rejected_before_running() {
    let mut config = CaseConfig::default();
    config.time.delta_t = -1.0;
    assert!(matches!(simulate(&config), Err(FemError::Configuration(_))));

    let mut config = CaseConfig::default();
    config.boundary.policy = BoundaryPolicy::InletWithExhaust;
    config.boundary.inlet.y_min = 0.0;
    config.boundary.inlet.y_max = 0.2;
    assert!(matches!(simulate(&config), Err(FemError::Configuration(_))));

    let mut config = CaseConfig::default();
    config.boundary.inlet.y_min = 0.41;
    config.boundary.inlet.y_max = 0.42;
    assert!(matches!(simulate(&config), Err(FemError::Configuration(_))));

    let mut config = CaseConfig::default();
    config.boundary.policy = BoundaryPolicy::FixedNode {
        node: 66,
        value: 1.0,
    };
    assert!(matches!(simulate(&config), Err(FemError::Configuration(_))));
}
