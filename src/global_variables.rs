pub const CASE_NAME: &'static str = "PM25 Pulse";

pub type Float = f64;

pub const LX: Float = 4.0;

pub const LY: Float = 1.0;

pub const NX: usize = 10;

pub const NY: usize = 5;

pub const DELTA_T: Float = 1.0;

pub const TOTAL_TIME: Float = 240.0;

pub const INJECTION_DURATION: Float = 60.0;

pub const THETA: Float = 1.0;

pub const DIFFUSIVITY: Float = 1e-5;

pub const TURBULENT_DIFFUSIVITY: Float = 1e-2;

pub const ADVECTION_VELOCITY: Float = 0.0833;

pub const INJECTED_CONCENTRATION: Float = 1.0;

pub const AMBIENT_CONCENTRATION: Float = 0.0;

pub const DECAY_TIME: Float = 30.0;

pub const DECAY_CUTOFF: Float = 1e-3;

pub const INLET_Y_MIN: Float = 0.4;

pub const INLET_Y_MAX: Float = 0.6;

pub const GEOMETRY_TOLERANCE: Float = 1e-9;

pub const SINGULAR_PIVOT_TOLERANCE: Float = 1e-14;

pub const GAUSS_POINT: Float = 0.577_350_269_189_625_8;

pub const GAUSS_WEIGHT: Float = 1.0;
