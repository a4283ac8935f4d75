use super::mesh::Mesh;
use super::solver::{StepObserver, StepReport};
use super::{
    AdvectionScheme, BoundaryPolicy, CaseConfig, MassTreatment, Phase, Simulation, StretchAxis,
    Stretching, VelocityField,
};
use crate::error::FemError;
use crate::global_variables::*;
use crate::io::WriteDataMode;
use crate::post::PostResult;
use colored::*;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::str::FromStr;

struct Parameters<'a> {
    map: &'a HashMap<String, String>,
}

impl<'a> Parameters<'a> {
    fn new(map: &'a HashMap<String, String>) -> Self {
        Self { map }
    }

    fn raw(&self, key: &str) -> Option<&'a str> {
        self.map.get(key).map(|value| value.as_str())
    }

    fn get<T: FromStr>(&self, key: &str, default: T) -> Result<T, FemError> {
        match self.raw(key) {
            Some(value) => parse(key, value),
            None => Ok(default),
        }
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, FemError> {
    value.trim().parse::<T>().map_err(|_| FemError::Parse {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_error(key: &str, value: &str) -> FemError {
    FemError::Parse {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn is_none(value: &str) -> bool {
    value.is_empty() || value.eq_ignore_ascii_case("none")
}

impl Simulation {
    pub fn from_setup(parameters: &HashMap<String, String>) -> Result<Self, FemError> {
        let defaults = Simulation::new();
        let parameters = Parameters::new(parameters);
        let case_name = parameters
            .raw("case_name")
            .map(String::from)
            .unwrap_or(defaults.case_name);
        let print_frequency = parameters.get("print_frequency", defaults.print_frequency)?;
        let write_data_mode = match parameters.raw("write_data_mode") {
            Some(mode) => Simulation::set_write_data_mode(mode)?,
            None => defaults.write_data_mode,
        };
        Ok(Self {
            case_name,
            print_frequency: print_frequency.max(1),
            write_data_mode,
            ..Simulation::new()
        })
    }

    fn set_write_data_mode(mode: &str) -> Result<WriteDataMode, FemError> {
        let mut words = mode.split_whitespace();
        match words.next() {
            Some("frequency") => {
                let frequency = words
                    .next()
                    .ok_or_else(|| parse_error("write_data_mode", mode))?;
                Ok(WriteDataMode::Frequency(parse("write_data_mode", frequency)?))
            }
            Some("list") => {
                let list = words
                    .map(|step| parse("write_data_mode", step))
                    .collect::<Result<Vec<usize>, _>>()?;
                Ok(WriteDataMode::ListOfSteps(list))
            }
            _ => Err(parse_error("write_data_mode", mode)),
        }
    }

    fn write_data_mode_label(&self) -> String {
        match &self.write_data_mode {
            WriteDataMode::Frequency(n) => format!("frequency {n}"),
            WriteDataMode::ListOfSteps(list) => {
                let steps: Vec<String> = list.iter().map(|s| s.to_string()).collect();
                format!("list {}", steps.join(" "))
            }
        }
    }
}

impl CaseConfig {
    pub fn from_parameters(
        setup: &HashMap<String, String>,
        conditions: &HashMap<String, String>,
    ) -> Result<Self, FemError> {
        let mut config = CaseConfig::default();
        let setup = Parameters::new(setup);
        let conditions = Parameters::new(conditions);

        config.time.delta_t = setup.get("delta_t", config.time.delta_t)?;
        config.time.total_time = setup.get("total_time", config.time.total_time)?;
        config.time.max_steps = match setup.raw("max_steps") {
            Some(value) if !is_none(value) => Some(parse("max_steps", value)?),
            _ => None,
        };
        config.scheme.theta = setup.get("theta", config.scheme.theta)?;
        if let Some(value) = setup.raw("mass_treatment") {
            config.scheme.mass = match value {
                "consistent" => MassTreatment::Consistent,
                "lumped" => MassTreatment::Lumped,
                _ => return Err(parse_error("mass_treatment", value)),
            };
        }
        if let Some(value) = setup.raw("advection_scheme") {
            config.scheme.advection = match value {
                "galerkin" => AdvectionScheme::Galerkin,
                "upwind" => AdvectionScheme::Upwind,
                _ => return Err(parse_error("advection_scheme", value)),
            };
        }

        let domain = &mut config.domain;
        domain.lx = conditions.get("lx", domain.lx)?;
        domain.ly = conditions.get("ly", domain.ly)?;
        domain.nx = conditions.get("nx", domain.nx)?;
        domain.ny = conditions.get("ny", domain.ny)?;
        if let Some(value) = conditions.raw("stretching") {
            domain.stretching = parse_stretching(value)?;
        }

        let physics = &mut config.physics;
        physics.diffusivity = conditions.get("diffusivity", physics.diffusivity)?;
        physics.turbulent_diffusivity =
            conditions.get("turbulent_diffusivity", physics.turbulent_diffusivity)?;
        physics.advection_velocity =
            conditions.get("advection_velocity", physics.advection_velocity)?;
        physics.injected_concentration =
            conditions.get("injected_concentration", physics.injected_concentration)?;
        physics.ambient_concentration =
            conditions.get("ambient_concentration", physics.ambient_concentration)?;
        physics.initial_concentration =
            conditions.get("initial_concentration", physics.ambient_concentration)?;
        physics.injection_duration =
            conditions.get("injection_duration", physics.injection_duration)?;
        physics.decay_time = conditions.get("decay_time", physics.decay_time)?;
        physics.decay_cutoff = conditions.get("decay_cutoff", physics.decay_cutoff)?;
        if let Some(value) = conditions.raw("velocity_field") {
            physics.velocity_field = parse_velocity_field(value)?;
        }

        let flags = &mut config.flags;
        flags.diffusion = conditions.get("diffusion", flags.diffusion)?;
        flags.advection = conditions.get("advection", flags.advection)?;
        flags.turbulence = conditions.get("turbulence", flags.turbulence)?;

        let boundary = &mut config.boundary;
        if let Some(value) = conditions.raw("boundary_policy") {
            boundary.policy = parse_boundary_policy(value)?;
        }
        boundary.inlet.y_min = conditions.get("inlet_y_min", boundary.inlet.y_min)?;
        boundary.inlet.y_max = conditions.get("inlet_y_max", boundary.inlet.y_max)?;

        config.probe = match conditions.raw("probe") {
            Some(value) if !is_none(value) => {
                let point = value
                    .split_whitespace()
                    .map(|coordinate| parse::<Float>("probe", coordinate))
                    .collect::<Result<Vec<_>, _>>()?;
                match point[..] {
                    [x, y] => Some([x, y]),
                    _ => return Err(parse_error("probe", value)),
                }
            }
            _ => None,
        };
        Ok(config)
    }
}

fn parse_stretching(value: &str) -> Result<Option<Stretching>, FemError> {
    if is_none(value) {
        return Ok(None);
    }
    let mut words = value.split_whitespace();
    let axis = match words.next() {
        Some("x") => StretchAxis::X,
        Some("y") => StretchAxis::Y,
        _ => return Err(parse_error("stretching", value)),
    };
    let exponent = words
        .next()
        .ok_or_else(|| parse_error("stretching", value))?;
    Ok(Some(Stretching {
        axis,
        exponent: parse("stretching", exponent)?,
    }))
}

fn parse_velocity_field(value: &str) -> Result<VelocityField, FemError> {
    let mut words = value.split_whitespace();
    match words.next() {
        Some("uniform") => {
            let degrees: Float = match words.next() {
                Some(angle) => parse("velocity_field", angle)?,
                None => 0.0,
            };
            Ok(VelocityField::Uniform {
                angle: degrees.to_radians(),
            })
        }
        Some("corner_suction") => Ok(VelocityField::CornerSuction),
        _ => Err(parse_error("velocity_field", value)),
    }
}

fn parse_boundary_policy(value: &str) -> Result<BoundaryPolicy, FemError> {
    let mut words = value.split_whitespace();
    match words.next() {
        Some("passive") => Ok(BoundaryPolicy::Passive),
        Some("inlet") => Ok(BoundaryPolicy::Inlet),
        Some("inlet_with_exhaust") => Ok(BoundaryPolicy::InletWithExhaust),
        Some("fixed_node") => match (words.next(), words.next()) {
            (Some(node), Some(level)) => Ok(BoundaryPolicy::FixedNode {
                node: parse("boundary_policy", node)?,
                value: parse("boundary_policy", level)?,
            }),
            _ => Err(parse_error("boundary_policy", value)),
        },
        _ => Err(parse_error("boundary_policy", value)),
    }
}

fn stretching_label(stretching: &Option<Stretching>) -> String {
    match stretching {
        None => String::from("none"),
        Some(Stretching { axis, exponent }) => {
            let axis = match axis {
                StretchAxis::X => "x",
                StretchAxis::Y => "y",
            };
            format!("{axis} {exponent}")
        }
    }
}

fn velocity_field_label(field: &VelocityField) -> String {
    match field {
        VelocityField::Uniform { angle } => format!("uniform {}", angle.to_degrees()),
        VelocityField::CornerSuction => String::from("corner_suction"),
    }
}

fn boundary_policy_label(policy: &BoundaryPolicy) -> String {
    match policy {
        BoundaryPolicy::Passive => String::from("passive"),
        BoundaryPolicy::FixedNode { node, value } => format!("fixed_node {node} {value}"),
        BoundaryPolicy::Inlet => String::from("inlet"),
        BoundaryPolicy::InletWithExhaust => String::from("inlet_with_exhaust"),
    }
}

pub fn render_case_setup(simulation: &Simulation, config: &CaseConfig) -> String {
    let max_steps = config
        .time
        .max_steps
        .map_or(String::from("none"), |n| n.to_string());
    let mass = match config.scheme.mass {
        MassTreatment::Consistent => "consistent",
        MassTreatment::Lumped => "lumped",
    };
    let advection = match config.scheme.advection {
        AdvectionScheme::Galerkin => "galerkin",
        AdvectionScheme::Upwind => "upwind",
    };
    format!(
        r#"# Run control
case_name = {case_name}
delta_t = {delta_t}
total_time = {total_time}
max_steps = {max_steps}
# 1 = backward Euler, 0.5 = Crank-Nicolson
theta = {theta}
# consistent | lumped
mass_treatment = {mass}
# galerkin | upwind
advection_scheme = {advection}
# frequency <n> | list <step> <step> ...
write_data_mode = {write_data_mode}
print_frequency = {print_frequency}
"#,
        case_name = simulation.case_name,
        delta_t = config.time.delta_t,
        total_time = config.time.total_time,
        theta = config.scheme.theta,
        write_data_mode = simulation.write_data_mode_label(),
        print_frequency = simulation.print_frequency,
    )
}

pub fn render_case_conditions(config: &CaseConfig) -> String {
    let probe = config
        .probe
        .map_or(String::from("none"), |[x, y]| format!("{x} {y}"));
    let physics = &config.physics;
    format!(
        r#"# Domain and mesh
lx = {lx}
ly = {ly}
nx = {nx}
ny = {ny}
# none | x <exponent> | y <exponent>
stretching = {stretching}
# Physics
diffusivity = {diffusivity}
turbulent_diffusivity = {turbulent_diffusivity}
advection_velocity = {advection_velocity}
# uniform <degrees> | corner_suction
velocity_field = {velocity_field}
injected_concentration = {injected}
ambient_concentration = {ambient}
initial_concentration = {initial}
injection_duration = {injection_duration}
decay_time = {decay_time}
decay_cutoff = {decay_cutoff}
diffusion = {diffusion}
advection = {advection}
turbulence = {turbulence}
# passive | inlet | inlet_with_exhaust | fixed_node <node> <value>
boundary_policy = {policy}
inlet_y_min = {y_min}
inlet_y_max = {y_max}
# none | <x> <y>
probe = {probe}
"#,
        lx = config.domain.lx,
        ly = config.domain.ly,
        nx = config.domain.nx,
        ny = config.domain.ny,
        stretching = stretching_label(&config.domain.stretching),
        diffusivity = physics.diffusivity,
        turbulent_diffusivity = physics.turbulent_diffusivity,
        advection_velocity = physics.advection_velocity,
        velocity_field = velocity_field_label(&physics.velocity_field),
        injected = physics.injected_concentration,
        ambient = physics.ambient_concentration,
        initial = physics.initial_concentration,
        injection_duration = physics.injection_duration,
        decay_time = physics.decay_time,
        decay_cutoff = physics.decay_cutoff,
        diffusion = config.flags.diffusion,
        advection = config.flags.advection,
        turbulence = config.flags.turbulence,
        policy = boundary_policy_label(&config.boundary.policy),
        y_min = config.boundary.inlet.y_min,
        y_max = config.boundary.inlet.y_max,
    )
}

/// Reads both case files, creating them with defaults when missing.
pub fn build_case() -> Result<(Simulation, CaseConfig), FemError> {
    crate::io::create_case_directories()?;
    let pre_processing_path = Path::new(crate::io::PRE_PROCESSING_PATH);
    let case_setup_path = pre_processing_path.join(crate::io::CASE_SETUP_FILE);
    let case_conditions_path = pre_processing_path.join(crate::io::CASE_CONDITIONS_FILE);
    if !case_setup_path.exists() || !case_conditions_path.exists() {
        let simulation = Simulation::new();
        let config = CaseConfig::default();
        if !case_setup_path.exists() {
            println!(
                "Creating the default case setup file: {}.\n",
                case_setup_path.display().to_string().yellow().bold()
            );
            fs::write(&case_setup_path, render_case_setup(&simulation, &config))?;
        }
        if !case_conditions_path.exists() {
            println!(
                "Creating the default case conditions file: {}.\n",
                case_conditions_path.display().to_string().yellow().bold()
            );
            fs::write(&case_conditions_path, render_case_conditions(&config))?;
        }
    }
    println!(
        "Reading the case setup file: {}.\n",
        case_setup_path.display().to_string().yellow().bold()
    );
    let setup = crate::io::read_case_setup()?;
    println!(
        "Reading the case conditions file: {}.\n",
        case_conditions_path.display().to_string().yellow().bold()
    );
    let conditions = crate::io::read_case_conditions()?;
    let simulation = Simulation::from_setup(&setup)?;
    let config = CaseConfig::from_parameters(&setup, &conditions)?;
    config.validate()?;
    simulation.create_script_for_mass_graph()?;
    Ok((simulation, config))
}

pub fn write_coordinates(mesh: &Mesh) -> Result<(), FemError> {
    let path = Path::new(crate::io::DATA_PATH).join(crate::io::COORDINATES_FILE);
    println!(
        "Writing {}.\n",
        path.display().to_string().yellow().bold()
    );
    let mut file = File::create(path)?;
    writeln!(file, "{:>8} {:>8} {:>16} {:>16}", "col", "row", "x", "y")?;
    for row in 0..=mesh.ny {
        for col in 0..=mesh.nx {
            let [x, y] = mesh.nodes[mesh.node_index(col, row)].coordinates;
            writeln!(file, "{col:>8} {row:>8} {x:>16.8e} {y:>16.8e}")?;
        }
    }
    Ok(())
}

pub fn write_case_parameters(mesh: &Mesh) -> Result<(), FemError> {
    let path = Path::new(crate::io::POST_PROCESSING_PATH).join(crate::io::CASE_PARAMETERS_FILE);
    let mut file = File::create(path)?;
    writeln!(file, "nx = {}", mesh.nx)?;
    writeln!(file, "ny = {}", mesh.ny)?;
    writeln!(file, "lx = {}", mesh.lx)?;
    writeln!(file, "ly = {}", mesh.ly)?;
    Ok(())
}

pub fn read_case_parameters() -> Result<(usize, usize), FemError> {
    let parameters = crate::io::read_case_parameters()?;
    let parameters = Parameters::new(&parameters);
    let nx = parameters
        .raw("nx")
        .ok_or_else(|| parse_error("nx", ""))
        .and_then(|value| parse("nx", value))?;
    let ny = parameters
        .raw("ny")
        .ok_or_else(|| parse_error("ny", ""))
        .and_then(|value| parse("ny", value))?;
    Ok((nx, ny))
}

pub fn read_coordinates() -> Result<Vec<[Float; 2]>, FemError> {
    let path = Path::new(crate::io::DATA_PATH).join(crate::io::COORDINATES_FILE);
    let reader = BufReader::new(File::open(path)?);
    let mut coordinates = Vec::new();
    for line in reader.lines().skip(1) {
        let line = line?;
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() == 4 {
            coordinates.push([
                parse(crate::io::COORDINATES_FILE, parts[2])?,
                parse(crate::io::COORDINATES_FILE, parts[3])?,
            ]);
        }
    }
    Ok(coordinates)
}

pub fn read_concentration(time_step: usize) -> Result<Vec<Float>, FemError> {
    let path = Path::new(crate::io::DATA_PATH)
        .join(time_step.to_string())
        .join(crate::io::CONCENTRATION_FILE);
    let reader = BufReader::new(File::open(path)?);
    let mut concentration = Vec::new();
    for line in reader.lines().skip(1) {
        let line = line?;
        let value = line.trim();
        if !value.is_empty() {
            concentration.push(parse(crate::io::CONCENTRATION_FILE, value)?);
        }
    }
    Ok(concentration)
}

fn post_processing_header(post_results: &[PostResult]) -> String {
    let mut header = String::new();
    for post_result in post_results {
        match &post_result.unit {
            Some(unit) => header.push_str(&format!(
                "# {}: {} [{}]\n",
                post_result.name, post_result.label, unit
            )),
            None => header.push_str(&format!("# {}: {}\n", post_result.name, post_result.label)),
        }
    }
    header.push_str(&format!("{:>8} {:>16}", "step", "time"));
    for post_result in post_results {
        header.push_str(&format!(" {:>16}", post_result.name));
    }
    header.push('\n');
    header
}

fn post_processing_row(step: usize, time: Float, post_results: &[PostResult]) -> String {
    let mut row = format!("{:>8} {:>16.8e}", step, time);
    for post_result in post_results {
        row.push_str(&format!(" {:>16.8e}", post_result.value));
    }
    row
}

impl Simulation {
    pub fn print_step(&self, report: &StepReport<'_>) {
        let frequency = self.print_frequency.max(1);
        if report.step % frequency.saturating_mul(20) == 0 {
            let duration = self.simulation_time.elapsed().as_secs_f64();
            println!("\n{} {:.2} s.", "Elapsed time:".cyan().bold(), duration);
            println!(
                "\n{:>8} {:>12} {:>10} {:>16} {:>16}\n",
                "step".cyan().bold(),
                "time".cyan().bold(),
                "phase".cyan().bold(),
                "domain_mass".cyan().bold(),
                "probe".cyan().bold()
            );
        }
        if report.step % frequency == 0 {
            let phase = match report.phase() {
                Phase::Injecting => report.phase().label().green(),
                Phase::Relaxing => report.phase().label().blue(),
            };
            let probe = report
                .probe
                .map_or(String::from("-"), |value| format!("{value:.8e}"));
            println!(
                "{:>8} {:>12.4} {:>10} {:>16.8e} {:>16}",
                report.step, report.time, phase, report.mass, probe
            );
        }
    }

    /// Appends one row of post-processing results; step 0 starts a new file.
    pub fn write_post_processing(&self, report: &StepReport<'_>) -> Result<(), FemError> {
        let post_results = report.diagnostics.post_results(report.field);
        let path = Path::new(crate::io::POST_PROCESSING_PATH).join(crate::io::DOMAIN_MASS_FILE);
        let mut file = if report.step == 0 {
            File::create(path)?
        } else {
            OpenOptions::new().create(true).append(true).open(path)?
        };
        if report.step == 0 {
            write!(file, "{}", post_processing_header(&post_results))?;
        }
        writeln!(
            file,
            "{}",
            post_processing_row(report.step, report.time, &post_results)
        )?;
        Ok(())
    }

    pub fn write_data_from_step(&self, time_step: usize, field: &[Float]) -> Result<(), FemError> {
        let step_path = Path::new(crate::io::DATA_PATH).join(time_step.to_string());
        fs::create_dir_all(&step_path)?;
        let path = step_path.join(crate::io::CONCENTRATION_FILE);
        println!(
            "\nWriting {} for time step {}.\n",
            crate::io::CONCENTRATION_FILE.yellow().bold(),
            time_step.to_string().yellow().bold()
        );
        let mut file = File::create(path)?;
        writeln!(file, "{:>16}", "concentration")?;
        for value in field {
            writeln!(file, "{value:>16.8e}")?;
        }
        Ok(())
    }

    pub fn write_vtk_from_step(
        &self,
        mesh: &Mesh,
        time_step: usize,
        field: &[Float],
    ) -> Result<(), FemError> {
        let path_str = super::post::vtk::vtk_file_name(&self.case_prefix(), time_step);
        let path = Path::new(crate::io::VTK_PATH).join(&path_str);
        println!(
            "\nWriting {} for time step {}.\n",
            path_str.yellow().bold(),
            time_step.to_string().yellow().bold()
        );
        super::post::vtk::write_vtk(mesh.nx + 1, mesh.ny + 1, &mesh.coordinates(), field, path)?;
        Ok(())
    }

    fn create_script_for_mass_graph(&self) -> Result<(), FemError> {
        let path = Path::new(crate::io::POST_PROCESSING_PATH).join(crate::io::MASS_GRAPH_FILE);
        let mut file = File::create(&path)?;
        println!(
            "Creating the domain mass graph script file: {}.\n",
            path.display().to_string().yellow().bold()
        );
        writeln!(
            file,
            r#"set title "{case_name}"
    set ylabel "Domain mass"
    set xlabel "Time (s)"
    set grid
    set mxtics 5
    set terminal push
    set terminal pngcairo font "courier"
    set output "fig_{case_name_prefix}_domain_mass.png"
    plot "{file}" u 2:3 t "domain mass" w l
    set terminal pdfcairo font "courier"
    set output "fig_{case_name_prefix}_domain_mass.pdf"
    replot
    set terminal pop
    set output"#,
            case_name = self.case_name,
            case_name_prefix = self.case_prefix(),
            file = crate::io::DOMAIN_MASS_FILE,
        )?;
        Ok(())
    }
}

impl StepObserver for Simulation {
    fn observe(&mut self, report: &StepReport<'_>) -> Result<(), FemError> {
        self.print_step(report);
        self.write_post_processing(report)?;
        if self.write_data_mode.includes(report.step) {
            self.write_data_from_step(report.step, report.field)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::extract_parameters;

    #[test]
    fn default_case_files_parse_back_to_defaults() {
        let simulation = Simulation::new();
        let config = CaseConfig::default();
        let setup = extract_parameters(&render_case_setup(&simulation, &config));
        let conditions = extract_parameters(&render_case_conditions(&config));
        let parsed = CaseConfig::from_parameters(&setup, &conditions).unwrap();
        assert_eq!(parsed, config);
        let parsed_simulation = Simulation::from_setup(&setup).unwrap();
        assert_eq!(parsed_simulation.case_name, simulation.case_name);
        assert_eq!(parsed_simulation.write_data_mode, simulation.write_data_mode);
    }

    #[test]
    fn console_table_accepts_extreme_print_frequencies() {
        let mut config = CaseConfig::default();
        config.domain.nx = 4;
        config.domain.ny = 5;
        let mut solver = crate::q4::Solver::new(&config).unwrap();
        let initial = solver.initial_state();
        let first = solver.step(initial.clone()).unwrap();
        let mut simulation = Simulation::new();
        for frequency in [usize::MAX, usize::MAX / 20 + 1, 0] {
            simulation.print_frequency = frequency;
            simulation.print_step(&solver.report(&initial));
            simulation.print_step(&solver.report(&first));
        }
    }

    #[test]
    fn non_default_options_are_read() {
        let setup = extract_parameters(
            "delta_t = 0.5\nmax_steps = 12\nmass_treatment = lumped\nadvection_scheme = upwind\nwrite_data_mode = list 0 6 12\n",
        );
        let conditions = extract_parameters(
            "stretching = y 1.5\nvelocity_field = corner_suction\nboundary_policy = fixed_node 7 0.25\nprobe = 1.0 0.5\nturbulence = false\n",
        );
        let config = CaseConfig::from_parameters(&setup, &conditions).unwrap();
        assert_eq!(config.time.delta_t, 0.5);
        assert_eq!(config.time.max_steps, Some(12));
        assert_eq!(config.scheme.mass, MassTreatment::Lumped);
        assert_eq!(config.scheme.advection, AdvectionScheme::Upwind);
        assert_eq!(
            config.domain.stretching,
            Some(Stretching {
                axis: StretchAxis::Y,
                exponent: 1.5
            })
        );
        assert_eq!(config.physics.velocity_field, VelocityField::CornerSuction);
        assert_eq!(
            config.boundary.policy,
            BoundaryPolicy::FixedNode {
                node: 7,
                value: 0.25
            }
        );
        assert_eq!(config.probe, Some([1.0, 0.5]));
        assert!(!config.flags.turbulence);
        let simulation = Simulation::from_setup(&setup).unwrap();
        assert_eq!(
            simulation.write_data_mode,
            WriteDataMode::ListOfSteps(vec![0, 6, 12])
        );
    }

    #[test]
    fn post_processing_header_lists_labels_and_units() {
        let results = vec![
            PostResult::new(
                "domain_mass".to_string(),
                "domain mass".to_string(),
                2.0,
                Some("m^2".to_string()),
            ),
            PostResult::new("max".to_string(), "maximum concentration".to_string(), 0.5, None),
        ];
        let header = post_processing_header(&results);
        let lines: Vec<&str> = header.lines().collect();
        assert_eq!(lines[0], "# domain_mass: domain mass [m^2]");
        assert_eq!(lines[1], "# max: maximum concentration");
        assert_eq!(
            lines[2].split_whitespace().collect::<Vec<_>>(),
            ["step", "time", "domain_mass", "max"]
        );
        let row = post_processing_row(3, 1.5, &results);
        assert_eq!(
            row.split_whitespace().collect::<Vec<_>>(),
            ["3", "1.50000000e0", "2.00000000e0", "5.00000000e-1"]
        );
    }

    #[test]
    fn malformed_values_report_the_key() {
        let empty = HashMap::new();
        let conditions = extract_parameters("nx = ten\n");
        match CaseConfig::from_parameters(&empty, &conditions) {
            Err(FemError::Parse { key, value }) => {
                assert_eq!(key, "nx");
                assert_eq!(value, "ten");
            }
            other => panic!("expected a parse error, got {other:?}"),
        }
        let conditions = extract_parameters("boundary_policy = outlet\n");
        assert!(CaseConfig::from_parameters(&empty, &conditions).is_err());
        let setup = extract_parameters("write_data_mode = sometimes\n");
        assert!(Simulation::from_setup(&setup).is_err());
    }
}
