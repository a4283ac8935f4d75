use colored::*;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

pub const DATA_PATH: &'static str = "./data";

pub const PRE_PROCESSING_PATH: &'static str = "./pre_processing";

pub const CASE_SETUP_FILE: &'static str = "case_setup.jou";

pub const CASE_CONDITIONS_FILE: &'static str = "case_conditions.jou";

pub const CASE_PARAMETERS_FILE: &'static str = "case_parameters.jou";

pub const POST_PROCESSING_PATH: &'static str = "./post_processing";

pub const VTK_PATH: &'static str = "./post_processing/vtk_files";

pub const COORDINATES_FILE: &'static str = "coordinates.dat";

pub const CONCENTRATION_FILE: &'static str = "concentration.dat";

pub const DOMAIN_MASS_FILE: &'static str = "domain_mass.dat";

pub const CONVERGENCE_FILE: &'static str = "convergence.dat";

pub const MASS_GRAPH_FILE: &'static str = "gr_domain_mass.gp";

#[derive(Clone, Debug, PartialEq)]
pub enum WriteDataMode {
    Frequency(usize),

    ListOfSteps(Vec<usize>),
}

impl WriteDataMode {
    /// Whether the field of `time_step` goes to disk. Step 0 always does.
    pub fn includes(&self, time_step: usize) -> bool {
        match self {
            WriteDataMode::Frequency(n) => time_step == 0 || (*n > 0 && time_step % n == 0),
            WriteDataMode::ListOfSteps(list) => time_step == 0 || list.contains(&time_step),
        }
    }
}

pub fn create_case_directories() -> io::Result<()> {
    let list_of_paths = [
        DATA_PATH,
        PRE_PROCESSING_PATH,
        POST_PROCESSING_PATH,
        VTK_PATH,
    ];
    for path_str in list_of_paths {
        let path = Path::new(path_str);
        if !path.exists() {
            println!("Creating the {} path.\n", path_str.yellow().bold());
            fs::create_dir_all(path)?;
        } else {
            println!("The {} path already exists.\n", path_str.yellow().bold());
        }
    }
    Ok(())
}

pub fn read_case_setup() -> io::Result<HashMap<String, String>> {
    read_parameters(Path::new(PRE_PROCESSING_PATH).join(CASE_SETUP_FILE))
}

pub fn read_case_conditions() -> io::Result<HashMap<String, String>> {
    read_parameters(Path::new(PRE_PROCESSING_PATH).join(CASE_CONDITIONS_FILE))
}

pub fn read_case_parameters() -> io::Result<HashMap<String, String>> {
    read_parameters(Path::new(POST_PROCESSING_PATH).join(CASE_PARAMETERS_FILE))
}

fn read_parameters<P: AsRef<Path>>(path: P) -> io::Result<HashMap<String, String>> {
    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    Ok(extract_parameters(&contents))
}

/// Parses `key = value` lines; `#` starts a comment line.
pub fn extract_parameters(contents: &str) -> HashMap<String, String> {
    contents
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.starts_with('#'))
        .filter(|line| !line.is_empty())
        .filter_map(|line| {
            let mut parts = line.splitn(2, '=');
            let key = parts.next()?.trim().to_string();
            let value = parts.next().unwrap_or("").trim().to_string();
            Some((key, value))
        })
        .collect::<HashMap<String, String>>()
}
