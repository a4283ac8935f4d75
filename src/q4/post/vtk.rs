use crate::error::FemError;
use crate::global_variables::*;
use colored::*;
use rayon::prelude::*;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Legacy ASCII structured grid with the concentration as point scalars.
///
/// `points_x` and `points_y` are node counts per direction; `coordinates`
/// and `concentration` follow the row-major node numbering.
pub fn write_vtk<P>(
    points_x: usize,
    points_y: usize,
    coordinates: &[[Float; 2]],
    concentration: &[Float],
    path: P,
) -> io::Result<()>
where
    P: AsRef<Path>,
{
    let point_data = points_x * points_y;
    let mut file = BufWriter::new(File::create(path)?);
    writeln!(file, "# vtk DataFile Version 3.0")?;
    writeln!(file, "PM2.5 concentration")?;
    writeln!(file, "ASCII")?;
    writeln!(file, "DATASET STRUCTURED_GRID")?;
    writeln!(file, "DIMENSIONS {points_x} {points_y} 1")?;
    writeln!(file, "POINTS {point_data} float")?;
    for [x, y] in coordinates {
        writeln!(file, "{x:>.6e} {y:>.6e} 0.0")?;
    }
    writeln!(file, "POINT_DATA {point_data}")?;
    writeln!(file, "SCALARS concentration float 1")?;
    writeln!(file, "LOOKUP_TABLE default")?;
    for value in concentration {
        writeln!(file, "{value:>.6e}")?;
    }
    file.flush()
}

pub fn vtk_file_name(case_prefix: &str, time_step: usize) -> String {
    format!("{case_prefix}_results_{:08}.vtk", time_step)
}

fn read_data_directory() -> io::Result<Vec<usize>> {
    let mut time_steps = Vec::new();
    let path = Path::new(crate::io::DATA_PATH);
    for entry in std::fs::read_dir(path)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            if let Ok(time_step) = entry.file_name().to_string_lossy().parse::<usize>() {
                time_steps.push(time_step);
            }
        }
    }
    time_steps.sort_unstable();
    Ok(time_steps)
}

pub fn run_vtk_post_processing() -> Result<(), FemError> {
    let case_name = match crate::io::read_case_setup() {
        Ok(case_setup) => case_setup
            .get("case_name")
            .cloned()
            .unwrap_or_else(|| String::from(CASE_NAME)),
        Err(_) => String::from(CASE_NAME),
    }
    .replace(' ', "_")
    .to_lowercase();
    let (nx, ny) = crate::q4::io::read_case_parameters()?;
    let coordinates = crate::q4::io::read_coordinates()?;
    if coordinates.len() != (nx + 1) * (ny + 1) {
        return Err(FemError::config(format!(
            "{} holds {} nodes, expected {}",
            crate::io::COORDINATES_FILE,
            coordinates.len(),
            (nx + 1) * (ny + 1)
        )));
    }
    let time_steps = read_data_directory()?;
    println!(
        "Found {} stored time steps.\n",
        time_steps.len().to_string().yellow().bold()
    );
    time_steps.par_iter().try_for_each(|&time_step| {
        let concentration = crate::q4::io::read_concentration(time_step)?;
        let path_str = vtk_file_name(&case_name, time_step);
        let path = Path::new(crate::io::VTK_PATH).join(&path_str);
        println!(
            "Writing {} for time step {}.\n",
            path_str.yellow().bold(),
            time_step.to_string().yellow().bold()
        );
        write_vtk(nx + 1, ny + 1, &coordinates, &concentration, path)?;
        Ok::<(), FemError>(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::q4::mesh::Mesh;

    #[test]
    fn file_name_carries_case_and_padded_step() {
        assert_eq!(vtk_file_name("pm25_pulse", 240), "pm25_pulse_results_00000240.vtk");
    }

    #[test]
    fn structured_grid_lists_points_then_scalars() {
        let mesh = Mesh::structured(2.0, 1.0, 2, 1, None).unwrap();
        let field: Vec<Float> = (0..mesh.number_of_nodes()).map(|i| 0.5 * i as Float).collect();
        let path = std::env::temp_dir().join(format!("pm_fem_vtk_{}.vtk", std::process::id()));
        write_vtk(3, 2, &mesh.coordinates(), &field, &path).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[3], "DATASET STRUCTURED_GRID");
        assert_eq!(lines[4], "DIMENSIONS 3 2 1");
        assert_eq!(lines[5], "POINTS 6 float");
        assert_eq!(lines[6], "0.000000e0 0.000000e0 0.0");
        assert_eq!(lines[12], "POINT_DATA 6");
        assert_eq!(lines[15], "0.000000e0");
        assert_eq!(lines[20], "2.500000e0");
        assert_eq!(lines.len(), 21);
    }
}
