use super::mesh::Mesh;
use super::solver::{simulate, RunOutput};
use super::{CaseConfig, Simulation};
use crate::error::FemError;
use crate::global_variables::*;
use colored::*;
use rayon::prelude::*;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Grid refinement study: level `k` runs with `(nx, ny) * 2^k`.
#[derive(Clone, Debug)]
pub struct ConvergenceStudy {
    base: CaseConfig,
    levels: usize,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelError {
    pub nx: usize,
    pub ny: usize,
    pub h: Float,
    pub error: Float,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConvergenceReport {
    /// Every level except the reference, coarsest first.
    pub levels: Vec<LevelError>,
    /// Observed order between consecutive entries of `levels`.
    pub orders: Vec<Float>,
}

impl ConvergenceStudy {
    pub fn new(base: CaseConfig, levels: usize) -> Result<Self, FemError> {
        if levels < 2 {
            return Err(FemError::config(format!(
                "a convergence study needs at least 2 levels, got {levels}"
            )));
        }
        if levels > 8 {
            return Err(FemError::config(format!(
                "{levels} levels would refine the base mesh by 2^{}",
                levels - 1
            )));
        }
        base.validate()?;
        Ok(Self { base, levels })
    }

    fn level_config(&self, level: usize) -> CaseConfig {
        self.base.refined(1 << level)
    }

    /// Runs every level in parallel and measures the coarse levels against
    /// the finest one.
    pub fn run(&self) -> Result<ConvergenceReport, FemError> {
        let configs: Vec<CaseConfig> = (0..self.levels).map(|k| self.level_config(k)).collect();
        let outputs = configs
            .par_iter()
            .map(simulate)
            .collect::<Result<Vec<RunOutput>, FemError>>()?;

        let (reference, coarse) = match outputs.split_last() {
            Some(split) => split,
            None => return Err(FemError::config("no convergence level was run")),
        };
        let mut levels = Vec::with_capacity(coarse.len());
        for (output, config) in coarse.iter().zip(configs.iter()) {
            let domain = &config.domain;
            let mesh = Mesh::structured(domain.lx, domain.ly, output.nx, output.ny, domain.stretching)?;
            levels.push(LevelError {
                nx: output.nx,
                ny: output.ny,
                h: mesh.max_spacing(),
                error: l2_error(&mesh, &output.final_field, reference),
            });
        }
        let orders = levels
            .windows(2)
            .map(|pair| (pair[0].error / pair[1].error).ln() / (pair[0].h / pair[1].h).ln())
            .collect();
        Ok(ConvergenceReport { levels, orders })
    }
}

/// Lumped-area weighted L2 distance between a coarse field, interpolated
/// onto the reference nodes, and the reference field.
pub fn l2_error(coarse_mesh: &Mesh, coarse_field: &[Float], reference: &RunOutput) -> Float {
    reference
        .coordinates
        .iter()
        .zip(reference.final_field.iter())
        .zip(reference.lumped_area.iter())
        .map(|((&[x, y], &exact), &area)| {
            let difference = coarse_mesh.interpolate(coarse_field, x, y) - exact;
            area * difference * difference
        })
        .sum::<Float>()
        .sqrt()
}

impl ConvergenceReport {
    pub fn print(&self) {
        println!(
            "\n{:>8} {:>8} {:>16} {:>16} {:>10}\n",
            "nx".cyan().bold(),
            "ny".cyan().bold(),
            "h".cyan().bold(),
            "L2 error".cyan().bold(),
            "order".cyan().bold()
        );
        for (k, level) in self.levels.iter().enumerate() {
            let order = match k {
                0 => String::from("-"),
                _ => format!("{:.3}", self.orders[k - 1]),
            };
            println!(
                "{:>8} {:>8} {:>16.8e} {:>16.8e} {:>10}",
                level.nx, level.ny, level.h, level.error, order
            );
        }
    }

    pub fn write(&self, simulation: &Simulation) -> Result<(), FemError> {
        let path = Path::new(crate::io::POST_PROCESSING_PATH).join(crate::io::CONVERGENCE_FILE);
        println!(
            "\nWriting {}.\n",
            path.display().to_string().yellow().bold()
        );
        let mut file = File::create(path)?;
        writeln!(file, "# {}", simulation.case_name)?;
        writeln!(
            file,
            "{:>8} {:>8} {:>16} {:>16} {:>16}",
            "nx", "ny", "h", "error", "order"
        )?;
        for (k, level) in self.levels.iter().enumerate() {
            let order = if k == 0 { Float::NAN } else { self.orders[k - 1] };
            writeln!(
                file,
                "{:>8} {:>8} {:>16.8e} {:>16.8e} {:>16.8e}",
                level.nx, level.ny, level.h, level.error, order
            )?;
        }
        Ok(())
    }
}
