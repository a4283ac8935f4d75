use super::element::{self, LocalMatrices};
use super::mesh::Mesh;
use super::sparse::{CsrMatrix, SparsityPattern};
use super::VelocityField;
use crate::error::FemError;
use crate::global_variables::*;
use rayon::prelude::*;
use std::sync::Arc;

const ELEMENTS_PER_TASK: usize = 256;

/// Global mass, unit-diffusivity and unit-velocity advection matrices.
///
/// They are assembled once per mesh; per-step physics only rescales them.
#[derive(Debug, Clone)]
pub struct GlobalMatrices {
    pub pattern: Arc<SparsityPattern>,
    pub mass: CsrMatrix,
    pub lumped_mass: CsrMatrix,
    pub diffusion: CsrMatrix,
    pub advection: CsrMatrix,
    pub lumped_area: Vec<Float>,
}

impl GlobalMatrices {
    /// Integrates every element in parallel, then scatters the local
    /// matrices into the shared value arrays on a single thread in element
    /// order, so the result does not depend on the thread count.
    pub fn assemble(mesh: &Mesh, velocity: &VelocityField) -> Result<Self, FemError> {
        let (pattern, positions) =
            SparsityPattern::from_elements(mesh.number_of_nodes(), &mesh.elements);
        let pattern = Arc::new(pattern);

        let partitions: Vec<Vec<LocalMatrices>> = mesh
            .elements
            .par_chunks(ELEMENTS_PER_TASK)
            .enumerate()
            .map(|(chunk, elements)| {
                elements
                    .iter()
                    .enumerate()
                    .map(|(offset, e)| {
                        let index = chunk * ELEMENTS_PER_TASK + offset;
                        element::integrate_element(mesh, index, e, velocity)
                    })
                    .collect::<Result<Vec<_>, _>>()
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut mass = CsrMatrix::zeros(Arc::clone(&pattern));
        let mut diffusion = CsrMatrix::zeros(Arc::clone(&pattern));
        let mut advection = CsrMatrix::zeros(Arc::clone(&pattern));
        for (local, slots) in partitions.iter().flatten().zip(positions.iter()) {
            for a in 0..4 {
                for b in 0..4 {
                    let p = slots[a * 4 + b];
                    mass.values_mut()[p] += local.mass[a][b];
                    diffusion.values_mut()[p] += local.diffusion[a][b];
                    advection.values_mut()[p] += local.advection[a][b];
                }
            }
        }

        let lumped_area = mass.row_sums();
        let lumped_mass = CsrMatrix::from_diagonal(Arc::clone(&pattern), &lumped_area);
        Ok(Self {
            pattern,
            mass,
            lumped_mass,
            diffusion,
            advection,
            lumped_area,
        })
    }
}
