pub mod vtk;

use super::bc::nearest_node;
use super::mesh::Mesh;
use crate::global_variables::*;
use crate::post::PostResult;
use rayon::prelude::*;

#[derive(Clone, Debug)]
pub struct Diagnostics {
    pub lumped_area: Vec<Float>,
    pub probe_node: Option<usize>,
}

impl Diagnostics {
    pub fn new(mesh: &Mesh, lumped_area: Vec<Float>, probe: Option<[Float; 2]>) -> Self {
        Self {
            lumped_area,
            probe_node: probe.map(|point| nearest_node(mesh, point)),
        }
    }

    pub fn domain_mass(&self, field: &[Float]) -> Float {
        self.lumped_area
            .iter()
            .zip(field.iter())
            .map(|(area, value)| area * value)
            .sum()
    }

    pub fn probe(&self, field: &[Float]) -> Option<Float> {
        self.probe_node.map(|node| field[node])
    }

    pub fn total_area(&self) -> Float {
        self.lumped_area.iter().sum()
    }

    pub fn max_concentration(&self, field: &[Float]) -> Float {
        field
            .par_iter()
            .copied()
            .reduce_with(Float::max)
            .unwrap_or(0.0)
    }

    pub fn min_concentration(&self, field: &[Float]) -> Float {
        field
            .par_iter()
            .copied()
            .reduce_with(Float::min)
            .unwrap_or(0.0)
    }

    pub fn post_results(&self, field: &[Float]) -> Vec<PostResult> {
        let mass = self.domain_mass(field);
        let mean = mass / self.total_area();
        let max = self.max_concentration(field);
        let min = self.min_concentration(field);
        let mut results = vec![
            PostResult::new(
                "domain_mass".to_string(),
                "lumped-area integral of the concentration".to_string(),
                mass,
                Some("m^2".to_string()),
            ),
            PostResult::new(
                "mean".to_string(),
                "area-weighted mean concentration".to_string(),
                mean,
                None,
            ),
            PostResult::new(
                "max".to_string(),
                "maximum concentration".to_string(),
                max,
                None,
            ),
            PostResult::new(
                "min".to_string(),
                "minimum concentration".to_string(),
                min,
                None,
            ),
        ];
        if let Some(value) = self.probe(field) {
            results.push(PostResult::new(
                "probe".to_string(),
                "probe concentration".to_string(),
                value,
                None,
            ));
        }
        results
    }
}
