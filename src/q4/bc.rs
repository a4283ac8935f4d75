use super::mesh::Mesh;
use crate::error::FemError;
use crate::global_variables::*;

/// Forcing rule applied at the constrained nodes.
#[derive(Clone, Debug, PartialEq)]
pub enum BoundaryPolicy {
    /// Every boundary is passive (natural, zero flux).
    Passive,
    /// A single node held at `value` for the whole run.
    FixedNode { node: usize, value: Float },
    /// Inlet slot held at the injected concentration while the jet is on and
    /// at ambient afterwards.
    Inlet,
    /// `Inlet` plus the domain corners held at ambient while injecting.
    InletWithExhaust,
}

/// Vertical slot on the `x = 0` wall.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InletSlot {
    pub y_min: Float,
    pub y_max: Float,
}

impl Default for InletSlot {
    fn default() -> Self {
        Self {
            y_min: INLET_Y_MIN,
            y_max: INLET_Y_MAX,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct BoundarySets {
    pub inlet: Vec<usize>,
    pub exhaust: Vec<usize>,
    pub fixed: Vec<(usize, Float)>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Constraints {
    pub nodes: Vec<(usize, Float)>,
}

pub fn inlet_nodes(mesh: &Mesh, slot: &InletSlot, tolerance: Float) -> Vec<usize> {
    mesh.nodes
        .iter()
        .filter(|node| {
            let [x, y] = node.coordinates;
            x.abs() <= tolerance && y >= slot.y_min - tolerance && y <= slot.y_max + tolerance
        })
        .map(|node| node.index)
        .collect()
}

pub fn corner_nodes(mesh: &Mesh, tolerance: Float) -> Vec<usize> {
    let on = |value: Float, target: Float| (value - target).abs() <= tolerance;
    mesh.nodes
        .iter()
        .filter(|node| {
            let [x, y] = node.coordinates;
            (on(x, 0.0) || on(x, mesh.lx)) && (on(y, 0.0) || on(y, mesh.ly))
        })
        .map(|node| node.index)
        .collect()
}

/// Index of the node closest to `point`; ties resolve to the lowest index.
pub fn nearest_node(mesh: &Mesh, point: [Float; 2]) -> usize {
    let distance = |c: [Float; 2]| (c[0] - point[0]).powi(2) + (c[1] - point[1]).powi(2);
    mesh.nodes
        .iter()
        .fold((0, Float::INFINITY), |(best, best_distance), node| {
            let d = distance(node.coordinates);
            if d < best_distance {
                (node.index, d)
            } else {
                (best, best_distance)
            }
        })
        .0
}

impl BoundarySets {
    pub fn classify(
        mesh: &Mesh,
        policy: &BoundaryPolicy,
        slot: &InletSlot,
        tolerance: Float,
    ) -> Result<Self, FemError> {
        let mut sets = BoundarySets::default();
        match *policy {
            BoundaryPolicy::Passive => {}
            BoundaryPolicy::FixedNode { node, value } => {
                if node >= mesh.number_of_nodes() {
                    return Err(FemError::config(format!(
                        "fixed node {node} is outside the mesh ({} nodes)",
                        mesh.number_of_nodes()
                    )));
                }
                sets.fixed.push((node, value));
            }
            BoundaryPolicy::Inlet => {
                sets.inlet = inlet_nodes(mesh, slot, tolerance);
            }
            BoundaryPolicy::InletWithExhaust => {
                sets.inlet = inlet_nodes(mesh, slot, tolerance);
                sets.exhaust = corner_nodes(mesh, tolerance);
                if let Some(node) = sets.inlet.iter().find(|n| sets.exhaust.contains(n)) {
                    return Err(FemError::config(format!(
                        "node {node} is both inlet and exhaust"
                    )));
                }
            }
        }
        if matches!(
            policy,
            BoundaryPolicy::Inlet | BoundaryPolicy::InletWithExhaust
        ) && sets.inlet.is_empty()
        {
            return Err(FemError::config(format!(
                "inlet slot {}..{} contains no mesh node",
                slot.y_min, slot.y_max
            )));
        }
        Ok(sets)
    }

    pub fn constraints(&self, jet: bool, injected: Float, ambient: Float) -> Constraints {
        let inlet_value = if jet { injected } else { ambient };
        let mut nodes: Vec<(usize, Float)> = self.fixed.clone();
        nodes.extend(self.inlet.iter().map(|&n| (n, inlet_value)));
        if jet {
            nodes.extend(self.exhaust.iter().map(|&n| (n, ambient)));
        }
        Constraints { nodes }
    }
}
