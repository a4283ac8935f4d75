use super::mesh::{Element, Mesh};
use super::VelocityField;
use crate::error::FemError;
use crate::global_variables::*;

pub const QUADRATURE: [[Float; 2]; 4] = [
    [-GAUSS_POINT, -GAUSS_POINT],
    [GAUSS_POINT, -GAUSS_POINT],
    [GAUSS_POINT, GAUSS_POINT],
    [-GAUSS_POINT, GAUSS_POINT],
];

const CORNERS: [[Float; 2]; 4] = [[-1.0, -1.0], [1.0, -1.0], [1.0, 1.0], [-1.0, 1.0]];

pub type LocalMatrix = [[Float; 4]; 4];

/// Local matrices of one element. `diffusion` uses unit diffusivity and
/// `advection` the unit direction field; both are scaled per step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LocalMatrices {
    pub mass: LocalMatrix,
    pub diffusion: LocalMatrix,
    pub advection: LocalMatrix,
}

pub fn shape_functions(xi: Float, eta: Float) -> [Float; 4] {
    CORNERS.map(|[a, b]| 0.25 * (1.0 + a * xi) * (1.0 + b * eta))
}

/// Parametric derivatives `[dN/dxi, dN/deta]`.
pub fn shape_derivatives(xi: Float, eta: Float) -> [[Float; 4]; 2] {
    [
        CORNERS.map(|[a, b]| 0.25 * a * (1.0 + b * eta)),
        CORNERS.map(|[a, b]| 0.25 * b * (1.0 + a * xi)),
    ]
}

#[derive(Clone, Copy, Debug)]
pub struct PointEvaluation {
    pub shape: [Float; 4],
    pub gradients: [[Float; 2]; 4],
    pub position: [Float; 2],
    pub determinant: Float,
}

pub fn evaluate(coordinates: &[[Float; 2]; 4], xi: Float, eta: Float) -> PointEvaluation {
    let shape = shape_functions(xi, eta);
    let [dxi, deta] = shape_derivatives(xi, eta);
    let mut jacobian = [[0.0; 2]; 2];
    let mut position = [0.0; 2];
    for a in 0..4 {
        let [x, y] = coordinates[a];
        jacobian[0][0] += dxi[a] * x;
        jacobian[0][1] += dxi[a] * y;
        jacobian[1][0] += deta[a] * x;
        jacobian[1][1] += deta[a] * y;
        position[0] += shape[a] * x;
        position[1] += shape[a] * y;
    }
    let determinant = jacobian[0][0] * jacobian[1][1] - jacobian[0][1] * jacobian[1][0];
    let mut gradients = [[0.0; 2]; 4];
    for a in 0..4 {
        gradients[a] = [
            (jacobian[1][1] * dxi[a] - jacobian[0][1] * deta[a]) / determinant,
            (-jacobian[1][0] * dxi[a] + jacobian[0][0] * deta[a]) / determinant,
        ];
    }
    PointEvaluation {
        shape,
        gradients,
        position,
        determinant,
    }
}

/// Integrates mass, diffusion and advection for element `index`.
///
/// Fails with [`FemError::Geometry`] if `det(J) <= 0` at any point.
pub fn integrate(
    index: usize,
    coordinates: &[[Float; 2]; 4],
    velocity: &VelocityField,
    extents: [Float; 2],
) -> Result<LocalMatrices, FemError> {
    let mut local = LocalMatrices::default();
    for &[xi, eta] in QUADRATURE.iter() {
        let point = evaluate(coordinates, xi, eta);
        if !(point.determinant > 0.0) {
            return Err(FemError::Geometry {
                element: index,
                determinant: point.determinant,
            });
        }
        let weight = point.determinant * GAUSS_WEIGHT * GAUSS_WEIGHT;
        let v = velocity.direction(point.position, extents);
        for i in 0..4 {
            for j in 0..4 {
                let [gx_i, gy_i] = point.gradients[i];
                let [gx_j, gy_j] = point.gradients[j];
                local.mass[i][j] += point.shape[i] * point.shape[j] * weight;
                local.diffusion[i][j] += (gx_i * gx_j + gy_i * gy_j) * weight;
                local.advection[i][j] += point.shape[i] * (v[0] * gx_j + v[1] * gy_j) * weight;
            }
        }
    }
    Ok(local)
}

pub fn integrate_element(
    mesh: &Mesh,
    index: usize,
    element: &Element,
    velocity: &VelocityField,
) -> Result<LocalMatrices, FemError> {
    integrate(
        index,
        &mesh.element_coordinates(element),
        velocity,
        [mesh.lx, mesh.ly],
    )
}
