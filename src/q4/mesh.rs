use crate::error::FemError;
use crate::global_variables::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StretchAxis {
    X,
    Y,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stretching {
    pub axis: StretchAxis,
    pub exponent: Float,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Node {
    pub index: usize,
    pub coordinates: [Float; 2],
}

/// Bilinear quadrilateral: bottom-left, bottom-right, top-right, top-left.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Element {
    pub nodes: [usize; 4],
}

/// Structured grid of Q4 elements with row-major node numbering.
///
/// Node `(col, row)` has index `row * (nx + 1) + col`. Nodes and elements are
/// immutable once generated.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub nx: usize,
    pub ny: usize,
    pub lx: Float,
    pub ly: Float,
    pub x_lines: Vec<Float>,
    pub y_lines: Vec<Float>,
    pub nodes: Vec<Node>,
    pub elements: Vec<Element>,
}

impl Mesh {
    pub fn structured(
        lx: Float,
        ly: Float,
        nx: usize,
        ny: usize,
        stretching: Option<Stretching>,
    ) -> Result<Self, FemError> {
        if nx == 0 || ny == 0 {
            return Err(FemError::config(format!(
                "element counts must be positive, got {nx} x {ny}"
            )));
        }
        if !(lx > 0.0 && ly > 0.0 && lx.is_finite() && ly.is_finite()) {
            return Err(FemError::config(format!(
                "domain extents must be positive, got {lx} x {ly}"
            )));
        }
        let (px, py) = match stretching {
            None => (1.0, 1.0),
            Some(Stretching { exponent, .. }) if !(exponent > 0.0 && exponent.is_finite()) => {
                return Err(FemError::config(format!(
                    "stretching exponent must be positive, got {exponent}"
                )));
            }
            Some(Stretching {
                axis: StretchAxis::X,
                exponent,
            }) => (exponent, 1.0),
            Some(Stretching {
                axis: StretchAxis::Y,
                exponent,
            }) => (1.0, exponent),
        };
        let x_lines = graded_lines(lx, nx, px);
        let y_lines = graded_lines(ly, ny, py);
        let mut nodes = Vec::with_capacity((nx + 1) * (ny + 1));
        for (row, &y) in y_lines.iter().enumerate() {
            for (col, &x) in x_lines.iter().enumerate() {
                nodes.push(Node {
                    index: row * (nx + 1) + col,
                    coordinates: [x, y],
                });
            }
        }
        let mut elements = Vec::with_capacity(nx * ny);
        for row in 0..ny {
            for col in 0..nx {
                let bottom_left = row * (nx + 1) + col;
                let top_left = bottom_left + nx + 1;
                elements.push(Element {
                    nodes: [bottom_left, bottom_left + 1, top_left + 1, top_left],
                });
            }
        }
        Ok(Self {
            nx,
            ny,
            lx,
            ly,
            x_lines,
            y_lines,
            nodes,
            elements,
        })
    }

    pub fn number_of_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_index(&self, col: usize, row: usize) -> usize {
        row * (self.nx + 1) + col
    }

    pub fn coordinates(&self) -> Vec<[Float; 2]> {
        self.nodes.iter().map(|node| node.coordinates).collect()
    }

    pub fn element_coordinates(&self, element: &Element) -> [[Float; 2]; 4] {
        element.nodes.map(|n| self.nodes[n].coordinates)
    }

    /// Widest grid spacing in either direction, used as the mesh size `h`.
    pub fn max_spacing(&self) -> Float {
        let spacing = |lines: &[Float]| {
            lines
                .windows(2)
                .map(|w| w[1] - w[0])
                .fold(0.0, Float::max)
        };
        spacing(&self.x_lines).max(spacing(&self.y_lines))
    }

    /// Bilinear interpolation of a nodal field at `(x, y)`.
    ///
    /// Points outside the domain are clamped to the boundary cell.
    pub fn interpolate(&self, field: &[Float], x: Float, y: Float) -> Float {
        let (col, sx) = locate(&self.x_lines, x);
        let (row, sy) = locate(&self.y_lines, y);
        let u00 = field[self.node_index(col, row)];
        let u10 = field[self.node_index(col + 1, row)];
        let u11 = field[self.node_index(col + 1, row + 1)];
        let u01 = field[self.node_index(col, row + 1)];
        (1.0 - sx) * (1.0 - sy) * u00 + sx * (1.0 - sy) * u10 + sx * sy * u11 + (1.0 - sx) * sy * u01
    }
}

fn graded_lines(length: Float, n: usize, exponent: Float) -> Vec<Float> {
    (0..=n)
        .map(|i| {
            if i == n {
                length
            } else {
                length * (i as Float / n as Float).powf(exponent)
            }
        })
        .collect()
}

fn locate(lines: &[Float], value: Float) -> (usize, Float) {
    let last_cell = lines.len() - 2;
    let cell = lines
        .partition_point(|&line| line <= value)
        .saturating_sub(1)
        .min(last_cell);
    let s = (value - lines[cell]) / (lines[cell + 1] - lines[cell]);
    (cell, s.clamp(0.0, 1.0))
}
