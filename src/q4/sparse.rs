use super::bc::Constraints;
use super::mesh::Element;
use crate::global_variables::*;
use std::ops::Range;
use std::sync::Arc;

/// Compressed sparse row structure shared by every global matrix of a mesh.
///
/// Values live in separate arrays indexed by the positions stored here, so
/// time-varying scaling is a pass over the value arrays and never touches the
/// structure.
#[derive(Debug, Clone)]
pub struct SparsityPattern {
    n: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    diagonal: Vec<usize>,
    transpose: Vec<usize>,
    lower_bandwidth: usize,
    upper_bandwidth: usize,
}

impl SparsityPattern {
    /// Builds the pattern from Q4 connectivity.
    ///
    /// Also returns, for every element, the value position of each of its
    /// 16 local entries (row-major `a * 4 + b`).
    pub fn from_elements(n: usize, elements: &[Element]) -> (Self, Vec<[usize; 16]>) {
        let mut entries: Vec<(usize, usize, usize)> = Vec::with_capacity(elements.len() * 16);
        for (e, element) in elements.iter().enumerate() {
            for a in 0..4 {
                for b in 0..4 {
                    entries.push((element.nodes[a], element.nodes[b], e * 16 + a * 4 + b));
                }
            }
        }
        entries.sort_unstable();

        let mut row_ptr = vec![0; n + 1];
        let mut col_idx = Vec::new();
        let mut slots = vec![0; elements.len() * 16];
        let mut previous = None;
        for &(row, col, slot) in entries.iter() {
            if previous != Some((row, col)) {
                col_idx.push(col);
                row_ptr[row + 1] += 1;
                previous = Some((row, col));
            }
            slots[slot] = col_idx.len() - 1;
        }
        for row in 0..n {
            row_ptr[row + 1] += row_ptr[row];
        }

        let mut diagonal = vec![0; n];
        let mut transpose = vec![0; col_idx.len()];
        let mut positions = Vec::with_capacity(elements.len());
        for (e, element) in elements.iter().enumerate() {
            let local: [usize; 16] = std::array::from_fn(|k| slots[e * 16 + k]);
            for a in 0..4 {
                diagonal[element.nodes[a]] = local[a * 4 + a];
                for b in 0..4 {
                    transpose[local[a * 4 + b]] = local[b * 4 + a];
                }
            }
            positions.push(local);
        }

        let mut lower_bandwidth = 0;
        let mut upper_bandwidth = 0;
        for row in 0..n {
            for &col in &col_idx[row_ptr[row]..row_ptr[row + 1]] {
                lower_bandwidth = lower_bandwidth.max(row.saturating_sub(col));
                upper_bandwidth = upper_bandwidth.max(col.saturating_sub(row));
            }
        }

        let pattern = Self {
            n,
            row_ptr,
            col_idx,
            diagonal,
            transpose,
            lower_bandwidth,
            upper_bandwidth,
        };
        (pattern, positions)
    }

    pub fn n(&self) -> usize {
        self.n
    }

    pub fn nnz(&self) -> usize {
        self.col_idx.len()
    }

    pub fn row(&self, row: usize) -> Range<usize> {
        self.row_ptr[row]..self.row_ptr[row + 1]
    }

    pub fn col(&self, position: usize) -> usize {
        self.col_idx[position]
    }

    pub fn bandwidths(&self) -> (usize, usize) {
        (self.lower_bandwidth, self.upper_bandwidth)
    }

    pub fn find(&self, row: usize, col: usize) -> Option<usize> {
        let range = self.row(row);
        self.col_idx[range.clone()]
            .binary_search(&col)
            .ok()
            .map(|local| range.start + local)
    }
}

#[derive(Debug, Clone)]
pub struct CsrMatrix {
    pattern: Arc<SparsityPattern>,
    values: Vec<Float>,
}

impl CsrMatrix {
    pub fn zeros(pattern: Arc<SparsityPattern>) -> Self {
        let values = vec![0.0; pattern.nnz()];
        Self { pattern, values }
    }

    pub fn from_diagonal(pattern: Arc<SparsityPattern>, diagonal: &[Float]) -> Self {
        let mut matrix = Self::zeros(pattern);
        for (row, &value) in diagonal.iter().enumerate() {
            let position = matrix.pattern.diagonal[row];
            matrix.values[position] = value;
        }
        matrix
    }

    /// `sum(scale_k * matrix_k)` over matrices sharing one pattern.
    pub fn combination(pattern: &Arc<SparsityPattern>, terms: &[(Float, &CsrMatrix)]) -> Self {
        let mut result = Self::zeros(Arc::clone(pattern));
        for &(scale, matrix) in terms {
            debug_assert!(Arc::ptr_eq(pattern, &matrix.pattern));
            if scale == 0.0 {
                continue;
            }
            result
                .values
                .iter_mut()
                .zip(matrix.values.iter())
                .for_each(|(r, &v)| *r += scale * v);
        }
        result
    }

    pub fn pattern(&self) -> &SparsityPattern {
        &self.pattern
    }

    pub fn n(&self) -> usize {
        self.pattern.n
    }

    pub fn values(&self) -> &[Float] {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut [Float] {
        &mut self.values
    }

    pub fn get(&self, row: usize, col: usize) -> Float {
        self.pattern
            .find(row, col)
            .map_or(0.0, |position| self.values[position])
    }

    pub fn mul_vec(&self, x: &[Float], y: &mut [Float]) {
        for row in 0..self.n() {
            y[row] = self
                .pattern
                .row(row)
                .map(|p| self.values[p] * x[self.pattern.col_idx[p]])
                .sum();
        }
    }

    pub fn row_sums(&self) -> Vec<Float> {
        (0..self.n())
            .map(|row| self.pattern.row(row).map(|p| self.values[p]).sum())
            .collect()
    }

    /// Adds the smallest symmetric graph Laplacian that removes every
    /// positive off-diagonal entry. Row sums are unchanged.
    pub fn upwind(&mut self) {
        for row in 0..self.n() {
            for p in self.pattern.row(row) {
                let col = self.pattern.col_idx[p];
                if col <= row {
                    continue;
                }
                let q = self.pattern.transpose[p];
                let d = self.values[p].max(self.values[q]).max(0.0);
                if d > 0.0 {
                    self.values[p] -= d;
                    self.values[q] -= d;
                    self.values[self.pattern.diagonal[row]] += d;
                    self.values[self.pattern.diagonal[col]] += d;
                }
            }
        }
    }

    /// Enforces Dirichlet values on the system `self * u = rhs`.
    ///
    /// Constrained rows become identity rows. Their columns are moved to the
    /// right-hand side of the free rows, so a held node solves to its value
    /// exactly.
    pub fn apply_dirichlet(&mut self, rhs: &mut [Float], constraints: &Constraints) {
        let mut held = vec![false; self.n()];
        for &(node, _) in constraints.nodes.iter() {
            held[node] = true;
        }
        for &(node, value) in constraints.nodes.iter() {
            for p in self.pattern.row(node) {
                let row = self.pattern.col_idx[p];
                if row == node || held[row] {
                    continue;
                }
                let q = self.pattern.transpose[p];
                rhs[row] -= self.values[q] * value;
                self.values[q] = 0.0;
            }
        }
        for &(node, value) in constraints.nodes.iter() {
            for p in self.pattern.row(node) {
                self.values[p] = 0.0;
            }
            self.values[self.pattern.diagonal[node]] = 1.0;
            rhs[node] = value;
        }
    }
}
