use super::sparse::CsrMatrix;
use crate::error::FemError;
use crate::global_variables::*;

/// LU factors of a banded matrix, computed with partial pivoting.
///
/// Row `i` keeps columns `i - kl ..= i + kl + ku`: the extra `kl` columns hold
/// the fill produced by row interchanges. Multipliers stay where they were
/// computed, so the row permutation is replayed on the right-hand side.
#[derive(Debug, Clone)]
pub struct BandedLu {
    n: usize,
    kl: usize,
    ku: usize,
    width: usize,
    values: Vec<Float>,
    pivots: Vec<usize>,
}

impl BandedLu {
    pub fn factorize(matrix: &CsrMatrix, step: usize) -> Result<Self, FemError> {
        let n = matrix.n();
        let (kl, ku) = matrix.pattern().bandwidths();
        let width = 2 * kl + ku + 1;
        let mut lu = Self {
            n,
            kl,
            ku,
            width,
            values: vec![0.0; n * width],
            pivots: vec![0; n],
        };
        let mut scale: Float = 0.0;
        for row in 0..n {
            for p in matrix.pattern().row(row) {
                let col = matrix.pattern().col(p);
                let value = matrix.values()[p];
                scale = scale.max(value.abs());
                let index = lu.index(row, col);
                lu.values[index] = value;
            }
        }
        let threshold = SINGULAR_PIVOT_TOLERANCE * scale;

        for k in 0..n {
            let last_row = (k + kl).min(n - 1);
            let last_col = (k + kl + ku).min(n - 1);
            let mut pivot_row = k;
            let mut pivot = lu.values[lu.index(k, k)];
            for i in k + 1..=last_row {
                let candidate = lu.values[lu.index(i, k)];
                if candidate.abs() > pivot.abs() {
                    pivot_row = i;
                    pivot = candidate;
                }
            }
            if !pivot.is_finite() || pivot.abs() <= threshold {
                return Err(FemError::SingularSystem { step, pivot });
            }
            lu.pivots[k] = pivot_row;
            if pivot_row != k {
                for j in k..=last_col {
                    let a = lu.index(k, j);
                    let b = lu.index(pivot_row, j);
                    lu.values.swap(a, b);
                }
            }
            for i in k + 1..=last_row {
                let index = lu.index(i, k);
                let multiplier = lu.values[index] / pivot;
                lu.values[index] = multiplier;
                if multiplier == 0.0 {
                    continue;
                }
                for j in k + 1..=last_col {
                    let target = lu.index(i, j);
                    let source = lu.index(k, j);
                    lu.values[target] -= multiplier * lu.values[source];
                }
            }
        }
        Ok(lu)
    }

    pub fn solve(&self, rhs: &mut [Float]) {
        let n = self.n;
        for k in 0..n {
            let p = self.pivots[k];
            if p != k {
                rhs.swap(k, p);
            }
            let last_row = (k + self.kl).min(n - 1);
            for i in k + 1..=last_row {
                rhs[i] -= self.values[self.index(i, k)] * rhs[k];
            }
        }
        for k in (0..n).rev() {
            let last_col = (k + self.kl + self.ku).min(n - 1);
            let mut sum = rhs[k];
            for j in k + 1..=last_col {
                sum -= self.values[self.index(k, j)] * rhs[j];
            }
            rhs[k] = sum / self.values[self.index(k, k)];
        }
    }

    #[inline]
    fn index(&self, row: usize, col: usize) -> usize {
        row * self.width + col + self.kl - row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::q4::bc::Constraints;
    use crate::q4::mesh::Mesh;
    use crate::q4::sparse::SparsityPattern;
    use approx::assert_relative_eq;
    use std::sync::Arc;

    fn matrix(nx: usize, ny: usize) -> CsrMatrix {
        let mesh = Mesh::structured(1.0, 1.0, nx, ny, None).unwrap();
        let (pattern, _) = SparsityPattern::from_elements(mesh.number_of_nodes(), &mesh.elements);
        let mut matrix = CsrMatrix::zeros(Arc::new(pattern));
        let n = matrix.n();
        for row in 0..n {
            for p in matrix.pattern().row(row) {
                let col = matrix.pattern().col(p);
                // weak diagonal forces row interchanges
                matrix.values_mut()[p] = if row == col {
                    0.1
                } else {
                    1.0 + ((row * 31 + col * 17) % 11) as Float / 7.0
                };
            }
        }
        matrix
    }

    #[test]
    fn solves_nonsymmetric_system_with_pivoting() {
        let matrix = matrix(4, 3);
        let n = matrix.n();
        let expected: Vec<Float> = (0..n).map(|i| (i as Float).sin() + 2.0).collect();
        let mut rhs = vec![0.0; n];
        matrix.mul_vec(&expected, &mut rhs);
        let lu = BandedLu::factorize(&matrix, 0).unwrap();
        assert!(lu.pivots.iter().enumerate().any(|(k, &p)| p != k));
        lu.solve(&mut rhs);
        for (x, e) in rhs.iter().zip(expected.iter()) {
            assert_relative_eq!(*x, *e, max_relative = 1e-9);
        }
    }

    #[test]
    fn identity_rows_solve_exactly() {
        let mut matrix = matrix(3, 3);
        let mut rhs = vec![1.0; matrix.n()];
        let constraints = Constraints {
            nodes: vec![(5, 0.3), (6, 0.7)],
        };
        matrix.apply_dirichlet(&mut rhs, &constraints);
        let lu = BandedLu::factorize(&matrix, 0).unwrap();
        lu.solve(&mut rhs);
        assert_eq!(rhs[5], 0.3);
        assert_eq!(rhs[6], 0.7);
    }

    #[test]
    fn zero_row_is_singular() {
        let mut matrix = matrix(2, 2);
        let zero_row = matrix.pattern().row(4);
        for p in zero_row {
            matrix.values_mut()[p] = 0.0;
        }
        match BandedLu::factorize(&matrix, 12) {
            Err(FemError::SingularSystem { step, .. }) => assert_eq!(step, 12),
            other => panic!("expected a singular system, got {other:?}"),
        }
    }
}
