//! Gauss-Jordan row reduction with a replayable step log.

use crate::numeric::{Similar, Tolerance};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Elementary row operation. Rows are 0-based; Display is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RowStep {
    Swap(usize, usize),
    Scale(usize, f64),
    /// `target += factor * source`
    Combine {
        source: usize,
        factor: f64,
        target: usize,
    },
}

impl RowStep {
    pub fn apply(&self, matrix: &mut DMatrix<f64>) {
        match *self {
            RowStep::Swap(a, b) => matrix.swap_rows(a, b),
            RowStep::Scale(row, factor) => {
                for column in 0..matrix.ncols() {
                    matrix[(row, column)] *= factor;
                }
            }
            RowStep::Combine {
                source,
                factor,
                target,
            } => {
                for column in 0..matrix.ncols() {
                    let value = matrix[(source, column)];
                    matrix[(target, column)] += factor * value;
                }
            }
        }
    }
}

impl fmt::Display for RowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            RowStep::Swap(a, b) => write!(f, "Swap rows {} and {}", a + 1, b + 1),
            RowStep::Scale(row, factor) => write!(f, "Multiply row {} by {}", row + 1, factor),
            RowStep::Combine {
                source,
                factor,
                target,
            } => write!(
                f,
                "Row {} + {} * row {} -> row {}",
                target + 1,
                factor,
                source + 1,
                target + 1
            ),
        }
    }
}

fn negligible(value: f64) -> bool {
    value.similar(&0.0)
}

/// Apply `steps` in order
pub fn apply_steps(matrix: &mut DMatrix<f64>, steps: &[RowStep]) {
    for step in steps {
        step.apply(matrix);
    }
}

fn record(matrix: &mut DMatrix<f64>, steps: &mut Vec<RowStep>, step: RowStep) {
    tracing::trace!(%step, "row operation");
    step.apply(matrix);
    steps.push(step);
}

/// Column of the first non-negligible entry in `row`, if any
pub fn pivot_column(matrix: &DMatrix<f64>, row: usize) -> Option<usize> {
    (0..matrix.ncols()).find(|&column| !negligible(matrix[(row, column)]))
}

/// Every pivot is 1 and strictly right of the pivot above it; zero rows last.
pub fn is_weak_echelon(matrix: &DMatrix<f64>) -> bool {
    let mut previous: Option<usize> = None;
    let mut seen_zero_row = false;
    for row in 0..matrix.nrows() {
        match pivot_column(matrix, row) {
            None => seen_zero_row = true,
            Some(column) => {
                if seen_zero_row
                    || previous.is_some_and(|p| column <= p)
                    || !matrix[(row, column)].similar(&1.0)
                {
                    return false;
                }
                previous = Some(column);
            }
        }
    }
    true
}

/// Weak echelon form with every pivot column otherwise zero
pub fn is_strong_echelon(matrix: &DMatrix<f64>) -> bool {
    is_weak_echelon(matrix)
        && (0..matrix.nrows()).all(|row| match pivot_column(matrix, row) {
            Some(column) => (0..row).all(|above| negligible(matrix[(above, column)])),
            None => true,
        })
}

/// Reduce in place to weak echelon form, returning the steps taken.
///
/// The pivot for each column is the largest remaining entry in magnitude.
pub fn to_weak_echelon(matrix: &mut DMatrix<f64>) -> Vec<RowStep> {
    let mut steps = Vec::new();
    let mut pivot_row = 0;

    for column in 0..matrix.ncols() {
        if pivot_row >= matrix.nrows() {
            break;
        }

        let best = (pivot_row..matrix.nrows()).max_by(|&a, &b| {
            matrix[(a, column)]
                .abs()
                .total_cmp(&matrix[(b, column)].abs())
        });
        let Some(best) = best.filter(|&row| !negligible(matrix[(row, column)])) else {
            continue;
        };

        if best != pivot_row {
            record(matrix, &mut steps, RowStep::Swap(pivot_row, best));
        }

        let pivot = matrix[(pivot_row, column)];
        if !pivot.similar_within(&1.0, &Tolerance::default().with_relative(1e-12)) {
            record(matrix, &mut steps, RowStep::Scale(pivot_row, 1.0 / pivot));
        }

        for row in pivot_row + 1..matrix.nrows() {
            let value = matrix[(row, column)];
            if !negligible(value) {
                let step = RowStep::Combine {
                    source: pivot_row,
                    factor: -value,
                    target: row,
                };
                record(matrix, &mut steps, step);
            }
        }

        pivot_row += 1;
    }

    steps
}

/// Reduce in place to strong (reduced) echelon form, returning the steps
pub fn reduce_to_echelon(matrix: &mut DMatrix<f64>) -> Vec<RowStep> {
    let mut steps = to_weak_echelon(matrix);

    for row in (0..matrix.nrows()).rev() {
        let Some(column) = pivot_column(matrix, row) else {
            continue;
        };
        for above in 0..row {
            let value = matrix[(above, column)];
            if !negligible(value) {
                let step = RowStep::Combine {
                    source: row,
                    factor: -value,
                    target: above,
                };
                record(matrix, &mut steps, step);
            }
        }
    }

    tracing::debug!(
        rows = matrix.nrows(),
        columns = matrix.ncols(),
        steps = steps.len(),
        "reduced to echelon form"
    );
    steps
}

/// Inverse by replaying the reduction steps on the identity.
///
/// `None` for non-square or singular matrices.
pub fn invert(matrix: &DMatrix<f64>) -> Option<DMatrix<f64>> {
    if !matrix.is_square() {
        tracing::debug!(rows = matrix.nrows(), columns = matrix.ncols(), "cannot invert non-square matrix");
        return None;
    }

    let size = matrix.nrows();
    let mut reduced = matrix.clone();
    let steps = reduce_to_echelon(&mut reduced);

    if !reduced.similar(&DMatrix::identity(size, size)) {
        tracing::debug!(size, "matrix is singular");
        return None;
    }

    let mut inverse = DMatrix::identity(size, size);
    apply_steps(&mut inverse, &steps);
    Some(inverse)
}

impl Similar for DMatrix<f64> {
    fn similar_within(&self, other: &DMatrix<f64>, tolerance: &Tolerance) -> bool {
        self.shape() == other.shape()
            && self
                .iter()
                .zip(other.iter())
                .all(|(a, b)| tolerance.scalars_similar(*a, *b))
    }
}
