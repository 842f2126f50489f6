//! PCA projection of embeddings onto their two directions of largest variance.
//!
//! Embedding batches are usually short and wide (tens of texts, hundreds of
//! dimensions). The eigenproblem is solved on whichever of the Gram matrix
//! `XXᵀ` (`n x n`) or the scatter matrix `XᵀX` (`d x d`) is smaller, using
//! cyclic Jacobi rotations, so the axes are exact rather than depending on
//! where an iteration happens to start.

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use super::error::{LayoutError, LayoutResult};
use super::types::Point2D;

const NORM_EPS: f64 = 1e-12;

/// Eigensolver settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionOptions {
    /// Cap on Jacobi sweeps over the off-diagonal entries
    pub max_sweeps: usize,
    /// Stop once the off-diagonal mass falls below this fraction of the total
    pub tolerance: f64,
}

impl Default for ProjectionOptions {
    fn default() -> Self {
        Self {
            max_sweeps: 100,
            tolerance: 1e-12,
        }
    }
}

/// A fitted 2D PCA basis.
#[derive(Debug, Clone)]
pub struct Projection {
    mean: Array1<f64>,
    axes: [Array1<f64>; 2],
}

impl Projection {
    /// Fit the mean and the two principal axes of `vectors`.
    pub fn fit(vectors: &[Vec<f32>], options: &ProjectionOptions) -> LayoutResult<Self> {
        let data = to_matrix(vectors)?;
        let mean = data.mean_axis(Axis(0)).ok_or(LayoutError::EmptyInput)?;
        let centered = &data - &mean;

        let [first, second] = principal_axes(&centered, options);

        Ok(Self {
            mean,
            axes: [orient(first), orient(second)],
        })
    }

    /// Dimensionality the basis was fitted on.
    pub fn dimensions(&self) -> usize {
        self.mean.len()
    }

    /// Project `vectors` onto the fitted basis, preserving order.
    pub fn transform(&self, vectors: &[Vec<f32>]) -> LayoutResult<Vec<Point2D>> {
        let expected = self.dimensions();
        vectors
            .iter()
            .enumerate()
            .map(|(index, v)| {
                if v.len() != expected {
                    return Err(LayoutError::DimensionMismatch {
                        index,
                        expected,
                        found: v.len(),
                    });
                }
                let row = Array1::from_iter(v.iter().map(|&x| x as f64)) - &self.mean;
                let point = Point2D::new(row.dot(&self.axes[0]), row.dot(&self.axes[1]));
                if !point.is_finite() {
                    return Err(LayoutError::NonFinite(index));
                }
                Ok(point)
            })
            .collect()
    }
}

/// Reduce `vectors` to one 2D point each, in input order.
///
/// Fewer than two vectors cannot define principal axes; the `i`-th vector is
/// then placed at `(0, i)`.
pub fn project_to_2d(
    vectors: &[Vec<f32>],
    options: &ProjectionOptions,
) -> LayoutResult<Vec<Point2D>> {
    if vectors.is_empty() {
        return Err(LayoutError::EmptyInput);
    }
    if vectors.len() < 2 {
        to_matrix(vectors)?;
        return Ok(small_input_fallback(vectors.len()));
    }

    let projection = Projection::fit(vectors, options)?;
    let points = projection.transform(vectors)?;

    tracing::debug!(
        "Projected {} vectors of dimension {} to 2D",
        points.len(),
        projection.dimensions()
    );

    Ok(points)
}

/// Coordinates used when a PCA basis is undefined.
pub fn small_input_fallback(n: usize) -> Vec<Point2D> {
    (0..n).map(|i| Point2D::new(0.0, i as f64)).collect()
}

fn to_matrix(vectors: &[Vec<f32>]) -> LayoutResult<Array2<f64>> {
    let first = vectors.first().ok_or(LayoutError::EmptyInput)?;
    let dims = first.len();
    if dims == 0 {
        return Err(LayoutError::InvalidParameter {
            name: "vectors",
            message: "vectors must have at least one dimension",
        });
    }

    for (index, v) in vectors.iter().enumerate() {
        if v.len() != dims {
            return Err(LayoutError::DimensionMismatch {
                index,
                expected: dims,
                found: v.len(),
            });
        }
        if v.iter().any(|x| !x.is_finite()) {
            return Err(LayoutError::NonFinite(index));
        }
    }

    Ok(Array2::from_shape_fn((vectors.len(), dims), |(i, j)| {
        vectors[i][j] as f64
    }))
}

/// Unit axes of the two largest eigenvalues of `xᵀx`. An axis with no
/// variance along it is all zeros.
fn principal_axes(x: &Array2<f64>, options: &ProjectionOptions) -> [Array1<f64>; 2] {
    let (n, dims) = x.dim();
    let use_gram = n <= dims;

    let matrix = if use_gram { x.dot(&x.t()) } else { x.t().dot(x) };
    let trace = matrix.diag().sum();
    let (values, vectors) = symmetric_eigen(matrix, options);

    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]).then(a.cmp(&b)));

    let axis = |rank: usize| -> Array1<f64> {
        let Some(&k) = order.get(rank) else {
            return Array1::zeros(dims);
        };
        if values[k] <= NORM_EPS * (1.0 + trace) {
            return Array1::zeros(dims);
        }
        let u = vectors.column(k);
        if !use_gram {
            return u.to_owned();
        }
        // Right singular vector from the left one: v = Xᵀu / ‖Xᵀu‖.
        let v = x.t().dot(&u);
        let norm = v.dot(&v).sqrt();
        if norm <= NORM_EPS {
            Array1::zeros(dims)
        } else {
            v / norm
        }
    };

    [axis(0), axis(1)]
}

/// Eigenvalues and column eigenvectors of a symmetric matrix by cyclic
/// Jacobi rotations.
fn symmetric_eigen(mut a: Array2<f64>, options: &ProjectionOptions) -> (Array1<f64>, Array2<f64>) {
    let n = a.nrows();
    let mut v = Array2::<f64>::eye(n);
    let total: f64 = a.iter().map(|x| x * x).sum();

    for _ in 0..options.max_sweeps {
        let mut off = 0.0;
        for p in 0..n {
            for q in (p + 1)..n {
                off += 2.0 * a[[p, q]] * a[[p, q]];
            }
        }
        if off <= options.tolerance * options.tolerance * total {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[[p, q]];
                if apq == 0.0 {
                    continue;
                }

                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let sign = if theta >= 0.0 { 1.0 } else { -1.0 };
                let t = sign / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let (akp, akq) = (a[[k, p]], a[[k, q]]);
                    a[[k, p]] = c * akp - s * akq;
                    a[[k, q]] = s * akp + c * akq;
                }
                for k in 0..n {
                    let (apk, aqk) = (a[[p, k]], a[[q, k]]);
                    a[[p, k]] = c * apk - s * aqk;
                    a[[q, k]] = s * apk + c * aqk;
                }
                a[[p, q]] = 0.0;
                a[[q, p]] = 0.0;

                for k in 0..n {
                    let (vkp, vkq) = (v[[k, p]], v[[k, q]]);
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
    }

    (a.diag().to_owned(), v)
}

/// Flip `v` so its largest-magnitude loading is positive.
fn orient(v: Array1<f64>) -> Array1<f64> {
    let pivot = v
        .iter()
        .copied()
        .max_by(|a, b| a.abs().total_cmp(&b.abs()))
        .unwrap_or(0.0);
    if pivot < 0.0 {
        -v
    } else {
        v
    }
}
