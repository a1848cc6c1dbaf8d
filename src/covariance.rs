//! Noise covariance helpers.
//!
//! Everything the search strategies need from dense linear algebra lives here:
//! sorted symmetric eigen decompositions, closed-form 3x3 eigenvalues,
//! surface-aligned point covariances, the Mahalanobis factorisation
//! `inv(M) = N'N`, and the principal-axis frames used by oriented tree nodes.

use crate::errors::CovarianceError;
use crate::float_types::{PI, Real, tolerance};
use nalgebra::{
    IsometryMatrix3, Matrix2, Matrix3, Point3, Rotation3, Translation3, Vector3,
};

/// Eigenvalues sorted in descending order with the matching unit eigenvectors
/// stored as the columns of `vectors`. `vectors` is always a proper rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EigenDecomposition {
    pub values: Vector3<Real>,
    pub vectors: Matrix3<Real>,
}

/// Decompose a symmetric 3x3 matrix.
///
/// Ties between equal eigenvalues keep the lower column index first, so the
/// result only depends on the input matrix and never on sort instability.
/// The third eigenvector is negated if needed to make the basis right-handed.
pub fn eigen_decomposition(m: &Matrix3<Real>) -> EigenDecomposition {
    let eig = m.symmetric_eigen();

    let mut order = [0usize, 1, 2];
    order.sort_by(|&a, &b| {
        eig.eigenvalues[b]
            .partial_cmp(&eig.eigenvalues[a])
            .unwrap_or(core::cmp::Ordering::Equal)
    });

    let values = Vector3::new(
        eig.eigenvalues[order[0]],
        eig.eigenvalues[order[1]],
        eig.eigenvalues[order[2]],
    );
    let mut vectors = Matrix3::from_columns(&[
        eig.eigenvectors.column(order[0]).into_owned(),
        eig.eigenvectors.column(order[1]).into_owned(),
        eig.eigenvectors.column(order[2]).into_owned(),
    ]);
    if vectors.determinant() < 0.0 {
        let flipped = -vectors.column(2);
        vectors.set_column(2, &flipped);
    }

    EigenDecomposition { values, vectors }
}

/// Eigenvalues of a symmetric 3x3 matrix in descending order, computed with
/// the trigonometric closed form (O. K. Smith, 1961). No eigenvectors.
pub fn eigenvalues_closed_form(m: &Matrix3<Real>) -> Vector3<Real> {
    let p1 = m[(0, 1)].powi(2) + m[(0, 2)].powi(2) + m[(1, 2)].powi(2);
    if p1 <= Real::EPSILON * m.norm_squared() {
        // diagonal
        let mut d = [m[(0, 0)], m[(1, 1)], m[(2, 2)]];
        d.sort_by(|a, b| b.partial_cmp(a).unwrap_or(core::cmp::Ordering::Equal));
        return Vector3::new(d[0], d[1], d[2]);
    }

    let q = m.trace() / 3.0;
    let p2 = (m[(0, 0)] - q).powi(2) + (m[(1, 1)] - q).powi(2) + (m[(2, 2)] - q).powi(2)
        + 2.0 * p1;
    let p = (p2 / 6.0).sqrt();
    let b = (m - Matrix3::identity() * q) / p;
    let r = (b.determinant() / 2.0).clamp(-1.0, 1.0);
    let phi = r.acos() / 3.0;

    let e1 = q + 2.0 * p * phi.cos();
    let e3 = q + 2.0 * p * (phi + 2.0 * PI / 3.0).cos();
    let e2 = 3.0 * q - e1 - e3;
    Vector3::new(e1, e2, e3)
}

/// Covariance of a measurement taken on a surface with unit normal `normal`:
/// variance `normal_var` along the normal and `in_plane_var` in every
/// direction tangent to the surface.
pub fn point_covariance(
    normal: &Vector3<Real>,
    normal_var: Real,
    in_plane_var: Real,
) -> Matrix3<Real> {
    let n = normal.try_normalize(tolerance()).unwrap_or_else(Vector3::z);
    Matrix3::identity() * in_plane_var + (n * n.transpose()) * (normal_var - in_plane_var)
}

/// Embed a planar covariance in 3D as `diag(C, z_var)`.
pub fn lift_covariance_2d(c: &Matrix2<Real>, z_var: Real) -> Matrix3<Real> {
    Matrix3::new(
        c[(0, 0)], c[(0, 1)], 0.0,
        c[(1, 0)], c[(1, 1)], 0.0,
        0.0, 0.0, z_var,
    )
}

/// Check that `m` is a usable noise covariance: finite, symmetric and
/// strictly positive definite. Returns its eigen decomposition.
pub fn validate_covariance(m: &Matrix3<Real>) -> Result<EigenDecomposition, CovarianceError> {
    if m.iter().any(|v| !v.is_finite()) {
        return Err(CovarianceError::NonFinite);
    }
    let scale = m.amax().max(1.0);
    if (m - m.transpose()).amax() > tolerance() * scale {
        return Err(CovarianceError::NotSymmetric);
    }
    let eigen = eigen_decomposition(m);
    if eigen.values[2] <= tolerance() * scale {
        return Err(CovarianceError::NotPositiveDefinite {
            min_eigenvalue: eigen.values[2],
        });
    }
    Ok(eigen)
}

/// Check that `m` is a usable datum covariance: finite, symmetric and
/// positive semi-definite. Returns its eigenvalues in descending order.
pub fn validate_datum_covariance(m: &Matrix3<Real>) -> Result<Vector3<Real>, CovarianceError> {
    if m.iter().any(|v| !v.is_finite()) {
        return Err(CovarianceError::NonFinite);
    }
    let scale = m.amax().max(1.0);
    if (m - m.transpose()).amax() > tolerance() * scale {
        return Err(CovarianceError::NotSymmetric);
    }
    let values = eigenvalues_closed_form(m);
    if values[2] < -tolerance() * scale {
        return Err(CovarianceError::NotPositiveDefinite {
            min_eigenvalue: values[2],
        });
    }
    // clamp round-off below zero
    Ok(values.map(|v| v.max(0.0)))
}

/// Inverse of a positive definite covariance via its eigen decomposition.
pub fn covariance_inverse(m: &Matrix3<Real>) -> Result<Matrix3<Real>, CovarianceError> {
    let eigen = validate_covariance(m)?;
    let inv_values = Matrix3::from_diagonal(&eigen.values.map(|v| 1.0 / v));
    Ok(eigen.vectors * inv_values * eigen.vectors.transpose())
}

/// Factorisation of a positive definite covariance `M = V S V'` into
/// `N = S^-1/2 V'` and `N^-1 = V S^1/2`, so that `inv(M) = N'N` and the
/// Mahalanobis norm of `v` is the Euclidean norm of `N v`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MahalanobisFactors {
    pub n: Matrix3<Real>,
    pub n_inv: Matrix3<Real>,
    /// Eigenvalues of `M`, descending.
    pub eigenvalues: Vector3<Real>,
    /// Eigenvectors of `M` as columns.
    pub eigenvectors: Matrix3<Real>,
    /// `ln det M`
    pub log_det: Real,
}

impl MahalanobisFactors {
    /// Validate and factor a covariance.
    pub fn new(m: &Matrix3<Real>) -> Result<Self, CovarianceError> {
        let eigen = validate_covariance(m)?;
        Ok(Self::from_eigen(&eigen.values, &eigen.vectors))
    }

    /// Factor a covariance known to be positive definite, skipping validation.
    pub fn from_positive_definite(m: &Matrix3<Real>) -> Self {
        let eigen = eigen_decomposition(m);
        Self::from_eigen(&eigen.values, &eigen.vectors)
    }

    /// Build the factors from eigenvalues (descending, positive) and the
    /// matching eigenvectors.
    pub fn from_eigen(values: &Vector3<Real>, vectors: &Matrix3<Real>) -> Self {
        let inv_sqrt = values.map(|v| 1.0 / v.sqrt());
        let sqrt = values.map(|v| v.sqrt());
        let n = Matrix3::from_diagonal(&inv_sqrt) * vectors.transpose();
        let n_inv = vectors * Matrix3::from_diagonal(&sqrt);
        let log_det = values.iter().map(|v| v.ln()).sum::<Real>();
        Self {
            n,
            n_inv,
            eigenvalues: *values,
            eigenvectors: *vectors,
            log_det,
        }
    }

    /// `v' inv(M) v`
    #[inline]
    pub fn squared_norm(&self, v: &Vector3<Real>) -> Real {
        (self.n * v).norm_squared()
    }
}

/// Principal-axis frame of a point distribution with the given mean and
/// covariance. The returned isometry maps world coordinates into a frame
/// centred on `mean` whose x axis follows the eigenvector of the largest
/// eigenvalue. Falls back to the world axes if the decomposition is not finite.
pub fn principal_frame(cov: &Matrix3<Real>, mean: &Point3<Real>) -> IsometryMatrix3<Real> {
    let eigen = eigen_decomposition(cov);
    let axes = if eigen.vectors.iter().all(|v| v.is_finite()) {
        eigen.vectors
    } else {
        log::warn!("principal frame: eigen decomposition failed, using world axes");
        Matrix3::identity()
    };

    // rows of the world -> local rotation are the principal axes
    let rotation = Rotation3::from_matrix_unchecked(axes.transpose());
    let translation = Translation3::from(-(rotation * mean.coords));
    IsometryMatrix3::from_parts(translation, rotation)
}

/// Mean and covariance of a set of points.
pub fn mean_and_covariance<I>(points: I) -> (Point3<Real>, Matrix3<Real>)
where
    I: IntoIterator<Item = Point3<Real>> + Clone,
{
    let mut sum = Vector3::zeros();
    let mut count = 0usize;
    for p in points.clone() {
        sum += p.coords;
        count += 1;
    }
    if count == 0 {
        return (Point3::origin(), Matrix3::zeros());
    }
    let mean = sum / count as Real;

    let mut cov = Matrix3::zeros();
    for p in points {
        let d = p.coords - mean;
        cov += d * d.transpose();
    }
    (Point3::from(mean), cov / count as Real)
}
