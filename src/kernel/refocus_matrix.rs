// Copyright (c) Radzivon Bartoshyk. All rights reserved.
//
// Redistribution and use in source and binary forms, with or without modification,
// are permitted provided that the following conditions are met:
//
// 1.  Redistributions of source code must retain the above copyright notice, this
// list of conditions and the following disclaimer.
//
// 2.  Redistributions in binary form must reproduce the above copyright notice,
// this list of conditions and the following disclaimer in the documentation
// and/or other materials provided with the distribution.
//
// 3.  Neither the name of the copyright holder nor the names of its
// contributors may be used to endorse or promote products derived from
// this software without specific prior written permission.
//
// THIS SOFTWARE IS PROVIDED BY THE COPYRIGHT HOLDERS AND CONTRIBUTORS "AS IS"
// AND ANY EXPRESS OR IMPLIED WARRANTIES, INCLUDING, BUT NOT LIMITED TO, THE
// IMPLIED WARRANTIES OF MERCHANTABILITY AND FITNESS FOR A PARTICULAR PURPOSE ARE
// DISCLAIMED. IN NO EVENT SHALL THE COPYRIGHT HOLDER OR CONTRIBUTORS BE LIABLE
// FOR ANY DIRECT, INDIRECT, INCIDENTAL, SPECIAL, EXEMPLARY, OR CONSEQUENTIAL
// DAMAGES (INCLUDING, BUT NOT LIMITED TO, PROCUREMENT OF SUBSTITUTE GOODS OR
// SERVICES; LOSS OF USE, DATA, OR PROFITS; OR BUSINESS INTERRUPTION) HOWEVER
// CAUSED AND ON ANY THEORY OF LIABILITY, WHETHER IN CONTRACT, STRICT LIABILITY,
// OR TORT (INCLUDING NEGLIGENCE OR OTHERWISE) ARISING IN ANY WAY OUT OF THE USE
// OF THIS SOFTWARE, EVEN IF ADVISED OF THE POSSIBILITY OF SUCH DAMAGE.

use crate::kernel::linear_solve::solve_system;
use crate::kernel::{Kernel, KERNEL_EPSILON};
use crate::util::try_vec;
use crate::{max_matrix_size, FilterError, InvalidParameter};

fn check_matrix_size(matrix_size: i32) -> Result<usize, FilterError> {
    if matrix_size < 1 || matrix_size > max_matrix_size() {
        return Err(InvalidParameter::MatrixSizeOutOfRange(matrix_size).into());
    }
    if matrix_size % 2 == 0 {
        return Err(InvalidParameter::EvenMatrixSize(matrix_size).into());
    }
    Ok(matrix_size as usize)
}

/// Area of the unit-height disc slice between the vertical axis and `x`
fn circle_integral(x: f64, radius: f64) -> f64 {
    if radius == 0. {
        return 0.;
    }
    let sin = x / radius;
    let sq_diff = radius * radius - x * x;
    // Mathematically redundant, numerically it is not
    if sq_diff < 0. || !(-1. ..=1.).contains(&sin) {
        if sin < 0. {
            -0.25 * radius * radius * std::f64::consts::PI
        } else {
            0.25 * radius * radius * std::f64::consts::PI
        }
    } else {
        0.5 * x * sq_diff.sqrt() + 0.5 * radius * radius * sin.asin()
    }
}

/// Fraction of a unit area disc of `radius` covered by pixel `(x, y)`
fn circle_intensity(x: i64, y: i64, radius: f64) -> f64 {
    if radius == 0. {
        return if x == 0 && y == 0 { 1. } else { 0. };
    }
    let r_sq = radius * radius;
    let mut xlo = x.abs() as f64 - 0.5;
    let xhi = x.abs() as f64 + 0.5;
    let mut ylo = y.abs() as f64 - 0.5;
    let yhi = y.abs() as f64 + 0.5;
    let mut symmetry_factor = 1.;
    if xlo < 0. {
        xlo = 0.;
        symmetry_factor *= 2.;
    }
    if ylo < 0. {
        ylo = 0.;
        symmetry_factor *= 2.;
    }
    let xc1 = if xlo * xlo + yhi * yhi > r_sq {
        xlo
    } else if xhi * xhi + yhi * yhi > r_sq {
        (r_sq - yhi * yhi).sqrt()
    } else {
        xhi
    };
    let xc2 = if xlo * xlo + ylo * ylo > r_sq {
        xlo
    } else if xhi * xhi + ylo * ylo > r_sq {
        (r_sq - ylo * ylo).sqrt()
    } else {
        xhi
    };
    ((yhi - ylo) * (xc1 - xlo) + circle_integral(xc2, radius)
        - circle_integral(xc1, radius)
        - (xc2 - xc1) * ylo)
        * symmetry_factor
        / (std::f64::consts::PI * r_sq)
}

/// Point spread function of a defocused lens: a uniform disc of `radius`.
///
/// Kernel half-width equals `matrix_size`.
pub fn build_circle_convolution(radius: f64, matrix_size: i32) -> Result<Kernel, FilterError> {
    let m = check_matrix_size(matrix_size)?;
    let mut kernel = Kernel::zeros(m)?;
    let h = m as i64;
    for y in -h..=h {
        for x in -h..=h {
            kernel.set(x, y, circle_intensity(x, y, radius));
        }
    }
    Ok(kernel)
}

/// Point spread function of a gaussian blur with `gauss` spread.
///
/// Zero spread gives a centered delta. Kernel half-width equals `matrix_size`.
pub fn build_gaussian_convolution(gauss: f64, matrix_size: i32) -> Result<Kernel, FilterError> {
    let m = check_matrix_size(matrix_size)?;
    let mut kernel = Kernel::zeros(m)?;
    let h = m as i64;
    if gauss * gauss < 1. / f32::MAX as f64 {
        kernel.set(0, 0, 1.);
        return Ok(kernel);
    }
    let a = 1. / (gauss * gauss);
    let a_pi = a / std::f64::consts::PI;
    for y in -h..=h {
        for x in -h..=h {
            kernel.set(x, y, a_pi * (-a * (x * x + y * y) as f64).exp());
        }
    }
    Ok(kernel)
}

/// Convolution `a ⊛ b` truncated to `half_width`
pub fn convolve_kernels(a: &Kernel, b: &Kernel, half_width: usize) -> Result<Kernel, FilterError> {
    let mut result = Kernel::zeros(half_width)?;
    let ra = a.half_width() as i64;
    let rb = b.half_width() as i64;
    let rr = half_width as i64;
    for yr in -rr..=rr {
        for xr in -rr..=rr {
            let ya_low = (-ra).max(yr - rb);
            let ya_high = ra.min(yr + rb);
            let xa_low = (-ra).max(xr - rb);
            let xa_high = ra.min(xr + rb);
            let mut val = 0f64;
            for ya in ya_low..=ya_high {
                for xa in xa_low..=xa_high {
                    val += a.at(xa, ya) * b.at(xr - xa, yr - ya);
                }
            }
            result.set(xr, yr, val);
        }
    }
    Ok(result)
}

/// Cross correlation `Σ a(p) * b(r + p)` truncated to `half_width`
pub fn correlate_kernels(a: &Kernel, b: &Kernel, half_width: usize) -> Result<Kernel, FilterError> {
    let mut result = Kernel::zeros(half_width)?;
    let ra = a.half_width() as i64;
    let rb = b.half_width() as i64;
    let rr = half_width as i64;
    for yr in -rr..=rr {
        for xr in -rr..=rr {
            let ya_low = (-ra).max(-rb - yr);
            let ya_high = ra.min(rb - yr);
            let xa_low = (-ra).max(-rb - xr);
            let xa_high = ra.min(rb - xr);
            let mut val = 0f64;
            for ya in ya_low..=ya_high {
                for xa in xa_low..=xa_high {
                    val += a.at(xa, ya) * b.at(xr + xa, yr + ya);
                }
            }
            result.set(xr, yr, val);
        }
    }
    Ok(result)
}

/// Index of `(x, y)` among the cells unique under 8-fold symmetry
#[inline]
fn symmetric_index(x: i64, y: i64) -> usize {
    let a = x.abs().max(y.abs()) as usize;
    let b = x.abs().min(y.abs()) as usize;
    a * (a + 1) / 2 + b
}

fn correlation_matrix(half_width: usize, correlation: f64) -> Result<Kernel, FilterError> {
    let mut kernel = Kernel::zeros(half_width)?;
    let h = half_width as i64;
    for y in -h..=h {
        for x in -h..=h {
            let distance = ((x * x + y * y) as f64).sqrt();
            kernel.set(x, y, correlation.powf(distance));
        }
    }
    Ok(kernel)
}

/// Solves the deconvolution kernel that best inverts `point_spread` under a noise model.
///
/// Signal is modelled with pixel correlation `correlation^distance`, `noise` is added
/// to the diagonal of the normal equations. The point spread function is assumed to be
/// symmetric in both axes and both diagonals, which shrinks the system to
/// `(m + 1)(m + 2) / 2` unknowns. Returned kernel has half-width `matrix_size` and unit sum.
pub fn solve_deconvolution_kernel(
    point_spread: &Kernel,
    matrix_size: i32,
    correlation: f64,
    noise: f64,
) -> Result<Kernel, FilterError> {
    let m = check_matrix_size(matrix_size)?;
    let h = m as i64;

    let corr = correlation_matrix(4 * m, correlation)?;
    let h_conv_ruv = convolve_kernels(point_spread, &corr, 3 * m)?;
    let autocorrelation = correlate_kernels(point_spread, &h_conv_ruv, 2 * m)?;

    let n = symmetric_index(h + 1, 0);
    let mut system = try_vec(n * n, 0f64)?;
    let mut rhs = try_vec(n, 0f64)?;
    let noise = noise.max(KERNEL_EPSILON);

    for yr in 0..=h {
        for xr in 0..=yr {
            let row = symmetric_index(xr, yr);
            rhs[row] = h_conv_ruv.at(xr, yr);
            for yc in -h..=h {
                for xc in -h..=h {
                    let col = symmetric_index(xc, yc);
                    system[row * n + col] += autocorrelation.at(xr - xc, yr - yc);
                    if xr == xc && yr == yc {
                        system[row * n + col] += noise;
                    }
                }
            }
        }
    }

    let Some(solution) = solve_system(&system, &rhs, n) else {
        log::warn!("Deconvolution kernel is not finite, noise {noise}, falling back to identity");
        return Kernel::identity(m);
    };

    let mut kernel = Kernel::zeros(m)?;
    for y in -h..=h {
        for x in -h..=h {
            kernel.set(x, y, solution[symmetric_index(x, y)]);
        }
    }

    let sum = kernel.sum();
    if sum.abs() <= KERNEL_EPSILON {
        return Ok(kernel);
    }
    Ok(kernel.normalized())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_even_or_large_size() {
        assert_eq!(
            build_circle_convolution(1., 6),
            Err(FilterError::InvalidParameter(
                InvalidParameter::EvenMatrixSize(6)
            ))
        );
        assert!(build_gaussian_convolution(0.3, 27).is_err());
        assert!(build_gaussian_convolution(0.3, 0).is_err());
    }

    #[test]
    fn test_circle_has_unit_mass() {
        for radius in [0.5, 1., 2.3, 4.] {
            let kernel = build_circle_convolution(radius, 7).unwrap();
            assert!(
                (kernel.sum() - 1.).abs() < 1e-6,
                "Disc of radius {radius} sums to {}",
                kernel.sum()
            );
            assert!((kernel.at(1, 2) - kernel.at(-2, 1)).abs() < 1e-12);
        }
        let delta = build_circle_convolution(0., 3).unwrap();
        assert_eq!(delta, Kernel::identity(3).unwrap());
    }

    #[test]
    fn test_gaussian_zero_is_delta() {
        let kernel = build_gaussian_convolution(0., 5).unwrap();
        assert_eq!(kernel, Kernel::identity(5).unwrap());
        let kernel = build_gaussian_convolution(0.8, 5).unwrap();
        assert!((kernel.sum() - 1.).abs() < 2e-2);
    }

    #[test]
    fn test_convolve_with_identity() {
        let circle = build_circle_convolution(1.5, 5).unwrap();
        let identity = Kernel::identity(5).unwrap();
        let result = convolve_kernels(&identity, &circle, 5).unwrap();
        for (a, b) in result.weights().iter().zip(circle.weights().iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_symmetric_index_covers_wedge() {
        let m = 4i64;
        let mut seen = vec![false; symmetric_index(m + 1, 0)];
        for y in 0..=m {
            for x in 0..=y {
                let idx = symmetric_index(x, y);
                assert!(!seen[idx]);
                seen[idx] = true;
            }
        }
        assert!(seen.iter().all(|&x| x));
        assert_eq!(symmetric_index(-3, 1), symmetric_index(1, 3));
    }

    #[test]
    fn test_identity_psf_gives_near_identity() {
        let psf = convolve_kernels(
            &build_gaussian_convolution(0., 3).unwrap(),
            &build_circle_convolution(0., 3).unwrap(),
            3,
        )
        .unwrap();
        let kernel = solve_deconvolution_kernel(&psf, 3, 0.5, 0.01).unwrap();
        assert!((kernel.sum() - 1.).abs() < 1e-9);
        assert!(
            kernel.at(0, 0) > 0.9,
            "Center weight {} should dominate",
            kernel.at(0, 0)
        );
    }

    #[test]
    fn test_blur_psf_gives_sharpening_kernel() {
        let psf = convolve_kernels(
            &build_gaussian_convolution(0., 5).unwrap(),
            &build_circle_convolution(1., 5).unwrap(),
            5,
        )
        .unwrap();
        let kernel = solve_deconvolution_kernel(&psf, 5, 0.5, 0.03).unwrap();
        assert!((kernel.sum() - 1.).abs() < 1e-9);
        assert!(kernel.at(0, 0) > 1., "Center must overshoot to sharpen");
        assert!(kernel.at(1, 0) < 0., "Neighbours must be negative");
    }

    #[test]
    fn test_zero_noise_does_not_crash() {
        let psf = build_circle_convolution(2.5, 3).unwrap();
        let kernel = solve_deconvolution_kernel(&psf, 3, 1., 0.).unwrap();
        assert!(kernel.weights().iter().all(|x| x.is_finite()));
    }
}
