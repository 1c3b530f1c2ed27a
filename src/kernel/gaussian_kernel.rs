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

use crate::kernel::Kernel;
use crate::{FilterError, InvalidParameter};

const SQ2PI: f64 = 2.506_628_274_631_000_5;

/// Widest kernel the width search may produce
pub const MAX_KERNEL_WIDTH: usize = 1025;

fn width_out_of_range(name: &'static str, value: f64) -> FilterError {
    log::warn!("Kernel for {name} {value} would exceed {MAX_KERNEL_WIDTH} taps");
    InvalidParameter::OutOfRange { name, value }.into()
}

/// Computes odd kernel width for the sharpen and blur kernels.
///
/// Positive `radius` gives `2 * ceil(radius) + 1`. Zero radius searches for the smallest
/// width whose gaussian edge tap still contributes at 16-bit precision, never less than 5.
/// Widths above [MAX_KERNEL_WIDTH] are rejected.
pub fn get_optimal_kernel_width(radius: f64, sigma: f64) -> Result<usize, FilterError> {
    if radius > 0. {
        let width = 2. * radius.ceil() + 1.;
        if !width.is_finite() || width > MAX_KERNEL_WIDTH as f64 {
            return Err(width_out_of_range("radius", radius));
        }
        return Ok(width as usize);
    }
    if !(sigma > 0.) || !sigma.is_finite() {
        return Ok(5);
    }
    let two_sigma_sq = 2. * sigma * sigma;
    let mut kernel_width = 5usize;
    loop {
        if kernel_width > MAX_KERNEL_WIDTH + 2 {
            return Err(width_out_of_range("sigma", sigma));
        }
        let half = (kernel_width / 2) as i64;
        let mut normalize = 0f64;
        for u in -half..=half {
            normalize += (-((u * u) as f64) / two_sigma_sq).exp() / (SQ2PI * sigma);
        }
        let value = (-((half * half) as f64) / two_sigma_sq).exp() / (SQ2PI * sigma) / normalize;
        if (65535. * value) as i64 <= 0 {
            break;
        }
        kernel_width += 2;
    }
    Ok((kernel_width - 2).max(5))
}

/// Builds the gaussian sharpen kernel.
///
/// Every tap holds `exp(-(u²+v²) / 2σ²) / 2πσ²`, then the center is overwritten by
/// `-2 * sum`. The result is not normalized here, the convolution normalizes it.
pub fn build_gaussian_sharpen_kernel(radius: f64, sigma: f64) -> Result<Kernel, FilterError> {
    let width = get_optimal_kernel_width(radius, sigma)?;
    let half = width / 2;
    let mut kernel = Kernel::zeros(half)?;
    let two_sigma_sq = 2. * sigma * sigma;
    let scale = 1. / (std::f64::consts::PI * two_sigma_sq);
    let h = half as i64;

    let mut sum = 0f64;
    for v in -h..=h {
        for u in -h..=h {
            let alpha = (-((u * u + v * v) as f64) / two_sigma_sq).exp();
            let weight = alpha * scale;
            kernel.set(u, v, weight);
            sum += weight;
        }
    }
    kernel.set(0, 0, -2. * sum);
    log::debug!("Sharpen kernel width {width}, radius {radius}, sigma {sigma}");
    Ok(kernel)
}

/// Builds a normalized gaussian blur kernel, width chosen by [get_optimal_kernel_width]
/// with zero radius. Non positive sigma gives a 1x1 identity.
pub fn build_gaussian_blur_kernel(sigma: f64) -> Result<Kernel, FilterError> {
    if !(sigma > 0.) {
        return Kernel::identity(0);
    }
    let width = get_optimal_kernel_width(0., sigma)?;
    let half = width / 2;
    let mut kernel = Kernel::zeros(half)?;
    let two_sigma_sq = 2. * sigma * sigma;
    let h = half as i64;
    for v in -h..=h {
        for u in -h..=h {
            kernel.set(u, v, (-((u * u + v * v) as f64) / two_sigma_sq).exp());
        }
    }
    log::debug!("Blur kernel width {width}, sigma {sigma}");
    Ok(kernel.normalized())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optimal_width_from_radius() {
        assert_eq!(get_optimal_kernel_width(1., 1.), Ok(3));
        assert_eq!(get_optimal_kernel_width(1.2, 1.), Ok(5));
        assert_eq!(get_optimal_kernel_width(4., 2.), Ok(9));
    }

    #[test]
    fn test_optimal_width_search_is_odd() {
        let mut sigma = 0.05;
        while sigma < 8. {
            let width = get_optimal_kernel_width(0., sigma).unwrap();
            assert_eq!(width % 2, 1, "Width {width} for sigma {sigma} is even");
            assert!(width >= 5, "Width {width} for sigma {sigma} is below 5");
            sigma += 0.15;
        }
        for radius in [0.1, 0.5, 1., 2.5, 7.] {
            let width = get_optimal_kernel_width(radius, 1.).unwrap();
            assert_eq!(width % 2, 1);
            assert_eq!(width, 2 * radius.ceil() as usize + 1);
        }
    }

    #[test]
    fn test_optimal_width_unit_sigma() {
        // tail at |u| = 5 decays below 1/65535
        assert_eq!(get_optimal_kernel_width(0., 1.), Ok(9));
    }

    #[test]
    fn test_oversized_kernels_are_rejected() {
        assert!(matches!(
            get_optimal_kernel_width(1e20, 1.),
            Err(FilterError::InvalidParameter(InvalidParameter::OutOfRange {
                name: "radius",
                ..
            }))
        ));
        assert!(matches!(
            get_optimal_kernel_width(0., 1e5),
            Err(FilterError::InvalidParameter(InvalidParameter::OutOfRange {
                name: "sigma",
                ..
            }))
        ));
        assert!(build_gaussian_sharpen_kernel(f64::MAX, 1.).is_err());
        assert!(build_gaussian_blur_kernel(1e9).is_err());
    }

    #[test]
    fn test_largest_unsharp_blur_fits() {
        let width = get_optimal_kernel_width(0., 120.).unwrap();
        assert!(width <= MAX_KERNEL_WIDTH, "Width {width} for sigma 120");
        assert!(width > 600, "Width {width} is too narrow for sigma 120");
    }

    #[test]
    fn test_sharpen_kernel_center() {
        let kernel = build_gaussian_sharpen_kernel(0., 1.).unwrap();
        assert_eq!(kernel.side(), 9);
        let center = kernel.at(0, 0);
        let others = kernel.sum() - center;
        assert!(center < 0.);
        // center was replaced by -2 * (others + original center)
        let original_center = 1. / (2. * std::f64::consts::PI);
        assert!((center + 2. * (others + original_center)).abs() < 1e-12);
    }

    #[test]
    fn test_blur_kernel_unit_sum() {
        let kernel = build_gaussian_blur_kernel(1.5).unwrap();
        assert!((kernel.sum() - 1.).abs() < 1e-9);
        assert!(kernel.at(0, 0) > kernel.at(1, 0));
        assert_eq!(build_gaussian_blur_kernel(0.).unwrap().side(), 1);
    }
}
