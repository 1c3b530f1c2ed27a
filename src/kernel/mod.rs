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

mod gaussian_kernel;
mod linear_solve;
mod refocus_matrix;

pub use gaussian_kernel::{
    build_gaussian_blur_kernel, build_gaussian_sharpen_kernel, get_optimal_kernel_width,
    MAX_KERNEL_WIDTH,
};
pub use refocus_matrix::{
    build_circle_convolution, build_gaussian_convolution, convolve_kernels, correlate_kernels,
    solve_deconvolution_kernel,
};

use crate::util::try_vec;
use crate::{FilterError, MismatchedSize};

/// Kernel sums with magnitude below this are treated as zero
pub const KERNEL_EPSILON: f64 = 1e-12;

/// Square convolution kernel with odd side `2 * half_width + 1`.
///
/// Weights are stored row by row, `(0, 0)` in centered coordinates is the middle cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    weights: Vec<f64>,
    half_width: usize,
}

impl Kernel {
    /// Wraps weights of a `(2 * half_width + 1)²` kernel
    pub fn new(weights: Vec<f64>, half_width: usize) -> Result<Kernel, FilterError> {
        let cells = Kernel::cell_count(half_width)?;
        if weights.len() != cells {
            return Err(FilterError::MinimumSliceSizeMismatch(MismatchedSize {
                expected: cells,
                received: weights.len(),
            }));
        }
        Ok(Kernel {
            weights,
            half_width,
        })
    }

    /// All zero kernel
    pub fn zeros(half_width: usize) -> Result<Kernel, FilterError> {
        Ok(Kernel {
            weights: try_vec(Kernel::cell_count(half_width)?, 0f64)?,
            half_width,
        })
    }

    /// Number of cells of a `(2 * half_width + 1)²` kernel, overflow reported as allocation failure
    fn cell_count(half_width: usize) -> Result<usize, FilterError> {
        half_width
            .checked_mul(2)
            .and_then(|x| x.checked_add(1))
            .and_then(|side| side.checked_mul(side))
            .ok_or(FilterError::AllocationFailure(usize::MAX))
    }

    /// Kernel which reproduces its input
    pub fn identity(half_width: usize) -> Result<Kernel, FilterError> {
        let mut kernel = Kernel::zeros(half_width)?;
        kernel.set(0, 0, 1.);
        Ok(kernel)
    }

    #[inline]
    pub fn half_width(&self) -> usize {
        self.half_width
    }

    #[inline]
    pub fn side(&self) -> usize {
        2 * self.half_width + 1
    }

    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    #[inline]
    fn offset(&self, x: i64, y: i64) -> usize {
        let h = self.half_width as i64;
        debug_assert!(x.abs() <= h && y.abs() <= h);
        ((y + h) as usize) * self.side() + (x + h) as usize
    }

    /// Weight at centered coordinates
    #[inline]
    pub fn at(&self, x: i64, y: i64) -> f64 {
        self.weights[self.offset(x, y)]
    }

    /// Weight at centered coordinates, zero outside of the kernel
    #[inline]
    pub fn at_or_zero(&self, x: i64, y: i64) -> f64 {
        let h = self.half_width as i64;
        if x.abs() > h || y.abs() > h {
            return 0.;
        }
        self.at(x, y)
    }

    #[inline]
    pub fn set(&mut self, x: i64, y: i64, value: f64) {
        let offset = self.offset(x, y);
        self.weights[offset] = value;
    }

    pub fn sum(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Returns `1 / sum`, or `1` when the sum is too close to zero to divide by
    pub fn normalization_factor(&self) -> f64 {
        let sum = self.sum();
        if sum.abs() <= KERNEL_EPSILON {
            1.
        } else {
            1. / sum
        }
    }

    /// Rescales weights to unit sum
    pub fn normalized(&self) -> Kernel {
        let scale = self.normalization_factor();
        Kernel {
            weights: self.weights.iter().map(|&w| w * scale).collect(),
            half_width: self.half_width,
        }
    }
}
