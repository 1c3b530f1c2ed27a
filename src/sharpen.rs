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

use crate::convolve::convolve_2d_impl;
use crate::convolve::dispatch::for_each_row;
use crate::image::{clamp_round, Sample, ALPHA, BLUE, CHANNELS, GREEN, RED};
use crate::kernel::{
    build_circle_convolution, build_gaussian_blur_kernel, build_gaussian_convolution,
    build_gaussian_sharpen_kernel, convolve_kernels, solve_deconvolution_kernel, Kernel,
};
use crate::params::{RefocusParams, SimpleSharpParams, UnsharpMaskParams};
use crate::progress::{CancelFlag, ProgressReporter};
use crate::{
    EdgeMode, FilterError, FilterOptions, FilterParameterSet, MismatchedSize, PixelBuffer,
    PixelStore,
};
use num_traits::AsPrimitive;

/// Share of the unsharp mask progress taken by the blur pass
const UNSHARP_BLUR_PROGRESS: u8 = 80;

/// Rejects images whose smallest dimension is below the kernel side
pub fn check_image_size(image: &PixelBuffer, kernel: &Kernel) -> Result<(), FilterError> {
    let smallest = image.width.min(image.height) as usize;
    if kernel.side() > smallest {
        log::warn!(
            "Image {}x{} is smaller than kernel width {}",
            image.width,
            image.height,
            kernel.side()
        );
        return Err(FilterError::ImageTooSmall(MismatchedSize {
            expected: kernel.side(),
            received: smallest,
        }));
    }
    Ok(())
}

/// Builds the kernel a filter convolves with, parameters must be validated
pub fn build_filter_kernel(params: &FilterParameterSet) -> Result<Kernel, FilterError> {
    match params {
        FilterParameterSet::SimpleSharp(p) => {
            if p.sigma <= 0. {
                return Kernel::identity(0);
            }
            build_gaussian_sharpen_kernel(p.radius, p.sigma)
        }
        FilterParameterSet::UnsharpMask(p) => build_gaussian_blur_kernel(p.radius),
        FilterParameterSet::Refocus(p) => build_refocus_kernel(p),
    }
}

fn build_refocus_kernel(params: &RefocusParams) -> Result<Kernel, FilterError> {
    let ms = params.matrix_size;
    let circle = build_circle_convolution(params.radius, ms)?;
    let gaussian = build_gaussian_convolution(params.gauss, ms)?;
    let point_spread = convolve_kernels(&gaussian, &circle, ms as usize)?;
    let kernel =
        solve_deconvolution_kernel(&point_spread, ms, params.correlation, params.noise)?;
    log::debug!(
        "Refocus kernel width {}, radius {}, gauss {}",
        kernel.side(),
        params.radius,
        params.gauss
    );
    Ok(kernel)
}

/// Validates everything that can be checked before any pixel work starts
pub(crate) fn prepare(
    source: &PixelBuffer,
    params: &FilterParameterSet,
) -> Result<Kernel, FilterError> {
    source.check_layout()?;
    params.validate()?;
    let kernel = build_filter_kernel(params)?;
    check_image_size(source, &kernel)?;
    Ok(kernel)
}

/// Runs one filter to completion on the calling thread and its worker pool.
///
/// Returns a new buffer of the source geometry, the source is never mutated.
/// `progress` receives non decreasing percentages on multiples of five,
/// nothing is returned but [FilterError::Cancelled] once `cancel` was raised.
///
/// # Arguments
///
/// * `source`: Image to filter.
/// * `params`: Filter and its parameters, see [FilterParameterSet].
/// * `options`: See [FilterOptions] for more info.
/// * `cancel`: Cooperative cancellation flag polled by every worker.
/// * `progress`: Progress sink.
///
pub fn apply_filter(
    source: &PixelBuffer,
    params: &FilterParameterSet,
    options: FilterOptions,
    cancel: &CancelFlag,
    progress: &(dyn Fn(u8) + Sync),
) -> Result<PixelBuffer, FilterError> {
    let kernel = prepare(source, params)?;
    apply_prepared(source, params, &kernel, options, cancel, progress)
}

pub(crate) fn apply_prepared(
    source: &PixelBuffer,
    params: &FilterParameterSet,
    kernel: &Kernel,
    options: FilterOptions,
    cancel: &CancelFlag,
    progress: &(dyn Fn(u8) + Sync),
) -> Result<PixelBuffer, FilterError> {
    if cancel.is_cancelled() {
        return Err(FilterError::Cancelled);
    }
    let height = source.height as usize;
    match params {
        FilterParameterSet::SimpleSharp(p) => {
            simple_sharp(source, p, kernel, options, cancel, progress)
        }
        FilterParameterSet::UnsharpMask(p) => {
            let blur_reporter = ProgressReporter::new(progress, 0, UNSHARP_BLUR_PROGRESS, height);
            let mut blurred = source.duplicate_empty()?;
            convolve_2d_impl(
                source,
                &mut blurred,
                kernel,
                EdgeMode::Clamp,
                options,
                cancel,
                &blur_reporter,
            )?;
            let merge_reporter =
                ProgressReporter::new(progress, UNSHARP_BLUR_PROGRESS, 100, height);
            unsharp_merge(source, &blurred, p, options, cancel, &merge_reporter)
        }
        FilterParameterSet::Refocus(_) => {
            let reporter = ProgressReporter::new(progress, 0, 100, height);
            let mut destination = source.duplicate_empty()?;
            convolve_2d_impl(
                source,
                &mut destination,
                kernel,
                EdgeMode::Reflect,
                options,
                cancel,
                &reporter,
            )?;
            Ok(destination)
        }
    }
}

fn simple_sharp(
    source: &PixelBuffer,
    params: &SimpleSharpParams,
    kernel: &Kernel,
    options: FilterOptions,
    cancel: &CancelFlag,
    progress: &(dyn Fn(u8) + Sync),
) -> Result<PixelBuffer, FilterError> {
    let reporter = ProgressReporter::new(progress, 0, 100, source.height as usize);
    if params.sigma <= 0. {
        reporter.finish();
        return Ok(source.clone());
    }
    let mut destination = source.duplicate_empty()?;
    convolve_2d_impl(
        source,
        &mut destination,
        kernel,
        EdgeMode::Clamp,
        options,
        cancel,
        &reporter,
    )?;
    Ok(destination)
}

#[inline(always)]
fn luma(b: f64, g: f64, r: f64) -> f64 {
    0.299 * r + 0.587 * g + 0.114 * b
}

/// Sharpens one row as `src + amount * (src - blur)` where the difference exceeds
/// the threshold
fn unsharp_row<T: Sample>(
    src: &[T],
    blur: &[T],
    dst: &mut [T],
    params: &UnsharpMaskParams,
    cancel: &CancelFlag,
) -> bool {
    let quantum = params.threshold * T::MAX_F;
    let amount = params.amount;
    for ((src, blur), dst) in src
        .chunks_exact(CHANNELS)
        .zip(blur.chunks_exact(CHANNELS))
        .zip(dst.chunks_exact_mut(CHANNELS))
    {
        if cancel.is_cancelled() {
            return false;
        }
        dst[ALPHA] = src[ALPHA];
        if params.luma_only {
            let src_luma = luma(src[BLUE].as_(), src[GREEN].as_(), src[RED].as_());
            let blur_luma = luma(blur[BLUE].as_(), blur[GREEN].as_(), blur[RED].as_());
            let diff = src_luma - blur_luma;
            for c in [BLUE, GREEN, RED] {
                dst[c] = if (2. * diff).abs() < quantum {
                    src[c]
                } else {
                    let v: f64 = src[c].as_();
                    clamp_round(v + amount * diff)
                };
            }
        } else {
            for c in [BLUE, GREEN, RED] {
                let v: f64 = src[c].as_();
                let b: f64 = blur[c].as_();
                let diff = v - b;
                dst[c] = if (2. * diff).abs() < quantum {
                    src[c]
                } else {
                    clamp_round(v + amount * diff)
                };
            }
        }
    }
    true
}

fn unsharp_merge(
    source: &PixelBuffer,
    blurred: &PixelBuffer,
    params: &UnsharpMaskParams,
    options: FilterOptions,
    cancel: &CancelFlag,
    reporter: &ProgressReporter,
) -> Result<PixelBuffer, FilterError> {
    source.size_matches(blurred)?;
    let mut destination = source.duplicate_empty()?;
    let row_stride = source.row_stride();
    let thread_count = options
        .threading_policy
        .thread_count(source.width, source.height);
    match (&source.data, &blurred.data, &mut destination.data) {
        (PixelStore::Eight(src), PixelStore::Eight(blur), PixelStore::Eight(dst)) => {
            for_each_row(dst, row_stride, thread_count, cancel, reporter, |y, row| {
                let range = y * row_stride..(y + 1) * row_stride;
                unsharp_row(&src[range.clone()], &blur[range], row, params, cancel)
            })?
        }
        (PixelStore::Sixteen(src), PixelStore::Sixteen(blur), PixelStore::Sixteen(dst)) => {
            for_each_row(dst, row_stride, thread_count, cancel, reporter, |y, row| {
                let range = y * row_stride..(y + 1) * row_stride;
                unsharp_row(&src[range.clone()], &blur[range], row, params, cancel)
            })?
        }
        _ => return Err(FilterError::ImagesMustMatch),
    }
    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::BitDepth;
    use crate::ThreadingPolicy;
    use std::sync::Mutex;

    fn flat(width: u32, height: u32, value: [u16; 4]) -> PixelBuffer {
        let mut image = PixelBuffer::new(width, height, BitDepth::Eight, true).unwrap();
        image.fill(value);
        image
    }

    fn step_edge(width: u32, height: u32, depth: BitDepth) -> PixelBuffer {
        let mut image = PixelBuffer::new(width, height, depth, true).unwrap();
        let high = depth.max_value() / 4 * 3;
        let low = depth.max_value() / 4;
        for y in 0..height {
            for x in 0..width {
                let v = if x < width / 2 { low } else { high };
                image.set_pixel(x, y, [v, v, v, (x * 3 + y) as u16 % 256]);
            }
        }
        image
    }

    fn run(source: &PixelBuffer, params: FilterParameterSet) -> Result<PixelBuffer, FilterError> {
        apply_filter(
            source,
            &params,
            FilterOptions::default(),
            &CancelFlag::new(),
            &|_| {},
        )
    }

    #[test]
    fn test_flat_gray_is_unchanged_by_sharpen() {
        let source = flat(10, 10, [128, 128, 128, 255]);
        let result = run(
            &source,
            FilterParameterSet::SimpleSharp(SimpleSharpParams::new(0., 1.)),
        )
        .unwrap();
        for y in 0..10 {
            for x in 0..10 {
                assert_eq!(result.pixel(x, y), [128, 128, 128, 255], "At {x}, {y}");
            }
        }
    }

    #[test]
    fn test_sharpen_increases_edge_contrast() {
        let source = step_edge(32, 16, BitDepth::Sixteen);
        let result = run(
            &source,
            FilterParameterSet::SimpleSharp(SimpleSharpParams::from_radius(2.)),
        )
        .unwrap();
        let low = source.pixel(15, 8)[0];
        let high = source.pixel(16, 8)[0];
        assert!(result.pixel(15, 8)[0] < low);
        assert!(result.pixel(16, 8)[0] > high);
        assert_eq!(result.pixel(2, 8)[0], low);
        for y in 0..16 {
            for x in 0..32 {
                assert_eq!(result.pixel(x, y)[3], source.pixel(x, y)[3]);
            }
        }
    }

    #[test]
    fn test_zero_sigma_is_exact_copy() {
        let source = step_edge(12, 12, BitDepth::Eight);
        let result = run(
            &source,
            FilterParameterSet::SimpleSharp(SimpleSharpParams::default()),
        )
        .unwrap();
        assert_eq!(result, source);
    }

    #[test]
    fn test_unsharp_threshold_keeps_flat_areas() {
        let source = step_edge(40, 20, BitDepth::Eight);
        let result = run(
            &source,
            FilterParameterSet::UnsharpMask(UnsharpMaskParams::new(1.5, 1., 0.05, false)),
        )
        .unwrap();
        assert_eq!(result.pixel(3, 10), source.pixel(3, 10));
        assert_eq!(result.pixel(36, 10), source.pixel(36, 10));
        assert!(result.pixel(19, 10)[2] < source.pixel(19, 10)[2]);
        assert!(result.pixel(20, 10)[2] > source.pixel(20, 10)[2]);
        assert_eq!(result.pixel(19, 10)[3], source.pixel(19, 10)[3]);
    }

    #[test]
    fn test_unsharp_luma_only_keeps_gray_gray() {
        let source = step_edge(40, 20, BitDepth::Sixteen);
        let result = run(
            &source,
            FilterParameterSet::UnsharpMask(UnsharpMaskParams::new(2., 0.8, 0., true)),
        )
        .unwrap();
        for x in 0..40 {
            let px = result.pixel(x, 10);
            assert_eq!(px[0], px[1]);
            assert_eq!(px[1], px[2]);
        }
        assert!(result.pixel(20, 10)[1] > source.pixel(20, 10)[1]);
    }

    #[test]
    fn test_refocus_keeps_geometry_and_flat_field() {
        let source = flat(40, 30, [90, 140, 200, 77]);
        let result = run(
            &source,
            FilterParameterSet::Refocus(RefocusParams::default()),
        )
        .unwrap();
        assert_eq!(result.width, 40);
        assert_eq!(result.height, 30);
        for y in 0..30 {
            for x in 0..40 {
                let px = result.pixel(x, y);
                assert!(px[0].abs_diff(90) <= 1, "{px:?}");
                assert!(px[1].abs_diff(140) <= 1, "{px:?}");
                assert!(px[2].abs_diff(200) <= 1, "{px:?}");
                assert_eq!(px[3], 77);
            }
        }
    }

    #[test]
    fn test_refocus_sharpens_edge() {
        let source = step_edge(48, 24, BitDepth::Eight);
        let result = run(
            &source,
            FilterParameterSet::Refocus(RefocusParams::new(5, 1.5, 0., 0.5, 0.01)),
        )
        .unwrap();
        assert!(result.pixel(23, 12)[0] < source.pixel(23, 12)[0]);
        assert!(result.pixel(24, 12)[0] > source.pixel(24, 12)[0]);
    }

    #[test]
    fn test_too_small_image() {
        let source = flat(4, 40, [1, 2, 3, 4]);
        let result = run(
            &source,
            FilterParameterSet::SimpleSharp(SimpleSharpParams::new(3., 1.)),
        );
        assert_eq!(
            result,
            Err(FilterError::ImageTooSmall(MismatchedSize {
                expected: 7,
                received: 4
            }))
        );
    }

    #[test]
    fn test_too_small_image_for_refocus() {
        let source = flat(8, 40, [1, 2, 3, 4]);
        let result = run(
            &source,
            FilterParameterSet::Refocus(RefocusParams::default()),
        );
        assert_eq!(
            result,
            Err(FilterError::ImageTooSmall(MismatchedSize {
                expected: 11,
                received: 8
            }))
        );
    }

    #[test]
    fn test_too_small_image_for_unsharp() {
        let source = flat(30, 6, [1, 2, 3, 4]);
        let result = run(
            &source,
            FilterParameterSet::UnsharpMask(UnsharpMaskParams::default()),
        );
        assert_eq!(
            result,
            Err(FilterError::ImageTooSmall(MismatchedSize {
                expected: 9,
                received: 6
            }))
        );
    }

    #[test]
    fn test_oversized_sharpen_is_rejected() {
        let source = flat(16, 16, [1, 2, 3, 4]);
        for params in [
            SimpleSharpParams::new(1e20, 1.),
            SimpleSharpParams::new(0., 1e5),
            SimpleSharpParams::new(f64::MAX, f64::MAX),
        ] {
            let result = run(&source, FilterParameterSet::SimpleSharp(params));
            assert!(
                matches!(result, Err(FilterError::InvalidParameter(_))),
                "{params:?} gave {result:?}"
            );
        }
    }

    #[test]
    fn test_progress_reaches_hundred() {
        let seen = Mutex::new(Vec::new());
        let source = step_edge(64, 64, BitDepth::Eight);
        apply_filter(
            &source,
            &FilterParameterSet::UnsharpMask(UnsharpMaskParams::default()),
            FilterOptions::new(ThreadingPolicy::Single),
            &CancelFlag::new(),
            &|p| seen.lock().unwrap().push(p),
        )
        .unwrap();
        let seen = seen.lock().unwrap().clone();
        assert!(seen.windows(2).all(|w| w[0] < w[1]), "{seen:?}");
        assert!(seen.contains(&80));
        assert_eq!(seen.last(), Some(&100));
    }

    #[test]
    fn test_cancelled_before_start() {
        let cancel = CancelFlag::new();
        cancel.cancel();
        let source = step_edge(16, 16, BitDepth::Eight);
        let result = apply_filter(
            &source,
            &FilterParameterSet::Refocus(RefocusParams::default()),
            FilterOptions::default(),
            &cancel,
            &|_| {},
        );
        assert_eq!(result, Err(FilterError::Cancelled));
    }
}
