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

use crate::border::{make_arena, refocus_border_margin};
use crate::convolve::convolve_op::{convolve_row_arena, convolve_row_clamped};
use crate::convolve::dispatch::for_each_row;
use crate::convolve::scan_point::{scan_kernel, ScanPoint2d};
use crate::image::{Sample, CHANNELS};
use crate::kernel::Kernel;
use crate::progress::{CancelFlag, ProgressReporter};
use crate::{EdgeMode, FilterError, FilterOptions, ImageSize, PixelBuffer, PixelStore};

/// Performs direct 2D convolution of every color channel, alpha is copied from the source.
///
/// The kernel is rescaled to unit sum before the pass, unless its sum is too close
/// to zero, see [Kernel::normalization_factor].
///
/// # Arguments
///
/// * `source`: Source image, never mutated.
/// * `destination`: Image of the same geometry, depth and alpha flag.
/// * `kernel`: Kernel, see [Kernel] for more info.
/// * `edge_mode`: Border handling mode see [EdgeMode] for more info.
/// * `options`: See [FilterOptions] for more info.
///
pub fn convolve_2d(
    source: &PixelBuffer,
    destination: &mut PixelBuffer,
    kernel: &Kernel,
    edge_mode: EdgeMode,
    options: FilterOptions,
) -> Result<(), FilterError> {
    let sink = |_: u8| {};
    let reporter = ProgressReporter::new(&sink, 0, 100, source.height as usize);
    convolve_2d_impl(
        source,
        destination,
        kernel,
        edge_mode,
        options,
        &CancelFlag::new(),
        &reporter,
    )
}

pub(crate) fn convolve_2d_impl(
    source: &PixelBuffer,
    destination: &mut PixelBuffer,
    kernel: &Kernel,
    edge_mode: EdgeMode,
    options: FilterOptions,
    cancel: &CancelFlag,
    reporter: &ProgressReporter,
) -> Result<(), FilterError> {
    source.check_layout()?;
    destination.check_layout()?;
    source.size_matches(destination)?;

    let normalized = kernel.normalized();
    let taps = scan_kernel(&normalized);
    let image_size = source.size();
    let thread_count = options
        .threading_policy
        .thread_count(source.width, source.height);

    match (&source.data, &mut destination.data) {
        (PixelStore::Eight(src), PixelStore::Eight(dst)) => convolve_store(
            src,
            dst,
            image_size,
            &taps,
            kernel.half_width(),
            edge_mode,
            thread_count,
            cancel,
            reporter,
        ),
        (PixelStore::Sixteen(src), PixelStore::Sixteen(dst)) => convolve_store(
            src,
            dst,
            image_size,
            &taps,
            kernel.half_width(),
            edge_mode,
            thread_count,
            cancel,
            reporter,
        ),
        _ => Err(FilterError::ImagesMustMatch),
    }
}

fn convolve_store<T: Sample>(
    src: &[T],
    dst: &mut [T],
    image_size: ImageSize,
    taps: &[ScanPoint2d],
    half_width: usize,
    edge_mode: EdgeMode,
    thread_count: usize,
    cancel: &CancelFlag,
    reporter: &ProgressReporter,
) -> Result<(), FilterError> {
    let row_stride = image_size.width * CHANNELS;
    match edge_mode {
        EdgeMode::Clamp => for_each_row(dst, row_stride, thread_count, cancel, reporter, |y, row| {
            convolve_row_clamped(src, image_size, row, y, taps, cancel)
        }),
        EdgeMode::Reflect => {
            let pad = refocus_border_margin().max(half_width);
            let (arena_source, arena) = make_arena(src, image_size, pad)?;
            let arena_slice = arena_source.as_slice();
            for_each_row(dst, row_stride, thread_count, cancel, reporter, |y, row| {
                convolve_row_arena(arena_slice, arena, row, y, taps, cancel)
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::BitDepth;
    use crate::kernel::build_gaussian_sharpen_kernel;
    use crate::ThreadingPolicy;
    use std::num::NonZeroUsize;

    fn noise_image(width: u32, height: u32, depth: BitDepth) -> PixelBuffer {
        let mut image = PixelBuffer::new(width, height, depth, true).unwrap();
        let max = depth.max_value() as u32;
        let mut state = 0x1234_5678u32;
        for y in 0..height {
            for x in 0..width {
                let mut px = [0u16; 4];
                for v in px.iter_mut() {
                    state ^= state << 13;
                    state ^= state >> 17;
                    state ^= state << 5;
                    *v = (state % (max + 1)) as u16;
                }
                image.set_pixel(x, y, px);
            }
        }
        image
    }

    #[test]
    fn test_identity_reproduces_source() {
        for depth in [BitDepth::Eight, BitDepth::Sixteen] {
            for edge_mode in [EdgeMode::Clamp, EdgeMode::Reflect] {
                let src = noise_image(17, 11, depth);
                let mut dst = src.duplicate_empty().unwrap();
                let kernel = Kernel::identity(3).unwrap();
                convolve_2d(&src, &mut dst, &kernel, edge_mode, FilterOptions::default())
                    .unwrap();
                assert_eq!(src, dst, "Identity changed image, {depth:?} {edge_mode:?}");
            }
        }
    }

    #[test]
    fn test_clamps_to_depth_range() {
        let mut src = PixelBuffer::new(5, 5, BitDepth::Eight, true).unwrap();
        src.fill([250, 250, 250, 255]);
        src.set_pixel(2, 2, [5, 5, 5, 255]);
        // sum is zero, so the weights are applied as is
        let mut weights = vec![0f64; 9];
        weights[4] = 10.;
        weights[1] = -10.;
        let kernel = Kernel::new(weights, 1).unwrap();
        let mut dst = src.duplicate_empty().unwrap();
        convolve_2d(&src, &mut dst, &kernel, EdgeMode::Clamp, FilterOptions::default()).unwrap();
        // flat area: 2500 - 2500 = 0
        assert_eq!(dst.pixel(0, 0), [0, 0, 0, 255]);
        // dark center below bright pixel: 50 - 2500
        assert_eq!(dst.pixel(2, 2), [0, 0, 0, 255]);
        // bright pixel below dark center: 2500 - 50
        assert_eq!(dst.pixel(2, 3), [255, 255, 255, 255]);
    }

    #[test]
    fn test_alpha_is_passed_through() {
        let src = noise_image(23, 19, BitDepth::Eight);
        let kernel = build_gaussian_sharpen_kernel(2., 1.4).unwrap();
        for edge_mode in [EdgeMode::Clamp, EdgeMode::Reflect] {
            let mut dst = src.duplicate_empty().unwrap();
            convolve_2d(&src, &mut dst, &kernel, edge_mode, FilterOptions::default()).unwrap();
            for y in 0..src.height {
                for x in 0..src.width {
                    assert_eq!(src.pixel(x, y)[3], dst.pixel(x, y)[3]);
                }
            }
        }
    }

    #[test]
    fn test_result_independent_of_threads() {
        let src = noise_image(64, 53, BitDepth::Sixteen);
        let kernel = build_gaussian_sharpen_kernel(0., 1.).unwrap();
        let mut single = src.duplicate_empty().unwrap();
        convolve_2d(
            &src,
            &mut single,
            &kernel,
            EdgeMode::Clamp,
            FilterOptions::new(ThreadingPolicy::Single),
        )
        .unwrap();
        let mut multi = src.duplicate_empty().unwrap();
        convolve_2d(
            &src,
            &mut multi,
            &kernel,
            EdgeMode::Clamp,
            FilterOptions::new(ThreadingPolicy::Fixed(NonZeroUsize::new(7).unwrap())),
        )
        .unwrap();
        assert_eq!(single, multi);
    }

    #[test]
    fn test_reflect_matches_mirrored_reads() {
        let src = noise_image(6, 4, BitDepth::Eight);
        let mut weights = vec![0f64; 9];
        weights[3] = 1.;
        let kernel = Kernel::new(weights, 1).unwrap();
        let mut dst = src.duplicate_empty().unwrap();
        convolve_2d(&src, &mut dst, &kernel, EdgeMode::Reflect, FilterOptions::default())
            .unwrap();
        for y in 0..src.height {
            let rgb = |p: [u16; 4]| [p[0], p[1], p[2]];
            assert_eq!(rgb(dst.pixel(0, y)), rgb(src.pixel(0, y)));
            assert_eq!(rgb(dst.pixel(3, y)), rgb(src.pixel(2, y)));
        }
    }

    #[test]
    fn test_rejects_mismatched_destination() {
        let src = noise_image(6, 4, BitDepth::Eight);
        let mut dst = PixelBuffer::new(6, 4, BitDepth::Sixteen, true).unwrap();
        let kernel = Kernel::identity(1).unwrap();
        assert_eq!(
            convolve_2d(&src, &mut dst, &kernel, EdgeMode::Clamp, FilterOptions::default()),
            Err(FilterError::ImagesMustMatch)
        );
    }
}
