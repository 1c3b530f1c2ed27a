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

#![allow(clippy::too_many_arguments)]
#![cfg_attr(docsrs, feature(doc_cfg))]
//! Threaded sharpen, unsharp mask and refocus filters.
//!
//! Every filter produces a new [PixelBuffer] from a source buffer and a
//! [FilterParameterSet]. Use [apply_filter] to run on the calling thread, or
//! [FilterTask] / [PreviewSession] to run in the background with progress
//! notifications and cooperative cancellation.

mod border;
mod convolve;
mod edge_mode;
mod image;
mod img_size;
mod kernel;
mod params;
mod progress;
mod session;
mod sharpen;
#[cfg(feature = "image")]
#[cfg_attr(docsrs, doc(cfg(feature = "image")))]
mod sharpen_image;
mod task;
mod threading_policy;
mod util;

pub use border::{crop_center, expand_mirrored, refocus_border_margin};
pub use convolve::convolve_2d;
pub use edge_mode::EdgeMode;
pub use crate::image::{BitDepth, PixelBuffer, PixelStore, Sample, CHANNELS};
pub use img_size::ImageSize;
pub use kernel::{
    build_circle_convolution, build_gaussian_blur_kernel, build_gaussian_convolution,
    build_gaussian_sharpen_kernel, convolve_kernels, correlate_kernels, get_optimal_kernel_width,
    solve_deconvolution_kernel, Kernel, KERNEL_EPSILON, MAX_KERNEL_WIDTH,
};
pub use params::{
    FilterAction, FilterParameterSet, ParamValue, RefocusParams, SimpleSharpParams,
    UnsharpMaskParams, FILTER_ACTION_VERSION, REFOCUS_IDENTIFIER, SIMPLE_SHARP_IDENTIFIER,
    UNSHARP_MASK_IDENTIFIER,
};
pub use progress::{CancelFlag, PROGRESS_STEP};
pub use session::PreviewSession;
pub use sharpen::{apply_filter, build_filter_kernel, check_image_size};
#[cfg(feature = "image")]
#[cfg_attr(docsrs, doc(cfg(feature = "image")))]
pub use sharpen_image::{pixel_buffer_from_image, pixel_buffer_to_image, sharpen_image};
pub use task::{FilterObserver, FilterTask, TaskState};
pub use threading_policy::{FilterOptions, ThreadingPolicy};
pub use util::{FilterError, InvalidParameter, MismatchedSize};

/// Largest refocus matrix size accepted by [RefocusParams]
pub const fn max_matrix_size() -> i32 {
    25
}
