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

use crate::border::Arena;
use crate::convolve::scan_point::ScanPoint2d;
use crate::edge_mode::clamp_index;
use crate::image::{clamp_round, Sample, ALPHA, BLUE, CHANNELS, GREEN, RED};
use crate::progress::CancelFlag;
use crate::ImageSize;
use num_traits::AsPrimitive;

/// Convolves output row `y` reading the source through clamped coordinates.
///
/// Returns `false` when cancellation was observed before the row was finished.
pub(crate) fn convolve_row_clamped<T: Sample>(
    src: &[T],
    image_size: ImageSize,
    dst: &mut [T],
    y: usize,
    taps: &[ScanPoint2d],
    cancel: &CancelFlag,
) -> bool {
    let width = image_size.width;
    let height = image_size.height;
    let stride = width * CHANNELS;

    for (x, dst) in dst.chunks_exact_mut(CHANNELS).enumerate() {
        if cancel.is_cancelled() {
            return false;
        }
        let mut b = 0f64;
        let mut g = 0f64;
        let mut r = 0f64;
        for tap in taps.iter() {
            let sy = clamp_index(y as i64 + tap.y, height);
            let sx = clamp_index(x as i64 + tap.x, width);
            let px = &src[sy * stride + sx * CHANNELS..];
            let bv: f64 = px[BLUE].as_();
            let gv: f64 = px[GREEN].as_();
            let rv: f64 = px[RED].as_();
            b += bv * tap.weight;
            g += gv * tap.weight;
            r += rv * tap.weight;
        }
        dst[BLUE] = clamp_round(b);
        dst[GREEN] = clamp_round(g);
        dst[RED] = clamp_round(r);
        dst[ALPHA] = src[y * stride + x * CHANNELS + ALPHA];
    }
    true
}

/// Convolves output row `y` reading a mirror padded arena, no bounds handling.
///
/// The arena pad must be at least the kernel half-width.
pub(crate) fn convolve_row_arena<T: Sample>(
    arena_src: &[T],
    arena: Arena,
    dst: &mut [T],
    y: usize,
    taps: &[ScanPoint2d],
    cancel: &CancelFlag,
) -> bool {
    debug_assert!(y + 2 * arena.pad < arena.height);
    let stride = arena.stride();
    let cy = (y + arena.pad) as i64;
    let pad = arena.pad as i64;

    for (x, dst) in dst.chunks_exact_mut(CHANNELS).enumerate() {
        if cancel.is_cancelled() {
            return false;
        }
        let cx = x as i64 + pad;
        let mut b = 0f64;
        let mut g = 0f64;
        let mut r = 0f64;
        for tap in taps.iter() {
            let offset = (cy + tap.y) as usize * stride + (cx + tap.x) as usize * CHANNELS;
            let px = &arena_src[offset..offset + CHANNELS];
            let bv: f64 = px[BLUE].as_();
            let gv: f64 = px[GREEN].as_();
            let rv: f64 = px[RED].as_();
            b += bv * tap.weight;
            g += gv * tap.weight;
            r += rv * tap.weight;
        }
        dst[BLUE] = clamp_round(b);
        dst[GREEN] = clamp_round(g);
        dst[RED] = clamp_round(r);
        dst[ALPHA] = arena_src[cy as usize * stride + cx as usize * CHANNELS + ALPHA];
    }
    true
}
