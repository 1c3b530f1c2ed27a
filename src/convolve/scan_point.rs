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

/// Non zero kernel tap relative to the output pixel
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct ScanPoint2d {
    pub(crate) x: i64,
    pub(crate) y: i64,
    pub(crate) weight: f64,
}

impl ScanPoint2d {
    pub(crate) fn new(x: i64, y: i64, weight: f64) -> ScanPoint2d {
        ScanPoint2d { x, y, weight }
    }
}

/// Collects every non zero weight of an already normalized kernel
pub(crate) fn scan_kernel(kernel: &Kernel) -> Vec<ScanPoint2d> {
    let half = kernel.half_width() as i64;
    let side = kernel.side();
    let mut taps = vec![];
    for (y, row) in kernel.weights().chunks_exact(side).enumerate() {
        for (x, &weight) in row.iter().enumerate() {
            if weight != 0. {
                taps.push(ScanPoint2d::new(x as i64 - half, y as i64 - half, weight));
            }
        }
    }
    taps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_zero_taps() {
        let kernel = Kernel::new(vec![0., 1., 0., 2., 0., 3., 0., 0., 4.], 1).unwrap();
        let taps = scan_kernel(&kernel);
        assert_eq!(
            taps,
            vec![
                ScanPoint2d::new(0, -1, 1.),
                ScanPoint2d::new(-1, 0, 2.),
                ScanPoint2d::new(1, 0, 3.),
                ScanPoint2d::new(1, 1, 4.),
            ]
        );
    }
}
