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

#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Default, Hash)]
/// Declares how a convolution reads pixels outside of the image
pub enum EdgeMode {
    /// Kernel reads are clipped to an edge and edge pixel replicated across filter.
    /// Used by sharpen and unsharp mask.
    #[default]
    Clamp = 0,
    /// Image is expanded up front with rule `fedcba|abcdefgh|hgfedcb`, then the kernel
    /// reads the expanded copy without any bounds handling. Used by refocus.
    Reflect = 1,
}

#[inline]
pub(crate) fn reflect_index(i: isize, n: isize) -> usize {
    if (0..n).contains(&i) {
        return i as usize;
    }
    let period = 2 * n;
    let r = i.rem_euclid(period);
    if r < n {
        r as usize
    } else {
        (period - r - 1) as usize
    }
}

#[inline(always)]
pub(crate) fn clamp_index(i: i64, n: usize) -> usize {
    i.clamp(0, n as i64 - 1) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflect_index() {
        let n = 5isize;
        let mapped = (-5..10).map(|i| reflect_index(i, n)).collect::<Vec<_>>();
        assert_eq!(
            mapped,
            vec![4, 3, 2, 1, 0, 0, 1, 2, 3, 4, 4, 3, 2, 1, 0],
            "Reflect must mirror edge pixel inclusively"
        );
        assert_eq!(reflect_index(-1, 1), 0);
    }

    #[test]
    fn test_clamp_index() {
        assert_eq!(clamp_index(-4, 10), 0);
        assert_eq!(clamp_index(4, 10), 4);
        assert_eq!(clamp_index(14, 10), 9);
    }
}
