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

use crate::util::try_vec;
use crate::{FilterError, ImageSize, MismatchedSize};
use num_traits::AsPrimitive;
use std::fmt::Debug;

/// Interleaved channels per pixel, always B, G, R, A
pub const CHANNELS: usize = 4;

pub(crate) const BLUE: usize = 0;
pub(crate) const GREEN: usize = 1;
pub(crate) const RED: usize = 2;
pub(crate) const ALPHA: usize = 3;

#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
/// Bit depth of each channel sample
pub enum BitDepth {
    Eight,
    Sixteen,
}

impl BitDepth {
    #[inline]
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            BitDepth::Eight => 1,
            BitDepth::Sixteen => 2,
        }
    }

    #[inline]
    pub fn max_value(&self) -> u16 {
        match self {
            BitDepth::Eight => u8::MAX as u16,
            BitDepth::Sixteen => u16::MAX,
        }
    }
}

/// Storage sample type, implemented for `u8` and `u16`
pub trait Sample: Copy + Default + Debug + Send + Sync + AsPrimitive<f64> + 'static {
    /// Clamp ceiling for this depth
    const MAX_F: f64;

    /// Saturating truncating conversion
    fn from_f64(value: f64) -> Self;
}

macro_rules! impl_sample {
    ($store:ty) => {
        impl Sample for $store {
            const MAX_F: f64 = <$store>::MAX as f64;

            #[inline(always)]
            fn from_f64(value: f64) -> Self {
                value.as_()
            }
        }
    };
}

impl_sample!(u8);
impl_sample!(u16);

/// Rounds accumulated channel value to nearest and clamps it into `[0, T::MAX_F]`.
#[inline(always)]
pub(crate) fn clamp_round<T: Sample>(value: f64) -> T {
    let v = if value < 0. {
        0.
    } else if value > T::MAX_F {
        T::MAX_F
    } else {
        value + 0.5
    };
    T::from_f64(v)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PixelStore {
    Eight(Vec<u8>),
    Sixteen(Vec<u16>),
}

impl PixelStore {
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            PixelStore::Eight(v) => v.len(),
            PixelStore::Sixteen(v) => v.len(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Decoded image handed to the filters.
///
/// Samples are interleaved B, G, R, A; a buffer always holds four channels,
/// `has_alpha` only tells whether the alpha channel is meaningful.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub has_alpha: bool,
    pub data: PixelStore,
}

impl PixelBuffer {
    /// Allocates zeroed buffer for given depth
    pub fn new(
        width: u32,
        height: u32,
        depth: BitDepth,
        has_alpha: bool,
    ) -> Result<PixelBuffer, FilterError> {
        let len = Self::required_len(width, height)?;
        let data = match depth {
            BitDepth::Eight => PixelStore::Eight(try_vec(len, 0u8)?),
            BitDepth::Sixteen => PixelStore::Sixteen(try_vec(len, 0u16)?),
        };
        Ok(PixelBuffer {
            width,
            height,
            has_alpha,
            data,
        })
    }

    /// Wraps 8-bit BGRA samples
    pub fn from_u8(
        data: Vec<u8>,
        width: u32,
        height: u32,
        has_alpha: bool,
    ) -> Result<PixelBuffer, FilterError> {
        let buffer = PixelBuffer {
            width,
            height,
            has_alpha,
            data: PixelStore::Eight(data),
        };
        buffer.check_layout()?;
        Ok(buffer)
    }

    /// Wraps 16-bit BGRA samples
    pub fn from_u16(
        data: Vec<u16>,
        width: u32,
        height: u32,
        has_alpha: bool,
    ) -> Result<PixelBuffer, FilterError> {
        let buffer = PixelBuffer {
            width,
            height,
            has_alpha,
            data: PixelStore::Sixteen(data),
        };
        buffer.check_layout()?;
        Ok(buffer)
    }

    fn required_len(width: u32, height: u32) -> Result<usize, FilterError> {
        if width == 0 || height == 0 {
            return Err(FilterError::ZeroBaseSize);
        }
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|x| x.checked_mul(CHANNELS))
            .ok_or(FilterError::AllocationFailure(usize::MAX))
    }

    /// Checks that storage length equals `width * height * 4`
    pub fn check_layout(&self) -> Result<(), FilterError> {
        let expected = Self::required_len(self.width, self.height)?;
        if self.data.len() != expected {
            return Err(FilterError::MinimumSliceSizeMismatch(MismatchedSize {
                expected,
                received: self.data.len(),
            }));
        }
        Ok(())
    }

    #[inline]
    pub fn depth(&self) -> BitDepth {
        match self.data {
            PixelStore::Eight(_) => BitDepth::Eight,
            PixelStore::Sixteen(_) => BitDepth::Sixteen,
        }
    }

    #[inline]
    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.width as usize, self.height as usize)
    }

    #[inline]
    pub fn max_value(&self) -> u16 {
        self.depth().max_value()
    }

    /// Storage size in bytes
    #[inline]
    pub fn byte_len(&self) -> usize {
        self.data.len() * self.depth().bytes_per_sample()
    }

    /// Row stride in samples
    #[inline]
    pub fn row_stride(&self) -> usize {
        self.width as usize * CHANNELS
    }

    /// Allocates zeroed buffer with the same geometry, depth and alpha flag
    pub fn duplicate_empty(&self) -> Result<PixelBuffer, FilterError> {
        PixelBuffer::new(self.width, self.height, self.depth(), self.has_alpha)
    }

    /// Checks if it is matches the geometry of the other image
    #[inline]
    pub fn size_matches(&self, other: &PixelBuffer) -> Result<(), FilterError> {
        if self.width == other.width
            && self.height == other.height
            && self.depth() == other.depth()
            && self.has_alpha == other.has_alpha
        {
            return Ok(());
        }
        Err(FilterError::ImagesMustMatch)
    }

    /// Reads pixel as `[B, G, R, A]`, 8-bit samples are widened without scaling
    ///
    /// # Panics
    /// Panics if coordinates are out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> [u16; 4] {
        assert!(x < self.width && y < self.height, "Pixel out of bounds");
        let offset = y as usize * self.row_stride() + x as usize * CHANNELS;
        match &self.data {
            PixelStore::Eight(v) => {
                let px = &v[offset..offset + CHANNELS];
                [px[0] as u16, px[1] as u16, px[2] as u16, px[3] as u16]
            }
            PixelStore::Sixteen(v) => {
                let px = &v[offset..offset + CHANNELS];
                [px[0], px[1], px[2], px[3]]
            }
        }
    }

    /// Writes pixel as `[B, G, R, A]`, values are clamped to the buffer depth
    ///
    /// # Panics
    /// Panics if coordinates are out of bounds.
    pub fn set_pixel(&mut self, x: u32, y: u32, value: [u16; 4]) {
        assert!(x < self.width && y < self.height, "Pixel out of bounds");
        let offset = y as usize * self.row_stride() + x as usize * CHANNELS;
        match &mut self.data {
            PixelStore::Eight(v) => {
                for (dst, &src) in v[offset..offset + CHANNELS].iter_mut().zip(value.iter()) {
                    *dst = src.min(u8::MAX as u16) as u8;
                }
            }
            PixelStore::Sixteen(v) => {
                v[offset..offset + CHANNELS].copy_from_slice(&value);
            }
        }
    }

    /// Fills every pixel with the same value
    pub fn fill(&mut self, value: [u16; 4]) {
        match &mut self.data {
            PixelStore::Eight(v) => {
                for px in v.chunks_exact_mut(CHANNELS) {
                    for (dst, &src) in px.iter_mut().zip(value.iter()) {
                        *dst = src.min(u8::MAX as u16) as u8;
                    }
                }
            }
            PixelStore::Sixteen(v) => {
                for px in v.chunks_exact_mut(CHANNELS) {
                    px.copy_from_slice(&value);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_length_invariant() {
        let img = PixelBuffer::new(7, 3, BitDepth::Sixteen, true).unwrap();
        assert_eq!(img.data.len(), 7 * 3 * 4);
        assert_eq!(img.byte_len(), 7 * 3 * 4 * 2);
        let img = PixelBuffer::new(7, 3, BitDepth::Eight, false).unwrap();
        assert_eq!(img.byte_len(), 7 * 3 * 4);
    }

    #[test]
    fn test_rejects_malformed_storage() {
        let result = PixelBuffer::from_u8(vec![0u8; 10], 2, 2, false);
        assert_eq!(
            result,
            Err(FilterError::MinimumSliceSizeMismatch(MismatchedSize {
                expected: 16,
                received: 10
            }))
        );
        assert_eq!(
            PixelBuffer::new(0, 4, BitDepth::Eight, false),
            Err(FilterError::ZeroBaseSize)
        );
    }

    #[test]
    fn test_get_set_pixel() {
        let mut img = PixelBuffer::new(4, 4, BitDepth::Eight, true).unwrap();
        img.set_pixel(2, 3, [1, 2, 300, 4]);
        assert_eq!(img.pixel(2, 3), [1, 2, 255, 4]);
        let mut img = PixelBuffer::new(4, 4, BitDepth::Sixteen, true).unwrap();
        img.set_pixel(1, 0, [1000, 2000, 65535, 4]);
        assert_eq!(img.pixel(1, 0), [1000, 2000, 65535, 4]);
    }

    #[test]
    fn test_clamp_round() {
        assert_eq!(clamp_round::<u8>(-3.), 0);
        assert_eq!(clamp_round::<u8>(300.), 255);
        assert_eq!(clamp_round::<u8>(127.5), 128);
        assert_eq!(clamp_round::<u8>(127.49), 127);
        assert_eq!(clamp_round::<u16>(70000.), 65535);
    }
}
