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

use crate::edge_mode::reflect_index;
use crate::image::CHANNELS;
use crate::util::try_vec;
use crate::{max_matrix_size, FilterError, ImageSize, PixelBuffer, PixelStore};

/// Geometry of a padded source image
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Arena {
    pub width: usize,
    pub height: usize,
    pub pad: usize,
}

impl Arena {
    pub fn new(width: usize, height: usize, pad: usize) -> Arena {
        Arena { width, height, pad }
    }

    #[inline]
    pub fn stride(&self) -> usize {
        self.width * CHANNELS
    }
}

/// Margin added on every side before a refocus pass, twice the largest matrix size
#[inline]
pub const fn refocus_border_margin() -> usize {
    2 * max_matrix_size() as usize
}

/// Pads an image by `pad` pixels on each side, borders are mirror flips of the
/// adjacent strip, corners are flipped along both axes.
pub(crate) fn make_arena<T>(
    image: &[T],
    image_size: ImageSize,
    pad: usize,
) -> Result<(Vec<T>, Arena), FilterError>
where
    T: Default + Copy + Send + Sync + 'static,
{
    let width = image_size.width;
    let height = image_size.height;
    let new_width = width + 2 * pad;
    let new_height = height + 2 * pad;

    let old_stride = width * CHANNELS;
    let new_stride = new_width * CHANNELS;

    let mut padded_image = try_vec(new_stride * new_height, T::default())?;

    for (y, dst) in padded_image.chunks_exact_mut(new_stride).enumerate() {
        let src_y = reflect_index(y as isize - pad as isize, height as isize);
        let src_row = &image[src_y * old_stride..(src_y + 1) * old_stride];

        let (left, rest) = dst.split_at_mut(pad * CHANNELS);
        let (center, right) = rest.split_at_mut(old_stride);

        center.copy_from_slice(src_row);

        for (x, dst) in left.chunks_exact_mut(CHANNELS).enumerate() {
            let src_x = reflect_index(x as isize - pad as isize, width as isize);
            dst.copy_from_slice(&src_row[src_x * CHANNELS..(src_x + 1) * CHANNELS]);
        }
        for (x, dst) in right.chunks_exact_mut(CHANNELS).enumerate() {
            let src_x = reflect_index((width + x) as isize, width as isize);
            dst.copy_from_slice(&src_row[src_x * CHANNELS..(src_x + 1) * CHANNELS]);
        }
    }

    Ok((padded_image, Arena::new(new_width, new_height, pad)))
}

fn crop_center_impl<T: Copy>(
    padded: &[T],
    padded_width: usize,
    margin: usize,
    size: ImageSize,
) -> Vec<T> {
    let padded_stride = padded_width * CHANNELS;
    let mut cropped = Vec::with_capacity(size.pixels() * CHANNELS);
    for row in padded
        .chunks_exact(padded_stride)
        .skip(margin)
        .take(size.height)
    {
        cropped.extend_from_slice(&row[margin * CHANNELS..(margin + size.width) * CHANNELS]);
    }
    cropped
}

/// Produces an enlarged copy of the image with `margin` mirrored pixels on each side.
///
/// Output dimensions are `(width + 2 * margin, height + 2 * margin)`.
pub fn expand_mirrored(image: &PixelBuffer, margin: usize) -> Result<PixelBuffer, FilterError> {
    image.check_layout()?;
    let size = image.size();
    let data = match &image.data {
        PixelStore::Eight(v) => PixelStore::Eight(make_arena(v, size, margin)?.0),
        PixelStore::Sixteen(v) => PixelStore::Sixteen(make_arena(v, size, margin)?.0),
    };
    Ok(PixelBuffer {
        width: (size.width + 2 * margin) as u32,
        height: (size.height + 2 * margin) as u32,
        has_alpha: image.has_alpha,
        data,
    })
}

/// Extracts the central region left after removing `margin` pixels on each side.
pub fn crop_center(image: &PixelBuffer, margin: usize) -> Result<PixelBuffer, FilterError> {
    image.check_layout()?;
    let width = (image.width as usize).saturating_sub(2 * margin);
    let height = (image.height as usize).saturating_sub(2 * margin);
    if width == 0 || height == 0 {
        return Err(FilterError::ZeroBaseSize);
    }
    let size = ImageSize::new(width, height);
    let data = match &image.data {
        PixelStore::Eight(v) => {
            PixelStore::Eight(crop_center_impl(v, image.width as usize, margin, size))
        }
        PixelStore::Sixteen(v) => {
            PixelStore::Sixteen(crop_center_impl(v, image.width as usize, margin, size))
        }
    };
    Ok(PixelBuffer {
        width: width as u32,
        height: height as u32,
        has_alpha: image.has_alpha,
        data,
    })
}
