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

use crate::image::{ALPHA, BLUE, CHANNELS, GREEN, RED};
use crate::progress::CancelFlag;
use crate::sharpen::apply_filter;
use crate::{FilterError, FilterOptions, FilterParameterSet, PixelBuffer, PixelStore};
use image::{DynamicImage, ImageBuffer, Rgb, Rgba};

const RGBA_RED: usize = 0;
const RGBA_BLUE: usize = 2;

fn is_wide(image: &DynamicImage) -> bool {
    matches!(
        image,
        DynamicImage::ImageLuma16(_)
            | DynamicImage::ImageLumaA16(_)
            | DynamicImage::ImageRgb16(_)
            | DynamicImage::ImageRgba16(_)
            | DynamicImage::ImageRgb32F(_)
            | DynamicImage::ImageRgba32F(_)
    )
}

fn swizzle<T: Copy>(data: &mut [T]) {
    for px in data.chunks_exact_mut(CHANNELS) {
        px.swap(RGBA_RED, RGBA_BLUE);
    }
}

/// Converts any image into a BGRA buffer, 16-bit and float images become 16-bit buffers
pub fn pixel_buffer_from_image(image: &DynamicImage) -> Result<PixelBuffer, FilterError> {
    let has_alpha = image.color().has_alpha();
    if is_wide(image) {
        let rgba = image.to_rgba16();
        let (width, height) = rgba.dimensions();
        let mut data = rgba.into_raw();
        swizzle(&mut data);
        PixelBuffer::from_u16(data, width, height, has_alpha)
    } else {
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        let mut data = rgba.into_raw();
        swizzle(&mut data);
        PixelBuffer::from_u8(data, width, height, has_alpha)
    }
}

fn bgra_to_rgb<T: Copy>(data: &[T], has_alpha: bool) -> Vec<T> {
    let channels = if has_alpha { 4 } else { 3 };
    let mut out = Vec::with_capacity(data.len() / CHANNELS * channels);
    for px in data.chunks_exact(CHANNELS) {
        out.push(px[RED]);
        out.push(px[GREEN]);
        out.push(px[BLUE]);
        if has_alpha {
            out.push(px[ALPHA]);
        }
    }
    out
}

/// Converts a buffer back into an RGB or RGBA image of the buffer depth
pub fn pixel_buffer_to_image(buffer: &PixelBuffer) -> Result<DynamicImage, FilterError> {
    buffer.check_layout()?;
    let (width, height) = (buffer.width, buffer.height);
    let mismatch = || FilterError::ImagesMustMatch;
    let image = match (&buffer.data, buffer.has_alpha) {
        (PixelStore::Eight(v), true) => DynamicImage::ImageRgba8(
            ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(width, height, bgra_to_rgb(v, true))
                .ok_or_else(mismatch)?,
        ),
        (PixelStore::Eight(v), false) => DynamicImage::ImageRgb8(
            ImageBuffer::<Rgb<u8>, Vec<u8>>::from_raw(width, height, bgra_to_rgb(v, false))
                .ok_or_else(mismatch)?,
        ),
        (PixelStore::Sixteen(v), true) => DynamicImage::ImageRgba16(
            ImageBuffer::<Rgba<u16>, Vec<u16>>::from_raw(width, height, bgra_to_rgb(v, true))
                .ok_or_else(mismatch)?,
        ),
        (PixelStore::Sixteen(v), false) => DynamicImage::ImageRgb16(
            ImageBuffer::<Rgb<u16>, Vec<u16>>::from_raw(width, height, bgra_to_rgb(v, false))
                .ok_or_else(mismatch)?,
        ),
    };
    Ok(image)
}

/// Applies a filter to an image provided by the `image` crate
///
/// NOTE: Alpha is passed through unchanged.
///
/// # Arguments
///
/// * `image`: Dynamic image provided by image crate.
/// * `params`: See [FilterParameterSet] for more info.
/// * `options`: See [FilterOptions] for more info.
///
pub fn sharpen_image(
    image: DynamicImage,
    params: &FilterParameterSet,
    options: FilterOptions,
) -> Result<DynamicImage, FilterError> {
    let source = pixel_buffer_from_image(&image)?;
    let filtered = apply_filter(&source, params, options, &CancelFlag::new(), &|_| {})?;
    pixel_buffer_to_image(&filtered)
}
