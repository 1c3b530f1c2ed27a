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

#![no_main]

use libsharpen::{
    apply_filter, BitDepth, CancelFlag, FilterError, FilterOptions, FilterParameterSet,
    PixelBuffer, SimpleSharpParams, ThreadingPolicy,
};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: (u8, u8, u8, u8)| {
    let sigma = data.3 as f64 / 32.;
    fuzz_sharpen(
        data.0 as u32,
        data.1 as u32,
        data.2 as f64 / 25.5,
        sigma,
        BitDepth::Eight,
    );
    fuzz_sharpen(
        data.0 as u32,
        data.1 as u32,
        data.2 as f64 / 25.5,
        sigma,
        BitDepth::Sixteen,
    );
});

fn fuzz_sharpen(width: u32, height: u32, radius: f64, sigma: f64, depth: BitDepth) {
    if width == 0 || height == 0 {
        return;
    }
    let mut src = PixelBuffer::new(width, height, depth, true).unwrap();
    src.fill([15, 200, 90, 255]);
    let params = FilterParameterSet::SimpleSharp(SimpleSharpParams::new(radius, sigma));
    match apply_filter(
        &src,
        &params,
        FilterOptions::new(ThreadingPolicy::Single),
        &CancelFlag::new(),
        &|_| {},
    ) {
        Ok(dst) => {
            assert_eq!(dst.width, width);
            assert_eq!(dst.height, height);
        }
        Err(FilterError::ImageTooSmall(_)) => {}
        Err(e) => panic!("Unexpected error {e}"),
    }
}
