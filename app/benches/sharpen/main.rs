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

use criterion::{criterion_group, criterion_main, Criterion};
use libsharpen::{
    apply_filter, BitDepth, CancelFlag, FilterOptions, FilterParameterSet, PixelBuffer,
    RefocusParams, SimpleSharpParams, ThreadingPolicy, UnsharpMaskParams,
};

fn synthetic(width: u32, height: u32, depth: BitDepth) -> PixelBuffer {
    let mut image = PixelBuffer::new(width, height, depth, true).unwrap();
    let max = depth.max_value() as u32;
    for y in 0..height {
        for x in 0..width {
            let v = ((x * 7 + y * 13) % (max + 1)) as u16;
            image.set_pixel(x, y, [v, (max as u16).wrapping_sub(v), v / 2, max as u16]);
        }
    }
    image
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut c = c.benchmark_group("Sharpen");
    c.sample_size(10);

    let img = synthetic(1024, 768, BitDepth::Eight);
    let img16 = synthetic(1024, 768, BitDepth::Sixteen);
    let options = FilterOptions::new(ThreadingPolicy::Adaptive);
    let cancel = CancelFlag::new();

    let sharpen = FilterParameterSet::SimpleSharp(SimpleSharpParams::from_radius(2.));
    c.bench_function("BGRA8 sharpen radius: 2", |b| {
        b.iter(|| apply_filter(&img, &sharpen, options, &cancel, &|_| {}).unwrap())
    });

    c.bench_function("BGRA16 sharpen radius: 2", |b| {
        b.iter(|| apply_filter(&img16, &sharpen, options, &cancel, &|_| {}).unwrap())
    });

    let unsharp = FilterParameterSet::UnsharpMask(UnsharpMaskParams::default());
    c.bench_function("BGRA8 unsharp mask radius: 1", |b| {
        b.iter(|| apply_filter(&img, &unsharp, options, &cancel, &|_| {}).unwrap())
    });

    let refocus = FilterParameterSet::Refocus(RefocusParams::default());
    c.bench_function("BGRA8 refocus matrix: 5", |b| {
        b.iter(|| apply_filter(&img, &refocus, options, &cancel, &|_| {}).unwrap())
    });

    let single = FilterOptions::new(ThreadingPolicy::Single);
    c.bench_function("BGRA8 refocus matrix: 5, single thread", |b| {
        b.iter(|| apply_filter(&img, &refocus, single, &cancel, &|_| {}).unwrap())
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
