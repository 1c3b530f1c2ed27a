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

use image::ImageReader;
use libsharpen::{
    sharpen_image, FilterOptions, FilterParameterSet, RefocusParams, SimpleSharpParams,
    ThreadingPolicy, UnsharpMaskParams,
};
use std::time::Instant;

fn parse_filter(name: &str) -> Option<FilterParameterSet> {
    match name {
        "sharpen" => Some(FilterParameterSet::SimpleSharp(
            SimpleSharpParams::from_radius(2.),
        )),
        "unsharp" => Some(FilterParameterSet::UnsharpMask(
            UnsharpMaskParams::default(),
        )),
        "refocus" => Some(FilterParameterSet::Refocus(RefocusParams::default())),
        _ => None,
    }
}

fn main() {
    env_logger::init();

    let args = std::env::args().collect::<Vec<_>>();
    if args.len() < 3 {
        eprintln!("Usage: {} <input> <output> [sharpen|unsharp|refocus]", args[0]);
        std::process::exit(2);
    }
    let filter = args.get(3).map(|x| x.as_str()).unwrap_or("unsharp");
    let Some(params) = parse_filter(filter) else {
        eprintln!("Unknown filter {filter}");
        std::process::exit(2);
    };

    let dyn_image = ImageReader::open(&args[1]).unwrap().decode().unwrap();
    println!("dimensions {}x{}", dyn_image.width(), dyn_image.height());
    println!("type {:?}", dyn_image.color());

    // replay through the persisted form, the way edit histories do
    let action = params.to_action();
    log::info!("Applying {action:?}");
    let params = FilterParameterSet::from_action(&action).unwrap();

    let start = Instant::now();
    let result = sharpen_image(
        dyn_image,
        &params,
        FilterOptions::new(ThreadingPolicy::Adaptive),
    )
    .unwrap();
    println!("{filter} time: {:?}", start.elapsed());

    result.save(&args[2]).unwrap();
}
