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

use arbitrary::Arbitrary;
use libsharpen::{
    FilterAction, FilterParameterSet, ParamValue, REFOCUS_IDENTIFIER, SIMPLE_SHARP_IDENTIFIER,
    UNSHARP_MASK_IDENTIFIER,
};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum FuzzValue {
    Int(i64),
    Double(f64),
    Bool(bool),
}

#[derive(Arbitrary, Debug)]
struct FuzzAction {
    identifier: u8,
    params: Vec<(u8, FuzzValue)>,
}

const KEYS: [&str; 10] = [
    "radius",
    "sigma",
    "amount",
    "threshold",
    "lumaOnly",
    "matrixSize",
    "gauss",
    "correlation",
    "noise",
    "unknown",
];

fuzz_target!(|data: FuzzAction| {
    let identifier = match data.identifier % 4 {
        0 => SIMPLE_SHARP_IDENTIFIER,
        1 => UNSHARP_MASK_IDENTIFIER,
        2 => REFOCUS_IDENTIFIER,
        _ => "libsharpen:Unknown",
    };
    let mut action = FilterAction::new(identifier);
    for (key, value) in data.params {
        let value = match value {
            FuzzValue::Int(v) => ParamValue::Int(v),
            FuzzValue::Double(v) => ParamValue::Double(v),
            FuzzValue::Bool(v) => ParamValue::Bool(v),
        };
        action = action.with(KEYS[key as usize % KEYS.len()], value);
    }
    if let Ok(params) = FilterParameterSet::from_action(&action) {
        if params.validate().is_ok() {
            let restored = FilterParameterSet::from_action(&params.to_action()).unwrap();
            assert_eq!(restored, params);
        }
    }
});
