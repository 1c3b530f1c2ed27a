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

use std::error::Error;

#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq)]
/// Shows size mismatching
pub struct MismatchedSize {
    pub expected: usize,
    pub received: usize,
}

/// Describes which filter parameter was rejected and why
#[derive(Debug, Clone, PartialEq)]
pub enum InvalidParameter {
    /// Refocus matrix size must be odd
    EvenMatrixSize(i32),
    /// Refocus matrix size exceeds [crate::max_matrix_size] or is not positive
    MatrixSizeOutOfRange(i32),
    /// Radius must not be negative
    NegativeRadius(f64),
    /// Value is outside of the accepted range, or is not finite
    OutOfRange { name: &'static str, value: f64 },
    /// Filter action does not carry the required key
    MissingKey(String),
    /// Filter action carries the key with an unexpected value type
    WrongType(String),
    /// Filter action identifier is not known
    UnknownFilter(String),
}

impl std::fmt::Display for InvalidParameter {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            InvalidParameter::EvenMatrixSize(size) => {
                f.write_fmt(format_args!("Matrix size must be odd, but received {size}"))
            }
            InvalidParameter::MatrixSizeOutOfRange(size) => f.write_fmt(format_args!(
                "Matrix size must be in 1..={}, but received {size}",
                crate::max_matrix_size()
            )),
            InvalidParameter::NegativeRadius(radius) => {
                f.write_fmt(format_args!("Radius must not be negative, received {radius}"))
            }
            InvalidParameter::OutOfRange { name, value } => {
                f.write_fmt(format_args!("Parameter `{name}` is out of range: {value}"))
            }
            InvalidParameter::MissingKey(key) => {
                f.write_fmt(format_args!("Filter action has no `{key}` entry"))
            }
            InvalidParameter::WrongType(key) => {
                f.write_fmt(format_args!("Filter action entry `{key}` has wrong type"))
            }
            InvalidParameter::UnknownFilter(id) => {
                f.write_fmt(format_args!("Unknown filter identifier `{id}`"))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterError {
    InvalidParameter(InvalidParameter),
    AllocationFailure(usize),
    Cancelled,
    ImageTooSmall(MismatchedSize),
    MinimumSliceSizeMismatch(MismatchedSize),
    ImagesMustMatch,
    ZeroBaseSize,
    TaskBusy,
    TaskNotStarted,
    WorkerFailed(String),
}

impl Error for FilterError {}

impl std::fmt::Display for FilterError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            FilterError::InvalidParameter(param) => {
                f.write_fmt(format_args!("Invalid parameter: {param}"))
            }
            FilterError::AllocationFailure(elements) => f.write_fmt(format_args!(
                "Failed to allocate buffer of {elements} elements"
            )),
            FilterError::Cancelled => f.write_str("Filter was cancelled"),
            FilterError::ImageTooSmall(size) => f.write_fmt(format_args!(
                "Image must be at least {} pixels in each dimension, but smallest dimension is {}",
                size.expected, size.received
            )),
            FilterError::MinimumSliceSizeMismatch(size) => f.write_fmt(format_args!(
                "Minimum image slice size mismatch: expected={}, received={}",
                size.expected, size.received
            )),
            FilterError::ImagesMustMatch => {
                f.write_str("Source and destination images must match in their dimensions")
            }
            FilterError::ZeroBaseSize => f.write_str("Image size must not be zero"),
            FilterError::TaskBusy => f.write_str("Filter task was already started"),
            FilterError::TaskNotStarted => {
                f.write_str("Filter task was not started or its result was already taken")
            }
            FilterError::WorkerFailed(reason) => {
                f.write_fmt(format_args!("Filter worker failed: {reason}"))
            }
        }
    }
}

impl From<InvalidParameter> for FilterError {
    fn from(value: InvalidParameter) -> Self {
        FilterError::InvalidParameter(value)
    }
}

/// Allocates a vector filled with `value`, reporting allocation failure
/// instead of aborting.
pub(crate) fn try_vec<T: Clone>(len: usize, value: T) -> Result<Vec<T>, FilterError> {
    let mut store = Vec::new();
    if store.try_reserve_exact(len).is_err() {
        log::warn!("Unable to reserve {len} elements");
        return Err(FilterError::AllocationFailure(len));
    }
    store.resize(len, value);
    Ok(store)
}

pub(crate) fn check_finite(name: &'static str, value: f64) -> Result<(), FilterError> {
    if !value.is_finite() {
        return Err(InvalidParameter::OutOfRange { name, value }.into());
    }
    Ok(())
}

pub(crate) fn check_range(
    name: &'static str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), FilterError> {
    check_finite(name, value)?;
    if value < min || value > max {
        return Err(InvalidParameter::OutOfRange { name, value }.into());
    }
    Ok(())
}
