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

use crate::util::{check_finite, check_range};
use crate::{max_matrix_size, FilterError, InvalidParameter};
use serde::{Deserialize, Serialize};

pub const SIMPLE_SHARP_IDENTIFIER: &str = "libsharpen:SimpleSharp";
pub const UNSHARP_MASK_IDENTIFIER: &str = "libsharpen:UnsharpMask";
pub const REFOCUS_IDENTIFIER: &str = "libsharpen:Refocus";
/// Version written into every [FilterAction]
pub const FILTER_ACTION_VERSION: u32 = 1;

const MAX_SHARP_RADIUS: f64 = 10.;
const MAX_SHARP_SIGMA: f64 = 10.;
const MAX_UNSHARP_RADIUS: f64 = 120.;
const MAX_UNSHARP_AMOUNT: f64 = 5.;
const MAX_REFOCUS_RADIUS: f64 = 5.;

fn check_radius(radius: f64) -> Result<(), FilterError> {
    check_finite("radius", radius)?;
    if radius < 0. {
        return Err(InvalidParameter::NegativeRadius(radius).into());
    }
    Ok(())
}

/// Gaussian sharpen, the kernel is described in [crate::build_gaussian_sharpen_kernel]
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleSharpParams {
    pub radius: f64,
    /// Non positive sigma leaves the image unchanged
    pub sigma: f64,
}

impl SimpleSharpParams {
    pub fn new(radius: f64, sigma: f64) -> SimpleSharpParams {
        SimpleSharpParams { radius, sigma }
    }

    /// Derives sigma the way the sharpen tool does: `radius` below one, `sqrt(radius)` above.
    pub fn from_radius(radius: f64) -> SimpleSharpParams {
        let sigma = if radius < 1. { radius } else { radius.sqrt() };
        SimpleSharpParams { radius, sigma }
    }

    /// Radius must lie in `0..=10`, sigma must be finite and at most 10
    pub fn validate(&self) -> Result<(), FilterError> {
        check_radius(self.radius)?;
        check_range("radius", self.radius, 0., MAX_SHARP_RADIUS)?;
        check_finite("sigma", self.sigma)?;
        if self.sigma > MAX_SHARP_SIGMA {
            return Err(InvalidParameter::OutOfRange {
                name: "sigma",
                value: self.sigma,
            }
            .into());
        }
        Ok(())
    }
}

impl Default for SimpleSharpParams {
    fn default() -> Self {
        SimpleSharpParams::from_radius(0.)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsharpMaskParams {
    /// Sigma of the gaussian blur
    pub radius: f64,
    pub amount: f64,
    /// Fraction of the depth maximum below which differences are ignored
    pub threshold: f64,
    /// Sharpen luma only, keeping chroma
    pub luma_only: bool,
}

impl UnsharpMaskParams {
    pub fn new(radius: f64, amount: f64, threshold: f64, luma_only: bool) -> UnsharpMaskParams {
        UnsharpMaskParams {
            radius,
            amount,
            threshold,
            luma_only,
        }
    }

    pub fn validate(&self) -> Result<(), FilterError> {
        check_radius(self.radius)?;
        check_range("radius", self.radius, 0., MAX_UNSHARP_RADIUS)?;
        check_range("amount", self.amount, 0., MAX_UNSHARP_AMOUNT)?;
        check_range("threshold", self.threshold, 0., 1.)
    }
}

impl Default for UnsharpMaskParams {
    fn default() -> Self {
        UnsharpMaskParams::new(1., 1., 0.05, false)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefocusParams {
    /// Half-width of the deconvolution kernel, odd, at most [max_matrix_size]
    pub matrix_size: i32,
    /// Radius of the defocus disc
    pub radius: f64,
    /// Spread of the gaussian part of the blur
    pub gauss: f64,
    /// Correlation between neighbouring pixels in the signal model
    pub correlation: f64,
    /// Noise to signal ratio
    pub noise: f64,
}

impl RefocusParams {
    pub fn new(
        matrix_size: i32,
        radius: f64,
        gauss: f64,
        correlation: f64,
        noise: f64,
    ) -> RefocusParams {
        RefocusParams {
            matrix_size,
            radius,
            gauss,
            correlation,
            noise,
        }
    }

    pub fn validate(&self) -> Result<(), FilterError> {
        if self.matrix_size < 1 || self.matrix_size > max_matrix_size() {
            return Err(InvalidParameter::MatrixSizeOutOfRange(self.matrix_size).into());
        }
        if self.matrix_size % 2 == 0 {
            return Err(InvalidParameter::EvenMatrixSize(self.matrix_size).into());
        }
        check_radius(self.radius)?;
        check_range("radius", self.radius, 0., MAX_REFOCUS_RADIUS)?;
        check_range("gauss", self.gauss, 0., 1.)?;
        check_range("correlation", self.correlation, 0., 1.)?;
        check_range("noise", self.noise, 0., 1.)
    }
}

impl Default for RefocusParams {
    fn default() -> Self {
        RefocusParams::new(5, 1., 0., 0.5, 0.03)
    }
}

/// Parameters of one filter invocation
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum FilterParameterSet {
    SimpleSharp(SimpleSharpParams),
    UnsharpMask(UnsharpMaskParams),
    Refocus(RefocusParams),
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    Int(i64),
    Double(f64),
    Bool(bool),
}

/// Flat persisted record of a filter invocation, replayed from edit histories
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterAction {
    pub identifier: String,
    pub version: u32,
    pub params: Vec<(String, ParamValue)>,
}

impl FilterAction {
    pub fn new(identifier: &str) -> FilterAction {
        FilterAction {
            identifier: identifier.to_string(),
            version: FILTER_ACTION_VERSION,
            params: vec![],
        }
    }

    pub fn with(mut self, key: &str, value: ParamValue) -> FilterAction {
        self.params.push((key.to_string(), value));
        self
    }

    pub fn get(&self, key: &str) -> Option<ParamValue> {
        self.params
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| *value)
    }

    fn require(&self, key: &str) -> Result<ParamValue, FilterError> {
        self.get(key)
            .ok_or_else(|| InvalidParameter::MissingKey(key.to_string()).into())
    }

    /// Reads a double, integers are widened
    pub fn get_double(&self, key: &str) -> Result<f64, FilterError> {
        match self.require(key)? {
            ParamValue::Double(v) => Ok(v),
            ParamValue::Int(v) => Ok(v as f64),
            ParamValue::Bool(_) => Err(InvalidParameter::WrongType(key.to_string()).into()),
        }
    }

    pub fn get_int(&self, key: &str) -> Result<i64, FilterError> {
        match self.require(key)? {
            ParamValue::Int(v) => Ok(v),
            _ => Err(InvalidParameter::WrongType(key.to_string()).into()),
        }
    }

    pub fn get_bool(&self, key: &str) -> Result<bool, FilterError> {
        match self.require(key)? {
            ParamValue::Bool(v) => Ok(v),
            _ => Err(InvalidParameter::WrongType(key.to_string()).into()),
        }
    }
}

impl FilterParameterSet {
    pub fn validate(&self) -> Result<(), FilterError> {
        match self {
            FilterParameterSet::SimpleSharp(p) => p.validate(),
            FilterParameterSet::UnsharpMask(p) => p.validate(),
            FilterParameterSet::Refocus(p) => p.validate(),
        }
    }

    pub fn identifier(&self) -> &'static str {
        match self {
            FilterParameterSet::SimpleSharp(_) => SIMPLE_SHARP_IDENTIFIER,
            FilterParameterSet::UnsharpMask(_) => UNSHARP_MASK_IDENTIFIER,
            FilterParameterSet::Refocus(_) => REFOCUS_IDENTIFIER,
        }
    }

    pub fn to_action(&self) -> FilterAction {
        let action = FilterAction::new(self.identifier());
        match self {
            FilterParameterSet::SimpleSharp(p) => action
                .with("radius", ParamValue::Double(p.radius))
                .with("sigma", ParamValue::Double(p.sigma)),
            FilterParameterSet::UnsharpMask(p) => action
                .with("radius", ParamValue::Double(p.radius))
                .with("amount", ParamValue::Double(p.amount))
                .with("threshold", ParamValue::Double(p.threshold))
                .with("lumaOnly", ParamValue::Bool(p.luma_only)),
            FilterParameterSet::Refocus(p) => action
                .with("matrixSize", ParamValue::Int(p.matrix_size as i64))
                .with("radius", ParamValue::Double(p.radius))
                .with("gauss", ParamValue::Double(p.gauss))
                .with("correlation", ParamValue::Double(p.correlation))
                .with("noise", ParamValue::Double(p.noise)),
        }
    }

    /// Restores parameters from a persisted record. Records without `sigma` derive it
    /// from the radius, see [SimpleSharpParams::from_radius].
    pub fn from_action(action: &FilterAction) -> Result<FilterParameterSet, FilterError> {
        if action.version > FILTER_ACTION_VERSION {
            log::warn!(
                "Filter action {} has newer version {}",
                action.identifier,
                action.version
            );
        }
        match action.identifier.as_str() {
            SIMPLE_SHARP_IDENTIFIER => {
                let radius = action.get_double("radius")?;
                let params = match action.get("sigma") {
                    Some(_) => SimpleSharpParams::new(radius, action.get_double("sigma")?),
                    None => SimpleSharpParams::from_radius(radius),
                };
                Ok(FilterParameterSet::SimpleSharp(params))
            }
            UNSHARP_MASK_IDENTIFIER => Ok(FilterParameterSet::UnsharpMask(UnsharpMaskParams {
                radius: action.get_double("radius")?,
                amount: action.get_double("amount")?,
                threshold: action.get_double("threshold")?,
                luma_only: action.get_bool("lumaOnly")?,
            })),
            REFOCUS_IDENTIFIER => {
                let matrix_size = action.get_int("matrixSize")?;
                let matrix_size = i32::try_from(matrix_size)
                    .map_err(|_| InvalidParameter::MatrixSizeOutOfRange(i32::MAX))?;
                Ok(FilterParameterSet::Refocus(RefocusParams {
                    matrix_size,
                    radius: action.get_double("radius")?,
                    gauss: action.get_double("gauss")?,
                    correlation: action.get_double("correlation")?,
                    noise: action.get_double("noise")?,
                }))
            }
            other => Err(InvalidParameter::UnknownFilter(other.to_string()).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refocus_round_trip() {
        let params = FilterParameterSet::Refocus(RefocusParams::new(7, 1.2, 0.3, 0.6, 0.02));
        let action = params.to_action();
        assert_eq!(action.identifier, REFOCUS_IDENTIFIER);
        assert_eq!(action.version, 1);
        let restored = FilterParameterSet::from_action(&action).unwrap();
        match restored {
            FilterParameterSet::Refocus(p) => {
                assert_eq!(p.matrix_size, 7);
                assert!((p.radius - 1.2).abs() < 1e-9);
                assert!((p.gauss - 0.3).abs() < 1e-9);
                assert!((p.correlation - 0.6).abs() < 1e-9);
                assert!((p.noise - 0.02).abs() < 1e-9);
            }
            other => panic!("Unexpected variant {other:?}"),
        }
    }

    #[test]
    fn test_round_trip_through_json() {
        let all = [
            FilterParameterSet::SimpleSharp(SimpleSharpParams::from_radius(2.5)),
            FilterParameterSet::UnsharpMask(UnsharpMaskParams::new(3., 0.7, 0.1, true)),
            FilterParameterSet::Refocus(RefocusParams::default()),
        ];
        for params in all {
            let json = serde_json::to_string(&params.to_action()).unwrap();
            let action: FilterAction = serde_json::from_str(&json).unwrap();
            assert_eq!(FilterParameterSet::from_action(&action).unwrap(), params);
        }
    }

    #[test]
    fn test_even_matrix_rejected() {
        let params = RefocusParams::new(6, 1., 0., 0.5, 0.03);
        assert_eq!(
            params.validate(),
            Err(FilterError::InvalidParameter(
                InvalidParameter::EvenMatrixSize(6)
            ))
        );
        assert!(RefocusParams::new(27, 1., 0., 0.5, 0.03).validate().is_err());
        assert!(RefocusParams::new(25, 1., 0., 0.5, 0.03).validate().is_ok());
    }

    #[test]
    fn test_ranges() {
        assert!(UnsharpMaskParams::new(121., 1., 0.05, false).validate().is_err());
        assert!(UnsharpMaskParams::new(1., 5.5, 0.05, false).validate().is_err());
        assert!(UnsharpMaskParams::new(1., 1., 1.5, false).validate().is_err());
        assert_eq!(
            SimpleSharpParams::new(-1., 1.).validate(),
            Err(FilterError::InvalidParameter(
                InvalidParameter::NegativeRadius(-1.)
            ))
        );
        assert!(RefocusParams::new(5, 1., 0., 0.5, f64::NAN).validate().is_err());
        assert!(UnsharpMaskParams::default().validate().is_ok());
        assert!(SimpleSharpParams::default().validate().is_ok());
    }

    #[test]
    fn test_simple_sharp_bounds() {
        assert!(SimpleSharpParams::from_radius(10.).validate().is_ok());
        assert_eq!(
            SimpleSharpParams::new(1e20, 1.).validate(),
            Err(FilterError::InvalidParameter(InvalidParameter::OutOfRange {
                name: "radius",
                value: 1e20,
            }))
        );
        assert_eq!(
            SimpleSharpParams::new(0., 1e5).validate(),
            Err(FilterError::InvalidParameter(InvalidParameter::OutOfRange {
                name: "sigma",
                value: 1e5,
            }))
        );
        assert!(SimpleSharpParams::new(0., f64::INFINITY).validate().is_err());
        assert!(SimpleSharpParams::new(0., -1.).validate().is_ok());
    }

    #[test]
    fn test_sigma_derivation() {
        assert_eq!(SimpleSharpParams::from_radius(0.5).sigma, 0.5);
        assert_eq!(SimpleSharpParams::from_radius(4.).sigma, 2.);
        let legacy = FilterAction::new(SIMPLE_SHARP_IDENTIFIER).with("radius", ParamValue::Int(9));
        assert_eq!(
            FilterParameterSet::from_action(&legacy).unwrap(),
            FilterParameterSet::SimpleSharp(SimpleSharpParams::new(9., 3.))
        );
    }

    #[test]
    fn test_malformed_actions() {
        let action = FilterAction::new(REFOCUS_IDENTIFIER)
            .with("matrixSize", ParamValue::Double(5.))
            .with("radius", ParamValue::Double(1.));
        assert_eq!(
            FilterParameterSet::from_action(&action),
            Err(FilterError::InvalidParameter(InvalidParameter::WrongType(
                "matrixSize".to_string()
            )))
        );
        let action = FilterAction::new(UNSHARP_MASK_IDENTIFIER).with("radius", ParamValue::Int(1));
        assert_eq!(
            FilterParameterSet::from_action(&action),
            Err(FilterError::InvalidParameter(InvalidParameter::MissingKey(
                "amount".to_string()
            )))
        );
        let action = FilterAction::new("libsharpen:Emboss");
        assert!(matches!(
            FilterParameterSet::from_action(&action),
            Err(FilterError::InvalidParameter(
                InvalidParameter::UnknownFilter(_)
            ))
        ));
    }
}
