//! Design parameters and the argument sets handed to evaluation functions.
//!
//! Every parameter maps a uniform sample `u ∈ [0, 1]` onto its domain.
//! Integer parameters always round and then clamp into their span.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DesignError;

/// A single parameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    /// Numeric value; integers are widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Int(i) => Some(*i as f64),
            ParamValue::Float(x) => Some(*x),
            ParamValue::Text(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Float(x) => write!(f, "{x}"),
            ParamValue::Text(s) => write!(f, "{s}"),
        }
    }
}

/// Named values for one evaluation, in parameter order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Arguments(Vec<(String, ParamValue)>);

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, value: ParamValue) {
        self.0.push((name.into(), value));
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(ParamValue::as_f64)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(ParamValue::as_i64)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(ParamValue::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Arguments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}

/// Continuous parameter over `span`. `num_points` is only needed for grids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterFloat {
    pub name: String,
    pub span: (f64, f64),
    #[serde(default)]
    pub num_points: Option<usize>,
}

impl ParameterFloat {
    pub fn new(name: impl Into<String>, span: (f64, f64)) -> Self {
        Self {
            name: name.into(),
            span,
            num_points: None,
        }
    }

    pub fn with_num_points(mut self, num_points: usize) -> Self {
        self.num_points = Some(num_points);
        self
    }

    pub fn select_from_01(&self, u: f64) -> f64 {
        let (lo, hi) = self.span;
        (lo + u * (hi - lo)).clamp(lo, hi)
    }

    /// `num_points` evenly spaced values including both ends.
    pub fn sample_grid(&self) -> Result<Vec<f64>, DesignError> {
        let n = self.num_points.ok_or_else(|| DesignError::InvalidParameter {
            name: self.name.clone(),
            reason: "grid sampling needs num_points".into(),
        })?;
        let (lo, hi) = self.span;
        if n == 1 {
            return Ok(vec![lo]);
        }
        let step = (hi - lo) / (n - 1) as f64;
        Ok((0..n).map(|i| if i == n - 1 { hi } else { lo + step * i as f64 }).collect())
    }
}

/// Integer parameter over the inclusive `span`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterInt {
    pub name: String,
    pub span: (i64, i64),
}

impl ParameterInt {
    pub fn new(name: impl Into<String>, span: (i64, i64)) -> Self {
        Self {
            name: name.into(),
            span,
        }
    }

    /// Round to the nearest integer (halves away from zero), then clamp into
    /// the span.
    pub fn round_clamp(&self, value: f64) -> i64 {
        let (lo, hi) = self.span;
        if value.is_nan() {
            return lo;
        }
        let rounded = value.round();
        if rounded <= lo as f64 {
            lo
        } else if rounded >= hi as f64 {
            hi
        } else {
            rounded as i64
        }
    }

    /// Every integer in the span is equally likely for uniform `u`.
    pub fn select_from_01(&self, u: f64) -> i64 {
        let (lo, hi) = (self.span.0 as f64, self.span.1 as f64);
        self.round_clamp(lo - 0.5 + u * (hi - lo + 1.0))
    }

    /// Number of integers in the span, or `None` if it exceeds `usize`.
    pub fn num_values(&self) -> Option<usize> {
        let (lo, hi) = self.span;
        usize::try_from(hi.abs_diff(lo)).ok()?.checked_add(1)
    }

    pub fn sample_grid(&self) -> Vec<i64> {
        (self.span.0..=self.span.1).collect()
    }
}

/// Parameter taking one of an explicit list of values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterAny {
    pub name: String,
    pub allowed_values: Vec<ParamValue>,
}

impl ParameterAny {
    pub fn new(name: impl Into<String>, allowed_values: Vec<ParamValue>) -> Self {
        Self {
            name: name.into(),
            allowed_values,
        }
    }

    pub fn select_from_01(&self, u: f64) -> ParamValue {
        let n = self.allowed_values.len();
        let index = ((u * n as f64).floor().max(0.0) as usize).min(n.saturating_sub(1));
        self.allowed_values[index].clone()
    }
}

/// Any design parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Parameter {
    Float(ParameterFloat),
    Int(ParameterInt),
    Any(ParameterAny),
}

impl Parameter {
    pub fn name(&self) -> &str {
        match self {
            Parameter::Float(p) => &p.name,
            Parameter::Int(p) => &p.name,
            Parameter::Any(p) => &p.name,
        }
    }

    pub fn validate(&self) -> Result<(), DesignError> {
        let bad = |reason: String| DesignError::InvalidParameter {
            name: self.name().to_string(),
            reason,
        };
        if self.name().is_empty() {
            return Err(bad("name must not be empty".into()));
        }
        match self {
            Parameter::Float(p) => {
                let (lo, hi) = p.span;
                if !(lo.is_finite() && hi.is_finite() && lo <= hi) {
                    return Err(bad(format!("span ({lo}, {hi}) must be finite and ordered")));
                }
                if p.num_points == Some(0) {
                    return Err(bad("num_points must be at least 1".into()));
                }
            }
            Parameter::Int(p) => {
                if p.span.0 > p.span.1 {
                    return Err(bad(format!("span ({}, {}) must be ordered", p.span.0, p.span.1)));
                }
            }
            Parameter::Any(p) => {
                if p.allowed_values.is_empty() {
                    return Err(bad("allowed_values must not be empty".into()));
                }
            }
        }
        Ok(())
    }

    /// Value for a uniform sample `u ∈ [0, 1]`.
    pub fn select_from_01(&self, u: f64) -> ParamValue {
        match self {
            Parameter::Float(p) => ParamValue::Float(p.select_from_01(u)),
            Parameter::Int(p) => ParamValue::Int(p.select_from_01(u)),
            Parameter::Any(p) => p.select_from_01(u),
        }
    }

    /// Number of values [`Parameter::sample_grid`] yields, without building
    /// them.
    pub fn grid_len(&self) -> Result<usize, DesignError> {
        match self {
            Parameter::Float(p) => p.num_points.ok_or_else(|| DesignError::InvalidParameter {
                name: p.name.clone(),
                reason: "grid sampling needs num_points".into(),
            }),
            Parameter::Int(p) => p.num_values().ok_or_else(|| DesignError::InvalidParameter {
                name: p.name.clone(),
                reason: format!("span ({}, {}) is too wide to enumerate", p.span.0, p.span.1),
            }),
            Parameter::Any(p) => Ok(p.allowed_values.len()),
        }
    }

    pub fn sample_grid(&self) -> Result<Vec<ParamValue>, DesignError> {
        Ok(match self {
            Parameter::Float(p) => p.sample_grid()?.into_iter().map(ParamValue::Float).collect(),
            Parameter::Int(p) => p.sample_grid().into_iter().map(ParamValue::Int).collect(),
            Parameter::Any(p) => p.allowed_values.clone(),
        })
    }

    /// Numeric bounds, or `None` for [`ParameterAny`].
    pub fn bounds(&self) -> Option<(f64, f64)> {
        match self {
            Parameter::Float(p) => Some(p.span),
            Parameter::Int(p) => Some((p.span.0 as f64, p.span.1 as f64)),
            Parameter::Any(_) => None,
        }
    }

    /// Value for a point of the numeric domain itself. Integers are rounded
    /// and clamped; `None` for [`ParameterAny`].
    pub fn from_numeric(&self, value: f64) -> Option<ParamValue> {
        match self {
            Parameter::Float(p) => Some(ParamValue::Float(value.clamp(p.span.0, p.span.1))),
            Parameter::Int(p) => Some(ParamValue::Int(p.round_clamp(value))),
            Parameter::Any(_) => None,
        }
    }
}

/// Check every parameter and that names are unique.
pub fn validate_parameters(parameters: &[Parameter]) -> Result<(), DesignError> {
    let mut names = HashSet::new();
    for parameter in parameters {
        parameter.validate()?;
        if !names.insert(parameter.name()) {
            return Err(DesignError::InvalidParameter {
                name: parameter.name().to_string(),
                reason: "duplicate parameter name".into(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_round_then_clamp() {
        let p = ParameterInt::new("n", (0, 5));
        assert_eq!(p.round_clamp(2.6), 3);
        assert_eq!(p.round_clamp(-1.0), 0);
        assert_eq!(p.round_clamp(7.0), 5);
        assert_eq!(p.round_clamp(2.4), 2);
    }

    #[test]
    fn test_int_select_covers_span_evenly() {
        let p = ParameterInt::new("n", (1, 4));
        let picks: Vec<i64> = [0.0, 0.2, 0.3, 0.6, 0.8, 1.0].iter().map(|&u| p.select_from_01(u)).collect();
        assert_eq!(picks, vec![1, 1, 2, 3, 4, 4]);
    }

    #[test]
    fn test_int_select_full_i64_span() {
        let p = ParameterInt::new("n", (i64::MIN, i64::MAX));
        assert_eq!(p.select_from_01(0.0), i64::MIN);
        assert_eq!(p.select_from_01(1.0), i64::MAX);
        assert!(p.select_from_01(0.5).abs() < 1 << 12);
        assert_eq!(p.num_values(), None);
        assert!(Parameter::Int(p).validate().is_ok());
    }

    #[test]
    fn test_grid_len_counts_values() {
        assert_eq!(Parameter::Int(ParameterInt::new("n", (-2, 2))).grid_len().unwrap(), 5);
        assert_eq!(ParameterInt::new("n", (3, 3)).num_values(), Some(1));
        let x = Parameter::Float(ParameterFloat::new("x", (0.0, 1.0)).with_num_points(7));
        assert_eq!(x.grid_len().unwrap(), 7);
    }

    #[test]
    fn test_float_grid_includes_ends() {
        let p = ParameterFloat::new("x", (0.0, 1.0)).with_num_points(5);
        assert_eq!(p.sample_grid().unwrap(), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert!(ParameterFloat::new("x", (0.0, 1.0)).sample_grid().is_err());
    }

    #[test]
    fn test_any_select() {
        let p = ParameterAny::new(
            "material",
            vec![ParamValue::Text("si".into()), ParamValue::Text("sin".into())],
        );
        assert_eq!(p.select_from_01(0.0), ParamValue::Text("si".into()));
        assert_eq!(p.select_from_01(0.99), ParamValue::Text("sin".into()));
        assert_eq!(p.select_from_01(1.0), ParamValue::Text("sin".into()));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let params = vec![
            Parameter::Float(ParameterFloat::new("x", (0.0, 1.0))),
            Parameter::Int(ParameterInt::new("x", (0, 2))),
        ];
        assert!(validate_parameters(&params).is_err());
        let empty = vec![Parameter::Int(ParameterInt::new("", (0, 2)))];
        assert!(validate_parameters(&empty).is_err());
    }
}
