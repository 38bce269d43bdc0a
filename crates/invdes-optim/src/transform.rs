//! Gradient transforms: pure update rules `(gradient, state, params) ->
//! (update, new_state)`.
//!
//! The optimiser adds the returned update to the parameters, so every rule
//! here ascends along the gradient it is given. The sign convention for
//! minimisation is applied by the caller.

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::OptimizeError;

/// Internal state of a gradient transform.
///
/// `count` is the number of updates applied so far; `moments` holds one
/// accumulator per rule-defined moment (Adam keeps two, momentum one).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformState {
    pub count: u64,
    pub moments: Vec<Array1<f64>>,
}

impl TransformState {
    pub fn zeros(num_moments: usize, num_params: usize) -> Self {
        Self {
            count: 0,
            moments: vec![Array1::zeros(num_params); num_moments],
        }
    }
}

/// An update rule with no hidden state: identical inputs always produce
/// identical outputs.
pub trait GradientTransform: Send + Sync {
    fn name(&self) -> &str;

    /// Initial state for `num_params` parameters.
    fn init(&self, num_params: usize) -> TransformState;

    /// Compute the parameter update and the state that follows it.
    fn apply(
        &self,
        gradient: &Array1<f64>,
        state: &TransformState,
        params: &Array1<f64>,
    ) -> Result<(Array1<f64>, TransformState), OptimizeError>;
}

fn check_state(
    rule: &str,
    gradient: &Array1<f64>,
    state: &TransformState,
    params: &Array1<f64>,
    num_moments: usize,
) -> Result<(), OptimizeError> {
    if gradient.len() != params.len() {
        return Err(OptimizeError::InvalidState(format!(
            "{rule}: gradient has {} entries but there are {} parameters",
            gradient.len(),
            params.len()
        )));
    }
    if state.moments.len() != num_moments || state.moments.iter().any(|m| m.len() != params.len()) {
        return Err(OptimizeError::InvalidState(format!(
            "{rule}: state does not match {} parameters",
            params.len()
        )));
    }
    Ok(())
}

/// Adam with bias-corrected first and second moments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adam {
    pub learning_rate: f64,
    pub b1: f64,
    pub b2: f64,
    pub eps: f64,
}

impl Adam {
    pub fn new(learning_rate: f64) -> Self {
        Self {
            learning_rate,
            b1: 0.9,
            b2: 0.999,
            eps: 1e-8,
        }
    }
}

impl GradientTransform for Adam {
    fn name(&self) -> &str {
        "adam"
    }

    fn init(&self, num_params: usize) -> TransformState {
        TransformState::zeros(2, num_params)
    }

    fn apply(
        &self,
        gradient: &Array1<f64>,
        state: &TransformState,
        params: &Array1<f64>,
    ) -> Result<(Array1<f64>, TransformState), OptimizeError> {
        check_state(self.name(), gradient, state, params, 2)?;
        let m = &state.moments[0] * self.b1 + gradient * (1.0 - self.b1);
        let v = &state.moments[1] * self.b2 + gradient.mapv(|g| g * g) * (1.0 - self.b2);

        let t = state.count + 1;
        let exponent = i32::try_from(t).unwrap_or(i32::MAX);
        let m_correction = 1.0 - self.b1.powi(exponent);
        let v_correction = 1.0 - self.b2.powi(exponent);

        let mut update = Array1::zeros(params.len());
        for i in 0..params.len() {
            let m_hat = m[i] / m_correction;
            let v_hat = v[i] / v_correction;
            update[i] = self.learning_rate * m_hat / (v_hat.sqrt() + self.eps);
        }

        let state = TransformState {
            count: t,
            moments: vec![m, v],
        };
        Ok((update, state))
    }
}

/// Plain gradient steps: `update = lr * g`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sgd {
    pub learning_rate: f64,
}

impl GradientTransform for Sgd {
    fn name(&self) -> &str {
        "sgd"
    }

    fn init(&self, num_params: usize) -> TransformState {
        TransformState::zeros(0, num_params)
    }

    fn apply(
        &self,
        gradient: &Array1<f64>,
        state: &TransformState,
        params: &Array1<f64>,
    ) -> Result<(Array1<f64>, TransformState), OptimizeError> {
        check_state(self.name(), gradient, state, params, 0)?;
        let state = TransformState {
            count: state.count + 1,
            moments: Vec::new(),
        };
        Ok((gradient * self.learning_rate, state))
    }
}

/// Heavy-ball momentum: `v' = beta v + g`, `update = lr v'`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Momentum {
    pub learning_rate: f64,
    pub beta: f64,
}

impl GradientTransform for Momentum {
    fn name(&self) -> &str {
        "momentum"
    }

    fn init(&self, num_params: usize) -> TransformState {
        TransformState::zeros(1, num_params)
    }

    fn apply(
        &self,
        gradient: &Array1<f64>,
        state: &TransformState,
        params: &Array1<f64>,
    ) -> Result<(Array1<f64>, TransformState), OptimizeError> {
        check_state(self.name(), gradient, state, params, 1)?;
        let velocity = &state.moments[0] * self.beta + gradient;
        let update = &velocity * self.learning_rate;
        let state = TransformState {
            count: state.count + 1,
            moments: vec![velocity],
        };
        Ok((update, state))
    }
}
