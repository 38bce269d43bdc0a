//! Append-only optimisation history and JSON checkpoints.
//!
//! Record `i` holds the parameters evaluated at step `i`, the objective and
//! gradient found there, and the transform state *before* the update taken
//! from that step. The next parameters are therefore a deterministic function
//! of the last record alone, which is what makes a resumed run identical to an
//! uninterrupted one.

use std::fs;
use std::path::Path;

use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::direction::Direction;
use crate::error::{OptimizeError, PersistenceError};
use crate::transform::{GradientTransform, TransformState};

/// Auxiliary values reported alongside an objective.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub penalty: f64,
    /// Raw post-process value before the penalty is subtracted.
    pub post_process: f64,
    /// Names of the solver tasks run for this evaluation.
    #[serde(default)]
    pub tasks: Vec<String>,
}

/// One evaluated step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: usize,
    pub params: Array1<f64>,
    pub objective: f64,
    pub gradient: Array1<f64>,
    pub state: TransformState,
    pub diagnostics: Diagnostics,
}

/// Ordered record of one optimisation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationHistory {
    initial_params: Array1<f64>,
    initial_state: TransformState,
    records: Vec<StepRecord>,
    /// Task names issued so far, so resumed runs keep names unique.
    tasks_issued: usize,
}

impl OptimizationHistory {
    /// An empty history starting from `initial_params`.
    pub fn new(initial_params: Array1<f64>, initial_state: TransformState) -> Self {
        Self {
            initial_params,
            initial_state,
            records: Vec::new(),
            tasks_issued: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    pub fn last(&self) -> Option<&StepRecord> {
        self.records.last()
    }

    pub fn initial_params(&self) -> &Array1<f64> {
        &self.initial_params
    }

    pub fn initial_state(&self) -> &TransformState {
        &self.initial_state
    }

    pub fn tasks_issued(&self) -> usize {
        self.tasks_issued
    }

    pub fn params(&self) -> Vec<&Array1<f64>> {
        self.records.iter().map(|r| &r.params).collect()
    }

    pub fn objectives(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.objective).collect()
    }

    pub fn gradients(&self) -> Vec<&Array1<f64>> {
        self.records.iter().map(|r| &r.gradient).collect()
    }

    pub fn states(&self) -> Vec<&TransformState> {
        self.records.iter().map(|r| &r.state).collect()
    }

    pub fn penalties(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.diagnostics.penalty).collect()
    }

    pub fn post_process_values(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.diagnostics.post_process).collect()
    }

    /// Record with the best objective for `direction`.
    pub fn best(&self, direction: Direction) -> Option<&StepRecord> {
        self.records.iter().fold(None, |best, r| match best {
            Some(b) if !direction.improves(r.objective, b.objective) => Some(b),
            _ => Some(r),
        })
    }

    /// Parameters and transform state for the next evaluation.
    ///
    /// For an empty history this is the seed; otherwise the update is
    /// recomputed from the last record.
    pub fn next_point(
        &self,
        transform: &dyn GradientTransform,
        direction: Direction,
    ) -> Result<(Array1<f64>, TransformState), OptimizeError> {
        match self.records.last() {
            None => Ok((self.initial_params.clone(), self.initial_state.clone())),
            Some(last) => {
                let signed = direction.signed(&last.gradient);
                let (update, state) = transform.apply(&signed, &last.state, &last.params)?;
                Ok((&last.params + &update, state))
            }
        }
    }

    pub(crate) fn push(&mut self, record: StepRecord, tasks_issued: usize) {
        self.records.push(record);
        self.note_tasks_issued(tasks_issued);
    }

    pub(crate) fn note_tasks_issued(&mut self, tasks_issued: usize) {
        self.tasks_issued = self.tasks_issued.max(tasks_issued);
    }

    /// Write a JSON checkpoint. The file is written beside `path` and renamed
    /// into place, so an existing checkpoint is never left half-written.
    pub fn save(&self, path: &Path) -> Result<(), PersistenceError> {
        let text = serde_json::to_string(self)?;
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, PersistenceError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::Sgd;
    use ndarray::array;

    fn record(step: usize, objective: f64, gradient: Array1<f64>) -> StepRecord {
        StepRecord {
            step,
            params: array![step as f64],
            objective,
            gradient,
            state: TransformState::zeros(0, 1),
            diagnostics: Diagnostics::default(),
        }
    }

    #[test]
    fn test_next_point_from_seed_and_last_record() {
        let sgd = Sgd { learning_rate: 0.5 };
        let mut history = OptimizationHistory::new(array![1.0], sgd.init(1));
        let (p0, _) = history.next_point(&sgd, Direction::Maximize).unwrap();
        assert_eq!(p0, array![1.0]);

        history.push(record(0, 1.0, array![2.0]), 1);
        let (up, _) = history.next_point(&sgd, Direction::Maximize).unwrap();
        let (down, _) = history.next_point(&sgd, Direction::Minimize).unwrap();
        assert_eq!(up, array![1.0]);
        assert_eq!(down, array![-1.0]);
    }

    #[test]
    fn test_best_respects_direction() {
        let mut history = OptimizationHistory::new(array![0.0], TransformState::zeros(0, 1));
        history.push(record(0, 1.0, array![0.0]), 0);
        history.push(record(1, 3.0, array![0.0]), 0);
        history.push(record(2, 2.0, array![0.0]), 0);
        assert_eq!(history.best(Direction::Maximize).map(|r| r.step), Some(1));
        assert_eq!(history.best(Direction::Minimize).map(|r| r.step), Some(0));
    }
}
