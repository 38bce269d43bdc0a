use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Whether the objective is maximised or minimised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Maximize,
    Minimize,
}

impl Direction {
    /// Gradient handed to the transform: `+g` to maximise, `-g` to minimise.
    pub fn signed(self, gradient: &Array1<f64>) -> Array1<f64> {
        match self {
            Direction::Maximize => gradient.clone(),
            Direction::Minimize => -gradient,
        }
    }

    /// Whether `candidate` is strictly better than `incumbent`.
    pub fn improves(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Direction::Maximize => candidate > incumbent,
            Direction::Minimize => candidate < incumbent,
        }
    }
}
