//! TOML configuration for optimisation runs.
//!
//! ```toml
//! num_steps = 20
//! learning_rate = 0.05
//! direction = "maximize"
//! history_path = "history.json"
//!
//! [rule]
//! type = "adam"
//! b1 = 0.9
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::direction::Direction;
use crate::error::OptimizeError;
use crate::optimizer::Optimizer;
use crate::transform::{Adam, GradientTransform, Momentum, Sgd};

/// Top-level optimiser configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OptimizerConfig {
    #[serde(default = "default_num_steps")]
    pub num_steps: usize,
    pub learning_rate: f64,
    #[serde(default)]
    pub rule: RuleConfig,
    #[serde(default)]
    pub direction: Direction,
    /// Checkpoint written after every step.
    #[serde(default)]
    pub history_path: Option<PathBuf>,
    /// Prefix for solver task names.
    #[serde(default = "default_task_prefix")]
    pub task_prefix: String,
}

fn default_num_steps() -> usize {
    10
}

fn default_task_prefix() -> String {
    "invdes".into()
}

/// Update rule and its hyperparameters.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RuleConfig {
    Adam {
        #[serde(default = "default_b1")]
        b1: f64,
        #[serde(default = "default_b2")]
        b2: f64,
        #[serde(default = "default_eps")]
        eps: f64,
    },
    Sgd,
    Momentum {
        #[serde(default = "default_beta")]
        beta: f64,
    },
}

impl Default for RuleConfig {
    fn default() -> Self {
        RuleConfig::Adam {
            b1: default_b1(),
            b2: default_b2(),
            eps: default_eps(),
        }
    }
}

fn default_b1() -> f64 {
    0.9
}
fn default_b2() -> f64 {
    0.999
}
fn default_eps() -> f64 {
    1e-8
}
fn default_beta() -> f64 {
    0.9
}

impl OptimizerConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, OptimizeError> {
        let config: Self = toml::from_str(text).map_err(|e| OptimizeError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), OptimizeError> {
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(OptimizeError::Config(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        let in_unit = |name: &str, v: f64| {
            if (0.0..1.0).contains(&v) {
                Ok(())
            } else {
                Err(OptimizeError::Config(format!("{name} must lie in [0, 1), got {v}")))
            }
        };
        match self.rule {
            RuleConfig::Adam { b1, b2, eps } => {
                in_unit("b1", b1)?;
                in_unit("b2", b2)?;
                if !(eps > 0.0) {
                    return Err(OptimizeError::Config(format!("eps must be positive, got {eps}")));
                }
            }
            RuleConfig::Momentum { beta } => in_unit("beta", beta)?,
            RuleConfig::Sgd => {}
        }
        Ok(())
    }

    pub fn transform(&self) -> Box<dyn GradientTransform> {
        let learning_rate = self.learning_rate;
        match self.rule {
            RuleConfig::Adam { b1, b2, eps } => Box::new(Adam {
                learning_rate,
                b1,
                b2,
                eps,
            }),
            RuleConfig::Sgd => Box::new(Sgd { learning_rate }),
            RuleConfig::Momentum { beta } => Box::new(Momentum { learning_rate, beta }),
        }
    }

    pub fn build(&self) -> Optimizer {
        let optimizer = Optimizer::from_boxed(self.transform(), self.num_steps)
            .with_direction(self.direction)
            .with_task_prefix(self.task_prefix.clone());
        match &self.history_path {
            Some(path) => optimizer.with_history_path(path.clone()),
            None => optimizer,
        }
    }
}

/// Load and validate an optimiser configuration file.
pub fn load_config(path: &Path) -> Result<OptimizerConfig, OptimizeError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| OptimizeError::Config(format!("{}: {e}", path.display())))?;
    OptimizerConfig::from_toml_str(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OptimizerConfig::from_toml_str("learning_rate = 0.1").unwrap();
        assert_eq!(config.num_steps, 10);
        assert_eq!(config.direction, Direction::Maximize);
        assert_eq!(config.rule, RuleConfig::default());
        assert_eq!(config.build().transform().name(), "adam");
    }

    #[test]
    fn test_momentum_minimise() {
        let text = r#"
            num_steps = 4
            learning_rate = 0.5
            direction = "minimize"
            history_path = "run.json"

            [rule]
            type = "momentum"
            beta = 0.5
        "#;
        let config = OptimizerConfig::from_toml_str(text).unwrap();
        assert_eq!(config.rule, RuleConfig::Momentum { beta: 0.5 });
        assert_eq!(config.history_path, Some(PathBuf::from("run.json")));
        let optimizer = config.build();
        assert_eq!(optimizer.direction(), Direction::Minimize);
        assert_eq!(optimizer.num_steps(), 4);
    }

    #[test]
    fn test_rejects_bad_hyperparameters() {
        assert!(OptimizerConfig::from_toml_str("learning_rate = -1.0").is_err());
        let text = "learning_rate = 0.1\n[rule]\ntype = \"adam\"\nb1 = 1.5\n";
        assert!(OptimizerConfig::from_toml_str(text).is_err());
        assert!(OptimizerConfig::from_toml_str("learning_rate = 0.1\n[rule]\ntype = \"newton\"\n").is_err());
    }
}
