//! TOML configuration for design-space sweeps.
//!
//! ```toml
//! name = "ring"
//! task_name = "ring"
//!
//! [[parameters]]
//! type = "float"
//! name = "radius"
//! span = [1.0, 2.0]
//! num_points = 5
//!
//! [[parameters]]
//! type = "int"
//! name = "periods"
//! span = [3, 8]
//!
//! [method]
//! type = "grid"
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::design::DesignSpace;
use crate::error::DesignError;
use crate::method::Method;
use crate::parameter::Parameter;

#[derive(Debug, Deserialize)]
pub struct DesignSpaceConfig {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_task_name")]
    pub task_name: String,
    pub parameters: Vec<Parameter>,
    pub method: Method,
}

fn default_task_name() -> String {
    "design".into()
}

impl DesignSpaceConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, DesignError> {
        toml::from_str(text).map_err(|e| DesignError::Config(e.to_string()))
    }

    /// Validate and turn the configuration into a runnable design space.
    pub fn build(self) -> Result<DesignSpace, DesignError> {
        let space = DesignSpace::new(self.parameters, self.method)?.with_task_name(self.task_name);
        Ok(match self.name {
            Some(name) => space.with_name(name),
            None => space,
        })
    }
}

pub fn load_config(path: &Path) -> Result<DesignSpaceConfig, DesignError> {
    let text =
        std::fs::read_to_string(path).map_err(|e| DesignError::Config(format!("{}: {e}", path.display())))?;
    DesignSpaceConfig::from_toml_str(&text)
}
