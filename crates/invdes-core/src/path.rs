//! Paths naming the differentiable parameters of a structure.
//!
//! A path is a sequence of field names and indices, written in display form
//! as `geometry.geometries[1].centre[0]`. Composite geometries strip their own
//! prefix before delegating to a child.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::derivative::DerivativeError;

/// One step of a [`ParamPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathKey {
    Index(usize),
    Field(String),
}

/// Path to a differentiable parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParamPath(Vec<PathKey>);

impl ParamPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn field(name: impl Into<String>) -> Self {
        Self(vec![PathKey::Field(name.into())])
    }

    pub fn with_field(mut self, name: impl Into<String>) -> Self {
        self.0.push(PathKey::Field(name.into()));
        self
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.0.push(PathKey::Index(index));
        self
    }

    pub fn keys(&self) -> &[PathKey] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// First key and the remaining path.
    pub fn split_first(&self) -> Option<(&PathKey, ParamPath)> {
        self.0
            .split_first()
            .map(|(head, rest)| (head, ParamPath(rest.to_vec())))
    }

    /// `prefix` followed by this path.
    pub fn prefixed(&self, prefix: &ParamPath) -> ParamPath {
        let mut keys = prefix.0.clone();
        keys.extend(self.0.iter().cloned());
        ParamPath(keys)
    }

    /// Name of the first key when it is a field.
    pub fn head_field(&self) -> Option<&str> {
        match self.0.first() {
            Some(PathKey::Field(name)) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for ParamPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.0.iter().enumerate() {
            match key {
                PathKey::Field(name) if i == 0 => write!(f, "{name}")?,
                PathKey::Field(name) => write!(f, ".{name}")?,
                PathKey::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for ParamPath {
    type Err = DerivativeError;

    /// Parse the display form, e.g. `geometries[0].size[2]`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = |msg: &str| DerivativeError::Configuration(format!("invalid path '{s}': {msg}"));
        let mut keys = Vec::new();
        let mut name = String::new();
        let mut chars = s.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '.' => {
                    if name.is_empty() {
                        return Err(bad("empty field name"));
                    }
                    keys.push(PathKey::Field(std::mem::take(&mut name)));
                }
                '[' => {
                    if !name.is_empty() {
                        keys.push(PathKey::Field(std::mem::take(&mut name)));
                    }
                    let mut digits = String::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some(d) if d.is_ascii_digit() => digits.push(d),
                            _ => return Err(bad("malformed index")),
                        }
                    }
                    let idx = digits.parse().map_err(|_| bad("malformed index"))?;
                    keys.push(PathKey::Index(idx));
                    // an index may be followed by another index, a dot, or the end
                    if let Some(&next) = chars.peek() {
                        if next == '.' {
                            chars.next();
                            if chars.peek().is_none() {
                                return Err(bad("trailing dot"));
                            }
                        } else if next != '[' {
                            return Err(bad("expected '.' or '[' after index"));
                        }
                    }
                }
                ']' => return Err(bad("unmatched ']'")),
                other => name.push(other),
            }
        }
        if !name.is_empty() {
            keys.push(PathKey::Field(name));
        } else if s.ends_with('.') {
            return Err(bad("trailing dot"));
        }
        Ok(ParamPath(keys))
    }
}
