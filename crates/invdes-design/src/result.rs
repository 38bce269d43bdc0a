use serde::{Deserialize, Serialize};

use crate::parameter::{Arguments, ParamValue};

/// Output of one design-space sweep, in evaluation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingResult {
    /// Parameter names, in declaration order.
    pub dims: Vec<String>,
    pub samples: Vec<(Arguments, f64)>,
    /// Task names of the dispatched jobs, one per sample, for batch runs.
    #[serde(default)]
    pub task_ids: Option<Vec<String>>,
}

impl SamplingResult {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|(_, y)| *y).collect()
    }

    /// Every sampled value of the named parameter.
    pub fn column(&self, name: &str) -> Option<Vec<ParamValue>> {
        if !self.dims.iter().any(|d| d == name) {
            return None;
        }
        self.samples
            .iter()
            .map(|(args, _)| args.get(name).cloned())
            .collect()
    }

    /// Sample with the largest finite value.
    pub fn best(&self) -> Option<&(Arguments, f64)> {
        self.samples
            .iter()
            .filter(|(_, y)| y.is_finite())
            .max_by(|a, b| a.1.total_cmp(&b.1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result() -> SamplingResult {
        let samples = [1.0, f64::NAN, 3.0, 2.0]
            .iter()
            .enumerate()
            .map(|(i, &y)| {
                let mut a = Arguments::new();
                a.push("n", ParamValue::Int(i as i64));
                (a, y)
            })
            .collect();
        SamplingResult {
            dims: vec!["n".into()],
            samples,
            task_ids: None,
        }
    }

    #[test]
    fn test_best_skips_non_finite() {
        let r = result();
        let (args, y) = r.best().unwrap();
        assert_eq!(*y, 3.0);
        assert_eq!(args.int("n"), Some(2));
    }

    #[test]
    fn test_column() {
        let r = result();
        let column = r.column("n").unwrap();
        assert_eq!(column[3], ParamValue::Int(3));
        assert!(r.column("m").is_none());
    }
}
