/// Issues unique job names `"{prefix}_{counter}"`.
///
/// A namer belongs to one optimisation or design-space run and is passed
/// explicitly to whatever builds a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskNamer {
    prefix: String,
    counter: usize,
}

impl TaskNamer {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::with_counter(prefix, 0)
    }

    /// Continue numbering from `counter`, e.g. when resuming a run.
    pub fn with_counter(prefix: impl Into<String>, counter: usize) -> Self {
        Self {
            prefix: prefix.into(),
            counter,
        }
    }

    pub fn next_name(&mut self) -> String {
        let name = format!("{}_{}", self.prefix, self.counter);
        self.counter += 1;
        name
    }

    /// Name a sub-task of the next job, e.g. `fwd_3_adjoint`.
    pub fn next_with_suffix(&mut self, suffix: &str) -> String {
        format!("{}_{suffix}", self.next_name())
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Number of names issued so far.
    pub fn issued(&self) -> usize {
        self.counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_sequential() {
        let mut namer = TaskNamer::new("sim");
        assert_eq!(namer.next_name(), "sim_0");
        assert_eq!(namer.next_name(), "sim_1");
        assert_eq!(namer.next_with_suffix("adj"), "sim_2_adj");
        assert_eq!(namer.issued(), 3);
    }

    #[test]
    fn test_resumed_namer_continues() {
        let mut namer = TaskNamer::with_counter("sim", 5);
        assert_eq!(namer.next_name(), "sim_5");
    }
}
