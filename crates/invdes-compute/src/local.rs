//! Sequential dispatcher running every job in the calling thread.

use std::collections::HashMap;

use crate::dispatch::{BatchDispatcher, DispatchError};

/// Runs jobs one after another with a plain function.
///
/// The runner receives the job name and the job, and reports failure as a
/// message which is attached to the job name.
pub struct LocalDispatcher<F> {
    runner: F,
}

impl<F> LocalDispatcher<F> {
    pub fn new(runner: F) -> Self {
        Self { runner }
    }
}

impl<J, R, F> BatchDispatcher<J, R> for LocalDispatcher<F>
where
    F: Fn(&str, J) -> Result<R, String>,
{
    fn run_batch(&self, jobs: Vec<(String, J)>) -> Result<HashMap<String, R>, DispatchError> {
        let mut results = HashMap::with_capacity(jobs.len());
        for (name, job) in jobs {
            let result = (self.runner)(&name, job).map_err(|message| DispatchError::JobFailed {
                name: name.clone(),
                message,
            })?;
            results.insert(name, result);
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_runs_every_job() {
        let dispatcher = LocalDispatcher::new(|_: &str, x: i32| Ok::<_, String>(x * 2));
        let results = dispatcher
            .run_batch(vec![("a".into(), 1), ("b".into(), 2)])
            .unwrap();
        assert_eq!(results["a"], 2);
        assert_eq!(results["b"], 4);
    }

    #[test]
    fn test_local_failure_names_job() {
        let dispatcher = LocalDispatcher::new(|name: &str, _: ()| -> Result<(), String> {
            if name == "bad" {
                Err("solver diverged".into())
            } else {
                Ok(())
            }
        });
        let err = dispatcher
            .run_batch(vec![("ok".into(), ()), ("bad".into(), ())])
            .unwrap_err();
        match err {
            DispatchError::JobFailed { name, message } => {
                assert_eq!(name, "bad");
                assert_eq!(message, "solver diverged");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
