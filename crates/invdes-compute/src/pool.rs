//! Thread-pool dispatcher using Rayon for shared-memory parallelism.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::dispatch::{BatchDispatcher, DispatchError};

/// Runs the jobs of a batch concurrently on the global Rayon pool.
///
/// The call returns only once every job has finished.
pub struct ThreadPoolDispatcher<F> {
    runner: F,
}

impl<F> ThreadPoolDispatcher<F> {
    pub fn new(runner: F) -> Self {
        Self { runner }
    }

    /// Number of worker threads available to a batch.
    pub fn num_threads(&self) -> usize {
        rayon::current_num_threads()
    }
}

impl<J, R, F> BatchDispatcher<J, R> for ThreadPoolDispatcher<F>
where
    J: Send,
    R: Send,
    F: Fn(&str, J) -> Result<R, String> + Sync,
{
    fn run_batch(&self, jobs: Vec<(String, J)>) -> Result<HashMap<String, R>, DispatchError> {
        log::debug!(
            "Running {} job(s) on {} thread(s)",
            jobs.len(),
            self.num_threads()
        );
        jobs.into_par_iter()
            .map(|(name, job)| match (self.runner)(&name, job) {
                Ok(result) => Ok((name, result)),
                Err(message) => Err(DispatchError::JobFailed { name, message }),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_collects_all_results() {
        let dispatcher = ThreadPoolDispatcher::new(|_: &str, x: u64| Ok::<_, String>(x * x));
        let jobs: Vec<(String, u64)> = (0..32).map(|i| (format!("job_{i}"), i)).collect();
        let results = dispatcher.run_batch(jobs).unwrap();
        assert_eq!(results.len(), 32);
        assert_eq!(results["job_7"], 49);
    }

    #[test]
    fn test_pool_failure_fails_batch() {
        let dispatcher = ThreadPoolDispatcher::new(|name: &str, _: ()| -> Result<(), String> {
            if name == "job_3" {
                Err("timeout".into())
            } else {
                Ok(())
            }
        });
        let jobs: Vec<(String, ())> = (0..8).map(|i| (format!("job_{i}"), ())).collect();
        assert!(matches!(
            dispatcher.run_batch(jobs),
            Err(DispatchError::JobFailed { .. })
        ));
    }
}
