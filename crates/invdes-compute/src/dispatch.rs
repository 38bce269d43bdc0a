//! The batch dispatch contract.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

/// Errors raised while running a batch of jobs.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Job '{name}' failed: {message}")]
    JobFailed { name: String, message: String },

    #[error("Dispatcher returned no result for job '{0}'")]
    MissingResult(String),

    #[error("Job name '{0}' submitted more than once")]
    DuplicateName(String),
}

/// Executes a named batch of independent jobs and blocks until all of them
/// complete.
///
/// Implementations may run jobs in any order and in parallel, but must key
/// every result by the name it was submitted under. Any failing job fails the
/// whole batch; partial results are never returned.
pub trait BatchDispatcher<J, R> {
    /// Run every job in `jobs` and return the results keyed by job name.
    fn run_batch(&self, jobs: Vec<(String, J)>) -> Result<HashMap<String, R>, DispatchError>;
}

impl<J, R, D: BatchDispatcher<J, R> + ?Sized> BatchDispatcher<J, R> for &D {
    fn run_batch(&self, jobs: Vec<(String, J)>) -> Result<HashMap<String, R>, DispatchError> {
        (**self).run_batch(jobs)
    }
}

/// Run `jobs` through `dispatcher` and return results in submission order.
///
/// Rejects duplicate job names before anything is dispatched, and fails if the
/// dispatcher drops the result of any submitted job.
pub fn dispatch_ordered<J, R, D>(dispatcher: &D, jobs: Vec<(String, J)>) -> Result<Vec<R>, DispatchError>
where
    D: BatchDispatcher<J, R> + ?Sized,
{
    let mut seen = HashSet::with_capacity(jobs.len());
    for (name, _) in &jobs {
        if !seen.insert(name.as_str()) {
            return Err(DispatchError::DuplicateName(name.clone()));
        }
    }

    let names: Vec<String> = jobs.iter().map(|(name, _)| name.clone()).collect();
    log::debug!("Dispatching batch of {} job(s): {}", names.len(), names.join(", "));

    let mut results = dispatcher.run_batch(jobs)?;
    names
        .into_iter()
        .map(|name| results.remove(&name).ok_or(DispatchError::MissingResult(name)))
        .collect()
}
