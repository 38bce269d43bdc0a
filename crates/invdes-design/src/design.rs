//! The design-space driver: parameters plus a method, run against a local
//! function or a batch dispatcher.

use std::fmt::Display;

use invdes_compute::{dispatch_ordered, BatchDispatcher, TaskNamer};

use crate::error::DesignError;
use crate::method::{Evaluator, Method, SweepMethod};
use crate::parameter::{validate_parameters, Arguments, Parameter};
use crate::result::SamplingResult;

/// A validated set of parameters and the method that explores them.
#[derive(Debug)]
pub struct DesignSpace {
    parameters: Vec<Parameter>,
    method: Method,
    name: Option<String>,
    task_name: String,
}

impl DesignSpace {
    pub fn new(parameters: Vec<Parameter>, method: Method) -> Result<Self, DesignError> {
        validate_parameters(&parameters)?;
        method.validate(&parameters)?;
        Ok(Self {
            parameters,
            method,
            name: None,
            task_name: "design".to_string(),
        })
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Prefix for the names of dispatched tasks.
    pub fn with_task_name(mut self, task_name: impl Into<String>) -> Self {
        self.task_name = task_name.into();
        self
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn task_name(&self) -> &str {
        &self.task_name
    }

    pub fn dims(&self) -> Vec<String> {
        self.parameters.iter().map(|p| p.name().to_string()).collect()
    }

    /// Evaluate `f` sequentially in the calling thread. The first failure
    /// aborts the sweep.
    pub fn run<F, E>(&self, f: F) -> Result<SamplingResult, DesignError>
    where
        F: FnMut(&Arguments) -> Result<f64, E>,
        E: Display,
    {
        log::info!(
            "Running {} sweep over {} parameter(s)",
            self.method.name(),
            self.parameters.len()
        );
        let mut evaluator = LocalEvaluator { f };
        let samples = self.method.run(&self.parameters, &mut evaluator)?;
        Ok(SamplingResult {
            dims: self.dims(),
            samples,
            task_ids: None,
        })
    }

    /// Evaluate through a batch dispatcher: `pre` turns arguments into a job,
    /// the dispatcher runs each batch behind a barrier, and `post` reduces
    /// every job result to a value. Task names are recorded per sample.
    ///
    /// Each argument set becomes exactly one job; bundle several simulations
    /// into `J` when a point needs more than one.
    pub fn run_batch<J, R, D, Pre, Post>(
        &self,
        pre: Pre,
        dispatcher: &D,
        post: Post,
    ) -> Result<SamplingResult, DesignError>
    where
        D: BatchDispatcher<J, R> + ?Sized,
        Pre: FnMut(&Arguments) -> Result<J, String>,
        Post: FnMut(R) -> Result<f64, String>,
    {
        log::info!(
            "Running {} sweep over {} parameter(s) via batch dispatch",
            self.method.name(),
            self.parameters.len()
        );
        let mut evaluator = BatchEvaluator {
            pre,
            post,
            dispatcher,
            namer: TaskNamer::new(self.task_name.clone()),
            task_ids: Vec::new(),
            _marker: std::marker::PhantomData,
        };
        let samples = self.method.run(&self.parameters, &mut evaluator)?;
        Ok(SamplingResult {
            dims: self.dims(),
            samples,
            task_ids: Some(evaluator.task_ids),
        })
    }
}

struct LocalEvaluator<F> {
    f: F,
}

impl<F, E> Evaluator for LocalEvaluator<F>
where
    F: FnMut(&Arguments) -> Result<f64, E>,
    E: Display,
{
    fn evaluate(&mut self, batch: &[Arguments]) -> Result<Vec<f64>, DesignError> {
        batch
            .iter()
            .map(|args| (self.f)(args).map_err(|e| DesignError::Evaluation(format!("at {args}: {e}"))))
            .collect()
    }
}

struct BatchEvaluator<'d, J, R, D: ?Sized, Pre, Post> {
    pre: Pre,
    post: Post,
    dispatcher: &'d D,
    namer: TaskNamer,
    task_ids: Vec<String>,
    _marker: std::marker::PhantomData<fn(J) -> R>,
}

impl<J, R, D, Pre, Post> Evaluator for BatchEvaluator<'_, J, R, D, Pre, Post>
where
    D: BatchDispatcher<J, R> + ?Sized,
    Pre: FnMut(&Arguments) -> Result<J, String>,
    Post: FnMut(R) -> Result<f64, String>,
{
    fn evaluate(&mut self, batch: &[Arguments]) -> Result<Vec<f64>, DesignError> {
        let mut jobs = Vec::with_capacity(batch.len());
        for args in batch {
            let job = (self.pre)(args).map_err(|e| DesignError::Evaluation(format!("preparing {args}: {e}")))?;
            jobs.push((self.namer.next_name(), job));
        }
        let names: Vec<String> = jobs.iter().map(|(name, _)| name.clone()).collect();

        let results = dispatch_ordered(self.dispatcher, jobs)?;
        let values = results
            .into_iter()
            .zip(&names)
            .map(|(r, name)| (self.post)(r).map_err(|e| DesignError::Evaluation(format!("task {name}: {e}"))))
            .collect::<Result<Vec<_>, _>>()?;
        self.task_ids.extend(names);
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::{MethodBayOpt, MethodGrid};
    use crate::parameter::{ParamValue, ParameterAny, ParameterInt};

    #[test]
    fn test_new_validates_method_against_parameters() {
        let params = vec![Parameter::Any(ParameterAny::new("m", vec![ParamValue::Int(1)]))];
        let err = DesignSpace::new(params, Method::Bayesian(MethodBayOpt::new(2, 2))).unwrap_err();
        assert!(matches!(err, DesignError::Unsupported { .. }));
    }

    #[test]
    fn test_run_reports_failing_arguments() {
        let params = vec![Parameter::Int(ParameterInt::new("n", (0, 3)))];
        let space = DesignSpace::new(params, Method::Grid(MethodGrid::default())).unwrap();
        let err = space
            .run(|a| if a.int("n") == Some(2) { Err("boom") } else { Ok(1.0) })
            .unwrap_err();
        assert_eq!(err.to_string(), "Evaluation failed: at n=2: boom");
    }
}
