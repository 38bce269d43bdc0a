//! Integration tests for design-space sweeps.
//!
//! Tests:
//! - Grid sweeps evaluate every combination exactly once
//! - Integer parameters are rounded then clamped before evaluation
//! - Seeded methods are reproducible through the driver
//! - Batch sweeps keep results aligned with arguments and record task ids
//! - Any evaluation failure aborts the sweep

use std::cell::Cell;
use std::collections::{HashMap, HashSet};

use approx::assert_relative_eq;
use invdes_compute::{BatchDispatcher, DispatchError, LocalDispatcher, ThreadPoolDispatcher};
use invdes_design::{
    Arguments, DesignError, DesignSpace, Method, MethodBayOpt, MethodGenAlg, MethodGrid, MethodMonteCarlo,
    MethodRandomCustom, ParamValue, Parameter, ParameterAny, ParameterFloat, ParameterInt, UnitSampler,
};
use ndarray::Array2;

fn f(args: &Arguments) -> Result<f64, String> {
    let x = args.float("x").ok_or("missing x")?;
    let n = args.float("n").ok_or("missing n")?;
    Ok(-(x - 0.3).powi(2) - 0.1 * (n - 2.0).powi(2))
}

fn numeric_params() -> Vec<Parameter> {
    vec![
        Parameter::Float(ParameterFloat::new("x", (-1.0, 1.0))),
        Parameter::Int(ParameterInt::new("n", (0, 5))),
    ]
}

/// Emits the same rows on every call, cycling through them.
struct RowSampler(Vec<Vec<f64>>);

impl UnitSampler for RowSampler {
    fn random(&self, n: usize) -> Array2<f64> {
        let d = self.0[0].len();
        Array2::from_shape_fn((n, d), |(i, j)| self.0[i % self.0.len()][j])
    }
}

/// Completes jobs in reverse submission order.
struct ReversingDispatcher;

impl BatchDispatcher<f64, f64> for ReversingDispatcher {
    fn run_batch(&self, jobs: Vec<(String, f64)>) -> Result<HashMap<String, f64>, DispatchError> {
        Ok(jobs.into_iter().rev().map(|(name, x)| (name, 10.0 * x)).collect())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Grid
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_grid_covers_cartesian_product_once() {
    let params = vec![
        Parameter::Int(ParameterInt::new("a", (1, 2))),
        Parameter::Float(ParameterFloat::new("b", (0.0, 1.0)).with_num_points(3)),
        Parameter::Any(ParameterAny::new(
            "c",
            (0..4).map(|i| ParamValue::Text(format!("m{i}"))).collect(),
        )),
    ];
    let space = DesignSpace::new(params, Method::Grid(MethodGrid::default())).unwrap();
    let result = space.run(|_: &Arguments| Ok::<_, String>(0.0)).unwrap();

    assert_eq!(result.len(), 2 * 3 * 4);
    assert_eq!(result.dims, vec!["a", "b", "c"]);
    let distinct: HashSet<String> = result.samples.iter().map(|(args, _)| args.to_string()).collect();
    assert_eq!(distinct.len(), result.len());
    assert!(result.task_ids.is_none());
}

// ─────────────────────────────────────────────────────────────────────────────
// Integer handling and reproducibility
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_integer_values_rounded_and_clamped() {
    // n = -0.5 + 6u: 2.6 rounds to 3, -0.5 clamps to 0, 5.5 clamps to 5
    let sampler = RowSampler(vec![vec![0.5, 3.1 / 6.0], vec![0.5, 0.0], vec![0.5, 1.0]]);
    let method = MethodRandomCustom::new(3, Box::new(sampler)).unwrap();
    let space = DesignSpace::new(numeric_params(), Method::RandomCustom(method)).unwrap();

    let mut seen = Vec::new();
    space
        .run(|args: &Arguments| {
            seen.push(args.get("n").cloned());
            f(args)
        })
        .unwrap();
    assert_eq!(
        seen,
        vec![Some(ParamValue::Int(3)), Some(ParamValue::Int(0)), Some(ParamValue::Int(5))]
    );
}

#[test]
fn test_seeded_methods_reproducible() {
    let methods: [fn() -> Method; 3] = [
        || Method::MonteCarlo(MethodMonteCarlo::new(12)),
        || Method::Bayesian(MethodBayOpt::new(4, 3)),
        || {
            Method::Genetic(MethodGenAlg {
                num_generations: 2,
                ..MethodGenAlg::default()
            })
        },
    ];
    for method in methods {
        let first = DesignSpace::new(numeric_params(), method()).unwrap().run(f).unwrap();
        let second = DesignSpace::new(numeric_params(), method()).unwrap().run(f).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn test_bayesian_approaches_optimum() {
    let space = DesignSpace::new(numeric_params(), Method::Bayesian(MethodBayOpt::new(6, 20))).unwrap();
    let result = space.run(f).unwrap();
    assert_eq!(result.len(), 26);
    let (args, best) = result.best().unwrap();
    assert!(*best > -0.2, "best {best} at {args}");
}

// ─────────────────────────────────────────────────────────────────────────────
// Batch dispatch
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_batch_results_follow_submission_order() {
    let params = vec![Parameter::Float(ParameterFloat::new("x", (0.0, 1.0)).with_num_points(5))];
    let space = DesignSpace::new(params, Method::Grid(MethodGrid::default()))
        .unwrap()
        .with_task_name("sweep");

    let result = space
        .run_batch(
            |args| args.float("x").ok_or_else(|| "missing x".to_string()),
            &ReversingDispatcher,
            |y: f64| Ok(y + 1.0),
        )
        .unwrap();

    for (args, y) in &result.samples {
        assert_relative_eq!(*y, 10.0 * args.float("x").unwrap() + 1.0);
    }
    assert_eq!(
        result.task_ids.unwrap(),
        vec!["sweep_0", "sweep_1", "sweep_2", "sweep_3", "sweep_4"]
    );
}

#[test]
fn test_batch_task_ids_unique_across_generations() {
    let method = MethodGenAlg {
        solutions_per_population: 8,
        num_parents_mating: 4,
        num_generations: 3,
        ..MethodGenAlg::default()
    };
    let space = DesignSpace::new(numeric_params(), Method::Genetic(method)).unwrap();
    let dispatcher = ThreadPoolDispatcher::new(|_: &str, args: Arguments| f(&args));

    let result = space.run_batch(|args| Ok(args.clone()), &dispatcher, Ok).unwrap();
    let local = space.run(f).unwrap();
    assert_eq!(result.samples, local.samples);

    let ids = result.task_ids.unwrap();
    assert_eq!(ids.len(), 8 + 3 * 4);
    assert_eq!(ids.iter().collect::<HashSet<_>>().len(), ids.len());
    assert_eq!(ids[0], "design_0");
}

// ─────────────────────────────────────────────────────────────────────────────
// Failures
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_failed_job_aborts_sweep() {
    let params = vec![Parameter::Int(ParameterInt::new("n", (0, 9)))];
    let space = DesignSpace::new(params, Method::Grid(MethodGrid::default())).unwrap();
    let dispatcher = LocalDispatcher::new(|name: &str, n: i64| {
        if n == 4 {
            Err(format!("solver diverged in {name}"))
        } else {
            Ok(n as f64)
        }
    });

    let err = space
        .run_batch(|args| args.int("n").ok_or_else(|| "missing n".to_string()), &dispatcher, Ok)
        .unwrap_err();
    match err {
        DesignError::Dispatch(DispatchError::JobFailed { name, .. }) => assert_eq!(name, "design_4"),
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn test_local_failure_stops_evaluation() {
    let calls = Cell::new(0);
    let space = DesignSpace::new(numeric_params(), Method::MonteCarlo(MethodMonteCarlo::new(10))).unwrap();
    let err = space
        .run(|_: &Arguments| {
            calls.set(calls.get() + 1);
            if calls.get() == 3 {
                Err("mesh generation failed")
            } else {
                Ok(0.0)
            }
        })
        .unwrap_err();
    assert!(matches!(err, DesignError::Evaluation(_)));
    assert_eq!(calls.get(), 3);
}
