//! Genetic algorithm over numeric parameters.
//!
//! Steady-state selection keeps the fittest `num_parents_mating` solutions;
//! the rest of each generation is refilled with single-point crossover
//! children whose genes are randomly reset with `mutation_probability`.
//! Fitness is the evaluation result and is maximised.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use super::random::default_seed;
use super::{evaluate_batch, numeric_bounds, Evaluator, SweepMethod};
use crate::error::DesignError;
use crate::parameter::{Arguments, Parameter};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodGenAlg {
    #[serde(default = "default_population")]
    pub solutions_per_population: usize,
    #[serde(default = "default_generations")]
    pub num_generations: usize,
    #[serde(default = "default_parents")]
    pub num_parents_mating: usize,
    #[serde(default = "default_crossover")]
    pub crossover_probability: f64,
    #[serde(default = "default_mutation")]
    pub mutation_probability: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_population() -> usize {
    30
}
fn default_generations() -> usize {
    25
}
fn default_parents() -> usize {
    10
}
fn default_crossover() -> f64 {
    0.7
}
fn default_mutation() -> f64 {
    0.1
}

impl Default for MethodGenAlg {
    fn default() -> Self {
        Self {
            solutions_per_population: default_population(),
            num_generations: default_generations(),
            num_parents_mating: default_parents(),
            crossover_probability: default_crossover(),
            mutation_probability: default_mutation(),
            seed: default_seed(),
        }
    }
}

/// Gene domain of one parameter.
#[derive(Debug, Clone, Copy)]
enum Gene {
    Float(f64, f64),
    Int(i64, i64),
}

impl Gene {
    fn random(self, rng: &mut StdRng) -> f64 {
        match self {
            Gene::Float(lo, hi) if hi > lo => rng.gen_range(lo..=hi),
            Gene::Float(lo, _) => lo,
            Gene::Int(lo, hi) => rng.gen_range(lo..=hi) as f64,
        }
    }
}

impl MethodGenAlg {
    fn genes(&self, parameters: &[Parameter]) -> Result<Vec<Gene>, DesignError> {
        numeric_bounds(self.name(), parameters)?;
        Ok(parameters
            .iter()
            .filter_map(|p| match p {
                Parameter::Float(f) => Some(Gene::Float(f.span.0, f.span.1)),
                Parameter::Int(i) => Some(Gene::Int(i.span.0, i.span.1)),
                Parameter::Any(_) => None,
            })
            .collect())
    }

    fn breed(&self, parents: &[&Vec<f64>], count: usize, genes: &[Gene], rng: &mut StdRng) -> Vec<Vec<f64>> {
        let n_genes = genes.len();
        (0..count)
            .map(|k| {
                let first = parents[k % parents.len()];
                let second = parents[(k + 1) % parents.len()];
                let mut child = first.clone();
                if n_genes > 1 && rng.gen::<f64>() < self.crossover_probability {
                    let point = rng.gen_range(1..n_genes);
                    child[point..].copy_from_slice(&second[point..]);
                }
                for (value, gene) in child.iter_mut().zip(genes) {
                    if rng.gen::<f64>() < self.mutation_probability {
                        *value = gene.random(rng);
                    }
                }
                child
            })
            .collect()
    }
}

fn to_arguments(parameters: &[Parameter], solution: &[f64]) -> Arguments {
    let mut args = Arguments::new();
    for (parameter, &value) in parameters.iter().zip(solution) {
        if let Some(v) = parameter.from_numeric(value) {
            args.push(parameter.name(), v);
        }
    }
    args
}

/// Fitness order, best first; NaN ranks last.
fn rank(fitness: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..fitness.len()).collect();
    order.sort_by(|&a, &b| {
        let (fa, fb) = (fitness[a], fitness[b]);
        match (fa.is_nan(), fb.is_nan()) {
            (true, true) => std::cmp::Ordering::Equal,
            (true, false) => std::cmp::Ordering::Greater,
            (false, true) => std::cmp::Ordering::Less,
            (false, false) => fb.total_cmp(&fa),
        }
    });
    order
}

impl SweepMethod for MethodGenAlg {
    fn name(&self) -> &'static str {
        "genetic"
    }

    fn validate(&self, parameters: &[Parameter]) -> Result<(), DesignError> {
        numeric_bounds(self.name(), parameters)?;
        if self.solutions_per_population == 0 {
            return Err(DesignError::InvalidMethod("solutions_per_population must be positive".into()));
        }
        if self.num_parents_mating == 0 || self.num_parents_mating > self.solutions_per_population {
            return Err(DesignError::InvalidMethod(format!(
                "num_parents_mating must lie in 1..={}",
                self.solutions_per_population
            )));
        }
        for (name, p) in [
            ("crossover_probability", self.crossover_probability),
            ("mutation_probability", self.mutation_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(DesignError::InvalidMethod(format!("{name} must lie in [0, 1]")));
            }
        }
        Ok(())
    }

    fn run(
        &self,
        parameters: &[Parameter],
        evaluator: &mut dyn Evaluator,
    ) -> Result<Vec<(Arguments, f64)>, DesignError> {
        self.validate(parameters)?;
        let genes = self.genes(parameters)?;
        let mut rng = StdRng::seed_from_u64(self.seed);

        let mut population: Vec<Vec<f64>> = (0..self.solutions_per_population)
            .map(|_| genes.iter().map(|g| g.random(&mut rng)).collect())
            .collect();
        let batch = population.iter().map(|s| to_arguments(parameters, s)).collect();
        let mut out = evaluate_batch(evaluator, batch)?;
        let mut fitness: Vec<f64> = out.iter().map(|(_, y)| *y).collect();

        for generation in 1..=self.num_generations {
            let order = rank(&fitness);
            let parent_idx = &order[..self.num_parents_mating];
            let parents: Vec<&Vec<f64>> = parent_idx.iter().map(|&i| &population[i]).collect();
            let offspring = self.breed(
                &parents,
                self.solutions_per_population - self.num_parents_mating,
                &genes,
                &mut rng,
            );

            let batch = offspring.iter().map(|s| to_arguments(parameters, s)).collect();
            let evaluated = evaluate_batch(evaluator, batch)?;

            let mut next_population: Vec<Vec<f64>> = parent_idx.iter().map(|&i| population[i].clone()).collect();
            let mut next_fitness: Vec<f64> = parent_idx.iter().map(|&i| fitness[i]).collect();
            next_population.extend(offspring);
            next_fitness.extend(evaluated.iter().map(|(_, y)| *y));
            out.extend(evaluated);

            population = next_population;
            fitness = next_fitness;
            let best = fitness.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            log::info!("Generation {generation}: best fitness = {best:.3}");
        }
        Ok(out)
    }
}
