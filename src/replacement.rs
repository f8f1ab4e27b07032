use crate::fitness::{evaluate_fitness, FitnessParams};
use crate::population::Population;
use crate::selection::{roulette_wheel_select, tournament_winner};
use log::debug;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Survivor selection between the current population and its offspring
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReplacementMethod {
    /// Best `N` of parents and offspring together
    SteadyState,
    /// First `N` offspring
    Generational,
    /// Best `num_elites` parents, then the first offspring
    Elitism,
    /// `N` tournaments over parents and offspring together
    Tournament,
    /// `N` draws over parents and offspring weighted by `1 / (rank + 1)`
    RankBased,
}

/// Builds the next population, always of the same length as `population`.
/// `fitness_values` are the scores of `population`; offspring are scored here.
#[allow(clippy::too_many_arguments)]
pub fn replace(
    population: &Population,
    offspring: &Population,
    fitness_values: &[f64],
    fitness_params: &FitnessParams,
    method: ReplacementMethod,
    tournament_size: usize,
    num_elites: usize,
    rng: &mut ChaCha8Rng,
) -> Population {
    let n = population.len();
    let next = match method {
        ReplacementMethod::SteadyState => {
            let (combined, combined_fitness) =
                combine(population, offspring, fitness_values, fitness_params);
            truncate_best(&combined, &combined_fitness, n)
        }
        ReplacementMethod::Generational => {
            let mut next = Population {
                individuals: offspring.individuals.iter().take(n).cloned().collect(),
            };
            top_up(&mut next, population, fitness_values, n);
            next
        }
        ReplacementMethod::Elitism => {
            let mut next = truncate_best(population, fitness_values, num_elites.min(n));
            next.individuals
                .extend(offspring.individuals.iter().take(n - next.len()).cloned());
            top_up(&mut next, population, fitness_values, n);
            next
        }
        ReplacementMethod::Tournament => {
            let (combined, combined_fitness) =
                combine(population, offspring, fitness_values, fitness_params);
            if combined.is_empty() {
                return Population::new();
            }
            let contestants = tournament_size.clamp(1, combined.len());
            Population {
                individuals: (0..n)
                    .map(|_| {
                        combined.individuals[tournament_winner(&combined_fitness, contestants, rng)]
                            .clone()
                    })
                    .collect(),
            }
        }
        ReplacementMethod::RankBased => {
            let (combined, combined_fitness) =
                combine(population, offspring, fitness_values, fitness_params);
            let order = ranking(&combined_fitness);
            let weights: Vec<f64> = (0..order.len()).map(|rank| 1.0 / (rank as f64 + 1.0)).collect();
            let total: f64 = weights.iter().sum();
            let probabilities: Vec<f64> = weights.iter().map(|w| w / total).collect();
            Population {
                individuals: (0..n)
                    .map(|_| {
                        let rank = roulette_wheel_select(&probabilities, rng);
                        combined.individuals[order[rank]].clone()
                    })
                    .collect(),
            }
        }
    };

    debug!(
        "{:?} replacement: {} parents + {} offspring -> {}",
        method,
        population.len(),
        offspring.len(),
        next.len()
    );
    next
}

/// Indices sorted by descending fitness; equal scores keep their input order
pub fn ranking(fitness_values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..fitness_values.len()).collect();
    order.sort_by(|&a, &b| fitness_values[b].total_cmp(&fitness_values[a]));
    order
}

/// Parents followed by offspring, with the offspring freshly scored
fn combine(
    population: &Population,
    offspring: &Population,
    fitness_values: &[f64],
    fitness_params: &FitnessParams,
) -> (Population, Vec<f64>) {
    let mut combined_fitness = fitness_values.to_vec();
    combined_fitness.extend(evaluate_fitness(offspring, fitness_params));

    let mut combined = population.clone();
    combined.add(offspring.clone());
    (combined, combined_fitness)
}

fn truncate_best(population: &Population, fitness_values: &[f64], keep: usize) -> Population {
    Population {
        individuals: ranking(fitness_values)
            .into_iter()
            .take(keep)
            .map(|i| population.individuals[i].clone())
            .collect(),
    }
}

/// Fills `next` up to `n` with the best parents when offspring ran short
fn top_up(next: &mut Population, population: &Population, fitness_values: &[f64], n: usize) {
    if next.len() < n {
        let missing = n - next.len();
        next.add(truncate_best(population, fitness_values, missing));
    }
}
