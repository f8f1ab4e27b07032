use crate::population::Population;
use rand::seq::index::sample;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Parent sampling strategy
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMethod {
    /// Fitness-proportional roulette wheel
    Roulette,
    /// Best of `tournament_size` distinct random contestants
    Tournament,
}

/// Draws `population.len()` parents with replacement
pub fn select(
    population: &Population,
    fitness_values: &[f64],
    method: SelectionMethod,
    tournament_size: usize,
    rng: &mut ChaCha8Rng,
) -> Population {
    match method {
        SelectionMethod::Roulette => roulette_selection(population, fitness_values, rng),
        SelectionMethod::Tournament => {
            tournament_selection(population, fitness_values, tournament_size, rng)
        }
    }
}

/// Fitness-proportional probabilities; non-positive or NaN fitness weighs nothing,
/// `+inf` outweighs every finite fitness, and an all-zero wheel falls back to uniform
pub fn selection_probabilities(fitness_values: &[f64]) -> Vec<f64> {
    let weights: Vec<f64> = fitness_values
        .iter()
        .map(|&f| if f > 0.0 { f } else { 0.0 })
        .collect();
    let max_weight = weights.iter().cloned().fold(0.0, f64::max);

    if max_weight == 0.0 {
        let n = fitness_values.len() as f64;
        return vec![1.0 / n; fitness_values.len()];
    }

    // Scaled to (0, 1] so the sum cannot overflow
    let scaled: Vec<f64> = if max_weight.is_infinite() {
        weights
            .iter()
            .map(|&w| if w.is_infinite() { 1.0 } else { 0.0 })
            .collect()
    } else {
        weights.iter().map(|w| w / max_weight).collect()
    };
    let total: f64 = scaled.iter().sum();
    scaled.iter().map(|w| w / total).collect()
}

/// Spins the wheel once and returns the chosen index
pub fn roulette_wheel_select(probabilities: &[f64], rng: &mut ChaCha8Rng) -> usize {
    let spin: f64 = rng.gen();
    let mut cumulative_probability = 0.0;
    for (i, probability) in probabilities.iter().enumerate() {
        cumulative_probability += probability;
        if spin < cumulative_probability {
            return i;
        }
    }
    // Rounding left the cumulative sum short of the spin
    probabilities
        .iter()
        .rposition(|&p| p > 0.0)
        .unwrap_or(probabilities.len() - 1)
}

pub fn roulette_selection(
    population: &Population,
    fitness_values: &[f64],
    rng: &mut ChaCha8Rng,
) -> Population {
    let probabilities = selection_probabilities(fitness_values);
    Population {
        individuals: (0..population.len())
            .map(|_| population.individuals[roulette_wheel_select(&probabilities, rng)].clone())
            .collect(),
    }
}

pub fn tournament_selection(
    population: &Population,
    fitness_values: &[f64],
    tournament_size: usize,
    rng: &mut ChaCha8Rng,
) -> Population {
    if population.is_empty() {
        return Population::new();
    }
    let contestants = tournament_size.clamp(1, population.len());
    Population {
        individuals: (0..population.len())
            .map(|_| {
                let winner = tournament_winner(fitness_values, contestants, rng);
                population.individuals[winner].clone()
            })
            .collect(),
    }
}

/// Index of the fittest of `tournament_size` distinct indices drawn from `fitness_values`;
/// ties go to the lowest index
pub fn tournament_winner(fitness_values: &[f64], tournament_size: usize, rng: &mut ChaCha8Rng) -> usize {
    let mut best: Option<usize> = None;
    for idx in sample(rng, fitness_values.len(), tournament_size).iter() {
        best = match best {
            Some(b)
                if fitness_values[b] > fitness_values[idx]
                    || (fitness_values[b] == fitness_values[idx] && b < idx)
                    || fitness_values[idx].is_nan() =>
            {
                Some(b)
            }
            _ => Some(idx),
        };
    }
    best.unwrap_or(0)
}
