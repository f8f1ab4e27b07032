use crate::cinfo;
use crate::crossover::crossover;
use crate::error::{GaError, Result};
use crate::fitness::{evaluate_fitness, FitnessParams};
use crate::geometry::Position;
use crate::mutation::mutate;
use crate::param::Param;
use crate::population::Population;
use crate::replacement::replace;
use crate::selection::select;
use crate::utils::{display_generation, display_generation_legend};
use chrono::Local;
use log::{debug, info};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::time::Instant;

/// Why the evolutionary loop stopped
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Termination {
    Stagnation,
    MaxGenerations,
}

/// Outcome of one run, with per-generation trajectories
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct RunResult {
    pub best_fitness: f64,
    pub best_layout: Vec<Position>,
    pub best_generation: usize,
    pub per_generation_max_fitness: Vec<f64>,
    pub per_generation_mean_fitness: Vec<f64>,
    pub per_generation_best_layout: Vec<Vec<Position>>,
    pub termination: Termination,
    pub generations: usize,
    pub timestamp: String,
    pub execution_time: f64,
    pub version: String,
}

/// Best-so-far fitness and the number of generations since it last improved
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StagnationTracker {
    pub best_fitness: Option<f64>,
    pub best_generation: usize,
    pub stagnation: usize,
}

impl StagnationTracker {
    pub fn new() -> StagnationTracker {
        StagnationTracker::default()
    }

    /// Records a generation's max fitness; true when it strictly improves the global best
    pub fn observe(&mut self, max_fitness: f64, generation: usize) -> bool {
        match self.best_fitness {
            Some(best) if max_fitness <= best || max_fitness.is_nan() => {
                self.stagnation += 1;
                false
            }
            _ => {
                self.best_fitness = Some(max_fitness);
                self.best_generation = generation;
                self.stagnation = 0;
                true
            }
        }
    }

    pub fn should_stop(&self, max_stagnation: usize) -> bool {
        self.stagnation >= max_stagnation
    }
}

/// Runs the genetic algorithm on a validated `Param`
pub fn ga(param: &Param) -> Result<RunResult> {
    let time = Instant::now();
    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S").to_string();

    let fitness_params = FitnessParams::from_param(param)?;
    let mut rng = ChaCha8Rng::seed_from_u64(param.general.seed);

    let base_pop = generate_pop(param, fitness_params.num_bits, &mut rng)?;
    info!(
        "Population size: {}, {} turbines, {} bits per coordinate",
        base_pop.len(),
        param.farm.n_turbines,
        fitness_params.num_bits
    );

    cinfo!(param.general.display_colorful, "{}", display_generation_legend());
    let mut result = iterative_evolution(&base_pop, &fitness_params, param, &mut rng)?;

    result.timestamp = timestamp;
    result.execution_time = time.elapsed().as_secs_f64();
    info!(
        "Genetic algorithm computed {} generations in {:.2?} ({:?})",
        result.generations,
        time.elapsed(),
        result.termination
    );

    Ok(result)
}

/// Draws the first generation with the configured initialization strategy
pub fn generate_pop(param: &Param, num_bits: u32, rng: &mut ChaCha8Rng) -> Result<Population> {
    let generator = param
        .ga
        .initialization
        .generator(&param.farm, num_bits, param.ga.max_attempts);

    let mut pop = Population::new();
    debug!("generating {:?}...", param.ga.initialization);
    pop.generate(param.ga.population_size, param.farm.n_turbines, generator.as_ref(), rng)?;
    pop.check_shape(param.farm.n_turbines, num_bits)?;
    Ok(pop)
}

/// Evolves `base_pop` until stagnation or the generation limit.
/// Timestamp and execution time of the returned result are left to the caller.
pub fn iterative_evolution(
    base_pop: &Population,
    fitness_params: &FitnessParams,
    param: &Param,
    rng: &mut ChaCha8Rng,
) -> Result<RunResult> {
    if base_pop.is_empty() {
        return Err(GaError::Config("Cannot evolve an empty population".to_string()));
    }
    let num_bits = fitness_params.num_bits;

    let mut tracker = StagnationTracker::new();
    let mut best_layout: Vec<Position> = Vec::new();
    let mut per_generation_max_fitness = Vec::new();
    let mut per_generation_mean_fitness = Vec::new();
    let mut per_generation_best_layout = Vec::new();

    let mut pop = base_pop.clone();
    let mut generation: usize = 0;

    let termination = loop {
        let fitness_values = evaluate_fitness(&pop, fitness_params);
        let max_fitness = Statistics::max(fitness_values.iter());
        let mean_fitness = Statistics::mean(fitness_values.iter());

        let generation_best = pop.individuals[best_index(&fitness_values)].decode(num_bits);
        let improved = tracker.observe(max_fitness, generation);
        if improved {
            best_layout = generation_best.clone();
            debug!("New best fitness {} at generation {}", max_fitness, generation);
        }

        per_generation_max_fitness.push(max_fitness);
        per_generation_mean_fitness.push(mean_fitness);
        per_generation_best_layout.push(generation_best);

        cinfo!(
            param.general.display_colorful,
            "{}",
            display_generation(
                generation,
                max_fitness,
                mean_fitness,
                tracker.stagnation,
                param.ga.max_stagnation,
                improved
            )
        );

        // Stop criteria
        if tracker.should_stop(param.ga.max_stagnation) {
            info!("No improvement for {} generations", tracker.stagnation);
            break Termination::Stagnation;
        }
        if generation + 1 >= param.ga.max_generations {
            info!("Reach max generation");
            break Termination::MaxGenerations;
        }

        pop = evolve(&pop, &fitness_values, fitness_params, param, rng);
        generation += 1;
    };

    Ok(RunResult {
        best_fitness: tracker.best_fitness.unwrap_or(f64::NEG_INFINITY),
        best_layout,
        best_generation: tracker.best_generation,
        per_generation_max_fitness,
        per_generation_mean_fitness,
        per_generation_best_layout,
        termination,
        generations: generation + 1,
        timestamp: String::new(),
        execution_time: 0.0,
        version: version(),
    })
}

/// One generation: selection, crossover, mutation, replacement
pub fn evolve(
    pop: &Population,
    fitness_values: &[f64],
    fitness_params: &FitnessParams,
    param: &Param,
    rng: &mut ChaCha8Rng,
) -> Population {
    let ga = &param.ga;

    let parents = select(pop, fitness_values, ga.selection, ga.tournament_size, rng);
    debug!("{} parents selected", parents.len());

    let children = crossover(&parents, ga.crossover, fitness_params.num_bits, rng);
    let children = mutate(&children, ga.mutation_rate, ga.mutation, rng);
    debug!("{} children created", children.len());

    replace(
        pop,
        &children,
        fitness_values,
        fitness_params,
        ga.replacement,
        ga.tournament_size,
        ga.num_elites,
        rng,
    )
}

/// First index holding the highest fitness
fn best_index(fitness_values: &[f64]) -> usize {
    let mut best = 0;
    for (i, fitness) in fitness_values.iter().enumerate() {
        if *fitness > fitness_values[best] {
            best = i;
        }
    }
    best
}

fn version() -> String {
    match option_env!("WINDGA_GIT_SHA") {
        Some(sha) => format!("{}#{}", env!("CARGO_PKG_VERSION"), sha),
        None => env!("CARGO_PKG_VERSION").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::is_layout_valid;
    use crate::layout::InitStrategy;

    fn create_test_param() -> Param {
        let mut param = Param::default();
        param.general.display_colorful = false;
        param.farm.n_turbines = 4;
        param.farm.area_size = 100;
        param.farm.min_spacing = 20.0;
        param.ga.population_size = 20;
        param.ga.max_generations = 15;
        param.ga.max_stagnation = 15;
        param.ga.mutation_rate = 0.1;
        param
    }

    #[test]
    fn test_tracker_scenario() {
        let mut tracker = StagnationTracker::new();
        assert!(tracker.observe(1.0, 0), "First generation always sets the best");
        assert!(!tracker.observe(1.0, 1), "Equal fitness is not an improvement");
        assert!(!tracker.observe(0.5, 2));
        assert!(!tracker.should_stop(3));
        assert!(!tracker.observe(1.0, 3));
        assert!(tracker.should_stop(3), "Third generation without improvement stops the run");

        assert!(tracker.observe(2.0, 4));
        assert_eq!(tracker.stagnation, 0);
        assert_eq!(tracker.best_generation, 4);
        assert_eq!(tracker.best_fitness, Some(2.0));
    }

    #[test]
    fn test_tracker_first_observation_accepts_negative_infinity() {
        let mut tracker = StagnationTracker::new();
        assert!(tracker.observe(f64::NEG_INFINITY, 0));
        assert!(tracker.observe(-1e9, 1));
    }

    #[test]
    fn test_best_index_prefers_first() {
        assert_eq!(best_index(&[1.0, 5.0, 3.0, 5.0]), 1);
        assert_eq!(best_index(&[f64::NEG_INFINITY, f64::NEG_INFINITY]), 0);
    }

    #[test]
    fn test_generate_pop() {
        let param = create_test_param();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let pop = generate_pop(&param, 7, &mut rng).unwrap();
        assert_eq!(pop.len(), 20);
        assert!(pop.check_shape(4, 7).is_ok());
    }

    #[test]
    fn test_constrained_pop_respects_spacing() {
        let mut param = create_test_param();
        param.ga.initialization = InitStrategy::Constrained;
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let pop = generate_pop(&param, 7, &mut rng).unwrap();
        for positions in pop.decode(7) {
            assert!(is_layout_valid(&positions, 100, 20.0));
        }
    }

    #[test]
    fn test_ga_trajectories() {
        let param = create_test_param();
        let result = ga(&param).unwrap();

        assert_eq!(result.per_generation_max_fitness.len(), result.generations);
        assert_eq!(result.per_generation_mean_fitness.len(), result.generations);
        assert_eq!(result.per_generation_best_layout.len(), result.generations);
        assert!(result.generations <= 15);
        assert_eq!(result.best_layout.len(), 4);

        for (max, mean) in result
            .per_generation_max_fitness
            .iter()
            .zip(result.per_generation_mean_fitness.iter())
        {
            assert!(max >= mean, "Max fitness {} below mean {}", max, mean);
        }
        assert_eq!(
            result.per_generation_max_fitness[result.best_generation],
            result.best_fitness
        );
        assert_eq!(
            result.per_generation_best_layout[result.best_generation],
            result.best_layout
        );
    }

    #[test]
    fn test_steady_state_never_loses_the_best() {
        let param = create_test_param();
        let result = ga(&param).unwrap();
        for pair in result.per_generation_max_fitness.windows(2) {
            assert!(pair[1] >= pair[0], "Steady-state max fitness went down: {:?}", pair);
        }
    }

    #[test]
    fn test_stagnation_stops_early() {
        let mut param = create_test_param();
        // A single turbine anywhere in the area scores the same: no generation can improve
        param.farm.n_turbines = 1;
        param.ga.max_generations = 50;
        param.ga.max_stagnation = 3;

        let result = ga(&param).unwrap();
        assert_eq!(result.termination, Termination::Stagnation);
        assert_eq!(result.generations, 4, "Generation 0 sets the best, generations 1 to 3 stagnate");
        assert_eq!(result.best_generation, 0);
    }

    #[test]
    fn test_max_generations_of_one() {
        let mut param = create_test_param();
        param.ga.max_generations = 1;
        let result = ga(&param).unwrap();
        assert_eq!(result.generations, 1);
        assert_eq!(result.termination, Termination::MaxGenerations);
    }

    #[test]
    fn test_empty_population_is_rejected() {
        let param = create_test_param();
        let fitness_params = FitnessParams::from_param(&param).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        assert!(matches!(
            iterative_evolution(&Population::new(), &fitness_params, &param, &mut rng),
            Err(GaError::Config(_))
        ));
    }
}
