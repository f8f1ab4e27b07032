use crate::crossover::CrossoverMethod;
use crate::error::GaError;
use crate::fitness::InvalidPenalty;
use crate::geometry::{self, MAX_BITS};
use crate::layout::InitStrategy;
use crate::mutation::MutationMethod;
use crate::replacement::ReplacementMethod;
use crate::selection::SelectionMethod;
use log::warn;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::File;
use std::io::BufReader;

// Field definitions and associated default values

/// Complete, immutable configuration of one run
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Param {
    #[serde(default)]
    pub general: General,
    #[serde(default)]
    pub farm: Farm,
    #[serde(default)]
    pub fitness: Fitness,
    #[serde(default)]
    pub ga: GA,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct General {
    #[serde(default = "seed_default")]
    pub seed: u64,
    #[serde(default = "log_base_default")]
    pub log_base: String,
    #[serde(default = "log_suffix_default")]
    pub log_suffix: String,
    #[serde(default = "log_level_default")]
    pub log_level: String,
    #[serde(default = "true_default")]
    pub display_colorful: bool,
    #[serde(default = "empty_string")]
    pub save_result: String,
}

/// Site and turbine model
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Farm {
    #[serde(default = "n_turbines_default")]
    pub n_turbines: usize,
    #[serde(default = "area_size_default")]
    pub area_size: i64,
    #[serde(default = "min_spacing_default")]
    pub min_spacing: f64,
    #[serde(default = "wind_speed_default")]
    pub wind_speed: f64,
    /// Degrees, same angular convention as `atan2(dy, dx)`
    #[serde(default)]
    pub wind_direction: Option<f64>,
    #[serde(default = "spread_angle_default")]
    pub spread_angle: f64,
    #[serde(default = "true_default")]
    pub wake_deficit: bool,
    #[serde(default = "rated_power_default")]
    pub rated_power: f64,
    #[serde(default = "cut_in_speed_default")]
    pub cut_in_speed: f64,
    #[serde(default = "rated_speed_default")]
    pub rated_speed: f64,
    #[serde(default = "cut_out_speed_default")]
    pub cut_out_speed: f64,
    #[serde(default = "rotor_radius_default")]
    pub rotor_radius: f64,
    #[serde(default = "thrust_coefficient_default")]
    pub thrust_coefficient: f64,
    #[serde(default = "wake_decay_default")]
    pub wake_decay: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Fitness {
    #[serde(default)]
    pub weights: FitnessWeights,
    #[serde(default = "invalid_penalty_default")]
    pub invalid_penalty: InvalidPenalty,
}

/// Weight of each objective in the total fitness; unset objectives weigh nothing
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct FitnessWeights {
    #[serde(default = "energy_weight_default")]
    pub energy_production: f64,
    #[serde(default = "constraint_weight_default")]
    pub boundary_fitness: f64,
    #[serde(default = "constraint_weight_default")]
    pub spacing_fitness: f64,
    #[serde(default = "zero_default")]
    pub wake_fitness: f64,
    #[serde(default = "zero_default")]
    pub is_valid: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GA {
    #[serde(default = "pop_size_default")]
    pub population_size: usize,
    #[serde(default = "mutation_rate_default")]
    pub mutation_rate: f64,
    #[serde(default = "max_generations_default")]
    pub max_generations: usize,
    #[serde(default = "max_stagnation_default")]
    pub max_stagnation: usize,
    #[serde(default = "initialization_default")]
    pub initialization: InitStrategy,
    #[serde(default = "max_attempts_default")]
    pub max_attempts: usize,
    #[serde(default = "selection_default")]
    pub selection: SelectionMethod,
    #[serde(default = "crossover_default")]
    pub crossover: CrossoverMethod,
    #[serde(default = "mutation_default")]
    pub mutation: MutationMethod,
    #[serde(default = "replacement_default")]
    pub replacement: ReplacementMethod,
    #[serde(default = "tournament_size_default")]
    pub tournament_size: usize,
    #[serde(default = "num_elites_default")]
    pub num_elites: usize,
}

// Default section definitions

impl Default for General {
    fn default() -> Self {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }
}

impl Default for Farm {
    fn default() -> Self {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }
}

impl Default for Fitness {
    fn default() -> Self {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }
}

impl Default for FitnessWeights {
    fn default() -> Self {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }
}

impl Default for GA {
    fn default() -> Self {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }
}

impl Default for Param {
    fn default() -> Self {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }
}

impl Param {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Loads and validates a YAML parameter file
pub fn get(param_file: String) -> Result<Param, Box<dyn Error>> {
    let param_file_reader = File::open(param_file)?;
    let param_reader = BufReader::new(param_file_reader);

    let mut config: Param = serde_yaml::from_reader(param_reader)?;

    // Log files get no colour codes
    if !config.general.log_base.is_empty() {
        config.general.display_colorful = false;
    }

    validate(&config)?;

    Ok(config)
}

/// Rejects parameters the evolutionary loop cannot run with
pub fn validate(param: &Param) -> Result<(), GaError> {
    validate_farm(&param.farm)?;
    validate_ga(&param.ga)?;
    validate_fitness(param)?;
    Ok(())
}

fn validate_farm(farm: &Farm) -> Result<(), GaError> {
    if farm.n_turbines == 0 {
        return Err(GaError::Config("Invalid n_turbines=0. Must be >= 1.".to_string()));
    }

    // Two genes per coordinate at least, otherwise no crossover cut point exists
    if farm.area_size < 2 {
        return Err(GaError::Config(format!(
            "Invalid area_size={}. Must be >= 2.",
            farm.area_size
        )));
    }

    let bits = geometry::num_bits(farm.area_size).map_err(|e| GaError::Config(e.to_string()))?;
    if bits > MAX_BITS {
        return Err(GaError::Config(format!(
            "Invalid area_size={}. Needs {} bits per coordinate, at most {} are supported.",
            farm.area_size, bits, MAX_BITS
        )));
    }

    if !farm.min_spacing.is_finite() || farm.min_spacing < 0.0 {
        return Err(GaError::Config(format!(
            "Invalid min_spacing={:.3}. Must be a finite value >= 0.",
            farm.min_spacing
        )));
    }

    if !farm.wind_speed.is_finite() || farm.wind_speed < 0.0 {
        return Err(GaError::Config(format!(
            "Invalid wind_speed={:.3}. Must be a finite value >= 0.",
            farm.wind_speed
        )));
    }

    if let Some(direction) = farm.wind_direction {
        if !direction.is_finite() {
            return Err(GaError::Config(format!(
                "Invalid wind_direction={}. Must be finite.",
                direction
            )));
        }
    }

    if !(0.0..=180.0).contains(&farm.spread_angle) {
        return Err(GaError::Config(format!(
            "Invalid spread_angle={:.3}. Must be in range [0, 180].",
            farm.spread_angle
        )));
    }

    if !(farm.rated_power >= 0.0
        && farm.cut_in_speed >= 0.0
        && farm.cut_in_speed < farm.rated_speed
        && farm.rated_speed < farm.cut_out_speed)
    {
        return Err(GaError::Config(format!(
            "Invalid power curve: rated_power={:.3}, cut_in={:.3}, rated={:.3}, cut_out={:.3}. \
            Expected rated_power >= 0 and 0 <= cut_in < rated < cut_out.",
            farm.rated_power, farm.cut_in_speed, farm.rated_speed, farm.cut_out_speed
        )));
    }

    if farm.rotor_radius <= 0.0
        || !(0.0..=1.0).contains(&farm.thrust_coefficient)
        || farm.wake_decay < 0.0
    {
        return Err(GaError::Config(format!(
            "Invalid wake model: rotor_radius={:.3} must be > 0, thrust_coefficient={:.3} in [0, 1], wake_decay={:.3} >= 0.",
            farm.rotor_radius, farm.thrust_coefficient, farm.wake_decay
        )));
    }

    Ok(())
}

fn validate_ga(ga: &GA) -> Result<(), GaError> {
    if ga.population_size < 2 {
        return Err(GaError::Config(format!(
            "Invalid population_size={}. Must be >= 2.",
            ga.population_size
        )));
    }

    if !(0.0..=1.0).contains(&ga.mutation_rate) {
        return Err(GaError::Config(format!(
            "Invalid mutation_rate={:.3}. Must be in range [0, 1].",
            ga.mutation_rate
        )));
    }

    if ga.max_generations == 0 {
        return Err(GaError::Config("Invalid max_generations=0. Must be >= 1.".to_string()));
    }

    if ga.max_stagnation == 0 {
        return Err(GaError::Config("Invalid max_stagnation=0. Must be >= 1.".to_string()));
    }

    if ga.max_attempts == 0 {
        return Err(GaError::Config("Invalid max_attempts=0. Must be >= 1.".to_string()));
    }

    // Selection tournaments draw from the parents, replacement ones from parents + offspring
    if ga.selection == SelectionMethod::Tournament {
        validate_tournament_size(ga.tournament_size, ga.population_size)?;
    }
    if ga.replacement == ReplacementMethod::Tournament {
        validate_tournament_size(ga.tournament_size, 2 * ga.population_size)?;
    }

    if ga.replacement == ReplacementMethod::Elitism && ga.num_elites > ga.population_size {
        return Err(GaError::Config(format!(
            "Invalid num_elites={}. Must not exceed population_size={}.",
            ga.num_elites, ga.population_size
        )));
    }

    if ga.max_stagnation >= ga.max_generations {
        warn!(
            "max_stagnation={} >= max_generations={}: stagnation will never end the run.",
            ga.max_stagnation, ga.max_generations
        );
    }

    Ok(())
}

fn validate_tournament_size(tournament_size: usize, pool: usize) -> Result<(), GaError> {
    if tournament_size == 0 || tournament_size > pool {
        return Err(GaError::Config(format!(
            "Invalid tournament_size={}. Must be in range [1, {}].",
            tournament_size, pool
        )));
    }
    Ok(())
}

fn validate_fitness(param: &Param) -> Result<(), GaError> {
    let weights = &param.fitness.weights;
    for (name, weight) in [
        ("energy_production", weights.energy_production),
        ("boundary_fitness", weights.boundary_fitness),
        ("spacing_fitness", weights.spacing_fitness),
        ("wake_fitness", weights.wake_fitness),
        ("is_valid", weights.is_valid),
    ] {
        if !weight.is_finite() {
            return Err(GaError::Config(format!(
                "Invalid weight {}={}. Must be finite.",
                name, weight
            )));
        }
    }

    if weights.wake_fitness != 0.0 && param.farm.wind_direction.is_none() {
        warn!("wake_fitness is weighted but no wind_direction is set: the wake zone objective is ignored.");
    }

    if weights.wake_fitness == 0.0 && param.farm.wind_direction.is_some() {
        warn!("wind_direction is set but wake_fitness weight is 0: the wake zone objective is ignored.");
    }

    Ok(())
}

// Default value definitions

fn seed_default() -> u64 {
    4815162342
}
fn empty_string() -> String {
    "".to_string()
}
fn log_base_default() -> String {
    "".to_string()
}
fn log_suffix_default() -> String {
    "log".to_string()
}
fn log_level_default() -> String {
    "info".to_string()
}
fn true_default() -> bool {
    true
}
fn zero_default() -> f64 {
    0.0
}
fn n_turbines_default() -> usize {
    14
}
fn area_size_default() -> i64 {
    300
}
fn min_spacing_default() -> f64 {
    50.0
}
fn wind_speed_default() -> f64 {
    9.8
}
fn spread_angle_default() -> f64 {
    10.0
}
fn rated_power_default() -> f64 {
    3.0
}
fn cut_in_speed_default() -> f64 {
    3.0
}
fn rated_speed_default() -> f64 {
    9.8
}
fn cut_out_speed_default() -> f64 {
    22.5
}
fn rotor_radius_default() -> f64 {
    68.0
}
fn thrust_coefficient_default() -> f64 {
    0.89
}
fn wake_decay_default() -> f64 {
    0.075
}
fn energy_weight_default() -> f64 {
    0.5
}
fn constraint_weight_default() -> f64 {
    0.2
}
fn invalid_penalty_default() -> InvalidPenalty {
    InvalidPenalty::Energy
}
fn pop_size_default() -> usize {
    100
}
fn mutation_rate_default() -> f64 {
    0.01
}
fn max_generations_default() -> usize {
    100
}
fn max_stagnation_default() -> usize {
    10
}
fn initialization_default() -> InitStrategy {
    InitStrategy::Unconstrained
}
fn max_attempts_default() -> usize {
    1000
}
fn selection_default() -> SelectionMethod {
    SelectionMethod::Roulette
}
fn crossover_default() -> CrossoverMethod {
    CrossoverMethod::TurbineOnePoint
}
fn mutation_default() -> MutationMethod {
    MutationMethod::SingleBit
}
fn replacement_default() -> ReplacementMethod {
    ReplacementMethod::SteadyState
}
fn tournament_size_default() -> usize {
    3
}
fn num_elites_default() -> usize {
    2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_param_is_valid() {
        let param = Param::default();
        assert!(validate(&param).is_ok(), "Default parameters should be valid");
        assert_eq!(param.farm.n_turbines, 14);
        assert_eq!(param.farm.area_size, 300);
        assert_eq!(param.farm.wind_direction, None);
        assert_eq!(param.fitness.weights.wake_fitness, 0.0, "Unset wake weight defaults to 0");
        assert_eq!(param.fitness.weights.is_valid, 0.0, "Unset validity weight defaults to 0");
        assert_eq!(param.ga.crossover, CrossoverMethod::TurbineOnePoint);
        assert_eq!(param.ga.replacement, ReplacementMethod::SteadyState);
    }

    #[test]
    fn test_yaml_partial_sections_use_defaults() {
        let yaml = "
farm:
  n_turbines: 5
  wind_direction: 270.0
fitness:
  weights:
    energy_production: 1.0
    wake_fitness: 0.1
ga:
  population_size: 20
  selection: tournament
  crossover: layout_two_point
";
        let param: Param = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(param.farm.n_turbines, 5);
        assert_eq!(param.farm.wind_direction, Some(270.0));
        assert_eq!(param.farm.area_size, 300, "Missing fields fall back to defaults");
        assert_eq!(param.fitness.weights.energy_production, 1.0);
        assert_eq!(param.fitness.weights.spacing_fitness, 0.2);
        assert_eq!(param.ga.population_size, 20);
        assert_eq!(param.ga.selection, SelectionMethod::Tournament);
        assert_eq!(param.ga.crossover, CrossoverMethod::LayoutTwoPoint);
        assert_eq!(param.ga.mutation, MutationMethod::SingleBit);
        assert!(validate(&param).is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_population() {
        let mut param = Param::default();
        param.ga.population_size = 0;
        assert!(matches!(validate(&param), Err(GaError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_zero_turbines() {
        let mut param = Param::default();
        param.farm.n_turbines = 0;
        assert!(matches!(validate(&param), Err(GaError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_mutation_rate_out_of_range() {
        let mut param = Param::default();
        param.ga.mutation_rate = 1.5;
        assert!(matches!(validate(&param), Err(GaError::Config(_))));
        param.ga.mutation_rate = -0.1;
        assert!(matches!(validate(&param), Err(GaError::Config(_))));
        param.ga.mutation_rate = 1.0;
        assert!(validate(&param).is_ok(), "Bounds of [0, 1] are accepted");
    }

    #[test]
    fn test_validate_rejects_tiny_area() {
        let mut param = Param::default();
        param.farm.area_size = 1;
        assert!(matches!(validate(&param), Err(GaError::Config(_))));
        param.farm.area_size = -10;
        assert!(matches!(validate(&param), Err(GaError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_area_too_wide_to_encode() {
        let mut param = Param::default();
        param.farm.area_size = 1 << 40;
        assert!(matches!(validate(&param), Err(GaError::Config(_))));

        param.farm.area_size = (1 << 32) + 1;
        assert!(matches!(validate(&param), Err(GaError::Config(_))), "33 bits per coordinate");

        param.farm.area_size = 1 << 32;
        assert!(validate(&param).is_ok(), "32 bits per coordinate is the widest encoding");
    }

    #[test]
    fn test_validate_rejects_unordered_power_curve() {
        let mut param = Param::default();
        param.farm.rated_speed = 30.0;
        assert!(matches!(validate(&param), Err(GaError::Config(_))));
    }

    #[test]
    fn test_validate_tournament_size_only_checked_when_used() {
        let mut param = Param::default();
        param.ga.tournament_size = 0;
        assert!(validate(&param).is_ok(), "Roulette selection ignores tournament_size");

        param.ga.selection = SelectionMethod::Tournament;
        assert!(matches!(validate(&param), Err(GaError::Config(_))));

        param.ga.tournament_size = param.ga.population_size + 1;
        assert!(matches!(validate(&param), Err(GaError::Config(_))));

        param.ga.selection = SelectionMethod::Roulette;
        param.ga.replacement = ReplacementMethod::Tournament;
        assert!(
            validate(&param).is_ok(),
            "Replacement tournaments draw from parents and offspring"
        );
    }

    #[test]
    fn test_validate_rejects_too_many_elites() {
        let mut param = Param::default();
        param.ga.replacement = ReplacementMethod::Elitism;
        param.ga.num_elites = param.ga.population_size + 1;
        assert!(matches!(validate(&param), Err(GaError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_non_finite_weight() {
        let mut param = Param::default();
        param.fitness.weights.is_valid = f64::INFINITY;
        assert!(matches!(validate(&param), Err(GaError::Config(_))));
    }
}
