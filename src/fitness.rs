use crate::error::Result;
use crate::geometry::{self, euclidean_distance, is_layout_valid, is_within_bounds, Position};
use crate::param::{FitnessWeights, Param};
use crate::population::Population;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Value of the `is_valid` sub-score for an invalid layout
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InvalidPenalty {
    /// Cancels the layout's own energy production
    Energy,
    /// Flat -1, scaled by the `is_valid` weight
    Constant,
}

/// Simplified turbine power curve (MW against m/s)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerCurve {
    pub rated_power: f64,
    pub cut_in_speed: f64,
    pub rated_speed: f64,
    pub cut_out_speed: f64,
}

impl PowerCurve {
    pub fn power(&self, wind_speed: f64) -> f64 {
        if wind_speed < self.cut_in_speed || wind_speed >= self.cut_out_speed {
            0.0
        } else if wind_speed < self.rated_speed {
            self.rated_power
                * ((wind_speed - self.cut_in_speed) / (self.rated_speed - self.cut_in_speed)).powi(3)
        } else {
            self.rated_power
        }
    }
}

/// Velocity deficit a turbine suffers from each neighbour
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WakeModel {
    pub rotor_radius: f64,
    pub thrust_coefficient: f64,
    pub wake_decay: f64,
}

impl WakeModel {
    /// Deficit caused by one neighbour at `distance`; decays with the squared distance
    pub fn deficit(&self, distance: f64) -> f64 {
        let expansion = self.rotor_radius / (self.wake_decay * distance + self.rotor_radius);
        (1.0 - (1.0 - self.thrust_coefficient).sqrt()) * expansion * expansion
    }
}

/// Everything needed to score a layout, derived once from `Param`
#[derive(Debug, Clone, PartialEq)]
pub struct FitnessParams {
    pub weights: FitnessWeights,
    pub invalid_penalty: InvalidPenalty,
    pub num_bits: u32,
    pub area_size: i64,
    pub min_spacing: f64,
    pub wind_speed: f64,
    pub wind_direction: Option<f64>,
    pub spread_angle: f64,
    pub power_curve: PowerCurve,
    pub wake_model: Option<WakeModel>,
}

impl FitnessParams {
    pub fn from_param(param: &Param) -> Result<FitnessParams> {
        let farm = &param.farm;
        Ok(FitnessParams {
            weights: param.fitness.weights.clone(),
            invalid_penalty: param.fitness.invalid_penalty,
            num_bits: geometry::num_bits(farm.area_size)?,
            area_size: farm.area_size,
            min_spacing: farm.min_spacing,
            wind_speed: farm.wind_speed,
            wind_direction: farm.wind_direction,
            spread_angle: farm.spread_angle,
            power_curve: PowerCurve {
                rated_power: farm.rated_power,
                cut_in_speed: farm.cut_in_speed,
                rated_speed: farm.rated_speed,
                cut_out_speed: farm.cut_out_speed,
            },
            wake_model: if farm.wake_deficit {
                Some(WakeModel {
                    rotor_radius: farm.rotor_radius,
                    thrust_coefficient: farm.thrust_coefficient,
                    wake_decay: farm.wake_decay,
                })
            } else {
                None
            },
        })
    }
}

/// Sub-scores of one layout, before weighting
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FitnessBreakdown {
    pub energy_production: f64,
    pub boundary_fitness: f64,
    pub spacing_fitness: f64,
    pub wake_fitness: f64,
    pub is_valid: f64,
}

impl FitnessBreakdown {
    pub fn total(&self, weights: &FitnessWeights) -> f64 {
        weights.energy_production * self.energy_production
            + weights.boundary_fitness * self.boundary_fitness
            + weights.spacing_fitness * self.spacing_fitness
            + weights.wake_fitness * self.wake_fitness
            + weights.is_valid * self.is_valid
    }
}

/// Sum of per-turbine power, each turbine seeing a wind slowed by its neighbours when
/// a wake model is given
pub fn energy_production(
    positions: &[Position],
    wind_speed: f64,
    power_curve: &PowerCurve,
    wake_model: Option<&WakeModel>,
) -> f64 {
    positions
        .iter()
        .map(|p1| {
            let wake_deficit = match wake_model {
                Some(model) => positions
                    .iter()
                    .filter(|p2| *p2 != p1)
                    .map(|p2| model.deficit(euclidean_distance(p1, p2)))
                    .sum::<f64>(),
                None => 0.0,
            };
            let effective_wind_speed = wind_speed * (1.0 - wake_deficit.min(1.0));
            power_curve.power(effective_wind_speed)
        })
        .sum()
}

/// Minus the number of turbines outside the area
pub fn boundary_penalty(positions: &[Position], area_size: i64) -> f64 {
    -(positions
        .iter()
        .filter(|p| !is_within_bounds(p, area_size))
        .count() as f64)
}

/// Minus the summed squared shortfall of every pair closer than `min_spacing`
pub fn spacing_penalty(positions: &[Position], min_spacing: f64) -> f64 {
    let mut penalty = 0.0;
    for (i, p1) in positions.iter().enumerate() {
        for p2 in &positions[i + 1..] {
            let distance = euclidean_distance(p1, p2);
            if distance < min_spacing {
                penalty += (min_spacing - distance).powi(2);
            }
        }
    }
    -penalty
}

/// Whether `downstream` lies within `spread_angle` degrees of the wind direction as seen
/// from `upstream`
pub fn is_within_wake_zone(
    upstream: &Position,
    downstream: &Position,
    wind_direction: f64,
    spread_angle: f64,
) -> bool {
    let dx = downstream.x as f64 - upstream.x as f64;
    let dy = downstream.y as f64 - upstream.y as f64;
    let bearing = dy.atan2(dx);

    let mut relative_angle = (bearing - wind_direction.to_radians()).rem_euclid(2.0 * PI);
    if relative_angle > PI {
        relative_angle = 2.0 * PI - relative_angle;
    }
    relative_angle <= spread_angle.to_radians()
}

/// Minus the number of ordered pairs where one turbine sits in the other's wake
pub fn wake_zone_penalty(positions: &[Position], wind_direction: f64, spread_angle: f64) -> f64 {
    let mut penalty = 0usize;
    for (i, upstream) in positions.iter().enumerate() {
        for (j, downstream) in positions.iter().enumerate() {
            // coincident turbines have no bearing
            if i == j || upstream == downstream {
                continue;
            }
            if is_within_wake_zone(upstream, downstream, wind_direction, spread_angle) {
                penalty += 1;
            }
        }
    }
    -(penalty as f64)
}

pub fn layout_breakdown(positions: &[Position], params: &FitnessParams) -> FitnessBreakdown {
    let energy = energy_production(
        positions,
        params.wind_speed,
        &params.power_curve,
        params.wake_model.as_ref(),
    );

    let is_valid = if is_layout_valid(positions, params.area_size, params.min_spacing) {
        0.0
    } else {
        match params.invalid_penalty {
            InvalidPenalty::Energy => -energy,
            InvalidPenalty::Constant => -1.0,
        }
    };

    FitnessBreakdown {
        energy_production: energy,
        boundary_fitness: boundary_penalty(positions, params.area_size),
        spacing_fitness: spacing_penalty(positions, params.min_spacing),
        wake_fitness: match params.wind_direction {
            Some(direction) => wake_zone_penalty(positions, direction, params.spread_angle),
            None => 0.0,
        },
        is_valid,
    }
}

pub fn layout_fitness(positions: &[Position], params: &FitnessParams) -> f64 {
    layout_breakdown(positions, params).total(&params.weights)
}

/// Scores every layout of the population, in order
pub fn evaluate_fitness(population: &Population, params: &FitnessParams) -> Vec<f64> {
    population
        .individuals
        .iter()
        .map(|layout| layout_fitness(&layout.decode(params.num_bits), params))
        .collect()
}
