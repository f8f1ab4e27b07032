use crate::error::{GaError, Result};
use crate::geometry::{self, is_valid_spacing, Chromosome, Position};
use crate::param::Farm;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Candidate arrangement of turbines, one chromosome per turbine (turbine identity = index)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Layout {
    pub chromosomes: Vec<Chromosome>,
}

impl Layout {
    pub fn new(chromosomes: Vec<Chromosome>) -> Layout {
        Layout { chromosomes }
    }

    pub fn encode(positions: &[Position], num_bits: u32) -> Result<Layout> {
        let chromosomes = positions
            .iter()
            .map(|p| geometry::encode(p.x, p.y, num_bits))
            .collect::<Result<Vec<Chromosome>>>()?;
        Ok(Layout { chromosomes })
    }

    pub fn decode(&self, num_bits: u32) -> Vec<Position> {
        self.chromosomes
            .iter()
            .map(|c| geometry::decode(c, num_bits))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.chromosomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chromosomes.is_empty()
    }
}

/// How the first generation is drawn
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum InitStrategy {
    /// Uniform positions, spacing left to the fitness penalty
    Unconstrained,
    /// Resample each turbine until it respects spacing with those already placed
    Constrained,
}

impl InitStrategy {
    pub fn generator(&self, farm: &Farm, num_bits: u32, max_attempts: usize) -> Box<dyn LayoutGenerator> {
        match self {
            InitStrategy::Unconstrained => Box::new(UnconstrainedGenerator {
                area_size: farm.area_size,
                num_bits,
            }),
            InitStrategy::Constrained => Box::new(ConstrainedGenerator {
                area_size: farm.area_size,
                num_bits,
                min_spacing: farm.min_spacing,
                max_attempts,
            }),
        }
    }
}

/// Produces one encoded random layout
pub trait LayoutGenerator {
    fn generate(&self, n_turbines: usize, rng: &mut ChaCha8Rng) -> Result<Layout>;
}

pub struct UnconstrainedGenerator {
    pub area_size: i64,
    pub num_bits: u32,
}

impl LayoutGenerator for UnconstrainedGenerator {
    fn generate(&self, n_turbines: usize, rng: &mut ChaCha8Rng) -> Result<Layout> {
        let positions: Vec<Position> = (0..n_turbines)
            .map(|_| random_position(self.area_size, self.num_bits, rng))
            .collect();
        Layout::encode(&positions, self.num_bits)
    }
}

pub struct ConstrainedGenerator {
    pub area_size: i64,
    pub num_bits: u32,
    pub min_spacing: f64,
    pub max_attempts: usize,
}

impl LayoutGenerator for ConstrainedGenerator {
    fn generate(&self, n_turbines: usize, rng: &mut ChaCha8Rng) -> Result<Layout> {
        let mut positions: Vec<Position> = Vec::with_capacity(n_turbines);
        for turbine in 0..n_turbines {
            let mut placed = None;
            for _ in 0..self.max_attempts {
                let candidate = random_position(self.area_size, self.num_bits, rng);
                if positions
                    .iter()
                    .all(|p| is_valid_spacing(p, &candidate, self.min_spacing))
                {
                    placed = Some(candidate);
                    break;
                }
            }
            match placed {
                Some(position) => positions.push(position),
                None => {
                    return Err(GaError::RetryExhausted {
                        turbine,
                        attempts: self.max_attempts,
                    })
                }
            }
        }
        Layout::encode(&positions, self.num_bits)
    }
}

/// Uniform integer position in `[0, area_size]`, capped to what `num_bits` can encode
pub fn random_position(area_size: i64, num_bits: u32, rng: &mut ChaCha8Rng) -> Position {
    let encodable = if num_bits >= 32 {
        u32::MAX as u64
    } else {
        (1u64 << num_bits) - 1
    };
    let upper = (area_size.max(0) as u64).min(encodable).min(u32::MAX as u64) as u32;
    Position {
        x: rng.gen_range(0..=upper),
        y: rng.gen_range(0..=upper),
    }
}
