use crate::error::{GaError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Widest coordinate encoding supported (one `u32` per coordinate)
pub const MAX_BITS: u32 = 32;

/// Planar location of one turbine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: u32,
    pub y: u32,
}

impl Position {
    pub fn new(x: u32, y: u32) -> Position {
        Position { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Binary encoding of one position: x on the first half, y on the second, MSB first
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chromosome {
    genes: Vec<bool>,
}

impl Chromosome {
    pub fn from_genes(genes: Vec<bool>) -> Chromosome {
        Chromosome { genes }
    }

    pub fn genes(&self) -> &[bool] {
        &self.genes
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }

    /// Toggles the gene at `index`
    pub fn flip(&mut self, index: usize) {
        self.genes[index] = !self.genes[index];
    }

    /// `head[..cut]` followed by `tail[cut..]`
    pub fn splice(head: &Chromosome, tail: &Chromosome, cut: usize) -> Chromosome {
        Chromosome {
            genes: head.genes[..cut]
                .iter()
                .chain(tail.genes[cut..].iter())
                .copied()
                .collect(),
        }
    }

    /// Number of genes that differ from `other`
    pub fn hamming_distance(&self, other: &Chromosome) -> usize {
        self.genes
            .iter()
            .zip(other.genes.iter())
            .filter(|(a, b)| a != b)
            .count()
            + self.genes.len().abs_diff(other.genes.len())
    }
}

impl fmt::Display for Chromosome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for gene in &self.genes {
            write!(f, "{}", if *gene { '1' } else { '0' })?;
        }
        Ok(())
    }
}

impl FromStr for Chromosome {
    type Err = GaError;

    fn from_str(s: &str) -> Result<Self> {
        let genes = s
            .chars()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                other => Err(GaError::Domain(format!(
                    "Invalid gene '{}' in chromosome \"{}\"",
                    other, s
                ))),
            })
            .collect::<Result<Vec<bool>>>()?;
        Ok(Chromosome { genes })
    }
}

/// Bits needed per coordinate: `ceil(log2(area_size))`
pub fn num_bits(area_size: i64) -> Result<u32> {
    if area_size <= 0 {
        return Err(GaError::Domain(format!(
            "Cannot size an encoding for area_size={}",
            area_size
        )));
    }
    let n = area_size as u64;
    Ok(if n <= 1 { 0 } else { 64 - (n - 1).leading_zeros() })
}

/// Encodes `(x, y)`, refusing values that do not fit in `num_bits` unsigned bits
pub fn encode(x: u32, y: u32, num_bits: u32) -> Result<Chromosome> {
    if num_bits > MAX_BITS {
        return Err(GaError::Domain(format!(
            "num_bits={} exceeds the maximum of {}",
            num_bits, MAX_BITS
        )));
    }
    let limit = 1u64 << num_bits;
    if x as u64 >= limit || y as u64 >= limit {
        return Err(GaError::Domain(format!(
            "Position ({}, {}) does not fit in {} bits",
            x, y, num_bits
        )));
    }

    let mut genes = Vec::with_capacity(2 * num_bits as usize);
    for value in [x, y] {
        for shift in (0..num_bits).rev() {
            genes.push((value as u64 >> shift) & 1 == 1);
        }
    }
    Ok(Chromosome { genes })
}

/// Splits at `num_bits` and reads both halves as unsigned binary
pub fn decode(chromosome: &Chromosome, num_bits: u32) -> Position {
    let split = (num_bits as usize).min(chromosome.len());
    let read = |genes: &[bool]| genes.iter().fold(0u32, |acc, &g| (acc << 1) | g as u32);
    Position {
        x: read(&chromosome.genes[..split]),
        y: read(&chromosome.genes[split..]),
    }
}

pub fn euclidean_distance(p1: &Position, p2: &Position) -> f64 {
    let dx = p1.x as f64 - p2.x as f64;
    let dy = p1.y as f64 - p2.y as f64;
    (dx * dx + dy * dy).sqrt()
}

/// Inclusive at both ends: `0 <= x <= area_size` and `0 <= y <= area_size`
pub fn is_within_bounds(position: &Position, area_size: i64) -> bool {
    position.x as i64 <= area_size && position.y as i64 <= area_size
}

pub fn is_valid_spacing(p1: &Position, p2: &Position, min_spacing: f64) -> bool {
    euclidean_distance(p1, p2) >= min_spacing
}

/// All turbines in bounds and every unordered pair at least `min_spacing` apart
pub fn is_layout_valid(positions: &[Position], area_size: i64, min_spacing: f64) -> bool {
    for (i, p1) in positions.iter().enumerate() {
        if !is_within_bounds(p1, area_size) {
            return false;
        }
        for p2 in &positions[i + 1..] {
            if !is_valid_spacing(p1, p2, min_spacing) {
                return false;
            }
        }
    }
    true
}
