use crate::error::{GaError, Result};
use crate::geometry::Position;
use crate::layout::{Layout, LayoutGenerator};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct Population {
    pub individuals: Vec<Layout>,
}

impl Population {
    pub fn new() -> Population {
        Population {
            individuals: Vec::new(),
        }
    }

    /// Appends `population_size` layouts drawn from `generator`
    pub fn generate(
        &mut self,
        population_size: usize,
        n_turbines: usize,
        generator: &dyn LayoutGenerator,
        rng: &mut ChaCha8Rng,
    ) -> Result<()> {
        for _ in 0..population_size {
            self.individuals.push(generator.generate(n_turbines, rng)?);
        }
        Ok(())
    }

    /// add some individuals in the population
    pub fn add(&mut self, population: Population) {
        self.individuals.extend(population.individuals);
    }

    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn decode(&self, num_bits: u32) -> Vec<Vec<Position>> {
        self.individuals.iter().map(|l| l.decode(num_bits)).collect()
    }

    /// Checks the population is usable by the operators: non-empty, every layout with
    /// `n_turbines` chromosomes of `2 * num_bits` genes
    pub fn check_shape(&self, n_turbines: usize, num_bits: u32) -> Result<()> {
        if self.individuals.is_empty() {
            return Err(GaError::Config("Population is empty".to_string()));
        }
        let chromosome_len = 2 * num_bits as usize;
        for (i, layout) in self.individuals.iter().enumerate() {
            if layout.is_empty() || layout.len() != n_turbines {
                return Err(GaError::Config(format!(
                    "Layout {} holds {} turbines, expected {}",
                    i,
                    layout.len(),
                    n_turbines
                )));
            }
            if layout.chromosomes.iter().any(|c| c.len() != chromosome_len) {
                return Err(GaError::Config(format!(
                    "Layout {} holds a chromosome whose length differs from {}",
                    i, chromosome_len
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::UnconstrainedGenerator;
    use rand::SeedableRng;

    #[test]
    fn test_generate_population() {
        let generator = UnconstrainedGenerator {
            area_size: 300,
            num_bits: 9,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut pop = Population::new();
        pop.generate(12, 5, &generator, &mut rng).unwrap();

        assert_eq!(pop.len(), 12);
        assert!(pop.check_shape(5, 9).is_ok());
        assert_eq!(pop.decode(9).len(), 12);
        assert!(pop.decode(9).iter().all(|positions| positions.len() == 5));
    }

    #[test]
    fn test_add_appends_in_order() {
        let generator = UnconstrainedGenerator {
            area_size: 16,
            num_bits: 4,
        };
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut a = Population::new();
        a.generate(3, 2, &generator, &mut rng).unwrap();
        let mut b = Population::new();
        b.generate(2, 2, &generator, &mut rng).unwrap();
        let expected_tail = b.individuals.clone();

        a.add(b);
        assert_eq!(a.len(), 5);
        assert_eq!(a.individuals[3..].to_vec(), expected_tail);
    }

    #[test]
    fn test_check_shape_rejects_empty() {
        assert!(matches!(Population::new().check_shape(3, 4), Err(GaError::Config(_))));

        let pop = Population {
            individuals: vec![Layout::new(vec![])],
        };
        assert!(matches!(pop.check_shape(0, 4), Err(GaError::Config(_))));
    }

    #[test]
    fn test_check_shape_rejects_wrong_chromosome_length() {
        let layout = Layout::new(vec!["1010".parse().unwrap()]);
        let pop = Population {
            individuals: vec![layout],
        };
        assert!(pop.check_shape(1, 2).is_ok());
        assert!(matches!(pop.check_shape(1, 3), Err(GaError::Config(_))));
        assert!(matches!(pop.check_shape(2, 2), Err(GaError::Config(_))));
    }
}
