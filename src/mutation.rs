use crate::geometry::Chromosome;
use crate::layout::Layout;
use crate::population::Population;
use log::debug;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Bit-flip perturbation applied to offspring
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MutationMethod {
    /// With probability `mutation_rate`, flip one random gene of the chromosome
    SingleBit,
    /// Flip every gene independently with probability `mutation_rate`
    PerGene,
    /// Flip `floor(mutation_rate * 10)` random genes of every chromosome
    FixedCount,
}

/// Returns mutated copies of the offspring, same shape
pub fn mutate(
    offspring: &Population,
    mutation_rate: f64,
    method: MutationMethod,
    rng: &mut ChaCha8Rng,
) -> Population {
    let mut flipped = 0usize;
    let individuals = offspring
        .individuals
        .iter()
        .map(|layout| {
            Layout::new(
                layout
                    .chromosomes
                    .iter()
                    .map(|chromosome| {
                        let (mutated, flips) = match method {
                            MutationMethod::SingleBit => mutate_single_bit(chromosome, mutation_rate, rng),
                            MutationMethod::PerGene => mutate_per_gene(chromosome, mutation_rate, rng),
                            MutationMethod::FixedCount => {
                                mutate_fixed_count(chromosome, (mutation_rate * 10.0) as usize, rng)
                            }
                        };
                        flipped += flips;
                        mutated
                    })
                    .collect(),
            )
        })
        .collect();

    debug!("{} genes flipped by {:?} mutation", flipped, method);
    Population { individuals }
}

/// One Bernoulli trial per chromosome; on success exactly one random gene is toggled
pub fn mutate_single_bit(
    chromosome: &Chromosome,
    mutation_rate: f64,
    rng: &mut ChaCha8Rng,
) -> (Chromosome, usize) {
    let mut mutated = chromosome.clone();
    if !chromosome.is_empty() && rng.gen::<f64>() < mutation_rate {
        let gene = rng.gen_range(0..chromosome.len());
        mutated.flip(gene);
        return (mutated, 1);
    }
    (mutated, 0)
}

pub fn mutate_per_gene(
    chromosome: &Chromosome,
    mutation_rate: f64,
    rng: &mut ChaCha8Rng,
) -> (Chromosome, usize) {
    let mut mutated = chromosome.clone();
    let mut flips = 0;
    for gene in 0..chromosome.len() {
        if rng.gen::<f64>() < mutation_rate {
            mutated.flip(gene);
            flips += 1;
        }
    }
    (mutated, flips)
}

/// The same gene may be drawn twice and flip back
pub fn mutate_fixed_count(
    chromosome: &Chromosome,
    flips: usize,
    rng: &mut ChaCha8Rng,
) -> (Chromosome, usize) {
    let mut mutated = chromosome.clone();
    if chromosome.is_empty() {
        return (mutated, 0);
    }
    for _ in 0..flips {
        let gene = rng.gen_range(0..chromosome.len());
        mutated.flip(gene);
    }
    (mutated, flips)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::UnconstrainedGenerator;
    use rand::SeedableRng;

    fn create_test_population(size: usize, n_turbines: usize) -> Population {
        let generator = UnconstrainedGenerator {
            area_size: 300,
            num_bits: 9,
        };
        let mut pop = Population::new();
        pop.generate(size, n_turbines, &generator, &mut ChaCha8Rng::seed_from_u64(1))
            .unwrap();
        pop
    }

    fn genes_changed(before: &Population, after: &Population) -> Vec<usize> {
        before
            .individuals
            .iter()
            .zip(after.individuals.iter())
            .flat_map(|(a, b)| {
                a.chromosomes
                    .iter()
                    .zip(b.chromosomes.iter())
                    .map(|(ca, cb)| ca.hamming_distance(cb))
                    .collect::<Vec<usize>>()
            })
            .collect()
    }

    #[test]
    fn test_single_bit_flips_at_most_one_gene() {
        let pop = create_test_population(20, 10);
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let mutated = mutate(&pop, 0.5, MutationMethod::SingleBit, &mut rng);
        assert!(mutated.check_shape(10, 9).is_ok(), "Mutation keeps the shape");

        let changes = genes_changed(&pop, &mutated);
        assert!(changes.iter().all(|&c| c <= 1), "At most one gene per chromosome");
        let mutated_chromosomes = changes.iter().filter(|&&c| c == 1).count();
        assert!(
            mutated_chromosomes > 50 && mutated_chromosomes < 150,
            "About half of the 200 chromosomes should mutate, got {}",
            mutated_chromosomes
        );
    }

    #[test]
    fn test_single_bit_rate_bounds() {
        let pop = create_test_population(5, 4);
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let unchanged = mutate(&pop, 0.0, MutationMethod::SingleBit, &mut rng);
        assert_eq!(unchanged, pop, "Rate 0 never mutates");

        let all = mutate(&pop, 1.0, MutationMethod::SingleBit, &mut rng);
        assert!(
            genes_changed(&pop, &all).iter().all(|&c| c == 1),
            "Rate 1 flips exactly one gene per chromosome"
        );
    }

    #[test]
    fn test_mutation_leaves_input_untouched() {
        let pop = create_test_population(5, 4);
        let snapshot = pop.clone();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let _ = mutate(&pop, 1.0, MutationMethod::PerGene, &mut rng);
        assert_eq!(pop, snapshot);
    }

    #[test]
    fn test_per_gene_rate_one_inverts_everything() {
        let chromosome: Chromosome = "101100".parse().unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let (mutated, flips) = mutate_per_gene(&chromosome, 1.0, &mut rng);
        assert_eq!(mutated.to_string(), "010011");
        assert_eq!(flips, 6);
    }

    #[test]
    fn test_fixed_count() {
        let pop = create_test_population(5, 4);
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let unchanged = mutate(&pop, 0.05, MutationMethod::FixedCount, &mut rng);
        assert_eq!(unchanged, pop, "floor(0.05 * 10) = 0 flips");

        let chromosome: Chromosome = "000000".parse().unwrap();
        let (mutated, flips) = mutate_fixed_count(&chromosome, 1, &mut rng);
        assert_eq!(flips, 1);
        assert_eq!(mutated.hamming_distance(&chromosome), 1);
    }
}
