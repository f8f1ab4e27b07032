use crate::geometry::Chromosome;
use crate::layout::Layout;
use crate::population::Population;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Recombination operator
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CrossoverMethod {
    /// Every parent with a random partner; each turbine's chromosome cut at its own point
    TurbineOnePoint,
    /// Every parent with a random partner; layouts cut once across turbines
    LayoutOnePoint,
    /// Consecutive parents paired; layouts cut twice across turbines
    LayoutTwoPoint,
    /// Every parent with a random partner; x and y halves of each chromosome cut separately
    Coordinate,
}

/// Recombines parents into offspring (never fewer offspring than parents)
pub fn crossover(
    parents: &Population,
    method: CrossoverMethod,
    num_bits: u32,
    rng: &mut ChaCha8Rng,
) -> Population {
    let mut offspring = Population::new();
    let n = parents.len();

    // Two-point pairs consecutive parents, the other operators give each parent a random partner
    let (step, consecutive) = match method {
        CrossoverMethod::LayoutTwoPoint => (2, true),
        _ => (1, false),
    };

    for i in (0..n).step_by(step) {
        let partner = if consecutive && i + 1 < n {
            i + 1
        } else {
            random_partner(i, n, rng)
        };
        let (c1, c2) = breed(
            &parents.individuals[i],
            &parents.individuals[partner],
            method,
            num_bits,
            rng,
        );
        offspring.individuals.push(c1);
        offspring.individuals.push(c2);
    }

    offspring
}

fn breed(
    p1: &Layout,
    p2: &Layout,
    method: CrossoverMethod,
    num_bits: u32,
    rng: &mut ChaCha8Rng,
) -> (Layout, Layout) {
    match method {
        CrossoverMethod::TurbineOnePoint => turbine_one_point(p1, p2, rng),
        CrossoverMethod::LayoutOnePoint => layout_one_point(p1, p2, rng),
        CrossoverMethod::LayoutTwoPoint => layout_two_point(p1, p2, rng),
        CrossoverMethod::Coordinate => coordinate(p1, p2, num_bits, rng),
    }
}

/// Uniform index in `0..n` other than `i` (`i` itself when it is alone)
fn random_partner(i: usize, n: usize, rng: &mut ChaCha8Rng) -> usize {
    if n < 2 {
        return i;
    }
    let j = rng.gen_range(0..n - 1);
    if j >= i {
        j + 1
    } else {
        j
    }
}

/// Swaps chromosome tails turbine by turbine, one independent cut in `[1, len - 1]` each
pub fn turbine_one_point(p1: &Layout, p2: &Layout, rng: &mut ChaCha8Rng) -> (Layout, Layout) {
    let mut c1 = Vec::with_capacity(p1.len());
    let mut c2 = Vec::with_capacity(p1.len());
    for (g1, g2) in p1.chromosomes.iter().zip(p2.chromosomes.iter()) {
        if g1.len() < 2 {
            c1.push(g1.clone());
            c2.push(g2.clone());
            continue;
        }
        let cut = rng.gen_range(1..g1.len());
        c1.push(Chromosome::splice(g1, g2, cut));
        c2.push(Chromosome::splice(g2, g1, cut));
    }
    (Layout::new(c1), Layout::new(c2))
}

/// Swaps the turbines after one cut in `[1, n_turbines - 1]`
pub fn layout_one_point(p1: &Layout, p2: &Layout, rng: &mut ChaCha8Rng) -> (Layout, Layout) {
    if p1.len() < 2 {
        return (p1.clone(), p2.clone());
    }
    let cut = rng.gen_range(1..p1.len());
    (
        Layout::new([&p1.chromosomes[..cut], &p2.chromosomes[cut..]].concat()),
        Layout::new([&p2.chromosomes[..cut], &p1.chromosomes[cut..]].concat()),
    )
}

/// Swaps the turbines between two cuts in `[1, n_turbines - 1]`
pub fn layout_two_point(p1: &Layout, p2: &Layout, rng: &mut ChaCha8Rng) -> (Layout, Layout) {
    if p1.len() < 2 {
        return (p1.clone(), p2.clone());
    }
    let a = rng.gen_range(1..p1.len());
    let b = rng.gen_range(1..p1.len());
    let (start, end) = if a <= b { (a, b) } else { (b, a) };
    (
        Layout::new(
            [&p1.chromosomes[..start], &p2.chromosomes[start..end], &p1.chromosomes[end..]].concat(),
        ),
        Layout::new(
            [&p2.chromosomes[..start], &p1.chromosomes[start..end], &p2.chromosomes[end..]].concat(),
        ),
    )
}

/// Crosses the x half and the y half of every chromosome at independent points;
/// with `num_bits > 1` the last gene of each half always comes from the other parent
pub fn coordinate(p1: &Layout, p2: &Layout, num_bits: u32, rng: &mut ChaCha8Rng) -> (Layout, Layout) {
    let nb = num_bits as usize;
    let mut c1 = Vec::with_capacity(p1.len());
    let mut c2 = Vec::with_capacity(p1.len());
    for (g1, g2) in p1.chromosomes.iter().zip(p2.chromosomes.iter()) {
        if nb == 0 || g1.len() != 2 * nb {
            c1.push(g1.clone());
            c2.push(g2.clone());
            continue;
        }
        // x cut in [1, nb - 1] always mixes the x half; a one-gene x half stays whole
        let cut_x = if nb > 1 { rng.gen_range(1..nb) } else { nb };
        // y cut in [nb, 2 * nb - 1]: at nb the whole y half is swapped
        let cut_y = rng.gen_range(nb..2 * nb);
        let (a, b) = (g1.genes(), g2.genes());
        c1.push(Chromosome::from_genes(
            [&a[..cut_x], &b[cut_x..nb], &a[nb..cut_y], &b[cut_y..]].concat(),
        ));
        c2.push(Chromosome::from_genes(
            [&b[..cut_x], &a[cut_x..nb], &b[nb..cut_y], &a[cut_y..]].concat(),
        ));
    }
    (Layout::new(c1), Layout::new(c2))
}
