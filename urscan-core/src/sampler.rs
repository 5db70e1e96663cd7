//! Walker/Vose alias sampler for the fragment degree distribution

use crate::xoshiro::Xoshiro256;
use alloc::vec;
use alloc::vec::Vec;

/// Draws indexes with probability proportional to the given weights
#[derive(Debug, Clone)]
pub struct Sampler {
    probs: Vec<f64>,
    aliases: Vec<usize>,
}

impl Sampler {
    /// Build the alias table.
    ///
    /// The worklist order (small and large stacks filled from the highest
    /// index down) is fixed: a different but equally valid table would draw
    /// different degrees than other implementations.
    pub fn new(weights: &[f64]) -> Self {
        let n = weights.len();
        let total: f64 = weights.iter().sum();
        let mut scaled: Vec<f64> = weights.iter().map(|w| w * n as f64 / total).collect();

        let mut small = Vec::new();
        let mut large = Vec::new();
        for j in (0..n).rev() {
            if scaled[j] < 1.0 {
                small.push(j);
            } else {
                large.push(j);
            }
        }

        let mut probs = vec![0.0; n];
        let mut aliases = vec![0usize; n];

        while !small.is_empty() && !large.is_empty() {
            let (Some(a), Some(g)) = (small.pop(), large.pop()) else {
                break;
            };
            probs[a] = scaled[a];
            aliases[a] = g;
            scaled[g] += scaled[a] - 1.0;
            if scaled[g] < 1.0 {
                small.push(g);
            } else {
                large.push(g);
            }
        }

        while let Some(g) = large.pop() {
            probs[g] = 1.0;
        }
        while let Some(a) = small.pop() {
            probs[a] = 1.0;
        }

        Self { probs, aliases }
    }

    /// Draw one index, consuming two doubles from `rng`
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn next(&self, rng: &mut Xoshiro256) -> usize {
        let r1 = rng.next_double();
        let r2 = rng.next_double();
        let i = (self.probs.len() as f64 * r1) as usize;
        if r2 < self.probs[i] {
            i
        } else {
            self.aliases[i]
        }
    }
}
