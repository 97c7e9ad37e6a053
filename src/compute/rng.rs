//! Seedable random source for the genetic operators.

use rand::prelude::*;
use rand::seq::index;

/// Random number generator wrapper for chromosome and population operations.
pub struct AssemblyRng {
    rng: StdRng,
}

impl AssemblyRng {
    /// Create from seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Uniform index in `0..len`. `len` must be non-zero.
    #[inline]
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    /// Uniform crossover pivot in `1..len`. `len` must be at least 2.
    #[inline]
    pub fn pivot(&mut self, len: usize) -> usize {
        self.rng.gen_range(1..len)
    }

    /// Bernoulli trial with probability `p` (0.0-1.0).
    #[inline]
    pub fn chance(&mut self, p: f64) -> bool {
        self.rng.gen_bool(p)
    }

    /// `amount` distinct indices from `0..len`, uniformly without replacement.
    pub fn sample_indices(&mut self, len: usize, amount: usize) -> Vec<usize> {
        index::sample(&mut self.rng, len, amount).into_vec()
    }
}
