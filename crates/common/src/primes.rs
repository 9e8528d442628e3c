// Prime selection: seeded sampling of two distinct primes under 30.
//
// The sum of the sampled pair decides how many commits a run creates.
// Seeding makes the pair (and therefore the whole run) reproducible.

use std::fmt::{Display, Formatter};

use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All prime numbers below 30.
pub const PRIMES_UNDER_30: [i64; 10] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PrimeError {
    #[error("at least two primes are required for selection, pool has {available}")]
    PoolExhausted { available: usize },
}

/// An ordered pair of two distinct primes drawn from a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrimePair {
    pub first: i64,
    pub second: i64,
}

impl PrimePair {
    pub fn new(first: i64, second: i64) -> Self {
        Self { first, second }
    }
}

impl From<(i64, i64)> for PrimePair {
    fn from((first, second): (i64, i64)) -> Self {
        Self { first, second }
    }
}

impl Display for PrimePair {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.first, self.second)
    }
}

/// Pick two distinct primes from [`PRIMES_UNDER_30`].
///
/// The same `seed` always yields the same ordered pair. Without a seed the
/// generator is seeded from OS entropy.
pub fn pick_two_primes(seed: Option<u64>) -> Result<PrimePair, PrimeError> {
    pick_two_from(&PRIMES_UNDER_30, seed)
}

/// Sample two elements without replacement from `pool`.
///
/// Distinctness holds for positions, so a pool of distinct values always
/// yields distinct members.
pub fn pick_two_from(pool: &[i64], seed: Option<u64>) -> Result<PrimePair, PrimeError> {
    if pool.len() < 2 {
        return Err(PrimeError::PoolExhausted { available: pool.len() });
    }

    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let picked = index::sample(&mut rng, pool.len(), 2);

    Ok(PrimePair::new(pool[picked.index(0)], pool[picked.index(1)]))
}

/// Sum of both members of the pair, saturating at the `i64` bounds.
pub fn sum_primes(pair: PrimePair) -> i64 {
    pair.first.saturating_add(pair.second)
}
