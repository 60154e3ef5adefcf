/*!
    Deterministic RNG helpers for reproducible churn tests
*/

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Default seed for deterministic tests
pub const DEFAULT_TEST_SEED: u64 = 42;

/// Create a deterministic RNG with a custom seed
pub fn test_rng_with_seed(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_rng_is_deterministic() {
        let mut rng1 = test_rng_with_seed(DEFAULT_TEST_SEED);
        let mut rng2 = test_rng_with_seed(DEFAULT_TEST_SEED);
        for _ in 0..100 {
            assert_eq!(rng1.random::<u64>(), rng2.random::<u64>());
        }
    }
}
