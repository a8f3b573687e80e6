// ============================================================
// Layer 4 — Train/Validation Splitter
// ============================================================
// Holds out a random share of the encoded corpus so the
// training driver can report a loss on documents the model
// never stepped on. A fraction of 0.0 keeps everything for
// training, which is the default.
//
// Uses rand::seq::SliceRandom (Fisher-Yates) so every
// permutation is equally likely.

use rand::{seq::SliceRandom, Rng};

/// Shuffle `samples` and move `validation_fraction` of them into a
/// second vector. Returns `(train, validation)`.
///
/// The fraction is clamped to `[0, 1]`; the held-out count is
/// rounded to the nearest integer.
pub fn split_validation<T, R: Rng>(
    mut samples: Vec<T>,
    validation_fraction: f64,
    rng: &mut R,
) -> (Vec<T>, Vec<T>) {
    samples.shuffle(rng);

    let total = samples.len();
    let held_out = ((total as f64) * validation_fraction.clamp(0.0, 1.0)).round() as usize;
    let validation = samples.split_off(total - held_out.min(total));

    tracing::debug!(
        "Dataset split: {} training, {} validation",
        samples.len(),
        validation.len()
    );

    (samples, validation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_split_sizes() {
        let (train, val) = split_validation((0..100).collect::<Vec<_>>(), 0.2, &mut rng());
        assert_eq!((train.len(), val.len()), (80, 20));
    }

    #[test]
    fn test_no_sample_lost_or_duplicated() {
        let (train, val) = split_validation((0..37).collect::<Vec<usize>>(), 0.3, &mut rng());
        let mut all: Vec<usize> = train.into_iter().chain(val).collect();
        all.sort_unstable();
        assert_eq!(all, (0..37).collect::<Vec<_>>());
    }

    #[test]
    fn test_zero_fraction_keeps_everything_for_training() {
        let (train, val) = split_validation(vec![1, 2, 3], 0.0, &mut rng());
        assert_eq!(train.len(), 3);
        assert!(val.is_empty());
    }

    #[test]
    fn test_out_of_range_fraction_is_clamped() {
        let (train, val) = split_validation(vec![1, 2, 3], 1.5, &mut rng());
        assert!(train.is_empty());
        assert_eq!(val.len(), 3);
    }
}
