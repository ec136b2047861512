//! ミニバッチ分割。
use rand::Rng;
use rand::seq::SliceRandom;

/// エポックごとに学習例の順序をシャッフルしてミニバッチに分割する。
#[derive(Debug, Clone)]
pub(super) struct EpochBatches {
    order: Vec<usize>,
    batch_size: usize,
}

impl EpochBatches {
    pub(super) fn new(examples: usize, batch_size: usize) -> Self {
        Self {
            order: (0..examples).collect(),
            batch_size: batch_size.max(1),
        }
    }

    /// 並び順をシャッフルし、バッチ単位の添字列を返す。
    pub(super) fn shuffled<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> std::slice::Chunks<'_, usize> {
        self.order.shuffle(rng);
        self.order.chunks(self.batch_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn every_example_appears_once_per_epoch() {
        let mut batches = EpochBatches::new(23, 10);
        let mut rng = StdRng::seed_from_u64(42);
        let chunks: Vec<Vec<usize>> = batches.shuffled(&mut rng).map(<[usize]>::to_vec).collect();
        assert_eq!(
            chunks.iter().map(Vec::len).collect::<Vec<_>>(),
            vec![10, 10, 3]
        );
        let mut seen: Vec<usize> = chunks.into_iter().flatten().collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..23).collect::<Vec<_>>());
    }

    #[test]
    fn shuffling_is_reproducible_for_a_seed() {
        let order = |seed| {
            let mut batches = EpochBatches::new(30, 10);
            let mut rng = StdRng::seed_from_u64(seed);
            let _ = batches.shuffled(&mut rng);
            batches
                .shuffled(&mut rng)
                .flatten()
                .copied()
                .collect::<Vec<_>>()
        };
        assert_eq!(order(42), order(42));
        assert_ne!(order(42), order(43));
    }

    #[test]
    fn zero_batch_size_is_clamped() {
        let mut batches = EpochBatches::new(3, 0);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(batches.shuffled(&mut rng).count(), 3);
    }
}
