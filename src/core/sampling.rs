/// Weighted selection shared by the lexicon and the template registry.

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use std::collections::VecDeque;

use crate::schema::word::{LexemeId, PartOfSpeech};

/// Draw an index with probability proportional to its weight. Zero-weight
/// items are never returned; `None` when every weight is zero.
pub fn weighted_pick<T, R, W>(items: &[T], weight: W, rng: &mut R) -> Option<usize>
where
    R: Rng + ?Sized,
    W: FnMut(&T) -> u32,
{
    let weights: Vec<u64> = items.iter().map(weight).map(u64::from).collect();
    let dist = WeightedIndex::new(&weights).ok()?;
    Some(dist.sample(rng))
}

/// Bounded memory of recent draws, one ring per part of speech. Owned by
/// the caller and lent to each generation call.
#[derive(Debug, Clone, Default)]
pub struct DrawHistory {
    capacity: usize,
    recent: [VecDeque<LexemeId>; PartOfSpeech::COUNT],
}

impl DrawHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            recent: Default::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn record(&mut self, pos: PartOfSpeech, id: LexemeId) {
        if self.capacity == 0 {
            return;
        }
        let ring = &mut self.recent[pos.index()];
        if ring.len() == self.capacity {
            ring.pop_front();
        }
        ring.push_back(id);
    }

    pub fn contains(&self, pos: PartOfSpeech, id: LexemeId) -> bool {
        self.recent[pos.index()].contains(&id)
    }

    /// Frequency filter that zeroes recently drawn words.
    pub fn filter(&self, pos: PartOfSpeech, frequency: u32, id: LexemeId) -> u32 {
        if self.contains(pos, id) {
            0
        } else {
            frequency
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn all_zero_yields_none() {
        let mut rng = StdRng::seed_from_u64(1);
        let items = [0u32, 0, 0];
        assert_eq!(weighted_pick(&items, |w| *w, &mut rng), None);
        let empty: [u32; 0] = [];
        assert_eq!(weighted_pick(&empty, |w| *w, &mut rng), None);
    }

    #[test]
    fn zero_weight_never_chosen() {
        let mut rng = StdRng::seed_from_u64(7);
        let items = [0u32, 5, 0, 1];
        for _ in 0..2000 {
            let i = weighted_pick(&items, |w| *w, &mut rng).unwrap();
            assert!(i == 1 || i == 3);
        }
    }

    #[test]
    fn proportional_in_the_limit() {
        let mut rng = StdRng::seed_from_u64(42);
        let items = [1u32, 3];
        let mut hits = [0usize; 2];
        for _ in 0..20_000 {
            hits[weighted_pick(&items, |w| *w, &mut rng).unwrap()] += 1;
        }
        let ratio = hits[1] as f64 / 20_000.0;
        assert!((ratio - 0.75).abs() < 0.02, "ratio was {}", ratio);
    }

    #[test]
    fn history_is_bounded() {
        let mut h = DrawHistory::new(2);
        h.record(PartOfSpeech::Noun, LexemeId(1));
        h.record(PartOfSpeech::Noun, LexemeId(2));
        h.record(PartOfSpeech::Noun, LexemeId(3));
        assert!(!h.contains(PartOfSpeech::Noun, LexemeId(1)));
        assert!(h.contains(PartOfSpeech::Noun, LexemeId(3)));
        assert!(!h.contains(PartOfSpeech::Verb, LexemeId(3)));
        assert_eq!(h.filter(PartOfSpeech::Noun, 10, LexemeId(2)), 0);
        assert_eq!(h.filter(PartOfSpeech::Noun, 10, LexemeId(9)), 10);
    }

    #[test]
    fn zero_capacity_disables_history() {
        let mut h = DrawHistory::new(0);
        h.record(PartOfSpeech::Adverb, LexemeId(1));
        assert!(!h.contains(PartOfSpeech::Adverb, LexemeId(1)));
    }
}
