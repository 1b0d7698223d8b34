//! Collection selection weights and the weighted random pick.

use indexmap::IndexMap;
use rand::Rng;

/// Ordered mapping from collection name to selection weight.
///
/// Iteration order is insertion order, which the weighted pick depends on.
/// Weights are expected to sum to 1; a shortfall is tolerated by falling
/// back to the last entry. The table is loaded once at startup and never
/// mutated afterwards.
#[derive(Debug, Clone)]
pub struct CollectionWeights {
    entries: IndexMap<String, f64>,
}

impl CollectionWeights {
    /// Builds a weight table from `(name, weight)` pairs, keeping insertion order.
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(name, weight)| (name.into(), weight))
                .collect(),
        }
    }

    /// Number of configured collections.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no collections are configured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates collection names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Draws one collection name with probability proportional to its weight.
    ///
    /// Accumulates weights in insertion order and returns the first entry
    /// whose cumulative weight exceeds a uniform draw in `[0, 1)`. When
    /// floating-point drift or an under-1 weight sum leaves no entry above
    /// the threshold, the last entry is returned. Total over any non-empty
    /// table.
    pub fn weighted_pick<R: Rng>(&self, rng: &mut R) -> &str {
        let threshold: f64 = rng.random_range(0.0..1.0);
        let mut accumulated = 0.0;

        for (name, weight) in &self.entries {
            accumulated += weight;
            if accumulated > threshold {
                return name;
            }
        }

        self.entries
            .keys()
            .next_back()
            .expect("weight table must not be empty")
    }
}

impl Default for CollectionWeights {
    /// The production weight table. Weights are not yet final.
    fn default() -> Self {
        Self::from_entries([
            ("Auckland Libraries Heritage Images Collection", 0.182),
            ("Auckland Museum Collections", 0.162),
            ("Te Papa Collections Online", 0.119),
            ("Kura Heritage Collections Online", 0.116),
            ("Canterbury Museum", 0.048),
            ("Antarctica NZ Digital Asset Manager", 0.048),
            (
                "National Publicity Studios black and white file prints",
                0.037,
            ),
            ("Tauranga City Libraries Other Collection", 0.032),
            ("Hawke's Bay Knowledge Bank", 0.029),
            ("South Canterbury Museum", 0.023),
            ("Howick Historical Village NZMuseums", 0.015),
            ("Presbyterian Research Centre", 0.014),
            ("National Army Museum", 0.013),
            ("TAPUHI", 0.011),
            ("Auckland Art Gallery Toi o Tāmaki", 0.01),
            ("Waimate Museum and Archives PastPerfect", 0.01),
            ("Te Toi Uku, Crown Lynn and Clayworks Museum", 0.009),
            ("Culture Waitaki", 0.009),
            ("Wellington City Recollect", 0.006),
            ("Te Hikoi Museum", 0.006),
            ("V.C. Browne & Son NZ Aerial Photograph Collection", 0.005),
            ("Tāmiro", 0.005),
            ("Alexander Turnbull Library Flickr", 0.005),
            ("He Purapura Marara Scattered Seeds", 0.005),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{RngCore, SeedableRng};
    use std::collections::HashMap;

    /// RNG that always yields the maximum value, forcing a threshold of ~1.0.
    struct MaxRng;

    impl RngCore for MaxRng {
        fn next_u32(&mut self) -> u32 {
            u32::MAX
        }

        fn next_u64(&mut self) -> u64 {
            u64::MAX
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0xFF);
        }
    }

    /// RNG that always yields zero, forcing a threshold of 0.0.
    struct MinRng;

    impl RngCore for MinRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }
    }

    #[test]
    fn pick_converges_to_configured_distribution() {
        let weights =
            CollectionWeights::from_entries([("a", 0.5), ("b", 0.2), ("c", 0.2), ("d", 0.1)]);
        let mut rng = StdRng::seed_from_u64(42);
        let draws = 100_000;

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for _ in 0..draws {
            *counts.entry(weights.weighted_pick(&mut rng)).or_default() += 1;
        }

        for (name, weight) in [("a", 0.5), ("b", 0.2), ("c", 0.2), ("d", 0.1)] {
            let observed = counts[name] as f64 / draws as f64;
            assert!(
                (observed - weight).abs() < 0.01,
                "{name}: observed {observed}, expected {weight}"
            );
        }
    }

    #[test]
    fn under_one_sum_falls_back_to_last_entry() {
        let weights = CollectionWeights::from_entries([("first", 0.2), ("last", 0.3)]);
        assert_eq!(weights.weighted_pick(&mut MaxRng), "last");
    }

    #[test]
    fn zero_threshold_picks_first_weighted_entry() {
        let weights = CollectionWeights::from_entries([("first", 0.5), ("second", 0.5)]);
        assert_eq!(weights.weighted_pick(&mut MinRng), "first");
    }

    #[test]
    fn default_table_is_ordered_and_within_pick_tolerance() {
        let weights = CollectionWeights::default();
        assert_eq!(weights.len(), 24);
        assert_eq!(
            weights.names().next(),
            Some("Auckland Libraries Heritage Images Collection")
        );

        // The production weights deliberately sum below 1; the shortfall is
        // what the last-entry fallback absorbs.
        let total: f64 = weights.entries.values().copied().sum();
        assert!(total > 0.9 && total <= 1.0, "sum was {total}");
    }
}
