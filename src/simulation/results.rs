// src/simulation/results.rs
use crate::core::{Outcome, STATE_DIM};
use std::collections::BTreeMap;
use std::fmt;

/// Outcome counts over repeated trials of one spin.
///
/// The total always equals the number of trials that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Histogram {
    counts: [u32; STATE_DIM],
}

impl Histogram {
    /// Creates an empty histogram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps counts indexed by outcome.
    pub fn from_counts(counts: [u32; STATE_DIM]) -> Self {
        Self { counts }
    }

    /// Records one trial.
    pub(crate) fn record(&mut self, outcome: Outcome) {
        self.counts[outcome.index()] += 1;
    }

    /// Count for one outcome; outcomes never drawn read as 0.
    pub fn count(&self, outcome: Outcome) -> u32 {
        self.counts[outcome.index()]
    }

    /// Total number of recorded trials.
    pub fn total(&self) -> u32 {
        self.counts.iter().sum()
    }

    /// `(outcome, count)` pairs in ascending bitstring order, zeros included.
    pub fn iter(&self) -> impl Iterator<Item = (Outcome, u32)> + '_ {
        Outcome::all().map(|o| (o, self.counts[o.index()]))
    }

    /// Bitstring-keyed counts, omitting outcomes that were never drawn.
    pub fn to_counts_map(&self) -> BTreeMap<String, u32> {
        self.iter()
            .filter(|(_, count)| *count > 0)
            .map(|(o, count)| (o.bitstring(), count))
            .collect()
    }

    /// Most frequent outcome, lowest bitstring winning ties.
    pub fn mode(&self) -> Option<Outcome> {
        self.iter()
            .filter(|(_, count)| *count > 0)
            .fold(None, |best: Option<(Outcome, u32)>, (o, c)| match best {
                Some((_, best_count)) if best_count >= c => best,
                _ => Some((o, c)),
            })
            .map(|(o, _)| o)
    }
}

impl fmt::Display for Histogram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Histogram ({} trials):", self.total())?;
        for (outcome, count) in self.iter().filter(|(_, c)| *c > 0) {
            writeln!(f, "  {}: {}", outcome.bitstring(), count)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_map_omits_zero_entries() -> crate::Result<()> {
        let mut hist = Histogram::new();
        hist.record(Outcome::new(3)?);
        hist.record(Outcome::new(3)?);
        hist.record(Outcome::new(6)?);

        let map = hist.to_counts_map();
        assert_eq!(map.len(), 2);
        assert_eq!(map["011"], 2);
        assert_eq!(map["110"], 1);
        assert_eq!(hist.count(Outcome::new(0)?), 0);
        assert_eq!(hist.total(), 3);
        assert_eq!(hist.mode(), Some(Outcome::new(3)?));
        Ok(())
    }

    #[test]
    fn test_empty_histogram_has_no_mode() {
        assert_eq!(Histogram::new().mode(), None);
        assert_eq!(Histogram::new().total(), 0);
    }
}
