//! Lifecycle churn counters

use crate::ChurnEvent;

/// Per-session totals for every [`ChurnEvent`].
#[derive(Debug, Default)]
pub struct ChurnCounters {
    totals: [u64; ChurnEvent::COUNT],
}

impl ChurnCounters {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record(&mut self, event: ChurnEvent) {
        self.record_n(event, 1);
    }

    #[inline]
    pub fn record_n(&mut self, event: ChurnEvent, n: u64) {
        self.totals[event.slot()] += n;
    }

    pub fn get(&self, event: ChurnEvent) -> u64 {
        self.totals[event.slot()]
    }

    pub fn reset(&mut self) {
        self.totals = [0; ChurnEvent::COUNT];
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChurnEvent, u64)> + '_ {
        ChurnEvent::ALL.iter().map(move |&e| (e, self.totals[e.slot()]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_are_independent() {
        let mut churn = ChurnCounters::new();
        churn.record(ChurnEvent::ScarCreated);
        churn.record(ChurnEvent::ScarCreated);
        churn.record_n(ChurnEvent::ScarEvicted, 3);

        assert_eq!(churn.get(ChurnEvent::ScarCreated), 2);
        assert_eq!(churn.get(ChurnEvent::ScarEvicted), 3);
        assert_eq!(churn.get(ChurnEvent::DecalCreated), 0);

        churn.reset();
        assert!(churn.iter().all(|(_, n)| n == 0));
    }
}
