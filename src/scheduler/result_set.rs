//! Pre-sized, write-once result slots.

use crate::error::SchedulerError;
use crate::models::AnalysisOutcome;
use std::sync::OnceLock;

/// One outcome slot per sequence index.
///
/// Each slot is owned by exactly one task and can be written once. No lock
/// covers the whole set; writers never touch each other's slots.
#[derive(Debug)]
pub struct ResultSet<T> {
    slots: Box<[OnceLock<AnalysisOutcome<T>>]>,
}

impl<T> ResultSet<T> {
    pub fn with_len(len: usize) -> Self {
        Self {
            slots: (0..len).map(|_| OnceLock::new()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Store the outcome in the slot named by its sequence index.
    ///
    /// The outcome is handed back if the index is out of range or the slot
    /// was already written.
    pub fn record(&self, outcome: AnalysisOutcome<T>) -> Result<(), AnalysisOutcome<T>> {
        match self.slots.get(outcome.item.sequence_index) {
            Some(slot) => slot.set(outcome),
            None => Err(outcome),
        }
    }

    pub fn get(&self, index: usize) -> Option<&AnalysisOutcome<T>> {
        self.slots.get(index).and_then(OnceLock::get)
    }

    /// Number of slots written so far.
    pub fn written(&self) -> usize {
        self.slots.iter().filter(|slot| slot.get().is_some()).count()
    }

    /// Take every outcome in index order. Fails if any slot is empty.
    pub fn into_outcomes(self) -> Result<Vec<AnalysisOutcome<T>>, SchedulerError> {
        let total = self.slots.len();
        let outcomes: Vec<_> = self
            .slots
            .into_vec()
            .into_iter()
            .filter_map(OnceLock::into_inner)
            .collect();

        if outcomes.len() != total {
            return Err(SchedulerError::IncompleteResultSet {
                missing: total - outcomes.len(),
            });
        }

        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalysisError;
    use crate::models::DatasetItem;
    use std::path::PathBuf;

    fn outcome(index: usize, value: u32) -> AnalysisOutcome<u32> {
        let item = DatasetItem::new("cat", PathBuf::from(format!("/d/cat/{}.mp4", index)), index);
        AnalysisOutcome::success(item, value)
    }

    #[test]
    fn test_record_out_of_order() {
        let set = ResultSet::with_len(3);
        set.record(outcome(2, 20)).unwrap();
        set.record(outcome(0, 0)).unwrap();
        set.record(outcome(1, 10)).unwrap();

        let values: Vec<_> = set
            .into_outcomes()
            .unwrap()
            .into_iter()
            .map(|o| o.result.unwrap())
            .collect();
        assert_eq!(values, vec![0, 10, 20]);
    }

    #[test]
    fn test_slot_written_once() {
        let set = ResultSet::with_len(1);
        set.record(outcome(0, 1)).unwrap();
        let rejected = set.record(outcome(0, 2)).unwrap_err();

        assert_eq!(rejected.result.unwrap(), 2);
        assert_eq!(set.get(0).unwrap().result, Ok(1));
        assert_eq!(set.written(), 1);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let set = ResultSet::with_len(1);
        assert!(set.record(outcome(3, 1)).is_err());
    }

    #[test]
    fn test_incomplete_set_reports_missing() {
        let set = ResultSet::<u32>::with_len(3);
        let item = DatasetItem::new("dog", PathBuf::from("/d/dog/x.mp4"), 1);
        set.record(AnalysisOutcome::failure(item, AnalysisError::Aborted))
            .unwrap();

        let err = set.into_outcomes().unwrap_err();
        assert!(matches!(
            err,
            SchedulerError::IncompleteResultSet { missing: 2 }
        ));
    }

    #[test]
    fn test_empty_set() {
        let set: ResultSet<u32> = ResultSet::with_len(0);
        assert!(set.is_empty());
        assert!(set.into_outcomes().unwrap().is_empty());
    }
}
