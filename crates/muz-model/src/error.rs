use thiserror::Error;

/// Rejected note construction (explicit values, or a deserialized note).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NoteError {
    #[error("bad hit time: {0}")]
    BadHitTime(i64),

    #[error("bad hold time: {0}")]
    BadHoldTime(i64),

    #[error("bad lane number: {0}")]
    BadLane(i64),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChartError {
    #[error("invalid amount of lanes: {0}")]
    InvalidLaneCount(usize),

    #[error("lane order {order:?} is not a permutation of 0..{num_lanes}")]
    InvalidPermutation { order: Vec<usize>, num_lanes: usize },

    #[error("note index {index} out of range ({len} notes)")]
    IndexOutOfRange { index: usize, len: usize },
}

/// Failure to derive a note's lane from the note it references.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("note {ordinal} references note {reference}, which does not precede it")]
    SelfOrForward { ordinal: usize, reference: usize },

    #[error("note {ordinal} references note {reference}, which is itself unresolved")]
    Unsolvable { ordinal: usize, reference: usize },

    #[error("note {ordinal} references note {reference}, which does not exist")]
    OutOfRange { ordinal: usize, reference: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error("chart has no scheduling solution: no free lane for note {ordinal} at {hit_time} ms")]
    NoFreeLane { ordinal: usize, hit_time: i64 },
}

/// Why a chart could not be turned into a playable one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrepareError {
    #[error(transparent)]
    Chart(#[from] ChartError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

impl From<ReferenceError> for PrepareError {
    fn from(err: ReferenceError) -> Self {
        Self::Schedule(ScheduleError::Reference(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_free_lane_message() {
        let err = ScheduleError::NoFreeLane {
            ordinal: 3,
            hit_time: 1500,
        };
        assert!(err.to_string().contains("no scheduling solution"));
    }

    #[test]
    fn test_reference_error_converts_into_prepare_error() {
        let err: PrepareError = ReferenceError::Unsolvable {
            ordinal: 2,
            reference: 1,
        }
        .into();
        assert_eq!(
            err,
            PrepareError::Schedule(ScheduleError::Reference(ReferenceError::Unsolvable {
                ordinal: 2,
                reference: 1
            }))
        );
    }
}
