use serde::{Deserialize, Serialize};

use crate::error::NoteError;

/// Hold time carried by a hint note that takes no part in play.
pub const HINT_HOLD_TIME: i64 = -1;

/// A single note in the chart.
///
/// Besides its lane and timing, a note may carry lane variance: a set of
/// candidate lanes the scheduler may pick from, and/or a reference to an
/// earlier note whose resolved lane this one is derived from. References are
/// indices into the owning chart's note list (playback order).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawNote", rename_all = "camelCase")]
pub struct Note {
    /// Lane index (0-indexed)
    pub lane: usize,
    /// Hit time in milliseconds
    pub hit_time: i64,
    /// Hold duration in milliseconds (0 for taps, `HINT_HOLD_TIME` for inactive hints)
    pub hold_time: i64,
    /// `None` = fixed lane, empty = any lane, otherwise the allowed lanes (taken mod lane count)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub candidate_lanes: Option<Vec<i64>>,
    /// Index of the note this note's lane is derived from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<usize>,
    /// Lane offset relative to the referenced note
    #[serde(skip_serializing_if = "is_zero")]
    pub reference_offset: i64,
    /// Candidate lane offsets relative to the referenced note
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_candidate_offsets: Option<Vec<i64>>,
    /// Only carries timing/lane information for later notes
    #[serde(skip_serializing_if = "is_false")]
    pub is_hint: bool,
    /// Position in hit-time order; maintained by `Chart::fix`
    #[serde(skip)]
    pub ordinal: usize,
}

fn is_zero(v: &i64) -> bool {
    *v == 0
}

fn is_false(v: &bool) -> bool {
    !*v
}

impl Note {
    /// Create a note with a fixed lane.
    ///
    /// `hold_time` of `HINT_HOLD_TIME` yields an inactive hint; any other
    /// negative value is rejected.
    pub fn new(lane: usize, hit_time: i64, hold_time: i64) -> Result<Self, NoteError> {
        if hit_time < 0 {
            return Err(NoteError::BadHitTime(hit_time));
        }
        if hold_time < HINT_HOLD_TIME {
            return Err(NoteError::BadHoldTime(hold_time));
        }
        Ok(Self {
            lane,
            hit_time,
            hold_time,
            candidate_lanes: None,
            reference: None,
            reference_offset: 0,
            reference_candidate_offsets: None,
            is_hint: hold_time == HINT_HOLD_TIME,
            ordinal: 0,
        })
    }

    /// Create an inactive hint note.
    pub fn hint(lane: usize, hit_time: i64) -> Result<Self, NoteError> {
        Self::new(lane, hit_time, HINT_HOLD_TIME)
    }

    /// Zero-duration note used by transforms; times are already validated upstream.
    pub(crate) fn tap(lane: usize, hit_time: i64) -> Self {
        Self {
            lane,
            hit_time: hit_time.max(0),
            hold_time: 0,
            candidate_lanes: None,
            reference: None,
            reference_offset: 0,
            reference_candidate_offsets: None,
            is_hint: false,
            ordinal: 0,
        }
    }

    /// Let the scheduler pick the lane among `lanes` (empty = any lane).
    pub fn with_candidates(mut self, lanes: Vec<i64>) -> Self {
        self.candidate_lanes = Some(lanes);
        self
    }

    /// Derive this note's lane from note `index` plus `offset`.
    pub fn with_reference(mut self, index: usize, offset: i64) -> Self {
        self.reference = Some(index);
        self.reference_offset = offset;
        self
    }

    /// Candidate offsets relative to the referenced note's lane.
    pub fn with_reference_candidates(mut self, offsets: Vec<i64>) -> Self {
        self.reference_candidate_offsets = Some(offsets);
        self
    }

    /// Mark this note as a hint without changing its hold time.
    pub fn into_hint(mut self) -> Self {
        self.is_hint = true;
        self
    }

    pub fn is_hold(&self) -> bool {
        self.hold_time > 0
    }

    /// A hint whose hold time is the inactive sentinel.
    pub fn is_inactive_hint(&self) -> bool {
        self.is_hint && self.hold_time < 0
    }

    pub fn is_variable(&self) -> bool {
        self.candidate_lanes.is_some()
    }

    pub fn is_resolved(&self) -> bool {
        self.reference.is_none()
    }

    /// Time at which the note stops occupying its lane.
    pub fn end_time(&self) -> i64 {
        self.hit_time + self.hold_time.max(0)
    }
}

/// Unvalidated wire form of a note.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNote {
    lane: i64,
    hit_time: i64,
    #[serde(default)]
    hold_time: i64,
    #[serde(default)]
    candidate_lanes: Option<Vec<i64>>,
    #[serde(default)]
    reference: Option<usize>,
    #[serde(default)]
    reference_offset: i64,
    #[serde(default)]
    reference_candidate_offsets: Option<Vec<i64>>,
    #[serde(default)]
    is_hint: bool,
}

impl TryFrom<RawNote> for Note {
    type Error = NoteError;

    fn try_from(raw: RawNote) -> Result<Self, Self::Error> {
        let lane = usize::try_from(raw.lane).map_err(|_| NoteError::BadLane(raw.lane))?;
        let mut note = Note::new(lane, raw.hit_time, raw.hold_time)?;
        note.candidate_lanes = raw.candidate_lanes;
        note.reference = raw.reference;
        note.reference_offset = raw.reference_offset;
        note.reference_candidate_offsets = raw.reference_candidate_offsets;
        note.is_hint |= raw.is_hint;
        Ok(note)
    }
}
