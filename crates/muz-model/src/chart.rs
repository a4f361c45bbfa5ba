use serde::{Deserialize, Serialize};

use crate::error::ChartError;
use crate::note::Note;

/// Gaps at or below this many ms are treated as chords/flams, not spacing.
pub const SEPARATION_FLOOR: i64 = 20;

pub const DEFAULT_NOTERATE: f64 = 1.0;

/// Old-index to new-index table produced by operations that drop or reorder notes.
pub type IndexMap = Vec<Option<usize>>;

/// An ordered collection of notes plus lane count and scroll speed.
///
/// Notes are kept sorted by hit time once `fix` has run; every note's
/// `ordinal` equals its index, and references are indices into `notes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawChart", rename_all = "camelCase")]
pub struct Chart {
    pub name: String,
    num_lanes: usize,
    pub noterate: f64,
    notes: Vec<Note>,
}

impl Chart {
    pub fn new(name: impl Into<String>, num_lanes: usize) -> Result<Self, ChartError> {
        if num_lanes < 1 {
            return Err(ChartError::InvalidLaneCount(num_lanes));
        }
        Ok(Self {
            name: name.into(),
            num_lanes,
            noterate: DEFAULT_NOTERATE,
            notes: Vec::new(),
        })
    }

    /// Build a chart from unsorted notes; references index into `notes` as given.
    pub fn from_notes(
        name: impl Into<String>,
        num_lanes: usize,
        notes: Vec<Note>,
    ) -> Result<Self, ChartError> {
        let mut chart = Self::new(name, num_lanes)?;
        chart.notes = notes;
        chart.fix();
        Ok(chart)
    }

    pub fn num_lanes(&self) -> usize {
        self.num_lanes
    }

    /// Change the lane count without touching notes; see `clamp_lanes_to_count`.
    pub fn set_num_lanes(&mut self, num_lanes: usize) -> Result<(), ChartError> {
        if num_lanes < 1 {
            return Err(ChartError::InvalidLaneCount(num_lanes));
        }
        self.num_lanes = num_lanes;
        Ok(())
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn notes_mut(&mut self) -> &mut [Note] {
        &mut self.notes
    }

    pub fn get(&self, index: usize) -> Result<&Note, ChartError> {
        self.notes.get(index).ok_or(ChartError::IndexOutOfRange {
            index,
            len: self.notes.len(),
        })
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Note> {
        self.notes.iter()
    }

    /// Append a note. Call `fix` before relying on order or ordinals.
    pub fn push(&mut self, note: Note) {
        self.notes.push(note);
    }

    /// Swap in a new note list; references index into `notes` as given.
    pub fn replace_notes(&mut self, notes: Vec<Note>) {
        self.notes = notes;
        self.fix();
    }

    /// Stable-sort by hit time, renumber ordinals and keep references
    /// attached to the same notes.
    pub fn fix(&mut self) {
        let len = self.notes.len();
        let mut order: Vec<usize> = (0..len).collect();
        order.sort_by_key(|&i| self.notes[i].hit_time);

        let mut new_pos = vec![0usize; len];
        for (new, &old) in order.iter().enumerate() {
            new_pos[old] = new;
        }

        let mut slots: Vec<Option<Note>> = self.notes.drain(..).map(Some).collect();
        self.notes = order.iter().filter_map(|&old| slots[old].take()).collect();

        for (i, note) in self.notes.iter_mut().enumerate() {
            note.ordinal = i;
            if let Some(r) = note.reference {
                // Out-of-range references are left as-is and reported at resolution
                if r < len {
                    note.reference = Some(new_pos[r]);
                }
            }
        }
    }

    /// Keep only notes for which `keep(index, note)` holds.
    ///
    /// References are remapped; a reference to a dropped note is cleared.
    /// Returns the old-to-new index table.
    pub fn retain<F>(&mut self, mut keep: F) -> IndexMap
    where
        F: FnMut(usize, &Note) -> bool,
    {
        let mut map: IndexMap = Vec::with_capacity(self.notes.len());
        let mut next = 0;
        for (i, note) in self.notes.iter().enumerate() {
            if keep(i, note) {
                map.push(Some(next));
                next += 1;
            } else {
                map.push(None);
            }
        }

        let old = std::mem::take(&mut self.notes);
        self.notes = old
            .into_iter()
            .zip(map.iter())
            .filter_map(|(note, slot)| slot.map(|_| note))
            .collect();

        for (i, note) in self.notes.iter_mut().enumerate() {
            note.ordinal = i;
            if let Some(r) = note.reference {
                match map.get(r).copied().flatten() {
                    Some(new) => note.reference = Some(new),
                    None => {
                        log::debug!("note {} lost its reference to removed note {}", i, r);
                        note.reference = None;
                        note.reference_offset = 0;
                        note.reference_candidate_offsets = None;
                    }
                }
            }
        }

        map
    }

    /// Smallest gap above `SEPARATION_FLOOR` between consecutive non-hint
    /// hit times, or 0 if no gap qualifies.
    pub fn minimum_separation(&self) -> i64 {
        let mut times: Vec<i64> = self
            .notes
            .iter()
            .filter(|n| !n.is_hint)
            .map(|n| n.hit_time)
            .collect();
        times.sort_unstable();

        times
            .windows(2)
            .map(|w| w[1] - w[0])
            .filter(|&gap| gap > SEPARATION_FLOOR)
            .min()
            .unwrap_or(0)
    }

    /// Index of the note on `lane` closest to `time`, counting hold release
    /// times, among notes within `max_delta`. Hints are never returned.
    pub fn nearest(&self, lane: usize, time: i64, max_delta: i64) -> Option<usize> {
        self.nearest_where(lane, time, max_delta, |_| true)
    }

    /// `nearest` restricted to notes whose index passes `allow`.
    pub fn nearest_where<F>(&self, lane: usize, time: i64, max_delta: i64, allow: F) -> Option<usize>
    where
        F: Fn(usize) -> bool,
    {
        let mut best = None;
        let mut best_delta = max_delta;

        for (i, note) in self.notes.iter().enumerate() {
            if note.lane != lane || note.is_hint || !allow(i) {
                continue;
            }
            let d = note.hit_time - time;
            if d >= max_delta {
                break;
            }
            let d = d.abs().min((d + note.hold_time).abs());
            if d < best_delta {
                best = Some(i);
                best_delta = d;
            }
        }

        best
    }

    /// Number of notes that take part in play.
    pub fn playable_notes(&self) -> usize {
        self.notes.iter().filter(|n| !n.is_hint).count()
    }

    /// Latest hit or release time in the chart.
    pub fn end_time(&self) -> i64 {
        self.notes.iter().map(Note::end_time).max().unwrap_or(0)
    }

    /// True when every non-hint note is resolved onto a lane in range.
    pub fn is_playable(&self) -> bool {
        self.notes.iter().filter(|n| !n.is_hint).all(|n| {
            n.lane < self.num_lanes
                && n.reference.is_none()
                && n.candidate_lanes.is_none()
                && n.hold_time >= 0
        })
    }
}

impl<'a> IntoIterator for &'a Chart {
    type Item = &'a Note;
    type IntoIter = std::slice::Iter<'a, Note>;

    fn into_iter(self) -> Self::IntoIter {
        self.notes.iter()
    }
}

fn default_noterate() -> f64 {
    DEFAULT_NOTERATE
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawChart {
    #[serde(default)]
    name: String,
    num_lanes: usize,
    #[serde(default = "default_noterate")]
    noterate: f64,
    #[serde(default)]
    notes: Vec<Note>,
}

impl TryFrom<RawChart> for Chart {
    type Error = ChartError;

    fn try_from(raw: RawChart) -> Result<Self, Self::Error> {
        let mut chart = Chart::from_notes(raw.name, raw.num_lanes, raw.notes)?;
        if raw.noterate > 0.0 {
            chart.noterate = raw.noterate;
        } else {
            log::warn!(
                "chart '{}' has invalid noterate {}, using {}",
                chart.name,
                raw.noterate,
                DEFAULT_NOTERATE
            );
        }
        Ok(chart)
    }
}
