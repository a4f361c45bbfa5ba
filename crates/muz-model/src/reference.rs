//! Note-to-note lane references.
//!
//! A note may derive its lane from an earlier note's resolved lane plus an
//! offset. Resolution is strictly one hop: the referenced note must already be
//! resolved, so chains have to be walked in ordinal order.

use crate::chart::Chart;
use crate::error::ReferenceError;

/// Resolve the reference of the note at `index`, if it has one.
pub fn resolve(chart: &mut Chart, index: usize) -> Result<(), ReferenceError> {
    let num_lanes = chart.num_lanes() as i64;
    let len = chart.len();
    let notes = chart.notes_mut();

    let Some(reference) = notes[index].reference else {
        return Ok(());
    };
    let ordinal = notes[index].ordinal;

    if reference >= ordinal {
        return Err(ReferenceError::SelfOrForward { ordinal, reference });
    }
    if reference >= len {
        return Err(ReferenceError::OutOfRange { ordinal, reference });
    }
    if notes[reference].reference.is_some() {
        return Err(ReferenceError::Unsolvable { ordinal, reference });
    }

    let base = notes[reference].lane as i64;
    let note = &mut notes[index];
    let offset = note.reference_offset;
    let lane = (base + offset).rem_euclid(num_lanes);
    note.lane = lane as usize;
    if let Some(offsets) = note.reference_candidate_offsets.take() {
        note.candidate_lanes = Some(offsets.iter().map(|o| lane + o - offset).collect());
    }
    note.reference = None;
    note.reference_offset = 0;

    Ok(())
}

/// Resolve every reference in ordinal order.
pub fn apply_references(chart: &mut Chart) -> Result<(), ReferenceError> {
    chart.fix();
    for i in 0..chart.len() {
        resolve(chart, i)?;
    }
    Ok(())
}

/// Make every note reference its predecessor with `offset`, optionally
/// deriving candidate lanes from `variants` (offsets from the predecessor).
pub fn chain_references(chart: &mut Chart, offset: i64, variants: Option<&[i64]>) {
    chart.fix();
    for (i, note) in chart.notes_mut().iter_mut().enumerate().skip(1) {
        note.reference = Some(i - 1);
        note.reference_offset = offset;
        note.reference_candidate_offsets = variants.map(<[i64]>::to_vec);
    }
}
