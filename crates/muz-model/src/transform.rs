//! Chart-to-chart transforms used while preparing a chart for play.
//!
//! All transforms mutate the chart in place and leave it sorted.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::chart::Chart;
use crate::error::ChartError;
use crate::note::Note;

/// Add `offset` ms to every hit time, clamping at 0. Returns how many
/// notes were clamped.
pub fn shift(chart: &mut Chart, offset: i64) -> usize {
    let mut clamped = 0;
    for note in chart.notes_mut() {
        let shifted = note.hit_time + offset;
        if shifted < 0 {
            clamped += 1;
        }
        note.hit_time = shifted.max(0);
    }
    if clamped > 0 {
        log::warn!("shift by {} ms clamped {} notes to 0", offset, clamped);
    }
    chart.fix();
    clamped
}

/// Multiply hit and hold times by `factor`, truncating.
pub fn scale(chart: &mut Chart, factor: f64) {
    for note in chart.notes_mut() {
        note.hit_time = ((note.hit_time as f64 * factor) as i64).max(0);
        if note.hold_time >= 0 {
            note.hold_time = ((note.hold_time as f64 * factor) as i64).max(0);
        }
    }
    chart.fix();
}

/// Turn every hold into a tap at its start plus a tap at its release time.
///
/// The release tap references the start note so both stay on the same lane
/// after scheduling.
pub fn strip_holds(chart: &mut Chart) {
    let mut ends = Vec::new();
    for (i, note) in chart.notes_mut().iter_mut().enumerate() {
        if note.is_hint || !note.is_hold() {
            continue;
        }
        let end = note.hit_time + note.hold_time;
        note.hold_time = 0;
        ends.push(Note::tap(note.lane, end).with_reference(i, 0));
    }
    for note in ends {
        chart.push(note);
    }
    chart.fix();
}

/// Merge consecutive notes on each lane into holds ("holdify").
///
/// A note opens a hold, the next note on that lane closes it. If the
/// closing note is itself a hold, a new hold opens at its release time.
/// Hints pass through untouched.
pub fn synthesize_holds(chart: &mut Chart) {
    let num_lanes = chart.num_lanes();
    let mut out: Vec<Note> = Vec::with_capacity(chart.len());
    let mut new_index: Vec<Option<usize>> = Vec::with_capacity(chart.len());
    let mut open: Vec<Option<usize>> = vec![None; num_lanes];

    for note in chart.iter() {
        if note.is_hint {
            new_index.push(Some(out.len()));
            out.push(note.clone());
            continue;
        }

        let lane = note.lane % num_lanes;
        match open[lane] {
            None => {
                let mut start = note.clone();
                start.hold_time = 0;
                new_index.push(Some(out.len()));
                open[lane] = Some(out.len());
                out.push(start);
            }
            Some(start) => {
                out[start].hold_time = note.hit_time - out[start].hit_time;
                if note.is_hold() {
                    let reopened = Note::tap(note.lane, note.hit_time + note.hold_time);
                    new_index.push(Some(out.len()));
                    open[lane] = Some(out.len());
                    out.push(reopened);
                } else {
                    new_index.push(None);
                    open[lane] = None;
                }
            }
        }
    }

    for note in &mut out {
        if let Some(r) = note.reference {
            note.reference = new_index.get(r).copied().flatten();
            if note.reference.is_none() {
                log::debug!("holdify dropped a reference to merged note {}", r);
                note.reference_offset = 0;
                note.reference_candidate_offsets = None;
            }
        }
    }

    chart.replace_notes(out);
}

/// "Insane" mode: add a tap halfway between consecutive notes that are at
/// least twice the minimum separation apart, on a lane free at that instant.
pub fn insanify<R: Rng + ?Sized>(chart: &mut Chart, rng: &mut R) {
    chart.fix();
    let min_separation = chart.minimum_separation();
    if min_separation == 0 {
        log::debug!("insanify skipped: chart has no minimum separation");
        return;
    }

    let num_lanes = chart.num_lanes();
    let mut busy_until = vec![0i64; num_lanes];
    let mut added = Vec::new();
    let mut prev_hit: Option<i64> = None;

    for note in chart.iter().filter(|n| !n.is_hint) {
        if let Some(prev) = prev_hit {
            let gap = note.hit_time - prev;
            if gap >= min_separation * 2 {
                let mid = prev + gap / 2;
                let free: Vec<usize> = (0..num_lanes).filter(|&l| busy_until[l] <= mid).collect();
                if let Some(&lane) = free.choose(rng) {
                    added.push(Note::tap(lane, mid));
                    busy_until[lane] = mid + min_separation;
                }
            }
        }
        busy_until[note.lane % num_lanes] = note.end_time() + min_separation * 2;
        prev_hit = Some(note.hit_time);
    }

    log::debug!("insanify added {} notes", added.len());
    for note in added {
        chart.push(note);
    }
    chart.fix();
}

/// Mark every unreferenced fixed-lane note as free to go on any lane.
pub fn randomize(chart: &mut Chart) {
    for note in chart.notes_mut() {
        if note.reference.is_none() && note.candidate_lanes.is_none() {
            note.candidate_lanes = Some(Vec::new());
        }
    }
}

/// Remove hint notes, keeping references of the remaining notes intact.
pub fn strip_hints(chart: &mut Chart) {
    chart.retain(|_, note| !note.is_hint);
}

/// Move every note on lane `i` to lane `order[i]`.
pub fn reorder_lanes(chart: &mut Chart, order: &[usize]) -> Result<(), ChartError> {
    let num_lanes = chart.num_lanes();
    let mut seen = vec![false; num_lanes];
    let valid = order.len() == num_lanes
        && order
            .iter()
            .all(|&l| l < num_lanes && !std::mem::replace(&mut seen[l], true));
    if !valid {
        return Err(ChartError::InvalidPermutation {
            order: order.to_vec(),
            num_lanes,
        });
    }

    for note in chart.notes_mut() {
        note.lane = order[note.lane % num_lanes];
        if let Some(candidates) = note.candidate_lanes.as_mut() {
            for c in candidates.iter_mut() {
                *c = order[c.rem_euclid(num_lanes as i64) as usize] as i64;
            }
        }
    }
    Ok(())
}

/// Apply one random lane permutation to the whole chart.
pub fn shuffle_lanes<R: Rng + ?Sized>(chart: &mut Chart, rng: &mut R) {
    let mut order: Vec<usize> = (0..chart.num_lanes()).collect();
    order.shuffle(rng);
    apply_permutation(chart, &order);
}

/// Reverse lane order.
pub fn mirror_lanes(chart: &mut Chart) {
    let order: Vec<usize> = (0..chart.num_lanes()).rev().collect();
    apply_permutation(chart, &order);
}

fn apply_permutation(chart: &mut Chart, order: &[usize]) {
    if let Err(err) = reorder_lanes(chart, order) {
        // Permutations built from 0..num_lanes are always valid
        log::warn!("lane reorder skipped: {}", err);
    }
}

/// Reduce every lane index modulo the chart's lane count.
pub fn clamp_lanes_to_count(chart: &mut Chart) {
    let num_lanes = chart.num_lanes();
    for note in chart.notes_mut() {
        note.lane %= num_lanes;
    }
}
