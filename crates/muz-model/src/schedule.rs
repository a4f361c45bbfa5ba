//! Lane assignment under a minimum-separation constraint.
//!
//! Greedy per-lane interval scheduling: notes are visited in hit-time order,
//! each lane remembers until when it is busy, variable notes pick a random
//! free candidate, and a note that still lands on a busy lane is moved to the
//! nearest free lane (searching outward in both directions).

use rand::Rng;
use rand::seq::SliceRandom;

use crate::chart::Chart;
use crate::error::ScheduleError;
use crate::reference;

/// Schedule with the chart's own `minimum_separation`.
pub fn schedule_lanes<R: Rng + ?Sized>(chart: &mut Chart, rng: &mut R) -> Result<(), ScheduleError> {
    chart.fix();
    let min_separation = chart.minimum_separation();
    schedule_lanes_with(chart, min_separation, rng)
}

/// Resolve references and assign a concrete lane to every note.
///
/// On success every non-hint note sits on a lane in `[0, num_lanes)` with no
/// reference and no candidate set, and no two notes on one lane overlap
/// within `[hit, hit + hold + min_separation)`.
pub fn schedule_lanes_with<R: Rng + ?Sized>(
    chart: &mut Chart,
    min_separation: i64,
    rng: &mut R,
) -> Result<(), ScheduleError> {
    chart.fix();
    let num_lanes = chart.num_lanes();
    let mut busy_until = vec![0i64; num_lanes];

    for i in 0..chart.len() {
        // Hints still resolve so later notes can follow them
        reference::resolve(chart, i)?;

        let note = &mut chart.notes_mut()[i];
        note.lane %= num_lanes;
        let candidates = note.candidate_lanes.take();
        if note.is_inactive_hint() {
            continue;
        }
        let hit = note.hit_time;

        if let Some(candidates) = candidates {
            let mut pool: Vec<usize> = if candidates.is_empty() {
                (0..num_lanes).collect()
            } else {
                candidates
                    .iter()
                    .map(|c| c.rem_euclid(num_lanes as i64) as usize)
                    .collect()
            };
            pool.sort_unstable();
            pool.dedup();
            pool.retain(|&lane| busy_until[lane] <= hit);
            if let Some(&lane) = pool.choose(rng) {
                note.lane = lane;
            }
        }

        if !note.is_hint && busy_until[note.lane] > hit {
            let lane = find_free_lane(&busy_until, note.lane, hit).ok_or(
                ScheduleError::NoFreeLane {
                    ordinal: note.ordinal,
                    hit_time: hit,
                },
            )?;
            log::debug!("note {} moved from busy lane {} to {}", note.ordinal, note.lane, lane);
            note.lane = lane;
        }

        if note.hold_time >= 0 {
            let until = hit + note.hold_time + min_separation;
            let slot = &mut busy_until[note.lane];
            *slot = (*slot).max(until);
        }
    }

    Ok(())
}

/// Probe `lane + 1, lane - 1, lane + 2, ...` (wrapping) for a lane free at `time`.
fn find_free_lane(busy_until: &[i64], lane: usize, time: i64) -> Option<usize> {
    let n = busy_until.len() as i64;
    let origin = lane as i64;
    (1..=n)
        .flat_map(|k| [origin + k, origin - k])
        .map(|l| l.rem_euclid(n) as usize)
        .find(|&l| busy_until[l] <= time)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::error::ReferenceError;
    use crate::note::Note;

    fn tap(lane: usize, t: i64) -> Note {
        Note::new(lane, t, 0).unwrap()
    }

    #[test]
    fn test_no_solution_in_single_lane() {
        let notes = vec![
            tap(0, 0).with_candidates(vec![]),
            tap(0, 10).with_candidates(vec![]),
        ];
        let mut chart = Chart::from_notes("x", 1, notes).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        let err = schedule_lanes_with(&mut chart, 50, &mut rng).unwrap_err();
        assert_eq!(
            err,
            ScheduleError::NoFreeLane {
                ordinal: 1,
                hit_time: 10
            }
        );
    }

    #[test]
    fn test_busy_fixed_lane_moves_outward() {
        // lane 1 is held until 1000 + 100
        let notes = vec![Note::new(1, 0, 1000).unwrap(), tap(1, 500)];
        let mut chart = Chart::from_notes("x", 4, notes).unwrap();
        let mut rng = StdRng::seed_from_u64(1);
        schedule_lanes_with(&mut chart, 100, &mut rng).unwrap();
        assert_eq!(chart.notes()[1].lane, 2);
    }

    #[test]
    fn test_probe_order() {
        assert_eq!(find_free_lane(&[0, 0, 9, 9], 2, 5), Some(1));
        assert_eq!(find_free_lane(&[9, 9, 9, 0], 0, 5), Some(3));
        assert_eq!(find_free_lane(&[9, 9], 0, 5), None);
    }

    #[test]
    fn test_candidates_restricted_and_wrapped() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            let notes = vec![tap(0, 0).with_candidates(vec![-1, 6])];
            let mut chart = Chart::from_notes("x", 4, notes).unwrap();
            schedule_lanes(&mut chart, &mut rng).unwrap();
            let lane = chart.notes()[0].lane;
            assert!(lane == 3 || lane == 2, "lane {lane}");
            assert!(chart.notes()[0].candidate_lanes.is_none());
        }
    }

    #[test]
    fn test_deterministic_with_seed() {
        let make = || {
            let notes = (0..32).map(|i| tap(0, i * 120).with_candidates(vec![])).collect();
            Chart::from_notes("x", 6, notes).unwrap()
        };
        let mut a = make();
        let mut b = make();
        schedule_lanes(&mut a, &mut StdRng::seed_from_u64(42)).unwrap();
        schedule_lanes(&mut b, &mut StdRng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_variable_notes_avoid_busy_lanes() {
        let notes = vec![
            Note::new(0, 0, 400).unwrap(),
            Note::new(1, 0, 400).unwrap(),
            Note::new(2, 0, 400).unwrap(),
            tap(0, 100).with_candidates(vec![]),
        ];
        let mut chart = Chart::from_notes("x", 4, notes).unwrap();
        schedule_lanes(&mut chart, &mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(chart.notes()[3].lane, 3);
    }

    #[test]
    fn test_references_follow_scheduled_lane() {
        let notes = vec![
            tap(0, 0).with_candidates(vec![]),
            tap(0, 300).with_reference(0, 1),
        ];
        let mut chart = Chart::from_notes("x", 4, notes).unwrap();
        schedule_lanes(&mut chart, &mut StdRng::seed_from_u64(9)).unwrap();
        let first = chart.notes()[0].lane;
        assert_eq!(chart.notes()[1].lane, (first + 1) % 4);
        assert!(chart.is_playable());
    }

    #[test]
    fn test_forward_reference_fails() {
        let notes = vec![tap(0, 0).with_reference(1, 0), tap(1, 100)];
        let mut chart = Chart::from_notes("x", 4, notes).unwrap();
        let err = schedule_lanes(&mut chart, &mut StdRng::seed_from_u64(0)).unwrap_err();
        assert_eq!(
            err,
            ScheduleError::Reference(ReferenceError::SelfOrForward {
                ordinal: 0,
                reference: 1
            })
        );
    }

    #[test]
    fn test_inactive_hint_keeps_lane_free() {
        let notes = vec![Note::hint(0, 0).unwrap(), tap(0, 10)];
        let mut chart = Chart::from_notes("x", 1, notes).unwrap();
        schedule_lanes_with(&mut chart, 50, &mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(chart.notes()[1].lane, 0);
    }
}
