use muz_model::reference::{apply_references, chain_references};
use muz_model::schedule::schedule_lanes;
use muz_model::transform::{strip_holds, synthesize_holds};
use muz_model::{Chart, Note};
use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// (lane, hit time, hold time, variable, hint)
fn note_strategy(num_lanes: usize) -> impl Strategy<Value = (usize, i64, i64, bool, bool)> {
    (
        0..num_lanes,
        0i64..8000,
        prop_oneof![3 => Just(0i64), 1 => 1i64..600],
        any::<bool>(),
        prop::bool::weighted(0.1),
    )
}

fn chart_strategy() -> impl Strategy<Value = Chart> {
    (1usize..8).prop_flat_map(|num_lanes| {
        prop::collection::vec(note_strategy(num_lanes), 0..60).prop_map(move |raw| {
            let notes = raw
                .into_iter()
                .map(|(lane, hit, hold, variable, hint)| {
                    if hint {
                        Note::hint(lane, hit).unwrap()
                    } else if variable {
                        Note::new(lane, hit, hold).unwrap().with_candidates(vec![])
                    } else {
                        Note::new(lane, hit, hold).unwrap()
                    }
                })
                .collect();
            Chart::from_notes("prop", num_lanes, notes).unwrap()
        })
    })
}

/// Per lane, a run of holds separated by at least 1 ms.
fn hold_chart_strategy() -> impl Strategy<Value = Chart> {
    prop::collection::vec(prop::collection::vec((1i64..500, 1i64..500), 0..10), 1..6).prop_map(
        |lanes| {
            let num_lanes = lanes.len();
            let mut notes = Vec::new();
            for (lane, holds) in lanes.into_iter().enumerate() {
                let mut pos = 0;
                for (gap, duration) in holds {
                    pos += gap;
                    notes.push(Note::new(lane, pos, duration).unwrap());
                    pos += duration;
                }
            }
            Chart::from_notes("holds", num_lanes, notes).unwrap()
        },
    )
}

proptest! {
    #[test]
    fn scheduled_notes_never_overlap(chart in chart_strategy(), seed in any::<u64>()) {
        let mut chart = chart;
        let min_separation = chart.minimum_separation();
        let mut rng = StdRng::seed_from_u64(seed);

        if schedule_lanes(&mut chart, &mut rng).is_ok() {
            prop_assert!(chart.is_playable());

            for lane in 0..chart.num_lanes() {
                let on_lane: Vec<&Note> = chart
                    .iter()
                    .filter(|n| !n.is_hint && n.lane == lane)
                    .collect();
                for pair in on_lane.windows(2) {
                    prop_assert!(
                        pair[0].hit_time + pair[0].hold_time + min_separation <= pair[1].hit_time,
                        "lane {} overlap: {:?} then {:?}",
                        lane,
                        pair[0],
                        pair[1]
                    );
                }
            }
        }
    }

    #[test]
    fn apply_references_is_idempotent(chart in chart_strategy(), offset in -3i64..4) {
        let mut chart = chart;
        chain_references(&mut chart, offset, None);
        apply_references(&mut chart).unwrap();
        prop_assert!(chart.iter().all(|n| n.reference.is_none()));

        let once = chart.clone();
        apply_references(&mut chart).unwrap();
        prop_assert_eq!(chart, once);
    }

    #[test]
    fn strip_then_synthesize_restores_holds(original in hold_chart_strategy()) {
        let mut chart = original.clone();
        strip_holds(&mut chart);
        prop_assert!(chart.iter().all(|n| n.hold_time == 0));
        synthesize_holds(&mut chart);

        let mut got: Vec<(usize, i64, i64)> =
            chart.iter().map(|n| (n.lane, n.hit_time, n.hold_time)).collect();
        let mut want: Vec<(usize, i64, i64)> =
            original.iter().map(|n| (n.lane, n.hit_time, n.hold_time)).collect();
        got.sort_unstable();
        want.sort_unstable();
        prop_assert_eq!(got, want);
    }

    #[test]
    fn nearest_finds_something_iff_a_note_is_in_range(
        chart in chart_strategy(),
        lane in 0usize..8,
        time in -1000i64..9000,
        max_delta in 1i64..1500,
    ) {
        let in_range = chart.iter().any(|n| {
            let d = n.hit_time - time;
            !n.is_hint && n.lane == lane && d.abs().min((d + n.hold_time).abs()) < max_delta
        });
        prop_assert_eq!(chart.nearest(lane, time, max_delta).is_some(), in_range);
    }
}
