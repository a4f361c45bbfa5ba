//! Per-frame hit, release and miss detection over a prepared chart.
//!
//! Notes are addressed by index into the working chart. Judged notes are only
//! marked for removal; they leave the chart in one pass at the start of the
//! next frame so indices stay valid while a frame is being processed.

use std::collections::BTreeSet;

use muz_model::Chart;

use crate::judgement::{JudgementKind, LATE_MISS_THRESHOLD, MISS_THRESHOLD};
use crate::stats::SessionStats;

/// Runtime state of one lane.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lane {
    /// Index of the hold note currently being held
    pub held: Option<usize>,
    /// Time of the last press, for the visual flash
    pub last_press: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    Hit,
    Hold,
    Release,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JudgeEvent {
    Judged {
        kind: JudgementKind,
        lane: usize,
        delta: i64,
    },
    LaneFlashed {
        lane: usize,
        pressed: bool,
    },
    Sound(SoundCue),
}

#[derive(Debug, Clone)]
pub struct JudgeEngine {
    chart: Chart,
    lanes: Vec<Lane>,
    pending: BTreeSet<usize>,
    events: Vec<JudgeEvent>,
}

impl JudgeEngine {
    /// `chart` must be prepared: sorted, hints stripped, lanes resolved.
    pub fn new(chart: Chart) -> Self {
        let lanes = vec![Lane::default(); chart.num_lanes()];
        Self {
            chart,
            lanes,
            pending: BTreeSet::new(),
            events: Vec::new(),
        }
    }

    pub fn chart(&self) -> &Chart {
        &self.chart
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    pub fn is_pending(&self, index: usize) -> bool {
        self.pending.contains(&index)
    }

    /// Notes not yet judged.
    pub fn remaining(&self) -> usize {
        self.chart.len() - self.pending.len()
    }

    /// Take the events produced since the last call.
    pub fn drain_events(&mut self) -> Vec<JudgeEvent> {
        std::mem::take(&mut self.events)
    }

    /// Clear per-run lane state and buffered work, keeping the chart.
    pub fn restart(&mut self) {
        self.flush_removals();
        self.lanes = vec![Lane::default(); self.chart.num_lanes()];
        self.events.clear();
    }

    /// Silently drop notes that end before `time`.
    pub fn discard_before(&mut self, time: i64) {
        self.flush_removals();
        let before = self.chart.len();
        self.chart.retain(|_, note| note.end_time() >= time);
        if self.chart.len() != before {
            log::debug!("skipped {} notes before {} ms", before - self.chart.len(), time);
        }
    }

    /// Excise notes judged during the previous frame.
    pub fn flush_removals(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending);
        let map = self.chart.retain(|i, _| !pending.contains(&i));
        for lane in &mut self.lanes {
            lane.held = lane.held.and_then(|i| map.get(i).copied().flatten());
        }
    }

    pub fn press(&mut self, lane: usize, time: i64, stats: &mut SessionStats) {
        let Some(state) = self.lanes.get_mut(lane) else {
            log::debug!("press on unknown lane {}", lane);
            return;
        };
        state.last_press = Some(time);
        self.events.push(JudgeEvent::LaneFlashed { lane, pressed: true });

        let held: Vec<usize> = self.lanes.iter().filter_map(|l| l.held).collect();
        let pending = &self.pending;
        let Some(index) = self.chart.nearest_where(lane, time, MISS_THRESHOLD, |i| {
            !pending.contains(&i) && !held.contains(&i)
        }) else {
            return;
        };

        let note = &self.chart.notes()[index];
        let delta = time - note.hit_time;
        if note.is_hold() {
            self.lanes[lane].held = Some(index);
            self.events.push(JudgeEvent::Sound(SoundCue::Hold));
        } else {
            self.remove(index);
            self.events.push(JudgeEvent::Sound(SoundCue::Hit));
        }
        self.judge(JudgementKind::classify(delta), lane, delta, stats);
    }

    pub fn release(&mut self, lane: usize, time: i64, stats: &mut SessionStats) {
        let Some(state) = self.lanes.get_mut(lane) else {
            log::debug!("release on unknown lane {}", lane);
            return;
        };
        let held = state.held.take();
        self.events.push(JudgeEvent::LaneFlashed { lane, pressed: false });

        if let Some(index) = held {
            let delta = time - self.chart.notes()[index].end_time();
            self.remove(index);
            self.events.push(JudgeEvent::Sound(SoundCue::Release));
            self.judge(JudgementKind::classify(delta), lane, delta, stats);
        }
    }

    /// Walk notes that have started by `time`: autoplay them if asked, and
    /// miss the ones that are too late or superseded by a closer note.
    pub fn scan(&mut self, time: i64, autoplay: bool, stats: &mut SessionStats) {
        for index in 0..self.chart.len() {
            let note = &self.chart.notes()[index];
            let (lane, hold, is_hint) = (note.lane, note.hold_time, note.is_hint);
            let remaining = note.end_time() - time;
            let until_hit = note.hit_time - time;

            if until_hit > 0 {
                break;
            }
            if is_hint || self.is_pending(index) {
                continue;
            }

            if autoplay {
                if self.lanes[lane].held != Some(index) {
                    self.press(lane, time, stats);
                    if hold <= 0 {
                        self.release(lane, time, stats);
                    }
                }
                if remaining <= 0 && self.lanes[lane].held == Some(index) {
                    self.release(lane, time, stats);
                }
                if self.is_pending(index) {
                    continue;
                }
            }

            if remaining < -LATE_MISS_THRESHOLD || (remaining < 0 && !self.is_nearest(index, time)) {
                self.miss(index, time, stats);
            }
        }
    }

    fn is_nearest(&self, index: usize, time: i64) -> bool {
        let lane = self.chart.notes()[index].lane;
        let pending = &self.pending;
        self.chart
            .nearest_where(lane, time, MISS_THRESHOLD, |i| !pending.contains(&i))
            == Some(index)
    }

    fn miss(&mut self, index: usize, time: i64, stats: &mut SessionStats) {
        let note = &self.chart.notes()[index];
        let (lane, delta) = (note.lane, time - note.end_time());
        if let Some(state) = self.lanes.get_mut(lane) {
            if state.held == Some(index) {
                state.held = None;
            }
        }
        self.remove(index);
        self.judge(JudgementKind::Miss, lane, delta, stats);
    }

    fn remove(&mut self, index: usize) {
        if !self.pending.insert(index) {
            log::debug!("note {} was already removed", index);
        }
    }

    fn judge(&mut self, kind: JudgementKind, lane: usize, delta: i64, stats: &mut SessionStats) {
        stats.record(kind);
        self.events.push(JudgeEvent::Judged { kind, lane, delta });
    }
}
