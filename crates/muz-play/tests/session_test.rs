use muz_model::{Chart, Note, PrepareError, ScheduleError};
use muz_play::traits::{MockTransport, RecordingRenderer};
use muz_play::{
    ClockSync, FrameStatus, GameConfig, JudgeEngine, JudgementKind, KeyAction, PlayOptions,
    Session, SessionState, SessionStats, SyncOutcome,
};
use proptest::prelude::*;

type TestSession = Session<MockTransport, RecordingRenderer>;

fn config() -> GameConfig {
    GameConfig {
        start_paused: false,
        ..GameConfig::default()
    }
}

fn session(notes: Vec<Note>, num_lanes: usize, config: GameConfig, options: PlayOptions) -> TestSession {
    let chart = Chart::from_notes("test", num_lanes, notes).unwrap();
    Session::new(chart, config, options, MockTransport::new(), RecordingRenderer::new()).unwrap()
}

/// Run `frames` frames of `ms` each, with the audio keeping perfect pace.
fn run(session: &mut TestSession, frames: usize, ms: i64) -> Vec<FrameStatus> {
    (0..frames)
        .map(|_| {
            session.audio_mut().advance(ms);
            session.update(ms as f64).unwrap()
        })
        .collect()
}

#[test]
fn test_press_slightly_late_is_great() {
    let mut s = session(vec![Note::new(0, 1000, 0).unwrap()], 1, config(), PlayOptions::default());
    run(&mut s, 105, 10);
    assert_eq!(s.time(), 1050);

    s.command_str("lane:0", KeyAction::Press).unwrap();
    assert_eq!(s.renderer().judged, vec![(JudgementKind::Great, 0, 50)]);
    assert_eq!(s.stats().combo, 1);
    assert_eq!(s.stats().score, 50);
}

#[test]
fn test_press_far_too_late_is_miss() {
    let chart = Chart::from_notes("b", 1, vec![Note::new(0, 1000, 0).unwrap()]).unwrap();
    let mut engine = JudgeEngine::new(chart);
    let mut stats = SessionStats::new();
    stats.combo = 5;

    engine.press(0, 1500, &mut stats);
    assert_eq!(stats.count(JudgementKind::Miss), 1);
    assert_eq!(stats.combo, 0);
}

#[test]
fn test_hold_release_judged_against_end() {
    let mut s = session(vec![Note::new(0, 0, 2000).unwrap()], 1, config(), PlayOptions::default());
    s.command_str("lane:0", KeyAction::Press).unwrap();
    run(&mut s, 195, 10);
    assert_eq!(s.time(), 1950);

    s.command_str("lane:0", KeyAction::Release).unwrap();
    assert_eq!(
        s.renderer().judged,
        vec![(JudgementKind::Perfect, 0, 0), (JudgementKind::Great, 0, -50)]
    );
    assert_eq!(s.stats().combo, 2);
}

#[test]
fn test_unschedulable_chart_fails_to_start() {
    let notes = vec![
        Note::new(0, 0, 0).unwrap().with_candidates(vec![]),
        Note::new(0, 10, 0).unwrap().with_candidates(vec![]),
        Note::new(0, 60, 0).unwrap().with_candidates(vec![]),
    ];
    let chart = Chart::from_notes("d", 1, notes).unwrap();
    let result = Session::new(
        chart,
        config(),
        PlayOptions::default(),
        MockTransport::new(),
        RecordingRenderer::new(),
    );
    assert!(matches!(
        result,
        Err(PrepareError::Schedule(ScheduleError::NoFreeLane { ordinal: 1, hit_time: 10 }))
    ));
}

#[test]
fn test_clock_drift_from_stalled_position() {
    let mut clock = ClockSync::new(0, true);
    let drifts: Vec<f64> = [0, 0, 0, 40]
        .into_iter()
        .map(|observed| {
            clock.step(16.0, observed);
            clock.drift()
        })
        .collect();
    assert_eq!(drifts, vec![16.0, 32.0, 48.0, 0.0]);
}

#[test]
fn test_clock_finishes_once() {
    let mut clock = ClockSync::new(0, true);
    assert_eq!(clock.step(16.0, -1), SyncOutcome::Finished);
    assert_eq!(clock.step(16.0, -1), SyncOutcome::Ended);
    assert!(clock.is_finished());
}

#[test]
fn test_autoplay_full_run() {
    let notes = vec![
        Note::new(0, 500, 0).unwrap(),
        Note::new(1, 1000, 0).unwrap(),
        Note::new(0, 1500, 300).unwrap(),
    ];
    let mut s = session(notes, 2, config(), PlayOptions::default());
    s.set_autoplay(true);
    let statuses = run(&mut s, 200, 10);
    assert!(statuses.iter().all(|&status| status == FrameStatus::Running));

    assert_eq!(s.stats().count(JudgementKind::Perfect), 4);
    assert_eq!(s.stats().best_combo, 4);
    assert_eq!(s.stats().score, 402);

    s.audio_mut().finish();
    assert_eq!(s.update(10.0).unwrap(), FrameStatus::Finished);
    assert_eq!(s.state(), SessionState::Finished);
    assert_eq!(s.renderer().finished, 1);
    assert_eq!(s.update(10.0).unwrap(), FrameStatus::Running);
    assert_eq!(s.renderer().finished, 1);
    assert!(s.is_settled());
}

#[test]
fn test_late_window_outlives_audio() {
    let options = PlayOptions {
        fc_run: true,
        ..PlayOptions::default()
    };
    let mut s = session(vec![Note::new(0, 1000, 0).unwrap()], 1, config(), options);
    run(&mut s, 105, 10);
    assert!(s.renderer().judged.is_empty());

    // the song stops while the note is still inside its late window
    s.audio_mut().finish();
    assert_eq!(s.update(10.0).unwrap(), FrameStatus::Finished);
    assert!(!s.is_settled());

    let statuses = run(&mut s, 40, 10);
    assert!(!statuses.contains(&FrameStatus::Finished));
    assert_eq!(s.renderer().kinds(), vec![JudgementKind::Miss]);
    assert_eq!(s.renderer().finished, 1);

    // the miss breaks the fc run, so the chart starts over
    let restart = statuses.iter().position(|&status| status == FrameStatus::Restarted);
    assert_eq!(restart, Some(36));
    assert_eq!(s.state(), SessionState::Playing);
    assert_eq!(s.audio().plays, vec![0, 0]);
}

#[test]
fn test_settles_after_last_note_judged() {
    let notes = vec![Note::new(0, 1000, 0).unwrap(), Note::new(0, 3000, 0).unwrap()];
    let mut s = session(notes, 1, config(), PlayOptions::default());
    run(&mut s, 110, 10);
    s.audio_mut().finish();
    assert_eq!(s.update(10.0).unwrap(), FrameStatus::Finished);

    let statuses = run(&mut s, 200, 10);
    assert!(statuses.iter().all(|&status| status == FrameStatus::Running));
    assert_eq!(s.stats().count(JudgementKind::Miss), 1);
    assert!(!s.is_settled());

    run(&mut s, 100, 10);
    assert_eq!(s.stats().count(JudgementKind::Miss), 2);
    assert_eq!(s.state(), SessionState::Finished);
    assert!(s.is_settled());
    assert_eq!(s.renderer().finished, 1);
}

#[test]
fn test_fc_run_restarts_after_miss() {
    let notes = vec![Note::new(0, 500, 0).unwrap(), Note::new(1, 1000, 0).unwrap()];
    let options = PlayOptions {
        fc_run: true,
        ..PlayOptions::default()
    };
    let mut s = session(notes, 2, config(), options);

    // the first note is missed by the scan at 910 ms
    let statuses = run(&mut s, 92, 10);
    assert_eq!(s.stats().count(JudgementKind::Miss), 1);
    assert!(!statuses.contains(&FrameStatus::Restarted));

    let statuses = run(&mut s, 1, 10);
    assert_eq!(statuses, vec![FrameStatus::Restarted]);
    assert_eq!(s.stats().total_judged(), 0);
    assert_eq!(s.chart().map(Chart::len), Some(2));
    assert_eq!(s.audio().plays, vec![0, 0]);
}

#[test]
fn test_perfect_run_restarts_on_great() {
    let options = PlayOptions {
        perfect_run: true,
        ..PlayOptions::default()
    };
    let mut s = session(vec![Note::new(0, 1000, 0).unwrap()], 1, config(), options);
    run(&mut s, 107, 10);
    s.press(0);
    assert_eq!(s.renderer().kinds(), vec![JudgementKind::Great]);

    assert_eq!(run(&mut s, 1, 10), vec![FrameStatus::Restarted]);
}

#[test]
fn test_loop_limit_restarts_playback() {
    let options = PlayOptions {
        start_from: 200,
        loop_limit: 300,
        ..PlayOptions::default()
    };
    let mut s = session(vec![Note::new(0, 5000, 0).unwrap()], 1, config(), options);
    let statuses = run(&mut s, 35, 10);

    let restarts = statuses.iter().filter(|&&status| status == FrameStatus::Restarted).count();
    assert_eq!(restarts, 1);
    assert_eq!(s.audio().plays, vec![200, 200]);
    assert!(s.time() < 500);
}

#[test]
fn test_aggressive_update_judges_within_frame() {
    let config = GameConfig {
        aggressive_update: true,
        aggressive_update_step: 4,
        ..config()
    };
    let mut s = session(vec![Note::new(0, 30, 0).unwrap()], 1, config, PlayOptions::default());
    s.set_autoplay(true);
    run(&mut s, 1, 40);

    let (kind, _, delta) = s.renderer().judged[0];
    assert_eq!(kind, JudgementKind::Perfect);
    assert!((0..4).contains(&delta));
}

#[test]
fn test_commands_drive_session() {
    let mut s = session(vec![Note::new(0, 5000, 0).unwrap()], 1, config(), PlayOptions::default());
    s.command_str("toggle-pause", KeyAction::Press).unwrap();
    assert_eq!(s.state(), SessionState::Paused);
    s.command_str("toggle-pause", KeyAction::Press).unwrap();
    assert_eq!(s.state(), SessionState::Playing);

    s.command_str("seek:2000", KeyAction::Press).unwrap();
    assert_eq!(s.start_offset(), 2000);
    s.command_str("seek:-5000", KeyAction::Press).unwrap();
    assert_eq!(s.start_offset(), 0);
    assert_eq!(s.audio().plays, vec![0, 2000, 0]);
}

proptest! {
    #[test]
    fn prop_best_combo_never_decreases(kinds in prop::collection::vec(0usize..5, 0..200)) {
        let mut stats = SessionStats::new();
        let mut best = 0;
        let mut score = 0;
        for i in kinds {
            stats.record(JudgementKind::ALL[i]);
            prop_assert!(stats.best_combo >= best);
            prop_assert!(stats.best_combo >= stats.combo);
            prop_assert!(stats.score >= score);
            best = stats.best_combo;
            score = stats.score;
        }
    }
}
