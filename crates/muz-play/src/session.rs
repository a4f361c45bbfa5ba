//! Play session lifecycle: start, pause, seek, loop and the per-frame update.
//!
//! A session owns the untouched source chart and re-prepares a working copy
//! whenever it (re)starts from scratch. One `update` call per rendered frame
//! drives judging and keeps the song clock in step with the audio transport.

use muz_model::{Chart, PrepareError, prepare};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::clock::{ClockSync, SyncOutcome};
use crate::command::{Command, KeyAction};
use crate::config::{GameConfig, PlayOptions};
use crate::judge::{JudgeEngine, JudgeEvent, SoundCue};
use crate::judgement::JudgementKind;
use crate::stats::SessionStats;
use crate::traits::{AudioTransport, RendererSink, SoundEffect};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not started yet, or stopped
    Stopped,
    Playing,
    Paused,
    /// The song ran out; late notes and pending restarts are still handled
    Finished,
}

/// What happened during one `update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// Nothing to do (stopped or paused)
    Idle,
    /// Stepped normally, including frames after the song ran out
    Running,
    /// A strict run or loop limit restarted the chart
    Restarted,
    /// Playback ended during this frame; reported once per run
    Finished,
}

/// Sound effects for hit feedback; any of them may be absent.
#[derive(Default)]
pub struct SoundSet {
    pub hit: Option<Box<dyn SoundEffect>>,
    pub hold: Option<Box<dyn SoundEffect>>,
    pub release: Option<Box<dyn SoundEffect>>,
}

pub struct Session<A: AudioTransport, R: RendererSink> {
    source: Chart,
    config: GameConfig,
    options: PlayOptions,
    audio: A,
    renderer: R,
    sounds: SoundSet,
    rng: StdRng,
    engine: Option<JudgeEngine>,
    clock: ClockSync,
    stats: SessionStats,
    state: SessionState,
    autoplay: bool,
    start_offset: i64,
    need_restart: bool,
    noterate: f64,
    /// Cues already played during the current step
    played: Vec<SoundCue>,
}

impl<A: AudioTransport, R: RendererSink> Session<A, R> {
    /// Create a session; starts playing right away unless `start_paused`.
    pub fn new(
        source: Chart,
        config: GameConfig,
        options: PlayOptions,
        audio: A,
        renderer: R,
    ) -> Result<Self, PrepareError> {
        let rng = match options.prepare.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let start_offset = options.start_from.max(0);

        let mut session = Self {
            clock: ClockSync::new(start_offset, config.interpolate_music_time),
            autoplay: options.autoplay || config.start_autoplay,
            noterate: config.noterate,
            source,
            config,
            options,
            audio,
            renderer,
            sounds: SoundSet::default(),
            rng,
            engine: None,
            stats: SessionStats::new(),
            state: SessionState::Stopped,
            start_offset,
            need_restart: false,
            played: Vec::new(),
        };

        if !session.config.start_paused {
            session.start(true)?;
        }
        Ok(session)
    }

    pub fn with_sounds(mut self, sounds: SoundSet) -> Self {
        self.sounds = sounds;
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Finished with every note judged and no restart pending.
    pub fn is_settled(&self) -> bool {
        self.state == SessionState::Finished
            && !self.need_restart
            && self.engine.as_ref().is_none_or(|engine| engine.remaining() == 0)
    }

    fn is_running(&self) -> bool {
        matches!(self.state, SessionState::Playing | SessionState::Finished)
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Current song time in ms.
    pub fn time(&self) -> i64 {
        self.clock.now() as i64
    }

    pub fn clock(&self) -> &ClockSync {
        &self.clock
    }

    /// Current scroll speed multiplier, combo-dependent.
    pub fn noterate(&self) -> f64 {
        self.noterate
    }

    /// Scroll speed including the chart's own multiplier.
    pub fn scroll_speed(&self) -> f64 {
        self.noterate * self.source.noterate
    }

    pub fn autoplay(&self) -> bool {
        self.autoplay
    }

    pub fn set_autoplay(&mut self, autoplay: bool) {
        self.autoplay = autoplay;
    }

    pub fn start_offset(&self) -> i64 {
        self.start_offset
    }

    pub fn source(&self) -> &Chart {
        &self.source
    }

    /// The working chart, once started.
    pub fn chart(&self) -> Option<&Chart> {
        self.engine.as_ref().map(JudgeEngine::chart)
    }

    pub fn engine(&self) -> Option<&JudgeEngine> {
        self.engine.as_ref()
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Begin playback at the start offset.
    ///
    /// With `refresh` the source chart is prepared anew; otherwise the
    /// current working chart is kept (minus notes before the offset).
    pub fn start(&mut self, refresh: bool) -> Result<(), PrepareError> {
        match (&mut self.engine, refresh) {
            (Some(engine), false) => engine.restart(),
            (engine, _) => {
                let chart = prepare(&self.source, &self.options.prepare, &mut self.rng)
                    .inspect_err(|err| log::error!("chart failed to prepare: {}", err))?;
                *engine = Some(JudgeEngine::new(chart));
            }
        }
        if let Some(engine) = self.engine.as_mut() {
            engine.discard_before(self.start_offset);
        }

        self.audio.play(self.start_offset);
        self.clock.restart(self.start_offset);
        self.state = SessionState::Playing;
        self.played.clear();
        log::info!("started '{}' at {} ms", self.source.name, self.start_offset);
        Ok(())
    }

    pub fn pause(&mut self) {
        if self.state == SessionState::Playing {
            self.audio.set_paused(true);
            self.state = SessionState::Paused;
        }
    }

    /// Unpause, or start if stopped.
    pub fn resume(&mut self) -> Result<(), PrepareError> {
        match self.state {
            SessionState::Stopped => self.start(self.engine.is_none()),
            SessionState::Paused => {
                self.audio.set_paused(false);
                self.state = SessionState::Playing;
                Ok(())
            }
            SessionState::Playing | SessionState::Finished => Ok(()),
        }
    }

    pub fn toggle_pause(&mut self) -> Result<(), PrepareError> {
        if self.state == SessionState::Playing {
            self.pause();
            Ok(())
        } else {
            self.resume()
        }
    }

    /// Stop playback, remembering the current time as the next start offset.
    pub fn stop(&mut self) {
        if self.state == SessionState::Stopped {
            return;
        }
        self.start_offset = self.time().max(0);
        self.audio.stop();
        self.state = SessionState::Stopped;
    }

    /// Jump by `delta` ms. Seeking backward re-prepares the chart so judged
    /// notes come back; seeking forward keeps the current schedule.
    pub fn seek(&mut self, delta: i64) -> Result<(), PrepareError> {
        if delta == 0 || self.state != SessionState::Playing {
            return Ok(());
        }
        let now = self.time();
        self.audio.stop();
        self.start_offset = (now + delta).max(0);
        self.clock.force_resync();
        log::info!("seek {:+} ms to {} ms", delta, self.start_offset);
        self.start(delta < 0)
    }

    /// Advance one rendered frame of `delta` ms.
    pub fn update(&mut self, delta: f64) -> Result<FrameStatus, PrepareError> {
        if !self.is_running() {
            return Ok(FrameStatus::Idle);
        }
        if !self.config.aggressive_update {
            return self.step(delta);
        }

        let step = f64::from(self.config.aggressive_update_step.max(1));
        let mut left = delta;
        let mut status = FrameStatus::Running;
        while left > 0.0 && self.is_running() {
            let dt = step.min(left);
            left -= dt;
            status = match (status, self.step(dt)?) {
                (FrameStatus::Finished, _) | (_, FrameStatus::Finished) => FrameStatus::Finished,
                (FrameStatus::Restarted, _) | (_, FrameStatus::Restarted) => FrameStatus::Restarted,
                (_, other) => other,
            };
        }
        Ok(status)
    }

    fn step(&mut self, dt: f64) -> Result<FrameStatus, PrepareError> {
        let mut restarted = false;
        let loop_ended = self.options.loop_limit > 0
            && self.time() > self.start_offset + self.options.loop_limit;
        if self.need_restart || loop_ended {
            log::info!("restarting '{}'", self.source.name);
            self.need_restart = false;
            self.stats.reset();
            self.start(true)?;
            restarted = true;
        }

        self.played.clear();
        let now = self.time();
        if let Some(engine) = self.engine.as_mut() {
            engine.flush_removals();
            engine.scan(now, self.autoplay, &mut self.stats);
        }
        self.dispatch_events();

        let prior = self.clock.now();
        let outcome = self.clock.step(dt, self.audio.position());
        self.update_noterate(self.clock.now() - prior);

        if outcome == SyncOutcome::Finished {
            log::info!("'{}' finished: score {}", self.source.name, self.stats.score);
            self.state = SessionState::Finished;
            self.renderer.finished();
            return Ok(FrameStatus::Finished);
        }
        Ok(if restarted {
            FrameStatus::Restarted
        } else {
            FrameStatus::Running
        })
    }

    pub fn press(&mut self, lane: usize) {
        if !self.is_running() {
            return;
        }
        let now = self.time();
        if let Some(engine) = self.engine.as_mut() {
            engine.press(lane, now, &mut self.stats);
        }
        self.dispatch_events();
    }

    pub fn release(&mut self, lane: usize) {
        if !self.is_running() {
            return;
        }
        let now = self.time();
        if let Some(engine) = self.engine.as_mut() {
            engine.release(lane, now, &mut self.stats);
        }
        self.dispatch_events();
    }

    pub fn command(&mut self, command: Command, action: KeyAction) -> Result<(), PrepareError> {
        match (command, action) {
            (Command::ToggleAutoplay, KeyAction::Press) => {
                self.autoplay = !self.autoplay;
                log::info!("autoplay {}", if self.autoplay { "on" } else { "off" });
            }
            (Command::TogglePause, KeyAction::Press) => self.toggle_pause()?,
            (Command::Seek(delta), KeyAction::Press) => self.seek(delta)?,
            (Command::Lane(lane), KeyAction::Press) => self.press(lane),
            (Command::Lane(lane), KeyAction::Release) => self.release(lane),
            (_, KeyAction::Release) => {}
        }
        Ok(())
    }

    /// Parse and run a command; unknown commands are logged and ignored.
    pub fn command_str(&mut self, input: &str, action: KeyAction) -> Result<(), PrepareError> {
        match input.parse::<Command>() {
            Ok(command) => self.command(command, action),
            Err(err) => {
                log::warn!("ignoring command: {}", err);
                Ok(())
            }
        }
    }

    fn dispatch_events(&mut self) {
        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        for event in engine.drain_events() {
            match event {
                JudgeEvent::Judged { kind, lane, delta } => {
                    self.renderer.note_judged(kind, lane, delta);
                    self.check_strict_run(kind);
                }
                JudgeEvent::LaneFlashed { lane, pressed } => {
                    self.renderer.lane_flashed(lane, pressed);
                }
                JudgeEvent::Sound(cue) => self.play_sound(cue),
            }
        }
    }

    fn check_strict_run(&mut self, kind: JudgementKind) {
        let failed = (self.options.perfect_run && kind != JudgementKind::Perfect)
            || (self.options.restarts_on_combo_break() && self.stats.combo_breaks > 0);
        if failed && !self.need_restart {
            log::info!("strict run broken by {}", kind);
            self.need_restart = true;
        }
    }

    fn play_sound(&mut self, cue: SoundCue) {
        let cue = match cue {
            SoundCue::Hold if !self.config.use_hold_sound => SoundCue::Release,
            other => other,
        };
        if self.played.contains(&cue) {
            return;
        }
        self.played.push(cue);

        let sound = match cue {
            SoundCue::Hit => &mut self.sounds.hit,
            SoundCue::Hold => &mut self.sounds.hold,
            SoundCue::Release => &mut self.sounds.release,
        };
        if let Some(sound) = sound.as_mut() {
            sound.play();
        }
    }

    fn update_noterate(&mut self, advanced: f64) {
        let target = self.config.noterate + f64::from(self.stats.combo) * self.config.noterate_per_combo;
        let next = self.noterate
            + (target - self.noterate) * (advanced / 1000.0) * self.config.noterate_gain_speed;
        self.noterate = next.min(self.config.max_noterate).max(0.0);
    }
}
