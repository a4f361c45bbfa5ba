//! Stand-ins for the audio and display backends of a headless run.

use muz_play::JudgementKind;
use muz_play::traits::{AudioTransport, RendererSink, SoundEffect};

/// Audio transport driven by simulated time.
///
/// Reports its position rounded down to `granularity` ms, the way real
/// backends update their playback cursor in buffer-sized steps. Playback
/// ends on its own once the position passes `length`.
#[derive(Debug, Clone)]
pub struct SimulatedTransport {
    position: f64,
    length: i64,
    granularity: i64,
    playing: bool,
    paused: bool,
}

impl SimulatedTransport {
    pub fn new(length: i64, granularity: i64) -> Self {
        Self {
            position: 0.0,
            length,
            granularity: granularity.max(1),
            playing: false,
            paused: false,
        }
    }

    pub fn length(&self) -> i64 {
        self.length
    }

    /// Change where the song ends, e.g. once the played chart is known.
    pub fn set_length(&mut self, length: i64) {
        self.length = length;
        if self.playing && self.position >= length as f64 {
            self.playing = false;
        }
    }

    pub fn advance(&mut self, ms: f64) {
        if !self.playing || self.paused {
            return;
        }
        self.position += ms;
        if self.position >= self.length as f64 {
            log::debug!("simulated song ended at {} ms", self.length);
            self.playing = false;
        }
    }
}

impl AudioTransport for SimulatedTransport {
    fn play(&mut self, start_ms: i64) {
        self.position = start_ms as f64;
        self.playing = start_ms < self.length;
        self.paused = false;
    }

    fn stop(&mut self) {
        self.playing = false;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    fn position(&self) -> i64 {
        if !self.playing {
            return -1;
        }
        let ms = self.position as i64;
        ms - ms % self.granularity
    }

    fn set_position(&mut self, ms: i64) {
        self.position = ms as f64;
    }
}

/// Renderer that writes gameplay events to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogRenderer;

impl RendererSink for LogRenderer {
    fn note_judged(&mut self, kind: JudgementKind, lane: usize, delta: i64) {
        log::debug!("lane {}: {} ({:+} ms)", lane, kind, delta);
    }

    fn lane_flashed(&mut self, lane: usize, pressed: bool) {
        log::trace!("lane {} {}", lane, if pressed { "down" } else { "up" });
    }

    fn finished(&mut self) {
        log::info!("playback finished");
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LogSound(pub &'static str);

impl SoundEffect for LogSound {
    fn play(&mut self) {
        log::trace!("sound: {}", self.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_snaps_to_granularity() {
        let mut audio = SimulatedTransport::new(10_000, 25);
        assert_eq!(audio.position(), -1);

        audio.play(100);
        audio.advance(16.7);
        assert_eq!(audio.position(), 100);
        audio.advance(16.7);
        assert_eq!(audio.position(), 125);
    }

    #[test]
    fn test_pause_freezes_position() {
        let mut audio = SimulatedTransport::new(10_000, 1);
        audio.play(0);
        audio.set_paused(true);
        audio.advance(500.0);
        assert_eq!(audio.position(), 0);
        assert!(audio.is_paused());
    }

    #[test]
    fn test_ends_after_length() {
        let mut audio = SimulatedTransport::new(1000, 1);
        audio.play(900);
        audio.advance(99.0);
        assert_eq!(audio.position(), 999);
        audio.advance(1.0);
        assert_eq!(audio.position(), -1);

        audio.play(2000);
        assert_eq!(audio.position(), -1);
    }

    #[test]
    fn test_set_length_moves_song_end() {
        let mut audio = SimulatedTransport::new(i64::MAX, 1);
        audio.play(0);
        audio.advance(500.0);
        audio.set_length(3000);
        assert_eq!(audio.length(), 3000);
        audio.advance(2499.0);
        assert_eq!(audio.position(), 2999);

        audio.set_length(1000);
        assert_eq!(audio.position(), -1);
    }
}
