/// Music playback the session drives and polls.
/// Implementations: SimulatedTransport (headless runner), MockTransport (testing).
pub trait AudioTransport {
    /// Start playback at `start_ms` into the song.
    fn play(&mut self, start_ms: i64);

    fn stop(&mut self);

    fn is_paused(&self) -> bool;

    fn set_paused(&mut self, paused: bool);

    /// Song position in ms; negative when not playing.
    fn position(&self) -> i64;

    fn set_position(&mut self, ms: i64);
}

/// A short fire-and-forget sound (hit, hold, release).
pub trait SoundEffect {
    fn play(&mut self);
}

/// Transport whose position is set by the test.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    pub position: i64,
    pub playing: bool,
    pub paused: bool,
    /// Start positions of every `play` call
    pub plays: Vec<i64>,
    pub stops: usize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            position: -1,
            ..Self::default()
        }
    }

    /// Move the position forward while playing and unpaused.
    pub fn advance(&mut self, delta_ms: i64) {
        if self.playing && !self.paused {
            self.position += delta_ms;
        }
    }

    /// Simulate the song running out.
    pub fn finish(&mut self) {
        self.playing = false;
        self.position = -1;
    }
}

impl AudioTransport for MockTransport {
    fn play(&mut self, start_ms: i64) {
        self.plays.push(start_ms);
        self.position = start_ms;
        self.playing = true;
        self.paused = false;
    }

    fn stop(&mut self) {
        self.stops += 1;
        self.playing = false;
        self.position = -1;
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    fn position(&self) -> i64 {
        if self.playing { self.position } else { -1 }
    }

    fn set_position(&mut self, ms: i64) {
        self.position = ms;
    }
}

/// Sound effect that counts how often it played.
#[derive(Debug, Clone, Default)]
pub struct CountingSound {
    count: std::rc::Rc<std::cell::Cell<usize>>,
}

impl CountingSound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.count.get()
    }
}

impl SoundEffect for CountingSound {
    fn play(&mut self) {
        self.count.set(self.count.get() + 1);
    }
}
