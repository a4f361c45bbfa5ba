use crate::judgement::JudgementKind;

/// Receives gameplay events for display. Fire-and-forget.
/// Implementations: LogRenderer (headless runner), RecordingRenderer (testing).
pub trait RendererSink {
    /// `delta` is the signed timing error in ms (positive = late).
    fn note_judged(&mut self, kind: JudgementKind, lane: usize, delta: i64);

    fn lane_flashed(&mut self, lane: usize, pressed: bool);

    fn finished(&mut self);
}

/// Renderer that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl RendererSink for NullRenderer {
    fn note_judged(&mut self, _kind: JudgementKind, _lane: usize, _delta: i64) {}

    fn lane_flashed(&mut self, _lane: usize, _pressed: bool) {}

    fn finished(&mut self) {}
}

/// Renderer that keeps every event for inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    pub judged: Vec<(JudgementKind, usize, i64)>,
    pub flashes: Vec<(usize, bool)>,
    pub finished: usize,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kinds(&self) -> Vec<JudgementKind> {
        self.judged.iter().map(|&(kind, _, _)| kind).collect()
    }
}

impl RendererSink for RecordingRenderer {
    fn note_judged(&mut self, kind: JudgementKind, lane: usize, delta: i64) {
        self.judged.push((kind, lane, delta));
    }

    fn lane_flashed(&mut self, lane: usize, pressed: bool) {
        self.flashes.push((lane, pressed));
    }

    fn finished(&mut self) {
        self.finished += 1;
    }
}
