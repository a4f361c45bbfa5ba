pub mod audio;
pub mod render;

pub use audio::{AudioTransport, CountingSound, MockTransport, SoundEffect};
pub use render::{NullRenderer, RecordingRenderer, RendererSink};
