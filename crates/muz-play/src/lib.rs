//! Gameplay runtime for muz: judging, scoring, clock sync and the play session.

pub mod clock;
pub mod command;
pub mod config;
pub mod error;
pub mod judge;
pub mod judgement;
pub mod session;
pub mod stats;
pub mod traits;

pub use clock::{ClockSync, SyncOutcome};
pub use command::{Command, KeyAction};
pub use config::{CONFIG_FILE, GameConfig, PlayOptions};
pub use error::CommandError;
pub use judge::{JudgeEngine, JudgeEvent, SoundCue};
pub use judgement::JudgementKind;
pub use session::{FrameStatus, Session, SessionState, SoundSet};
pub use stats::SessionStats;
