//! Chart model for the muz rhythm game engine.
//!
//! Notes, charts, lane references, lane scheduling and the transforms that
//! turn an authored chart into a playable one.

pub mod builder;
pub mod chart;
pub mod error;
pub mod note;
pub mod prepare;
pub mod reference;
pub mod schedule;
pub mod transform;

pub use builder::ChartBuilder;
pub use chart::Chart;
pub use error::{ChartError, NoteError, PrepareError, ReferenceError, ScheduleError};
pub use note::{HINT_HOLD_TIME, Note};
pub use prepare::{HoldMode, LaneOrder, PrepareOptions, prepare};
