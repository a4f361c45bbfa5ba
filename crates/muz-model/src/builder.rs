//! Tempo-based chart authoring.
//!
//! Positions advance in fractions of a tact (four beats): a delay of `4`
//! means a quarter tact, `8` an eighth, `0` no delay. Several fractions
//! passed together add up, so `[4.0, 8.0]` is a dotted quarter.

use crate::chart::Chart;
use crate::error::{ChartError, NoteError};
use crate::note::Note;

pub const DEFAULT_TACT_LENGTH: f64 = 1000.0;

/// A delay expressed as tact fractions.
pub trait Fraction {
    fn to_ms(&self, tact_length: f64) -> f64;
}

impl Fraction for f64 {
    fn to_ms(&self, tact_length: f64) -> f64 {
        if *self == 0.0 { 0.0 } else { tact_length / self }
    }
}

impl Fraction for u32 {
    fn to_ms(&self, tact_length: f64) -> f64 {
        f64::from(*self).to_ms(tact_length)
    }
}

impl<T: Fraction> Fraction for [T] {
    fn to_ms(&self, tact_length: f64) -> f64 {
        self.iter().map(|f| f.to_ms(tact_length)).sum()
    }
}

impl<T: Fraction, const N: usize> Fraction for [T; N] {
    fn to_ms(&self, tact_length: f64) -> f64 {
        self.as_slice().to_ms(tact_length)
    }
}

impl<T: Fraction + ?Sized> Fraction for &T {
    fn to_ms(&self, tact_length: f64) -> f64 {
        (**self).to_ms(tact_length)
    }
}

#[derive(Debug, Clone)]
pub struct ChartBuilder {
    chart: Chart,
    pos: f64,
    tact_length: f64,
    lanes: Vec<usize>,
}

impl ChartBuilder {
    pub fn new(name: impl Into<String>, num_lanes: usize) -> Result<Self, ChartError> {
        Ok(Self {
            chart: Chart::new(name, num_lanes)?,
            pos: 0.0,
            tact_length: DEFAULT_TACT_LENGTH,
            lanes: Vec::new(),
        })
    }

    pub fn bpm(&self) -> f64 {
        60000.0 / (self.tact_length / 4.0)
    }

    pub fn set_bpm(&mut self, bpm: f64) -> &mut Self {
        self.tact_length = (60000.0 / bpm) * 4.0;
        self
    }

    /// Current position in ms.
    pub fn position(&self) -> f64 {
        self.pos
    }

    /// Select the lanes subsequent notes go to.
    pub fn lanes(&mut self, lanes: &[usize]) -> &mut Self {
        self.lanes = lanes.to_vec();
        self
    }

    /// Place a tap on every selected lane, then advance by `delay`.
    pub fn beat(&mut self, delay: impl Fraction) -> Result<&mut Self, NoteError> {
        self.place(0)?;
        self.raw_pause(delay.to_ms(self.tact_length));
        Ok(self)
    }

    /// Place a hold lasting `hold` on every selected lane, then advance by `delay`.
    pub fn hold(&mut self, hold: impl Fraction, delay: impl Fraction) -> Result<&mut Self, NoteError> {
        let hold_ms = hold.to_ms(self.tact_length) as i64;
        self.place(hold_ms)?;
        self.raw_pause(delay.to_ms(self.tact_length));
        Ok(self)
    }

    pub fn pause(&mut self, delay: impl Fraction) -> &mut Self {
        self.raw_pause(delay.to_ms(self.tact_length))
    }

    pub fn raw_pause(&mut self, ms: f64) -> &mut Self {
        self.pos += ms;
        self
    }

    pub fn build(mut self) -> Chart {
        self.chart.fix();
        self.chart
    }

    fn place(&mut self, hold_ms: i64) -> Result<(), NoteError> {
        for &lane in &self.lanes {
            self.chart.push(Note::new(lane, self.pos as i64, hold_ms)?);
        }
        Ok(())
    }
}
