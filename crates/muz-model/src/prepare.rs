//! Turning an authored chart into a playable one.
//!
//! Steps run in a fixed order: lane count, scale, offset, hold mode,
//! randomize, schedule (which also resolves references), hint removal and
//! lane reordering last, so reordering never disturbs resolved references.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::chart::Chart;
use crate::error::PrepareError;
use crate::{schedule, transform};

/// How hold notes are treated before play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HoldMode {
    #[default]
    Keep,
    /// Replace holds by a tap at each end
    Strip,
    /// Strip holds, then fill wide gaps with extra taps
    Insane,
    /// Merge consecutive notes into holds
    Holdify,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LaneOrder {
    #[default]
    Identity,
    Shuffle,
    Mirror,
    Custom(Vec<usize>),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PrepareOptions {
    pub time_scale: Option<f64>,
    pub offset: i64,
    pub hold_mode: HoldMode,
    pub randomize: bool,
    pub lane_order: LaneOrder,
    pub num_lanes: Option<usize>,
    pub seed: Option<u64>,
}

/// Produce a playable copy of `source`; the source is never modified.
pub fn prepare<R: Rng + ?Sized>(
    source: &Chart,
    options: &PrepareOptions,
    rng: &mut R,
) -> Result<Chart, PrepareError> {
    let mut chart = source.clone();
    chart.fix();

    if let Some(num_lanes) = options.num_lanes {
        chart.set_num_lanes(num_lanes)?;
        transform::clamp_lanes_to_count(&mut chart);
    }

    if let Some(factor) = options.time_scale {
        transform::scale(&mut chart, factor);
    }
    if options.offset != 0 {
        transform::shift(&mut chart, options.offset);
    }

    match options.hold_mode {
        HoldMode::Keep => {}
        HoldMode::Strip => transform::strip_holds(&mut chart),
        HoldMode::Insane => {
            transform::strip_holds(&mut chart);
            transform::insanify(&mut chart, rng);
        }
        HoldMode::Holdify => transform::synthesize_holds(&mut chart),
    }

    if options.randomize {
        transform::randomize(&mut chart);
    }

    schedule::schedule_lanes(&mut chart, rng)?;
    transform::strip_hints(&mut chart);

    match &options.lane_order {
        LaneOrder::Identity => {}
        LaneOrder::Shuffle => transform::shuffle_lanes(&mut chart, rng),
        LaneOrder::Mirror => transform::mirror_lanes(&mut chart),
        LaneOrder::Custom(order) => transform::reorder_lanes(&mut chart, order)?,
    }

    debug_assert!(chart.is_playable());
    log::debug!(
        "prepared '{}': {} notes on {} lanes",
        chart.name,
        chart.len(),
        chart.num_lanes()
    );
    Ok(chart)
}
