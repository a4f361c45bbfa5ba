use anyhow::Result;
use muz_model::{Chart, ChartBuilder};

/// A short four-lane chart: runs, chords and holds at 150 BPM.
pub fn demo_chart() -> Result<Chart> {
    let mut builder = ChartBuilder::new("demo", 4)?;
    builder.set_bpm(150.0).pause(1u32);

    for _ in 0..4 {
        for lane in [0, 1, 2, 3, 2, 1] {
            builder.lanes(&[lane]).beat(8u32)?;
        }
        builder.lanes(&[0, 3]).beat(4u32)?;
        builder.lanes(&[1]).hold(4u32, 2u32)?;
    }
    builder.lanes(&[0, 1, 2, 3]).beat(1u32)?;

    Ok(builder.build())
}
