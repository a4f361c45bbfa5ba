// muz: headless chart player.
//
// Loads a chart, prepares it and drives a play session frame by frame
// against a simulated audio transport, then prints the final stats as JSON.

mod demo;
mod script;
mod sim;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::LevelFilter;
use muz_model::{Chart, HoldMode, LaneOrder, PrepareOptions};
use muz_play::{CONFIG_FILE, FrameStatus, GameConfig, PlayOptions, Session, SessionState, SoundSet};

use script::Script;
use sim::{LogRenderer, LogSound, SimulatedTransport};

/// Audio keeps playing this long after the last note.
const SONG_TAIL_MS: i64 = 2000;

type HeadlessSession = Session<SimulatedTransport, LogRenderer>;

/// Give up after this much simulated time unless `--duration` says otherwise.
const DEFAULT_RUN_LIMIT_MS: i64 = 30 * 60 * 1000;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Critical,
    Error,
    Warning,
    Info,
    Debug,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Critical | LogLevel::Error => LevelFilter::Error,
            LogLevel::Warning => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "muz", about = "Headless player for muz rhythm charts")]
struct Args {
    /// Chart JSON file to play.
    #[arg(required_unless_present = "demo")]
    chart: Option<PathBuf>,

    /// Play the built-in demo chart.
    #[arg(long, conflicts_with = "chart")]
    demo: bool,

    /// Path to the game config JSON file.
    #[arg(long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Start playback at this position (ms).
    #[arg(long, default_value_t = 0)]
    start_from: i64,

    /// Restart after playing this many ms (0 = off).
    #[arg(long = "loop", default_value_t = 0)]
    loop_limit: i64,

    /// Restart on any combo break.
    #[arg(long)]
    fc_run: bool,

    /// Restart on anything below Perfect.
    #[arg(long)]
    perfect_run: bool,

    /// Let the scheduler pick a lane for every unreferenced note.
    #[arg(long)]
    random: bool,

    /// Replace holds with two taps.
    #[arg(long, conflicts_with_all = ["insane", "holdify"])]
    no_holds: bool,

    /// Strip holds and add notes between wide gaps.
    #[arg(long, conflicts_with = "holdify")]
    insane: bool,

    /// Merge consecutive taps on a lane into holds.
    #[arg(long)]
    holdify: bool,

    /// Shuffle lanes after scheduling.
    #[arg(long, conflicts_with = "mirror")]
    shuffle: bool,

    /// Mirror lanes after scheduling.
    #[arg(long)]
    mirror: bool,

    /// Play on this many lanes.
    #[arg(long)]
    lanes: Option<usize>,

    /// Stretch the chart in time by this factor.
    #[arg(long)]
    time_scale: Option<f64>,

    /// Shift every note by this many ms.
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    offset: i64,

    /// Seed for lane randomization.
    #[arg(long, env = "MUZ_SEED")]
    seed: Option<u64>,

    #[arg(long)]
    autoplay: bool,

    /// Simulated frames per second.
    #[arg(long, default_value_t = 60)]
    fps: u32,

    /// Report the audio position in steps of this many ms, like a backend
    /// that only updates its cursor once per buffer.
    #[arg(long, default_value_t = 1)]
    jitter: i64,

    /// Timed input script, one `<ms> <command> [up]` per line.
    #[arg(long)]
    script: Option<PathBuf>,

    /// Stop after this much simulated time (ms).
    #[arg(long)]
    duration: Option<i64>,

    #[arg(long, value_enum, default_value_t = LogLevel::Warning)]
    log_level: LogLevel,
}

impl Args {
    fn prepare_options(&self) -> PrepareOptions {
        let hold_mode = if self.no_holds {
            HoldMode::Strip
        } else if self.insane {
            HoldMode::Insane
        } else if self.holdify {
            HoldMode::Holdify
        } else {
            HoldMode::Keep
        };
        let lane_order = if self.shuffle {
            LaneOrder::Shuffle
        } else if self.mirror {
            LaneOrder::Mirror
        } else {
            LaneOrder::Identity
        };

        PrepareOptions {
            time_scale: self.time_scale,
            offset: self.offset,
            hold_mode,
            randomize: self.random,
            lane_order,
            num_lanes: self.lanes,
            seed: self.seed,
        }
    }

    fn play_options(&self) -> PlayOptions {
        PlayOptions {
            start_from: self.start_from,
            loop_limit: self.loop_limit,
            fc_run: self.fc_run,
            perfect_run: self.perfect_run,
            autoplay: self.autoplay,
            prepare: self.prepare_options(),
        }
    }
}

fn load_chart(path: &Path) -> Result<Chart> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read chart {}", path.display()))?;
    let chart: Chart = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse chart {}", path.display()))?;
    log::info!(
        "loaded '{}': {} notes on {} lanes",
        chart.name,
        chart.len(),
        chart.num_lanes()
    );
    Ok(chart)
}

/// End the simulated song after the last note of the prepared chart, which
/// offset and time scale may have moved away from the source.
fn fit_song_length(session: &mut HeadlessSession) {
    let end = session.chart().map_or(0, Chart::end_time);
    session.audio_mut().set_length(end + SONG_TAIL_MS);
    log::debug!("song length {} ms", end + SONG_TAIL_MS);
}

fn main() -> Result<()> {
    let args = Args::parse();
    env_logger::Builder::new()
        .filter_level(args.log_level.into())
        .parse_default_env()
        .init();

    let config = GameConfig::load_from(&args.config)?;
    let source = match &args.chart {
        Some(path) => load_chart(path)?,
        None => demo::demo_chart()?,
    };
    let mut script = match &args.script {
        Some(path) => Script::load(path)?,
        None => Script::default(),
    };
    if !script.is_empty() {
        log::info!("loaded {} scripted events", script.len());
    }

    let audio = SimulatedTransport::new(i64::MAX, args.jitter);
    let sounds = SoundSet {
        hit: Some(Box::new(LogSound("hit"))),
        hold: Some(Box::new(LogSound("hold"))),
        release: Some(Box::new(LogSound("release"))),
    };
    let mut session = Session::new(source, config, args.play_options(), audio, LogRenderer)
        .context("chart failed to prepare")?
        .with_sounds(sounds);
    if session.state() == SessionState::Stopped {
        session.resume()?;
    }
    fit_song_length(&mut session);

    let frame_ms = 1000.0 / f64::from(args.fps.max(1));
    let limit = args.duration.unwrap_or(DEFAULT_RUN_LIMIT_MS) as f64;
    let mut elapsed = 0.0;
    let mut restarts = 0;
    while elapsed < limit {
        session.audio_mut().advance(frame_ms);
        script.fire_due(&mut session)?;
        match session.update(frame_ms)? {
            FrameStatus::Restarted => {
                restarts += 1;
                fit_song_length(&mut session);
            }
            FrameStatus::Finished => log::debug!("audio ended, judging remaining notes"),
            FrameStatus::Idle | FrameStatus::Running => {}
        }
        elapsed += frame_ms;
        if session.is_settled() {
            break;
        }
    }
    if !session.is_settled() {
        log::warn!("stopped after {} ms of simulated time", elapsed as i64);
    }
    if restarts > 0 {
        log::info!("restarted {} times", restarts);
    }

    println!("{}", serde_json::to_string_pretty(session.stats())?);
    Ok(())
}
