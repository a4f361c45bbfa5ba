//! Timed input scripts for headless runs.
//!
//! One event per line: `<ms> <command> [up]`. Blank lines and lines starting
//! with `#` are ignored. Without `up` the command is a key press.
//!
//! ```text
//! 1000 lane:0
//! 1400 lane:0 up
//! 5000 seek:-2000
//! ```

use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use muz_model::PrepareError;
use muz_play::traits::{AudioTransport, RendererSink};
use muz_play::{KeyAction, Session};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptEvent {
    pub at: i64,
    pub command: String,
    pub action: KeyAction,
}

#[derive(Debug, Clone, Default)]
pub struct Script {
    events: VecDeque<ScriptEvent>,
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?;
        content
            .parse::<Self>()
            .with_context(|| format!("failed to parse script {}", path.display()))
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Send every event due at the session's current time.
    pub fn fire_due<A: AudioTransport, R: RendererSink>(
        &mut self,
        session: &mut Session<A, R>,
    ) -> Result<(), PrepareError> {
        while let Some(event) = self.events.front() {
            if event.at > session.time() {
                break;
            }
            if let Some(event) = self.events.pop_front() {
                log::debug!("script at {} ms: {}", event.at, event.command);
                session.command_str(&event.command, event.action)?;
            }
        }
        Ok(())
    }
}

impl FromStr for Script {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut events = Vec::new();
        for (number, line) in s.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut words = line.split_whitespace();
            let (Some(at), Some(command)) = (words.next(), words.next()) else {
                bail!("line {}: expected `<ms> <command> [up]`", number + 1);
            };
            let at: i64 = at
                .parse()
                .with_context(|| format!("line {}: bad time {:?}", number + 1, at))?;
            let action = match words.next() {
                None | Some("down") => KeyAction::Press,
                Some("up") => KeyAction::Release,
                Some(other) => bail!("line {}: unknown key action {:?}", number + 1, other),
            };
            events.push(ScriptEvent {
                at,
                command: command.to_string(),
                action,
            });
        }
        events.sort_by_key(|event| event.at);
        Ok(Self {
            events: events.into(),
        })
    }
}
