use std::str::FromStr;

use crate::error::CommandError;

/// Lane-agnostic action coming from the input layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ToggleAutoplay,
    TogglePause,
    /// Press on key down, release on key up
    Lane(usize),
    /// Jump by this many ms
    Seek(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Press,
    Release,
}

impl FromStr for Command {
    type Err = CommandError;

    /// Parses `toggle-autoplay`, `toggle-pause`, `lane:<n>` and `seek:<ms>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, arg) = match s.split_once(':') {
            Some((name, arg)) => (name, Some(arg)),
            None => (s, None),
        };

        match name {
            "toggle-autoplay" => Ok(Self::ToggleAutoplay),
            "toggle-pause" => Ok(Self::TogglePause),
            "lane" | "band" => parse_arg(name, arg).map(Self::Lane),
            "seek" => parse_arg(name, arg).map(Self::Seek),
            _ => Err(CommandError::Unknown(s.to_string())),
        }
    }
}

fn parse_arg<T: FromStr>(command: &str, arg: Option<&str>) -> Result<T, CommandError> {
    let value = arg.ok_or_else(|| CommandError::MissingArgument(command.to_string()))?;
    value.trim().parse().map_err(|_| CommandError::BadArgument {
        command: command.to_string(),
        value: value.to_string(),
    })
}
