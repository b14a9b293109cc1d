//! Line based control surface.
//! Reads one command per line and applies it to a [`Session`].

use std::{
    io::{BufRead, Write},
    str::FromStr,
};

use anyhow::Result;
use tracing::info;

use crate::{audio::playback::AudioOutput, record::DEFAULT_PATH, session::Session};

const HELP: &str = "\
Commands:
  play  | p | space    Play the tone (restarts if already playing)
  stop  | s | esc      Stop playback
  freq  | f <Hz>       Set the frequency (0-3000)
  + / -                Nudge the frequency by 10Hz
  vol   | v <0-1>      Set the volume
  dur   | d <s>        Set the duration (0.1-10)
  wave  | w <kind>     sine, square, triangle or sawtooth
  record | r [path]    Save the tone as a WAV file (default tone.wav)
  status               Show the current tone
  help  | h | ?        Show this message
  quit  | q | exit     Stop and exit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Play,
    Stop,
    Frequency(String),
    Nudge(i64),
    Volume(String),
    Duration(String),
    Waveform(String),
    Record(Option<String>),
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (cmd, arg) = match s.split_once(char::is_whitespace) {
            Some((cmd, arg)) => (cmd, Some(arg.trim().to_owned())),
            None => (s, None),
        };

        let need = |arg: Option<String>| arg.ok_or_else(|| format!("`{cmd}` needs a value"));
        Ok(match cmd.to_ascii_lowercase().as_str() {
            "play" | "p" | "space" => Command::Play,
            "stop" | "s" | "esc" => Command::Stop,
            "freq" | "f" => Command::Frequency(need(arg)?),
            "+" => Command::Nudge(1),
            "-" => Command::Nudge(-1),
            "vol" | "v" => Command::Volume(need(arg)?),
            "dur" | "d" => Command::Duration(need(arg)?),
            "wave" | "w" => Command::Waveform(need(arg)?),
            "record" | "r" => Command::Record(arg),
            "status" => Command::Status,
            "help" | "h" | "?" => Command::Help,
            "quit" | "q" | "exit" => Command::Quit,
            _ => return Err(format!("Unknown command `{cmd}`, try `help`")),
        })
    }
}

/// Runs commands from `input` until it ends or a quit command comes in.
/// Failed commands are reported to `out` and never end the loop.
pub fn run<O: AudioOutput>(
    session: &mut Session<O>,
    input: impl BufRead,
    mut out: impl Write,
) -> Result<()> {
    writeln!(out, "{HELP}")?;
    writeln!(out, "{}", session.status_text())?;

    let mut lines = input.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(i) => i,
            Err(err) => {
                writeln!(out, "[-] {err}")?;
                continue;
            }
        };

        if command == Command::Quit {
            break;
        }

        if let Err(err) = execute(session, command, &mut out) {
            writeln!(out, "[-] {err}")?;
        }
    }

    session.stop();
    info!("Leaving interactive mode");
    Ok(())
}

fn execute<O: AudioOutput>(
    session: &mut Session<O>,
    command: Command,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Command::Play => session.play()?,
        Command::Stop => {
            session.stop();
        }
        Command::Frequency(hz) => {
            session.set_frequency_text(&hz)?;
        }
        Command::Nudge(steps) => {
            session.nudge_frequency(steps);
        }
        Command::Volume(volume) => {
            session.set_volume_text(&volume)?;
        }
        Command::Duration(seconds) => {
            session.set_duration_text(&seconds)?;
        }
        Command::Waveform(kind) => {
            session.set_waveform_text(&kind)?;
        }
        Command::Record(path) => {
            let path = path.unwrap_or_else(|| DEFAULT_PATH.to_owned());
            session.record(&path)?;
            writeln!(out, "[*] Tone recorded to {path}")?;
            return Ok(());
        }
        Command::Help => {
            writeln!(out, "{HELP}")?;
            return Ok(());
        }
        Command::Status | Command::Quit => {}
    }

    writeln!(out, "{}", session.status_text())?;
    Ok(())
}
