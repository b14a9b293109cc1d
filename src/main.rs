use std::{
    io::{self, Write},
    thread,
    time::Duration,
};

use anyhow::{Context, Result};
use tracing::{error, info};

use crate::{
    args::{Action, Args},
    audio::{
        devices,
        playback::{CpalOutput, PlaybackState},
        tone,
    },
    params::ToneParameters,
    session::Session,
};

mod args;
mod audio;
mod error;
mod interactive;
mod misc;
mod params;
mod record;
mod session;

const TAIL_LATENCY: Duration = Duration::from_millis(100);

fn main() {
    let args = args::parse_args();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_target(false)
        .init();

    if let Err(err) = run(args) {
        error!("{err:#}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let params = args.params()?;

    match args.action {
        Action::Info { json, preview } => print_info(&params, json, preview),
        Action::Record { path } => record::record(&tone::generate(&params), &path)
            .with_context(|| format!("Recording to `{}`", path.display())),
        Action::Devices => {
            for name in devices::output_device_names()? {
                println!("{name}");
            }
            Ok(())
        }
        Action::Play => {
            let mut session = open_session(params, &args.output_device)?;
            info!("{}", session.status_text());
            session.play()?;
            while session.state() == PlaybackState::Playing {
                thread::sleep(Duration::from_millis(20));
            }

            // The device still has to play out the last period it pulled
            thread::sleep(TAIL_LATENCY);
            Ok(())
        }
        Action::Interactive => {
            let mut session = open_session(params, &args.output_device)?;
            interactive::run(&mut session, io::stdin().lock(), io::stdout())
        }
    }
}

fn open_session(params: ToneParameters, device: &str) -> Result<Session<CpalOutput>> {
    let device = devices::output_device(device)?;
    let output = CpalOutput::new(device, params.sample_rate())
        .context("Opening the output device")?;
    Ok(Session::new(params, output))
}

fn print_info(params: &ToneParameters, json: bool, preview: Option<usize>) -> Result<()> {
    let mut out = io::stdout().lock();
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(params)?)?;
    } else {
        writeln!(out, "{}", params.status_text())?;
    }

    if let Some(count) = preview {
        let buffer = tone::generate(params);
        writeln!(out, "time,sample")?;
        for (time, sample) in buffer.preview(count) {
            writeln!(out, "{time:.6},{sample:.6}")?;
        }
    }

    Ok(())
}
