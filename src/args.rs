use std::path::PathBuf;

use clap::{builder::EnumValueParser, value_parser, Arg, ArgAction, ArgMatches, Command};
use tracing::Level;

use crate::{
    audio::tone::Waveform, error::Result, params::ToneParameters, record::DEFAULT_PATH,
};

pub struct Args {
    pub frequency: i64,
    pub volume: f32,
    pub duration: f64,
    pub waveform: Waveform,
    pub output_device: String,
    pub log_level: Level,
    pub action: Action,
}

pub enum Action {
    Play,
    Record { path: PathBuf },
    Info { json: bool, preview: Option<usize> },
    Devices,
    Interactive,
}

pub fn parse_args() -> Args {
    from_matches(&command().get_matches())
}

fn command() -> Command {
    Command::new("tone-generator")
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .args([
            Arg::new("frequency")
                .short('f')
                .long("frequency")
                .help("Tone frequency in Hz, clamped to 0-3000")
                .allow_negative_numbers(true)
                .value_parser(value_parser!(i64))
                .default_value("440")
                .global(true),
            Arg::new("volume")
                .short('a')
                .long("volume")
                .visible_alias("amplitude")
                .help("Linear gain, clamped to 0-1")
                .allow_negative_numbers(true)
                .value_parser(value_parser!(f32))
                .default_value("0.5")
                .global(true),
            Arg::new("duration")
                .short('d')
                .long("duration")
                .help("Tone length in seconds, clamped to 0.1-10")
                .allow_negative_numbers(true)
                .value_parser(value_parser!(f64))
                .default_value("1")
                .global(true),
            Arg::new("waveform")
                .short('w')
                .long("waveform")
                .value_parser(EnumValueParser::<Waveform>::new())
                .default_value("sine")
                .global(true),
            Arg::new("output-device")
                .short('o')
                .long("output-device")
                .help("Output device name, or `default`")
                .default_value("default")
                .global(true),
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .conflicts_with("quiet")
                .global(true),
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .global(true),
        ])
        .subcommands([
            Command::new("play")
                .alias("p")
                .about("Plays the tone once."),
            Command::new("record")
                .alias("r")
                .about("Saves the tone as a 16 bit mono WAV file.")
                .arg(
                    Arg::new("path")
                        .value_parser(value_parser!(PathBuf))
                        .default_value(DEFAULT_PATH),
                ),
            Command::new("info")
                .alias("status")
                .about("Prints the current tone settings.")
                .args([
                    Arg::new("json")
                        .long("json")
                        .help("Print the settings as JSON")
                        .action(ArgAction::SetTrue),
                    Arg::new("preview")
                        .long("preview")
                        .help("Also print the first N samples (1000 if no N) as `time,sample` lines")
                        .num_args(0..=1)
                        .default_missing_value("1000")
                        .value_parser(value_parser!(usize)),
                ]),
            Command::new("devices").about("Lists the available output devices."),
            Command::new("interactive")
                .alias("i")
                .about("Reads commands from stdin (default)."),
        ])
}

fn from_matches(m: &ArgMatches) -> Args {
    Args {
        frequency: *m.get_one::<i64>("frequency").unwrap_or(&440),
        volume: *m.get_one::<f32>("volume").unwrap_or(&0.5),
        duration: *m.get_one::<f64>("duration").unwrap_or(&1.0),
        waveform: *m.get_one::<Waveform>("waveform").unwrap_or(&Waveform::Sine),
        output_device: m
            .get_one::<String>("output-device")
            .cloned()
            .unwrap_or_else(|| "default".to_owned()),
        log_level: log_level(m),
        action: action(m),
    }
}

impl Args {
    /// Starting parameters, run through the same setters as runtime updates.
    pub fn params(&self) -> Result<ToneParameters> {
        let mut params = ToneParameters::new();
        params.set_frequency(self.frequency);
        params.set_volume(self.volume)?;
        params.set_duration(self.duration)?;
        params.set_waveform(self.waveform);
        Ok(params)
    }
}

fn log_level(m: &ArgMatches) -> Level {
    if m.get_flag("verbose") {
        Level::DEBUG
    } else if m.get_flag("quiet") {
        Level::WARN
    } else {
        Level::INFO
    }
}

fn action(m: &ArgMatches) -> Action {
    match m.subcommand() {
        Some(("play", _)) => Action::Play,
        Some(("record", m)) => Action::Record {
            path: m
                .get_one::<PathBuf>("path")
                .cloned()
                .unwrap_or_else(|| DEFAULT_PATH.into()),
        },
        Some(("info", m)) => Action::Info {
            json: m.get_flag("json"),
            preview: m.get_one::<usize>("preview").copied(),
        },
        Some(("devices", _)) => Action::Devices,
        _ => Action::Interactive,
    }
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use super::{command, from_matches, Action, Args};
    use crate::audio::tone::Waveform;

    fn parse(args: &[&str]) -> Args {
        let m = command()
            .try_get_matches_from(["tone-generator"].iter().chain(args).copied())
            .unwrap();
        from_matches(&m)
    }

    #[test]
    fn test_command_definition() {
        command().debug_assert();
    }

    #[test]
    fn test_defaults() {
        let args = parse(&[]);
        assert_eq!(args.params().unwrap(), crate::params::ToneParameters::new());
        assert_eq!(args.output_device, "default");
        assert!(matches!(args.action, Action::Interactive));
    }

    #[test]
    fn test_record_with_clamped_frequency() {
        let args = parse(&["-f", "-5", "record", "x.wav"]);
        assert_eq!(args.params().unwrap().frequency(), 0);
        match args.action {
            Action::Record { path } => assert_eq!(path, Path::new("x.wav")),
            _ => panic!("expected record"),
        }
    }

    #[test]
    fn test_negative_values_are_clamped() {
        let args = parse(&["--volume", "-0.2", "-d", "-1", "-w", "square", "play"]);
        let params = args.params().unwrap();
        assert_eq!(params.volume(), 0.0);
        assert_eq!(params.duration(), 0.1);
        assert_eq!(params.waveform(), Waveform::Square);
        assert!(matches!(args.action, Action::Play));

        let args = parse(&["--amplitude", "0.3", "info"]);
        assert_eq!(args.params().unwrap().volume(), 0.3);
        assert_eq!(parse(&["-a", "2"]).params().unwrap().volume(), 1.0);
    }

    #[test]
    fn test_global_options_after_subcommand() {
        let args = parse(&["record", "-f", "5000", "-v"]);
        assert_eq!(args.params().unwrap().frequency(), 3000);
        assert_eq!(args.log_level, tracing::Level::DEBUG);
    }

    #[test]
    fn test_info_options() {
        match parse(&["status", "--json", "--preview"]).action {
            Action::Info { json, preview } => {
                assert!(json);
                assert_eq!(preview, Some(1000));
            }
            _ => panic!("expected info"),
        }

        // `s` means stop in interactive mode, it is not a subcommand here
        assert!(command()
            .try_get_matches_from(["tone-generator", "s"])
            .is_err());
        assert!(command()
            .try_get_matches_from(["tone-generator", "-V"])
            .is_err());
    }
}
