use std::path::PathBuf;

use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};

use ccaption::process::filter::A53CcAction;

#[derive(Debug, ClapParser)]
#[command(
    name         = env!("CARGO_PKG_NAME"),
    version      = env!("CARGO_PKG_VERSION"),
    long_version = concat!(
        env!("CARGO_PKG_VERSION"),
        "\nccaption ", env!("CCAPTION_VERSION"),
        "\nbuilt    ", env!("BUILD_TIMESTAMP"),
    ),
    author       = env!("CARGO_PKG_AUTHORS"),
    about        = "Tools for inspecting, filtering and decoding closed captions in MPEG-2 video",
    long_about   = None,
)]
pub struct Cli {
    /// Set the log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub loglevel: LogLevel,

    /// Treat warnings as fatal errors (fail on first warning).
    #[arg(long, global = true)]
    pub strict: bool,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Show progress bars during operations.
    #[arg(long, global = true)]
    pub progress: bool,

    /// Choose an operation to perform.
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Validation problems at this level or above abort processing.
    pub fn fail_level(&self) -> log::Level {
        if self.strict {
            log::Level::Warn
        } else {
            log::Level::Error
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print caption and user data information of an MPEG-2 video stream.
    Info(InfoArgs),

    /// Decode EIA-608 captions into a SubRip file.
    Decode(DecodeArgs),

    /// Pass, remove or extract A/53 closed captions.
    Filter(FilterArgs),
}

#[derive(Debug, Args)]
pub struct InfoArgs {
    /// Input MPEG-2 video elementary stream (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Print every user data record as YAML.
    #[arg(long)]
    pub dump: bool,
}

#[derive(Debug, Args)]
pub struct DecodeArgs {
    /// Input MPEG-2 video elementary stream (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output SubRip file. Defaults to stdout.
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Emit a cue each time the screen changes instead of waiting for the
    /// next change to bound it.
    #[arg(long)]
    pub real_time: bool,

    /// Frame rate used for timing, overriding the sequence header.
    #[arg(long, value_name = "FPS")]
    pub fps: Option<f64>,
}

#[derive(Debug, Args)]
pub struct FilterArgs {
    /// Input MPEG-2 video elementary stream (use "-" for stdin).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output elementary stream.
    #[arg(long, value_name = "PATH")]
    pub output: PathBuf,

    /// Action on A/53 closed captions.
    #[arg(long, value_enum, default_value_t = A53CcMode::Pass)]
    pub a53_cc: A53CcMode,

    /// File receiving extracted A53 CC side data.
    #[arg(long, value_name = "PATH")]
    pub side_data: Option<PathBuf>,

    /// Display aspect ratio written to sequence headers, e.g. 16:9.
    #[arg(long, value_name = "NUM:DEN", value_parser = parse_ratio)]
    pub aspect_ratio: Option<(u32, u32)>,

    /// Frame rate written to sequence headers, e.g. 30000/1001 or 25.
    #[arg(long, value_name = "NUM/DEN", value_parser = parse_ratio)]
    pub frame_rate: Option<(u32, u32)>,
}

/// Parses `num:den`, `num/den` or a bare integer.
fn parse_ratio(s: &str) -> Result<(u32, u32), String> {
    let (num, den) = match s.split_once([':', '/']) {
        Some((num, den)) => (num, den),
        None => (s, "1"),
    };

    let parse = |v: &str| {
        v.trim()
            .parse::<u32>()
            .map_err(|e| format!("invalid ratio '{s}': {e}"))
    };
    let (num, den) = (parse(num)?, parse(den)?);

    if num == 0 || den == 0 {
        return Err(format!("invalid ratio '{s}': terms must be non-zero"));
    }

    Ok((num, den))
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogLevel {
    /// Disable logging output.
    Off,
    /// No output except errors.
    Error,
    /// Show warnings and errors.
    Warn,
    /// Show info, warnings and errors (default).
    Info,
    /// Show debug, info, warnings and errors.
    Debug,
    /// Show all log messages including trace.
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Colorized human-readable text.
    Plain,
    /// Structured JSON per log record.
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum A53CcMode {
    /// Leave captions untouched.
    Pass,
    /// Delete caption user data.
    Remove,
    /// Copy captions out as side data.
    Extract,
}

impl From<A53CcMode> for A53CcAction {
    fn from(mode: A53CcMode) -> Self {
        match mode {
            A53CcMode::Pass => A53CcAction::Pass,
            A53CcMode::Remove => A53CcAction::Remove,
            A53CcMode::Extract => A53CcAction::Extract,
        }
    }
}

#[test]
fn ratio_arguments() {
    assert_eq!(parse_ratio("16:9"), Ok((16, 9)));
    assert_eq!(parse_ratio("30000/1001"), Ok((30000, 1001)));
    assert_eq!(parse_ratio("25"), Ok((25, 1)));
    assert!(parse_ratio("0:1").is_err());
    assert!(parse_ratio("4:x").is_err());
}
