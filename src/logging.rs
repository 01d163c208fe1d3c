use std::io::Write;

use anyhow::Result;
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;
use log::Record;
use serde_json::{Value, json};

use crate::cli::command::{Cli, LogFormat};

/// Installs the global logger and returns whether log lines go through
/// `multi`, which keeps them from tearing progress spinners.
pub fn init(cli: &Cli, multi: &MultiProgress) -> Result<bool> {
    let base_level = cli.loglevel.to_level_filter();

    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(base_level);
    match cli.log_format {
        LogFormat::Plain => {
            builder.format_timestamp_secs();
        }
        LogFormat::Json => {
            builder.format(|buf, record| {
                let line = json_line(&buf.timestamp().to_string(), record);
                writeln!(buf, "{line}")
            });
        }
    }

    if cli.progress {
        LogWrapper::new(multi.clone(), builder.build()).try_init()?;
        log::set_max_level(base_level);
    } else {
        builder.try_init()?;
    }

    Ok(cli.progress)
}

fn json_line(ts: &str, record: &Record) -> Value {
    json!({
        "ts": ts,
        "lvl": record.level().as_str(),
        "target": record.target(),
        "msg": record.args().to_string(),
    })
}

#[test]
fn json_lines_are_valid_json() -> Result<()> {
    let line = json_line(
        "2026-01-01T00:00:00Z",
        &Record::builder()
            .args(format_args!("Bad user data at picture {}: \"{}\"\n", 3, "cc"))
            .level(log::Level::Warn)
            .target("ccaption::process::filter")
            .build(),
    )
    .to_string();

    assert!(!line.contains('\n'));

    let parsed: Value = serde_json::from_str(&line)?;
    assert_eq!(parsed["lvl"], "WARN");
    assert_eq!(parsed["target"], "ccaption::process::filter");
    assert_eq!(parsed["msg"], "Bad user data at picture 3: \"cc\"\n");
    Ok(())
}
