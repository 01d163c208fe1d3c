use anyhow::{Result, anyhow};
use indicatif::{MultiProgress, ProgressBar};

use ccaption::log_or_err;
use ccaption::process::extract::Unit;
use ccaption::process::transcode::read_a53_user_data;
use ccaption::structs::sequence_header::SequenceHeader;

use super::command::{Cli, InfoArgs};
use crate::report::{StreamSummary, UserDataRecord};
use crate::stream::{for_each_unit, spinner};

pub fn cmd_info(args: &InfoArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    log::info!("Analyzing MPEG-2 stream: {}", args.input.display());

    let mut context = AnalysisContext {
        fail_level: cli.fail_level(),
        dump: args.dump,
        summary: StreamSummary::default(),
        records: Vec::new(),
        sequence_header_seen: false,
        pb: spinner(multi, "Analyzing units...")?,
    };

    let total_bytes = for_each_unit(&args.input, |unit| context.process_unit(&unit))?;

    if let Some(pb) = context.pb.take() {
        pb.finish_and_clear();
    }

    if args.dump {
        print!("{}", serde_yaml_ng::to_string(&context.records)?);
    }

    display_summary(&context.summary, total_bytes);
    Ok(())
}

struct AnalysisContext {
    fail_level: log::Level,
    dump: bool,
    summary: StreamSummary,
    records: Vec<UserDataRecord>,
    sequence_header_seen: bool,
    pb: Option<ProgressBar>,
}

impl AnalysisContext {
    fn process_unit(&mut self, unit: &Unit) -> Result<()> {
        if unit.is_sequence_header() && !self.sequence_header_seen {
            match SequenceHeader::from_bytes(&unit.data) {
                Ok(header) => {
                    self.summary.set_sequence_header(&header);
                    self.sequence_header_seen = true;
                }
                Err(e) => log_or_err!(self, log::Level::Warn, anyhow!("Bad sequence header: {e}")),
            }
        } else if unit.is_picture() {
            self.summary.pictures += 1;

            if self.summary.pictures.is_multiple_of(100) {
                if let Some(ref pb) = self.pb {
                    pb.set_message(format!("Analyzing units...       {}", self.summary.pictures));
                }
            }
        } else if unit.is_user_data() {
            let picture = self.summary.pictures.saturating_sub(1);

            match read_a53_user_data(&unit.data) {
                Ok(user_data) => {
                    let record = UserDataRecord::new(picture, &user_data);
                    self.summary.count(&record);
                    if self.dump {
                        self.records.push(record);
                    }
                }
                Err(e) => {
                    self.summary.undecodable += 1;
                    log_or_err!(
                        self,
                        log::Level::Warn,
                        anyhow!("Bad user data at picture {picture}: {e}")
                    );
                }
            }
        }

        Ok(())
    }
}

fn display_summary(summary: &StreamSummary, total_bytes: usize) {
    println!();
    println!("MPEG-2 Caption Information");
    println!("==========================");
    println!();

    match (summary.width, summary.height) {
        (Some(width), Some(height)) => println!("Picture size                {width}x{height}"),
        _ => println!("Picture size                unknown (no sequence header)"),
    }
    if let Some(frame_rate) = &summary.frame_rate {
        println!("Frame rate                  {frame_rate} fps");
    }
    println!("Pictures                    {}", summary.pictures);
    println!("Stream size                 {total_bytes} bytes");
    println!();

    println!("User data units             {}", summary.user_data_units);
    println!("  ATSC cc_data              {}", summary.cc_data);
    println!("  ATSC bar_data             {}", summary.bar_data);
    println!("  AFD                       {}", summary.afd);
    println!("  Unknown                   {}", summary.unknown);
    println!("  Undecodable               {}", summary.undecodable);
    println!();

    println!("EIA-608 packets             {}", summary.cc_packets_608);
    println!("DTVCC packets               {}", summary.cc_packets_dtvcc);
}
