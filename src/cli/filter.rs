use std::fs::File;
use std::io::{BufWriter, Write};

use anyhow::{Result, bail};
use indicatif::{MultiProgress, ProgressBar};
use log::{info, warn};

use ccaption::process::extract::{
    GROUP_START_CODE, PICTURE_START_CODE, SEQUENCE_END_CODE, SEQUENCE_HEADER_CODE, Unit,
};
use ccaption::process::filter::{A53CcAction, SequenceFilter, UserDataFilter};

use super::command::{Cli, FilterArgs};
use crate::stream::{for_each_unit, spinner};

pub fn cmd_filter(args: &FilterArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    let action = A53CcAction::from(args.a53_cc);

    if args.side_data.is_some() && action != A53CcAction::Extract {
        warn!("--side-data is only written with --a53-cc extract");
    }
    if args.output.as_os_str() == "-" {
        bail!("Writing the filtered stream to stdout is not supported");
    }

    let mut filter = UserDataFilter::new(action);
    filter.set_fail_level(cli.fail_level());

    let mut sequence = SequenceFilter::default();
    sequence.display_aspect_ratio = args.aspect_ratio;
    sequence.frame_rate = args.frame_rate;

    let side_data_out = match (&args.side_data, action) {
        (Some(path), A53CcAction::Extract) => Some(BufWriter::new(File::create(path)?)),
        _ => None,
    };

    let mut context = FilterContext {
        filter,
        sequence,
        fragment: Vec::new(),
        out: BufWriter::new(File::create(&args.output)?),
        side_data_out,
        buffer: Vec::new(),
        side_data_bytes: 0,
        pb: spinner(multi, "Filtering units...")?,
    };

    for_each_unit(&args.input, |unit| context.process_unit(unit))?;
    context.flush_fragment()?;

    context.out.flush()?;
    if let Some(out) = context.side_data_out.as_mut() {
        out.flush()?;
    }

    if let Some(pb) = context.pb.take() {
        pb.finish_and_clear();
    }

    if context.sequence.is_active() {
        info!(
            "Rewrote {} sequence headers",
            context.sequence.sequences_rewritten()
        );
    }

    match action {
        A53CcAction::Pass => info!("Captions passed through unchanged"),
        A53CcAction::Remove => info!("Removed {} caption units", context.filter.units_removed()),
        A53CcAction::Extract => info!(
            "Extracted {} caption packets ({} bytes)",
            context.filter.packets_extracted(),
            context.side_data_bytes
        ),
    }

    Ok(())
}

struct FilterContext {
    filter: UserDataFilter,
    sequence: SequenceFilter,
    /// Units of the picture being collected.
    fragment: Vec<Unit>,
    out: BufWriter<File>,
    side_data_out: Option<BufWriter<File>>,
    buffer: Vec<u8>,
    side_data_bytes: usize,
    pb: Option<ProgressBar>,
}

/// Units that open a new fragment once a picture has been collected.
fn starts_fragment(unit: &Unit) -> bool {
    matches!(
        unit.start_code,
        PICTURE_START_CODE | SEQUENCE_HEADER_CODE | GROUP_START_CODE | SEQUENCE_END_CODE
    )
}

impl FilterContext {
    fn process_unit(&mut self, unit: Unit) -> Result<()> {
        if starts_fragment(&unit) && self.fragment.iter().any(Unit::is_picture) {
            self.flush_fragment()?;
        }

        self.fragment.push(unit);
        Ok(())
    }

    fn flush_fragment(&mut self) -> Result<()> {
        if self.fragment.is_empty() {
            return Ok(());
        }

        self.sequence.rewrite(&mut self.fragment)?;

        if let Some(side_data) = self.filter.filter(&mut self.fragment)? {
            self.side_data_bytes += side_data.len();
            if let Some(out) = self.side_data_out.as_mut() {
                out.write_all(&side_data)?;
            }
        }

        self.buffer.clear();
        for unit in self.fragment.drain(..) {
            unit.write_to(&mut self.buffer);
        }
        self.out.write_all(&self.buffer)?;

        if let Some(ref pb) = self.pb {
            pb.tick();
        }

        Ok(())
    }
}
