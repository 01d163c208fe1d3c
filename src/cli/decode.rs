use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::{Result, anyhow, bail};
use indicatif::{MultiProgress, ProgressBar};
use log::{info, trace};

use ccaption::log_or_err;
use ccaption::process::decode::CaptionDecoder;
use ccaption::process::extract::{
    GROUP_START_CODE, PICTURE_START_CODE, SEQUENCE_END_CODE, SEQUENCE_HEADER_CODE, Unit,
    USER_DATA_START_CODE,
};
use ccaption::process::transcode::{read_a53_user_data, write_a53_cc_side_data};
use ccaption::structs::picture_header::PictureHeader;
use ccaption::structs::sequence_header::SequenceHeader;

use super::command::{Cli, DecodeArgs};
use crate::srt::SrtWriter;
use crate::stream::{for_each_unit, spinner};
use crate::timestamp::{frame_ticks, ticks_to_ms, time_str};

const DEFAULT_FPS: f64 = 30000.0 / 1001.0;

pub fn cmd_decode(args: &DecodeArgs, cli: &Cli, multi: Option<&MultiProgress>) -> Result<()> {
    if let Some(fps) = args.fps {
        if !(fps.is_finite() && fps > 0.0) {
            bail!("Invalid frame rate: {fps}");
        }
    }

    let out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut decoder = CaptionDecoder::default();
    decoder.set_real_time(args.real_time);
    decoder.set_fail_level(cli.fail_level());

    let mut context = DecodeContext {
        fail_level: cli.fail_level(),
        fps: args.fps,
        decoder,
        writer: SrtWriter::new(out),
        gop: GopReorder::default(),
        pb: spinner(multi, "Decoding captions...")?,
    };

    for_each_unit(&args.input, |unit| context.process_unit(&unit))?;
    context.flush_gop()?;

    let end = frame_ticks(context.gop.pictures, context.fps());
    if let Some(cue) = context.decoder.finish(end) {
        context.writer.push(cue)?;
    }
    context.writer.finish(end)?;

    if let Some(pb) = context.pb.take() {
        pb.finish_and_clear();
    }

    info!(
        "Wrote {} captions from {} pictures ({})",
        context.writer.entries(),
        context.gop.pictures,
        time_str(ticks_to_ms(end), '.')
    );

    Ok(())
}

/// Caption side data of the current group of pictures, keyed by display
/// index. Captions are carried in coding order but must be decoded in
/// display order.
#[derive(Debug, Default)]
struct GopReorder {
    /// Pictures seen so far.
    pictures: u64,
    /// Display index of the first picture of the group.
    base: u64,
    /// Display index of the latest picture.
    current: u64,
    pending: Vec<(u64, Vec<u8>)>,
}

impl GopReorder {
    fn picture(&mut self, header: &PictureHeader) {
        self.current = self.base + header.temporal_reference as u64;
        self.pictures += 1;
    }

    fn new_group(&mut self) {
        self.base = self.pictures;
    }

    fn push(&mut self, side_data: Vec<u8>) {
        self.pending.push((self.current, side_data));
    }

    fn take(&mut self) -> Vec<(u64, Vec<u8>)> {
        let mut pending = std::mem::take(&mut self.pending);
        // Stable, so several units of one picture keep their order.
        pending.sort_by_key(|(index, _)| *index);
        pending
    }
}

struct DecodeContext {
    fail_level: log::Level,
    fps: Option<f64>,
    decoder: CaptionDecoder,
    writer: SrtWriter<Box<dyn Write>>,
    gop: GopReorder,
    pb: Option<ProgressBar>,
}

impl DecodeContext {
    fn fps(&self) -> f64 {
        self.fps.unwrap_or(DEFAULT_FPS)
    }

    fn process_unit(&mut self, unit: &Unit) -> Result<()> {
        match unit.start_code {
            SEQUENCE_HEADER_CODE => {
                self.flush_gop()?;
                self.gop.new_group();

                if self.fps.is_none() {
                    match SequenceHeader::from_bytes(&unit.data) {
                        Ok(header) => {
                            if let Some((num, den)) = header.frame_rate() {
                                info!("Frame rate from sequence header: {num}/{den}");
                                self.fps = Some(num as f64 / den as f64);
                            }
                        }
                        Err(e) => {
                            log_or_err!(self, log::Level::Warn, anyhow!("Bad sequence header: {e}"))
                        }
                    }
                }
            }
            GROUP_START_CODE | SEQUENCE_END_CODE => {
                self.flush_gop()?;
                self.gop.new_group();
            }
            PICTURE_START_CODE => match PictureHeader::from_bytes(&unit.data) {
                Ok(header) => {
                    self.gop.picture(&header);
                    trace!(
                        "Picture {} ({})",
                        self.gop.current,
                        header.coding_type_char()
                    );

                    if self.gop.pictures.is_multiple_of(100) {
                        if let Some(ref pb) = self.pb {
                            pb.set_message(format!(
                                "Decoding captions...      {}",
                                self.gop.pictures
                            ));
                        }
                    }
                }
                Err(e) => log_or_err!(self, log::Level::Warn, anyhow!("Bad picture header: {e}")),
            },
            USER_DATA_START_CODE => {
                let user_data = match read_a53_user_data(&unit.data) {
                    Ok(user_data) => user_data,
                    Err(e) => {
                        log_or_err!(self, log::Level::Warn, anyhow!("Bad user data: {e}"));
                        return Ok(());
                    }
                };

                if user_data.cc_data().is_some() {
                    let mut side_data = Vec::new();
                    write_a53_cc_side_data(&mut side_data, &user_data)?;
                    self.gop.push(side_data);
                }
            }
            _ => {}
        }

        Ok(())
    }

    fn flush_gop(&mut self) -> Result<()> {
        let fps = self.fps();

        for (index, side_data) in self.gop.take() {
            for cue in self.decoder.decode(&side_data, frame_ticks(index, fps))? {
                trace!("{cue}");
                self.writer.push(cue)?;
            }
        }

        Ok(())
    }
}

#[test]
fn reorder_by_temporal_reference() {
    let mut gop = GopReorder::default();

    // I0 P3 B1 B2 in coding order
    for (temporal_reference, data) in [(0, 0xA), (3, 0xD), (1, 0xB), (2, 0xC)] {
        gop.picture(&PictureHeader {
            temporal_reference,
            ..Default::default()
        });
        gop.push(vec![data]);
    }

    let order = gop.take().into_iter().map(|(i, d)| (i, d[0])).collect::<Vec<_>>();
    assert_eq!(order, [(0, 0xA), (1, 0xB), (2, 0xC), (3, 0xD)]);

    gop.new_group();
    gop.picture(&PictureHeader::default());
    assert_eq!(gop.current, 4);
    assert_eq!(gop.pictures, 5);
}
