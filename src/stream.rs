use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};

use ccaption::process::extract::{Extractor, Unit};
use ccaption::utils::errors::ExtractError;

use crate::input::InputReader;

const CHUNK_SIZE: usize = 64 * 1024;

pub fn spinner(multi: Option<&MultiProgress>, message: &'static str) -> Result<Option<ProgressBar>> {
    let Some(multi) = multi else {
        return Ok(None);
    };

    let pb = multi.add(ProgressBar::new_spinner());
    pb.set_style(ProgressStyle::with_template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message);

    Ok(Some(pb))
}

/// Runs `f` on every start code unit of the input, returning the number of
/// bytes read.
pub fn for_each_unit<F>(input: &Path, mut f: F) -> Result<usize>
where
    F: FnMut(Unit) -> Result<()>,
{
    let mut input_reader = InputReader::new(input)?;
    if input_reader.is_pipe() {
        log::debug!("Reading from stdin");
    }

    let mut extractor = Extractor::default();
    let mut total_bytes = 0;

    input_reader.process_chunks(CHUNK_SIZE, |chunk| {
        total_bytes += chunk.len();
        extractor.push_bytes(chunk);
        drain(&mut extractor, &mut f)?;

        Ok(true)
    })?;

    extractor.finish();
    drain(&mut extractor, &mut f)?;

    log::debug!("{} units in {total_bytes} bytes", extractor.units_processed());
    Ok(total_bytes)
}

fn drain<F>(extractor: &mut Extractor, f: &mut F) -> Result<()>
where
    F: FnMut(Unit) -> Result<()>,
{
    for unit in extractor.by_ref() {
        match unit {
            Ok(unit) => f(unit)?,
            Err(ExtractError::InsufficientData) => break,
        }
    }

    Ok(())
}
