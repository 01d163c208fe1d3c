use std::io::Write;

use anyhow::Result;
use ccaption::structs::cue::Cue;

use crate::timestamp::{ticks_to_ms, time_str};

/// Writes cues as numbered SubRip entries.
///
/// Cues without a duration are held until the next cue (or [`SrtWriter::finish`])
/// supplies their end. Empty cues only close the previous one.
pub struct SrtWriter<W: Write> {
    out: W,
    index: usize,
    pending: Option<Cue>,
}

impl<W: Write> SrtWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            index: 0,
            pending: None,
        }
    }

    pub fn entries(&self) -> usize {
        self.index
    }

    pub fn push(&mut self, cue: Cue) -> Result<()> {
        if let Some(mut pending) = self.pending.take() {
            pending.duration = Some(cue.start - pending.start);
            self.write_entry(&pending)?;
        }

        if cue.duration.is_some() {
            self.write_entry(&cue)
        } else {
            self.pending = Some(cue);
            Ok(())
        }
    }

    /// Closes a held cue at `end` and flushes the output.
    pub fn finish(&mut self, end: i64) -> Result<()> {
        if let Some(mut pending) = self.pending.take() {
            pending.duration = Some(end - pending.start);
            self.write_entry(&pending)?;
        }

        self.out.flush()?;
        Ok(())
    }

    fn write_entry(&mut self, cue: &Cue) -> Result<()> {
        if cue.is_empty() {
            return Ok(());
        }

        let Some(end) = cue.end() else {
            return Ok(());
        };

        self.index += 1;
        writeln!(self.out, "{}", self.index)?;
        writeln!(
            self.out,
            "{} --> {}",
            time_str(ticks_to_ms(cue.start), ','),
            time_str(ticks_to_ms(end), ',')
        )?;
        for line in cue.lines() {
            writeln!(self.out, "{line}")?;
        }
        writeln!(self.out)?;

        Ok(())
    }
}

#[test]
fn write_entries() -> Result<()> {
    let mut out = Vec::new();
    let mut writer = SrtWriter::new(&mut out);

    writer.push(Cue {
        text: "Hello\\Nworld".to_string(),
        start: 90_000,
        duration: Some(45_000),
    })?;

    // Real-time cues end where the next one starts.
    writer.push(Cue {
        text: "Hi".to_string(),
        start: 180_000,
        duration: None,
    })?;
    writer.push(Cue {
        text: String::new(),
        start: 270_000,
        duration: None,
    })?;
    writer.push(Cue {
        text: "Bye".to_string(),
        start: 360_000,
        duration: None,
    })?;
    writer.finish(450_000)?;
    assert_eq!(writer.entries(), 3);

    assert_eq!(
        String::from_utf8_lossy(&out),
        "1\n00:00:01,000 --> 00:00:01,500\nHello\nworld\n\n\
         2\n00:00:02,000 --> 00:00:03,000\nHi\n\n\
         3\n00:00:04,000 --> 00:00:05,000\nBye\n\n"
    );
    Ok(())
}
