use anyhow::{Result, anyhow};
use log::{debug, trace};

use crate::log_or_err;
use crate::structs::cc_data::{
    CC_PACKET_SIZE, CC_TYPE_DTVCC_DATA, CC_TYPE_DTVCC_START, CC_TYPE_NTSC_FIELD_1,
    CC_TYPE_NTSC_FIELD_2,
};
use crate::structs::cue::{Cue, LINE_BREAK};
use crate::structs::screen::{
    CcColor, CcFont, CcMode, PAC2_ATTRIBS, ROW_MAP, SCREEN_ROWS, Screen,
};
use crate::utils::errors::CaptionError;
use crate::utils::parity::{odd_parity, strip_parity};

/// Code substituted for a data byte that failed its parity check.
pub const SOLID_BLANK: u8 = 0x7F;

/// Checks a 3-byte cc_data unit and strips its parity bits.
///
/// The unit is rejected when `cc_valid` is clear or when the last byte of
/// an EIA-608 unit fails parity. A parity failure on the middle byte only
/// replaces it with [`SOLID_BLANK`]. Padding and DTVCC units are reported as
/// [`CaptionError::Unsupported`].
pub fn validate_cc_data_pair(cc_data_pair: &mut [u8; 3]) -> Result<(), CaptionError> {
    let cc_valid = (cc_data_pair[0] & 4) >> 2;
    let cc_type = cc_data_pair[0] & 3;

    if cc_valid == 0 {
        return Err(CaptionError::InvalidUnit);
    }

    if cc_type == CC_TYPE_NTSC_FIELD_1 || cc_type == CC_TYPE_NTSC_FIELD_2 {
        if !odd_parity(cc_data_pair[2]) {
            return Err(CaptionError::ParityFailed(cc_data_pair[2]));
        }
        if !odd_parity(cc_data_pair[1]) {
            cc_data_pair[1] = SOLID_BLANK;
        }
    }

    // Padding
    if matches!(cc_data_pair[0], 0xFA | 0xFC | 0xFD)
        && strip_parity(cc_data_pair[1]) == 0
        && strip_parity(cc_data_pair[2]) == 0
    {
        return Err(CaptionError::Unsupported(cc_type));
    }

    // DTVCC data is not handled here.
    if cc_type == CC_TYPE_DTVCC_DATA || cc_type == CC_TYPE_DTVCC_START {
        return Err(CaptionError::Unsupported(cc_type));
    }

    cc_data_pair[1] = strip_parity(cc_data_pair[1]);
    cc_data_pair[2] = strip_parity(cc_data_pair[2]);

    Ok(())
}

/// Per-stream EIA-608 decoding state.
#[derive(Debug)]
pub struct CaptionContext {
    pub fail_level: log::Level,

    pub screen: [Screen; 2],
    /// Index of the displayed screen.
    pub active_screen: usize,

    pub cursor_row: usize,
    pub cursor_column: usize,
    pub cursor_color: CcColor,
    pub cursor_font: CcFont,

    /// Text of the last reaped screen.
    pub buffer: String,
    pub screen_reaped: bool,

    pub rollup: usize,
    pub mode: CcMode,

    /// Cue held back in batch mode until the next reap bounds it.
    pub prev_string: Option<String>,
    pub prev_time: i64,

    pub prev_cmd: [u8; 2],
}

impl Default for CaptionContext {
    fn default() -> Self {
        Self {
            fail_level: log::Level::Error,

            screen: [Screen::default(), Screen::default()],
            active_screen: 0,

            cursor_row: 0,
            cursor_column: 0,
            cursor_color: CcColor::White,
            cursor_font: CcFont::Regular,

            buffer: String::new(),
            screen_reaped: false,

            rollup: 0,
            mode: CcMode::PopOn,

            prev_string: None,
            prev_time: 0,

            prev_cmd: [0; 2],
        }
    }
}

impl CaptionContext {
    /// Screen receiving new text: the hidden one in pop-on mode, the
    /// displayed one otherwise.
    pub fn writing_screen_index(&self) -> usize {
        match self.mode {
            CcMode::PopOn => self.active_screen ^ 1,
            CcMode::PaintOn | CcMode::RollUp | CcMode::Text => self.active_screen,
        }
    }

    pub fn writing_screen(&self) -> &Screen {
        &self.screen[self.writing_screen_index()]
    }

    pub fn active(&self) -> &Screen {
        &self.screen[self.active_screen]
    }

    /// Processes one byte pair with parity already stripped.
    pub fn process_cc608(&mut self, hi: u8, lo: u8) -> Result<()> {
        let mut is_char = false;

        if [hi, lo] == self.prev_cmd {
            // Redundant transmission of the previous command
        } else if (hi == 0x10 && (0x40..=0x5f).contains(&lo))
            || ((0x11..=0x17).contains(&hi) && (0x40..=0x7f).contains(&lo))
        {
            self.handle_pac(hi, lo)?;
        } else if (hi == 0x11 && (0x20..=0x2f).contains(&lo))
            || (hi == 0x17 && (0x2e..=0x2f).contains(&lo))
        {
            self.handle_textattr(lo)?;
        } else if hi == 0x14 || hi == 0x15 || hi == 0x1c {
            match lo {
                // resume caption loading
                0x20 => self.mode = CcMode::PopOn,
                0x24 => self.handle_delete_end_of_row()?,
                0x25..=0x27 => {
                    self.rollup = (lo - 0x23) as usize;
                    self.mode = CcMode::RollUp;
                }
                // resume direct captioning
                0x29 => self.mode = CcMode::PaintOn,
                // resume text display
                0x2b => self.mode = CcMode::Text,
                // erase displayed memory
                0x2c => self.handle_erase(self.active_screen),
                0x2d => {
                    trace!("carriage return");
                    self.reap_screen();
                    self.roll_up();
                    self.cursor_column = 0;
                }
                // erase non-displayed memory
                0x2e => self.handle_erase(self.active_screen ^ 1),
                0x2f => {
                    trace!("end of caption");
                    self.handle_eoc();
                }
                _ => debug!("Unknown command {hi:#04x} {lo:#04x}"),
            }
        } else if (hi == 0x17 || hi == 0x1f) && (0x21..=0x23).contains(&lo) {
            // Tab offsets are not rendered
        } else if hi >= 0x20 {
            self.handle_char(hi, lo)?;
            is_char = true;
        } else {
            debug!("Unknown command {hi:#04x} {lo:#04x}");
        }

        // Characters may legitimately repeat.
        if !is_char {
            self.prev_cmd = [hi, lo];
        }

        Ok(())
    }

    /// Serialises the displayed screen into [`CaptionContext::buffer`].
    ///
    /// Used rows are left-trimmed of spaces and joined with `\N`.
    pub fn reap_screen(&mut self) {
        let screen = &self.screen[self.active_screen];
        self.buffer.clear();

        for row in 0..SCREEN_ROWS {
            if !screen.is_row_used(row) {
                continue;
            }

            let text = screen.row_text(row);
            let start = text.iter().position(|&c| c != b' ').unwrap_or(text.len());
            self.buffer.extend(text[start..].iter().map(|&c| char::from(c)));
            self.buffer.push_str(LINE_BREAK);
        }

        if screen.row_used != 0 && self.buffer.len() >= LINE_BREAK.len() {
            self.buffer.truncate(self.buffer.len() - LINE_BREAK.len());
        }

        self.screen_reaped = true;
    }

    /// Scrolls the writing screen up by one row around the cursor.
    pub fn roll_up(&mut self) {
        if self.mode == CcMode::Text {
            return;
        }

        let cursor_row = self.cursor_row;
        let index = self.writing_screen_index();
        let screen = &mut self.screen[index];

        // The window can't extend above the first row.
        let keep_lines = (cursor_row + 1).min(self.rollup);

        for row in 0..cursor_row.saturating_sub(keep_lines) {
            screen.unset_row_used(row);
        }

        for i in 0..keep_lines {
            if screen.row_used == 0 {
                break;
            }

            let row = cursor_row + 1 + i - keep_lines;
            screen.copy_row(row + 1, row);
            if screen.is_row_used(row + 1) {
                screen.set_row_used(row);
            }
        }

        screen.unset_row_used(cursor_row);
    }

    pub fn flush(&mut self) {
        self.screen[0].clear();
        self.screen[1].clear();
        self.buffer.clear();
        self.screen_reaped = true;
        self.mode = CcMode::PopOn;
    }

    fn write_char(&mut self, ch: u8) -> Result<bool> {
        let index = self.writing_screen_index();
        let written = self.screen[index].write_char(
            self.cursor_row,
            self.cursor_column,
            ch,
            self.cursor_color,
            self.cursor_font,
        );

        match written {
            Ok(()) => Ok(true),
            Err(e) => {
                log_or_err!(self, log::Level::Warn, anyhow!(e));
                Ok(false)
            }
        }
    }

    /// Writes `ch` at the cursor and advances on success.
    fn put_char(&mut self, ch: u8) -> Result<()> {
        if self.write_char(ch)? {
            self.cursor_column += 1;
        }

        Ok(())
    }

    fn handle_pac(&mut self, hi: u8, lo: u8) -> Result<()> {
        let index = (((hi << 1) & 0x0e) | ((lo >> 5) & 0x01)) as usize;

        if ROW_MAP[index] <= 0 {
            debug!("Invalid pac index encountered");
            return Ok(());
        }

        let (color, font, indent) = PAC2_ATTRIBS[(lo & 0x1f) as usize];

        self.cursor_row = (ROW_MAP[index] - 1) as usize;
        self.cursor_color = color;
        self.cursor_font = font;
        self.cursor_column = 0;

        for _ in 0..indent {
            self.put_char(b' ')?;
        }

        Ok(())
    }

    fn handle_textattr(&mut self, lo: u8) -> Result<()> {
        let (color, font, _) = PAC2_ATTRIBS[(lo - 0x20) as usize];
        self.cursor_color = color;
        self.cursor_font = font;

        let index = self.writing_screen_index();
        self.screen[index].set_row_used(self.cursor_row);

        // Attribute changes occupy one space on screen.
        self.put_char(b' ')
    }

    fn handle_delete_end_of_row(&mut self) -> Result<()> {
        self.write_char(0)?;
        Ok(())
    }

    fn handle_erase(&mut self, n_screen: usize) {
        self.screen[n_screen].clear();
    }

    fn handle_eoc(&mut self) {
        self.active_screen ^= 1;
        self.cursor_column = 0;
        self.reap_screen();
    }

    fn handle_char(&mut self, hi: u8, lo: u8) -> Result<()> {
        let index = self.writing_screen_index();
        self.screen[index].set_row_used(self.cursor_row);

        self.put_char(hi)?;
        if lo != 0 {
            self.put_char(lo)?;
        }
        self.write_char(0)?;

        self.prev_cmd = [0; 2];

        if lo != 0 {
            trace!("({},{})", char::from(hi), char::from(lo));
        } else {
            trace!("({})", char::from(hi));
        }

        Ok(())
    }
}

/// Decodes EIA-608 captions carried as cc_data packets into [`Cue`]s.
///
/// # Example
///
/// ```rust,no_run
/// use ccaption::process::decode::CaptionDecoder;
///
/// let mut decoder = CaptionDecoder::default();
/// decoder.set_real_time(true);
///
/// // RCL, "Hi", EOC on field 1
/// let packet = [0xFC, 0x94, 0x20, 0xFC, 0xC8, 0xE9, 0xFC, 0x94, 0x2F];
/// for cue in decoder.decode(&packet, 0)? {
///     println!("{cue}");
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Default)]
pub struct CaptionDecoder {
    ctx: CaptionContext,
    real_time: bool,
}

impl CaptionDecoder {
    /// Emit cues as soon as a screen is reaped, without a duration.
    ///
    /// Otherwise each cue is held until the next reap, which provides its
    /// end time.
    pub fn set_real_time(&mut self, real_time: bool) {
        self.real_time = real_time;
    }

    /// Sets the failure level for validation problems.
    ///
    /// - `log::Level::Error`: line overflow is only logged (default)
    /// - `log::Level::Warn`: line overflow aborts decoding (strict mode)
    pub fn set_fail_level(&mut self, level: log::Level) {
        self.ctx.fail_level = level;
    }

    pub fn context(&self) -> &CaptionContext {
        &self.ctx
    }

    /// Decodes a packet of 3-byte cc_data units stamped with `pts`.
    pub fn decode(&mut self, packet: &[u8], pts: i64) -> Result<Vec<Cue>> {
        let mut cues = Vec::new();

        let units = packet.chunks_exact(CC_PACKET_SIZE);
        if !units.remainder().is_empty() {
            debug!(
                "Ignoring {} trailing bytes of cc data",
                units.remainder().len()
            );
        }

        for unit in units {
            let mut cc_data_pair = [unit[0], unit[1], unit[2]];
            let cc_type = cc_data_pair[0] & 3;

            if let Err(e) = validate_cc_data_pair(&mut cc_data_pair) {
                trace!("Skipping cc data {unit:02X?}: {e}");
                continue;
            }

            // Only field 1 is decoded.
            if cc_type == CC_TYPE_NTSC_FIELD_2 {
                continue;
            }

            self.ctx.process_cc608(cc_data_pair[1], cc_data_pair[2])?;

            if !self.ctx.screen_reaped {
                continue;
            }
            self.ctx.screen_reaped = false;

            if self.real_time {
                cues.push(Cue {
                    text: self.ctx.buffer.clone(),
                    start: pts,
                    duration: None,
                });
            } else {
                if let Some(text) = self.ctx.prev_string.take() {
                    cues.push(Cue {
                        text,
                        start: self.ctx.prev_time,
                        duration: Some(pts - self.ctx.prev_time),
                    });
                }

                self.ctx.prev_string = Some(self.ctx.buffer.clone());
                self.ctx.prev_time = pts;
            }
        }

        Ok(cues)
    }

    /// Resets screens and mode, e.g. after a seek.
    pub fn flush(&mut self) {
        self.ctx.flush();
    }

    /// Releases the cue held back in batch mode, ending at `end_pts`.
    pub fn finish(&mut self, end_pts: i64) -> Option<Cue> {
        let text = self.ctx.prev_string.take()?;

        Some(Cue {
            text,
            start: self.ctx.prev_time,
            duration: Some(end_pts - self.ctx.prev_time),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::parity::with_odd_parity;

    /// Field 1 unit with parity applied.
    fn cc(hi: u8, lo: u8) -> [u8; 3] {
        [0xFC, with_odd_parity(hi), with_odd_parity(lo)]
    }

    fn packet(pairs: &[(u8, u8)]) -> Vec<u8> {
        pairs.iter().flat_map(|&(hi, lo)| cc(hi, lo)).collect()
    }

    fn write_text(ctx: &mut CaptionContext, text: &[u8]) -> Result<()> {
        for pair in text.chunks(2) {
            ctx.process_cc608(pair[0], pair.get(1).copied().unwrap_or(0))?;
        }
        Ok(())
    }

    #[test]
    fn validate_pairs() {
        let mut pair = cc(0x14, 0x20);
        assert_eq!(validate_cc_data_pair(&mut pair), Ok(()));
        assert_eq!(pair, [0xFC, 0x14, 0x20]);

        let mut pair = [0xF8, 0x94, 0x20];
        assert_eq!(
            validate_cc_data_pair(&mut pair),
            Err(CaptionError::InvalidUnit)
        );

        let mut pair = [0xFC, 0x94, 0xA0];
        assert_eq!(
            validate_cc_data_pair(&mut pair),
            Err(CaptionError::ParityFailed(0xA0))
        );

        let mut pair = [0xFC, 0x14, 0x20];
        assert_eq!(validate_cc_data_pair(&mut pair), Ok(()));
        assert_eq!(pair, [0xFC, SOLID_BLANK, 0x20]);

        let mut pair = [0xFE, 0x12, 0x34];
        assert_eq!(
            validate_cc_data_pair(&mut pair),
            Err(CaptionError::Unsupported(2))
        );

        let mut pair = [0xFF, 0x12, 0x34];
        assert_eq!(
            validate_cc_data_pair(&mut pair),
            Err(CaptionError::Unsupported(3))
        );

        let mut pair = [0xFD, 0x80, 0x80];
        assert_eq!(
            validate_cc_data_pair(&mut pair),
            Err(CaptionError::Unsupported(1))
        );
    }

    #[test]
    fn bad_parity_on_last_byte_drops_unit() -> Result<()> {
        let mut decoder = CaptionDecoder::default();
        decoder.set_real_time(true);

        decoder.decode(&packet(&[(b'A', b'B')]), 0)?;
        let before = decoder.context().writing_screen().row_used;

        let mut bad = cc(0x14, 0x2c);
        bad[2] ^= 0x80;
        let cues = decoder.decode(&bad, 1)?;

        assert!(cues.is_empty());
        assert_eq!(decoder.context().prev_cmd, [0; 2]);
        assert_eq!(decoder.context().writing_screen().row_used, before);
        Ok(())
    }

    #[test]
    fn bad_parity_on_first_byte_writes_blank() -> Result<()> {
        let mut decoder = CaptionDecoder::default();

        let mut unit = cc(b'A', b'B');
        unit[1] ^= 0x80;
        decoder.decode(&unit, 0)?;

        let screen = decoder.context().writing_screen();
        assert_eq!(screen.row_text(0), &[SOLID_BLANK, b'B']);
        assert_eq!(decoder.context().cursor_column, 2);
        Ok(())
    }

    #[test]
    fn redundant_commands_are_suppressed() -> Result<()> {
        let mut ctx = CaptionContext::default();
        write_text(&mut ctx, b"AB")?;

        // End of caption, sent twice as the protocol requires.
        ctx.process_cc608(0x14, 0x2f)?;
        ctx.process_cc608(0x14, 0x2f)?;
        assert_eq!(ctx.active_screen, 1);
        assert_eq!(ctx.prev_cmd, [0x14, 0x2f]);

        // Any other pair in between makes the next one count again.
        ctx.process_cc608(0x14, 0x20)?;
        ctx.process_cc608(0x14, 0x2f)?;
        assert_eq!(ctx.active_screen, 0);
        Ok(())
    }

    #[test]
    fn repeated_characters_render_twice() -> Result<()> {
        let mut ctx = CaptionContext::default();
        ctx.process_cc608(0x14, 0x29)?;

        write_text(&mut ctx, b"ooo")?;
        ctx.process_cc608(b'o', b'o')?;

        assert_eq!(ctx.active().row_text(0), b"ooooo");
        assert_eq!(ctx.prev_cmd, [0; 2]);
        Ok(())
    }

    #[test]
    fn pac_positions_cursor() -> Result<()> {
        let mut ctx = CaptionContext::default();

        // Row 11, green underline
        ctx.process_cc608(0x10, 0x43)?;
        assert_eq!(ctx.cursor_row, 10);
        assert_eq!(ctx.cursor_column, 0);
        assert_eq!(ctx.cursor_color, CcColor::Green);
        assert_eq!(ctx.cursor_font, CcFont::Underlined);

        // Row 15, indent 8
        ctx.process_cc608(0x14, 0x74)?;
        assert_eq!(ctx.cursor_row, 14);
        assert_eq!(ctx.cursor_column, 8);
        assert_eq!(&ctx.writing_screen().characters[14][..8], b"        ");

        // Row 11 has no second range
        ctx.process_cc608(0x10, 0x60)?;
        assert_eq!(ctx.cursor_row, 14);
        Ok(())
    }

    #[test]
    fn mid_row_code_writes_space() -> Result<()> {
        let mut ctx = CaptionContext::default();
        ctx.process_cc608(0x14, 0x29)?;
        write_text(&mut ctx, b"A")?;

        ctx.process_cc608(0x11, 0x2e)?;
        write_text(&mut ctx, b"B")?;

        assert_eq!(ctx.cursor_font, CcFont::Italics);
        assert_eq!(ctx.active().row_text(0), b"A B");
        assert_eq!(ctx.active().fonts[0][2], CcFont::Italics);
        assert_eq!(ctx.active().fonts[0][0], CcFont::Regular);
        Ok(())
    }

    #[test]
    fn attribute_depends_on_low_byte() -> Result<()> {
        let mut ctx = CaptionContext::default();
        ctx.process_cc608(0x14, 0x29)?;

        ctx.process_cc608(0x11, 0x22)?;
        assert_eq!(ctx.cursor_color, CcColor::Green);
        assert_eq!(ctx.cursor_font, CcFont::Regular);

        ctx.process_cc608(0x17, 0x2f)?;
        assert_eq!(ctx.cursor_color, CcColor::White);
        assert_eq!(ctx.cursor_font, CcFont::UnderlinedItalics);
        assert_eq!(ctx.active().row_text(0), b"  ");
        Ok(())
    }

    #[test]
    fn delete_to_end_of_row() -> Result<()> {
        let mut ctx = CaptionContext::default();
        ctx.process_cc608(0x14, 0x29)?;
        write_text(&mut ctx, b"Hello")?;

        ctx.cursor_column = 2;
        ctx.process_cc608(0x14, 0x24)?;
        assert_eq!(ctx.active().row_text(0), b"He");
        Ok(())
    }

    #[test]
    fn line_overflow_is_ignored() -> Result<()> {
        let mut ctx = CaptionContext::default();
        ctx.process_cc608(0x14, 0x29)?;

        let long = [b'x'; 40];
        write_text(&mut ctx, &long)?;

        assert_eq!(ctx.cursor_column, 32);
        assert_eq!(ctx.active().row_text(0).len(), 32);
        Ok(())
    }

    #[test]
    fn line_overflow_is_fatal_when_strict() -> Result<()> {
        let mut ctx = CaptionContext {
            fail_level: log::Level::Warn,
            ..Default::default()
        };
        ctx.process_cc608(0x14, 0x29)?;

        let err = write_text(&mut ctx, &[b'x'; 34]).unwrap_err();
        assert_eq!(
            err.downcast_ref::<CaptionError>(),
            Some(&CaptionError::ScreenWidthExceeded(32))
        );
        Ok(())
    }

    #[test]
    fn reap_empty_screen() {
        let mut ctx = CaptionContext::default();
        ctx.buffer.push_str("stale");

        ctx.reap_screen();
        assert!(ctx.buffer.is_empty());
        assert!(ctx.screen_reaped);

        ctx.screen_reaped = false;
        ctx.reap_screen();
        assert!(ctx.buffer.is_empty());
        assert!(ctx.screen_reaped);
    }

    #[test]
    fn reap_trims_and_joins_rows() -> Result<()> {
        let mut ctx = CaptionContext::default();
        ctx.process_cc608(0x14, 0x29)?;

        ctx.process_cc608(0x11, 0x54)?; // row 1, indent 8
        write_text(&mut ctx, b"first")?;
        ctx.process_cc608(0x12, 0x40)?; // row 3
        write_text(&mut ctx, b" second")?;

        ctx.reap_screen();
        assert_eq!(ctx.buffer, "first\\Nsecond");
        Ok(())
    }

    #[test]
    fn roll_up_two_rows() -> Result<()> {
        let mut ctx = CaptionContext::default();
        ctx.process_cc608(0x14, 0x25)?;
        assert_eq!(ctx.mode, CcMode::RollUp);
        assert_eq!(ctx.rollup, 2);

        ctx.process_cc608(0x11, 0x60)?; // row 2
        write_text(&mut ctx, b"old")?;
        ctx.process_cc608(0x12, 0x60)?; // row 4
        write_text(&mut ctx, b"one")?;
        ctx.process_cc608(0x15, 0x40)?; // row 5
        write_text(&mut ctx, b"two")?;
        assert_eq!(ctx.cursor_row, 4);

        ctx.process_cc608(0x14, 0x2d)?;
        assert_eq!(ctx.buffer, "old\\None\\Ntwo");
        assert_eq!(ctx.cursor_column, 0);

        // Only the row above the cursor survives the scroll.
        assert_eq!(ctx.active().row_used, 1 << 3);
        assert_eq!(ctx.active().row_text(3), b"two");

        write_text(&mut ctx, b"three")?;
        ctx.process_cc608(0x14, 0x2d)?;
        assert_eq!(ctx.buffer, "two\\Nthree");
        assert_eq!(ctx.active().row_used, 1 << 3);
        assert_eq!(ctx.active().row_text(3), b"three");
        Ok(())
    }

    #[test]
    fn roll_up_shifts_cursor_row() -> Result<()> {
        let mut ctx = CaptionContext {
            mode: CcMode::RollUp,
            rollup: 2,
            cursor_row: 5,
            ..Default::default()
        };
        write_text(&mut ctx, b"abc")?;

        ctx.roll_up();

        let screen = ctx.active();
        assert_eq!(screen.row_used, 1 << 4);
        assert_eq!(screen.row_text(4), b"abc");
        assert!(!screen.is_row_used(5));
        Ok(())
    }

    #[test]
    fn roll_up_on_last_row() -> Result<()> {
        let mut ctx = CaptionContext::default();
        ctx.process_cc608(0x14, 0x26)?;

        ctx.process_cc608(0x14, 0x70)?; // row 15
        write_text(&mut ctx, b"bottom")?;
        ctx.process_cc608(0x14, 0x2d)?;

        assert_eq!(ctx.buffer, "bottom");
        let screen = ctx.active();
        assert!(screen.is_row_used(13));
        assert_eq!(screen.row_text(13), b"bottom");
        assert!(!screen.is_row_used(14));
        Ok(())
    }

    #[test]
    fn text_mode_never_rolls() -> Result<()> {
        let mut ctx = CaptionContext::default();
        ctx.process_cc608(0x14, 0x2b)?;
        write_text(&mut ctx, b"txt")?;

        ctx.process_cc608(0x14, 0x2d)?;
        assert!(ctx.active().is_row_used(0));
        assert_eq!(ctx.active().row_text(0), b"txt");
        Ok(())
    }

    #[test]
    fn pop_on_swaps_screens() -> Result<()> {
        let mut ctx = CaptionContext::default();
        ctx.process_cc608(0x14, 0x20)?;
        write_text(&mut ctx, b"Hi")?;

        assert_eq!(ctx.active().row_used, 0);
        ctx.process_cc608(0x14, 0x2f)?;

        assert_eq!(ctx.active_screen, 1);
        assert_eq!(ctx.buffer, "Hi");
        assert!(ctx.screen_reaped);

        ctx.process_cc608(0x14, 0x2e)?;
        assert_eq!(ctx.screen[0].row_used, 0);
        assert_eq!(ctx.active().row_used, 1);
        Ok(())
    }

    #[test]
    fn pop_on_caption_real_time() -> Result<()> {
        let mut decoder = CaptionDecoder::default();
        decoder.set_real_time(true);

        let input = packet(&[
            (0x14, 0x20),
            (0x14, 0x20),
            (b'H', b'i'),
            (0x14, 0x2f),
            (0x14, 0x2f),
        ]);

        let cues = decoder.decode(&input, 900)?;
        assert_eq!(
            cues,
            [Cue {
                text: "Hi".to_string(),
                start: 900,
                duration: None,
            }]
        );
        Ok(())
    }

    #[test]
    fn pop_on_caption_batch() -> Result<()> {
        let mut decoder = CaptionDecoder::default();

        let cues = decoder.decode(&packet(&[(0x14, 0x20), (0x14, 0x20)]), 0)?;
        assert!(cues.is_empty());
        let cues = decoder.decode(&packet(&[(b'H', b'i')]), 100)?;
        assert!(cues.is_empty());
        let cues = decoder.decode(&packet(&[(0x14, 0x2f), (0x14, 0x2f)]), 200)?;
        assert!(cues.is_empty());

        // Erase the display; the held cue ends here.
        let cues = decoder.decode(&packet(&[(0x14, 0x2c), (0x14, 0x2f)]), 500)?;
        assert_eq!(
            cues,
            [Cue {
                text: "Hi".to_string(),
                start: 200,
                duration: Some(300),
            }]
        );

        let last = decoder.finish(800).expect("held cue");
        assert_eq!(last.start, 500);
        assert_eq!(last.duration, Some(300));
        assert!(decoder.finish(900).is_none());
        Ok(())
    }

    #[test]
    fn field_2_is_skipped() -> Result<()> {
        let mut decoder = CaptionDecoder::default();

        let mut unit = cc(b'A', b'B');
        unit[0] = 0xFD;
        decoder.decode(&unit, 0)?;

        assert_eq!(decoder.context().writing_screen().row_used, 0);
        Ok(())
    }

    #[test]
    fn flush_resets_mode_and_screens() -> Result<()> {
        let mut decoder = CaptionDecoder::default();
        decoder.set_real_time(true);

        decoder.decode(&packet(&[(0x14, 0x29), (b'A', b'B')]), 0)?;
        assert_eq!(decoder.context().mode, CcMode::PaintOn);

        decoder.flush();
        let ctx = decoder.context();
        assert_eq!(ctx.mode, CcMode::PopOn);
        assert_eq!(ctx.screen[0].row_used, 0);
        assert_eq!(ctx.screen[1].row_used, 0);
        assert!(ctx.screen_reaped);

        // The next accepted unit reports the cleared screen.
        let cues = decoder.decode(&packet(&[(0x14, 0x20)]), 10)?;
        assert_eq!(cues.len(), 1);
        assert!(cues[0].is_empty());
        Ok(())
    }
}
