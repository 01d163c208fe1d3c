//! EIA-608 caption screen
//!
//! A screen is a fixed 15 x 32 character grid. Each row has one extra cell
//! for a NUL terminator so a row can be read back as a string. Rows are
//! tracked with a bitmask: a row whose bit is clear is logically empty even
//! if stale characters remain in the grid.

use crate::utils::errors::CaptionError;

pub const SCREEN_ROWS: usize = 15;
pub const SCREEN_COLUMNS: usize = 32;

/// Display mode of the caption decoder.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum CcMode {
    #[default]
    PopOn,
    PaintOn,
    RollUp,
    Text,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum CcColor {
    #[default]
    White,
    Green,
    Blue,
    Cyan,
    Red,
    Yellow,
    Magenta,
    UserDefined,
    Black,
    Transparent,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum CcFont {
    #[default]
    Regular,
    Italics,
    Underlined,
    UnderlinedItalics,
}

/// Color, font and indent for PAC and mid-row codes, indexed by the low 5
/// bits of the second byte (0x40..0x5f / 0x60..0x7f).
pub const PAC2_ATTRIBS: [(CcColor, CcFont, u8); 32] = {
    use CcColor::*;
    use CcFont::*;

    [
        (White, Regular, 0),            // 0x40 || 0x60
        (White, Underlined, 0),         // 0x41 || 0x61
        (Green, Regular, 0),            // 0x42 || 0x62
        (Green, Underlined, 0),         // 0x43 || 0x63
        (Blue, Regular, 0),             // 0x44 || 0x64
        (Blue, Underlined, 0),          // 0x45 || 0x65
        (Cyan, Regular, 0),             // 0x46 || 0x66
        (Cyan, Underlined, 0),          // 0x47 || 0x67
        (Red, Regular, 0),              // 0x48 || 0x68
        (Red, Underlined, 0),           // 0x49 || 0x69
        (Yellow, Regular, 0),           // 0x4a || 0x6a
        (Yellow, Underlined, 0),        // 0x4b || 0x6b
        (Magenta, Regular, 0),          // 0x4c || 0x6c
        (Magenta, Underlined, 0),       // 0x4d || 0x6d
        (White, Italics, 0),            // 0x4e || 0x6e
        (White, UnderlinedItalics, 0),  // 0x4f || 0x6f
        (White, Regular, 0),            // 0x50 || 0x70
        (White, Underlined, 0),         // 0x51 || 0x71
        (White, Regular, 4),            // 0x52 || 0x72
        (White, Underlined, 4),         // 0x53 || 0x73
        (White, Regular, 8),            // 0x54 || 0x74
        (White, Underlined, 8),         // 0x55 || 0x75
        (White, Regular, 12),           // 0x56 || 0x76
        (White, Underlined, 12),        // 0x57 || 0x77
        (White, Regular, 16),           // 0x58 || 0x78
        (White, Underlined, 16),        // 0x59 || 0x79
        (White, Regular, 20),           // 0x5a || 0x7a
        (White, Underlined, 20),        // 0x5b || 0x7b
        (White, Regular, 24),           // 0x5c || 0x7c
        (White, Underlined, 24),        // 0x5d || 0x7d
        (White, Regular, 28),           // 0x5e || 0x7e
        (White, Underlined, 28),        // 0x5f || 0x7f
    ]
};

/// Screen row (1-based) addressed by a PAC. -1 is unused.
pub const ROW_MAP: [i8; 16] = [11, -1, 1, 2, 3, 4, 12, 13, 14, 15, 5, 6, 7, 8, 9, 10];

#[derive(Debug, Clone)]
pub struct Screen {
    pub characters: [[u8; SCREEN_COLUMNS + 1]; SCREEN_ROWS],
    pub colors: [[CcColor; SCREEN_COLUMNS + 1]; SCREEN_ROWS],
    pub fonts: [[CcFont; SCREEN_COLUMNS + 1]; SCREEN_ROWS],
    /// Bit `n` set when row `n` holds text.
    pub row_used: u16,
}

impl Default for Screen {
    fn default() -> Self {
        Self {
            characters: [[0; SCREEN_COLUMNS + 1]; SCREEN_ROWS],
            colors: [[CcColor::White; SCREEN_COLUMNS + 1]; SCREEN_ROWS],
            fonts: [[CcFont::Regular; SCREEN_COLUMNS + 1]; SCREEN_ROWS],
            row_used: 0,
        }
    }
}

impl Screen {
    #[inline(always)]
    pub fn is_row_used(&self, row: usize) -> bool {
        row < SCREEN_ROWS && self.row_used & (1 << row) != 0
    }

    #[inline(always)]
    pub fn set_row_used(&mut self, row: usize) {
        if row < SCREEN_ROWS {
            self.row_used |= 1 << row;
        }
    }

    #[inline(always)]
    pub fn unset_row_used(&mut self, row: usize) {
        if row < SCREEN_ROWS {
            self.row_used &= !(1 << row);
        }
    }

    pub fn clear(&mut self) {
        self.row_used = 0;
    }

    /// Writes one cell. The terminator column only accepts NUL.
    pub fn write_char(
        &mut self,
        row: usize,
        column: usize,
        ch: u8,
        color: CcColor,
        font: CcFont,
    ) -> Result<(), CaptionError> {
        if column < SCREEN_COLUMNS || (column == SCREEN_COLUMNS && ch == 0) {
            self.characters[row][column] = ch;
            self.colors[row][column] = color;
            self.fonts[row][column] = font;
            return Ok(());
        }

        Err(CaptionError::ScreenWidthExceeded(column))
    }

    /// Characters of `row` up to its terminator.
    pub fn row_text(&self, row: usize) -> &[u8] {
        let chars = &self.characters[row];
        let end = chars.iter().position(|&c| c == 0).unwrap_or(chars.len());
        &chars[..end]
    }

    /// Copies the content of row `from` into row `to`. A source below the
    /// last row reads as blank.
    pub fn copy_row(&mut self, from: usize, to: usize) {
        if from < SCREEN_ROWS {
            self.characters[to] = self.characters[from];
            self.colors[to] = self.colors[from];
            self.fonts[to] = self.fonts[from];
        } else {
            self.characters[to] = [0; SCREEN_COLUMNS + 1];
            self.colors[to] = [CcColor::White; SCREEN_COLUMNS + 1];
            self.fonts[to] = [CcFont::Regular; SCREEN_COLUMNS + 1];
        }
    }
}

#[test]
fn screen_rows() {
    let mut screen = Screen::default();

    for (i, &ch) in b"Hello".iter().enumerate() {
        screen
            .write_char(3, i, ch, CcColor::Green, CcFont::Italics)
            .unwrap();
    }
    screen.set_row_used(3);

    assert!(screen.is_row_used(3));
    assert!(!screen.is_row_used(4));
    assert!(!screen.is_row_used(SCREEN_ROWS));
    assert_eq!(screen.row_text(3), b"Hello");
    assert_eq!(screen.colors[3][0], CcColor::Green);

    assert_eq!(
        screen.write_char(3, SCREEN_COLUMNS, b'x', CcColor::White, CcFont::Regular),
        Err(CaptionError::ScreenWidthExceeded(SCREEN_COLUMNS))
    );
    assert!(
        screen
            .write_char(3, SCREEN_COLUMNS, 0, CcColor::White, CcFont::Regular)
            .is_ok()
    );

    screen.copy_row(3, 2);
    assert_eq!(screen.row_text(2), b"Hello");
    screen.copy_row(SCREEN_ROWS, 2);
    assert_eq!(screen.row_text(2), b"");

    screen.clear();
    assert_eq!(screen.row_used, 0);
    assert_eq!(screen.row_text(3), b"Hello");
}
