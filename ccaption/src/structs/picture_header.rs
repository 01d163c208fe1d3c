//! MPEG-2 video picture header
//!
//! Only the fixed leading fields are described. `temporal_reference` gives
//! the display position of the picture inside its group of pictures.

use anyhow::Result;

use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::syntax::{Syntax, SyntaxCursor};

pub const PICTURE_CODING_TYPE_I: u8 = 1;
pub const PICTURE_CODING_TYPE_P: u8 = 2;
pub const PICTURE_CODING_TYPE_B: u8 = 3;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PictureHeader {
    pub temporal_reference: u16,
    pub picture_coding_type: u8,
    pub vbv_delay: u16,
}

impl PictureHeader {
    /// Parses the payload that follows the `00 00 01 00` start code.
    pub fn from_bytes(buffer: &[u8]) -> Result<Self> {
        let mut header = Self::default();
        header.syntax(&mut BsIoSliceReader::from_slice(buffer))?;

        Ok(header)
    }

    pub fn coding_type_char(&self) -> char {
        match self.picture_coding_type {
            PICTURE_CODING_TYPE_I => 'I',
            PICTURE_CODING_TYPE_P => 'P',
            PICTURE_CODING_TYPE_B => 'B',
            _ => '?',
        }
    }
}

impl Syntax for PictureHeader {
    fn syntax<C: SyntaxCursor>(&mut self, rw: &mut C) -> Result<()> {
        rw.ui(10, "temporal_reference", &mut self.temporal_reference)?;
        rw.ui(3, "picture_coding_type", &mut self.picture_coding_type)?;
        rw.ui(16, "vbv_delay", &mut self.vbv_delay)?;

        Ok(())
    }
}

#[test]
fn parse_picture_header() -> Result<()> {
    let header = PictureHeader::from_bytes(&[0x00, 0x0F, 0xFF, 0xF8])?;
    assert_eq!(header.temporal_reference, 0);
    assert_eq!(header.coding_type_char(), 'I');
    assert_eq!(header.vbv_delay, 0xFFFF);

    // temporal_reference 2, B picture
    let header = PictureHeader::from_bytes(&[0x00, 0x9C, 0x00, 0x00])?;
    assert_eq!(header.temporal_reference, 2);
    assert_eq!(header.picture_coding_type, PICTURE_CODING_TYPE_B);

    assert!(PictureHeader::from_bytes(&[0x00]).is_err());
    Ok(())
}
