//! MPEG-2 sequence extension

use anyhow::Result;

use crate::utils::bitstream_io::{BsIoSliceReader, BsIoSliceWriter};
use crate::utils::syntax::{Syntax, SyntaxCursor};

/// `extension_start_code_identifier` of a sequence extension.
pub const SEQUENCE_EXTENSION_ID: u8 = 1;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SequenceExtension {
    pub profile_and_level_indication: u8,
    pub progressive_sequence: bool,
    pub chroma_format: u8,
    pub horizontal_size_extension: u8,
    pub vertical_size_extension: u8,
    pub bit_rate_extension: u16,
    pub vbv_buffer_size_extension: u8,
    pub low_delay: bool,
    pub frame_rate_extension_n: u8,
    pub frame_rate_extension_d: u8,
}

impl SequenceExtension {
    /// Parses the payload that follows the `00 00 01 B5` start code.
    pub fn from_bytes(buffer: &[u8]) -> Result<Self> {
        let mut extension = Self::default();
        extension.syntax(&mut BsIoSliceReader::from_slice(buffer))?;

        Ok(extension)
    }

    /// Overwrites the leading fields of `buffer` with this extension.
    pub fn write_to(&self, buffer: &mut [u8]) -> Result<()> {
        let mut extension = *self;
        extension.syntax(&mut BsIoSliceWriter::from_slice(buffer))
    }
}

impl Syntax for SequenceExtension {
    fn syntax<C: SyntaxCursor>(&mut self, rw: &mut C) -> Result<()> {
        rw.fixed(
            4,
            "extension_start_code_identifier",
            SEQUENCE_EXTENSION_ID as u32,
        )?;
        rw.ui(
            8,
            "profile_and_level_indication",
            &mut self.profile_and_level_indication,
        )?;
        rw.flag("progressive_sequence", &mut self.progressive_sequence)?;
        rw.ui(2, "chroma_format", &mut self.chroma_format)?;
        rw.ui(2, "horizontal_size_extension", &mut self.horizontal_size_extension)?;
        rw.ui(2, "vertical_size_extension", &mut self.vertical_size_extension)?;
        rw.ui(12, "bit_rate_extension", &mut self.bit_rate_extension)?;
        rw.fixed(1, "marker_bit", 1)?;
        rw.ui(8, "vbv_buffer_size_extension", &mut self.vbv_buffer_size_extension)?;
        rw.flag("low_delay", &mut self.low_delay)?;
        rw.ui(2, "frame_rate_extension_n", &mut self.frame_rate_extension_n)?;
        rw.ui(5, "frame_rate_extension_d", &mut self.frame_rate_extension_d)?;

        Ok(())
    }
}

#[test]
fn parse_sequence_extension() -> Result<()> {
    use crate::process::EXAMPLE_SEQUENCE_EXTENSION;

    let extension = SequenceExtension::from_bytes(EXAMPLE_SEQUENCE_EXTENSION)?;

    assert_eq!(extension.profile_and_level_indication, 0x48);
    assert!(!extension.progressive_sequence);
    assert_eq!(extension.chroma_format, 1);
    assert_eq!(extension.frame_rate_extension_n, 0);
    assert_eq!(extension.frame_rate_extension_d, 0);
    Ok(())
}

#[test]
fn rewrite_frame_rate_extension() -> Result<()> {
    use crate::process::EXAMPLE_SEQUENCE_EXTENSION;

    let mut buffer = EXAMPLE_SEQUENCE_EXTENSION.to_vec();
    let mut extension = SequenceExtension::from_bytes(&buffer)?;
    extension.frame_rate_extension_n = 2;
    extension.frame_rate_extension_d = 4;
    extension.write_to(&mut buffer)?;

    assert_eq!(buffer, [0x14, 0x82, 0x00, 0x01, 0x00, 0x44]);
    Ok(())
}

#[test]
fn other_extension_is_rejected() {
    // Sequence display extension
    assert!(SequenceExtension::from_bytes(&[0x23, 0x05, 0x05, 0x05, 0x2D, 0x02]).is_err());
}
