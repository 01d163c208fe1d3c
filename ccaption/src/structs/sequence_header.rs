//! MPEG-2 video sequence header
//!
//! Only the leading fixed-size fields are described; quantiser matrices that
//! may follow are not needed to time caption data.

use anyhow::Result;

use crate::utils::bitstream_io::{BsIoSliceReader, BsIoSliceWriter};
use crate::utils::syntax::{Syntax, SyntaxCursor};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SequenceHeader {
    pub horizontal_size_value: u16,
    pub vertical_size_value: u16,
    pub aspect_ratio_information: u8,
    pub frame_rate_code: u8,
    pub bit_rate_value: u32,
    pub vbv_buffer_size_value: u16,
    pub constrained_parameters_flag: bool,
}

impl SequenceHeader {
    /// Parses the payload that follows the `00 00 01 B3` start code.
    pub fn from_bytes(buffer: &[u8]) -> Result<Self> {
        let mut header = Self::default();
        header.syntax(&mut BsIoSliceReader::from_slice(buffer))?;

        Ok(header)
    }

    /// Overwrites the leading fields of `buffer` with this header. Bytes
    /// past the fixed fields are left untouched.
    pub fn write_to(&self, buffer: &mut [u8]) -> Result<()> {
        let mut header = *self;
        header.syntax(&mut BsIoSliceWriter::from_slice(buffer))
    }

    /// Frame rate as a `(numerator, denominator)` pair (table 6-4).
    pub fn frame_rate(&self) -> Option<(u32, u32)> {
        match self.frame_rate_code {
            1..=8 => Some(FRAME_RATES[self.frame_rate_code as usize]),
            _ => None,
        }
    }
}

/// Frame rates indexed by `frame_rate_code`; code 0 is forbidden.
const FRAME_RATES: [(u32, u32); 9] = [
    (0, 1),
    (24000, 1001),
    (24, 1),
    (25, 1),
    (30000, 1001),
    (30, 1),
    (50, 1),
    (60000, 1001),
    (60, 1),
];

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 { a } else { gcd(b, a % b) }
}

/// `aspect_ratio_information` for a display aspect ratio. Ratios other than
/// 4:3, 16:9 and 2.21:1 map to square samples.
pub fn aspect_ratio_information(num: u32, den: u32) -> u8 {
    let g = gcd(num, den).max(1);

    match (num / g, den / g) {
        (4, 3) => 2,
        (16, 9) => 3,
        (221, 100) => 4,
        _ => 1,
    }
}

/// Finds the `frame_rate_code` and sequence extension `(n, d)` fields
/// closest to `num / den`, returned as `(code, n, d)`.
///
/// The coded rate is `FRAME_RATES[code] * (n + 1) / (d + 1)`. A rate with a
/// code of its own never uses the extension. Falls back to 30000/1001.
pub fn best_frame_rate(num: u32, den: u32) -> (u8, u8, u8) {
    if let Some(code) = (1..FRAME_RATES.len()).find(|&code| {
        let (rn, rd) = FRAME_RATES[code];
        num as u64 * rd as u64 == rn as u64 * den as u64
    }) {
        return (code as u8, 0, 0);
    }

    let mut best = (4, 0, 0);
    // Ratio of the larger rate to the smaller one
    let mut best_error = (i32::MAX as u128, 1u128);

    for (code, &(rn, rd)) in FRAME_RATES.iter().enumerate().skip(1) {
        for n in 1..=4u64 {
            for d in 1..=32u64 {
                let test = (rn as u64 * n) as u128 * den as u128;
                let target = num as u128 * (rd as u64 * d) as u128;
                let ext = (code as u8, (n - 1) as u8, (d - 1) as u8);

                if test == target {
                    return ext;
                }

                let error = (test.max(target), test.min(target));
                let lhs = error.0 * best_error.1;
                let rhs = best_error.0 * error.1;
                if lhs < rhs || (lhs == rhs && n == 1 && d == 1) {
                    best = ext;
                    best_error = error;
                }
            }
        }
    }

    best
}

impl Syntax for SequenceHeader {
    fn syntax<C: SyntaxCursor>(&mut self, rw: &mut C) -> Result<()> {
        rw.ui(12, "horizontal_size_value", &mut self.horizontal_size_value)?;
        rw.ui(12, "vertical_size_value", &mut self.vertical_size_value)?;
        rw.ui(4, "aspect_ratio_information", &mut self.aspect_ratio_information)?;
        rw.ui(4, "frame_rate_code", &mut self.frame_rate_code)?;
        rw.ui(18, "bit_rate_value", &mut self.bit_rate_value)?;
        rw.fixed(1, "marker_bit", 1)?;
        rw.ui(10, "vbv_buffer_size_value", &mut self.vbv_buffer_size_value)?;
        rw.flag(
            "constrained_parameters_flag",
            &mut self.constrained_parameters_flag,
        )?;

        Ok(())
    }
}

#[test]
fn parse_sequence_header() -> Result<()> {
    use crate::process::EXAMPLE_SEQUENCE_HEADER;

    let header = SequenceHeader::from_bytes(EXAMPLE_SEQUENCE_HEADER)?;

    assert_eq!(header.horizontal_size_value, 720);
    assert_eq!(header.vertical_size_value, 480);
    assert_eq!(header.aspect_ratio_information, 2);
    assert_eq!(header.frame_rate(), Some((30000, 1001)));
    assert_eq!(header.bit_rate_value, 0x3FFFF);
    assert!(!header.constrained_parameters_flag);
    Ok(())
}

#[test]
fn missing_marker_bit() {
    let err = SequenceHeader::from_bytes(&[0x2D, 0x01, 0xE0, 0x24, 0xFF, 0xFF, 0xC0, 0x00])
        .unwrap_err();

    assert!(err.to_string().contains("marker_bit"));
}

#[test]
fn rewrite_sequence_header() -> Result<()> {
    use crate::process::EXAMPLE_SEQUENCE_HEADER;

    let mut buffer = EXAMPLE_SEQUENCE_HEADER.to_vec();
    buffer.push(0xAB);

    let mut header = SequenceHeader::from_bytes(&buffer)?;
    header.aspect_ratio_information = 3;
    header.frame_rate_code = 3;
    header.write_to(&mut buffer)?;

    assert_eq!(buffer, [0x2D, 0x01, 0xE0, 0x33, 0xFF, 0xFF, 0xE3, 0x80, 0xAB]);
    assert_eq!(SequenceHeader::from_bytes(&buffer)?.frame_rate(), Some((25, 1)));
    Ok(())
}

#[test]
fn display_aspect_ratios() {
    assert_eq!(aspect_ratio_information(4, 3), 2);
    assert_eq!(aspect_ratio_information(32, 18), 3);
    assert_eq!(aspect_ratio_information(221, 100), 4);
    assert_eq!(aspect_ratio_information(5, 4), 1);
}

#[test]
fn closest_frame_rate() {
    assert_eq!(best_frame_rate(30000, 1001), (4, 0, 0));
    assert_eq!(best_frame_rate(50, 2), (3, 0, 0));
    // 24 * 1 / 2
    assert_eq!(best_frame_rate(12, 1), (2, 0, 1));
    // 25 * 3 / 5
    assert_eq!(best_frame_rate(15, 1), (3, 2, 4));
    // Above every coded rate: 60 * 4 / 1 is closest
    assert_eq!(best_frame_rate(1000, 1), (8, 3, 0));
}
