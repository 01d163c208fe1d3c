/// Start code unit extraction from MPEG-2 video elementary streams.
///
/// Provides the [`Extractor`](extract::Extractor) which splits a continuous
/// stream into [`Unit`](extract::Unit) objects.
pub mod extract;

/// Reading and writing A/53 user data and A53 CC side data.
pub mod transcode;

/// A/53 closed caption pass/remove/extract over a fragment of units.
///
/// Provides the [`UserDataFilter`](filter::UserDataFilter) and the
/// [`SequenceFilter`](filter::SequenceFilter).
pub mod filter;

/// EIA-608 caption decoding to timed [`Cue`](crate::structs::cue::Cue)s.
///
/// Provides the [`CaptionDecoder`](decode::CaptionDecoder) and the
/// underlying [`CaptionContext`](decode::CaptionContext) state machine.
pub mod decode;

/// ATSC cc_data carrying "resume caption loading" and "Hi" on field 1.
pub const EXAMPLE_USER_DATA: &[u8] = &[
    0x47, 0x41, 0x39, 0x34, 0x03, 0x42, 0xFF, 0xFC, 0x94, 0x20, 0xFC, 0xC8, 0xE9, 0xFF,
];

/// ATSC bar data with top and bottom bars.
pub const EXAMPLE_BAR_DATA: &[u8] = &[0x47, 0x41, 0x39, 0x34, 0x06, 0xCF, 0xC0, 0x3C, 0xC1, 0xA4];

pub const EXAMPLE_AFD_DATA: &[u8] = &[0x44, 0x54, 0x47, 0x31, 0x41, 0xF8];

/// 720x480, 4:3, 29.97 fps
pub const EXAMPLE_SEQUENCE_HEADER: &[u8] = &[0x2D, 0x01, 0xE0, 0x24, 0xFF, 0xFF, 0xE3, 0x80];

/// Main profile at main level, 4:2:0, interlaced
pub const EXAMPLE_SEQUENCE_EXTENSION: &[u8] = &[0x14, 0x82, 0x00, 0x01, 0x00, 0x00];

pub const EXAMPLE_ES: &[u8] = &[
    0x00, 0x00, 0x01, 0xB3, 0x2D, 0x01, 0xE0, 0x24, 0xFF, 0xFF, 0xE3, 0x80, // sequence header
    0x00, 0x00, 0x01, 0xB8, 0x00, 0x08, 0x00, 0x40, // group of pictures
    0x00, 0x00, 0x01, 0x00, 0x00, 0x0F, 0xFF, 0xF8, // picture
    0x00, 0x00, 0x01, 0xB2, 0x47, 0x41, 0x39, 0x34, 0x03, 0x42, 0xFF, 0xFC, 0x94, 0x20, 0xFC,
    0xC8, 0xE9, 0xFF, // user data
    0x00, 0x00, 0x01, 0xB7, // sequence end
];
