#![doc = include_str!("../README.md")]
//!
//! ## Technical Overview
//!
//! Closed captions in MPEG-2 video travel in picture user data, wrapped in
//! ATSC A/53 registered user data (`GA94`). Each block carries up to 31
//! three-byte cc_data packets holding EIA-608 byte pairs or CEA-708 DTVCC
//! data.
//!
//! ### Record Grammar
//!
//! Every record is described once through [`utils::syntax::Syntax`]. The
//! same description reads from a [`utils::bitstream_io::BitstreamIoReader`]
//! and writes to a [`utils::bitstream_io::BitstreamIoWriter`], so both
//! directions share field widths, fixed values and range checks.
//!
//! ### Caption Decoding
//!
//! EIA-608 field 1 data drives a two screen state machine supporting
//! pop-on, paint-on, roll-up and text modes. Screens are reaped to plain
//! text with `\N` line breaks.
//!
//! ## Quick Start
//!
//! 1. Split an elementary stream into units using [`process::extract::Extractor`]
//! 2. Decode user data units using [`process::transcode::read_a53_user_data`]
//! 3. Convert to side data using [`process::transcode::write_a53_cc_side_data`]
//! 4. Decode captions using [`process::decode::CaptionDecoder`]
//!
//! ```rust,no_run
//! use ccaption::process::decode::CaptionDecoder;
//! use ccaption::process::extract::Extractor;
//! use ccaption::process::transcode::{read_a53_user_data, write_a53_cc_side_data};
//! use ccaption::process::EXAMPLE_ES;
//!
//! let mut extractor = Extractor::default();
//! let mut decoder = CaptionDecoder::default();
//!
//! extractor.push_bytes(EXAMPLE_ES);
//! extractor.finish();
//!
//! let mut pts = 0;
//! for unit in extractor.flatten() {
//!     if unit.is_picture() {
//!         pts += 1001;
//!     }
//!     if !unit.is_user_data() {
//!         continue;
//!     }
//!
//!     let user_data = read_a53_user_data(&unit.data)?;
//!     if user_data.cc_data().is_none() {
//!         continue;
//!     }
//!
//!     let mut side_data = Vec::new();
//!     write_a53_cc_side_data(&mut side_data, &user_data)?;
//!
//!     for cue in decoder.decode(&side_data, pts)? {
//!         println!("{cue}");
//!     }
//! }
//!
//! if let Some(cue) = decoder.finish(pts) {
//!     println!("{cue}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Processing stages for caption carrying streams.
///
/// 1. **Unit Extraction** ([`process::extract`]): Splits MPEG-2 video
///    elementary streams on start codes.
///
/// 2. **Transcoding** ([`process::transcode`]): Reads and writes A/53 user
///    data and A53 CC side data.
///
/// 3. **Filtering** ([`process::filter`]): Passes, removes or extracts
///    captions in user data units and rewrites sequence aspect ratio and
///    frame rate.
///
/// 4. **Decoding** ([`process::decode`]): EIA-608 caption decoding.
pub mod process;

/// Data structures for caption carriage and display.
///
/// - **User Data** ([`structs::user_data`]): A/53 registered user data and AFD
/// - **Caption Data** ([`structs::cc_data`]): CEA-708 cc_data packets
/// - **Bar Data** ([`structs::bar_data`]): Letterbox and pillarbox bars
/// - **Sequence Header** ([`structs::sequence_header`]): MPEG-2 picture size and frame rate
/// - **Sequence Extension** ([`structs::sequence_extension`]): Frame rate extension fields
/// - **Picture Header** ([`structs::picture_header`]): Picture order and coding type
/// - **Screen** ([`structs::screen`]): EIA-608 character grid
/// - **Cue** ([`structs::cue`]): Timed caption text
pub mod structs;

/// Utility functions and supporting infrastructure.
///
/// - **Bitstream I/O** ([`utils::bitstream_io`]): Bounded bit-level reading/writing
/// - **Syntax** ([`utils::syntax`]): One grammar for both directions
/// - **Parity** ([`utils::parity`]): Line 21 odd parity
/// - **Error Handling** ([`utils::errors`]): Error types
pub mod utils;
