//! Data structures representing caption carriage and display.
//!
//! Contains the A/53 user data records shared by the reader and writer,
//! the MPEG-2 sequence headers used for timing and rewriting, and the caption screen and
//! cue types produced by the decoder.

pub mod bar_data;
pub mod cc_data;
pub mod cue;
pub mod picture_header;
pub mod screen;
pub mod sequence_extension;
pub mod sequence_header;
pub mod user_data;
