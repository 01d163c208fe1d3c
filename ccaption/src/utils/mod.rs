//! Utility functions and supporting infrastructure.
//!
//! Provides bit cursors, the bidirectional syntax layer, parity helpers and
//! error types.

pub mod bitstream_io;
pub mod errors;
pub mod parity;
pub mod syntax;
