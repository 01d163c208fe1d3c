use crate::structs::sequence_extension::SEQUENCE_EXTENSION_ID;
use crate::utils::errors::ExtractError;
use log::trace;
use std::collections::VecDeque;

pub const PICTURE_START_CODE: u8 = 0x00;
pub const USER_DATA_START_CODE: u8 = 0xB2;
pub const SEQUENCE_HEADER_CODE: u8 = 0xB3;
pub const EXTENSION_START_CODE: u8 = 0xB5;
pub const SEQUENCE_END_CODE: u8 = 0xB7;
pub const GROUP_START_CODE: u8 = 0xB8;

const START_CODE_PREFIX: [u8; 3] = [0x00, 0x00, 0x01];

/// Splits an MPEG-2 video elementary stream into start code delimited units.
///
/// A unit ends where the next `00 00 01` prefix begins, so a unit is only
/// released once the following prefix has been pushed, or after
/// [`Extractor::finish`].
///
/// # Example
///
/// ```rust,no_run
/// use ccaption::process::extract::Extractor;
///
/// let mut extractor = Extractor::default();
/// extractor.push_bytes(&std::fs::read("video.m2v")?);
/// extractor.finish();
///
/// for unit in extractor.flatten() {
///     if unit.is_user_data() {
///         println!("user data: {} bytes", unit.data.len());
///     }
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Extractor {
    buffer: VecDeque<u8>,
    io_counter: usize,
    finished: bool,
    units_processed: usize,
}

impl Default for Extractor {
    fn default() -> Self {
        Self {
            buffer: VecDeque::with_capacity(0x10000),
            io_counter: 0,
            finished: false,
            units_processed: 0,
        }
    }
}

impl Extractor {
    /// Adds raw elementary stream bytes to the internal buffer.
    pub fn push_bytes(&mut self, data: &[u8]) {
        self.buffer.extend(data);
        self.io_counter += 1;
    }

    /// Marks the end of input so the last buffered unit can be released.
    pub fn finish(&mut self) {
        self.finished = true;
        self.io_counter += 1;
    }

    pub fn units_processed(&self) -> usize {
        self.units_processed
    }

    fn find_start_code(&self, from: usize) -> Option<usize> {
        let len = self.buffer.len();
        (from..len.saturating_sub(2)).find(|&i| {
            self.buffer[i] == START_CODE_PREFIX[0]
                && self.buffer[i + 1] == START_CODE_PREFIX[1]
                && self.buffer[i + 2] == START_CODE_PREFIX[2]
        })
    }

    fn consume_front(&mut self, cnt: usize) {
        self.buffer.drain(..cnt);
    }

    fn iter_insufficient(&mut self) -> Option<Result<Unit, ExtractError>> {
        self.io_counter -= 1;
        Some(Err(ExtractError::InsufficientData))
    }
}

impl Iterator for Extractor {
    type Item = Result<Unit, ExtractError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.io_counter == 0 {
            return None;
        }

        let Some(offset) = self.find_start_code(0) else {
            // Keep a possible partial prefix.
            let keep = if self.finished { 0 } else { 2 };
            self.consume_front(self.buffer.len().saturating_sub(keep));
            return self.iter_insufficient();
        };

        if offset > 0 {
            trace!("Skipping {offset} bytes before start code");
            self.consume_front(offset);
        }

        if self.buffer.len() < 4 {
            return self.iter_insufficient();
        }

        let end = match self.find_start_code(4) {
            Some(end) => end,
            None if self.finished => self.buffer.len(),
            None => return self.iter_insufficient(),
        };

        let start_code = self.buffer[3];
        let data = self.buffer.drain(..end).skip(4).collect();

        self.units_processed += 1;
        Some(Ok(Unit { start_code, data }))
    }
}

/// One start code delimited unit. `data` excludes the 4-byte start code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub start_code: u8,
    pub data: Vec<u8>,
}

impl AsRef<[u8]> for Unit {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl Unit {
    pub fn is_picture(&self) -> bool {
        self.start_code == PICTURE_START_CODE
    }

    pub fn is_user_data(&self) -> bool {
        self.start_code == USER_DATA_START_CODE
    }

    pub fn is_sequence_header(&self) -> bool {
        self.start_code == SEQUENCE_HEADER_CODE
    }

    pub fn is_sequence_extension(&self) -> bool {
        self.start_code == EXTENSION_START_CODE
            && self.data.first().is_some_and(|b| b >> 4 == SEQUENCE_EXTENSION_ID)
    }

    /// Appends the unit, start code included, to `out`.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&START_CODE_PREFIX);
        out.push(self.start_code);
        out.extend_from_slice(&self.data);
    }
}

#[test]
fn split_units() {
    use crate::process::EXAMPLE_ES;

    let mut extractor = Extractor::default();
    extractor.push_bytes(EXAMPLE_ES);
    extractor.finish();

    let units = extractor.flatten().collect::<Vec<_>>();
    let codes = units.iter().map(|u| u.start_code).collect::<Vec<_>>();
    assert_eq!(
        codes,
        [
            SEQUENCE_HEADER_CODE,
            GROUP_START_CODE,
            PICTURE_START_CODE,
            USER_DATA_START_CODE,
            SEQUENCE_END_CODE
        ]
    );

    assert!(units[0].is_sequence_header());
    assert!(units[2].is_picture());
    assert!(units[3].is_user_data());
    assert!(units[4].data.is_empty());

    let mut out = Vec::new();
    for unit in &units {
        unit.write_to(&mut out);
    }
    assert_eq!(out, EXAMPLE_ES);
}

#[test]
fn split_across_pushes() {
    use crate::process::EXAMPLE_ES;

    let mut extractor = Extractor::default();
    let mut units = Vec::new();

    // Leading garbage is dropped.
    extractor.push_bytes(&[0xFF, 0x12]);
    for chunk in EXAMPLE_ES.chunks(5) {
        extractor.push_bytes(chunk);
        for result in &mut extractor {
            match result {
                Ok(unit) => units.push(unit),
                Err(ExtractError::InsufficientData) => break,
            }
        }
    }

    // The last unit waits for the end of input.
    assert_eq!(units.len(), 4);

    extractor.finish();
    units.extend((&mut extractor).flatten());
    assert_eq!(units.len(), 5);
    assert_eq!(extractor.units_processed(), 5);
    assert_eq!(units[4].start_code, SEQUENCE_END_CODE);
}

#[test]
fn no_start_code() {
    let mut extractor = Extractor::default();
    extractor.push_bytes(&[0x12, 0x34, 0x00, 0x00]);

    assert!(matches!(
        extractor.next(),
        Some(Err(ExtractError::InsufficientData))
    ));
    assert!(extractor.next().is_none());

    // The trailing zeros may still start a prefix.
    extractor.push_bytes(&[0x01, 0xB7]);
    extractor.finish();
    let unit = extractor.flatten().next();
    assert_eq!(
        unit,
        Some(Unit {
            start_code: SEQUENCE_END_CODE,
            data: Vec::new()
        })
    );
}
