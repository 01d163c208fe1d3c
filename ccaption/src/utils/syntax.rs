//! Dual-direction syntax engine.
//!
//! A record describes its bit layout once in [`Syntax::syntax`] using the
//! primitives of [`SyntaxCursor`]. Running the description against a
//! [`BitstreamIoReader`] fills the record from the bitstream, running it
//! against a [`BitstreamIoWriter`] serialises the record.

use std::io;

use anyhow::{Result, anyhow, bail};
use log::trace;

use crate::utils::bitstream_io::{BitstreamIoReader, BitstreamIoWriter};
use crate::utils::errors::SyntaxError;

/// Largest value representable in `width` bits.
#[inline(always)]
pub const fn max_uint_bits(width: u32) -> u32 {
    if width >= 32 {
        u32::MAX
    } else {
        (1 << width) - 1
    }
}

/// Field-level primitives bound to one direction of serialisation.
pub trait SyntaxCursor {
    /// True for the read engine. Records use it to rebuild tagged unions
    /// from a freshly read tag.
    const READING: bool;

    /// Unsigned field of `width` bits, range-checked to `[0, 2^width - 1]`.
    fn ui<T>(&mut self, width: u32, name: &'static str, value: &mut T) -> Result<()>
    where
        T: Copy + Into<u32> + TryFrom<u32>;

    /// Single bit field.
    fn flag(&mut self, name: &'static str, value: &mut bool) -> Result<()>;

    /// Field that must hold `expected`. Read values are discarded.
    fn fixed(&mut self, width: u32, name: &'static str, expected: u32) -> Result<()>;
}

/// A record with a bit layout.
pub trait Syntax {
    fn syntax<C: SyntaxCursor>(&mut self, rw: &mut C) -> Result<()>;
}

fn check_range(name: &'static str, width: u32, value: u32) -> Result<()> {
    let max = max_uint_bits(width);
    if value > max {
        bail!(SyntaxError::OutOfRange {
            name,
            value: value as u64,
            min: 0,
            max: max as u64,
        });
    }

    Ok(())
}

impl<R> SyntaxCursor for BitstreamIoReader<R>
where
    R: io::Read + io::Seek,
{
    const READING: bool = true;

    fn ui<T>(&mut self, width: u32, name: &'static str, value: &mut T) -> Result<()>
    where
        T: Copy + Into<u32> + TryFrom<u32>,
    {
        let read: u32 = self.get_n(width)?;
        check_range(name, width, read)?;

        *value = T::try_from(read).map_err(|_| {
            anyhow!(SyntaxError::OutOfRange {
                name,
                value: read as u64,
                min: 0,
                max: max_uint_bits(width) as u64,
            })
        })?;

        trace!("{name:<32} = {read}");
        Ok(())
    }

    fn flag(&mut self, name: &'static str, value: &mut bool) -> Result<()> {
        *value = self.get()?;

        trace!("{name:<32} = {}", *value as u8);
        Ok(())
    }

    fn fixed(&mut self, width: u32, name: &'static str, expected: u32) -> Result<()> {
        let actual: u32 = self.get_n(width)?;
        if actual != expected {
            bail!(SyntaxError::FixedMismatch {
                name,
                actual,
                expected,
            });
        }

        trace!("{name:<32} = {actual}");
        Ok(())
    }
}

impl<W> BitstreamIoWriter<W>
where
    W: io::Write,
{
    fn put_field(&mut self, width: u32, name: &'static str, value: u32) -> Result<()> {
        let available = self.available();

        self.put_n(width, value).map_err(|e| {
            if e.kind() == io::ErrorKind::WriteZero {
                anyhow!(SyntaxError::OutOfSpace {
                    name,
                    width,
                    available,
                })
            } else {
                e.into()
            }
        })
    }
}

impl<W> SyntaxCursor for BitstreamIoWriter<W>
where
    W: io::Write,
{
    const READING: bool = false;

    fn ui<T>(&mut self, width: u32, name: &'static str, value: &mut T) -> Result<()>
    where
        T: Copy + Into<u32> + TryFrom<u32>,
    {
        let value: u32 = (*value).into();
        check_range(name, width, value)?;
        self.put_field(width, name, value)?;

        trace!("{name:<32} = {value}");
        Ok(())
    }

    fn flag(&mut self, name: &'static str, value: &mut bool) -> Result<()> {
        self.put_field(1, name, *value as u32)?;

        trace!("{name:<32} = {}", *value as u8);
        Ok(())
    }

    fn fixed(&mut self, width: u32, name: &'static str, expected: u32) -> Result<()> {
        check_range(name, width, expected)?;
        self.put_field(width, name, expected)?;

        trace!("{name:<32} = {expected}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::bitstream_io::{BsIoSliceReader, BsIoSliceWriter};

    #[derive(Debug, Default, PartialEq)]
    struct Nibbles {
        high: u8,
        low: u8,
    }

    impl Syntax for Nibbles {
        fn syntax<C: SyntaxCursor>(&mut self, rw: &mut C) -> Result<()> {
            rw.fixed(3, "marker", 0b101)?;
            rw.ui(5, "high", &mut self.high)?;
            rw.ui(8, "low", &mut self.low)?;
            Ok(())
        }
    }

    #[test]
    fn same_layout_both_directions() -> Result<()> {
        let mut buf = [0u8; 2];
        let mut writer = BsIoSliceWriter::from_slice(&mut buf);
        Nibbles { high: 0x11, low: 0x42 }.syntax(&mut writer)?;
        assert!(writer.byte_aligned());
        drop(writer);
        assert_eq!(buf, [0xB1, 0x42]);

        let mut read = Nibbles::default();
        read.syntax(&mut BsIoSliceReader::from_slice(&buf))?;
        assert_eq!(read, Nibbles { high: 0x11, low: 0x42 });
        Ok(())
    }

    #[test]
    fn fixed_mismatch_is_rejected() {
        let mut read = Nibbles::default();
        let err = read
            .syntax(&mut BsIoSliceReader::from_slice(&[0x31, 0x42]))
            .unwrap_err();

        assert_eq!(
            err.downcast_ref::<SyntaxError>(),
            Some(&SyntaxError::FixedMismatch {
                name: "marker",
                actual: 0b001,
                expected: 0b101,
            })
        );
    }

    #[test]
    fn out_of_range_write_is_rejected() {
        let mut buf = [0u8; 2];
        let mut writer = BsIoSliceWriter::from_slice(&mut buf);
        let err = Nibbles { high: 0x20, low: 0 }
            .syntax(&mut writer)
            .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<SyntaxError>(),
            Some(SyntaxError::OutOfRange { name: "high", value: 0x20, .. })
        ));
    }

    #[test]
    fn out_of_space() {
        let mut buf = [0u8; 1];
        let mut writer = BsIoSliceWriter::from_slice(&mut buf);
        let err = Nibbles { high: 1, low: 2 }.syntax(&mut writer).unwrap_err();

        assert_eq!(
            err.downcast_ref::<SyntaxError>(),
            Some(&SyntaxError::OutOfSpace {
                name: "low",
                width: 8,
                available: 0,
            })
        );
    }
}
