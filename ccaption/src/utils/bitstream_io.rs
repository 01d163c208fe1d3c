//! Bit-level cursors over byte buffers.
//!
//! Big-endian readers and writers with an explicit bit position and length,
//! used by the syntax engines in [`crate::utils::syntax`].

use std::io;

use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter, UnsignedInteger};

#[derive(Debug)]
pub struct BitstreamIoReader<R: io::Read + io::Seek> {
    bs: BitReader<R, BigEndian>,
    len: u64,
}

pub type BsIoSliceReader<'a> = BitstreamIoReader<io::Cursor<&'a [u8]>>;

impl<R> BitstreamIoReader<R>
where
    R: io::Read + io::Seek,
{
    pub fn new(read: R, len_bytes: u64) -> Self {
        Self {
            bs: BitReader::new(read),
            len: len_bytes << 3,
        }
    }

    #[inline(always)]
    pub fn get(&mut self) -> io::Result<bool> {
        self.bs.read_bit()
    }

    #[inline(always)]
    pub fn get_n<I: UnsignedInteger>(&mut self, n: u32) -> io::Result<I> {
        match self.bs.read_unsigned_var(n) {
            Ok(val) => Ok(val),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "get_n({}): out of bounds bits at {}",
                        n,
                        self.bs.position_in_bits().unwrap_or(0)
                    ),
                ))
            }
            Err(e) => Err(e),
        }
    }

    #[inline(always)]
    pub fn available(&mut self) -> io::Result<u64> {
        self.bs
            .position_in_bits()
            .map(|pos| self.len.saturating_sub(pos))
    }

    #[inline(always)]
    pub fn skip_n(&mut self, n: u32) -> io::Result<()> {
        self.available().and_then(|avail| {
            if n as u64 > avail {
                Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "skip_n: out of bounds bits",
                ))
            } else {
                self.bs.skip(n)
            }
        })
    }

    #[inline(always)]
    pub fn position(&mut self) -> io::Result<u64> {
        self.bs.position_in_bits()
    }
}

impl<'a> BsIoSliceReader<'a> {
    pub fn from_slice(buf: &'a [u8]) -> Self {
        let len = buf.len() as u64;
        let read = io::Cursor::new(buf);

        Self::new(read, len)
    }
}

impl Default for BsIoSliceReader<'_> {
    fn default() -> Self {
        Self::from_slice(&[])
    }
}

/// Bit writer with a fixed capacity.
///
/// Every write is checked against the remaining capacity before any bit is
/// emitted, so a failed write never leaves a partial field behind.
pub struct BitstreamIoWriter<W: io::Write> {
    bs: BitWriter<W, BigEndian>,
    len: u64,
    written: u64,
}

pub type BsIoSliceWriter<'a> = BitstreamIoWriter<io::Cursor<&'a mut [u8]>>;

impl<W> BitstreamIoWriter<W>
where
    W: io::Write,
{
    pub fn new(write: W, len_bytes: u64) -> Self {
        Self {
            bs: BitWriter::new(write),
            len: len_bytes << 3,
            written: 0,
        }
    }

    #[inline(always)]
    pub fn put(&mut self, bit: bool) -> io::Result<()> {
        self.reserve(1)?;
        self.bs.write_bit(bit)?;
        self.written += 1;

        Ok(())
    }

    #[inline(always)]
    pub fn put_n<I: UnsignedInteger>(&mut self, n: u32, value: I) -> io::Result<()> {
        self.reserve(n)?;
        self.bs.write_unsigned_var(n, value)?;
        self.written += n as u64;

        Ok(())
    }

    #[inline(always)]
    pub fn available(&self) -> u64 {
        self.len - self.written
    }

    #[inline(always)]
    pub fn position(&self) -> u64 {
        self.written
    }

    #[inline(always)]
    pub fn byte_aligned(&self) -> bool {
        self.written & 7 == 0
    }

    fn reserve(&self, n: u32) -> io::Result<()> {
        if n as u64 > self.available() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!(
                    "put_n({}): out of space at {} of {} bits",
                    n, self.written, self.len
                ),
            ));
        }

        Ok(())
    }
}

impl<'a> BsIoSliceWriter<'a> {
    pub fn from_slice(buf: &'a mut [u8]) -> Self {
        let len = buf.len() as u64;
        let write = io::Cursor::new(buf);

        Self::new(write, len)
    }
}

#[test]
fn reader_bounds() -> anyhow::Result<()> {
    let mut reader = BsIoSliceReader::from_slice(&[0xA5, 0x0F]);

    assert_eq!(reader.get_n::<u8>(4)?, 0xA);
    assert!(!reader.get()?);
    assert_eq!(reader.available()?, 11);

    reader.skip_n(3)?;
    assert_eq!(reader.get_n::<u8>(8)?, 0x0F);

    let err = reader.get_n::<u8>(1).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    Ok(())
}

#[test]
fn writer_capacity() -> anyhow::Result<()> {
    let mut buf = [0u8; 2];
    let mut writer = BsIoSliceWriter::from_slice(&mut buf);

    writer.put_n(5, 0x1Fu8)?;
    writer.put(true)?;
    writer.put_n(2, 0u8)?;
    assert!(writer.byte_aligned());

    writer.put_n(4, 0x9u8)?;
    assert!(!writer.byte_aligned());

    let err = writer.put_n(8, 0u8).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::WriteZero);
    assert_eq!(writer.position(), 12);

    writer.put_n(4, 0x4u8)?;
    drop(writer);

    assert_eq!(buf, [0xFC, 0x94]);
    Ok(())
}
