//! Bounded cursor over the bytes of a single record
//!
//! Every decoder in this workspace reads through a [`RecordView`]. A view never reads outside the
//! slice it was created from, so a truncated or malformed record fails with
//! [`Error::UnexpectedEndOfData`] instead of bleeding into its neighbours.

use std::io::{self, Read, Seek, SeekFrom};

use binrw::{BinRead, Endian};
use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};

/// Random access little endian reader over a borrowed byte range
///
/// ```
/// use df_bsa::RecordView;
///
/// let data = [0x01, 0x02, b'A', b'B', 0x00, 0x00];
/// let mut view = RecordView::new(&data);
///
/// assert_eq!(view.read_u16().unwrap(), 0x0201);
/// assert_eq!(view.read_fixed_string(4).unwrap(), "AB");
/// assert!(view.is_empty());
/// assert!(view.read_u8().is_err());
/// ```
#[derive(Debug, Clone)]
pub struct RecordView<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> RecordView<'a> {
    /// Create a view over the whole slice, positioned at its start
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Current cursor position
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Total length of the view
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Bytes left between the cursor and the end of the view
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Whether the cursor reached the end of the view
    pub const fn is_empty(&self) -> bool {
        self.position >= self.data.len()
    }

    /// The full underlying slice
    pub const fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Move the cursor to an absolute position, which may equal the view length
    pub fn seek(&mut self, position: usize) -> Result<()> {
        if position > self.data.len() {
            return Err(Error::UnexpectedEndOfData {
                position,
                needed: 0,
                available: 0,
            });
        }
        self.position = position;
        Ok(())
    }

    /// Advance the cursor without reading
    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.take(count).map(|_| ())
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        let bytes = self.peek_bytes(count)?;
        self.position += count;
        Ok(bytes)
    }

    /// Bytes at the cursor without advancing
    pub fn peek_bytes(&self, count: usize) -> Result<&'a [u8]> {
        if self.remaining() < count {
            return Err(Error::UnexpectedEndOfData {
                position: self.position,
                needed: count,
                available: self.remaining(),
            });
        }
        Ok(&self.data[self.position..self.position + count])
    }

    /// Read a run of raw bytes
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        self.take(count)
    }

    /// Read a fixed size byte array
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.take(N)?);
        Ok(array)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.take(1).map(|b| b[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        self.read_u8().map(|b| b as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        self.take(2).map(LittleEndian::read_u16)
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        self.take(2).map(LittleEndian::read_i16)
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        self.take(4).map(LittleEndian::read_u32)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.take(4).map(LittleEndian::read_i32)
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        self.take(8).map(LittleEndian::read_u64)
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        self.take(8).map(LittleEndian::read_i64)
    }

    /// Read a fixed width character field.
    ///
    /// Always consumes `width` bytes; the value ends at the first null.
    pub fn read_fixed_string(&mut self, width: usize) -> Result<String> {
        self.take(width).map(latin1)
    }

    /// Read a null terminated string of at most `max_len` bytes.
    ///
    /// Consumes the terminator when one is found inside the field.
    pub fn read_cstring(&mut self, max_len: usize) -> Result<String> {
        let window = self.remaining().min(max_len);
        let available = &self.data[self.position..self.position + window];

        match available.iter().position(|&b| b == 0) {
            Some(end) => {
                let value = latin1(&available[..end]);
                self.position += end + 1;
                Ok(value)
            }
            None if window == max_len => {
                self.position += window;
                Ok(latin1(available))
            }
            None => Err(Error::UnexpectedEndOfData {
                position: self.position,
                needed: max_len,
                available: window,
            }),
        }
    }

    /// A new view over `len` bytes starting at `offset` within this view
    pub fn sub_view(&self, offset: usize, len: usize) -> Result<RecordView<'a>> {
        let end = offset.checked_add(len).filter(|&end| end <= self.data.len());
        match end {
            Some(end) => Ok(RecordView::new(&self.data[offset..end])),
            None => Err(Error::UnexpectedEndOfData {
                position: offset,
                needed: len,
                available: self.data.len().saturating_sub(offset),
            }),
        }
    }

    /// Read a little endian binrw structure at the cursor.
    ///
    /// On failure the cursor is left where it was.
    pub fn read_binrw<T>(&mut self) -> Result<T>
    where
        T: for<'b> BinRead<Args<'b> = ()>,
    {
        let start = self.position;
        match T::read_options(self, Endian::Little, ()) {
            Ok(value) => Ok(value),
            Err(e) => {
                self.position = start;
                if e.is_eof() {
                    return Err(Error::UnexpectedEndOfData {
                        position: start,
                        needed: std::mem::size_of::<T>(),
                        available: self.remaining(),
                    });
                }
                Err(e.into())
            }
        }
    }
}

fn latin1(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take_while(|&&b| b != 0)
        .map(|&b| b as char)
        .collect()
}

impl Read for RecordView<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let count = buf.len().min(self.remaining());
        buf[..count].copy_from_slice(&self.data[self.position..self.position + count]);
        self.position += count;
        Ok(count)
    }
}

impl Seek for RecordView<'_> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(p) => Some(p as i64),
            SeekFrom::End(p) => (self.data.len() as i64).checked_add(p),
            SeekFrom::Current(p) => (self.position as i64).checked_add(p),
        };

        match target {
            Some(t) if t > self.data.len() as i64 => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("seek to {t} past the end of a {} byte record", self.data.len()),
            )),
            Some(t) if t >= 0 => {
                self.position = t as usize;
                Ok(t as u64)
            }
            _ => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "invalid seek to a negative or overflowing position",
            )),
        }
    }
}

#[cfg(test)]
mod test {
    use std::io::{self, Read, Seek, SeekFrom};

    use binrw::BinRead;
    use pretty_assertions::assert_eq;

    use crate::error::{Error, Result};
    use crate::view::RecordView;

    #[derive(BinRead, Debug, PartialEq)]
    struct Pair {
        a: u16,
        b: i32,
    }

    #[test]
    fn read_integers() -> Result<()> {
        #[rustfmt::skip]
        let data = [
            0xFF,
            0xFE, 0xFF,
            0x34, 0x12,
            0x78, 0x56, 0x34, 0x12,
            0xFF, 0xFF, 0xFF, 0xFF,
            0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ];
        let mut view = RecordView::new(&data);

        assert_eq!(view.read_i8()?, -1);
        assert_eq!(view.read_i16()?, -2);
        assert_eq!(view.read_u16()?, 0x1234);
        assert_eq!(view.read_u32()?, 0x12345678);
        assert_eq!(view.read_i32()?, -1);
        assert_eq!(view.read_u64()?, 1);
        assert!(view.is_empty());

        Ok(())
    }

    #[test]
    fn read_past_end_does_not_move_cursor() {
        let data = [0x01, 0x02, 0x03];
        let mut view = RecordView::new(&data);

        view.read_u8().unwrap();
        let result = view.read_u32();

        assert!(matches!(
            result,
            Err(Error::UnexpectedEndOfData {
                position: 1,
                needed: 4,
                available: 2
            })
        ));
        assert_eq!(view.position(), 1);
        assert_eq!(view.read_u16().unwrap(), 0x0302);
    }

    #[test]
    fn fixed_strings_consume_full_width() -> Result<()> {
        let data = *b"ABC\0GARBAGE\0Z";
        let mut view = RecordView::new(&data);

        assert_eq!(view.read_fixed_string(12)?, "ABC");
        assert_eq!(view.position(), 12);
        assert_eq!(view.read_fixed_string(1)?, "Z");

        Ok(())
    }

    #[test]
    fn cstrings_stop_at_terminator_or_limit() -> Result<()> {
        let data = *b"HI\0WORLDWIDE";
        let mut view = RecordView::new(&data);

        assert_eq!(view.read_cstring(8)?, "HI");
        assert_eq!(view.position(), 3);
        assert_eq!(view.read_cstring(5)?, "WORLD");
        assert_eq!(view.position(), 8);
        assert!(view.read_cstring(8).unwrap_err().is_end_of_data());

        Ok(())
    }

    #[test]
    fn io_seek_stays_inside_the_record() {
        let data = [1, 2, 3];
        let mut view = RecordView::new(&data);

        let err = Seek::seek(&mut view, SeekFrom::Start(10)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        assert_eq!(view.position(), 0);

        assert_eq!(Seek::seek(&mut view, SeekFrom::End(0)).unwrap(), 3);
        assert_eq!(view.read(&mut [0; 4]).unwrap(), 0);
        assert!(view.peek_bytes(0).unwrap().is_empty());
        assert!(Seek::seek(&mut view, SeekFrom::Current(1)).is_err());
    }

    #[test]
    fn seek_and_sub_view() -> Result<()> {
        let data = [0u8, 1, 2, 3, 4, 5, 6, 7];
        let mut view = RecordView::new(&data);

        view.seek(6)?;
        assert_eq!(view.read_u8()?, 6);
        view.seek(8)?;
        assert!(view.is_empty());
        assert!(view.seek(9).is_err());

        let mut inner = view.sub_view(2, 3)?;
        assert_eq!(inner.read_bytes(3)?, &[2, 3, 4]);
        assert!(inner.read_u8().is_err());
        assert!(view.sub_view(6, 3).is_err());

        Ok(())
    }

    #[test]
    fn read_binrw_structures() -> Result<()> {
        let data = [0x01, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0x02];
        let mut view = RecordView::new(&data);

        assert_eq!(view.read_binrw::<Pair>()?, Pair { a: 1, b: -1 });
        assert_eq!(view.position(), 6);

        let result = view.read_binrw::<Pair>();
        assert!(result.unwrap_err().is_end_of_data());
        assert_eq!(view.position(), 6);

        Ok(())
    }

    #[test]
    fn strings_keep_high_bytes() -> Result<()> {
        let data = [b'C', 0xE9, 0x00];
        let mut view = RecordView::new(&data);

        assert_eq!(view.read_fixed_string(3)?, "C\u{e9}");

        Ok(())
    }
}
