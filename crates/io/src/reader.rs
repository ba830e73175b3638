//! A stateful cursor over a borrowed byte slice.
//!
//! `Reader` is the primitive every resource-type decoder is built on: it
//! never silently truncates a read, it never panics on an out-of-range
//! access, and it supports peeking, seeking, and Pascal/C string reads on
//! top of the endian-aware number parsers in [`crate::endianness`].

use nom::number::complete::{be_u16, be_u32, be_u64, be_u8, le_u16, le_u32, le_u64, le_u8};

use crate::Input;

/// The error raised by every [`Reader`] operation that would read or seek
/// past the end of the backing slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfRange {
    /// Offset at which the out-of-range access was attempted.
    pub offset: usize,
    /// Number of bytes that would have been required.
    pub needed: usize,
    /// Total length of the backing slice.
    pub len: usize,
}

impl std::fmt::Display for OutOfRange {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "out of range: tried to read {} byte(s) at offset {} of a {}-byte buffer",
            self.needed, self.offset, self.len
        )
    }
}

impl std::error::Error for OutOfRange {}

/// Result type returned by every [`Reader`] operation.
pub type ReadResult<T> = std::result::Result<T, OutOfRange>;

/// A cursor over a borrowed byte slice, with explicit endianness chosen
/// per-call rather than per-`Reader`, since a single resource (e.g. a `snd `
/// resource whose command stream is big-endian but whose embedded SH-4
/// assembler fixture is little-endian) can mix byte orders.
#[derive(Debug, Clone, Copy)]
pub struct Reader<'a> {
    buffer: Input<'a>,
    cursor: usize,
}

macro_rules! accessor {
    ($peek_name:ident, $get_name:ident, $get_at_name:ident, $ty:ty, $be:expr, $le:expr) => {
        #[doc = concat!("Peek a big-endian `", stringify!($ty), "` without advancing the cursor.")]
        pub fn $peek_name(&self) -> ReadResult<$ty> {
            self.peek_with(be_parser_adapter!($ty, $be))
        }

        #[doc = concat!("Read a big-endian `", stringify!($ty), "` and advance the cursor.")]
        pub fn $get_name(&mut self) -> ReadResult<$ty> {
            self.get_with(be_parser_adapter!($ty, $be))
        }

        #[doc = concat!("Read a big-endian `", stringify!($ty), "` at `offset` without advancing the cursor.")]
        pub fn $get_at_name(&self, offset: usize) -> ReadResult<$ty> {
            self.get_at_with(offset, be_parser_adapter!($ty, $be))
        }
    };
}

macro_rules! be_parser_adapter {
    ($ty:ty, $parser:expr) => {
        |input: Input<'_>| -> nom::IResult<Input<'_>, $ty, ()> { $parser(input) }
    };
}

impl<'a> Reader<'a> {
    /// Wrap `buffer` in a fresh cursor positioned at offset 0.
    pub fn new(buffer: Input<'a>) -> Self {
        Self { buffer, cursor: 0 }
    }

    /// Current cursor offset.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Total length of the backing slice.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the cursor has exhausted the backing slice.
    pub fn is_empty(&self) -> bool {
        self.cursor >= self.buffer.len()
    }

    /// Move the cursor to an absolute offset. Fails if `offset > len()`.
    pub fn go_to(&mut self, offset: usize) -> ReadResult<()> {
        if offset > self.buffer.len() {
            return Err(OutOfRange { offset, needed: 0, len: self.buffer.len() });
        }

        self.cursor = offset;

        Ok(())
    }

    /// All bytes from the cursor to the end of the buffer.
    pub fn remaining(&self) -> Input<'a> {
        &self.buffer[self.cursor.min(self.buffer.len())..]
    }

    /// A borrowed sub-slice `[start, start + len)`, independent of the cursor.
    pub fn subrange(&self, start: usize, len: usize) -> ReadResult<Input<'a>> {
        let end = start.checked_add(len).ok_or(OutOfRange { offset: start, needed: len, len: self.buffer.len() })?;

        if end > self.buffer.len() {
            return Err(OutOfRange { offset: start, needed: len, len: self.buffer.len() });
        }

        Ok(&self.buffer[start..end])
    }

    fn peek_with<T>(&self, parser: impl Fn(Input<'a>) -> nom::IResult<Input<'a>, T, ()>) -> ReadResult<T> {
        self.get_at_with(self.cursor, parser)
    }

    fn get_at_with<T>(
        &self,
        offset: usize,
        parser: impl Fn(Input<'a>) -> nom::IResult<Input<'a>, T, ()>,
    ) -> ReadResult<T> {
        if offset > self.buffer.len() {
            return Err(OutOfRange { offset, needed: 0, len: self.buffer.len() });
        }

        parser(&self.buffer[offset..])
            .map(|(_, value)| value)
            .map_err(|_| OutOfRange { offset, needed: 0, len: self.buffer.len() })
    }

    fn get_with<T>(&mut self, parser: impl Fn(Input<'a>) -> nom::IResult<Input<'a>, T, ()>) -> ReadResult<T> {
        let start = self.cursor;

        if start > self.buffer.len() {
            return Err(OutOfRange { offset: start, needed: 0, len: self.buffer.len() });
        }

        let (rest, value) = parser(&self.buffer[start..])
            .map_err(|_| OutOfRange { offset: start, needed: 0, len: self.buffer.len() })?;

        self.cursor = self.buffer.len() - rest.len();

        Ok(value)
    }

    accessor!(peek_u8, get_u8, get_at_u8, u8, be_u8, le_u8);
    accessor!(peek_u16be, get_u16be, get_at_u16be, u16, be_u16, le_u16);
    accessor!(peek_u32be, get_u32be, get_at_u32be, u32, be_u32, le_u32);
    accessor!(peek_u64be, get_u64be, get_at_u64be, u64, be_u64, le_u64);

    /// Peek a little-endian `u16` without advancing the cursor.
    pub fn peek_u16le(&self) -> ReadResult<u16> {
        self.peek_with(be_parser_adapter!(u16, le_u16))
    }

    /// Read a little-endian `u16` and advance the cursor.
    pub fn get_u16le(&mut self) -> ReadResult<u16> {
        self.get_with(be_parser_adapter!(u16, le_u16))
    }

    /// Read a little-endian `u32` and advance the cursor.
    pub fn get_u32le(&mut self) -> ReadResult<u32> {
        self.get_with(be_parser_adapter!(u32, le_u32))
    }

    /// Read a signed big-endian `i16` and advance the cursor.
    pub fn get_i16be(&mut self) -> ReadResult<i16> {
        Ok(self.get_u16be()? as i16)
    }

    /// Read a signed big-endian `i32` and advance the cursor.
    pub fn get_i32be(&mut self) -> ReadResult<i32> {
        Ok(self.get_u32be()? as i32)
    }

    /// Read `n` raw bytes and advance the cursor.
    pub fn get_bytes(&mut self, n: usize) -> ReadResult<Input<'a>> {
        let start = self.cursor;
        let end = start.checked_add(n).ok_or(OutOfRange { offset: start, needed: n, len: self.buffer.len() })?;

        if end > self.buffer.len() {
            return Err(OutOfRange { offset: start, needed: n, len: self.buffer.len() });
        }

        self.cursor = end;

        Ok(&self.buffer[start..end])
    }

    /// Read a length-prefixed Pascal string (a single length byte followed
    /// by that many bytes of raw, still Mac-Roman-encoded, text).
    pub fn get_pascal_string(&mut self) -> ReadResult<Input<'a>> {
        let len = self.get_u8()? as usize;

        self.get_bytes(len)
    }

    /// Read a NUL-terminated C string, consuming the terminator.
    pub fn get_c_string(&mut self) -> ReadResult<Input<'a>> {
        let start = self.cursor;
        let remaining = self.remaining();

        match remaining.iter().position(|&byte| byte == 0) {
            Some(nul_index) => {
                self.cursor = start + nul_index + 1;

                Ok(&remaining[..nul_index])
            }
            None => Err(OutOfRange { offset: start, needed: 1, len: self.buffer.len() }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_and_peek() {
        let mut reader = Reader::new(&[0x00, 0x01, 0x02, 0x03]);

        assert_eq!(reader.peek_u16be(), Ok(0x0001));
        assert_eq!(reader.get_u16be(), Ok(0x0001));
        assert_eq!(reader.position(), 2);
        assert_eq!(reader.get_u16be(), Ok(0x0203));
        assert!(reader.get_u8().is_err());
    }

    #[test]
    fn test_get_at_does_not_advance() {
        let mut reader = Reader::new(&[0xAA, 0xBB, 0xCC, 0xDD]);

        assert_eq!(reader.get_at_u16be(2), Ok(0xCCDD));
        assert_eq!(reader.position(), 0);
        assert_eq!(reader.get_u16be(), Ok(0xAABB));
    }

    #[test]
    fn test_pascal_string() {
        let mut reader = Reader::new(&[3, b'a', b'b', b'c', 0xFF]);

        assert_eq!(reader.get_pascal_string(), Ok(&b"abc"[..]));
        assert_eq!(reader.get_u8(), Ok(0xFF));
    }

    #[test]
    fn test_c_string() {
        let mut reader = Reader::new(b"hello\0world");

        assert_eq!(reader.get_c_string(), Ok(&b"hello"[..]));
        assert_eq!(reader.remaining(), b"world");
    }

    #[test]
    fn test_subrange_and_go_to() {
        let reader = Reader::new(&[0, 1, 2, 3, 4]);

        assert_eq!(reader.subrange(1, 3), Ok(&[1, 2, 3][..]));
        assert!(reader.subrange(3, 10).is_err());

        let mut reader = Reader::new(&[0, 1, 2, 3, 4]);

        reader.go_to(3).unwrap();
        assert_eq!(reader.get_u8(), Ok(3));
    }
}
