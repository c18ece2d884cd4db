//! Bounds-checked cursor over an inbound frame.

use super::{DecodeError, padding_len};
use crate::{
    byte_order::{read_wire_f32, read_wire_i32, read_wire_u32},
    message::MessageKind,
};

/// Size in bytes of every scalar on the wire.
pub const SCALAR_SIZE: usize = 4;

/// Cursor over a borrowed byte buffer.
///
/// Every read checks the remaining length first; a read that would run past
/// the end of the buffer fails with [`DecodeError::Truncated`] instead of
/// touching memory outside the frame.
///
/// # Examples
///
/// ```
/// use livelink::codec::WireReader;
///
/// let mut reader = WireReader::new(&[7, 0, 0, 0, 0xff, 0xff, 0xff, 0xff]);
/// assert_eq!(reader.read_u32(), Ok(7));
/// assert_eq!(reader.read_i32(), Ok(-1));
/// assert_eq!(reader.offset(), 8);
/// assert!(reader.read_u32().is_err());
/// ```
#[derive(Clone, Debug)]
pub struct WireReader<'a> {
    buf: &'a [u8],
    offset: usize,
}

impl<'a> WireReader<'a> {
    /// Create a reader positioned at the start of `buf`.
    #[must_use]
    pub const fn new(buf: &'a [u8]) -> Self { Self { buf, offset: 0 } }

    /// Create a reader positioned at `offset`.
    #[must_use]
    pub const fn at(buf: &'a [u8], offset: usize) -> Self { Self { buf, offset } }

    /// Current cursor position.
    #[must_use]
    pub const fn offset(&self) -> usize { self.offset }

    /// Bytes left after the cursor.
    #[must_use]
    pub const fn remaining(&self) -> usize { self.buf.len().saturating_sub(self.offset) }

    /// Returns `true` once every byte has been consumed.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool { self.remaining() == 0 }

    /// Consume exactly `len` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] if fewer than `len` bytes remain.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let available = self.remaining();
        if len > available {
            return Err(DecodeError::Truncated {
                offset: self.offset,
                needed: len,
                available,
            });
        }
        let start = self.offset;
        self.offset += len;
        Ok(&self.buf[start..self.offset])
    }

    /// Split off the next `len` bytes as an independent reader.
    ///
    /// Used for length-prefixed nested items so that a malformed item cannot
    /// read into its neighbour.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] if fewer than `len` bytes remain.
    pub fn sub_reader(&mut self, len: usize) -> Result<WireReader<'a>, DecodeError> {
        self.take(len).map(WireReader::new)
    }

    fn take_scalar(&mut self) -> Result<[u8; SCALAR_SIZE], DecodeError> {
        let bytes = self.take(SCALAR_SIZE)?;
        let mut out = [0u8; SCALAR_SIZE];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Read an unsigned 32-bit integer.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] on short input.
    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        self.take_scalar().map(read_wire_u32)
    }

    /// Read a signed 32-bit integer.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] on short input.
    pub fn read_i32(&mut self) -> Result<i32, DecodeError> {
        self.take_scalar().map(read_wire_i32)
    }

    /// Read an IEEE-754 32-bit float.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] on short input.
    pub fn read_f32(&mut self) -> Result<f32, DecodeError> {
        self.take_scalar().map(read_wire_f32)
    }

    /// Read a 32-bit boolean (`0` is false, anything else true).
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] on short input.
    pub fn read_bool(&mut self) -> Result<bool, DecodeError> { Ok(self.read_u32()? != 0) }

    /// Read a message-kind tag. Unknown tags decode to
    /// [`MessageKind::Unrecognized`].
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] if the tag itself is incomplete.
    pub fn read_kind(&mut self) -> Result<MessageKind, DecodeError> {
        self.read_u32().map(MessageKind::from_wire)
    }

    fn read_len(&mut self) -> Result<(usize, u32), DecodeError> {
        let offset = self.offset;
        let raw = self.read_u32()?;
        let len = usize::try_from(raw).map_err(|_| DecodeError::LengthOverflow { offset, count: raw })?;
        Ok((len, raw))
    }

    fn read_string_bytes(&mut self) -> Result<(String, usize), DecodeError> {
        let (len, _) = self.read_len()?;
        let start = self.offset;
        let bytes = self.take(len)?;
        let value = std::str::from_utf8(bytes)
            .map_err(|_| DecodeError::InvalidUtf8 { offset: start })?
            .to_owned();
        Ok((value, len))
    }

    /// Read a `{u32 length}{UTF-8 bytes}{padding}` string field.
    ///
    /// The padding brings the string length, not the cursor, up to a
    /// multiple of four.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] if the bytes or padding are
    /// missing, or [`DecodeError::InvalidUtf8`].
    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        let (value, len) = self.read_string_bytes()?;
        self.take(padding_len(len))?;
        Ok(value)
    }

    /// Read a string field that ends the frame, tolerating absent padding.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] if the string bytes are missing,
    /// or [`DecodeError::InvalidUtf8`].
    pub fn read_trailing_string(&mut self) -> Result<String, DecodeError> {
        let (value, len) = self.read_string_bytes()?;
        let pad = padding_len(len).min(self.remaining());
        self.take(pad)?;
        Ok(value)
    }

    fn read_elements<T>(
        &mut self,
        stride: usize,
        convert: fn([u8; SCALAR_SIZE]) -> T,
    ) -> Result<Vec<T>, DecodeError> {
        let offset = self.offset;
        let (count, raw) = self.read_len()?;
        let byte_len = count
            .checked_mul(stride)
            .and_then(|elements| elements.checked_mul(SCALAR_SIZE))
            .ok_or(DecodeError::LengthOverflow { offset, count: raw })?;
        let bytes = self.take(byte_len)?;
        Ok(bytes
            .chunks_exact(SCALAR_SIZE)
            .map(|chunk| {
                let mut word = [0u8; SCALAR_SIZE];
                word.copy_from_slice(chunk);
                convert(word)
            })
            .collect())
    }

    /// Read `{u32 count}{count * 4 bytes}` as signed integers.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] if the declared count overruns the
    /// buffer.
    pub fn read_i32_array(&mut self) -> Result<Vec<i32>, DecodeError> {
        self.read_elements(1, read_wire_i32)
    }

    /// Read `{u32 count}{count * 4 bytes}` as unsigned integers.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] if the declared count overruns the
    /// buffer.
    pub fn read_u32_array(&mut self) -> Result<Vec<u32>, DecodeError> {
        self.read_elements(1, read_wire_u32)
    }

    /// Read `{u32 count}{count * 4 bytes}` as floats.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] if the declared count overruns the
    /// buffer.
    pub fn read_f32_array(&mut self) -> Result<Vec<f32>, DecodeError> {
        self.read_elements(1, read_wire_f32)
    }

    /// Read `{u32 count}{count * 12 bytes}` as a flat list of `count * 3`
    /// signed integers.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] if the declared count overruns the
    /// buffer.
    pub fn read_i32_triples(&mut self) -> Result<Vec<i32>, DecodeError> {
        self.read_elements(3, read_wire_i32)
    }

    /// Read `{u32 count}{count * 12 bytes}` as a flat list of `count * 3`
    /// floats.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Truncated`] if the declared count overruns the
    /// buffer.
    pub fn read_f32_triples(&mut self) -> Result<Vec<f32>, DecodeError> {
        self.read_elements(3, read_wire_f32)
    }
}
