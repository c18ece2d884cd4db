//! Growable buffer for outbound frames and encoded records.

use bytes::{Bytes, BytesMut};

use super::{EncodeError, padding_len};
use crate::{
    byte_order::{write_wire_f32, write_wire_i32, write_wire_u32},
    message::MessageKind,
};

const PADDING: [u8; 3] = [0; 3];

/// Append-only writer producing the layouts [`super::WireReader`] consumes.
///
/// # Examples
///
/// ```
/// use livelink::codec::WireWriter;
///
/// let mut writer = WireWriter::new();
/// writer.put_string("abcde").expect("short string");
/// // 4 length bytes, 5 string bytes, 3 padding bytes.
/// assert_eq!(writer.len(), 12);
/// ```
#[derive(Debug, Default)]
pub struct WireWriter {
    buf: BytesMut,
}

fn prefix(len: usize) -> Result<u32, EncodeError> {
    u32::try_from(len).map_err(|_| EncodeError::LengthTooLarge { len })
}

fn triple_count(field: &'static str, len: usize) -> Result<u32, EncodeError> {
    if len % 3 != 0 {
        return Err(EncodeError::Stride { field, len });
    }
    prefix(len / 3)
}

impl WireWriter {
    /// Create an empty writer.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Create an empty writer with room for `capacity` bytes.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    /// Bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize { self.buf.len() }

    /// Returns `true` if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.buf.is_empty() }

    /// View the bytes written so far.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] { &self.buf }

    /// Freeze the writer into an immutable frame.
    #[must_use]
    pub fn into_bytes(self) -> Bytes { self.buf.freeze() }

    /// Append an unsigned 32-bit integer.
    pub fn put_u32(&mut self, value: u32) { self.buf.extend_from_slice(&write_wire_u32(value)); }

    /// Append a signed 32-bit integer.
    pub fn put_i32(&mut self, value: i32) { self.buf.extend_from_slice(&write_wire_i32(value)); }

    /// Append an IEEE-754 32-bit float.
    pub fn put_f32(&mut self, value: f32) { self.buf.extend_from_slice(&write_wire_f32(value)); }

    /// Append a boolean as a 32-bit `0`/`1`.
    pub fn put_bool(&mut self, value: bool) { self.put_u32(u32::from(value)); }

    /// Append a message-kind tag.
    pub fn put_kind(&mut self, kind: MessageKind) { self.put_u32(kind.to_wire()); }

    /// Append `bytes` preceded by their `u32` length, without padding.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::LengthTooLarge`] if `bytes` exceeds `u32::MAX`.
    pub fn put_length_prefixed(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        self.put_u32(prefix(bytes.len())?);
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Append a `{u32 length}{UTF-8 bytes}{padding}` string field.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::LengthTooLarge`] if `value` exceeds `u32::MAX`
    /// bytes.
    pub fn put_string(&mut self, value: &str) -> Result<(), EncodeError> {
        self.put_length_prefixed(value.as_bytes())?;
        self.buf
            .extend_from_slice(&PADDING[..padding_len(value.len())]);
        Ok(())
    }

    /// Append `{u32 count}{values}` as unsigned integers.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::LengthTooLarge`] if the count overflows `u32`.
    pub fn put_u32_array(&mut self, values: &[u32]) -> Result<(), EncodeError> {
        self.put_u32(prefix(values.len())?);
        values.iter().for_each(|v| self.put_u32(*v));
        Ok(())
    }

    /// Append `{u32 count}{values}` as signed integers.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::LengthTooLarge`] if the count overflows `u32`.
    pub fn put_i32_array(&mut self, values: &[i32]) -> Result<(), EncodeError> {
        self.put_u32(prefix(values.len())?);
        values.iter().for_each(|v| self.put_i32(*v));
        Ok(())
    }

    /// Append `{u32 count}{values}` as floats.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::LengthTooLarge`] if the count overflows `u32`.
    pub fn put_f32_array(&mut self, values: &[f32]) -> Result<(), EncodeError> {
        self.put_u32(prefix(values.len())?);
        values.iter().for_each(|v| self.put_f32(*v));
        Ok(())
    }

    /// Append a flat triple array as `{u32 triple count}{values}`.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::Stride`] if `values` is not a whole number of
    /// triples.
    pub fn put_i32_triples(
        &mut self,
        field: &'static str,
        values: &[i32],
    ) -> Result<(), EncodeError> {
        self.put_u32(triple_count(field, values.len())?);
        values.iter().for_each(|v| self.put_i32(*v));
        Ok(())
    }

    /// Append a flat float triple array as `{u32 triple count}{values}`.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::Stride`] if `values` is not a whole number of
    /// triples.
    pub fn put_f32_triples(
        &mut self,
        field: &'static str,
        values: &[f32],
    ) -> Result<(), EncodeError> {
        self.put_u32(triple_count(field, values.len())?);
        values.iter().for_each(|v| self.put_f32(*v));
        Ok(())
    }
}
