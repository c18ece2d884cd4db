//! Wire codec for the live-link protocol.
//!
//! All functions here are pure: they translate between byte buffers and typed
//! values without touching connection state. Multi-byte scalars are
//! little-endian. Strings are `{u32 length}{UTF-8 bytes}` followed by
//! `(4 - length % 4) % 4` zero bytes; the padding depends only on the string
//! length, never on the offset at which the field starts.
//!
//! # Error Handling
//!
//! Decoding never reads past the end of the buffer. A declared length that
//! would overrun it yields [`DecodeError::Truncated`]; see the [`error`]
//! module for the full taxonomy.
//!
//! The free `decode_*` functions take a buffer and a cursor offset and return
//! the decoded value with the advanced offset. [`WireReader`] offers the same
//! operations as methods on a cursor.

use bytes::BytesMut;

use crate::message::MessageKind;

pub mod error;
pub mod inbound;
pub mod object;
mod reader;
pub mod refacet;
pub mod transaction;
mod writer;

pub use error::{DecodeError, EncodeError};
pub use inbound::{InboundMessage, ReplyHeader, STATUS_OK, decode_frame, encode_frame};
pub use object::{
    DIGIT_PREFIX,
    MeshGeometry,
    NameOptions,
    ObjectFlags,
    SceneObject,
    decode_object_list,
    decode_scene_object,
    display_name,
    encode_object_list,
    encode_scene_object,
    sanitize_identifier,
};
pub use reader::{SCALAR_SIZE, WireReader};
pub use refacet::{RefacetBatch, RefacetItem, decode_refacet_batch, encode_refacet_batch};
pub use transaction::{Transaction, decode_transaction, encode_transaction};
pub use writer::WireWriter;

/// Number of zero bytes following a string of `len` bytes.
///
/// # Examples
///
/// ```
/// use livelink::codec::padding_len;
///
/// assert_eq!(padding_len(0), 0);
/// assert_eq!(padding_len(5), 3);
/// assert_eq!(padding_len(8), 0);
/// ```
#[must_use]
pub const fn padding_len(len: usize) -> usize { (4 - len % 4) % 4 }

/// Decode the leading message-kind tag at `offset`.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] if fewer than four bytes remain.
pub fn decode_message_kind(buf: &[u8], offset: usize) -> Result<(MessageKind, usize), DecodeError> {
    let mut reader = WireReader::at(buf, offset);
    let kind = reader.read_kind()?;
    Ok((kind, reader.offset()))
}

/// Decode a padded string field at `offset`.
///
/// # Errors
///
/// Returns [`DecodeError`] if the field is truncated or not UTF-8.
///
/// # Examples
///
/// ```
/// use livelink::codec::decode_string_field;
///
/// let buf = [3, 0, 0, 0, b'a', b'b', b'c', 0];
/// assert_eq!(decode_string_field(&buf, 0), Ok(("abc".to_owned(), 8)));
/// ```
pub fn decode_string_field(buf: &[u8], offset: usize) -> Result<(String, usize), DecodeError> {
    let mut reader = WireReader::at(buf, offset);
    let value = reader.read_string()?;
    Ok((value, reader.offset()))
}

/// Decode `{u32 count}{count * 4 bytes}` as signed integers at `offset`.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] if the declared count overruns `buf`.
pub fn decode_int32_array(buf: &[u8], offset: usize) -> Result<(Vec<i32>, usize), DecodeError> {
    let mut reader = WireReader::at(buf, offset);
    let values = reader.read_i32_array()?;
    Ok((values, reader.offset()))
}

/// Decode `{u32 count}{count * 4 bytes}` as floats at `offset`.
///
/// # Errors
///
/// Returns [`DecodeError::Truncated`] if the declared count overruns `buf`.
pub fn decode_float32_array(buf: &[u8], offset: usize) -> Result<(Vec<f32>, usize), DecodeError> {
    let mut reader = WireReader::at(buf, offset);
    let values = reader.read_f32_array()?;
    Ok((values, reader.offset()))
}

/// Append a padded string field to `dst`.
///
/// # Errors
///
/// Returns [`EncodeError::LengthTooLarge`] for strings over `u32::MAX` bytes.
pub fn encode_string_field(dst: &mut BytesMut, value: &str) -> Result<(), EncodeError> {
    let mut writer = WireWriter::new();
    writer.put_string(value)?;
    dst.extend_from_slice(writer.as_slice());
    Ok(())
}

/// Append `{u32 count}{values}` as signed integers to `dst`.
///
/// # Errors
///
/// Returns [`EncodeError::LengthTooLarge`] if the count overflows `u32`.
pub fn encode_int32_array(dst: &mut BytesMut, values: &[i32]) -> Result<(), EncodeError> {
    let mut writer = WireWriter::with_capacity(SCALAR_SIZE * (values.len() + 1));
    writer.put_i32_array(values)?;
    dst.extend_from_slice(writer.as_slice());
    Ok(())
}

/// Append `{u32 count}{values}` as floats to `dst`.
///
/// # Errors
///
/// Returns [`EncodeError::LengthTooLarge`] if the count overflows `u32`.
pub fn encode_float32_array(dst: &mut BytesMut, values: &[f32]) -> Result<(), EncodeError> {
    let mut writer = WireWriter::with_capacity(SCALAR_SIZE * (values.len() + 1));
    writer.put_f32_array(values)?;
    dst.extend_from_slice(writer.as_slice());
    Ok(())
}

#[cfg(test)]
mod tests;
