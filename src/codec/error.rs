//! Error types for the wire codec.
//!
//! Decoding distinguishes truncated input (a declared length runs past the
//! end of the buffer), malformed content (invalid UTF-8, unexpected nested
//! items) and unknown tags. Every decode error is local to the frame being
//! decoded: the session drops the frame and keeps reading.

use thiserror::Error;

use crate::message::{MessageKind, ObjectKind};

/// Errors raised while decoding a frame or a nested record.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// A field or declared length would read past the end of the buffer.
    #[error("truncated input at offset {offset}: need {needed} bytes, {available} available")]
    Truncated {
        /// Cursor position where the read was attempted.
        offset: usize,
        /// Bytes the read required.
        needed: usize,
        /// Bytes left in the buffer.
        available: usize,
    },

    /// A declared element count cannot be represented as a byte length.
    #[error("element count {count} at offset {offset} overflows the address space")]
    LengthOverflow {
        /// Cursor position of the count prefix.
        offset: usize,
        /// Declared element count.
        count: u32,
    },

    /// A string field did not hold valid UTF-8.
    #[error("invalid UTF-8 in string field at offset {offset}")]
    InvalidUtf8 {
        /// Cursor position of the string bytes.
        offset: usize,
    },

    /// A message-kind tag did not map to a known kind.
    #[error("unknown message kind: {0}")]
    UnknownMessageKind(u32),

    /// A nested item carried a kind that is not valid in its container.
    #[error("unexpected {kind} item")]
    UnexpectedItem {
        /// Kind of the offending item.
        kind: MessageKind,
    },
}

impl DecodeError {
    /// Returns `true`; a decode error never tears down the session.
    ///
    /// # Examples
    ///
    /// ```
    /// use livelink::codec::DecodeError;
    ///
    /// let err = DecodeError::UnknownMessageKind(42);
    /// assert!(err.should_drop_frame());
    /// ```
    #[must_use]
    pub const fn should_drop_frame(&self) -> bool { true }
}

/// Errors raised while encoding a record or command.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    /// A string or array is longer than a `u32` length prefix allows.
    #[error("length {len} does not fit a u32 length prefix")]
    LengthTooLarge {
        /// Offending length.
        len: usize,
    },

    /// A flat triple array whose length is not a multiple of three.
    #[error("{field} holds {len} values, which is not a whole number of triples")]
    Stride {
        /// Name of the offending field.
        field: &'static str,
        /// Number of values supplied.
        len: usize,
    },

    /// A solid or sheet record has no geometry to write.
    #[error("{kind:?} object {id} has no geometry")]
    MissingGeometry {
        /// Kind of the record.
        kind: ObjectKind,
        /// Object id of the record.
        id: u32,
    },
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{DecodeError, EncodeError};
    use crate::message::{MessageKind, ObjectKind};

    #[rstest]
    #[case(
        DecodeError::Truncated { offset: 8, needed: 12, available: 3 },
        "truncated input at offset 8: need 12 bytes, 3 available"
    )]
    #[case(DecodeError::UnknownMessageKind(99), "unknown message kind: 99")]
    #[case(
        DecodeError::UnexpectedItem { kind: MessageKind::NewFile },
        "unexpected NewFile item"
    )]
    #[case(DecodeError::InvalidUtf8 { offset: 4 }, "invalid UTF-8 in string field at offset 4")]
    fn decode_error_display(#[case] err: DecodeError, #[case] expected: &str) {
        assert_eq!(err.to_string(), expected);
        assert!(err.should_drop_frame());
    }

    #[rstest]
    #[case(
        EncodeError::Stride { field: "vertices", len: 4 },
        "vertices holds 4 values, which is not a whole number of triples"
    )]
    #[case(
        EncodeError::MissingGeometry { kind: ObjectKind::Sheet, id: 9 },
        "Sheet object 9 has no geometry"
    )]
    fn encode_error_display(#[case] err: EncodeError, #[case] expected: &str) {
        assert_eq!(err.to_string(), expected);
    }
}
