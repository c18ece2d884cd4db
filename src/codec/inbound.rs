//! Whole-frame decoding for server-to-client messages.
//!
//! [`decode_frame`] reads the leading kind tag and routes to the matching
//! body decoder. Reply frames (lists and refacets) carry a
//! `{u32 request_id}{u32 status}` header before the body; a status other
//! than [`STATUS_OK`] stops decoding and yields
//! [`InboundMessage::ReplyFailed`].
//!
//! [`encode_frame`] produces the same layouts and is what test servers use
//! to drive a client.

use bytes::Bytes;

use super::{
    DecodeError,
    EncodeError,
    NameOptions,
    RefacetBatch,
    Transaction,
    WireReader,
    WireWriter,
    decode_refacet_batch,
    encode_refacet_batch,
};
use crate::message::MessageKind;

/// Status code of a successful reply.
pub const STATUS_OK: u32 = 200;

/// Request id and status echoed at the start of every reply frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplyHeader {
    /// Message id of the request this reply answers.
    pub request_id: u32,
    /// HTTP-style status code.
    pub status: u32,
}

impl ReplyHeader {
    /// Header for a successful reply.
    #[must_use]
    pub const fn ok(request_id: u32) -> Self {
        Self {
            request_id,
            status: STATUS_OK,
        }
    }

    /// Returns `true` if the status is [`STATUS_OK`].
    #[must_use]
    pub const fn is_ok(self) -> bool { self.status == STATUS_OK }

    pub(super) fn decode(reader: &mut WireReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            request_id: reader.read_u32()?,
            status: reader.read_u32()?,
        })
    }

    pub(super) fn encode(self, writer: &mut WireWriter) {
        writer.put_u32(self.request_id);
        writer.put_u32(self.status);
    }
}

/// A fully decoded inbound frame.
#[derive(Clone, Debug, PartialEq)]
pub enum InboundMessage {
    /// Incremental changes pushed to a subscriber.
    Transaction(Transaction),
    /// Full-sync reply to a list request.
    List {
        /// `ListAll`, `ListSome` or `ListVisible`.
        kind: MessageKind,
        /// Echoed request id; always [`STATUS_OK`].
        header: ReplyHeader,
        /// Objects in the reply.
        transaction: Transaction,
    },
    /// The open file was saved at a new version.
    NewVersion {
        /// File that changed.
        filename: String,
        /// Its new version.
        version: u32,
    },
    /// The server opened another file.
    NewFile {
        /// Newly opened file.
        filename: String,
    },
    /// Successful refacet reply.
    Refacet {
        /// Echoed request id; always [`STATUS_OK`].
        header: ReplyHeader,
        /// Remeshed geometry.
        batch: RefacetBatch,
    },
    /// A reply whose status was not [`STATUS_OK`]; the body was not read.
    ReplyFailed {
        /// Kind of the failed request.
        kind: MessageKind,
        /// Echoed request id and failure status.
        header: ReplyHeader,
    },
    /// A recognised or unrecognised kind the client does not act on.
    Ignored(MessageKind),
}

impl InboundMessage {
    /// Kind tag this message is framed with.
    #[must_use]
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Transaction(_) => MessageKind::Transaction,
            Self::List { kind, .. } | Self::ReplyFailed { kind, .. } | Self::Ignored(kind) => *kind,
            Self::NewVersion { .. } => MessageKind::NewVersion,
            Self::NewFile { .. } => MessageKind::NewFile,
            Self::Refacet { .. } => MessageKind::RefacetSome,
        }
    }

    /// Filename this message establishes as the open file, if any.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        match self {
            Self::Transaction(transaction) | Self::List { transaction, .. } => {
                Some(&transaction.filename)
            }
            Self::NewVersion { filename, .. } | Self::NewFile { filename } => Some(filename),
            Self::Refacet { batch, .. } => Some(&batch.filename),
            Self::ReplyFailed { .. } | Self::Ignored(_) => None,
        }
    }

    /// File version this message establishes, if any.
    #[must_use]
    pub fn version(&self) -> Option<u32> {
        match self {
            Self::Transaction(transaction) | Self::List { transaction, .. } => {
                Some(transaction.version)
            }
            Self::NewVersion { version, .. } => Some(*version),
            Self::Refacet { batch, .. } => Some(batch.version),
            Self::NewFile { .. } | Self::ReplyFailed { .. } | Self::Ignored(_) => None,
        }
    }
}

/// Decode one complete inbound frame.
///
/// Trailing bytes after a successfully decoded body are ignored.
///
/// # Errors
///
/// Returns [`DecodeError`] if the kind tag or the body is truncated or
/// malformed. Unknown kinds are not an error; they decode to
/// [`InboundMessage::Ignored`].
///
/// # Examples
///
/// ```
/// use livelink::{
///     codec::{InboundMessage, NameOptions, decode_frame},
///     message::MessageKind,
/// };
///
/// let frame = [11, 0, 0, 0, 1, 0, 0, 0, b'a'];
/// assert_eq!(
///     decode_frame(&frame, NameOptions::default()),
///     Ok(InboundMessage::NewFile {
///         filename: "a".to_owned()
///     })
/// );
/// assert_eq!(
///     decode_frame(&[99, 0, 0, 0], NameOptions::default()),
///     Ok(InboundMessage::Ignored(MessageKind::Unrecognized(99)))
/// );
/// ```
pub fn decode_frame(buf: &[u8], options: NameOptions) -> Result<InboundMessage, DecodeError> {
    let mut reader = WireReader::new(buf);
    let kind = reader.read_kind()?;
    match kind {
        MessageKind::Transaction => Transaction::decode(&mut reader, options).map(InboundMessage::Transaction),
        MessageKind::ListAll | MessageKind::ListSome | MessageKind::ListVisible => {
            let header = ReplyHeader::decode(&mut reader)?;
            if !header.is_ok() {
                return Ok(InboundMessage::ReplyFailed { kind, header });
            }
            let transaction = Transaction::decode(&mut reader, options)?;
            Ok(InboundMessage::List {
                kind,
                header,
                transaction,
            })
        }
        MessageKind::RefacetSome => {
            let (header, batch, _) = decode_refacet_batch(buf, reader.offset())?;
            Ok(match batch {
                Some(batch) => InboundMessage::Refacet { header, batch },
                None => InboundMessage::ReplyFailed { kind, header },
            })
        }
        MessageKind::NewVersion => Ok(InboundMessage::NewVersion {
            filename: reader.read_string()?,
            version: reader.read_u32()?,
        }),
        MessageKind::NewFile => Ok(InboundMessage::NewFile {
            filename: reader.read_trailing_string()?,
        }),
        other => Ok(InboundMessage::Ignored(other)),
    }
}

/// Encode `message` as a complete frame.
///
/// # Errors
///
/// Returns [`EncodeError`] if any field fails to encode.
pub fn encode_frame(message: &InboundMessage) -> Result<Bytes, EncodeError> {
    let mut writer = WireWriter::new();
    writer.put_kind(message.kind());
    match message {
        InboundMessage::Transaction(transaction) => transaction.encode(&mut writer)?,
        InboundMessage::List {
            header,
            transaction,
            ..
        } => {
            header.encode(&mut writer);
            transaction.encode(&mut writer)?;
        }
        InboundMessage::NewVersion { filename, version } => {
            writer.put_string(filename)?;
            writer.put_u32(*version);
        }
        InboundMessage::NewFile { filename } => writer.put_string(filename)?,
        InboundMessage::Refacet { header, batch } => encode_refacet_batch(&mut writer, *header, batch)?,
        InboundMessage::ReplyFailed { header, .. } => header.encode(&mut writer),
        InboundMessage::Ignored(_) => {}
    }
    Ok(writer.into_bytes())
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::codec::RefacetItem;

    fn decode(buf: &[u8]) -> Result<InboundMessage, DecodeError> {
        decode_frame(buf, NameOptions::default())
    }

    #[test]
    fn new_version_round_trips() {
        let message = InboundMessage::NewVersion {
            filename: "part.plasticity".to_owned(),
            version: 9,
        };
        let frame = encode_frame(&message).expect("encode");
        assert_eq!(decode(&frame), Ok(message.clone()));
        assert_eq!(message.filename(), Some("part.plasticity"));
        assert_eq!(message.version(), Some(9));
    }

    #[rstest]
    #[case::padded(&[11, 0, 0, 0, 2, 0, 0, 0, b'a', b'b', 0, 0])]
    #[case::unpadded(&[11, 0, 0, 0, 2, 0, 0, 0, b'a', b'b'])]
    fn new_file_tolerates_missing_padding(#[case] frame: &[u8]) {
        assert_eq!(
            decode(frame),
            Ok(InboundMessage::NewFile {
                filename: "ab".to_owned()
            })
        );
    }

    #[rstest]
    #[case(MessageKind::ListAll)]
    #[case(MessageKind::ListSome)]
    #[case(MessageKind::ListVisible)]
    fn list_replies_share_the_transaction_body(#[case] kind: MessageKind) {
        let message = InboundMessage::List {
            kind,
            header: ReplyHeader::ok(3),
            transaction: Transaction {
                filename: "f".to_owned(),
                version: 2,
                delete: vec![1],
                ..Transaction::default()
            },
        };
        let frame = encode_frame(&message).expect("encode");
        assert_eq!(decode(&frame), Ok(message));
    }

    #[rstest]
    #[case(MessageKind::ListAll)]
    #[case(MessageKind::RefacetSome)]
    fn failed_status_stops_before_the_body(#[case] kind: MessageKind) {
        let mut writer = WireWriter::new();
        writer.put_kind(kind);
        writer.put_u32(5);
        writer.put_u32(404);
        // Garbage that would fail to decode as a body.
        writer.put_u32(u32::MAX);

        let header = ReplyHeader {
            request_id: 5,
            status: 404,
        };
        assert_eq!(
            decode(writer.as_slice()),
            Ok(InboundMessage::ReplyFailed { kind, header })
        );
    }

    #[test]
    fn refacet_reply_round_trips() {
        let message = InboundMessage::Refacet {
            header: ReplyHeader::ok(7),
            batch: RefacetBatch {
                filename: "f".to_owned(),
                version: 3,
                items: vec![RefacetItem {
                    id: 4,
                    version: 2,
                    face_vertex_counts: vec![3],
                    positions: vec![0.0; 9],
                    indices: vec![0, 1, 2],
                    normals: vec![0.0; 9],
                    groups: vec![0, 3],
                    face_ids: vec![1],
                }],
            },
        };
        let frame = encode_frame(&message).expect("encode");
        assert_eq!(decode(&frame), Ok(message));
    }

    #[rstest]
    #[case(MessageKind::SubscribeAll)]
    #[case(MessageKind::UnsubscribeAll)]
    #[case(MessageKind::Move)]
    #[case(MessageKind::Unrecognized(1234))]
    fn non_dispatched_kinds_are_ignored(#[case] kind: MessageKind) {
        let frame = encode_frame(&InboundMessage::Ignored(kind)).expect("encode");
        let message = decode(&frame).expect("decode");
        assert_eq!(message, InboundMessage::Ignored(kind));
        assert_eq!(message.filename(), None);
    }

    #[test]
    fn short_header_is_an_error() {
        assert!(matches!(decode(&[0, 0]), Err(DecodeError::Truncated { .. })));
    }

    #[test]
    fn overrunning_body_is_an_error() {
        // Transaction whose filename claims 100 bytes.
        let frame = [0, 0, 0, 0, 100, 0, 0, 0, b'x'];
        assert!(matches!(decode(&frame), Err(DecodeError::Truncated { .. })));
    }
}
