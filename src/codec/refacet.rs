//! Refacet replies: remeshed geometry for objects the client already knows.
//!
//! Unlike object records, every array here uses the plain four-byte stride:
//! the count prefix is the number of scalars, not triples. Faces are
//! described by per-face vertex counts so quads and n-gons survive intact.

use super::{DecodeError, EncodeError, ReplyHeader, WireReader, WireWriter};

/// New geometry for one object id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RefacetItem {
    /// Object the geometry replaces.
    pub id: u32,
    /// Object version the geometry was produced from.
    pub version: u32,
    /// Vertex count of each face, in face order.
    pub face_vertex_counts: Vec<i32>,
    /// Flat `x, y, z` positions.
    pub positions: Vec<f32>,
    /// Position indices, consumed `face_vertex_counts[i]` at a time.
    pub indices: Vec<i32>,
    /// Flat `x, y, z` normals, one per index.
    pub normals: Vec<f32>,
    /// Polygon group boundaries.
    pub groups: Vec<i32>,
    /// Source face id of each group.
    pub face_ids: Vec<i32>,
}

impl RefacetItem {
    /// Number of faces described by this item.
    #[must_use]
    pub fn face_count(&self) -> usize { self.face_vertex_counts.len() }

    fn decode(reader: &mut WireReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            id: reader.read_u32()?,
            version: reader.read_u32()?,
            face_vertex_counts: reader.read_i32_array()?,
            positions: reader.read_f32_array()?,
            indices: reader.read_i32_array()?,
            normals: reader.read_f32_array()?,
            groups: reader.read_i32_array()?,
            face_ids: reader.read_i32_array()?,
        })
    }

    fn encode(&self, writer: &mut WireWriter) -> Result<(), EncodeError> {
        writer.put_u32(self.id);
        writer.put_u32(self.version);
        writer.put_i32_array(&self.face_vertex_counts)?;
        writer.put_f32_array(&self.positions)?;
        writer.put_i32_array(&self.indices)?;
        writer.put_f32_array(&self.normals)?;
        writer.put_i32_array(&self.groups)?;
        writer.put_i32_array(&self.face_ids)
    }
}

/// Decoded body of a successful refacet reply.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RefacetBatch {
    /// File the geometry belongs to.
    pub filename: String,
    /// File version the geometry was produced from.
    pub version: u32,
    /// Per-object geometry, in wire order.
    pub items: Vec<RefacetItem>,
}

impl RefacetBatch {
    /// Ids carried by this batch, in wire order.
    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ { self.items.iter().map(|item| item.id) }

    /// Decode a refacet body (after the reply header) at the reader's cursor.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if any field or item is truncated.
    pub fn decode(reader: &mut WireReader<'_>) -> Result<Self, DecodeError> {
        let filename = reader.read_string()?;
        let version = reader.read_u32()?;
        let count = reader.read_u32()?;
        let mut items = Vec::new();
        for _ in 0..count {
            items.push(RefacetItem::decode(reader)?);
        }
        Ok(Self {
            filename,
            version,
            items,
        })
    }

    /// Append this batch body to `writer`.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError`] if a length overflows its prefix.
    pub fn encode(&self, writer: &mut WireWriter) -> Result<(), EncodeError> {
        writer.put_string(&self.filename)?;
        writer.put_u32(self.version);
        let count = u32::try_from(self.items.len()).map_err(|_| EncodeError::LengthTooLarge {
            len: self.items.len(),
        })?;
        writer.put_u32(count);
        self.items.iter().try_for_each(|item| item.encode(writer))
    }
}

/// Decode a refacet reply at `offset`, starting with its
/// `{request_id}{status}` header (the kind tag is already consumed).
///
/// When the status is not [`STATUS_OK`](super::STATUS_OK) the body is not
/// read: the batch is `None` and the returned offset is just past the header.
///
/// # Errors
///
/// Returns [`DecodeError`] if the header is truncated, or, for a successful
/// status, if any field or item is.
pub fn decode_refacet_batch(
    buf: &[u8],
    offset: usize,
) -> Result<(ReplyHeader, Option<RefacetBatch>, usize), DecodeError> {
    let mut reader = WireReader::at(buf, offset);
    let header = ReplyHeader::decode(&mut reader)?;
    if !header.is_ok() {
        return Ok((header, None, reader.offset()));
    }
    let batch = RefacetBatch::decode(&mut reader)?;
    Ok((header, Some(batch), reader.offset()))
}

/// Append `header` followed by the refacet body.
///
/// # Errors
///
/// See [`RefacetBatch::encode`].
pub fn encode_refacet_batch(
    writer: &mut WireWriter,
    header: ReplyHeader,
    batch: &RefacetBatch,
) -> Result<(), EncodeError> {
    header.encode(writer);
    batch.encode(writer)
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn quad() -> RefacetItem {
        RefacetItem {
            id: 12,
            version: 4,
            face_vertex_counts: vec![4],
            positions: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0],
            indices: vec![0, 1, 2, 3],
            normals: vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            groups: vec![0, 4],
            face_ids: vec![17],
        }
    }

    #[rstest]
    fn arrays_use_scalar_stride(quad: RefacetItem) {
        let batch = RefacetBatch {
            filename: "f".to_owned(),
            version: 2,
            items: vec![quad],
        };
        let mut writer = WireWriter::new();
        encode_refacet_batch(&mut writer, ReplyHeader::ok(9), &batch).expect("encode");
        let bytes = writer.as_slice();

        // header(8) + filename(8) + version + count + id + version, then the
        // first array.
        assert_eq!(&bytes[32..36], &[1, 0, 0, 0]);
        // positions count is 12 scalars, not 4 triples.
        assert_eq!(&bytes[40..44], &[12, 0, 0, 0]);

        let (header, decoded, offset) = decode_refacet_batch(bytes, 0).expect("decode");
        assert_eq!(header, ReplyHeader::ok(9));
        assert_eq!(offset, bytes.len());
        let decoded = decoded.expect("successful status carries a batch");
        assert_eq!(decoded.items[0].face_count(), 1);
        assert_eq!(decoded, batch);
    }

    #[rstest]
    fn ids_follow_wire_order(quad: RefacetItem) {
        let mut second = quad.clone();
        second.id = 3;
        let batch = RefacetBatch {
            filename: "f".to_owned(),
            version: 1,
            items: vec![quad, second],
        };
        assert_eq!(batch.ids().collect::<Vec<_>>(), vec![12, 3]);
    }

    #[rstest]
    fn truncated_item_is_rejected(quad: RefacetItem) {
        let batch = RefacetBatch {
            filename: "f".to_owned(),
            version: 1,
            items: vec![quad],
        };
        let mut writer = WireWriter::new();
        encode_refacet_batch(&mut writer, ReplyHeader::ok(1), &batch).expect("encode");
        let bytes = writer.as_slice();

        let err = decode_refacet_batch(&bytes[..bytes.len() - 2], 0).expect_err("short");
        assert!(matches!(err, DecodeError::Truncated { .. }));
    }

    #[rstest]
    #[case(404)]
    #[case(500)]
    fn failed_status_leaves_the_body_unread(#[case] status: u32) {
        let mut writer = WireWriter::new();
        writer.put_u32(5);
        writer.put_u32(status);
        // A filename length that would overrun the frame if it were read.
        writer.put_u32(u32::MAX);

        let (header, batch, offset) = decode_refacet_batch(writer.as_slice(), 0).expect("header decodes");
        assert_eq!(
            header,
            ReplyHeader {
                request_id: 5,
                status,
            }
        );
        assert!(batch.is_none());
        assert_eq!(offset, 8);
    }
}
