//! Builders for server frames.
//!
//! Each helper encodes through [`livelink::codec::encode_frame`], so the
//! bytes match what a conforming server sends.

use bytes::{BufMut, Bytes, BytesMut};
use livelink::{
    codec::{
        InboundMessage,
        MeshGeometry,
        ObjectFlags,
        RefacetBatch,
        ReplyHeader,
        SceneObject,
        Transaction,
        encode_frame,
    },
    message::{MessageKind, ObjectKind},
};

fn encode(message: &InboundMessage) -> Bytes {
    encode_frame(message).expect("test frames always encode")
}

/// `NewFile` frame.
#[must_use]
pub fn new_file(filename: &str) -> Bytes {
    encode(&InboundMessage::NewFile {
        filename: filename.to_owned(),
    })
}

/// `NewVersion` frame.
#[must_use]
pub fn new_version(filename: &str, version: u32) -> Bytes {
    encode(&InboundMessage::NewVersion {
        filename: filename.to_owned(),
        version,
    })
}

/// `Transaction` frame.
#[must_use]
pub fn transaction(transaction: Transaction) -> Bytes { encode(&InboundMessage::Transaction(transaction)) }

/// Successful list reply of `kind`.
#[must_use]
pub fn list(kind: MessageKind, request_id: u32, transaction: Transaction) -> Bytes {
    encode(&InboundMessage::List {
        kind,
        header: ReplyHeader::ok(request_id),
        transaction,
    })
}

/// Successful refacet reply.
#[must_use]
pub fn refacet(request_id: u32, batch: RefacetBatch) -> Bytes {
    encode(&InboundMessage::Refacet {
        header: ReplyHeader::ok(request_id),
        batch,
    })
}

/// Reply of `kind` carrying a non-success `status` and no body.
#[must_use]
pub fn failed(kind: MessageKind, request_id: u32, status: u32) -> Bytes {
    encode(&InboundMessage::ReplyFailed {
        kind,
        header: ReplyHeader { request_id, status },
    })
}

/// Frame whose `kind` tag is followed by `body` verbatim.
#[must_use]
pub fn raw(kind: u32, body: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(4 + body.len());
    buf.put_u32_le(kind);
    buf.put_slice(body);
    buf.freeze()
}

/// A unit square in the XY plane, as four vertices and two triangles.
#[must_use]
pub fn quad_geometry() -> MeshGeometry {
    MeshGeometry {
        vertices: vec![
            0.0, 0.0, 0.0, //
            1.0, 0.0, 0.0, //
            1.0, 1.0, 0.0, //
            0.0, 1.0, 0.0,
        ],
        faces: vec![0, 1, 2, 0, 2, 3],
        normals: vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
        groups: vec![0, 6],
        face_ids: vec![1],
    }
}

/// A visible solid named `name` with [`quad_geometry`].
///
/// `display_name` is left equal to `name`; decoding derives its own.
#[must_use]
pub fn solid(id: u32, name: &str) -> SceneObject {
    SceneObject {
        kind: ObjectKind::Solid,
        id,
        version: 1,
        parent_id: 0,
        material_id: -1,
        flags: ObjectFlags(ObjectFlags::VISIBLE | ObjectFlags::SELECTABLE),
        name: name.to_owned(),
        display_name: name.to_owned(),
        geometry: Some(quad_geometry()),
    }
}

/// A group named `name`.
#[must_use]
pub fn group(id: u32, name: &str) -> SceneObject {
    SceneObject {
        kind: ObjectKind::Group,
        geometry: None,
        ..solid(id, name)
    }
}

/// Transaction for `filename` at `version` adding `objects`.
#[must_use]
pub fn adding(filename: &str, version: u32, objects: Vec<SceneObject>) -> Transaction {
    Transaction {
        filename: filename.to_owned(),
        version,
        delete: Vec::new(),
        add: objects,
        update: Vec::new(),
    }
}
