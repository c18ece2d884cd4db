//! Scene object records and object lists.
//!
//! An object record is a fixed header (kind, id, version, parent, material,
//! flags, name) optionally followed by mesh geometry. Geometry is present on
//! the wire only for [`ObjectKind::Solid`] and [`ObjectKind::Sheet`]; for any
//! other kind the decoder stops after the name and never looks at the bytes
//! that follow.
//!
//! Vertex, face and normal arrays use a triple stride: the count prefix is the
//! number of triples, each occupying twelve bytes. Groups and face ids use the
//! plain four-byte stride.

use super::{DecodeError, EncodeError, WireReader, WireWriter};
use crate::message::ObjectKind;

/// Prepended to display names that would otherwise start with a digit.
///
/// Host object-naming systems reject identifiers with a leading digit.
pub const DIGIT_PREFIX: &str = "Null_";

/// Controls how display names are derived from wire names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NameOptions {
    /// Append `_{id}` to every name.
    pub id_suffix: bool,
}

impl Default for NameOptions {
    fn default() -> Self { Self { id_suffix: true } }
}

/// Derive the host-facing name for an object.
///
/// The id suffix is applied first; the digit prefix is applied to the result
/// when it starts with an ASCII decimal digit. Other numeric characters such
/// as `½` or `Ⅻ` leave the name unchanged.
///
/// # Examples
///
/// ```
/// use livelink::codec::{NameOptions, display_name};
///
/// let suffixed = NameOptions { id_suffix: true };
/// let plain = NameOptions { id_suffix: false };
///
/// assert_eq!(display_name("Block", 7, suffixed), "Block_7");
/// assert_eq!(display_name("3D Text", 7, plain), "Null_3D Text");
/// assert_eq!(display_name("Block", 7, plain), "Block");
/// ```
#[must_use]
pub fn display_name(name: &str, id: u32, options: NameOptions) -> String {
    let mut out = if options.id_suffix {
        format!("{name}_{id}")
    } else {
        name.to_owned()
    };
    if out.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        out.insert_str(0, DIGIT_PREFIX);
    }
    out
}

/// Replace every character outside `[A-Za-z0-9_]` with `_`.
///
/// # Examples
///
/// ```
/// use livelink::codec::sanitize_identifier;
///
/// assert_eq!(sanitize_identifier("part v2.plasticity"), "part_v2_plasticity");
/// ```
#[must_use]
pub fn sanitize_identifier(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Visibility bit-flags attached to every object.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ObjectFlags(pub u32);

impl ObjectFlags {
    /// Hidden in the server's viewport.
    pub const HIDDEN: u32 = 1;
    /// Visible in the server's viewport.
    pub const VISIBLE: u32 = 2;
    /// Selectable in the server's viewport.
    pub const SELECTABLE: u32 = 4;

    /// Returns `true` if the hidden bit is set.
    #[must_use]
    pub const fn is_hidden(self) -> bool { self.0 & Self::HIDDEN != 0 }

    /// Returns `true` if the visible bit is set.
    #[must_use]
    pub const fn is_visible(self) -> bool { self.0 & Self::VISIBLE != 0 }

    /// Returns `true` if the selectable bit is set.
    #[must_use]
    pub const fn is_selectable(self) -> bool { self.0 & Self::SELECTABLE != 0 }
}

/// Triangle mesh attached to a solid or sheet.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshGeometry {
    /// Flat `x, y, z` positions.
    pub vertices: Vec<f32>,
    /// Flat vertex-index triples, one per triangle.
    pub faces: Vec<i32>,
    /// Flat `x, y, z` normals.
    pub normals: Vec<f32>,
    /// Polygon group boundaries.
    pub groups: Vec<i32>,
    /// Per-face topology ids.
    pub face_ids: Vec<i32>,
}

impl MeshGeometry {
    /// Number of vertices (position triples).
    #[must_use]
    pub fn vertex_count(&self) -> usize { self.vertices.len() / 3 }

    /// Number of triangles.
    #[must_use]
    pub fn triangle_count(&self) -> usize { self.faces.len() / 3 }

    fn decode(reader: &mut WireReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            vertices: reader.read_f32_triples()?,
            faces: reader.read_i32_triples()?,
            normals: reader.read_f32_triples()?,
            groups: reader.read_i32_array()?,
            face_ids: reader.read_i32_array()?,
        })
    }

    fn encode(&self, writer: &mut WireWriter) -> Result<(), EncodeError> {
        writer.put_f32_triples("vertices", &self.vertices)?;
        writer.put_i32_triples("faces", &self.faces)?;
        writer.put_f32_triples("normals", &self.normals)?;
        writer.put_i32_array(&self.groups)?;
        writer.put_i32_array(&self.face_ids)
    }
}

/// Decoded representation of one remote entity.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneObject {
    /// Entity kind.
    pub kind: ObjectKind,
    /// Numeric id, unique within its id scope.
    pub id: u32,
    /// Entity version.
    pub version: u32,
    /// Parent group id; zero or negative means the root.
    pub parent_id: i32,
    /// Material id; negative means none.
    pub material_id: i32,
    /// Visibility flags.
    pub flags: ObjectFlags,
    /// Name exactly as carried on the wire.
    pub name: String,
    /// Host-facing name derived with [`display_name`].
    pub display_name: String,
    /// Mesh data; `Some` exactly when `kind` carries geometry.
    pub geometry: Option<MeshGeometry>,
}

impl SceneObject {
    /// Parent group id, if the object is not at the root.
    #[must_use]
    pub fn parent_group(&self) -> Option<u32> {
        u32::try_from(self.parent_id).ok().filter(|id| *id > 0)
    }

    /// Decode one record at the reader's cursor.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the record is truncated or its name is not
    /// UTF-8.
    pub fn decode(reader: &mut WireReader<'_>, options: NameOptions) -> Result<Self, DecodeError> {
        let kind = ObjectKind::from_wire(reader.read_u32()?);
        let id = reader.read_u32()?;
        let version = reader.read_u32()?;
        let parent_id = reader.read_i32()?;
        let material_id = reader.read_i32()?;
        let flags = ObjectFlags(reader.read_u32()?);
        let name = reader.read_string()?;
        let geometry = if kind.has_geometry() {
            Some(MeshGeometry::decode(reader)?)
        } else {
            None
        };
        Ok(Self {
            kind,
            id,
            version,
            parent_id,
            material_id,
            flags,
            display_name: display_name(&name, id, options),
            name,
            geometry,
        })
    }

    /// Append this record to `writer`.
    ///
    /// Geometry is written only for kinds that carry it and ignored for the
    /// rest.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::MissingGeometry`] for a solid or sheet without
    /// geometry, and [`EncodeError`] if a triple array has a partial triple or
    /// a length overflows its prefix.
    pub fn encode(&self, writer: &mut WireWriter) -> Result<(), EncodeError> {
        let geometry = match (&self.geometry, self.kind.has_geometry()) {
            (Some(geometry), true) => Some(geometry),
            (None, true) => {
                return Err(EncodeError::MissingGeometry {
                    kind: self.kind,
                    id: self.id,
                });
            }
            (_, false) => None,
        };
        writer.put_u32(self.kind.to_wire());
        writer.put_u32(self.id);
        writer.put_u32(self.version);
        writer.put_i32(self.parent_id);
        writer.put_i32(self.material_id);
        writer.put_u32(self.flags.0);
        writer.put_string(&self.name)?;
        if let Some(geometry) = geometry {
            geometry.encode(writer)?;
        }
        Ok(())
    }
}

/// Decode one object record at `offset`.
///
/// # Errors
///
/// Returns [`DecodeError`] if the record is truncated or malformed.
pub fn decode_scene_object(
    buf: &[u8],
    offset: usize,
    options: NameOptions,
) -> Result<(SceneObject, usize), DecodeError> {
    let mut reader = WireReader::at(buf, offset);
    let object = SceneObject::decode(&mut reader, options)?;
    Ok((object, reader.offset()))
}

/// Append one object record.
///
/// # Errors
///
/// See [`SceneObject::encode`].
pub fn encode_scene_object(writer: &mut WireWriter, object: &SceneObject) -> Result<(), EncodeError> {
    object.encode(writer)
}

/// Decode `{u32 count}` followed by `count` back-to-back object records.
///
/// # Errors
///
/// Returns [`DecodeError`] if any record is truncated or malformed.
pub fn decode_object_list(
    buf: &[u8],
    offset: usize,
    options: NameOptions,
) -> Result<(Vec<SceneObject>, usize), DecodeError> {
    let mut reader = WireReader::at(buf, offset);
    let objects = read_object_list(&mut reader, options)?;
    Ok((objects, reader.offset()))
}

pub(crate) fn read_object_list(
    reader: &mut WireReader<'_>,
    options: NameOptions,
) -> Result<Vec<SceneObject>, DecodeError> {
    let count = reader.read_u32()?;
    // The count is untrusted; let the records themselves bound the allocation.
    let mut objects = Vec::new();
    for _ in 0..count {
        objects.push(SceneObject::decode(reader, options)?);
    }
    Ok(objects)
}

/// Append `{u32 count}` followed by each record.
///
/// # Errors
///
/// Returns [`EncodeError`] if any record fails to encode.
pub fn encode_object_list(writer: &mut WireWriter, objects: &[SceneObject]) -> Result<(), EncodeError> {
    let count = u32::try_from(objects.len()).map_err(|_| EncodeError::LengthTooLarge {
        len: objects.len(),
    })?;
    writer.put_u32(count);
    objects.iter().try_for_each(|object| object.encode(writer))
}
