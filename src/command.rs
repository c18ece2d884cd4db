//! Outbound client-to-server commands.
//!
//! Every command frame starts with `{u32 kind}{u32 message_id}`. Commands
//! that address specific objects follow this with a filename string field
//! and a `u32` id array; `RefacetSome` then appends twelve fixed option
//! fields.
//!
//! Message ids are assigned by the session, not here: [`encode_command`]
//! takes the id to write.

use bytes::Bytes;

use crate::{
    codec::{DecodeError, EncodeError, WireReader, WireWriter},
    message::{FacetShape, MessageKind},
};

/// Remeshing parameters sent with [`Command::RefacetSome`].
///
/// Every field is always written, in declaration order.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RefacetOptions {
    /// Interpret tolerances relative to each object's bounding box.
    pub relative_to_bbox: bool,
    /// Maximum chord deviation along curves.
    pub curve_chord_tolerance: f32,
    /// Maximum angle between chord segments, in radians.
    pub curve_chord_angle: f32,
    /// Maximum deviation of facets from the surface.
    pub surface_plane_tolerance: f32,
    /// Maximum angle between adjacent facets, in radians.
    pub surface_plane_angle: f32,
    /// Keep facets watertight across shared edges.
    pub match_topology: bool,
    /// Maximum vertices per polygon.
    pub max_sides: u32,
    /// Planarity angle for merged polygons.
    pub plane_angle: f32,
    /// Minimum facet width; zero disables the limit.
    pub min_width: f32,
    /// Maximum facet width; zero disables the limit.
    pub max_width: f32,
    /// Maximum chord length; zero disables the limit.
    pub curve_chord_max: f32,
    /// Polygon shape constraint.
    pub shape: FacetShape,
}

impl Default for RefacetOptions {
    fn default() -> Self {
        Self {
            relative_to_bbox: true,
            curve_chord_tolerance: 0.01,
            curve_chord_angle: 0.35,
            surface_plane_tolerance: 0.01,
            surface_plane_angle: 0.35,
            match_topology: true,
            max_sides: 3,
            plane_angle: 0.0,
            min_width: 0.0,
            max_width: 0.0,
            curve_chord_max: 0.0,
            shape: FacetShape::Cut,
        }
    }
}

impl RefacetOptions {
    /// Set whether tolerances are relative to the bounding box.
    #[must_use]
    pub fn with_relative_to_bbox(mut self, value: bool) -> Self {
        self.relative_to_bbox = value;
        self
    }

    /// Set the curve chord tolerance and angle.
    #[must_use]
    pub fn with_curve_chord(mut self, tolerance: f32, angle: f32) -> Self {
        self.curve_chord_tolerance = tolerance;
        self.curve_chord_angle = angle;
        self
    }

    /// Set the surface plane tolerance and angle.
    #[must_use]
    pub fn with_surface_plane(mut self, tolerance: f32, angle: f32) -> Self {
        self.surface_plane_tolerance = tolerance;
        self.surface_plane_angle = angle;
        self
    }

    /// Set topology matching.
    #[must_use]
    pub fn with_match_topology(mut self, value: bool) -> Self {
        self.match_topology = value;
        self
    }

    /// Set the maximum number of polygon sides.
    #[must_use]
    pub fn with_max_sides(mut self, value: u32) -> Self {
        self.max_sides = value;
        self
    }

    /// Set the plane angle.
    #[must_use]
    pub fn with_plane_angle(mut self, value: f32) -> Self {
        self.plane_angle = value;
        self
    }

    /// Set the facet width limits.
    #[must_use]
    pub fn with_width(mut self, min: f32, max: f32) -> Self {
        self.min_width = min;
        self.max_width = max;
        self
    }

    /// Set the maximum chord length.
    #[must_use]
    pub fn with_curve_chord_max(mut self, value: f32) -> Self {
        self.curve_chord_max = value;
        self
    }

    /// Set the polygon shape constraint.
    #[must_use]
    pub fn with_shape(mut self, shape: FacetShape) -> Self {
        self.shape = shape;
        self
    }

    fn encode(&self, writer: &mut WireWriter) {
        writer.put_bool(self.relative_to_bbox);
        writer.put_f32(self.curve_chord_tolerance);
        writer.put_f32(self.curve_chord_angle);
        writer.put_f32(self.surface_plane_tolerance);
        writer.put_f32(self.surface_plane_angle);
        writer.put_bool(self.match_topology);
        writer.put_u32(self.max_sides);
        writer.put_f32(self.plane_angle);
        writer.put_f32(self.min_width);
        writer.put_f32(self.max_width);
        writer.put_f32(self.curve_chord_max);
        writer.put_u32(self.shape.to_wire());
    }

    /// Unknown shape values decode as the default shape.
    fn decode(reader: &mut WireReader<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            relative_to_bbox: reader.read_bool()?,
            curve_chord_tolerance: reader.read_f32()?,
            curve_chord_angle: reader.read_f32()?,
            surface_plane_tolerance: reader.read_f32()?,
            surface_plane_angle: reader.read_f32()?,
            match_topology: reader.read_bool()?,
            max_sides: reader.read_u32()?,
            plane_angle: reader.read_f32()?,
            min_width: reader.read_f32()?,
            max_width: reader.read_f32()?,
            curve_chord_max: reader.read_f32()?,
            shape: FacetShape::from_wire(reader.read_u32()?).unwrap_or_default(),
        })
    }
}

/// A request the client can send.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Request every object in the open file.
    ListAll,
    /// Request visible objects only.
    ListVisible,
    /// Request selected objects.
    ListSome {
        /// File the ids belong to.
        filename: String,
        /// Objects to list.
        ids: Vec<u32>,
    },
    /// Subscribe to every change in the open file.
    SubscribeAll,
    /// Subscribe to changes for selected objects.
    SubscribeSome {
        /// File the ids belong to.
        filename: String,
        /// Objects to follow.
        ids: Vec<u32>,
    },
    /// Cancel all subscriptions.
    UnsubscribeAll,
    /// Request new geometry for selected objects.
    RefacetSome {
        /// File the ids belong to.
        filename: String,
        /// Objects to remesh.
        ids: Vec<u32>,
        /// Remeshing parameters.
        options: RefacetOptions,
    },
}

impl Command {
    /// Kind tag written at the start of the frame.
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        match self {
            Self::ListAll => MessageKind::ListAll,
            Self::ListVisible => MessageKind::ListVisible,
            Self::ListSome { .. } => MessageKind::ListSome,
            Self::SubscribeAll => MessageKind::SubscribeAll,
            Self::SubscribeSome { .. } => MessageKind::SubscribeSome,
            Self::UnsubscribeAll => MessageKind::UnsubscribeAll,
            Self::RefacetSome { .. } => MessageKind::RefacetSome,
        }
    }

    /// Target ids for commands that address specific objects.
    #[must_use]
    pub fn ids(&self) -> Option<&[u32]> {
        match self {
            Self::ListSome { ids, .. } | Self::SubscribeSome { ids, .. } | Self::RefacetSome { ids, .. } => {
                Some(ids.as_slice())
            }
            Self::ListAll | Self::ListVisible | Self::SubscribeAll | Self::UnsubscribeAll => None,
        }
    }

    /// Returns `true` for an id-addressed command with no ids; such
    /// commands are never sent.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.ids().is_some_and(<[u32]>::is_empty) }

    /// New value of the session's subscription flag once this command is
    /// sent, if it changes it.
    #[must_use]
    pub const fn subscription(&self) -> Option<bool> {
        match self {
            Self::SubscribeAll => Some(true),
            Self::UnsubscribeAll => Some(false),
            _ => None,
        }
    }
}

/// Encode `command` as a frame carrying `message_id`.
///
/// # Errors
///
/// Returns [`EncodeError`] if the filename or id list is too long for its
/// length prefix.
///
/// # Examples
///
/// ```
/// use livelink::command::{Command, encode_command};
///
/// let frame = encode_command(&Command::ListAll, 1).expect("fixed-size frame");
/// assert_eq!(&frame[..], &[20, 0, 0, 0, 1, 0, 0, 0]);
/// ```
pub fn encode_command(command: &Command, message_id: u32) -> Result<Bytes, EncodeError> {
    let mut writer = WireWriter::with_capacity(8);
    writer.put_kind(command.kind());
    writer.put_u32(message_id);
    match command {
        Command::ListAll | Command::ListVisible | Command::SubscribeAll | Command::UnsubscribeAll => {}
        Command::ListSome { filename, ids } | Command::SubscribeSome { filename, ids } => {
            writer.put_string(filename)?;
            writer.put_u32_array(ids)?;
        }
        Command::RefacetSome {
            filename,
            ids,
            options,
        } => {
            writer.put_string(filename)?;
            writer.put_u32_array(ids)?;
            options.encode(&mut writer);
        }
    }
    Ok(writer.into_bytes())
}

/// Decode a command frame into the command and its message id.
///
/// This is the server side of [`encode_command`].
///
/// # Errors
///
/// Returns [`DecodeError::UnknownMessageKind`] for unknown tags,
/// [`DecodeError::UnexpectedItem`] for kinds that are not client commands,
/// or [`DecodeError::Truncated`] on short input.
pub fn decode_command(buf: &[u8]) -> Result<(Command, u32), DecodeError> {
    let mut reader = WireReader::new(buf);
    let kind = MessageKind::try_from(reader.read_u32()?)?;
    let message_id = reader.read_u32()?;
    let command = match kind {
        MessageKind::ListAll => Command::ListAll,
        MessageKind::ListVisible => Command::ListVisible,
        MessageKind::SubscribeAll => Command::SubscribeAll,
        MessageKind::UnsubscribeAll => Command::UnsubscribeAll,
        MessageKind::ListSome => Command::ListSome {
            filename: reader.read_string()?,
            ids: reader.read_u32_array()?,
        },
        MessageKind::SubscribeSome => Command::SubscribeSome {
            filename: reader.read_string()?,
            ids: reader.read_u32_array()?,
        },
        MessageKind::RefacetSome => Command::RefacetSome {
            filename: reader.read_string()?,
            ids: reader.read_u32_array()?,
            options: RefacetOptions::decode(&mut reader)?,
        },
        other => return Err(DecodeError::UnexpectedItem { kind: other }),
    };
    Ok((command, message_id))
}
