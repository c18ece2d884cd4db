//! Closed tag types carried on the live-link wire.
//!
//! Each enum maps a 32-bit wire value to a variant. Values the client does
//! not understand map to an explicit `Unrecognized`/`Other` variant rather
//! than failing, so servers can add kinds without breaking older clients.

use std::fmt;

use crate::codec::DecodeError;

/// Leading tag of every frame and of every nested transaction item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Incremental batch of changes for one file version.
    Transaction,
    /// Nested: objects added in a transaction.
    Add,
    /// Nested: objects replaced in a transaction.
    Update,
    /// Nested: object ids removed in a transaction.
    Delete,
    /// Nested: reparenting notice. Recognised but not decoded.
    Move,
    /// Nested: attribute change notice. Recognised but not decoded.
    Attribute,
    /// The server saved a new version of the open file.
    NewVersion,
    /// The server opened a different file.
    NewFile,
    /// Request (and reply) for every object in the file.
    ListAll,
    /// Request (and reply) for selected object ids.
    ListSome,
    /// Request (and reply) for visible objects only.
    ListVisible,
    /// Subscribe to incremental transactions for the whole file.
    SubscribeAll,
    /// Subscribe to incremental transactions for selected ids.
    SubscribeSome,
    /// Cancel every subscription.
    UnsubscribeAll,
    /// Request (and reply) for remeshed geometry.
    RefacetSome,
    /// A tag this client does not know.
    Unrecognized(u32),
}

impl MessageKind {
    /// Map a wire value to a kind; unknown values become
    /// [`MessageKind::Unrecognized`].
    ///
    /// # Examples
    ///
    /// ```
    /// use livelink::message::MessageKind;
    ///
    /// assert_eq!(MessageKind::from_wire(0), MessageKind::Transaction);
    /// assert_eq!(MessageKind::from_wire(99), MessageKind::Unrecognized(99));
    /// ```
    #[must_use]
    pub const fn from_wire(value: u32) -> Self {
        match value {
            0 => Self::Transaction,
            1 => Self::Add,
            2 => Self::Update,
            3 => Self::Delete,
            4 => Self::Move,
            5 => Self::Attribute,
            10 => Self::NewVersion,
            11 => Self::NewFile,
            20 => Self::ListAll,
            21 => Self::ListSome,
            22 => Self::ListVisible,
            23 => Self::SubscribeAll,
            24 => Self::SubscribeSome,
            25 => Self::UnsubscribeAll,
            26 => Self::RefacetSome,
            other => Self::Unrecognized(other),
        }
    }

    /// Wire value of this kind.
    #[must_use]
    pub const fn to_wire(self) -> u32 {
        match self {
            Self::Transaction => 0,
            Self::Add => 1,
            Self::Update => 2,
            Self::Delete => 3,
            Self::Move => 4,
            Self::Attribute => 5,
            Self::NewVersion => 10,
            Self::NewFile => 11,
            Self::ListAll => 20,
            Self::ListSome => 21,
            Self::ListVisible => 22,
            Self::SubscribeAll => 23,
            Self::SubscribeSome => 24,
            Self::UnsubscribeAll => 25,
            Self::RefacetSome => 26,
            Self::Unrecognized(other) => other,
        }
    }

    /// Returns `true` for list replies, which share the transaction layout.
    #[must_use]
    pub const fn is_list(self) -> bool {
        matches!(self, Self::ListAll | Self::ListSome | Self::ListVisible)
    }
}

impl TryFrom<u32> for MessageKind {
    type Error = DecodeError;

    /// Strict conversion for callers that must reject unknown tags.
    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match Self::from_wire(value) {
            Self::Unrecognized(tag) => Err(DecodeError::UnknownMessageKind(tag)),
            kind => Ok(kind),
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unrecognized(tag) => write!(f, "unrecognized({tag})"),
            known => write!(f, "{known:?}"),
        }
    }
}

/// Kind of a remote scene entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    /// Closed solid body; carries mesh geometry.
    Solid,
    /// Open sheet body; carries mesh geometry.
    Sheet,
    /// Curve or wire body.
    Wire,
    /// Grouping node.
    Group,
    /// Empty placeholder node.
    Empty,
    /// Any value this client does not understand.
    Other(u32),
}

impl ObjectKind {
    /// Map a wire value to an object kind.
    #[must_use]
    pub const fn from_wire(value: u32) -> Self {
        match value {
            0 => Self::Solid,
            1 => Self::Sheet,
            2 => Self::Wire,
            5 => Self::Group,
            6 => Self::Empty,
            other => Self::Other(other),
        }
    }

    /// Wire value of this kind.
    #[must_use]
    pub const fn to_wire(self) -> u32 {
        match self {
            Self::Solid => 0,
            Self::Sheet => 1,
            Self::Wire => 2,
            Self::Group => 5,
            Self::Empty => 6,
            Self::Other(other) => other,
        }
    }

    /// Only solids and sheets carry geometry on the wire.
    ///
    /// # Examples
    ///
    /// ```
    /// use livelink::message::ObjectKind;
    ///
    /// assert!(ObjectKind::Sheet.has_geometry());
    /// assert!(!ObjectKind::Group.has_geometry());
    /// ```
    #[must_use]
    pub const fn has_geometry(self) -> bool { matches!(self, Self::Solid | Self::Sheet) }
}

/// Polygon shape constraint requested from the remesher.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FacetShape {
    /// No constraint.
    Any,
    /// Cut polygons; the default.
    #[default]
    Cut,
    /// Convex polygons only.
    Convex,
}

impl FacetShape {
    /// Wire value of this shape.
    #[must_use]
    pub const fn to_wire(self) -> u32 {
        match self {
            Self::Any => 20500,
            Self::Cut => 20501,
            Self::Convex => 20502,
        }
    }

    /// Map a wire value back to a shape, if known.
    #[must_use]
    pub const fn from_wire(value: u32) -> Option<Self> {
        match value {
            20500 => Some(Self::Any),
            20501 => Some(Self::Cut),
            20502 => Some(Self::Convex),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{FacetShape, MessageKind, ObjectKind};
    use crate::codec::DecodeError;

    #[rstest]
    #[case(MessageKind::Transaction, 0)]
    #[case(MessageKind::Delete, 3)]
    #[case(MessageKind::NewFile, 11)]
    #[case(MessageKind::ListVisible, 22)]
    #[case(MessageKind::RefacetSome, 26)]
    fn message_kind_wire_values(#[case] kind: MessageKind, #[case] value: u32) {
        assert_eq!(kind.to_wire(), value);
        assert_eq!(MessageKind::from_wire(value), kind);
    }

    #[test]
    fn unknown_message_kind_is_not_fatal() {
        assert_eq!(MessageKind::from_wire(7), MessageKind::Unrecognized(7));
        assert_eq!(MessageKind::Unrecognized(7).to_wire(), 7);
        assert!(matches!(
            MessageKind::try_from(7),
            Err(DecodeError::UnknownMessageKind(7))
        ));
    }

    #[rstest]
    #[case(0, ObjectKind::Solid, true)]
    #[case(1, ObjectKind::Sheet, true)]
    #[case(2, ObjectKind::Wire, false)]
    #[case(5, ObjectKind::Group, false)]
    #[case(6, ObjectKind::Empty, false)]
    #[case(3, ObjectKind::Other(3), false)]
    fn object_kind_gates_geometry(
        #[case] value: u32,
        #[case] kind: ObjectKind,
        #[case] geometry: bool,
    ) {
        assert_eq!(ObjectKind::from_wire(value), kind);
        assert_eq!(kind.has_geometry(), geometry);
    }

    #[test]
    fn facet_shape_defaults_to_cut() {
        assert_eq!(FacetShape::default(), FacetShape::Cut);
        assert_eq!(FacetShape::from_wire(20502), Some(FacetShape::Convex));
        assert_eq!(FacetShape::from_wire(1), None);
    }
}
