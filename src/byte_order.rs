//! Helpers for explicit little-endian conversions.
//!
//! Every multi-byte scalar on the live-link wire is little-endian. These
//! helpers keep Clippy expectations scoped to the conversion points so codec
//! code can remain explicit about wire endianness without repeating lint
//! annotations.

/// Serialise a `u32` in wire byte order (little-endian).
///
/// # Examples
///
/// ```
/// use livelink::byte_order::write_wire_u32;
///
/// assert_eq!(write_wire_u32(0x1234_5678), [0x78, 0x56, 0x34, 0x12]);
/// ```
#[must_use]
pub fn write_wire_u32(value: u32) -> [u8; 4] {
    #[expect(
        clippy::little_endian_bytes,
        reason = "The live-link wire format is little-endian."
    )]
    value.to_le_bytes()
}

/// Parse a wire-order `u32` from its on-wire representation.
///
/// # Examples
///
/// ```
/// use livelink::byte_order::read_wire_u32;
///
/// assert_eq!(read_wire_u32([0x78, 0x56, 0x34, 0x12]), 0x1234_5678);
/// ```
#[must_use]
pub fn read_wire_u32(bytes: [u8; 4]) -> u32 {
    #[expect(
        clippy::little_endian_bytes,
        reason = "The live-link wire format is little-endian."
    )]
    u32::from_le_bytes(bytes)
}

/// Serialise an `i32` in wire byte order.
///
/// # Examples
///
/// ```
/// use livelink::byte_order::write_wire_i32;
///
/// assert_eq!(write_wire_i32(-1), [0xff, 0xff, 0xff, 0xff]);
/// ```
#[must_use]
pub fn write_wire_i32(value: i32) -> [u8; 4] {
    #[expect(
        clippy::little_endian_bytes,
        reason = "The live-link wire format is little-endian."
    )]
    value.to_le_bytes()
}

/// Parse a wire-order `i32`.
#[must_use]
pub fn read_wire_i32(bytes: [u8; 4]) -> i32 {
    #[expect(
        clippy::little_endian_bytes,
        reason = "The live-link wire format is little-endian."
    )]
    i32::from_le_bytes(bytes)
}

/// Serialise an IEEE-754 `f32` in wire byte order.
///
/// # Examples
///
/// ```
/// use livelink::byte_order::write_wire_f32;
///
/// assert_eq!(write_wire_f32(1.0), [0x00, 0x00, 0x80, 0x3f]);
/// ```
#[must_use]
pub fn write_wire_f32(value: f32) -> [u8; 4] {
    #[expect(
        clippy::little_endian_bytes,
        reason = "The live-link wire format is little-endian."
    )]
    value.to_le_bytes()
}

/// Parse a wire-order IEEE-754 `f32`.
#[must_use]
pub fn read_wire_f32(bytes: [u8; 4]) -> f32 {
    #[expect(
        clippy::little_endian_bytes,
        reason = "The live-link wire format is little-endian."
    )]
    f32::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    //! Round-trip tests for wire byte-order conversion helpers.

    use rstest::rstest;

    use super::{
        read_wire_f32,
        read_wire_i32,
        read_wire_u32,
        write_wire_f32,
        write_wire_i32,
        write_wire_u32,
    };

    #[rstest]
    #[case::zero(0, [0, 0, 0, 0])]
    #[case::small(200, [200, 0, 0, 0])]
    #[case::max(u32::MAX, [0xff, 0xff, 0xff, 0xff])]
    fn u32_is_little_endian(#[case] value: u32, #[case] bytes: [u8; 4]) {
        assert_eq!(write_wire_u32(value), bytes);
        assert_eq!(read_wire_u32(bytes), value);
    }

    #[rstest]
    #[case::minus_one(-1, [0xff, 0xff, 0xff, 0xff])]
    #[case::min(i32::MIN, [0, 0, 0, 0x80])]
    #[case::positive(258, [2, 1, 0, 0])]
    fn i32_is_little_endian(#[case] value: i32, #[case] bytes: [u8; 4]) {
        assert_eq!(write_wire_i32(value), bytes);
        assert_eq!(read_wire_i32(bytes), value);
    }

    #[test]
    fn f32_preserves_bit_pattern() {
        for value in [0.0_f32, -0.0, 0.35, f32::MAX, f32::MIN_POSITIVE] {
            assert_eq!(
                read_wire_f32(write_wire_f32(value)).to_bits(),
                value.to_bits()
            );
        }
    }
}
