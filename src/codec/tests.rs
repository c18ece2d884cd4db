//! Unit tests for the wire primitives.
//!
//! Covers the padding law, cursor advancement for scalars and arrays, and
//! rejection of declared lengths that overrun the buffer.

use bytes::BytesMut;
use rstest::rstest;

use super::*;

mod property;

#[test]
fn padding_law_holds_for_short_strings() {
    for len in 0..=64usize {
        let value = "x".repeat(len);
        let mut dst = BytesMut::new();
        encode_string_field(&mut dst, &value).expect("short strings encode");

        let pad = (4 - len % 4) % 4;
        assert_eq!(padding_len(len), pad, "padding for length {len}");
        assert_eq!(dst.len(), SCALAR_SIZE + len + pad);
        assert_eq!((dst.len() - SCALAR_SIZE) % 4, 0);
        assert!(dst[SCALAR_SIZE + len..].iter().all(|b| *b == 0));
    }
}

#[test]
fn padding_ignores_field_offset() {
    // One stray byte before the field: padding still follows the length.
    let buf = [0xaa, 2, 0, 0, 0, b'h', b'i', 0, 0, 9, 0, 0, 0];
    let (value, offset) = decode_string_field(&buf, 1).expect("decode");
    assert_eq!(value, "hi");
    assert_eq!(offset, 9);
    let mut reader = WireReader::at(&buf, offset);
    assert_eq!(reader.read_u32(), Ok(9));
}

#[test]
fn unsigned_reads_advance_four_bytes() {
    let buf = [1, 0, 0, 0, 2, 0, 0, 0];
    let mut reader = WireReader::new(&buf);
    assert_eq!(reader.read_u32(), Ok(1));
    assert_eq!(reader.offset(), 4);
    assert_eq!(reader.read_u32(), Ok(2));
    assert_eq!(reader.offset(), 8);
}

#[test]
fn signed_and_float_reads_advance_four_bytes() {
    let mut writer = WireWriter::new();
    writer.put_i32(-7);
    writer.put_f32(0.5);
    let bytes = writer.into_bytes();

    let mut reader = WireReader::new(&bytes);
    assert_eq!(reader.read_i32(), Ok(-7));
    assert_eq!(reader.offset(), 4);
    assert_eq!(reader.read_f32(), Ok(0.5));
    assert_eq!(reader.offset(), 8);
    assert!(reader.is_exhausted());
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(5)]
#[case(64)]
fn array_reads_advance_by_count(#[case] count: usize) {
    let ints: Vec<i32> = (0..count).map(|i| i32::try_from(i).expect("small") - 3).collect();
    let mut dst = BytesMut::new();
    encode_int32_array(&mut dst, &ints).expect("encode");

    let (decoded, offset) = decode_int32_array(&dst, 0).expect("decode");
    assert_eq!(decoded, ints);
    assert_eq!(offset, 4 + 4 * count);

    let floats = vec![1.5_f32; count];
    let mut dst = BytesMut::new();
    encode_float32_array(&mut dst, &floats).expect("encode");
    let (decoded, offset) = decode_float32_array(&dst, 0).expect("decode");
    assert_eq!(decoded, floats);
    assert_eq!(offset, 4 + 4 * count);
}

#[test]
fn overrunning_array_length_is_rejected() {
    // Declares three elements but carries one.
    let buf = [3, 0, 0, 0, 1, 0, 0, 0];
    assert_eq!(
        decode_int32_array(&buf, 0),
        Err(DecodeError::Truncated {
            offset: 4,
            needed: 12,
            available: 4,
        })
    );
}

#[test]
fn huge_declared_count_is_rejected_without_allocation() {
    let buf = [0xff, 0xff, 0xff, 0xff];
    let err = WireReader::new(&buf)
        .read_f32_triples()
        .expect_err("cannot satisfy u32::MAX triples");
    assert!(matches!(
        err,
        DecodeError::Truncated { .. } | DecodeError::LengthOverflow { .. }
    ));
}

#[test]
fn triple_arrays_count_elements_not_values() {
    let mut writer = WireWriter::new();
    writer
        .put_f32_triples("vertices", &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0])
        .expect("two triples");
    let bytes = writer.into_bytes();
    assert_eq!(&bytes[..4], &[2, 0, 0, 0]);

    let mut reader = WireReader::new(&bytes);
    assert_eq!(
        reader.read_f32_triples(),
        Ok(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0])
    );
    assert_eq!(reader.offset(), 4 + 24);
}

#[test]
fn triple_writer_rejects_partial_triples() {
    let mut writer = WireWriter::new();
    assert_eq!(
        writer.put_i32_triples("faces", &[0, 1]),
        Err(EncodeError::Stride {
            field: "faces",
            len: 2,
        })
    );
}

#[rstest]
#[case::empty(&[])]
#[case::partial(&[1, 0])]
fn short_header_is_a_decode_error(#[case] buf: &[u8]) {
    assert!(matches!(
        decode_message_kind(buf, 0),
        Err(DecodeError::Truncated { .. })
    ));
}

#[test]
fn message_kind_decodes_unknown_tags() {
    let buf = [77, 0, 0, 0];
    assert_eq!(
        decode_message_kind(&buf, 0),
        Ok((MessageKind::Unrecognized(77), 4))
    );
}

#[test]
fn invalid_utf8_is_reported_with_offset() {
    let buf = [2, 0, 0, 0, 0xff, 0xfe, 0, 0];
    assert_eq!(
        decode_string_field(&buf, 0),
        Err(DecodeError::InvalidUtf8 { offset: 4 })
    );
}

#[test]
fn missing_padding_is_truncation_for_inner_fields() {
    let buf = [1, 0, 0, 0, b'a'];
    assert!(matches!(
        decode_string_field(&buf, 0),
        Err(DecodeError::Truncated { .. })
    ));
    let mut reader = WireReader::new(&buf);
    assert_eq!(reader.read_trailing_string(), Ok("a".to_owned()));
    assert!(reader.is_exhausted());
}
