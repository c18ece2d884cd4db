//! Generated round-trips for object records and string fields.

use bytes::BytesMut;
use proptest::{prop_assert, prop_assert_eq, test_runner::TestCaseError};
use rstest::rstest;

use super::shared::{deterministic_runner, name_strategy, object_strategy};
use crate::codec::{
    DIGIT_PREFIX,
    NameOptions,
    WireWriter,
    decode_object_list,
    decode_scene_object,
    decode_string_field,
    display_name,
    encode_object_list,
    encode_string_field,
    padding_len,
};

#[rstest]
#[case(true, 192)]
#[case(false, 192)]
fn generated_objects_round_trip(#[case] id_suffix: bool, #[case] cases: u32) {
    let options = NameOptions { id_suffix };
    let mut runner = deterministic_runner(cases);

    runner
        .run(&object_strategy(options), |object| {
            let mut writer = WireWriter::new();
            object
                .encode(&mut writer)
                .map_err(|err| TestCaseError::fail(format!("encode failed: {err}")))?;

            let (decoded, offset) = decode_scene_object(writer.as_slice(), 0, options)
                .map_err(|err| TestCaseError::fail(format!("decode failed: {err}")))?;
            prop_assert_eq!(offset, writer.len());
            prop_assert_eq!(decoded.geometry.is_some(), decoded.kind.has_geometry());
            prop_assert_eq!(decoded, object);
            Ok(())
        })
        .expect("generated objects should round-trip");
}

#[test]
fn generated_object_lists_round_trip() {
    let options = NameOptions::default();
    let mut runner = deterministic_runner(64);
    let strategy = proptest::collection::vec(object_strategy(options), 0..6);

    runner
        .run(&strategy, |objects| {
            let mut writer = WireWriter::new();
            encode_object_list(&mut writer, &objects)
                .map_err(|err| TestCaseError::fail(format!("encode failed: {err}")))?;
            let (decoded, offset) = decode_object_list(writer.as_slice(), 0, options)
                .map_err(|err| TestCaseError::fail(format!("decode failed: {err}")))?;
            prop_assert_eq!(offset, writer.len());
            prop_assert_eq!(decoded, objects);
            Ok(())
        })
        .expect("generated object lists should round-trip");
}

#[test]
fn generated_names_follow_the_digit_rule() {
    let mut runner = deterministic_runner(256);
    let options = NameOptions { id_suffix: false };

    runner
        .run(&name_strategy(), |name| {
            let shown = display_name(&name, 1, options);
            if matches!(name.chars().next(), Some('0'..='9')) {
                prop_assert_eq!(shown, format!("{DIGIT_PREFIX}{name}"));
            } else {
                prop_assert_eq!(shown, name);
            }
            Ok(())
        })
        .expect("digit rule should hold for generated names");
}

#[test]
fn generated_strings_obey_the_padding_law() {
    let mut runner = deterministic_runner(256);

    runner
        .run(&".{0,40}", |value| {
            let mut dst = BytesMut::new();
            encode_string_field(&mut dst, &value)
                .map_err(|err| TestCaseError::fail(format!("encode failed: {err}")))?;
            let len = value.len();
            prop_assert_eq!(dst.len(), 4 + len + padding_len(len));
            prop_assert!((dst.len() - 4) % 4 == 0);

            let (decoded, offset) = decode_string_field(&dst, 0)
                .map_err(|err| TestCaseError::fail(format!("decode failed: {err}")))?;
            prop_assert_eq!(offset, dst.len());
            prop_assert_eq!(decoded, value);
            Ok(())
        })
        .expect("padding law should hold for generated strings");
}
