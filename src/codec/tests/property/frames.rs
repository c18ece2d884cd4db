//! Generated checks for malformed inbound frames.

use proptest::{
    collection::vec,
    prelude::{Just, Strategy, any},
    prop_assert,
    test_runner::TestCaseError,
};

use super::shared::{deterministic_runner, overrunning_transaction};
use crate::codec::{DecodeError, NameOptions, decode_frame};

#[test]
fn generated_overrunning_lengths_are_rejected() {
    let mut runner = deterministic_runner(160);
    let strategy = vec(any::<i32>(), 0..8).prop_flat_map(|carried| {
        let floor = u32::try_from(carried.len()).unwrap_or(u32::MAX) + 1;
        (floor..=u32::MAX, Just(carried))
    });

    runner
        .run(&strategy, |(declared, carried)| {
            let frame = overrunning_transaction(declared, &carried);
            match decode_frame(&frame, NameOptions::default()) {
                Err(err) => {
                    let overrun = matches!(
                        err,
                        DecodeError::Truncated { .. } | DecodeError::LengthOverflow { .. }
                    );
                    prop_assert!(overrun);
                }
                Ok(message) => {
                    return Err(TestCaseError::fail(format!(
                        "expected overrun to fail, got {message:?}"
                    )));
                }
            }
            Ok(())
        })
        .expect("overrunning declared lengths should be rejected");
}

#[test]
fn generated_truncations_never_panic() {
    let mut runner = deterministic_runner(256);
    let strategy = (vec(any::<u8>(), 0..96), 0usize..96);

    runner
        .run(&strategy, |(mut bytes, cut)| {
            // Leading tags spread over the kinds that carry bodies.
            if let Some(tag) = bytes.first_mut() {
                *tag = [0, 10, 11, 20, 21, 22, 26][usize::from(*tag) % 7];
            }
            bytes.truncate(cut);
            let _ = decode_frame(&bytes, NameOptions::default());
            Ok(())
        })
        .expect("decoding arbitrary bytes should never panic");
}
