//! Shared proptest helpers for codec property tests.

use proptest::{
    collection::vec,
    prelude::{Just, Strategy, any, prop_oneof},
    test_runner::{Config as ProptestConfig, RngAlgorithm, TestRng, TestRunner},
};

use crate::{
    codec::{MeshGeometry, NameOptions, ObjectFlags, SceneObject, WireWriter, display_name},
    message::{MessageKind, ObjectKind},
};

pub fn deterministic_runner(cases: u32) -> TestRunner {
    let config = ProptestConfig {
        cases,
        ..ProptestConfig::default()
    };
    let rng = TestRng::deterministic_rng(RngAlgorithm::ChaCha);
    TestRunner::new_with_rng(config, rng)
}

/// Finite floats only; NaN would break equality on the decoded side.
fn finite() -> impl Strategy<Value = f32> + Clone { -1.0e6_f32..1.0e6_f32 }

fn triples<T: std::fmt::Debug>(
    element: impl Strategy<Value = T> + Clone,
    max: usize,
) -> impl Strategy<Value = Vec<T>> {
    (0..=max).prop_flat_map(move |count| vec(element.clone(), count * 3))
}

pub fn geometry_strategy() -> impl Strategy<Value = MeshGeometry> {
    (
        triples(finite(), 8),
        triples(any::<i32>(), 8),
        triples(finite(), 8),
        vec(any::<i32>(), 0..6),
        vec(any::<i32>(), 0..6),
    )
        .prop_map(|(vertices, faces, normals, groups, face_ids)| MeshGeometry {
            vertices,
            faces,
            normals,
            groups,
            face_ids,
        })
}

pub fn kind_strategy() -> impl Strategy<Value = ObjectKind> {
    prop_oneof![
        Just(ObjectKind::Solid),
        Just(ObjectKind::Sheet),
        Just(ObjectKind::Wire),
        Just(ObjectKind::Group),
        Just(ObjectKind::Empty),
        (7u32..100).prop_map(ObjectKind::Other),
    ]
}

/// Names drawn from a mix of empty, digit-leading and ordinary shapes.
pub fn name_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "[0-9][a-zA-Z0-9 ]{0,8}",
        "[½ⅫⅣ四٣²][a-zA-Z0-9 ]{0,8}",
        "[a-zA-Z_][a-zA-Z0-9_ .]{0,16}",
        ".{0,6}",
    ]
}

pub fn object_strategy(options: NameOptions) -> impl Strategy<Value = SceneObject> {
    (
        kind_strategy(),
        any::<u32>(),
        any::<u32>(),
        any::<i32>(),
        any::<i32>(),
        any::<u32>(),
        name_strategy(),
        geometry_strategy(),
    )
        .prop_map(
            move |(kind, id, version, parent_id, material_id, flags, name, geometry)| SceneObject {
                kind,
                id,
                version,
                parent_id,
                material_id,
                flags: ObjectFlags(flags),
                display_name: display_name(&name, id, options),
                name,
                geometry: kind.has_geometry().then_some(geometry),
            },
        )
}

/// A transaction frame whose first `Delete` item declares more ids than the
/// frame carries.
pub fn overrunning_transaction(declared: u32, carried: &[i32]) -> Vec<u8> {
    let mut item = WireWriter::new();
    item.put_kind(MessageKind::Delete);
    item.put_u32(declared);
    carried.iter().for_each(|id| item.put_i32(*id));

    let mut frame = WireWriter::new();
    frame.put_kind(MessageKind::Transaction);
    frame.put_string("f").expect("filename");
    frame.put_u32(1);
    frame.put_u32(1);
    frame
        .put_length_prefixed(item.as_slice())
        .expect("short item");
    frame.as_slice().to_vec()
}
