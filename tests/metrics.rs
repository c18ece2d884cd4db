#![cfg(feature = "metrics")]
//! Metrics recorded by a live session.
//!
//! A current-thread runtime keeps every task on the test thread, so a
//! thread-local `DebuggingRecorder` sees them all.

use std::{sync::Arc, time::Duration};

use livelink::{
    client::LiveLinkClient,
    message::MessageKind,
    metrics::{CONNECTIONS_ACTIVE, Direction, FRAMES_DROPPED, FRAMES_TOTAL, REPLIES_FAILED, inc_frames},
};
use livelink_testing::{MockServer, RecordingHandler, frames};
use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use rstest::rstest;

const WAIT: Duration = Duration::from_secs(2);

/// Creates a debugging recorder and snapshotter for metrics testing.
fn debugging_recorder_setup() -> (Snapshotter, DebuggingRecorder) {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    (snapshotter, recorder)
}

fn counter(snapshotter: &Snapshotter, name: &str, direction: Option<&str>) -> u64 {
    snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .filter(|(key, ..)| key.key().name() == name)
        .filter(|(key, ..)| {
            direction.is_none_or(|d| key.key().labels().any(|l| l.key() == "direction" && l.value() == d))
        })
        .map(|(.., value)| match value {
            DebugValue::Counter(c) => c,
            _ => 0,
        })
        .sum()
}

#[rstest]
#[case(Direction::Inbound, "inbound")]
#[case(Direction::Outbound, "outbound")]
fn frame_metric_is_labelled_by_direction(#[case] direction: Direction, #[case] label: &str) {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || inc_frames(direction));
    assert_eq!(counter(&snapshotter, FRAMES_TOTAL, Some(label)), 1);
}

#[test]
fn session_records_frames_drops_and_failures() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime");

    metrics::with_local_recorder(&recorder, || {
        runtime.block_on(async {
            let mut server = MockServer::start().await.expect("bind mock server");
            let handler = Arc::new(RecordingHandler::new());
            let client = LiveLinkClient::new(handler.clone());
            client.connect(&server.address()).await.expect("connect");
            assert!(server.wait_for_connections(1, WAIT).await);

            client.list_all().await.expect("sent");
            server.push(frames::raw(0, &[200, 0, 0, 0]));
            server.push(frames::failed(MessageKind::RefacetSome, 1, 404));
            server.push(frames::new_file("done"));
            handler.wait_for(3, WAIT).await;

            let gauge = snapshotter
                .snapshot()
                .into_vec()
                .into_iter()
                .find(|(key, ..)| key.key().name() == CONNECTIONS_ACTIVE)
                .map(|(.., value)| value);
            assert!(matches!(gauge, Some(DebugValue::Gauge(g)) if g.into_inner() == 1.0));

            client.disconnect().await;
        });
    });

    assert_eq!(counter(&snapshotter, FRAMES_TOTAL, Some("outbound")), 1);
    assert_eq!(counter(&snapshotter, FRAMES_TOTAL, Some("inbound")), 3);
    assert_eq!(counter(&snapshotter, FRAMES_DROPPED, None), 1);
    assert_eq!(counter(&snapshotter, REPLIES_FAILED, None), 1);
}
