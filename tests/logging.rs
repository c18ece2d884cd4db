//! Log output of a live session, captured through the `log` bridge.

use std::{sync::Arc, time::Duration};

use livelink::{client::LiveLinkClient, message::MessageKind};
use livelink_testing::{Event, LoggerHandle, MockServer, RecordingHandler, frames, logger};
use log::Level;
use rstest::rstest;
use serial_test::serial;

const WAIT: Duration = Duration::from_secs(2);

fn find(records: &[(Level, String)], needle: &str) -> Option<Level> {
    records
        .iter()
        .find(|(_, message)| message.contains(needle))
        .map(|(level, _)| *level)
}

#[rstest]
#[tokio::test]
#[serial]
async fn session_events_are_logged_at_their_levels(mut logger: LoggerHandle) {
    let mut server = MockServer::start().await.expect("bind mock server");
    let handler = Arc::new(RecordingHandler::new());
    let client = LiveLinkClient::new(handler.clone());
    client.connect(&server.address()).await.expect("connect");
    assert!(server.wait_for_connections(1, WAIT).await);

    server.push(frames::raw(11, &[9, 0, 0, 0]));
    server.push_text("not binary");
    server.push(frames::failed(MessageKind::ListAll, 1, 500));
    server.push(frames::new_file("sentinel"));
    handler.wait_for(3, WAIT).await;
    client.disconnect().await;
    assert_eq!(handler.count(&Event::Disconnect), 1);

    let records = logger.drain();
    assert_eq!(find(&records, "connected"), Some(Level::Info));
    assert_eq!(find(&records, "dropping malformed frame"), Some(Level::Info));
    assert_eq!(find(&records, "ignoring unexpected text frame"), Some(Level::Warn));
    assert_eq!(find(&records, "request failed"), Some(Level::Warn));
    assert_eq!(find(&records, "disconnected"), Some(Level::Info));
}

#[rstest]
#[tokio::test]
#[serial]
async fn refused_connection_is_logged(mut logger: LoggerHandle) {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let client = LiveLinkClient::new(Arc::new(RecordingHandler::new()));
    assert!(client.connect(&addr.to_string()).await.is_err());

    let records = logger.drain();
    assert_eq!(find(&records, "connect failed"), Some(Level::Warn));
}
