use chrono::{TimeZone, Utc};
use serde_json::json;
use url::Url;
use uuid::Uuid;

use super::buffer::FeedBuffer;
use super::connection::{FeedConnection, SignalOutcome, build_filter};
use super::event::FeedEvent;
use super::mock::MockTransport;
use super::transport::{ConnectionStatus, StreamSignal};
use crate::utils::error::{StreamDecodeError, StreamTransportError};

fn event(id: &str) -> FeedEvent {
    FeedEvent::new(
        "orders",
        id,
        format!("payload {id}"),
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
    )
}

fn topics(names: &[&str]) -> Vec<String> {
    names.iter().map(|t| t.to_string()).collect()
}

fn connection() -> (FeedConnection<MockTransport>, MockTransport) {
    let transport = MockTransport::new();
    let endpoint = Url::parse("http://pubsub.test/sse").unwrap();
    let (connection, _signals) = FeedConnection::new(transport.clone(), endpoint);
    (connection, transport)
}

fn wire(topic: &str, id: &str, data: &str) -> String {
    json!({
        "topic_name": topic,
        "message": { "id": id, "data": data, "created": "2024-01-01T00:00:00Z" }
    })
    .to_string()
}

// ---- FeedBuffer ----

#[test]
fn test_buffer_evicts_oldest() {
    let mut buffer = FeedBuffer::new(2);
    buffer.insert(event("1"));
    buffer.insert(event("2"));
    buffer.insert(event("3"));

    assert_eq!(buffer.contents(), vec![event("3"), event("2")]);
}

#[test]
fn test_buffer_never_exceeds_capacity() {
    for capacity in [1, 5, 20] {
        let mut buffer = FeedBuffer::new(capacity);
        for i in 0..50 {
            buffer.insert(event(&i.to_string()));
            assert!(buffer.len() <= capacity);
            let ids: Vec<i32> = buffer
                .iter()
                .map(|e| e.message_id.parse().unwrap())
                .collect();
            assert!(ids.windows(2).all(|w| w[0] > w[1]), "newest first");
        }
        assert_eq!(buffer.len(), capacity);
    }
}

#[test]
fn test_buffer_keeps_duplicates() {
    let mut buffer = FeedBuffer::new(5);
    buffer.insert(event("7"));
    buffer.insert(event("7"));
    assert_eq!(buffer.len(), 2);
}

#[test]
fn test_buffer_zero_capacity_holds_nothing() {
    let mut buffer = FeedBuffer::new(0);
    buffer.insert(event("1"));
    assert!(buffer.is_empty());
}

#[test]
fn test_buffer_unbounded_capacity_grows_on_demand() {
    let mut buffer = FeedBuffer::new(usize::MAX);
    buffer.insert(event("1"));
    buffer.insert(event("2"));

    assert_eq!(buffer.len(), 2);
    assert_eq!(buffer.capacity(), usize::MAX);
    assert_eq!(buffer.contents()[0].message_id, "2");
}

#[test]
fn test_buffer_contents_is_a_copy() {
    let mut buffer = FeedBuffer::new(3);
    buffer.insert(event("1"));
    let before = buffer.contents();
    buffer.insert(event("2"));
    buffer.clear();

    assert_eq!(before, vec![event("1")]);
    assert!(buffer.is_empty());
    assert_eq!(buffer.capacity(), 3);
}

// ---- FeedEvent decoding ----

#[test]
fn test_decode_backend_event() {
    let decoded = FeedEvent::decode(&wire("orders", "7", "hello")).unwrap();
    assert_eq!(
        decoded,
        FeedEvent::new(
            "orders",
            "7",
            "hello",
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        )
    );
}

#[test]
fn test_decode_accepts_numeric_id_and_structured_data() {
    let raw = json!({
        "topic_name": "metrics",
        "message": { "id": 12, "data": {"cpu": 0.5}, "created": 1704067200000i64 }
    })
    .to_string();

    let decoded = FeedEvent::decode(&raw).unwrap();
    assert_eq!(decoded.message_id, "12");
    assert_eq!(decoded.payload, r#"{"cpu":0.5}"#);
    assert_eq!(
        decoded.created_at,
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    );
}

#[test]
fn test_decode_accepts_offset_and_epoch_strings() {
    let offset = json!({
        "topic_name": "t",
        "message": { "id": "1", "data": "x", "created": "2024-01-01T02:00:00+02:00" }
    })
    .to_string();
    let epoch = json!({
        "topic_name": "t",
        "message": { "id": "1", "data": "x", "created": "1704067200000" }
    })
    .to_string();

    let expected = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    assert_eq!(FeedEvent::decode(&offset).unwrap().created_at, expected);
    assert_eq!(FeedEvent::decode(&epoch).unwrap().created_at, expected);
}

#[test]
fn test_decode_rejects_malformed_payloads() {
    assert!(matches!(
        FeedEvent::decode("not json"),
        Err(StreamDecodeError::Json(_))
    ));

    let no_topic = json!({
        "message": { "id": "1", "data": "x", "created": "2024-01-01T00:00:00Z" }
    })
    .to_string();
    assert!(matches!(
        FeedEvent::decode(&no_topic),
        Err(StreamDecodeError::MissingField("topic_name"))
    ));

    let empty_created = json!({
        "topic_name": "t",
        "message": { "id": "1", "data": "x", "created": "" }
    })
    .to_string();
    assert!(matches!(
        FeedEvent::decode(&empty_created),
        Err(StreamDecodeError::BadTimestamp(_))
    ));
}

#[test]
fn test_event_display_shows_card_fields() {
    assert_eq!(
        event("7").to_string(),
        "[orders] #7 payload 7 (created 2024-01-01T00:00:00.000Z)"
    );
}

// ---- filter ----

#[test]
fn test_filter_encodes_each_topic() {
    let filter = build_filter(&topics(&["a", "b c"]));
    assert_eq!(filter, "topic=a&topic=b%20c");
    assert!(!filter.ends_with('&'));
}

#[test]
fn test_filter_escapes_reserved_characters() {
    assert_eq!(
        build_filter(&topics(&["a&b=c", "ü/x", "keep-_.!~*'()"])),
        "topic=a%26b%3Dc&topic=%C3%BC%2Fx&topic=keep-_.!~*'()"
    );
    assert_eq!(build_filter(&[]), "");
}

// ---- FeedConnection ----

#[test]
fn test_resync_opens_filtered_connection() {
    let (mut conn, transport) = connection();
    conn.resync(&topics(&["orders", "b c"]));

    let opened = transport.opened();
    assert_eq!(opened.len(), 1);
    assert_eq!(
        opened[0].url.as_str(),
        "http://pubsub.test/sse?topic=orders&topic=b%20c"
    );
    assert_eq!(conn.status(), ConnectionStatus::Connecting);
    assert_eq!(conn.snapshot(), Some(&topics(&["orders", "b c"])[..]));
    assert_eq!(conn.filter(), Some("topic=orders&topic=b%20c"));
}

#[test]
fn test_resync_closes_before_opening() {
    let (mut conn, transport) = connection();
    let selections = [
        topics(&["a"]),
        topics(&["a", "b"]),
        topics(&["b"]),
        topics(&[]),
        topics(&["c"]),
        topics(&["c", "a"]),
    ];
    for snapshot in &selections {
        conn.resync(snapshot);
        assert!(transport.live_count() <= 1);
    }

    assert_eq!(transport.max_live_at_open(), 0);
    assert_eq!(transport.opened().len(), 5);
    assert_eq!(transport.live_count(), 1);
}

#[test]
fn test_empty_snapshot_leaves_no_connection() {
    let (mut conn, transport) = connection();
    conn.resync(&topics(&["orders"]));
    conn.resync(&[]);

    assert!(!conn.is_live());
    assert_eq!(conn.status(), ConnectionStatus::Closed);
    assert_eq!(transport.live_count(), 0);
    assert_eq!(transport.opened().len(), 1);
}

#[test]
fn test_close_errors_do_not_block_resync() {
    let (mut conn, transport) = connection();
    conn.resync(&topics(&["a"]));
    transport.fail_closes();

    conn.resync(&topics(&["a", "b"]));

    assert_eq!(transport.opened().len(), 2);
    assert_eq!(transport.live_count(), 1);
    assert_eq!(conn.snapshot(), Some(&topics(&["a", "b"])[..]));
}

#[test]
fn test_close_is_valid_while_connecting_and_open() {
    let (mut conn, transport) = connection();
    conn.resync(&topics(&["a"]));
    assert_eq!(conn.status(), ConnectionStatus::Connecting);
    conn.resync(&topics(&["b"]));

    let mut buffer = FeedBuffer::new(5);
    let id = conn.live_id().unwrap();
    conn.handle_signal(StreamSignal::Opened { id }, &mut buffer);
    assert_eq!(conn.status(), ConnectionStatus::Open);
    conn.resync(&topics(&["c"]));

    assert_eq!(transport.max_live_at_open(), 0);
    assert_eq!(transport.live_count(), 1);
}

#[test]
fn test_live_messages_fill_buffer() {
    let (mut conn, _) = connection();
    let mut buffer = FeedBuffer::new(5);
    conn.resync(&topics(&["orders"]));
    let id = conn.live_id().unwrap();

    assert_eq!(
        conn.handle_signal(StreamSignal::Opened { id }, &mut buffer),
        SignalOutcome::Opened
    );
    let outcome = conn.handle_signal(
        StreamSignal::Message {
            id,
            data: wire("orders", "7", "hello"),
        },
        &mut buffer,
    );

    assert!(matches!(outcome, SignalOutcome::Inserted(ref e) if e.message_id == "7"));
    assert_eq!(buffer.len(), 1);
    assert_eq!(buffer.contents()[0].payload, "hello");
}

#[test]
fn test_malformed_message_is_dropped() {
    let (mut conn, _) = connection();
    let mut buffer = FeedBuffer::new(5);
    conn.resync(&topics(&["orders"]));
    let id = conn.live_id().unwrap();

    let outcome = conn.handle_signal(
        StreamSignal::Message {
            id,
            data: "{\"topic_name\":".to_string(),
        },
        &mut buffer,
    );

    assert_eq!(outcome, SignalOutcome::Dropped);
    assert!(buffer.is_empty());
    assert!(conn.is_live());
}

#[test]
fn test_stale_connection_signals_are_ignored() {
    let (mut conn, _) = connection();
    let mut buffer = FeedBuffer::new(5);
    conn.resync(&topics(&["orders"]));
    let stale = conn.live_id().unwrap();
    conn.resync(&topics(&["orders", "alerts"]));

    let outcome = conn.handle_signal(
        StreamSignal::Message {
            id: stale,
            data: wire("orders", "1", "late"),
        },
        &mut buffer,
    );
    assert_eq!(outcome, SignalOutcome::Ignored);

    let unknown = conn.handle_signal(StreamSignal::Opened { id: Uuid::new_v4() }, &mut buffer);
    assert_eq!(unknown, SignalOutcome::Ignored);
    assert!(buffer.is_empty());
    assert_eq!(conn.status(), ConnectionStatus::Connecting);
}

#[test]
fn test_transport_error_keeps_failed_handle_until_resync() {
    let (mut conn, transport) = connection();
    let mut buffer = FeedBuffer::new(5);
    conn.resync(&topics(&["orders"]));
    let id = conn.live_id().unwrap();
    conn.handle_signal(StreamSignal::Opened { id }, &mut buffer);

    let error = StreamTransportError::Stream("reset by peer".to_string());
    let outcome = conn.handle_signal(
        StreamSignal::Error {
            id,
            error: error.clone(),
        },
        &mut buffer,
    );
    assert_eq!(outcome, SignalOutcome::Failed(error));
    assert_eq!(conn.status(), ConnectionStatus::Failed);
    assert_eq!(conn.live_id(), Some(id));

    // A transport-level reconnect does not clear the failure.
    conn.handle_signal(StreamSignal::Opened { id }, &mut buffer);
    assert_eq!(conn.status(), ConnectionStatus::Failed);
    assert_eq!(transport.opened().len(), 1);

    conn.resync(&topics(&["orders"]));
    assert_eq!(conn.status(), ConnectionStatus::Connecting);
}

#[test]
fn test_dropping_connection_closes_it() {
    let (mut conn, transport) = connection();
    conn.resync(&topics(&["orders"]));
    drop(conn);
    assert_eq!(transport.live_count(), 0);
}
