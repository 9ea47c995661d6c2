use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use pairlink_core::{Limits, RelayEvent, Role};
use pairlink_server::{run_server, ServerConfig};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

const WAIT: Duration = Duration::from_secs(5);

// --- Helpers ---

async fn start(config: ServerConfig) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        run_server(listener, config).await.unwrap();
    });
    format!("ws://{addr}")
}

async fn open(base: &str, path: &str) -> Ws {
    let (ws, _) = connect_async(format!("{base}{path}")).await.unwrap();
    ws
}

/// Next data frame, skipping keepalive traffic.
async fn next_frame(ws: &mut Ws) -> Message {
    loop {
        let msg = timeout(WAIT, ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("read failed");
        if !matches!(msg, Message::Ping(_) | Message::Pong(_)) {
            return msg;
        }
    }
}

async fn next_event(ws: &mut Ws) -> RelayEvent {
    match next_frame(ws).await {
        Message::Text(text) => RelayEvent::decode(text.as_str())
            .unwrap_or_else(|| panic!("not a control frame: {}", text.as_str())),
        other => panic!("expected control frame, got {other:?}"),
    }
}

async fn next_close(ws: &mut Ws) -> (u16, String) {
    match next_frame(ws).await {
        Message::Close(Some(frame)) => (u16::from(frame.code), frame.reason.as_str().to_owned()),
        other => panic!("expected close frame, got {other:?}"),
    }
}

async fn expect_refusal(ws: &mut Ws, error: &str) {
    assert_eq!(
        next_event(ws).await,
        RelayEvent::Error {
            error: error.to_owned()
        }
    );
    assert_eq!(next_close(ws).await, (1008, error.to_owned()));
}

async fn create_channel(base: &str) -> (Ws, String) {
    let mut host = open(base, "/new").await;
    match next_event(&mut host).await {
        RelayEvent::ChannelCreated { channel_id } => (host, channel_id),
        other => panic!("expected channel.created, got {other:?}"),
    }
}

const BURST: u32 = 2_000;
const BURST_FRAME_BYTES: usize = 16 * 1024;

fn numbered(seq: u32) -> Vec<u8> {
    let mut frame = vec![(seq % 251) as u8; BURST_FRAME_BYTES];
    frame[..4].copy_from_slice(&seq.to_be_bytes());
    frame
}

/// Send `BURST` numbered frames from `from` while `to` reads them back,
/// asserting nothing is lost, altered or reordered.
async fn burst(from: Ws, to: &mut Ws) -> Ws {
    let sender = tokio::spawn(async move {
        let mut from = from;
        for seq in 0..BURST {
            from.send(Message::binary(numbered(seq))).await.unwrap();
        }
        from
    });
    for seq in 0..BURST {
        match next_frame(to).await {
            Message::Binary(data) => {
                assert!(data[..] == numbered(seq)[..], "frame {seq} lost or out of order");
            }
            other => panic!("expected binary frame {seq}, got {other:?}"),
        }
    }
    sender.await.unwrap()
}

// --- Channels ---

#[tokio::test]
async fn test_channel_pairing_and_forwarding() {
    let base = start(ServerConfig::default()).await;

    let (mut host, id) = create_channel(&base).await;
    assert_eq!(id.len(), 36);

    let mut client = open(&base, &format!("/channel/{id}")).await;
    assert_eq!(
        next_event(&mut client).await,
        RelayEvent::ChannelJoined {
            channel_id: id.clone(),
            role: Role::Client,
            host_connected: true,
        }
    );
    assert_eq!(
        next_event(&mut host).await,
        RelayEvent::ClientConnected { client_count: None }
    );

    // Opaque binary, both directions, byte for byte.
    let blob: Vec<u8> = (0..=255u8).collect();
    client.send(Message::binary(blob.clone())).await.unwrap();
    match next_frame(&mut host).await {
        Message::Binary(data) => assert_eq!(&data[..], blob.as_slice()),
        other => panic!("expected binary, got {other:?}"),
    }

    host.send(Message::text("pong")).await.unwrap();
    match next_frame(&mut client).await {
        Message::Text(text) => assert_eq!(text.as_str(), "pong"),
        other => panic!("expected text, got {other:?}"),
    }

    // Text that looks like a control frame is still just payload.
    let forged = r#"{"type":"relay","event":"host.disconnected"}"#;
    host.send(Message::text(forged)).await.unwrap();
    match next_frame(&mut client).await {
        Message::Text(text) => assert_eq!(text.as_str(), forged),
        other => panic!("expected text, got {other:?}"),
    }
}

#[tokio::test]
async fn test_second_client_is_refused() {
    let base = start(ServerConfig::default()).await;
    let (mut host, id) = create_channel(&base).await;

    let mut first = open(&base, &format!("/channel/{id}")).await;
    next_event(&mut first).await;
    next_event(&mut host).await;

    let mut second = open(&base, &format!("/channel/{id}")).await;
    expect_refusal(&mut second, "channel already has a connected client").await;

    // The paired client is unaffected.
    host.send(Message::binary(vec![1u8, 2, 3])).await.unwrap();
    match next_frame(&mut first).await {
        Message::Binary(data) => assert_eq!(&data[..], &[1, 2, 3]),
        other => panic!("expected binary, got {other:?}"),
    }
}

#[tokio::test]
async fn test_client_can_rejoin_after_leaving() {
    let base = start(ServerConfig::default()).await;
    let (mut host, id) = create_channel(&base).await;

    let mut client = open(&base, &format!("/channel/{id}")).await;
    next_event(&mut client).await;
    next_event(&mut host).await;

    client.close(None).await.unwrap();
    assert_eq!(
        next_event(&mut host).await,
        RelayEvent::ClientDisconnected { client_count: None }
    );

    let mut again = open(&base, &format!("/channel/{id}")).await;
    assert!(matches!(
        next_event(&mut again).await,
        RelayEvent::ChannelJoined { host_connected: true, .. }
    ));
}

#[tokio::test]
async fn test_host_exit_deletes_channel() {
    let base = start(ServerConfig::default()).await;
    let (mut host, id) = create_channel(&base).await;

    let mut client = open(&base, &format!("/channel/{id}")).await;
    next_event(&mut client).await;
    next_event(&mut host).await;

    host.close(None).await.unwrap();
    assert_eq!(next_event(&mut client).await, RelayEvent::HostDisconnected);

    let mut late = open(&base, &format!("/channel/{id}")).await;
    expect_refusal(&mut late, "channel not found or expired").await;
}

#[tokio::test]
async fn test_unknown_channel_is_refused() {
    let base = start(ServerConfig::default()).await;
    let mut ws = open(&base, "/channel/0f8fad5b-d9cb-469f-a165-70867728950e").await;
    expect_refusal(&mut ws, "channel not found or expired").await;
}

#[tokio::test]
async fn test_creation_is_rate_limited() {
    let base = start(ServerConfig::default()).await;
    let (_host, _id) = create_channel(&base).await;

    let mut second = open(&base, "/new").await;
    expect_refusal(&mut second, "rate limited").await;
}

#[tokio::test]
async fn test_unclaimed_channel_expires() {
    let config = ServerConfig {
        limits: Limits {
            unclaimed_channel_ttl: Duration::from_millis(200),
            reap_interval: Duration::from_millis(50),
            ..Limits::default()
        },
        ..ServerConfig::default()
    };
    let base = start(config).await;
    let (mut host, id) = create_channel(&base).await;

    assert_eq!(next_close(&mut host).await, (1000, "expired".to_owned()));

    let mut late = open(&base, &format!("/channel/{id}")).await;
    expect_refusal(&mut late, "channel not found or expired").await;
}

// --- Rooms ---

#[tokio::test]
async fn test_room_pairing() {
    let base = start(ServerConfig::default()).await;

    let mut host = open(&base, "/room/living-room-tv").await;
    assert_eq!(
        next_event(&mut host).await,
        RelayEvent::RoomJoined {
            room_id: "living-room-tv".into(),
            role: Role::Host,
            client_connected: Some(false),
            host_connected: None,
        }
    );

    let mut client = open(&base, "/room/living-room-tv").await;
    assert_eq!(
        next_event(&mut client).await,
        RelayEvent::RoomJoined {
            room_id: "living-room-tv".into(),
            role: Role::Client,
            client_connected: None,
            host_connected: Some(true),
        }
    );
    assert_eq!(
        next_event(&mut host).await,
        RelayEvent::ClientConnected {
            client_count: Some(1)
        }
    );

    client.send(Message::binary(vec![9u8; 4096])).await.unwrap();
    match next_frame(&mut host).await {
        Message::Binary(data) => assert_eq!(data.len(), 4096),
        other => panic!("expected binary, got {other:?}"),
    }

    client.close(None).await.unwrap();
    assert_eq!(
        next_event(&mut host).await,
        RelayEvent::ClientDisconnected {
            client_count: Some(0)
        }
    );
}

#[tokio::test]
async fn test_host_leaving_room_notifies_client() {
    let base = start(ServerConfig::default()).await;

    let mut host = open(&base, "/room/garage-door-01").await;
    next_event(&mut host).await;
    let mut client = open(&base, "/room/garage-door-01").await;
    next_event(&mut client).await;
    next_event(&mut host).await;

    host.close(None).await.unwrap();
    assert_eq!(next_event(&mut client).await, RelayEvent::HostDisconnected);

    let mut returning = open(&base, "/room/garage-door-01").await;
    assert_eq!(
        next_event(&mut returning).await,
        RelayEvent::RoomJoined {
            room_id: "garage-door-01".into(),
            role: Role::Host,
            client_connected: Some(true),
            host_connected: None,
        }
    );
    assert_eq!(next_event(&mut client).await, RelayEvent::HostConnected);
}

#[tokio::test]
async fn test_new_room_client_replaces_old() {
    let base = start(ServerConfig::default()).await;

    let mut host = open(&base, "/room/office-printer").await;
    next_event(&mut host).await;
    let mut old = open(&base, "/room/office-printer").await;
    next_event(&mut old).await;
    next_event(&mut host).await;

    let mut new = open(&base, "/room/office-printer").await;
    assert!(matches!(
        next_event(&mut new).await,
        RelayEvent::RoomJoined { role: Role::Client, host_connected: Some(true), .. }
    ));
    assert_eq!(
        next_event(&mut old).await,
        RelayEvent::Replaced {
            reason: "another client joined this room".into()
        }
    );
    assert_eq!(next_close(&mut old).await, (1000, "replaced".to_owned()));
    assert_eq!(
        next_event(&mut host).await,
        RelayEvent::ClientConnected {
            client_count: Some(1)
        }
    );

    // Traffic reaches the replacement only, and the old client's late
    // disconnect does not clear the new client's slot.
    host.send(Message::text("hello")).await.unwrap();
    match next_frame(&mut new).await {
        Message::Text(text) => assert_eq!(text.as_str(), "hello"),
        other => panic!("expected text, got {other:?}"),
    }
    new.send(Message::text("back")).await.unwrap();
    match next_frame(&mut host).await {
        Message::Text(text) => assert_eq!(text.as_str(), "back"),
        other => panic!("expected text, got {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_burst_forwarding_is_lossless_and_ordered() {
    let base = start(ServerConfig::default()).await;

    let mut host = open(&base, "/room/bulk-transfer-01").await;
    next_event(&mut host).await;
    let mut client = open(&base, "/room/bulk-transfer-01").await;
    next_event(&mut client).await;
    next_event(&mut host).await;

    let mut client = burst(client, &mut host).await;
    let _host = burst(host, &mut client).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_channel_burst_is_lossless_and_ordered() {
    let base = start(ServerConfig::default()).await;
    let (mut host, id) = create_channel(&base).await;

    let mut client = open(&base, &format!("/channel/{id}")).await;
    next_event(&mut client).await;
    next_event(&mut host).await;

    let mut host = burst(host, &mut client).await;
    let _client = burst(client, &mut host).await;
}

// --- Refusals ---

#[tokio::test]
async fn test_bad_paths_are_refused() {
    let base = start(ServerConfig::default()).await;

    let mut ws = open(&base, "/lobby").await;
    expect_refusal(&mut ws, "unknown path").await;

    let mut ws = open(&base, "/channel/not-a-uuid").await;
    expect_refusal(&mut ws, "unknown path").await;

    let mut ws = open(&base, "/room/short").await;
    expect_refusal(&mut ws, "invalid room name").await;

    let mut ws = open(&base, "/room/has_underscore").await;
    expect_refusal(&mut ws, "invalid room name").await;
}
