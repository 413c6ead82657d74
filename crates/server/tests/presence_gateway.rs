//! Integration tests for the presence registry and an end-to-end
//! websocket round-trip through the realtime gateway.

mod common;

use std::time::{Duration, Instant};

use futures::{SinkExt, StreamExt};
use server::auth::users;
use server::gateway::{ws::Frame, ConnectedClient};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use common::UserFixture;

#[tokio::test]
async fn test_presence_set_semantics() {
    let state = common::test_state().await;
    let fixture = UserFixture::new();
    let user = users::create_email_user(&state.db, fixture.name, &fixture.email, "hash")
        .await
        .expect("user");

    state.presence.add(user.id, "c1").await.unwrap();
    state.presence.add(user.id, "c1").await.unwrap();
    state.presence.add(user.id, "c2").await.unwrap();
    assert_eq!(state.presence.list(user.id).await.unwrap(), vec!["c1", "c2"]);

    // Removing an absent id is a no-op.
    state.presence.remove(user.id, "ghost").await.unwrap();
    state.presence.remove(user.id, "c1").await.unwrap();
    assert_eq!(state.presence.list(user.id).await.unwrap(), vec!["c2"]);

    // Duplicates in the replacement collapse to set semantics.
    state
        .presence
        .replace(
            user.id,
            vec!["d1".to_string(), "d2".to_string(), "d1".to_string()],
        )
        .await
        .unwrap();
    assert_eq!(state.presence.list(user.id).await.unwrap(), vec!["d1", "d2"]);
}

fn live_client(
    conn_id: &str,
    user_id: uuid::Uuid,
) -> (ConnectedClient, mpsc::UnboundedReceiver<String>) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (
        ConnectedClient {
            conn_id: conn_id.to_string(),
            user_id,
            sender,
            connected_at: Instant::now(),
        },
        receiver,
    )
}

#[tokio::test]
async fn test_concurrent_connects_survive_pruning() {
    let state = common::test_state().await;
    let fixture = UserFixture::new();
    let user = users::create_email_user(&state.db, fixture.name, &fixture.email, "hash")
        .await
        .expect("user");

    // A connection id left behind by a dead process.
    state
        .presence
        .replace(user.id, vec!["stale".to_string()])
        .await
        .unwrap();

    // Both devices register with the gateway before touching presence,
    // exactly as the connection handler does.
    let (a, _a_rx) = live_client("conn-a", user.id);
    let (b, _b_rx) = live_client("conn-b", user.id);
    state.gateway.register_client(a).await;
    state.gateway.register_client(b).await;

    let (ra, rb) = tokio::join!(
        state.presence.prune_and_add(user.id, &state.gateway, "conn-a"),
        state.presence.prune_and_add(user.id, &state.gateway, "conn-b"),
    );
    ra.unwrap();
    rb.unwrap();

    // The stale id is gone and neither live connection lost the other.
    let mut listed = state.presence.list(user.id).await.unwrap();
    listed.sort();
    assert_eq!(listed, vec!["conn-a", "conn-b"]);
}

#[tokio::test]
async fn test_presence_last_message_cache() {
    let state = common::test_state().await;
    let fixture = UserFixture::new();
    let user = users::create_email_user(&state.db, fixture.name, &fixture.email, "hash")
        .await
        .expect("user");

    assert_eq!(state.presence.get_last_message(user.id).await.unwrap(), "");

    state
        .presence
        .set_last_message(user.id, "copied text")
        .await
        .unwrap();
    assert_eq!(
        state.presence.get_last_message(user.id).await.unwrap(),
        "copied text"
    );
}

#[tokio::test]
async fn test_concurrent_adds_lose_nothing() {
    let state = common::test_state().await;
    let fixture = UserFixture::new();
    let user = users::create_email_user(&state.db, fixture.name, &fixture.email, "hash")
        .await
        .expect("user");

    let (a, b) = tokio::join!(
        state.presence.add(user.id, "conn-a"),
        state.presence.add(user.id, "conn-b"),
    );
    a.unwrap();
    b.unwrap();

    let mut listed = state.presence.list(user.id).await.unwrap();
    listed.sort();
    assert_eq!(listed, vec!["conn-a", "conn-b"]);
}

async fn spawn_test_server(state: server::AppState) -> std::net::SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let router = server::create_app_router(state);
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    addr
}

async fn next_text_frame<S>(stream: &mut S) -> Frame
where
    S: StreamExt<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
{
    loop {
        let message = tokio::time::timeout(Duration::from_secs(5), stream.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).expect("frame json");
        }
    }
}

#[tokio::test]
async fn test_gateway_fan_out_end_to_end() {
    let state = common::test_state().await;
    let fixture = UserFixture::new();
    let user = users::create_email_user(&state.db, fixture.name, &fixture.email, "hash")
        .await
        .expect("user");
    let token = auth::create_access_token(
        &common::test_jwt_config(),
        &user.id.to_string(),
        &user.email,
    )
    .expect("token");

    let addr = spawn_test_server(state.clone()).await;
    let url = format!("ws://{addr}/ws?token={token}");

    let (mut first, _) = connect_async(&url).await.expect("first client");
    let (mut second, _) = connect_async(&url).await.expect("second client");

    // Wait until both connections are registered in presence.
    let mut registered = 0;
    for _ in 0..50 {
        registered = state.presence.list(user.id).await.unwrap().len();
        if registered == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(registered, 2, "both devices should be registered");

    first
        .send(Message::Text(
            Frame::message("shared clipboard text").to_json().into(),
        ))
        .await
        .expect("send");

    // Both devices receive the copy, the sender included.
    let echoed = next_text_frame(&mut first).await;
    assert_eq!(echoed.event, "message");
    assert_eq!(echoed.data, "shared clipboard text");

    let delivered = next_text_frame(&mut second).await;
    assert_eq!(delivered.event, "message");
    assert_eq!(delivered.data, "shared clipboard text");

    // And the message is cached for late joiners.
    assert_eq!(
        state.presence.get_last_message(user.id).await.unwrap(),
        "shared clipboard text"
    );

    // Disconnecting one device removes only its own registration.
    second.close(None).await.expect("close");
    let mut remaining = 2;
    for _ in 0..50 {
        remaining = state.presence.list(user.id).await.unwrap().len();
        if remaining == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(remaining, 1, "only the closed connection is dropped");
}

#[tokio::test]
async fn test_gateway_rejects_bad_token() {
    let state = common::test_state().await;
    let addr = spawn_test_server(state).await;

    let (mut socket, _) = connect_async(format!("ws://{addr}/ws?token=not-a-token"))
        .await
        .expect("connect");

    let frame = next_text_frame(&mut socket).await;
    assert_eq!(frame.event, "exception");
    assert_eq!(frame.data, "Authentication error");

    // The server closes after the exception frame.
    let end = tokio::time::timeout(Duration::from_secs(5), socket.next())
        .await
        .expect("timed out waiting for close");
    match end {
        None | Some(Ok(Message::Close(_))) => {}
        other => panic!("expected close, got {other:?}"),
    }
}
