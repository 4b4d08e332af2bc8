//! End-to-end controller scenarios against mock collaborators

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use wt_protocol::{Frame, Geometry, Tag};
use wt_session::{
    Connection, ConnectionEvent, Emulator, EmulatorEvent, SessionConfig, SessionController,
    SessionError, SessionState,
};

#[derive(Clone, Default)]
struct MockConnection {
    sent: Arc<Mutex<Vec<Bytes>>>,
}

#[async_trait]
impl Connection for MockConnection {
    async fn send(&self, payload: Bytes) -> Result<(), SessionError> {
        self.sent.lock().unwrap().push(payload);
        Ok(())
    }

    async fn close(&self) -> Result<(), SessionError> {
        Ok(())
    }
}

#[derive(Clone, Default)]
struct MockEmulator {
    writes: Arc<Mutex<Vec<String>>>,
    lines: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Emulator for MockEmulator {
    async fn write(&self, text: &str) -> Result<(), SessionError> {
        self.writes.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn write_line(&self, text: &str) -> Result<(), SessionError> {
        self.lines.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn resize(&self, _geometry: Geometry) -> Result<(), SessionError> {
        Ok(())
    }
}

struct Harness {
    conn_tx: mpsc::Sender<ConnectionEvent>,
    emu_tx: mpsc::Sender<EmulatorEvent>,
    connection: MockConnection,
    emulator: MockEmulator,
    task: JoinHandle<SessionState>,
}

impl Harness {
    fn spawn() -> Self {
        let (conn_tx, conn_rx) = mpsc::channel(32);
        let (emu_tx, emu_rx) = mpsc::channel(32);
        let connection = MockConnection::default();
        let emulator = MockEmulator::default();

        let controller = SessionController::new(
            connection.clone(),
            emulator.clone(),
            SessionConfig::default(),
        );
        let task = tokio::spawn(controller.run(conn_rx, emu_rx));

        Self {
            conn_tx,
            emu_tx,
            connection,
            emulator,
            task,
        }
    }

    fn sent(&self) -> Vec<Bytes> {
        self.connection.sent.lock().unwrap().clone()
    }

    fn writes(&self) -> Vec<String> {
        self.emulator.writes.lock().unwrap().clone()
    }

    fn lines(&self) -> Vec<String> {
        self.emulator.lines.lock().unwrap().clone()
    }
}

/// Let the controller task drain everything queued so far
async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(start_paused = true)]
async fn normal_session_round_trip() {
    let h = Harness::spawn();

    h.conn_tx.send(ConnectionEvent::Opened).await.unwrap();
    settle().await;
    // No keepalive tick has elapsed, nothing should have been sent
    assert!(h.sent().is_empty());

    h.emu_tx
        .send(EmulatorEvent::Data("ls\n".into()))
        .await
        .unwrap();
    settle().await;
    assert_eq!(h.sent(), vec![Frame::data("ls\n").encode()]);

    h.conn_tx
        .send(ConnectionEvent::Binary(Frame::data("file1\n").encode()))
        .await
        .unwrap();
    settle().await;
    assert_eq!(h.writes(), vec!["file1\n".to_string()]);

    h.conn_tx.send(ConnectionEvent::Closed).await.unwrap();
    let state = h.task.await.unwrap();
    assert_eq!(state, SessionState::Closed);
}

#[tokio::test(start_paused = true)]
async fn resize_produces_json_frame() {
    let h = Harness::spawn();

    h.conn_tx.send(ConnectionEvent::Opened).await.unwrap();
    settle().await;
    h.emu_tx
        .send(EmulatorEvent::Resize(Geometry::new(100, 40)))
        .await
        .unwrap();
    settle().await;

    let sent = h.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0][0], Tag::Resize.as_u8());
    assert_eq!(&sent[0][1..], br#"{"cols":100,"rows":40}"#);
}

#[tokio::test(start_paused = true)]
async fn redundant_resize_is_suppressed() {
    let h = Harness::spawn();

    h.conn_tx.send(ConnectionEvent::Opened).await.unwrap();
    settle().await;
    // Same as the initial fallback geometry, nothing to renegotiate
    h.emu_tx
        .send(EmulatorEvent::Resize(Geometry::fallback()))
        .await
        .unwrap();
    settle().await;
    assert!(h.sent().is_empty());

    h.emu_tx
        .send(EmulatorEvent::Resize(Geometry::new(100, 40)))
        .await
        .unwrap();
    h.emu_tx
        .send(EmulatorEvent::Resize(Geometry::new(100, 40)))
        .await
        .unwrap();
    settle().await;
    assert_eq!(h.sent().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn refused_connection_never_starts_keepalive() {
    let mut h = Harness::spawn();

    h.conn_tx
        .send(ConnectionEvent::Error("refused".into()))
        .await
        .unwrap();
    let state = (&mut h.task).await.unwrap();
    assert_eq!(state, SessionState::Closed);
    assert_eq!(h.lines(), vec!["Connection refused!".to_string()]);

    tokio::time::advance(Duration::from_secs(3600)).await;
    settle().await;
    assert!(h.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn server_close_cancels_keepalive() {
    let mut h = Harness::spawn();

    h.conn_tx.send(ConnectionEvent::Opened).await.unwrap();
    settle().await;

    h.conn_tx.send(ConnectionEvent::Closed).await.unwrap();
    let state = (&mut h.task).await.unwrap();
    assert_eq!(state, SessionState::Closed);
    assert_eq!(
        h.lines(),
        vec!["".to_string(), "Session terminated!".to_string()]
    );

    // Long after teardown, no keepalive frame may appear
    tokio::time::advance(Duration::from_secs(3600)).await;
    settle().await;
    assert!(h.sent().is_empty());
}

#[tokio::test(start_paused = true)]
async fn keepalive_pings_while_open_only() {
    let mut h = Harness::spawn();

    h.conn_tx.send(ConnectionEvent::Opened).await.unwrap();
    settle().await;

    tokio::time::advance(Duration::from_secs(9 * 60 + 1)).await;
    settle().await;
    assert_eq!(h.sent(), vec![Frame::control("ping").encode()]);

    h.conn_tx.send(ConnectionEvent::Closed).await.unwrap();
    (&mut h.task).await.unwrap();

    tokio::time::advance(Duration::from_secs(60 * 60)).await;
    settle().await;
    assert_eq!(h.sent().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn inbound_frames_render_in_order() {
    let h = Harness::spawn();

    h.conn_tx.send(ConnectionEvent::Opened).await.unwrap();
    h.conn_tx
        .send(ConnectionEvent::Binary(Frame::data("a").encode()))
        .await
        .unwrap();
    h.conn_tx
        .send(ConnectionEvent::Binary(Frame::data("b").encode()))
        .await
        .unwrap();
    settle().await;

    assert_eq!(h.writes(), vec!["a".to_string(), "b".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn hostile_inbound_traffic_is_survivable() {
    let h = Harness::spawn();

    h.conn_tx.send(ConnectionEvent::Opened).await.unwrap();

    // Unknown tag with no payload, an empty binary message, a text
    // message, and an inbound RESIZE: all ignored without side effects
    h.conn_tx
        .send(ConnectionEvent::Binary(Bytes::from_static(&[0x7F])))
        .await
        .unwrap();
    h.conn_tx
        .send(ConnectionEvent::Binary(Bytes::new()))
        .await
        .unwrap();
    h.conn_tx
        .send(ConnectionEvent::Text("not binary".into()))
        .await
        .unwrap();
    h.conn_tx
        .send(ConnectionEvent::Binary(
            Frame::resize(Geometry::new(10, 10)).unwrap().encode(),
        ))
        .await
        .unwrap();
    settle().await;
    assert!(h.writes().is_empty());
    assert!(h.sent().is_empty());

    // The session is still alive and routing data
    h.conn_tx
        .send(ConnectionEvent::Binary(Frame::data("still here").encode()))
        .await
        .unwrap();
    settle().await;
    assert_eq!(h.writes(), vec!["still here".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn control_frames_are_never_rendered() {
    let h = Harness::spawn();

    h.conn_tx.send(ConnectionEvent::Opened).await.unwrap();
    h.conn_tx
        .send(ConnectionEvent::Binary(Frame::control("ping").encode()))
        .await
        .unwrap();
    settle().await;

    assert!(h.writes().is_empty());
    assert!(h.lines().is_empty());
}

#[tokio::test(start_paused = true)]
async fn input_before_open_sends_nothing() {
    let h = Harness::spawn();

    h.emu_tx
        .send(EmulatorEvent::Data("early".into()))
        .await
        .unwrap();
    settle().await;
    assert!(h.sent().is_empty());

    h.conn_tx
        .send(ConnectionEvent::Error("refused".into()))
        .await
        .unwrap();
    assert_eq!(h.task.await.unwrap(), SessionState::Closed);
}

#[tokio::test(start_paused = true)]
async fn transport_error_while_open_terminates() {
    let mut h = Harness::spawn();

    h.conn_tx.send(ConnectionEvent::Opened).await.unwrap();
    settle().await;

    h.conn_tx
        .send(ConnectionEvent::Error("reset by peer".into()))
        .await
        .unwrap();
    let state = (&mut h.task).await.unwrap();
    assert_eq!(state, SessionState::Closed);
    assert_eq!(
        h.lines(),
        vec!["".to_string(), "Session terminated!".to_string()]
    );
}
