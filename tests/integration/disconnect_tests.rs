//! Integration tests driving one endpoint with a hand-written raw peer.

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};

use sockline::console::{ChannelSink, ScriptedSource};
use sockline::ipc::connector::Connector;
use sockline::ipc::listener::Listener;
use sockline::ipc::SessionStats;
use sockline::protocol::ControlByte;
use sockline::{AppError, SessionConfig};

use super::test_helpers::socket_path;

#[tokio::test]
async fn wrong_acknowledgment_is_counted_and_the_loop_continues() {
    let (_dir, path) = socket_path();
    let listener = Listener::bind(&path, &SessionConfig::default()).unwrap();

    let client_path = path.clone();
    let client = tokio::spawn(async move {
        let stream = UnixStream::connect(&client_path).await.unwrap();
        let mut reader = BufReader::new(stream);
        reader.get_mut().write_u8(ControlByte::PROLOGUE).await.unwrap();

        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        assert_eq!(line, "x\n");
        reader.get_mut().write_u8(1).await.unwrap();

        line.clear();
        reader.read_line(&mut line).await.unwrap();
        assert_eq!(line, "\n");
        reader.get_mut().write_u8(ControlByte::ACKNOWLEDGE).await.unwrap();
    });

    let mut source = ScriptedSource::new(["x", ""]);
    let stats = listener.serve(&mut source).await.unwrap();
    client.await.unwrap();

    assert_eq!(
        stats,
        SessionStats {
            lines: 2,
            acks: 1,
            ack_failures: 1
        }
    );
}

#[tokio::test]
async fn unexpected_prologue_is_logged_not_rejected() {
    let (_dir, path) = socket_path();
    let listener = Listener::bind(&path, &SessionConfig::default()).unwrap();

    let client_path = path.clone();
    let client = tokio::spawn(async move {
        let stream = UnixStream::connect(&client_path).await.unwrap();
        let mut reader = BufReader::new(stream);
        reader.get_mut().write_u8(42).await.unwrap();
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        reader.get_mut().write_u8(ControlByte::ACKNOWLEDGE).await.unwrap();
        line
    });

    let mut source = ScriptedSource::new([""]);
    let stats = listener.serve(&mut source).await.unwrap();

    assert_eq!(client.await.unwrap(), "\n");
    assert_eq!(stats.acks, 1);
}

#[tokio::test]
async fn peer_closing_before_prologue_is_disconnected() {
    let (_dir, path) = socket_path();
    let listener = Listener::bind(&path, &SessionConfig::default()).unwrap();

    let stream = UnixStream::connect(&path).await.unwrap();
    drop(stream);

    let mut source = ScriptedSource::new(["unused", ""]);
    let err = listener.serve(&mut source).await.expect_err("peer is gone");

    assert!(matches!(err, AppError::Disconnected(ref msg) if msg.contains("prologue")));
    assert_eq!(source.remaining(), 2, "no line is pulled before the prologue");
}

#[tokio::test]
async fn peer_closing_mid_session_ends_the_listener_with_an_error() {
    let (_dir, path) = socket_path();
    let listener = Listener::bind(&path, &SessionConfig::default()).unwrap();

    let mut stream = UnixStream::connect(&path).await.unwrap();
    stream.write_u8(ControlByte::PROLOGUE).await.unwrap();
    drop(stream);

    let mut source = ScriptedSource::new(["hello", ""]);
    let err = listener.serve(&mut source).await.expect_err("peer is gone");

    assert!(
        matches!(err, AppError::Disconnected(_) | AppError::Io(_)),
        "unexpected error: {err:?}"
    );
}

#[tokio::test]
async fn connector_reports_unterminated_tail_then_ends_at_eof() {
    let (_dir, path) = socket_path();
    let raw = UnixListener::bind(&path).unwrap();

    let server = tokio::spawn(async move {
        let (mut stream, _) = raw.accept().await.unwrap();
        assert_eq!(stream.read_u8().await.unwrap(), ControlByte::PROLOGUE);

        stream.write_all(b"tail").await.unwrap();
        stream.shutdown().await.unwrap();

        assert_eq!(stream.read_u8().await.unwrap(), ControlByte::ACKNOWLEDGE);
        let mut rest = Vec::new();
        stream.read_to_end(&mut rest).await.unwrap();
        rest
    });

    let connector = Connector::connect(&path, &SessionConfig::default())
        .await
        .unwrap();
    let (mut sink, mut rx) = ChannelSink::new();
    let stats = connector.run(&mut sink).await.unwrap();

    assert_eq!(rx.recv().await.as_deref(), Some("tail"));
    assert_eq!(stats.lines, 1);
    assert_eq!(stats.acks, 1);
    assert!(server.await.unwrap().is_empty(), "nothing follows the ack");
}

#[tokio::test]
async fn connector_sends_prologue_first() {
    let (_dir, path) = socket_path();
    let raw = UnixListener::bind(&path).unwrap();

    let server = tokio::spawn(async move {
        let (mut stream, _) = raw.accept().await.unwrap();
        let first = stream.read_u8().await.unwrap();
        stream.write_all(b"\n").await.unwrap();
        let ack = stream.read_u8().await.unwrap();
        (first, ack)
    });

    let connector = Connector::connect(&path, &SessionConfig::default())
        .await
        .unwrap();
    let (mut sink, _rx) = ChannelSink::new();
    connector.run(&mut sink).await.unwrap();

    let (first, ack) = server.await.unwrap();
    assert_eq!(first, ControlByte::PROLOGUE);
    assert_eq!(ack, ControlByte::ACKNOWLEDGE);
}
