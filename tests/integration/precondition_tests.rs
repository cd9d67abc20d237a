//! Integration tests for the listener's socket-path precondition.

use std::os::unix::fs::FileTypeExt;

use sockline::ipc::listener::Listener;
use sockline::{AppError, SessionConfig};

use super::test_helpers::socket_path;

#[test]
fn non_empty_file_is_left_untouched_and_not_bound() {
    let (_dir, path) = socket_path();
    std::fs::write(&path, b"precious data").unwrap();

    let err = Listener::bind(&path, &SessionConfig::default()).expect_err("must refuse");

    assert!(matches!(err, AppError::Precondition(ref msg) if msg.contains("has content")));
    assert_eq!(std::fs::read(&path).unwrap(), b"precious data");
    assert!(std::fs::metadata(&path).unwrap().file_type().is_file());
}

#[tokio::test]
async fn empty_file_is_replaced_by_the_socket() {
    let (_dir, path) = socket_path();
    std::fs::write(&path, b"").unwrap();

    let listener = Listener::bind(&path, &SessionConfig::default()).expect("empty file is stale");

    let file_type = std::fs::symlink_metadata(&path).unwrap().file_type();
    assert!(file_type.is_socket(), "path must now be a socket");
    assert_eq!(listener.path(), path.as_path());
}

#[tokio::test]
async fn stale_socket_from_a_previous_run_is_replaced() {
    let (_dir, path) = socket_path();
    let stale = std::os::unix::net::UnixListener::bind(&path).unwrap();
    drop(stale);
    assert!(path.exists(), "std listener leaves its socket file behind");

    let listener = Listener::bind(&path, &SessionConfig::default());

    assert!(listener.is_ok(), "stale socket must be cleared: {listener:?}");
}

#[test]
fn overlong_path_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("x".repeat(120));

    let err = Listener::bind(&path, &SessionConfig::default()).expect_err("must refuse");

    assert!(matches!(err, AppError::Precondition(ref msg) if msg.contains("too long")));
    assert!(!path.exists());
}

#[tokio::test]
async fn drop_leaves_a_socket_that_replaced_ours() {
    let (_dir, path) = socket_path();
    let listener = Listener::bind(&path, &SessionConfig::default()).unwrap();

    std::fs::remove_file(&path).unwrap();
    let _other = std::os::unix::net::UnixListener::bind(&path).unwrap();
    drop(listener);

    let file_type = std::fs::symlink_metadata(&path).unwrap().file_type();
    assert!(file_type.is_socket(), "the other owner's socket must survive");
}

#[tokio::test]
async fn drop_removes_its_own_socket_file() {
    let (_dir, path) = socket_path();
    let listener = Listener::bind(&path, &SessionConfig::default()).unwrap();
    assert!(path.exists());

    drop(listener);

    assert!(!path.exists());
}
