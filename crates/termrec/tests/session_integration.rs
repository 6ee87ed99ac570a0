//! Integration tests for recording sessions on a real PTY.
//!
//! The user's terminal is replaced by a pipe for input and a byte vector for
//! the mirrored output.

#![cfg(unix)]

use std::os::unix::io::OwnedFd;
use std::time::Duration;

use termrec::{
    Envelope, OutputEnd, RecordError, RecordSession, Recording, ShellCommand, TerminalSize,
};
use termrec_pty::{ExitStatus, TerminationSignal};
use tokio::sync::mpsc;
use tokio::time::timeout;

const LIMIT: Duration = Duration::from_secs(10);

/// An input that never delivers anything while `_writer` is alive.
fn idle_input() -> (OwnedFd, OwnedFd) {
    rustix::pipe::pipe().unwrap()
}

fn sh(script: &str) -> ShellCommand {
    ShellCommand::command("/bin/sh", ["-c", script])
}

#[tokio::test]
async fn records_shell_output() {
    let (input, _writer) = idle_input();
    let mut sink = Vec::new();

    let outcome = timeout(
        LIMIT,
        RecordSession::new(sh("printf hello"), TerminalSize::new(80, 24)).run(
            input,
            &mut sink,
            None,
        ),
    )
    .await
    .expect("session did not finish")
    .unwrap();

    assert_eq!(sink, b"hello");
    assert_eq!(outcome.recording.output_text(), "hello");
    assert_eq!(outcome.recording.size, TerminalSize::new(80, 24));
    assert_eq!(outcome.exit_status, Some(ExitStatus::Exited(0)));
}

#[tokio::test]
async fn exit_code_reported() {
    let (input, _writer) = idle_input();

    let outcome = timeout(
        LIMIT,
        RecordSession::new(sh("exit 3"), TerminalSize::default()).run(
            input,
            &mut Vec::new(),
            None,
        ),
    )
    .await
    .expect("session did not finish")
    .unwrap();

    assert_eq!(outcome.exit_status, Some(ExitStatus::Exited(3)));
    assert!(outcome.recording.events.is_empty());
}

#[tokio::test]
async fn shell_sees_window_size() {
    let (input, _writer) = idle_input();
    let mut sink = Vec::new();

    let outcome = timeout(
        LIMIT,
        RecordSession::new(sh("stty size"), TerminalSize::new(132, 43)).run(
            input,
            &mut sink,
            None,
        ),
    )
    .await
    .expect("session did not finish")
    .unwrap();

    assert_eq!(outcome.recording.output_text().trim(), "43 132");
}

#[tokio::test]
async fn input_reaches_shell() {
    let (input, writer) = idle_input();
    rustix::io::write(&writer, b"ping\n").unwrap();
    drop(writer);

    let mut sink = Vec::new();
    let outcome = timeout(
        LIMIT,
        RecordSession::new(sh("read line; printf 'got %s' \"$line\""), TerminalSize::default())
            .run(input, &mut sink, None),
    )
    .await
    .expect("session did not finish")
    .unwrap();

    // The PTY echoes the typed line before the shell answers
    let text = outcome.recording.output_text();
    assert!(text.contains("ping"), "{text:?}");
    assert!(text.ends_with("got ping"), "{text:?}");
}

#[tokio::test]
async fn small_chunks_record_everything() {
    let (input, _writer) = idle_input();
    let mut sink = Vec::new();

    let outcome = timeout(
        LIMIT,
        RecordSession::new(sh("printf 'abcdefghij→klmnop'"), TerminalSize::default())
            .chunk_size(3)
            .run(input, &mut sink, None),
    )
    .await
    .expect("session did not finish")
    .unwrap();

    assert_eq!(outcome.recording.output_text(), "abcdefghij→klmnop");
    assert_eq!(sink, "abcdefghij→klmnop".as_bytes());
}

#[tokio::test]
async fn input_relay_stopped_when_shell_exits() {
    // The input never ends on its own; the session must still return
    let (input, writer) = idle_input();

    let outcome = timeout(
        LIMIT,
        RecordSession::new(sh("printf done"), TerminalSize::default()).run(
            input,
            &mut Vec::new(),
            None,
        ),
    )
    .await
    .expect("input relay kept the session alive")
    .unwrap();

    assert!(matches!(
        outcome.end,
        OutputEnd::Hangup | OutputEnd::Eof | OutputEnd::ShellExited(_)
    ));
    drop(writer);
}

#[tokio::test]
async fn interrupt_discards_session() {
    let (input, _writer) = idle_input();
    let (signal_tx, signal_rx) = mpsc::unbounded_channel();
    signal_tx.send(TerminationSignal::Terminate).unwrap();

    let err = timeout(
        LIMIT,
        RecordSession::new(sh("sleep 30"), TerminalSize::default()).run(
            input,
            &mut Vec::new(),
            Some(signal_rx),
        ),
    )
    .await
    .expect("interrupted session did not return")
    .unwrap_err();

    assert!(matches!(
        err,
        RecordError::Interrupted {
            signal: TerminationSignal::Terminate
        }
    ));
    assert_eq!(err.exit_code(), 143);
}

#[tokio::test]
async fn missing_shell_fails_to_spawn() {
    let (input, _writer) = idle_input();

    let err = RecordSession::new(
        ShellCommand::command("/nonexistent/shell", Vec::<String>::new()),
        TerminalSize::default(),
    )
    .run(input, &mut Vec::new(), None)
    .await
    .unwrap_err();

    assert!(matches!(err, RecordError::Pty(_)));
}

#[tokio::test]
async fn outcome_serializes_in_envelope() {
    let (input, _writer) = idle_input();

    let outcome = timeout(
        LIMIT,
        RecordSession::new(sh("printf 'one\\n'"), TerminalSize::new(90, 20)).run(
            input,
            &mut Vec::new(),
            None,
        ),
    )
    .await
    .expect("session did not finish")
    .unwrap();

    let envelope = Envelope::default();
    let text = outcome.recording.to_envelope(&envelope).unwrap();
    let parsed = Recording::from_envelope(&text, &envelope).unwrap();

    assert_eq!(parsed, outcome.recording);
    assert_eq!(parsed.output_text(), "one\r\n");
}
