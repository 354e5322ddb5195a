//! Line-oriented request/response over an engine's stdio pipes.
//!
//! Stdout is drained by a reader task into a channel so a request can wait on
//! it with a deadline. Each request owns the transceiver mutably, which keeps
//! at most one command in flight per engine.

use std::io::ErrorKind;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::{ChildStderr, ChildStdin, ChildStdout};
use tokio::sync::mpsc;
use tokio::time::{timeout_at, Instant};
use tracing::{debug, trace, warn};

use crate::error::EngineError;

pub struct Transceiver<W> {
    writer: W,
    lines: mpsc::UnboundedReceiver<String>,
}

/// Forward every line of `reader` into a channel until EOF or a read error.
fn spawn_line_reader<R>(reader: R) -> mpsc::UnboundedReceiver<String>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Engine stdout unreadable, closing reader");
                    break;
                }
            }
        }
    });
    rx
}

/// Stderr is diagnostic only: logged, never parsed.
fn spawn_stderr_logger(stderr: ChildStderr) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(stderr).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => warn!(line = %line, "engine stderr"),
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Engine stderr unreadable, closing logger");
                    break;
                }
            }
        }
    });
}

impl Transceiver<ChildStdin> {
    /// Wire up a spawned engine's pipes.
    pub fn attach(stdin: ChildStdin, stdout: ChildStdout, stderr: Option<ChildStderr>) -> Self {
        if let Some(stderr) = stderr {
            spawn_stderr_logger(stderr);
        }
        Self::new(stdin, spawn_line_reader(stdout))
    }
}

impl<W: AsyncWrite + Unpin> Transceiver<W> {
    pub fn new(writer: W, lines: mpsc::UnboundedReceiver<String>) -> Self {
        Self { writer, lines }
    }

    /// Write one command line without waiting for any answer.
    pub async fn write(&mut self, command: &str) -> Result<(), EngineError> {
        debug!(cmd = command, "engine <");
        let result = async {
            self.writer.write_all(command.as_bytes()).await?;
            self.writer.write_all(b"\n").await?;
            self.writer.flush().await
        }
        .await;

        result.map_err(|e| match e.kind() {
            ErrorKind::BrokenPipe => EngineError::ProcessExited,
            _ => EngineError::Io(e),
        })
    }

    /// Send `command` and resolve with every line received up to and
    /// including the first one containing `terminator`.
    pub async fn send(
        &mut self,
        command: &str,
        terminator: &str,
        timeout: Duration,
    ) -> Result<String, EngineError> {
        let mut buffer = String::new();
        let resolved = self
            .exchange(command, timeout, |line| {
                buffer.push_str(line);
                buffer.push('\n');
                line.contains(terminator)
            })
            .await?;

        if resolved {
            Ok(buffer)
        } else {
            Err(EngineError::Timeout {
                command: command.to_string(),
            })
        }
    }

    /// Send `command` and feed each output line to `on_line` until it
    /// returns `true` (`Ok(true)`) or `timeout` elapses (`Ok(false)`).
    pub async fn exchange<F>(
        &mut self,
        command: &str,
        timeout: Duration,
        on_line: F,
    ) -> Result<bool, EngineError>
    where
        F: FnMut(&str) -> bool,
    {
        self.discard_stale();
        self.write(command).await?;
        self.collect_until(Instant::now() + timeout, on_line).await
    }

    /// Keep feeding output lines to `on_line` without sending anything.
    pub async fn collect_until<F>(
        &mut self,
        deadline: Instant,
        mut on_line: F,
    ) -> Result<bool, EngineError>
    where
        F: FnMut(&str) -> bool,
    {
        loop {
            match timeout_at(deadline, self.lines.recv()).await {
                Ok(Some(line)) => {
                    trace!(line = %line, "engine >");
                    if on_line(&line) {
                        return Ok(true);
                    }
                }
                Ok(None) => return Err(EngineError::ProcessExited),
                Err(_) => return Ok(false),
            }
        }
    }

    /// Drop output left over from an earlier request that timed out.
    fn discard_stale(&mut self) {
        while let Ok(line) = self.lines.try_recv() {
            trace!(line = %line, "discarding stale engine output");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::DuplexStream;

    /// In-memory engine: answers each received command with the lines
    /// `respond` returns for it.
    fn fake_engine<F>(respond: F) -> Transceiver<DuplexStream>
    where
        F: Fn(&str) -> Vec<&'static str> + Send + 'static,
    {
        let (writer, peer) = tokio::io::duplex(4096);
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let mut commands = BufReader::new(peer).lines();
            while let Ok(Some(command)) = commands.next_line().await {
                for line in respond(&command) {
                    let _ = tx.send(line.to_string());
                }
            }
        });
        Transceiver::new(writer, rx)
    }

    #[tokio::test]
    async fn test_send_resolves_on_terminator() {
        let mut transceiver = fake_engine(|cmd| match cmd {
            "uci" => vec!["id name FakeFish", "option name Hash type spin", "uciok"],
            _ => vec![],
        });

        let response = transceiver
            .send("uci", "uciok", Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(response, "id name FakeFish\noption name Hash type spin\nuciok\n");
    }

    #[tokio::test]
    async fn test_send_times_out_with_command() {
        let mut transceiver = fake_engine(|_| vec![]);
        let err = transceiver
            .send("isready", "readyok", Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Timeout { command } if command == "isready"));
    }

    #[tokio::test]
    async fn test_stale_output_does_not_resolve_next_request() {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut transceiver = Transceiver::new(tokio::io::sink(), rx);
        tx.send("readyok".to_string()).unwrap();

        let err = transceiver
            .send("isready", "readyok", Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_closed_output_is_process_exit() {
        let (tx, rx) = mpsc::unbounded_channel::<String>();
        let mut transceiver = Transceiver::new(tokio::io::sink(), rx);
        drop(tx);

        let err = transceiver
            .send("uci", "uciok", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::ProcessExited));
    }

    #[tokio::test]
    async fn test_reader_stops_on_invalid_utf8() {
        let (mut engine_out, reader) = tokio::io::duplex(256);
        let mut lines = spawn_line_reader(reader);

        engine_out.write_all(b"uciok\n\xff\xfe garbage\nreadyok\n").await.unwrap();
        assert_eq!(lines.recv().await.as_deref(), Some("uciok"));
        let after = tokio::time::timeout(Duration::from_secs(2), lines.recv())
            .await
            .unwrap();
        assert_eq!(after, None);
    }

    #[tokio::test]
    async fn test_requests_are_answered_in_order() {
        let mut transceiver = fake_engine(|cmd| match cmd {
            "isready" => vec!["readyok"],
            "go depth 1" => vec!["info depth 1 score cp 12 pv e2e4", "bestmove e2e4"],
            _ => vec![],
        });

        transceiver.write("position startpos").await.unwrap();
        let mut seen = Vec::new();
        let resolved = transceiver
            .exchange("go depth 1", Duration::from_secs(2), |line| {
                seen.push(line.to_string());
                line.starts_with("bestmove")
            })
            .await
            .unwrap();
        assert!(resolved);
        assert_eq!(seen.len(), 2);

        let ready = transceiver
            .send("isready", "readyok", Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(ready, "readyok\n");
    }
}
