use crate::{LaunchCommand, MarkerScanner};

use std::io;
use std::process::ExitStatus;
use std::time::Instant;

use log::{info, warn};
use tokio::io::{AsyncRead, AsyncReadExt, BufReader};
use tokio::process::Child;
use tokio::sync::watch;
use tokio::task::JoinHandle;

const READ_CHUNK_SIZE: usize = 4096;
/// A line longer than this is logged in pieces
const MAX_LINE_BYTES: usize = READ_CHUNK_SIZE * 16;

/// A spawned server process plus the tasks pumping its output.
///
/// Stdout is scanned for the readiness marker and forwarded to the log one
/// line at a time; stderr is forwarded as warnings. Both pipes are read as
/// raw bytes until EOF so the child never writes into a closed pipe. The
/// pumps are aborted when the handle is dropped.
#[derive(Debug)]
pub struct ChildProcessHandle {
    pid: Option<u32>,
    child: Child,
    command: String,
    started_at: Instant,
    marker_rx: watch::Receiver<bool>,
    readers: Vec<JoinHandle<()>>,
}

impl ChildProcessHandle {
    /// Spawn `command` and start watching stdout for `marker`.
    pub fn spawn(command: &LaunchCommand, marker: &str) -> io::Result<Self> {
        let mut child = command.to_command().spawn()?;
        let pid = child.id();
        let (marker_tx, marker_rx) = watch::channel(false);

        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            let scanner = MarkerScanner::new(marker);
            readers.push(tokio::spawn(pump_stdout(stdout, scanner, marker_tx)));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(tokio::spawn(pump_stderr(stderr)));
        }

        info!("Spawned '{}' (pid {pid:?})", command.display());

        Ok(Self {
            pid,
            child,
            command: command.display(),
            started_at: Instant::now(),
            marker_rx,
            readers,
        })
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    /// Receiver that flips to `true` when the marker appears. Closed when
    /// stdout reaches EOF.
    pub fn marker_receiver(&self) -> watch::Receiver<bool> {
        self.marker_rx.clone()
    }

    pub async fn wait(&mut self) -> io::Result<ExitStatus> {
        self.child.wait().await
    }

    pub fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        self.child.try_wait()
    }

    /// Forceful kill of the direct child only.
    pub fn start_kill(&mut self) -> io::Result<()> {
        self.child.start_kill()
    }

    pub fn abort_readers(&mut self) {
        for reader in self.readers.drain(..) {
            reader.abort();
        }
    }
}

impl Drop for ChildProcessHandle {
    fn drop(&mut self) {
        self.abort_readers();
    }
}

async fn pump_stdout<R>(stdout: R, mut scanner: MarkerScanner, marker_tx: watch::Sender<bool>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stdout);
    let mut chunk = vec![0u8; READ_CHUNK_SIZE];
    let mut lines = LineBuffer::default();

    loop {
        let n = match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                warn!("Failed to read server stdout: {e}");
                drain(&mut reader).await;
                break;
            }
        };

        if scanner.feed(&chunk[..n]) {
            marker_tx.send_replace(true);
        }
        lines.push(&chunk[..n], |line| info!("Server: {line}"));
    }

    lines.flush(|line| info!("Server: {line}"));
}

async fn pump_stderr<R>(stderr: R)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(stderr);
    let mut chunk = vec![0u8; READ_CHUNK_SIZE];
    let mut lines = LineBuffer::default();

    loop {
        let n = match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                warn!("Failed to read server stderr: {e}");
                drain(&mut reader).await;
                break;
            }
        };
        lines.push(&chunk[..n], |line| warn!("Server Error: {line}"));
    }

    lines.flush(|line| warn!("Server Error: {line}"));
}

/// Keep the read end open until the child closes its side.
async fn drain<R>(reader: &mut R)
where
    R: AsyncRead + Unpin,
{
    if let Err(e) = tokio::io::copy(reader, &mut tokio::io::sink()).await {
        warn!("Failed to drain server output: {e}");
    }
}

/// Splits raw output into lines, decoding lossily.
#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Append `bytes` and emit every completed line. A partial line longer
    /// than `MAX_LINE_BYTES` is emitted as is.
    pub(crate) fn push(&mut self, bytes: &[u8], mut emit: impl FnMut(&str)) {
        self.pending.extend_from_slice(bytes);
        while let Some(pos) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            emit_line(&line, &mut emit);
        }
        if self.pending.len() > MAX_LINE_BYTES {
            self.flush(emit);
        }
    }

    /// Emit whatever is left, even without a trailing newline.
    pub(crate) fn flush(&mut self, mut emit: impl FnMut(&str)) {
        if !self.pending.is_empty() {
            let rest = std::mem::take(&mut self.pending);
            emit_line(&rest, &mut emit);
        }
    }

    #[cfg(test)]
    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

fn emit_line(line: &[u8], emit: &mut impl FnMut(&str)) {
    let line = String::from_utf8_lossy(line);
    let line = line.trim_end();
    if !line.is_empty() {
        emit(line);
    }
}
