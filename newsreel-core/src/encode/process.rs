//! Waiting on external tools (`ffmpeg`, `ffprobe`) with a deadline.

use std::io::Read;
use std::process::{Child, ExitStatus};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

pub(crate) type Drain = JoinHandle<std::io::Result<Vec<u8>>>;

/// What a child left behind. `status` is `None` when it was killed at the deadline.
#[derive(Debug)]
pub(crate) struct Finished {
    pub(crate) status: Option<ExitStatus>,
    pub(crate) stdout: Vec<u8>,
    pub(crate) stderr: Vec<u8>,
}

impl Finished {
    pub(crate) fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).trim().to_string()
    }
}

/// Read `stream` to the end on a helper thread so the child never blocks on a full pipe.
pub(crate) fn drain(mut stream: impl Read + Send + 'static) -> Drain {
    std::thread::spawn(move || {
        let mut bytes = Vec::new();
        stream.read_to_end(&mut bytes)?;
        Ok(bytes)
    })
}

/// Wait for `child`, killing it once `timeout` has passed.
///
/// Piped stdout and stderr still attached to `child` are drained here; pass `stderr` when
/// the caller already started draining it.
pub(crate) fn wait_deadline(
    mut child: Child,
    stderr: Option<Drain>,
    timeout: Duration,
) -> std::io::Result<Finished> {
    let stderr = stderr.or_else(|| child.stderr.take().map(drain));
    let stdout = child.stdout.take().map(drain);
    let deadline = Instant::now() + timeout;

    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break Some(status),
            Ok(None) if Instant::now() >= deadline => {
                tracing::warn!(timeout_secs = timeout.as_secs_f64(), "child process timed out, killing it");
                let _ = child.kill();
                let _ = child.wait();
                break None;
            }
            Ok(None) => std::thread::sleep(POLL_INTERVAL),
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e);
            }
        }
    };

    Ok(Finished {
        status,
        stdout: collect(stdout),
        stderr: collect(stderr),
    })
}

fn collect(drain: Option<Drain>) -> Vec<u8> {
    drain
        .and_then(|h| h.join().ok())
        .and_then(Result::ok)
        .unwrap_or_default()
}

#[cfg(test)]
#[path = "../../tests/unit/encode/process.rs"]
mod tests;
