use std::ffi::OsString;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{SyncSender, TrySendError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crate::audio::narration::NarrationTrack;
use crate::encode::process::{Drain, drain, wait_deadline};
use crate::foundation::core::{CanvasSize, Fps};
use crate::foundation::error::{NewsreelError, NewsreelResult};
use crate::render::canvas::Canvas;
use crate::render::frames::FrameSet;

/// Frames buffered between the renderer and the stdin writer thread.
const PIPE_QUEUE_FRAMES: usize = 4;
const PIPE_RETRY_INTERVAL: Duration = Duration::from_millis(2);

/// How frames reach the encoder.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodeMode {
    /// Numbered PNG files read by ffmpeg's image2 demuxer.
    #[default]
    Frames,
    /// Raw RGBA frames written to ffmpeg's stdin.
    Pipe,
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EncoderSettings {
    /// Explicit ffmpeg binary; looked up on `PATH` when unset.
    pub ffmpeg: Option<PathBuf>,
    /// Explicit ffprobe binary; looked up on `PATH` when unset.
    pub ffprobe: Option<PathBuf>,
    pub preset: String,
    pub timeout_secs: u64,
    pub mode: EncodeMode,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            ffmpeg: None,
            ffprobe: None,
            preset: "fast".to_string(),
            timeout_secs: 300,
            mode: EncodeMode::Frames,
        }
    }
}

impl EncoderSettings {
    pub fn ffmpeg_program(&self) -> PathBuf {
        resolve_program(self.ffmpeg.as_deref(), "ffmpeg")
    }

    pub fn ffprobe_program(&self) -> PathBuf {
        resolve_program(self.ffprobe.as_deref(), "ffprobe")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

fn resolve_program(configured: Option<&Path>, name: &str) -> PathBuf {
    match configured {
        Some(p) => p.to_path_buf(),
        None => which::which(name).unwrap_or_else(|_| PathBuf::from(name)),
    }
}

/// Output options shared by both encode modes: h264 at the configured preset, yuv420p,
/// AAC audio, stop at the shorter stream.
fn push_output_args(args: &mut Vec<OsString>, preset: &str, size: CanvasSize, out: &Path) {
    let vf = format!("scale={}:{},format=yuv420p", size.width, size.height);
    for a in [
        "-vf",
        vf.as_str(),
        "-c:v",
        "libx264",
        "-preset",
        preset,
        "-pix_fmt",
        "yuv420p",
        "-c:a",
        "aac",
        "-shortest",
        "-movflags",
        "+faststart",
    ] {
        args.push(a.into());
    }
    args.push(out.as_os_str().to_owned());
}

/// Combines a numbered frame sequence and a narration track into one MP4.
#[derive(Clone, Debug)]
pub struct Muxer {
    ffmpeg: PathBuf,
    preset: String,
    timeout: Duration,
}

impl Muxer {
    pub fn new(settings: &EncoderSettings) -> Self {
        Self {
            ffmpeg: settings.ffmpeg_program(),
            preset: settings.preset.clone(),
            timeout: settings.timeout(),
        }
    }

    /// Arguments for muxing `pattern` at `fps` with `audio` into `out`.
    pub fn build_args(
        &self,
        pattern: &Path,
        fps: Fps,
        audio: &Path,
        size: CanvasSize,
        out: &Path,
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-y", "-loglevel", "error", "-framerate"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(fps.ffmpeg_rate().into());
        args.push("-i".into());
        args.push(pattern.as_os_str().to_owned());
        args.push("-i".into());
        args.push(audio.as_os_str().to_owned());
        push_output_args(&mut args, &self.preset, size, out);
        args
    }

    /// Encode `frames` with `narration` into `out`.
    ///
    /// Both inputs are consumed and deleted before this returns, whatever the outcome. A
    /// partial output file is removed on failure.
    #[tracing::instrument(level = "debug", skip_all, fields(frames = frames.len(), out = %out.display()))]
    pub fn mux(
        &self,
        frames: FrameSet,
        fps: Fps,
        narration: NarrationTrack,
        size: CanvasSize,
        out: &Path,
    ) -> NewsreelResult<PathBuf> {
        if frames.is_empty() {
            return Err(NewsreelError::degenerate_input("no frames to encode"));
        }
        validate_even(size)?;
        ensure_parent_dir(out)?;

        let args = self.build_args(&frames.pattern(), fps, narration.path(), size, out);
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let result = spawn(&mut cmd, &self.ffmpeg)
            .and_then(|child| finish_child(child, None, self.timeout));
        drop(frames);
        drop(narration);

        match result {
            Ok(()) => {
                tracing::info!(out = %out.display(), "video encoded");
                Ok(out.to_path_buf())
            }
            Err(e) => {
                remove_partial(out);
                Err(e)
            }
        }
    }
}

/// Streams raw RGBA canvases into ffmpeg's stdin, muxed with a narration track.
///
/// Frames are handed to a writer thread. A frame that ffmpeg does not accept within the
/// encoder timeout fails [`PipeEncoder::push_frame`] instead of blocking forever.
pub struct PipeEncoder {
    child: Option<Child>,
    frames_tx: Option<SyncSender<Vec<u8>>>,
    writer: Option<JoinHandle<std::io::Result<()>>>,
    stderr_drain: Option<Drain>,
    size: CanvasSize,
    timeout: Duration,
    out: PathBuf,
    frames_written: u64,
}

impl std::fmt::Debug for PipeEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipeEncoder")
            .field("size", &self.size)
            .field("out", &self.out)
            .field("frames_written", &self.frames_written)
            .finish_non_exhaustive()
    }
}

impl PipeEncoder {
    pub fn build_args(
        preset: &str,
        size: CanvasSize,
        fps: Fps,
        audio: &Path,
        out: &Path,
    ) -> Vec<OsString> {
        let dims = format!("{}x{}", size.width, size.height);
        let rate = fps.ffmpeg_rate();
        let mut args: Vec<OsString> = [
            "-y",
            "-loglevel",
            "error",
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            dims.as_str(),
            "-r",
            rate.as_str(),
            "-i",
            "pipe:0",
            "-i",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        args.push(audio.as_os_str().to_owned());
        push_output_args(&mut args, preset, size, out);
        args
    }

    pub fn begin(
        settings: &EncoderSettings,
        size: CanvasSize,
        fps: Fps,
        audio: &Path,
        out: &Path,
    ) -> NewsreelResult<Self> {
        validate_even(size)?;
        ensure_parent_dir(out)?;
        let program = settings.ffmpeg_program();
        let mut cmd = Command::new(&program);
        cmd.args(Self::build_args(&settings.preset, size, fps, audio, out))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        let mut child = spawn(&mut cmd, &program)?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| NewsreelError::encode("failed to open ffmpeg stdin (unexpected)"))?;
        let stderr_drain = child.stderr.take().map(drain);
        let (frames_tx, writer) = spawn_writer(stdin);

        Ok(Self {
            child: Some(child),
            frames_tx: Some(frames_tx),
            writer: Some(writer),
            stderr_drain,
            size,
            timeout: settings.timeout(),
            out: out.to_path_buf(),
            frames_written: 0,
        })
    }

    pub fn push_frame(&mut self, frame: &Canvas) -> NewsreelResult<()> {
        if frame.size() != self.size {
            return Err(NewsreelError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, self.size.width, self.size.height
            )));
        }
        let Some(tx) = self.frames_tx.clone() else {
            return Err(NewsreelError::encode("ffmpeg pipe is already finished"));
        };
        let deadline = Instant::now() + self.timeout;
        let mut bytes = frame.data.clone();
        loop {
            match tx.try_send(bytes) {
                Ok(()) => break,
                Err(TrySendError::Full(back)) if Instant::now() < deadline => {
                    bytes = back;
                    std::thread::sleep(PIPE_RETRY_INTERVAL);
                }
                Err(TrySendError::Full(_)) => {
                    return Err(NewsreelError::encode(format!(
                        "ffmpeg accepted no frame data for {}s",
                        self.timeout.as_secs()
                    )));
                }
                Err(TrySendError::Disconnected(_)) => return Err(self.writer_failure()),
            }
        }
        self.frames_written += 1;
        Ok(())
    }

    fn writer_failure(&mut self) -> NewsreelError {
        match self.writer.take().map(JoinHandle::join) {
            Some(Ok(Err(e))) => {
                NewsreelError::encode(format!("failed to write frame to ffmpeg stdin: {e}"))
            }
            _ => NewsreelError::encode("ffmpeg frame writer stopped unexpectedly"),
        }
    }

    pub fn finish(mut self) -> NewsreelResult<PathBuf> {
        // Closing the queue lets the writer flush and then close ffmpeg's stdin.
        drop(self.frames_tx.take());
        let child = self
            .child
            .take()
            .ok_or_else(|| NewsreelError::encode("ffmpeg pipe not started"))?;
        let result = finish_child(child, self.stderr_drain.take(), self.timeout);
        // The child has exited or been killed, so a blocked write has already failed.
        let written = self.writer.take().map(JoinHandle::join);

        let result = result.and_then(|()| match written {
            Some(Ok(Err(e))) => Err(NewsreelError::encode(format!(
                "failed to write frame to ffmpeg stdin: {e}"
            ))),
            Some(Err(_)) => Err(NewsreelError::encode("ffmpeg frame writer panicked")),
            _ if self.frames_written == 0 => {
                Err(NewsreelError::degenerate_input("no frames to encode"))
            }
            _ => Ok(()),
        });
        match result {
            Ok(()) => Ok(self.out.clone()),
            Err(e) => {
                remove_partial(&self.out);
                Err(e)
            }
        }
    }
}

impl Drop for PipeEncoder {
    fn drop(&mut self) {
        drop(self.frames_tx.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
            if let Some(writer) = self.writer.take() {
                let _ = writer.join();
            }
            remove_partial(&self.out);
        }
    }
}

fn spawn_writer(mut stdin: ChildStdin) -> (SyncSender<Vec<u8>>, JoinHandle<std::io::Result<()>>) {
    let (tx, rx) = std::sync::mpsc::sync_channel::<Vec<u8>>(PIPE_QUEUE_FRAMES);
    let handle = std::thread::spawn(move || {
        for frame in rx {
            stdin.write_all(&frame)?;
        }
        stdin.flush()
    });
    (tx, handle)
}

fn validate_even(size: CanvasSize) -> NewsreelResult<()> {
    if !size.width.is_multiple_of(2) || !size.height.is_multiple_of(2) {
        return Err(NewsreelError::validation(
            "video width/height must be even (required for yuv420p mp4 output)",
        ));
    }
    Ok(())
}

fn spawn(cmd: &mut Command, program: &Path) -> NewsreelResult<Child> {
    cmd.spawn().map_err(|e| {
        NewsreelError::encode(format!(
            "failed to spawn '{}' (is ffmpeg installed and on PATH?): {e}",
            program.display()
        ))
    })
}

/// Wait for `child`, killing it after `timeout`. Non-zero exit becomes an encode error
/// carrying ffmpeg's stderr.
fn finish_child(child: Child, stderr: Option<Drain>, timeout: Duration) -> NewsreelResult<()> {
    let done = wait_deadline(child, stderr, timeout).map_err(|e| {
        NewsreelError::encode(format!("failed to wait for ffmpeg to finish: {e}"))
    })?;
    match done.status {
        None => Err(NewsreelError::encode(format!(
            "ffmpeg did not finish within {}s: {}",
            timeout.as_secs(),
            done.stderr_text()
        ))),
        Some(s) if !s.success() => Err(NewsreelError::encode(format!(
            "ffmpeg exited with status {s}: {}",
            done.stderr_text()
        ))),
        Some(_) => Ok(()),
    }
}

fn remove_partial(out: &Path) {
    if out.exists()
        && let Err(e) = std::fs::remove_file(out)
    {
        tracing::warn!(path = %out.display(), error = %e, "failed to remove partial output");
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> NewsreelResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    std::process::Command::new("ffmpeg")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
