use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;

use crate::encode::process::wait_deadline;
use crate::foundation::error::{NewsreelError, NewsreelResult};

/// How long `ffprobe` may take to read one narration file.
pub const FFPROBE_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) fn is_wav(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}

/// Duration of a WAV file from its header.
pub fn wav_duration_secs(path: &Path) -> NewsreelResult<f64> {
    let reader = hound::WavReader::open(path).map_err(|e| {
        NewsreelError::synthesis(format!("read wav header '{}': {e}", path.display()))
    })?;
    let rate = reader.spec().sample_rate;
    if rate == 0 {
        return Err(NewsreelError::synthesis("wav sample rate is zero"));
    }
    Ok(f64::from(reader.duration()) / f64::from(rate))
}

/// Container duration reported by `ffprobe`, which is killed after [`FFPROBE_TIMEOUT`].
pub fn ffprobe_duration_secs(ffprobe: &Path, path: &Path) -> NewsreelResult<f64> {
    ffprobe_duration_within(ffprobe, path, FFPROBE_TIMEOUT)
}

pub(crate) fn ffprobe_duration_within(
    ffprobe: &Path,
    path: &Path,
    timeout: Duration,
) -> NewsreelResult<f64> {
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        format: ProbeFormat,
    }

    let child = Command::new(ffprobe)
        .args(["-v", "error", "-print_format", "json", "-show_format"])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| NewsreelError::synthesis(format!("failed to run ffprobe: {e}")))?;
    let out = wait_deadline(child, None, timeout)
        .map_err(|e| NewsreelError::synthesis(format!("failed to wait for ffprobe: {e}")))?;
    match out.status {
        None => {
            return Err(NewsreelError::synthesis(format!(
                "ffprobe did not finish within {}s for '{}'",
                timeout.as_secs_f64(),
                path.display()
            )));
        }
        Some(status) if !status.success() => {
            return Err(NewsreelError::synthesis(format!(
                "ffprobe failed for '{}': {}",
                path.display(),
                out.stderr_text()
            )));
        }
        Some(_) => {}
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| NewsreelError::synthesis(format!("ffprobe json parse failed: {e}")))?;
    let raw = parsed
        .format
        .duration
        .ok_or_else(|| NewsreelError::synthesis("ffprobe reported no duration"))?;
    raw.trim()
        .parse::<f64>()
        .map_err(|e| NewsreelError::synthesis(format!("bad ffprobe duration '{raw}': {e}")))
}

/// Duration of an audio file: WAV headers are read directly, anything else goes through
/// `ffprobe`.
pub fn audio_duration_secs(ffprobe: &Path, path: &Path) -> NewsreelResult<f64> {
    let mut head = [0u8; 12];
    let is_wav_file = std::fs::File::open(path)
        .and_then(|mut f| std::io::Read::read_exact(&mut f, &mut head))
        .map(|()| is_wav(&head))
        .unwrap_or(false);
    if is_wav_file {
        wav_duration_secs(path)
    } else {
        ffprobe_duration_secs(ffprobe, path)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/probe.rs"]
mod tests;
