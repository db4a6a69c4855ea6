//! Text-to-speech narration tracks.

use std::io::Write as _;
use std::path::{Path, PathBuf};

use reqwest::blocking::Client;
use tempfile::TempPath;

use crate::audio::probe::{audio_duration_secs, is_wav};
use crate::foundation::error::{NewsreelError, NewsreelResult};
use crate::foundation::text::greedy_wrap;
use crate::services::http::HttpSettings;

/// Longest text the TTS endpoint accepts per request.
pub const TTS_CHUNK_CHARS: usize = 100;

pub const DEFAULT_TTS_ENDPOINT: &str = "https://translate.google.com/translate_tts";

/// Synthesized speech on disk plus its duration.
///
/// The file has a randomized name and is deleted when the track is dropped.
#[derive(Debug)]
pub struct NarrationTrack {
    path: TempPath,
    duration_secs: f64,
}

impl NarrationTrack {
    /// Write `bytes` to a new uniquely named file in `dir`.
    pub fn write_in(
        dir: &Path,
        bytes: &[u8],
        duration_of: impl FnOnce(&Path) -> NewsreelResult<f64>,
    ) -> NewsreelResult<Self> {
        let suffix = if is_wav(bytes) { ".wav" } else { ".mp3" };
        let mut file = tempfile::Builder::new()
            .prefix("narration_")
            .suffix(suffix)
            .tempfile_in(dir)
            .map_err(|e| {
                NewsreelError::synthesis(format!(
                    "create narration file in '{}': {e}",
                    dir.display()
                ))
            })?;
        file.write_all(bytes)
            .and_then(|()| file.flush())
            .map_err(|e| NewsreelError::synthesis(format!("write narration audio: {e}")))?;
        let path = file.into_temp_path();
        // `path` removes the file if measuring fails.
        let duration_secs = duration_of(&path)?;
        Ok(Self {
            path,
            duration_secs,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn duration_secs(&self) -> f64 {
        self.duration_secs
    }
}

/// Turns text into a narration track.
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text` into a new temp file under `dir`.
    fn synthesize(&self, text: &str, dir: &Path) -> NewsreelResult<NarrationTrack>;
}

/// Split `text` on word boundaries into chunks of at most `max_chars` characters.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<String> {
    greedy_wrap(text, max_chars)
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TtsSettings {
    pub endpoint: String,
    pub lang: String,
}

impl Default for TtsSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_TTS_ENDPOINT.to_string(),
            lang: "en".to_string(),
        }
    }
}

/// Google-translate style TTS over HTTP. Long text is requested in chunks and the MP3
/// payloads are concatenated.
#[derive(Clone, Debug)]
pub struct HttpSpeechSynthesizer {
    client: Client,
    settings: TtsSettings,
    ffprobe: PathBuf,
}

impl HttpSpeechSynthesizer {
    pub fn new(
        settings: TtsSettings,
        http: &HttpSettings,
        ffprobe: impl Into<PathBuf>,
    ) -> NewsreelResult<Self> {
        Ok(Self {
            client: http.build_client()?,
            settings,
            ffprobe: ffprobe.into(),
        })
    }

    fn fetch_chunk(&self, chunk: &str, idx: usize, total: usize) -> NewsreelResult<Vec<u8>> {
        let (total, idx, textlen) = (
            total.to_string(),
            idx.to_string(),
            chunk.chars().count().to_string(),
        );
        let resp = self
            .client
            .get(&self.settings.endpoint)
            .query(&[
                ("ie", "UTF-8"),
                ("tl", self.settings.lang.as_str()),
                ("client", "tw-ob"),
                ("q", chunk),
                ("total", total.as_str()),
                ("idx", idx.as_str()),
                ("textlen", textlen.as_str()),
            ])
            .send()
            .map_err(|e| NewsreelError::synthesis(format!("tts request failed: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(NewsreelError::synthesis(format!(
                "tts server returned {status}"
            )));
        }
        let bytes = resp
            .bytes()
            .map_err(|e| NewsreelError::synthesis(format!("read tts response: {e}")))?;
        if bytes.is_empty() {
            return Err(NewsreelError::synthesis("tts server returned no audio"));
        }
        Ok(bytes.to_vec())
    }
}

impl SpeechSynthesizer for HttpSpeechSynthesizer {
    #[tracing::instrument(level = "debug", skip(self, text, dir), fields(chars = text.len()))]
    fn synthesize(&self, text: &str, dir: &Path) -> NewsreelResult<NarrationTrack> {
        let chunks = chunk_text(text, TTS_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(NewsreelError::empty_input("narration text is empty"));
        }

        let mut audio = Vec::new();
        for (idx, chunk) in chunks.iter().enumerate() {
            let bytes = self.fetch_chunk(chunk, idx, chunks.len())?;
            if is_wav(&bytes) && chunks.len() > 1 {
                return Err(NewsreelError::synthesis(
                    "tts server returned wav audio, which cannot be concatenated",
                ));
            }
            audio.extend_from_slice(&bytes);
        }
        tracing::debug!(chunks = chunks.len(), bytes = audio.len(), "narration synthesized");

        NarrationTrack::write_in(dir, &audio, |p| audio_duration_secs(&self.ffprobe, p))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/audio/narration.rs"]
mod tests;
