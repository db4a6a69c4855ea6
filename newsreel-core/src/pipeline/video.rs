//! Narrated word-reveal video generation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use crate::assets::font::FontSource;
use crate::assets::image::{ImagePreparer, ImageSource};
use crate::audio::narration::{NarrationTrack, SpeechSynthesizer};
use crate::config::{Config, PathSettings, VideoSettings};
use crate::encode::ffmpeg::{EncodeMode, EncoderSettings, Muxer, PipeEncoder};
use crate::foundation::error::{NewsreelError, NewsreelResult};
use crate::render::canvas::Canvas;
use crate::render::frames::{FrameRenderer, RenderStats};
use crate::render::schedule::{RevealSchedule, schedule};

/// A finished video and how it was produced.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoArtifact {
    /// Location on disk.
    pub path: PathBuf,
    /// Location relative to the static root, as handed to the caller.
    pub public_path: String,
    pub duration_secs: f64,
    pub stats: RenderStats,
}

/// Create a request-unique scratch directory under `work_dir`.
pub(crate) fn request_scratch(work_dir: &Path) -> NewsreelResult<TempDir> {
    std::fs::create_dir_all(work_dir).map_err(|e| {
        NewsreelError::render(format!("create work dir '{}': {e}", work_dir.display()))
    })?;
    tempfile::Builder::new()
        .prefix("newsreel_")
        .tempdir_in(work_dir)
        .map_err(|e| {
            NewsreelError::render(format!(
                "create scratch dir in '{}': {e}",
                work_dir.display()
            ))
        })
}

pub struct VideoGenerator {
    tts: Arc<dyn SpeechSynthesizer>,
    images: ImagePreparer,
    frames: FrameRenderer,
    settings: VideoSettings,
    encoder: EncoderSettings,
    paths: PathSettings,
}

impl std::fmt::Debug for VideoGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoGenerator")
            .field("settings", &self.settings)
            .field("encoder", &self.encoder)
            .field("paths", &self.paths)
            .finish_non_exhaustive()
    }
}

impl VideoGenerator {
    pub fn new(
        tts: Arc<dyn SpeechSynthesizer>,
        images: ImagePreparer,
        font: Option<FontSource>,
        config: &Config,
    ) -> Self {
        Self {
            tts,
            images,
            frames: FrameRenderer::new(font, config.video.frames.clone()),
            settings: config.video.clone(),
            encoder: config.encoder.clone(),
            paths: config.paths.clone(),
        }
    }

    /// Render `summary` over `image` into `<uploads>/video_<uuid>.mp4`.
    pub fn generate(&self, summary: &str, image: &ImageSource) -> NewsreelResult<VideoArtifact> {
        let name = format!("video_{}.mp4", uuid::Uuid::new_v4());
        let out = self.paths.uploads_path().join(&name);
        let mut artifact = self.generate_to(summary, image, &out)?;
        artifact.public_path = self.paths.public_path(&name);
        Ok(artifact)
    }

    /// Render `summary` over `image` into `out`.
    ///
    /// Narration audio and frame files live in a scratch directory that is removed before
    /// this returns, on success and on failure.
    #[tracing::instrument(level = "info", skip(self, summary, image), fields(out = %out.display()))]
    pub fn generate_to(
        &self,
        summary: &str,
        image: &ImageSource,
        out: &Path,
    ) -> NewsreelResult<VideoArtifact> {
        let summary = summary.trim();
        if summary.is_empty() {
            return Err(NewsreelError::empty_input("video summary is empty"));
        }
        let scratch = request_scratch(&self.paths.work_dir())?;

        let narration = self.tts.synthesize(summary, scratch.path())?;
        let duration = narration.duration_secs();
        if !duration.is_finite() || duration <= 0.0 {
            return Err(NewsreelError::degenerate_input(format!(
                "narration duration is {duration}s"
            )));
        }

        let base = self
            .images
            .prepare(image, self.settings.size, self.settings.blur)?;

        let sched = schedule(summary, duration, self.settings.fps);
        if sched.is_empty() {
            return Err(NewsreelError::degenerate_input(
                "reveal schedule has no frames",
            ));
        }
        let words: Vec<String> = summary.split_whitespace().map(str::to_string).collect();
        tracing::debug!(
            duration_secs = duration,
            frames = sched.len(),
            words = words.len(),
            mode = ?self.encoder.mode,
            "rendering video"
        );

        let stats = match self.encoder.mode {
            EncodeMode::Frames => {
                self.encode_frames(&base, &words, &sched, narration, scratch.path(), out)?
            }
            EncodeMode::Pipe => self.encode_pipe(&base, &words, &sched, narration, out)?,
        };
        drop(scratch);

        tracing::info!(
            frames = stats.frames_total,
            composited = stats.frames_rendered,
            "video ready"
        );
        Ok(VideoArtifact {
            path: out.to_path_buf(),
            public_path: out.to_string_lossy().replace('\\', "/"),
            duration_secs: duration,
            stats,
        })
    }

    fn encode_frames(
        &self,
        base: &Canvas,
        words: &[String],
        sched: &RevealSchedule,
        narration: NarrationTrack,
        scratch: &Path,
        out: &Path,
    ) -> NewsreelResult<RenderStats> {
        let frames = self
            .frames
            .render(base, words, sched, &self.settings.caption, scratch)?;
        let stats = frames.stats();
        Muxer::new(&self.encoder).mux(frames, self.settings.fps, narration, base.size(), out)?;
        Ok(stats)
    }

    fn encode_pipe(
        &self,
        base: &Canvas,
        words: &[String],
        sched: &RevealSchedule,
        narration: NarrationTrack,
        out: &Path,
    ) -> NewsreelResult<RenderStats> {
        let mut enc = PipeEncoder::begin(
            &self.encoder,
            base.size(),
            self.settings.fps,
            narration.path(),
            out,
        )?;
        // A failed frame drops `enc`, which kills ffmpeg and removes the partial output.
        let stats = self.frames.for_each_frame(
            base,
            words,
            sched,
            &self.settings.caption,
            |_, frame| enc.push_frame(frame),
        )?;
        enc.finish()?;
        drop(narration);
        Ok(stats)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/video.rs"]
mod tests;
