//! Process configuration.
//!
//! A [`Config`] is read from JSON with [`Config::from_path`], then selected fields are
//! overridden from `NEWSREEL_*` environment variables with [`Config::apply_env`]. Every field
//! has a default, so an empty JSON object (or no file at all) is a valid configuration.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::audio::narration::TtsSettings;
use crate::encode::ffmpeg::{EncodeMode, EncoderSettings};
use crate::foundation::core::{CanvasSize, Fps, Rgba8};
use crate::foundation::error::{NewsreelError, NewsreelResult};
use crate::foundation::retry::RetryPolicy;
use crate::render::blur::BlurSettings;
use crate::render::caption::CaptionStyle;
use crate::render::frames::FrameRenderOpts;
use crate::services::http::HttpSettings;
use crate::services::summarize::SummarizerSettings;
use crate::services::translate::TranslatorSettings;

pub const DEFAULT_PLACEHOLDER_URL: &str =
    "https://placehold.co/1080x1080/png?text=Image+Unavailable";

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Directory served over HTTP by the caller.
    pub static_root: PathBuf,
    /// Artifact directory, relative to `static_root`.
    pub uploads_dir: String,
    /// Parent of per-request temp directories. The system temp dir when unset.
    pub work_dir: Option<PathBuf>,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            static_root: PathBuf::from("static"),
            uploads_dir: "uploads".to_string(),
            work_dir: None,
        }
    }
}

impl PathSettings {
    pub fn uploads_path(&self) -> PathBuf {
        self.static_root.join(&self.uploads_dir)
    }

    pub fn work_dir(&self) -> PathBuf {
        self.work_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Path of an artifact as reported to the caller: `<uploads_dir>/<file_name>`.
    pub fn public_path(&self, file_name: &str) -> String {
        let dir = self.uploads_dir.trim_matches(|c| c == '/' || c == '\\');
        if dir.is_empty() {
            file_name.to_string()
        } else {
            format!("{}/{file_name}", dir.replace('\\', "/"))
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct VideoSettings {
    pub size: CanvasSize,
    pub fps: Fps,
    /// Background softening; `null` disables it.
    pub blur: Option<BlurSettings>,
    pub caption: CaptionStyle,
    pub frames: FrameRenderOpts,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            size: CanvasSize::VIDEO,
            fps: Fps::default(),
            blur: Some(BlurSettings::default()),
            caption: CaptionStyle::video(),
            frames: FrameRenderOpts::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PostSettings {
    pub size: CanvasSize,
    /// Full-canvas tint blended under the caption.
    pub overlay: Rgba8,
    /// Fields left out fall back to [`CaptionStyle::post`], not the video style.
    #[serde(deserialize_with = "post_caption")]
    pub caption: CaptionStyle,
    pub border_px: u32,
    pub border_color: Rgba8,
    /// Fetched when the article image is unusable; `null` goes straight to black.
    pub placeholder_url: Option<String>,
}

impl Default for PostSettings {
    fn default() -> Self {
        Self {
            size: CanvasSize::POST,
            overlay: Rgba8::rgba(0, 0, 0, 90),
            caption: CaptionStyle::post(),
            border_px: 12,
            border_color: Rgba8::WHITE,
            placeholder_url: Some(DEFAULT_PLACEHOLDER_URL.to_string()),
        }
    }
}

/// Target language codes of the two translations in a response.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LanguageSettings {
    pub hindi: String,
    pub marathi: String,
}

impl Default for LanguageSettings {
    fn default() -> Self {
        Self {
            hindi: "hi".to_string(),
            marathi: "mr".to_string(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    pub http: HttpSettings,
    /// Applied to the article fetch.
    pub retry: RetryPolicy,
    pub tts: TtsSettings,
    pub summarizer: SummarizerSettings,
    pub translator: TranslatorSettings,
    pub languages: LanguageSettings,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathSettings,
    pub video: VideoSettings,
    pub post: PostSettings,
    pub services: ServiceSettings,
    pub encoder: EncoderSettings,
    /// Caption font. Common system fonts are probed when unset.
    pub font_path: Option<PathBuf>,
}

impl Config {
    pub fn from_reader<R: std::io::Read>(r: R) -> NewsreelResult<Self> {
        serde_json::from_reader(r)
            .map_err(|e| NewsreelError::validation(format!("parse config JSON: {e}")))
    }

    pub fn from_path(path: impl AsRef<Path>) -> NewsreelResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            NewsreelError::validation(format!("open config '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Override fields from `NEWSREEL_*` environment variables.
    pub fn apply_env(&mut self) -> NewsreelResult<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    pub(crate) fn apply_env_from(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> NewsreelResult<()> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("NEWSREEL_STATIC_ROOT") {
            self.paths.static_root = PathBuf::from(v);
        }
        if let Some(v) = get("NEWSREEL_UPLOADS_DIR") {
            self.paths.uploads_dir = v;
        }
        if let Some(v) = get("NEWSREEL_WORK_DIR") {
            self.paths.work_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = get("NEWSREEL_FONT_PATH") {
            self.font_path = Some(PathBuf::from(v));
        }
        if let Some(v) = get("NEWSREEL_FFMPEG") {
            self.encoder.ffmpeg = Some(PathBuf::from(v));
        }
        if let Some(v) = get("NEWSREEL_FFPROBE") {
            self.encoder.ffprobe = Some(PathBuf::from(v));
        }
        if let Some(v) = get("NEWSREEL_HF_TOKEN") {
            self.services.summarizer.api_token = Some(v);
        }
        if let Some(v) = get("NEWSREEL_HTTP_TIMEOUT_SECS") {
            self.services.http.timeout_secs = parse_env("NEWSREEL_HTTP_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = get("NEWSREEL_RENDER_THREADS") {
            let n: usize = parse_env("NEWSREEL_RENDER_THREADS", &v)?;
            self.video.frames.parallel = n > 1;
            self.video.frames.threads = Some(n);
        }
        if let Some(v) = get("NEWSREEL_ENCODE_MODE") {
            self.encoder.mode = match v.trim() {
                "frames" => EncodeMode::Frames,
                "pipe" => EncodeMode::Pipe,
                other => {
                    return Err(NewsreelError::validation(format!(
                        "NEWSREEL_ENCODE_MODE must be 'frames' or 'pipe', got '{other}'"
                    )));
                }
            };
        }
        Ok(())
    }

    pub fn validate(&self) -> NewsreelResult<()> {
        let v = &self.video;
        validate_size("video", v.size)?;
        if v.size.width % 2 != 0 || v.size.height % 2 != 0 {
            return Err(NewsreelError::validation(format!(
                "video size {}x{} must have even dimensions for yuv420p",
                v.size.width, v.size.height
            )));
        }
        if v.fps.num == 0 || v.fps.den == 0 {
            return Err(NewsreelError::validation("video fps must be > 0"));
        }
        if let Some(b) = v.blur
            && b.radius > 0
            && (!b.sigma.is_finite() || b.sigma <= 0.0)
        {
            return Err(NewsreelError::validation(
                "video blur sigma must be finite and > 0 when radius > 0",
            ));
        }
        if v.frames.threads == Some(0) {
            return Err(NewsreelError::validation("render threads must be > 0"));
        }
        v.caption.validate()?;

        validate_size("post", self.post.size)?;
        self.post.caption.validate()?;

        let langs = &self.services.languages;
        if langs.hindi.trim().is_empty() || langs.marathi.trim().is_empty() {
            return Err(NewsreelError::validation("translation language codes must be set"));
        }
        self.services.summarizer.validate()?;
        if self.encoder.preset.trim().is_empty() {
            return Err(NewsreelError::validation("encoder preset is empty"));
        }
        Ok(())
    }
}

fn post_caption<'de, D: serde::Deserializer<'de>>(d: D) -> Result<CaptionStyle, D::Error> {
    use serde::Deserialize as _;
    use serde::de::Error as _;

    let patch = serde_json::Value::deserialize(d)?;
    let mut merged = serde_json::to_value(CaptionStyle::post()).map_err(D::Error::custom)?;
    if let (Some(base), serde_json::Value::Object(fields)) = (merged.as_object_mut(), patch) {
        base.extend(fields);
    }
    serde_json::from_value(merged).map_err(D::Error::custom)
}

fn validate_size(what: &str, size: CanvasSize) -> NewsreelResult<()> {
    if size.width == 0 || size.height == 0 {
        return Err(NewsreelError::validation(format!(
            "{what} size must be non-zero, got {}x{}",
            size.width, size.height
        )));
    }
    Ok(())
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> NewsreelResult<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| NewsreelError::validation(format!("{key}='{value}': {e}")))
}

#[cfg(test)]
#[path = "../tests/unit/config/config.rs"]
mod tests;
