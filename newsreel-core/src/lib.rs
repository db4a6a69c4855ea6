//! Newsreel turns a news article into publishable media.
//!
//! For one article URL the pipeline extracts metadata and body text, summarizes it,
//! translates the summary, and renders two artifacts: a narrated video that reveals the
//! summary word by word over the article image, and a square post image with the summary
//! burned in.
//!
//! # Pipeline overview
//!
//! 1. **Fetch**: `ArticleSource` downloads and parses the page (retried with [`RetryPolicy`])
//! 2. **Summarize / translate**: opaque text services behind the [`Summarizer`] and
//!    [`Translator`] traits
//! 3. **Narrate**: [`SpeechSynthesizer`] produces a [`NarrationTrack`] whose duration drives
//!    the [`schedule`] of visible words per frame
//! 4. **Render**: the background is letterboxed by [`ImagePreparer`] and every distinct
//!    reveal state is captioned by the [`Compositor`]
//! 5. **Encode**: the [`Muxer`] (numbered PNGs) or [`PipeEncoder`] (raw frames on stdin)
//!    hands frames and narration to the system `ffmpeg`
//!
//! Every temporary file of a request lives in a request-unique scratch directory and is
//! removed before the generating call returns, whether it succeeded or not.
#![forbid(unsafe_code)]

mod assets;
mod audio;
mod config;
mod encode;
mod foundation;
mod pipeline;
mod render;
mod services;

pub use assets::font::{FontSource, SYSTEM_FONT_CANDIDATES};
pub use assets::image::{ImagePreparer, ImageSource, decode_image, fitted_size, letterbox};
pub use audio::narration::{
    DEFAULT_TTS_ENDPOINT, HttpSpeechSynthesizer, NarrationTrack, SpeechSynthesizer,
    TTS_CHUNK_CHARS, TtsSettings, chunk_text,
};
pub use audio::probe::{
    FFPROBE_TIMEOUT, audio_duration_secs, ffprobe_duration_secs, wav_duration_secs,
};
pub use config::{
    Config, DEFAULT_PLACEHOLDER_URL, LanguageSettings, PathSettings, PostSettings,
    ServiceSettings, VideoSettings,
};
pub use encode::ffmpeg::{
    EncodeMode, EncoderSettings, Muxer, PipeEncoder, ensure_parent_dir, is_ffmpeg_on_path,
};
pub use foundation::core::{CanvasSize, Fps, FrameIndex, Rgba8};
pub use foundation::error::{NewsreelError, NewsreelResult};
pub use foundation::retry::RetryPolicy;
pub use foundation::text::greedy_wrap;
pub use pipeline::news::{ErrorNotes, NewsPipeline, Request, Response, Services};
pub use pipeline::post::{PostArtifact, PostBackground, PostImageGenerator};
pub use pipeline::video::{VideoArtifact, VideoGenerator};
pub use render::bitmap_font::BitmapGlyphRenderer;
pub use render::blur::{BlurSettings, blur_canvas, blur_rgba8};
pub use render::canvas::Canvas;
pub use render::caption::{
    CaptionAnchor, CaptionLayout, CaptionStyle, Compositor, PlacedLine, wrap_words,
};
pub use render::composite::{
    PixelRect, PremulRgba8, fill_over, fill_rect_over, over, over_in_place, stroke_border,
};
pub use render::frames::{
    FRAME_FILE_PATTERN, FrameRenderOpts, FrameRenderer, FrameSet, RenderStats, frame_file_name,
};
pub use render::glyphs::{
    FontGlyphRenderer, GlyphPass, GlyphRenderer, TextExtent, glyph_renderer_for,
};
pub use render::schedule::{RevealEntry, RevealSchedule, schedule, word_display_times};
pub use services::article::{
    Article, ArticleSource, HttpArticleSource, frequent_terms, parse_article,
};
pub use services::http::{DEFAULT_USER_AGENT, HttpSettings};
pub use services::summarize::{
    DEFAULT_INFERENCE_BASE, DEFAULT_SUMMARY_MODEL, HttpSummarizer, Summarizer,
    SummarizerSettings, truncate_on_word,
};
pub use services::translate::{
    DEFAULT_TRANSLATE_ENDPOINT, HttpTranslator, Translator, TranslatorSettings, join_segments,
};
