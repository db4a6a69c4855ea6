//! Request-level orchestration: article -> summary -> translations -> video -> post image.

use std::sync::Arc;

use crate::assets::font::FontSource;
use crate::assets::image::{ImagePreparer, ImageSource};
use crate::audio::narration::{HttpSpeechSynthesizer, SpeechSynthesizer};
use crate::config::Config;
use crate::foundation::error::{NewsreelError, NewsreelResult};
use crate::pipeline::post::PostImageGenerator;
use crate::pipeline::video::VideoGenerator;
use crate::services::article::{ArticleSource, HttpArticleSource};
use crate::services::summarize::{HttpSummarizer, Summarizer};
use crate::services::translate::{HttpTranslator, Translator};

/// One request read from the parent process.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Request {
    pub url: String,
}

/// The structured response. Every field is always present in the JSON output.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Response {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub keywords: Vec<String>,
    pub top_image: Option<String>,
    pub authors: Vec<String>,
    pub publish_date: Option<String>,
    pub video_path: Option<String>,
    pub post_image_path: Option<String>,
    pub trans_hindi: Option<String>,
    pub trans_marathi: Option<String>,
    pub error: Option<String>,
}

impl Response {
    /// Response for a request that failed before any stage produced output.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }
}

/// Human-readable notes about stages that failed without aborting the request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ErrorNotes(Vec<String>);

impl ErrorNotes {
    pub fn push(&mut self, stage: &str, err: &NewsreelError) {
        tracing::warn!(stage, error = %err, "stage failed");
        self.0.push(format!("{stage} failed: {err}"));
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All notes joined with `"; "`, or `None` when nothing failed.
    pub fn joined(&self) -> Option<String> {
        (!self.0.is_empty()).then(|| self.0.join("; "))
    }
}

/// Injectable backends shared by every request of a process.
#[derive(Clone)]
pub struct Services {
    pub article: Arc<dyn ArticleSource>,
    pub summarizer: Arc<dyn Summarizer>,
    pub translator: Arc<dyn Translator>,
    pub tts: Arc<dyn SpeechSynthesizer>,
    pub images: ImagePreparer,
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}

impl Services {
    /// Build the HTTP-backed services described by `config`.
    pub fn from_config(config: &Config) -> NewsreelResult<Self> {
        let s = &config.services;
        Ok(Self {
            article: Arc::new(HttpArticleSource::new(&s.http)?),
            summarizer: Arc::new(HttpSummarizer::new(s.summarizer.clone(), &s.http)?),
            translator: Arc::new(HttpTranslator::new(s.translator.clone(), &s.http)?),
            tts: Arc::new(HttpSpeechSynthesizer::new(
                s.tts.clone(),
                &s.http,
                config.encoder.ffprobe_program(),
            )?),
            images: ImagePreparer::new(&s.http)?,
        })
    }
}

/// Processes requests end to end. Cheap to share across threads; holds no per-request state.
#[derive(Debug)]
pub struct NewsPipeline {
    services: Services,
    config: Config,
    video: VideoGenerator,
    post: PostImageGenerator,
}

impl NewsPipeline {
    pub fn new(services: Services, config: Config) -> NewsreelResult<Self> {
        config.validate()?;
        let font = FontSource::discover(config.font_path.as_deref());
        match &font {
            Some(f) => tracing::debug!(font = %f.path.display(), "caption font loaded"),
            None => tracing::warn!("no caption font found, using the built-in bitmap font"),
        }
        let video = VideoGenerator::new(
            Arc::clone(&services.tts),
            services.images.clone(),
            font.clone(),
            &config,
        );
        let post = PostImageGenerator::new(services.images.clone(), font, &config);
        Ok(Self {
            services,
            config,
            video,
            post,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn video(&self) -> &VideoGenerator {
        &self.video
    }

    pub fn post(&self) -> &PostImageGenerator {
        &self.post
    }

    /// Run every stage for `req`.
    ///
    /// Returns `Err` only when the request is malformed or the article cannot be fetched;
    /// later stages record their failures in [`Response::error`] and never abort siblings.
    #[tracing::instrument(level = "info", skip(self), fields(url = %req.url))]
    pub fn process(&self, req: &Request) -> NewsreelResult<Response> {
        let url = req.url.trim();
        if url.is_empty() {
            return Err(NewsreelError::validation("request url is empty"));
        }

        let article = self
            .config
            .services
            .retry
            .run("fetch article", || self.services.article.fetch(url))?;
        tracing::info!(title = article.title.as_deref().unwrap_or(""), "article fetched");

        let mut notes = ErrorNotes::default();
        let mut resp = Response {
            title: article.title.clone(),
            keywords: article.keywords.clone(),
            top_image: article.top_image.clone(),
            authors: article.authors.clone(),
            publish_date: article.publish_date.clone(),
            ..Response::default()
        };

        let summary = match self.services.summarizer.summarize(&article.text) {
            Ok(s) => s,
            Err(e) => {
                notes.push("summarization", &e);
                resp.error = notes.joined();
                return Ok(resp);
            }
        };

        let langs = &self.config.services.languages;
        resp.trans_hindi = self.translate(&summary, &langs.hindi, "hindi translation", &mut notes);
        resp.trans_marathi =
            self.translate(&summary, &langs.marathi, "marathi translation", &mut notes);

        let top_image = article.top_image.as_deref().map(ImageSource::parse);
        match &top_image {
            Some(image) => match self.video.generate(&summary, image) {
                Ok(v) => resp.video_path = Some(v.public_path),
                Err(e) => notes.push("video generation", &e),
            },
            None => notes.push(
                "video generation",
                &NewsreelError::empty_input("article has no top image"),
            ),
        }

        match self.post.generate(&summary, top_image.as_ref()) {
            Ok(p) => resp.post_image_path = Some(p.public_path),
            Err(e) => notes.push("post image generation", &e),
        }

        resp.summary = Some(summary);
        resp.error = notes.joined();
        Ok(resp)
    }

    fn translate(
        &self,
        text: &str,
        lang: &str,
        stage: &str,
        notes: &mut ErrorNotes,
    ) -> Option<String> {
        self.services
            .translator
            .translate(text, lang)
            .map_err(|e| notes.push(stage, &e))
            .ok()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/news.rs"]
mod tests;
