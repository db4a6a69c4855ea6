//! Abstractive summarization backed by a hosted inference endpoint.

use reqwest::blocking::Client;

use crate::foundation::error::{NewsreelError, NewsreelResult};
use crate::services::http::HttpSettings;

pub const DEFAULT_SUMMARY_MODEL: &str = "sshleifer/distilbart-cnn-12-6";
pub const DEFAULT_INFERENCE_BASE: &str = "https://api-inference.huggingface.co/models";

pub trait Summarizer: Send + Sync {
    fn summarize(&self, text: &str) -> NewsreelResult<String>;
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SummarizerSettings {
    /// Full model URL. Defaults to the inference API URL of [`DEFAULT_SUMMARY_MODEL`].
    pub endpoint: String,
    /// Bearer token sent as `Authorization`, if any.
    pub api_token: Option<String>,
    pub max_length: u32,
    pub min_length: u32,
    /// Input is cut to this many characters on a word boundary before sending.
    pub max_input_chars: usize,
}

impl Default for SummarizerSettings {
    fn default() -> Self {
        Self {
            endpoint: format!("{DEFAULT_INFERENCE_BASE}/{DEFAULT_SUMMARY_MODEL}"),
            api_token: None,
            max_length: 150,
            min_length: 50,
            max_input_chars: 3000,
        }
    }
}

impl SummarizerSettings {
    pub fn validate(&self) -> NewsreelResult<()> {
        if self.endpoint.trim().is_empty() {
            return Err(NewsreelError::validation("summarizer endpoint is empty"));
        }
        if self.min_length > self.max_length {
            return Err(NewsreelError::validation(format!(
                "summary min_length {} exceeds max_length {}",
                self.min_length, self.max_length
            )));
        }
        if self.max_input_chars == 0 {
            return Err(NewsreelError::validation("summarizer max_input_chars must be > 0"));
        }
        Ok(())
    }
}

#[derive(serde::Serialize)]
struct SummaryRequest<'a> {
    inputs: &'a str,
    parameters: SummaryParameters,
}

#[derive(serde::Serialize)]
struct SummaryParameters {
    max_length: u32,
    min_length: u32,
    do_sample: bool,
}

#[derive(serde::Deserialize)]
struct SummaryItem {
    summary_text: String,
}

/// Truncate `text` to at most `max_chars` characters, backing off to the last whitespace
/// so no word is cut in half. A single overlong word is cut hard.
pub fn truncate_on_word(text: &str, max_chars: usize) -> &str {
    let text = text.trim();
    let Some((cut, _)) = text.char_indices().nth(max_chars) else {
        return text;
    };
    let head = &text[..cut];
    if text[cut..].starts_with(char::is_whitespace) {
        return head.trim_end();
    }
    match head.rfind(char::is_whitespace) {
        Some(ws) if ws > 0 => head[..ws].trim_end(),
        _ => head,
    }
}

#[derive(Clone, Debug)]
pub struct HttpSummarizer {
    client: Client,
    settings: SummarizerSettings,
}

impl HttpSummarizer {
    pub fn new(settings: SummarizerSettings, http: &HttpSettings) -> NewsreelResult<Self> {
        settings.validate()?;
        Ok(Self {
            client: http.build_client()?,
            settings,
        })
    }
}

impl Summarizer for HttpSummarizer {
    #[tracing::instrument(level = "debug", skip(self, text), fields(chars = text.len()))]
    fn summarize(&self, text: &str) -> NewsreelResult<String> {
        let input = truncate_on_word(text, self.settings.max_input_chars);
        if input.is_empty() {
            return Err(NewsreelError::empty_input("nothing to summarize"));
        }

        let body = SummaryRequest {
            inputs: input,
            parameters: SummaryParameters {
                max_length: self.settings.max_length,
                min_length: self.settings.min_length,
                do_sample: false,
            },
        };
        let mut req = self.client.post(&self.settings.endpoint).json(&body);
        if let Some(token) = &self.settings.api_token {
            req = req.bearer_auth(token);
        }
        let resp = req
            .send()
            .map_err(|e| NewsreelError::service(format!("summarizer request failed: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().unwrap_or_default();
            return Err(NewsreelError::service(format!(
                "summarizer returned {status}: {}",
                detail.trim()
            )));
        }
        let items: Vec<SummaryItem> = resp
            .json()
            .map_err(|e| NewsreelError::service(format!("unexpected summarizer response: {e}")))?;

        let summary = items
            .into_iter()
            .next()
            .map(|i| i.summary_text.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| NewsreelError::service("summarizer returned no summary"))?;
        tracing::debug!(chars = summary.len(), "summary ready");
        Ok(summary)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/services/summarize.rs"]
mod tests;
