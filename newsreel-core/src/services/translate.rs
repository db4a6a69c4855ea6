//! Machine translation through the public Google translate endpoint.

use reqwest::blocking::Client;

use crate::foundation::error::{NewsreelError, NewsreelResult};
use crate::services::http::HttpSettings;

pub const DEFAULT_TRANSLATE_ENDPOINT: &str = "https://translate.googleapis.com/translate_a/single";

pub trait Translator: Send + Sync {
    fn translate(&self, text: &str, target_lang: &str) -> NewsreelResult<String>;
}

#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TranslatorSettings {
    pub endpoint: String,
    pub source_lang: String,
}

impl Default for TranslatorSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_TRANSLATE_ENDPOINT.to_string(),
            source_lang: "auto".to_string(),
        }
    }
}

/// Concatenate the translated segments of a `translate_a/single` response.
///
/// The payload is a nested array whose first element lists `[translated, original, ...]`
/// per sentence.
pub fn join_segments(payload: &serde_json::Value) -> Option<String> {
    let segments = payload.get(0)?.as_array()?;
    let out: String = segments
        .iter()
        .filter_map(|seg| seg.get(0).and_then(serde_json::Value::as_str))
        .collect();
    let out = out.trim();
    (!out.is_empty()).then(|| out.to_string())
}

#[derive(Clone, Debug)]
pub struct HttpTranslator {
    client: Client,
    settings: TranslatorSettings,
}

impl HttpTranslator {
    pub fn new(settings: TranslatorSettings, http: &HttpSettings) -> NewsreelResult<Self> {
        Ok(Self {
            client: http.build_client()?,
            settings,
        })
    }
}

impl Translator for HttpTranslator {
    #[tracing::instrument(level = "debug", skip(self, text), fields(chars = text.len()))]
    fn translate(&self, text: &str, target_lang: &str) -> NewsreelResult<String> {
        let text = text.trim();
        if text.is_empty() {
            return Err(NewsreelError::empty_input("nothing to translate"));
        }
        if target_lang.trim().is_empty() {
            return Err(NewsreelError::validation("target language is empty"));
        }

        let resp = self
            .client
            .get(&self.settings.endpoint)
            .query(&[
                ("client", "gtx"),
                ("sl", self.settings.source_lang.as_str()),
                ("tl", target_lang),
                ("dt", "t"),
                ("q", text),
            ])
            .send()
            .map_err(|e| NewsreelError::service(format!("translate to {target_lang}: {e}")))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(NewsreelError::service(format!(
                "translate to {target_lang}: server returned {status}"
            )));
        }
        let payload: serde_json::Value = resp.json().map_err(|e| {
            NewsreelError::service(format!("translate to {target_lang}: bad response: {e}"))
        })?;
        join_segments(&payload).ok_or_else(|| {
            NewsreelError::service(format!("translate to {target_lang}: empty translation"))
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/services/translate.rs"]
mod tests;
